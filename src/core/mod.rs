//! Core data structures for the renderer
//! Contains fundamental types like blocks, chunks, and vertices.

pub mod block;
pub mod chunk;
pub mod vertex;

// Re-export commonly used types
pub use block::{Atlas1D, BlockInfo, BlockType, DrawType, Face};
pub use chunk::{Chunk, SubChunk};
pub use vertex::Vertex;
