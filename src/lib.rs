// Core module with fundamental types
pub mod core;

// Render module with meshing, scheduling and draw submission
pub mod render;

// Voxel storage the renderer reads from
pub mod world;

// Other modules
pub mod camera;
pub mod constants;
pub mod error;
pub mod utils;

// Short module paths (re-export from core and render)
pub mod block {
    pub use crate::core::block::*;
}
pub mod chunk {
    pub use crate::core::chunk::*;
}
pub mod vertex {
    pub use crate::core::vertex::*;
}
pub mod frustum {
    pub use crate::render::frustum::*;
}
pub mod mesh {
    pub use crate::render::mesh::*;
}

// Re-exports
pub use camera::{Camera, CameraState};
pub use constants::*;
pub use self::core::{Atlas1D, BlockInfo, BlockType, Chunk, DrawType, Face, SubChunk, Vertex};
pub use error::{Error, Result};
pub use render::{
    BufferHandle, ChunkInfo, ChunkPartInfo, ChunkUpdater, GraphicsDevice, MapRenderer, RecordingDevice,
    RenderStats,
};
pub use utils::settings::{RenderSettings, load_or_default, load_settings, save_settings};
pub use world::{World, WorldStore};
