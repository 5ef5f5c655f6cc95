//! Chunk meshing and map rendering.
//! Builds per-chunk geometry, schedules rebuilds and submits draws through a graphics device.

pub mod builder;
pub mod device;
pub mod frustum;
pub mod mesh;
pub mod renderer;
pub mod sorter;
pub mod updater;

// Re-export commonly used types
pub use builder::{BuiltChunk, ChunkMeshBuilder, MeshBuilder, NormalBuilder, SmoothLightingBuilder};
pub use device::{BufferHandle, DeviceCall, GraphicsDevice, RecordingDevice};
pub use frustum::FrustumCulling;
pub use renderer::{MapRenderer, RenderStats};
pub use sorter::ChunkSorter;
pub use updater::{ChunkInfo, ChunkPartInfo, ChunkUpdater};
