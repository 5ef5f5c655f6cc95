//! Graphics API seam.
//!
//! The renderer never talks to a 3D API directly; everything goes through
//! [`GraphicsDevice`]. [`RecordingDevice`] keeps every call in memory and is
//! what the demo driver and the tests render into.

use rustc_hash::FxHashMap;

use crate::core::Vertex;

/// Handle to a combined vertex/index buffer owned by a chunk part.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BufferHandle(pub u32);

impl BufferHandle {
    pub const INVALID: BufferHandle = BufferHandle(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Default for BufferHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

pub trait GraphicsDevice {
    /// Uploads geometry. Implementations panic when the upload cannot be
    /// satisfied; rendering a partially built world is not recoverable.
    fn create_vertex_index_buffer(&mut self, vertices: &[Vertex], indices: &[u16]) -> BufferHandle;

    /// Frees the buffer and resets the handle to [`BufferHandle::INVALID`].
    fn delete_buffer(&mut self, handle: &mut BufferHandle);

    fn bind_texture(&mut self, atlas_row: usize);
    fn set_face_culling(&mut self, enabled: bool);
    fn set_color_write(&mut self, enabled: bool);
    fn set_depth_write(&mut self, enabled: bool);
    fn set_blending(&mut self, enabled: bool);
    fn set_texturing(&mut self, enabled: bool);

    /// Draws `index_count` indices starting at `start_index`. Indices are
    /// 16-bit, so `base_vertex` selects which 65536-vertex page they address.
    fn draw_indexed(
        &mut self,
        handle: BufferHandle,
        start_index: u32,
        index_count: u32,
        base_vertex: u32,
    );
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeviceCall {
    Create { handle: BufferHandle, vertices: usize, indices: usize },
    Delete(BufferHandle),
    BindTexture(usize),
    FaceCulling(bool),
    ColorWrite(bool),
    DepthWrite(bool),
    Blending(bool),
    Texturing(bool),
    Draw { handle: BufferHandle, start_index: u32, index_count: u32, base_vertex: u32 },
}

pub struct BufferData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

/// In-memory device that records every call and keeps uploaded geometry.
#[derive(Default)]
pub struct RecordingDevice {
    pub calls: Vec<DeviceCall>,
    buffers: FxHashMap<BufferHandle, BufferData>,
    next_id: u32,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&BufferData> {
        self.buffers.get(&handle)
    }

    pub fn draws(&self) -> impl Iterator<Item = &DeviceCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, DeviceCall::Draw { .. }))
    }

    pub fn drawn_indices(&self) -> u64 {
        self.draws()
            .map(|call| match call {
                DeviceCall::Draw { index_count, .. } => *index_count as u64,
                _ => 0,
            })
            .sum()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_vertex_index_buffer(&mut self, vertices: &[Vertex], indices: &[u16]) -> BufferHandle {
        self.next_id += 1;
        let handle = BufferHandle(self.next_id);
        self.buffers.insert(
            handle,
            BufferData {
                vertices: vertices.to_vec(),
                indices: indices.to_vec(),
            },
        );
        self.calls.push(DeviceCall::Create {
            handle,
            vertices: vertices.len(),
            indices: indices.len(),
        });
        handle
    }

    fn delete_buffer(&mut self, handle: &mut BufferHandle) {
        if !handle.is_valid() {
            return;
        }
        if self.buffers.remove(handle).is_none() {
            tracing::warn!("Deleting unknown buffer {:?}", handle);
        }
        self.calls.push(DeviceCall::Delete(*handle));
        *handle = BufferHandle::INVALID;
    }

    fn bind_texture(&mut self, atlas_row: usize) {
        self.calls.push(DeviceCall::BindTexture(atlas_row));
    }

    fn set_face_culling(&mut self, enabled: bool) {
        self.calls.push(DeviceCall::FaceCulling(enabled));
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.calls.push(DeviceCall::ColorWrite(enabled));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.calls.push(DeviceCall::DepthWrite(enabled));
    }

    fn set_blending(&mut self, enabled: bool) {
        self.calls.push(DeviceCall::Blending(enabled));
    }

    fn set_texturing(&mut self, enabled: bool) {
        self.calls.push(DeviceCall::Texturing(enabled));
    }

    fn draw_indexed(
        &mut self,
        handle: BufferHandle,
        start_index: u32,
        index_count: u32,
        base_vertex: u32,
    ) {
        self.calls.push(DeviceCall::Draw {
            handle,
            start_index,
            index_count,
            base_vertex,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_invalidates_handle_once() {
        let mut device = RecordingDevice::new();
        let v = Vertex::new(0.0, 0.0, 0.0, 0.0, 0.0, [1.0; 3]);
        let mut handle = device.create_vertex_index_buffer(&[v; 4], &[0, 1, 2, 0, 2, 3]);
        assert!(handle.is_valid());
        assert_eq!(device.live_buffers(), 1);

        device.delete_buffer(&mut handle);
        assert_eq!(handle, BufferHandle::INVALID);
        assert_eq!(device.live_buffers(), 0);

        device.delete_buffer(&mut handle);
        let deletes = device
            .calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::Delete(_)))
            .count();
        assert_eq!(deletes, 1);
    }
}
