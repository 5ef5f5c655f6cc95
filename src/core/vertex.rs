use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 3],
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, u: f32, v: f32, color: [f32; 3]) -> Self {
        Self {
            position: [x, y, z],
            uv: [u, v],
            color,
        }
    }

    pub fn shade(color: [f32; 3], factor: f32) -> [f32; 3] {
        [color[0] * factor, color[1] * factor, color[2] * factor]
    }
}
