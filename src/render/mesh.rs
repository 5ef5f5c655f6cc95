use glam::IVec3;

use crate::constants::*;
use crate::core::block::Face;
use crate::core::vertex::Vertex;

/// Corner order of every face quad, as (high end of the face's U axis,
/// high end of its V axis). U is the axis runs stretch along: Z for the X
/// faces, X for the others. V is Y for side faces and Z for top/bottom.
/// Winding is counter-clockwise seen from outside the block.
pub const FACE_CORNERS: [[(bool, bool); 4]; FACE_COUNT] = [
    // XMin
    [(true, true), (false, true), (false, false), (true, false)],
    // XMax
    [(false, true), (true, true), (true, false), (false, false)],
    // ZMin
    [(true, false), (false, false), (false, true), (true, true)],
    // ZMax
    [(true, true), (false, true), (false, false), (true, false)],
    // YMin
    [(true, true), (false, true), (false, false), (true, false)],
    // YMax
    [(true, false), (false, false), (false, true), (true, true)],
];

/// Positions and texture coordinates of one merged face.
pub struct FaceQuad {
    pub positions: [[f32; 3]; 4],
    pub uvs: [[f32; 2]; 4],
}

/// Builds the quad covering `count` voxels starting at `pos`, for a block
/// spanning the full cell on X/Z and `height` on Y. `v_origin` and
/// `inv_tile` locate the tile inside its atlas strip.
pub fn face_quad(
    face: Face,
    pos: IVec3,
    count: i32,
    height: f32,
    v_origin: f32,
    inv_tile: f32,
) -> FaceQuad {
    let x = pos.x as f32;
    let y = pos.y as f32;
    let z = pos.z as f32;
    let ext = (count - 1) as f32;

    let u_span = ext + UV2_SCALE;
    let mirrored = matches!(face, Face::XMax | Face::ZMin);
    let is_top_or_bottom = matches!(face, Face::YMin | Face::YMax);

    let mut positions = [[0.0; 3]; 4];
    let mut uvs = [[0.0; 2]; 4];

    for (i, &(u_hi, v_hi)) in FACE_CORNERS[face.index()].iter().enumerate() {
        positions[i] = match face {
            Face::XMin | Face::XMax => {
                let fx = if face == Face::XMin { x } else { x + 1.0 };
                let pz = if u_hi { z + 1.0 + ext } else { z };
                let py = if v_hi { y + height } else { y };
                [fx, py, pz]
            }
            Face::ZMin | Face::ZMax => {
                let fz = if face == Face::ZMin { z } else { z + 1.0 };
                let px = if u_hi { x + 1.0 + ext } else { x };
                let py = if v_hi { y + height } else { y };
                [px, py, fz]
            }
            Face::YMin | Face::YMax => {
                let fy = if face == Face::YMin { y } else { y + height };
                let px = if u_hi { x + 1.0 + ext } else { x };
                let pz = if v_hi { z + 1.0 } else { z };
                [px, fy, pz]
            }
        };

        let u = if u_hi != mirrored { u_span } else { 0.0 };
        let v = if is_top_or_bottom {
            if v_hi { v_origin + inv_tile * UV2_SCALE } else { v_origin }
        } else if v_hi {
            v_origin + (1.0 - height) * inv_tile
        } else {
            v_origin + inv_tile * UV2_SCALE
        };
        uvs[i] = [u, v];
    }

    FaceQuad { positions, uvs }
}

/// Pushes a face quad with one colour per corner. `flip` rotates the corner
/// order so the quad is split along its other diagonal.
pub fn add_quad(vertices: &mut Vec<Vertex>, quad: &FaceQuad, colors: [[f32; 3]; 4], flip: bool) {
    let start = if flip { 1 } else { 0 };
    for k in 0..4 {
        let i = (start + k) % 4;
        let [px, py, pz] = quad.positions[i];
        let [u, v] = quad.uvs[i];
        vertices.push(Vertex::new(px, py, pz, u, v, colors[i]));
    }
}

/// The four quads of a sprite cross, one per orientation group:
/// Z-diagonal, Z-diagonal mirrored, X-diagonal, X-diagonal mirrored.
pub fn sprite_quads(
    min: [f32; 3],
    max: [f32; 3],
    v_origin: f32,
    inv_tile: f32,
    color: [f32; 3],
) -> [[Vertex; 4]; 4] {
    let [x1, y1, z1] = min;
    let [x2, y2, z2] = max;
    let u1 = 0.0;
    let u2 = UV2_SCALE;
    let v1 = v_origin;
    let v2 = v_origin + inv_tile * UV2_SCALE;
    let vert = |x, y, z, u, v| Vertex::new(x, y, z, u, v, color);

    [
        [
            vert(x1, y1, z1, u2, v2),
            vert(x1, y2, z1, u2, v1),
            vert(x2, y2, z2, u1, v1),
            vert(x2, y1, z2, u1, v2),
        ],
        [
            vert(x2, y1, z2, u2, v2),
            vert(x2, y2, z2, u2, v1),
            vert(x1, y2, z1, u1, v1),
            vert(x1, y1, z1, u1, v2),
        ],
        [
            vert(x1, y1, z2, u2, v2),
            vert(x1, y2, z2, u2, v1),
            vert(x2, y2, z1, u1, v1),
            vert(x2, y1, z1, u1, v2),
        ],
        [
            vert(x2, y1, z1, u2, v2),
            vert(x2, y2, z1, u2, v1),
            vert(x1, y2, z2, u1, v1),
            vert(x1, y1, z2, u1, v2),
        ],
    ]
}

/// Writes the index pattern for `quad_count` quads. Vertex numbers wrap at
/// 65536, so each run of [`MAX_INDICES`] indices addresses its own page of
/// [`MAX_VERTEX`] vertices.
pub fn fill_quad_indices(indices: &mut Vec<u16>, quad_count: usize) {
    indices.clear();
    indices.reserve(quad_count * 6);
    for quad in 0..quad_count {
        let base = ((quad * 4) % MAX_VERTEX as usize) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Splits an index range at page boundaries, yielding
/// `(start_index, index_count, base_vertex)` for each draw.
pub fn index_pages(start: u32, count: u32) -> impl Iterator<Item = (u32, u32, u32)> {
    let end = start + count;
    let mut cur = start;
    std::iter::from_fn(move || {
        if cur >= end {
            return None;
        }
        let page = cur / MAX_INDICES;
        let page_end = ((page + 1) * MAX_INDICES).min(end);
        let draw = (cur, page_end - cur, page * MAX_VERTEX);
        cur = page_end;
        Some(draw)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretched_quad_spans_the_run() {
        let quad = face_quad(Face::YMax, IVec3::new(2, 5, 7), 4, 1.0, 0.0, 1.0 / 64.0);
        let xs: Vec<f32> = quad.positions.iter().map(|p| p[0]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 2.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 6.0);
        assert!(quad.positions.iter().all(|p| p[1] == 6.0));
        let max_u = quad.uvs.iter().map(|uv| uv[0]).fold(f32::MIN, f32::max);
        assert!((max_u - (3.0 + UV2_SCALE)).abs() < 1e-6);
    }

    #[test]
    fn x_faces_stretch_along_z() {
        let quad = face_quad(Face::XMin, IVec3::new(0, 0, 0), 16, 1.0, 0.0, 1.0);
        assert!(quad.positions.iter().all(|p| p[0] == 0.0));
        let max_z = quad.positions.iter().map(|p| p[2]).fold(f32::MIN, f32::max);
        assert_eq!(max_z, 16.0);
    }

    #[test]
    fn quad_winding_faces_outward() {
        let pos = IVec3::new(3, 3, 3);
        for face in Face::ALL {
            let quad = face_quad(face, pos, 1, 1.0, 0.0, 1.0);
            let [a, b, c] = [quad.positions[0], quad.positions[1], quad.positions[2]];
            let e1 = glam::Vec3::from(b) - glam::Vec3::from(a);
            let e2 = glam::Vec3::from(c) - glam::Vec3::from(a);
            let n = e1.cross(e2);
            let [nx, ny, nz] = face.normal();
            let expected = glam::Vec3::new(nx as f32, ny as f32, nz as f32);
            assert!(n.dot(expected) > 0.0, "{:?} winds inward", face);
        }
    }

    #[test]
    fn indices_wrap_every_page() {
        let mut indices = Vec::new();
        fill_quad_indices(&mut indices, (MAX_VERTEX as usize / 4) + 1);
        assert_eq!(&indices[..6], &[0, 1, 2, 0, 2, 3]);
        let tail = &indices[MAX_INDICES as usize..];
        assert_eq!(tail, &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn ranges_crossing_a_page_are_split() {
        let draws: Vec<_> = index_pages(MAX_INDICES - 12, 24).collect();
        assert_eq!(
            draws,
            vec![(MAX_INDICES - 12, 12, 0), (MAX_INDICES, 12, MAX_VERTEX)]
        );
        let single: Vec<_> = index_pages(6, 30).collect();
        assert_eq!(single, vec![(6, 30, 0)]);
        assert_eq!(index_pages(10, 0).count(), 0);
    }
}
