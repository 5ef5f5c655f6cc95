//! Per-frame draw submission.
//!
//! Chunks are drawn one atlas strip at a time. Opposite faces sit next to
//! each other inside a part, so a visible pair becomes a single draw.

use std::sync::Arc;

use crate::camera::CameraState;
use crate::constants::CHUNK_SHIFT;
use crate::core::{Atlas1D, BlockInfo, BlockType, Face};
use crate::render::device::{BufferHandle, GraphicsDevice};
use crate::render::frustum::FrustumCulling;
use crate::render::mesh;
use crate::render::updater::{ChunkInfo, ChunkPartInfo, ChunkUpdater};
use crate::utils::settings::RenderSettings;
use crate::world::WorldStore;

const FACE_PAIRS: [(Face, Face); 3] = [
    (Face::XMin, Face::XMax),
    (Face::ZMin, Face::ZMax),
    (Face::YMin, Face::YMax),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub render_chunks: usize,
    pub chunk_updates: u32,
    pub total_builds: u64,
    pub build_budget: i32,
}

pub struct MapRenderer {
    info: Arc<BlockInfo>,
    updater: ChunkUpdater,
    frustum: FrustumCulling,
    in_translucent: bool,
}

impl MapRenderer {
    pub fn new(settings: &RenderSettings) -> Self {
        let atlas = Atlas1D::new(
            settings.tiles_per_row,
            settings.atlas_rows,
            settings.max_atlas_tiles_per_strip,
        );
        Self::with_block_info(Arc::new(BlockInfo::new(atlas)), settings)
    }

    pub fn with_block_info(info: Arc<BlockInfo>, settings: &RenderSettings) -> Self {
        Self {
            updater: ChunkUpdater::new(info.clone(), settings),
            info,
            frustum: FrustumCulling::default(),
            in_translucent: false,
        }
    }

    pub fn block_info(&self) -> &Arc<BlockInfo> {
        &self.info
    }

    pub fn updater(&self) -> &ChunkUpdater {
        &self.updater
    }

    pub fn frustum(&self) -> &FrustumCulling {
        &self.frustum
    }

    /// Whether the camera sat inside a translucent block at the last update.
    pub fn in_translucent(&self) -> bool {
        self.in_translucent
    }

    pub fn on_new_map(&mut self, device: &mut dyn GraphicsDevice) {
        tracing::debug!("Clearing map renderer");
        self.updater.clear(device);
        self.in_translucent = false;
    }

    pub fn on_new_map_loaded(&mut self, world: &dyn WorldStore, device: &mut dyn GraphicsDevice) {
        self.updater.on_new_map_loaded(world, device);
    }

    pub fn set_view_distance(&mut self, dist: i32) {
        self.updater.set_view_distance(dist);
    }

    pub fn set_user_view_distance(&mut self, dist: i32) {
        self.updater.set_user_view_distance(dist);
    }

    pub fn get_chunk(&self, cx: i32, cy: i32, cz: i32) -> Option<&ChunkInfo> {
        self.updater.get_chunk(cx, cy, cz)
    }

    pub fn refresh_chunk(&mut self, cx: i32, cy: i32, cz: i32) {
        self.updater.mark_dirty(cx, cy, cz);
    }

    /// Reacts to a block change at world position (x, y, z).
    pub fn redraw_block(&mut self, x: i32, y: i32, z: i32, block: BlockType) {
        let (cx, cy, cz) = (x >> CHUNK_SHIFT, y >> CHUNK_SHIFT, z >> CHUNK_SHIFT);
        if !self.info.is_air(block) {
            if let Some(info) = self.updater.get_chunk_mut(cx, cy, cz) {
                info.all_air = false;
            }
        }
        self.updater.redraw_block(x, y, z);
    }

    pub fn refresh_all(&mut self, device: &mut dyn GraphicsDevice) {
        self.updater.refresh_all(device);
    }

    pub fn refresh_borders(&mut self, max_height: i32) {
        self.updater.refresh_borders(max_height);
    }

    pub fn apply_mesh_builder(&mut self, device: &mut dyn GraphicsDevice, smooth_lighting: bool) {
        self.updater.apply_mesh_builder(device, smooth_lighting);
    }

    pub fn render_stats(&self) -> RenderStats {
        RenderStats {
            render_chunks: self.updater.render_list().len(),
            chunk_updates: self.updater.chunk_updates(),
            total_builds: self.updater.total_builds(),
            build_budget: self.updater.build_budget(),
        }
    }

    pub fn update(
        &mut self,
        world: &dyn WorldStore,
        device: &mut dyn GraphicsDevice,
        camera: &CameraState,
        delta: f64,
    ) {
        if !self.updater.is_loaded() {
            return;
        }
        self.frustum.set_frustum(&camera.view_proj);

        let p = camera.position.floor().as_ivec3();
        self.in_translucent = self.info.is_translucent(world.get_block(p.x, p.y, p.z));

        self.updater.update(world, device, camera, &self.frustum, delta);
    }

    pub fn render_opaque(&mut self, device: &mut dyn GraphicsDevice, _delta: f64) {
        if !self.updater.is_loaded() {
            return;
        }
        let view = self.updater.render_view();
        device.set_texturing(true);

        for row in 0..view.normal.rows() {
            if view.normal.used[row] <= 0 {
                continue;
            }
            if view.normal.has_parts[row] || view.normal.check_parts[row] {
                device.bind_texture(row);
                if render_normal_batch(device, view.chunks, view.render_list, row) {
                    view.normal.has_parts[row] = true;
                }
                view.normal.check_parts[row] = false;
            }
        }
        device.set_texturing(false);
    }

    pub fn render_translucent(&mut self, device: &mut dyn GraphicsDevice, _delta: f64) {
        if !self.updater.is_loaded() {
            return;
        }
        let in_translucent = self.in_translucent;
        let view = self.updater.render_view();

        // depth only
        device.set_texturing(false);
        device.set_blending(false);
        device.set_color_write(false);
        for row in 0..view.translucent.rows() {
            if view.translucent.used[row] <= 0 {
                continue;
            }
            if view.translucent.has_parts[row] || view.translucent.check_parts[row] {
                if render_translucent_batch(device, view.chunks, view.render_list, row, in_translucent) {
                    view.translucent.has_parts[row] = true;
                }
                view.translucent.check_parts[row] = false;
            }
        }

        // colour, against the depth laid down above
        device.set_blending(true);
        device.set_texturing(true);
        device.set_color_write(true);
        device.set_depth_write(false);
        for row in 0..view.translucent.rows() {
            if view.translucent.used[row] <= 0 || !view.translucent.has_parts[row] {
                continue;
            }
            device.bind_texture(row);
            render_translucent_batch(device, view.chunks, view.render_list, row, in_translucent);
        }

        device.set_depth_write(true);
        device.set_blending(false);
        device.set_texturing(false);
    }
}

/// Issues one range, split at 65536-vertex page boundaries.
fn draw_range(device: &mut dyn GraphicsDevice, handle: BufferHandle, start: u32, count: u32) {
    for (start, count, base_vertex) in mesh::index_pages(start, count) {
        device.draw_indexed(handle, start, count, base_vertex);
    }
}

fn draw_face_pair(
    device: &mut dyn GraphicsDevice,
    part: &ChunkPartInfo,
    offset: u32,
    (min, max): (Face, Face),
    (draw_min, draw_max): (bool, bool),
    cull_merged: bool,
) {
    let min_count = part.counts[min.index()];
    let max_count = part.counts[max.index()];
    if draw_min && draw_max {
        if cull_merged {
            device.set_face_culling(true);
        }
        draw_range(device, part.handle, offset, min_count + max_count);
        if cull_merged {
            device.set_face_culling(false);
        }
    } else if draw_min {
        draw_range(device, part.handle, offset, min_count);
    } else if draw_max {
        draw_range(device, part.handle, offset + min_count, max_count);
    }
}

fn part_for_row(parts: &Option<Vec<ChunkPartInfo>>, row: usize) -> Option<&ChunkPartInfo> {
    parts
        .as_ref()
        .and_then(|parts| parts.get(row))
        .filter(|part| !part.is_empty())
}

/// Returns true when any chunk in view had a part for `row`.
fn render_normal_batch(
    device: &mut dyn GraphicsDevice,
    chunks: &[ChunkInfo],
    render_list: &[usize],
    row: usize,
) -> bool {
    let mut has_parts = false;
    for &index in render_list {
        let info = &chunks[index];
        let Some(part) = part_for_row(&info.normal_parts, row) else {
            continue;
        };
        has_parts = true;

        let mut offset = part.sprite_count;
        for (min, max) in FACE_PAIRS {
            let draw_min = info.draw_face[min.index()] && part.counts[min.index()] != 0;
            let draw_max = info.draw_face[max.index()] && part.counts[max.index()] != 0;
            draw_face_pair(device, part, offset, (min, max), (draw_min, draw_max), true);
            offset += part.counts[min.index()] + part.counts[max.index()];
        }

        if part.sprite_count == 0 {
            continue;
        }
        let draw = |face: Face| info.draw_face[face.index()];
        let groups = [
            draw(Face::XMax) || draw(Face::ZMin),
            draw(Face::XMin) || draw(Face::ZMax),
            draw(Face::XMin) || draw(Face::ZMin),
            draw(Face::XMax) || draw(Face::ZMax),
        ];
        let count = part.sprite_count / 4;
        device.set_face_culling(true);
        for (group, visible) in groups.into_iter().enumerate() {
            if visible {
                draw_range(device, part.handle, group as u32 * count, count);
            }
        }
        device.set_face_culling(false);
    }
    has_parts
}

fn render_translucent_batch(
    device: &mut dyn GraphicsDevice,
    chunks: &[ChunkInfo],
    render_list: &[usize],
    row: usize,
    in_translucent: bool,
) -> bool {
    let mut has_parts = false;
    for &index in render_list {
        let info = &chunks[index];
        let Some(part) = part_for_row(&info.translucent_parts, row) else {
            continue;
        };
        has_parts = true;

        let mut offset = part.sprite_count;
        for (min, max) in FACE_PAIRS {
            let draw_min = (in_translucent || info.draw_face[min.index()]) && part.counts[min.index()] != 0;
            let draw_max = (in_translucent || info.draw_face[max.index()]) && part.counts[max.index()] != 0;
            draw_face_pair(device, part, offset, (min, max), (draw_min, draw_max), false);
            offset += part.counts[min.index()] + part.counts[max.index()];
        }
    }
    has_parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FACE_COUNT, MAX_INDICES, MAX_VERTEX};
    use crate::render::device::{DeviceCall, RecordingDevice};

    fn part(counts: [u32; FACE_COUNT], sprite_count: u32) -> ChunkPartInfo {
        ChunkPartInfo {
            handle: BufferHandle(7),
            sprite_count,
            counts,
        }
    }

    fn draws(device: &RecordingDevice) -> Vec<(u32, u32, u32)> {
        device
            .draws()
            .map(|call| match *call {
                DeviceCall::Draw {
                    start_index,
                    index_count,
                    base_vertex,
                    ..
                } => (start_index, index_count, base_vertex),
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn visible_pair_is_one_culled_draw() {
        let mut device = RecordingDevice::new();
        let p = part([6, 12, 0, 0, 0, 0], 0);
        draw_face_pair(&mut device, &p, 0, FACE_PAIRS[0], (true, true), true);
        assert_eq!(
            device.calls,
            vec![
                DeviceCall::FaceCulling(true),
                DeviceCall::Draw {
                    handle: p.handle,
                    start_index: 0,
                    index_count: 18,
                    base_vertex: 0
                },
                DeviceCall::FaceCulling(false),
            ]
        );
    }

    #[test]
    fn lone_max_face_starts_after_min() {
        let mut device = RecordingDevice::new();
        let p = part([0, 0, 6, 12, 0, 0], 24);
        draw_face_pair(&mut device, &p, 24, FACE_PAIRS[1], (false, true), true);
        assert_eq!(draws(&device), vec![(30, 12, 0)]);
        assert!(!device.calls.iter().any(|c| matches!(c, DeviceCall::FaceCulling(_))));
    }

    #[test]
    fn sprite_groups_follow_face_flags() {
        let mut info = ChunkInfo::new(0, 0, 0);
        info.normal_parts = Some(vec![part([0; FACE_COUNT], 24)]);
        info.draw_face = [false, true, false, false, true, true];

        let mut device = RecordingDevice::new();
        assert!(render_normal_batch(&mut device, std::slice::from_ref(&info), &[0], 0));
        // only XMax is set: groups 0 and 3
        assert_eq!(draws(&device), vec![(0, 6, 0), (18, 6, 0)]);
    }

    #[test]
    fn huge_parts_split_at_the_page_boundary() {
        let mut device = RecordingDevice::new();
        let p = part([MAX_INDICES, 6, 0, 0, 0, 0], 0);
        draw_face_pair(&mut device, &p, 0, FACE_PAIRS[0], (true, true), false);
        assert_eq!(draws(&device), vec![(0, MAX_INDICES, 0), (MAX_INDICES, 6, MAX_VERTEX)]);
    }

    #[test]
    fn translucent_media_draws_every_face() {
        let mut info = ChunkInfo::new(0, 0, 0);
        info.translucent_parts = Some(vec![part([6; FACE_COUNT], 0)]);
        info.draw_face = [false; FACE_COUNT];

        let mut device = RecordingDevice::new();
        render_translucent_batch(&mut device, std::slice::from_ref(&info), &[0], 0, false);
        assert!(draws(&device).is_empty());

        render_translucent_batch(&mut device, std::slice::from_ref(&info), &[0], 0, true);
        assert_eq!(draws(&device), vec![(0, 12, 0), (12, 12, 0), (24, 12, 0)]);
        assert!(!device.calls.iter().any(|c| matches!(c, DeviceCall::FaceCulling(_))));
    }
}
