//! Chunk cache and per-frame rebuild scheduling.

use std::sync::Arc;

use glam::IVec3;

use crate::camera::CameraState;
use crate::constants::*;
use crate::core::{BlockInfo, Face};
use crate::render::builder::ChunkMeshBuilder;
use crate::render::device::{BufferHandle, GraphicsDevice};
use crate::render::frustum::FrustumCulling;
use crate::render::sorter::ChunkSorter;
use crate::utils::settings::RenderSettings;
use crate::world::WorldStore;

/// One uploaded buffer for a single atlas strip. Index counts are laid out
/// sprites first, then faces in [`Face`] order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChunkPartInfo {
    pub handle: BufferHandle,
    /// Indices over all four sprite groups.
    pub sprite_count: u32,
    pub counts: [u32; FACE_COUNT],
}

impl ChunkPartInfo {
    pub fn is_empty(&self) -> bool {
        !self.handle.is_valid()
    }

    pub fn total_indices(&self) -> u32 {
        self.sprite_count + self.counts.iter().sum::<u32>()
    }

    /// First index of `face`'s range.
    pub fn face_offset(&self, face: Face) -> u32 {
        self.sprite_count + self.counts[..face.index()].iter().sum::<u32>()
    }
}

/// Render state of one chunk slot.
#[derive(Debug)]
pub struct ChunkInfo {
    pub center: IVec3,
    pub visible: bool,
    /// Built and found to have no geometry.
    pub empty: bool,
    pub all_air: bool,
    pub pending_rebuild: bool,
    pub draw_face: [bool; FACE_COUNT],
    pub normal_parts: Option<Vec<ChunkPartInfo>>,
    pub translucent_parts: Option<Vec<ChunkPartInfo>>,
}

impl ChunkInfo {
    pub fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self {
            center: IVec3::new(cx, cy, cz) * CHUNK_SIZE + IVec3::splat(HALF_CHUNK_SIZE),
            visible: true,
            empty: false,
            all_air: false,
            pending_rebuild: false,
            draw_face: [true; FACE_COUNT],
            normal_parts: None,
            translucent_parts: None,
        }
    }

    pub fn coords(&self) -> IVec3 {
        (self.center - IVec3::splat(HALF_CHUNK_SIZE)) >> CHUNK_SHIFT
    }

    pub fn has_geometry(&self) -> bool {
        self.normal_parts.is_some() || self.translucent_parts.is_some()
    }

    fn reset(&mut self) {
        let c = self.coords();
        *self = Self::new(c.x, c.y, c.z);
    }
}

/// Per-strip usage counters for one pass, plus the flags the renderer uses
/// to skip strips with nothing in view.
#[derive(Debug, Default)]
pub struct AtlasUsage {
    pub used: Vec<i32>,
    pub has_parts: Vec<bool>,
    pub check_parts: Vec<bool>,
}

impl AtlasUsage {
    fn new(rows: usize) -> Self {
        Self {
            used: vec![0; rows],
            has_parts: vec![false; rows],
            check_parts: vec![true; rows],
        }
    }

    fn add(&mut self, parts: &[ChunkPartInfo]) {
        for (row, part) in parts.iter().enumerate() {
            if !part.is_empty() {
                self.used[row] += 1;
            }
        }
    }

    fn remove(&mut self, parts: &[ChunkPartInfo]) {
        for (row, part) in parts.iter().enumerate() {
            if !part.is_empty() {
                self.used[row] -= 1;
            }
        }
    }

    fn reset_counts(&mut self) {
        self.used.iter_mut().for_each(|u| *u = 0);
    }

    fn reset_flags(&mut self) {
        self.has_parts.iter_mut().for_each(|h| *h = false);
        self.check_parts.iter_mut().for_each(|c| *c = true);
    }

    pub fn rows(&self) -> usize {
        self.used.len()
    }
}

/// `(max(d, 16) + 24)^2`
pub fn adjust_view_dist(dist: i32) -> u64 {
    let dist = (dist.max(CHUNK_SIZE) as u64) + 24;
    dist * dist
}

/// Everything the draw passes read in one borrow.
pub struct RenderView<'a> {
    pub chunks: &'a [ChunkInfo],
    pub render_list: &'a [usize],
    pub normal: &'a mut AtlasUsage,
    pub translucent: &'a mut AtlasUsage,
}

pub struct ChunkUpdater {
    chunks: Vec<ChunkInfo>,
    chunks_x: i32,
    chunks_y: i32,
    chunks_z: i32,
    sorter: ChunkSorter,
    builder: ChunkMeshBuilder,
    normal: AtlasUsage,
    translucent: AtlasUsage,
    render_list: Vec<usize>,
    build_budget: i32,
    max_updates: i32,
    view_distance: i32,
    user_view_distance: i32,
    last_camera: Option<CameraState>,
    chunk_updates: u32,
    total_builds: u64,
}

impl ChunkUpdater {
    pub fn new(info: Arc<BlockInfo>, settings: &RenderSettings) -> Self {
        let rows = info.used_atlases();
        Self {
            chunks: Vec::new(),
            chunks_x: 0,
            chunks_y: 0,
            chunks_z: 0,
            sorter: ChunkSorter::default(),
            builder: ChunkMeshBuilder::new(info, settings.smooth_lighting),
            normal: AtlasUsage::new(rows),
            translucent: AtlasUsage::new(rows),
            render_list: Vec::new(),
            build_budget: INITIAL_BUILD_BUDGET,
            max_updates: settings.max_chunk_updates.clamp(MIN_BUILD_BUDGET, MAX_BUILD_BUDGET),
            view_distance: settings.view_distance,
            user_view_distance: settings.user_view_distance,
            last_camera: None,
            chunk_updates: 0,
            total_builds: 0,
        }
    }

    pub fn is_loaded(&self) -> bool {
        !self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[ChunkInfo] {
        &self.chunks
    }

    pub fn render_list(&self) -> &[usize] {
        &self.render_list
    }

    pub fn sorter(&self) -> &ChunkSorter {
        &self.sorter
    }

    pub fn builder(&self) -> &ChunkMeshBuilder {
        &self.builder
    }

    pub fn normal_usage(&self) -> &AtlasUsage {
        &self.normal
    }

    pub fn translucent_usage(&self) -> &AtlasUsage {
        &self.translucent
    }

    pub fn build_budget(&self) -> i32 {
        self.build_budget
    }

    /// Builds done during the last update.
    pub fn chunk_updates(&self) -> u32 {
        self.chunk_updates
    }

    pub fn total_builds(&self) -> u64 {
        self.total_builds
    }

    pub fn set_view_distance(&mut self, dist: i32) {
        self.view_distance = dist;
    }

    pub fn set_user_view_distance(&mut self, dist: i32) {
        self.user_view_distance = dist;
    }

    pub fn render_view(&mut self) -> RenderView<'_> {
        RenderView {
            chunks: &self.chunks,
            render_list: &self.render_list,
            normal: &mut self.normal,
            translucent: &mut self.translucent,
        }
    }

    pub fn pack(&self, cx: i32, cy: i32, cz: i32) -> Option<usize> {
        let in_range = cx >= 0
            && cy >= 0
            && cz >= 0
            && cx < self.chunks_x
            && cy < self.chunks_y
            && cz < self.chunks_z;
        in_range.then(|| (cx + self.chunks_x * (cy + cz * self.chunks_y)) as usize)
    }

    pub fn get_chunk(&self, cx: i32, cy: i32, cz: i32) -> Option<&ChunkInfo> {
        self.pack(cx, cy, cz).map(|i| &self.chunks[i])
    }

    pub fn get_chunk_mut(&mut self, cx: i32, cy: i32, cz: i32) -> Option<&mut ChunkInfo> {
        self.pack(cx, cy, cz).map(|i| &mut self.chunks[i])
    }

    /// Allocates one slot per chunk of the newly loaded world, freeing any
    /// geometry left over from the previous one.
    pub fn on_new_map_loaded(&mut self, world: &dyn WorldStore, device: &mut dyn GraphicsDevice) {
        self.delete_all(device);
        let (chunks_x, chunks_y, chunks_z) = world.chunk_dims();
        self.chunks_x = chunks_x;
        self.chunks_y = chunks_y;
        self.chunks_z = chunks_z;

        self.chunks.clear();
        for cz in 0..chunks_z {
            for cy in 0..chunks_y {
                for cx in 0..chunks_x {
                    self.chunks.push(ChunkInfo::new(cx, cy, cz));
                }
            }
        }
        self.sorter.reset(self.chunks.len());
        self.render_list.clear();
        self.normal.reset_counts();
        self.translucent.reset_counts();
        self.normal.reset_flags();
        self.translucent.reset_flags();
        self.build_budget = INITIAL_BUILD_BUDGET;
        self.last_camera = None;
        tracing::debug!(chunks_x, chunks_y, chunks_z, "Allocated chunk cache");
    }

    /// Frees all geometry and drops the chunk slots.
    pub fn clear(&mut self, device: &mut dyn GraphicsDevice) {
        self.delete_all(device);
        self.chunks.clear();
        self.render_list.clear();
        self.sorter.reset(0);
        self.chunks_x = 0;
        self.chunks_y = 0;
        self.chunks_z = 0;
    }

    fn delete_all(&mut self, device: &mut dyn GraphicsDevice) {
        for info in &mut self.chunks {
            delete_chunk(info, device, &mut self.normal, &mut self.translucent);
        }
        self.normal.reset_counts();
        self.translucent.reset_counts();
    }

    /// Throws away every chunk's geometry so the whole world is rebuilt.
    pub fn refresh_all(&mut self, device: &mut dyn GraphicsDevice) {
        self.delete_all(device);
        for info in &mut self.chunks {
            info.reset();
        }
        self.render_list.clear();
        self.sorter.invalidate();
        self.normal.reset_flags();
        self.translucent.reset_flags();
        tracing::debug!(chunks = self.chunks.len(), "Refreshing all chunks");
    }

    pub fn apply_mesh_builder(&mut self, device: &mut dyn GraphicsDevice, smooth_lighting: bool) {
        self.builder.set_smooth_lighting(smooth_lighting);
        tracing::debug!(builder = self.builder.strategy_name(), "Switched mesh builder");
        self.refresh_all(device);
    }

    /// Queues a rebuild. Chunks known to be all air are left alone.
    pub fn mark_dirty(&mut self, cx: i32, cy: i32, cz: i32) {
        if let Some(info) = self.get_chunk_mut(cx, cy, cz) {
            if info.all_air {
                return;
            }
            info.empty = false;
            info.pending_rebuild = true;
        }
    }

    /// Queues a rebuild of the chunk holding a changed block, and of the
    /// neighbours that share the face it sits against.
    pub fn redraw_block(&mut self, x: i32, y: i32, z: i32) {
        let (cx, cy, cz) = (x >> CHUNK_SHIFT, y >> CHUNK_SHIFT, z >> CHUNK_SHIFT);
        let (lx, ly, lz) = (x & CHUNK_MASK, y & CHUNK_MASK, z & CHUNK_MASK);
        self.mark_dirty(cx, cy, cz);

        if lx == 0 {
            self.mark_dirty(cx - 1, cy, cz);
        } else if lx == CHUNK_MASK {
            self.mark_dirty(cx + 1, cy, cz);
        }
        if ly == 0 {
            self.mark_dirty(cx, cy - 1, cz);
        } else if ly == CHUNK_MASK {
            self.mark_dirty(cx, cy + 1, cz);
        }
        if lz == 0 {
            self.mark_dirty(cx, cy, cz - 1);
        } else if lz == CHUNK_MASK {
            self.mark_dirty(cx, cy, cz + 1);
        }
    }

    /// Queues every chunk on the horizontal world edge below `max_height`.
    pub fn refresh_borders(&mut self, max_height: i32) {
        self.sorter.invalidate();
        for cz in 0..self.chunks_z {
            for cy in 0..self.chunks_y {
                for cx in 0..self.chunks_x {
                    let on_border = cx == 0
                        || cz == 0
                        || cx == self.chunks_x - 1
                        || cz == self.chunks_z - 1;
                    if on_border && cy * CHUNK_SIZE < max_height {
                        self.mark_dirty(cx, cy, cz);
                    }
                }
            }
        }
    }

    fn adjust_budget(&mut self, delta: f64) {
        self.build_budget += if delta < CHUNK_TARGET_TIME { 1 } else { -1 };
        self.build_budget = self.build_budget.clamp(MIN_BUILD_BUDGET, self.max_updates);
    }

    /// Re-sorts, rebuilds within budget and refreshes the render list.
    pub fn update(
        &mut self,
        world: &dyn WorldStore,
        device: &mut dyn GraphicsDevice,
        camera: &CameraState,
        frustum: &FrustumCulling,
        delta: f64,
    ) {
        if !self.is_loaded() {
            return;
        }
        let resorted = self.sorter.update(camera.position, &mut self.chunks);

        self.chunk_updates = 0;
        self.adjust_budget(delta);
        let moved = self.last_camera.as_ref() != Some(camera);
        self.last_camera = Some(*camera);

        if moved {
            self.update_moved(world, device, frustum);
        } else {
            self.update_still(world, device, frustum);
        }

        if moved || resorted || self.chunk_updates > 0 {
            self.normal.reset_flags();
            self.translucent.reset_flags();
        }
    }

    fn update_moved(&mut self, world: &dyn WorldStore, device: &mut dyn GraphicsDevice, frustum: &FrustumCulling) {
        let view_dist = adjust_view_dist(self.view_distance);
        let unload_dist = unload_distance(self.user_view_distance);
        self.render_list.clear();

        for slot in 0..self.sorter.sorted().len() {
            let index = self.sorter.sorted()[slot];
            let dist = u64::from(self.sorter.distances()[slot]);
            let info = &mut self.chunks[index];
            if info.empty {
                continue;
            }
            if dist >= unload_dist {
                if info.has_geometry() {
                    delete_chunk(info, device, &mut self.normal, &mut self.translucent);
                }
                continue;
            }

            let needs_build = info.pending_rebuild || !info.has_geometry();
            if needs_build && dist <= view_dist && (self.chunk_updates as i32) < self.build_budget {
                self.build(index, world, device);
            }

            let info = &mut self.chunks[index];
            info.visible = is_visible(info, dist, view_dist, frustum);
            if info.visible && !info.empty {
                self.render_list.push(index);
            }
        }
    }

    fn update_still(&mut self, world: &dyn WorldStore, device: &mut dyn GraphicsDevice, frustum: &FrustumCulling) {
        let view_dist = adjust_view_dist(self.view_distance);
        let user_dist = adjust_view_dist(self.user_view_distance);
        let unload_dist = unload_distance(self.user_view_distance);
        self.render_list.clear();

        for slot in 0..self.sorter.sorted().len() {
            let index = self.sorter.sorted()[slot];
            let dist = u64::from(self.sorter.distances()[slot]);
            let info = &mut self.chunks[index];
            if info.empty {
                continue;
            }
            if dist >= unload_dist {
                if info.has_geometry() {
                    delete_chunk(info, device, &mut self.normal, &mut self.translucent);
                }
                continue;
            }

            let needs_build = info.pending_rebuild || !info.has_geometry();
            if needs_build && dist <= user_dist && (self.chunk_updates as i32) < self.build_budget {
                self.build(index, world, device);
                // only chunks built this frame need their visibility redone
                let info = &mut self.chunks[index];
                info.visible = is_visible(info, dist, view_dist, frustum);
                if info.visible && !info.empty {
                    self.render_list.push(index);
                }
            } else if info.visible {
                self.render_list.push(index);
            }
        }
    }

    fn build(&mut self, index: usize, world: &dyn WorldStore, device: &mut dyn GraphicsDevice) {
        let info = &mut self.chunks[index];
        delete_chunk(info, device, &mut self.normal, &mut self.translucent);

        self.chunk_updates += 1;
        self.total_builds += 1;
        info.pending_rebuild = false;

        let c = info.coords();
        let built = self.builder.build_chunk(world, device, c.x, c.y, c.z);
        info.all_air = built.all_air;
        if built.is_empty() {
            info.empty = true;
            return;
        }
        if let Some(parts) = &built.normal_parts {
            self.normal.add(parts);
        }
        if let Some(parts) = &built.translucent_parts {
            self.translucent.add(parts);
        }
        info.normal_parts = built.normal_parts;
        info.translucent_parts = built.translucent_parts;
    }
}

/// Squared distance at which geometry is freed regardless of budget.
fn unload_distance(user_view_distance: i32) -> u64 {
    let dist = user_view_distance.max(0) as u64 + UNLOAD_MARGIN as u64;
    dist * dist
}

fn is_visible(info: &ChunkInfo, dist: u64, view_dist: u64, frustum: &FrustumCulling) -> bool {
    let c = info.center.as_vec3();
    dist <= view_dist && frustum.sphere_visible(c.x, c.y, c.z, CHUNK_RADIUS)
}

/// Frees a chunk's buffers and forgets its build state.
fn delete_chunk(
    info: &mut ChunkInfo,
    device: &mut dyn GraphicsDevice,
    normal: &mut AtlasUsage,
    translucent: &mut AtlasUsage,
) {
    info.empty = false;
    info.all_air = false;

    if let Some(mut parts) = info.normal_parts.take() {
        normal.remove(&parts);
        for part in &mut parts {
            device.delete_buffer(&mut part.handle);
        }
    }
    if let Some(mut parts) = info.translucent_parts.take() {
        translucent.remove(&parts);
        for part in &mut parts {
            device.delete_buffer(&mut part.handle);
        }
    }
}
