//! Greedy chunk mesher.
//!
//! A build copies one chunk plus a one-voxel border into a padded buffer,
//! merges runs of identical visible faces, then emits and uploads the quads
//! grouped by pass and by atlas strip. How runs are merged and coloured is
//! delegated to a [`MeshBuilder`] strategy.

use std::sync::Arc;

use glam::IVec3;

use crate::constants::*;
use crate::core::{BlockInfo, BlockType, Chunk, Face, Vertex};
use crate::render::device::GraphicsDevice;
use crate::render::mesh::{self, FACE_CORNERS, FaceQuad};
use crate::render::updater::ChunkPartInfo;
use crate::world::WorldStore;

const SIZE: usize = CHUNK_SIZE as usize;

/// Index into the padded 18^3 buffer for chunk-local coordinates in -1..=16.
#[inline]
pub fn pack_padded(x: i32, y: i32, z: i32) -> usize {
    debug_assert!((-1..=CHUNK_SIZE).contains(&x));
    debug_assert!((-1..=CHUNK_SIZE).contains(&y));
    debug_assert!((-1..=CHUNK_SIZE).contains(&z));
    (y + 1) as usize * EXTCHUNK_SIZE_2 + (z + 1) as usize * EXTCHUNK_SIZE + (x + 1) as usize
}

/// Index of the first face slot of a voxel in the run-length buffer.
#[inline]
pub fn pack_counts(x: i32, y: i32, z: i32) -> usize {
    (((y << 8) | (z << 4) | x) as usize) * FACE_COUNT
}

/// Read-only view of the current build shared with the strategy.
pub struct BuildContext<'a> {
    pub info: &'a BlockInfo,
    pub chunk: &'a [BlockType],
    pub metadata: &'a [u8],
    /// World position of the chunk's minimum corner.
    pub origin: IVec3,
}

impl BuildContext<'_> {
    #[inline]
    pub fn neighbour(&self, index: usize, face: Face) -> BlockType {
        self.chunk[(index as isize + face.padded_offset()) as usize]
    }
}

/// One merged run of faces, anchored at the voxel that started it.
#[derive(Clone, Copy, Debug)]
pub struct FaceRun {
    pub block: BlockType,
    pub face: Face,
    /// World position of the first voxel.
    pub pos: IVec3,
    /// Padded index of the first voxel.
    pub chunk_index: usize,
    pub count: i32,
}

/// Geometry for one atlas strip within one pass.
#[derive(Default)]
pub struct PartBuilder {
    sprites: [Vec<Vertex>; 4],
    faces: [Vec<Vertex>; FACE_COUNT],
    sprite_quads: u32,
    face_quads: [u32; FACE_COUNT],
}

impl PartBuilder {
    fn reset(&mut self) {
        for group in &mut self.sprites {
            group.clear();
        }
        for face in &mut self.faces {
            face.clear();
        }
        self.sprite_quads = 0;
        self.face_quads = [0; FACE_COUNT];
    }

    fn reserve(&mut self) {
        for group in &mut self.sprites {
            group.reserve(self.sprite_quads as usize * 4);
        }
        for (face, quads) in self.faces.iter_mut().zip(self.face_quads) {
            face.reserve(quads as usize * 4);
        }
    }

    /// Quads tallied during the stretch phase.
    pub fn quad_count(&self) -> u32 {
        self.sprite_quads * 4 + self.face_quads.iter().sum::<u32>()
    }

    pub fn face_vertices(&mut self, face: Face) -> &mut Vec<Vertex> {
        &mut self.faces[face.index()]
    }

    pub fn sprite_vertices(&mut self, group: usize) -> &mut Vec<Vertex> {
        &mut self.sprites[group]
    }

    fn emitted_vertices(&self) -> usize {
        self.sprites.iter().map(Vec::len).sum::<usize>()
            + self.faces.iter().map(Vec::len).sum::<usize>()
    }

    fn upload(
        &self,
        device: &mut dyn GraphicsDevice,
        vertices: &mut Vec<Vertex>,
        indices: &mut Vec<u16>,
    ) -> ChunkPartInfo {
        if self.emitted_vertices() == 0 {
            return ChunkPartInfo::default();
        }
        debug_assert_eq!(self.emitted_vertices(), self.quad_count() as usize * 4);

        vertices.clear();
        for group in &self.sprites {
            vertices.extend_from_slice(group);
        }
        for face in &self.faces {
            vertices.extend_from_slice(face);
        }
        mesh::fill_quad_indices(indices, vertices.len() / 4);

        let quad_indices = |len: usize| (len / 4 * 6) as u32;
        ChunkPartInfo {
            handle: device.create_vertex_index_buffer(vertices, indices),
            sprite_count: self.sprites.iter().map(|g| quad_indices(g.len())).sum(),
            counts: std::array::from_fn(|f| quad_indices(self.faces[f].len())),
        }
    }
}

/// Per-strip part builders for the solid and translucent passes.
pub struct PartSet {
    normal: Vec<PartBuilder>,
    translucent: Vec<PartBuilder>,
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
}

impl PartSet {
    pub fn new(atlas_rows: usize) -> Self {
        Self {
            normal: (0..atlas_rows).map(|_| PartBuilder::default()).collect(),
            translucent: (0..atlas_rows).map(|_| PartBuilder::default()).collect(),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.normal.iter_mut().for_each(PartBuilder::reset);
        self.translucent.iter_mut().for_each(PartBuilder::reset);
    }

    pub fn reserve(&mut self) {
        self.normal.iter_mut().for_each(PartBuilder::reserve);
        self.translucent.iter_mut().for_each(PartBuilder::reserve);
    }

    /// The part a face of `block` is written into.
    pub fn part_mut(&mut self, info: &BlockInfo, block: BlockType, face: Face) -> &mut PartBuilder {
        let row = info.atlas_index(block, face);
        if info.is_translucent(block) {
            &mut self.translucent[row]
        } else {
            &mut self.normal[row]
        }
    }

    pub fn add_face(&mut self, info: &BlockInfo, block: BlockType, face: Face) {
        self.part_mut(info, block, face).face_quads[face.index()] += 1;
    }

    pub fn add_sprite(&mut self, info: &BlockInfo, block: BlockType) {
        self.part_mut(info, block, Face::XMax).sprite_quads += 1;
    }

    pub fn quad_count(&self) -> u32 {
        self.normal
            .iter()
            .chain(self.translucent.iter())
            .map(PartBuilder::quad_count)
            .sum()
    }

    /// Uploads every non-empty part, returning one entry per strip for each
    /// pass that produced any geometry.
    pub fn upload(
        &mut self,
        device: &mut dyn GraphicsDevice,
    ) -> (Option<Vec<ChunkPartInfo>>, Option<Vec<ChunkPartInfo>>) {
        let Self {
            normal,
            translucent,
            vertices,
            indices,
        } = self;
        let normal = upload_bucket(normal, device, vertices, indices);
        let translucent = upload_bucket(translucent, device, vertices, indices);
        (normal, translucent)
    }
}

fn upload_bucket(
    bucket: &[PartBuilder],
    device: &mut dyn GraphicsDevice,
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u16>,
) -> Option<Vec<ChunkPartInfo>> {
    if bucket.iter().all(|part| part.emitted_vertices() == 0) {
        return None;
    }
    Some(
        bucket
            .iter()
            .map(|part| part.upload(device, vertices, indices))
            .collect(),
    )
}

/// Strategy hooks called by [`ChunkMeshBuilder`] around its stretch and
/// emit phases.
pub trait MeshBuilder {
    fn name(&self) -> &'static str;

    fn pre_stretch(&mut self, parts: &mut PartSet) {
        parts.reset();
    }

    /// Extra condition for the face at padded index `next` to join the run
    /// started at `start`. Block identity and neighbour hiding are already
    /// checked by the caller.
    fn can_stretch(&mut self, ctx: &BuildContext, start: usize, next: usize, face: Face) -> bool;

    fn add_vertices(&mut self, parts: &mut PartSet, info: &BlockInfo, block: BlockType, face: Face) {
        parts.add_face(info, block, face);
    }

    fn post_stretch(&mut self, parts: &mut PartSet) {
        parts.reserve();
    }

    fn draw_face(&mut self, ctx: &BuildContext, parts: &mut PartSet, run: &FaceRun);

    fn get_chunk_info(
        &mut self,
        parts: &mut PartSet,
        device: &mut dyn GraphicsDevice,
    ) -> (Option<Vec<ChunkPartInfo>>, Option<Vec<ChunkPartInfo>>) {
        parts.upload(device)
    }
}

pub fn face_shade(face: Face) -> f32 {
    match face {
        Face::YMax => SHADE_TOP,
        Face::XMin | Face::XMax => SHADE_X_SIDE,
        Face::ZMin | Face::ZMax => SHADE_Z_SIDE,
        Face::YMin => SHADE_BOTTOM,
    }
}

fn face_color(block: BlockType, face: Face) -> [f32; 3] {
    if block.full_bright() {
        [1.0; 3]
    } else {
        Vertex::shade([1.0; 3], face_shade(face))
    }
}

fn run_quad(info: &BlockInfo, run: &FaceRun) -> FaceQuad {
    let tex = info.tex(run.block, run.face);
    mesh::face_quad(
        run.face,
        run.pos,
        run.count,
        info.block_height(run.block),
        info.atlas.v_origin(tex),
        info.atlas.inv_tile_size,
    )
}

/// Flat directional shading.
#[derive(Default)]
pub struct NormalBuilder;

impl MeshBuilder for NormalBuilder {
    fn name(&self) -> &'static str {
        "normal"
    }

    fn can_stretch(&mut self, _ctx: &BuildContext, _start: usize, _next: usize, _face: Face) -> bool {
        true
    }

    fn draw_face(&mut self, ctx: &BuildContext, parts: &mut PartSet, run: &FaceRun) {
        let quad = run_quad(ctx.info, run);
        let color = face_color(run.block, run.face);
        let part = parts.part_mut(ctx.info, run.block, run.face);
        mesh::add_quad(part.face_vertices(run.face), &quad, [color; 4], false);
    }
}

/// Darkening per occlusion level, from open corner to fully enclosed.
const AO_CURVE: [f32; 4] = [1.0, 0.8, 0.65, 0.5];

/// Directional shading plus per-corner ambient occlusion.
#[derive(Default)]
pub struct SmoothLightingBuilder {
    run_start: Option<usize>,
    run_face: Option<Face>,
    run_pattern: u8,
}

impl SmoothLightingBuilder {
    /// Padded strides of a face's U and V axes, matching [`FACE_CORNERS`].
    fn face_axes(face: Face) -> (isize, isize) {
        let row = EXTCHUNK_SIZE as isize;
        let layer = EXTCHUNK_SIZE_2 as isize;
        match face {
            Face::XMin | Face::XMax => (row, layer),
            Face::ZMin | Face::ZMax => (1, layer),
            Face::YMin | Face::YMax => (1, row),
        }
    }

    /// Occlusion level (0..=3) of each corner of `face`, two bits per corner
    /// in [`FACE_CORNERS`] order.
    pub fn occlusion(ctx: &BuildContext, index: usize, face: Face) -> u8 {
        let outer = index as isize + face.padded_offset();
        let (du, dv) = Self::face_axes(face);
        let solid = |i: isize| ctx.info.is_full_opaque(ctx.chunk[i as usize]);

        let mut packed = 0u8;
        for (corner, &(u_hi, v_hi)) in FACE_CORNERS[face.index()].iter().enumerate() {
            let su = if u_hi { du } else { -du };
            let sv = if v_hi { dv } else { -dv };
            let side1 = solid(outer + su);
            let side2 = solid(outer + sv);
            let level = if side1 && side2 {
                3
            } else {
                side1 as u8 + side2 as u8 + solid(outer + su + sv) as u8
            };
            packed |= level << (corner * 2);
        }
        packed
    }

    fn start_pattern(&mut self, ctx: &BuildContext, start: usize, face: Face) -> u8 {
        if self.run_start != Some(start) || self.run_face != Some(face) {
            self.run_start = Some(start);
            self.run_face = Some(face);
            self.run_pattern = Self::occlusion(ctx, start, face);
        }
        self.run_pattern
    }
}

impl MeshBuilder for SmoothLightingBuilder {
    fn name(&self) -> &'static str {
        "smooth"
    }

    fn pre_stretch(&mut self, parts: &mut PartSet) {
        self.run_start = None;
        self.run_face = None;
        parts.reset();
    }

    fn can_stretch(&mut self, ctx: &BuildContext, start: usize, next: usize, face: Face) -> bool {
        self.start_pattern(ctx, start, face) == Self::occlusion(ctx, next, face)
    }

    fn draw_face(&mut self, ctx: &BuildContext, parts: &mut PartSet, run: &FaceRun) {
        let quad = run_quad(ctx.info, run);
        let base = face_color(run.block, run.face);

        let levels: [usize; 4] = if run.block.full_bright() {
            [0; 4]
        } else {
            let packed = Self::occlusion(ctx, run.chunk_index, run.face);
            std::array::from_fn(|corner| ((packed >> (corner * 2)) & 3) as usize)
        };
        let colors = levels.map(|level| Vertex::shade(base, AO_CURVE[level]));
        // split along the diagonal joining the less occluded pair
        let flip = levels[0] + levels[2] > levels[1] + levels[3];

        let part = parts.part_mut(ctx.info, run.block, run.face);
        mesh::add_quad(part.face_vertices(run.face), &quad, colors, flip);
    }
}

pub fn strategy_for(smooth_lighting: bool) -> Box<dyn MeshBuilder> {
    if smooth_lighting {
        Box::new(SmoothLightingBuilder::default())
    } else {
        Box::new(NormalBuilder)
    }
}

/// Result of one chunk build. Both part lists are `None` when the chunk
/// produced no geometry.
#[derive(Debug, Default)]
pub struct BuiltChunk {
    pub all_air: bool,
    pub normal_parts: Option<Vec<ChunkPartInfo>>,
    pub translucent_parts: Option<Vec<ChunkPartInfo>>,
}

impl BuiltChunk {
    fn empty(all_air: bool) -> Self {
        Self {
            all_air,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normal_parts.is_none() && self.translucent_parts.is_none()
    }
}

/// Sideways jitter for sprites that request it, stable per position.
fn sprite_offset(pos: IVec3, metadata: u8) -> (f32, f32) {
    let mut hash = metadata as u32;
    hash = hash.wrapping_add(pos.x as u32).wrapping_mul(73856093);
    hash = hash.wrapping_add(pos.z as u32).wrapping_mul(19349663);
    hash ^= hash >> 16;
    let ox = (hash % 7) as f32 - 3.0;
    let oz = ((hash >> 8) % 7) as f32 - 3.0;
    (ox / 16.0, oz / 16.0)
}

fn draw_sprite(ctx: &BuildContext, parts: &mut PartSet, block: BlockType, index: usize, pos: IVec3) {
    let info = ctx.info;
    let tex = info.tex(block, Face::XMax);
    let (x, y, z) = (pos.x as f32, pos.y as f32, pos.z as f32);

    let mut min = [x + 2.5 / 16.0, y, z + 2.5 / 16.0];
    let mut max = [x + 13.5 / 16.0, y + info.block_height(block), z + 13.5 / 16.0];
    if block.sprite_jitter() {
        let (ox, oz) = sprite_offset(pos, ctx.metadata[index]);
        min[0] += ox - 1.7 / 16.0;
        max[0] += ox + 1.7 / 16.0;
        min[2] += oz - 1.7 / 16.0;
        max[2] += oz + 1.7 / 16.0;
    }

    let quads = mesh::sprite_quads(
        min,
        max,
        info.atlas.v_origin(tex),
        info.atlas.inv_tile_size,
        [1.0; 3],
    );
    let part = parts.part_mut(info, block, Face::XMax);
    for (group, quad) in quads.iter().enumerate() {
        part.sprite_vertices(group).extend_from_slice(quad);
    }
}

/// Builds chunk meshes, reusing its scratch buffers across builds.
pub struct ChunkMeshBuilder {
    info: Arc<BlockInfo>,
    chunk: Vec<BlockType>,
    metadata: Vec<u8>,
    counts: Vec<u8>,
    parts: PartSet,
    strategy: Box<dyn MeshBuilder>,
}

impl ChunkMeshBuilder {
    pub fn new(info: Arc<BlockInfo>, smooth_lighting: bool) -> Self {
        let rows = info.used_atlases();
        Self {
            info,
            chunk: vec![BlockType::Air; EXTCHUNK_SIZE_3],
            metadata: vec![0; EXTCHUNK_SIZE_3],
            counts: vec![0; CHUNK_SIZE_3 * FACE_COUNT],
            parts: PartSet::new(rows),
            strategy: strategy_for(smooth_lighting),
        }
    }

    pub fn info(&self) -> &Arc<BlockInfo> {
        &self.info
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn set_smooth_lighting(&mut self, smooth_lighting: bool) {
        self.strategy = strategy_for(smooth_lighting);
    }

    /// Run length recorded for a face by the last build; 0 when the face was
    /// hidden or merged into an earlier run.
    pub fn run_length(&self, x: i32, y: i32, z: i32, face: Face) -> u8 {
        self.counts[pack_counts(x, y, z) + face.index()]
    }

    pub fn build_chunk(
        &mut self,
        world: &dyn WorldStore,
        device: &mut dyn GraphicsDevice,
        cx: i32,
        cy: i32,
        cz: i32,
    ) -> BuiltChunk {
        let (all_air, all_solid) = self.copy_voxels(world, cx, cy, cz);
        if all_air || all_solid {
            self.counts.fill(0);
            tracing::trace!(cx, cy, cz, all_air, "Skipped uniform chunk");
            return BuiltChunk::empty(all_air);
        }

        let Self {
            info,
            chunk,
            metadata,
            counts,
            parts,
            strategy,
        } = self;
        let ctx = BuildContext {
            info: &**info,
            chunk: chunk.as_slice(),
            metadata: metadata.as_slice(),
            origin: IVec3::new(cx, cy, cz) * CHUNK_SIZE,
        };

        counts.fill(1);
        strategy.pre_stretch(parts);
        stretch_chunk(&ctx, counts, strategy.as_mut(), parts);
        if parts.quad_count() == 0 {
            return BuiltChunk::empty(false);
        }
        strategy.post_stretch(parts);
        emit_chunk(&ctx, counts, strategy.as_mut(), parts);

        let (normal_parts, translucent_parts) = strategy.get_chunk_info(parts, device);
        tracing::trace!(cx, cy, cz, quads = parts.quad_count(), "Built chunk");
        BuiltChunk {
            all_air: false,
            normal_parts,
            translucent_parts,
        }
    }

    /// Fills the padded buffer from the chunk and its 3x3 column
    /// neighbourhood. Returns (all air inside, padded region all opaque).
    fn copy_voxels(&mut self, world: &dyn WorldStore, cx: i32, cy: i32, cz: i32) -> (bool, bool) {
        let mut columns: [[Option<&Chunk>; 3]; 3] = [[None; 3]; 3];
        let mut missing = 0;
        for (dz, row) in columns.iter_mut().enumerate() {
            for (dx, column) in row.iter_mut().enumerate() {
                let (ncx, ncz) = (cx + dx as i32 - 1, cz + dz as i32 - 1);
                *column = world.get_chunk(ncx, ncz);
                if column.is_none() && world.contains_chunk_xz(ncx, ncz) {
                    missing += 1;
                }
            }
        }
        if missing > 0 {
            tracing::warn!(cx, cy, cz, missing, "Columns not loaded, building with air border");
        }

        // padded coordinate -> (column slot, local coordinate)
        let split = |p: usize| -> (usize, i32) {
            match p {
                0 => (0, CHUNK_MASK),
                p if p > SIZE => (2, 0),
                p => (1, p as i32 - 1),
            }
        };

        let y0 = cy * CHUNK_SIZE - 1;
        let mut all_air = true;
        let mut all_solid = true;
        let mut index = 0;
        for py in 0..EXTCHUNK_SIZE {
            let y = y0 + py as i32;
            for pz in 0..EXTCHUNK_SIZE {
                let (slot_z, lz) = split(pz);
                for px in 0..EXTCHUNK_SIZE {
                    let (slot_x, lx) = split(px);
                    let (block, meta) = match columns[slot_z][slot_x] {
                        Some(column) => (column.get_block(lx, y, lz), column.get_metadata(lx, y, lz)),
                        None => (BlockType::Air, 0),
                    };
                    self.chunk[index] = block;
                    self.metadata[index] = meta;
                    index += 1;

                    let interior = (1..=SIZE).contains(&px)
                        && (1..=SIZE).contains(&py)
                        && (1..=SIZE).contains(&pz);
                    if interior && !self.info.is_air(block) {
                        all_air = false;
                    }
                    if !self.info.is_full_opaque(block) {
                        all_solid = false;
                    }
                }
            }
        }
        (all_air, all_solid)
    }
}

fn stretch_chunk(
    ctx: &BuildContext,
    counts: &mut [u8],
    strategy: &mut dyn MeshBuilder,
    parts: &mut PartSet,
) {
    let info = ctx.info;
    for y in 0..CHUNK_SIZE {
        for z in 0..CHUNK_SIZE {
            let mut index = pack_padded(0, y, z);
            let mut slots = pack_counts(0, y, z);
            for x in 0..CHUNK_SIZE {
                let block = ctx.chunk[index];
                if info.is_air(block) {
                    counts[slots..slots + FACE_COUNT].fill(0);
                } else if info.is_sprite(block) {
                    counts[slots..slots + FACE_COUNT].fill(0);
                    counts[slots + Face::YMax.index()] = 1;
                    parts.add_sprite(info, block);
                } else {
                    for face in Face::ALL {
                        let slot = slots + face.index();
                        if counts[slot] == 0 {
                            continue;
                        }
                        if info.is_face_hidden(block, ctx.neighbour(index, face), face) {
                            counts[slot] = 0;
                            continue;
                        }
                        let run = stretch_run(ctx, counts, strategy, block, x, z, index, slot, face);
                        counts[slot] = run;
                        strategy.add_vertices(parts, info, block, face);
                    }
                }
                index += 1;
                slots += FACE_COUNT;
            }
        }
    }
}

/// Extends the run starting at `index` along +Z for X faces and along +X
/// otherwise, zeroing the slots it absorbs.
#[allow(clippy::too_many_arguments)]
fn stretch_run(
    ctx: &BuildContext,
    counts: &mut [u8],
    strategy: &mut dyn MeshBuilder,
    block: BlockType,
    x: i32,
    z: i32,
    index: usize,
    slot: usize,
    face: Face,
) -> u8 {
    let mut count = 1u8;
    if !ctx.info.can_stretch(block, face) {
        return count;
    }

    let (mut coord, index_step, slot_step) = match face {
        Face::XMin | Face::XMax => (z, EXTCHUNK_SIZE, SIZE * FACE_COUNT),
        _ => (x, 1, FACE_COUNT),
    };
    let mut next = index + index_step;
    let mut next_slot = slot + slot_step;
    coord += 1;

    while coord < CHUNK_SIZE {
        let other = ctx.chunk[next];
        if other != block
            || ctx.info.is_face_hidden(other, ctx.neighbour(next, face), face)
            || !strategy.can_stretch(ctx, index, next, face)
        {
            break;
        }
        counts[next_slot] = 0;
        count += 1;
        coord += 1;
        next += index_step;
        next_slot += slot_step;
    }
    count
}

fn emit_chunk(ctx: &BuildContext, counts: &[u8], strategy: &mut dyn MeshBuilder, parts: &mut PartSet) {
    let info = ctx.info;
    for y in 0..CHUNK_SIZE {
        for z in 0..CHUNK_SIZE {
            let mut index = pack_padded(0, y, z);
            let mut slots = pack_counts(0, y, z);
            for x in 0..CHUNK_SIZE {
                let block = ctx.chunk[index];
                let pos = ctx.origin + IVec3::new(x, y, z);

                if info.is_sprite(block) {
                    if counts[slots + Face::YMax.index()] != 0 {
                        draw_sprite(ctx, parts, block, index, pos);
                    }
                } else if !info.is_air(block) {
                    for face in Face::ALL {
                        let count = counts[slots + face.index()];
                        if count == 0 {
                            continue;
                        }
                        let run = FaceRun {
                            block,
                            face,
                            pos,
                            chunk_index: index,
                            count: count as i32,
                        };
                        strategy.draw_face(ctx, parts, &run);
                    }
                }
                index += 1;
                slots += FACE_COUNT;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::RecordingDevice;
    use crate::world::World;

    fn builder(smooth: bool) -> ChunkMeshBuilder {
        ChunkMeshBuilder::new(Arc::new(BlockInfo::default()), smooth)
    }

    fn quads(parts: &Option<Vec<ChunkPartInfo>>) -> u32 {
        parts
            .iter()
            .flatten()
            .map(|p| (p.sprite_count + p.counts.iter().sum::<u32>()) / 6)
            .sum()
    }

    fn face_quads(parts: &Option<Vec<ChunkPartInfo>>, face: Face) -> u32 {
        parts.iter().flatten().map(|p| p.counts[face.index()] / 6).sum()
    }

    #[test]
    fn padded_index_matches_layout() {
        assert_eq!(pack_padded(-1, -1, -1), 0);
        assert_eq!(pack_padded(0, 0, 0), 324 + 18 + 1);
        assert_eq!(pack_padded(16, 16, 16), EXTCHUNK_SIZE_3 - 1);
        assert_eq!(pack_counts(1, 0, 0), 6);
        assert_eq!(pack_counts(0, 1, 0), 256 * 6);
    }

    #[test]
    fn single_block_emits_six_quads() {
        let mut world = World::new(1, 1, 1);
        world.set_block(0, 0, 0, BlockType::Stone);
        let mut device = RecordingDevice::new();
        let built = builder(false).build_chunk(&world, &mut device, 0, 0, 0);

        assert!(!built.all_air);
        assert!(built.translucent_parts.is_none());
        let parts = built.normal_parts.as_ref().expect("solid geometry");
        let part = &parts[0];
        assert_eq!(part.counts, [6; FACE_COUNT]);
        assert_eq!(part.sprite_count, 0);

        let data = device.buffer(part.handle).expect("uploaded");
        assert_eq!(data.vertices.len(), 24);
        assert_eq!(data.indices.len(), 36);
    }

    #[test]
    fn uniform_chunk_merges_into_full_rows() {
        let mut world = World::new(1, 1, 1);
        world.fill(IVec3::ZERO, IVec3::splat(15), BlockType::Stone);
        let mut device = RecordingDevice::new();
        let mut builder = builder(false);
        let built = builder.build_chunk(&world, &mut device, 0, 0, 0);

        assert_eq!(quads(&built.normal_parts), 96);
        for face in Face::ALL {
            assert_eq!(face_quads(&built.normal_parts, face), 16);
        }
        for y in 0..16 {
            assert_eq!(builder.run_length(0, y, 0, Face::XMin), 16);
            assert_eq!(builder.run_length(0, y, 5, Face::XMin), 0);
            assert_eq!(builder.run_length(5, y, 0, Face::XMin), 0);
        }
    }

    #[test]
    fn enclosed_chunk_has_no_geometry() {
        let mut world = World::new(3, 3, 3);
        world.fill(IVec3::ZERO, IVec3::splat(47), BlockType::Stone);
        let mut device = RecordingDevice::new();
        let built = builder(false).build_chunk(&world, &mut device, 1, 1, 1);
        assert!(built.is_empty());
        assert!(!built.all_air);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn air_chunk_ignores_its_neighbours() {
        let mut world = World::new(3, 3, 3);
        world.fill(IVec3::ZERO, IVec3::splat(47), BlockType::Stone);
        world.fill(IVec3::splat(16), IVec3::splat(31), BlockType::Air);
        let mut device = RecordingDevice::new();
        let built = builder(false).build_chunk(&world, &mut device, 1, 1, 1);
        assert!(built.all_air);
        assert!(built.is_empty());
    }

    #[test]
    fn world_edge_faces_are_drawn() {
        let mut world = World::new(2, 1, 1);
        world.fill(IVec3::new(0, 0, 0), IVec3::new(0, 15, 15), BlockType::Dirt);
        let mut device = RecordingDevice::new();
        let built = builder(false).build_chunk(&world, &mut device, 0, 0, 0);
        assert_eq!(face_quads(&built.normal_parts, Face::XMin), 16);
        assert_eq!(face_quads(&built.normal_parts, Face::XMax), 16);
        assert_eq!(face_quads(&built.normal_parts, Face::YMin), 16);
    }

    #[test]
    fn unloaded_neighbour_reads_as_air() {
        let mut world = World::unloaded(2, 1, 1);
        world.load_column(0, 0);
        world.fill(IVec3::new(15, 0, 0), IVec3::new(15, 0, 0), BlockType::Stone);
        let mut device = RecordingDevice::new();
        let built = builder(false).build_chunk(&world, &mut device, 0, 0, 0);
        assert_eq!(face_quads(&built.normal_parts, Face::XMax), 1);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let mut world = World::new(1, 1, 1);
        world.fill(IVec3::new(0, 0, 0), IVec3::new(15, 3, 15), BlockType::Grass);
        world.fill(IVec3::new(4, 4, 4), IVec3::new(6, 4, 9), BlockType::Water);
        world.set_block(10, 4, 10, BlockType::DeadBush);
        let mut device = RecordingDevice::new();
        let mut builder = builder(false);

        let first = builder.build_chunk(&world, &mut device, 0, 0, 0);
        let second = builder.build_chunk(&world, &mut device, 0, 0, 0);
        let strip = |parts: &Option<Vec<ChunkPartInfo>>| -> Vec<(u32, [u32; 6])> {
            parts.iter().flatten().map(|p| (p.sprite_count, p.counts)).collect()
        };
        assert_eq!(strip(&first.normal_parts), strip(&second.normal_parts));
        assert_eq!(strip(&first.translucent_parts), strip(&second.translucent_parts));

        let a = &first.normal_parts.as_ref().expect("solid")[0];
        let b = &second.normal_parts.as_ref().expect("solid")[0];
        let va = &device.buffer(a.handle).expect("first").vertices;
        let vb = &device.buffer(b.handle).expect("second").vertices;
        assert_eq!(va, vb);
    }

    #[test]
    fn water_goes_to_the_translucent_pass() {
        let mut world = World::new(1, 1, 1);
        world.set_block(3, 3, 3, BlockType::Water);
        world.set_block(4, 3, 3, BlockType::Water);
        let mut device = RecordingDevice::new();
        let built = builder(false).build_chunk(&world, &mut device, 0, 0, 0);
        assert!(built.normal_parts.is_none());
        // the shared side is hidden, the rest merge along X
        assert_eq!(quads(&built.translucent_parts), 6);
        assert_eq!(face_quads(&built.translucent_parts, Face::YMax), 1);
    }

    #[test]
    fn sprites_emit_one_cross() {
        let mut world = World::new(1, 1, 1);
        world.set_block(5, 0, 5, BlockType::DeadBush);
        world.set_block(6, 0, 5, BlockType::DeadBush);
        let mut device = RecordingDevice::new();
        let built = builder(false).build_chunk(&world, &mut device, 0, 0, 0);
        let part = &built.normal_parts.as_ref().expect("sprites")[0];
        assert_eq!(part.sprite_count, 2 * 4 * 6);
        assert_eq!(part.counts, [0; FACE_COUNT]);
    }

    #[test]
    fn flower_jitter_is_stable() {
        let pos = IVec3::new(12, 40, -7);
        assert_eq!(sprite_offset(pos, 0), sprite_offset(pos, 0));
        let (ox, oz) = sprite_offset(pos, 3);
        assert!(ox.abs() <= 3.0 / 16.0 && oz.abs() <= 3.0 / 16.0);
    }

    #[test]
    fn smooth_lighting_breaks_runs_at_occlusion_changes() {
        let mut world = World::new(1, 1, 1);
        world.fill(IVec3::new(0, 0, 0), IVec3::new(15, 0, 15), BlockType::Stone);
        world.set_block(8, 1, 8, BlockType::Stone);

        let mut device = RecordingDevice::new();
        let flat = builder(false).build_chunk(&world, &mut device, 0, 0, 0);
        let mut smooth_builder = builder(true);
        assert_eq!(smooth_builder.strategy_name(), "smooth");
        let smooth = smooth_builder.build_chunk(&world, &mut device, 0, 0, 0);

        let flat_top = face_quads(&flat.normal_parts, Face::YMax);
        let smooth_top = face_quads(&smooth.normal_parts, Face::YMax);
        assert!(smooth_top > flat_top);

        let ctx = BuildContext {
            info: &smooth_builder.info,
            chunk: &smooth_builder.chunk,
            metadata: &smooth_builder.metadata,
            origin: IVec3::ZERO,
        };
        let open = pack_padded(2, 0, 2);
        let beside = pack_padded(7, 0, 8);
        assert_eq!(SmoothLightingBuilder::occlusion(&ctx, open, Face::YMax), 0);
        assert_ne!(SmoothLightingBuilder::occlusion(&ctx, beside, Face::YMax), 0);
    }
}
