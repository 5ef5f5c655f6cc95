use glam::IVec3;
use rustc_hash::FxHashMap;

use crate::block::BlockType;
use crate::chunk::Chunk;
use crate::constants::*;

/// Voxel storage as seen by the renderer. Anything outside the world, or in
/// a column that is not loaded, reads as air.
pub trait WorldStore {
    /// World size in chunks as (x, y, z).
    fn chunk_dims(&self) -> (i32, i32, i32);

    fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType;

    /// The column at chunk coordinates (cx, cz), if it is loaded.
    fn get_chunk(&self, cx: i32, cz: i32) -> Option<&Chunk>;

    fn get_block_metadata(&self, x: i32, y: i32, z: i32) -> u8;

    fn contains_chunk_xz(&self, cx: i32, cz: i32) -> bool {
        let (chunks_x, _, chunks_z) = self.chunk_dims();
        cx >= 0 && cz >= 0 && cx < chunks_x && cz < chunks_z
    }

    fn height(&self) -> i32 {
        self.chunk_dims().1 * CHUNK_SIZE
    }
}

/// Bounded in-memory world made of chunk columns.
pub struct World {
    pub chunks: FxHashMap<(i32, i32), Chunk>,
    chunks_x: i32,
    chunks_y: i32,
    chunks_z: i32,
}

impl World {
    /// Creates a world with every column loaded and filled with air.
    pub fn new(chunks_x: i32, chunks_y: i32, chunks_z: i32) -> Self {
        let mut world = Self::unloaded(chunks_x, chunks_y, chunks_z);
        for cx in 0..chunks_x {
            for cz in 0..chunks_z {
                world.load_column(cx, cz);
            }
        }
        world
    }

    /// Creates a world of the given size with no columns loaded.
    pub fn unloaded(chunks_x: i32, chunks_y: i32, chunks_z: i32) -> Self {
        World {
            chunks: FxHashMap::default(),
            chunks_x: chunks_x.max(0),
            chunks_y: chunks_y.max(0),
            chunks_z: chunks_z.max(0),
        }
    }

    pub fn width(&self) -> i32 {
        self.chunks_x * CHUNK_SIZE
    }

    pub fn length(&self) -> i32 {
        self.chunks_z * CHUNK_SIZE
    }

    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && y >= 0 && z >= 0 && x < self.width() && y < self.height() && z < self.length()
    }

    pub fn load_column(&mut self, cx: i32, cz: i32) -> &mut Chunk {
        let chunks_y = self.chunks_y;
        self.chunks
            .entry((cx, cz))
            .or_insert_with(|| Chunk::new(chunks_y))
    }

    pub fn unload_column(&mut self, cx: i32, cz: i32) -> Option<Chunk> {
        self.chunks.remove(&(cx, cz))
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        self.set_block_with_metadata(x, y, z, block, 0)
    }

    /// Returns false when the position is outside the world or its column is
    /// not loaded.
    pub fn set_block_with_metadata(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        block: BlockType,
        metadata: u8,
    ) -> bool {
        if !self.contains(x, y, z) {
            return false;
        }
        let cx = x >> CHUNK_SHIFT;
        let cz = z >> CHUNK_SHIFT;
        let lx = x & CHUNK_MASK;
        let lz = z & CHUNK_MASK;

        if let Some(chunk) = self.chunks.get_mut(&(cx, cz)) {
            chunk.set_block(lx, y, lz, block, metadata);
            true
        } else {
            false
        }
    }

    /// Fills the inclusive box between `min` and `max`.
    pub fn fill(&mut self, min: IVec3, max: IVec3, block: BlockType) {
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    self.set_block(x, y, z, block);
                }
            }
        }
    }
}

impl WorldStore for World {
    fn chunk_dims(&self) -> (i32, i32, i32) {
        (self.chunks_x, self.chunks_y, self.chunks_z)
    }

    fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        if !self.contains(x, y, z) {
            return BlockType::Air;
        }
        match self.chunks.get(&(x >> CHUNK_SHIFT, z >> CHUNK_SHIFT)) {
            Some(chunk) => chunk.get_block(x & CHUNK_MASK, y, z & CHUNK_MASK),
            None => BlockType::Air,
        }
    }

    fn get_chunk(&self, cx: i32, cz: i32) -> Option<&Chunk> {
        if !self.contains_chunk_xz(cx, cz) {
            return None;
        }
        self.chunks.get(&(cx, cz))
    }

    fn get_block_metadata(&self, x: i32, y: i32, z: i32) -> u8 {
        if !self.contains(x, y, z) {
            return 0;
        }
        match self.chunks.get(&(x >> CHUNK_SHIFT, z >> CHUNK_SHIFT)) {
            Some(chunk) => chunk.get_metadata(x & CHUNK_MASK, y, z & CHUNK_MASK),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_outside_the_world_are_air() {
        let mut world = World::new(2, 1, 2);
        assert!(world.set_block(31, 15, 31, BlockType::Stone));
        assert!(!world.set_block(32, 0, 0, BlockType::Stone));
        assert_eq!(world.get_block(31, 15, 31), BlockType::Stone);
        assert_eq!(world.get_block(-1, 0, 0), BlockType::Air);
        assert_eq!(world.get_block(0, 16, 0), BlockType::Air);
    }

    #[test]
    fn unloaded_columns_read_as_air() {
        let mut world = World::unloaded(2, 1, 1);
        world.load_column(0, 0);
        assert!(world.set_block(1, 1, 1, BlockType::Dirt));
        assert!(!world.set_block(17, 1, 1, BlockType::Dirt));
        assert!(world.get_chunk(0, 0).is_some());
        assert!(world.get_chunk(1, 0).is_none());
        assert!(world.get_chunk(-1, 0).is_none());
        assert_eq!(world.get_block(17, 1, 1), BlockType::Air);
    }

    #[test]
    fn metadata_is_stored_per_block() {
        let mut world = World::new(1, 1, 1);
        world.set_block_with_metadata(2, 3, 4, BlockType::Flower, 5);
        assert_eq!(world.get_block_metadata(2, 3, 4), 5);
        assert_eq!(world.get_block_metadata(2, 3, 5), 0);
    }

    #[test]
    fn fill_covers_inclusive_box() {
        let mut world = World::new(1, 1, 1);
        world.fill(IVec3::new(0, 0, 0), IVec3::new(1, 1, 1), BlockType::Sand);
        let count = (0..4)
            .flat_map(|x| (0..4).flat_map(move |y| (0..4).map(move |z| (x, y, z))))
            .filter(|&(x, y, z)| world.get_block(x, y, z) == BlockType::Sand)
            .count();
        assert_eq!(count, 8);
    }
}
