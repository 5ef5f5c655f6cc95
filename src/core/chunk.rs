use crate::constants::*;
use crate::core::block::BlockType;

const SIZE: usize = CHUNK_SIZE as usize;

/// One 16^3 cube of voxels inside a column.
pub struct SubChunk {
    pub blocks: [[[BlockType; SIZE]; SIZE]; SIZE],
    pub metadata: [[[u8; SIZE]; SIZE]; SIZE],
}

impl SubChunk {
    pub fn new() -> Self {
        SubChunk {
            blocks: [[[BlockType::Air; SIZE]; SIZE]; SIZE],
            metadata: [[[0; SIZE]; SIZE]; SIZE],
        }
    }

    fn in_bounds(x: i32, y: i32, z: i32) -> bool {
        x >= 0 && x < CHUNK_SIZE && y >= 0 && y < CHUNK_SIZE && z >= 0 && z < CHUNK_SIZE
    }

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        if Self::in_bounds(x, y, z) {
            self.blocks[x as usize][y as usize][z as usize]
        } else {
            BlockType::Air
        }
    }

    pub fn get_metadata(&self, x: i32, y: i32, z: i32) -> u8 {
        if Self::in_bounds(x, y, z) {
            self.metadata[x as usize][y as usize][z as usize]
        } else {
            0
        }
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockType, metadata: u8) {
        if !Self::in_bounds(x, y, z) {
            return;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        self.blocks[x][y][z] = block;
        self.metadata[x][y][z] = metadata;
    }
}

impl Default for SubChunk {
    fn default() -> Self {
        Self::new()
    }
}

/// A vertical column of sub-chunks sharing the same (cx, cz).
pub struct Chunk {
    pub subchunks: Vec<SubChunk>,
}

impl Chunk {
    pub fn new(num_subchunks: i32) -> Self {
        let mut subchunks = Vec::with_capacity(num_subchunks.max(0) as usize);
        for _ in 0..num_subchunks {
            subchunks.push(SubChunk::new());
        }
        Chunk { subchunks }
    }

    pub fn height(&self) -> i32 {
        self.subchunks.len() as i32 * CHUNK_SIZE
    }

    /// `y` is a world coordinate; `x` and `z` are local to the column.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        if y < 0 || y >= self.height() {
            return BlockType::Air;
        }
        let subchunk_idx = (y >> CHUNK_SHIFT) as usize;
        self.subchunks[subchunk_idx].get_block(x, y & CHUNK_MASK, z)
    }

    pub fn get_metadata(&self, x: i32, y: i32, z: i32) -> u8 {
        if y < 0 || y >= self.height() {
            return 0;
        }
        let subchunk_idx = (y >> CHUNK_SHIFT) as usize;
        self.subchunks[subchunk_idx].get_metadata(x, y & CHUNK_MASK, z)
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockType, metadata: u8) {
        if y < 0 || y >= self.height() {
            return;
        }
        let subchunk_idx = (y >> CHUNK_SHIFT) as usize;
        self.subchunks[subchunk_idx].set_block(x, y & CHUNK_MASK, z, block, metadata);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_reads_are_air() {
        let mut chunk = Chunk::new(2);
        chunk.set_block(3, 20, 4, BlockType::Stone, 7);
        assert_eq!(chunk.get_block(3, 20, 4), BlockType::Stone);
        assert_eq!(chunk.get_metadata(3, 20, 4), 7);
        assert_eq!(chunk.get_block(3, 32, 4), BlockType::Air);
        assert_eq!(chunk.get_block(-1, 20, 4), BlockType::Air);
        assert_eq!(chunk.get_block(3, -1, 4), BlockType::Air);
    }
}
