use serde::{Deserialize, Serialize};

use crate::constants::*;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockType {
    #[default]
    Air,
    Grass,
    Dirt,
    Stone,
    Sand,
    Water,
    Wood,
    Leaves,
    Bedrock,
    Snow,
    Gravel,
    Clay,
    Ice,
    Cactus,
    DeadBush,
    Glass,
    Slab,
    Flower,
    Lava,
}

pub const BLOCK_COUNT: usize = 19;

/// How a block is meshed and which pass it is drawn in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DrawType {
    Gas,
    Opaque,
    /// Alpha-tested, culls against itself (glass).
    Transparent,
    /// Alpha-tested, does not cull against itself (leaves).
    TransparentThick,
    Translucent,
    Sprite,
}

/// Face directions, in the order they are laid out inside a chunk part.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Face {
    XMin,
    XMax,
    ZMin,
    ZMax,
    YMin,
    YMax,
}

impl Face {
    pub const ALL: [Face; FACE_COUNT] = [
        Face::XMin,
        Face::XMax,
        Face::ZMin,
        Face::ZMax,
        Face::YMin,
        Face::YMax,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn opposite(self) -> Face {
        match self {
            Face::XMin => Face::XMax,
            Face::XMax => Face::XMin,
            Face::ZMin => Face::ZMax,
            Face::ZMax => Face::ZMin,
            Face::YMin => Face::YMax,
            Face::YMax => Face::YMin,
        }
    }

    /// Offset of the neighbouring voxel inside the padded 18^3 buffer.
    pub fn padded_offset(self) -> isize {
        match self {
            Face::XMin => -1,
            Face::XMax => 1,
            Face::ZMin => -(EXTCHUNK_SIZE as isize),
            Face::ZMax => EXTCHUNK_SIZE as isize,
            Face::YMin => -(EXTCHUNK_SIZE_2 as isize),
            Face::YMax => EXTCHUNK_SIZE_2 as isize,
        }
    }

    pub fn normal(self) -> [i32; 3] {
        match self {
            Face::XMin => [-1, 0, 0],
            Face::XMax => [1, 0, 0],
            Face::ZMin => [0, 0, -1],
            Face::ZMax => [0, 0, 1],
            Face::YMin => [0, -1, 0],
            Face::YMax => [0, 1, 0],
        }
    }
}

impl BlockType {
    pub const ALL: [BlockType; BLOCK_COUNT] = [
        BlockType::Air,
        BlockType::Grass,
        BlockType::Dirt,
        BlockType::Stone,
        BlockType::Sand,
        BlockType::Water,
        BlockType::Wood,
        BlockType::Leaves,
        BlockType::Bedrock,
        BlockType::Snow,
        BlockType::Gravel,
        BlockType::Clay,
        BlockType::Ice,
        BlockType::Cactus,
        BlockType::DeadBush,
        BlockType::Glass,
        BlockType::Slab,
        BlockType::Flower,
        BlockType::Lava,
    ];

    pub fn id(self) -> usize {
        self as usize
    }

    pub fn draw_type(&self) -> DrawType {
        match self {
            BlockType::Air => DrawType::Gas,
            BlockType::Water | BlockType::Ice => DrawType::Translucent,
            BlockType::Leaves => DrawType::TransparentThick,
            BlockType::Glass => DrawType::Transparent,
            BlockType::DeadBush | BlockType::Flower => DrawType::Sprite,
            _ => DrawType::Opaque,
        }
    }

    pub fn height(&self) -> f32 {
        match self {
            BlockType::Slab => 0.5,
            _ => 1.0,
        }
    }

    pub fn is_liquid(&self) -> bool {
        matches!(self, BlockType::Water | BlockType::Lava)
    }

    pub fn full_bright(&self) -> bool {
        *self == BlockType::Lava
    }

    pub fn sprite_jitter(&self) -> bool {
        *self == BlockType::Flower
    }

    pub fn tex_top(&self) -> u16 {
        match self {
            BlockType::Air => 0,
            BlockType::Grass => TEX_GRASS_TOP,
            BlockType::Dirt => TEX_DIRT,
            BlockType::Stone => TEX_STONE,
            BlockType::Sand => TEX_SAND,
            BlockType::Water => TEX_WATER,
            BlockType::Wood => TEX_WOOD_TOP,
            BlockType::Leaves => TEX_LEAVES,
            BlockType::Bedrock => TEX_BEDROCK,
            BlockType::Snow => TEX_SNOW,
            BlockType::Gravel => TEX_GRAVEL,
            BlockType::Clay => TEX_CLAY,
            BlockType::Ice => TEX_ICE,
            BlockType::Cactus => TEX_CACTUS,
            BlockType::DeadBush => TEX_DEAD_BUSH,
            BlockType::Glass => TEX_GLASS,
            BlockType::Slab => TEX_SLAB_TOP,
            BlockType::Flower => TEX_FLOWER,
            BlockType::Lava => TEX_LAVA,
        }
    }

    pub fn tex_side(&self) -> u16 {
        match self {
            BlockType::Grass => TEX_GRASS_SIDE,
            BlockType::Wood => TEX_WOOD_SIDE,
            BlockType::Slab => TEX_SLAB_SIDE,
            _ => self.tex_top(),
        }
    }

    pub fn tex_bottom(&self) -> u16 {
        match self {
            BlockType::Grass => TEX_DIRT,
            _ => self.tex_top(),
        }
    }

    pub fn tex(&self, face: Face) -> u16 {
        match face {
            Face::YMax => self.tex_top(),
            Face::YMin => self.tex_bottom(),
            _ => self.tex_side(),
        }
    }
}

/// Vertical strips cut out of the 2D terrain atlas. Each strip is bound as
/// one texture, so every chunk part is keyed by the strip it samples from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Atlas1D {
    pub tiles_per_atlas: u32,
    pub inv_tile_size: f32,
    pub count: usize,
}

impl Atlas1D {
    pub fn new(tiles_per_row: u32, rows: u32, max_tiles_per_strip: u32) -> Self {
        let total = (tiles_per_row * rows).max(1);
        let tiles_per_atlas = max_tiles_per_strip.clamp(1, total);
        let count = total.div_ceil(tiles_per_atlas) as usize;
        Self {
            tiles_per_atlas,
            inv_tile_size: 1.0 / tiles_per_atlas as f32,
            count,
        }
    }

    pub fn index(&self, tex: u16) -> usize {
        (tex as u32 / self.tiles_per_atlas) as usize
    }

    pub fn row_id(&self, tex: u16) -> u32 {
        tex as u32 % self.tiles_per_atlas
    }

    /// V coordinate of the tile's top edge inside its strip.
    pub fn v_origin(&self, tex: u16) -> f32 {
        self.row_id(tex) as f32 * self.inv_tile_size
    }
}

impl Default for Atlas1D {
    fn default() -> Self {
        Self::new(ATLAS_TILES_PER_ROW, ATLAS_ROWS, MAX_TILES_PER_STRIP)
    }
}

/// Read-only per-block lookup table consumed by the mesher and renderer.
#[derive(Clone, Debug)]
pub struct BlockInfo {
    draw: [DrawType; BLOCK_COUNT],
    full_opaque: [bool; BLOCK_COUNT],
    can_stretch: [u8; BLOCK_COUNT],
    hidden: Vec<u8>,
    used_atlases: usize,
    pub atlas: Atlas1D,
}

impl BlockInfo {
    pub fn new(atlas: Atlas1D) -> Self {
        let mut draw = [DrawType::Gas; BLOCK_COUNT];
        let mut full_opaque = [false; BLOCK_COUNT];
        let mut can_stretch = [0u8; BLOCK_COUNT];
        let mut max_tex = 0u16;

        for block in BlockType::ALL {
            let i = block.id();
            draw[i] = block.draw_type();
            full_opaque[i] = draw[i] == DrawType::Opaque && block.height() == 1.0;
            // every block spans the full cell on X and Z
            can_stretch[i] = if draw[i] == DrawType::Sprite { 0 } else { 0x3F };
            for face in Face::ALL {
                max_tex = max_tex.max(block.tex(face));
            }
        }

        let mut info = Self {
            draw,
            full_opaque,
            can_stretch,
            hidden: vec![0; BLOCK_COUNT * BLOCK_COUNT],
            used_atlases: atlas.index(max_tex) + 1,
            atlas,
        };
        for block in BlockType::ALL {
            for other in BlockType::ALL {
                info.hidden[block.id() * BLOCK_COUNT + other.id()] = info.calc_culling(block, other);
            }
        }
        info
    }

    pub fn draw(&self, block: BlockType) -> DrawType {
        self.draw[block.id()]
    }

    pub fn is_opaque(&self, block: BlockType) -> bool {
        self.draw(block) == DrawType::Opaque
    }

    /// Opaque and occupying the whole cell.
    pub fn is_full_opaque(&self, block: BlockType) -> bool {
        self.full_opaque[block.id()]
    }

    pub fn is_sprite(&self, block: BlockType) -> bool {
        self.draw(block) == DrawType::Sprite
    }

    pub fn is_translucent(&self, block: BlockType) -> bool {
        self.draw(block) == DrawType::Translucent
    }

    pub fn is_air(&self, block: BlockType) -> bool {
        self.draw(block) == DrawType::Gas
    }

    pub fn block_height(&self, block: BlockType) -> f32 {
        block.height()
    }

    pub fn can_stretch(&self, block: BlockType, face: Face) -> bool {
        self.can_stretch[block.id()] & face.bit() != 0
    }

    pub fn tex(&self, block: BlockType, face: Face) -> u16 {
        block.tex(face)
    }

    pub fn atlas_index(&self, block: BlockType, face: Face) -> usize {
        self.atlas.index(block.tex(face))
    }

    /// Number of atlas strips referenced by any block face.
    pub fn used_atlases(&self) -> usize {
        self.used_atlases
    }

    /// Whether `face` of `block` is covered by `other` sitting against that face.
    pub fn is_face_hidden(&self, block: BlockType, other: BlockType, face: Face) -> bool {
        self.hidden[block.id() * BLOCK_COUNT + other.id()] & face.bit() != 0
    }

    fn might_cull(&self, block: BlockType, other: BlockType) -> bool {
        if self.is_sprite(block) {
            return false;
        }
        // water is always culled by lava
        if block == BlockType::Water && other == BlockType::Lava {
            return true;
        }
        if block == other {
            return self.draw(block) != DrawType::TransparentThick;
        }
        if self.is_opaque(other) && !other.is_liquid() {
            return true;
        }
        if !self.is_translucent(block) || !self.is_translucent(other) {
            return false;
        }
        // ice hides water faces, but not the other way round
        block.is_liquid() || !other.is_liquid()
    }

    fn calc_culling(&self, block: BlockType, other: BlockType) -> u8 {
        if self.is_full_opaque(block) && self.is_full_opaque(other) {
            return 0x3F;
        }
        if !self.might_cull(block, other) {
            return 0;
        }

        let b_max = block.height();
        let o_max = other.height();
        let both_liquid = block.is_liquid() && other.is_liquid();
        let occluded_side = b_max <= o_max;

        let mut flags = 0;
        if occluded_side {
            flags |= Face::XMin.bit() | Face::XMax.bit() | Face::ZMin.bit() | Face::ZMax.bit();
        }
        if both_liquid || o_max == 1.0 {
            flags |= Face::YMin.bit();
        }
        if both_liquid || b_max == 1.0 {
            flags |= Face::YMax.bit();
        }
        flags
    }
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self::new(Atlas1D::default())
    }
}
