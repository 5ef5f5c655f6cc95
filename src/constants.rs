// Chunk constants
pub const CHUNK_SIZE: i32 = 16;
pub const CHUNK_SHIFT: i32 = 4;
pub const CHUNK_MASK: i32 = CHUNK_SIZE - 1;
pub const HALF_CHUNK_SIZE: i32 = CHUNK_SIZE / 2;
pub const CHUNK_SIZE_3: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize;
pub const FACE_COUNT: usize = 6;

// Padded (bordered) chunk constants
pub const EXTCHUNK_SIZE: usize = CHUNK_SIZE as usize + 2;
pub const EXTCHUNK_SIZE_2: usize = EXTCHUNK_SIZE * EXTCHUNK_SIZE;
pub const EXTCHUNK_SIZE_3: usize = EXTCHUNK_SIZE_2 * EXTCHUNK_SIZE;

// 16-bit index limits
pub const MAX_VERTEX: u32 = 65536;
pub const MAX_INDICES: u32 = MAX_VERTEX / 4 * 6;

/// Half of a chunk's space diagonal, sqrt(3 * 8^2).
pub const CHUNK_RADIUS: f32 = 13.856406;

// Build scheduling
pub const MIN_BUILD_BUDGET: i32 = 4;
pub const MAX_BUILD_BUDGET: i32 = 20;
pub const INITIAL_BUILD_BUDGET: i32 = 12;
pub const CHUNK_TARGET_TIME: f64 = 1.0 / 30.0 + 0.01;
pub const UNLOAD_MARGIN: i32 = 32 * 16;
pub const MAX_VIEW_DISTANCE: i32 = 32768;

// Texture atlas
pub const ATLAS_TILES_PER_ROW: u32 = 16;
pub const ATLAS_ROWS: u32 = 16;
pub const MAX_TILES_PER_STRIP: u32 = 64;
pub const UV2_SCALE: f32 = 15.99 / 16.0;

// Directional shading
pub const SHADE_TOP: f32 = 1.0;
pub const SHADE_X_SIDE: f32 = 0.6;
pub const SHADE_Z_SIDE: f32 = 0.8;
pub const SHADE_BOTTOM: f32 = 0.5;

//indexes of textures in atlas
pub const TEX_GRASS_TOP: u16 = 0;
pub const TEX_GRASS_SIDE: u16 = 1;
pub const TEX_DIRT: u16 = 2;
pub const TEX_STONE: u16 = 3;
pub const TEX_SAND: u16 = 4;
pub const TEX_WATER: u16 = 5;
pub const TEX_WOOD_SIDE: u16 = 6;
pub const TEX_WOOD_TOP: u16 = 7;
pub const TEX_LEAVES: u16 = 8;
pub const TEX_BEDROCK: u16 = 9;
pub const TEX_SNOW: u16 = 10;
pub const TEX_GRAVEL: u16 = 11;
pub const TEX_CLAY: u16 = 12;
pub const TEX_ICE: u16 = 13;
pub const TEX_CACTUS: u16 = 14;
pub const TEX_DEAD_BUSH: u16 = 15;
pub const TEX_GLASS: u16 = 16;
pub const TEX_SLAB_SIDE: u16 = 17;
pub const TEX_SLAB_TOP: u16 = 18;
pub const TEX_FLOWER: u16 = 19;
pub const TEX_LAVA: u16 = 64;
