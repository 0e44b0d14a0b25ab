// Configuration file, all measurements in engine units (1 unit = 1 cm, as the mesh kits are authored)
// This controls the initial generation parameter settings

pub const INITIAL_SEED: u64 = 1512086461918454205;

// Config file looked up in the working directory when no path is given on the command line
pub const CONFIG_FILE: &str = "arena.ron";

// Polygon limits
pub const MIN_SIDES: i32 = 3;
pub const MAX_SIDES: i32 = 120;          // WARNING: consider tiles per side and build rules
pub const MAX_TILES_PER_SIDE_ROW: i32 = 100;

// Build rule targets
pub const DESIRED_ARENA_SIDES: i32 = 8;
pub const DESIRED_GRID_DIMENSIONS: i32 = 10;
pub const DESIRED_INSCRIBED_RADIUS: f32 = 2000.0;
pub const DESIRED_TILES_PER_SIDE: i32 = 5;

// Default mesh kit sizes (x = length, y = depth, z = height)
pub const FLOOR_MESH_SIZE: [f32; 3] = [500.0, 500.0, 50.0];
pub const WALL_MESH_SIZE: [f32; 3] = [500.0, 50.0, 500.0];
pub const ROOF_MESH_SIZE: [f32; 3] = [500.0, 500.0, 500.0];

// Walls are stacked this many tiles high in the default arena
pub const SIDE_TILE_HEIGHT: u32 = 2;
pub const ROOF_TILE_HEIGHT: u32 = 1;

// Viewer only, engine units to bevy world units
pub const VIEW_SCALE: f32 = 0.01;
