// procedural layout math, no ECS access in here

pub mod utils;
pub mod warp;
pub mod solver;
pub mod origin;
pub mod placement;
