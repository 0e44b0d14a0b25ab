pub mod arena;
pub mod export;
pub mod gizmos;
pub mod ui;
