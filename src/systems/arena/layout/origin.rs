// origin offset calculator
// aligns a rule's local placement space to the arena-wide anchor

use bevy::prelude::*;

use super::solver::{PolygonGeometry, tiles_fitting};
use super::utils::{forward_from_yaw, opposite, origin_offset_scalar};
use crate::systems::arena::model::{BuildOrderRule, MeshOrigin, SectionType};

/// Shift applied for corner anchors, the arena extends away from the anchor corner.
/// `extent` is the full width of the section's grid.
pub fn anchor_shift(anchor: MeshOrigin, extent: f32) -> Vec3 {
    let scalar = origin_offset_scalar(anchor);
    Vec3::new(-scalar.x * extent, -scalar.y * extent, 0.0)
}

/// Ratio of the new tile footprint to the previous one, 1 when there is no previous rule.
pub fn mesh_size_ratio(mesh_x: f32, previous_x: f32) -> f32 {
    if previous_x <= 0.0 {
        return 1.0;
    }
    mesh_x / previous_x
}

/// Tiles per side for a rule whose tiles may differ from the ones the solver used.
pub fn current_tiles_per_side(
    geom: &PolygonGeometry,
    mesh_x: f32,
    previous_x: f32,
    max_tiles_per_side_row: i32,
) -> i32 {
    if mesh_size_ratio(mesh_x, previous_x) == 1.0 {
        return geom.tiles_per_side;
    }
    let span = 2.0 * opposite(geom.inscribed_radius, geom.interior_angle / 2.0);
    tiles_fitting(span, mesh_x).clamp(1, max_tiles_per_side_row.max(1))
}

/// Grid size for a rule, reuses the arena grid while the tile size is unchanged.
pub fn section_dimensions(geom: &PolygonGeometry, mesh_x: f32, previous_x: f32) -> i32 {
    if mesh_size_ratio(mesh_x, previous_x) == 1.0 {
        return geom.grid_dimensions;
    }
    tiles_fitting(2.0 * geom.side_length, mesh_x)
}

/// Inputs of one origin offset evaluation.
#[derive(Clone, Copy, Debug)]
pub struct OriginQuery {
    pub anchor: MeshOrigin,
    pub section_type: SectionType,
    pub build_order_rule: BuildOrderRule,
    pub mesh_dimensions: Vec3,
    pub mesh_scale: Vec3,
    pub tiles_per_side: i32,
    // z carried over from the previous rule
    pub previous_z: f32,
}

pub fn origin_offset(query: &OriginQuery, geom: &PolygonGeometry) -> Vec3 {
    let dims = geom.grid_dimensions as f32;
    let size = query.mesh_dimensions;
    let scale = query.mesh_scale;

    let centered = match query.section_type {
        SectionType::HorizontalGrid => Vec3::new(
            -0.5 * size.x * dims * scale.x,
            -0.5 * size.y * dims * scale.y,
            query.previous_z,
        ),
        SectionType::Polygon if query.build_order_rule.is_grid_led() => {
            let tile = size.x;
            let fitted = if geom.side_length > 0.0 && tile > 0.0 {
                query.tiles_per_side as f32 / (geom.side_length / tile)
            } else {
                0.0
            };
            let polygon_offset =
                forward_from_yaw(geom.interior_angle / 2.0) * geom.inscribed_radius * fitted;
            Vec3::new(-polygon_offset.x, -polygon_offset.y, query.previous_z)
        }
        SectionType::Polygon => {
            Vec3::new(-geom.side_length / 2.0, -geom.apothem, query.previous_z)
        }
    };

    centered + anchor_shift(query.anchor, geom.grid_extent)
}
