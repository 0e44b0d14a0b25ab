// UTILS
// all angles in degrees, arena space is Z-up

use bevy::prelude::*;

use crate::systems::arena::model::MeshOrigin;

/// `length * cos(angle)`, the side of a right triangle facing away from the angle's apex
/// the naming follows the arena formulas, not textbook trig
#[inline]
pub fn opposite(length: f32, angle_deg: f32) -> f32 {
    length * angle_deg.to_radians().cos()
}

/// `length * sin(angle)`
#[inline]
pub fn adjacent(length: f32, angle_deg: f32) -> f32 {
    length * angle_deg.to_radians().sin()
}

#[inline]
pub fn forward_from_yaw(yaw_deg: f32) -> Vec3 {
    let yaw = yaw_deg.to_radians();
    Vec3::new(yaw.cos(), yaw.sin(), 0.0)
}

/// Forward turned a quarter toward +Y. For a polygon walked with increasing yaw this points inward.
#[inline]
pub fn right_from_yaw(yaw_deg: f32) -> Vec3 {
    let yaw = yaw_deg.to_radians();
    Vec3::new(-yaw.sin(), yaw.cos(), 0.0)
}

/// Rotates around the Z axis, z is left untouched.
pub fn rotate_yaw(v: Vec3, yaw_deg: f32) -> Vec3 {
    let (sin, cos) = yaw_deg.to_radians().sin_cos();
    Vec3::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos, v.z)
}

/// Pivot position relative to the bounding box center, as a fraction of the box size.
pub fn origin_offset_scalar(origin: MeshOrigin) -> Vec2 {
    match origin {
        MeshOrigin::XYPositive => Vec2::new(-0.5, -0.5),
        MeshOrigin::XYNegative => Vec2::new(0.5, 0.5),
        MeshOrigin::XPositiveYNegative => Vec2::new(-0.5, 0.5),
        MeshOrigin::XNegativeYPositive => Vec2::new(0.5, -0.5),
        MeshOrigin::Center => Vec2::ZERO,
    }
}

/// Correction for a corner-pivoted mesh turned by `quarter * 90` degrees about its pivot,
/// moves the visible mesh back into its cell.
pub fn rotation_compensation_offset(origin: MeshOrigin, mesh_size: Vec3, quarter: u32) -> Vec3 {
    let x = mesh_size.x;
    let y = mesh_size.y;
    let (dx, dy) = match (origin, quarter % 4) {
        (MeshOrigin::Center, _) | (_, 0) => (0.0, 0.0),

        (MeshOrigin::XYPositive, 1) => (x, 0.0),
        (MeshOrigin::XYPositive, 2) => (x, y),
        (MeshOrigin::XYPositive, _) => (0.0, y),

        (MeshOrigin::XYNegative, 1) => (-x, 0.0),
        (MeshOrigin::XYNegative, 2) => (-x, -y),
        (MeshOrigin::XYNegative, _) => (0.0, -y),

        (MeshOrigin::XPositiveYNegative, 1) => (0.0, -y),
        (MeshOrigin::XPositiveYNegative, 2) => (x, -y),
        (MeshOrigin::XPositiveYNegative, _) => (x, 0.0),

        (MeshOrigin::XNegativeYPositive, 1) => (0.0, y),
        (MeshOrigin::XNegativeYPositive, 2) => (-x, y),
        (MeshOrigin::XNegativeYPositive, _) => (-x, 0.0),
    };
    Vec3::new(dx, dy, 0.0)
}

/// Keeps an off-center mesh turning about its own center under any yaw:
/// returns `pivot_to_center - rotate(pivot_to_center, angle)`.
pub fn offset_mesh_to_center(origin: MeshOrigin, mesh_size: Vec3, angle_deg: f32) -> Vec3 {
    if origin == MeshOrigin::Center {
        return Vec3::ZERO;
    }

    let scalar = origin_offset_scalar(origin);
    let to_center = Vec3::new(-scalar.x * mesh_size.x, -scalar.y * mesh_size.y, 0.0);

    to_center - rotate_yaw(to_center, angle_deg)
}
