// arena data model
// plain configuration data, handed to the generator at call time

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Which section of the arena drives the derivation of the others.
/// Leading by dimensions uses explicit counts, leading by radius
/// overrides counts so the arena lines up to the target radius.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildOrderRule {
    #[default]
    GridByDimensions,
    GridByRadius,
    PolygonByDimensions,
    PolygonByRadius,
}

impl BuildOrderRule {
    pub fn is_grid_led(self) -> bool {
        matches!(self, BuildOrderRule::GridByDimensions | BuildOrderRule::GridByRadius)
    }
}

/// Where a mesh pivot sits on its bounding box.
/// `XYPositive` means the mesh extends along +X and +Y from its pivot.
/// Also used as the arena-wide placement anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshOrigin {
    XYPositive,
    XYNegative,
    XPositiveYNegative,
    XNegativeYPositive,
    #[default]
    Center,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionType {
    #[default]
    HorizontalGrid,
    Polygon,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    #[default]
    Meshes,
    Actors,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationRule {
    #[default]
    None,
    QuantizedRandomYaw,
    FreeRandomYaw,
}

/// Policy for polygon/grid pairs that do not fit each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryValidation {
    #[default]
    Off,
    Warn,
    Clamp,
}

/// Rotation in degrees, arena space (yaw turns +X toward +Y around Z).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl EulerAngles {
    pub const ZERO: Self = Self { pitch: 0.0, yaw: 0.0, roll: 0.0 };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// A single placement, Z-up arena space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArenaTransform {
    pub location: Vec3,
    pub rotation: EulerAngles,
    pub scale: Vec3,
}

impl Default for ArenaTransform {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: EulerAngles::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Arena point or extent in bevy's axis order.
pub fn to_bevy_space(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

impl ArenaTransform {
    /// Converts to bevy's Y-up right handed space.
    /// Arena space is Z-up left handed, so swapping y/z is a mirror and every angle flips sign.
    pub fn to_bevy(&self) -> Transform {
        let r = self.rotation;
        Transform {
            translation: to_bevy_space(self.location),
            rotation: Quat::from_euler(
                EulerRot::YZX,
                -r.yaw.to_radians(),
                -r.pitch.to_radians(),
                -r.roll.to_radians(),
            ),
            scale: to_bevy_space(self.scale),
        }
    }
}

/// One mesh of a group. `mesh` is an asset path, `None` renders a placeholder box.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshMember {
    pub origin: MeshOrigin,
    #[serde(default)]
    pub mesh: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshGroup {
    pub dimensions: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    pub members: Vec<MeshMember>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorGroup {
    pub dimensions: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub origin: MeshOrigin,
    pub spawnable_classes: Vec<String>,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionTargets {
    pub radius: f32,
    pub polygon_sides: i32,
    pub tiles_per_side: i32,
    pub grid_dimensions: i32,
}

impl Default for SectionTargets {
    fn default() -> Self {
        Self {
            radius: crate::config::DESIRED_INSCRIBED_RADIUS,
            polygon_sides: crate::config::DESIRED_ARENA_SIDES,
            tiles_per_side: crate::config::DESIRED_TILES_PER_SIDE,
            grid_dimensions: crate::config::DESIRED_GRID_DIMENSIONS,
        }
    }
}

/// Build-order container, every rule inside shares the derived geometry
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub build_order_rule: BuildOrderRule,
    #[serde(default)]
    pub targets: SectionTargets,
    pub build_rules: Vec<SectionBuildRule>,
}

/// A reusable placement pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionBuildRule {
    pub section_type: SectionType,
    pub repeat_count: i32,
    pub asset_kind: AssetKind,
    pub group_id: i32,
    pub rotation_rule: RotationRule,
    pub yaw_divisions: i32,
    pub warp_enabled: bool,
    pub warp_range: Vec3,
    pub concavity_strength: f32,
    pub default_rotation: EulerAngles,
    pub width_offset_init: f32,
    pub width_offset_increment: f32,
    pub height_offset_init: f32,
    pub height_offset_increment: f32,
    pub updates_origin_height: bool,
    // per axis upper bound of a random scale addition
    pub scale_warp: Vec3,
    // pitch added per height level, leaning stacked roofs inward
    pub lean_per_level: f32,
    pub pivot_about_center: bool,
}

impl Default for SectionBuildRule {
    fn default() -> Self {
        Self {
            section_type: SectionType::HorizontalGrid,
            repeat_count: 1,
            asset_kind: AssetKind::Meshes,
            group_id: 0,
            rotation_rule: RotationRule::None,
            yaw_divisions: 4,
            warp_enabled: false,
            warp_range: Vec3::ZERO,
            concavity_strength: 0.0,
            default_rotation: EulerAngles::ZERO,
            width_offset_init: 0.0,
            width_offset_increment: 0.0,
            height_offset_init: 0.0,
            height_offset_increment: 1.0,
            updates_origin_height: false,
            scale_warp: Vec3::ZERO,
            lean_per_level: 0.0,
            pivot_about_center: false,
        }
    }
}

impl SectionBuildRule {
    /// Repeat count, coerced to at least one pass.
    pub fn repeats(&self) -> i32 {
        self.repeat_count.max(1)
    }
}
