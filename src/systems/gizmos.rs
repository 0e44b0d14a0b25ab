use bevy::prelude::*;
use bevy::render::camera::Camera;
use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};

use crate::config::VIEW_SCALE;
use crate::systems::arena::generator::{GenerationState, SectionSummary};
use crate::systems::arena::layout::solver::GeometryFit;
use crate::systems::arena::layout::utils::forward_from_yaw;
use crate::systems::arena::model::to_bevy_space;

// camera-based infinite ground grid for bearings, plus the derived outline of every section
pub struct ArenaGizmosPlugin;

#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct GridGizmoGroup;

impl Plugin for ArenaGizmosPlugin {
    fn build(&self, app: &mut App) {
        app
            .insert_resource(GizmoSettings::default())
            .init_gizmo_group::<GridGizmoGroup>()
            .add_systems(Startup, setup_gizmos)
            .add_systems(Update, (draw_grid, draw_section_outlines));
    }
}

// runtime switches, toggled from the side panel
#[derive(Resource)]
pub struct GizmoSettings {
    pub major_spacing: f32,
    pub minor_spacing: f32,
    pub major_color: Color,
    pub minor_color: Color,
    pub grid_size: f32,
    pub grid_enabled: bool,
    pub outlines_enabled: bool,
}

impl Default for GizmoSettings {
    fn default() -> Self {
        Self {
            // one minor cell per default floor tile
            major_spacing: 50.0,
            minor_spacing: 5.0,
            major_color: Color::srgba(0.5, 0.5, 0.5, 0.15),
            minor_color: Color::srgba(0.3, 0.3, 0.3, 0.05),
            grid_size: 300.0,
            grid_enabled: true,
            outlines_enabled: true,
        }
    }
}

fn setup_gizmos(
    mut config_store: ResMut<GizmoConfigStore>
) {
    let (config, _) = config_store.config_mut::<GridGizmoGroup>();
    config.depth_bias = 0.1;
}

fn draw_grid(
    mut gizmos: Gizmos<GridGizmoGroup>,
    params: Res<GizmoSettings>,
    camera_query: Query<&Transform, With<Camera>>,
) {
    if !params.grid_enabled {
        return;
    }

    let Ok(camera_transform) = camera_query.single() else {
        return;
    };

    let camera_pos = camera_transform.translation;
    let min_x = camera_pos.x - params.grid_size;
    let max_x = camera_pos.x + params.grid_size;
    let min_z = camera_pos.z - params.grid_size;
    let max_z = camera_pos.z + params.grid_size;

    for (spacing, color, skip_major) in [
        (params.minor_spacing, params.minor_color, true),
        (params.major_spacing, params.major_color, false),
    ] {
        if spacing <= 0.0 {
            continue;
        }
        // skip the minor lines a major line covers
        let covered = |v: f32| skip_major && (v % params.major_spacing).abs() <= f32::EPSILON;

        let mut x = (min_x / spacing).floor() * spacing;
        while x <= max_x {
            if !covered(x) {
                gizmos.line(Vec3::new(x, -0.02, min_z), Vec3::new(x, -0.02, max_z), color);
            }
            x += spacing;
        }

        let mut z = (min_z / spacing).floor() * spacing;
        while z <= max_z {
            if !covered(z) {
                gizmos.line(Vec3::new(min_x, -0.02, z), Vec3::new(max_x, -0.02, z), color);
            }
            z += spacing;
        }
    }
}

/// Ring vertices in arena space, the first side runs along -Y from -X to +X.
pub fn polygon_outline(summary: &SectionSummary) -> Vec<Vec3> {
    let geom = &summary.geometry;
    if geom.sides < 3 {
        return Vec::new();
    }
    let start = -90.0 - geom.exterior_angle / 2.0;
    (0..geom.sides)
        .map(|k| forward_from_yaw(start + geom.exterior_angle * k as f32) * geom.inscribed_radius + summary.anchor_shift)
        .collect()
}

/// Grid square corners in arena space.
pub fn grid_outline(summary: &SectionSummary) -> [Vec3; 4] {
    let half = summary.geometry.grid_extent / 2.0;
    [
        Vec3::new(-half, -half, 0.0),
        Vec3::new(half, -half, 0.0),
        Vec3::new(half, half, 0.0),
        Vec3::new(-half, half, 0.0),
    ]
    .map(|corner| corner + summary.anchor_shift)
}

fn draw_section_outlines(
    mut gizmos: Gizmos,
    params: Res<GizmoSettings>,
    state: Res<GenerationState>,
) {
    if !params.outlines_enabled {
        return;
    }

    let view = |p: Vec3| to_bevy_space(p) * VIEW_SCALE + Vec3::Y * 0.05;

    for summary in &state.sections {
        let ring_color = match summary.fit {
            GeometryFit::Fits => Color::srgba(0.2, 0.8, 0.9, 0.6),
            GeometryFit::Overflows | GeometryFit::Gapped => Color::srgba(0.9, 0.3, 0.2, 0.8),
        };
        gizmos.linestrip(
            polygon_outline(summary).into_iter().cycle().take(summary.geometry.sides.max(0) as usize + 1).map(view),
            ring_color,
        );
        gizmos.linestrip(
            grid_outline(summary).into_iter().cycle().take(5).map(view),
            Color::srgba(1.0, 1.0, 1.0, 0.25),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::arena::layout::solver::PolygonGeometry;
    use crate::systems::arena::model::BuildOrderRule;

    fn summary(sides: i32, side_length: f32) -> SectionSummary {
        let exterior = 360.0 / sides as f32;
        let radius = (side_length / 2.0) / (exterior / 2.0).to_radians().sin();
        SectionSummary {
            build_order_rule: BuildOrderRule::PolygonByDimensions,
            geometry: PolygonGeometry {
                sides,
                interior_angle: 180.0 - exterior,
                exterior_angle: exterior,
                side_length,
                inscribed_radius: radius,
                apothem: radius * (exterior / 2.0).to_radians().cos(),
                tiles_per_side: 1,
                grid_dimensions: 1,
                grid_extent: 2.0 * radius,
            },
            anchor_shift: Vec3::ZERO,
            fit: GeometryFit::Fits,
        }
    }

    // the first side is where a polygon-led ring starts placing tiles
    #[test]
    fn outline_starts_on_the_bottom_side() {
        let s = summary(8, 1000.0);
        let ring = polygon_outline(&s);
        assert_eq!(ring.len(), 8);
        assert!((ring[0] - Vec3::new(-500.0, -s.geometry.apothem, 0.0)).length() < 1e-2);
        assert!((ring[1] - Vec3::new(500.0, -s.geometry.apothem, 0.0)).length() < 1e-2);
    }

    #[test]
    fn every_outline_side_has_the_side_length() {
        let s = summary(7, 640.0);
        let ring = polygon_outline(&s);
        for i in 0..ring.len() {
            let side = ring[(i + 1) % ring.len()] - ring[i];
            assert!((side.length() - 640.0).abs() < 1e-2);
        }
    }
}
