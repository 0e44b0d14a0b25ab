// section placement
// walks one build rule and emits a transform for every tile
//
// the random stream is consumed in loop order (side/row, then length/col, then height/repeat)
// and per tile in the order: member, rotation, directional warp, scale warp.
// changing either order changes every layout built from a given seed

use bevy::prelude::*;
use rand::Rng;

use super::solver::PolygonGeometry;
use super::utils::{
    forward_from_yaw, offset_mesh_to_center, right_from_yaw, rotation_compensation_offset,
};
use super::warp::{concavity_warp, directional_warp, frand_range, rand_range};
use crate::systems::arena::assets::PlacementAsset;
use crate::systems::arena::model::{ArenaTransform, EulerAngles, MeshOrigin, RotationRule, SectionBuildRule};

/// Receives every computed placement, `member` indexes the group's members.
pub trait PlacementSink {
    fn emit(&mut self, member: usize, transform: ArenaTransform);
}

impl PlacementSink for Vec<(usize, ArenaTransform)> {
    fn emit(&mut self, member: usize, transform: ArenaTransform) {
        self.push((member, transform));
    }
}

/// Everything one rule needs, resolved by the generator beforehand.
pub struct RulePlacement<'a> {
    pub rule: &'a SectionBuildRule,
    pub geometry: &'a PolygonGeometry,
    pub asset: &'a PlacementAsset,
    pub origin_offset: Vec3,
    // polygon rules
    pub tiles_per_side: i32,
    pub mesh_scalar: f32,
    // grid rules
    pub dimensions: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlacementOutcome {
    pub emitted: usize,
    pub last_position: Vec3,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ResolvedRotation {
    yaw_step: f32,
    offset: Vec3,
}

fn resolve_rotation<R: Rng + ?Sized>(
    rule: &SectionBuildRule,
    origin: MeshOrigin,
    size: Vec3,
    rng: &mut R,
) -> ResolvedRotation {
    match rule.rotation_rule {
        RotationRule::None => ResolvedRotation::default(),
        RotationRule::QuantizedRandomYaw => {
            let divisions = rule.yaw_divisions.max(1);
            let step = rand_range(rng, 0, divisions - 1);
            let yaw_step = 360.0 / divisions as f32 * step as f32;

            let quarters = yaw_step / 90.0;
            let offset = if (quarters - quarters.round()).abs() < 1e-4 {
                rotation_compensation_offset(origin, size, quarters.round() as u32)
            } else if rule.pivot_about_center {
                offset_mesh_to_center(origin, size, yaw_step)
            } else {
                Vec3::ZERO
            };
            ResolvedRotation { yaw_step, offset }
        }
        RotationRule::FreeRandomYaw => {
            let yaw_step = frand_range(rng, 0.0, 360.0);
            let offset = if rule.pivot_about_center {
                offset_mesh_to_center(origin, size, yaw_step)
            } else {
                Vec3::ZERO
            };
            ResolvedRotation { yaw_step, offset }
        }
    }
}

fn pick_member<R: Rng + ?Sized>(asset: &PlacementAsset, rng: &mut R) -> usize {
    let count = asset.member_count();
    if count > 1 {
        rand_range(rng, 0, count as i32 - 1) as usize
    } else {
        0
    }
}

fn warp_scale<R: Rng + ?Sized>(rule: &SectionBuildRule, scale: Vec3, rng: &mut R) -> Vec3 {
    if rule.scale_warp == Vec3::ZERO {
        return scale;
    }
    scale
        + Vec3::new(
            frand_range(rng, 0.0, rule.scale_warp.x),
            frand_range(rng, 0.0, rule.scale_warp.y),
            frand_range(rng, 0.0, rule.scale_warp.z),
        )
}

fn tile_rotation(rule: &SectionBuildRule, yaw: f32, level: i32) -> EulerAngles {
    let base = rule.default_rotation;
    EulerAngles {
        pitch: base.pitch + rule.lean_per_level * level as f32,
        yaw: base.yaw + yaw,
        roll: base.roll,
    }
}

/// Ring placement: sides, then tiles along a side, then stacked levels.
pub fn place_polygon<R: Rng + ?Sized>(
    p: &RulePlacement,
    rng: &mut R,
    sink: &mut dyn PlacementSink,
) -> PlacementOutcome {
    let rule = p.rule;
    let geom = p.geometry;
    let size = p.asset.dimensions;
    let repeats = rule.repeats();
    let tiles = p.tiles_per_side.max(0);
    let mid = tiles / 2;

    let mut outcome = PlacementOutcome::default();
    let mut cumulative = Vec3::ZERO;
    let mut side_forward = Vec3::ZERO;

    for side in 0..geom.sides {
        // step over the corner, scaled when the tile size changed from the previous rule
        cumulative += side_forward * size.x * p.mesh_scalar;

        let side_yaw = geom.exterior_angle * side as f32;
        side_forward = forward_from_yaw(side_yaw);
        let side_right = right_from_yaw(side_yaw);

        for len in 0..tiles {
            if len > 0 {
                cumulative += side_forward * size.x;
            }

            for level in 0..repeats {
                let member = pick_member(p.asset, rng);
                let rotation = resolve_rotation(rule, p.asset.origin(member), size, rng);

                let mut location = cumulative
                    + p.origin_offset
                    + Vec3::new(0.0, 0.0, size.z * level as f32 * rule.height_offset_increment + rule.height_offset_init)
                    + side_right * size.y * rule.width_offset_init
                    + side_right * size.y * rule.width_offset_increment * level as f32
                    + rotation.offset;

                if rule.warp_enabled {
                    // bow along the side, outward for positive strength
                    location += concavity_warp(mid, mid, len, len, rule.concavity_strength, -side_right);
                    location += directional_warp(rng, rule.warp_range, side_forward, side_right);
                }

                let transform = ArenaTransform {
                    location,
                    rotation: tile_rotation(rule, side_yaw + rotation.yaw_step, level),
                    scale: warp_scale(rule, p.asset.scale, rng),
                };
                sink.emit(member, transform);
                outcome.emitted += 1;
            }

            outcome.last_position = cumulative + p.origin_offset;
        }
    }

    outcome
}

/// Floor placement: repeats, then rows, then columns on world axes.
pub fn place_grid<R: Rng + ?Sized>(
    p: &RulePlacement,
    rng: &mut R,
    sink: &mut dyn PlacementSink,
) -> PlacementOutcome {
    let rule = p.rule;
    let dims = p.asset.dimensions;
    let scale = p.asset.scale;
    let cells = p.dimensions.max(0);
    let mid = cells / 2;
    let forward = Vec3::X;
    let right = Vec3::Y;

    let mut outcome = PlacementOutcome::default();

    for repeat in 0..rule.repeats() {
        for row in 0..cells {
            for col in 0..cells {
                let member = pick_member(p.asset, rng);
                let rotation = resolve_rotation(rule, p.asset.origin(member), dims, rng);

                let cell = forward * dims.x * scale.x * row as f32 + right * dims.y * scale.y * col as f32;
                let mut location = p.origin_offset
                    + Vec3::new(0.0, 0.0, dims.z * repeat as f32 + rule.height_offset_init)
                    + cell
                    + rotation.offset;

                if rule.warp_enabled {
                    location += concavity_warp(mid, mid, col, row, rule.concavity_strength, Vec3::Z);
                    location += directional_warp(rng, rule.warp_range, forward, right);
                }

                let transform = ArenaTransform {
                    location,
                    rotation: tile_rotation(rule, rotation.yaw_step, repeat),
                    scale: warp_scale(rule, scale, rng),
                };
                sink.emit(member, transform);
                outcome.emitted += 1;
                outcome.last_position = p.origin_offset + cell;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::arena::model::SectionType;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn square_tile() -> PlacementAsset {
        PlacementAsset {
            dimensions: Vec3::new(500.0, 500.0, 50.0),
            scale: Vec3::ONE,
            origins: vec![MeshOrigin::Center],
        }
    }

    fn geometry(sides: i32, tiles: i32) -> PolygonGeometry {
        let exterior = 360.0 / sides as f32;
        let side_length = 500.0 * tiles as f32;
        let radius = (side_length / 2.0) / (exterior / 2.0).to_radians().sin();
        PolygonGeometry {
            sides,
            interior_angle: 180.0 - exterior,
            exterior_angle: exterior,
            side_length,
            inscribed_radius: radius,
            apothem: radius * (90.0 - exterior / 2.0).to_radians().sin(),
            tiles_per_side: tiles,
            grid_dimensions: 4,
            grid_extent: 2000.0,
        }
    }

    fn run_polygon(rule: &SectionBuildRule, geom: &PolygonGeometry, asset: &PlacementAsset, seed: u64) -> Vec<(usize, ArenaTransform)> {
        let p = RulePlacement {
            rule,
            geometry: geom,
            asset,
            origin_offset: Vec3::ZERO,
            tiles_per_side: geom.tiles_per_side,
            mesh_scalar: 1.0,
            dimensions: geom.grid_dimensions,
        };
        let mut out = Vec::new();
        place_polygon(&p, &mut StdRng::seed_from_u64(seed), &mut out);
        out
    }

    #[test]
    fn polygon_emits_every_tile() {
        let rule = SectionBuildRule { section_type: SectionType::Polygon, repeat_count: 3, ..default() };
        let out = run_polygon(&rule, &geometry(6, 4), &square_tile(), 1);
        assert_eq!(out.len(), 6 * 4 * 3);
    }

    #[test]
    fn repeat_count_is_coerced() {
        let rule = SectionBuildRule { section_type: SectionType::Polygon, repeat_count: -2, ..default() };
        let out = run_polygon(&rule, &geometry(5, 2), &square_tile(), 1);
        assert_eq!(out.len(), 5 * 2);
    }

    // the tile after the last one of the ring would land back on the first
    #[test]
    fn ring_closes() {
        for sides in [3, 5, 8, 13] {
            let rule = SectionBuildRule { section_type: SectionType::Polygon, ..default() };
            let geom = geometry(sides, 3);
            let out = run_polygon(&rule, &geom, &square_tile(), 9);
            let last = out.last().unwrap().1.location;
            let last_forward = forward_from_yaw(geom.exterior_angle * (sides - 1) as f32);
            let next = last + last_forward * 500.0;
            assert!(next.length() < 0.5, "{sides} sides ended {next}");
        }
    }

    #[test]
    fn sides_rotate_by_exterior_angle() {
        let rule = SectionBuildRule { section_type: SectionType::Polygon, ..default() };
        let out = run_polygon(&rule, &geometry(4, 1), &square_tile(), 2);
        let yaws: Vec<f32> = out.iter().map(|(_, t)| t.rotation.yaw).collect();
        assert_eq!(yaws, vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[test]
    fn stacked_levels_climb_by_height_increment() {
        let rule = SectionBuildRule {
            section_type: SectionType::Polygon,
            repeat_count: 3,
            height_offset_init: 10.0,
            height_offset_increment: 2.0,
            ..default()
        };
        let out = run_polygon(&rule, &geometry(3, 1), &square_tile(), 2);
        let zs: Vec<f32> = out.iter().take(3).map(|(_, t)| t.location.z).collect();
        assert_eq!(zs, vec![10.0, 110.0, 210.0]);
    }

    #[test]
    fn quantized_yaw_lands_on_divisions() {
        let rule = SectionBuildRule {
            section_type: SectionType::Polygon,
            rotation_rule: RotationRule::QuantizedRandomYaw,
            yaw_divisions: 4,
            ..default()
        };
        let out = run_polygon(&rule, &geometry(4, 3), &square_tile(), 77);
        for (i, (_, t)) in out.iter().enumerate() {
            let side_yaw = 90.0 * (i / 3) as f32;
            let step = t.rotation.yaw - side_yaw;
            assert!((step / 90.0 - (step / 90.0).round()).abs() < 1e-4, "{step}");
        }
    }

    #[test]
    fn members_are_drawn_from_the_group() {
        let mut asset = square_tile();
        asset.origins = vec![MeshOrigin::Center; 3];
        let rule = SectionBuildRule { section_type: SectionType::Polygon, ..default() };
        let out = run_polygon(&rule, &geometry(8, 4), &asset, 5);
        assert!(out.iter().all(|(m, _)| *m < 3));
        assert!(out.iter().any(|(m, _)| *m != out[0].0));
    }

    #[test]
    fn grid_covers_every_cell() {
        let rule = SectionBuildRule { repeat_count: 2, ..default() };
        let geom = geometry(8, 2);
        let asset = square_tile();
        let p = RulePlacement {
            rule: &rule,
            geometry: &geom,
            asset: &asset,
            origin_offset: Vec3::new(-1000.0, -1000.0, 0.0),
            tiles_per_side: 2,
            mesh_scalar: 1.0,
            dimensions: 4,
        };
        let mut out = Vec::new();
        let outcome = place_grid(&p, &mut StdRng::seed_from_u64(1), &mut out);
        assert_eq!(outcome.emitted, 32);
        assert_eq!(out[0].1.location, Vec3::new(-1000.0, -1000.0, 0.0));
        // second column of the first row
        assert_eq!(out[1].1.location, Vec3::new(-1000.0, -500.0, 0.0));
        // second repeat is one tile higher
        assert_eq!(out[16].1.location.z, 50.0);
        assert_eq!(outcome.last_position, Vec3::new(500.0, 500.0, 0.0));
    }

    #[test]
    fn corner_pivot_quarter_turns_stay_in_cell() {
        let asset = PlacementAsset {
            dimensions: Vec3::new(500.0, 500.0, 50.0),
            scale: Vec3::ONE,
            origins: vec![MeshOrigin::XYPositive],
        };
        let rule = SectionBuildRule {
            rotation_rule: RotationRule::QuantizedRandomYaw,
            yaw_divisions: 4,
            ..default()
        };
        let geom = geometry(4, 1);
        let p = RulePlacement {
            rule: &rule,
            geometry: &geom,
            asset: &asset,
            origin_offset: Vec3::ZERO,
            tiles_per_side: 1,
            mesh_scalar: 1.0,
            dimensions: 3,
        };
        let mut out = Vec::new();
        place_grid(&p, &mut StdRng::seed_from_u64(21), &mut out);
        for (i, (_, t)) in out.iter().enumerate() {
            let cell = Vec3::new(500.0 * (i / 3) as f32, 500.0 * (i % 3) as f32, 0.0);
            let quarter = (t.rotation.yaw / 90.0).round() as u32;
            let expected = cell + rotation_compensation_offset(MeshOrigin::XYPositive, asset.dimensions, quarter);
            assert_eq!(t.location, expected);
        }
    }

    // the compensation table value is added as is, on every side of the ring
    #[test]
    fn ring_compensation_uses_table_value() {
        let asset = PlacementAsset {
            dimensions: Vec3::new(500.0, 500.0, 50.0),
            scale: Vec3::ONE,
            origins: vec![MeshOrigin::XYPositive],
        };
        let geom = geometry(4, 2);
        let plain = SectionBuildRule { section_type: SectionType::Polygon, ..default() };
        let turned = SectionBuildRule {
            rotation_rule: RotationRule::QuantizedRandomYaw,
            yaw_divisions: 4,
            ..plain.clone()
        };

        let base = run_polygon(&plain, &geom, &asset, 3);
        let out = run_polygon(&turned, &geom, &asset, 3);
        assert_eq!(base.len(), out.len());
        for (i, ((_, b), (_, t))) in base.iter().zip(&out).enumerate() {
            let side_yaw = 90.0 * (i / 2) as f32;
            let quarter = ((t.rotation.yaw - side_yaw) / 90.0).round() as u32;
            let expected = rotation_compensation_offset(MeshOrigin::XYPositive, asset.dimensions, quarter);
            assert!((t.location - b.location - expected).length() < 1e-3, "tile {i}");
        }
    }

    #[test]
    fn width_offsets_step_along_side_right() {
        let asset = PlacementAsset {
            dimensions: Vec3::new(500.0, 40.0, 50.0),
            scale: Vec3::ONE,
            origins: vec![MeshOrigin::Center],
        };
        let geom = geometry(4, 1);
        let plain = SectionBuildRule { section_type: SectionType::Polygon, repeat_count: 2, ..default() };
        let shifted = SectionBuildRule {
            width_offset_init: 1.0,
            width_offset_increment: 0.5,
            ..plain.clone()
        };

        let base = run_polygon(&plain, &geom, &asset, 4);
        let out = run_polygon(&shifted, &geom, &asset, 4);
        for (i, ((_, b), (_, t))) in base.iter().zip(&out).enumerate() {
            let right = right_from_yaw(90.0 * (i / 2) as f32);
            let level = (i % 2) as f32;
            let expected = right * 40.0 * (1.0 + 0.5 * level);
            assert!((t.location - b.location - expected).length() < 1e-3, "tile {i}");
        }
    }

    // the corner step shrinks with the tile size ratio, steps along a side do not
    #[test]
    fn corner_step_uses_mesh_scalar() {
        let rule = SectionBuildRule { section_type: SectionType::Polygon, ..default() };
        let geom = geometry(4, 2);
        let asset = square_tile();
        let p = RulePlacement {
            rule: &rule,
            geometry: &geom,
            asset: &asset,
            origin_offset: Vec3::ZERO,
            tiles_per_side: 2,
            mesh_scalar: 0.5,
            dimensions: geom.grid_dimensions,
        };
        let mut out = Vec::new();
        place_polygon(&p, &mut StdRng::seed_from_u64(1), &mut out);
        assert_eq!(out[1].1.location - out[0].1.location, Vec3::new(500.0, 0.0, 0.0));
        let corner = out[2].1.location - out[1].1.location;
        assert!((corner - Vec3::new(250.0, 0.0, 0.0)).length() < 1e-3, "{corner}");
    }
}
