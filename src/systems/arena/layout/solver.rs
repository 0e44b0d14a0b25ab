// arena parameter solver
// derives a consistent polygon + grid pair from one section's targets

use bevy::prelude::*;

use super::utils::{adjacent, opposite};
use crate::systems::arena::assets::AssetLibrary;
use crate::systems::arena::error::ArenaError;
use crate::systems::arena::model::{AssetKind, BuildOrderRule, GeometryValidation, Section, SectionType};

/// Derived geometry, recomputed at the start of every section.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PolygonGeometry {
    pub sides: i32,
    pub interior_angle: f32,
    pub exterior_angle: f32,
    pub side_length: f32,
    // center to vertex
    pub inscribed_radius: f32,
    // center to side midpoint
    pub apothem: f32,
    pub tiles_per_side: i32,
    pub grid_dimensions: i32,
    // full width of the paired grid, shared by every rule of the section
    pub grid_extent: f32,
}

/// Which groups feed the solver: first grid rule and first polygon rule of the section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusGroups {
    pub grid: (AssetKind, i32),
    pub polygon: (AssetKind, i32),
}

pub fn focus_groups(section: &Section) -> FocusGroups {
    let mut grid = None;
    let mut polygon = None;

    for rule in &section.build_rules {
        let slot = match rule.section_type {
            SectionType::HorizontalGrid => &mut grid,
            SectionType::Polygon => &mut polygon,
        };
        if slot.is_none() {
            *slot = Some((rule.asset_kind, rule.group_id));
        }
        if grid.is_some() && polygon.is_some() {
            break;
        }
    }

    FocusGroups {
        grid: grid.unwrap_or((AssetKind::Meshes, 0)),
        polygon: polygon.unwrap_or((AssetKind::Meshes, 0)),
    }
}

pub fn interior_angle(sides: i32) -> f32 {
    (sides - 2) as f32 * 180.0 / sides as f32
}

pub fn exterior_angle(sides: i32) -> f32 {
    360.0 / sides as f32
}

/// How many whole tiles of `tile` fit in `length`, zero for degenerate tiles.
pub fn tiles_fitting(length: f32, tile: f32) -> i32 {
    if tile <= 0.0 || !length.is_finite() {
        debug!("degenerate tile length {tile} for span {length}, fitting none");
        return 0;
    }
    (length / tile).floor().max(0.0) as i32
}

pub fn solve_geometry(
    section: &Section,
    assets: &AssetLibrary,
    max_sides: i32,
    max_tiles_per_side_row: i32,
) -> Result<PolygonGeometry, ArenaError> {
    let focus = focus_groups(section);
    let grid_size = assets.dimensions(focus.grid.0, focus.grid.1)?;
    let poly_size = assets.dimensions(focus.polygon.0, focus.polygon.1)?;

    let max_sides = max_sides.max(crate::config::MIN_SIDES);
    let max_tiles = max_tiles_per_side_row.max(1);
    let targets = &section.targets;

    let sides = targets.polygon_sides.clamp(crate::config::MIN_SIDES, max_sides);
    let interior = interior_angle(sides);
    let half_interior = interior / 2.0;

    let mut geom = PolygonGeometry {
        sides,
        interior_angle: interior,
        exterior_angle: exterior_angle(sides),
        ..default()
    };

    match section.build_order_rule {
        BuildOrderRule::GridByDimensions => {
            geom.grid_dimensions = targets.grid_dimensions.max(1);
            geom.inscribed_radius = grid_size.x * (geom.grid_dimensions - 1) as f32 * 0.5;
            wall_from_radius(&mut geom, poly_size.x, max_tiles);
        }
        BuildOrderRule::GridByRadius => {
            geom.grid_dimensions = tiles_fitting(targets.radius, grid_size.x).max(2);
            geom.inscribed_radius = grid_size.x * geom.grid_dimensions as f32 * 0.5;
            wall_from_radius(&mut geom, poly_size.x, max_tiles);
        }
        BuildOrderRule::PolygonByDimensions => {
            geom.tiles_per_side = targets.tiles_per_side.clamp(1, max_tiles);
            radius_from_tiles(&mut geom, poly_size.x, grid_size.x);
        }
        BuildOrderRule::PolygonByRadius => {
            let span = 2.0 * opposite(targets.radius.max(0.0), half_interior);
            geom.tiles_per_side = tiles_fitting(span, poly_size.x).clamp(1, max_tiles);
            radius_from_tiles(&mut geom, poly_size.x, grid_size.x);
        }
    }

    geom.grid_extent = grid_size.x * geom.grid_dimensions as f32;
    Ok(geom)
}

// radius is known, tile the walls along it
fn wall_from_radius(geom: &mut PolygonGeometry, poly_tile: f32, max_tiles: i32) {
    let half_interior = geom.interior_angle / 2.0;
    geom.side_length = 2.0 * opposite(geom.inscribed_radius, half_interior);
    geom.tiles_per_side = tiles_fitting(geom.side_length, poly_tile).clamp(1, max_tiles);
    geom.apothem = adjacent(geom.inscribed_radius, half_interior).abs();
}

// tiles per side are known, grow the polygon and its grid around them
fn radius_from_tiles(geom: &mut PolygonGeometry, poly_tile: f32, grid_tile: f32) {
    let half_interior = geom.interior_angle / 2.0;
    geom.side_length = poly_tile.max(0.0) * geom.tiles_per_side as f32;
    geom.inscribed_radius = (geom.side_length / 2.0) / (90.0 - half_interior).to_radians().sin();
    geom.apothem = adjacent(geom.inscribed_radius, half_interior).abs();
    geom.grid_dimensions = if grid_tile > 0.0 {
        (2.0 * geom.inscribed_radius / grid_tile).ceil() as i32
    } else {
        0
    };
}

/// How a polygon sits against its paired grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryFit {
    Fits,
    // the ring pokes out past the grid edges
    Overflows,
    // the wall tiles leave at least one tile of open side
    Gapped,
}

pub fn check_fit(geom: &PolygonGeometry, poly_tile: f32) -> GeometryFit {
    const SLACK: f32 = 1e-3;
    if 2.0 * geom.apothem > geom.grid_extent + SLACK {
        return GeometryFit::Overflows;
    }
    if poly_tile > 0.0 && geom.side_length - geom.tiles_per_side as f32 * poly_tile >= poly_tile - SLACK {
        return GeometryFit::Gapped;
    }
    GeometryFit::Fits
}

/// Applies the configured validation policy, `Off` leaves the geometry untouched.
/// Returns the fit after the policy ran.
pub fn validate_geometry(
    mode: GeometryValidation,
    geom: &mut PolygonGeometry,
    grid_tile: f32,
    poly_tile: f32,
    max_tiles_per_side_row: i32,
) -> GeometryFit {
    let fit = check_fit(geom, poly_tile);
    match (mode, fit) {
        (GeometryValidation::Off, _) | (_, GeometryFit::Fits) => fit,
        (GeometryValidation::Warn, fit) => {
            warn!(
                "{}-sided polygon does not fit its {}x{} grid: {:?}",
                geom.sides, geom.grid_dimensions, geom.grid_dimensions, fit
            );
            fit
        }
        (GeometryValidation::Clamp, _) if grid_tile <= 0.0 || poly_tile <= 0.0 => fit,
        (GeometryValidation::Clamp, GeometryFit::Overflows) => {
            geom.grid_dimensions = (2.0 * geom.inscribed_radius / grid_tile).ceil() as i32;
            geom.grid_extent = grid_tile * geom.grid_dimensions as f32;
            info!("grew arena grid to {} tiles to cover the polygon", geom.grid_dimensions);
            check_fit(geom, poly_tile)
        }
        (GeometryValidation::Clamp, GeometryFit::Gapped) => {
            // shrink the ring onto the tiles it actually has
            geom.tiles_per_side = geom.tiles_per_side.clamp(1, max_tiles_per_side_row.max(1));
            radius_from_tiles(geom, poly_tile, grid_tile);
            geom.grid_extent = grid_tile * geom.grid_dimensions as f32;
            info!(
                "closed polygon sides to {} tiles, radius {:.1}, grid {} tiles",
                geom.tiles_per_side, geom.inscribed_radius, geom.grid_dimensions
            );
            check_fit(geom, poly_tile)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::arena::model::{MeshGroup, MeshMember, SectionBuildRule, SectionTargets};

    const EPS: f32 = 1e-2;

    fn mesh(x: f32, y: f32, z: f32) -> MeshGroup {
        MeshGroup {
            dimensions: Vec3::new(x, y, z),
            scale: Vec3::ONE,
            members: vec![MeshMember::default()],
        }
    }

    // group 0 is the floor, group 1 the wall
    fn section(rule: BuildOrderRule, targets: SectionTargets) -> Section {
        Section {
            build_order_rule: rule,
            targets,
            build_rules: vec![
                SectionBuildRule { section_type: SectionType::HorizontalGrid, group_id: 0, ..default() },
                SectionBuildRule { section_type: SectionType::Polygon, group_id: 1, ..default() },
            ],
        }
    }

    fn solve(rule: BuildOrderRule, targets: SectionTargets) -> PolygonGeometry {
        let groups = [mesh(500.0, 500.0, 50.0), mesh(500.0, 50.0, 500.0)];
        let lib = AssetLibrary::new(&groups, &[]);
        solve_geometry(&section(rule, targets), &lib, 120, 100).unwrap()
    }

    #[test]
    fn angles_are_supplementary() {
        for sides in 3..=120 {
            let i = interior_angle(sides);
            let e = exterior_angle(sides);
            assert!((i + e - 180.0).abs() < 1e-3, "{sides}");
            assert!((e - 360.0 / sides as f32).abs() < 1e-6);
        }
    }

    #[test]
    fn grid_by_dimensions_octagon() {
        let targets = SectionTargets { polygon_sides: 8, grid_dimensions: 10, ..default() };
        let g = solve(BuildOrderRule::GridByDimensions, targets);
        assert_eq!(g.grid_dimensions, 10);
        assert!((g.inscribed_radius - 2250.0).abs() < EPS);
        assert!((g.interior_angle - 135.0).abs() < EPS);
        assert!((g.exterior_angle - 45.0).abs() < EPS);
        let side = 2.0 * 2250.0 * 67.5f32.to_radians().cos();
        assert!((g.side_length - side).abs() < EPS);
        assert_eq!(g.tiles_per_side, (side / 500.0).floor() as i32);
        assert!((g.apothem - 2250.0 * 67.5f32.to_radians().sin()).abs() < EPS);
    }

    #[test]
    fn polygon_by_dimensions_octagon() {
        let targets = SectionTargets { polygon_sides: 8, tiles_per_side: 5, ..default() };
        let g = solve(BuildOrderRule::PolygonByDimensions, targets);
        assert!((g.side_length - 2500.0).abs() < EPS);
        let expected = 1250.0 / 22.5f32.to_radians().sin();
        assert!((g.inscribed_radius - expected).abs() < EPS);
        assert_eq!(g.grid_dimensions, (2.0 * expected / 500.0).ceil() as i32);
    }

    #[test]
    fn grid_by_radius_keeps_at_least_two_tiles() {
        let targets = SectionTargets { radius: 100.0, ..default() };
        let g = solve(BuildOrderRule::GridByRadius, targets);
        assert_eq!(g.grid_dimensions, 2);
        assert!((g.inscribed_radius - 500.0).abs() < EPS);

        let targets = SectionTargets { radius: 4300.0, ..default() };
        let g = solve(BuildOrderRule::GridByRadius, targets);
        assert_eq!(g.grid_dimensions, 8);
    }

    #[test]
    fn sides_are_clamped() {
        let g = solve(BuildOrderRule::GridByDimensions, SectionTargets { polygon_sides: 1, ..default() });
        assert_eq!(g.sides, 3);
        let g = solve(BuildOrderRule::GridByDimensions, SectionTargets { polygon_sides: 500, ..default() });
        assert_eq!(g.sides, 120);
    }

    #[test]
    fn tiles_per_side_never_shrink_as_radius_grows() {
        let mut last = 0;
        let mut radius = 0.0;
        while radius < 20000.0 {
            let targets = SectionTargets { radius, polygon_sides: 7, ..default() };
            let g = solve(BuildOrderRule::PolygonByRadius, targets);
            assert!(g.tiles_per_side >= last, "radius {radius}");
            last = g.tiles_per_side;
            radius += 137.0;
        }
    }

    #[test]
    fn focus_defaults_to_zero() {
        let s = Section::default();
        let f = focus_groups(&s);
        assert_eq!(f.grid, (AssetKind::Meshes, 0));
        assert_eq!(f.polygon, (AssetKind::Meshes, 0));
    }

    #[test]
    fn empty_groups_abort_the_section() {
        let lib = AssetLibrary::new(&[], &[]);
        let s = section(BuildOrderRule::GridByDimensions, SectionTargets::default());
        assert!(matches!(solve_geometry(&s, &lib, 120, 100), Err(ArenaError::EmptyMeshGroups)));
    }

    #[test]
    fn validation_off_changes_nothing() {
        let targets = SectionTargets { polygon_sides: 3, grid_dimensions: 4, ..default() };
        let mut g = solve(BuildOrderRule::GridByDimensions, targets);
        let before = g;
        validate_geometry(GeometryValidation::Off, &mut g, 500.0, 500.0, 100);
        assert_eq!(g, before);
    }

    #[test]
    fn clamp_grows_grid_over_an_overflowing_ring() {
        let targets = SectionTargets { polygon_sides: 6, tiles_per_side: 6, ..default() };
        let mut g = solve(BuildOrderRule::PolygonByDimensions, targets);
        // shrink the grid by hand so the ring overflows
        g.grid_dimensions = 2;
        g.grid_extent = 1000.0;
        assert_eq!(check_fit(&g, 500.0), GeometryFit::Overflows);
        let fit = validate_geometry(GeometryValidation::Clamp, &mut g, 500.0, 500.0, 100);
        assert_eq!(fit, GeometryFit::Fits);
        assert_eq!(check_fit(&g, 500.0), GeometryFit::Fits);
    }

    #[test]
    fn clamp_closes_capped_sides() {
        let targets = SectionTargets { polygon_sides: 8, grid_dimensions: 10, ..default() };
        let groups = [mesh(500.0, 500.0, 50.0), mesh(500.0, 50.0, 500.0)];
        let lib = AssetLibrary::new(&groups, &[]);
        let s = section(BuildOrderRule::GridByDimensions, targets);
        let mut g = solve_geometry(&s, &lib, 120, 2).unwrap();
        assert_eq!(g.tiles_per_side, 2);
        assert_eq!(check_fit(&g, 500.0), GeometryFit::Gapped);

        let fit = validate_geometry(GeometryValidation::Clamp, &mut g, 500.0, 500.0, 2);
        assert_eq!(fit, GeometryFit::Fits);
        assert_eq!(g.tiles_per_side, 2);
        assert!((g.side_length - 1000.0).abs() < EPS);
        assert!((g.inscribed_radius - 500.0 / 22.5f32.to_radians().sin()).abs() < EPS);
        assert_eq!(g.grid_dimensions, (2.0 * g.inscribed_radius / 500.0).ceil() as i32);
        assert!((g.grid_extent - 500.0 * g.grid_dimensions as f32).abs() < EPS);
    }

    #[test]
    fn warn_reports_without_touching() {
        let targets = SectionTargets { polygon_sides: 8, grid_dimensions: 10, ..default() };
        let groups = [mesh(500.0, 500.0, 50.0), mesh(500.0, 50.0, 500.0)];
        let lib = AssetLibrary::new(&groups, &[]);
        let mut g = solve_geometry(&section(BuildOrderRule::GridByDimensions, targets), &lib, 120, 2).unwrap();
        let before = g;
        assert_eq!(validate_geometry(GeometryValidation::Warn, &mut g, 500.0, 500.0, 2), GeometryFit::Gapped);
        assert_eq!(g, before);
    }
}
