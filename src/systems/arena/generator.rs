// arena generation pipeline
// threads one GenerationState through every section and build rule, in order

use std::collections::BTreeMap;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::assets::{AssetGroup, AssetLibrary};
use super::error::ArenaError;
use super::host::{ActorHandle, ArenaHost, ArenaRoot, BevyArenaHost, HostRegistry, InstanceHandle};
use super::layout::origin::{
    OriginQuery, anchor_shift, current_tiles_per_side, mesh_size_ratio, origin_offset,
    section_dimensions,
};
use super::layout::placement::{PlacementSink, RulePlacement, place_grid, place_polygon};
use super::layout::solver::{GeometryFit, PolygonGeometry, focus_groups, solve_geometry, validate_geometry};
use super::model::{ArenaTransform, AssetKind, BuildOrderRule, MeshGroup, Section, SectionBuildRule, SectionType};
use super::{ArenaConfig, ArenaSettings, BakeEvent, RegenerateEvent, WipeEvent};

/// Derived geometry of one built section, kept for gizmos and the inspector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionSummary {
    pub build_order_rule: BuildOrderRule,
    pub geometry: PolygonGeometry,
    pub anchor_shift: Vec3,
    pub fit: GeometryFit,
}

/// Mutable state of one generation pass. Wiped before every pass.
#[derive(Resource, Default, Debug, PartialEq)]
pub struct GenerationState {
    pub origin_offset: Vec3,
    pub previous_mesh_size: Vec3,
    pub previous_tiles_per_side: i32,
    pub previous_last_position: Vec3,
    pub current_build_order_rule: BuildOrderRule,
    // used mesh group id -> index into instance_handles_by_group
    pub reroute_by_group: BTreeMap<i32, usize>,
    pub instance_handles_by_group: Vec<Vec<InstanceHandle>>,
    pub spawned_actors: Vec<ActorHandle>,
    pub total_instance_count: usize,
    pub sections: Vec<SectionSummary>,
}

impl GenerationState {
    pub fn used_group_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.reroute_by_group.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.instance_handles_by_group.is_empty() && self.spawned_actors.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub sections_built: usize,
    pub sections_skipped: usize,
    pub placements: usize,
    pub skipped_placements: usize,
    pub actors_spawned: usize,
}

/// Top level configuration problems abort the whole pass.
pub fn check_config(config: &ArenaConfig) -> Result<(), ArenaError> {
    if config.sections.is_empty() {
        return Err(ArenaError::NoSections);
    }
    if config.mesh_groups.is_empty() && config.actor_groups.is_empty() {
        return Err(ArenaError::NoAssetGroups);
    }

    for rule in config.sections.iter().flat_map(|s| &s.build_rules) {
        match rule.asset_kind {
            AssetKind::Meshes if config.mesh_groups.is_empty() => return Err(ArenaError::EmptyMeshGroups),
            AssetKind::Actors if config.actor_groups.is_empty() => return Err(ArenaError::EmptyActorGroups),
            _ => {}
        }
    }
    Ok(())
}

pub fn generate_arena<H: ArenaHost + ?Sized>(
    config: &ArenaConfig,
    state: &mut GenerationState,
    host: &mut H,
) -> Result<GenerationReport, ArenaError> {
    // clear before build
    wipe_arena(state, host);

    if let Err(err) = check_config(config) {
        match err {
            ArenaError::NoSections => warn!("arena generation skipped: {err}"),
            _ => error!("arena generation aborted: {err}"),
        }
        return Err(err);
    }

    let settings = &config.settings;
    let assets = AssetLibrary::new(&config.mesh_groups, &config.actor_groups);
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut report = GenerationReport::default();

    for (index, section) in config.sections.iter().enumerate() {
        let Some(geometry) = prepare_section(index, section, &assets, settings, state) else {
            report.sections_skipped += 1;
            continue;
        };

        for rule in &section.build_rules {
            if let Err(err) = build_rule(rule, &geometry, settings, &assets, state, host, &mut rng, &mut report) {
                error!("section {index}: {err}, rule skipped");
            }
        }
        report.sections_built += 1;
    }

    info!(
        "arena built: {} sections ({} skipped), {} instances, {} actors, {} placements skipped",
        report.sections_built,
        report.sections_skipped,
        state.total_instance_count,
        report.actors_spawned,
        report.skipped_placements,
    );
    Ok(report)
}

fn prepare_section(
    index: usize,
    section: &Section,
    assets: &AssetLibrary,
    settings: &ArenaSettings,
    state: &mut GenerationState,
) -> Option<PolygonGeometry> {
    let mut geometry = match solve_geometry(section, assets, settings.max_sides, settings.max_tiles_per_side_row) {
        Ok(geometry) => geometry,
        Err(err) => {
            error!("section {index}: {err}, parameter calculation aborted");
            return None;
        }
    };

    // solver succeeded, so both focus lookups resolve
    let focus = focus_groups(section);
    let grid_tile = assets.dimensions(focus.grid.0, focus.grid.1).map(|d| d.x).unwrap_or(0.0);
    let poly_tile = assets.dimensions(focus.polygon.0, focus.polygon.1).map(|d| d.x).unwrap_or(0.0);
    let fit = validate_geometry(
        settings.geometry_validation,
        &mut geometry,
        grid_tile,
        poly_tile,
        settings.max_tiles_per_side_row,
    );

    debug!("section {index}: {geometry:?}");
    state.current_build_order_rule = section.build_order_rule;
    state.sections.push(SectionSummary {
        build_order_rule: section.build_order_rule,
        geometry,
        anchor_shift: anchor_shift(settings.placement_anchor, geometry.grid_extent),
        fit,
    });
    Some(geometry)
}

#[allow(clippy::too_many_arguments)]
fn build_rule<H: ArenaHost + ?Sized>(
    rule: &SectionBuildRule,
    geometry: &PolygonGeometry,
    settings: &ArenaSettings,
    assets: &AssetLibrary,
    state: &mut GenerationState,
    host: &mut H,
    rng: &mut StdRng,
    report: &mut GenerationReport,
) -> Result<(), ArenaError> {
    let (group_id, group) = assets.resolve(rule.asset_kind, rule.group_id)?;
    let asset = group.placement();
    let size = asset.dimensions;
    let previous_x = state.previous_mesh_size.x;

    let tiles_per_side = current_tiles_per_side(geometry, size.x, previous_x, settings.max_tiles_per_side_row);
    let query = OriginQuery {
        anchor: settings.placement_anchor,
        section_type: rule.section_type,
        build_order_rule: state.current_build_order_rule,
        mesh_dimensions: asset.dimensions,
        mesh_scale: asset.scale,
        tiles_per_side,
        previous_z: state.origin_offset.z,
    };
    state.origin_offset = origin_offset(&query, geometry);

    let target = match group {
        AssetGroup::Meshes(mesh_group) => SinkTarget::Instances(ensure_containers(state, host, group_id, mesh_group)),
        AssetGroup::Actors(actor_group) => SinkTarget::Actors {
            class: actor_group.spawnable_classes.first().cloned(),
            dimensions: actor_group.dimensions,
        },
    };

    let placement = RulePlacement {
        rule,
        geometry,
        asset: &asset,
        origin_offset: state.origin_offset,
        tiles_per_side,
        mesh_scalar: mesh_size_ratio(size.x, previous_x),
        dimensions: section_dimensions(geometry, size.x, previous_x),
    };

    let mut sink = HostSink {
        host,
        target,
        kind: rule.asset_kind,
        group_id,
        instances: 0,
        skipped: 0,
        actors: Vec::new(),
    };
    let outcome = match rule.section_type {
        SectionType::Polygon => place_polygon(&placement, rng, &mut sink),
        SectionType::HorizontalGrid => place_grid(&placement, rng, &mut sink),
    };

    report.placements += outcome.emitted;
    report.skipped_placements += sink.skipped;
    report.actors_spawned += sink.actors.len();
    state.total_instance_count += sink.instances;
    state.spawned_actors.extend(sink.actors);

    state.previous_tiles_per_side = match rule.section_type {
        SectionType::Polygon => tiles_per_side,
        SectionType::HorizontalGrid => placement.dimensions,
    };
    state.previous_last_position = outcome.last_position;
    if rule.updates_origin_height {
        state.origin_offset.z += size.z * rule.repeats() as f32 * rule.height_offset_increment;
    }
    state.previous_mesh_size = size;
    Ok(())
}

// one container per member, created the first time a group is used in this pass
fn ensure_containers<H: ArenaHost + ?Sized>(
    state: &mut GenerationState,
    host: &mut H,
    group_id: i32,
    group: &MeshGroup,
) -> Vec<InstanceHandle> {
    if let Some(&reroute) = state.reroute_by_group.get(&group_id) {
        return state.instance_handles_by_group.get(reroute).cloned().unwrap_or_default();
    }

    let handles: Vec<InstanceHandle> = group
        .members
        .iter()
        .map(|member| host.create_instance_container(member, group.dimensions))
        .collect();
    state.instance_handles_by_group.push(handles.clone());
    state.reroute_by_group.insert(group_id, state.instance_handles_by_group.len() - 1);
    handles
}

enum SinkTarget {
    Instances(Vec<InstanceHandle>),
    Actors { class: Option<String>, dimensions: Vec3 },
}

// forwards placements to the host, a failed lookup skips just that placement
struct HostSink<'h, H: ArenaHost + ?Sized> {
    host: &'h mut H,
    target: SinkTarget,
    kind: AssetKind,
    group_id: i32,
    instances: usize,
    skipped: usize,
    actors: Vec<ActorHandle>,
}

impl<H: ArenaHost + ?Sized> PlacementSink for HostSink<'_, H> {
    fn emit(&mut self, member: usize, transform: ArenaTransform) {
        match &self.target {
            SinkTarget::Instances(handles) => match handles.get(member) {
                Some(&container) => {
                    self.host.add_instance(container, &transform);
                    self.instances += 1;
                }
                None => {
                    let err = ArenaError::MemberOutOfRange {
                        kind: self.kind,
                        group: self.group_id,
                        index: member,
                        count: handles.len(),
                    };
                    error!("{err}, placement skipped");
                    self.skipped += 1;
                }
            },
            SinkTarget::Actors { class: Some(class), dimensions } => {
                let actor = self.host.spawn_actor(class, *dimensions, &transform);
                self.actors.push(actor);
            }
            SinkTarget::Actors { class: None, .. } => {
                let err = ArenaError::MemberOutOfRange {
                    kind: self.kind,
                    group: self.group_id,
                    index: member,
                    count: 0,
                };
                error!("{err}, placement skipped");
                self.skipped += 1;
            }
        }
    }
}

/// Destroys everything the state tracks and resets it. Safe on an empty state.
pub fn wipe_arena<H: ArenaHost + ?Sized>(state: &mut GenerationState, host: &mut H) {
    for container in state.instance_handles_by_group.drain(..).flatten() {
        host.destroy_container(container);
    }
    for actor in state.spawned_actors.drain(..) {
        host.destroy_actor(actor);
    }
    *state = GenerationState::default();
}

/// Turns every tracked instance into a standalone actor and drops the containers.
pub fn bake_instances<H: ArenaHost + ?Sized>(state: &mut GenerationState, host: &mut H) -> usize {
    let containers: Vec<InstanceHandle> = state.instance_handles_by_group.drain(..).flatten().collect();
    let mut baked = 0;

    for container in containers {
        for index in 0..host.instance_count(container) {
            let Some(transform) = host.instance_transform(container, index) else {
                continue;
            };
            if let Some(actor) = host.spawn_mesh_actor(container, &transform) {
                state.spawned_actors.push(actor);
                baked += 1;
            }
        }
        host.destroy_container(container);
    }

    state.reroute_by_group.clear();
    state.total_instance_count = 0;
    info!("baked {baked} instances into static actors");
    baked
}

// bevy side

#[derive(SystemParam)]
pub struct HostParams<'w, 's> {
    commands: Commands<'w, 's>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    asset_server: Res<'w, AssetServer>,
    registry: ResMut<'w, HostRegistry>,
    root: Query<'w, 's, Entity, With<ArenaRoot>>,
}

impl<'w, 's> HostParams<'w, 's> {
    pub fn host(&mut self) -> Option<BevyArenaHost<'_, 'w, 's>> {
        let root = self.root.single().ok()?;
        Some(BevyArenaHost::new(
            &mut self.commands,
            &mut self.meshes,
            &mut self.materials,
            &self.asset_server,
            &mut self.registry,
            root,
        ))
    }
}

pub fn handle_regeneration(
    mut events: EventReader<RegenerateEvent>,
    mut config: ResMut<ArenaConfig>,
    mut state: ResMut<GenerationState>,
    mut params: HostParams,
) {
    for event in events.read() {
        if let Some(seed) = event.seed {
            config.settings.seed = seed;
        }
        let Some(mut host) = params.host() else {
            warn!("no arena root to build under");
            return;
        };
        if let Ok(report) = generate_arena(&config, &mut state, &mut host) {
            debug!("regenerated with seed {}: {report:?}", config.settings.seed);
        }
    }
}

pub fn handle_wipe(
    mut events: EventReader<WipeEvent>,
    mut state: ResMut<GenerationState>,
    mut params: HostParams,
) {
    for _event in events.read() {
        if let Some(mut host) = params.host() {
            wipe_arena(&mut state, &mut host);
            info!("arena wiped");
        }
    }
}

pub fn handle_bake(
    mut events: EventReader<BakeEvent>,
    mut state: ResMut<GenerationState>,
    mut params: HostParams,
) {
    for _event in events.read() {
        if let Some(mut host) = params.host() {
            bake_instances(&mut state, &mut host);
        }
    }
}

// teardown of the owning app
pub fn wipe_on_exit(
    mut exits: EventReader<AppExit>,
    mut state: ResMut<GenerationState>,
    mut params: HostParams,
) {
    if exits.read().next().is_none() {
        return;
    }
    if let Some(mut host) = params.host() {
        wipe_arena(&mut state, &mut host);
    }
}
