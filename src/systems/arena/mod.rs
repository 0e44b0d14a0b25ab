use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::*;

pub mod assets;
pub mod error;
pub mod generator;
pub mod host;
pub mod layout;
pub mod model;

use error::ArenaError;
use generator::{GenerationState, handle_bake, handle_regeneration, handle_wipe, wipe_on_exit};
use host::{ArenaRoot, HostRegistry};
use model::*;

pub struct ArenaPlugin;

impl Plugin for ArenaPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<ArenaConfig>()
            .init_resource::<GenerationState>()
            .init_resource::<HostRegistry>()
            .add_event::<RegenerateEvent>()
            .add_event::<WipeEvent>()
            .add_event::<BakeEvent>()
            .add_event::<crate::systems::export::ExportEvent>()
            .add_systems(Startup, spawn_arena_root)
            .add_systems(Update, (
                key_input,
                handle_regeneration,
                handle_wipe,
                handle_bake,
                crate::systems::export::handle_export,
            ).chain())
            .add_systems(Last, wipe_on_exit);
    }
}

// events
#[derive(Event, Clone, Copy, Debug, Default)]
pub struct RegenerateEvent {
    // None rebuilds with the current seed
    pub seed: Option<u64>,
}

#[derive(Event, Clone, Copy, Debug, Default)]
pub struct WipeEvent;

#[derive(Event, Clone, Copy, Debug, Default)]
pub struct BakeEvent;

/// Generator-wide limits and switches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    pub max_sides: i32,
    pub max_tiles_per_side_row: i32,
    pub placement_anchor: MeshOrigin,
    pub seed: u64,
    pub geometry_validation: GeometryValidation,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            max_sides: MAX_SIDES,
            max_tiles_per_side_row: MAX_TILES_PER_SIDE_ROW,
            placement_anchor: MeshOrigin::Center,
            seed: INITIAL_SEED,
            geometry_validation: GeometryValidation::Off,
        }
    }
}

/// Whole arena description, loaded from `arena.ron` or built in.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub settings: ArenaSettings,
    pub sections: Vec<Section>,
    pub mesh_groups: Vec<MeshGroup>,
    pub actor_groups: Vec<ActorGroup>,
}

// floor grid, stacked wall ring and a roof ring on top, all placeholder boxes
impl Default for ArenaConfig {
    fn default() -> Self {
        let kit = |size: [f32; 3]| MeshGroup {
            dimensions: Vec3::from_array(size),
            scale: Vec3::ONE,
            members: vec![MeshMember { origin: MeshOrigin::XYPositive, mesh: None }],
        };

        let floor = SectionBuildRule {
            section_type: SectionType::HorizontalGrid,
            group_id: 0,
            updates_origin_height: true,
            ..default()
        };
        let walls = SectionBuildRule {
            section_type: SectionType::Polygon,
            group_id: 1,
            repeat_count: SIDE_TILE_HEIGHT as i32,
            updates_origin_height: true,
            ..default()
        };
        let roof = SectionBuildRule {
            section_type: SectionType::Polygon,
            group_id: 2,
            repeat_count: ROOF_TILE_HEIGHT as i32,
            ..default()
        };

        Self {
            settings: ArenaSettings::default(),
            sections: vec![Section {
                build_order_rule: BuildOrderRule::GridByDimensions,
                targets: SectionTargets::default(),
                build_rules: vec![floor, walls, roof],
            }],
            mesh_groups: vec![kit(FLOOR_MESH_SIZE), kit(WALL_MESH_SIZE), kit(ROOF_MESH_SIZE)],
            actor_groups: Vec::new(),
        }
    }
}

impl ArenaConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArenaError> {
        let text = fs::read_to_string(path)?;
        Ok(ron::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArenaError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Falls back to the built-in arena when the file is missing or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!("loaded arena config from {}", path.display());
                config
            }
            Err(err) => {
                warn!("{err} ({}), using the built-in arena", path.display());
                Self::default()
            }
        }
    }
}

// arena space is in engine units, scale it down for the viewer
fn spawn_arena_root(mut commands: Commands, mut regen_events: EventWriter<RegenerateEvent>) {
    commands.spawn((
        ArenaRoot,
        Name::new("Arena"),
        Transform::from_scale(Vec3::splat(VIEW_SCALE)),
        Visibility::Visible,
    ));
    regen_events.write(RegenerateEvent { seed: None });
}

fn key_input(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut regen_events: EventWriter<RegenerateEvent>,
    mut wipe_events: EventWriter<WipeEvent>,
) {
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        regen_events.write(RegenerateEvent { seed: Some(rand::random()) });
    }
    if keyboard_input.just_pressed(KeyCode::KeyC) {
        wipe_events.write(WipeEvent);
    }
}
