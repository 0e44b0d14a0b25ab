// host services the generator talks to
// instancing sink + actor spawn service, implemented on top of bevy entities

use bevy::prelude::*;

use super::layout::utils::origin_offset_scalar;
use super::model::{ArenaTransform, MeshMember};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActorHandle(pub usize);

/// What the generator needs from the engine hosting it.
pub trait ArenaHost {
    fn create_instance_container(&mut self, member: &MeshMember, dimensions: Vec3) -> InstanceHandle;
    fn add_instance(&mut self, container: InstanceHandle, transform: &ArenaTransform);
    fn destroy_container(&mut self, container: InstanceHandle);
    fn instance_count(&self, container: InstanceHandle) -> usize;
    fn instance_transform(&self, container: InstanceHandle, index: usize) -> Option<ArenaTransform>;

    fn spawn_actor(&mut self, class: &str, dimensions: Vec3, transform: &ArenaTransform) -> ActorHandle;
    /// Standalone actor showing a container's mesh, used when baking instances.
    fn spawn_mesh_actor(&mut self, container: InstanceHandle, transform: &ArenaTransform) -> Option<ActorHandle>;
    fn destroy_actor(&mut self, actor: ActorHandle);
}

// components
#[derive(Component)]
pub struct ArenaRoot;

#[derive(Component)]
pub struct InstanceContainer {
    pub label: String,
}

#[derive(Component)]
pub struct ArenaActor {
    pub class: String,
}

pub struct ContainerRecord {
    pub entity: Entity,
    pub label: String,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub transforms: Vec<ArenaTransform>,
}

pub struct ActorRecord {
    pub entity: Entity,
    pub class: String,
    pub transform: ArenaTransform,
}

/// Book-keeping of everything the bevy host created, handles index into it.
#[derive(Resource, Default)]
pub struct HostRegistry {
    pub containers: Vec<Option<ContainerRecord>>,
    pub actors: Vec<Option<ActorRecord>>,
}

impl HostRegistry {
    pub fn live_containers(&self) -> impl Iterator<Item = &ContainerRecord> {
        self.containers.iter().flatten()
    }

    pub fn live_actors(&self) -> impl Iterator<Item = &ActorRecord> {
        self.actors.iter().flatten()
    }

    pub fn instance_total(&self) -> usize {
        self.live_containers().map(|c| c.transforms.len()).sum()
    }
}

// muted palette, one color per container
const PALETTE: [(f32, f32, f32); 6] = [
    (0.72, 0.70, 0.66),
    (0.55, 0.60, 0.68),
    (0.66, 0.52, 0.45),
    (0.48, 0.58, 0.47),
    (0.62, 0.62, 0.74),
    (0.75, 0.66, 0.52),
];

/// Bevy implementation, everything is parented under the arena root entity.
pub struct BevyArenaHost<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    meshes: &'a mut Assets<Mesh>,
    materials: &'a mut Assets<StandardMaterial>,
    asset_server: &'a AssetServer,
    registry: &'a mut HostRegistry,
    root: Entity,
}

impl<'a, 'w, 's> BevyArenaHost<'a, 'w, 's> {
    pub fn new(
        commands: &'a mut Commands<'w, 's>,
        meshes: &'a mut Assets<Mesh>,
        materials: &'a mut Assets<StandardMaterial>,
        asset_server: &'a AssetServer,
        registry: &'a mut HostRegistry,
        root: Entity,
    ) -> Self {
        Self { commands, meshes, materials, asset_server, registry, root }
    }

    // box of the tile's size, shifted so the pivot sits where the origin convention says
    fn placeholder_mesh(&mut self, member: &MeshMember, dimensions: Vec3) -> Handle<Mesh> {
        let scalar = origin_offset_scalar(member.origin);
        let center = Vec3::new(
            -scalar.x * dimensions.x,
            dimensions.z * 0.5,
            -scalar.y * dimensions.y,
        );
        let mesh = Cuboid::new(dimensions.x, dimensions.z, dimensions.y)
            .mesh()
            .build()
            .translated_by(center);
        self.meshes.add(mesh)
    }

    fn material(&mut self, index: usize) -> Handle<StandardMaterial> {
        let (r, g, b) = PALETTE[index % PALETTE.len()];
        self.materials.add(StandardMaterial {
            base_color: Color::srgb(r, g, b),
            perceptual_roughness: 0.9,
            ..default()
        })
    }

    fn record_actor(&mut self, entity: Entity, class: &str, transform: &ArenaTransform) -> ActorHandle {
        self.registry.actors.push(Some(ActorRecord {
            entity,
            class: class.to_string(),
            transform: *transform,
        }));
        ActorHandle(self.registry.actors.len() - 1)
    }
}

impl ArenaHost for BevyArenaHost<'_, '_, '_> {
    fn create_instance_container(&mut self, member: &MeshMember, dimensions: Vec3) -> InstanceHandle {
        let (mesh, label) = match &member.mesh {
            Some(path) => (
                self.asset_server
                    .load(GltfAssetLabel::Primitive { mesh: 0, primitive: 0 }.from_asset(path.clone())),
                path.clone(),
            ),
            None => (self.placeholder_mesh(member, dimensions), format!("box {:?}", member.origin)),
        };
        let material = self.material(self.registry.containers.len());

        let entity = self.commands.spawn((
            InstanceContainer { label: label.clone() },
            Name::new(format!("Instances {label}")),
            Transform::default(),
            Visibility::Visible,
            ChildOf(self.root),
        )).id();

        self.registry.containers.push(Some(ContainerRecord {
            entity,
            label,
            mesh,
            material,
            transforms: Vec::new(),
        }));
        InstanceHandle(self.registry.containers.len() - 1)
    }

    fn add_instance(&mut self, container: InstanceHandle, transform: &ArenaTransform) {
        let Some(Some(record)) = self.registry.containers.get_mut(container.0) else {
            error!("instance added to unknown container {}", container.0);
            return;
        };
        self.commands.spawn((
            Mesh3d(record.mesh.clone()),
            MeshMaterial3d(record.material.clone()),
            transform.to_bevy(),
            ChildOf(record.entity),
        ));
        record.transforms.push(*transform);
    }

    fn destroy_container(&mut self, container: InstanceHandle) {
        if let Some(slot) = self.registry.containers.get_mut(container.0) {
            if let Some(record) = slot.take() {
                // children go with it
                self.commands.entity(record.entity).try_despawn();
            }
        }
    }

    fn instance_count(&self, container: InstanceHandle) -> usize {
        match self.registry.containers.get(container.0) {
            Some(Some(record)) => record.transforms.len(),
            _ => 0,
        }
    }

    fn instance_transform(&self, container: InstanceHandle, index: usize) -> Option<ArenaTransform> {
        match self.registry.containers.get(container.0) {
            Some(Some(record)) => record.transforms.get(index).copied(),
            _ => None,
        }
    }

    fn spawn_actor(&mut self, class: &str, dimensions: Vec3, transform: &ArenaTransform) -> ActorHandle {
        let member = MeshMember::default();
        let mesh = self.placeholder_mesh(&member, dimensions);
        let material = self.material(self.registry.actors.len() + 3);
        let entity = self.commands.spawn((
            ArenaActor { class: class.to_string() },
            Name::new(class.to_string()),
            Mesh3d(mesh),
            MeshMaterial3d(material),
            transform.to_bevy(),
            ChildOf(self.root),
        )).id();
        self.record_actor(entity, class, transform)
    }

    fn spawn_mesh_actor(&mut self, container: InstanceHandle, transform: &ArenaTransform) -> Option<ActorHandle> {
        let Some(Some(record)) = self.registry.containers.get(container.0) else {
            return None;
        };
        let class = record.label.clone();
        let entity = self.commands.spawn((
            ArenaActor { class: class.clone() },
            Name::new(format!("Static {class}")),
            Mesh3d(record.mesh.clone()),
            MeshMaterial3d(record.material.clone()),
            transform.to_bevy(),
            ChildOf(self.root),
        )).id();
        Some(self.record_actor(entity, &class, transform))
    }

    fn destroy_actor(&mut self, actor: ActorHandle) {
        if let Some(slot) = self.registry.actors.get_mut(actor.0) {
            if let Some(record) = slot.take() {
                self.commands.entity(record.entity).try_despawn();
            }
        }
    }
}
