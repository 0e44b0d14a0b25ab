// lookup of the mesh/actor groups a build rule points at
// meshes and actors share one placement capability, see `PlacementAsset`

use bevy::prelude::*;

use super::error::ArenaError;
use super::model::{ActorGroup, AssetKind, MeshGroup, MeshOrigin};

/// Borrowed view over the configured groups.
#[derive(Clone, Copy)]
pub struct AssetLibrary<'a> {
    pub mesh_groups: &'a [MeshGroup],
    pub actor_groups: &'a [ActorGroup],
}

/// The group a rule resolved to.
#[derive(Clone, Copy, Debug)]
pub enum AssetGroup<'a> {
    Meshes(&'a MeshGroup),
    Actors(&'a ActorGroup),
}

/// What the placement math needs to know about a group.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementAsset {
    pub dimensions: Vec3,
    pub scale: Vec3,
    // one pivot convention per member, placement picks one of them
    pub origins: Vec<MeshOrigin>,
}

impl PlacementAsset {
    pub fn member_count(&self) -> usize {
        self.origins.len()
    }

    pub fn origin(&self, member: usize) -> MeshOrigin {
        self.origins.get(member).copied().unwrap_or_default()
    }
}

/// Group ids are clamped into `[0, count)` before lookup.
pub fn clamp_group_id(id: i32, count: usize) -> i32 {
    if count == 0 {
        return id.max(0);
    }
    id.clamp(0, count as i32 - 1)
}

impl<'a> AssetLibrary<'a> {
    pub fn new(mesh_groups: &'a [MeshGroup], actor_groups: &'a [ActorGroup]) -> Self {
        Self { mesh_groups, actor_groups }
    }

    pub fn group_count(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::Meshes => self.mesh_groups.len(),
            AssetKind::Actors => self.actor_groups.len(),
        }
    }

    pub fn resolve(&self, kind: AssetKind, id: i32) -> Result<(i32, AssetGroup<'a>), ArenaError> {
        let count = self.group_count(kind);
        let id = clamp_group_id(id, count);
        let group = match kind {
            AssetKind::Meshes => self.mesh_groups.get(id as usize).map(AssetGroup::Meshes),
            AssetKind::Actors => self.actor_groups.get(id as usize).map(AssetGroup::Actors),
        };
        group
            .map(|g| (id, g))
            .ok_or(ArenaError::GroupOutOfRange { kind, id, count })
    }

    /// Unscaled dimensions of a group, used by the solver's focus lookup.
    pub fn dimensions(&self, kind: AssetKind, id: i32) -> Result<Vec3, ArenaError> {
        if self.group_count(kind) == 0 {
            return Err(match kind {
                AssetKind::Meshes => ArenaError::EmptyMeshGroups,
                AssetKind::Actors => ArenaError::EmptyActorGroups,
            });
        }
        let (_, group) = self.resolve(kind, id)?;
        Ok(group.placement().dimensions)
    }
}

impl AssetGroup<'_> {
    pub fn placement(&self) -> PlacementAsset {
        match self {
            AssetGroup::Meshes(group) => PlacementAsset {
                dimensions: group.dimensions,
                scale: group.scale,
                origins: group.members.iter().map(|m| m.origin).collect(),
            },
            AssetGroup::Actors(group) => PlacementAsset {
                dimensions: group.dimensions,
                scale: group.scale,
                origins: vec![group.origin],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::arena::model::MeshMember;

    fn group(x: f32) -> MeshGroup {
        MeshGroup {
            dimensions: Vec3::new(x, x, 10.0),
            scale: Vec3::ONE,
            members: vec![MeshMember::default()],
        }
    }

    #[test]
    fn group_ids_are_clamped() {
        assert_eq!(clamp_group_id(-3, 4), 0);
        assert_eq!(clamp_group_id(9, 4), 3);
        assert_eq!(clamp_group_id(2, 4), 2);
    }

    #[test]
    fn resolve_clamps_then_looks_up() {
        let meshes = [group(100.0), group(200.0)];
        let lib = AssetLibrary::new(&meshes, &[]);
        let (id, g) = lib.resolve(AssetKind::Meshes, 7).unwrap();
        assert_eq!(id, 1);
        assert_eq!(g.placement().dimensions.x, 200.0);
    }

    #[test]
    fn empty_library_reports_which_side_is_missing() {
        let lib = AssetLibrary::new(&[], &[]);
        assert!(matches!(lib.dimensions(AssetKind::Meshes, 0), Err(ArenaError::EmptyMeshGroups)));
        assert!(matches!(lib.dimensions(AssetKind::Actors, 0), Err(ArenaError::EmptyActorGroups)));
        assert!(matches!(
            lib.resolve(AssetKind::Actors, 0),
            Err(ArenaError::GroupOutOfRange { count: 0, .. })
        ));
    }
}
