use thiserror::Error;

use super::model::AssetKind;

/// Everything that can go wrong while configuring or generating an arena.
/// None of these are fatal, the generator logs them and skips work.
#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("arena has no sections to build")]
    NoSections,

    #[error("arena has neither mesh groups nor actor groups")]
    NoAssetGroups,

    #[error("a build rule places meshes but no mesh groups are configured")]
    EmptyMeshGroups,

    #[error("a build rule spawns actors but no actor groups are configured")]
    EmptyActorGroups,

    #[error("{kind:?} group {id} is out of range ({count} groups)")]
    GroupOutOfRange { kind: AssetKind, id: i32, count: usize },

    #[error("member {index} of {kind:?} group {group} is out of range ({count} members)")]
    MemberOutOfRange { kind: AssetKind, group: i32, index: usize, count: usize },

    #[error("could not read arena config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("could not parse arena config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    #[error("could not write arena config: {0}")]
    ConfigWrite(#[from] ron::Error),
}
