//! Scene graph
//!
//! Entities form a forest of N-ary trees. Each entity carries a local SQT
//! transform and derives its global transform and global bounding box from
//! its ancestors. A [`Scene`] owns every entity in an arena keyed by
//! [`EntityId`], keeps the spatial index in sync with the global bounding
//! boxes, and is the only way to mutate a transform, so propagation can
//! never be skipped.

mod entity;
mod graph;
mod import;
mod propagation;

pub use entity::{Entity, EntityDesc, EntityId};
pub use graph::Scene;
pub use import::{ImportedEntity, ImportedHandles, ImportedScene};

/// Scene graph errors
///
/// These all signal misuse of the API rather than runtime conditions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The handle does not refer to a live entity
    #[error("entity {0:?} does not exist")]
    EntityNotFound(EntityId),

    /// `remove_child` was called with an entity that is not a child
    #[error("Entity was not a child: {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Claimed parent
        parent: EntityId,
        /// Claimed child
        child: EntityId,
    },

    /// The entity is already in the spatial index
    #[error("entity {0:?} is already indexed")]
    AlreadyIndexed(EntityId),

    /// The entity is not in the spatial index
    #[error("entity {0:?} is not indexed")]
    NotIndexed(EntityId),

    /// Parenting would make an entity its own ancestor
    #[error("making {parent:?} the parent of {child:?} would create a cycle")]
    WouldCreateCycle {
        /// Requested parent
        parent: EntityId,
        /// Requested child
        child: EntityId,
    },

    /// Importer output references something that does not exist
    #[error("invalid import: {0}")]
    InvalidImport(String),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
