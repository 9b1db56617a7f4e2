use crate::ecs::{Entity, FieldKind, WorldId};
use thiserror::Error;

/// Errors surfaced by the storage core.
///
/// `CrossWorld` and `InvalidWorld` mean the caller mixed handles or sets
/// from different worlds; treat them as fatal to the caller. `DeletedEntity`
/// and `NotFound` are expected when queries interleave with deletions within
/// a tick; callers typically skip the offending entity and continue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EcsError {
    #[error("cannot combine sets from worlds {left} and {right}")]
    CrossWorld { left: WorldId, right: WorldId },

    #[error("expected an entity of world {expected}, but its registry is world {found}")]
    InvalidWorld { expected: WorldId, found: WorldId },

    #[error("{entity} is not alive in its world")]
    DeletedEntity { entity: Entity },

    #[error("{entity} is not a member")]
    NotFound { entity: Entity },

    #[error("field '{field}' holds {expected} values but was given a {found} value")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },

    #[error("no field named '{field}' in this component")]
    UnknownField { field: String },

    #[error("world has no component named '{name}'")]
    UnknownComponent { name: String },

    #[error("a component named '{name}' already exists in this world")]
    DuplicateComponent { name: String },
}
