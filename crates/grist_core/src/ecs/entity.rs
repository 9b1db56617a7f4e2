//! Entity handles and entity classes
//!
//! Entities are lightweight value handles (12 bytes) that reference storage
//! slots in a world. The generation counter prevents a stale handle from
//! resolving to a later occupant of a reused slot.

use std::fmt;

/// Per-slot version counter. Zero always means "no entity here".
pub type Generation = u32;

/// Entity handle (generation-indexed for safety)
///
/// Format: `(generation, block, index)`
/// - Generation: incremented each time the slot is recycled
/// - Block: storage block shared by all entities of one class
/// - Index: slot within the block
///
/// Handles are plain values with value equality and carry no ownership.
/// Equal-looking handles from different worlds are only distinguished by
/// the world they are used against; pass the world explicitly wherever
/// that matters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    generation: Generation,
    block: u32,
    index: u32,
}

impl Entity {
    pub(crate) const fn new(generation: Generation, block: u32, index: u32) -> Self {
        Self {
            generation,
            block,
            index,
        }
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[inline]
    pub fn block(&self) -> u32 {
        self.block
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entity({}:{} gen {})",
            self.block, self.index, self.generation
        )
    }
}

/// Identifier for an entity class registered with a [`ClassRegistry`].
///
/// Every class owns one storage block, so unrelated classes' slot numbering
/// never collides and per-class extents can reuse the block-sharded set
/// representation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    #[inline]
    pub fn block(&self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.0)
    }
}

/// Explicit table of entity classes, built at startup and handed to
/// [`World::new`](crate::ecs::World::new).
///
/// Registration assigns block ids sequentially. There is deliberately no
/// process-wide table; two worlds share classes only by sharing a registry
/// value.
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    names: Vec<String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Register a class by name, returning its id. Registering the same
    /// name again returns the existing id.
    pub fn register(&mut self, name: &str) -> ClassId {
        if let Some(pos) = self.names.iter().position(|n| n == name) {
            return ClassId(pos as u32);
        }
        let id = ClassId(self.names.len() as u32);
        self.names.push(name.to_string());
        tracing::debug!(class = name, id = id.0, "registered entity class");
        id
    }

    pub fn id_of(&self, name: &str) -> Option<ClassId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|pos| ClassId(pos as u32))
    }

    pub fn name_of(&self, class: ClassId) -> Option<&str> {
        self.names.get(class.as_usize()).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(pos, name)| (ClassId(pos as u32), name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_value_equality() {
        let e1 = Entity::new(1, 0, 4);
        let e2 = Entity::new(1, 0, 4);
        let e3 = Entity::new(2, 0, 4);
        assert_eq!(e1, e2);
        assert_ne!(e1, e3);
    }

    #[test]
    fn class_registration_is_sequential_and_idempotent() {
        let mut classes = ClassRegistry::new();
        let ship = classes.register("ship");
        let rock = classes.register("rock");
        assert_eq!(ship.block(), 0);
        assert_eq!(rock.block(), 1);
        assert_eq!(classes.register("ship"), ship);
        assert_eq!(classes.id_of("rock"), Some(rock));
        assert_eq!(classes.name_of(ship), Some("ship"));
        assert_eq!(classes.len(), 2);
    }
}
