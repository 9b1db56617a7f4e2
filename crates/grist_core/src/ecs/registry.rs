// registry.rs - The owning entity registry of a world
//
// The registry is the one set that owns entity objects and is authoritative
// for liveness. It composes a plain membership set with a parallel block of
// entity objects per storage block; everything else in the world holds
// non-owning handles.

use crate::ecs::{Block, ClassId, EcsError, Entity, EntitySet, WorldId};

/// The entity object owned by the registry: the handle plus its class.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub entity: Entity,
    pub class: ClassId,
}

/// Owning registry of all entities in a world.
///
/// Insertion and removal go through [`World`](crate::ecs::World), which
/// drives the cascade into components and extents; the registry itself only
/// answers liveness and resolves handles back to their entity objects.
#[derive(Debug)]
pub struct WorldRegistry {
    members: EntitySet,
    objects: Vec<Block<Option<EntityRef>>>,
}

impl WorldRegistry {
    pub(crate) fn new(world: WorldId) -> Self {
        Self {
            members: EntitySet::new(world),
            objects: Vec::new(),
        }
    }

    #[inline]
    pub fn world(&self) -> WorldId {
        self.members.world()
    }

    /// The registry's membership as a plain set, usable in set algebra.
    #[inline]
    pub fn members(&self) -> &EntitySet {
        &self.members
    }

    /// True iff the handle's generation is the one currently recorded at
    /// its slot. Stale handles over reused slots answer false.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.members.contains(entity)
    }

    /// Resolve a live handle back to its owning entity object.
    pub fn resolve(&self, entity: Entity) -> Option<EntityRef> {
        if !self.members.contains(entity) {
            return None;
        }
        self.objects
            .get(entity.block() as usize)
            .and_then(|blk| blk.get(entity.index() as usize))
            .copied()
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate all live entity objects.
    pub fn iter(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.members.iter().filter_map(|entity| self.resolve(entity))
    }

    /// Iterate the handles of `set` that are still alive here, skipping
    /// entries left behind by deletions.
    pub fn iter_intersection<'a>(
        &'a self,
        set: &'a EntitySet,
    ) -> impl Iterator<Item = Entity> + 'a {
        set.iter().filter(|&entity| self.members.contains(entity))
    }

    pub(crate) fn insert(&mut self, entity: Entity, class: ClassId) {
        self.members.insert_unchecked(entity);
        let block = entity.block() as usize;
        if self.objects.len() <= block {
            self.objects.resize_with(block + 1, Block::new);
        }
        let blk = &mut self.objects[block];
        blk.grow(entity.index() as usize + 1, None);
        blk[entity.index() as usize] = Some(EntityRef { entity, class });
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> Result<EntityRef, EcsError> {
        let object = self
            .resolve(entity)
            .ok_or(EcsError::NotFound { entity })?;
        self.members.remove(entity)?;
        self.objects[entity.block() as usize][entity.index() as usize] = None;
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{ClassRegistry, World};

    #[test]
    fn resolve_returns_the_owning_object() {
        let mut classes = ClassRegistry::new();
        let ship = classes.register("ship");
        let mut world = World::new(classes);

        let e = world.create(ship);
        let object = world.registry().resolve(e).unwrap();
        assert_eq!(object.entity, e);
        assert_eq!(object.class, ship);

        world.destroy(e).unwrap();
        assert!(world.registry().resolve(e).is_none());
    }

    #[test]
    fn iter_intersection_skips_dead_entries() {
        let mut classes = ClassRegistry::new();
        let ship = classes.register("ship");
        let mut world = World::new(classes);

        let e1 = world.create(ship);
        let e2 = world.create(ship);
        let mut set = crate::ecs::EntitySet::new(world.id());
        set.add(world.registry(), e1).unwrap();
        set.add(world.registry(), e2).unwrap();

        world.destroy(e1).unwrap();
        // The ad-hoc set still records e1; the registry filters it out.
        assert!(set.contains(e1));
        let live: Vec<_> = world.registry().iter_intersection(&set).collect();
        assert_eq!(live, vec![e2]);
    }
}
