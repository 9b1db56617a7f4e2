// set.rs - Versioned entity membership sets
//
// A set stores one generation vector per storage block; a slot holds the
// generation of the member recorded there, or zero for "absent". Membership
// is a single compare, which is also what makes stale handles answer false
// for free: a reused slot carries a newer generation than the old handle.
//
// The algebra walks the generation vectors elementwise over whatever extent
// the operands share; missing or shorter blocks behave as all-zero.

use crate::ecs::{Block, EcsError, Entity, Generation, WorldId, WorldRegistry};

/// Sparse, versioned membership set over entity handles.
///
/// Used for component membership, per-class extents, and ad-hoc query
/// results. A set belongs to exactly one world; combining sets from
/// different worlds is an error, never silently tolerated.
#[derive(Debug, Clone)]
pub struct EntitySet {
    world: WorldId,
    blocks: Vec<Block<Generation>>,
}

impl EntitySet {
    /// Create an empty set belonging to `world`.
    pub fn new(world: WorldId) -> Self {
        Self {
            world,
            blocks: Vec::new(),
        }
    }

    #[inline]
    pub fn world(&self) -> WorldId {
        self.world
    }

    #[inline]
    fn stored(&self, block: u32, index: u32) -> Generation {
        self.blocks
            .get(block as usize)
            .and_then(|blk| blk.get(index as usize))
            .copied()
            .unwrap_or(0)
    }

    fn check_world(&self, other: &EntitySet) -> Result<(), EcsError> {
        if self.world != other.world {
            return Err(EcsError::CrossWorld {
                left: self.world,
                right: other.world,
            });
        }
        Ok(())
    }

    /// Add a live entity to the set.
    ///
    /// The registry is the liveness authority: passing a registry from a
    /// different world fails with `InvalidWorld`, and a handle that is not
    /// alive there fails with `DeletedEntity`.
    pub fn add(&mut self, registry: &WorldRegistry, entity: Entity) -> Result<(), EcsError> {
        if registry.world() != self.world {
            return Err(EcsError::InvalidWorld {
                expected: self.world,
                found: registry.world(),
            });
        }
        if !registry.contains(entity) {
            return Err(EcsError::DeletedEntity { entity });
        }
        self.insert_unchecked(entity);
        Ok(())
    }

    /// Record the handle's generation at its slot without liveness checks.
    /// Only the world internals may call this.
    pub(crate) fn insert_unchecked(&mut self, entity: Entity) {
        let block = entity.block() as usize;
        if self.blocks.len() <= block {
            self.blocks.resize_with(block + 1, Block::new);
        }
        let blk = &mut self.blocks[block];
        blk.grow(entity.index() as usize + 1, 0);
        blk[entity.index() as usize] = entity.generation();
    }

    /// Remove an entity, failing with `NotFound` if the stored generation
    /// at its slot does not match (already removed, or never added).
    pub fn remove(&mut self, entity: Entity) -> Result<(), EcsError> {
        if self.stored(entity.block(), entity.index()) != entity.generation() {
            return Err(EcsError::NotFound { entity });
        }
        self.blocks[entity.block() as usize][entity.index() as usize] = 0;
        Ok(())
    }

    /// Remove an entity if present; reports whether it was.
    pub fn discard(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_ok()
    }

    /// Membership test: true iff the stored generation equals the handle's.
    ///
    /// A stale handle whose slot was reused answers false here with no
    /// extra bookkeeping, because the slot now stores a newer generation.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        entity.generation() != 0 && self.stored(entity.block(), entity.index()) == entity.generation()
    }

    /// Number of members. O(extent), not O(members).
    pub fn len(&self) -> usize {
        self.blocks
            .iter()
            .map(|blk| blk.as_slice().iter().filter(|&&gen| gen != 0).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks
            .iter()
            .all(|blk| blk.as_slice().iter().all(|&gen| gen == 0))
    }

    /// Iterate the recorded handles in (block, index) order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.blocks.iter().enumerate().flat_map(|(block, blk)| {
            blk.as_slice()
                .iter()
                .enumerate()
                .filter_map(move |(index, &gen)| {
                    (gen != 0).then(|| Entity::new(gen, block as u32, index as u32))
                })
        })
    }

    /// Elementwise union, in place. Where both operands record different
    /// non-zero generations at one slot, the larger generation wins; this
    /// tie-break is documented, tested behavior and must not be changed to
    /// "first operand wins".
    pub fn union_with(&mut self, other: &EntitySet) -> Result<(), EcsError> {
        self.check_world(other)?;
        self.merge_unchecked(other);
        Ok(())
    }

    pub(crate) fn merge_unchecked(&mut self, other: &EntitySet) {
        if other.blocks.len() > self.blocks.len() {
            self.blocks.resize_with(other.blocks.len(), Block::new);
        }
        for (blk, other_blk) in self.blocks.iter_mut().zip(other.blocks.iter()) {
            blk.grow(other_blk.len(), 0);
            for (index, &gen) in other_blk.as_slice().iter().enumerate() {
                if gen > blk[index] {
                    blk[index] = gen;
                }
            }
        }
    }

    /// Elementwise intersection, in place: a slot survives iff both sides
    /// store the same non-zero generation.
    pub fn intersect_with(&mut self, other: &EntitySet) -> Result<(), EcsError> {
        self.check_world(other)?;
        for (block, blk) in self.blocks.iter_mut().enumerate() {
            let other_blk = other.blocks.get(block);
            for index in 0..blk.len() {
                let gen = blk[index];
                if gen == 0 {
                    continue;
                }
                let other_gen = other_blk
                    .and_then(|b| b.get(index))
                    .copied()
                    .unwrap_or(0);
                if other_gen != gen {
                    blk[index] = 0;
                }
            }
        }
        Ok(())
    }

    /// Elementwise difference, in place: a slot survives unless the other
    /// set records the same non-zero generation there. A different stored
    /// generation names a different occupant of the slot and leaves this
    /// set's entry alone.
    pub fn difference_with(&mut self, other: &EntitySet) -> Result<(), EcsError> {
        self.check_world(other)?;
        for (block, blk) in self.blocks.iter_mut().enumerate() {
            if let Some(other_blk) = other.blocks.get(block) {
                let overlap = blk.len().min(other_blk.len());
                for index in 0..overlap {
                    if blk[index] != 0 && other_blk[index] == blk[index] {
                        blk[index] = 0;
                    }
                }
            }
        }
        Ok(())
    }

    /// Union into a new set.
    pub fn union(&self, other: &EntitySet) -> Result<EntitySet, EcsError> {
        self.check_world(other)?;
        let mut result = self.clone();
        result.merge_unchecked(other);
        Ok(result)
    }

    /// Intersection into a new set.
    pub fn intersection(&self, other: &EntitySet) -> Result<EntitySet, EcsError> {
        let mut result = self.clone();
        result.intersect_with(other)?;
        Ok(result)
    }

    /// Difference into a new set.
    pub fn difference(&self, other: &EntitySet) -> Result<EntitySet, EcsError> {
        let mut result = self.clone();
        result.difference_with(other)?;
        Ok(result)
    }

    /// Membership equality, failing with `CrossWorld` for sets from
    /// different worlds. Missing or shorter blocks compare as all-zero.
    pub fn same_entities(&self, other: &EntitySet) -> Result<bool, EcsError> {
        self.check_world(other)?;
        Ok(self.blocks_agree(other))
    }

    fn blocks_agree(&self, other: &EntitySet) -> bool {
        let block_count = self.blocks.len().max(other.blocks.len());
        for block in 0..block_count {
            let a = self.blocks.get(block).map(Block::as_slice).unwrap_or(&[]);
            let b = other.blocks.get(block).map(Block::as_slice).unwrap_or(&[]);
            let len = a.len().max(b.len());
            for index in 0..len {
                let gen_a = a.get(index).copied().unwrap_or(0);
                let gen_b = b.get(index).copied().unwrap_or(0);
                if gen_a != gen_b {
                    return false;
                }
            }
        }
        true
    }
}

/// Value equality: same world and the generation vectors agree everywhere.
/// Sets from different worlds are never equal; use
/// [`EntitySet::same_entities`] to surface that case as an error instead.
impl PartialEq for EntitySet {
    fn eq(&self, other: &Self) -> bool {
        self.world == other.world && self.blocks_agree(other)
    }
}

impl Eq for EntitySet {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{ClassRegistry, World};

    fn world_with_class() -> World {
        let mut classes = ClassRegistry::new();
        classes.register("thing");
        World::new(classes)
    }

    fn spawn(world: &mut World, n: usize) -> Vec<Entity> {
        let class = world.classes().id_of("thing").unwrap();
        (0..n).map(|_| world.create(class)).collect()
    }

    #[test]
    fn add_contains_remove() {
        let mut world = world_with_class();
        let e = spawn(&mut world, 1)[0];
        let mut set = EntitySet::new(world.id());

        assert!(!set.contains(e));
        set.add(world.registry(), e).unwrap();
        assert!(set.contains(e));
        assert_eq!(set.len(), 1);

        set.remove(e).unwrap();
        assert!(!set.contains(e));
        assert_eq!(set.remove(e), Err(EcsError::NotFound { entity: e }));
        assert!(!set.discard(e));
    }

    #[test]
    fn add_rejects_dead_entities() {
        let mut world = world_with_class();
        let e = spawn(&mut world, 1)[0];
        world.destroy(e).unwrap();

        let mut set = EntitySet::new(world.id());
        assert_eq!(
            set.add(world.registry(), e),
            Err(EcsError::DeletedEntity { entity: e })
        );
    }

    #[test]
    fn add_rejects_foreign_registry() {
        let mut world_a = world_with_class();
        let mut world_b = world_with_class();
        let e = spawn(&mut world_b, 1)[0];

        let mut set = EntitySet::new(world_a.id());
        let err = set.add(world_b.registry(), e).unwrap_err();
        assert!(matches!(err, EcsError::InvalidWorld { .. }));
        // The same handle value is fine against the right registry.
        let e_a = spawn(&mut world_a, 1)[0];
        set.add(world_a.registry(), e_a).unwrap();
    }

    #[test]
    fn stale_handle_is_never_a_member() {
        let mut world = world_with_class();
        let e = spawn(&mut world, 1)[0];
        let mut set = EntitySet::new(world.id());
        set.add(world.registry(), e).unwrap();

        world.destroy(e).unwrap();
        let reused = spawn(&mut world, 1)[0];
        assert_eq!(reused.index(), e.index());
        assert_ne!(reused.generation(), e.generation());

        // The old entry still names the dead occupant; neither the stale
        // handle nor the new one matches after re-recording the slot.
        set.insert_unchecked(reused);
        assert!(!set.contains(e));
        assert!(set.contains(reused));
    }

    #[test]
    fn set_algebra_laws() {
        let mut world = world_with_class();
        let entities = spawn(&mut world, 6);
        let registry = world.registry();

        let mut a = EntitySet::new(world.id());
        let mut b = EntitySet::new(world.id());
        let empty = EntitySet::new(world.id());
        for e in &entities[0..4] {
            a.add(registry, *e).unwrap();
        }
        for e in &entities[2..6] {
            b.add(registry, *e).unwrap();
        }

        assert_eq!(a.intersection(&a).unwrap(), a);
        assert_eq!(a.union(&a).unwrap(), a);
        assert!(a.difference(&a).unwrap().is_empty());
        assert_eq!(a.intersection(&b).unwrap(), b.intersection(&a).unwrap());
        assert_eq!(a.union(&b).unwrap().intersection(&b).unwrap(), b);
        assert_eq!(a.union(&empty).unwrap(), a);

        let mid = a.intersection(&b).unwrap();
        assert_eq!(mid.len(), 2);
        assert!(mid.contains(entities[2]) && mid.contains(entities[3]));

        let only_a = a.difference(&b).unwrap();
        assert_eq!(only_a.len(), 2);
        assert!(only_a.contains(entities[0]) && only_a.contains(entities[1]));
    }

    #[test]
    fn union_tie_break_prefers_larger_generation() {
        let mut world = world_with_class();
        let e = spawn(&mut world, 1)[0];
        let mut a = EntitySet::new(world.id());
        a.add(world.registry(), e).unwrap();

        world.destroy(e).unwrap();
        let newer = spawn(&mut world, 1)[0];
        let mut b = EntitySet::new(world.id());
        b.add(world.registry(), newer).unwrap();

        // Same slot, different generations: the larger one survives.
        let u = a.union(&b).unwrap();
        assert!(u.contains(newer));
        assert!(!u.contains(e));
        let u_rev = b.union(&a).unwrap();
        assert_eq!(u, u_rev);
    }

    #[test]
    fn difference_ignores_other_occupants() {
        let mut world = world_with_class();
        let e = spawn(&mut world, 1)[0];
        let mut a = EntitySet::new(world.id());
        a.add(world.registry(), e).unwrap();

        world.destroy(e).unwrap();
        let newer = spawn(&mut world, 1)[0];
        let mut b = EntitySet::new(world.id());
        b.add(world.registry(), newer).unwrap();

        // b records a different occupant of the slot, so a's entry stays.
        let d = a.difference(&b).unwrap();
        assert!(d.contains(e));
    }

    #[test]
    fn equality_pads_missing_blocks_with_zero() {
        let mut world = world_with_class();
        let e = spawn(&mut world, 1)[0];

        let mut a = EntitySet::new(world.id());
        let b = EntitySet::new(world.id());
        assert_eq!(a, b);

        a.add(world.registry(), e).unwrap();
        assert_ne!(a, b);
        a.remove(e).unwrap();
        // a now has an allocated but all-zero block; b has none.
        assert_eq!(a, b);
        assert!(a.same_entities(&b).unwrap());
    }

    #[test]
    fn cross_world_combination_is_an_error() {
        let world_a = world_with_class();
        let world_b = world_with_class();
        let mut a = EntitySet::new(world_a.id());
        let b = EntitySet::new(world_b.id());

        let expected = EcsError::CrossWorld {
            left: world_a.id(),
            right: world_b.id(),
        };
        assert_eq!(a.union(&b).unwrap_err(), expected);
        assert_eq!(a.intersection(&b).unwrap_err(), expected);
        assert_eq!(a.difference(&b).unwrap_err(), expected);
        assert_eq!(a.same_entities(&b).unwrap_err(), expected);
        assert_eq!(a.union_with(&b).unwrap_err(), expected);
        assert_ne!(a, b);
    }
}
