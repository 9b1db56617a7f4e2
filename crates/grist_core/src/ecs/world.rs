// world.rs - World with entity lifecycle, queries and joins
//
// The world owns the identity allocator, the owning registry, the
// components and the per-class extents. Entity destruction cascades from
// here: registry, every component, the class extent, then the recycle
// list, all inside one call so no partial-deletion state is ever visible.

use crate::ecs::{
    ClassId, ClassRegistry, Component, ComponentDef, EcsError, Entity, EntityRef, EntitySet,
    IdentityAllocator, Row, Value, WorldRegistry,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier of a world, used to reject cross-world mixing
/// of handles and sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WorldId(u64);

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(1);

impl WorldId {
    fn next() -> Self {
        WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "World({})", self.0)
    }
}

/// Selection of entity classes for [`World::query`].
#[derive(Debug, Copy, Clone)]
pub enum ClassSelect<'a> {
    /// Every entity in the world.
    All,
    One(ClassId),
    /// Union of the listed classes' extents.
    Many(&'a [ClassId]),
}

/// Default step rate used to pin oversized time deltas.
const DEFAULT_STEP_RATE: f32 = 60.0;

/// A coordinated collection of entities and components.
pub struct World {
    id: WorldId,
    classes: ClassRegistry,
    allocator: IdentityAllocator,
    registry: WorldRegistry,
    components: Vec<Component>,
    component_names: HashMap<String, usize>,
    extents: Vec<EntitySet>,
    step_rate: f32,
    time: f32,
}

impl World {
    /// Create a world over an explicit class registry.
    ///
    /// The registry is a plain value built at startup; worlds share classes
    /// only by sharing (a clone of) the same registry.
    pub fn new(classes: ClassRegistry) -> Self {
        Self::with_step_rate(classes, DEFAULT_STEP_RATE)
    }

    /// Create a world with a non-default step rate, which bounds how large
    /// a single `step` delta may be (10x the step period).
    pub fn with_step_rate(classes: ClassRegistry, step_rate: f32) -> Self {
        let id = WorldId::next();
        let mut extents = Vec::with_capacity(classes.len());
        extents.resize_with(classes.len(), || EntitySet::new(id));
        tracing::debug!(world = %id, classes = classes.len(), "created world");
        Self {
            id,
            allocator: IdentityAllocator::new(classes.len()),
            registry: WorldRegistry::new(id),
            classes,
            components: Vec::new(),
            component_names: HashMap::new(),
            extents,
            step_rate,
            time: 0.0,
        }
    }

    #[inline]
    pub fn id(&self) -> WorldId {
        self.id
    }

    #[inline]
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    #[inline]
    pub fn registry(&self) -> &WorldRegistry {
        &self.registry
    }

    /// Membership of all live entities, usable in set algebra.
    #[inline]
    pub fn entities(&self) -> &EntitySet {
        self.registry.members()
    }

    /// Accumulated simulation time advanced by [`step`](Self::step).
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Create a new entity of `class`. The handle is alive from this
    /// moment until [`destroy`](Self::destroy).
    pub fn create(&mut self, class: ClassId) -> Entity {
        assert!(
            class.as_usize() < self.classes.len(),
            "{class} is not in this world's class registry"
        );
        let entity = self.allocator.allocate(class);
        self.registry.insert(entity, class);
        self.extents[class.as_usize()].insert_unchecked(entity);
        tracing::debug!(world = %self.id, %entity, class = %class, "created entity");
        entity
    }

    /// Destroy an entity: remove it from the registry, every component
    /// (feeding their per-tick deleted lists), its class extent, and
    /// recycle its slot. Fails with `NotFound` for dead or stale handles,
    /// in which case nothing changes.
    pub fn destroy(&mut self, entity: Entity) -> Result<EntityRef, EcsError> {
        let object = self.registry.remove(entity)?;
        for component in &mut self.components {
            component.delete(entity);
        }
        self.extents[object.class.as_usize()].discard(entity);
        self.allocator.recycle(entity);
        tracing::debug!(world = %self.id, %entity, "destroyed entity");
        Ok(object)
    }

    /// Destroy an entity if it is alive; reports whether it was.
    pub fn discard(&mut self, entity: Entity) -> bool {
        self.destroy(entity).is_ok()
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.registry.contains(entity)
    }

    /// Resolve a live handle back to its owning entity object.
    #[inline]
    pub fn resolve(&self, entity: Entity) -> Option<EntityRef> {
        self.registry.resolve(entity)
    }

    /// Bind a component definition to this world. Components step in
    /// insertion order, which keeps ticking deterministic.
    pub fn insert_component(&mut self, def: ComponentDef) -> Result<(), EcsError> {
        if self.component_names.contains_key(def.name()) {
            return Err(EcsError::DuplicateComponent {
                name: def.name().to_string(),
            });
        }
        let component = def.bind(self.id);
        tracing::debug!(world = %self.id, component = %component.name(), "registered component");
        self.component_names
            .insert(component.name().to_string(), self.components.len());
        self.components.push(component);
        Ok(())
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        let pos = *self.component_names.get(name)?;
        Some(&self.components[pos])
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut Component> {
        let pos = *self.component_names.get(name)?;
        Some(&mut self.components[pos])
    }

    /// Borrow a component for mutation together with the registry it must
    /// validate liveness against.
    pub fn component_with_registry(
        &mut self,
        name: &str,
    ) -> Option<(&WorldRegistry, &mut Component)> {
        let pos = *self.component_names.get(name)?;
        Some((&self.registry, &mut self.components[pos]))
    }

    /// Add an entity to the named component with default field values.
    pub fn attach(&mut self, entity: Entity, component: &str) -> Result<(), EcsError> {
        let (registry, comp) = self
            .component_with_registry(component)
            .ok_or_else(|| EcsError::UnknownComponent {
                name: component.to_string(),
            })?;
        comp.add(registry, entity)
    }

    /// Set field values on the named component, adding the entity first
    /// when absent.
    pub fn set(
        &mut self,
        entity: Entity,
        component: &str,
        values: &[(&str, Value)],
    ) -> Result<(), EcsError> {
        let (registry, comp) = self
            .component_with_registry(component)
            .ok_or_else(|| EcsError::UnknownComponent {
                name: component.to_string(),
            })?;
        comp.set(registry, entity, values)
    }

    /// Remove an entity from the named component; reports whether it was a
    /// member.
    pub fn detach(&mut self, entity: Entity, component: &str) -> Result<bool, EcsError> {
        let comp = self
            .component_mut(component)
            .ok_or_else(|| EcsError::UnknownComponent {
                name: component.to_string(),
            })?;
        Ok(comp.delete(entity))
    }

    /// Snapshot an entity's row in the named component.
    pub fn row(&self, entity: Entity, component: &str) -> Result<Row, EcsError> {
        let comp = self
            .component(component)
            .ok_or_else(|| EcsError::UnknownComponent {
                name: component.to_string(),
            })?;
        comp.row(entity)
    }

    /// The extent of one class: the set of its live entities.
    pub fn extent(&self, class: ClassId) -> &EntitySet {
        &self.extents[class.as_usize()]
    }

    /// Query entities by class. The result is a detached set; it does not
    /// track later creations or destructions.
    pub fn query(&self, select: ClassSelect<'_>) -> EntitySet {
        match select {
            ClassSelect::All => self.registry.members().clone(),
            ClassSelect::One(class) => self.extents[class.as_usize()].clone(),
            ClassSelect::Many(classes) => {
                let mut result = EntitySet::new(self.id);
                for class in classes {
                    result.merge_unchecked(&self.extents[class.as_usize()]);
                }
                result
            }
        }
    }

    /// Stream aligned per-entity rows across the intersection of the named
    /// components' memberships.
    ///
    /// The sequence is finite and not a persistent cursor; call `join`
    /// again to restart. An entity deleted from a component between
    /// construction and consumption is skipped, never an error.
    pub fn join<'a>(&'a self, names: &[&str]) -> Result<Join<'a>, EcsError> {
        let mut components = Vec::with_capacity(names.len());
        for name in names {
            components.push(self.component(name).ok_or_else(|| {
                EcsError::UnknownComponent {
                    name: name.to_string(),
                }
            })?);
        }
        let mut entities = match components.first() {
            Some(comp) => comp.entities().clone(),
            None => EntitySet::new(self.id),
        };
        for comp in components.iter().skip(1) {
            entities.intersect_with(comp.entities())?;
        }
        let entities: Vec<Entity> = self.registry.iter_intersection(&entities).collect();
        Ok(Join {
            components,
            entities: entities.into_iter(),
        })
    }

    /// Execute one time step: pin oversized deltas to 10x the step period,
    /// advance world time, and step every component in insertion order.
    pub fn step(&mut self, dt: f32) {
        let dt = dt.min(10.0 / self.step_rate);
        self.time += dt;
        for component in &mut self.components {
            component.step(dt);
        }
    }
}

/// Iterator over aligned component rows, produced by [`World::join`].
pub struct Join<'a> {
    components: Vec<&'a Component>,
    entities: std::vec::IntoIter<Entity>,
}

impl<'a> Iterator for Join<'a> {
    type Item = (Entity, Vec<Row>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entity = self.entities.next()?;
            let mut rows = Vec::with_capacity(self.components.len());
            for comp in &self.components {
                match comp.row(entity) {
                    Ok(row) => rows.push(row),
                    // Deleted since the join was built: skip this entity.
                    Err(_) => break,
                }
            }
            if rows.len() == self.components.len() {
                return Some((entity, rows));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{FieldKind, Value};

    fn test_world() -> (World, ClassId, ClassId) {
        let mut classes = ClassRegistry::new();
        let ship = classes.register("ship");
        let rock = classes.register("rock");
        let mut world = World::new(classes);
        world
            .insert_component(
                ComponentDef::new("position").field("xy", FieldKind::Vec2),
            )
            .unwrap();
        world
            .insert_component(
                ComponentDef::new("movement")
                    .field("velocity", FieldKind::Vec2)
                    .field("v", FieldKind::Int),
            )
            .unwrap();
        (world, ship, rock)
    }

    #[test]
    fn created_entities_are_alive_until_destroyed() {
        let (mut world, ship, _) = test_world();
        let e = world.create(ship);
        assert!(world.contains(e));

        world.destroy(e).unwrap();
        assert!(!world.contains(e));
        assert_eq!(world.destroy(e), Err(EcsError::NotFound { entity: e }));

        // A reused slot never resurrects the old handle.
        let reused = world.create(ship);
        assert_eq!((reused.block(), reused.index()), (e.block(), e.index()));
        assert!(!world.contains(e));
        assert!(world.contains(reused));
    }

    #[test]
    fn destroy_cascades_into_components_and_extents() {
        let (mut world, ship, _) = test_world();
        let e = world.create(ship);
        world.attach(e, "position").unwrap();
        world.attach(e, "movement").unwrap();
        assert!(world.extent(ship).contains(e));

        world.destroy(e).unwrap();
        assert!(!world.component("position").unwrap().contains(e));
        assert!(!world.component("movement").unwrap().contains(e));
        assert!(!world.extent(ship).contains(e));
        // The slot is queued for reuse.
        assert_eq!(world.create(ship).generation(), e.generation() + 1);
    }

    #[test]
    fn query_covers_extents_unions_and_wildcard() {
        let (mut world, ship, rock) = test_world();
        let s1 = world.create(ship);
        let s2 = world.create(ship);
        let r1 = world.create(rock);

        let ships = world.query(ClassSelect::One(ship));
        assert_eq!(ships.len(), 2);
        assert!(ships.contains(s1) && ships.contains(s2) && !ships.contains(r1));

        let both = world.query(ClassSelect::Many(&[ship, rock]));
        assert_eq!(both.len(), 3);

        let all = world.query(ClassSelect::All);
        assert_eq!(all, both);

        world.destroy(s1).unwrap();
        assert!(!world.query(ClassSelect::One(ship)).contains(s1));
        // A previously returned set is detached and still records s1.
        assert!(ships.contains(s1));
    }

    #[test]
    fn join_streams_aligned_rows_over_the_intersection() {
        let (mut world, ship, _) = test_world();
        let e1 = world.create(ship);
        let e2 = world.create(ship);
        let e3 = world.create(ship);
        world
            .set(e1, "position", &[("xy", Value::Vec2(glam::Vec2::new(1.0, 0.0)))])
            .unwrap();
        world
            .set(e2, "position", &[("xy", Value::Vec2(glam::Vec2::new(2.0, 0.0)))])
            .unwrap();
        world.set(e1, "movement", &[("v", Value::Int(10))]).unwrap();
        // e3 is only in movement; e2 only in position.
        world.set(e3, "movement", &[("v", Value::Int(30))]).unwrap();

        let results: Vec<_> = world.join(&["position", "movement"]).unwrap().collect();
        assert_eq!(results.len(), 1);
        let (entity, rows) = &results[0];
        assert_eq!(*entity, e1);
        assert_eq!(rows[0].get("xy"), Some(&Value::Vec2(glam::Vec2::new(1.0, 0.0))));
        assert_eq!(rows[1].get("v"), Some(&Value::Int(10)));

        // Single-component join covers that component's full membership.
        let singles: Vec<_> = world.join(&["movement"]).unwrap().collect();
        assert_eq!(singles.len(), 2);

        assert!(matches!(
            world.join(&["position", "bogus"]),
            Err(EcsError::UnknownComponent { .. })
        ));
    }

    #[test]
    fn join_is_finite_and_restartable() {
        let (mut world, ship, _) = test_world();
        for _ in 0..3 {
            let e = world.create(ship);
            world.attach(e, "position").unwrap();
        }
        let first: Vec<_> = world.join(&["position"]).unwrap().collect();
        let second: Vec<_> = world.join(&["position"]).unwrap().collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn step_pins_oversized_deltas_and_accumulates_time() {
        let (mut world, _, _) = test_world();
        world.step(1.0 / 60.0);
        assert!((world.time() - 1.0 / 60.0).abs() < 1e-6);
        // 10x the step period is the ceiling for a single step.
        world.step(5.0);
        assert!((world.time() - (1.0 / 60.0 + 10.0 / 60.0)).abs() < 1e-5);
    }

    #[test]
    fn duplicate_component_names_are_rejected() {
        let (mut world, _, _) = test_world();
        let err = world
            .insert_component(ComponentDef::new("position"))
            .unwrap_err();
        assert_eq!(
            err,
            EcsError::DuplicateComponent {
                name: "position".to_string()
            }
        );
    }

    // The end-to-end scenario: create e1..e3, add e1/e2 to a component,
    // set a value, tick, destroy e1, tick again, and check every view.
    #[test]
    fn lifecycle_scenario() {
        let mut classes = ClassRegistry::new();
        let thing = classes.register("thing");
        let mut world = World::new(classes);
        world
            .insert_component(ComponentDef::new("c").field("v", FieldKind::Int))
            .unwrap();

        let e1 = world.create(thing);
        let e2 = world.create(thing);
        let e3 = world.create(thing);

        world.attach(e1, "c").unwrap();
        world.attach(e2, "c").unwrap();
        world.set(e1, "c", &[("v", Value::Int(10))]).unwrap();
        assert_eq!(world.row(e1, "c").unwrap().get("v"), Some(&Value::Int(10)));

        world.step(1.0 / 60.0);
        let comp = world.component("c").unwrap();
        assert_eq!(comp.new_entities(), &[e1, e2]);

        world.destroy(e1).unwrap();
        world.step(1.0 / 60.0);
        let comp = world.component("c").unwrap();
        assert_eq!(comp.deleted_entities(), &[e1]);
        assert!(!comp.entities().contains(e1));

        let mut expected = EntitySet::new(world.id());
        expected.add(world.registry(), e2).unwrap();
        expected.add(world.registry(), e3).unwrap();
        assert_eq!(*world.entities(), expected);

        // Re-adding after reuse yields the field default again.
        let e4 = world.create(thing);
        assert_eq!((e4.block(), e4.index()), (e1.block(), e1.index()));
        world.attach(e4, "c").unwrap();
        assert_eq!(world.row(e4, "c").unwrap().get("v"), Some(&Value::Int(0)));
    }
}
