// component.rs - Named columnar tables of per-entity data
//
// A component is a field schema plus a membership set, with per-tick
// "just added" / "just removed" lists so incremental consumers never have
// to re-scan full membership.

use crate::ecs::{EcsError, Entity, EntitySet, Field, FieldKind, Value, WorldId, WorldRegistry};
use std::collections::HashMap;

/// Schema definition for a component, built before the component is bound
/// to a world.
#[derive(Debug)]
pub struct ComponentDef {
    name: String,
    fields: Vec<Field>,
}

impl ComponentDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Declare a field with the kind's zero default.
    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(Field::new(name, kind));
        self
    }

    /// Declare a field with an explicit default value.
    pub fn field_with_default(
        mut self,
        name: &str,
        kind: FieldKind,
        default: Value,
    ) -> Result<Self, EcsError> {
        self.fields.push(Field::with_default(name, kind, default)?);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn bind(self, world: WorldId) -> Component {
        let by_name = self
            .fields
            .iter()
            .enumerate()
            .map(|(pos, field)| (field.name().to_string(), pos))
            .collect();
        Component {
            name: self.name,
            fields: self.fields,
            by_name,
            entities: EntitySet::new(world),
            pending_added: Vec::new(),
            pending_deleted: Vec::new(),
            new_entities: Vec::new(),
            deleted_entities: Vec::new(),
        }
    }
}

/// Snapshot of one entity's values across a component's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<(String, Value)>,
}

impl Row {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

/// A named set of fields plus a membership set, bound to one world.
#[derive(Debug)]
pub struct Component {
    name: String,
    fields: Vec<Field>,
    by_name: HashMap<String, usize>,
    entities: EntitySet,
    pending_added: Vec<Entity>,
    pending_deleted: Vec<Entity>,
    new_entities: Vec<Entity>,
    deleted_entities: Vec<Entity>,
}

impl Component {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Membership set of this component.
    #[inline]
    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    /// Handles added since the previous [`step`](Self::step) call.
    #[inline]
    pub fn new_entities(&self) -> &[Entity] {
        &self.new_entities
    }

    /// Handles removed since the previous [`step`](Self::step) call.
    #[inline]
    pub fn deleted_entities(&self) -> &[Entity] {
        &self.deleted_entities
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&pos| &self.fields[pos])
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Add a live entity, initializing every field slot to its default.
    /// Repeat adds of a member are a no-op.
    pub fn add(&mut self, registry: &WorldRegistry, entity: Entity) -> Result<(), EcsError> {
        if self.entities.contains(entity) {
            return Ok(());
        }
        self.entities.add(registry, entity)?;
        for field in &mut self.fields {
            field.reset(entity);
        }
        self.pending_added.push(entity);
        tracing::trace!(component = %self.name, %entity, "added to component");
        Ok(())
    }

    /// Update only the named fields, adding the entity first when absent.
    pub fn set(
        &mut self,
        registry: &WorldRegistry,
        entity: Entity,
        values: &[(&str, Value)],
    ) -> Result<(), EcsError> {
        self.add(registry, entity)?;
        for (name, value) in values {
            let pos = *self
                .by_name
                .get(*name)
                .ok_or_else(|| EcsError::UnknownField {
                    field: name.to_string(),
                })?;
            self.fields[pos].set(entity, value.clone())?;
        }
        Ok(())
    }

    /// Seed an entity's values from another row, field by matching field.
    /// Row entries outside this component's schema are ignored.
    pub fn set_from_row(
        &mut self,
        registry: &WorldRegistry,
        entity: Entity,
        row: &Row,
    ) -> Result<(), EcsError> {
        self.add(registry, entity)?;
        for (name, value) in row.iter() {
            if let Some(&pos) = self.by_name.get(name) {
                self.fields[pos].set(entity, value.clone())?;
            }
        }
        Ok(())
    }

    /// Remove an entity from membership, reporting whether it was present.
    /// Field storage is left in place; membership alone gates visibility.
    pub fn delete(&mut self, entity: Entity) -> bool {
        if self.entities.discard(entity) {
            self.pending_deleted.push(entity);
            tracing::trace!(component = %self.name, %entity, "removed from component");
            true
        } else {
            false
        }
    }

    /// Snapshot all field values for a member entity.
    pub fn row(&self, entity: Entity) -> Result<Row, EcsError> {
        if !self.entities.contains(entity) {
            return Err(EcsError::NotFound { entity });
        }
        let values = self
            .fields
            .iter()
            .map(|field| (field.name().to_string(), field.get(entity)))
            .collect();
        Ok(Row { values })
    }

    /// Read a single field value for a member entity.
    pub fn get(&self, entity: Entity, field: &str) -> Result<Value, EcsError> {
        if !self.entities.contains(entity) {
            return Err(EcsError::NotFound { entity });
        }
        let stored = self.field(field).ok_or_else(|| EcsError::UnknownField {
            field: field.to_string(),
        })?;
        Ok(stored.get(entity))
    }

    /// Publish this tick's accumulated changes.
    ///
    /// Swap-then-clear: the pending lists become the public
    /// `new_entities` / `deleted_entities` views and fresh accumulation
    /// starts, so iterating the views stays safe even while more entities
    /// are added before the next step.
    pub fn step(&mut self, dt: f32) {
        std::mem::swap(&mut self.new_entities, &mut self.pending_added);
        self.pending_added.clear();
        std::mem::swap(&mut self.deleted_entities, &mut self.pending_deleted);
        self.pending_deleted.clear();
        tracing::trace!(
            component = %self.name,
            dt,
            added = self.new_entities.len(),
            deleted = self.deleted_entities.len(),
            "component stepped"
        );
    }
}
