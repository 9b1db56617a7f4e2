//! Typed component fields
//!
//! A field is one typed column keyed by entity handle. Fields have no
//! notion of liveness; they only distinguish written slots from
//! never-written ones, and the latter read back as the field's default.
//! Membership questions belong to the owning component's entity set.

use crate::ecs::{Block, EcsError, Entity};
use glam::{Vec2, Vec4};
use std::fmt;

/// Declared element type of a field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Bool,
    Str,
    Vec2,
    Color,
}

impl FieldKind {
    /// The zero value written to freshly exposed slots of this kind.
    pub fn default_value(&self) -> Value {
        match self {
            FieldKind::Int => Value::Int(0),
            FieldKind::Float => Value::Float(0.0),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Str => Value::Str(String::new()),
            FieldKind::Vec2 => Value::Vec2(Vec2::ZERO),
            FieldKind::Color => Value::Color(Vec4::ZERO),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::Str => "str",
            FieldKind::Vec2 => "vec2",
            FieldKind::Color => "color",
        };
        f.write_str(name)
    }
}

/// A single dynamically typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
    Vec2(Vec2),
    Color(Vec4),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Int(_) => FieldKind::Int,
            Value::Float(_) => FieldKind::Float,
            Value::Bool(_) => FieldKind::Bool,
            Value::Str(_) => FieldKind::Str,
            Value::Vec2(_) => FieldKind::Vec2,
            Value::Color(_) => FieldKind::Color,
        }
    }

    /// Coerce into `kind`, or `None` when the conversion is not allowed.
    /// Numeric kinds convert between each other; anything numeric renders
    /// into a string; vectors and colors only accept their own kind.
    pub fn cast(self, kind: FieldKind) -> Option<Value> {
        if self.kind() == kind {
            return Some(self);
        }
        match (kind, self) {
            (FieldKind::Int, Value::Float(v)) => Some(Value::Int(v as i32)),
            (FieldKind::Int, Value::Bool(v)) => Some(Value::Int(v as i32)),
            (FieldKind::Float, Value::Int(v)) => Some(Value::Float(v as f32)),
            (FieldKind::Bool, Value::Int(v)) => Some(Value::Bool(v != 0)),
            (FieldKind::Str, Value::Int(v)) => Some(Value::Str(v.to_string())),
            (FieldKind::Str, Value::Float(v)) => Some(Value::Str(v.to_string())),
            (FieldKind::Str, Value::Bool(v)) => Some(Value::Str(v.to_string())),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Value::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Vec4> {
        match self {
            Value::Color(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Value::Vec2(v)
    }
}

impl From<Vec4> for Value {
    fn from(v: Vec4) -> Self {
        Value::Color(v)
    }
}

/// One typed column of a component, sharded per storage block like the
/// entity sets so distinct classes' slot numbering cannot collide.
#[derive(Debug)]
pub struct Field {
    name: String,
    kind: FieldKind,
    default: Value,
    blocks: Vec<Block<Value>>,
}

impl Field {
    /// Create a field whose default is the kind's zero value.
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: kind.default_value(),
            blocks: Vec::new(),
        }
    }

    /// Create a field with an explicit default, which must cast to `kind`.
    pub fn with_default(name: &str, kind: FieldKind, default: Value) -> Result<Self, EcsError> {
        let found = default.kind();
        let default = default.cast(kind).ok_or_else(|| EcsError::TypeMismatch {
            field: name.to_string(),
            expected: kind,
            found,
        })?;
        Ok(Self {
            name: name.to_string(),
            kind,
            default,
            blocks: Vec::new(),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    pub fn default(&self) -> &Value {
        &self.default
    }

    /// Write a value at the handle's slot, casting to the declared kind and
    /// growing the backing block as needed.
    pub fn set(&mut self, entity: Entity, value: Value) -> Result<(), EcsError> {
        let found = value.kind();
        let value = value.cast(self.kind).ok_or_else(|| EcsError::TypeMismatch {
            field: self.name.clone(),
            expected: self.kind,
            found,
        })?;
        *self.slot_mut(entity) = value;
        Ok(())
    }

    /// Read the stored value, or the field default if the slot was never
    /// written. Whether the read is *meaningful* is for the owning
    /// component's membership set to answer.
    pub fn get(&self, entity: Entity) -> Value {
        self.blocks
            .get(entity.block() as usize)
            .and_then(|blk| blk.get(entity.index() as usize))
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    /// Reset the handle's slot to the field default.
    pub(crate) fn reset(&mut self, entity: Entity) {
        *self.slot_mut(entity) = self.default.clone();
    }

    fn slot_mut(&mut self, entity: Entity) -> &mut Value {
        let block = entity.block() as usize;
        if self.blocks.len() <= block {
            self.blocks.resize_with(block + 1, Block::new);
        }
        let blk = &mut self.blocks[block];
        blk.grow(entity.index() as usize + 1, self.default.clone());
        &mut blk[entity.index() as usize]
    }
}
