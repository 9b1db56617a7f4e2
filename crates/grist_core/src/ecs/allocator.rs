// allocator.rs - Generational identity allocation
//
// One allocator per world. Each entity class owns a monotonically growing
// slot counter plus a recycle list; freed slots come back with their
// generation bumped by exactly one, which is what keeps stale handles dead
// forever.

use crate::ecs::{ClassId, Entity};

#[derive(Debug, Default)]
struct ClassSlots {
    next_index: u32,
    free: Vec<Entity>,
}

/// Issues and recycles entity handles, one slot namespace per class.
#[derive(Debug, Default)]
pub struct IdentityAllocator {
    classes: Vec<ClassSlots>,
}

impl IdentityAllocator {
    /// Create an allocator covering `class_count` classes.
    pub fn new(class_count: usize) -> Self {
        let mut classes = Vec::with_capacity(class_count);
        classes.resize_with(class_count, ClassSlots::default);
        Self { classes }
    }

    /// Issue a handle for `class`. Recycled slots are reused before the
    /// counter advances; a fresh slot starts at generation 1.
    pub fn allocate(&mut self, class: ClassId) -> Entity {
        let slots = &mut self.classes[class.as_usize()];
        if let Some(old) = slots.free.pop() {
            Entity::new(old.generation() + 1, old.block(), old.index())
        } else {
            let index = slots.next_index;
            slots.next_index += 1;
            Entity::new(1, class.block(), index)
        }
    }

    /// Queue a freed handle's slot for reuse.
    ///
    /// Recycling the same handle twice is a caller bug and is not guarded.
    pub fn recycle(&mut self, entity: Entity) {
        let slots = &mut self.classes[entity.block() as usize];
        debug_assert!(entity.index() < slots.next_index, "recycled unissued slot");
        slots.free.push(entity);
    }

    pub fn recycle_many<I>(&mut self, entities: I)
    where
        I: IntoIterator<Item = Entity>,
    {
        for entity in entities {
            self.recycle(entity);
        }
    }

    /// Number of slots queued for reuse in `class`.
    pub fn free_count(&self, class: ClassId) -> usize {
        self.classes[class.as_usize()].free.len()
    }
}
