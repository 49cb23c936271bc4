use std::any::Any;
use std::cell::Cell;

use crate::types::registry::{TypeId, TypeRegistry};

/// Unique identifier for an object stored inside the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct HeapId(usize);

impl HeapId {
    /// Returns the raw index value.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    #[doc(hidden)]
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// Common header every heap object carries, independent of its payload.
///
/// The object-type id uniquely determines the vtable held by the
/// [`TypeRegistry`]; the mark bit is flipped during a mark phase and
/// cleared by `sweep`.
pub struct ObjectHeader {
    pub type_id: TypeId,
    mark: Cell<bool>,
    hash: Cell<Option<u64>>,
}

impl ObjectHeader {
    pub fn new(type_id: TypeId) -> Self {
        Self { type_id, mark: Cell::new(false), hash: Cell::new(None) }
    }

    pub fn is_marked(&self) -> bool {
        self.mark.get()
    }

    pub fn mark(&self) {
        self.mark.set(true);
    }

    pub fn unmark(&self) {
        self.mark.set(false);
    }

    pub fn cached_hash(&self) -> Option<u64> {
        self.hash.get()
    }

    pub fn set_cached_hash(&self, hash: u64) {
        self.hash.set(Some(hash));
    }
}

struct Slot {
    header: ObjectHeader,
    data: Box<dyn Any>,
}

enum Entry {
    Occupied(Slot),
    Free { next_free: Option<usize> },
}

/// A type entry's `mark-children` callback: given an object's payload and
/// the heap, mark every `HeapId` the object references.
pub type MarkFn = fn(&dyn Any, &Heap, &mut dyn FnMut(HeapId));
/// A type entry's `free` callback, invoked once per live instance at
/// sweep/teardown.
pub type FreeFn = fn(&mut dyn Any);

/// The six host-provided behaviors the original spec associates with an
/// object-type id. `hash` and `compare` are optional; identity is used when
/// they are absent (see [`crate::value::Value::identity_eq`]).
pub struct TypeEntry {
    pub name: &'static str,
    pub print: fn(&dyn Any) -> String,
    pub mark_children: MarkFn,
    pub free: FreeFn,
    pub size: fn(&dyn Any) -> usize,
    pub hash: Option<fn(&dyn Any) -> u64>,
    pub compare: Option<fn(&dyn Any, &dyn Any) -> Option<std::cmp::Ordering>>,
}

/// Mark-and-sweep heap arena.
///
/// Unlike a refcounted arena, liveness here is decided by a mark phase
/// rooted at the caller's live value set, followed by `sweep`, which
/// invokes each unmarked live object's `free` vtable callback and returns
/// its slot to the free list.
pub struct Heap {
    entries: Vec<Entry>,
    free_head: Option<usize>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Self { entries: Vec::new(), free_head: None }
    }

    pub fn allocate(&mut self, type_id: TypeId, data: Box<dyn Any>) -> HeapId {
        let slot = Slot { header: ObjectHeader::new(type_id), data };
        if let Some(index) = self.free_head {
            let next_free = match &self.entries[index] {
                Entry::Free { next_free } => *next_free,
                Entry::Occupied(_) => unreachable!("free_head must point at a Free entry"),
            };
            self.free_head = next_free;
            self.entries[index] = Entry::Occupied(slot);
            HeapId(index)
        } else {
            let index = self.entries.len();
            self.entries.push(Entry::Occupied(slot));
            HeapId(index)
        }
    }

    pub fn header(&self, id: HeapId) -> &ObjectHeader {
        match &self.entries[id.0] {
            Entry::Occupied(slot) => &slot.header,
            Entry::Free { .. } => panic!("use of freed HeapId {}", id.0),
        }
    }

    pub fn get(&self, id: HeapId) -> &dyn Any {
        match &self.entries[id.0] {
            Entry::Occupied(slot) => slot.data.as_ref(),
            Entry::Free { .. } => panic!("use of freed HeapId {}", id.0),
        }
    }

    pub fn get_mut(&mut self, id: HeapId) -> &mut dyn Any {
        match &mut self.entries[id.0] {
            Entry::Occupied(slot) => slot.data.as_mut(),
            Entry::Free { .. } => panic!("use of freed HeapId {}", id.0),
        }
    }

    pub fn type_id_of(&self, id: HeapId) -> TypeId {
        self.header(id).type_id
    }

    /// Clears every mark bit, then marks everything transitively reachable
    /// from `roots` by consulting each object's registered `mark-children`
    /// callback.
    pub fn mark_from_roots(&mut self, roots: &[HeapId], registry: &TypeRegistry) {
        for entry in &self.entries {
            if let Entry::Occupied(slot) = entry {
                slot.header.unmark();
            }
        }

        let mut worklist: Vec<HeapId> = roots.to_vec();
        while let Some(id) = worklist.pop() {
            let header_marked = self.header(id).is_marked();
            if header_marked {
                continue;
            }
            self.header(id).mark();

            let type_id = self.type_id_of(id);
            let Some(entry) = registry.lookup(type_id) else { continue };
            let data = self.get(id);
            let mut children = Vec::new();
            (entry.mark_children)(data, self, &mut |child| children.push(child));
            worklist.extend(children);
        }
    }

    /// Invokes `free` on every unmarked live object and returns its slot to
    /// the free list. Call after [`Heap::mark_from_roots`].
    pub fn sweep(&mut self, registry: &TypeRegistry) {
        for index in 0..self.entries.len() {
            let should_free = matches!(&self.entries[index], Entry::Occupied(slot) if !slot.header.is_marked());
            if !should_free {
                continue;
            }
            if let Entry::Occupied(mut slot) = std::mem::replace(&mut self.entries[index], Entry::Free { next_free: self.free_head })
            {
                if let Some(entry) = registry.lookup(slot.header.type_id) {
                    (entry.free)(slot.data.as_mut());
                }
            }
            self.free_head = Some(index);
        }
    }

    /// Invokes `free` on every live object regardless of mark state; used
    /// at process teardown per the type registry's lifecycle.
    pub fn free_all(&mut self, registry: &TypeRegistry) {
        for entry in &mut self.entries {
            if let Entry::Occupied(slot) = entry {
                if let Some(type_entry) = registry.lookup(slot.header.type_id) {
                    (type_entry.free)(slot.data.as_mut());
                }
            }
        }
        self.entries.clear();
        self.free_head = None;
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e, Entry::Occupied(_))).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_mark(_: &dyn Any, _: &Heap, _: &mut dyn FnMut(HeapId)) {}
    fn noop_free(_: &mut dyn Any) {}
    fn size_of_i64(_: &dyn Any) -> usize {
        std::mem::size_of::<i64>()
    }
    fn print_i64(data: &dyn Any) -> String {
        data.downcast_ref::<i64>().map(|v| v.to_string()).unwrap_or_default()
    }

    #[test]
    fn allocate_reuses_freed_slots() {
        let mut registry = TypeRegistry::new();
        let type_id = registry.register(TypeEntry {
            name: "int",
            print: print_i64,
            mark_children: noop_mark,
            free: noop_free,
            size: size_of_i64,
            hash: None,
            compare: None,
        });
        let mut heap = Heap::new();
        let a = heap.allocate(type_id, Box::new(1_i64));
        let b = heap.allocate(type_id, Box::new(2_i64));
        assert_eq!(heap.len(), 2);

        heap.mark_from_roots(&[b], &registry);
        heap.sweep(&registry);
        assert_eq!(heap.len(), 1);

        let c = heap.allocate(type_id, Box::new(3_i64));
        assert_eq!(c.index(), a.index());
    }
}
