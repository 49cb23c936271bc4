use ahash::AHashMap;

use crate::types::class::ClassUid;
use crate::types::registry::TypeId;

/// Bidirectional association between an object-type id and a class.
///
/// At most one class is bound per type id; the reverse is not required to
/// be unique (a class need not be the veneer for only one type, though the
/// common case is one-to-one). Bindings are established during
/// initialization and never revoked.
#[derive(Debug, Default)]
pub struct VeneerTable {
    by_type: AHashMap<TypeId, ClassUid>,
}

impl VeneerTable {
    pub fn new() -> Self {
        Self { by_type: AHashMap::default() }
    }

    /// Records the association. Returns the class previously bound to
    /// `type_id`, if any — callers that want to enforce at-most-once
    /// binding should treat a `Some` return as an error.
    pub fn bind(&mut self, type_id: TypeId, class: ClassUid) -> Option<ClassUid> {
        self.by_type.insert(type_id, class)
    }

    /// The class bound to `type_id`, if a veneer has been installed. If
    /// none is bound, objects of that type support no user-visible
    /// methods, though the type may still provide print/free behavior via
    /// its [`crate::heap::TypeEntry`].
    pub fn class_for(&self, type_id: TypeId) -> Option<ClassUid> {
        self.by_type.get(&type_id).copied()
    }
}
