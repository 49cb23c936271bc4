//! Builtin class registration (spec component F) and the example domain
//! types that plug into it via the type registry and veneer table
//! (components B and E).

pub mod discretization;

use ahash::AHashMap;

use crate::error::ClassError;
use crate::types::class::{Callable, ClassArena, ClassUid};

/// Bitmask of flags accompanying a method entry in a [`ClassDefinition`].
/// Mirrors the original sources' method-flag bitmask; only the flag this
/// core cares about (static dispatch) is modeled here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodFlags(u32);

impl MethodFlags {
    pub const NONE: MethodFlags = MethodFlags(0);
    pub const STATIC: MethodFlags = MethodFlags(1 << 0);

    pub fn contains(self, other: MethodFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for MethodFlags {
    type Output = MethodFlags;
    fn bitor(self, rhs: MethodFlags) -> MethodFlags {
        MethodFlags(self.0 | rhs.0)
    }
}

/// A single method entry in a static class-definition bundle.
pub struct MethodEntry {
    pub name: &'static str,
    pub callable: Callable,
    pub flags: MethodFlags,
}

/// A static class-definition bundle, consumed by [`register_builtin_class`].
pub struct ClassDefinition {
    pub name: &'static str,
    pub methods: Vec<MethodEntry>,
    pub parent: Option<&'static str>,
}

/// Registers `definition` into `arena` and `global_env`: creates a runtime
/// class, inserts every method, links the parent (if any, triggering
/// linearization), and installs the class under its name.
///
/// Duplicate name or missing parent are fatal during initialization, per
/// the spec's error-handling design — this aborts only this class's
/// registration, leaving previously registered classes unaffected.
pub fn register_builtin_class(
    arena: &mut ClassArena,
    global_env: &mut AHashMap<String, ClassUid>,
    definition: ClassDefinition,
) -> Result<ClassUid, ClassError> {
    if global_env.contains_key(definition.name) {
        return Err(ClassError::DuplicateName(definition.name.to_string()));
    }

    let parent_uid = match definition.parent {
        Some(parent_name) => {
            let uid = global_env.get(parent_name).copied().ok_or_else(|| ClassError::MissingParent(parent_name.to_string()))?;
            Some(uid)
        }
        None => None,
    };

    let class = arena.new_class(definition.name);
    for method in definition.methods {
        arena.add_method(class, method.name, method.callable);
    }
    if let Some(parent_uid) = parent_uid {
        arena.add_parent(class, parent_uid)?;
    }

    global_env.insert(definition.name.to_string(), class);
    Ok(class)
}
