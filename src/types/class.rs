use ahash::AHashMap;

use crate::error::{DispatchError, LinearizationError};
use crate::resource::{MAX_INHERITANCE_DEPTH, MAX_MRO_LENGTH};
use crate::value::Value;

/// Monotonically assigned non-zero integer, stable per class for the
/// lifetime of the process. Distinct from a heap slot index, which may be
/// reused once an object is swept; a class's uid never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ClassUid(u64);

impl ClassUid {
    #[doc(hidden)]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A method implementation: either a host-builtin function or a reference
/// to a user bytecode closure living on the heap. Native methods take the
/// heap explicitly (rather than a receiver-bound closure) so they can
/// allocate or inspect objects, matching the original sources' C-function
/// method shape `(vm, nargs, args)`. Stored behind `Rc` so a builtin that
/// closes over registration-time state (such as its own type id) can still
/// be cloned along with the class that owns it.
#[derive(Clone)]
pub enum Callable {
    Native(std::rc::Rc<dyn Fn(&mut crate::heap::Heap, &[Value]) -> Value>),
    Closure(crate::heap::HeapId),
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native(_) => f.write_str("Callable::Native(..)"),
            Self::Closure(id) => f.debug_tuple("Callable::Closure").field(id).finish(),
        }
    }
}

impl Callable {
    pub fn native(f: impl Fn(&mut crate::heap::Heap, &[Value]) -> Value + 'static) -> Self {
        Self::Native(std::rc::Rc::new(f))
    }
}

/// Runtime class: name, method table, parents, children, linearization.
///
/// Per design note 9, edges between classes are stored as [`ClassUid`]s
/// rather than as owning handles: `parents` are structural edges, `children`
/// are weak back-edges kept only for reverse lookup and must not extend a
/// class's lifetime.
#[derive(Debug, Clone)]
pub struct ClassObject {
    name: String,
    methods: AHashMap<String, Callable>,
    parents: Vec<ClassUid>,
    children: Vec<ClassUid>,
    superclass: Option<ClassUid>,
    linearization: Vec<ClassUid>,
    uid: ClassUid,
}

impl ClassObject {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &AHashMap<String, Callable> {
        &self.methods
    }

    pub fn parents(&self) -> &[ClassUid] {
        &self.parents
    }

    pub fn children(&self) -> &[ClassUid] {
        &self.children
    }

    pub fn superclass(&self) -> Option<ClassUid> {
        self.superclass
    }

    pub fn linearization(&self) -> &[ClassUid] {
        &self.linearization
    }

    pub fn uid(&self) -> ClassUid {
        self.uid
    }

    /// Visits every value reachable from this class for GC marking: the
    /// interned name is not heap-allocated here so only method closures are
    /// visited. Parent and child references are followed by the arena
    /// itself (they are uid-keyed, not heap references) and are therefore
    /// not part of this callback; children in particular are weak and must
    /// never be treated as roots.
    pub fn mark_methods(&self, mut visit: impl FnMut(crate::heap::HeapId)) {
        for callable in self.methods.values() {
            if let Callable::Closure(id) = callable {
                visit(*id);
            }
        }
    }
}

/// Arena of classes keyed by [`ClassUid`], per design note 9's recommended
/// structure for cyclic parent/child references without ownership cycles.
#[derive(Debug, Default)]
pub struct ClassArena {
    classes: AHashMap<ClassUid, ClassObject>,
    next_uid: u64,
}

impl ClassArena {
    pub fn new() -> Self {
        Self { classes: AHashMap::default(), next_uid: 1 }
    }

    /// Allocates a class with empty methods, parents, children; superclass
    /// unset. The uid is assigned here (monotonically), matching the
    /// spec's "caller assigns" note where the caller is the arena itself.
    pub fn new_class(&mut self, name: impl Into<String>) -> ClassUid {
        let uid = ClassUid(self.next_uid);
        self.next_uid += 1;
        let class = ClassObject {
            name: name.into(),
            methods: AHashMap::default(),
            parents: Vec::new(),
            children: Vec::new(),
            superclass: None,
            linearization: vec![uid],
            uid,
        };
        self.classes.insert(uid, class);
        uid
    }

    pub fn get(&self, uid: ClassUid) -> Option<&ClassObject> {
        self.classes.get(&uid)
    }

    pub fn get_mut(&mut self, uid: ClassUid) -> Option<&mut ClassObject> {
        self.classes.get_mut(&uid)
    }

    /// Inserts `callable` under `name`, replacing any previous entry.
    pub fn add_method(&mut self, class: ClassUid, name: impl Into<String>, callable: Callable) {
        if let Some(class) = self.classes.get_mut(&class) {
            class.methods.insert(name.into(), callable);
        }
    }

    /// Appends `parent` to `child.parents`, appends `child` to
    /// `parent.children`, sets `child.superclass` if this is the first
    /// parent, then recomputes `child`'s linearization.
    pub fn add_parent(&mut self, child: ClassUid, parent: ClassUid) -> Result<(), LinearizationError> {
        {
            let child_class = self.classes.get_mut(&child).expect("child class must exist");
            child_class.parents.push(parent);
            if child_class.superclass.is_none() {
                child_class.superclass = Some(parent);
            }
        }
        if let Some(parent_class) = self.classes.get_mut(&parent) {
            parent_class.children.push(child);
        }
        self.relinearize(child)
    }

    /// Recomputes and stores `class`'s linearization via the C3 merge.
    pub fn relinearize(&mut self, class: ClassUid) -> Result<(), LinearizationError> {
        let parents = self.classes.get(&class).expect("class must exist").parents.clone();
        let linearization = compute_c3_linearization(class, &parents, self)?;
        self.classes.get_mut(&class).expect("class must exist").linearization = linearization;
        Ok(())
    }

    /// Iterates `class.linearization` in order, returning the first method
    /// found. Absence is a recoverable condition, not an error.
    pub fn resolve(&self, class: ClassUid, name: &str) -> Option<&Callable> {
        let class = self.classes.get(&class)?;
        for &ancestor in &class.linearization {
            if let Some(ancestor_class) = self.classes.get(&ancestor) {
                if let Some(callable) = ancestor_class.methods.get(name) {
                    return Some(callable);
                }
            }
        }
        None
    }

    /// As [`ClassArena::resolve`], but turns a miss into a [`DispatchError`]
    /// carrying the `CLASS_INVK` tag a VM surfaces to user-level
    /// `try`/`catch`, per the runtime-dispatch-miss error-handling design.
    pub fn resolve_or_dispatch_error(&self, class: ClassUid, name: &str) -> Result<&Callable, DispatchError> {
        self.resolve(class, name).ok_or_else(|| DispatchError {
            class_name: self.get(class).map(|c| c.name().to_string()).unwrap_or_default(),
            method_name: name.to_string(),
        })
    }
}

/// C3 linearization: `L(K) = [K] ⊕ merge(L(P1), ..., L(Pn), [P1, ..., Pn])`.
///
/// The final `[P1, ..., Pn]` entry is required for monotonicity and is the
/// behavioral fix design note 9 calls for over the original sources, which
/// omit it.
pub fn compute_c3_linearization(
    class: ClassUid,
    parents: &[ClassUid],
    arena: &ClassArena,
) -> Result<Vec<ClassUid>, LinearizationError> {
    if parents.is_empty() {
        return Ok(vec![class]);
    }

    if parents.contains(&class) {
        let name = arena.get(class).map(|c| c.name().to_string()).unwrap_or_default();
        return Err(LinearizationError::SelfInheritance { class: name });
    }

    let mut linearizations: Vec<Vec<ClassUid>> = Vec::with_capacity(parents.len() + 1);
    for &parent in parents {
        let parent_class = arena.get(parent).expect("parent class must exist");
        linearizations.push(parent_class.linearization.clone());
    }
    for lin in &linearizations {
        if lin.len() > MAX_INHERITANCE_DEPTH {
            return Err(LinearizationError::InheritanceTooDeep { limit: MAX_INHERITANCE_DEPTH });
        }
    }

    // The parent-order list itself, included as a final merge input.
    linearizations.push(parents.to_vec());

    let mut result = vec![class];
    loop {
        linearizations.retain(|l| !l.is_empty());
        if linearizations.is_empty() {
            break;
        }

        // Candidate heads are considered in the order the input lists are
        // presented; within a step the first good head wins.
        let mut found = None;
        for lin in &linearizations {
            let candidate = lin[0];
            let in_tail = linearizations.iter().any(|other| other[1..].contains(&candidate));
            if !in_tail {
                found = Some(candidate);
                break;
            }
        }

        match found {
            Some(head) => {
                result.push(head);
                for lin in &mut linearizations {
                    if lin.first() == Some(&head) {
                        lin.remove(0);
                    }
                }
            }
            None => {
                let parent_names =
                    parents.iter().map(|&uid| arena.get(uid).map(|c| c.name().to_string()).unwrap_or_default()).collect();
                let class_name = arena.get(class).map(|c| c.name().to_string()).unwrap_or_default();
                return Err(LinearizationError::Inconsistent { class: class_name, parents: parent_names });
            }
        }

        if result.len() > MAX_MRO_LENGTH {
            return Err(LinearizationError::MroTooLong { limit: MAX_MRO_LENGTH });
        }
    }

    Ok(result)
}
