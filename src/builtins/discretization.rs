//! Finite-element discretization example object (spec component I):
//! demonstrates a host-defined object type plugged into the type registry
//! and veneer system.

use std::any::Any;

use ahash::AHashMap;

use crate::builtins::{register_builtin_class, ClassDefinition, MethodEntry, MethodFlags};
use crate::error::ClassError;
use crate::heap::{Heap, HeapId, TypeEntry};
use crate::types::class::{Callable, ClassArena, ClassUid};
use crate::types::registry::{TypeId, TypeRegistry};
use crate::types::veneer::VeneerTable;
use crate::value::Value;

/// Topological dimension of a mesh entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Grade {
    Vertex = 0,
    Line = 1,
    Area = 2,
    Volume = 3,
}

/// A discretization entity: a label, a polynomial order, a geometric
/// grade, and a shape vector of length `grade + 1` giving degrees of
/// freedom per grade.
#[derive(Debug, Clone)]
pub struct Discretization {
    pub label: String,
    pub order: u32,
    pub grade: Grade,
    pub shape: Vec<u32>,
}

impl Discretization {
    /// The 1-D Lagrange constructor: accepts an optional integer order
    /// (default 1) and builds `g = Line`, `shape = [1, order - 1]`.
    pub fn lagrange(order: Option<u32>) -> Self {
        let order = order.unwrap_or(1).max(1);
        Self { label: "lagrange".to_string(), order, grade: Grade::Line, shape: vec![1, order - 1] }
    }
}

fn print_discretization(data: &dyn Any) -> String {
    let d = data.downcast_ref::<Discretization>().expect("type id guarantees Discretization payload");
    format!("<{} {}>", d.label, d.order)
}

fn mark_discretization(_: &dyn Any, _: &Heap, _: &mut dyn FnMut(HeapId)) {
    // A discretization's fields are all plain scalars; it references no
    // other heap object.
}

fn free_discretization(_: &mut dyn Any) {}

fn size_discretization(_: &dyn Any) -> usize {
    std::mem::size_of::<Discretization>()
}

/// Registers the `Discretization` object type (component B), then binds a
/// `Discretization` veneer class (component E) whose sole constructor is
/// `Lagrange` and whose sole accessor is `order`, per the open-question
/// resolution in design note 9: assembly (`assemblefieldref`, `value`) has
/// no conforming semantics to expose.
pub fn install(
    registry: &mut TypeRegistry,
    arena: &mut ClassArena,
    veneers: &mut VeneerTable,
    global_env: &mut AHashMap<String, ClassUid>,
) -> Result<(TypeId, ClassUid), ClassError> {
    let type_id = registry.register(TypeEntry {
        name: "Discretization",
        print: print_discretization,
        mark_children: mark_discretization,
        free: free_discretization,
        size: size_discretization,
        hash: None,
        compare: None,
    });

    let definition = ClassDefinition {
        name: "Discretization",
        methods: vec![
            MethodEntry { name: "Lagrange", callable: Callable::native(lagrange_constructor(type_id)), flags: MethodFlags::STATIC },
            MethodEntry { name: "order", callable: Callable::native(order_accessor), flags: MethodFlags::NONE },
        ],
        parent: None,
    };
    let class = register_builtin_class(arena, global_env, definition)?;
    veneers.bind(type_id, class);

    Ok((type_id, class))
}

/// Builds the `Lagrange` constructor closure, capturing the type id this
/// object kind was registered under so it needn't be re-derived per call.
fn lagrange_constructor(type_id: TypeId) -> impl Fn(&mut Heap, &[Value]) -> Value {
    move |heap, args| {
        let order = args.first().and_then(|v| v.as_int()).map(|i| i.max(0) as u32);
        let discretization = Discretization::lagrange(order);
        Value::Object(heap.allocate(type_id, Box::new(discretization)))
    }
}

fn order_accessor(heap: &mut Heap, args: &[Value]) -> Value {
    let Some(Value::Object(id)) = args.first() else { return Value::Nil };
    match heap.get(*id).downcast_ref::<Discretization>() {
        Some(d) => Value::Int(i64::from(d.order)),
        None => Value::Nil,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install_for_test() -> (TypeRegistry, ClassArena, VeneerTable, AHashMap<String, ClassUid>, TypeId) {
        let mut registry = TypeRegistry::new();
        let mut arena = ClassArena::new();
        let mut veneers = VeneerTable::new();
        let mut global_env = AHashMap::default();
        let (type_id, _class) = install(&mut registry, &mut arena, &mut veneers, &mut global_env).unwrap();
        (registry, arena, veneers, global_env, type_id)
    }

    #[test]
    fn lagrange_defaults_to_order_one() {
        let d = Discretization::lagrange(None);
        assert_eq!(d.order, 1);
        assert_eq!(d.grade, Grade::Line);
        assert_eq!(d.shape, vec![1, 0]);
    }

    #[test]
    fn lagrange_order_three_matches_scenario() {
        let d = Discretization::lagrange(Some(3));
        assert_eq!(d.order, 3);
        assert_eq!(d.grade, Grade::Line);
        assert_eq!(d.shape, vec![1, 2]);
        assert_eq!(print_discretization(&d as &dyn Any), "<lagrange 3>");
    }

    #[test]
    fn constructor_and_accessor_round_trip_through_the_heap() {
        let (registry, arena, _veneers, global_env, type_id) = install_for_test();
        let class = *global_env.get("Discretization").unwrap();
        let constructor = match arena.resolve(class, "Lagrange").unwrap() {
            Callable::Native(f) => f.clone(),
            Callable::Closure(_) => panic!("expected native constructor"),
        };
        let accessor = match arena.resolve(class, "order").unwrap() {
            Callable::Native(f) => f.clone(),
            Callable::Closure(_) => panic!("expected native accessor"),
        };

        let mut heap = Heap::new();
        let constructed = (*constructor)(&mut heap, &[Value::Int(3)]);
        assert_eq!((*accessor)(&mut heap, &[constructed]), Value::Int(3));
        assert_eq!(heap.type_id_of(constructed.as_object().unwrap()), type_id);
        assert!(registry.lookup(type_id).is_some());
    }
}
