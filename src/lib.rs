#![doc = "Runtime core for Morpho: class/object model, C3 linearization, veneer bindings, and the parser framework."]
#![expect(clippy::unreadable_literal, reason = "RNG constants keep their canonical hex forms")]

mod context;
mod error;
mod heap;
mod random;
mod resource;
mod value;

pub mod builtins;
pub mod parser;
pub mod types;

pub use context::RuntimeContext;
pub use error::{ClassError, DispatchError, ErrorId, LinearizationError, MorphoError, ParseError};
pub use heap::{Heap, HeapId, ObjectHeader, TypeEntry};
pub use random::{RandomEngine, SplitMix64, Xoshiro256Plus, Xoshiro256PlusPlus};
pub use resource::{MAX_INHERITANCE_DEPTH, MAX_MRO_LENGTH};
pub use types::class::{Callable, ClassArena, ClassObject, ClassUid};
pub use types::registry::{TypeId, TypeRegistry};
pub use types::veneer::VeneerTable;
pub use value::Value;
