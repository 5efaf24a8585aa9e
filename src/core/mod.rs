//! Core engine primitives: entities, context, scratch protocol, and RNG.

pub mod context;
pub mod entity;
pub mod rng;
pub mod scratch;

pub use context::{ContextError, ContextSnapshot, GameContext};
pub use entity::{AttributeKey, AttributeValue, Attributes, Entity, EntityId, EntityKind};
pub use rng::{DiceRng, DiceRngState, RngMode};
pub use scratch::{KeyRegistry, ScratchKey, ScratchKind, ScratchValue};
