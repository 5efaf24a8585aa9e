//! Shared game context: entity store, scratch space, and the dice stream.
//!
//! One `GameContext` is the single source of truth for a table. Rules
//! communicate exclusively through it:
//!
//! - **Entities** are stored by id and mutated in place through accessors.
//! - **Scratch** is a per-command key-value space; a command seeds it, each
//!   rule reads earlier rules' writes and publishes its own. Writes are
//!   checked against the [`KeyRegistry`].
//! - **Dice** are threaded through the context so every roll in a session is
//!   attributable to the context's (seed, call index).
//!
//! The engine clears scratch around each command; callers must serialize
//! commands against one context (no internal locking).

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::{Entity, EntityId};
use super::rng::{DiceRng, DiceRngState, RngMode};
use super::scratch::{KeyRegistry, ScratchKey, ScratchKind, ScratchValue};

/// Errors from context accessors.
#[derive(Debug, Error, PartialEq)]
pub enum ContextError {
    #[error("Scratch key '{key}' is not registered")]
    UnknownKey { key: ScratchKey },
    #[error("Scratch key '{key}' expects {expected} payloads, got {actual}")]
    KindMismatch {
        key: ScratchKey,
        expected: ScratchKind,
        actual: ScratchKind,
    },
    #[error("No entity with id '{id}'")]
    EntityNotFound { id: EntityId },
}

/// Shared mutable state for command resolution.
pub struct GameContext {
    entities: FxHashMap<EntityId, Entity>,
    scratch: FxHashMap<ScratchKey, ScratchValue>,
    registry: KeyRegistry,
    dice: DiceRng,
}

impl GameContext {
    /// Create a new context with the given key registry and RNG mode.
    #[must_use]
    pub fn new(registry: KeyRegistry, mode: RngMode) -> Self {
        Self {
            entities: FxHashMap::default(),
            scratch: FxHashMap::default(),
            registry,
            dice: DiceRng::new(mode),
        }
    }

    /// Create a context with a fixed seed (deterministic simulation/tests).
    #[must_use]
    pub fn seeded(registry: KeyRegistry, seed: u64) -> Self {
        Self::new(registry, RngMode::Seeded(seed))
    }

    // === Entities ===

    /// Insert or replace an entity (last-writer-wins on id collision).
    pub fn put_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    /// Get an entity by id.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Get a mutable entity by id.
    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Get an entity by id, or an error naming the missing id.
    pub fn require_entity(&self, id: &str) -> Result<&Entity, ContextError> {
        self.entity(id).ok_or_else(|| ContextError::EntityNotFound {
            id: EntityId::new(id),
        })
    }

    /// Get a mutable entity by id, or an error naming the missing id.
    pub fn require_entity_mut(&mut self, id: &str) -> Result<&mut Entity, ContextError> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| ContextError::EntityNotFound {
                id: EntityId::new(id),
            })
    }

    /// Check whether an entity exists.
    #[must_use]
    pub fn has_entity(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Iterate over all entity ids.
    pub fn entity_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    /// Number of stored entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // === Scratch ===

    /// Read a scratch value.
    #[must_use]
    pub fn scratch(&self, key: &ScratchKey) -> Option<&ScratchValue> {
        self.scratch.get(key)
    }

    /// Write a scratch value.
    ///
    /// The key must be registered and the value's kind must match the
    /// registration; anything else is a wiring bug reported as an error
    /// rather than stored.
    pub fn set_scratch(
        &mut self,
        key: impl Into<ScratchKey>,
        value: impl Into<ScratchValue>,
    ) -> Result<(), ContextError> {
        let key = key.into();
        let value = value.into();

        let expected = self
            .registry
            .kind_of(&key)
            .ok_or_else(|| ContextError::UnknownKey { key: key.clone() })?;
        if value.kind() != expected {
            return Err(ContextError::KindMismatch {
                key,
                expected,
                actual: value.kind(),
            });
        }

        self.scratch.insert(key, value);
        Ok(())
    }

    /// Check whether a scratch key currently holds a value.
    #[must_use]
    pub fn has_scratch(&self, key: &ScratchKey) -> bool {
        self.scratch.contains_key(key)
    }

    /// Number of live scratch entries.
    #[must_use]
    pub fn scratch_len(&self) -> usize {
        self.scratch.len()
    }

    /// Clear the scratch space (done by the engine around each command).
    pub fn clear_scratch(&mut self) {
        self.scratch.clear();
    }

    /// The key registry this context validates writes against.
    #[must_use]
    pub fn key_registry(&self) -> &KeyRegistry {
        &self.registry
    }

    // === Dice ===

    /// The context's dice stream.
    #[must_use]
    pub fn dice(&self) -> &DiceRng {
        &self.dice
    }

    /// Mutable access to the dice stream (rules roll through this).
    pub fn dice_mut(&mut self) -> &mut DiceRng {
        &mut self.dice
    }

    // === Snapshot ===

    /// Deterministic snapshot of durable state.
    ///
    /// Entities are emitted in id order and the RNG state is included, so
    /// two runs of the same seed and command sequence serialize to identical
    /// bytes. Scratch is excluded: it is per-command and empty between
    /// commands.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            entities: self
                .entities
                .iter()
                .map(|(id, e)| (id.clone(), e.clone()))
                .collect(),
            rng: self.dice.state(),
        }
    }
}

/// Serializable view of a context's durable state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Entities ordered by id.
    pub entities: BTreeMap<EntityId, Entity>,
    /// Dice stream state (seed, position, call count).
    pub rng: DiceRngState,
}
