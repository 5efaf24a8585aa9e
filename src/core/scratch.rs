//! Typed scratch-space protocol between chained rules.
//!
//! Rules never call each other. The only channel between them is the
//! context's scratch store, keyed by [`ScratchKey`]. Historically that kind
//! of store is a free-form string map and the key/payload agreement lives in
//! developers' heads; here every key is registered up front with the payload
//! kind it carries, and writes are checked against the registry.
//!
//! A chain's real wiring diagram is therefore explicit: each rule declares
//! which keys it consumes and produces, and the engine verifies at build time
//! that every producer runs before its consumers.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::dice::RollOutcome;

/// Key into the scratch store.
///
/// Keys follow a `"<command>.<stage>"` convention (e.g. `"grapple.attack"`)
/// but the engine only compares them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScratchKey(String);

impl ScratchKey {
    /// Create a new scratch key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScratchKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for ScratchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload kind tag for a registered key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScratchKind {
    Int,
    Flag,
    Text,
    Roll,
    Record,
}

impl std::fmt::Display for ScratchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScratchKind::Int => write!(f, "int"),
            ScratchKind::Flag => write!(f, "flag"),
            ScratchKind::Text => write!(f, "text"),
            ScratchKind::Roll => write!(f, "roll"),
            ScratchKind::Record => write!(f, "record"),
        }
    }
}

/// A scratch payload.
///
/// Sum type of everything rules pass to each other. `Record` covers
/// multi-field stage results; its map is ordered so snapshots are stable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScratchValue {
    /// Integer value (damage totals, margins).
    Int(i64),
    /// Boolean flag (hit/miss).
    Flag(bool),
    /// Text value (chosen option, entity id).
    Text(String),
    /// A dice roll outcome.
    Roll(RollOutcome),
    /// Multi-field stage result.
    Record(BTreeMap<String, ScratchValue>),
}

impl ScratchValue {
    /// The kind tag for this value.
    #[must_use]
    pub fn kind(&self) -> ScratchKind {
        match self {
            ScratchValue::Int(_) => ScratchKind::Int,
            ScratchValue::Flag(_) => ScratchKind::Flag,
            ScratchValue::Text(_) => ScratchKind::Text,
            ScratchValue::Roll(_) => ScratchKind::Roll,
            ScratchValue::Record(_) => ScratchKind::Record,
        }
    }

    /// Build a record from field pairs.
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, ScratchValue)>) -> Self {
        ScratchValue::Record(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    /// Get as integer if this is an Int value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScratchValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as bool if this is a Flag value.
    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ScratchValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string reference if this is a Text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScratchValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as roll outcome reference if this is a Roll value.
    #[must_use]
    pub fn as_roll(&self) -> Option<&RollOutcome> {
        match self {
            ScratchValue::Roll(r) => Some(r),
            _ => None,
        }
    }

    /// Get a record field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ScratchValue> {
        match self {
            ScratchValue::Record(map) => map.get(name),
            _ => None,
        }
    }

    /// Get a record field as an integer.
    #[must_use]
    pub fn int_field(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(ScratchValue::as_int)
    }

    /// Get a record field as a flag.
    #[must_use]
    pub fn flag_field(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(ScratchValue::as_flag)
    }

    /// Get a record field as text.
    #[must_use]
    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(ScratchValue::as_text)
    }
}

impl From<i64> for ScratchValue {
    fn from(v: i64) -> Self {
        ScratchValue::Int(v)
    }
}

impl From<bool> for ScratchValue {
    fn from(v: bool) -> Self {
        ScratchValue::Flag(v)
    }
}

impl From<&str> for ScratchValue {
    fn from(v: &str) -> Self {
        ScratchValue::Text(v.to_string())
    }
}

impl From<String> for ScratchValue {
    fn from(v: String) -> Self {
        ScratchValue::Text(v)
    }
}

impl From<RollOutcome> for ScratchValue {
    fn from(v: RollOutcome) -> Self {
        ScratchValue::Roll(v)
    }
}

/// Registry of scratch keys and their expected payload kinds.
///
/// Domain modules register their keys at startup; the context refuses writes
/// to unregistered keys or with mismatched kinds, and the engine uses the
/// registry when validating chains.
#[derive(Clone, Debug, Default)]
pub struct KeyRegistry {
    kinds: FxHashMap<ScratchKey, ScratchKind>,
}

impl KeyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key with its payload kind.
    ///
    /// Re-registering the same key with the same kind is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the key is already registered with a different kind.
    /// Registration happens at startup; a kind conflict is a wiring bug.
    pub fn register(&mut self, key: impl Into<ScratchKey>, kind: ScratchKind) {
        let key = key.into();
        if let Some(existing) = self.kinds.get(&key) {
            assert_eq!(
                *existing, kind,
                "Key '{key}' already registered as {existing}, cannot re-register as {kind}"
            );
            return;
        }
        self.kinds.insert(key, kind);
    }

    /// Look up the registered kind for a key.
    #[must_use]
    pub fn kind_of(&self, key: &ScratchKey) -> Option<ScratchKind> {
        self.kinds.get(key).copied()
    }

    /// Check whether a key is registered.
    #[must_use]
    pub fn contains(&self, key: &ScratchKey) -> bool {
        self.kinds.contains_key(key)
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
