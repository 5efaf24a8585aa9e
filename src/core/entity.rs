//! Game entities: characters, monsters, and items.
//!
//! The engine stores entities by id and never interprets their fields.
//! Domain rules read and write attributes; the engine only guarantees
//! identity, the kind discriminant, and accessor-based mutation.
//!
//! ## AttributeValue Types
//!
//! - `Int`: Numbers (strength, hit points, armour class)
//! - `Bool`: Flags (undead, cursed)
//! - `Text`: Strings (class, alignment)
//! - `IntList`: Number lists (saving throw rows)
//! - `TextList`: String lists (languages, proficiencies)

use std::borrow::Borrow;
use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Stable identifier for a game entity.
///
/// Ids are opaque strings chosen by domain code (e.g. `"char-001"`).
/// The engine only stores and compares them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new entity id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entity kind discriminant, set at creation time.
///
/// Domain code dispatches on this instead of probing for field shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Character,
    Monster,
    Item,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Character => write!(f, "character"),
            EntityKind::Monster => write!(f, "monster"),
            EntityKind::Item => write!(f, "item"),
        }
    }
}

/// Key for accessing entity attributes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeKey(pub String);

impl AttributeKey {
    /// Create a new attribute key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl From<&str> for AttributeKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AttributeKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Value for an entity attribute.
///
/// Game-specific; the engine never interprets these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Integer value (strength, hit points).
    Int(i64),
    /// Boolean flag (undead, cursed).
    Bool(bool),
    /// Text value (class, alignment).
    Text(String),
    /// List of integers (saving throw rows).
    IntList(Vec<i64>),
    /// List of strings (languages, proficiencies).
    TextList(Vec<String>),
}

impl AttributeValue {
    /// Get as integer if this is an Int value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as bool if this is a Bool value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string reference if this is a Text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as int list reference if this is an IntList value.
    #[must_use]
    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            AttributeValue::IntList(v) => Some(v),
            _ => None,
        }
    }

    /// Get as text list reference if this is a TextList value.
    #[must_use]
    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            AttributeValue::TextList(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Int(v as i64)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

/// Collection of attributes.
pub type Attributes = FxHashMap<AttributeKey, AttributeValue>;

/// A game entity record.
///
/// Created by domain code, mutated in place by rules through
/// [`GameContext`](crate::core::GameContext) accessors, never destroyed by
/// the engine itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable id, unique within a context.
    pub id: EntityId,

    /// Kind discriminant, fixed at creation.
    pub kind: EntityKind,

    /// Display name (for messages and diagnostics).
    pub name: String,

    /// Game-specific attributes. Opaque to the engine.
    pub attributes: Attributes,

    /// Active status effects (e.g. `"Grappled"`).
    /// BTreeSet keeps serialized snapshots order-stable.
    pub statuses: BTreeSet<String>,
}

impl Entity {
    /// Create a new entity with no attributes or statuses.
    pub fn new(id: impl Into<EntityId>, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            attributes: Attributes::default(),
            statuses: BTreeSet::new(),
        }
    }

    /// Set an attribute, builder-style.
    #[must_use]
    pub fn with_attribute(
        mut self,
        key: impl Into<AttributeKey>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Get an attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(&AttributeKey::new(key))
    }

    /// Get an integer attribute with a default.
    #[must_use]
    pub fn int_attribute(&self, key: &str, default: i64) -> i64 {
        self.attribute(key).and_then(AttributeValue::as_int).unwrap_or(default)
    }

    /// Set an attribute.
    pub fn set_attribute(
        &mut self,
        key: impl Into<AttributeKey>,
        value: impl Into<AttributeValue>,
    ) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Add a status effect. Returns true if it was not already present.
    pub fn add_status(&mut self, status: impl Into<String>) -> bool {
        self.statuses.insert(status.into())
    }

    /// Remove a status effect. Returns true if it was present.
    pub fn remove_status(&mut self, status: &str) -> bool {
        self.statuses.remove(status)
    }

    /// Check for a status effect.
    #[must_use]
    pub fn has_status(&self, status: &str) -> bool {
        self.statuses.contains(status)
    }
}
