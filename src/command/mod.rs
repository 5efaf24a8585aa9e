//! Commands: validated requests to perform one game action.
//!
//! A command is an immutable parameter bundle (actor, targets, parameters)
//! that validates itself, publishes its seed facts into the context's
//! scratch space, and hands resolution to the rule engine. Commands never
//! compute game outcomes — that is the rule chain's job — but they are the
//! only component allowed to reject input outright before any rule runs.
//!
//! Validation collects **all** violations before reporting, so a caller
//! fixing a malformed command sees every problem at once.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::core::{ContextError, EntityId, GameContext};

/// Closed set of command identifiers.
///
/// This enum is the dispatch contract between commands and rules: rules
/// match on it in `can_apply`, and the engine keys chains by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Attack,
    Grapple,
    Move,
    CastSpell,
    CreateCharacter,
    RecruitHenchman,
}

impl CommandKind {
    /// Stable string form, used in diagnostics and scratch key names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CommandKind::Attack => "attack",
            CommandKind::Grapple => "grapple",
            CommandKind::Move => "move",
            CommandKind::CastSpell => "cast-spell",
            CommandKind::CreateCharacter => "create-character",
            CommandKind::RecruitHenchman => "recruit-henchman",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One parameter violation found during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Which parameter is invalid.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Aggregated validation failure: every violation, not just the first.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Command validation failed with {} violation(s)", violations.len())]
pub struct ValidationErrors {
    pub violations: Vec<Violation>,
}

/// Collector for validation violations.
///
/// ```
/// use ttrpg_rules::command::Validator;
///
/// let mut v = Validator::new();
/// v.require(false, "actor", "must not be empty");
/// v.require(false, "targets", "grapple takes exactly one target");
/// let errors = v.finish().unwrap_err();
/// assert_eq!(errors.violations.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record a violation unless the condition holds.
    pub fn require(&mut self, condition: bool, field: impl Into<String>, message: impl Into<String>) {
        if !condition {
            self.push(field, message);
        }
    }

    /// Finish validation: `Ok(())` if nothing was recorded.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                violations: self.violations,
            })
        }
    }
}

/// Target id list. Inline capacity covers the common 0-2 target case.
pub type TargetList = SmallVec<[EntityId; 2]>;

/// A validated request to perform one game action.
///
/// Lifecycle: constructed by the caller, validated, executed once against a
/// context by the engine, then discarded. Retry means issuing a new command.
pub trait Command {
    /// Which kind of action this is.
    fn kind(&self) -> CommandKind;

    /// The acting entity.
    fn actor(&self) -> &EntityId;

    /// Target entities, possibly empty.
    fn targets(&self) -> &[EntityId];

    /// Names of the rules this command expects to cover it.
    ///
    /// Documentation of intended coverage, used for diagnostics; the engine
    /// selects rules by `can_apply`, not by this list.
    fn required_rules(&self) -> &[&str] {
        &[]
    }

    /// Check parameters, collecting every violation.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Cheap, side-effect-free precondition check against live state.
    ///
    /// The default requires the actor and all targets to exist. Domain
    /// commands layer blocking-status checks on top.
    fn can_execute(&self, ctx: &GameContext) -> bool {
        ctx.has_entity(self.actor().as_str())
            && self.targets().iter().all(|t| ctx.has_entity(t.as_str()))
    }

    /// Publish the command's seed facts into scratch under its documented
    /// key(s). Called by the engine after validation and preconditions pass.
    fn publish(&self, ctx: &mut GameContext) -> Result<(), ContextError>;
}
