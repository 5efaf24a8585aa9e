//! Rule contract and outcomes.
//!
//! A rule is a named, prioritized unit of domain logic. It declares whether
//! it applies to a (context, command) pair and, when applied, mutates
//! entities and scratch and returns a structured outcome. Rules are
//! stateless: all inter-rule data flows through the context's scratch space,
//! and a rule's `consumes`/`produces` declarations make that wiring
//! checkable at chain-build time.

pub mod engine;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::Command;
use crate::core::{ContextError, GameContext, ScratchKey, ScratchValue};
use crate::dice::DiceError;

pub use engine::{
    ChainError, CommandPhase, CommandReport, EngineConfig, FailurePolicy, RecordedOutcome,
    ResolveError, RuleChain, RuleEngine,
};

/// Internal error surfaced by a rule's `apply`.
///
/// The engine never propagates these to its caller; they are converted into
/// a fatal failure outcome recorded in the command report.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Dice(#[from] DiceError),
    #[error("{0}")]
    Rule(String),
}

/// Structured result of applying one rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Did the rule's domain logic succeed?
    pub success: bool,

    /// Human-readable account of what happened.
    pub message: String,

    /// On failure, abort the rest of the chain?
    pub fatal: bool,

    /// Payload the rule published, if any.
    pub data: Option<ScratchValue>,

    /// Scratch key the payload was published under, if any.
    pub context_key: Option<ScratchKey>,
}

impl RuleOutcome {
    /// A successful outcome.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            fatal: false,
            data: None,
            context_key: None,
        }
    }

    /// A non-fatal failure: recorded, later rules still run.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            fatal: false,
            data: None,
            context_key: None,
        }
    }

    /// A fatal failure: halts the chain for this command.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            fatal: true,
            data: None,
            context_key: None,
        }
    }

    /// Attach the payload this outcome published and where.
    #[must_use]
    pub fn published(mut self, key: impl Into<ScratchKey>, data: ScratchValue) -> Self {
        self.context_key = Some(key.into());
        self.data = Some(data);
        self
    }
}

/// A prioritized, conditionally-applicable unit of domain logic.
///
/// ## Contract
///
/// - `priority` is part of the rule's identity: lower runs first, the order
///   must be total per command kind (ties break by registration order), and
///   it must be stable across runs.
/// - `can_apply` must be a pure predicate — no context mutation, no rolls.
///   Typically: the command kind matches and the previous stage's scratch
///   key is present with the expected shape.
/// - `apply` may mutate entities and scratch. Recoverable domain failures
///   are `Ok` outcomes with `success: false`; `Err` is for internal errors
///   and aborts the chain.
pub trait Rule {
    /// Unique name, used in reports and diagnostics.
    fn name(&self) -> &str;

    /// Execution priority. Lower runs first.
    fn priority(&self) -> i32;

    /// Which command kind's chain this rule belongs to.
    fn command_kind(&self) -> crate::command::CommandKind;

    /// Scratch keys this rule reads from earlier stages.
    fn consumes(&self) -> Vec<ScratchKey> {
        Vec::new()
    }

    /// Scratch keys this rule publishes for later stages.
    fn produces(&self) -> Vec<ScratchKey> {
        Vec::new()
    }

    /// Does this rule apply to the given (context, command) pair?
    fn can_apply(&self, ctx: &GameContext, cmd: &dyn Command) -> bool;

    /// Apply the rule, mutating context state and returning an outcome.
    fn apply(&self, ctx: &mut GameContext, cmd: &dyn Command) -> Result<RuleOutcome, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        let ok = RuleOutcome::success("hit");
        assert!(ok.success);
        assert!(!ok.fatal);

        let soft = RuleOutcome::failure("missed");
        assert!(!soft.success);
        assert!(!soft.fatal);

        let hard = RuleOutcome::fatal("no grapple context found");
        assert!(!hard.success);
        assert!(hard.fatal);
    }

    #[test]
    fn test_outcome_published() {
        let outcome = RuleOutcome::success("hit")
            .published("grapple.attack", ScratchValue::Flag(true));

        assert_eq!(outcome.context_key, Some(ScratchKey::new("grapple.attack")));
        assert_eq!(outcome.data, Some(ScratchValue::Flag(true)));
    }

    #[test]
    fn test_engine_error_from_context_error() {
        let err: EngineError = ContextError::EntityNotFound {
            id: crate::core::EntityId::new("ghost"),
        }
        .into();

        assert!(err.to_string().contains("ghost"));
    }
}
