//! # ttrpg-rules
//!
//! A deterministic rules engine for tabletop RPG action resolution.
//!
//! ## Design Principles
//!
//! 1. **Rules don't call rules**: every piece of domain logic is a small,
//!    prioritized [`Rule`] communicating only through the context's typed
//!    scratch space. A chain is a state machine expressed as scratch keys.
//!
//! 2. **Commands validate, rules resolve**: a [`Command`] checks its own
//!    parameters (reporting every violation at once) and seeds the context;
//!    the authoritative outcome always comes from the rule chain.
//!
//! 3. **No hidden randomness**: all rolls go through the context's
//!    [`DiceRng`], so a whole session replays byte-for-byte from
//!    (seed + command sequence).
//!
//! ## Architecture
//!
//! Caller constructs a command → the command validates and publishes its
//! seed facts → the [`RuleEngine`] walks the command kind's chain in
//! ascending priority order, gating each rule on `can_apply` → rules mutate
//! entities and scratch, each reading prior stages' writes → the engine
//! aggregates a [`CommandReport`], short-circuiting on fatal failure.
//!
//! ## Modules
//!
//! - `core`: entities, game context, typed scratch protocol, dice RNG
//! - `dice`: dice-notation parsing and rolling
//! - `command`: command contract, kinds, validation
//! - `rules`: rule contract, chains, and the engine
//! - `games`: reference rulesets exercising the whole core

pub mod command;
pub mod core;
pub mod dice;
pub mod games;
pub mod rules;

// Re-export commonly used types
pub use crate::core::{
    AttributeKey, AttributeValue, Attributes, ContextError, ContextSnapshot, DiceRng,
    DiceRngState, Entity, EntityId, EntityKind, GameContext, KeyRegistry, RngMode, ScratchKey,
    ScratchKind, ScratchValue,
};

pub use crate::dice::{DiceError, DiceExpression, RollOutcome};

pub use crate::command::{Command, CommandKind, TargetList, ValidationErrors, Validator, Violation};

pub use crate::rules::{
    ChainError, CommandPhase, CommandReport, EngineConfig, EngineError, FailurePolicy,
    RecordedOutcome, ResolveError, Rule, RuleChain, RuleEngine, RuleOutcome,
};
