//! Rule selection, ordering, and execution.
//!
//! The engine holds one [`RuleChain`] per [`CommandKind`]. Resolving a
//! command walks its chain in ascending priority order, asking each rule
//! `can_apply` immediately before executing it — predicates gate on earlier
//! stages' scratch writes, so applicability cannot be decided up front.
//!
//! ## Lifecycle
//!
//! Per command: `Created -> Validated -> Selecting -> Executing ->
//! Completed | Aborted`. A fatal failure aborts the remainder of the chain;
//! there is no retry state — callers re-issue a new command.
//!
//! ## Wiring validation
//!
//! Each rule declares the scratch keys it consumes and produces. At startup
//! [`RuleEngine::validate`] checks, per chain, that every consumed key is
//! either seeded by the command or produced by a rule with strictly lower
//! priority, and that every declared key is registered with the
//! [`KeyRegistry`]. Broken wiring fails at build time, not mid-session.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::command::{Command, CommandKind, ValidationErrors};
use crate::core::{ContextError, GameContext, KeyRegistry, ScratchKey};

use super::{Rule, RuleOutcome};

/// How non-fatal failures affect a command's overall success.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Only fatal failures flip the overall result (default).
    #[default]
    FatalOnly,
    /// Any failed rule flips the overall result.
    AnyFailure,
}

/// Engine configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Overall-success policy for non-fatal failures.
    pub failure_policy: FailurePolicy,

    /// Clear the scratch space after each command completes.
    ///
    /// On by default so stale keys cannot leak into the next command.
    /// Disable to inspect a chain's writes post-mortem in tests.
    pub clear_scratch_after: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::FatalOnly,
            clear_scratch_after: true,
        }
    }
}

/// Chain wiring errors, reported by [`RuleEngine::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Rule '{rule}' declares unregistered scratch key '{key}'")]
    UnregisteredKey { rule: String, key: ScratchKey },

    #[error("Chain '{kind}' declares unregistered seed key '{key}'")]
    UnregisteredSeedKey { kind: CommandKind, key: ScratchKey },

    #[error("Rule '{consumer}' consumes '{key}' but nothing in the chain produces it")]
    MissingProducer { consumer: String, key: ScratchKey },

    #[error(
        "Key '{key}': producer '{producer}' (priority {producer_priority}) \
         must run strictly before consumer '{consumer}' (priority {consumer_priority})"
    )]
    OrderingViolation {
        key: ScratchKey,
        producer: String,
        producer_priority: i32,
        consumer: String,
        consumer_priority: i32,
    },
}

/// Errors that reject a command before any rule runs.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Parameter validation failed (all violations aggregated).
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Cheap precondition check failed (missing entity, blocking status).
    #[error("Preconditions for '{kind}' command not met")]
    Precondition { kind: CommandKind },

    /// The command could not publish its seed facts.
    #[error("Failed to seed context: {0}")]
    Publish(#[from] ContextError),
}

/// Per-command lifecycle state, recorded in the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandPhase {
    Created,
    Validated,
    Selecting,
    Executing,
    /// Terminal: the chain ran to the end (possibly with non-fatal failures).
    Completed,
    /// Terminal: a fatal failure halted the chain.
    Aborted,
}

/// One executed rule's outcome, in execution order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedOutcome {
    pub rule: String,
    pub priority: i32,
    pub outcome: RuleOutcome,
}

/// Aggregate result of resolving one command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandReport {
    /// Which command this resolves.
    pub kind: CommandKind,

    /// Terminal phase: `Completed` or `Aborted`.
    pub phase: CommandPhase,

    /// Overall success under the engine's [`FailurePolicy`].
    pub success: bool,

    /// Every executed rule's outcome, in execution order.
    pub outcomes: Vec<RecordedOutcome>,

    /// Rules in the chain whose `can_apply` declined, in priority order.
    pub skipped: Vec<String>,
}

impl CommandReport {
    /// Names of the rules that executed, in order.
    #[must_use]
    pub fn executed_rules(&self) -> Vec<&str> {
        self.outcomes.iter().map(|r| r.rule.as_str()).collect()
    }

    /// Did a fatal failure halt the chain?
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.phase == CommandPhase::Aborted
    }

    /// Find a recorded outcome by rule name.
    #[must_use]
    pub fn outcome_of(&self, rule: &str) -> Option<&RuleOutcome> {
        self.outcomes
            .iter()
            .find(|r| r.rule == rule)
            .map(|r| &r.outcome)
    }
}

/// An ordered set of rules for one command kind.
pub struct RuleChain {
    kind: CommandKind,
    rules: Vec<Box<dyn Rule>>,
    seed_keys: Vec<ScratchKey>,
}

impl RuleChain {
    /// Create an empty chain for a command kind.
    #[must_use]
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            rules: Vec::new(),
            seed_keys: Vec::new(),
        }
    }

    /// Register a rule into this chain.
    ///
    /// Rules are kept sorted by ascending priority; the sort is stable, so
    /// equal priorities preserve registration order.
    ///
    /// # Panics
    ///
    /// Panics if the rule belongs to a different command kind — chain
    /// membership is startup configuration, not runtime input.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        assert_eq!(
            rule.command_kind(),
            self.kind,
            "Rule '{}' belongs to chain '{}', not '{}'",
            rule.name(),
            rule.command_kind(),
            self.kind
        );
        self.rules.push(rule);
        self.rules.sort_by_key(|r| r.priority());
    }

    /// Declare a scratch key the command seeds before the chain runs.
    ///
    /// Seed keys satisfy consumers during wiring validation without needing
    /// a producing rule.
    pub fn add_seed_key(&mut self, key: impl Into<ScratchKey>) {
        self.seed_keys.push(key.into());
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the chain has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate this chain's wiring against the key registry.
    pub fn validate(&self, registry: &KeyRegistry) -> Result<(), ChainError> {
        for key in &self.seed_keys {
            if !registry.contains(key) {
                return Err(ChainError::UnregisteredSeedKey {
                    kind: self.kind,
                    key: key.clone(),
                });
            }
        }

        for rule in &self.rules {
            for key in rule.consumes().iter().chain(rule.produces().iter()) {
                if !registry.contains(key) {
                    return Err(ChainError::UnregisteredKey {
                        rule: rule.name().to_string(),
                        key: key.clone(),
                    });
                }
            }
        }

        for consumer in &self.rules {
            for key in consumer.consumes() {
                if self.seed_keys.contains(&key) {
                    continue;
                }

                let producers: Vec<&dyn Rule> = self
                    .rules
                    .iter()
                    .filter(|r| r.produces().contains(&key))
                    .map(|r| r.as_ref())
                    .collect();

                let Some(first) = producers.first() else {
                    return Err(ChainError::MissingProducer {
                        consumer: consumer.name().to_string(),
                        key,
                    });
                };

                if !producers.iter().any(|p| p.priority() < consumer.priority()) {
                    return Err(ChainError::OrderingViolation {
                        key,
                        producer: first.name().to_string(),
                        producer_priority: first.priority(),
                        consumer: consumer.name().to_string(),
                        consumer_priority: consumer.priority(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// The rule engine: one chain per command kind, plus resolution policy.
#[derive(Default)]
pub struct RuleEngine {
    chains: FxHashMap<CommandKind, RuleChain>,
    config: EngineConfig,
}

impl RuleEngine {
    /// Create an engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with an explicit configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            chains: FxHashMap::default(),
            config,
        }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Register a rule into the chain for its command kind.
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        let kind = rule.command_kind();
        self.chains
            .entry(kind)
            .or_insert_with(|| RuleChain::new(kind))
            .add_rule(rule);
    }

    /// Declare a command-seeded scratch key for a chain.
    pub fn register_seed_key(&mut self, kind: CommandKind, key: impl Into<ScratchKey>) {
        self.chains
            .entry(kind)
            .or_insert_with(|| RuleChain::new(kind))
            .add_seed_key(key);
    }

    /// Get the chain for a command kind, if any rules are registered.
    #[must_use]
    pub fn chain(&self, kind: CommandKind) -> Option<&RuleChain> {
        self.chains.get(&kind)
    }

    /// Validate every chain's wiring. Call once at startup.
    pub fn validate(&self, registry: &KeyRegistry) -> Result<(), ChainError> {
        for chain in self.chains.values() {
            chain.validate(registry)?;
        }
        Ok(())
    }

    /// Resolve a command against a context.
    ///
    /// Returns `Err` only for pre-rule rejection (validation, preconditions,
    /// seeding). Once rules start executing, failures — including internal
    /// rule errors — are converted into recorded outcomes and reported via
    /// the [`CommandReport`].
    pub fn resolve(
        &self,
        ctx: &mut GameContext,
        cmd: &dyn Command,
    ) -> Result<CommandReport, ResolveError> {
        let kind = cmd.kind();

        // Fresh scratch scope for this command.
        ctx.clear_scratch();

        cmd.validate()?;

        if !cmd.can_execute(ctx) {
            debug!(command = %kind, "preconditions not met");
            return Err(ResolveError::Precondition { kind });
        }

        cmd.publish(ctx)?;

        let mut report = CommandReport {
            kind,
            phase: CommandPhase::Executing,
            success: true,
            outcomes: Vec::new(),
            skipped: Vec::new(),
        };

        let rules: &[Box<dyn Rule>] = match self.chains.get(&kind) {
            Some(chain) => &chain.rules,
            None => &[],
        };
        debug!(command = %kind, chain_len = rules.len(), "resolving command");

        let mut fatal_failure = false;
        for rule in rules {
            // Applicability is checked right before execution so the
            // predicate can observe earlier stages' scratch writes.
            if !rule.can_apply(ctx, cmd) {
                trace!(rule = rule.name(), "skipped");
                report.skipped.push(rule.name().to_string());
                continue;
            }

            let outcome = match rule.apply(ctx, cmd) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(rule = rule.name(), error = %err, "rule failed internally");
                    RuleOutcome::fatal(format!("{} failed internally: {}", rule.name(), err))
                }
            };

            // Publication is engine-mediated: the rule returns its payload
            // and the engine writes it, so every stage result passes the
            // registry's kind check.
            let outcome = if outcome.success {
                match (&outcome.context_key, &outcome.data) {
                    (Some(key), Some(data)) => match ctx.set_scratch(key.clone(), data.clone()) {
                        Ok(()) => outcome,
                        Err(err) => {
                            warn!(rule = rule.name(), error = %err, "publication rejected");
                            RuleOutcome::fatal(format!(
                                "{} published an invalid payload: {}",
                                rule.name(),
                                err
                            ))
                        }
                    },
                    _ => outcome,
                }
            } else {
                outcome
            };

            trace!(
                rule = rule.name(),
                priority = rule.priority(),
                success = outcome.success,
                "executed"
            );

            let abort = outcome.fatal && !outcome.success;
            report.outcomes.push(RecordedOutcome {
                rule: rule.name().to_string(),
                priority: rule.priority(),
                outcome,
            });

            if abort {
                warn!(command = %kind, rule = rule.name(), "chain aborted");
                fatal_failure = true;
                break;
            }
        }

        report.success = match self.config.failure_policy {
            FailurePolicy::FatalOnly => !fatal_failure,
            FailurePolicy::AnyFailure => {
                !fatal_failure && report.outcomes.iter().all(|r| r.outcome.success)
            }
        };
        report.phase = if fatal_failure {
            CommandPhase::Aborted
        } else {
            CommandPhase::Completed
        };

        if self.config.clear_scratch_after {
            ctx.clear_scratch();
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Validator, ValidationErrors};
    use crate::core::{EntityId, ScratchKind, ScratchValue};
    use crate::rules::EngineError;

    // A minimal command + rule vocabulary for exercising the engine.

    struct TestCommand {
        kind: CommandKind,
        actor: EntityId,
    }

    impl TestCommand {
        fn attack() -> Self {
            Self {
                kind: CommandKind::Attack,
                actor: EntityId::new("char-001"),
            }
        }
    }

    impl Command for TestCommand {
        fn kind(&self) -> CommandKind {
            self.kind
        }

        fn actor(&self) -> &EntityId {
            &self.actor
        }

        fn targets(&self) -> &[EntityId] {
            &[]
        }

        fn validate(&self) -> Result<(), ValidationErrors> {
            Validator::new().finish()
        }

        fn can_execute(&self, _ctx: &GameContext) -> bool {
            true
        }

        fn publish(&self, ctx: &mut GameContext) -> Result<(), ContextError> {
            ctx.set_scratch("test.seed", true)
        }
    }

    struct StageRule {
        name: &'static str,
        priority: i32,
        consumes: Vec<ScratchKey>,
        produces: Vec<ScratchKey>,
        outcome: RuleOutcome,
    }

    impl Rule for StageRule {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn command_kind(&self) -> CommandKind {
            CommandKind::Attack
        }

        fn consumes(&self) -> Vec<ScratchKey> {
            self.consumes.clone()
        }

        fn produces(&self) -> Vec<ScratchKey> {
            self.produces.clone()
        }

        fn can_apply(&self, ctx: &GameContext, _cmd: &dyn Command) -> bool {
            self.consumes.iter().all(|k| ctx.has_scratch(k))
        }

        fn apply(
            &self,
            _ctx: &mut GameContext,
            _cmd: &dyn Command,
        ) -> Result<RuleOutcome, EngineError> {
            Ok(self.outcome.clone())
        }
    }

    fn registry() -> KeyRegistry {
        let mut registry = KeyRegistry::new();
        registry.register("test.seed", ScratchKind::Flag);
        registry.register("test.first", ScratchKind::Int);
        registry.register("test.second", ScratchKind::Int);
        registry
    }

    fn stage(
        name: &'static str,
        priority: i32,
        consumes: &[&str],
        produces: &[&str],
    ) -> Box<StageRule> {
        let outcome = match produces.first() {
            Some(key) => RuleOutcome::success("ok").published(*key, ScratchValue::Int(1)),
            None => RuleOutcome::success("ok"),
        };
        Box::new(StageRule {
            name,
            priority,
            consumes: consumes.iter().map(|k| ScratchKey::new(*k)).collect(),
            produces: produces.iter().map(|k| ScratchKey::new(*k)).collect(),
            outcome,
        })
    }

    #[test]
    fn test_rules_execute_in_priority_order() {
        let mut engine = RuleEngine::new();
        engine.register(stage("third", 30, &[], &[]));
        engine.register(stage("first", 10, &[], &["test.first"]));
        engine.register(stage("second", 20, &["test.first"], &["test.second"]));

        let mut ctx = GameContext::seeded(registry(), 42);
        let report = engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();

        assert_eq!(report.executed_rules(), vec!["first", "second", "third"]);
        let priorities: Vec<i32> = report.outcomes.iter().map(|r| r.priority).collect();
        assert!(priorities.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_equal_priority_preserves_registration_order() {
        let mut engine = RuleEngine::new();
        engine.register(stage("alpha", 10, &[], &[]));
        engine.register(stage("beta", 10, &[], &[]));

        let mut ctx = GameContext::seeded(registry(), 42);
        let report = engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();

        assert_eq!(report.executed_rules(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_fatal_failure_short_circuits() {
        let mut engine = RuleEngine::new();
        engine.register(stage("first", 10, &[], &[]));
        engine.register(Box::new(StageRule {
            name: "blocker",
            priority: 20,
            consumes: vec![],
            produces: vec![],
            outcome: RuleOutcome::fatal("no context found"),
        }));
        engine.register(stage("never", 30, &[], &[]));

        let mut ctx = GameContext::seeded(registry(), 42);
        let report = engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();

        assert!(report.is_aborted());
        assert!(!report.success);
        assert_eq!(report.executed_rules(), vec!["first", "blocker"]);
    }

    #[test]
    fn test_non_fatal_failure_continues() {
        let mut engine = RuleEngine::new();
        engine.register(Box::new(StageRule {
            name: "soft-fail",
            priority: 10,
            consumes: vec![],
            produces: vec![],
            outcome: RuleOutcome::failure("missed"),
        }));
        engine.register(stage("after", 20, &[], &[]));

        let mut ctx = GameContext::seeded(registry(), 42);
        let report = engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();

        assert_eq!(report.phase, CommandPhase::Completed);
        assert!(report.success); // FatalOnly policy
        assert_eq!(report.executed_rules(), vec!["soft-fail", "after"]);
    }

    #[test]
    fn test_any_failure_policy_flips_success() {
        let mut engine = RuleEngine::with_config(EngineConfig {
            failure_policy: FailurePolicy::AnyFailure,
            ..EngineConfig::default()
        });
        engine.register(Box::new(StageRule {
            name: "soft-fail",
            priority: 10,
            consumes: vec![],
            produces: vec![],
            outcome: RuleOutcome::failure("missed"),
        }));

        let mut ctx = GameContext::seeded(registry(), 42);
        let report = engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();

        assert_eq!(report.phase, CommandPhase::Completed);
        assert!(!report.success);
    }

    #[test]
    fn test_inapplicable_rules_are_skipped() {
        let mut engine = RuleEngine::new();
        // Consumes a key nothing produces in this run, so can_apply is false.
        engine.register(stage("gated", 10, &["test.first"], &[]));
        engine.register(stage("open", 20, &[], &[]));

        let mut ctx = GameContext::seeded(registry(), 42);
        let report = engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();

        assert_eq!(report.executed_rules(), vec!["open"]);
        assert_eq!(report.skipped, vec!["gated"]);
    }

    #[test]
    fn test_engine_mediated_publication() {
        let mut engine = RuleEngine::with_config(EngineConfig {
            clear_scratch_after: false,
            ..EngineConfig::default()
        });
        engine.register(stage("producer", 10, &[], &["test.first"]));

        let mut ctx = GameContext::seeded(registry(), 42);
        engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();

        let key = ScratchKey::new("test.first");
        assert_eq!(ctx.scratch(&key).and_then(ScratchValue::as_int), Some(1));
    }

    #[test]
    fn test_invalid_publication_becomes_fatal_outcome() {
        let mut engine = RuleEngine::new();
        engine.register(Box::new(StageRule {
            name: "bad-publisher",
            priority: 10,
            consumes: vec![],
            produces: vec![],
            // Kind mismatch: test.first is registered as Int.
            outcome: RuleOutcome::success("ok").published("test.first", ScratchValue::Flag(true)),
        }));

        let mut ctx = GameContext::seeded(registry(), 42);
        let report = engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();

        assert!(report.is_aborted());
        let outcome = report.outcome_of("bad-publisher").unwrap();
        assert!(outcome.fatal);
        assert!(outcome.message.contains("invalid payload"));
    }

    #[test]
    fn test_internal_error_becomes_fatal_outcome() {
        struct PanickyRule;

        impl Rule for PanickyRule {
            fn name(&self) -> &str {
                "broken"
            }
            fn priority(&self) -> i32 {
                10
            }
            fn command_kind(&self) -> CommandKind {
                CommandKind::Attack
            }
            fn can_apply(&self, _ctx: &GameContext, _cmd: &dyn Command) -> bool {
                true
            }
            fn apply(
                &self,
                ctx: &mut GameContext,
                _cmd: &dyn Command,
            ) -> Result<RuleOutcome, EngineError> {
                // Propagates a context error with `?` like real rules do.
                ctx.require_entity("missing-entity")?;
                Ok(RuleOutcome::success("unreachable"))
            }
        }

        let mut engine = RuleEngine::new();
        engine.register(Box::new(PanickyRule));
        engine.register(stage("never", 20, &[], &[]));

        let mut ctx = GameContext::seeded(registry(), 42);
        let report = engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();

        assert!(report.is_aborted());
        let outcome = report.outcome_of("broken").unwrap();
        assert!(outcome.fatal);
        assert!(outcome.message.contains("missing-entity"));
        assert_eq!(report.executed_rules(), vec!["broken"]);
    }

    #[test]
    fn test_scratch_cleared_after_command() {
        let mut engine = RuleEngine::new();
        engine.register(stage("producer", 10, &[], &["test.first"]));

        let mut ctx = GameContext::seeded(registry(), 42);
        engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();

        assert_eq!(ctx.scratch_len(), 0);
    }

    #[test]
    fn test_empty_chain_completes() {
        let engine = RuleEngine::new();
        let mut ctx = GameContext::seeded(registry(), 42);

        let report = engine.resolve(&mut ctx, &TestCommand::attack()).unwrap();
        assert_eq!(report.phase, CommandPhase::Completed);
        assert!(report.success);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_validate_accepts_correct_wiring() {
        let mut engine = RuleEngine::new();
        engine.register_seed_key(CommandKind::Attack, "test.seed");
        engine.register(stage("first", 10, &["test.seed"], &["test.first"]));
        engine.register(stage("second", 20, &["test.first"], &["test.second"]));

        assert!(engine.validate(&registry()).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_producer() {
        let mut engine = RuleEngine::new();
        engine.register(stage("orphan", 10, &["test.first"], &[]));

        let err = engine.validate(&registry()).unwrap_err();
        assert_eq!(
            err,
            ChainError::MissingProducer {
                consumer: "orphan".to_string(),
                key: ScratchKey::new("test.first"),
            }
        );
    }

    #[test]
    fn test_validate_rejects_ordering_violation() {
        let mut engine = RuleEngine::new();
        // Producer runs after (priority 20) the consumer (priority 10).
        engine.register(stage("late-producer", 20, &[], &["test.first"]));
        engine.register(stage("early-consumer", 10, &["test.first"], &[]));

        let err = engine.validate(&registry()).unwrap_err();
        assert!(matches!(err, ChainError::OrderingViolation { .. }));
    }

    #[test]
    fn test_validate_rejects_equal_priority_producer() {
        let mut engine = RuleEngine::new();
        engine.register(stage("producer", 10, &[], &["test.first"]));
        engine.register(stage("consumer", 10, &["test.first"], &[]));

        // Strictly-less is required; equal priority is a violation.
        assert!(matches!(
            engine.validate(&registry()),
            Err(ChainError::OrderingViolation { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unregistered_key() {
        let mut engine = RuleEngine::new();
        engine.register(stage("rogue", 10, &[], &["test.unknown"]));

        assert!(matches!(
            engine.validate(&registry()),
            Err(ChainError::UnregisteredKey { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "belongs to chain")]
    fn test_chain_rejects_wrong_kind() {
        let mut chain = RuleChain::new(CommandKind::Grapple);
        chain.add_rule(stage("attack-rule", 10, &[], &[]));
    }
}
