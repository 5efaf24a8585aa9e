//! Grapple resolution: a three-stage reference chain.
//!
//! The stages communicate purely through scratch keys, forming a small
//! state machine:
//!
//! 1. [`GrappleCommand`] seeds `grapple.request` (who grapples whom).
//! 2. [`OpposedAttackRule`] rolls the attack and publishes `grapple.attack`.
//! 3. [`StrengthComparisonRule`] runs only if the attack hit and publishes
//!    `grapple.strength`.
//! 4. [`GrappleEffectRule`] applies `Grappling`/`Grappled` statuses and 0-1
//!    points of damage, publishing `grapple.damage`.
//!
//! Entity attribute conventions: `strength` (3-18), `armour_class`
//! (default 10), `hit_points`.

use crate::command::{Command, CommandKind, TargetList, ValidationErrors, Validator};
use crate::core::{
    ContextError, EntityId, GameContext, KeyRegistry, ScratchKey, ScratchKind, ScratchValue,
};
use crate::dice;
use crate::rules::{EngineError, Rule, RuleEngine, RuleOutcome};

/// Key seeded by the command: `Record { attacker, defender }`.
#[must_use]
pub fn request_key() -> ScratchKey {
    ScratchKey::new("grapple.request")
}

/// Key published by the attack stage: `Record { hit, roll }`.
#[must_use]
pub fn attack_key() -> ScratchKey {
    ScratchKey::new("grapple.attack")
}

/// Key published by the comparison stage: `Record { margin }`.
#[must_use]
pub fn strength_key() -> ScratchKey {
    ScratchKey::new("grapple.strength")
}

/// Key published by the effect stage: damage dealt.
#[must_use]
pub fn damage_key() -> ScratchKey {
    ScratchKey::new("grapple.damage")
}

/// Register the grapple scratch keys.
pub fn register_keys(registry: &mut KeyRegistry) {
    registry.register(request_key(), ScratchKind::Record);
    registry.register(attack_key(), ScratchKind::Record);
    registry.register(strength_key(), ScratchKind::Record);
    registry.register(damage_key(), ScratchKind::Int);
}

/// Register the grapple chain (seed key + three rules) into an engine.
pub fn register_rules(engine: &mut RuleEngine) {
    engine.register_seed_key(CommandKind::Grapple, request_key());
    engine.register(Box::new(OpposedAttackRule));
    engine.register(Box::new(StrengthComparisonRule));
    engine.register(Box::new(GrappleEffectRule));
}

/// Ability score to modifier: 10-11 is +0, every 2 points is ±1.
fn modifier(score: i64) -> i64 {
    (score - 10).div_euclid(2)
}

/// Request to grapple one target.
pub struct GrappleCommand {
    actor: EntityId,
    targets: TargetList,
}

impl GrappleCommand {
    /// Create a grapple request.
    pub fn new(actor: impl Into<EntityId>, target: impl Into<EntityId>) -> Self {
        Self {
            actor: actor.into(),
            targets: TargetList::from_elem(target.into(), 1),
        }
    }

    fn target(&self) -> &EntityId {
        &self.targets[0]
    }
}

impl Command for GrappleCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::Grapple
    }

    fn actor(&self) -> &EntityId {
        &self.actor
    }

    fn targets(&self) -> &[EntityId] {
        &self.targets
    }

    fn required_rules(&self) -> &[&str] {
        &["opposed-attack", "strength-comparison", "grapple-effect"]
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.require(!self.actor.as_str().is_empty(), "actor", "must not be empty");
        v.require(
            !self.target().as_str().is_empty(),
            "targets",
            "must not be empty",
        );
        v.require(
            self.actor != *self.target(),
            "targets",
            "an entity cannot grapple itself",
        );
        v.finish()
    }

    fn can_execute(&self, ctx: &GameContext) -> bool {
        let alive = |id: &EntityId| {
            ctx.entity(id.as_str())
                .is_some_and(|e| !e.has_status("Dead"))
        };
        alive(&self.actor) && alive(self.target())
    }

    fn publish(&self, ctx: &mut GameContext) -> Result<(), ContextError> {
        ctx.set_scratch(
            request_key(),
            ScratchValue::record([
                ("attacker", ScratchValue::from(self.actor.as_str())),
                ("defender", ScratchValue::from(self.target().as_str())),
            ]),
        )
    }
}

/// Reads the request from scratch, or fails the chain fatally.
fn request_parties(ctx: &GameContext) -> Result<(String, String), RuleOutcome> {
    let Some(request) = ctx.scratch(&request_key()) else {
        return Err(RuleOutcome::fatal("No grapple context found"));
    };
    match (request.text_field("attacker"), request.text_field("defender")) {
        (Some(attacker), Some(defender)) => Ok((attacker.to_string(), defender.to_string())),
        _ => Err(RuleOutcome::fatal("Grapple context is missing parties")),
    }
}

/// Stage 1: the grapple attack roll.
///
/// 1d20 + strength modifier against the defender's armour class.
pub struct OpposedAttackRule;

impl Rule for OpposedAttackRule {
    fn name(&self) -> &str {
        "opposed-attack"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn command_kind(&self) -> CommandKind {
        CommandKind::Grapple
    }

    fn consumes(&self) -> Vec<ScratchKey> {
        vec![request_key()]
    }

    fn produces(&self) -> Vec<ScratchKey> {
        vec![attack_key()]
    }

    fn can_apply(&self, ctx: &GameContext, cmd: &dyn Command) -> bool {
        cmd.kind() == CommandKind::Grapple && ctx.has_scratch(&request_key())
    }

    fn apply(&self, ctx: &mut GameContext, _cmd: &dyn Command) -> Result<RuleOutcome, EngineError> {
        let (attacker_id, defender_id) = match request_parties(ctx) {
            Ok(parties) => parties,
            Err(outcome) => return Ok(outcome),
        };

        let attacker = ctx.require_entity(&attacker_id)?;
        let attack_bonus = modifier(attacker.int_attribute("strength", 10));
        let attacker_name = attacker.name.clone();

        let defender = ctx.require_entity(&defender_id)?;
        let armour_class = defender.int_attribute("armour_class", 10);
        let defender_name = defender.name.clone();

        let roll = dice::roll("1d20", ctx.dice_mut())?;
        let hit = roll.total + attack_bonus >= armour_class;

        let message = if hit {
            format!("{attacker_name} grabs hold of {defender_name}")
        } else {
            format!("{attacker_name} fails to get a grip on {defender_name}")
        };

        Ok(RuleOutcome::success(message).published(
            attack_key(),
            ScratchValue::record([
                ("hit", ScratchValue::Flag(hit)),
                ("roll", ScratchValue::Roll(roll)),
                ("bonus", ScratchValue::Int(attack_bonus)),
            ]),
        ))
    }
}

/// Stage 2: opposed strength check. Runs only after a hit.
pub struct StrengthComparisonRule;

impl Rule for StrengthComparisonRule {
    fn name(&self) -> &str {
        "strength-comparison"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn command_kind(&self) -> CommandKind {
        CommandKind::Grapple
    }

    fn consumes(&self) -> Vec<ScratchKey> {
        vec![request_key(), attack_key()]
    }

    fn produces(&self) -> Vec<ScratchKey> {
        vec![strength_key()]
    }

    fn can_apply(&self, ctx: &GameContext, cmd: &dyn Command) -> bool {
        cmd.kind() == CommandKind::Grapple
            && ctx
                .scratch(&attack_key())
                .and_then(|a| a.flag_field("hit"))
                == Some(true)
    }

    fn apply(&self, ctx: &mut GameContext, _cmd: &dyn Command) -> Result<RuleOutcome, EngineError> {
        let (attacker_id, defender_id) = match request_parties(ctx) {
            Ok(parties) => parties,
            Err(outcome) => return Ok(outcome),
        };

        let attacker_strength = ctx.require_entity(&attacker_id)?.int_attribute("strength", 10);
        let defender_strength = ctx.require_entity(&defender_id)?.int_attribute("strength", 10);
        let margin = attacker_strength - defender_strength;

        Ok(RuleOutcome::success(format!(
            "Strength {attacker_strength} against {defender_strength}: margin {margin}"
        ))
        .published(
            strength_key(),
            ScratchValue::record([
                ("attacker_strength", ScratchValue::Int(attacker_strength)),
                ("defender_strength", ScratchValue::Int(defender_strength)),
                ("margin", ScratchValue::Int(margin)),
            ]),
        ))
    }
}

/// Stage 3: apply the hold.
///
/// A non-negative strength margin pins the defender (`Grappled`/`Grappling`
/// statuses, 1d2-1 crush damage); a negative margin means the defender
/// wrenches free — recorded as a non-fatal failure.
pub struct GrappleEffectRule;

impl Rule for GrappleEffectRule {
    fn name(&self) -> &str {
        "grapple-effect"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn command_kind(&self) -> CommandKind {
        CommandKind::Grapple
    }

    fn consumes(&self) -> Vec<ScratchKey> {
        vec![request_key(), strength_key()]
    }

    fn produces(&self) -> Vec<ScratchKey> {
        vec![damage_key()]
    }

    fn can_apply(&self, ctx: &GameContext, cmd: &dyn Command) -> bool {
        cmd.kind() == CommandKind::Grapple && ctx.has_scratch(&strength_key())
    }

    fn apply(&self, ctx: &mut GameContext, _cmd: &dyn Command) -> Result<RuleOutcome, EngineError> {
        let (attacker_id, defender_id) = match request_parties(ctx) {
            Ok(parties) => parties,
            Err(outcome) => return Ok(outcome),
        };

        let margin = ctx
            .scratch(&strength_key())
            .and_then(|s| s.int_field("margin"))
            .ok_or_else(|| EngineError::Rule("Strength comparison result is malformed".into()))?;

        if margin < 0 {
            let defender_name = ctx.require_entity(&defender_id)?.name.clone();
            return Ok(RuleOutcome::failure(format!(
                "{defender_name} wrenches free of the hold"
            )));
        }

        let crush = dice::roll("1d2-1", ctx.dice_mut())?;
        let damage = crush.total;

        let attacker = ctx.require_entity_mut(&attacker_id)?;
        attacker.add_status("Grappling");
        let attacker_name = attacker.name.clone();

        let defender = ctx.require_entity_mut(&defender_id)?;
        defender.add_status("Grappled");
        let hp = defender.int_attribute("hit_points", 0);
        defender.set_attribute("hit_points", hp - damage);
        let defender_name = defender.name.clone();

        Ok(RuleOutcome::success(format!(
            "{attacker_name} pins {defender_name} for {damage} damage"
        ))
        .published(damage_key(), ScratchValue::Int(damage)))
    }
}
