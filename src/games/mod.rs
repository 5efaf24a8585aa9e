//! Reference rulesets built on the engine.
//!
//! These are deliberately small domain modules: they exist to exercise the
//! command/rule/scratch machinery end to end and to show how a real ruleset
//! wires in. Production rulesets live outside this crate and implement the
//! same contracts.

pub mod grapple;
