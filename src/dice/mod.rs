//! Dice notation parsing and rolling.
//!
//! Supports standard tabletop notation: `NdM+K`, multiple dice terms, and
//! keep-highest/lowest (`4d6kh3`, `2d20kl1`). Die sizes are not restricted
//! to the standard polyhedral set.
//!
//! Malformed notation is a [`DiceError`], never a silent default roll.
//! All randomness comes from a [`DiceRng`] passed in by the caller; there is
//! no ambient `thread_rng` path, so every roll stays attributable to the
//! context's (seed, call index).
//!
//! ```
//! use ttrpg_rules::core::DiceRng;
//! use ttrpg_rules::dice::DiceExpression;
//!
//! let mut rng = DiceRng::seeded(42);
//! let expr = DiceExpression::parse("2d6+3").unwrap();
//! let outcome = expr.roll(&mut rng);
//!
//! assert_eq!(outcome.rolls.len(), 2);
//! assert!((5..=15).contains(&outcome.total));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::DiceRng;

/// Error type for dice notation parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Empty dice notation")]
    Empty,
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("A die must have at least one side (in {0})")]
    ZeroSides(String),
    #[error("A term must roll at least one die (in {0})")]
    ZeroCount(String),
    #[error("Cannot keep {keep} dice when rolling {count} (in {notation})")]
    InvalidKeepCount {
        keep: u32,
        count: u32,
        notation: String,
    },
}

/// Keep modifier for a dice term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keep {
    /// Keep the N highest dice (`kh`).
    Highest(u32),
    /// Keep the N lowest dice (`kl`).
    Lowest(u32),
}

/// A single dice term of an expression (e.g. the `2d6` in `2d6+1d4+3`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceTerm {
    pub count: u32,
    pub sides: u32,
    pub keep: Option<Keep>,
}

/// A parsed dice expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub terms: Vec<DiceTerm>,
    pub modifier: i32,
    notation: String,
}

impl DiceExpression {
    /// Parse a dice notation string.
    ///
    /// Accepts terms joined by `+` or `-`; `-` is only valid before flat
    /// modifiers. Whitespace is ignored.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let normalized = notation.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DiceError::Empty);
        }

        let mut terms = Vec::new();
        let mut modifier: i32 = 0;
        let mut current = String::new();
        let mut sign: i32 = 1;

        for ch in normalized.chars() {
            match ch {
                '+' | '-' => {
                    if current.is_empty() {
                        return Err(DiceError::InvalidNotation(normalized));
                    }
                    Self::parse_term(&current, sign, &mut terms, &mut modifier)?;
                    current.clear();
                    sign = if ch == '+' { 1 } else { -1 };
                }
                ' ' => continue,
                _ => current.push(ch),
            }
        }

        if current.is_empty() {
            return Err(DiceError::InvalidNotation(normalized));
        }
        Self::parse_term(&current, sign, &mut terms, &mut modifier)?;

        Ok(Self {
            terms,
            modifier,
            notation: normalized,
        })
    }

    fn parse_term(
        s: &str,
        sign: i32,
        terms: &mut Vec<DiceTerm>,
        modifier: &mut i32,
    ) -> Result<(), DiceError> {
        let Some(d_pos) = s.find('d') else {
            // Flat modifier
            let value: i32 = s
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            *modifier += sign * value;
            return Ok(());
        };

        if sign < 0 {
            // Subtracting whole dice terms is ambiguous; reject rather than
            // guess what the table intended.
            return Err(DiceError::InvalidNotation(format!("-{s}")));
        }

        let count_str = &s[..d_pos];
        let rest = &s[d_pos + 1..];

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
        };
        if count == 0 {
            return Err(DiceError::ZeroCount(s.to_string()));
        }

        let (sides_str, keep) = if let Some(kh_pos) = rest.find("kh") {
            let keep: u32 = rest[kh_pos + 2..]
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            (&rest[..kh_pos], Some(Keep::Highest(keep)))
        } else if let Some(kl_pos) = rest.find("kl") {
            let keep: u32 = rest[kl_pos + 2..]
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            (&rest[..kl_pos], Some(Keep::Lowest(keep)))
        } else {
            (rest, None)
        };

        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        if sides == 0 {
            return Err(DiceError::ZeroSides(s.to_string()));
        }

        if let Some(Keep::Highest(keep) | Keep::Lowest(keep)) = keep {
            if keep == 0 || keep > count {
                return Err(DiceError::InvalidKeepCount {
                    keep,
                    count,
                    notation: s.to_string(),
                });
            }
        }

        terms.push(DiceTerm { count, sides, keep });
        Ok(())
    }

    /// The normalized notation this expression was parsed from.
    #[must_use]
    pub fn notation(&self) -> &str {
        &self.notation
    }

    /// Minimum possible total.
    #[must_use]
    pub fn min_total(&self) -> i64 {
        let dice: i64 = self.terms.iter().map(|t| i64::from(t.kept_count())).sum();
        dice + i64::from(self.modifier)
    }

    /// Maximum possible total.
    #[must_use]
    pub fn max_total(&self) -> i64 {
        let dice: i64 = self
            .terms
            .iter()
            .map(|t| i64::from(t.kept_count()) * i64::from(t.sides))
            .sum();
        dice + i64::from(self.modifier)
    }

    /// Roll the expression against the given RNG.
    #[must_use]
    pub fn roll(&self, rng: &mut DiceRng) -> RollOutcome {
        let first_call = rng.calls();
        let mut rolls = Vec::new();
        let mut kept = Vec::new();

        for term in &self.terms {
            let term_rolls: Vec<u32> = (0..term.count).map(|_| rng.roll(term.sides)).collect();

            let mut term_kept = term_rolls.clone();
            match term.keep {
                Some(Keep::Highest(n)) => {
                    term_kept.sort_unstable_by(|a, b| b.cmp(a));
                    term_kept.truncate(n as usize);
                }
                Some(Keep::Lowest(n)) => {
                    term_kept.sort_unstable();
                    term_kept.truncate(n as usize);
                }
                None => {}
            }

            rolls.extend(term_rolls);
            kept.extend(term_kept);
        }

        let dice_total: i64 = kept.iter().map(|&r| i64::from(r)).sum();
        let total = dice_total + i64::from(self.modifier);

        RollOutcome {
            notation: self.notation.clone(),
            rolls,
            kept,
            modifier: self.modifier,
            total,
            first_call,
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notation)
    }
}

impl DiceTerm {
    /// How many dice of this term count toward the total.
    #[must_use]
    pub fn kept_count(&self) -> u32 {
        match self.keep {
            Some(Keep::Highest(n) | Keep::Lowest(n)) => n,
            None => self.count,
        }
    }
}

/// Result of rolling a dice expression.
///
/// Carries the individual dice alongside the total, plus the RNG call index
/// of the first die so the roll can be located in a replayed stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    /// Normalized notation that was rolled.
    pub notation: String,
    /// Every die rolled, in roll order.
    pub rolls: Vec<u32>,
    /// Dice that counted toward the total (differs from `rolls` under kh/kl).
    pub kept: Vec<u32>,
    /// Flat modifier.
    pub modifier: i32,
    /// Kept dice plus modifier.
    pub total: i64,
    /// RNG call index of the first die in this roll.
    pub first_call: u64,
}

impl RollOutcome {
    /// Check if the total meets or exceeds a target number.
    #[must_use]
    pub fn meets(&self, target: i64) -> bool {
        self.total >= target
    }
}

impl fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dice: Vec<String> = self.rolls.iter().map(u32::to_string).collect();
        write!(f, "{} [{}] = {}", self.notation, dice.join(", "), self.total)
    }
}

/// Parse and roll a notation string in one step.
pub fn roll(notation: &str, rng: &mut DiceRng) -> Result<RollOutcome, DiceError> {
    Ok(DiceExpression::parse(notation)?.roll(rng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let expr = DiceExpression::parse("1d20").unwrap();
        assert_eq!(expr.terms.len(), 1);
        assert_eq!(expr.terms[0].count, 1);
        assert_eq!(expr.terms[0].sides, 20);
        assert_eq!(expr.modifier, 0);
    }

    #[test]
    fn test_parse_implicit_count() {
        let expr = DiceExpression::parse("d8").unwrap();
        assert_eq!(expr.terms[0].count, 1);
        assert_eq!(expr.terms[0].sides, 8);
    }

    #[test]
    fn test_parse_with_modifier() {
        let expr = DiceExpression::parse("1d20+5").unwrap();
        assert_eq!(expr.modifier, 5);

        let expr = DiceExpression::parse("2d6-2").unwrap();
        assert_eq!(expr.modifier, -2);
    }

    #[test]
    fn test_parse_multiple_terms() {
        let expr = DiceExpression::parse("2d6+1d4+3").unwrap();
        assert_eq!(expr.terms.len(), 2);
        assert_eq!(expr.modifier, 3);
    }

    #[test]
    fn test_parse_nonstandard_sides() {
        let expr = DiceExpression::parse("3d7").unwrap();
        assert_eq!(expr.terms[0].sides, 7);
    }

    #[test]
    fn test_parse_keep_highest() {
        let expr = DiceExpression::parse("4d6kh3").unwrap();
        assert_eq!(expr.terms[0].count, 4);
        assert_eq!(expr.terms[0].keep, Some(Keep::Highest(3)));
        assert_eq!(expr.min_total(), 3);
        assert_eq!(expr.max_total(), 18);
    }

    #[test]
    fn test_parse_keep_lowest() {
        let expr = DiceExpression::parse("2d20kl1").unwrap();
        assert_eq!(expr.terms[0].keep, Some(Keep::Lowest(1)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(DiceExpression::parse(""), Err(DiceError::Empty));
        assert_eq!(DiceExpression::parse("   "), Err(DiceError::Empty));
        assert!(matches!(
            DiceExpression::parse("abc"),
            Err(DiceError::InvalidNotation(_))
        ));
        assert!(matches!(
            DiceExpression::parse("2d"),
            Err(DiceError::InvalidNotation(_))
        ));
        assert!(matches!(
            DiceExpression::parse("1d20+"),
            Err(DiceError::InvalidNotation(_))
        ));
        assert!(matches!(
            DiceExpression::parse("0d6"),
            Err(DiceError::ZeroCount(_))
        ));
        assert!(matches!(
            DiceExpression::parse("2d0"),
            Err(DiceError::ZeroSides(_))
        ));
    }

    #[test]
    fn test_parse_rejects_negative_dice_term() {
        assert!(matches!(
            DiceExpression::parse("2d6-1d4"),
            Err(DiceError::InvalidNotation(_))
        ));
    }

    #[test]
    fn test_invalid_keep_count() {
        let result = DiceExpression::parse("4d6kh5");
        assert_eq!(
            result,
            Err(DiceError::InvalidKeepCount {
                keep: 5,
                count: 4,
                notation: "4d6kh5".to_string(),
            })
        );

        assert!(DiceExpression::parse("2d20kl3").is_err());
        assert!(DiceExpression::parse("4d6kh0").is_err());

        // Keeping all dice is allowed.
        assert!(DiceExpression::parse("4d6kh4").is_ok());
    }

    #[test]
    fn test_roll_bounds() {
        let mut rng = DiceRng::seeded(42);
        let expr = DiceExpression::parse("2d6+3").unwrap();

        for _ in 0..100 {
            let outcome = expr.roll(&mut rng);
            assert_eq!(outcome.rolls.len(), 2);
            assert!(outcome.total >= expr.min_total());
            assert!(outcome.total <= expr.max_total());
        }
    }

    #[test]
    fn test_roll_keep_highest() {
        let mut rng = DiceRng::seeded(42);
        let expr = DiceExpression::parse("4d6kh3").unwrap();

        for _ in 0..100 {
            let outcome = expr.roll(&mut rng);
            assert_eq!(outcome.rolls.len(), 4);
            assert_eq!(outcome.kept.len(), 3);

            // Kept dice are the three highest.
            let mut sorted = outcome.rolls.clone();
            sorted.sort_unstable_by(|a, b| b.cmp(a));
            let expected: i64 = sorted[..3].iter().map(|&r| i64::from(r)).sum();
            assert_eq!(outcome.total, expected);
        }
    }

    #[test]
    fn test_roll_is_deterministic() {
        let expr = DiceExpression::parse("3d8+1").unwrap();

        let mut rng1 = DiceRng::seeded(7);
        let mut rng2 = DiceRng::seeded(7);

        for _ in 0..20 {
            assert_eq!(expr.roll(&mut rng1), expr.roll(&mut rng2));
        }
    }

    #[test]
    fn test_roll_records_call_index() {
        let mut rng = DiceRng::seeded(42);
        let expr = DiceExpression::parse("2d6").unwrap();

        let first = expr.roll(&mut rng);
        let second = expr.roll(&mut rng);

        assert_eq!(first.first_call, 0);
        assert_eq!(second.first_call, 2);
    }

    #[test]
    fn test_convenience_roll() {
        let mut rng = DiceRng::seeded(42);

        let outcome = roll("1d20+5", &mut rng).unwrap();
        assert!((6..=25).contains(&outcome.total));

        assert!(roll("not dice", &mut rng).is_err());
    }

    #[test]
    fn test_outcome_meets() {
        let outcome = RollOutcome {
            notation: "1d20".to_string(),
            rolls: vec![14],
            kept: vec![14],
            modifier: 0,
            total: 14,
            first_call: 0,
        };

        assert!(outcome.meets(14));
        assert!(outcome.meets(10));
        assert!(!outcome.meets(15));
    }

    #[test]
    fn test_outcome_serde() {
        let mut rng = DiceRng::seeded(42);
        let outcome = roll("2d6+1", &mut rng).unwrap();

        let json = serde_json::to_string(&outcome).unwrap();
        let deserialized: RollOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(outcome, deserialized);
    }
}
