//! Boolean conditions gating dialogue choices.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scope::{FlagRef, resolve};
use crate::value::FlagValue;

/// A comparison operator used by a flag check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `==`
    #[serde(rename = "==")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
}

impl Operator {
    /// Compare a stored flag value (if any) against an expected value.
    ///
    /// Equality works on any value type. Ordering operators are only true
    /// when both sides are numeric.
    pub fn compare(self, actual: Option<&FlagValue>, expected: &FlagValue) -> bool {
        match self {
            Self::Eq => actual.is_some_and(|a| a.loose_eq(expected)),
            Self::Ne => !actual.is_some_and(|a| a.loose_eq(expected)),
            Self::Gt | Self::Lt | Self::Ge | Self::Le => {
                let Some(ordering) = actual.and_then(|a| a.numeric_cmp(expected)) else {
                    return false;
                };
                match self {
                    Self::Gt => ordering == Ordering::Greater,
                    Self::Lt => ordering == Ordering::Less,
                    Self::Ge => ordering != Ordering::Less,
                    _ => ordering != Ordering::Greater,
                }
            }
        }
    }

    /// The operator's symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single flag comparison, the leaf of a condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    /// Raw flag name, possibly prefixed with `conv:` or `game:`.
    pub flag: String,
    /// How to compare.
    pub operator: Operator,
    /// The value to compare against.
    pub value: FlagValue,
}

impl Check {
    /// The resolved scope and key of the checked flag.
    pub fn flag_ref(&self) -> FlagRef {
        resolve(&self.flag)
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.flag, self.operator, self.value)
    }
}

/// A boolean expression over flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// Compare one flag.
    Check(Check),
    /// True iff every sub-condition is true.
    And {
        /// Sub-conditions.
        and: Vec<Condition>,
    },
    /// True iff any sub-condition is true.
    Or {
        /// Sub-conditions.
        or: Vec<Condition>,
    },
    /// Logical negation.
    Not {
        /// The negated condition.
        not: Box<Condition>,
    },
    /// Any other shape found in content. Always false.
    Unknown(serde_json::Value),
}

impl Condition {
    /// A flag check.
    pub fn check(
        flag: impl Into<String>,
        operator: Operator,
        value: impl Into<FlagValue>,
    ) -> Self {
        Self::Check(Check {
            flag: flag.into(),
            operator,
            value: value.into(),
        })
    }

    /// Logical AND.
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::And { and: conditions }
    }

    /// Logical OR.
    pub fn any(conditions: Vec<Condition>) -> Self {
        Self::Or { or: conditions }
    }

    /// Logical NOT.
    pub fn negate(condition: Condition) -> Self {
        Self::Not {
            not: Box::new(condition),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, conditions: &[Condition], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, c) in conditions.iter().enumerate() {
        if i > 0 {
            write!(f, " {sep} ")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check(check) => write!(f, "{check}"),
            Self::And { and } => join(f, and, "and"),
            Self::Or { or } => join(f, or, "or"),
            Self::Not { not } => write!(f, "not {not}"),
            Self::Unknown(_) => f.write_str("<unrecognized condition>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_on_any_type() {
        let actual = FlagValue::from("open");
        assert!(Operator::Eq.compare(Some(&actual), &FlagValue::from("open")));
        assert!(Operator::Ne.compare(Some(&actual), &FlagValue::from("shut")));
    }

    #[test]
    fn missing_flag_is_never_equal() {
        assert!(!Operator::Eq.compare(None, &FlagValue::from(true)));
        assert!(Operator::Ne.compare(None, &FlagValue::from(true)));
    }

    #[test]
    fn ordering_on_numbers() {
        let five = FlagValue::from(5);
        assert!(Operator::Gt.compare(Some(&five), &FlagValue::from(4)));
        assert!(Operator::Ge.compare(Some(&five), &FlagValue::from(5.0)));
        assert!(Operator::Lt.compare(Some(&five), &FlagValue::from(5.5)));
        assert!(Operator::Le.compare(Some(&five), &FlagValue::from(5)));
        assert!(!Operator::Lt.compare(Some(&five), &FlagValue::from(5)));
    }

    #[test]
    fn ordering_fails_closed_on_non_numbers() {
        let name = FlagValue::from("b");
        for op in [Operator::Gt, Operator::Lt, Operator::Ge, Operator::Le] {
            assert!(!op.compare(Some(&name), &FlagValue::from("a")));
            assert!(!op.compare(None, &FlagValue::from(0)));
        }
    }

    #[test]
    fn deserializes_wire_shapes() {
        let json = r#"{
            "and": [
                { "flag": "hasKey", "operator": "==", "value": true },
                { "not": { "flag": "conv:angry", "operator": ">=", "value": 3 } },
                { "or": [] }
            ]
        }"#;
        let cond: Condition = serde_json::from_str(json).unwrap();
        let Condition::And { and } = cond else {
            panic!("expected an and-node");
        };
        assert_eq!(and.len(), 3);
        assert_eq!(and[0], Condition::check("hasKey", Operator::Eq, true));
        assert!(matches!(and[1], Condition::Not { .. }));
        assert!(matches!(&and[2], Condition::Or { or } if or.is_empty()));
    }

    #[test]
    fn unknown_shapes_are_preserved() {
        let cond: Condition =
            serde_json::from_str(r#"{ "flag": "x", "operator": "~=", "value": 1 }"#).unwrap();
        assert!(matches!(cond, Condition::Unknown(_)));

        let cond: Condition = serde_json::from_str(r#"{ "xor": [] }"#).unwrap();
        assert!(matches!(cond, Condition::Unknown(_)));
    }

    #[test]
    fn check_display() {
        let Condition::Check(check) = Condition::check("game:gold", Operator::Ge, 10) else {
            unreachable!()
        };
        assert_eq!(check.to_string(), "game:gold >= 10");
        assert_eq!(check.flag_ref().key, "gold");
    }

    #[test]
    fn condition_display() {
        let cond = Condition::all(vec![
            Condition::check("hasKey", Operator::Eq, true),
            Condition::negate(Condition::any(vec![
                Condition::check("conv:angry", Operator::Gt, 2),
                Condition::check("gold", Operator::Lt, 5),
            ])),
        ]);
        assert_eq!(
            cond.to_string(),
            "(hasKey == true and not (conv:angry > 2 or gold < 5))"
        );
    }
}
