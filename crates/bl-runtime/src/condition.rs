use std::cmp::Ordering;

use bl_core::{CompareOp, Condition, FlagScopes, FlagValue};

/// Evaluates `condition` against the game and conversation stores.
///
/// `and`/`or` short-circuit left to right. Unknown shapes are false.
pub fn evaluate(condition: &Condition, scopes: &FlagScopes<'_>) -> bool {
    match condition {
        Condition::Check {
            check: (flag_ref, op, expected),
        } => compare(scopes.get(flag_ref).as_ref(), *op, expected),
        Condition::And { and } => and.iter().all(|inner| evaluate(inner, scopes)),
        Condition::Or { or } => or.iter().any(|inner| evaluate(inner, scopes)),
        Condition::Not { not } => !evaluate(not, scopes),
        Condition::Unknown(_) => false,
    }
}

fn compare(actual: Option<&FlagValue>, op: CompareOp, expected: &FlagValue) -> bool {
    let Some(actual) = actual else {
        return op == CompareOp::Ne;
    };
    let ordering = actual.partial_compare(expected);
    match op {
        CompareOp::Eq => actual == expected,
        CompareOp::Ne => actual != expected,
        CompareOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => ordering == Some(Ordering::Greater),
        CompareOp::Lt => ordering == Some(Ordering::Less),
    }
}
