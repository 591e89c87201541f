//! Condition evaluation against both flag stores.

use tracing::trace;
use zw_core::{Check, Condition};

use crate::flags::FlagScopes;
use crate::observer::DialogueObserver;

/// Evaluate a condition tree.
///
/// Read-only apart from the observer, which sees every leaf check that is
/// actually evaluated, left to right. `and`/`or` short-circuit.
pub fn evaluate(
    condition: &Condition,
    flags: FlagScopes<'_>,
    observer: &dyn DialogueObserver,
) -> bool {
    match condition {
        Condition::Check(check) => evaluate_check(check, flags, observer),
        Condition::And { and } => and.iter().all(|c| evaluate(c, flags, observer)),
        Condition::Or { or } => or.iter().any(|c| evaluate(c, flags, observer)),
        Condition::Not { not } => !evaluate(not, flags, observer),
        Condition::Unknown(_) => false,
    }
}

fn evaluate_check(check: &Check, flags: FlagScopes<'_>, observer: &dyn DialogueObserver) -> bool {
    let actual = flags.get(&check.flag);
    let result = check.operator.compare(actual.as_ref(), &check.value);
    trace!(check = %check, ?actual, result, "condition checked");
    observer.condition_evaluated(check, result);
    result
}
