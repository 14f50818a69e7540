//! Field-level condition predicates.
//!
//! Every outcome of a condition is a plain pass/fail. A missing field, an
//! unresolvable placeholder, or a type mismatch is a failure carrying a
//! diagnostic, never an error that aborts evaluation.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use warden_contracts::{
    context::{resolve_path, PermissionContext},
    decision::CheckFailure,
    permission::{Condition, Operator},
    user::UserAuth,
};

/// Evaluate one condition against the context's target.
pub fn evaluate_condition(
    condition: &Condition,
    user: &UserAuth,
    ctx: &PermissionContext,
) -> Result<(), CheckFailure> {
    let expected = resolve_expected(&condition.value, user, ctx);
    let identifier = is_identifier_placeholder(&condition.value);
    let equal = |a: &Value, b: &Value| {
        if identifier {
            ids_equal(a, b)
        } else {
            values_equal(a, b)
        }
    };

    let fail = |actual: Option<&Value>, detail: String| CheckFailure::Condition {
        field: condition.field.clone(),
        operator: condition.operator,
        expected: expected.clone(),
        actual: actual.cloned(),
        detail,
    };

    let Some(target) = ctx.target() else {
        return Err(fail(None, "no target supplied".to_string()));
    };
    let Some(actual) = target.field(&condition.field).value() else {
        return Err(fail(None, format!("field '{}' is absent", condition.field)));
    };
    let Some(expected_value) = expected.as_ref() else {
        return Err(fail(
            Some(actual),
            format!("placeholder {} did not resolve", condition.value),
        ));
    };

    let outcome = match condition.operator {
        Operator::Eq => Some(equal(actual, expected_value)),
        Operator::Ne => Some(!equal(actual, expected_value)),
        Operator::In => expected_value
            .as_array()
            .map(|items| items.iter().any(|v| equal(actual, v))),
        Operator::NotIn => expected_value
            .as_array()
            .map(|items| !items.iter().any(|v| equal(actual, v))),
        Operator::Gt => compare(actual, expected_value).map(|o| o == Ordering::Greater),
        Operator::Lt => compare(actual, expected_value).map(|o| o == Ordering::Less),
    };

    match outcome {
        Some(true) => Ok(()),
        Some(false) => Err(fail(
            Some(actual),
            format!(
                "{} {} {} is false",
                condition.field, condition.operator, expected_value
            ),
        )),
        None => Err(fail(
            Some(actual),
            format!(
                "'{}' cannot compare {} with {}",
                condition.operator, actual, expected_value
            ),
        )),
    }
}

/// Substitute `${user.id}`, `${user.companyId}` and `${context.<path>}`.
///
/// Non-placeholder values pass through unchanged. `None` means the
/// placeholder names something that does not exist.
fn resolve_expected(value: &Value, user: &UserAuth, ctx: &PermissionContext) -> Option<Value> {
    let Some(inner) = value
        .as_str()
        .and_then(|s| s.strip_prefix("${"))
        .and_then(|s| s.strip_suffix('}'))
    else {
        return Some(value.clone());
    };

    match inner {
        "user.id" => Some(Value::String(user.id.to_string())),
        "user.companyId" | "user.company_id" => Some(Value::String(user.company_id.to_string())),
        other => other
            .strip_prefix("context.")
            .and_then(|path| resolve_path(&ctx.additional, path).value().cloned()),
    }
}

/// `${user.id}` and `${user.companyId}` stand for identifiers, which follow
/// the same comparison rule as scope checks.
fn is_identifier_placeholder(value: &Value) -> bool {
    matches!(
        value.as_str(),
        Some("${user.id}" | "${user.companyId}" | "${user.company_id}")
    )
}

/// Identifiers may arrive as JSON strings or numbers; `42` and `"42"` name
/// the same record.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn ids_equal(a: &Value, b: &Value) -> bool {
    match (id_string(a), id_string(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// JSON equality, except that numbers compare by value (`1 == 1.0`).
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Numbers order numerically, strings lexicographically; anything else is
/// incomparable.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Integers compare exactly, at any magnitude; `f64` is only used when one
/// side is a float.
fn compare_numbers(x: &Number, y: &Number) -> Option<Ordering> {
    match (integer(x), integer(y)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
    }
}

fn integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}
