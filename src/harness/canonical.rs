//! Canonical textual form shared by argument marshaling and the generated
//! result printers: compact JSON arrays, unquoted top-level strings.

use serde_json::Value;

pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => render_nested(other),
    }
}

fn render_nested(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => render_number(n),
        Value::String(s) => Value::String(s.clone()).to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(render_nested).collect();
            format!("[{}]", inner.join(","))
        }
        Value::Object(_) => value.to_string(),
    }
}

fn render_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Compares program output against an expected answer. Both sides are trimmed;
/// when both parse as JSON they are compared structurally so that spacing and
/// `2` vs `2.0` do not matter.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    let actual = actual.replace('\r', "");
    let expected = expected.replace('\r', "");
    let (actual, expected) = (actual.trim(), expected.trim());

    if actual == expected {
        return true;
    }

    match (
        serde_json::from_str::<Value>(actual),
        serde_json::from_str::<Value>(expected),
    ) {
        (Ok(a), Ok(b)) => values_equal(&a, &b),
        _ => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => (x - y).abs() <= 1e-9 * x.abs().max(y.abs()).max(1.0),
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}
