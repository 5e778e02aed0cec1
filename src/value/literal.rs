//! Literal encoding of captured values.
//!
//! The output is source text that evaluates back to an equivalent value in
//! the target scope, in the `var_export` family of literals.

use super::{ArrayKey, ObjectValue, Value};
use crate::{MockError, Result};

/// Encode `value` as a source literal.
///
/// Objects must declare state restoration; opaque handles never encode.
pub fn to_literal(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, value, "")?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value, indent: &str) -> Result<()> {
    match value {
        Value::Null => out.push_str("NULL"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::Float(f) => out.push_str(&float_literal(*f)),
        Value::Str(s) => out.push_str(&string_literal(s)),
        Value::Array(entries) => {
            out.push_str("array (\n");
            let inner = format!("{}  ", indent);
            for (key, item) in entries {
                write_entry(out, &key_literal(key), item, &inner)?;
            }
            out.push_str(indent);
            out.push(')');
        }
        Value::Object(object) => write_object(out, object, indent)?,
        Value::Opaque(description) => {
            return Err(MockError::Serialization(format!(
                "{} has no literal form",
                description
            )))
        }
    }
    Ok(())
}

fn write_entry(out: &mut String, key: &str, item: &Value, indent: &str) -> Result<()> {
    out.push_str(indent);
    out.push_str(key);
    out.push_str(" => ");
    if matches!(item, Value::Array(_) | Value::Object(_)) {
        out.push('\n');
        out.push_str(indent);
    }
    write_value(out, item, indent)?;
    out.push_str(",\n");
    Ok(())
}

fn write_object(out: &mut String, object: &ObjectValue, indent: &str) -> Result<()> {
    if !object.restorable {
        return Err(MockError::Serialization(format!(
            "object of class {} does not declare state restoration (__set_state)",
            object.class
        )));
    }
    out.push('\\');
    out.push_str(&object.class);
    out.push_str("::__set_state(array(\n");
    let inner = format!("{}   ", indent);
    for (name, item) in &object.properties {
        write_entry(out, &string_literal(name), item, &inner)?;
    }
    out.push_str(indent);
    out.push_str("))");
    Ok(())
}

fn key_literal(key: &ArrayKey) -> String {
    match key {
        ArrayKey::Int(i) => i.to_string(),
        ArrayKey::Str(s) => string_literal(s),
    }
}

fn float_literal(f: f64) -> String {
    if f.is_nan() {
        "NAN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        // Debug keeps a fractional part on whole numbers ("1.0")
        format!("{:?}", f)
    }
}

fn string_literal(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped.replace('\0', "' . \"\\0\" . '"))
}
