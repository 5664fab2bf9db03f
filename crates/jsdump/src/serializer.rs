//! Value -> Expression serializer (`toExpr`, §4.4).
//!
//! Converts a live value into source text, consulting the `BindingRegistry`
//! to pick between "construct new" and "refer to existing". Rust's static
//! typing rules out the "unknown primitive kind" `SerializerError` the
//! source spec allows for: `Value<Id>` is an exhaustive enum, so there is no
//! runtime tag the match below can fail to cover.

use crate::{
    error::DumpError,
    interp::{AnyValue, Interpreter, ObjectClass, ObjectId, OwnerId, Value},
    quote::quote_js_string,
    registry::BindingRegistry,
    selector::Parts,
};

/// Post-condition (§4.4): after returning for an object, that object has a
/// `ref` and status >= DECL; contents are not yet emitted — the caller (the
/// dump driver) must separately drive it to its target Do-level.
pub fn to_expr<Id, Owner>(
    interp: &dyn Interpreter<Id, Owner>,
    registry: &mut BindingRegistry<Id>,
    value: &AnyValue<Id>,
    parts: Option<&Parts>,
    is_shadowed: &dyn Fn(&str) -> bool,
) -> Result<String, DumpError>
where
    Id: ObjectId,
    Owner: OwnerId,
{
    let id = match value {
        AnyValue::Str(s) => return Ok(quote_js_string(s)),
        AnyValue::Value(Value::Undefined) => {
            return Ok(if is_shadowed("undefined") { "(void 0)".to_owned() } else { "undefined".to_owned() });
        }
        AnyValue::Value(Value::Null) => return Ok("null".to_owned()),
        AnyValue::Value(Value::Boolean(b)) => return Ok(b.to_string()),
        AnyValue::Value(Value::Number(n)) => return Ok(format_number(*n, is_shadowed)),
        AnyValue::Value(Value::Object(id)) => *id,
    };

    // Case 2: already emitted -> a reference, not a construction.
    if let Some(info) = registry.object_ref(id)
        && let Some(reference) = info.reference()
    {
        return Ok(reference.to_js_expr());
    }

    // Case 3: built-in, recovered by key rather than reconstructed.
    if let Some(key) = interp.builtin_key(id) {
        let parts = parts.ok_or_else(|| DumpError::Serializer {
            parts: None,
            message: "cannot construct a built-in object inline with no Parts to reference it by".to_owned(),
        })?;
        registry.object(id).set_reference(parts.clone());
        return Ok(format!("new {}", quote_js_string(&key)));
    }

    // Case 4: a genuinely new object.
    let Some(parts) = parts else {
        return Err(DumpError::Serializer {
            parts: None,
            message: "cannot construct a new object inline with no Parts to reference it by".to_owned(),
        });
    };
    registry.object(id).set_reference(parts.clone());

    let object = interp.object(id);
    match object.class() {
        ObjectClass::PlainObject | ObjectClass::UserDefined => match object.proto() {
            None => Ok("Object.create(null)".to_owned()),
            Some(proto) if proto == interp.object_prototype() => Ok("{}".to_owned()),
            Some(proto) => {
                let proto_expr =
                    to_expr(interp, registry, &AnyValue::Value(Value::Object(proto)), None, is_shadowed)?;
                Ok(format!("Object.create({proto_expr})"))
            }
        },
        ObjectClass::Array => Ok("[]".to_owned()),
        ObjectClass::Function { user_defined: true, source: Some(source) } => Ok(source),
        ObjectClass::Function { .. } => Err(DumpError::Serializer {
            parts: Some(parts.clone()),
            message: "cannot serialize a non-user-defined function".to_owned(),
        }),
        ObjectClass::Date { epoch_millis } => Ok(format!("new Date({})", quote_js_string(&epoch_millis_to_iso8601(epoch_millis)))),
        ObjectClass::RegExp { pattern, flags } => Ok(format!("/{}/{flags}", escape_regex_slashes(&pattern))),
    }
}

fn format_number(n: f64, is_shadowed: &dyn Fn(&str) -> bool) -> String {
    if n.is_nan() {
        return if is_shadowed("NaN") { "(0/0)".to_owned() } else { "NaN".to_owned() };
    }
    if n.is_infinite() {
        let shadowed = is_shadowed("Infinity");
        return match (n.is_sign_positive(), shadowed) {
            (true, false) => "Infinity".to_owned(),
            (true, true) => "(1/0)".to_owned(),
            (false, false) => "-Infinity".to_owned(),
            (false, true) => "(-1/0)".to_owned(),
        };
    }
    if n == 0.0 && n.is_sign_negative() {
        return "-0".to_owned();
    }
    // Integral values print without a trailing `.0` to match JS number-literal syntax.
    if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

fn escape_regex_slashes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut escaped = false;
    for ch in pattern.chars() {
        if ch == '/' && !escaped {
            out.push('\\');
        }
        out.push(ch);
        escaped = ch == '\\' && !escaped;
    }
    out
}

/// Renders milliseconds since the Unix epoch as an ISO-8601 UTC instant
/// (`YYYY-MM-DDTHH:mm:ss.sssZ`), using civil-from-days calendar math so the
/// engine does not need a calendar-crate dependency for one conversion.
fn epoch_millis_to_iso8601(epoch_millis: f64) -> String {
    let total_millis = epoch_millis.round() as i64;
    let millis = total_millis.rem_euclid(1000);
    let total_secs = total_millis.div_euclid(1000);
    let secs_of_day = total_secs.rem_euclid(86_400);
    let days = total_secs.div_euclid(86_400);

    let (year, month, day) = civil_from_days(days);
    let hour = secs_of_day / 3600;
    let minute = (secs_of_day % 3600) / 60;
    let second = secs_of_day % 60;

    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{millis:03}Z")
}

/// Howard Hinnant's `civil_from_days`: days since the Unix epoch -> (year, month, day).
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_zero_prints_with_sign() {
        assert_eq!(format_number(-0.0, &|_| false), "-0");
    }

    #[test]
    fn nan_uses_parenthesized_fallback_when_shadowed() {
        assert_eq!(format_number(f64::NAN, &|name| name == "NaN"), "(0/0)");
        assert_eq!(format_number(f64::NAN, &|_| false), "NaN");
    }

    #[test]
    fn infinities_respect_sign_and_shadowing() {
        assert_eq!(format_number(f64::INFINITY, &|_| false), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY, &|_| false), "-Infinity");
        assert_eq!(format_number(f64::INFINITY, &|name| name == "Infinity"), "(1/0)");
        assert_eq!(format_number(f64::NEG_INFINITY, &|name| name == "Infinity"), "(-1/0)");
    }

    #[test]
    fn integral_float_has_no_trailing_dot_zero() {
        assert_eq!(format_number(1.0, &|_| false), "1");
        assert_eq!(format_number(1.5, &|_| false), "1.5");
    }

    #[test]
    fn regex_slash_is_escaped() {
        assert_eq!(escape_regex_slashes("a/b"), "a\\/b");
        assert_eq!(escape_regex_slashes("a\\/b"), "a\\/b");
    }

    #[test]
    fn epoch_zero_is_unix_epoch_instant() {
        assert_eq!(epoch_millis_to_iso8601(0.0), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn epoch_millis_round_trips_a_known_instant() {
        // 2024-01-15T10:30:00.500Z
        assert_eq!(epoch_millis_to_iso8601(1_705_314_600_500.0), "2024-01-15T10:30:00.500Z");
    }
}
