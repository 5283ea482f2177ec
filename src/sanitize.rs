//! Structured-input sanitisation.
//!
//! The application registers one [`Policy`] at startup. Any structured
//! input passed through the pass has unrecognised fields stripped and
//! declared fields coerced to their declared primitive types. The HTTP
//! surface applies the pass through the [`Sanitized`] extractor, which
//! reads the policy out of the router state.

use axum::Json;
use axum::extract::{FromRef, FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use crate::server::json_error;

/// Primitive type a declared field is coerced toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Accepted as-is, no coercion.
    Any,
}

/// One declared field of a structured input.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Structured inputs name their declared fields so the pass knows what to
/// keep and how to coerce it.
pub trait Declared {
    fn fields() -> &'static [FieldSpec];
}

/// Globally registered sanitisation flags.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    /// Drop object keys that are not declared.
    pub strip_unknown: bool,
    /// Convert declared fields to their declared kind where possible.
    pub coerce: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            strip_unknown: true,
            coerce: true,
        }
    }
}

/// Apply `policy` to `value` in place.
///
/// Only object values are touched; anything else passes through so the
/// downstream deserializer can report the shape mismatch itself.
pub fn sanitize(policy: &Policy, fields: &[FieldSpec], value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    if policy.strip_unknown {
        map.retain(|key, _| fields.iter().any(|f| f.name == key.as_str()));
    }

    if policy.coerce {
        for field in fields {
            if let Some(slot) = map.get_mut(field.name) {
                coerce(field.kind, slot);
            }
        }
    }
}

/// Rewrite `slot` to `kind` when a lossless conversion exists; otherwise
/// leave it untouched and let deserialization report the type error.
fn coerce(kind: FieldKind, slot: &mut Value) {
    let coerced = match (kind, &*slot) {
        (FieldKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        (FieldKind::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        (FieldKind::Boolean, Value::String(s)) => match s.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (FieldKind::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (FieldKind::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
        _ => None,
    };

    if let Some(v) = coerced {
        *slot = v;
    }
}

// ── Extractor ─────────────────────────────────────────────────────────────────

/// JSON body extractor that runs the sanitisation pass before
/// deserializing into `T`.
pub struct Sanitized<T>(pub T);

impl<S, T> FromRequest<S> for Sanitized<T>
where
    S: Send + Sync,
    Policy: FromRef<S>,
    T: DeserializeOwned + Declared,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let policy = Policy::from_ref(state);

        let Json(mut value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| reject(StatusCode::BAD_REQUEST, "bad_request", e))?;

        sanitize(&policy, T::fields(), &mut value);

        let parsed = serde_json::from_value(value)
            .map_err(|e| reject(StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", e))?;

        Ok(Sanitized(parsed))
    }
}

fn reject(status: StatusCode, code: &str, msg: impl std::fmt::Display) -> Response {
    (status, json_error(code, msg)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec {
            name: "name",
            kind: FieldKind::String,
        },
        FieldSpec {
            name: "count",
            kind: FieldKind::Integer,
        },
        FieldSpec {
            name: "ratio",
            kind: FieldKind::Number,
        },
        FieldSpec {
            name: "active",
            kind: FieldKind::Boolean,
        },
        FieldSpec {
            name: "payload",
            kind: FieldKind::Any,
        },
    ];

    #[test]
    fn unknown_field_is_stripped() {
        let mut v = json!({ "name": "a", "intruder": 1 });
        sanitize(&Policy::default(), FIELDS, &mut v);
        assert_eq!(v, json!({ "name": "a" }));
    }

    #[test]
    fn numeric_string_coerces_to_integer() {
        let mut v = json!({ "count": "42" });
        sanitize(&Policy::default(), FIELDS, &mut v);
        assert_eq!(v, json!({ "count": 42 }));
    }

    #[test]
    fn numeric_string_coerces_to_float() {
        let mut v = json!({ "ratio": "2.5" });
        sanitize(&Policy::default(), FIELDS, &mut v);
        assert_eq!(v, json!({ "ratio": 2.5 }));
    }

    #[test]
    fn boolean_string_coerces() {
        let mut v = json!({ "active": "true" });
        sanitize(&Policy::default(), FIELDS, &mut v);
        assert_eq!(v, json!({ "active": true }));
    }

    #[test]
    fn scalar_coerces_to_declared_string() {
        let mut v = json!({ "name": 7 });
        sanitize(&Policy::default(), FIELDS, &mut v);
        assert_eq!(v, json!({ "name": "7" }));
    }

    #[test]
    fn unparseable_value_left_for_deserializer() {
        let mut v = json!({ "count": "not-a-number" });
        sanitize(&Policy::default(), FIELDS, &mut v);
        assert_eq!(v, json!({ "count": "not-a-number" }));
    }

    #[test]
    fn strip_disabled_keeps_unknown_fields() {
        let policy = Policy {
            strip_unknown: false,
            coerce: true,
        };
        let mut v = json!({ "intruder": 1, "count": "3" });
        sanitize(&policy, FIELDS, &mut v);
        assert_eq!(v, json!({ "intruder": 1, "count": 3 }));
    }

    #[test]
    fn coerce_disabled_keeps_raw_types() {
        let policy = Policy {
            strip_unknown: true,
            coerce: false,
        };
        let mut v = json!({ "count": "3" });
        sanitize(&policy, FIELDS, &mut v);
        assert_eq!(v, json!({ "count": "3" }));
    }

    #[test]
    fn non_object_passes_through() {
        let mut v = json!([1, 2, 3]);
        sanitize(&Policy::default(), FIELDS, &mut v);
        assert_eq!(v, json!([1, 2, 3]));
    }

    #[test]
    fn any_field_untouched() {
        let mut v = json!({ "payload": { "nested": "1" } });
        sanitize(&Policy::default(), FIELDS, &mut v);
        assert_eq!(v, json!({ "payload": { "nested": "1" } }));
    }
}
