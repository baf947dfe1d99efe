//! Dynamically-typed request values.
//!
//! The argument extractor (in `sentinel-hotspot`) pulls governance keys out of
//! headers, metadata, attachments, and positional arguments, which may arrive
//! as strings, numbers, or booleans depending on the transport. Rather than
//! reaching for runtime reflection in the hot path, every such value is
//! represented once, at extraction time, as this tagged variant; controllers
//! then key on its canonical string form.

use std::fmt;

/// The kind a hotspot rule's parameter is declared as, used to type-coerce an
/// extracted value before it becomes a governance key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Int,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
}

/// A dynamically-typed argument value, produced once per request by the
/// extractor and never re-inspected via reflection afterward.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// An opaque value whose shape the extractor did not need to interpret
    /// (e.g. a nested structured field reached only for a dotted-path lookup).
    Raw(String),
    /// A structured positional argument (the "args[0] is a struct" case of
    /// §4.6), carried as an ordered field list so a dotted `paramKey` can be
    /// resolved against it via [`Value::lookup_path`]. Never itself used as a
    /// governance key — only the scalar a path lookup resolves to is.
    Record(Vec<(String, Value)>),
}

impl Value {
    /// Canonical string form used as the actual LRU map key, so controllers
    /// never compare on the variant shape, only on this string.
    pub fn canonical(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Raw(s) => s.clone(),
            // Unreachable in practice: a Record is always resolved via
            // lookup_path before it becomes a governance key.
            Value::Record(_) => "<record>".to_string(),
        }
    }

    /// Resolves a `.`-separated path against this value, descending through
    /// nested [`Value::Record`]s one field at a time. Returns `None` as soon
    /// as a segment doesn't resolve to a field, or this value isn't a record
    /// at all — mirroring the original's `jsonparser.Get` returning an error
    /// for any unmatched path.
    pub fn lookup_path(&self, path: &str) -> Option<Value> {
        if path.is_empty() {
            return None;
        }
        let mut cur = self;
        for segment in path.split('.') {
            match cur {
                Value::Record(fields) => {
                    cur = fields.iter().find(|(k, _)| k == segment).map(|(_, v)| v)?;
                }
                _ => return None,
            }
        }
        Some(cur.clone())
    }

    /// Re-parses this value as the requested [`ParamKind`].
    ///
    /// A parse failure is reported as `None` rather than silently defaulting,
    /// since a miscoerced key would merge two distinct logical buckets.
    pub fn coerce(&self, kind: ParamKind) -> Option<Value> {
        if matches!(self, Value::Record(_)) {
            return None;
        }
        let raw = self.canonical();
        match kind {
            ParamKind::String => Some(Value::String(raw)),
            ParamKind::Int | ParamKind::Int32 | ParamKind::Int64 => {
                raw.parse::<i64>().ok().map(Value::Int)
            }
            ParamKind::Float32 | ParamKind::Float64 => raw.parse::<f64>().ok().map(Value::Float),
            ParamKind::Bool => raw.parse::<bool>().ok().map(Value::Bool),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_is_stable_across_variants() {
        assert_eq!(Value::Int(42).canonical(), "42");
        assert_eq!(Value::Bool(true).canonical(), "true");
        assert_eq!(Value::String("x".into()).canonical(), "x");
    }

    #[test]
    fn coerce_int_from_string() {
        let v = Value::String("17".into());
        assert_eq!(v.coerce(ParamKind::Int), Some(Value::Int(17)));
    }

    #[test]
    fn coerce_fails_on_bad_shape_rather_than_defaulting() {
        let v = Value::String("not-a-number".into());
        assert_eq!(v.coerce(ParamKind::Int), None);
    }

    #[test]
    fn coerce_bool() {
        assert_eq!(
            Value::String("true".into()).coerce(ParamKind::Bool),
            Some(Value::Bool(true))
        );
        assert_eq!(Value::String("nope".into()).coerce(ParamKind::Bool), None);
    }

    #[test]
    fn lookup_path_descends_nested_records() {
        let record = Value::Record(vec![(
            "user".to_string(),
            Value::Record(vec![
                ("id".to_string(), Value::Int(42)),
                ("name".to_string(), Value::String("bob".to_string())),
            ]),
        )]);
        assert_eq!(record.lookup_path("user.id"), Some(Value::Int(42)));
        assert_eq!(record.lookup_path("user.missing"), None);
        assert_eq!(record.lookup_path("missing.id"), None);
    }

    #[test]
    fn lookup_path_on_a_non_record_misses() {
        assert_eq!(Value::String("x".into()).lookup_path("anything"), None);
    }

    #[test]
    fn record_never_coerces_directly() {
        assert_eq!(Value::Record(vec![]).coerce(ParamKind::String), None);
    }
}
