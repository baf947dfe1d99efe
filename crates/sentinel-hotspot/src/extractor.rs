//! Argument extraction: turning a request's attachments, headers, metadata,
//! and positional arguments into the single [`Value`] a hotspot rule governs
//! on, per §4.6 of the governance spec.

use sentinel_core::{ParamKind, Value};

use crate::rule::{HotspotRule, ParamSource};

/// A minimal view over a request's carried data, implemented by the
/// embedding application. Attachments take priority over headers, which take
/// priority over metadata, which take priority over the positional argument
/// list — mirroring the layering an RPC framework typically exposes (an
/// explicit attachment set above wire-level headers/metadata above the call's
/// own arguments).
pub trait ExtractableRequest {
    fn attachment(&self, key: &str) -> Option<&str>;
    fn header(&self, key: &str) -> Option<&str>;
    fn metadata(&self, key: &str) -> Option<&str>;
    /// A positional argument, in its original shape — a [`Value::Record`] if
    /// the call site passed a structured record, otherwise a scalar.
    fn positional(&self, index: usize) -> Option<&Value>;
    fn positional_len(&self) -> usize;
}

/// Extracts the governance key `rule` requires from `req`, applying its
/// declared [`ParamSource`] and then type-coercing to its declared
/// [`ParamKind`].
///
/// Returns `None` on any miss — an absent field or a value that does not
/// coerce to the declared kind are both extraction misses, never silently
/// defaulted to a "default bucket" (see §4.6's edge case on coercion
/// failure).
pub fn extract<R: ExtractableRequest + ?Sized>(rule: &HotspotRule, req: &R) -> Option<Value> {
    let raw = match rule.param_source() {
        ParamSource::Attachment => req.attachment(rule.param_key())?,
        ParamSource::Header => req.header(rule.param_key())?,
        ParamSource::Metadata => req.metadata(rule.param_key())?,
        ParamSource::Arg => return extract_positional(rule, req),
    };
    Value::String(raw.to_string()).coerce(rule.param_kind())
}

/// Resolves the governance key from the positional argument list, per §4.6
/// step 4 (confirmed against the original's `extractArgs`):
///
/// 1. If `args[0]` is a [`Value::Record`], resolve `param_key` as a dotted
///    path against it — regardless of `param_index` — and stop there; a
///    struct at `args[0]` never falls through to the `k=v` scan or the
///    index fallback.
/// 2. Otherwise scan *every* argument (not just the one at `param_index`)
///    for a `"k=v"`-shaped string entry whose key matches `param_key`.
/// 3. Otherwise fall back to `param_index` (negative counts from the end)
///    and take that argument's raw value unparsed.
fn extract_positional<R: ExtractableRequest + ?Sized>(rule: &HotspotRule, req: &R) -> Option<Value> {
    let len = req.positional_len();
    if len == 0 {
        return None;
    }

    if let Some(first @ Value::Record(_)) = req.positional(0) {
        return first.lookup_path(rule.param_key())?.coerce(rule.param_kind());
    }

    if !rule.param_key().is_empty() {
        for i in 0..len {
            if let Some(Value::String(s)) = req.positional(i) {
                if let Some(v) = key_value_lookup(s, rule.param_key()) {
                    return Value::String(v).coerce(rule.param_kind());
                }
            }
        }
    }

    let index = if rule.param_index() < 0 {
        let from_end = (-rule.param_index()) as usize;
        if from_end > len {
            return None;
        }
        len - from_end
    } else {
        rule.param_index() as usize
    };

    let raw = req.positional(index)?;
    Value::String(raw.canonical()).coerce(rule.param_kind())
}

/// Looks up a single `"key=value"` entry directly, the shape a scalar
/// positional argument carrying an inline key takes.
fn key_value_lookup(raw: &str, key: &str) -> Option<String> {
    let (k, v) = raw.split_once('=')?;
    (k == key).then(|| v.to_string())
}
