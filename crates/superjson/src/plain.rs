//! Projection of a document onto plain JSON, with `JSON.stringify`
//! semantics. This is what a response looks like when no extended encoder
//! is installed.

use std::io;

use serde_json::ser::Formatter;
use serde_json::Value as Json;

use crate::error::PlainJsonError;
use crate::types::to_iso_string;
use crate::value::{Document, Node, NodeId, Value};

/// `Number.MAX_SAFE_INTEGER`; integral values up to it are written as JSON
/// integers.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// JSON number for a finite `f64`. Safe integers become integer numbers;
/// everything else stays a float and is printed by [`JsFormatter`].
pub(crate) fn js_number(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Json::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(Json::Null, Json::Number)
}

/// Text of a number as `Number.prototype.toString` prints it: shortest
/// round-trip digits, plain decimal for exponents in `-7..21`, otherwise
/// `d.ddde+x` with an explicit exponent sign.
pub(crate) fn js_number_text(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let sign = if n < 0.0 { "-" } else { "" };
    // `{:e}` gives the shortest round-trip digits as `d.ddde<x>`.
    let sci = format!("{:e}", n.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // Decimal point position relative to the first digit.
    let point = exp.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else {
        let (first, rest) = digits.split_at(1);
        let e = point - 1;
        let e_sign = if e < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{first}e{e_sign}{}", e.unsigned_abs())
        } else {
            format!("{first}.{rest}e{e_sign}{}", e.unsigned_abs())
        }
    };
    format!("{sign}{body}")
}

/// Compact JSON formatter that prints floats like JavaScript.
struct JsFormatter;

impl Formatter for JsFormatter {
    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(js_number_text(value).as_bytes())
    }
}

/// Writes compact JSON text the way `JSON.stringify` would print it.
pub fn to_js_string(json: &Json) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, JsFormatter);
    serde::Serialize::serialize(json, &mut ser)?;
    String::from_utf8(buf).map_err(|e| serde_json::Error::io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

impl Document {
    /// The root as `JSON.stringify` would render it.
    ///
    /// - dates become ISO strings and URLs their href;
    /// - maps, sets and regexps become `{}`;
    /// - errors keep only their extra props;
    /// - `undefined` fields are dropped and `undefined` array slots become
    ///   `null`; an `undefined` root gives `None`;
    /// - `NaN` and infinities become `null`;
    /// - big integers and cycles are errors.
    pub fn to_plain_json(&self) -> Result<Option<Json>, PlainJsonError> {
        let mut stack = Vec::new();
        self.plain(self.root(), &mut stack)
    }

    pub(crate) fn plain(&self, value: &Value, stack: &mut Vec<NodeId>) -> Result<Option<Json>, PlainJsonError> {
        let json = match value {
            Value::Undefined => return Ok(None),
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) if n.is_finite() => js_number(*n),
            Value::Number(_) => Json::Null,
            Value::String(s) => Json::String(s.clone()),
            Value::BigInt(_) => return Err(PlainJsonError::BigInt),
            Value::Ref(id) => {
                let node = self.node_by_id(*id).ok_or(PlainJsonError::DanglingRef(id.index()))?;
                match node {
                    Node::Date(d) => Json::String(to_iso_string(d)),
                    Node::Url(u) => Json::String(u.as_str().to_string()),
                    Node::RegExp(_) | Node::Map(_) | Node::Set(_) => Json::Object(serde_json::Map::new()),
                    Node::Error(e) => Json::Object(e.props.clone()),
                    Node::Object(fields) => {
                        if stack.contains(id) {
                            return Err(PlainJsonError::Circular);
                        }
                        stack.push(*id);
                        let mut out = serde_json::Map::new();
                        for (k, v) in fields {
                            if let Some(json) = self.plain(v, stack)? {
                                out.insert(k.clone(), json);
                            }
                        }
                        stack.pop();
                        Json::Object(out)
                    }
                    Node::Array(items) => {
                        if stack.contains(id) {
                            return Err(PlainJsonError::Circular);
                        }
                        stack.push(*id);
                        let mut out = Vec::with_capacity(items.len());
                        for item in items {
                            out.push(self.plain(item, stack)?.unwrap_or(Json::Null));
                        }
                        stack.pop();
                        Json::Array(out)
                    }
                }
            }
        };
        Ok(Some(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BigInt, ErrorObject, RegExp};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn numbers_print_like_javascript() {
        let text = |n: f64| to_js_string(&js_number(n)).unwrap();
        assert_eq!(text(42.0), "42");
        assert_eq!(text(-0.0), "0");
        assert_eq!(text(1.5), "1.5");
        assert_eq!(text(9_007_199_254_740_991.0), "9007199254740991");
        assert_eq!(text(1e18), "1000000000000000000");
        assert_eq!(text(2f64.powi(64)), "18446744073709552000");
        assert_eq!(text(1e20), "100000000000000000000");
        assert_eq!(text(1e21), "1e+21");
        assert_eq!(text(1.5e300), "1.5e+300");
        assert_eq!(text(-1.25e-7), "-1.25e-7");
        assert_eq!(text(0.000001), "0.000001");
        assert_eq!(text(123.456), "123.456");
        assert_eq!(js_number_text(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn js_text_parses_back_to_the_same_float() {
        for n in [2f64.powi(64), 1e21, 1.5e300, 1.2761204204598835e-188, 0.1 + 0.2] {
            let text = to_js_string(&js_number(n)).unwrap();
            let back: Json = serde_json::from_str(&text).unwrap();
            assert_eq!(back.as_f64(), Some(n), "{text}");
        }
    }

    #[test]
    fn extended_values_degrade() {
        let mut doc = Document::new();
        let date = doc.new_date(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        let map = doc.new_map([("k", "v")]);
        let set = doc.new_set(["a"]);
        let re = doc.new_regexp(RegExp::new("x", "g").unwrap());
        let err = doc.new_error(ErrorObject::new("boom").with_prop("code", json!(7)));
        let url = doc.new_url("https://example.com".parse().unwrap());
        let arr = doc.new_array([Value::Undefined, Value::Number(f64::NAN)]);
        let root = doc.new_object([
            ("date", date),
            ("map", map),
            ("set", set),
            ("re", re),
            ("err", err),
            ("url", url),
            ("gone", Value::Undefined),
            ("arr", arr),
        ]);
        doc.set_root(root);

        assert_eq!(
            doc.to_plain_json().unwrap(),
            Some(json!({
                "date": "2023-01-01T00:00:00.000Z",
                "map": {},
                "set": {},
                "re": {},
                "err": {"code": 7},
                "url": "https://example.com/",
                "arr": [null, null]
            }))
        );
    }

    #[test]
    fn bigint_and_cycles_fail() {
        let mut doc = Document::new();
        doc.set_root(BigInt::from(1));
        assert_eq!(doc.to_plain_json(), Err(PlainJsonError::BigInt));

        let mut doc = Document::new();
        let root = doc.new_object([("a", 1)]);
        doc.set_field(&root, "self", root.clone());
        doc.set_root(root);
        assert_eq!(doc.to_plain_json(), Err(PlainJsonError::Circular));
    }

    #[test]
    fn shared_without_cycle_is_duplicated() {
        let mut doc = Document::new();
        let shared = doc.new_array([1]);
        let root = doc.new_array([shared.clone(), shared]);
        doc.set_root(root);
        assert_eq!(doc.to_plain_json().unwrap(), Some(json!([[1], [1]])));
        assert_eq!(Document::new().to_plain_json().unwrap(), None);
    }
}
