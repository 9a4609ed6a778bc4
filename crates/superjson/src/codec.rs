//! The configured codec: options plus the four entry points.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{DecodeError, EncodeError};
use crate::meta::Envelope;
use crate::plain::to_js_string;
use crate::value::Document;

/// Default limit on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Encoder options.
///
/// Deserializes from camelCase keys so it can sit inside a larger config
/// file; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuperJsonOptions {
    /// Write only the first occurrence of a shared object; later
    /// occurrences become `null` and are restored from the equalities.
    pub dedupe: bool,
    /// Extra error properties copied into an `Error` payload besides
    /// `name` and `message`.
    pub allowed_error_props: Vec<String>,
    /// Maximum container nesting in `json`; deeper documents fail to
    /// encode and deeper envelopes fail to decode.
    pub max_depth: usize,
}

impl Default for SuperJsonOptions {
    fn default() -> Self {
        Self {
            dedupe: false,
            allowed_error_props: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A superjson codec instance.
#[derive(Debug, Clone, Default)]
pub struct SuperJson {
    options: SuperJsonOptions,
}

impl SuperJson {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SuperJsonOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SuperJsonOptions {
        &self.options
    }

    /// Adds an error property name to copy into `Error` payloads.
    pub fn allow_error_prop(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.options.allowed_error_props.contains(&name) {
            self.options.allowed_error_props.push(name);
        }
    }

    pub fn serialize(&self, doc: &Document) -> Result<Envelope, EncodeError> {
        Encoder::new(doc, &self.options).encode()
    }

    pub fn deserialize(&self, envelope: &Envelope) -> Result<Document, DecodeError> {
        Decoder::new(envelope).max_depth(self.options.max_depth).decode()
    }

    /// Serializes to envelope text.
    pub fn stringify(&self, doc: &Document) -> Result<String, EncodeError> {
        let envelope = self.serialize(doc)?;
        Ok(to_js_string(&envelope.to_json())?)
    }

    /// Parses envelope text back into a document.
    ///
    /// serde_json's own recursion limit (128) is lifted so anything the
    /// encoder accepts parses again; the text is instead checked against a
    /// bound derived from `max_depth` before it is parsed.
    pub fn parse(&self, text: &str) -> Result<Document, DecodeError> {
        let max_depth = self.options.max_depth;
        if nesting_depth(text) > text_depth_limit(max_depth) {
            return Err(DecodeError::DepthExceeded(max_depth));
        }
        let mut de = serde_json::Deserializer::from_str(text);
        de.disable_recursion_limit();
        let json = Json::deserialize(&mut de)?;
        de.end()?;
        self.deserialize(&Envelope::from_json(&json)?)
    }
}

/// Deepest nesting an envelope can reach: the wrapping object, `json`
/// itself, and `meta.values` where every typed container adds an array and
/// an object level.
fn text_depth_limit(max_depth: usize) -> usize {
    max_depth.saturating_mul(2).saturating_add(4)
}

/// Deepest array/object nesting in JSON text. Brackets inside strings do not
/// count.
fn nesting_depth(text: &str) -> usize {
    let (mut depth, mut max) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for b in text.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_from_camel_case() {
        let options: SuperJsonOptions =
            serde_json::from_value(json!({"dedupe": true, "allowedErrorProps": ["code"]})).unwrap();
        assert!(options.dedupe);
        assert_eq!(options.allowed_error_props, ["code"]);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn allow_error_prop_is_idempotent() {
        let mut codec = SuperJson::new();
        codec.allow_error_prop("code");
        codec.allow_error_prop("code");
        assert_eq!(codec.options().allowed_error_props, ["code"]);
    }

    #[test]
    fn nesting_depth_skips_strings() {
        assert_eq!(nesting_depth(r#"{"a":[1,{"b":[]}]}"#), 4);
        assert_eq!(nesting_depth(r#"["[[[{", "\"]", {}]"#), 2);
        assert_eq!(nesting_depth("1"), 0);
    }

    #[test]
    fn parse_rejects_text_nested_past_the_limit() {
        let codec = SuperJson::with_options(SuperJsonOptions { max_depth: 3, ..Default::default() });
        let deep = format!(r#"{{"json":{}{}}}"#, "[".repeat(20), "]".repeat(20));
        assert!(matches!(codec.parse(&deep), Err(DecodeError::DepthExceeded(3))));

        let json_too_deep = r#"{"json":[[[[1]]]]}"#;
        assert!(matches!(codec.parse(json_too_deep), Err(DecodeError::DepthExceeded(3))));
        assert!(codec.parse(r#"{"json":[[[1]]]}"#).is_ok());
    }

    #[test]
    fn plain_values_have_no_meta() {
        let codec = SuperJson::new();
        let doc = Document::from_json(&json!({"a": [1, "x", null, true]}));
        assert_eq!(codec.stringify(&doc).unwrap(), r#"{"json":{"a":[1,"x",null,true]}}"#);
        assert_eq!(codec.parse(r#"{"json":{"a":[1,"x",null,true]}}"#).unwrap(), doc);
    }
}
