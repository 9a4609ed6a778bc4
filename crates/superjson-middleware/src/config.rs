use serde::{Deserialize, Serialize};

/// Options for [`superjson_middleware`](crate::superjson_middleware).
///
/// Reserved: no option is recognized yet. Deserializing accepts any keys and
/// ignores them, so existing config files keep loading when options appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct MiddlewareConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_keys_are_ignored() {
        let config: MiddlewareConfig = serde_json::from_value(json!({"dedupe": true, "x": [1]})).unwrap();
        assert_eq!(config, MiddlewareConfig::default());
        let config: MiddlewareConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, MiddlewareConfig::default());
    }
}
