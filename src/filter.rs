//! Capability filtering for `initialize` responses
//!
//! A server advertises its features under `result.capabilities`; every key
//! ending in `Provider` names one capability. The filter forces the selected
//! provider keys to `false` and leaves everything else as received.

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

/// Suffix identifying a provider key in a capability map
pub const PROVIDER_SUFFIX: &str = "Provider";

/// How the provider list is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Mode {
    /// Allow only the listed providers
    Enable,
    /// Allow all providers except the listed ones
    Disable,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enable => write!(f, "enable"),
            Self::Disable => write!(f, "disable"),
        }
    }
}

/// Immutable (mode, provider set) pair deciding which provider keys are
/// forced to `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    mode: Mode,
    providers: HashSet<String>,
}

impl FilterPolicy {
    /// Build a policy from provider base names (e.g. `completion`, `hover`).
    pub fn new<I, S>(mode: Mode, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode,
            providers: providers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn providers(&self) -> &HashSet<String> {
        &self.providers
    }

    /// Whether the provider with this base name must be reported as `false`.
    pub fn suppresses(&self, base: &str) -> bool {
        let listed = self.providers.contains(base);
        match self.mode {
            Mode::Enable => !listed,
            Mode::Disable => listed,
        }
    }
}

/// Result of running the filter over one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The message carried `result.capabilities`; lists the provider keys
    /// that were forced to `false` (possibly none).
    Applied { suppressed: Vec<String> },
    /// No capability map in this message; it was left untouched
    NotApplicable,
}

impl FilterOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Base name of a provider key, or None for non-provider keys.
///
/// `"Provider"` alone is a provider key with an empty base name.
pub fn provider_base(key: &str) -> Option<&str> {
    key.strip_suffix(PROVIDER_SUFFIX)
}

/// Rewrite the capability map of `message` in place according to `policy`.
pub fn filter_capabilities(message: &mut Value, policy: &FilterPolicy) -> FilterOutcome {
    let Some(capabilities) = message
        .as_object_mut()
        .and_then(|root| root.get_mut("result"))
        .and_then(Value::as_object_mut)
        .and_then(|result| result.get_mut("capabilities"))
        .and_then(Value::as_object_mut)
    else {
        return FilterOutcome::NotApplicable;
    };

    let mut suppressed = Vec::new();
    for (key, value) in capabilities.iter_mut() {
        let Some(base) = provider_base(key) else {
            continue;
        };
        if policy.suppresses(base) {
            *value = Value::Bool(false);
            suppressed.push(key.clone());
        }
    }

    FilterOutcome::Applied { suppressed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn initialize_response(capabilities: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 0,
            "result": { "capabilities": capabilities }
        })
    }

    fn three_providers() -> Value {
        initialize_response(json!({
            "completionProvider": true,
            "hoverProvider": true,
            "renameProvider": true
        }))
    }

    #[test]
    fn test_enable_mode_keeps_only_listed() {
        let mut message = three_providers();
        let policy = FilterPolicy::new(Mode::Enable, ["completion"]);

        let outcome = filter_capabilities(&mut message, &policy);

        assert!(outcome.is_applied());
        assert_eq!(
            message["result"]["capabilities"],
            json!({
                "completionProvider": true,
                "hoverProvider": false,
                "renameProvider": false
            })
        );
    }

    #[test]
    fn test_disable_mode_drops_only_listed() {
        let mut message = three_providers();
        let policy = FilterPolicy::new(Mode::Disable, ["hover"]);

        let outcome = filter_capabilities(&mut message, &policy);

        assert_eq!(
            outcome,
            FilterOutcome::Applied {
                suppressed: vec!["hoverProvider".to_string()]
            }
        );
        assert_eq!(
            message["result"]["capabilities"],
            json!({
                "completionProvider": true,
                "hoverProvider": false,
                "renameProvider": true
            })
        );
    }

    #[test]
    fn test_enable_does_not_force_true() {
        let mut message = initialize_response(json!({"hoverProvider": false}));
        let policy = FilterPolicy::new(Mode::Enable, ["hover", "completion"]);

        filter_capabilities(&mut message, &policy);

        assert_eq!(
            message["result"]["capabilities"],
            json!({"hoverProvider": false})
        );
    }

    #[test]
    fn test_non_provider_keys_untouched() {
        for mode in [Mode::Enable, Mode::Disable] {
            let mut message = initialize_response(json!({
                "experimental": {"foo": true},
                "textDocumentSync": 2,
                "hoverProvider": true
            }));
            let policy = FilterPolicy::new(mode, Vec::<String>::new());

            filter_capabilities(&mut message, &policy);

            let caps = &message["result"]["capabilities"];
            assert_eq!(caps["experimental"], json!({"foo": true}));
            assert_eq!(caps["textDocumentSync"], json!(2));
        }
    }

    #[test]
    fn test_non_boolean_provider_overwritten_with_false() {
        let mut message = initialize_response(json!({
            "completionProvider": {"triggerCharacters": ["."]},
            "codeLensProvider": {"resolveProvider": true}
        }));
        let policy = FilterPolicy::new(Mode::Disable, ["completion"]);

        filter_capabilities(&mut message, &policy);

        let caps = &message["result"]["capabilities"];
        assert_eq!(caps["completionProvider"], json!(false));
        // Nested provider keys are not part of the capability map
        assert_eq!(caps["codeLensProvider"], json!({"resolveProvider": true}));
    }

    #[test]
    fn test_suffix_is_case_sensitive() {
        let mut message = initialize_response(json!({"hoverprovider": true}));
        let policy = FilterPolicy::new(Mode::Enable, Vec::<String>::new());

        filter_capabilities(&mut message, &policy);

        assert_eq!(message["result"]["capabilities"]["hoverprovider"], json!(true));
    }

    #[test]
    fn test_bare_provider_key_has_empty_base() {
        assert_eq!(provider_base("Provider"), Some(""));

        let mut message = initialize_response(json!({"Provider": true}));
        filter_capabilities(&mut message, &FilterPolicy::new(Mode::Disable, [""]));
        assert_eq!(message["result"]["capabilities"]["Provider"], json!(false));

        let mut message = initialize_response(json!({"Provider": true}));
        filter_capabilities(&mut message, &FilterPolicy::new(Mode::Enable, [""]));
        assert_eq!(message["result"]["capabilities"]["Provider"], json!(true));
    }

    #[test]
    fn test_not_applicable_messages_unchanged() {
        let cases = vec![
            json!([1, 2, 3]),
            json!("initialize"),
            json!({"jsonrpc": "2.0", "method": "window/logMessage", "params": {}}),
            json!({"jsonrpc": "2.0", "id": 1, "result": null}),
            json!({"jsonrpc": "2.0", "id": 1, "result": {"items": []}}),
            json!({"jsonrpc": "2.0", "id": 1, "result": {"capabilities": true}}),
            json!({"jsonrpc": "2.0", "id": 1, "result": {"capabilities": ["hoverProvider"]}}),
        ];
        let policy = FilterPolicy::new(Mode::Enable, Vec::<String>::new());

        for case in cases {
            let mut message = case.clone();
            assert_eq!(
                filter_capabilities(&mut message, &policy),
                FilterOutcome::NotApplicable
            );
            assert_eq!(message, case);
        }
    }

    #[test]
    fn test_empty_capability_map_is_applicable() {
        let mut message = initialize_response(json!({}));
        let policy = FilterPolicy::new(Mode::Enable, Vec::<String>::new());

        assert_eq!(
            filter_capabilities(&mut message, &policy),
            FilterOutcome::Applied { suppressed: vec![] }
        );
    }

    #[test]
    fn test_duplicate_providers_are_harmless() {
        let policy = FilterPolicy::new(Mode::Disable, ["hover", "hover"]);
        assert_eq!(policy.providers().len(), 1);
        assert!(policy.suppresses("hover"));
        assert!(!policy.suppresses("completion"));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Enable.to_string(), "enable");
        assert_eq!(Mode::Disable.to_string(), "disable");
    }
}
