use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::env;

/// How per-call timing maps with differing operator sets are averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationPolicy {
    /// Every operator seen in any call is reported, averaged over the calls
    /// that recorded it.
    #[default]
    Union,
    /// The first call fixes the operator set. Later calls only add to those
    /// names, and each total is divided by the number of calls.
    FirstCall,
}

impl AggregationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregationPolicy::Union => "union",
            AggregationPolicy::FirstCall => "first-call",
        }
    }
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "union" => Ok(AggregationPolicy::Union),
            "first-call" | "first_call" | "first" => Ok(AggregationPolicy::FirstCall),
            other => Err(format!("unknown aggregation policy '{other}'")),
        }
    }
}

pub const DEFAULT_NAMESPACE_PREFIX: &str = "profgen_";

/// Knobs for a single generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Emit `GetOpAvgTime()` next to `infer`.
    pub utility_functions: bool,
    /// Guard the emitted call history with a `std::mutex`.
    pub synchronized_history: bool,
    pub aggregation: AggregationPolicy,
    pub namespace_prefix: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            utility_functions: true,
            synchronized_history: true,
            aggregation: AggregationPolicy::Union,
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
        }
    }
}

impl GenerateOptions {
    /// Defaults overridden by `PROFGEN_*` environment variables.
    ///
    /// Unparseable aggregation values fall back to the default policy.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(enabled) = env::utility_functions() {
            options.utility_functions = enabled;
        }
        if let Some(enabled) = env::sync_history() {
            options.synchronized_history = enabled;
        }
        if let Some(policy) = env::aggregation().and_then(|value| value.parse().ok()) {
            options.aggregation = policy;
        }
        if let Some(prefix) = env::namespace_prefix() {
            options.namespace_prefix = prefix.to_string();
        }
        options
    }

    pub fn with_utility_functions(mut self, enabled: bool) -> Self {
        self.utility_functions = enabled;
        self
    }

    pub fn with_synchronized_history(mut self, enabled: bool) -> Self {
        self.synchronized_history = enabled;
        self
    }

    pub fn with_aggregation(mut self, policy: AggregationPolicy) -> Self {
        self.aggregation = policy;
        self
    }

    pub fn with_namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_policy_parses_cli_spellings() {
        assert_eq!(
            "union".parse::<AggregationPolicy>(),
            Ok(AggregationPolicy::Union)
        );
        assert_eq!(
            "First-Call".parse::<AggregationPolicy>(),
            Ok(AggregationPolicy::FirstCall)
        );
        assert!("median".parse::<AggregationPolicy>().is_err());
    }

    #[test]
    fn options_deserialize_with_missing_fields() {
        let options: GenerateOptions =
            serde_json::from_str(r#"{"aggregation": "first-call"}"#).expect("options parse");
        assert_eq!(options.aggregation, AggregationPolicy::FirstCall);
        assert!(options.utility_functions);
        assert!(options.synchronized_history);
        assert_eq!(options.namespace_prefix, DEFAULT_NAMESPACE_PREFIX);
    }
}
