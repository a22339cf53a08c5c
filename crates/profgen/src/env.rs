use std::env;
use std::sync::OnceLock;

static UTILITY_FUNCTIONS: OnceLock<Option<bool>> = OnceLock::new();
static SYNC_HISTORY: OnceLock<Option<bool>> = OnceLock::new();
static AGGREGATION: OnceLock<Option<String>> = OnceLock::new();
static NAMESPACE_PREFIX: OnceLock<Option<String>> = OnceLock::new();

pub(crate) fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

fn read_bool(key: &str) -> Option<bool> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(parse_bool(&value)),
        _ => None,
    }
}

fn read_string(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

pub(crate) fn utility_functions() -> Option<bool> {
    *UTILITY_FUNCTIONS.get_or_init(|| read_bool("PROFGEN_UTILITY_FUNCTIONS"))
}

pub(crate) fn sync_history() -> Option<bool> {
    *SYNC_HISTORY.get_or_init(|| read_bool("PROFGEN_SYNC_HISTORY"))
}

pub(crate) fn aggregation() -> Option<&'static str> {
    AGGREGATION
        .get_or_init(|| read_string("PROFGEN_AGGREGATION"))
        .as_deref()
}

pub(crate) fn namespace_prefix() -> Option<&'static str> {
    NAMESPACE_PREFIX
        .get_or_init(|| read_string("PROFGEN_NAMESPACE_PREFIX"))
        .as_deref()
}
