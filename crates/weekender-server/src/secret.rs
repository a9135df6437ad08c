//! Secret reference resolver.
//!
//! Values in the venue file can point at the environment instead of holding
//! a calendar ID inline:
//!
//! - `env::VAR_NAME`: reads `$VAR_NAME`
//! - anything else is returned as-is

/// Resolves a value that may contain an `env::` reference.
pub fn resolve(value: &str) -> Result<String, String> {
    match value.strip_prefix("env::") {
        Some(var) => resolve_env(var),
        None => Ok(value.to_string()),
    }
}

/// Reads an environment variable; an empty value counts as unset.
fn resolve_env(var: &str) -> Result<String, String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(format!("environment variable `{}` is empty", var)),
        Err(_) => Err(format!("environment variable `{}` is not set", var)),
    }
}
