//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// `${VAR}` fails when VAR is unset. Bare `$VAR` is left untouched, and
/// strings without `${` are returned as-is.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var).map(Some).map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Name of a referenced variable that is not set.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_expand_set_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("UMLHUB_TEST_EXPAND_SET", "render.internal");
        }
        let result = expand_env("http://${UMLHUB_TEST_EXPAND_SET}:8080", "renderer.base_url").unwrap();
        assert_eq!(result, "http://render.internal:8080");
        unsafe {
            std::env::remove_var("UMLHUB_TEST_EXPAND_SET");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("UMLHUB_TEST_EXPAND_UNSET");
        }
        let result = expand_env("${UMLHUB_TEST_EXPAND_UNSET:-fallback}", "github.token").unwrap();
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_expand_empty_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("UMLHUB_TEST_EXPAND_EMPTY");
        }
        let result = expand_env("${UMLHUB_TEST_EXPAND_EMPTY:-}", "github.token").unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("UMLHUB_TEST_EXPAND_MISSING");
        }
        let err = expand_env("${UMLHUB_TEST_EXPAND_MISSING}", "store.database_url").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("UMLHUB_TEST_EXPAND_MISSING"));
        assert!(err.to_string().contains("store.database_url"));
    }

    #[test]
    fn test_expand_literal_and_bare_dollar_unchanged() {
        assert_eq!(expand_env("literal", "f").unwrap(), "literal");
        assert_eq!(expand_env("$HOME/x", "f").unwrap(), "$HOME/x");
    }
}
