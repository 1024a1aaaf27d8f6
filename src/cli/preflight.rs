//! Pre-flight checks before operations that call the model.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail on the first question.

use crate::config::Settings;
use crate::error::{CoursemateError, Result};
use tracing::warn;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions requires an API key.
    Ask,
    /// Listing courses only reads the catalog.
    Courses,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => {
            check_api_key()?;
            check_catalog(settings);
        }
        Operation::Courses => check_catalog(settings),
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(CoursemateError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(CoursemateError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// A missing catalog is not fatal; searches simply find nothing.
fn check_catalog(settings: &Settings) {
    let path = settings.catalog_path();
    if !path.exists() {
        warn!("Course catalog not found at {:?}", path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_courses_no_requirements() {
        let mut settings = Settings::default();
        settings.search.catalog_path = "/nonexistent/catalog.json".to_string();
        assert!(check(Operation::Courses, &settings).is_ok());
    }
}
