//! OpenAI client configuration with sensible defaults.

use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client with a custom timeout.
///
/// A hung model call surfaces as a timeout error from the HTTP layer; nothing
/// above this client imposes its own deadline.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_without_network() {
        assert!(create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS)).is_ok());
    }
}
