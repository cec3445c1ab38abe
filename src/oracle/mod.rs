// Similarity oracle — trait-based abstraction over the LLM transport.
//
// SimilarityOracle is the interface the comparator calls. ChatCompletionOracle
// and DirectHttpOracle are the two transports; `create_oracle` picks one from
// configuration.

pub mod chat;
pub mod direct;
pub mod rate_limiter;
pub mod traits;
pub mod wire;

use anyhow::Result;
use tracing::info;

use crate::config::{Config, OracleBackend};

pub use traits::SimilarityOracle;

const USER_AGENT: &str = concat!("comment-matcher/", env!("CARGO_PKG_VERSION"));

/// Create the oracle selected by `config.oracle_backend`.
///
/// Call `Config::require_oracle` first; this does not re-check credentials.
pub fn create_oracle(config: &Config) -> Result<Box<dyn SimilarityOracle>> {
    match config.oracle_backend {
        OracleBackend::Chat => {
            info!(model = %config.openai_model, "Using chat-completion oracle");
            let mut oracle = chat::ChatCompletionOracle::new(
                &config.openai_base_url,
                config.openai_api_key.clone(),
                config.openai_model.clone(),
                config.request_timeout,
            )?;
            if let Some(interval) = config.request_interval {
                oracle = oracle.with_rate_limit(interval);
            }
            Ok(Box::new(oracle))
        }
        OracleBackend::Direct => {
            info!("Using direct endpoint oracle");
            let mut oracle = direct::DirectHttpOracle::new(
                config.azure_endpoint.clone(),
                config.azure_api_key.clone(),
                config.request_timeout,
            )?;
            if let Some(interval) = config.request_interval {
                oracle = oracle.with_rate_limit(interval);
            }
            Ok(Box::new(oracle))
        }
    }
}
