// Similarity oracle trait — the transport-agnostic seam.
//
// The comparator only ever sees `SimilarityOracle`. Which LLM endpoint sits
// behind it (chat-completion by model name, or a direct deployment URL) is
// chosen once from configuration.

use async_trait::async_trait;

use crate::error::OracleError;

/// An external text-completion capability: prompt in, reply text out.
///
/// Implementations must be async because every provider is an HTTP call,
/// and `Send + Sync` so one oracle can serve concurrent pairs.
#[async_trait]
pub trait SimilarityOracle: Send + Sync {
    /// Send one prompt and return the trimmed reply text.
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}
