//! Seam between the actor and the generative backend.

use async_trait::async_trait;

use crate::Error;

/// Produces a personalized document from a base document and its edit history.
///
/// Implementations make one backend call per invocation and never retry.
/// `history` is never empty and is ordered oldest first; its last entry is
/// the edit being applied now.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, base_document: &str, page: &str, history: &[String]) -> Result<String, Error>;
}
