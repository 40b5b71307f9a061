//! Generative text model abstraction.

use super::ModelError;
use async_trait::async_trait;

/// A text-in, text-out generative model.
///
/// Implementations classify failures into [`super::ModelErrorKind`] so the
/// retry loop never has to inspect error text.
#[async_trait]
pub trait TextModel: Send + Sync + 'static {
    /// Model identifier used in logs and metrics (e.g. "gemini-1.5-flash").
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}
