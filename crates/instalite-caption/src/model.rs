use async_trait::async_trait;

use crate::CaptionError;

/// A hosted model that can answer a text prompt about one image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &'static str;

    /// Ask `prompt` about the image at `image_url` (usually a `data:` URL).
    ///
    /// Returns `Ok(None)` when the model answered without any text.
    async fn describe(&self, prompt: &str, image_url: &str) -> Result<Option<String>, CaptionError>;
}
