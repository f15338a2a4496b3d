use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::{info, warn};

use crate::{CaptionError, OpenAiVision, VisionModel};

/// Captions returned per request.
pub const MAX_CAPTIONS: usize = 3;

const MIN_HASHTAGS: usize = 3;
const MAX_HASHTAGS: usize = 5;

const SEPARATOR: &str = "---";

/// Suggests captions for images. Without a configured model every request
/// fails with [`CaptionError::NotConfigured`].
#[derive(Clone)]
pub struct CaptionService {
    model: Option<Arc<dyn VisionModel>>,
}

impl CaptionService {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn disabled() -> Self {
        Self { model: None }
    }

    /// Build the OpenAI-backed service when `api_key` is present.
    pub fn openai(api_key: Option<String>, model: &str) -> Self {
        let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) else {
            warn!("OPENAI_API_KEY not set, caption generation will not be available");
            return Self::disabled();
        };

        match OpenAiVision::new(api_key, model) {
            Ok(client) => {
                info!("Caption service ready (openai, model {})", model);
                Self::new(Arc::new(client))
            }
            Err(e) => {
                warn!("Failed to initialize OpenAI client: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Generate up to [`MAX_CAPTIONS`] captions for an image.
    pub async fn generate_from_bytes(&self, image: &[u8], mime_type: &str) -> Result<Vec<String>, CaptionError> {
        let model = self.model.as_ref().ok_or(CaptionError::NotConfigured)?;

        let data_url = format!("data:{};base64,{}", mime_type, B64.encode(image));

        let content = model
            .describe(&prompt(), &data_url)
            .await
            .inspect_err(|e| warn!("Caption generation via {} failed: {}", model.name(), e))?
            .ok_or(CaptionError::EmptyResponse)?;

        let captions = parse_captions(&content);
        if captions.is_empty() {
            return Err(CaptionError::Unparseable);
        }
        Ok(captions)
    }
}

fn prompt() -> String {
    format!(
        "Analyze this image and generate {MAX_CAPTIONS} engaging Instagram captions. Each caption should:
1. Be descriptive and engaging (1-2 sentences)
2. Match the mood and content of the image
3. Include {MIN_HASHTAGS}-{MAX_HASHTAGS} relevant hashtags at the end
4. Be suitable for social media posting

Format each caption on a new line, separated by \"{SEPARATOR}\""
    )
}

/// Split a model answer into captions: `---` separated, trimmed, non-empty,
/// at most [`MAX_CAPTIONS`].
pub fn parse_captions(content: &str) -> Vec<String> {
    content
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .take(MAX_CAPTIONS)
        .map(String::from)
        .collect()
}

/// Hashtags in `caption`, without the leading `#`.
pub fn extract_hashtags(caption: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut rest = caption;

    while let Some(pos) = rest.find('#') {
        let after = &rest[pos + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len > 0 {
            tags.push(after[..len].to_string());
        }
        rest = &after[len..];
    }

    tags
}
