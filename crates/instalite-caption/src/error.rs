use thiserror::Error;

/// Caption generation failures. The `Display` text is what API clients see.
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("Caption generation service is not available. Please configure OPENAI_API_KEY.")]
    NotConfigured,

    #[error("No captions generated from the AI model")]
    EmptyResponse,

    #[error("Failed to parse captions from AI response")]
    Unparseable,

    #[error("Invalid OpenAI API key. Please check your configuration.")]
    InvalidApiKey,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Image file is too large. Please use a smaller image.")]
    ImageTooLarge,

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

impl CaptionError {
    /// Translate an unsuccessful upstream status.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => Self::InvalidApiKey,
            429 => Self::RateLimited,
            413 => Self::ImageTooLarge,
            _ => Self::Upstream(format!("Caption request failed with status {}: {}", status, body.trim())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn known_statuses_map_to_friendly_messages() {
        assert!(matches!(
            CaptionError::from_status(StatusCode::UNAUTHORIZED, ""),
            CaptionError::InvalidApiKey
        ));
        assert!(matches!(
            CaptionError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            CaptionError::RateLimited
        ));
        assert_eq!(
            CaptionError::from_status(StatusCode::PAYLOAD_TOO_LARGE, "").to_string(),
            "Image file is too large. Please use a smaller image."
        );
    }

    #[test]
    fn other_statuses_keep_upstream_detail() {
        let err = CaptionError::from_status(StatusCode::BAD_GATEWAY, " upstream down \n");
        assert_eq!(
            err.to_string(),
            "Caption request failed with status 502 Bad Gateway: upstream down"
        );
    }
}
