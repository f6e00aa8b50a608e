use serde::Deserialize;
use thiserror::Error;

/// Literal marker in front of every progress payload.
pub const FRAME_MARKER: &str = "data:";

/// One decoded progress update. Every field is optional; a frame carrying
/// none of them is valid and changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ProgressFrame {
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    /// Error detail sent alongside `"status": "Error"`.
    #[serde(default)]
    pub message: Option<String>,
    /// Sent with the final frame once the repository is indexed.
    #[serde(default)]
    pub repository_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("malformed progress frame: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProgressFrame {
    /// Strips the `data:` marker and surrounding whitespace, then parses the
    /// remaining JSON object.
    pub fn parse(raw: &str) -> Result<Self, FrameError> {
        let trimmed = raw.trim_start();
        let body = trimmed.strip_prefix(FRAME_MARKER).unwrap_or(trimmed).trim();
        if body.is_empty() {
            return Err(FrameError::Empty);
        }
        Ok(serde_json::from_str(body)?)
    }

    pub fn is_complete(&self) -> bool {
        self.progress.is_some_and(|progress| progress >= 100)
    }
}
