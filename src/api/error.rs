use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("session refresh failed")]
    RefreshFailed,

    #[error("protocol violation: {0}")]
    Protocol(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        // back off to a char boundary so multibyte bodies cannot panic the slice
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    /// Build an `Http` error from a non-2xx status and its raw body
    pub fn http(status: StatusCode, body: &str) -> Self {
        ApiError::Http {
            status,
            body: Self::truncate_body(body),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Http {
                status: StatusCode::UNAUTHORIZED,
                ..
            }
        )
    }
}
