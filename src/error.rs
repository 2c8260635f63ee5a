use thiserror::Error;

/// Error types for proxy operations
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Request rejected before any upstream call
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream response violated the EUtils protocol
    #[error("upstream protocol error: {message}")]
    UpstreamProtocol { message: String },

    /// Upstream answered with a non-2xx status
    #[error("upstream returned HTTP {status}")]
    UpstreamStatus { status: u16, body: String },

    /// HTTP request to upstream failed
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing failed
    #[error("XML parsing failed: {message}")]
    Xml { message: String },

    /// No database yielded a matching article
    #[error("article not found: {id}")]
    NotFound { id: String, detail: String },
}

impl ProxyError {
    /// HTTP status this error surfaces as. Upstream failures echo the
    /// upstream status when one was received.
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::InvalidRequest(_) => 400,
            ProxyError::NotFound { .. } => 404,
            ProxyError::UpstreamStatus { status, .. } => *status,
            ProxyError::Request(e) => e.status().map(|s| s.as_u16()).unwrap_or(500),
            _ => 500,
        }
    }

    /// Diagnostic detail echoed to the caller alongside the error message.
    pub fn details(&self) -> Option<String> {
        match self {
            ProxyError::UpstreamStatus { body, .. } if !body.is_empty() => Some(body.clone()),
            ProxyError::UpstreamProtocol { message } => Some(message.clone()),
            ProxyError::Request(e) if e.is_timeout() || e.is_connect() => {
                Some("no response received".to_string())
            }
            ProxyError::NotFound { detail, .. } if !detail.is_empty() => Some(detail.clone()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
