use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("server responded with status {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        status: u16,
        message: Option<String>,
        body: Option<Value>,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Message supplied by the server in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Error::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// What gets logged for a failed request: the server payload when there is
    /// one, otherwise the error text itself.
    pub fn log_payload(&self) -> String {
        match self {
            Error::Status { body: Some(body), .. } => body.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_error_prints_server_message() {
        let err = Error::Status {
            status: 422,
            message: Some("Name required".into()),
            body: Some(json!({"message": "Name required"})),
        };
        assert_eq!(err.to_string(), "server responded with status 422: Name required");
        assert_eq!(err.server_message(), Some("Name required"));
        assert_eq!(err.log_payload(), r#"{"message":"Name required"}"#);
    }

    #[test]
    fn network_error_has_no_server_message() {
        let err = Error::Network("connection refused".into());
        assert_eq!(err.server_message(), None);
        assert_eq!(err.log_payload(), "network error: connection refused");
    }
}
