#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error("server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Map a raw transport error onto something a rep can read. The panel has
/// no room for a reqwest debug dump.
pub fn user_friendly_error(error: &Error) -> String {
    let raw = error.to_string().to_lowercase();

    if raw.contains("401") || raw.contains("unauthorized") {
        return "Authentication failed. Check the coaching API key in settings.".to_string();
    }
    if raw.contains("429") || raw.contains("rate limit") {
        return "Coaching service is rate limiting. Try again in a moment.".to_string();
    }
    if raw.contains("timed out") || raw.contains("timeout") {
        return "The coaching service timed out. Check your connection.".to_string();
    }
    if raw.contains("connection refused") || raw.contains("dns") || raw.contains("connect") {
        return "Could not reach the coaching service. Check your connection.".to_string();
    }

    error.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_map_to_readable_messages() {
        let err = Error::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: "nope".into(),
        };
        assert!(user_friendly_error(&err).contains("Authentication failed"));
    }

    #[test]
    fn unknown_errors_pass_through() {
        let err = Error::InvalidUrl("not-a-url".into());
        assert_eq!(user_friendly_error(&err), "invalid endpoint url: not-a-url");
    }
}
