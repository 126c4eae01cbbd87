// covidsync/src/api/outcome.rs
use reqwest::StatusCode;
use std::fmt;

/// Result of a request that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Success(T),
    Failed(HttpFailure),
}

/// Non-200 responses, with the ones the API documents broken out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpFailure {
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
    Unexpected { status: u16, reason: String },
}

impl HttpFailure {
    pub fn from_status(status: StatusCode) -> Self {
        Self::from_status_and_reason(status, None)
    }

    /// `reason` is the phrase the server sent on the status line. hyper only
    /// surfaces it when it differs from the canonical one.
    pub fn from_status_and_reason(status: StatusCode, reason: Option<&str>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => HttpFailure::Unauthorized,
            StatusCode::NOT_FOUND => HttpFailure::NotFound,
            StatusCode::METHOD_NOT_ALLOWED => HttpFailure::MethodNotAllowed,
            StatusCode::INTERNAL_SERVER_ERROR => HttpFailure::InternalServerError,
            other => HttpFailure::Unexpected {
                status: other.as_u16(),
                reason: reason
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .or_else(|| other.canonical_reason())
                    .unwrap_or("")
                    .to_string(),
            },
        }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpFailure::Unauthorized => write!(
                f,
                "Response status was 401 - unauthorized: your request requires some additional permissions"
            ),
            HttpFailure::NotFound => write!(
                f,
                "Response status was 404 - not found: the requested resource does not exist"
            ),
            HttpFailure::MethodNotAllowed => write!(
                f,
                "Response status was 405 - method not allowed: the endpoint does not allow for that specific HTTP method"
            ),
            HttpFailure::InternalServerError => write!(
                f,
                "Response status was 500 - internal server error: your request was not expected and probably broke something on the server side"
            ),
            HttpFailure::Unexpected { status, reason } => {
                write!(f, "Response status was {} - {}", status, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_statuses() {
        assert_eq!(HttpFailure::from_status(StatusCode::UNAUTHORIZED), HttpFailure::Unauthorized);
        assert_eq!(HttpFailure::from_status(StatusCode::NOT_FOUND), HttpFailure::NotFound);
        assert_eq!(
            HttpFailure::from_status(StatusCode::METHOD_NOT_ALLOWED),
            HttpFailure::MethodNotAllowed
        );
        assert_eq!(
            HttpFailure::from_status(StatusCode::INTERNAL_SERVER_ERROR),
            HttpFailure::InternalServerError
        );
    }

    #[test]
    fn test_other_statuses_carry_code_and_reason() {
        let failure = HttpFailure::from_status(StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            failure,
            HttpFailure::Unexpected {
                status: 429,
                reason: "Too Many Requests".to_string()
            }
        );
        assert_eq!(failure.to_string(), "Response status was 429 - Too Many Requests");
    }

    #[test]
    fn test_server_reason_phrase_wins_over_canonical() {
        let failure =
            HttpFailure::from_status_and_reason(StatusCode::TOO_MANY_REQUESTS, Some("Slow Down"));
        assert_eq!(failure.to_string(), "Response status was 429 - Slow Down");

        let failure = HttpFailure::from_status_and_reason(StatusCode::BAD_GATEWAY, Some(""));
        assert_eq!(failure.to_string(), "Response status was 502 - Bad Gateway");

        // documented statuses keep their fixed diagnostics
        assert_eq!(
            HttpFailure::from_status_and_reason(StatusCode::NOT_FOUND, Some("Nope")),
            HttpFailure::NotFound
        );
    }

    #[test]
    fn test_unregistered_status_without_phrase_has_empty_reason() -> anyhow::Result<()> {
        let failure = HttpFailure::from_status(StatusCode::from_u16(599)?);
        assert_eq!(
            failure,
            HttpFailure::Unexpected {
                status: 599,
                reason: String::new()
            }
        );
        Ok(())
    }

    #[test]
    fn test_405_message_names_405() {
        let msg = HttpFailure::MethodNotAllowed.to_string();
        assert!(msg.starts_with("Response status was 405"));
    }
}
