//! HTTP helpers shared by the provider adapters.

use parley_application::ports::llm_gateway::{CompletionRequest, Credential, GatewayError};
use parley_domain::util::preview;
use reqwest::{Response, StatusCode};
use std::time::Duration;

/// Only connecting is bounded; a slow reply is stopped by cancellation.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("Failed to create HTTP client")
}

/// The request's credential, else the adapter's own.
///
/// Fails before any network call when neither is present.
pub(crate) fn resolve_credential<'a>(
    request: &'a CompletionRequest,
    configured: Option<&'a Credential>,
    hint: &str,
) -> Result<&'a Credential, GatewayError> {
    request
        .credential
        .as_ref()
        .or(configured)
        .ok_or_else(|| GatewayError::Configuration(hint.to_string()))
}

pub(crate) fn classify_reqwest_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Transport(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        GatewayError::Transport(format!("Connection failed: {e}"))
    } else if e.is_decode() {
        GatewayError::Provider(format!("Malformed response: {e}"))
    } else {
        GatewayError::Transport(format!("Network error: {e}"))
    }
}

pub(crate) fn classify_status(status: StatusCode, body: &str) -> GatewayError {
    let message = error_message(body);
    match status.as_u16() {
        401 | 403 => GatewayError::Authentication(format!("HTTP {status}: {message}")),
        _ => GatewayError::Provider(format!("HTTP {status}: {message}")),
    }
}

/// Pass successful responses through; turn anything else into an error.
pub(crate) async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, &body))
}

/// `error.message` from a JSON error body, else a preview of the raw body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message").or(Some(error)))
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| preview(body.trim(), 200))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_domain::{Message, Model};

    #[test]
    fn client_builds_with_default_tls() {
        let _client = build_client();
    }

    #[test]
    fn request_credential_wins_over_configured() {
        let configured = Credential::new("configured");
        let request = CompletionRequest::new(&[Message::user("hi")], Model::default())
            .with_credential(Credential::new("per-request"));

        let credential = resolve_credential(&request, configured.as_ref(), "hint").unwrap();
        assert_eq!(credential.expose(), "per-request");
    }

    #[test]
    fn missing_credential_is_configuration_error() {
        let request = CompletionRequest::new(&[Message::user("hi")], Model::default());
        let err = resolve_credential(&request, None, "set DEEPSEEK_API_KEY").unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(m) if m == "set DEEPSEEK_API_KEY"));
    }

    #[test]
    fn auth_statuses_classify_as_authentication() {
        for code in [401, 403] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(matches!(
                classify_status(status, "{}"),
                GatewayError::Authentication(_)
            ));
        }
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            GatewayError::Provider(_)
        ));
    }

    #[test]
    fn error_message_prefers_json_message() {
        let body = r#"{"error":{"message":"Authentication Fails","type":"authentication_error"}}"#;
        assert_eq!(error_message(body), "Authentication Fails");
        assert_eq!(error_message(r#"{"error":"bad key"}"#), "bad key");
        assert_eq!(error_message("  upstream timeout \n"), "upstream timeout");
    }
}
