//! Shared HTTP plumbing for the controller clients

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use netops_core::config::ControllerSettings;
use netops_core::{Error, Result};

/// Build a reqwest client for one controller session.
///
/// Certificate verification stays on unless the settings opt out, and
/// opting out is logged every time a client is built.
pub fn build_client(name: &str, settings: &ControllerSettings) -> Result<Client> {
    if settings.insecure_tls {
        warn!(
            "{} client built with TLS certificate verification DISABLED for {}",
            name, settings.base_url
        );
    }

    Client::builder()
        .danger_accept_invalid_certs(settings.insecure_tls)
        .timeout(settings.timeout)
        .connect_timeout(settings.timeout.min(std::time::Duration::from_secs(10)))
        .build()
        .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))
}

/// Join a controller base URL and an API path
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Map transport errors onto the taxonomy
pub fn transport_error(err: reqwest::Error) -> Error {
    match err.status() {
        Some(status) => Error::network(Some(status.as_u16()), err.to_string()),
        None => Error::transport(err.to_string()),
    }
}

/// Turn a response into JSON, or a network/auth error for non-2xx.
pub async fn json_or_error(response: Response) -> Result<Value> {
    let status = response.status();
    let url = response.url().to_string();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("{} -> {}: {}", url, status, truncate(&body, 500));
        return Err(status_error(status, &body));
    }

    let text = response.text().await.map_err(transport_error)?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| {
        Error::network(
            Some(status.as_u16()),
            format!("Invalid JSON from {}: {}", url, e),
        )
    })
}

pub fn status_error(status: StatusCode, body: &str) -> Error {
    let message = format!(
        "{} {}",
        status,
        truncate(body.trim(), 300)
    );
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::auth(message),
        _ => Error::network(Some(status.as_u16()), message),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://apic.lab/", "/api/node/class/fvTenant.json"),
            "https://apic.lab/api/node/class/fvTenant.json"
        );
        assert_eq!(
            join_url("https://ise.lab", "ers/config/networkdevice"),
            "https://ise.lab/ers/config/networkdevice"
        );
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "denied"),
            Error::Auth(_)
        ));
        match status_error(StatusCode::NOT_FOUND, "no such class") {
            Error::Network { status, message } => {
                assert_eq!(status, Some(404));
                assert!(message.contains("no such class"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
