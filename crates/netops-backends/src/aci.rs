//! Cisco ACI (APIC) REST client
//!
//! ## Authentication
//!
//! `POST /api/aaaLogin.json` with
//!
//! ```text
//! {"aaaUser": {"attributes": {"name": "<user>", "pwd": "<password>"}}}
//! ```
//!
//! The APIC answers with an `APIC-cookie` (also echoed as the
//! `aaaLogin.attributes.token` in the body) which is replayed on every
//! subsequent request of this client.
//!
//! The APIC expires idle tokens (`refreshTimeoutSeconds`, 600 s by
//! default). A request rejected with 401/403 drops the cached token, logs
//! in once more and is sent again; a second rejection is returned as is.

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use netops_core::config::ControllerSettings;
use netops_core::{Backend, Credentials, Error, Paging, Result};

use crate::controller::{validate_identifier, validate_payload, ControllerClient};
use crate::http::{build_client, join_url, json_or_error, status_error, transport_error};

const LOGIN_PATH: &str = "/api/aaaLogin.json";
const COOKIE_NAME: &str = "APIC-cookie";

/// APIC client owning one login session
pub struct AciClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    session_token: RwLock<Option<String>>,
}

impl AciClient {
    pub fn new(settings: &ControllerSettings, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            client: build_client("ACI", settings)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            credentials,
            session_token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a login has succeeded on this client
    pub async fn is_authenticated(&self) -> bool {
        self.session_token.read().await.is_some()
    }

    async fn token(&self) -> Result<String> {
        if let Some(token) = self.session_token.read().await.clone() {
            return Ok(token);
        }
        self.authenticate().await?;
        self.session_token
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::auth("APIC login returned no session token"))
    }

    fn with_cookie(request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header(COOKIE, format!("{}={}", COOKIE_NAME, token))
    }

    /// Forget `stale` unless another request already replaced it
    async fn drop_token(&self, stale: &str) {
        let mut token = self.session_token.write().await;
        if token.as_deref() == Some(stale) {
            *token = None;
        }
    }

    /// Send a request built by `build` on the login session.
    ///
    /// `build` is called again for the replay after a re-login, since a
    /// sent request cannot be reused.
    async fn send_with_session<F>(&self, build: F) -> Result<Value>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let token = self.token().await?;
        let response = Self::with_cookie(build(), &token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN {
            return json_or_error(response).await;
        }

        warn!(
            "APIC rejected the session token for {} ({}), logging in again",
            response.url(),
            status
        );
        self.drop_token(&token).await;
        let token = self.token().await?;
        let response = Self::with_cookie(build(), &token)
            .send()
            .await
            .map_err(transport_error)?;
        json_or_error(response).await
    }
}

fn cookie_from_headers(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn token_from_body(body: &Value) -> Option<String> {
    body.get("imdata")?
        .get(0)?
        .get("aaaLogin")?
        .get("attributes")?
        .get("token")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl ControllerClient for AciClient {
    fn backend(&self) -> Backend {
        Backend::Aci
    }

    async fn authenticate(&self) -> Result<()> {
        let url = join_url(&self.base_url, LOGIN_PATH);
        let payload = json!({
            "aaaUser": {
                "attributes": {
                    "name": self.credentials.username,
                    "pwd": self.credentials.password(),
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::auth(format!("APIC login request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(status_error(status, &body).to_string()));
        }

        let header_token = cookie_from_headers(response.headers());
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let token = header_token
            .or_else(|| token_from_body(&body))
            .ok_or_else(|| Error::auth("APIC login returned no session cookie"))?;

        info!("<Authentication Status code {} for {}>", status.as_u16(), url);
        *self.session_token.write().await = Some(token);
        Ok(())
    }

    async fn read(&self, identifier: &str, paging: Paging) -> Result<Value> {
        let path = validate_identifier(identifier)?;
        let url = join_url(&self.base_url, path);
        debug!("GET {} (page {}, size {})", url, paging.page, paging.page_size);

        let query = [
            ("page", paging.page.to_string()),
            ("page-size", paging.page_size.to_string()),
        ];
        self.send_with_session(|| self.client.get(&url).query(&query))
            .await
    }

    async fn write(&self, identifier: &str, payload: Option<&Value>) -> Result<Value> {
        let body = validate_payload(payload)?;
        let path = validate_identifier(identifier)?;
        let url = join_url(&self.base_url, path);
        debug!("POST {}", url);

        let result = self
            .send_with_session(|| self.client.post(&url).json(body))
            .await?;
        info!("APIC create on {} succeeded", path);
        Ok(result)
    }

    async fn delete(&self, identifier: &str) -> Result<Value> {
        let path = validate_identifier(identifier)?;
        let url = join_url(&self.base_url, path);
        debug!("DELETE {}", url);

        self.send_with_session(|| self.client.delete(&url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn test_cookie_from_headers() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("other=1; Path=/"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("APIC-cookie=abc123; path=/; HttpOnly; HTTPS-only"),
        );
        assert_eq!(cookie_from_headers(&headers).as_deref(), Some("abc123"));
        assert_eq!(cookie_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_token_from_body() {
        let body = json!({
            "totalCount": "1",
            "imdata": [{"aaaLogin": {"attributes": {"token": "tok", "refreshTimeoutSeconds": "600"}}}]
        });
        assert_eq!(token_from_body(&body).as_deref(), Some("tok"));
        assert_eq!(token_from_body(&json!({"imdata": []})), None);
    }

    #[tokio::test]
    async fn test_write_rejects_non_object_without_io() {
        // port 9 (discard) is never contacted: validation fails first
        let settings = ControllerSettings::new("https://127.0.0.1:9");
        let client = AciClient::new(&settings, Credentials::new("admin", "pw")).unwrap();

        let err = client
            .write("/api/mo/uni.json", Some(&json!("just a string")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = client.write("/api/mo/uni.json", None).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!client.is_authenticated().await);
    }
}
