//! Cisco ISE REST client (read only)
//!
//! ISE uses HTTP basic auth on every request, so "authenticating" only
//! checks that a username is present; a rejected login shows up as an
//! `AuthError` on the first read.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use netops_core::config::ControllerSettings;
use netops_core::{Backend, Credentials, Error, Paging, Result};

use crate::controller::{validate_identifier, ControllerClient};
use crate::http::{build_client, join_url, json_or_error, transport_error};

pub struct IseClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl IseClient {
    pub fn new(settings: &ControllerSettings, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            client: build_client("ISE", settings)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ControllerClient for IseClient {
    fn backend(&self) -> Backend {
        Backend::Ise
    }

    async fn authenticate(&self) -> Result<()> {
        if self.credentials.username.trim().is_empty() {
            return Err(Error::auth("ISE username is empty"));
        }
        Ok(())
    }

    async fn read(&self, identifier: &str, paging: Paging) -> Result<Value> {
        self.authenticate().await?;
        let path = validate_identifier(identifier)?;
        let url = join_url(&self.base_url, path);
        debug!("GET {} (page {}, size {})", url, paging.page, paging.page_size);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("page", paging.page.to_string()),
                ("size", paging.page_size.to_string()),
            ])
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .basic_auth(&self.credentials.username, Some(self.credentials.password()))
            .send()
            .await
            .map_err(transport_error)?;

        json_or_error(response).await
    }
}
