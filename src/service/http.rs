//! REST client for the host collection and the network tools controller

use super::{NetworkToolsApi, PingResponse, WakeResponse};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{HostFields, HostRecord};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub struct HttpApi {
    client: reqwest::Client,
    management_url: Url,
    web_url: Url,
    locale: String,
    app: String,
    owner: String,
    collection: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct KeyResponse {
    #[serde(rename = "_key")]
    key: String,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let parse = |name: &str, url: &str| {
            Url::parse(url).map_err(|e| Error::InvalidConfig(format!("{}: {}", name, e)))
        };

        Ok(Self {
            client,
            management_url: parse("management_url", &config.management_url)?,
            web_url: parse("web_url", &config.web_url)?,
            locale: config.locale.clone(),
            app: config.app.clone(),
            owner: config.owner.clone(),
            collection: config.collection.clone(),
            token: config.token.clone(),
        })
    }

    fn join(base: &Url, segments: &[&str]) -> Url {
        let mut url = base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    pub fn collection_url(&self) -> Url {
        Self::join(
            &self.management_url,
            &[
                "servicesNS",
                &self.owner,
                &self.app,
                "storage",
                "collections",
                "data",
                &self.collection,
            ],
        )
    }

    pub fn record_url(&self, key: &str) -> Url {
        let mut url = self.collection_url();
        if let Ok(mut path) = url.path_segments_mut() {
            path.push(key);
        }
        url
    }

    pub fn controller_url(&self, action: &str) -> Url {
        Self::join(
            &self.web_url,
            &[&self.locale, "custom", &self.app, "network_tools", action],
        )
    }

    pub fn current_context_url(&self) -> Url {
        let mut url = Self::join(
            &self.management_url,
            &["services", "authentication", "current-context"],
        );
        url.query_pairs_mut().append_pair("output_mode", "json");
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Splunk {}", token)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        debug!(context, status = status.as_u16(), "response received");
        if status.is_success() {
            Ok(response)
        } else {
            Err(Error::from_status(status, context))
        }
    }
}

/// Extracts `entry[0].content.capabilities` from the current-context document.
pub fn parse_capabilities(document: &serde_json::Value) -> Vec<String> {
    document["entry"][0]["content"]["capabilities"]
        .as_array()
        .map(|caps| {
            caps.iter()
                .filter_map(|c| c.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl NetworkToolsApi for HttpApi {
    async fn list_hosts(&self) -> Result<Vec<HostRecord>> {
        let response = self
            .send(self.client.get(self.collection_url()), "list hosts")
            .await?;
        Ok(response.json().await?)
    }

    async fn create_host(&self, fields: &HostFields) -> Result<String> {
        let response = self
            .send(self.client.post(self.collection_url()).json(fields), "create host")
            .await?;
        let created: KeyResponse = response.json().await?;
        Ok(created.key)
    }

    async fn update_host(&self, key: &str, fields: &HostFields) -> Result<()> {
        self.send(self.client.post(self.record_url(key)).json(fields), "update host")
            .await
            .map_err(|e| match e {
                Error::NotFound { .. } => Error::not_found("host", key),
                other => other,
            })?;
        Ok(())
    }

    async fn delete_host(&self, key: &str) -> Result<()> {
        self.send(self.client.delete(self.record_url(key)), "delete host")
            .await?;
        Ok(())
    }

    async fn wake(&self, host_name: &str) -> Result<WakeResponse> {
        let request = self
            .client
            .post(self.controller_url("wake"))
            .form(&[("host", host_name)]);
        let response = self.send(request, "wake").await?;
        Ok(response.json().await?)
    }

    async fn ping(&self, address: &str) -> Result<PingResponse> {
        let request = self
            .client
            .post(self.controller_url("ping"))
            .form(&[("host", address)]);
        let response = self.send(request, "ping").await?;
        Ok(response.json().await?)
    }

    async fn current_capabilities(&self) -> Result<Vec<String>> {
        let response = self
            .send(self.client.get(self.current_context_url()), "current context")
            .await?;
        let document: serde_json::Value = response.json().await?;
        Ok(parse_capabilities(&document))
    }
}
