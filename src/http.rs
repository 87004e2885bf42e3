use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{DeckError, DeckResult};

/// JSON client for one backend. Non-2xx responses become [`DeckError::Http`].
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    name: &'static str,
    base_url: Option<String>,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(
        name: &'static str,
        base_url: Option<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> DeckResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            name,
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            token,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    pub fn url(&self, path: &str) -> DeckResult<String> {
        let base = self.base_url.as_deref().ok_or(DeckError::NotConfigured(self.name))?;
        Ok(format!("{}/{}", base, path.trim_start_matches('/')))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> DeckResult<T> {
        let url = self.url(path)?;
        debug!(backend = self.name, %url, "GET");
        let request = self.authorize(self.http.get(&url).query(query));
        Self::decode(request.send().await?, url).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> DeckResult<T> {
        let url = self.url(path)?;
        debug!(backend = self.name, %url, "POST");
        let request = self.authorize(self.http.post(&url).json(body));
        Self::decode(request.send().await?, url).await
    }

    /// POST without a request body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> DeckResult<T> {
        let url = self.url(path)?;
        debug!(backend = self.name, %url, "POST");
        let request = self.authorize(self.http.post(&url));
        Self::decode(request.send().await?, url).await
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, url: String) -> DeckResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(DeckError::Http {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json::<T>().await?)
    }
}
