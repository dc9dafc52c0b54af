//! Platform REST API HTTP client.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::api::types::*;
use crate::config::{Config, ListingEndpoint, OptionsConfig, Site};
use crate::error::{Error, Result};
use crate::fs::naming::truncate_utf8;

/// Posts per listing page.
pub const PAGE_SIZE: u64 = 50;

/// Request timeout used unless the configuration sets one.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Build the shared HTTP client.
pub fn build_http_client(options: &OptionsConfig) -> Result<Client> {
    Client::builder()
        .user_agent(&options.user_agent)
        .cookie_store(true)
        .connect_timeout(options.connect_timeout())
        .build()
        .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))
}

/// REST client for one platform (`{base}/api/v1/...`).
#[derive(Debug, Clone)]
pub struct PlatformApi {
    client: Client,
    site: Site,
    base_url: String,
    listing: ListingEndpoint,
    request_timeout: Duration,
}

impl PlatformApi {
    /// Create a client for `site` using the configured domain over https.
    pub fn new(config: &Config, site: Site, client: Client) -> Self {
        let base_url = format!("https://{}", config.domains.domain(site));
        Self::with_base_url(client, site, base_url, config.options.listing)
            .with_request_timeout(config.options.request_timeout())
    }

    /// Create a client against an explicit base URL (scheme and host).
    pub fn with_base_url(
        client: Client,
        site: Site,
        base_url: impl Into<String>,
        listing: ListingEndpoint,
    ) -> Self {
        Self {
            client,
            site,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            listing,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Give up on a request that has not completed within `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn site(&self) -> Site {
        self.site
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public link of a post, also used as its failure ledger key.
    pub fn post_link(&self, service: &str, user_id: &str, post_id: &str) -> String {
        format!(
            "{}/{}/user/{}/post/{}",
            self.base_url, service, user_id, post_id
        )
    }

    /// Make a GET request and map error statuses.
    async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}/api/v1{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "text/css")
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Network(format!(
                        "No response from {} within {} seconds",
                        url,
                        self.request_timeout.as_secs()
                    ))
                } else {
                    Error::Http(e)
                }
            })?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        // Both platforms answer throttled clients with 403 as well as 429.
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
            return Err(Error::RateLimited(status.as_u16()));
        }

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response)
    }

    /// GET a path and decode its JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let response = self.get(path).await?;
        let text = response.text().await?;
        tracing::debug!("{} response length: {} bytes", what, text.len());

        serde_json::from_str(&text).map_err(|e| {
            Error::Api(format!(
                "Failed to parse {}: {} - Response: {}",
                what,
                e,
                truncate_utf8(&text, 500)
            ))
        })
    }

    /// Get creator profile metadata.
    pub async fn get_profile(&self, service: &str, user_id: &str) -> Result<Profile> {
        let path = format!("/{}/user/{}/profile", service, user_id);
        self.get_json(&path, "profile").await
    }

    /// Get one listing page of posts.
    pub async fn get_posts(&self, service: &str, user_id: &str, offset: u64) -> Result<Vec<RawPost>> {
        let endpoint = match self.listing {
            ListingEndpoint::Posts => "posts",
            ListingEndpoint::Legacy => "posts-legacy",
        };
        let path = if offset == 0 {
            format!("/{}/user/{}/{}", service, user_id, endpoint)
        } else {
            format!("/{}/user/{}/{}?o={}", service, user_id, endpoint, offset)
        };

        match self.listing {
            ListingEndpoint::Posts => self.get_json(&path, "posts page").await,
            ListingEndpoint::Legacy => {
                let listing: LegacyListing = self.get_json(&path, "legacy posts page").await?;
                Ok(listing.results)
            }
        }
    }

    /// Get the full detail of a single post.
    pub async fn get_post(&self, service: &str, user_id: &str, post_id: &str) -> Result<PostDetail> {
        let path = format!("/{}/user/{}/post/{}", service, user_id, post_id);
        self.get_json(&path, "post").await
    }
}

/// One API client per site, sharing an HTTP client.
#[derive(Debug, Clone)]
pub struct SiteApis {
    apis: HashMap<Site, PlatformApi>,
}

impl SiteApis {
    /// Clients for both sites on their configured domains.
    pub fn new(config: &Config, client: Client) -> Self {
        let apis = Site::ALL
            .into_iter()
            .map(|site| (site, PlatformApi::new(config, site, client.clone())))
            .collect();
        Self { apis }
    }

    /// Replace the client of `api.site()`.
    pub fn insert(&mut self, api: PlatformApi) {
        self.apis.insert(api.site(), api);
    }

    pub fn get(&self, site: Site) -> Result<&PlatformApi> {
        self.apis
            .get(&site)
            .ok_or_else(|| Error::Config(format!("No API client for {}", site)))
    }
}
