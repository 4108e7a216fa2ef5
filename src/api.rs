// API client module: a small blocking HTTP client for the three Pocket v3
// calls the tool needs (request-token issuance, token exchange, item
// queries). The interactive part of the authorization flow (browser
// prompt) lives in `cli`; this module only does HTTP.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

/// Redirect target embedded in the authorization handshake. The tool has
/// no callback server; the provider accepts its own site as the target.
const REDIRECT_URI: &str = "https://getpocket.com";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    /// First leg of the handshake failed (non-2xx or malformed body).
    #[error("request-token request failed: {0}")]
    AuthRequest(String),

    /// Token exchange failed (non-2xx or no access token in the body).
    #[error("access-token exchange failed: {0}")]
    AuthExchange(String),

    /// An item query failed in transport or returned non-2xx.
    #[error("item query failed: {0}")]
    Query(String),
}

/// A single saved item as returned by the provider. Only the fields the
/// tool consumes are kept; unknown members are ignored. Title and URL are
/// absent for items the provider could not parse, so they default to
/// empty strings.
#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    pub item_id: String,
    #[serde(default)]
    pub resolved_title: String,
    #[serde(default)]
    pub resolved_url: String,
    /// Position assigned by the provider when a sort order was requested.
    pub sort_id: Option<u64>,
}

#[derive(Deserialize)]
struct RequestTokenResponse {
    code: String,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ItemsResponse {
    #[serde(default, deserialize_with = "map_or_empty_seq")]
    list: HashMap<String, Article>,
}

/// The provider serializes an empty result set as `[]` instead of the
/// usual object keyed by item id; accept both shapes.
fn map_or_empty_seq<'de, D>(de: D) -> Result<HashMap<String, Article>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListField {
        Items(HashMap<String, Article>),
        Empty(Vec<serde_json::Value>),
    }
    match ListField::deserialize(de)? {
        ListField::Items(items) => Ok(items),
        ListField::Empty(_) => Ok(HashMap::new()),
    }
}

/// Blocking client bound to a base URL. One instance is built at startup
/// and shared by every call the process makes.
pub struct PocketClient {
    client: Client,
    base_url: String,
}

impl PocketClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder().build().map_err(ApiError::Client)?;
        Ok(PocketClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The provider speaks JSON both ways only when asked to via the
    /// `X-Accept` header.
    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-accept"),
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    /// Obtain a request token, the first leg of the authorization
    /// handshake.
    pub fn request_token(&self, consumer_key: &str) -> Result<String, ApiError> {
        let url = format!("{}/v3/oauth/request", self.base_url);
        let body = json!({
            "consumer_key": consumer_key,
            "redirect_uri": REDIRECT_URI,
        });
        let res = self
            .client
            .post(&url)
            .headers(Self::json_headers())
            .json(&body)
            .send()
            .map_err(|e| ApiError::AuthRequest(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            return Err(ApiError::AuthRequest(format!("{} - {}", status, txt)));
        }
        let parsed: RequestTokenResponse = res
            .json()
            .map_err(|e| ApiError::AuthRequest(format!("malformed response body: {}", e)))?;
        Ok(parsed.code)
    }

    /// URL the operator must open in a browser to authorize the
    /// application for their account.
    pub fn authorize_url(&self, request_token: &str) -> String {
        format!(
            "{}/auth/authorize?request_token={}&redirect_uri={}",
            self.base_url, request_token, REDIRECT_URI
        )
    }

    /// Exchange an authorized request token for a long-lived access
    /// token, the second leg of the handshake.
    pub fn exchange_token(
        &self,
        consumer_key: &str,
        request_token: &str,
    ) -> Result<String, ApiError> {
        let url = format!("{}/v3/oauth/authorize", self.base_url);
        let body = json!({
            "consumer_key": consumer_key,
            "code": request_token,
        });
        let res = self
            .client
            .post(&url)
            .headers(Self::json_headers())
            .json(&body)
            .send()
            .map_err(|e| ApiError::AuthExchange(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            return Err(ApiError::AuthExchange(format!("{} - {}", status, txt)));
        }
        let parsed: AccessTokenResponse = res
            .json()
            .map_err(|e| ApiError::AuthExchange(format!("no access token in body: {}", e)))?;
        Ok(parsed.access_token)
    }

    /// All items carrying the favourite flag, in provider order. A single
    /// request is issued; no pagination. An empty result is a success.
    pub fn query_favourites(
        &self,
        access_token: &str,
        consumer_key: &str,
    ) -> Result<Vec<Article>, ApiError> {
        let body = json!({
            "consumer_key": consumer_key,
            "access_token": access_token,
            "favorite": "1",
            "state": "all",
        });
        self.query_items(&body)
    }

    /// The most recently added unread items, most-recent first, truncated
    /// to `count`. `count == 0` yields an empty result without issuing a
    /// request.
    pub fn query_newest(
        &self,
        access_token: &str,
        consumer_key: &str,
        count: usize,
    ) -> Result<Vec<Article>, ApiError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let body = json!({
            "consumer_key": consumer_key,
            "access_token": access_token,
            "state": "unread",
            "sort": "newest",
            "count": count,
        });
        let mut items = self.query_items(&body)?;
        items.truncate(count);
        Ok(items)
    }

    fn query_items(&self, body: &serde_json::Value) -> Result<Vec<Article>, ApiError> {
        let url = format!("{}/v3/get", self.base_url);
        let res = self
            .client
            .post(&url)
            .headers(Self::json_headers())
            .json(body)
            .send()
            .map_err(|e| ApiError::Query(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            return Err(ApiError::Query(format!("{} - {}", status, txt)));
        }
        let parsed: ItemsResponse = res
            .json()
            .map_err(|e| ApiError::Query(format!("malformed response body: {}", e)))?;
        // The wire format keys items by id, which loses the provider's
        // ordering; `sort_id` carries the position when one was assigned.
        let mut items: Vec<Article> = parsed.list.into_values().collect();
        items.sort_by_key(|a| a.sort_id.unwrap_or(u64::MAX));
        Ok(items)
    }
}
