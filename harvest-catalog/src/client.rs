use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::credentials::Credentials;
use crate::error::CatalogError;
use crate::query::CatalogQuery;
use crate::types::{GameRecord, TokenResponse};

const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const BASE_URL: &str = "https://api.igdb.com/v4";
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(260);

/// HTTP client for the game catalog, holding the bearer token obtained at startup.
pub struct IgdbClient {
    http: reqwest::Client,
    client_id: String,
    token: String,
    base_url: String,
    last_request: Arc<Mutex<Instant>>,
}

impl IgdbClient {
    /// Exchange the client credentials for a bearer token and build a client.
    pub async fn connect(creds: &Credentials) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let token = exchange_token(&http, creds).await?;
        Ok(Self::with_token(http, creds.client_id.clone(), token, BASE_URL))
    }

    /// Build a client around an existing token, e.g. one cached by the caller.
    pub fn with_token(
        http: reqwest::Client,
        client_id: String,
        token: String,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            client_id,
            token,
            base_url: base_url.into(),
            last_request: Arc::new(Mutex::new(Instant::now() - MIN_REQUEST_INTERVAL)),
        }
    }

    /// Request one page of games. Any non-success status is an error.
    pub async fn query_games(&self, query: &CatalogQuery) -> Result<Vec<GameRecord>, CatalogError> {
        self.rate_limit().await;

        let resp = self
            .http
            .post(format!("{}/games", self.base_url))
            .header("Client-ID", &self.client_id)
            .bearer_auth(&self.token)
            .body(query.body())
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(CatalogError::Query {
                status: status.as_u16(),
                message: snippet(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| CatalogError::Query {
            status: status.as_u16(),
            message: format!(
                "Failed to parse games: {e}. Response: {}",
                snippet(&text)
            ),
        })
    }

    /// Download an image file. CDN downloads are not rate limited.
    pub async fn download_image(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Download {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Keep at least MIN_REQUEST_INTERVAL between catalog queries.
    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < MIN_REQUEST_INTERVAL {
            tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
        }
        *last = Instant::now();
    }
}

async fn exchange_token(http: &reqwest::Client, creds: &Credentials) -> Result<String, CatalogError> {
    let params = [
        ("client_id", creds.client_id.as_str()),
        ("client_secret", creds.client_secret.as_str()),
        ("grant_type", "client_credentials"),
    ];

    let resp = http.post(TOKEN_URL).form(&params).send().await?;
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(CatalogError::Auth(format!(
            "HTTP {}: {}",
            status.as_u16(),
            snippet(&text)
        )));
    }

    let token: TokenResponse = serde_json::from_str(&text)
        .map_err(|e| CatalogError::Auth(format!("Failed to parse token response: {e}")))?;
    log::debug!(
        "Obtained catalog token (expires in {}s)",
        token.expires_in.unwrap_or(0)
    );
    Ok(token.access_token)
}

/// First 200 characters of a response body, for error messages.
fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}
