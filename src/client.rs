use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::{
    Alert, NewAlert, NewWallet, Portfolio, RedirectSession, SubscriptionStatus, Tier, Token,
    TokenHistory, Timeframe, Wallet,
};

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// The token list endpoint has answered with all three of these over time.
/// Rows stay raw so one bad row cannot sink the whole list.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenListBody {
    Wrapped { data: Vec<Value> },
    List(Vec<Value>),
    Single(Map<String, Value>),
}

impl From<TokenListBody> for Vec<Token> {
    fn from(body: TokenListBody) -> Self {
        let rows = match body {
            TokenListBody::Wrapped { data } => data,
            TokenListBody::List(rows) => rows,
            TokenListBody::Single(row) => vec![Value::Object(row)],
        };
        rows.into_iter()
            .enumerate()
            .filter_map(|(index, row)| match serde_json::from_value::<Token>(row) {
                Ok(token) => Some(token),
                Err(e) => {
                    warn!(index, error = %e, "Skipping malformed token row");
                    None
                }
            })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AlertListBody {
    Wrapped { alerts: Vec<Alert> },
    List(Vec<Alert>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AlertBody {
    Wrapped { alert: Alert },
    Bare(Alert),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WalletBody {
    Wrapped { wallet: Wallet },
    Bare(Wallet),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AlertToggle {
    is_active: bool,
}

#[derive(Serialize)]
struct CheckoutRequest {
    tier: Tier,
}

// ---------------------------------------------------------------------------
// Token list query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
}

impl TokenQuery {
    pub fn from_config(cfg: &Config) -> Self {
        Self { page: None, limit: cfg.token_page_limit, category: cfg.token_category.clone() }
    }
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// Thin typed wrapper over the backend REST API. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &cfg.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| AppError::Config("API_KEY contains invalid characters".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(cookie) = &cfg.session_cookie {
            let value = HeaderValue::from_str(cookie).map_err(|_| {
                AppError::Config("SESSION_COOKIE contains invalid characters".to_string())
            })?;
            headers.insert(COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url: cfg.api_base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the token list request. Also the dedup key for polling.
    pub fn tokens_url(&self, query: &TokenQuery) -> Result<String> {
        let mut url = Url::parse(&format!("{}/api/tokens", self.base_url))
            .map_err(|e| AppError::Config(format!("invalid API_BASE_URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(category) = &query.category {
                pairs.append_pair("category", category);
            }
        }
        let mut url = url.to_string();
        if url.ends_with('?') {
            url.pop();
        }
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{path}", self.base_url))
    }

    // --- Tokens ---

    pub async fn fetch_tokens(&self, query: &TokenQuery) -> Result<Vec<Token>> {
        let url = self.tokens_url(query)?;
        self.fetch_tokens_at(&url).await
    }

    /// Fetch the token list from a URL built by [`ApiClient::tokens_url`].
    pub async fn fetch_tokens_at(&self, url: &str) -> Result<Vec<Token>> {
        let resp = check(self.http.get(url).send().await?).await?;
        let body: TokenListBody = decode(resp).await?;
        let tokens: Vec<Token> = body.into();
        debug!(count = tokens.len(), "Fetched token list");
        Ok(tokens)
    }

    pub async fn token_history(&self, id: &str, timeframe: Timeframe) -> Result<Vec<TokenHistory>> {
        let resp = self
            .request(Method::GET, &format!("/api/tokens/{id}/history"))
            .query(&[("timeframe", timeframe.as_str())])
            .send()
            .await?;
        decode(check(resp).await?).await
    }

    /// Ask the backend to re-ingest token data.
    pub async fn refresh_tokens(&self) -> Result<()> {
        let resp = self.request(Method::POST, "/api/tokens/refresh").send().await?;
        check(resp).await?;
        Ok(())
    }

    // --- Alerts ---

    pub async fn alerts(&self) -> Result<Vec<Alert>> {
        let resp = self.request(Method::GET, "/api/alerts").send().await?;
        Ok(match decode(check(resp).await?).await? {
            AlertListBody::Wrapped { alerts } => alerts,
            AlertListBody::List(alerts) => alerts,
        })
    }

    pub async fn create_alert(&self, alert: &NewAlert) -> Result<Alert> {
        let resp = self.request(Method::POST, "/api/alerts").json(alert).send().await?;
        Ok(match decode(check(resp).await?).await? {
            AlertBody::Wrapped { alert } => alert,
            AlertBody::Bare(alert) => alert,
        })
    }

    pub async fn set_alert_active(&self, id: &str, is_active: bool) -> Result<()> {
        let resp = self
            .request(Method::PATCH, &format!("/api/alerts/{id}"))
            .json(&AlertToggle { is_active })
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn delete_alert(&self, id: &str) -> Result<()> {
        let resp = self.request(Method::DELETE, &format!("/api/alerts/{id}")).send().await?;
        check(resp).await?;
        Ok(())
    }

    // --- Wallets ---

    pub async fn portfolio(&self) -> Result<Portfolio> {
        let resp = self.request(Method::GET, "/api/wallets").send().await?;
        decode(check(resp).await?).await
    }

    pub async fn add_wallet(&self, wallet: &NewWallet) -> Result<Wallet> {
        let resp = self.request(Method::POST, "/api/wallets").json(wallet).send().await?;
        Ok(match decode(check(resp).await?).await? {
            WalletBody::Wrapped { wallet } => wallet,
            WalletBody::Bare(wallet) => wallet,
        })
    }

    pub async fn sync_wallet(&self, id: &str) -> Result<()> {
        let resp = self.request(Method::POST, &format!("/api/wallets/{id}/sync")).send().await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn delete_wallet(&self, id: &str) -> Result<()> {
        let resp = self.request(Method::DELETE, &format!("/api/wallets/{id}")).send().await?;
        check(resp).await?;
        Ok(())
    }

    // --- Subscription ---

    pub async fn subscription_status(&self) -> Result<SubscriptionStatus> {
        let resp = self.request(Method::GET, "/api/subscription/status").send().await?;
        decode(check(resp).await?).await
    }

    /// Start a checkout for a paid tier. Returns the URL to open.
    pub async fn create_checkout(&self, tier: Tier) -> Result<RedirectSession> {
        if tier == Tier::Free {
            return Err(AppError::Validation("checkout requires a paid tier".to_string()));
        }
        let resp = self
            .request(Method::POST, "/api/subscription/create-checkout")
            .json(&CheckoutRequest { tier })
            .send()
            .await?;
        decode(check(resp).await?).await
    }

    pub async fn create_portal(&self) -> Result<RedirectSession> {
        let resp = self.request(Method::POST, "/api/subscription/create-portal").send().await?;
        decode(check(resp).await?).await
    }
}

/// Turn a non-2xx response into [`AppError::Status`] carrying the body's message.
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
    Err(AppError::status(status.as_u16(), message))
}

fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|k| value.get(*k).and_then(|m| m.as_str()))
        .map(str::to_string)
}

/// Read the body and decode it. Decode failures surface as [`AppError::Json`].
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{get, patch, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn serve(app: Router) -> ApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        ApiClient::new(&Config::with_base_url(format!("http://{addr}"))).unwrap()
    }

    #[tokio::test]
    async fn token_list_accepts_all_body_shapes() {
        let app = Router::new()
            .route(
                "/api/tokens",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    match q.get("category").map(String::as_str) {
                        Some("wrapped") => Json(json!({"data": [{"id": "a", "symbol": "A", "name": "Alpha"}]})),
                        Some("single") => Json(json!({"_id": "s", "symbol": "S", "name": "Solo"})),
                        _ => Json(json!([{"id": "b", "symbol": "B", "name": "Beta"}])),
                    }
                }),
            );
        let client = serve(app).await;

        let q = |c: &str| TokenQuery { category: Some(c.to_string()), ..TokenQuery::default() };
        assert_eq!(client.fetch_tokens(&q("wrapped")).await.unwrap()[0].id, "a");
        assert_eq!(client.fetch_tokens(&q("bare")).await.unwrap()[0].id, "b");
        let single = client.fetch_tokens(&q("single")).await.unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].id, "s");
    }

    #[tokio::test]
    async fn irregular_rows_do_not_sink_the_list() {
        let app = Router::new().route(
            "/api/tokens",
            get(|| async {
                Json(json!({"data": [
                    {"_id": "m1", "id": "m1", "symbol": "M", "name": "Mongo"},
                    {"id": "c", "symbol": "C", "name": "Cat", "category": null},
                    {"id": "n", "symbol": "N"},
                    {"symbol": "X", "name": "No id"},
                    {"id": "p", "symbol": "P", "name": "Bad price", "price": "cheap"}
                ]}))
            }),
        );
        let client = serve(app).await;

        let tokens = client.fetch_tokens(&TokenQuery::default()).await.unwrap();
        let ids: Vec<&str> = tokens.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "c", "n"]);
        assert_eq!(tokens[1].category, "Unknown");
        assert_eq!(tokens[2].name, "");
    }

    #[tokio::test]
    async fn non_2xx_uses_body_error_or_status() {
        let app = Router::new()
            .route(
                "/api/alerts",
                get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"error": "Sign in required"}))) }),
            )
            .route("/api/wallets", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let client = serve(app).await;

        let err = client.alerts().await.unwrap_err();
        assert_eq!(err.user_message(), "Sign in required");
        assert!(matches!(err, AppError::Status { status: 401, .. }));

        let err = client.portfolio().await.unwrap_err();
        assert_eq!(err.user_message(), "HTTP error! status: 500");
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let app = Router::new().route("/api/subscription/status", get(|| async { "not json" }));
        let client = serve(app).await;
        assert!(matches!(client.subscription_status().await, Err(AppError::Json(_))));
    }

    #[tokio::test]
    async fn sends_auth_headers() {
        let app = Router::new().route(
            "/api/alerts",
            get(|headers: AxumHeaders| async move {
                let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("");
                let cookie = headers.get("cookie").and_then(|v| v.to_str().ok()).unwrap_or("");
                if auth == "Bearer k3y" && cookie == "session=abc" {
                    (StatusCode::OK, Json(json!({"alerts": []})))
                } else {
                    (StatusCode::FORBIDDEN, Json(json!({"message": "bad credentials"})))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let mut cfg = Config::with_base_url(format!("http://{addr}"));
        cfg.api_key = Some("k3y".to_string());
        cfg.session_cookie = Some("session=abc".to_string());
        let client = ApiClient::new(&cfg).unwrap();
        assert!(client.alerts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn alert_toggle_sends_is_active() {
        let app = Router::new().route(
            "/api/alerts/:id",
            patch(|Json(body): Json<Value>| async move {
                if body == json!({"isActive": false}) {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::BAD_REQUEST
                }
            }),
        );
        let client = serve(app).await;
        client.set_alert_active("a1", false).await.unwrap();
        assert!(client.set_alert_active("a1", true).await.is_err());
    }

    #[tokio::test]
    async fn checkout_rejects_free_tier() {
        let app = Router::new().route(
            "/api/subscription/create-checkout",
            post(|| async { Json(json!({"url": "https://pay.example/session"})) }),
        );
        let client = serve(app).await;
        assert!(matches!(client.create_checkout(Tier::Free).await, Err(AppError::Validation(_))));
        let session = client.create_checkout(Tier::Pro).await.unwrap();
        assert_eq!(session.url, "https://pay.example/session");
    }

    #[test]
    fn tokens_url_encodes_query() {
        let client = ApiClient::new(&Config::with_base_url("http://localhost:3001/")).unwrap();
        let plain = client.tokens_url(&TokenQuery::default()).unwrap();
        assert_eq!(plain, "http://localhost:3001/api/tokens");

        let query = TokenQuery { page: Some(2), limit: Some(50), category: Some("layer 1".to_string()) };
        let url = client.tokens_url(&query).unwrap();
        assert_eq!(url, "http://localhost:3001/api/tokens?page=2&limit=50&category=layer+1");
    }
}
