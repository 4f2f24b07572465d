use serde::de::DeserializeOwned;
use serde::Deserialize;

use sunnalytics::scorer::RiskProfile;
use sunnalytics::types::Token;

// ---------------------------------------------------------------------------
// API response types (mirror api/routes.rs shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct PickRow {
    pub token: Token,
    pub volume_score: f64,
    pub liquidity_score: f64,
    pub risk_score: f64,
    pub distribution_score: f64,
    pub total_score: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PicksResponse {
    pub profile: RiskProfile,
    pub picks: Vec<PickRow>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthResponse {
    pub status: String,
    pub loading: bool,
    pub token_count: u64,
    pub consecutive_failures: u64,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Tokens,
    Picks,
    Watchlist,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Tokens, Tab::Picks, Tab::Watchlist];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Tokens => "Tokens",
            Tab::Picks => "AI Picks",
            Tab::Watchlist => "Watchlist",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Tokens => 0,
            Tab::Picks => 1,
            Tab::Watchlist => 2,
        }
    }

    pub fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub tab: Tab,
    pub profile: RiskProfile,
    pub tokens: Vec<Token>,
    pub picks: Vec<PickRow>,
    pub watchlist: Vec<Token>,
    pub health: HealthResponse,
    pub latency: LatencyResponse,
    /// Last action error (refresh, watchlist edit). Cleared by the next success.
    pub notice: Option<String>,
    pub base_url: String,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            tab: Tab::Tokens,
            profile: RiskProfile::default(),
            tokens: Vec::new(),
            picks: Vec::new(),
            watchlist: Vec::new(),
            health: HealthResponse::default(),
            latency: LatencyResponse::default(),
            notice: None,
            base_url,
        }
    }

    /// Rows in the active tab.
    pub fn row_count(&self) -> usize {
        match self.tab {
            Tab::Tokens => self.tokens.len(),
            Tab::Picks => self.picks.len(),
            Tab::Watchlist => self.watchlist.len(),
        }
    }

    /// Token under the cursor in the active tab.
    pub fn selected_token(&self, selected: Option<usize>) -> Option<&Token> {
        let i = selected?;
        match self.tab {
            Tab::Tokens => self.tokens.get(i),
            Tab::Picks => self.picks.get(i).map(|p| &p.token),
            Tab::Watchlist => self.watchlist.get(i),
        }
    }

    pub fn is_watched(&self, id: &str) -> bool {
        self.watchlist.iter().any(|t| t.id == id)
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let tokens_url = format!("{}/tokens/filtered", self.base_url);
        let picks_url = format!("{}/ai-picks?profile={}", self.base_url, self.profile);
        let watchlist_url = format!("{}/watchlist", self.base_url);
        let health_url = format!("{}/health", self.base_url);
        let latency_url = format!("{}/stats/latency", self.base_url);

        let (tokens, picks, watchlist, health, latency) = tokio::join!(
            get_json::<Vec<Token>>(client, &tokens_url),
            get_json::<PicksResponse>(client, &picks_url),
            get_json::<Vec<Token>>(client, &watchlist_url),
            get_json::<HealthResponse>(client, &health_url),
            get_json::<LatencyResponse>(client, &latency_url),
        );

        match (tokens, picks, watchlist) {
            (Ok(t), Ok(p), Ok(w)) => {
                self.tokens = t;
                self.profile = p.profile;
                self.picks = p.picks;
                self.watchlist = w;
                self.status = ConnectionStatus::Connected;
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                self.status = ConnectionStatus::Error(e);
                return;
            }
        }
        if let Ok(h) = health {
            self.health = h;
        }
        if let Ok(l) = latency {
            self.latency = l;
        }
    }

    /// Ask the service for a backend refresh plus a forced poll.
    pub async fn force_refresh(&mut self, client: &reqwest::Client) {
        let url = format!("{}/refresh", self.base_url);
        self.notice = send(client.post(&url)).await.err();
        self.refresh(client).await;
    }

    /// Add the token to the watchlist, or remove it if it is already there.
    pub async fn toggle_watch(&mut self, client: &reqwest::Client, token_id: &str) {
        let request = if self.is_watched(token_id) {
            client.delete(format!("{}/watchlist/{}", self.base_url, token_id))
        } else {
            client
                .post(format!("{}/watchlist", self.base_url))
                .json(&serde_json::json!({ "tokenId": token_id }))
        };
        self.notice = send(request).await.err();
        self.refresh(client).await;
    }

    pub fn cycle_profile(&mut self) {
        self.profile = self.profile.next();
    }
}

async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T, String> {
    let resp = send(client.get(url)).await?;
    resp.json::<T>().await.map_err(|e| format!("parse error: {e}"))
}

/// Send and collapse any failure to the message the service put in `{error}`.
async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, String> {
    let resp = request.send().await.map_err(|e| e.to_string())?;
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(error_message(&body).unwrap_or_else(|| format!("HTTP error! status: {status}")))
}

pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_cycle() {
        assert_eq!(Tab::Tokens.next(), Tab::Picks);
        assert_eq!(Tab::Watchlist.next(), Tab::Tokens);
    }

    #[test]
    fn error_body_is_extracted() {
        assert_eq!(error_message(r#"{"error":"Request timed out"}"#).as_deref(), Some("Request timed out"));
        assert_eq!(error_message("oops"), None);
    }

    #[test]
    fn selection_follows_active_tab() {
        let mut app = AppState::new("http://localhost:3000".to_string());
        app.tokens = vec![Token::new("a", "A", "Alpha")];
        app.watchlist = vec![Token::new("w", "W", "Watched")];
        assert_eq!(app.selected_token(Some(0)).map(|t| t.id.as_str()), Some("a"));
        app.tab = Tab::Watchlist;
        assert_eq!(app.selected_token(Some(0)).map(|t| t.id.as_str()), Some("w"));
        assert!(app.selected_token(Some(3)).is_none());
        assert!(app.is_watched("w"));
    }
}
