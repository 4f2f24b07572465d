use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::health::{HealthReport, HealthState};
use crate::api::latency::{LatencySnapshot, LatencyStats};
use crate::client::ApiClient;
use crate::db::KvStore;
use crate::error::{AppError, Result};
use crate::filter::{
    apply_filters_with_stats, search_tokens, sort_tokens, FilterCriteria, FilterForm,
    FilterPreset, FilterStats, PresetCatalog, SortDirection, SortKey,
};
use crate::history::{summarize, HistorySummary};
use crate::poller::TokenPoller;
use crate::scorer::{
    ai_picks, risk_indicator, token_metrics, volume_health, RiskIndicator, RiskProfile,
    TokenMetrics, TokenScore, VolumeHealth,
};
use crate::state::{StoreAction, TokenStore};
use crate::types::{
    Alert, NewAlert, NewWallet, Portfolio, RedirectSession, SubscriptionStatus, Tier, Timeframe,
    Token, Wallet,
};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<TokenStore>,
    pub presets: Arc<PresetCatalog>,
    pub client: ApiClient,
    pub poller: Arc<TokenPoller>,
    pub kv: KvStore,
    pub latency: Arc<LatencyStats>,
    pub health: Arc<HealthState>,
    pub allowed_exchanges: Arc<Vec<String>>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/tokens", get(get_tokens))
        .route("/tokens/filtered", get(get_filtered_tokens))
        .route("/tokens/:id/metrics", get(get_token_metrics))
        .route("/tokens/:id/history", get(get_token_history))
        .route("/filters", post(apply_filters).delete(reset_filters))
        .route("/filters/stats", get(get_filter_stats))
        .route("/ai-picks", get(get_ai_picks))
        .route("/watchlist", get(get_watchlist).post(add_to_watchlist))
        .route("/watchlist/:id", axum::routing::delete(remove_from_watchlist))
        .route("/presets", get(get_presets).post(save_preset))
        .route("/presets/:name", axum::routing::delete(delete_preset))
        .route("/presets/:name/apply", post(apply_preset))
        .route("/refresh", post(refresh))
        .route("/alerts", get(get_alerts).post(create_alert))
        .route("/alerts/:id", axum::routing::patch(toggle_alert).delete(delete_alert))
        .route("/wallets", get(get_portfolio).post(add_wallet))
        .route("/wallets/:id", axum::routing::delete(delete_wallet))
        .route("/wallets/:id/sync", post(sync_wallet))
        .route("/subscription", get(get_subscription))
        .route("/subscription/checkout", post(create_checkout))
        .route("/subscription/portal", post(create_portal))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param / body structs
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
pub struct TokenListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

#[derive(Deserialize)]
pub struct PicksQuery {
    pub profile: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub timeframe: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistRequest {
    pub token_id: String,
}

#[derive(Deserialize)]
pub struct PresetRequest {
    pub name: String,
    pub description: Option<String>,
    /// Typed criteria or the string form; defaults to the active criteria.
    pub filters: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertToggleRequest {
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub tier: Tier,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct FilteredResponse {
    pub criteria: FilterCriteria,
    pub tokens: Vec<Token>,
    pub stats: FilterStats,
}

#[derive(Serialize)]
pub struct PicksResponse {
    pub profile: RiskProfile,
    pub picks: Vec<TokenScore>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub token: Token,
    pub metrics: TokenMetrics,
    pub risk_indicator: RiskIndicator,
    pub volume_health: VolumeHealth,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub timeframe: Timeframe,
    #[serde(flatten)]
    pub summary: HistorySummary,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub tokens: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[serde(flatten)]
    pub poll: HealthReport,
    pub loading: bool,
    pub store_version: u64,
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Criteria from a request body: typed JSON first, then the string form.
fn criteria_from_value(value: Value) -> Result<FilterCriteria> {
    match serde_json::from_value::<FilterCriteria>(value.clone()) {
        Ok(criteria) => Ok(criteria),
        Err(typed_err) => {
            let form: FilterForm = serde_json::from_value(value)
                .map_err(|_| AppError::Validation(format!("invalid filter criteria: {typed_err}")))?;
            FilterCriteria::try_from(&form)
        }
    }
}

fn list_view(mut tokens: Vec<Token>, params: &TokenListQuery) -> Result<Vec<Token>> {
    if let Some(query) = params.search.as_deref().filter(|q| !q.trim().is_empty()) {
        tokens = search_tokens(&tokens, query);
    }
    if let Some(sort) = &params.sort {
        let key: SortKey = sort.parse()?;
        let dir: SortDirection = match &params.dir {
            Some(d) => d.parse()?,
            None => SortDirection::default(),
        };
        sort_tokens(&mut tokens, key, dir);
    }
    Ok(tokens)
}

fn filtered_response(state: &ApiState) -> FilteredResponse {
    let snapshot = state.store.snapshot();
    let (tokens, stats) = apply_filters_with_stats(&snapshot.tokens, &snapshot.criteria);
    FilteredResponse { criteria: snapshot.criteria, tokens, stats }
}

async fn persist_store(state: &ApiState) {
    if let Err(e) = state.store.save(&state.kv).await {
        warn!("Failed to persist token store: {e}");
    }
}

// ---------------------------------------------------------------------------
// Handlers: tokens + filters
// ---------------------------------------------------------------------------

async fn get_tokens(
    State(state): State<ApiState>,
    Query(params): Query<TokenListQuery>,
) -> Result<Json<Vec<Token>>> {
    Ok(Json(list_view(state.store.tokens(), &params)?))
}

async fn get_filtered_tokens(
    State(state): State<ApiState>,
    Query(params): Query<TokenListQuery>,
) -> Result<Json<Vec<Token>>> {
    Ok(Json(list_view(state.store.filtered(), &params)?))
}

async fn apply_filters(
    State(state): State<ApiState>,
    Json(body): Json<Value>,
) -> Result<Json<FilteredResponse>> {
    let criteria = criteria_from_value(body)?;
    state.store.dispatch(StoreAction::ApplyFilters(criteria));
    Ok(Json(filtered_response(&state)))
}

async fn reset_filters(State(state): State<ApiState>) -> Json<FilteredResponse> {
    state.store.dispatch(StoreAction::ResetFilters);
    Json(filtered_response(&state))
}

async fn get_filter_stats(State(state): State<ApiState>) -> Json<FilterStats> {
    Json(filtered_response(&state).stats)
}

async fn get_token_metrics(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<MetricsResponse>> {
    let token = state
        .store
        .find_token(&id)
        .ok_or_else(|| AppError::NotFound(format!("token '{id}'")))?;
    Ok(Json(MetricsResponse {
        metrics: token_metrics(&token),
        risk_indicator: risk_indicator(&token),
        volume_health: volume_health(token.volume_market_cap_ratio),
        token,
    }))
}

async fn get_token_history(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let timeframe: Timeframe = match params.timeframe {
        Some(t) => t.parse()?,
        None => Timeframe::default(),
    };
    let rows = state.client.token_history(&id, timeframe).await?;
    Ok(Json(HistoryResponse { timeframe, summary: summarize(&rows) }))
}

// ---------------------------------------------------------------------------
// Handlers: AI picks
// ---------------------------------------------------------------------------

async fn get_ai_picks(
    State(state): State<ApiState>,
    Query(params): Query<PicksQuery>,
) -> Result<Json<PicksResponse>> {
    let profile: RiskProfile = match params.profile {
        Some(p) => p.parse()?,
        None => RiskProfile::default(),
    };
    let picks = ai_picks(&state.store.tokens(), profile, &state.allowed_exchanges);
    Ok(Json(PicksResponse { profile, picks }))
}

// ---------------------------------------------------------------------------
// Handlers: watchlist
// ---------------------------------------------------------------------------

async fn get_watchlist(State(state): State<ApiState>) -> Json<Vec<Token>> {
    Json(state.store.watchlist())
}

async fn add_to_watchlist(
    State(state): State<ApiState>,
    Json(body): Json<WatchlistRequest>,
) -> Result<Json<Vec<Token>>> {
    let token = state
        .store
        .find_token(&body.token_id)
        .ok_or_else(|| AppError::NotFound(format!("token '{}'", body.token_id)))?;
    state.store.dispatch(StoreAction::AddToWatchlist(token));
    persist_store(&state).await;
    Ok(Json(state.store.watchlist()))
}

async fn remove_from_watchlist(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Json<Vec<Token>> {
    state.store.dispatch(StoreAction::RemoveFromWatchlist(id));
    persist_store(&state).await;
    Json(state.store.watchlist())
}

// ---------------------------------------------------------------------------
// Handlers: presets
// ---------------------------------------------------------------------------

async fn get_presets(State(state): State<ApiState>) -> Json<Vec<FilterPreset>> {
    Json(state.presets.all().await)
}

async fn save_preset(
    State(state): State<ApiState>,
    Json(body): Json<PresetRequest>,
) -> Result<(StatusCode, Json<FilterPreset>)> {
    let filters = match body.filters {
        Some(value) => criteria_from_value(value)?,
        None => state.store.criteria(),
    };
    let preset = state.presets.save(&body.name, body.description.as_deref(), filters).await?;
    Ok((StatusCode::CREATED, Json(preset)))
}

async fn delete_preset(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<StatusCode> {
    state.presets.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_preset(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<FilteredResponse>> {
    let preset = state
        .presets
        .find(&name)
        .await
        .ok_or_else(|| AppError::NotFound(format!("preset '{name}'")))?;
    state.store.dispatch(StoreAction::ApplyFilters(preset.filters));
    info!(preset = %name, "Applied filter preset");
    Ok(Json(filtered_response(&state)))
}

// ---------------------------------------------------------------------------
// Handlers: refresh
// ---------------------------------------------------------------------------

async fn refresh(State(state): State<ApiState>) -> Result<Json<RefreshResponse>> {
    state.client.refresh_tokens().await?;
    let tokens = state.poller.poll(true).await?;
    Ok(Json(RefreshResponse { tokens }))
}

// ---------------------------------------------------------------------------
// Handlers: backend pass-through
// ---------------------------------------------------------------------------

async fn get_alerts(State(state): State<ApiState>) -> Result<Json<Vec<Alert>>> {
    Ok(Json(state.client.alerts().await?))
}

async fn create_alert(
    State(state): State<ApiState>,
    Json(body): Json<NewAlert>,
) -> Result<(StatusCode, Json<Alert>)> {
    Ok((StatusCode::CREATED, Json(state.client.create_alert(&body).await?)))
}

async fn toggle_alert(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<AlertToggleRequest>,
) -> Result<StatusCode> {
    state.client.set_alert_active(&id, body.is_active).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_alert(State(state): State<ApiState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.client.delete_alert(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_portfolio(State(state): State<ApiState>) -> Result<Json<Portfolio>> {
    Ok(Json(state.client.portfolio().await?))
}

async fn add_wallet(
    State(state): State<ApiState>,
    Json(body): Json<NewWallet>,
) -> Result<(StatusCode, Json<Wallet>)> {
    if body.address.trim().is_empty() {
        return Err(AppError::Validation("wallet address must not be empty".to_string()));
    }
    Ok((StatusCode::CREATED, Json(state.client.add_wallet(&body).await?)))
}

async fn sync_wallet(State(state): State<ApiState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.client.sync_wallet(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_wallet(State(state): State<ApiState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.client.delete_wallet(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_subscription(State(state): State<ApiState>) -> Result<Json<SubscriptionStatus>> {
    Ok(Json(state.client.subscription_status().await?))
}

async fn create_checkout(
    State(state): State<ApiState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<RedirectSession>> {
    Ok(Json(state.client.create_checkout(body.tier).await?))
}

async fn create_portal(State(state): State<ApiState>) -> Result<Json<RedirectSession>> {
    Ok(Json(state.client.create_portal().await?))
}

// ---------------------------------------------------------------------------
// Handlers: status
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot();
    Json(HealthResponse {
        poll: state.health.report(),
        loading: snapshot.loading,
        store_version: state.store.version(),
        last_updated: snapshot.last_updated,
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencySnapshot> {
    Json(state.latency.snapshot())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::json;
    use tower::ServiceExt;

    fn token(id: &str, category: &str, liquidity: f64) -> Token {
        Token {
            category: category.to_string(),
            exchange: Some("binance".to_string()),
            price: Some(1.0),
            volume_market_cap_ratio: Some(0.8),
            liquidity_score: Some(liquidity),
            pump_dump_risk_score: Some(10.0),
            wallet_distribution_score: Some(85.0),
            ..Token::new(id, id.to_uppercase(), id)
        }
    }

    async fn test_state(base_url: &str) -> ApiState {
        let cfg = Config::with_base_url(base_url);
        let kv = KvStore::in_memory().await.unwrap();
        let store = TokenStore::new();
        store.dispatch(StoreAction::TokensLoaded(vec![
            token("eth", "layer1", 90.0),
            token("uni", "defi", 75.0),
            token("pepe", "memecoin", 20.0),
        ]));
        let client = ApiClient::new(&cfg).unwrap();
        let latency = Arc::new(LatencyStats::new().unwrap());
        let health = Arc::new(HealthState::new());
        let poller = TokenPoller::new(
            &cfg,
            client.clone(),
            Arc::clone(&store),
            kv.clone(),
            Arc::clone(&latency),
            Arc::clone(&health),
        );
        ApiState {
            store,
            presets: Arc::new(PresetCatalog::load(kv.clone()).await.unwrap()),
            client,
            poller,
            kv,
            latency,
            health,
            allowed_exchanges: Arc::new(cfg.allowed_exchanges.clone()),
        }
    }

    async fn call(state: &ApiState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => request
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    #[tokio::test]
    async fn filter_then_reset_round_trip() {
        let state = test_state("http://127.0.0.1:9").await;

        let (status, body) =
            call(&state, Method::POST, "/filters", Some(json!({"minLiquidityScore": 70}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tokens"].as_array().unwrap().len(), 2);
        assert_eq!(body["stats"]["passed"], 2);

        let (_, filtered) = call(&state, Method::GET, "/tokens/filtered", None).await;
        assert_eq!(filtered.as_array().unwrap().len(), 2);

        let (_, body) = call(&state, Method::DELETE, "/filters", None).await;
        assert_eq!(body["tokens"].as_array().unwrap().len(), 3);
        assert_eq!(state.store.filtered(), state.store.tokens());
    }

    #[tokio::test]
    async fn string_form_filters_are_validated() {
        let state = test_state("http://127.0.0.1:9").await;

        let (status, _) =
            call(&state, Method::POST, "/filters", Some(json!({"category": "defi", "minPrice": "0.5"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.store.filtered().len(), 1);

        let (status, body) =
            call(&state, Method::POST, "/filters", Some(json!({"minPrice": "cheap"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("minPrice"));
    }

    #[tokio::test]
    async fn token_list_search_and_sort() {
        let state = test_state("http://127.0.0.1:9").await;
        let (_, body) =
            call(&state, Method::GET, "/tokens?sort=liquidityScore&dir=asc", None).await;
        let ids: Vec<&str> = body.as_array().unwrap().iter().map(|t| t["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["pepe", "uni", "eth"]);

        let (status, _) = call(&state, Method::GET, "/tokens?sort=bogus", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ai_picks_per_profile() {
        let state = test_state("http://127.0.0.1:9").await;
        let (status, body) = call(&state, Method::GET, "/ai-picks?profile=conservative", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"], "conservative");
        let picks = body["picks"].as_array().unwrap();
        assert_eq!(picks[0]["token"]["id"], "eth");

        let (status, body) = call(&state, Method::GET, "/ai-picks?profile=yolo", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn watchlist_add_remove_and_persist() {
        let state = test_state("http://127.0.0.1:9").await;

        let (status, body) =
            call(&state, Method::POST, "/watchlist", Some(json!({"tokenId": "uni"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        call(&state, Method::POST, "/watchlist", Some(json!({"tokenId": "uni"}))).await;
        assert_eq!(state.store.watchlist().len(), 1);

        let (status, _) =
            call(&state, Method::POST, "/watchlist", Some(json!({"tokenId": "nope"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let restored = TokenStore::new();
        restored.restore(&state.kv).await.unwrap();
        assert_eq!(restored.watchlist()[0].id, "uni");

        let (_, body) = call(&state, Method::DELETE, "/watchlist/uni", None).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn presets_save_apply_delete() {
        let state = test_state("http://127.0.0.1:9").await;

        let (status, _) = call(
            &state,
            Method::POST,
            "/presets",
            Some(json!({"name": "Memes", "filters": {"category": "memecoin"}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = call(&state, Method::POST, "/presets/Memes/apply", None).await;
        assert_eq!(body["tokens"][0]["id"], "pepe");

        let (status, _) = call(&state, Method::DELETE, "/presets/Healthy%20DeFi", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&state, Method::DELETE, "/presets/Memes", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&state, Method::POST, "/presets/Memes/apply", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_for_known_token_only() {
        let state = test_state("http://127.0.0.1:9").await;
        let (status, body) = call(&state, Method::GET, "/tokens/eth/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["riskIndicator"]["band"], "low");
        assert_eq!(body["volumeHealth"]["status"], "excellent");

        let (status, _) = call(&state, Method::GET, "/tokens/zzz/metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn backend_errors_collapse_to_message() {
        let backend = Router::new().route(
            "/api/alerts",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"error": "Sign in required"}))) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, backend).await.unwrap() });

        let state = test_state(&format!("http://{addr}")).await;
        let (status, body) = call(&state, Method::GET, "/alerts", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Sign in required"}));
    }

    #[tokio::test]
    async fn history_is_deduplicated_per_day() {
        let backend = Router::new().route(
            "/api/tokens/:id/history",
            get(|| async {
                Json(json!([
                    {"tokenId": "eth", "price": 1.0, "timestamp": "2026-03-01T08:00:00Z"},
                    {"tokenId": "eth", "price": 2.0, "timestamp": "2026-03-01T20:00:00Z"},
                    {"tokenId": "eth", "price": 3.0, "timestamp": "2026-03-02T08:00:00Z"}
                ]))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, backend).await.unwrap() });

        let state = test_state(&format!("http://{addr}")).await;
        let (status, body) = call(&state, Method::GET, "/tokens/eth/history?timeframe=30d", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timeframe"], "30d");
        assert_eq!(body["points"].as_array().unwrap().len(), 2);
        assert_eq!(body["volatility"]["trend"], "bullish");
    }

    #[tokio::test]
    async fn health_and_latency_report() {
        let state = test_state("http://127.0.0.1:9").await;
        let (status, body) = call(&state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storeVersion"], 1);

        let (_, body) = call(&state, Method::GET, "/stats/latency", None).await;
        assert_eq!(body["samples"], 0);
    }
}
