//! Query surface
//!
//! Stateless projections of the registry into response envelopes. Numeric
//! path parameters arrive as strings and are parsed through the decimal
//! types, so garbage, non-finite, and non-positive values all fail the same
//! way: 400 with an explanatory message.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use types::{now_millis, Price, Quantity, Side, SideFilter, Symbol};

use crate::error::AppError;
use crate::state::AppState;

/// Response envelope for all data endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: i64,
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
        timestamp: now_millis(),
    })
}

/// Liveness plus book/connection summary.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": now_millis(),
        "uptime": state.uptime_secs(),
        "orderbooks": {
            "count": state.registry.book_count(),
            "symbols": state.registry.symbols(),
        },
        "binance": state.venue.stats(),
    }))
}

/// All books, full ladder.
pub async fn get_all_orderbooks(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<impl Serialize>>, AppError> {
    Ok(ok(state.registry.all_snapshots(None)))
}

/// One book, full ladder.
pub async fn get_orderbook(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<impl Serialize>>, AppError> {
    let symbol = Symbol::new(&symbol);
    let snapshot = state
        .registry
        .snapshot(&symbol, None)
        .ok_or_else(|| AppError::SymbolNotFound(symbol.to_string()))?;
    Ok(ok(snapshot))
}

/// One book, top N levels per side.
pub async fn get_orderbook_limited(
    State(state): State<AppState>,
    Path((symbol, n)): Path<(String, String)>,
) -> Result<Json<ApiResponse<impl Serialize>>, AppError> {
    let limit: usize = n
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| AppError::BadRequest(format!("limit must be a positive integer: {n}")))?;

    let symbol = Symbol::new(&symbol);
    let snapshot = state
        .registry
        .snapshot(&symbol, Some(limit))
        .ok_or_else(|| AppError::SymbolNotFound(symbol.to_string()))?;
    Ok(ok(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct AccumulatedParams {
    side: Option<String>,
}

/// Accumulated quantity/cost from the touch out to a target price.
pub async fn get_accumulated_quantity(
    State(state): State<AppState>,
    Path((symbol, price)): Path<(String, String)>,
    Query(params): Query<AccumulatedParams>,
) -> Result<Json<ApiResponse<impl Serialize>>, AppError> {
    let target = Price::parse(&price)
        .ok_or_else(|| AppError::BadRequest(format!("price must be a positive decimal: {price}")))?;
    let side = match params.side.as_deref() {
        None => SideFilter::Both,
        Some(raw) => raw.parse().map_err(AppError::BadRequest)?,
    };

    let symbol = Symbol::new(&symbol);
    let depth = state
        .registry
        .with_book(&symbol, |book| book.accumulated_to_price(target, side))
        .ok_or_else(|| AppError::SymbolNotFound(symbol.to_string()))?;
    Ok(ok(depth))
}

#[derive(Debug, Deserialize)]
pub struct MarketImpactParams {
    side: Option<String>,
}

/// Simulated taker order against the mirrored ladder.
pub async fn get_market_impact(
    State(state): State<AppState>,
    Path((symbol, size)): Path<(String, String)>,
    Query(params): Query<MarketImpactParams>,
) -> Result<Json<ApiResponse<impl Serialize>>, AppError> {
    let order_size = Quantity::parse(&size)
        .filter(|q| !q.is_zero())
        .ok_or_else(|| AppError::BadRequest(format!("size must be a positive decimal: {size}")))?;
    let side = match params.side.as_deref() {
        None => Side::Buy,
        Some(raw) => raw.parse().map_err(AppError::BadRequest)?,
    };

    let symbol = Symbol::new(&symbol);
    let impact = state
        .registry
        .with_book(&symbol, |book| book.market_impact(order_size, side))
        .ok_or_else(|| AppError::SymbolNotFound(symbol.to_string()))?
        .ok_or_else(|| AppError::BadRequest("order size must be positive".to_string()))?;
    Ok(ok(impact))
}

#[derive(Debug, Deserialize)]
pub struct LiquidityParams {
    levels: Option<usize>,
}

/// Layered liquidity profile, 1..=100 levels per side (default 10).
pub async fn get_liquidity_profile(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<LiquidityParams>,
) -> Result<Json<ApiResponse<impl Serialize>>, AppError> {
    let levels = params.levels.unwrap_or(10);
    if !(1..=100).contains(&levels) {
        return Err(AppError::BadRequest(format!(
            "levels must be between 1 and 100: {levels}"
        )));
    }

    let symbol = Symbol::new(&symbol);
    let profile = state
        .registry
        .with_book(&symbol, |book| book.liquidity_profile(levels))
        .ok_or_else(|| AppError::SymbolNotFound(symbol.to_string()))?;
    Ok(ok(profile))
}

/// Registry, feed-client, and process stats.
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<impl Serialize>>, AppError> {
    Ok(ok(json!({
        "registry": state.registry.stats(),
        "binance": state.venue.stats(),
        "counters": state.metrics.snapshot(),
        "process": {
            "uptime": state.uptime_secs(),
            "version": crate::SERVICE_VERSION,
        },
    })))
}
