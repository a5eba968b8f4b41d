use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{books, ws};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/orderbooks", get(books::get_all_orderbooks))
        .route("/orderbooks/{symbol}", get(books::get_orderbook))
        .route("/orderbooks/{symbol}/limit/{n}", get(books::get_orderbook_limited))
        .route("/orderbooks/{symbol}/acc-qty/{price}", get(books::get_accumulated_quantity))
        .route("/orderbooks/{symbol}/market-impact/{size}", get(books::get_market_impact))
        .route("/orderbooks/{symbol}/liquidity-profile", get(books::get_liquidity_profile))
        .route("/stats", get(books::get_stats));

    Router::new()
        .route("/health", get(books::health))
        .route("/ws", get(ws::ws_handler))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
