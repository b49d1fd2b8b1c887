//! HTTP routes for the PSBT builder

use axum::{extract::{rejection::JsonRejection, State}, http::StatusCode, response::IntoResponse, routing::{get, post}, Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::core::paths::api;
use crate::mint::{MintError, MintPsbtRequest, MintPsbtResponse};
use crate::psbt::PsbtBuilder;

#[derive(Clone)]
pub struct AppState { pub builder: PsbtBuilder, pub app_name: String }

impl AppState {
    pub fn new(builder: PsbtBuilder, app_name: impl Into<String>) -> Self {
        Self { builder, app_name: app_name.into() }
    }
}

type ApiError = (StatusCode, Json<MintPsbtResponse>);

pub fn create_router(builder: PsbtBuilder) -> Router { create_router_with_name(builder, "methane") }

pub fn create_router_with_name(builder: PsbtBuilder, app_name: &str) -> Router {
    Router::new()
        .route(api::ROOT, get(describe))
        .route(api::HEALTH, get(health))
        .route(api::CREATE_MINT_PSBT, post(create_mint_psbt))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(builder, app_name))
}

async fn health() -> &'static str { api::HEALTH_TEXT }

async fn describe(State(s): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": s.app_name,
        "version": env!("CARGO_PKG_VERSION"),
        "network": s.builder.network().as_str(),
        "endpoints": {
            "createMintPsbt": {
                "method": "POST",
                "path": api::CREATE_MINT_PSBT,
                "body": {"feeRate": "number (sat/vB)", "mintData": "string \"T,A,P\"", "userAddress": "taproot address"},
            },
            "health": {"method": "GET", "path": api::HEALTH},
        }
    }))
}

async fn create_mint_psbt(
    State(s): State<AppState>,
    body: Result<Json<MintPsbtRequest>, JsonRejection>,
) -> Result<Json<MintPsbtResponse>, ApiError> {
    let Json(body) = body.map_err(|e| {
        warn!(error = %e, "rejected mint request body");
        (StatusCode::BAD_REQUEST, Json(MintPsbtResponse::failure(e.body_text())))
    })?;
    let request = body.validate(s.builder.network()).map_err(reject)?;
    let template = s.builder.build(&request).map_err(reject)?;
    info!(address = %request.recipient, mint_data = %request.mint_data, fee_rate = request.fee_rate, "mint psbt created");
    Ok(Json(MintPsbtResponse::ok(template.hex(), template.fee_rate())))
}

fn reject(e: MintError) -> ApiError {
    let status = if e.is_client_error() { StatusCode::BAD_REQUEST } else { StatusCode::INTERNAL_SERVER_ERROR };
    warn!(status = status.as_u16(), error = %e, "mint psbt failed");
    (status, Json(MintPsbtResponse::failure(e.to_string())))
}
