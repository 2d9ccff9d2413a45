//! Lending market endpoints
//!
//! Protocol-wide totals and the per-market interest and reward rates.

use actix_web::{get, web, HttpResponse, Responder};

use super::{metric_response, Response, FARM_NOT_FOUND};
use crate::{
    configuration::{AppState, State},
    error::Error,
};

// =============================================================================
// Totals
// =============================================================================

#[get("/list")]
pub async fn list(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.list_markets().await?;
    Ok(web::Json(Response::success(data)))
}

#[get("/supply")]
pub async fn total_supply(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.get_total_supply().await?;
    Ok(web::Json(Response::success(data)))
}

#[get("/borrow")]
pub async fn total_borrow(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.get_total_borrow().await?;
    Ok(web::Json(Response::success(data)))
}

// =============================================================================
// Market Rates
// =============================================================================

#[get("/depositAPY/{market}")]
pub async fn deposit_apy(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state.engine.get_supply_apy(&path.into_inner()).await?;
    Ok(metric_response(result, FARM_NOT_FOUND))
}

#[get("/depositRewardsAPR/{market}")]
pub async fn deposit_rewards_apr(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state
        .engine
        .get_supply_rewards_apr(&path.into_inner())
        .await?;
    Ok(metric_response(result, FARM_NOT_FOUND))
}

#[get("/borrowAPY/{market}")]
pub async fn borrow_apy(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state.engine.get_borrow_apy(&path.into_inner()).await?;
    Ok(metric_response(result, FARM_NOT_FOUND))
}

#[get("/borrowRewardsAPR/{market}")]
pub async fn borrow_rewards_apr(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state
        .engine
        .get_borrow_rewards_apr(&path.into_inner())
        .await?;
    Ok(metric_response(result, FARM_NOT_FOUND))
}
