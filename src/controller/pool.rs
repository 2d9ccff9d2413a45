//! AMM pool endpoints

use actix_web::{get, web, HttpResponse};

use super::{metric_response, POOL_NOT_FARMED};
use crate::{
    configuration::{AppState, State},
    error::Error,
};

#[get("/liquidity/{lp}")]
pub async fn liquidity(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state.engine.get_tvl(&path.into_inner()).await?;
    Ok(metric_response(result, POOL_NOT_FARMED))
}

#[get("/volume/{lp}")]
pub async fn volume(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state.engine.get_24h_volume(&path.into_inner()).await?;
    Ok(metric_response(result, POOL_NOT_FARMED))
}

#[get("/fees/{lp}")]
pub async fn fees(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state.engine.get_transaction_fees(&path.into_inner()).await?;
    Ok(metric_response(result, POOL_NOT_FARMED))
}

#[get("/APR/{lp}")]
pub async fn apr(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state.engine.get_pool_apr(&path.into_inner()).await?;
    Ok(metric_response(result, POOL_NOT_FARMED))
}
