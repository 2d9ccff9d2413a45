//! Yield farm endpoints

use actix_web::{get, web, HttpResponse, Responder};

use super::{metric_response, Response, POOL_NOT_FARMED};
use crate::{
    configuration::{AppState, State},
    error::Error,
};

#[get("/list")]
pub async fn list(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.list_farms().await?;
    Ok(web::Json(Response::success(data)))
}

#[get("/poolweight/{lp}")]
pub async fn pool_weight(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state.engine.get_pool_weight(&path.into_inner()).await?;
    Ok(metric_response(result, POOL_NOT_FARMED))
}

#[get("/APR/{lp}")]
pub async fn apr(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state.engine.get_farm_apr(&path.into_inner()).await?;
    Ok(metric_response(result, POOL_NOT_FARMED))
}

#[get("/liquidity/{lp}")]
pub async fn liquidity(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state.engine.get_farm_liquidity(&path.into_inner()).await?;
    Ok(metric_response(result, POOL_NOT_FARMED))
}

#[get("/bonusAPR/{lp}")]
pub async fn bonus_apr(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let result = state.engine.get_bonus_apr(&path.into_inner()).await?;
    Ok(metric_response(result, POOL_NOT_FARMED))
}
