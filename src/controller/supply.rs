//! JOE token supply endpoints

use actix_web::{get, web, Responder};

use super::Response;
use crate::{
    configuration::{AppState, State},
    error::Error,
};

#[get("/circulating")]
pub async fn circulating(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.get_circulating_supply().await?;
    Ok(web::Json(Response::success(data)))
}

#[get("/circulating-adjusted")]
pub async fn circulating_adjusted(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.get_circulating_supply_adjusted().await?;
    Ok(web::Json(Response::success(data)))
}

#[get("/total")]
pub async fn total(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.get_joe_total_supply().await?;
    Ok(web::Json(Response::success(data)))
}

#[get("/max")]
pub async fn max(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.get_max_supply().await?;
    Ok(web::Json(Response::success(data)))
}
