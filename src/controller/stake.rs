use actix_web::{get, web, Responder};

use super::Response;
use crate::{
    configuration::{AppState, State},
    error::Error,
};

#[get("/fees")]
pub async fn fees(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.get_stake_fees().await?;
    Ok(web::Json(Response::success(data)))
}

#[get("/APR")]
pub async fn apr(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.get_stake_apr().await?;
    Ok(web::Json(Response::success(data)))
}

#[get("/APY")]
pub async fn apy(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let data = state.engine.get_stake_apy().await?;
    Ok(web::Json(Response::success(data)))
}
