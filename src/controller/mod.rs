//! API Controller modules
//!
//! Consolidated controllers organized by domain.

use actix_web::HttpResponse;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::model::MetricResult;

pub mod farm;
pub mod lending;
pub mod pool;
pub mod stake;
pub mod supply;

pub const FARM_NOT_FOUND: &str = "Farm does not exist for that address";
pub const POOL_NOT_FARMED: &str = "Pool is not an active yield farm";
pub const NOT_LP_TOKEN: &str = "Address passed in is not an LP token";

#[derive(Debug, Serialize, Deserialize)]
pub struct Response<T> {
    pub status: String,
    pub result: T,
}

impl<T> Response<T> {
    pub fn success(result: T) -> Self {
        Self {
            status: String::from("success"),
            result,
        }
    }

    pub fn error(result: T) -> Self {
        Self {
            status: String::from("error"),
            result,
        }
    }
}

/// Renders a per-entity metric, untracked entities become a 404 carrying
/// `not_tracked`.
pub fn metric_response(
    result: MetricResult<BigDecimal>,
    not_tracked: &str,
) -> HttpResponse {
    match result {
        MetricResult::Value(value) => {
            HttpResponse::Ok().json(Response::success(value))
        },
        MetricResult::NotTracked => {
            HttpResponse::NotFound().json(Response::error(not_tracked))
        },
        MetricResult::NotLpToken => {
            HttpResponse::NotFound().json(Response::error(NOT_LP_TOKEN))
        },
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{body::to_bytes, http::StatusCode};
    use serde_json::{json, Value};

    use super::*;

    async fn body(response: HttpResponse) -> Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_metric_response_value() {
        let response =
            metric_response(MetricResult::Value(BigDecimal::from(12)), POOL_NOT_FARMED);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, json!({"status": "success", "result": "12"}));
    }

    #[tokio::test]
    async fn test_metric_response_not_found() {
        let response = metric_response(MetricResult::NotTracked, FARM_NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body(response).await,
            json!({"status": "error", "result": FARM_NOT_FOUND})
        );

        let response = metric_response(MetricResult::NotLpToken, POOL_NOT_FARMED);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body(response).await,
            json!({"status": "error", "result": NOT_LP_TOKEN})
        );
    }
}
