use std::{env::VarError, io::Error as IO_ERROR, num::ParseIntError};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use bigdecimal::ParseBigDecimalError as BIG_DECIMAL_ERROR;
use reqwest::Error as REQWEST_ERROR;
use serde_json::Error as JSON_ERROR;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::subscriber::SetGlobalDefaultError as TRACING_GLOBAL_DEFAULT_ERROR;
use url::ParseError as URL_ERROR;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] IO_ERROR),

    #[error("{0}")]
    URL(#[from] URL_ERROR),

    #[error("{0}")]
    INT(#[from] ParseIntError),

    #[error("{0}")]
    VAR(#[from] VarError),

    #[error("{0}")]
    TokioJoinError(#[from] JoinError),

    #[error("{0}")]
    BigDecimalError(#[from] BIG_DECIMAL_ERROR),

    #[error("{0}")]
    JsonError(#[from] JSON_ERROR),

    #[error("{0}")]
    ReqwestError(#[from] REQWEST_ERROR),

    #[error("Tracing error: {0}")]
    SetGlobalDefaultError(#[from] TRACING_GLOBAL_DEFAULT_ERROR),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    #[error("Contract call reverted: {address}.{method}")]
    ContractReverted { address: String, method: String },

    #[error("Unexpected value for {field}: {value}")]
    UnexpectedValue { field: String, value: String },

    #[error("Field not exists: {0}")]
    FieldNotExist(String),

    #[error("Zero denominator while computing {0}")]
    ZeroDenominator(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Address passed in is not an LP token: {0}")]
    NotLpToken(String),

    #[error("Rolling window not initialized: {0}")]
    UninitializedWindow(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),
}

impl Error {
    /// True when the failure came from the chain-facing collaborator.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::RemoteCall(_)
                | Error::ContractReverted { .. }
                | Error::ReqwestError(_)
        )
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MalformedInput(_) => StatusCode::BAD_REQUEST,

            Error::NotLpToken(_) | Error::UnknownEntity(_) => {
                StatusCode::NOT_FOUND
            },

            Error::RemoteCall(_)
            | Error::ContractReverted { .. }
            | Error::UnexpectedValue { .. }
            | Error::ReqwestError(_) => StatusCode::BAD_GATEWAY,

            Error::Io(_)
            | Error::URL(_)
            | Error::INT(_)
            | Error::VAR(_)
            | Error::BigDecimalError(_)
            | Error::TokioJoinError(_)
            | Error::JsonError(_)
            | Error::SetGlobalDefaultError(_)
            | Error::ConfigurationError(_)
            | Error::FieldNotExist(_)
            | Error::ZeroDenominator(_)
            | Error::UninitializedWindow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = serde_json::json!({
            "status": "error",
            "result": self.to_string(),
        });
        HttpResponse::build(status).json(body)
    }
}
