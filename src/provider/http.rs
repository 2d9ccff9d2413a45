use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{configuration::Config, error::Error};

use super::source::{ChainSource, RawValue};

/// HTTP client for the contract-call gateway and the price service.
#[derive(Debug)]
pub struct Gateway {
    client: Client,
    gateway_url: Url,
    price_url: Url,
}

#[derive(Debug, Serialize)]
struct CallRequest<'a> {
    address: &'a str,
    method: &'a str,
    args: &'a [Value],
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    result: RawValue,
}

impl Gateway {
    pub fn new(config: &Config) -> Result<Gateway, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Gateway {
            client,
            gateway_url: config.gateway_url.clone(),
            price_url: config.price_url.clone(),
        })
    }

    fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, Error> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::ConfigurationError(format!(
                    "{} cannot be used as a base url",
                    base
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read(
        request: RequestBuilder,
        address: &str,
        method: &str,
    ) -> Result<RawValue, Error> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::RemoteCall(format!("{}.{} timed out", address, method))
            } else {
                Error::RemoteCall(format!("{}.{}: {}", address, method, e))
            }
        })?;

        match response.status() {
            StatusCode::UNPROCESSABLE_ENTITY => {
                debug!("{}.{} reverted", address, method);
                Err(Error::ContractReverted {
                    address: address.to_owned(),
                    method: method.to_owned(),
                })
            },
            status if status.is_success() => {
                let body = response
                    .json::<GatewayResponse>()
                    .await
                    .map_err(|e| {
                        Error::RemoteCall(format!(
                            "{}.{}: invalid body: {}",
                            address, method, e
                        ))
                    })?;
                Ok(body.result)
            },
            status => {
                warn!("{}.{} failed with status {}", address, method, status);
                Err(Error::RemoteCall(format!(
                    "{}.{}: status {}",
                    address, method, status
                )))
            },
        }
    }
}

#[async_trait]
impl ChainSource for Gateway {
    async fn call_contract(
        &self,
        address: &str,
        method: &str,
        args: &[Value],
    ) -> Result<RawValue, Error> {
        let url = Self::endpoint(&self.gateway_url, &["call"])?;
        let request = self.client.post(url).json(&CallRequest {
            address,
            method,
            args,
        });
        Self::read(request, address, method).await
    }

    async fn get_price(
        &self,
        token: &str,
        inverse: bool,
    ) -> Result<RawValue, Error> {
        let url = Self::endpoint(&self.price_url, &[token])?;
        let request = self
            .client
            .get(url)
            .query(&[("inverse", inverse.to_string())]);
        Self::read(request, token, "price").await
    }

    async fn get_swap_volume(
        &self,
        pair: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<RawValue, Error> {
        let url = Self::endpoint(&self.gateway_url, &["volume", pair])?;
        let request = self.client.get(url).query(&[
            ("from", from_ms.to_string()),
            ("to", to_ms.to_string()),
        ]);
        Self::read(request, pair, "volume").await
    }

    async fn get_event_total(
        &self,
        address: &str,
        topic: &str,
        field: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<RawValue, Error> {
        let url = Self::endpoint(&self.gateway_url, &["events", address])?;
        let request = self.client.get(url).query(&[
            ("topic", topic.to_owned()),
            ("field", field.to_owned()),
            ("from", from_ms.to_string()),
            ("to", to_ms.to_string()),
        ]);
        Self::read(request, address, "events").await
    }
}
