use bigdecimal::{BigDecimal, Zero};
use futures::future::try_join_all;
use serde_json::json;

use super::{Engine, Inputs};
use crate::{
    cache_keys::{MetricKind, Subject},
    error::Error,
    helpers::{from_wei, trim_zeros},
};

impl Engine {
    /// JOE minted minus JOE sent to the burn address, 18-decimal scaled.
    pub async fn get_joe_total_supply(&self) -> Result<BigDecimal, Error> {
        self.resolve(MetricKind::TokenTotalSupply, &self.contracts().joe)
            .await
    }

    /// Total supply minus the team treasury holdings, 18-decimal scaled.
    pub async fn get_circulating_supply(&self) -> Result<BigDecimal, Error> {
        self.resolve(MetricKind::CirculatingSupply, &self.contracts().joe)
            .await
    }

    pub async fn get_circulating_supply_adjusted(
        &self,
    ) -> Result<BigDecimal, Error> {
        Ok(trim_zeros(&from_wei(&self.get_circulating_supply().await?)))
    }

    pub async fn get_max_supply(&self) -> Result<BigDecimal, Error> {
        self.resolve(MetricKind::MaxSupply, &self.contracts().joe).await
    }

    async fn joe_balance(&self, holder: &str) -> Result<BigDecimal, Error> {
        self.call_decimal(&self.contracts().joe, "balanceOf", &[json!(holder)])
            .await
    }

    pub(super) async fn token_total_supply(&self) -> Result<BigDecimal, Error> {
        let (minted, burned) = futures::try_join!(
            self.call_decimal(&self.contracts().joe, "totalSupply", &[]),
            self.joe_balance(&self.contracts().burn),
        )?;
        Ok(minted - burned)
    }

    pub(super) async fn circulating_supply(
        &self,
        inputs: &Inputs,
    ) -> Result<BigDecimal, Error> {
        let total = inputs.get(MetricKind::TokenTotalSupply, Subject::Entity)?;
        let balances = try_join_all(
            self.contracts()
                .team_treasury
                .iter()
                .map(|wallet| self.joe_balance(wallet)),
        )
        .await?;

        let locked = balances
            .iter()
            .fold(BigDecimal::zero(), |acc, balance| acc + balance);
        Ok(total - locked)
    }

    pub(super) async fn max_supply(&self) -> Result<BigDecimal, Error> {
        self.call_decimal(&self.contracts().joe, "maxSupply", &[]).await
    }
}
