use bigdecimal::BigDecimal;
use serde_json::json;

use super::{lift, Engine, Inputs};
use crate::{
    cache_keys::{MetricKind, Subject},
    error::Error,
    helpers::{checked_div, from_scaled, from_wei, normalize_address, round_dp, DAYS_PER_YEAR},
    model::MetricResult,
};

impl Engine {
    async fn pool_metric(
        &self,
        lp: &str,
        kind: MetricKind,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        let lp = normalize_address(lp)?;
        if self.find_farm(&lp).await?.is_none() {
            return Ok(MetricResult::NotTracked);
        }
        lift(self.resolve(kind, &lp).await)
    }

    pub async fn get_tvl(
        &self,
        lp: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        let tvl = self.pool_metric(lp, MetricKind::PoolTvl).await?;
        Ok(tvl.map(|value| round_dp(&value, 2)))
    }

    pub async fn get_24h_volume(
        &self,
        lp: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        self.pool_metric(lp, MetricKind::PoolVolume).await
    }

    pub async fn get_transaction_fees(
        &self,
        lp: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        self.pool_metric(lp, MetricKind::PoolFees).await
    }

    pub async fn get_pool_apr(
        &self,
        lp: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        self.pool_metric(lp, MetricKind::PoolApr).await
    }

    /// USD value of both reserves of the pair.
    pub(super) async fn pool_tvl(
        &self,
        lp: &str,
        inputs: &Inputs,
    ) -> Result<BigDecimal, Error> {
        let price0 = inputs.get(MetricKind::TokenPrice, Subject::PairToken0)?;
        let price1 = inputs.get(MetricKind::TokenPrice, Subject::PairToken1)?;
        let pair = self.pair_info(lp).await?;

        let lp_arg = [json!(lp)];
        let (balance0, balance1) = futures::try_join!(
            self.call_decimal(&pair.token0, "balanceOf", &lp_arg),
            self.call_decimal(&pair.token1, "balanceOf", &lp_arg),
        )?;

        Ok(from_scaled(&balance0, pair.decimals0) * price0
            + from_scaled(&balance1, pair.decimals1) * price1)
    }

    /// Trailing swap volume over the rolling window.
    pub(super) async fn pool_volume(&self, lp: &str) -> Result<BigDecimal, Error> {
        self.pair_info(lp).await?;

        let volume = self
            .windows
            .refresh(lp, self.now(), |span| async move {
                let raw = self
                    .source
                    .get_swap_volume(lp, span.from_ms, span.to_ms)
                    .await?;
                Ok(from_wei(&raw.decimal("volume")?))
            })
            .await?;

        Ok(round_dp(&volume, 2))
    }

    pub(super) fn pool_fees(&self, inputs: &Inputs) -> Result<BigDecimal, Error> {
        let volume = inputs.get(MetricKind::PoolVolume, Subject::Entity)?;
        Ok(round_dp(&(volume * &self.settings.pool_fee_percent), 2))
    }

    /// Yearly fee income as a percentage of pool TVL.
    pub(super) fn pool_apr(inputs: &Inputs) -> Result<BigDecimal, Error> {
        let fees = inputs.get(MetricKind::PoolFees, Subject::Entity)?;
        let tvl = inputs.get(MetricKind::PoolTvl, Subject::Entity)?;
        let yearly = fees * BigDecimal::from(DAYS_PER_YEAR);
        let apr = checked_div(&yearly, tvl, "pool tvl")? * BigDecimal::from(100);
        Ok(round_dp(&apr, 2))
    }
}
