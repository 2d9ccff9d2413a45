use bigdecimal::BigDecimal;
use serde_json::json;

use super::{Engine, Inputs};
use crate::{
    cache_keys::{MetricKind, Subject},
    error::Error,
    helpers::{apy_daily_compound, checked_div, from_scaled, from_wei, round_dp, DAYS_PER_YEAR},
};

/// `LogConvert(address,address,address,uint256,uint256,uint256)` emitted by
/// the JoeMaker each time collected fees are swapped into JOE.
const LOG_CONVERT_TOPIC: &str =
    "0xd06b1d7ed79b664d17472c6f6997b929f1abe463ccccb4e5b6a0038f2f730c15";
const LOG_CONVERT_FIELD: &str = "amountJOE";

impl Engine {
    /// USD value of the JOE bought back for stakers over the trailing window.
    pub async fn get_stake_fees(&self) -> Result<BigDecimal, Error> {
        self.resolve(MetricKind::StakeFees, &self.contracts().xjoe).await
    }

    pub async fn get_stake_apr(&self) -> Result<BigDecimal, Error> {
        self.resolve(MetricKind::StakeApr, &self.contracts().xjoe).await
    }

    pub async fn get_stake_apy(&self) -> Result<BigDecimal, Error> {
        self.resolve(MetricKind::StakeApy, &self.contracts().xjoe).await
    }

    async fn joe_maker(&self) -> Result<String, Error> {
        self.static_address(&self.contracts().factory, "feeTo").await
    }

    pub(super) async fn stake_fees(&self, inputs: &Inputs) -> Result<BigDecimal, Error> {
        let joe_price = inputs.get(MetricKind::TokenPrice, Subject::Joe)?;
        let maker = self.joe_maker().await?;

        let converted = self
            .windows
            .refresh(&maker, self.now(), |span| {
                let maker = &maker;
                async move {
                    let raw = self
                        .source
                        .get_event_total(
                            maker,
                            LOG_CONVERT_TOPIC,
                            LOG_CONVERT_FIELD,
                            span.from_ms,
                            span.to_ms,
                        )
                        .await?;
                    Ok(from_wei(&raw.decimal(LOG_CONVERT_FIELD)?))
                }
            })
            .await?;

        Ok(round_dp(&(converted * joe_price), 4))
    }

    /// Yearly fee income per xJOE over the dollar value of the JOE backing
    /// one xJOE.
    pub(super) async fn stake_apr(&self, inputs: &Inputs) -> Result<BigDecimal, Error> {
        let fees = inputs.get(MetricKind::StakeFees, Subject::Entity)?;
        let joe_price = inputs.get(MetricKind::TokenPrice, Subject::Joe)?;
        let xjoe = &self.contracts().xjoe;
        let xjoe_arg = [json!(xjoe)];

        let (supply, decimals, staked) = futures::try_join!(
            self.call_decimal(xjoe, "totalSupply", &[]),
            self.call(xjoe, "decimals", &[]),
            self.call_decimal(&self.contracts().joe, "balanceOf", &xjoe_arg),
        )?;
        // JOE and xJOE share the same decimals
        let decimals = decimals.integer("decimals")?;
        let supply = from_scaled(&supply, decimals);
        let staked = from_scaled(&staked, decimals);

        let yearly = checked_div(fees, &supply, "xjoe supply")?
            * BigDecimal::from(DAYS_PER_YEAR);
        let backing = checked_div(&staked, &supply, "xjoe supply")? * joe_price;
        let apr = checked_div(&yearly, &backing, "xjoe backing")? * BigDecimal::from(100);
        Ok(round_dp(&apr, 4))
    }

    pub(super) fn stake_apy(inputs: &Inputs) -> Result<BigDecimal, Error> {
        let apr = inputs.get(MetricKind::StakeApr, Subject::Entity)?;
        Ok(round_dp(&apy_daily_compound(apr), 4))
    }
}
