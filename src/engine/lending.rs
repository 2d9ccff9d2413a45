use bigdecimal::BigDecimal;
use serde_json::json;

use super::{lift, Engine, Inputs};
use crate::{
    cache_keys::{MetricKind, Subject},
    error::Error,
    helpers::{
        apy_daily_compound, from_wei, normalize_address, pow10,
        reward_apr, round_dp, SECONDS_PER_YEAR,
    },
    model::{MetricResult, PartitionId},
};

/// Reward streams paid by the distributor, by reward type id.
const JOE_REWARD: u8 = 0;
const AVAX_REWARD: u8 = 1;

/// Scale of `getUnderlyingPrice` times the underlying's own scale.
const ORACLE_DECIMALS: i64 = 36;

#[derive(Debug, Clone, PartialEq)]
pub struct LendingTotals {
    pub supply: BigDecimal,
    pub borrow: BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendingSide {
    Supply,
    Borrow,
}

impl LendingSide {
    fn rate_method(self) -> &'static str {
        match self {
            LendingSide::Supply => "supplyRatePerSecond",
            LendingSide::Borrow => "borrowRatePerSecond",
        }
    }

    fn speed_method(self) -> &'static str {
        match self {
            LendingSide::Supply => "rewardSupplySpeeds",
            LendingSide::Borrow => "rewardBorrowSpeeds",
        }
    }

    fn apr_kind(self) -> MetricKind {
        match self {
            LendingSide::Supply => MetricKind::SupplyApr,
            LendingSide::Borrow => MetricKind::BorrowApr,
        }
    }

    fn apy_kind(self) -> MetricKind {
        match self {
            LendingSide::Supply => MetricKind::SupplyApy,
            LendingSide::Borrow => MetricKind::BorrowApy,
        }
    }

    fn rewards_kind(self) -> MetricKind {
        match self {
            LendingSide::Supply => MetricKind::SupplyRewardsApr,
            LendingSide::Borrow => MetricKind::BorrowRewardsApr,
        }
    }
}

impl Engine {
    async fn totals(&self) -> Result<LendingTotals, Error> {
        self.lending_totals
            .get_or_refresh(&(), self.settings.ttl.supply, || async {
                let contract = &self.contracts().lending_totals;
                let raw = self
                    .call(contract, "getTotalSupplyAndTotalBorrow", &[])
                    .await?;
                Ok(LendingTotals {
                    supply: raw.member("totalSupply", 0)?.decimal("totalSupply")?,
                    borrow: raw.member("totalBorrow", 1)?.decimal("totalBorrow")?,
                })
            })
            .await
    }

    /// USD value supplied across all markets, 18-decimal scaled.
    pub async fn get_total_supply(&self) -> Result<BigDecimal, Error> {
        Ok(self.totals().await?.supply)
    }

    pub async fn get_total_borrow(&self) -> Result<BigDecimal, Error> {
        Ok(self.totals().await?.borrow)
    }

    pub async fn list_markets(&self) -> Result<Vec<String>, Error> {
        self.discover(PartitionId::LendingMarkets).await?;
        let markets = self.registry.entities(PartitionId::LendingMarkets).await;
        Ok(markets.into_iter().map(|market| market.address).collect())
    }

    async fn lending_metric(
        &self,
        market: &str,
        kind: MetricKind,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        let market = normalize_address(market)?;
        self.discover(PartitionId::LendingMarkets).await?;
        if !self
            .registry
            .is_known(PartitionId::LendingMarkets, &market)
            .await
        {
            return Ok(MetricResult::NotTracked);
        }
        lift(self.resolve(kind, &market).await)
    }

    pub async fn get_supply_apy(
        &self,
        market: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        self.lending_metric(market, LendingSide::Supply.apy_kind()).await
    }

    pub async fn get_borrow_apy(
        &self,
        market: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        self.lending_metric(market, LendingSide::Borrow.apy_kind()).await
    }

    pub async fn get_supply_rewards_apr(
        &self,
        market: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        self.lending_metric(market, LendingSide::Supply.rewards_kind())
            .await
    }

    pub async fn get_borrow_rewards_apr(
        &self,
        market: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        self.lending_metric(market, LendingSide::Borrow.rewards_kind())
            .await
    }

    /// Percentage interest APR from the market's per-second rate.
    pub(super) async fn interest_apr(
        &self,
        market: &str,
        side: LendingSide,
    ) -> Result<BigDecimal, Error> {
        let rate = self.call_decimal(market, side.rate_method(), &[]).await?;
        Ok(from_wei(&rate) * BigDecimal::from(SECONDS_PER_YEAR) * BigDecimal::from(100))
    }

    pub(super) fn interest_apy(
        inputs: &Inputs,
        side: LendingSide,
    ) -> Result<BigDecimal, Error> {
        let apr = inputs.get(side.apr_kind(), Subject::Entity)?;
        Ok(round_dp(&apy_daily_compound(apr), 2))
    }

    /// APR of the JOE and AVAX incentives paid on one side of a market,
    /// measured against that side's USD value.
    pub(super) async fn rewards_apr(
        &self,
        market: &str,
        side: LendingSide,
        inputs: &Inputs,
    ) -> Result<BigDecimal, Error> {
        let joe_price = inputs.get(MetricKind::TokenPrice, Subject::Joe)?;
        let avax_price = inputs.get(MetricKind::TokenPrice, Subject::Wavax)?;
        let distributor = &self.contracts().reward_distributor;
        let oracle = &self.contracts().price_oracle;

        let joe_args = [json!(JOE_REWARD), json!(market)];
        let avax_args = [json!(AVAX_REWARD), json!(market)];
        let market_arg = [json!(market)];

        let (joe_speed, avax_speed, underlying_price, value_locked) = futures::try_join!(
            self.call_decimal(distributor, side.speed_method(), &joe_args),
            self.call_decimal(distributor, side.speed_method(), &avax_args),
            self.call_decimal(oracle, "getUnderlyingPrice", &market_arg),
            self.underlying_amount(market, side),
        )?;

        let usd = value_locked * underlying_price / pow10(ORACLE_DECIMALS);
        let apr = reward_apr(&from_wei(&joe_speed), joe_price, &usd, 1)?
            + reward_apr(&from_wei(&avax_speed), avax_price, &usd, 1)?;
        Ok(round_dp(&apr, 2))
    }

    /// Raw underlying units on one side of a market.
    async fn underlying_amount(
        &self,
        market: &str,
        side: LendingSide,
    ) -> Result<BigDecimal, Error> {
        match side {
            LendingSide::Supply => {
                let (supply, exchange_rate) = futures::try_join!(
                    self.call_decimal(market, "totalSupply", &[]),
                    self.call_decimal(market, "exchangeRateStored", &[]),
                )?;
                Ok(from_wei(&(supply * exchange_rate)))
            },
            LendingSide::Borrow => {
                self.call_decimal(market, "totalBorrows", &[]).await
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::testing::{
        self, ManualClock, ScriptedSource, DISTRIBUTOR, JOE, JOETROLLER,
        LENDING_TOTALS, ORACLE, START_MS, WAVAX,
    };

    const MARKET: &str = "0xc22f01ddc8010ee05574028528614634684ec29e";
    const UNLISTED: &str = "0x929f5cab61abfa2e7eb6d5fb8ed0e7f1e5e4d5d1";

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn script_markets(source: &ScriptedSource) {
        source.reply(JOETROLLER, "getAllMarkets", &[], json!([MARKET.to_uppercase().replace("0X", "0x")]));
    }

    fn script_speeds(source: &ScriptedSource, method: &str, joe: &str, avax: &str) {
        source.reply(DISTRIBUTOR, method, &[json!(0), json!(MARKET)], json!(testing::wei(joe)));
        source.reply(DISTRIBUTOR, method, &[json!(1), json!(MARKET)], json!(testing::wei(avax)));
    }

    #[tokio::test]
    async fn test_totals_are_fetched_together_and_cached() {
        let source = Arc::new(ScriptedSource::new());
        let clock = Arc::new(ManualClock::new(START_MS));
        let engine = testing::engine_with_clock(source.clone(), clock.clone());
        source.reply(
            LENDING_TOTALS,
            "getTotalSupplyAndTotalBorrow",
            &[],
            json!(["500000000000000000000", "200000000000000000000"]),
        );

        assert_eq!(engine.get_total_supply().await.unwrap(), dec("500000000000000000000"));
        assert_eq!(engine.get_total_borrow().await.unwrap(), dec("200000000000000000000"));
        assert_eq!(source.count(LENDING_TOTALS, "getTotalSupplyAndTotalBorrow"), 1);

        clock.advance(10_000);
        engine.get_total_borrow().await.unwrap();
        assert_eq!(source.count(LENDING_TOTALS, "getTotalSupplyAndTotalBorrow"), 2);
    }

    #[tokio::test]
    async fn test_list_markets_normalizes_addresses() {
        let source = Arc::new(ScriptedSource::new());
        let engine = testing::engine(source.clone());
        script_markets(&source);

        assert_eq!(engine.list_markets().await.unwrap(), vec![MARKET.to_owned()]);
    }

    #[tokio::test]
    async fn test_supply_apy_compounds_cached_apr() {
        let source = Arc::new(ScriptedSource::new());
        let clock = Arc::new(ManualClock::new(START_MS));
        let engine = testing::engine_with_clock(source.clone(), clock.clone());
        script_markets(&source);
        // 15.77% a year expressed per second, 18-decimal scaled
        source.reply(MARKET, "supplyRatePerSecond", &[], json!("5000634196"));

        let apy = engine.get_supply_apy(MARKET).await.unwrap();
        assert_eq!(apy, MetricResult::Value(dec("17.08")));

        clock.advance(59_000);
        engine.get_supply_apy(MARKET).await.unwrap();
        assert_eq!(source.count(MARKET, "supplyRatePerSecond"), 1);

        clock.advance(1_000);
        engine.get_supply_apy(MARKET).await.unwrap();
        assert_eq!(source.count(MARKET, "supplyRatePerSecond"), 2);
    }

    #[tokio::test]
    async fn test_borrow_apy_uses_borrow_rate() {
        let source = Arc::new(ScriptedSource::new());
        let engine = testing::engine(source.clone());
        script_markets(&source);
        source.reply(MARKET, "borrowRatePerSecond", &[], json!("0"));

        let apy = engine.get_borrow_apy(MARKET).await.unwrap();
        assert_eq!(apy, MetricResult::Value(dec("0")));
        assert_eq!(source.count(MARKET, "supplyRatePerSecond"), 0);
    }

    #[tokio::test]
    async fn test_unlisted_market_is_not_tracked() {
        let source = Arc::new(ScriptedSource::new());
        let engine = testing::engine(source.clone());
        script_markets(&source);

        assert_eq!(engine.get_supply_apy(UNLISTED).await.unwrap(), MetricResult::NotTracked);
        assert_eq!(engine.get_borrow_apy(UNLISTED).await.unwrap(), MetricResult::NotTracked);
        assert_eq!(
            engine.get_supply_rewards_apr(UNLISTED).await.unwrap(),
            MetricResult::NotTracked
        );
        assert_eq!(
            engine.get_borrow_rewards_apr(UNLISTED).await.unwrap(),
            MetricResult::NotTracked
        );
        assert!(source.calls().iter().all(|call| call.ends_with("getAllMarkets")));
    }

    #[tokio::test]
    async fn test_malformed_market_is_rejected() {
        let source = Arc::new(ScriptedSource::new());
        let engine = testing::engine(source.clone());
        assert!(matches!(
            engine.get_supply_apy("not-an-address").await,
            Err(Error::MalformedInput(_))
        ));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_supply_rewards_apr_matches_worked_example() {
        let source = Arc::new(ScriptedSource::new());
        let engine = testing::engine(source.clone());
        script_markets(&source);
        source.price(JOE, "0.5");
        source.price(WAVAX, "20");
        script_speeds(&source, "rewardSupplySpeeds", "0.01", "0");
        // 1,000,000 underlying units at $1 each
        source.reply(MARKET, "totalSupply", &[], json!("1000000"));
        source.reply(MARKET, "exchangeRateStored", &[], json!(testing::wei("1")));
        source.reply(ORACLE, "getUnderlyingPrice", &[json!(MARKET)], json!("1000000000000000000000000000000000000"));

        let apr = engine.get_supply_rewards_apr(MARKET).await.unwrap();
        assert_eq!(apr, MetricResult::Value(dec("15.77")));

        let calls = source.calls();
        assert!(
            testing::position(&calls, &format!("{}.price", JOE))
                < testing::position(&calls, &format!("{}.rewardSupplySpeeds", DISTRIBUTOR))
        );
    }

    #[tokio::test]
    async fn test_borrow_rewards_apr_sums_both_streams() {
        let source = Arc::new(ScriptedSource::new());
        let engine = testing::engine(source.clone());
        script_markets(&source);
        source.price(JOE, "0.5");
        source.price(WAVAX, "20");
        script_speeds(&source, "rewardBorrowSpeeds", "0.01", "0.001");
        source.reply(MARKET, "totalBorrows", &[], json!("2000000"));
        source.reply(ORACLE, "getUnderlyingPrice", &[json!(MARKET)], json!("1000000000000000000000000000000000000"));

        // (0.005 + 0.02) USD/s over a year against $2,000,000
        let apr = engine.get_borrow_rewards_apr(MARKET).await.unwrap();
        assert_eq!(apr, MetricResult::Value(dec("39.42")));
    }

    #[tokio::test]
    async fn test_empty_market_rewards_fail_instead_of_zero() {
        let source = Arc::new(ScriptedSource::new());
        let engine = testing::engine(source.clone());
        script_markets(&source);
        source.price(JOE, "0.5");
        source.price(WAVAX, "20");
        script_speeds(&source, "rewardBorrowSpeeds", "0.01", "0");
        source.reply(MARKET, "totalBorrows", &[], json!("0"));
        source.reply(ORACLE, "getUnderlyingPrice", &[json!(MARKET)], json!("1"));

        assert!(matches!(
            engine.get_borrow_rewards_apr(MARKET).await,
            Err(Error::ZeroDenominator(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_price_propagates_and_is_retried() {
        let source = Arc::new(ScriptedSource::new());
        let engine = testing::engine(source.clone());
        script_markets(&source);
        source.fail_price(JOE);
        source.price(WAVAX, "20");

        assert!(matches!(
            engine.get_supply_rewards_apr(MARKET).await,
            Err(Error::RemoteCall(_))
        ));
        assert_eq!(source.count(DISTRIBUTOR, "rewardSupplySpeeds"), 0);

        source.price(JOE, "0.5");
        script_speeds(&source, "rewardSupplySpeeds", "0.01", "0");
        source.reply(MARKET, "totalSupply", &[], json!("1000000"));
        source.reply(MARKET, "exchangeRateStored", &[], json!(testing::wei("1")));
        source.reply(ORACLE, "getUnderlyingPrice", &[json!(MARKET)], json!("1000000000000000000000000000000000000"));
        assert!(engine.get_supply_rewards_apr(MARKET).await.unwrap().is_value());
        assert_eq!(source.count(JOE, "price"), 2);
    }
}
