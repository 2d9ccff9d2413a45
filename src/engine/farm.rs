use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};
use serde_json::json;

use super::{lift, Engine, Inputs};
use crate::{
    cache_keys::{MetricKind, Subject},
    error::Error,
    helpers::{checked_div, from_scaled, from_wei, normalize_address, reward_apr, round_dp},
    model::{ChefVersion, FarmListItem, MetricResult, PartitionId},
};

impl Engine {
    /// Every farm of both chefs, keyed by chef address.
    pub async fn list_farms(
        &self,
    ) -> Result<BTreeMap<String, Vec<FarmListItem>>, Error> {
        self.discover_farms().await?;

        let mut list = BTreeMap::new();
        for version in ChefVersion::ALL {
            let items = self
                .registry
                .entities(PartitionId::Farm(version))
                .await
                .into_iter()
                .map(|entity| FarmListItem {
                    token: entity.address,
                    pid: entity.pid,
                })
                .collect();
            list.insert(self.chef(version).to_owned(), items);
        }

        Ok(list)
    }

    async fn farm_metric(
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

    pub async fn get_farm_apr(
        &self,
        lp: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        self.farm_metric(lp, MetricKind::FarmApr).await
    }

    pub async fn get_farm_liquidity(
        &self,
        lp: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        let liquidity = self.farm_metric(lp, MetricKind::FarmLiquidity).await?;
        Ok(liquidity.map(|value| round_dp(&value, 2)))
    }

    /// APR paid by the farm's secondary rewarder. Farms without one earn
    /// exactly zero.
    pub async fn get_bonus_apr(
        &self,
        lp: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        let lp = normalize_address(lp)?;
        match self.find_farm(&lp).await? {
            None => Ok(MetricResult::NotTracked),
            Some((_, entity)) if entity.rewarder.is_none() => {
                Ok(MetricResult::Value(BigDecimal::zero()))
            },
            Some(_) => lift(self.resolve(MetricKind::BonusApr, &lp).await),
        }
    }

    /// Share of the chef's emissions going to the farm, read fresh.
    pub async fn get_pool_weight(
        &self,
        lp: &str,
    ) -> Result<MetricResult<BigDecimal>, Error> {
        let lp = normalize_address(lp)?;
        let Some((version, entity)) = self.find_farm(&lp).await? else {
            return Ok(MetricResult::NotTracked);
        };

        let (alloc, total_alloc) = self.allocation(version, entity.pid).await?;
        let share = checked_div(&alloc, &total_alloc, "total alloc point")?;
        Ok(MetricResult::Value(round_dp(&(share * BigDecimal::from(100)), 2)))
    }

    /// Current `(allocPoint, totalAllocPoint)` of a pool.
    async fn allocation(
        &self,
        version: ChefVersion,
        pid: usize,
    ) -> Result<(BigDecimal, BigDecimal), Error> {
        let chef = self.chef(version);
        let pid_arg = [json!(pid)];
        let (info, total_alloc) = futures::try_join!(
            self.call(chef, "poolInfo", &pid_arg),
            self.call_decimal(chef, "totalAllocPoint", &[]),
        )?;
        let alloc = info.member("allocPoint", 1)?.decimal("allocPoint")?;
        Ok((alloc, total_alloc))
    }

    /// USD value of the LP tokens staked in the chef, kept unrounded since
    /// the APRs divide by it.
    pub(super) async fn farm_liquidity(
        &self,
        lp: &str,
        inputs: &Inputs,
    ) -> Result<BigDecimal, Error> {
        let tvl = inputs.get(MetricKind::PoolTvl, Subject::Entity)?;
        let (version, _) = self.farm_or_unknown(lp).await?;
        let chef_arg = [json!(self.chef(version))];

        let (staked, supply) = futures::try_join!(
            self.call_decimal(lp, "balanceOf", &chef_arg),
            self.call_decimal(lp, "totalSupply", &[]),
        )?;
        let share = checked_div(&staked, &supply, "lp total supply")?;
        Ok(tvl * share)
    }

    pub(super) async fn farm_apr(
        &self,
        lp: &str,
        inputs: &Inputs,
    ) -> Result<BigDecimal, Error> {
        let joe_price = inputs.get(MetricKind::TokenPrice, Subject::Joe)?;
        let liquidity = inputs.get(MetricKind::FarmLiquidity, Subject::Entity)?;
        let (version, entity) = self.farm_or_unknown(lp).await?;

        let ((alloc, total_alloc), joe_per_sec) = futures::try_join!(
            self.allocation(version, entity.pid),
            self.call_decimal(self.chef(version), "joePerSec", &[]),
        )?;
        let share = checked_div(&alloc, &total_alloc, "total alloc point")?;
        let rate = share * from_wei(&joe_per_sec);

        let apr =
            reward_apr(&rate, joe_price, liquidity, version.apr_multiplier())?;
        Ok(round_dp(&apr, 2))
    }

    pub(super) async fn bonus_apr(
        &self,
        lp: &str,
        inputs: &Inputs,
    ) -> Result<BigDecimal, Error> {
        let reward_price = inputs.get(MetricKind::TokenPrice, Subject::RewardToken)?;
        let liquidity = inputs.get(MetricKind::FarmLiquidity, Subject::Entity)?;
        let rewarder = self.rewarder(lp).await?;
        let reward_token = self.reward_token(lp).await?;

        let (per_sec, decimals) = futures::try_join!(
            self.call_decimal(&rewarder, "tokenPerSec", &[]),
            self.call(&reward_token, "decimals", &[]),
        )?;
        let rate = from_scaled(&per_sec, decimals.integer("decimals")?);

        let apr = reward_apr(&rate, reward_price, liquidity, 1)?;
        Ok(round_dp(&apr, 2))
    }

    async fn rewarder(&self, lp: &str) -> Result<String, Error> {
        let (_, entity) = self.farm_or_unknown(lp).await?;
        entity
            .rewarder
            .ok_or_else(|| Error::FieldNotExist(format!("rewarder of {}", lp)))
    }

    /// Token paid by the farm's rewarder.
    pub(super) async fn reward_token(&self, lp: &str) -> Result<String, Error> {
        let rewarder = self.rewarder(lp).await?;
        self.static_address(&rewarder, "rewardToken").await
    }
}
