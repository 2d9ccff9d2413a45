//! Derived metric engine.
//!
//! `Engine` owns every piece of process-wide state: the registry, the
//! rolling windows and the metric caches. Each metric kind is computed by
//! first resolving the inputs declared in [`MetricKind::dependencies`], in
//! order and through the cache, then combining them with fresh reads.

use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    cache::{Clock, TtlCache},
    cache_keys::{CacheKey, Dependency, MetricKind, Subject},
    configuration::{CacheTtl, Contracts},
    error::Error,
    helpers::from_wei,
    model::{ChefVersion, Entity, Listing, MetricResult, PairInfo, PartitionId},
    provider::{ChainSource, RawValue},
    registry::Registry,
    rolling_window::WindowStore,
};

use self::lending::{LendingSide, LendingTotals};

mod farm;
mod lending;
mod pool;
mod stake;
mod supply;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub contracts: Contracts,
    pub ttl: CacheTtl,
    pub pool_fee_percent: BigDecimal,
    pub window_length: usize,
    pub window_interval: Duration,
}

/// Values of the declared dependencies of one metric, keyed by dependency.
#[derive(Debug, Default)]
struct Inputs(Vec<(Dependency, BigDecimal)>);

impl Inputs {
    fn insert(&mut self, dependency: Dependency, value: BigDecimal) {
        self.0.push((dependency, value));
    }

    fn get(&self, kind: MetricKind, subject: Subject) -> Result<&BigDecimal, Error> {
        self.0
            .iter()
            .find(|(dependency, _)| {
                dependency.kind == kind && dependency.subject == subject
            })
            .map(|(_, value)| value)
            .ok_or_else(|| Error::FieldNotExist(kind.to_string()))
    }
}

pub struct Engine {
    source: Arc<dyn ChainSource>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
    registry: Registry,
    windows: WindowStore,
    metrics: TtlCache<CacheKey, BigDecimal>,
    lending_totals: TtlCache<(), LendingTotals>,
    pairs: TtlCache<String, PairInfo>,
    addresses: TtlCache<String, String>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        source: Arc<dyn ChainSource>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Engine {
        let windows =
            WindowStore::new(settings.window_length, settings.window_interval);

        Engine {
            metrics: TtlCache::new(clock.clone()),
            lending_totals: TtlCache::new(clock.clone()),
            pairs: TtlCache::new(clock.clone()),
            addresses: TtlCache::new(clock.clone()),
            registry: Registry::new(),
            windows,
            source,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn contracts(&self) -> &Contracts {
        &self.settings.contracts
    }

    fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    fn chef(&self, version: ChefVersion) -> &str {
        match version {
            ChefVersion::V2 => &self.contracts().masterchef_v2,
            ChefVersion::V3 => &self.contracts().masterchef_v3,
        }
    }

    fn listing(&self, id: PartitionId) -> Listing {
        match id {
            PartitionId::LendingMarkets => Listing::Array {
                contract: self.contracts().joetroller.clone(),
                method: "getAllMarkets",
            },
            PartitionId::Farm(version) => Listing::Indexed {
                contract: self.chef(version).to_owned(),
                length_method: "poolLength",
                item_method: "poolInfo",
            },
        }
    }

    async fn discover(&self, id: PartitionId) -> Result<usize, Error> {
        self.registry
            .discover(id, &self.listing(id), self.source.as_ref())
            .await
    }

    /// Extends every partition to its remote length.
    pub async fn discover_all(&self) -> Result<usize, Error> {
        let (markets, farms) = futures::try_join!(
            self.discover(PartitionId::LendingMarkets),
            self.discover_farms(),
        )?;
        Ok(markets + farms)
    }

    async fn discover_farms(&self) -> Result<usize, Error> {
        let (v2, v3) = futures::try_join!(
            self.discover(PartitionId::Farm(ChefVersion::V2)),
            self.discover(PartitionId::Farm(ChefVersion::V3)),
        )?;
        Ok(v2 + v3)
    }

    /// Farm listing `lp` as of the last discovery. An LP listed by both
    /// chefs resolves to V2.
    async fn tracked_farm(&self, lp: &str) -> Option<(ChefVersion, Entity)> {
        for version in ChefVersion::ALL {
            if let Some(entity) =
                self.registry.entity(PartitionId::Farm(version), lp).await
            {
                return Some((version, entity));
            }
        }
        None
    }

    async fn find_farm(
        &self,
        lp: &str,
    ) -> Result<Option<(ChefVersion, Entity)>, Error> {
        self.discover_farms().await?;
        Ok(self.tracked_farm(lp).await)
    }

    async fn farm_or_unknown(
        &self,
        lp: &str,
    ) -> Result<(ChefVersion, Entity), Error> {
        self.tracked_farm(lp)
            .await
            .ok_or_else(|| Error::UnknownEntity(lp.to_owned()))
    }

    /// Cached value of `kind` for `entity`, recomputed with all of its
    /// declared inputs when stale.
    fn resolve<'a>(
        &'a self,
        kind: MetricKind,
        entity: &'a str,
    ) -> BoxFuture<'a, Result<BigDecimal, Error>> {
        async move {
            let key = CacheKey::new(entity, kind);
            let ttl = kind.ttl(&self.settings.ttl);

            self.metrics
                .get_or_refresh(&key, ttl, || async {
                    let mut inputs = Inputs::default();
                    for dependency in kind.dependencies() {
                        let subject =
                            self.subject_address(dependency.subject, entity).await?;
                        let value = self.resolve(dependency.kind, &subject).await?;
                        inputs.insert(*dependency, value);
                    }

                    debug!("refreshing {}", key);
                    self.compute(kind, entity, &inputs).await.map_err(|e| {
                        if e.is_remote() {
                            warn!("refresh of {} failed: {}", key, e);
                        } else {
                            debug!("refresh of {} failed: {}", key, e);
                        }
                        e
                    })
                })
                .await
        }
        .boxed()
    }

    async fn subject_address(
        &self,
        subject: Subject,
        entity: &str,
    ) -> Result<String, Error> {
        match subject {
            Subject::Entity => Ok(entity.to_owned()),
            Subject::Joe => Ok(self.contracts().joe.clone()),
            Subject::Wavax => Ok(self.contracts().wavax.clone()),
            Subject::PairToken0 => Ok(self.pair_info(entity).await?.token0),
            Subject::PairToken1 => Ok(self.pair_info(entity).await?.token1),
            Subject::RewardToken => self.reward_token(entity).await,
        }
    }

    async fn compute(
        &self,
        kind: MetricKind,
        entity: &str,
        inputs: &Inputs,
    ) -> Result<BigDecimal, Error> {
        match kind {
            MetricKind::TokenPrice => self.fetch_price(entity).await,
            MetricKind::PoolTvl => self.pool_tvl(entity, inputs).await,
            MetricKind::FarmLiquidity => self.farm_liquidity(entity, inputs).await,
            MetricKind::FarmApr => self.farm_apr(entity, inputs).await,
            MetricKind::BonusApr => self.bonus_apr(entity, inputs).await,
            MetricKind::SupplyApr => {
                self.interest_apr(entity, LendingSide::Supply).await
            },
            MetricKind::BorrowApr => {
                self.interest_apr(entity, LendingSide::Borrow).await
            },
            MetricKind::SupplyApy => {
                Self::interest_apy(inputs, LendingSide::Supply)
            },
            MetricKind::BorrowApy => {
                Self::interest_apy(inputs, LendingSide::Borrow)
            },
            MetricKind::SupplyRewardsApr => {
                self.rewards_apr(entity, LendingSide::Supply, inputs).await
            },
            MetricKind::BorrowRewardsApr => {
                self.rewards_apr(entity, LendingSide::Borrow, inputs).await
            },
            MetricKind::PoolVolume => self.pool_volume(entity).await,
            MetricKind::PoolFees => self.pool_fees(inputs),
            MetricKind::PoolApr => Self::pool_apr(inputs),
            MetricKind::StakeFees => self.stake_fees(inputs).await,
            MetricKind::StakeApr => self.stake_apr(inputs).await,
            MetricKind::StakeApy => Self::stake_apy(inputs),
            MetricKind::TokenTotalSupply => self.token_total_supply().await,
            MetricKind::CirculatingSupply => {
                self.circulating_supply(inputs).await
            },
            MetricKind::MaxSupply => self.max_supply().await,
        }
    }

    async fn call(
        &self,
        address: &str,
        method: &str,
        args: &[Value],
    ) -> Result<RawValue, Error> {
        self.source.call_contract(address, method, args).await
    }

    async fn call_decimal(
        &self,
        address: &str,
        method: &str,
        args: &[Value],
    ) -> Result<BigDecimal, Error> {
        self.call(address, method, args).await?.decimal(method)
    }

    async fn call_address(
        &self,
        address: &str,
        method: &str,
    ) -> Result<String, Error> {
        self.call(address, method, &[]).await?.address(method)
    }

    /// USD price of `token`.
    async fn fetch_price(&self, token: &str) -> Result<BigDecimal, Error> {
        let raw = self.source.get_price(token, false).await?;
        Ok(from_wei(&raw.decimal("price")?))
    }

    /// Address read once through `method` and kept for the static TTL.
    async fn static_address(
        &self,
        contract: &str,
        method: &str,
    ) -> Result<String, Error> {
        let key = format!("{}.{}", contract, method);
        self.addresses
            .get_or_refresh(&key, self.settings.ttl.static_data, || {
                self.call_address(contract, method)
            })
            .await
    }

    /// Reserve tokens of `lp`. A revert of either token getter means `lp`
    /// is not a pair.
    async fn pair_info(&self, lp: &str) -> Result<PairInfo, Error> {
        self.pairs
            .get_or_refresh(&lp.to_owned(), self.settings.ttl.static_data, || async {
                let (token0, token1) = futures::try_join!(
                    self.pair_token(lp, "token0"),
                    self.pair_token(lp, "token1"),
                )?;
                let (decimals0, decimals1) = futures::try_join!(
                    self.call(&token0, "decimals", &[]),
                    self.call(&token1, "decimals", &[]),
                )?;

                Ok(PairInfo {
                    decimals0: decimals0.integer("decimals")?,
                    decimals1: decimals1.integer("decimals")?,
                    token0,
                    token1,
                })
            })
            .await
    }

    async fn pair_token(&self, lp: &str, method: &str) -> Result<String, Error> {
        match self.call_address(lp, method).await {
            Err(Error::ContractReverted { .. }) => {
                Err(Error::NotLpToken(lp.to_owned()))
            },
            other => other,
        }
    }
}

fn lift(result: Result<BigDecimal, Error>) -> Result<MetricResult<BigDecimal>, Error> {
    match result {
        Ok(value) => Ok(MetricResult::Value(value)),
        Err(Error::NotLpToken(address)) => {
            debug!("{} is not an LP token", address);
            Ok(MetricResult::NotLpToken)
        },
        Err(e) => Err(e),
    }
}
