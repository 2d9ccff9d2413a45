//! Derived metric kinds, their cache lifetimes and their declared inputs.
//!
//! The dependency table is the single place that fixes which metrics a
//! metric reads before it is combined. The engine walks it in order.

use std::fmt;
use std::time::Duration;

use crate::configuration::CacheTtl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    TokenPrice,
    PoolTvl,
    FarmLiquidity,
    FarmApr,
    BonusApr,
    SupplyApr,
    SupplyApy,
    BorrowApr,
    BorrowApy,
    SupplyRewardsApr,
    BorrowRewardsApr,
    PoolVolume,
    PoolFees,
    PoolApr,
    StakeFees,
    StakeApr,
    StakeApy,
    TokenTotalSupply,
    CirculatingSupply,
    MaxSupply,
}

/// Which address a dependency is evaluated for, relative to the entity the
/// dependent metric is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Entity,
    Joe,
    Wavax,
    PairToken0,
    PairToken1,
    RewardToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub kind: MetricKind,
    pub subject: Subject,
}

const fn dep(kind: MetricKind, subject: Subject) -> Dependency {
    Dependency { kind, subject }
}

const NONE: &[Dependency] = &[];
const POOL_TVL: &[Dependency] = &[
    dep(MetricKind::TokenPrice, Subject::PairToken0),
    dep(MetricKind::TokenPrice, Subject::PairToken1),
];
const FARM_LIQUIDITY: &[Dependency] = &[dep(MetricKind::PoolTvl, Subject::Entity)];
const FARM_APR: &[Dependency] = &[
    dep(MetricKind::TokenPrice, Subject::Joe),
    dep(MetricKind::FarmLiquidity, Subject::Entity),
];
const BONUS_APR: &[Dependency] = &[
    dep(MetricKind::TokenPrice, Subject::RewardToken),
    dep(MetricKind::FarmLiquidity, Subject::Entity),
];
const SUPPLY_APY: &[Dependency] = &[dep(MetricKind::SupplyApr, Subject::Entity)];
const BORROW_APY: &[Dependency] = &[dep(MetricKind::BorrowApr, Subject::Entity)];
const REWARDS_APR: &[Dependency] = &[
    dep(MetricKind::TokenPrice, Subject::Joe),
    dep(MetricKind::TokenPrice, Subject::Wavax),
];
const POOL_FEES: &[Dependency] = &[dep(MetricKind::PoolVolume, Subject::Entity)];
const POOL_APR: &[Dependency] = &[
    dep(MetricKind::PoolFees, Subject::Entity),
    dep(MetricKind::PoolTvl, Subject::Entity),
];
const STAKE_FEES: &[Dependency] = &[dep(MetricKind::TokenPrice, Subject::Joe)];
const STAKE_APR: &[Dependency] = &[
    dep(MetricKind::StakeFees, Subject::Entity),
    dep(MetricKind::TokenPrice, Subject::Joe),
];
const STAKE_APY: &[Dependency] = &[dep(MetricKind::StakeApr, Subject::Entity)];
const CIRCULATING_SUPPLY: &[Dependency] =
    &[dep(MetricKind::TokenTotalSupply, Subject::Entity)];

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::TokenPrice => "token_price",
            MetricKind::PoolTvl => "pool_tvl",
            MetricKind::FarmLiquidity => "farm_liquidity",
            MetricKind::FarmApr => "farm_apr",
            MetricKind::BonusApr => "bonus_apr",
            MetricKind::SupplyApr => "supply_apr",
            MetricKind::SupplyApy => "supply_apy",
            MetricKind::BorrowApr => "borrow_apr",
            MetricKind::BorrowApy => "borrow_apy",
            MetricKind::SupplyRewardsApr => "supply_rewards_apr",
            MetricKind::BorrowRewardsApr => "borrow_rewards_apr",
            MetricKind::PoolVolume => "pool_volume",
            MetricKind::PoolFees => "pool_fees",
            MetricKind::PoolApr => "pool_apr",
            MetricKind::StakeFees => "stake_fees",
            MetricKind::StakeApr => "stake_apr",
            MetricKind::StakeApy => "stake_apy",
            MetricKind::TokenTotalSupply => "token_total_supply",
            MetricKind::CirculatingSupply => "circulating_supply",
            MetricKind::MaxSupply => "max_supply",
        }
    }

    /// Direct inputs, in the order they are refreshed.
    pub fn dependencies(self) -> &'static [Dependency] {
        match self {
            MetricKind::PoolTvl => POOL_TVL,
            MetricKind::FarmLiquidity => FARM_LIQUIDITY,
            MetricKind::FarmApr => FARM_APR,
            MetricKind::BonusApr => BONUS_APR,
            MetricKind::SupplyApy => SUPPLY_APY,
            MetricKind::BorrowApy => BORROW_APY,
            MetricKind::SupplyRewardsApr | MetricKind::BorrowRewardsApr => {
                REWARDS_APR
            },
            MetricKind::PoolFees => POOL_FEES,
            MetricKind::PoolApr => POOL_APR,
            MetricKind::StakeFees => STAKE_FEES,
            MetricKind::StakeApr => STAKE_APR,
            MetricKind::StakeApy => STAKE_APY,
            MetricKind::CirculatingSupply => CIRCULATING_SUPPLY,
            MetricKind::TokenPrice
            | MetricKind::SupplyApr
            | MetricKind::BorrowApr
            | MetricKind::PoolVolume
            | MetricKind::TokenTotalSupply
            | MetricKind::MaxSupply => NONE,
        }
    }

    pub fn ttl(self, ttl: &CacheTtl) -> Duration {
        match self {
            MetricKind::TokenPrice => ttl.price,
            MetricKind::PoolTvl | MetricKind::PoolApr => ttl.pool,
            MetricKind::FarmLiquidity
            | MetricKind::FarmApr
            | MetricKind::BonusApr => ttl.farm,
            MetricKind::SupplyApr
            | MetricKind::SupplyApy
            | MetricKind::BorrowApr
            | MetricKind::BorrowApy
            | MetricKind::SupplyRewardsApr
            | MetricKind::BorrowRewardsApr => ttl.lending,
            MetricKind::PoolVolume
            | MetricKind::PoolFees
            | MetricKind::StakeFees
            | MetricKind::StakeApr
            | MetricKind::StakeApy => ttl.hourly,
            MetricKind::TokenTotalSupply | MetricKind::CirculatingSupply => {
                ttl.supply
            },
            MetricKind::MaxSupply => ttl.static_data,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every transitive input of `kind`, each listed once and after its own
/// inputs. Subjects are rebased so that `Subject::Entity` always means the
/// entity `kind` is computed for.
pub fn evaluation_order(kind: MetricKind) -> Vec<Dependency> {
    fn visit(kind: MetricKind, subject: Subject, order: &mut Vec<Dependency>) {
        for child in kind.dependencies() {
            let rebased = match child.subject {
                Subject::Entity => subject,
                other => other,
            };
            visit(child.kind, rebased, order);
            let step = dep(child.kind, rebased);
            if !order.contains(&step) {
                order.push(step);
            }
        }
    }

    let mut order = Vec::new();
    visit(kind, Subject::Entity, &mut order);
    order
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub entity: String,
    pub kind: MetricKind,
}

impl CacheKey {
    pub fn new(entity: &str, kind: MetricKind) -> Self {
        Self {
            entity: entity.to_owned(),
            kind,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.entity)
    }
}
