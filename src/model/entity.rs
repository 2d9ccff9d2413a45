use std::fmt;

use serde::Serialize;

/// MasterChef generation a farm is listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChefVersion {
    V2,
    V3,
}

impl ChefVersion {
    pub const ALL: [ChefVersion; 2] = [ChefVersion::V2, ChefVersion::V3];

    /// V2 farms split emissions across both sides of the pair, so their
    /// APR denominator is doubled.
    pub fn apr_multiplier(self) -> u32 {
        match self {
            ChefVersion::V2 => 2,
            ChefVersion::V3 => 1,
        }
    }
}

impl fmt::Display for ChefVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChefVersion::V2 => write!(f, "V2"),
            ChefVersion::V3 => write!(f, "V3"),
        }
    }
}

/// One append-only on-chain list of tracked entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionId {
    LendingMarkets,
    Farm(ChefVersion),
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PartitionId::LendingMarkets => write!(f, "lending-markets"),
            PartitionId::Farm(version) => write!(f, "farm-{}", version),
        }
    }
}

/// How a partition's remote list is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// A single call returning the whole array of addresses.
    Array {
        contract: String,
        method: &'static str,
    },
    /// A length getter plus a per-index record getter.
    Indexed {
        contract: String,
        length_method: &'static str,
        item_method: &'static str,
    },
}

/// Static record of a discovered entity. Never re-fetched once known.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub address: String,
    pub pid: usize,
    pub rewarder: Option<String>,
}
