use serde::Serialize;

/// Static description of an AMM pair's two reserve tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairInfo {
    pub token0: String,
    pub token1: String,
    pub decimals0: i64,
    pub decimals1: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FarmListItem {
    pub token: String,
    pub pid: usize,
}
