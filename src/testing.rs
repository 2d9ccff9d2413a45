//! Fakes shared by the unit tests.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::{json, Value};

use crate::{
    cache::Clock,
    configuration::{CacheTtl, Contracts},
    engine::{Engine, EngineSettings},
    error::Error,
    helpers::ZERO_ADDRESS,
    provider::{ChainSource, RawValue},
};

pub const HOUR_MS: i64 = 3_600_000;
pub const START_MS: i64 = 1_700_000_000_000;

pub const JOETROLLER: &str = "0xdc13687554205e5b89ac783db14bb5bba4a1edac";
pub const LENDING_TOTALS: &str = "0x3e5cc3a0d0f0b6ba04a7cc0f3b2c1a0c0f6d4e11";
pub const ORACLE: &str = "0xd7ae651985a871c1bc254748c40ecc733110bc2e";
pub const DISTRIBUTOR: &str = "0x45b2c4139d96f44667577c0d7f7a7d170b420324";
pub const CHEF_V2: &str = "0xd6a4f121ca35509af06a0be99093d08462f53052";
pub const CHEF_V3: &str = "0x188bed1968b795d5c9022f6a0bb5931ac4c18f00";
pub const FACTORY: &str = "0x9ad6c38be94206ca50bb0d90783181662f0cfa10";
pub const JOE: &str = "0x6e84a6216ea6dacc71ee8e6b0a5b7322eebc0fdd";
pub const WAVAX: &str = "0xb31f66aa3c1e785363f0875a1b74e27b85fd66c7";
pub const XJOE: &str = "0x57319d41f71e81f3c65f2a47ca4e001ebafd4f33";
pub const BURN: &str = "0x000000000000000000000000000000000000dead";
pub const TREASURY: [&str; 2] = [
    "0xaff90532e2937fe3a5ac9d3df4d3d9e0d3f0a2c1",
    "0x66fb02746d72bc640643fdba3aefe9c126f0aa4f",
];

/// Pair of `TOKEN_0`/`TOKEN_1`, listed by the V2 chef in most tests.
pub const LP_A: &str = "0xa389f9430876455c36478deea9769b7ca4e3ddb1";
pub const LP_B: &str = "0xfe15c2695f1f920da45c30aae47d11de51007af9";
pub const TOKEN_0: &str = "0xb97ef9ef8734c71904d8002f8b6bc66dd9c48a6e";
pub const TOKEN_1: &str = "0x49d5c2bdffac6ce2bfdb6640f4f80f226bc10bab";

#[derive(Debug)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        ManualClock(AtomicI64::new(start_ms))
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn settings() -> EngineSettings {
    EngineSettings {
        contracts: Contracts {
            joetroller: JOETROLLER.to_owned(),
            lending_totals: LENDING_TOTALS.to_owned(),
            price_oracle: ORACLE.to_owned(),
            reward_distributor: DISTRIBUTOR.to_owned(),
            masterchef_v2: CHEF_V2.to_owned(),
            masterchef_v3: CHEF_V3.to_owned(),
            factory: FACTORY.to_owned(),
            joe: JOE.to_owned(),
            wavax: WAVAX.to_owned(),
            xjoe: XJOE.to_owned(),
            burn: BURN.to_owned(),
            team_treasury: TREASURY.iter().map(|w| w.to_string()).collect(),
        },
        ttl: CacheTtl {
            supply: Duration::from_secs(10),
            lending: Duration::from_secs(60),
            price: Duration::from_secs(10),
            farm: Duration::from_secs(60),
            pool: Duration::from_secs(60),
            hourly: Duration::from_secs(3600),
            static_data: Duration::from_secs(86400),
        },
        pool_fee_percent: BigDecimal::from_str("0.0025").unwrap(),
        window_length: 24,
        window_interval: Duration::from_secs(3600),
    }
}

pub fn engine(source: Arc<ScriptedSource>) -> Engine {
    engine_with_clock(source, Arc::new(ManualClock::new(START_MS)))
}

pub fn engine_with_clock(
    source: Arc<ScriptedSource>,
    clock: Arc<ManualClock>,
) -> Engine {
    Engine::new(source, clock, settings())
}

/// Scripts a chef listing `pools` as `(lp, allocPoint)` with no rewarders.
pub fn script_chef(
    source: &ScriptedSource,
    chef: &str,
    pools: &[(&str, &str)],
    total_alloc: &str,
) {
    source.reply(chef, "poolLength", &[], json!(pools.len().to_string()));
    source.reply(chef, "totalAllocPoint", &[], json!(total_alloc));
    for (pid, (lp, alloc)) in pools.iter().enumerate() {
        source.reply(
            chef,
            "poolInfo",
            &[json!(pid)],
            json!({
                "lpToken": lp,
                "allocPoint": alloc,
                "lastRewardTimestamp": "0",
                "accJoePerShare": "0",
                "rewarder": ZERO_ADDRESS,
            }),
        );
    }
}

/// Scripts `LP_A` as a pair of two 18-decimal tokens holding the given
/// plain amounts, priced at the given USD values.
pub fn script_pair(
    source: &ScriptedSource,
    reserves: (&str, &str),
    prices: (&str, &str),
) {
    source.reply(LP_A, "token0", &[], json!(TOKEN_0));
    source.reply(LP_A, "token1", &[], json!(TOKEN_1));
    source.reply(TOKEN_0, "decimals", &[], json!("18"));
    source.reply(TOKEN_1, "decimals", &[], json!("18"));
    source.reply(TOKEN_0, "balanceOf", &[json!(LP_A)], json!(wei(reserves.0)));
    source.reply(TOKEN_1, "balanceOf", &[json!(LP_A)], json!(wei(reserves.1)));
    source.price(TOKEN_0, prices.0);
    source.price(TOKEN_1, prices.1);
}

/// Position of the first logged call equal to `entry`.
pub fn position(calls: &[String], entry: &str) -> usize {
    calls
        .iter()
        .position(|call| call == entry)
        .unwrap_or_else(|| panic!("{} not called in {:?}", entry, calls))
}

/// `value` (a plain decimal such as "0.5") as an 18-decimal scaled integer.
pub fn wei(value: &str) -> String {
    let scaled = BigDecimal::from_str(value).unwrap()
        * BigDecimal::from_str("1000000000000000000").unwrap();
    scaled.with_scale(0).to_string()
}

#[derive(Debug, Clone)]
enum Reply {
    Value(Value),
    Revert,
    Fail,
}

type SpanFn = Box<dyn Fn(i64, i64) -> Option<String> + Send + Sync>;

/// Scripted chain source that records every call it receives.
#[derive(Default)]
pub struct ScriptedSource {
    replies: Mutex<HashMap<(String, String, String), Reply>>,
    prices: Mutex<HashMap<String, Reply>>,
    volumes: Mutex<HashMap<String, SpanFn>>,
    events: Mutex<HashMap<String, SpanFn>>,
    log: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(address: &str, method: &str, args: &[Value]) -> (String, String, String) {
        (
            address.to_lowercase(),
            method.to_owned(),
            Value::Array(args.to_vec()).to_string(),
        )
    }

    fn set(&self, address: &str, method: &str, args: &[Value], reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(Self::key(address, method, args), reply);
    }

    pub fn reply(&self, address: &str, method: &str, args: &[Value], value: Value) {
        self.set(address, method, args, Reply::Value(value));
    }

    pub fn revert(&self, address: &str, method: &str, args: &[Value]) {
        self.set(address, method, args, Reply::Revert);
    }

    pub fn fail(&self, address: &str, method: &str, args: &[Value]) {
        self.set(address, method, args, Reply::Fail);
    }

    /// Sets the USD price of `token` given as a plain decimal.
    pub fn price(&self, token: &str, usd: &str) {
        self.prices
            .lock()
            .unwrap()
            .insert(token.to_lowercase(), Reply::Value(json!(wei(usd))));
    }

    pub fn fail_price(&self, token: &str) {
        self.prices
            .lock()
            .unwrap()
            .insert(token.to_lowercase(), Reply::Fail);
    }

    /// Hourly swap volume of `pair` (plain USD decimal) as a function of the
    /// sampled span. `None` makes the read fail.
    pub fn volume<F>(&self, pair: &str, f: F)
    where
        F: Fn(i64, i64) -> Option<String> + Send + Sync + 'static,
    {
        self.volumes
            .lock()
            .unwrap()
            .insert(pair.to_lowercase(), Box::new(f));
    }

    pub fn events<F>(&self, address: &str, f: F)
    where
        F: Fn(i64, i64) -> Option<String> + Send + Sync + 'static,
    {
        self.events
            .lock()
            .unwrap()
            .insert(address.to_lowercase(), Box::new(f));
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, address: &str, method: &str) -> usize {
        let entry = format!("{}.{}", address.to_lowercase(), method);
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == entry)
            .count()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn answer(reply: Option<Reply>, address: &str, method: &str) -> Result<RawValue, Error> {
        match reply {
            Some(Reply::Value(value)) => Ok(RawValue(value)),
            Some(Reply::Revert) => Err(Error::ContractReverted {
                address: address.to_owned(),
                method: method.to_owned(),
            }),
            Some(Reply::Fail) => {
                Err(Error::RemoteCall(format!("{}.{} failed", address, method)))
            },
            None => Err(Error::RemoteCall(format!(
                "{}.{} not scripted",
                address, method
            ))),
        }
    }

    fn span(
        table: &Mutex<HashMap<String, SpanFn>>,
        address: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<RawValue, Error> {
        let table = table.lock().unwrap();
        table
            .get(&address.to_lowercase())
            .and_then(|f| f(from_ms, to_ms))
            .map(|usd| RawValue(json!(wei(&usd))))
            .ok_or_else(|| Error::RemoteCall(format!("{} span failed", address)))
    }
}

#[async_trait]
impl ChainSource for ScriptedSource {
    async fn call_contract(
        &self,
        address: &str,
        method: &str,
        args: &[Value],
    ) -> Result<RawValue, Error> {
        self.record(format!("{}.{}", address.to_lowercase(), method));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&Self::key(address, method, args))
            .cloned();
        Self::answer(reply, address, method)
    }

    async fn get_price(
        &self,
        token: &str,
        _inverse: bool,
    ) -> Result<RawValue, Error> {
        self.record(format!("{}.price", token.to_lowercase()));
        let reply = self.prices.lock().unwrap().get(&token.to_lowercase()).cloned();
        Self::answer(reply, token, "price")
    }

    async fn get_swap_volume(
        &self,
        pair: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<RawValue, Error> {
        self.record(format!("{}.volume", pair.to_lowercase()));
        Self::span(&self.volumes, pair, from_ms, to_ms)
    }

    async fn get_event_total(
        &self,
        address: &str,
        _topic: &str,
        _field: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<RawValue, Error> {
        self.record(format!("{}.events", address.to_lowercase()));
        Self::span(&self.events, address, from_ms, to_ms)
    }
}
