use std::{env, fs, ops::Deref, str::FromStr, sync::Arc, time::Duration};

use bigdecimal::BigDecimal;
use tracing::{info, warn};
use url::Url;

use crate::{
    cache::{Clock, SystemClock},
    engine::{Engine, EngineSettings},
    error::Error,
    helpers::normalize_address,
    provider::{ChainSource, Gateway},
};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

#[derive(Debug)]
pub struct State {
    pub config: Config,
    pub engine: Engine,
}

impl State {
    pub async fn new(config: Config) -> Result<State, Error> {
        let source: Arc<dyn ChainSource> = Arc::new(Gateway::new(&config)?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let engine = Engine::new(source, clock, config.engine_settings());

        Self::init_registry(&engine).await;

        Ok(Self { config, engine })
    }

    async fn init_registry(engine: &Engine) {
        match engine.discover_all().await {
            Ok(added) => info!("registry initialized with {} entities", added),
            Err(e) => {
                warn!("initial discovery failed, retrying on first request: {}", e)
            },
        }
    }
}

/// On-chain addresses the engine reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contracts {
    pub joetroller: String,
    pub lending_totals: String,
    pub price_oracle: String,
    pub reward_distributor: String,
    pub masterchef_v2: String,
    pub masterchef_v3: String,
    pub factory: String,
    pub joe: String,
    pub wavax: String,
    pub xjoe: String,
    pub burn: String,
    pub team_treasury: Vec<String>,
}

/// Cache lifetime per metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub supply: Duration,
    pub lending: Duration,
    pub price: Duration,
    pub farm: Duration,
    pub pool: Duration,
    pub hourly: Duration,
    pub static_data: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub gateway_url: Url,
    pub price_url: Url,
    pub timeout: u64,
    pub contracts: Contracts,
    pub cache_ttl: CacheTtl,
    pub pool_fee_percent: BigDecimal,
    pub window_length: usize,
    pub window_interval: u64,
}

impl Config {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            contracts: self.contracts.clone(),
            ttl: self.cache_ttl,
            pool_fee_percent: self.pool_fee_percent.clone(),
            window_length: self.window_length,
            window_interval: Duration::from_secs(self.window_interval),
        }
    }
}

fn get_address(key: &str) -> Result<String, Error> {
    let value = env::var(key)?;
    normalize_address(&value).map_err(|_| {
        Error::ConfigurationError(format!("{} is not a valid address", key))
    })
}

fn get_seconds(key: &str) -> Result<Duration, Error> {
    let seconds: u64 = env::var(key)?.parse()?;
    Ok(Duration::from_secs(seconds))
}

fn get_contracts() -> Result<Contracts, Error> {
    let team_treasury = env::var("TEAM_TREASURY_WALLETS")?
        .split(',')
        .filter(|item| !item.trim().is_empty())
        .map(normalize_address)
        .collect::<Result<Vec<String>, Error>>()?;

    Ok(Contracts {
        joetroller: get_address("JOETROLLER_ADDRESS")?,
        lending_totals: get_address("TOTAL_SUPPLY_AND_BORROW_ADDRESS")?,
        price_oracle: get_address("PRICE_ORACLE_ADDRESS")?,
        reward_distributor: get_address("REWARD_DISTRIBUTOR_ADDRESS")?,
        masterchef_v2: get_address("MASTERCHEFV2_ADDRESS")?,
        masterchef_v3: get_address("MASTERCHEFV3_ADDRESS")?,
        factory: get_address("JOE_FACTORY_ADDRESS")?,
        joe: get_address("JOE_ADDRESS")?,
        wavax: get_address("WAVAX_ADDRESS")?,
        xjoe: get_address("XJOE_ADDRESS")?,
        burn: get_address("BURN_ADDRESS")?,
        team_treasury,
    })
}

fn get_cache_ttl() -> Result<CacheTtl, Error> {
    Ok(CacheTtl {
        supply: get_seconds("TTL_SUPPLY_SECS")?,
        lending: get_seconds("TTL_LENDING_SECS")?,
        price: get_seconds("TTL_PRICE_SECS")?,
        farm: get_seconds("TTL_FARM_SECS")?,
        pool: get_seconds("TTL_POOL_SECS")?,
        hourly: get_seconds("TTL_HOURLY_SECS")?,
        static_data: get_seconds("TTL_STATIC_SECS")?,
    })
}

pub fn get_configuration() -> Result<Config, Error> {
    let server_host = env::var("SERVER_HOST")?;
    let port: u16 = env::var("PORT")?.parse()?;
    let allowed_origins = env::var("ALLOWED_ORIGINS")?
        .split(',')
        .map(|item| item.to_owned())
        .collect::<Vec<String>>();
    let gateway_url = Url::parse(&env::var("GATEWAY_URL")?)?;
    let price_url = Url::parse(&env::var("PRICE_URL")?)?;
    let timeout = env::var("TIMEOUT")?.parse()?;
    let pool_fee_percent = BigDecimal::from_str(&env::var("POOL_FEE_PERCENT")?)?;
    let window_length: usize = env::var("WINDOW_LENGTH")?.parse()?;
    let window_interval: u64 = env::var("WINDOW_INTERVAL_SECS")?.parse()?;

    if window_length == 0 || window_interval == 0 {
        return Err(Error::ConfigurationError(String::from(
            "WINDOW_LENGTH and WINDOW_INTERVAL_SECS must be positive",
        )));
    }

    let config = Config {
        server_host,
        port,
        allowed_origins,
        gateway_url,
        price_url,
        timeout,
        contracts: get_contracts()?,
        cache_ttl: get_cache_ttl()?,
        pool_fee_percent,
        window_length,
        window_interval,
    };

    Ok(config)
}

pub fn set_configuration() -> Result<(), Error> {
    let config_file: &str = ".env";

    let directory = env!("CARGO_MANIFEST_DIR");
    let path = format!("{}/{}", directory, config_file);

    let config_string = fs::read_to_string(path)?;
    parse_config_string(config_string);

    Ok(())
}

fn parse_config_string(config: String) {
    let params = config
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='));

    for (key, value) in params {
        env::set_var(key.trim(), value.trim());
    }
}
