pub use self::{
    address::{is_zero_address, normalize_address, ZERO_ADDRESS},
    decimal::{
        apy_daily_compound, checked_div, from_scaled, from_wei, pow, pow10,
        reward_apr, round_dp, trim_zeros, DAYS_PER_YEAR, SECONDS_PER_YEAR,
    },
};

mod address;
mod decimal;
