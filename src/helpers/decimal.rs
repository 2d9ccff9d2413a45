//! Decimal arithmetic shared by every metric.
//!
//! Raw on-chain integers are turned into `BigDecimal` once, at the edge, and
//! all rate math stays in `BigDecimal` from there on.

use bigdecimal::{num_bigint::BigInt, BigDecimal, One, RoundingMode, Zero};

use crate::error::Error;

pub const SECONDS_PER_YEAR: u32 = 31_536_000;
pub const DAYS_PER_YEAR: u32 = 365;
pub const WEI_DECIMALS: i64 = 18;

/// Significant digits kept between the multiplication steps of [`pow`].
const POW_PRECISION: u64 = 60;

/// `10^exp` as an exact decimal.
pub fn pow10(exp: i64) -> BigDecimal {
    BigDecimal::new(BigInt::one(), -exp)
}

/// Interprets `raw` as an integer carrying `decimals` fractional digits.
pub fn from_scaled(raw: &BigDecimal, decimals: i64) -> BigDecimal {
    raw * BigDecimal::new(BigInt::one(), decimals)
}

pub fn from_wei(raw: &BigDecimal) -> BigDecimal {
    from_scaled(raw, WEI_DECIMALS)
}

pub fn checked_div(
    numerator: &BigDecimal,
    denominator: &BigDecimal,
    what: &str,
) -> Result<BigDecimal, Error> {
    if denominator.is_zero() {
        return Err(Error::ZeroDenominator(what.to_owned()));
    }
    Ok(numerator / denominator)
}

/// Integer power by repeated squaring, rounded to a bounded precision after
/// every step so that compounding 365 times does not grow the digit count.
pub fn pow(base: &BigDecimal, exp: u32) -> BigDecimal {
    let mut result = BigDecimal::one();
    let mut square = base.with_prec(POW_PRECISION);
    let mut exp = exp;

    while exp > 0 {
        if exp & 1 == 1 {
            result = (&result * &square).with_prec(POW_PRECISION);
        }
        exp >>= 1;
        if exp > 0 {
            square = (&square * &square).with_prec(POW_PRECISION);
        }
    }

    result
}

/// Rounds half-up to `places` fractional digits.
pub fn round_dp(value: &BigDecimal, places: i64) -> BigDecimal {
    value.with_scale_round(places, RoundingMode::HalfUp)
}

/// Drops trailing fractional zeros without switching to exponent form.
pub fn trim_zeros(value: &BigDecimal) -> BigDecimal {
    let trimmed = value.normalized();
    let (_, scale) = trimmed.as_bigint_and_exponent();
    if scale < 0 {
        trimmed.with_scale(0)
    } else {
        trimmed
    }
}

/// APY of a percentage APR compounded once a day:
/// `((1 + apr/100/365)^365 - 1) * 100`.
pub fn apy_daily_compound(percent_apr: &BigDecimal) -> BigDecimal {
    let hundred = BigDecimal::from(100);
    let days = BigDecimal::from(DAYS_PER_YEAR);
    let daily = percent_apr / &hundred / &days;
    let growth = pow(&(BigDecimal::one() + daily), DAYS_PER_YEAR);
    (growth - BigDecimal::one()) * hundred
}

/// Percentage APR of a reward stream paid per second against a value locked.
///
/// `multiplier` scales the denominator for farms that split emissions
/// between both sides of the pair.
pub fn reward_apr(
    rate_per_second: &BigDecimal,
    reward_price: &BigDecimal,
    value_locked: &BigDecimal,
    multiplier: u32,
) -> Result<BigDecimal, Error> {
    let yearly = rate_per_second
        * BigDecimal::from(SECONDS_PER_YEAR)
        * reward_price;
    let denominator = value_locked * BigDecimal::from(multiplier);
    let apr = checked_div(&yearly, &denominator, "reward apr")?;
    Ok(apr * BigDecimal::from(100))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_from_scaled_is_exact() {
        assert_eq!(from_scaled(&dec("1500000"), 6), dec("1.5"));
        assert_eq!(from_wei(&dec("250000000000000000")), dec("0.25"));
        assert_eq!(pow10(3), dec("1000"));
    }

    #[test]
    fn test_pow_integer_exponent() {
        assert_eq!(pow(&dec("2"), 10), dec("1024"));
        assert_eq!(pow(&dec("1.5"), 2), dec("2.25"));
        assert_eq!(pow(&dec("7"), 0), BigDecimal::one());
    }

    #[test]
    fn test_checked_div_rejects_zero() {
        let err = checked_div(&dec("1"), &BigDecimal::zero(), "tvl");
        assert!(matches!(err, Err(Error::ZeroDenominator(what)) if what == "tvl"));
    }

    #[test]
    fn test_reward_apr_matches_worked_example() {
        // 0.01 JOE/s at $0.50 against $1,000,000 locked
        let apr =
            reward_apr(&dec("0.01"), &dec("0.5"), &dec("1000000"), 1)
                .unwrap();
        assert_eq!(apr, dec("15.768"));
        assert_eq!(round_dp(&apr, 2), dec("15.77"));
    }

    #[test]
    fn test_reward_apr_multiplier_halves_rate() {
        let single =
            reward_apr(&dec("1"), &dec("1"), &dec("31536000"), 1).unwrap();
        let double =
            reward_apr(&dec("1"), &dec("1"), &dec("31536000"), 2).unwrap();
        assert_eq!(single, dec("100"));
        assert_eq!(double, dec("50"));
    }

    #[test]
    fn test_apy_daily_compound_worked_example() {
        let apy = apy_daily_compound(&dec("15.77"));
        assert_eq!(round_dp(&apy, 2), dec("17.08"));
    }

    #[test]
    fn test_apy_of_zero_apr_is_zero() {
        assert_eq!(round_dp(&apy_daily_compound(&BigDecimal::zero()), 8), BigDecimal::zero());
    }

    #[test]
    fn test_apy_is_monotonic_in_apr() {
        let aprs = ["0", "0.01", "1", "5", "15.77", "100", "250"];
        let apys: Vec<BigDecimal> =
            aprs.iter().map(|apr| apy_daily_compound(&dec(apr))).collect();

        for pair in apys.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
        for (apr, apy) in aprs.iter().zip(&apys).skip(1) {
            assert!(apy > &dec(apr));
        }
    }

    #[test]
    fn test_trim_zeros() {
        assert_eq!(trim_zeros(&dec("440000000.000000000000000000")).to_string(), "440000000");
        assert_eq!(trim_zeros(&dec("1.2500")).to_string(), "1.25");
        assert_eq!(trim_zeros(&dec("0.000")).to_string(), "0");
    }

    #[test]
    fn test_round_dp_half_up() {
        assert_eq!(round_dp(&dec("1.005"), 2), dec("1.01"));
        assert_eq!(round_dp(&dec("1.0049"), 2), dec("1.00"));
    }
}
