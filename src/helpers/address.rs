use crate::error::Error;

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Lower-cases and validates a `0x`-prefixed 20-byte hex address.
pub fn normalize_address(raw: &str) -> Result<String, Error> {
    let address = raw.trim().to_lowercase();
    let valid = address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(Error::MalformedInput(format!(
            "invalid address '{}'",
            raw
        )));
    }

    Ok(address)
}

pub fn is_zero_address(address: &str) -> bool {
    address.eq_ignore_ascii_case(ZERO_ADDRESS)
}
