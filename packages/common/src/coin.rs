//! Coin and denomination metadata types
//!
//! Amounts are `Uint256` so that every value the EVM can represent also fits
//! on the native ledger. Conversions between the two sides are 1:1 in base
//! units.

use std::collections::BTreeSet;
use std::fmt;

use alloy_primitives::U256;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdError, StdResult, Uint256};

/// Maximum length of a denomination
pub const MAX_DENOM_LEN: usize = 128;

/// Minimum length of a denomination
pub const MIN_DENOM_LEN: usize = 3;

// ============================================================================
// Coin
// ============================================================================

#[cw_serde]
pub struct Coin {
    pub denom: String,
    pub amount: Uint256,
}

impl Coin {
    pub fn new(amount: impl Into<Uint256>, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    /// Validate the denomination and require a non-zero amount
    pub fn validate(&self) -> StdResult<()> {
        validate_denom(&self.denom)?;
        if self.amount.is_zero() {
            return Err(StdError::generic_err(format!(
                "invalid coin: zero amount of {}",
                self.denom
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Render a list of coins the way event attributes expect them
pub fn coins_to_string(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Validate a list of coins: every coin valid, denoms unique
pub fn validate_coins(coins: &[Coin]) -> StdResult<()> {
    let mut seen = BTreeSet::new();
    for coin in coins {
        coin.validate()?;
        if !seen.insert(coin.denom.as_str()) {
            return Err(StdError::generic_err(format!(
                "duplicate denomination {}",
                coin.denom
            )));
        }
    }
    Ok(())
}

/// Validate a denomination identifier.
///
/// A denom starts with a letter, is 3 to 128 characters long, and otherwise
/// contains only `[a-zA-Z0-9/:._-]`. Slash-separated provenance segments
/// (`ibc/...`, `erc20/0x...`) are allowed but may not be empty.
pub fn validate_denom(denom: &str) -> StdResult<()> {
    if denom.len() < MIN_DENOM_LEN || denom.len() > MAX_DENOM_LEN {
        return Err(StdError::generic_err(format!(
            "invalid denom length {}: must be between {} and {}",
            denom.len(),
            MIN_DENOM_LEN,
            MAX_DENOM_LEN
        )));
    }

    let mut chars = denom.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(StdError::generic_err(format!(
            "invalid denom {denom}: must start with a letter"
        )));
    }

    if let Some(c) = chars.find(|c| !is_denom_char(*c)) {
        return Err(StdError::generic_err(format!(
            "invalid denom {denom}: character '{c}' not allowed"
        )));
    }

    if denom.split('/').any(str::is_empty) {
        return Err(StdError::generic_err(format!(
            "invalid denom {denom}: empty path segment"
        )));
    }

    Ok(())
}

fn is_denom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-')
}

/// Turn an arbitrary ERC20 `name()` into something usable as a display denom.
pub fn sanitize_erc20_name(name: &str) -> String {
    let without_leading_digits = name.trim_start_matches(|c: char| c.is_ascii_digit());

    let mut sanitized: String = without_leading_digits
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '/' || *c == '-')
        .collect();
    sanitized.truncate(MAX_DENOM_LEN);

    loop {
        let stripped = ["ibc/", "erc20/", "/"]
            .iter()
            .find_map(|prefix| sanitized.strip_prefix(prefix));
        match stripped {
            Some(rest) => sanitized = rest.to_string(),
            None => break,
        }
    }

    sanitized
}

// ============================================================================
// Denomination Metadata
// ============================================================================

#[cw_serde]
pub struct DenomUnit {
    pub denom: String,
    /// Power of ten relating this unit to the base unit
    pub exponent: u32,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[cw_serde]
pub struct Metadata {
    pub description: String,
    /// Units in increasing exponent order; the first one is the base unit
    pub denom_units: Vec<DenomUnit>,
    pub base: String,
    pub display: String,
    pub name: String,
    pub symbol: String,
}

impl Metadata {
    pub fn validate(&self) -> StdResult<()> {
        if self.name.trim().is_empty() {
            return Err(StdError::generic_err("metadata name cannot be blank"));
        }
        if self.symbol.trim().is_empty() {
            return Err(StdError::generic_err("metadata symbol cannot be blank"));
        }
        validate_denom(&self.base)?;
        validate_denom(&self.display)?;

        let first = self
            .denom_units
            .first()
            .ok_or_else(|| StdError::generic_err("metadata has no denom units"))?;
        if first.denom != self.base || first.exponent != 0 {
            return Err(StdError::generic_err(format!(
                "first denom unit must be the base denom {} with exponent 0",
                self.base
            )));
        }

        let mut seen = BTreeSet::new();
        let mut has_display = false;
        for (i, unit) in self.denom_units.iter().enumerate() {
            validate_denom(&unit.denom)?;
            if i > 0 && unit.exponent <= self.denom_units[i - 1].exponent {
                return Err(StdError::generic_err(
                    "denom units must be sorted by strictly increasing exponent",
                ));
            }
            if !seen.insert(unit.denom.as_str()) {
                return Err(StdError::generic_err(format!(
                    "duplicate denom unit {}",
                    unit.denom
                )));
            }
            has_display |= unit.denom == self.display;
        }

        if !has_display {
            return Err(StdError::generic_err(format!(
                "display denom {} is not among the denom units",
                self.display
            )));
        }
        Ok(())
    }

    /// Exponent of the display unit
    pub fn decimals(&self) -> u8 {
        self.denom_units
            .iter()
            .find(|u| u.denom == self.display)
            .map(|u| u.exponent.min(u8::MAX as u32) as u8)
            .unwrap_or(0)
    }
}

// ============================================================================
// EVM conversions
// ============================================================================

pub fn to_u256(amount: Uint256) -> U256 {
    U256::from_be_bytes(amount.to_be_bytes())
}

pub fn from_u256(amount: U256) -> Uint256 {
    Uint256::from_be_bytes(amount.to_be_bytes::<32>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_denom() {
        for ok in ["uatom", "aISLM", "ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2", "erc20/0xdAC17F958D2ee523a2206206994597C13D831ec7", "gamm/pool/1", "a.b:c_d-e"] {
            assert!(validate_denom(ok).is_ok(), "{ok}");
        }

        let too_long = "a".repeat(129);
        for bad in ["", "a", "ab", "1test", "(test", "^test", "-test", "ibc//x", "ibc/", too_long.as_str(), "has space"] {
            assert!(validate_denom(bad).is_err(), "{bad}");
        }

        assert!(validate_denom(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn test_sanitize_erc20_name() {
        let cases = [
            ("*Special _ []{}||*¼^%  &Token", "SpecialToken"),
            ("*20", "20"),
            ("   Spaces   Token", "SpacesToken"),
            ("12313213  Number     Coin", "NumberCoin"),
            ("  Other    Erc20 Coin ", "OtherErc20Coin"),
            ("USD/Coin", "USD/Coin"),
            ("/SlashCoin", "SlashCoin"),
            ("O/letter", "O/letter"),
            ("ibc/valid", "valid"),
            ("erc20/valid", "valid"),
            ("ibc/erc20/ibc/valid", "valid"),
            ("ibc/erc20/ibc/20invalid", "20invalid"),
            ("123/leadingslash", "leadingslash"),
            ("Dash-Coin", "Dash-Coin"),
            ("Token", "Token"),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize_erc20_name(input), expected, "{input}");
        }
        assert_eq!(sanitize_erc20_name(&"a".repeat(150)), "a".repeat(128));
    }

    fn islm_metadata() -> Metadata {
        Metadata {
            description: "staking denom".to_string(),
            denom_units: vec![
                DenomUnit {
                    denom: "aISLM".to_string(),
                    exponent: 0,
                    aliases: vec!["atto islm".to_string()],
                },
                DenomUnit {
                    denom: "ISLM".to_string(),
                    exponent: 18,
                    aliases: vec![],
                },
            ],
            base: "aISLM".to_string(),
            display: "ISLM".to_string(),
            name: "Islamic Coin".to_string(),
            symbol: "ISLM".to_string(),
        }
    }

    #[test]
    fn test_metadata_validation() {
        let meta = islm_metadata();
        assert!(meta.validate().is_ok());
        assert_eq!(meta.decimals(), 18);

        let mut unsorted = islm_metadata();
        unsorted.denom_units.swap(0, 1);
        assert!(unsorted.validate().is_err());

        let mut missing_display = islm_metadata();
        missing_display.display = "KISLM".to_string();
        assert!(missing_display.validate().is_err());

        let mut blank = islm_metadata();
        blank.symbol = " ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_validate_coins() {
        assert!(validate_coins(&[Coin::new(1u128, "uatom"), Coin::new(2u128, "uosmo")]).is_ok());
        assert!(validate_coins(&[Coin::new(0u128, "uatom")]).is_err());
        assert!(validate_coins(&[Coin::new(1u128, "uatom"), Coin::new(1u128, "uatom")]).is_err());
    }

    #[test]
    fn test_u256_conversion_is_lossless() {
        let max = Uint256::MAX;
        assert_eq!(from_u256(to_u256(max)), max);
        assert_eq!(to_u256(Uint256::from(42u128)), U256::from(42u64));
    }
}
