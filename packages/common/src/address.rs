//! Account Address Encoding
//!
//! Accounts on both ledgers are the same 20 bytes. The native side renders
//! them as bech32 (`haqq1...`), the EVM side as EIP-55 hex (`0x...`). This
//! module converts between the two and derives module account addresses.
//!
//! ## Module accounts
//!
//! A module account address is the first 20 bytes of `sha256(module_name)`,
//! so every replica derives the same escrow address without storing it.

use alloy_primitives::Address;
use cosmwasm_std::{StdError, StdResult};

use crate::hash::sha256;

/// Default human-readable part for native account addresses
pub const DEFAULT_HRP: &str = "haqq";

// ============================================================================
// Parsing
// ============================================================================

/// Parse an account given either as `0x`-hex or as bech32 with any prefix
pub fn parse_account(addr: &str) -> StdResult<Address> {
    if addr.starts_with("0x") || addr.starts_with("0X") {
        return parse_evm_address(addr).map(Address::from);
    }
    let (_, raw) = decode_bech32_address(addr)?;
    Ok(Address::from(raw))
}

/// Parse a 0x-prefixed hex EVM address to 20 bytes
pub fn parse_evm_address(addr: &str) -> StdResult<[u8; 20]> {
    let hex_str = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);

    if hex_str.len() != 40 {
        return Err(StdError::generic_err(format!(
            "Invalid EVM address length: expected 40 hex chars, got {}",
            hex_str.len()
        )));
    }

    let bytes =
        hex::decode(hex_str).map_err(|e| StdError::generic_err(format!("Invalid hex: {}", e)))?;

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// EIP-55 checksummed hex rendering
pub fn to_hex(addr: &Address) -> String {
    addr.to_checksum(None)
}

/// Bech32 rendering with the given prefix
pub fn to_bech32(addr: &Address, hrp: &str) -> StdResult<String> {
    encode_bech32_address(&addr.0 .0, hrp)
}

/// Address of the named module account
pub fn module_address(name: &str) -> Address {
    Address::from_slice(&sha256(name.as_bytes())[..20])
}

// ============================================================================
// Bech32
// ============================================================================

/// Decode a bech32 address to its prefix and raw 20 bytes, verifying the
/// checksum.
pub fn decode_bech32_address(addr: &str) -> StdResult<(String, [u8; 20])> {
    if addr.chars().any(|c| c.is_ascii_uppercase()) && addr.chars().any(|c| c.is_ascii_lowercase())
    {
        return Err(StdError::generic_err("Invalid bech32: mixed case"));
    }
    let addr = addr.to_ascii_lowercase();

    let (hrp, data_part) = addr
        .rsplit_once('1')
        .ok_or_else(|| StdError::generic_err("Invalid bech32 format"))?;
    if hrp.is_empty() {
        return Err(StdError::generic_err("Invalid bech32: empty prefix"));
    }

    // The data part includes the address data + 6 char checksum
    if data_part.len() < 7 {
        return Err(StdError::generic_err("Bech32 data too short"));
    }

    let decoded = decode_bech32_data(data_part)?;
    let mut values = expand_hrp(hrp);
    values.extend_from_slice(&decoded);
    if bech32_polymod(&values) != 1 {
        return Err(StdError::generic_err("Invalid bech32 checksum"));
    }

    // Convert from 5-bit groups to 8-bit bytes
    let bytes = convert_bits(&decoded[..decoded.len() - 6], 5, 8, false)?;

    if bytes.len() != 20 {
        return Err(StdError::generic_err(format!(
            "Invalid address length: expected 20 bytes, got {}",
            bytes.len()
        )));
    }

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok((hrp.to_string(), result))
}

/// Encode raw 20 bytes to a bech32 address with given prefix
pub fn encode_bech32_address(bytes: &[u8; 20], hrp: &str) -> StdResult<String> {
    let data5 = convert_bits(bytes, 8, 5, true)?;
    let data_str = encode_bech32_data(&data5);

    let checksum = compute_bech32_checksum(hrp, &data5);
    let checksum_str = encode_bech32_data(&checksum);

    Ok(format!("{}1{}{}", hrp, data_str, checksum_str))
}

/// Convert bits between different group sizes
fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> StdResult<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut result = Vec::new();
    let max_v = (1u32 << to_bits) - 1;

    for &value in data {
        let v = value as u32;
        acc = (acc << from_bits) | v;
        bits += from_bits;

        while bits >= to_bits {
            bits -= to_bits;
            result.push(((acc >> bits) & max_v) as u8);
        }
    }

    if pad && bits > 0 {
        result.push(((acc << (to_bits - bits)) & max_v) as u8);
    } else if !pad && (bits >= from_bits || ((acc << (to_bits - bits)) & max_v) != 0) {
        return Err(StdError::generic_err("Invalid padding"));
    }

    Ok(result)
}

/// Bech32 character set
const BECH32_CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

fn decode_bech32_data(data: &str) -> StdResult<Vec<u8>> {
    data.chars()
        .map(|c| {
            BECH32_CHARSET
                .iter()
                .position(|&x| x as char == c)
                .map(|idx| idx as u8)
                .ok_or_else(|| StdError::generic_err(format!("Invalid bech32 character: {}", c)))
        })
        .collect()
}

fn encode_bech32_data(data: &[u8]) -> String {
    data.iter()
        .map(|&b| BECH32_CHARSET[b as usize] as char)
        .collect()
}

fn compute_bech32_checksum(hrp: &str, data: &[u8]) -> Vec<u8> {
    let mut values = expand_hrp(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    let polymod = bech32_polymod(&values) ^ 1;

    (0..6)
        .map(|i| ((polymod >> (5 * (5 - i))) & 31) as u8)
        .collect()
}

fn expand_hrp(hrp: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(hrp.len() * 2 + 1);
    result.extend(hrp.bytes().map(|b| b >> 5));
    result.push(0);
    result.extend(hrp.bytes().map(|b| b & 31));
    result
}

fn bech32_polymod(values: &[u8]) -> u32 {
    const GENERATOR: [u32; 5] = [
        0x3b6a_57b2,
        0x2650_8e6d,
        0x1ea1_19fa,
        0x3d42_33dd,
        0x2a14_62b3,
    ];

    let mut chk: u32 = 1;
    for &v in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ (v as u32);
        for (i, gen) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= gen;
            }
        }
    }
    chk
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAQQ_ADDR: &str = "haqq1hdr0lhv75vesvtndlh78ck4cez6esz8u2lk0hq";
    const COSMOS_ADDR: &str = "cosmos1tjdjfavsy956d25hvhs3p0nw9a7pfghqegfjmu";

    #[test]
    fn test_bech32_reencode_with_local_prefix() {
        let (hrp, raw) = decode_bech32_address(COSMOS_ADDR).unwrap();
        assert_eq!(hrp, "cosmos");
        assert_eq!(
            encode_bech32_address(&raw, "haqq").unwrap(),
            "haqq1tjdjfavsy956d25hvhs3p0nw9a7pfghqm0up92"
        );
    }

    #[test]
    fn test_bech32_roundtrip() {
        let (hrp, raw) = decode_bech32_address(HAQQ_ADDR).unwrap();
        assert_eq!(encode_bech32_address(&raw, &hrp).unwrap(), HAQQ_ADDR);
    }

    #[test]
    fn test_bech32_rejects_bad_checksum_and_truncation() {
        assert!(decode_bech32_address("haqq1hdr0lhv75vesvtndlh78ck4cez6esz8u2lk0hz").is_err());
        assert!(decode_bech32_address("haqq1").is_err());
        assert!(decode_bech32_address("cosmos1").is_err());
        assert!(decode_bech32_address("noseparator").is_err());
    }

    #[test]
    fn test_parse_account_hex_and_bech32_agree() {
        let from_bech32 = parse_account(HAQQ_ADDR).unwrap();
        let hex = to_hex(&from_bech32);
        assert_eq!(parse_account(&hex).unwrap(), from_bech32);
        assert_eq!(to_bech32(&from_bech32, "haqq").unwrap(), HAQQ_ADDR);
    }

    #[test]
    fn test_parse_evm_address_rejects_bad_input() {
        assert!(parse_evm_address("0x5dCA2483280D9727c80b5518faC4556617fb19ZZ").is_err());
        assert!(parse_evm_address("0x5dCA2483280D9727c80b5518faC4556617fb19").is_err());
        assert!(parse_evm_address("0x5dCA2483280D9727c80b5518faC4556617fb194FFF").is_err());
        assert!(parse_evm_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").is_ok());
    }

    #[test]
    fn test_module_address_is_stable() {
        let a = module_address("erc20");
        assert_eq!(a, module_address("erc20"));
        assert_ne!(a, module_address("distribution"));
        assert_eq!(a.as_slice(), &sha256(b"erc20")[..20]);
    }
}
