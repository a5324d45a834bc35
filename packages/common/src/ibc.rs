//! Cross-chain fungible token transfer types and denomination rules
//!
//! A coin that leaves its home chain picks up a `port/channel/` prefix on
//! every hop. On the receiving chain the full path is hashed into an
//! `ibc/<HASH>` voucher denom. A coin that travels back to a chain it came
//! from has that chain's prefix stripped instead.

use alloy_primitives::Address;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, StdError, StdResult, Uint256};

use crate::address::{decode_bech32_address, encode_bech32_address, parse_evm_address};
use crate::coin::Coin;
use crate::hash::sha256;

/// Prefix of hashed voucher denominations
pub const IBC_DENOM_PREFIX: &str = "ibc/";

const CHANNEL_PREFIX: &str = "channel-";

// ============================================================================
// Packets
// ============================================================================

/// ICS-20 packet payload
#[cw_serde]
pub struct FungibleTokenPacketData {
    pub denom: String,
    pub amount: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub memo: String,
}

impl FungibleTokenPacketData {
    pub fn validate(&self) -> StdResult<()> {
        let amount = self.parse_amount()?;
        if amount.is_zero() {
            return Err(StdError::generic_err("transfer amount must be positive"));
        }
        if self.sender.trim().is_empty() {
            return Err(StdError::generic_err("sender address cannot be blank"));
        }
        if self.receiver.trim().is_empty() {
            return Err(StdError::generic_err("receiver address cannot be blank"));
        }
        if self.denom.trim().is_empty() || self.denom.split('/').any(str::is_empty) {
            return Err(StdError::generic_err(format!(
                "invalid denomination path {}",
                self.denom
            )));
        }
        Ok(())
    }

    pub fn parse_amount(&self) -> StdResult<Uint256> {
        self.amount
            .parse::<Uint256>()
            .map_err(|e| StdError::generic_err(format!("invalid transfer amount {}: {e}", self.amount)))
    }
}

#[cw_serde]
pub struct Packet {
    pub sequence: u64,
    pub source_port: String,
    pub source_channel: String,
    pub destination_port: String,
    pub destination_channel: String,
    /// JSON encoded [`FungibleTokenPacketData`]
    pub data: Binary,
}

#[cw_serde]
pub enum Acknowledgement {
    Result(Binary),
    Error(String),
}

impl Acknowledgement {
    pub fn success() -> Self {
        Acknowledgement::Result(Binary::from(vec![1u8]))
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Acknowledgement::Error(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Acknowledgement::Result(_))
    }
}

/// Resolve both parties of a transfer to local accounts.
///
/// Either side may be bech32 with a foreign prefix or `0x`-hex. The returned
/// strings are the bech32 renderings under `hrp`.
pub fn transfer_sender_recipient(
    data: &FungibleTokenPacketData,
    hrp: &str,
) -> StdResult<(Address, Address, String, String)> {
    let sender = parse_party(&data.sender)
        .map_err(|e| StdError::generic_err(format!("invalid sender {}: {e}", data.sender)))?;
    let recipient = parse_party(&data.receiver)
        .map_err(|e| StdError::generic_err(format!("invalid recipient {}: {e}", data.receiver)))?;

    Ok((
        Address::from(sender),
        Address::from(recipient),
        encode_bech32_address(&sender, hrp)?,
        encode_bech32_address(&recipient, hrp)?,
    ))
}

fn parse_party(addr: &str) -> StdResult<[u8; 20]> {
    if addr.starts_with("0x") {
        parse_evm_address(addr)
    } else {
        decode_bech32_address(addr).map(|(_, raw)| raw)
    }
}

// ============================================================================
// Denomination traces
// ============================================================================

/// A denomination split into its hop path and base denom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenomTrace {
    pub path: String,
    pub base_denom: String,
}

impl DenomTrace {
    pub fn parse(raw_denom: &str) -> Self {
        let items: Vec<&str> = raw_denom.split('/').collect();
        if items.len() == 1 {
            return Self {
                path: String::new(),
                base_denom: raw_denom.to_string(),
            };
        }

        let mut path = Vec::new();
        let mut base = Vec::new();
        let mut i = 0;
        while i < items.len() {
            if i + 1 < items.len() && items.len() > 2 && is_valid_channel_id(items[i + 1]) {
                path.push(items[i]);
                path.push(items[i + 1]);
                i += 2;
            } else {
                base.extend_from_slice(&items[i..]);
                break;
            }
        }

        Self {
            path: path.join("/"),
            base_denom: base.join("/"),
        }
    }

    pub fn full_path(&self) -> String {
        if self.path.is_empty() {
            self.base_denom.clone()
        } else {
            format!("{}/{}", self.path, self.base_denom)
        }
    }

    /// Denomination of this trace on the local ledger
    pub fn ibc_denom(&self) -> String {
        if self.path.is_empty() {
            self.base_denom.clone()
        } else {
            ibc_denom(&self.full_path())
        }
    }
}

fn is_valid_channel_id(id: &str) -> bool {
    id.strip_prefix(CHANNEL_PREFIX)
        .is_some_and(|n| !n.is_empty() && n.parse::<u64>().is_ok())
}

/// `port/channel/` prefix added by a hop
pub fn denom_prefix(port: &str, channel: &str) -> String {
    format!("{port}/{channel}/")
}

/// `ibc/` + uppercase hex sha256 of the full denomination path
pub fn ibc_denom(full_path: &str) -> String {
    format!(
        "{}{}",
        IBC_DENOM_PREFIX,
        hex::encode_upper(sha256(full_path.as_bytes()))
    )
}

/// Whether the coin in the packet is returning to the chain it came from
pub fn receiver_chain_is_source(source_port: &str, source_channel: &str, denom: &str) -> bool {
    denom.starts_with(&denom_prefix(source_port, source_channel))
}

/// The coin as credited on this chain when receiving `raw_denom`
pub fn received_coin(
    src_port: &str,
    src_channel: &str,
    dst_port: &str,
    dst_channel: &str,
    raw_denom: &str,
    raw_amount: Uint256,
) -> Coin {
    if receiver_chain_is_source(src_port, src_channel, raw_denom) {
        let unprefixed = &raw_denom[denom_prefix(src_port, src_channel).len()..];
        return Coin::new(raw_amount, DenomTrace::parse(unprefixed).ibc_denom());
    }

    let prefixed = format!("{}{}", denom_prefix(dst_port, dst_channel), raw_denom);
    Coin::new(raw_amount, DenomTrace::parse(&prefixed).ibc_denom())
}

/// The coin as debited on this chain when sending `raw_denom`
pub fn sent_coin(raw_denom: &str, raw_amount: Uint256) -> Coin {
    Coin::new(raw_amount, DenomTrace::parse(raw_denom).ibc_denom())
}

/// Whether `raw_denom` is the base denom of the chain that sent the packet
/// (it has not hopped anywhere before).
pub fn is_base_denom_from_source_chain(raw_denom: &str) -> bool {
    let trace = DenomTrace::parse(raw_denom);
    trace.path.is_empty() && !trace.base_denom.contains('/')
}

/// Decimals implied by a base denom's SI prefix
pub fn derive_decimals_from_denom(base_denom: &str) -> StdResult<u8> {
    match base_denom.chars().next() {
        Some('u') => Ok(6),
        Some('a') => Ok(18),
        _ => Err(StdError::generic_err(format!(
            "denom {base_denom} should be prefixed with 'u' (micro) or 'a' (atto)"
        ))),
    }
}

/// EVM address reserved for an `ibc/<HASH>` voucher: the trailing 20 bytes of
/// the hash.
pub fn ibc_denom_address(denom: &str) -> StdResult<Address> {
    let hash = denom
        .strip_prefix(IBC_DENOM_PREFIX)
        .filter(|h| !h.contains('/'))
        .ok_or_else(|| StdError::generic_err(format!("denom {denom} is not an IBC voucher")))?;
    let bytes = hex::decode(hash)
        .map_err(|e| StdError::generic_err(format!("invalid IBC denom hash {hash}: {e}")))?;
    if bytes.len() < 20 {
        return Err(StdError::generic_err(format!(
            "invalid IBC denom hash {hash}: too short"
        )));
    }
    Ok(Address::from_slice(&bytes[bytes.len() - 20..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount() -> Uint256 {
        Uint256::from(10u128)
    }

    #[test]
    fn test_received_coin() {
        let uosmo_voucher = ibc_denom("transfer/channel-0/uosmo");
        let uatom_voucher = ibc_denom("transfer/channel-1/uatom");
        let uatom_osmo_voucher = ibc_denom("transfer/channel-0/transfer/channel-1/uatom");

        // unwrapped coin to a destination which is not its source
        let coin = received_coin("transfer", "channel-0", "transfer", "channel-0", "uosmo", amount());
        assert_eq!(coin.denom, uosmo_voucher);

        // wrapped coin returning to its source
        let coin = received_coin("transfer", "channel-0", "transfer", "channel-0", "transfer/channel-0/aISLM", amount());
        assert_eq!(coin.denom, "aISLM");

        // 2x wrapped coin returning one hop
        let coin = received_coin("transfer", "channel-0", "transfer", "channel-0", "transfer/channel-0/transfer/channel-1/uatom", amount());
        assert_eq!(coin.denom, uatom_voucher);

        // wrapped coin to a destination which is not its source
        let coin = received_coin("transfer", "channel-0", "transfer", "channel-0", "transfer/channel-1/uatom", amount());
        assert_eq!(coin.denom, uatom_osmo_voucher);
        assert_eq!(coin.amount, amount());
    }

    #[test]
    fn test_sent_coin() {
        assert_eq!(sent_coin("aISLM", amount()).denom, "aISLM");
        assert_eq!(
            sent_coin("transfer/channel-0/uosmo", amount()).denom,
            ibc_denom("transfer/channel-0/uosmo")
        );
        assert_eq!(
            sent_coin("transfer/channel-0/transfer/channel-1/uatom", amount()).denom,
            ibc_denom("transfer/channel-0/transfer/channel-1/uatom")
        );
    }

    #[test]
    fn test_denom_trace_keeps_slashes_in_base() {
        let trace = DenomTrace::parse("transfer/channel-3/gamm/pool/1");
        assert_eq!(trace.path, "transfer/channel-3");
        assert_eq!(trace.base_denom, "gamm/pool/1");

        let trace = DenomTrace::parse("transfer/channel-0");
        assert_eq!(trace.path, "");
        assert_eq!(trace.base_denom, "transfer/channel-0");
    }

    #[test]
    fn test_ibc_denom_format() {
        // well-known ATOM voucher over channel-0
        assert_eq!(
            ibc_denom("transfer/channel-0/uatom"),
            "ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2"
        );
    }

    #[test]
    fn test_is_base_denom_from_source_chain() {
        assert!(is_base_denom_from_source_chain("uatom"));
        assert!(!is_base_denom_from_source_chain("transfer/channel-1/uatom"));
        assert!(!is_base_denom_from_source_chain("gamm/pool/1"));
    }

    #[test]
    fn test_derive_decimals_from_denom() {
        assert!(derive_decimals_from_denom("").is_err());
        assert!(derive_decimals_from_denom("nISLM").is_err());
        assert_eq!(derive_decimals_from_denom("uISLM").unwrap(), 6);
        assert_eq!(derive_decimals_from_denom("aISLM").unwrap(), 18);
    }

    #[test]
    fn test_transfer_sender_recipient() {
        let data = FungibleTokenPacketData {
            denom: "uatom".to_string(),
            amount: "123456".to_string(),
            sender: "cosmos1tjdjfavsy956d25hvhs3p0nw9a7pfghqegfjmu".to_string(),
            receiver: "haqq1hdr0lhv75vesvtndlh78ck4cez6esz8u2lk0hq".to_string(),
            memo: String::new(),
        };
        let (_, _, sender, recipient) = transfer_sender_recipient(&data, "haqq").unwrap();
        assert_eq!(sender, "haqq1tjdjfavsy956d25hvhs3p0nw9a7pfghqm0up92");
        assert_eq!(recipient, "haqq1hdr0lhv75vesvtndlh78ck4cez6esz8u2lk0hq");

        let bad = FungibleTokenPacketData {
            sender: "cosmos1".to_string(),
            ..data
        };
        assert!(transfer_sender_recipient(&bad, "haqq").is_err());
    }

    #[test]
    fn test_packet_data_validation() {
        let mut data = FungibleTokenPacketData {
            denom: "uatom".to_string(),
            amount: "10".to_string(),
            sender: "a".to_string(),
            receiver: "b".to_string(),
            memo: String::new(),
        };
        assert!(data.validate().is_ok());

        data.amount = "".to_string();
        assert!(data.validate().is_err());
        data.amount = "1.5".to_string();
        assert!(data.validate().is_err());
        data.amount = "0".to_string();
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_ibc_denom_address() {
        let denom = ibc_denom("transfer/channel-0/uatom");
        let addr = ibc_denom_address(&denom).unwrap();
        let hash = hex::decode(&denom[4..]).unwrap();
        assert_eq!(addr.as_slice(), &hash[12..]);
        assert!(ibc_denom_address("uatom").is_err());
        assert!(ibc_denom_address("ibc/XYZ").is_err());
    }
}
