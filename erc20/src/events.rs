//! Event types and attribute keys emitted by the ERC20 module

pub const EVENT_REGISTER_COIN: &str = "register_coin";
pub const EVENT_REGISTER_ERC20: &str = "register_erc20";
pub const EVENT_REGISTER_ERC20_EXTENSION: &str = "register_erc20_extension";
pub const EVENT_TOGGLE_TOKEN_CONVERSION: &str = "toggle_token_conversion";
pub const EVENT_DELETE_TOKEN_PAIR: &str = "delete_token_pair";
pub const EVENT_MIGRATE_TO_PRECOMPILE: &str = "migrate_to_precompile";
pub const EVENT_CONVERT_COIN: &str = "convert_coin";
pub const EVENT_CONVERT_ERC20: &str = "convert_erc20";
/// A bridging step during packet handling failed and was skipped
pub const EVENT_BRIDGE_FAILED: &str = "erc20_bridge_failed";

pub const ATTRIBUTE_COSMOS_COIN: &str = "cosmos_coin";
pub const ATTRIBUTE_ERC20_TOKEN: &str = "erc20_token";
pub const ATTRIBUTE_ENABLED: &str = "enabled";
pub const ATTRIBUTE_SENDER: &str = "sender";
pub const ATTRIBUTE_RECEIVER: &str = "receiver";
pub const ATTRIBUTE_AMOUNT: &str = "amount";
pub const ATTRIBUTE_STAGE: &str = "stage";
pub const ATTRIBUTE_DENOM: &str = "denom";
pub const ATTRIBUTE_ERROR: &str = "error";
