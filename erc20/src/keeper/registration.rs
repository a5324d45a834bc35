//! Token pair creation and lifecycle
//!
//! - `register_coin` - Deploy a module-owned contract for a native coin
//! - `register_erc20` - Onboard an externally deployed contract
//! - `register_erc20_extension` - Onboard a cross-chain voucher as a precompile
//! - `toggle_conversion`, `delete_token_pair`, `migrate_to_precompile`

use alloy_primitives::Address;
use cosmwasm_std::{Event, StdError};

use common::address::to_hex;
use common::coin::{sanitize_erc20_name, validate_denom};
use common::hash::keccak256;
use common::ibc::{derive_decimals_from_denom, ibc_denom_address};
use common::{Context, DenomUnit, Metadata};

use crate::error::Erc20Error;
use crate::events::{
    ATTRIBUTE_COSMOS_COIN, ATTRIBUTE_ENABLED, ATTRIBUTE_ERC20_TOKEN, EVENT_DELETE_TOKEN_PAIR,
    EVENT_MIGRATE_TO_PRECOMPILE, EVENT_REGISTER_COIN, EVENT_REGISTER_ERC20,
    EVENT_REGISTER_ERC20_EXTENSION, EVENT_TOGGLE_TOKEN_CONVERSION,
};
use crate::keeper::evm::Erc20Data;
use crate::keeper::Keeper;
use crate::state::{Owner, TokenPair};

fn invalid_metadata(err: StdError) -> Erc20Error {
    Erc20Error::InvalidMetadata {
        reason: err.to_string(),
    }
}

impl Keeper {
    // ========================================================================
    // Registration
    // ========================================================================

    /// Pair a native coin with a freshly deployed module-owned contract
    pub fn register_coin(
        &self,
        ctx: &mut Context,
        metadata: &Metadata,
    ) -> Result<TokenPair, Erc20Error> {
        ctx.cached(|ctx| {
            self.ensure_enabled(ctx)?;
            metadata.validate().map_err(invalid_metadata)?;

            let denom = metadata.base.clone();
            if self.is_denom_registered(ctx.store, &denom) {
                return Err(Erc20Error::AlreadyRegistered { token: denom });
            }
            if !self.bank.has_supply(ctx.store, &denom)? {
                return Err(Erc20Error::InvalidMetadata {
                    reason: format!("base denomination {denom} cannot have a supply of 0"),
                });
            }
            self.verify_metadata(ctx, metadata)?;

            let contract = self.evm.deploy_erc20(
                ctx,
                self.module_address(),
                &metadata.name,
                &metadata.symbol,
                metadata.decimals(),
            )?;
            if self.is_erc20_registered(ctx.store, &contract) {
                return Err(Erc20Error::AlreadyRegistered {
                    token: to_hex(&contract),
                });
            }

            let pair = TokenPair::new(contract, &denom, Owner::Module);
            self.set_token_pair(ctx, &pair)?;

            tracing::info!(
                target: "erc20::registry",
                denom = %pair.denom,
                erc20 = %pair.erc20_address,
                "registered native coin"
            );
            ctx.emit(
                Event::new(EVENT_REGISTER_COIN)
                    .add_attribute(ATTRIBUTE_COSMOS_COIN, &pair.denom)
                    .add_attribute(ATTRIBUTE_ERC20_TOKEN, &pair.erc20_address),
            );
            Ok(pair)
        })
    }

    /// Pair an existing contract with a new native denom `erc20/<address>`
    pub fn register_erc20(
        &self,
        ctx: &mut Context,
        contract: Address,
    ) -> Result<TokenPair, Erc20Error> {
        ctx.cached(|ctx| {
            self.ensure_enabled(ctx)?;
            if self.is_erc20_registered(ctx.store, &contract) {
                return Err(Erc20Error::AlreadyRegistered {
                    token: to_hex(&contract),
                });
            }

            let data = self.query_erc20(ctx, contract)?;
            let metadata = self.create_coin_metadata(ctx, contract, &data)?;

            let pair = TokenPair::new(contract, &metadata.base, Owner::External);
            self.set_token_pair(ctx, &pair)?;

            tracing::info!(
                target: "erc20::registry",
                denom = %pair.denom,
                erc20 = %pair.erc20_address,
                "registered external erc20"
            );
            ctx.emit(
                Event::new(EVENT_REGISTER_ERC20)
                    .add_attribute(ATTRIBUTE_COSMOS_COIN, &pair.denom)
                    .add_attribute(ATTRIBUTE_ERC20_TOKEN, &pair.erc20_address),
            );
            Ok(pair)
        })
    }

    /// Onboard an inbound voucher `denom` whose base denom on the sending
    /// chain is `base_denom`. The pair's contract is a precompile at the
    /// address derived from the voucher hash.
    pub fn register_erc20_extension(
        &self,
        ctx: &mut Context,
        denom: &str,
        base_denom: &str,
    ) -> Result<TokenPair, Erc20Error> {
        ctx.cached(|ctx| {
            self.ensure_enabled(ctx)?;
            if self.is_denom_registered(ctx.store, denom) {
                return Err(Erc20Error::AlreadyRegistered {
                    token: denom.to_string(),
                });
            }
            let contract = extension_address(denom);
            if self.is_erc20_registered(ctx.store, &contract) {
                return Err(Erc20Error::AlreadyRegistered {
                    token: to_hex(&contract),
                });
            }

            if self.bank.denom_metadata(ctx.store, denom)?.is_none() {
                let metadata = extension_metadata(denom, base_denom);
                metadata.validate().map_err(invalid_metadata)?;
                self.bank.set_denom_metadata(ctx, &metadata)?;
            }

            let pair = TokenPair::new(contract, denom, Owner::Module);
            self.set_token_pair(ctx, &pair)?;
            self.enable_dynamic_precompile(ctx, &contract)?;

            tracing::info!(
                target: "erc20::registry",
                denom,
                base_denom,
                erc20 = %pair.erc20_address,
                "registered erc20 extension"
            );
            ctx.emit(
                Event::new(EVENT_REGISTER_ERC20_EXTENSION)
                    .add_attribute(ATTRIBUTE_COSMOS_COIN, &pair.denom)
                    .add_attribute(ATTRIBUTE_ERC20_TOKEN, &pair.erc20_address),
            );
            Ok(pair)
        })
    }

    fn ensure_enabled(&self, ctx: &Context) -> Result<(), Erc20Error> {
        if !self.is_erc20_enabled(ctx.store)? {
            return Err(Erc20Error::Erc20Disabled);
        }
        Ok(())
    }

    /// Store `metadata` unless the bank already holds an identical copy
    fn verify_metadata(&self, ctx: &mut Context, metadata: &Metadata) -> Result<(), Erc20Error> {
        match self.bank.denom_metadata(ctx.store, &metadata.base)? {
            None => {
                self.bank.set_denom_metadata(ctx, metadata)?;
                Ok(())
            }
            Some(existing) if existing == *metadata => Ok(()),
            Some(_) => Err(Erc20Error::InvalidMetadata {
                reason: format!(
                    "metadata for {} does not match the registered metadata",
                    metadata.base
                ),
            }),
        }
    }

    fn create_coin_metadata(
        &self,
        ctx: &mut Context,
        contract: Address,
        data: &Erc20Data,
    ) -> Result<Metadata, Erc20Error> {
        let address = to_hex(&contract);
        let base = format!("erc20/{address}");

        let mut metadata = Metadata {
            description: format!("Cosmos coin token representation of {address}"),
            denom_units: vec![DenomUnit {
                denom: base.clone(),
                exponent: 0,
                aliases: vec![],
            }],
            base: base.clone(),
            display: base.clone(),
            name: base.clone(),
            symbol: data.symbol.clone(),
        };
        if data.decimals > 0 {
            let name = sanitize_erc20_name(&data.name);
            metadata.denom_units.push(DenomUnit {
                denom: name.clone(),
                exponent: u32::from(data.decimals),
                aliases: vec![],
            });
            metadata.display = name;
        }
        metadata.validate().map_err(invalid_metadata)?;

        if self.bank.denom_metadata(ctx.store, &base)?.is_some() {
            return Err(Erc20Error::AlreadyRegistered { token: base });
        }
        if self.is_denom_registered(ctx.store, &base) {
            return Err(Erc20Error::AlreadyRegistered { token: base });
        }
        self.bank.set_denom_metadata(ctx, &metadata)?;
        Ok(metadata)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Flip the conversion switch of a pair
    pub fn toggle_conversion(&self, ctx: &mut Context, token: &str) -> Result<TokenPair, Erc20Error> {
        let mut pair = self.lookup_or_not_found(ctx, token)?;
        pair.enabled = !pair.enabled;
        self.set_token_pair(ctx, &pair)?;

        tracing::info!(
            target: "erc20::registry",
            denom = %pair.denom,
            enabled = pair.enabled,
            "toggled token conversion"
        );
        ctx.emit(
            Event::new(EVENT_TOGGLE_TOKEN_CONVERSION)
                .add_attribute(ATTRIBUTE_COSMOS_COIN, &pair.denom)
                .add_attribute(ATTRIBUTE_ERC20_TOKEN, &pair.erc20_address)
                .add_attribute(ATTRIBUTE_ENABLED, pair.enabled.to_string()),
        );
        Ok(pair)
    }

    /// Forget a pair. Balances on either ledger are left as they are.
    pub fn delete_token_pair(&self, ctx: &mut Context, token: &str) -> Result<TokenPair, Erc20Error> {
        ctx.cached(|ctx| {
            let pair = self.lookup_or_not_found(ctx, token)?;
            self.remove_token_pair(ctx, &pair)?;
            self.disable_precompile(ctx, &pair.address()?)?;

            tracing::info!(target: "erc20::registry", denom = %pair.denom, "deleted token pair");
            ctx.emit(
                Event::new(EVENT_DELETE_TOKEN_PAIR)
                    .add_attribute(ATTRIBUTE_COSMOS_COIN, &pair.denom)
                    .add_attribute(ATTRIBUTE_ERC20_TOKEN, &pair.erc20_address),
            );
            Ok(pair)
        })
    }

    /// Replace the bytecode contract of a native coin pair with a precompile
    /// over the native ledger. Only possible once nothing is left on the
    /// contract side.
    pub fn migrate_to_precompile(
        &self,
        ctx: &mut Context,
        token: &str,
    ) -> Result<TokenPair, Erc20Error> {
        ctx.cached(|ctx| {
            let pair = self.lookup_or_not_found(ctx, token)?;
            if !pair.is_native_coin() {
                return Err(Erc20Error::Std(StdError::generic_err(format!(
                    "only module-owned pairs can be migrated, {} is not",
                    pair.denom
                ))));
            }
            let contract = pair.address()?;
            if self.params(ctx.store)?.is_precompile(&contract) {
                return Err(Erc20Error::AlreadyRegistered {
                    token: pair.erc20_address,
                });
            }

            let supply = self.total_supply(ctx, contract)?;
            if !supply.is_zero() {
                return Err(Erc20Error::ContractHasSupply {
                    contract: pair.erc20_address,
                    supply,
                });
            }

            self.evm.self_destruct(ctx, contract)?;
            self.enable_native_precompile(ctx, &contract)?;

            tracing::info!(
                target: "erc20::registry",
                denom = %pair.denom,
                erc20 = %pair.erc20_address,
                "migrated token pair to precompile"
            );
            ctx.emit(
                Event::new(EVENT_MIGRATE_TO_PRECOMPILE)
                    .add_attribute(ATTRIBUTE_COSMOS_COIN, &pair.denom)
                    .add_attribute(ATTRIBUTE_ERC20_TOKEN, &pair.erc20_address),
            );
            Ok(pair)
        })
    }

    fn lookup_or_not_found(&self, ctx: &Context, token: &str) -> Result<TokenPair, Erc20Error> {
        self.lookup_token_pair(ctx.store, token)?
            .ok_or_else(|| Erc20Error::TokenPairNotFound {
                token: token.to_string(),
            })
    }
}

/// Precompile address of an onboarded denom: the trailing 20 bytes of the
/// voucher hash, or of `keccak256(denom)` for anything that is not a voucher
fn extension_address(denom: &str) -> Address {
    ibc_denom_address(denom)
        .unwrap_or_else(|_| Address::from_slice(&keccak256(denom.as_bytes())[12..]))
}

/// Metadata for a voucher whose bank metadata was never set. The display
/// unit drops the SI prefix of the base denom (`uatom` -> `atom`) when the
/// prefix implies a decimal count.
fn extension_metadata(denom: &str, base_denom: &str) -> Metadata {
    let mut metadata = Metadata {
        description: format!("IBC voucher of {base_denom}"),
        denom_units: vec![DenomUnit {
            denom: denom.to_string(),
            exponent: 0,
            aliases: vec![base_denom.to_string()],
        }],
        base: denom.to_string(),
        display: denom.to_string(),
        name: base_denom.to_string(),
        symbol: base_denom.to_uppercase(),
    };

    let Ok(decimals) = derive_decimals_from_denom(base_denom) else {
        tracing::debug!(
            target: "erc20::registry",
            base_denom,
            "no decimals implied by denom, using base unit only"
        );
        return metadata;
    };
    let display = &base_denom[1..];
    if validate_denom(display).is_ok() {
        metadata.denom_units.push(DenomUnit {
            denom: display.to_string(),
            exponent: u32::from(decimals),
            aliases: vec![],
        });
        metadata.display = display.to_string();
        metadata.symbol = display.to_uppercase();
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOUCHER: &str = "ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2";

    #[test]
    fn test_extension_address() {
        assert_eq!(
            to_hex(&extension_address(VOUCHER)),
            to_hex(&Address::from_slice(
                &hex::decode(&VOUCHER[4..]).unwrap()[12..]
            ))
        );
        assert_eq!(
            extension_address("custom/token"),
            Address::from_slice(&keccak256(b"custom/token")[12..])
        );
    }

    #[test]
    fn test_extension_metadata_with_si_prefix() {
        let metadata = extension_metadata(VOUCHER, "uatom");
        assert!(metadata.validate().is_ok());
        assert_eq!(metadata.base, VOUCHER);
        assert_eq!(metadata.display, "atom");
        assert_eq!(metadata.symbol, "ATOM");
        assert_eq!(metadata.decimals(), 6);
        assert_eq!(metadata.denom_units[0].aliases, vec!["uatom".to_string()]);
    }

    #[test]
    fn test_extension_metadata_without_si_prefix() {
        let metadata = extension_metadata(VOUCHER, "stake");
        assert!(metadata.validate().is_ok());
        assert_eq!(metadata.display, VOUCHER);
        assert_eq!(metadata.decimals(), 0);
        assert_eq!(metadata.denom_units.len(), 1);

        // prefix implies decimals but the rest is too short to be a denom
        let metadata = extension_metadata(VOUCHER, "uab");
        assert!(metadata.validate().is_ok());
        assert_eq!(metadata.denom_units.len(), 1);
    }
}
