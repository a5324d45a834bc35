use common::Context;

use crate::error::Erc20Error;
use crate::keeper::Keeper;
use crate::state::Owner;

impl Keeper {
    /// Check that both ledgers account for the same value on every enabled
    /// bytecode pair:
    /// - module owned: escrowed native coins == contract total supply
    /// - externally owned: native supply == escrowed contract tokens
    ///
    /// Returns one message per broken pair. Nothing is written.
    pub fn escrow_invariant(&self, ctx: &mut Context) -> Result<Vec<String>, Erc20Error> {
        ctx.simulate(|ctx| {
            let params = self.params(ctx.store)?;
            let escrow = self.module_address();
            let mut broken = vec![];

            for pair in self.token_pairs(ctx.store)? {
                let contract = pair.address()?;
                if !pair.enabled || params.is_precompile(&contract) {
                    continue;
                }
                let (native, tokens) = match pair.contract_owner {
                    Owner::Module => (
                        self.bank.balance(ctx.store, &escrow, &pair.denom)?,
                        self.total_supply(ctx, contract)?,
                    ),
                    Owner::External => (
                        self.bank.supply(ctx.store, &pair.denom)?,
                        self.balance_of(ctx, contract, escrow)?,
                    ),
                    Owner::Unspecified => continue,
                };
                if native != tokens {
                    broken.push(format!(
                        "{} ({}): native side {native} != contract side {tokens}",
                        pair.denom, pair.erc20_address
                    ));
                }
            }

            if !broken.is_empty() {
                tracing::warn!(target: "erc20::convert", count = broken.len(), "escrow invariant broken");
            }
            Ok(broken)
        })
    }
}
