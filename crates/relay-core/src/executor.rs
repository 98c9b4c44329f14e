//! Performs verified actions with the wallet's delegated authority.

use host_ledger::{Address, Host, Instruction};
use tracing::debug;

use crate::codec::ActionEnvelope;
use crate::error::RelayError;
use crate::registry::{WalletRecord, WALLET_RECORD_LEN};

/// Execute an already authenticated `envelope` for `wallet`.
pub(crate) fn execute<H: Host + ?Sized>(
    host: &mut H,
    program_id: &Address,
    wallet: &WalletRecord,
    envelope: &ActionEnvelope,
) -> Result<(), RelayError> {
    match envelope {
        ActionEnvelope::Transfer {
            destination,
            amount,
        } => transfer(host, program_id, wallet, destination, *amount),
        ActionEnvelope::RelayInstruction(ix) => relay(host, program_id, wallet, ix),
        ActionEnvelope::RelayBatch(batch) => {
            for (index, ix) in batch.iter().enumerate() {
                debug!(wallet = %wallet.address, index, "relaying batch member");
                relay(host, program_id, wallet, ix)?;
            }
            Ok(())
        }
    }
}

fn transfer<H: Host + ?Sized>(
    host: &mut H,
    program_id: &Address,
    wallet: &WalletRecord,
    destination: &Address,
    amount: u64,
) -> Result<(), RelayError> {
    if amount == 0 {
        return Err(RelayError::InvalidInput("transfer amount must be positive".into()));
    }
    // The record account has to stay rent-exempt.
    let available = host
        .lamports(&wallet.address)
        .saturating_sub(host.minimum_balance(WALLET_RECORD_LEN));
    if available < amount {
        return Err(RelayError::InsufficientBalance {
            available,
            requested: amount,
        });
    }
    debug!(wallet = %wallet.address, %destination, amount, "transfer");
    host.move_lamports(program_id, &wallet.address, destination, amount)?;
    Ok(())
}

fn relay<H: Host + ?Sized>(
    host: &mut H,
    program_id: &Address,
    wallet: &WalletRecord,
    ix: &Instruction,
) -> Result<(), RelayError> {
    let authority = ix
        .requires_signer(&wallet.address)
        .then(|| wallet.authority());
    debug!(
        wallet = %wallet.address,
        target = %ix.program_id,
        delegated = authority.is_some(),
        "relaying instruction"
    );
    host.invoke_signed(program_id, ix, authority)
        .map_err(RelayError::from_target)
}
