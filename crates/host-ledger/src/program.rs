//! The program model: what a program sees while the host invokes it.

use crate::account::Account;
use crate::address::Address;
use crate::compute::ComputeMeter;
use crate::error::{LedgerError, ProgramError};

/// An on-ledger program. Implementations must be deterministic.
pub trait Program: Send + Sync {
    fn process(&self, ctx: &mut InvokeContext<'_>) -> Result<(), ProgramError>;
}

/// One account as passed to a program, in instruction order.
#[derive(Debug, Clone)]
pub struct AccountView {
    pub key: Address,
    pub is_signer: bool,
    pub is_writable: bool,
    pub account: Account,
}

/// Everything a program can touch during one invocation.
///
/// Account changes are staged here; the host checks and commits them only
/// after `process` returns `Ok`.
pub struct InvokeContext<'a> {
    program_id: Address,
    data: &'a [u8],
    accounts: Vec<AccountView>,
    meter: &'a mut ComputeMeter,
    exhausted: Option<LedgerError>,
}

impl<'a> InvokeContext<'a> {
    pub(crate) fn new(
        program_id: Address,
        data: &'a [u8],
        accounts: Vec<AccountView>,
        meter: &'a mut ComputeMeter,
    ) -> Self {
        Self {
            program_id,
            data,
            accounts,
            meter,
            exhausted: None,
        }
    }

    pub fn program_id(&self) -> &Address {
        &self.program_id
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn account(&self, index: usize) -> Result<&AccountView, ProgramError> {
        self.accounts
            .get(index)
            .ok_or(ProgramError::NotEnoughAccountKeys)
    }

    pub fn account_mut(&mut self, index: usize) -> Result<&mut AccountView, ProgramError> {
        self.accounts
            .get_mut(index)
            .ok_or(ProgramError::NotEnoughAccountKeys)
    }

    /// Charge `units` to the enclosing transaction's compute meter.
    pub fn consume(&mut self, units: u64) -> Result<(), ProgramError> {
        self.meter.consume(units).map_err(|e| {
            self.exhausted = Some(e);
            ProgramError::ComputationalBudgetExceeded
        })
    }

    /// Consume the context, handing back staged accounts and any meter
    /// exhaustion recorded by `consume`.
    pub(crate) fn finish(self) -> (Vec<AccountView>, Option<LedgerError>) {
        (self.accounts, self.exhausted)
    }
}
