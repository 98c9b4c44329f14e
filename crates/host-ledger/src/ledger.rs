//! The host ledger: the [`Host`] primitives programs run against, and an
//! in-memory ledger executing each transaction as one atomic unit.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::account::{minimum_balance, Account};
use crate::address::Address;
use crate::authority::DelegatedAuthority;
use crate::compute::{ComputeBudget, ComputeMeter, INVOKE_UNITS};
use crate::error::{LedgerError, ProgramError};
use crate::instruction::{AccountMeta, Instruction};
use crate::program::{AccountView, InvokeContext, Program};
use crate::system::{SystemProgram, SYSTEM_PROGRAM_ID};

/// Owner of every executable program account.
/// Base58: `NativeLoader1111111111111111111111111111111`
pub const NATIVE_LOADER_ID: Address = Address::new([
    0x05, 0x87, 0x84, 0xbf, 0x14, 0x8b, 0xa4, 0x28, 0x2f, 0xb0, 0x12, 0x57, 0x48, 0x88, 0xa9, 0xf1,
    0x53, 0xa0, 0x7d, 0xad, 0xf7, 0x65, 0xc0, 0x45, 0x5c, 0x9a, 0x97, 0x03, 0x80, 0x00, 0x00, 0x00,
]);

/// Fee charged to the fee payer per transaction signature.
pub const DEFAULT_LAMPORTS_PER_SIGNATURE: u64 = 5_000;

/// The primitives a program consumes from the ledger it runs on.
pub trait Host {
    fn account(&self, address: &Address) -> Option<&Account>;

    fn lamports(&self, address: &Address) -> u64 {
        self.account(address).map_or(0, |a| a.lamports)
    }

    /// Rent-exempt minimum for an account holding `data_len` bytes.
    fn minimum_balance(&self, data_len: usize) -> u64 {
        minimum_balance(data_len)
    }

    /// Allocate a rent-exempt account at the authority's address, owned by
    /// `owner`, funded by `payer`. The authority must derive under `owner`.
    fn create_account(
        &mut self,
        owner: &Address,
        payer: &Address,
        authority: DelegatedAuthority,
        data: Vec<u8>,
    ) -> Result<(), LedgerError>;

    /// Move lamports out of an account owned by `program_id`.
    fn move_lamports(
        &mut self,
        program_id: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Invoke another program on behalf of `caller`, optionally asserting the
    /// signature of a PDA derived under `caller`.
    fn invoke_signed(
        &mut self,
        caller: &Address,
        instruction: &Instruction,
        authority: Option<DelegatedAuthority>,
    ) -> Result<(), LedgerError>;

    fn compute_budget(&self) -> ComputeBudget;

    fn consume_compute(&mut self, units: u64) -> Result<(), LedgerError>;
}

/// Transaction envelope: who signed, who pays, how much compute it asked for.
#[derive(Debug, Clone)]
pub struct Transaction {
    signers: Vec<Address>,
    compute_unit_limit: Option<u64>,
}

impl Transaction {
    pub fn new(fee_payer: Address) -> Self {
        Self {
            signers: vec![fee_payer],
            compute_unit_limit: None,
        }
    }

    pub fn with_signer(mut self, signer: Address) -> Self {
        if !self.signers.contains(&signer) {
            self.signers.push(signer);
        }
        self
    }

    /// Raise (or lower) the compute allowance; clamped to the host maximum.
    pub fn with_compute_unit_limit(mut self, units: u64) -> Self {
        self.compute_unit_limit = Some(units);
        self
    }

    pub fn fee_payer(&self) -> &Address {
        &self.signers[0]
    }

    pub fn signers(&self) -> &[Address] {
        &self.signers
    }
}

/// A deterministic in-memory ledger.
pub struct MemoryLedger {
    accounts: BTreeMap<Address, Account>,
    programs: BTreeMap<Address, Arc<dyn Program>>,
    lamports_per_signature: u64,
    transaction_count: u64,
    last_compute_consumed: u64,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        let mut ledger = Self {
            accounts: BTreeMap::new(),
            programs: BTreeMap::new(),
            lamports_per_signature: DEFAULT_LAMPORTS_PER_SIGNATURE,
            transaction_count: 0,
            last_compute_consumed: 0,
        };
        ledger.register_program(SYSTEM_PROGRAM_ID, SystemProgram);
        ledger
    }

    pub fn with_lamports_per_signature(mut self, lamports: u64) -> Self {
        self.lamports_per_signature = lamports;
        self
    }

    pub fn lamports_per_signature(&self) -> u64 {
        self.lamports_per_signature
    }

    /// Deploy `program` at `id` as an executable account.
    pub fn register_program(&mut self, id: Address, program: impl Program + 'static) {
        self.accounts.insert(
            id,
            Account {
                lamports: 1,
                owner: NATIVE_LOADER_ID,
                data: Vec::new(),
                executable: true,
            },
        );
        self.programs.insert(id, Arc::new(program));
    }

    /// Mint lamports into a (possibly new) system account.
    pub fn airdrop(&mut self, address: &Address, lamports: u64) {
        let account = self.accounts.entry(*address).or_default();
        account.lamports = account.lamports.saturating_add(lamports);
    }

    /// Seed an account directly, outside any transaction.
    pub fn set_account(&mut self, address: Address, account: Account) {
        self.accounts.insert(address, account);
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn lamports(&self, address: &Address) -> u64 {
        self.accounts.get(address).map_or(0, |a| a.lamports)
    }

    pub fn transaction_count(&self) -> u64 {
        self.transaction_count
    }

    /// Compute units spent by the most recent transaction body.
    pub fn last_compute_consumed(&self) -> u64 {
        self.last_compute_consumed
    }

    /// Run `body` as one atomic transaction.
    ///
    /// Fees are charged up front and kept even if the body fails. Any error
    /// from the body restores every account to its pre-body state.
    pub fn transact<T, E, F>(&mut self, tx: &Transaction, body: F) -> Result<T, E>
    where
        E: From<LedgerError>,
        F: FnOnce(&mut TransactionContext<'_>) -> Result<T, E>,
    {
        let payer = *tx.fee_payer();
        let fee = self
            .lamports_per_signature
            .saturating_mul(tx.signers().len() as u64);
        let available = self.lamports(&payer);
        if available < fee {
            return Err(LedgerError::InsufficientFunds {
                address: payer,
                available,
                requested: fee,
            }
            .into());
        }
        if let Some(account) = self.accounts.get_mut(&payer) {
            account.lamports -= fee;
        }
        self.transaction_count += 1;

        let snapshot = self.accounts.clone();
        let mut ctx = TransactionContext {
            signers: tx.signers().iter().copied().collect(),
            meter: ComputeMeter::new(ComputeBudget::from_request(tx.compute_unit_limit)),
            ledger: self,
        };
        let result = body(&mut ctx);
        let consumed = ctx.meter.consumed();

        self.last_compute_consumed = consumed;
        if result.is_err() {
            warn!(fee_payer = %payer, consumed, "transaction failed, state rolled back");
            self.accounts = snapshot;
        } else {
            debug!(fee_payer = %payer, consumed, "transaction committed");
        }
        result
    }
}

/// The view of the ledger inside one transaction.
pub struct TransactionContext<'a> {
    ledger: &'a mut MemoryLedger,
    signers: BTreeSet<Address>,
    meter: ComputeMeter,
}

impl TransactionContext<'_> {
    fn debit_payer(&mut self, payer: &Address, amount: u64) -> Result<(), LedgerError> {
        let account = self
            .ledger
            .accounts
            .get_mut(payer)
            .ok_or(LedgerError::AccountNotFound(*payer))?;
        if account.owner != SYSTEM_PROGRAM_ID || !account.data.is_empty() {
            return Err(LedgerError::ExternalAccountModified(*payer));
        }
        if account.lamports < amount {
            return Err(LedgerError::InsufficientFunds {
                address: *payer,
                available: account.lamports,
                requested: amount,
            });
        }
        account.lamports -= amount;
        Ok(())
    }
}

impl Host for TransactionContext<'_> {
    fn account(&self, address: &Address) -> Option<&Account> {
        self.ledger.accounts.get(address)
    }

    fn create_account(
        &mut self,
        owner: &Address,
        payer: &Address,
        authority: DelegatedAuthority,
        data: Vec<u8>,
    ) -> Result<(), LedgerError> {
        authority.verify(owner)?;
        let address = *authority.address();

        if !self.signers.contains(payer) {
            return Err(LedgerError::MissingRequiredSignature(*payer));
        }

        // A pre-funded plain account is adopted; anything else is taken.
        let current = match self.ledger.accounts.get(&address) {
            Some(existing)
                if existing.owner != SYSTEM_PROGRAM_ID
                    || !existing.data.is_empty()
                    || existing.executable =>
            {
                return Err(LedgerError::AccountAlreadyInUse(address));
            }
            Some(existing) => existing.lamports,
            None => 0,
        };

        let top_up = minimum_balance(data.len()).saturating_sub(current);
        if top_up > 0 {
            self.debit_payer(payer, top_up)?;
        }

        self.ledger.accounts.insert(
            address,
            Account::new(current + top_up, *owner, data),
        );
        debug!(%address, %owner, top_up, "account created");
        Ok(())
    }

    fn move_lamports(
        &mut self,
        program_id: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let source = self
            .ledger
            .accounts
            .get(from)
            .ok_or(LedgerError::AccountNotFound(*from))?;
        if source.owner != *program_id || source.executable {
            return Err(LedgerError::ExternalAccountModified(*from));
        }
        if source.lamports < amount {
            return Err(LedgerError::InsufficientFunds {
                address: *from,
                available: source.lamports,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }

        if self.ledger.accounts.get(to).is_some_and(|a| a.executable) {
            return Err(LedgerError::ExternalAccountModified(*to));
        }
        let credited = self
            .lamports(to)
            .checked_add(amount)
            .ok_or(LedgerError::UnbalancedInstruction)?;

        if let Some(source) = self.ledger.accounts.get_mut(from) {
            source.lamports -= amount;
        }
        self.ledger.accounts.entry(*to).or_default().lamports = credited;
        Ok(())
    }

    fn invoke_signed(
        &mut self,
        caller: &Address,
        instruction: &Instruction,
        authority: Option<DelegatedAuthority>,
    ) -> Result<(), LedgerError> {
        self.meter.consume(INVOKE_UNITS)?;

        let program_id = instruction.program_id;
        let program = self
            .ledger
            .programs
            .get(&program_id)
            .cloned()
            .ok_or(LedgerError::ProgramNotFound(program_id))?;

        let delegated = match &authority {
            Some(token) => {
                token.verify(caller)?;
                Some(*token.address())
            }
            None => None,
        };

        let mut seen = BTreeSet::new();
        let mut views = Vec::with_capacity(instruction.accounts.len());
        for meta in &instruction.accounts {
            if !seen.insert(meta.pubkey) {
                return Err(LedgerError::DuplicateAccount(meta.pubkey));
            }
            if meta.is_signer
                && !self.signers.contains(&meta.pubkey)
                && delegated != Some(meta.pubkey)
            {
                return Err(LedgerError::MissingRequiredSignature(meta.pubkey));
            }
            views.push(AccountView {
                key: meta.pubkey,
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
                account: self
                    .ledger
                    .accounts
                    .get(&meta.pubkey)
                    .cloned()
                    .unwrap_or_default(),
            });
        }
        let before: Vec<Account> = views.iter().map(|v| v.account.clone()).collect();

        debug!(program = %program_id, %caller, accounts = views.len(), "invoke");
        let mut ctx = InvokeContext::new(program_id, &instruction.data, views, &mut self.meter);
        let outcome = program.process(&mut ctx);
        let (after, exhausted) = ctx.finish();

        if let Err(error) = outcome {
            if let (ProgramError::ComputationalBudgetExceeded, Some(exhausted)) =
                (&error, exhausted)
            {
                return Err(exhausted);
            }
            return Err(LedgerError::Program { program_id, error });
        }

        check_changes(&program_id, &instruction.accounts, &before, &after)?;

        for ((meta, old), view) in instruction.accounts.iter().zip(&before).zip(after) {
            if meta.is_writable && view.account != *old {
                self.ledger.accounts.insert(meta.pubkey, view.account);
            }
        }
        Ok(())
    }

    fn compute_budget(&self) -> ComputeBudget {
        self.meter.budget()
    }

    fn consume_compute(&mut self, units: u64) -> Result<(), LedgerError> {
        self.meter.consume(units)
    }
}

/// Enforce the host's account rules on what a program staged.
fn check_changes(
    program_id: &Address,
    metas: &[AccountMeta],
    before: &[Account],
    after: &[AccountView],
) -> Result<(), LedgerError> {
    let mut total_before: u128 = 0;
    let mut total_after: u128 = 0;

    for ((meta, old), view) in metas.iter().zip(before).zip(after) {
        let new = &view.account;
        total_before += u128::from(old.lamports);
        total_after += u128::from(new.lamports);

        if new == old {
            continue;
        }
        if !meta.is_writable {
            return Err(LedgerError::ReadonlyAccountModified(meta.pubkey));
        }
        if old.executable || new.executable {
            return Err(LedgerError::ExternalAccountModified(meta.pubkey));
        }
        let owned = old.owner == *program_id;
        if !owned && (new.data != old.data || new.owner != old.owner || new.lamports < old.lamports)
        {
            return Err(LedgerError::ExternalAccountModified(meta.pubkey));
        }
    }

    if total_before != total_after {
        return Err(LedgerError::UnbalancedInstruction);
    }
    Ok(())
}
