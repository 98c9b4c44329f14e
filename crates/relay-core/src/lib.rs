//! Signature-authorized relay wallets.
//!
//! A wallet is a program-derived account controlled by an external secp256k1
//! key instead of a native ledger key. The key holder signs the keccak-256
//! hash of a canonically encoded [`ActionEnvelope`]; anyone may submit the
//! resulting [`AuthorizationProof`], and the relay verifies it against the
//! registered [`WalletRecord`] before acting with the wallet's delegated
//! authority.
//!
//! Every entry point runs against a [`Host`]. Callers are expected to drive
//! it inside one host transaction so that a failure anywhere leaves no trace.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
mod executor;
pub mod policy;
pub mod registry;
pub mod verifier;

pub use codec::{ActionEnvelope, ActionKind, CodecError};
pub use config::RelayConfig;
pub use error::RelayError;
pub use policy::{CostModel, ResourceLimits, ResourcePolicy};
pub use registry::{WalletRecord, WalletSeed, WALLET_PREFIX};
pub use verifier::AuthorizationProof;

use host_ledger::{Address, Host, Instruction, LedgerError};
use tracing::{info, warn};

/// The relay program.
#[derive(Debug, Clone)]
pub struct RelayWallet {
    config: RelayConfig,
}

impl RelayWallet {
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn program_id(&self) -> &Address {
        &self.config.program_id
    }

    pub fn wallet_address(&self, seed: &WalletSeed) -> Result<Address, RelayError> {
        client::wallet_address(&self.config.program_id, seed)
    }

    pub fn load_wallet<H: Host + ?Sized>(
        &self,
        host: &H,
        seed: &WalletSeed,
    ) -> Result<WalletRecord, RelayError> {
        registry::load_wallet(host, &self.config.program_id, seed)
    }

    // ─── Registration ────────────────────────────────────────────────

    /// Register a wallet for `seed`, bound to the key that signed
    /// `keccak256(seed)`. `payer` funds the record account.
    pub fn create_wallet<H: Host + ?Sized>(
        &self,
        host: &mut H,
        payer: &Address,
        proof: &AuthorizationProof,
        seed: &[u8],
        claimed_address: &Address,
    ) -> Result<WalletRecord, RelayError> {
        let seed = WalletSeed::new(seed)?;
        if proof.seed != seed {
            return Err(RelayError::InvalidInput(
                "proof seed differs from the requested seed".into(),
            ));
        }

        let (address, bump) = registry::wallet_address(&self.config.program_id, &seed)?;
        if address != *claimed_address {
            warn!(derived = %address, claimed = %claimed_address, "wallet address mismatch");
            return Err(RelayError::AddressMismatch);
        }

        host.consume_compute(self.config.costs.verification_units())?;
        let verification_key = verifier::authenticate_key(proof, &seed.message_hash())?;

        let record = WalletRecord {
            seed,
            verification_key,
            address,
            bump,
        };
        host.create_account(
            &self.config.program_id,
            payer,
            record.authority(),
            record.encode(),
        )
        .map_err(|e| match e {
            LedgerError::AccountAlreadyInUse(_) => RelayError::AlreadyExists,
            other => RelayError::from(other),
        })?;

        info!(wallet = %address, %payer, "wallet created");
        Ok(record)
    }

    // ─── Relays ──────────────────────────────────────────────────────

    /// Move `amount` lamports from the wallet to `destination`.
    pub fn transfer<H: Host + ?Sized>(
        &self,
        host: &mut H,
        proof: &AuthorizationProof,
        destination: Address,
        amount: u64,
    ) -> Result<(), RelayError> {
        self.relay(
            host,
            proof,
            &ActionEnvelope::Transfer {
                destination,
                amount,
            },
        )
    }

    pub fn relay_instruction<H: Host + ?Sized>(
        &self,
        host: &mut H,
        proof: &AuthorizationProof,
        instruction: Instruction,
    ) -> Result<(), RelayError> {
        self.relay(host, proof, &ActionEnvelope::RelayInstruction(instruction))
    }

    /// Relay `instructions` in order, all or nothing.
    pub fn relay_batch<H: Host + ?Sized>(
        &self,
        host: &mut H,
        proof: &AuthorizationProof,
        instructions: Vec<Instruction>,
    ) -> Result<(), RelayError> {
        self.relay(host, proof, &ActionEnvelope::RelayBatch(instructions))
    }

    /// Authenticate `envelope` under `proof` and perform it.
    pub fn relay<H: Host + ?Sized>(
        &self,
        host: &mut H,
        proof: &AuthorizationProof,
        envelope: &ActionEnvelope,
    ) -> Result<(), RelayError> {
        let wallet = registry::load_wallet(&*host, &self.config.program_id, &proof.seed)?;

        // Malformed or oversized actions are refused before any signature work.
        envelope.validate()?;
        if let ActionEnvelope::RelayBatch(batch) = envelope {
            self.config.policy().check_batch(batch, host.compute_budget())?;
        }

        let hash = envelope.message_hash()?;
        host.consume_compute(self.config.costs.verification_units())?;
        verifier::verify(proof, &hash, &wallet)?;

        executor::execute(host, &self.config.program_id, &wallet, envelope)?;
        info!(wallet = %wallet.address, kind = %envelope.kind(), "relay complete");
        Ok(())
    }
}
