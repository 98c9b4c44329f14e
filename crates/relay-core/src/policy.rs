//! Resource policy for relayed batches.
//!
//! A batch is priced up front from its shape so that one too large for the
//! transaction's compute allowance is refused before any signature work.

use host_ledger::{ComputeBudget, Instruction};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RelayError;

/// Hard ceilings on a single batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    pub max_batch_instructions: usize,
    /// Combined host wire size of every member instruction.
    pub max_batch_bytes: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_batch_instructions: 32,
            // One host transaction packet.
            max_batch_bytes: 1232,
        }
    }
}

/// Compute-unit prices used to estimate relay work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub relay_base_units: u64,
    pub per_instruction_units: u64,
    pub per_account_units: u64,
    pub per_data_byte_units: u64,
    pub keccak_units: u64,
    pub recover_units: u64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            relay_base_units: 30_000,
            per_instruction_units: 25_000,
            per_account_units: 1_000,
            per_data_byte_units: 1,
            keccak_units: 100,
            recover_units: 25_000,
        }
    }
}

impl CostModel {
    pub fn instruction_units(&self, ix: &Instruction) -> u64 {
        self.per_instruction_units
            .saturating_add(self.per_account_units.saturating_mul(ix.accounts.len() as u64))
            .saturating_add(self.per_data_byte_units.saturating_mul(ix.data.len() as u64))
    }

    pub fn estimate(&self, batch: &[Instruction]) -> u64 {
        batch
            .iter()
            .fold(self.relay_base_units, |total, ix| {
                total.saturating_add(self.instruction_units(ix))
            })
    }

    /// Units the relay itself spends hashing and recovering one proof.
    pub fn verification_units(&self) -> u64 {
        self.keccak_units.saturating_add(self.recover_units)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourcePolicy {
    pub limits: ResourceLimits,
    pub costs: CostModel,
}

impl ResourcePolicy {
    pub fn new(limits: ResourceLimits, costs: CostModel) -> Self {
        Self { limits, costs }
    }

    /// Admit `batch` under `budget`, returning the units it is expected to
    /// need, verification included.
    pub fn check_batch(
        &self,
        batch: &[Instruction],
        budget: ComputeBudget,
    ) -> Result<u64, RelayError> {
        if batch.is_empty() {
            return Err(RelayError::InvalidInput("empty batch".into()));
        }
        if batch.len() > self.limits.max_batch_instructions {
            warn!(count = batch.len(), max = self.limits.max_batch_instructions, "batch rejected");
            return Err(RelayError::ResourceExceeded(format!(
                "{} instructions exceeds the maximum of {}",
                batch.len(),
                self.limits.max_batch_instructions
            )));
        }

        let bytes: usize = batch.iter().map(Instruction::wire_size).sum();
        if bytes > self.limits.max_batch_bytes {
            warn!(bytes, max = self.limits.max_batch_bytes, "batch rejected");
            return Err(RelayError::ResourceExceeded(format!(
                "{bytes} bytes exceeds the maximum of {}",
                self.limits.max_batch_bytes
            )));
        }

        // Verification is charged against the same allowance as the batch.
        let required = self
            .costs
            .estimate(batch)
            .saturating_add(self.costs.verification_units());
        if required > budget.limit {
            warn!(
                required,
                limit = budget.limit,
                requested = budget.requested,
                "batch rejected"
            );
            return Err(RelayError::ResourceExceeded(format!(
                "estimated {required} compute units exceeds the limit of {}",
                budget.limit
            )));
        }
        Ok(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host_ledger::{AccountMeta, Address, MAX_COMPUTE_UNIT_LIMIT};

    fn ix(accounts: usize, data: usize) -> Instruction {
        Instruction::new(
            Address::new([1; 32]),
            (0..accounts)
                .map(|i| AccountMeta::new(Address::new([i as u8 + 2; 32]), false))
                .collect(),
            vec![0; data],
        )
    }

    #[test]
    fn estimate_sums_members() {
        let costs = CostModel::default();
        // 30_000 + 2 * (25_000 + 2 * 1_000 + 8)
        assert_eq!(costs.estimate(&[ix(2, 8), ix(2, 8)]), 84_016);
    }

    #[test]
    fn small_batch_fits_default_budget() {
        let policy = ResourcePolicy::default();
        assert!(policy.check_batch(&vec![ix(2, 8); 3], ComputeBudget::default()).is_ok());
    }

    #[test]
    fn batch_over_default_budget_rejected() {
        let policy = ResourcePolicy::default();
        let batch = vec![ix(2, 8); 7];
        assert!(matches!(
            policy.check_batch(&batch, ComputeBudget::default()),
            Err(RelayError::ResourceExceeded(_))
        ));
        // Raising the allowance admits the same batch.
        assert!(policy
            .check_batch(&batch, ComputeBudget::from_request(Some(MAX_COMPUTE_UNIT_LIMIT)))
            .is_ok());
    }

    #[test]
    fn too_many_members_rejected_even_with_budget() {
        let policy = ResourcePolicy::new(
            ResourceLimits {
                max_batch_instructions: 2,
                ..Default::default()
            },
            CostModel::default(),
        );
        let result = policy.check_batch(
            &vec![ix(0, 0); 3],
            ComputeBudget::from_request(Some(MAX_COMPUTE_UNIT_LIMIT)),
        );
        assert!(matches!(result, Err(RelayError::ResourceExceeded(_))));
    }

    #[test]
    fn oversized_payload_rejected() {
        let policy = ResourcePolicy::default();
        let result = policy.check_batch(
            &[ix(1, 2_000)],
            ComputeBudget::from_request(Some(MAX_COMPUTE_UNIT_LIMIT)),
        );
        assert!(matches!(result, Err(RelayError::ResourceExceeded(_))));
    }

    #[test]
    fn empty_batch_is_invalid_input() {
        let policy = ResourcePolicy::default();
        assert!(matches!(
            policy.check_batch(&[], ComputeBudget::default()),
            Err(RelayError::InvalidInput(_))
        ));
    }

    #[test]
    fn verification_counts_against_the_limit() {
        let policy = ResourcePolicy::default();
        let batch = vec![ix(2, 8); 2];
        let estimate = policy.costs.estimate(&batch);

        // Enough for the members alone, not for verifying the proof too.
        let members_only = ComputeBudget::from_request(Some(estimate));
        assert!(matches!(
            policy.check_batch(&batch, members_only),
            Err(RelayError::ResourceExceeded(_))
        ));

        let with_verification =
            ComputeBudget::from_request(Some(estimate + policy.costs.verification_units()));
        assert_eq!(
            policy.check_batch(&batch, with_verification),
            Ok(estimate + policy.costs.verification_units())
        );
    }
}
