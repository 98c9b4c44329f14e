use host_ledger::Address;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::policy::{CostModel, ResourceLimits, ResourcePolicy};

/// Relay program settings. Every tunable falls back to its default when
/// absent from a JSON document; `program_id` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub program_id: Address,
    #[serde(default)]
    pub limits: ResourceLimits,
    #[serde(default)]
    pub costs: CostModel,
}

impl RelayConfig {
    pub fn new(program_id: Address) -> Self {
        Self {
            program_id,
            limits: ResourceLimits::default(),
            costs: CostModel::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RelayError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RelayError::InvalidInput(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.limits.max_batch_instructions == 0 {
            return Err(RelayError::InvalidInput(
                "max_batch_instructions must be positive".into(),
            ));
        }
        if self.limits.max_batch_bytes == 0 {
            return Err(RelayError::InvalidInput("max_batch_bytes must be positive".into()));
        }
        Ok(())
    }

    pub fn policy(&self) -> ResourcePolicy {
        ResourcePolicy::new(self.limits, self.costs)
    }
}
