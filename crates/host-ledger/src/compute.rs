use crate::error::LedgerError;

/// Compute units a transaction gets unless it asks for more.
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u64 = 200_000;

/// Hard ceiling on what a transaction may request.
pub const MAX_COMPUTE_UNIT_LIMIT: u64 = 1_400_000;

/// Charged by the host for every cross-program invocation.
pub const INVOKE_UNITS: u64 = 1_000;

/// What the current transaction is allowed to spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeBudget {
    pub limit: u64,
    /// Whether the transaction explicitly requested its limit.
    pub requested: bool,
}

impl ComputeBudget {
    /// Budget for an optional explicit request, clamped to the ceiling.
    pub fn from_request(request: Option<u64>) -> Self {
        match request {
            Some(units) => Self {
                limit: units.min(MAX_COMPUTE_UNIT_LIMIT),
                requested: true,
            },
            None => Self::default(),
        }
    }
}

impl Default for ComputeBudget {
    fn default() -> Self {
        Self {
            limit: DEFAULT_COMPUTE_UNIT_LIMIT,
            requested: false,
        }
    }
}

/// Running consumption against a budget.
#[derive(Debug, Clone)]
pub struct ComputeMeter {
    budget: ComputeBudget,
    consumed: u64,
}

impl ComputeMeter {
    pub fn new(budget: ComputeBudget) -> Self {
        Self {
            budget,
            consumed: 0,
        }
    }

    pub fn budget(&self) -> ComputeBudget {
        self.budget
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn remaining(&self) -> u64 {
        self.budget.limit.saturating_sub(self.consumed)
    }

    /// Spend `units`; running past the limit is an error and spends nothing.
    pub fn consume(&mut self, units: u64) -> Result<(), LedgerError> {
        let required = self.consumed.saturating_add(units);
        if required > self.budget.limit {
            return Err(LedgerError::ComputeBudgetExceeded {
                limit: self.budget.limit,
                required,
            });
        }
        self.consumed = required;
        Ok(())
    }
}
