//! Write authorization
//!
//! The gate admits exactly one identity, fixed when the ledger is built.
//! Only the append path consults it; reads never do.

use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::types::Identity;

/// Single-owner access check for the write path
#[derive(Debug, Clone)]
pub struct AccessGate {
    owner: Identity,
}

impl AccessGate {
    pub fn new(owner: Identity) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn is_owner(&self, caller: &Identity) -> bool {
        &self.owner == caller
    }

    /// Succeeds for the owner, `Unauthorized` for everyone else
    pub fn authorize(&self, caller: &Identity) -> LedgerResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            tracing::warn!(caller = %caller, "Rejected append from non-owner");
            Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_passes() {
        let gate = AccessGate::new(Identity::new("gateway"));
        assert!(gate.authorize(&Identity::new("gateway")).is_ok());
    }

    #[test]
    fn test_other_identities_fail() {
        let gate = AccessGate::new(Identity::new("gateway"));

        for caller in ["Gateway", "gateway ", "", "intruder"] {
            let result = gate.authorize(&Identity::new(caller));
            assert!(matches!(result, Err(LedgerError::Unauthorized { .. })));
        }
    }
}
