/// Minutes ledger port.
///
/// Billing internals are out of scope; the core only needs "decrement this
/// user's remaining-minutes balance" on user-triggered session end.
use async_trait::async_trait;

use crate::domain::errors::DomainResult;

#[async_trait]
pub trait MinutesLedger: Send + Sync {
    /// Debits elapsed whole minutes from the user's balance.
    async fn debit(&self, user_id: &str, minutes: u32) -> DomainResult<()>;
}

/// Ledger that records nothing. Used where billing is disabled (tests,
/// deadline-triggered completion paths in hosts without billing).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMinutesLedger;

#[async_trait]
impl MinutesLedger for NullMinutesLedger {
    async fn debit(&self, user_id: &str, minutes: u32) -> DomainResult<()> {
        tracing::debug!(user_id, minutes, "null ledger: debit skipped");
        Ok(())
    }
}
