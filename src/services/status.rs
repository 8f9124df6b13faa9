//! Smart Button status reconciliation.
//!
//! Merges the library's local-availability signal with the fulfillment
//! upstream's pipeline code into one user-facing state.

use crate::models::ReconciledStatus;

/// Acquisition request approved, waiting to start
const CODE_PENDING: i32 = 2;
/// Acquisition in progress
const CODE_PROCESSING: i32 = 3;
/// Some of the title (e.g. a subset of seasons) is available
const CODE_PARTIAL: i32 = 4;
/// Fully available through the fulfillment upstream
const CODE_AVAILABLE: i32 = 5;

/// Merges the two upstream signals, first match wins:
///
/// 1. locally available → `Available`
/// 2. code 2 or 3 → `Pending`
/// 3. code 4 → `Partial`
/// 4. code 5 → `Available`
/// 5. anything else (including no code) → `NotAvailable`
///
/// Total and infallible. `Unknown` is not decided here: the orchestrator
/// short-circuits to it when neither signal could be obtained at all.
pub fn reconcile(local_available: bool, fulfillment_code: Option<i32>) -> ReconciledStatus {
    if local_available {
        return ReconciledStatus::Available;
    }

    match fulfillment_code {
        Some(CODE_PENDING) | Some(CODE_PROCESSING) => ReconciledStatus::Pending,
        Some(CODE_PARTIAL) => ReconciledStatus::Partial,
        Some(CODE_AVAILABLE) => ReconciledStatus::Available,
        _ => ReconciledStatus::NotAvailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_availability_wins_over_everything() {
        assert_eq!(reconcile(true, None), ReconciledStatus::Available);
        assert_eq!(reconcile(true, Some(2)), ReconciledStatus::Available);
        assert_eq!(reconcile(true, Some(4)), ReconciledStatus::Available);
        assert_eq!(reconcile(true, Some(-1)), ReconciledStatus::Available);
    }

    #[test]
    fn test_pending_codes() {
        assert_eq!(reconcile(false, Some(2)), ReconciledStatus::Pending);
        assert_eq!(reconcile(false, Some(3)), ReconciledStatus::Pending);
    }

    #[test]
    fn test_partial_code() {
        assert_eq!(reconcile(false, Some(4)), ReconciledStatus::Partial);
    }

    #[test]
    fn test_available_via_fulfillment() {
        assert_eq!(reconcile(false, Some(5)), ReconciledStatus::Available);
    }

    #[test]
    fn test_everything_else_is_not_available() {
        assert_eq!(reconcile(false, None), ReconciledStatus::NotAvailable);
        assert_eq!(reconcile(false, Some(0)), ReconciledStatus::NotAvailable);
        assert_eq!(reconcile(false, Some(1)), ReconciledStatus::NotAvailable);
        assert_eq!(reconcile(false, Some(6)), ReconciledStatus::NotAvailable);
        assert_eq!(reconcile(false, Some(i32::MAX)), ReconciledStatus::NotAvailable);
    }
}
