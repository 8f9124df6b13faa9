use serde::{Deserialize, Serialize};

/// The single availability state shown to the user, merged from the local
/// library signal and the fulfillment pipeline signal.
///
/// `Unknown` means neither signal could be obtained and must be rendered
/// distinctly from `NotAvailable`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReconciledStatus {
    Available,
    Partial,
    Pending,
    NotAvailable,
    Unknown,
}
