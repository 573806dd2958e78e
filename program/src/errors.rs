//! Error types for the commerce modules
//!
//! Every entry point returns [`Result`]; an `Err` means the operation was
//! aborted and left no visible effect on registries or balances.

use thiserror::Error;

use crate::state::{ListingKey, ProfileId};

/// Result type for commerce module operations
pub type Result<T> = std::result::Result<T, CommerceError>;

/// Errors surfaced to the host protocol or CLI
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommerceError {
    /// Caller is not the owner of the entity it tried to configure or withdraw from
    #[error("Unauthorized. Only the owning account can perform this action.")]
    Unauthorized,

    /// A rate field was outside `0..=100`
    #[error("Invalid percentage {0}. Rates must be whole percentages between 0 and 100.")]
    InvalidPercentage(u8),

    /// Operation on a listing that was never published
    #[error("Unknown listing {0}. Ensure the publication was initialized with this module.")]
    UnknownListing(ListingKey),

    /// Operation on a storefront whose membership module was never initialized
    #[error("Unknown seller {0}. Ensure the profile was created with the membership module.")]
    UnknownSeller(ProfileId),

    /// The buyer's balance or allowance could not cover the purchase
    #[error("Payment failed. Insufficient balance or allowance to complete the transfer.")]
    PaymentFailed,

    /// The subscriber's balance or allowance could not cover the membership fee
    #[error("Insufficient allowance. Approve the membership module for the subscription fee.")]
    InsufficientAllowance,

    /// The seller was paid but the referral fee could not be pulled into escrow
    #[error("Settlement incomplete. The seller received {0} but the referral fee transfer failed; the purchase was not recorded.")]
    SettlementIncomplete(u64),

    /// Referral withdrawal with nothing accrued
    #[error("Nothing to withdraw. No referral fees have accrued for this referrer.")]
    NothingToWithdraw,

    /// A call for the same key is already executing further up the stack
    #[error("Operation already in progress for this key. Reentrant calls are rejected.")]
    AlreadyInProgress,

    /// Re-subscribe with a lower tier than the one already held
    #[error("Already subscribed at a higher tier. Downgrades are not supported.")]
    AlreadySubscribed,

    /// Publish on a key that already holds a listing
    #[error("Listing {0} already exists. Listings are permanent once published.")]
    ListingAlreadyExists(ListingKey),

    /// Membership initialization on a storefront that already has one
    #[error("Membership for seller {0} is already initialized.")]
    MembershipAlreadyInitialized(ProfileId),

    /// Subscribe payload carried an unknown tier code
    #[error("Invalid subscription tier {0}. Expected 0 (follow), 1 (member) or 2 (evangelist).")]
    InvalidTier(u64),

    /// Boundary payload could not be decoded
    #[error("Invalid module data: {0}")]
    InvalidModuleData(String),

    /// Checked arithmetic overflowed or underflowed
    #[error("Arithmetic operation would result in overflow or underflow.")]
    ArithmeticError,

    /// The host has no module bound to the requested key
    #[error("No {0} module is configured for this key.")]
    ModuleNotConfigured(&'static str),
}
