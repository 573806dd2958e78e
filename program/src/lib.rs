//! Storefront Commerce Modules
//!
//! Commerce extensions for a social publishing protocol. Profiles act as
//! storefronts, publications act as product listings, and the protocol's
//! follow, mirror and collect actions drive paid memberships, referral
//! endorsements and purchases.
//!
//! ## Core Features
//! - Paid storefront memberships with member and evangelist tiers
//! - Per-listing pricing with general and member-only discounts
//! - Referral endorsements that earn a cut of each referred purchase
//! - Escrowed referral fees withdrawn explicitly by the referrer
//! - All-or-nothing settlement against an injected token ledger
//! - Per-key reentrancy rejection on every value-moving entry point

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod codec;
pub mod constants;
pub mod errors;
pub mod events;
pub mod guard;
pub mod hub;
pub mod identity;
pub mod ledger;
pub mod membership;
pub mod purchase;
pub mod referral;
pub mod registry;
pub mod settlement;
pub mod state;

pub use errors::{CommerceError, Result};
pub use events::{CommerceEvent, EventLog, ListingSetting};
pub use hub::{CommerceHub, ListingModules};
pub use identity::{MemoryDirectory, ProfileDirectory};
pub use ledger::{LedgerError, MemoryLedger, TokenLedger};
pub use membership::{MembershipModule, StoreMembership};
pub use purchase::{PurchaseModule, PurchaseRequest, StorePurchase};
pub use referral::{EndorsementReferral, ReferralModule};
pub use settlement::{PriceQuote, SettlementEngine};
pub use state::{
    CallContext, Listing, ListingKey, MembershipConfig, ProfileId, PublicationId,
    PurchaseReceipt, Subscriber, SubscriptionTier,
};
