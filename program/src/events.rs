//! Events emitted by the commerce modules
//!
//! Every committed state change appends one event to the shared [`EventLog`].
//! Aborted operations emit nothing, so the log is an exact audit trail of
//! what the host protocol actually committed.

use std::cell::RefCell;
use std::rc::Rc;

use anchor_lang::prelude::Pubkey;

use crate::state::{ListingKey, ProfileId, SubscriptionTier};

/// Which listing setting a configuration call changed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingSetting {
    GeneralDiscountEnabled(bool),
    GeneralDiscountPct(u8),
    MemberDiscountPct(u8),
    ReferralFeePct(u8),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommerceEvent {
    /// Emitted when a storefront attaches the membership module
    MembershipInitialized {
        seller: ProfileId,
        controller: Pubkey,
        currency: Pubkey,
    },

    /// Emitted when a seller changes membership or evangelist fees
    MembershipFeesUpdated {
        seller: ProfileId,
        membership_fee: u64,
        evangelist_fee: u64,
    },

    /// Emitted when a subscribe call commits
    Subscribed {
        seller: ProfileId,
        subscriber: Pubkey,
        tier: SubscriptionTier,
        /// Fee charged in the storefront currency
        amount: u64,
    },

    /// Emitted when a publication is initialized as a listing
    ListingPublished {
        listing: ListingKey,
        seller: Pubkey,
        currency: Pubkey,
        base_price: u64,
    },

    /// Emitted when a seller changes a listing setting
    ListingUpdated {
        listing: ListingKey,
        setting: ListingSetting,
    },

    /// Emitted the first time a referrer endorses a listing
    EndorsementRecorded {
        listing: ListingKey,
        referrer: ProfileId,
    },

    /// Emitted when a purchase settles
    ProductPurchased {
        listing: ListingKey,
        buyer: Pubkey,
        effective_price: u64,
        seller_proceeds: u64,
        referral_fee: u64,
        referrer: Option<ProfileId>,
        platform: Option<Pubkey>,
    },

    /// Emitted when accrued referral fees are paid out
    ReferralFeesWithdrawn {
        listing: ListingKey,
        referrer: ProfileId,
        destination: Pubkey,
        amount: u64,
    },
}

/// Shared, append-only event sink
///
/// Cloning the log yields another handle onto the same buffer.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<CommerceEvent>>>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: CommerceEvent) {
        self.events.borrow_mut().push(event);
    }

    /// Copy of every event emitted so far
    pub fn snapshot(&self) -> Vec<CommerceEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn last(&self) -> Option<CommerceEvent> {
        self.events.borrow().last().cloned()
    }
}
