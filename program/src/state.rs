use std::fmt;

use anchor_lang::prelude::Pubkey;

use crate::constants::{TIER_EVANGELIST, TIER_FOLLOWER, TIER_MEMBER};
use crate::errors::{CommerceError, Result};

/// Profile identifier assigned by the social graph (storefronts and referrers)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileId(pub u64);

/// Publication identifier, unique per profile
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicationId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key of a listing: the seller profile and the publication under it
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListingKey {
    pub seller: ProfileId,
    pub listing: PublicationId,
}

impl ListingKey {
    #[must_use]
    pub const fn new(seller: u64, listing: u64) -> Self {
        Self {
            seller: ProfileId(seller),
            listing: PublicationId(listing),
        }
    }
}

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.seller, self.listing)
    }
}

/// Identity and time of an entry point invocation, already validated by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Account that signed the host transaction
    pub caller: Pubkey,
    /// Unix timestamp of the host block
    pub timestamp: i64,
}

impl CallContext {
    #[must_use]
    pub const fn new(caller: Pubkey, timestamp: i64) -> Self {
        Self { caller, timestamp }
    }
}

/// Product offer attached to a publication
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    /// List price in currency base units
    pub base_price: u64,
    /// Currency the listing settles in
    pub currency: Pubkey,
    /// Whether the general discount applies to non-members
    pub general_discount_enabled: bool,
    /// General discount, whole percent
    pub general_discount_pct: u8,
    /// Member discount, whole percent; takes precedence over the general discount
    pub member_discount_pct: u8,
    /// Referrer cut of the discounted price, whole percent
    pub referral_fee_pct: u8,
    /// Account that receives seller proceeds and may configure the listing
    pub seller: Pubkey,
}

impl Listing {
    /// A freshly published listing: every rate zero, general discount disabled
    #[must_use]
    pub const fn new(seller: Pubkey, currency: Pubkey, base_price: u64) -> Self {
        Self {
            base_price,
            currency,
            general_discount_enabled: false,
            general_discount_pct: 0,
            member_discount_pct: 0,
            referral_fee_pct: 0,
            seller,
        }
    }
}

/// Storefront membership settings
/// Key: seller profile
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MembershipConfig {
    /// Fee charged for a member subscription
    pub membership_fee: u64,
    /// Fee charged for an evangelist subscription
    pub evangelist_fee: u64,
    /// Currency both fees are charged in
    pub currency: Pubkey,
    /// Account that controls the storefront and receives the fees; follows the
    /// profile's current owner
    pub controller: Pubkey,
}

/// Tier requested by a subscribe payload
///
/// Ordered: a subscriber can move up (`Follower < Member < Evangelist`) but
/// never down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriptionTier {
    /// Plain follow, free, grants nothing
    Follower,
    /// Paid membership, unlocks the member discount
    Member,
    /// Paid membership that also marks the account as an evangelist
    Evangelist,
}

impl SubscriptionTier {
    /// Decode the tier code carried by the host's follow payload
    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            TIER_FOLLOWER => Ok(Self::Follower),
            TIER_MEMBER => Ok(Self::Member),
            TIER_EVANGELIST => Ok(Self::Evangelist),
            other => Err(CommerceError::InvalidTier(other)),
        }
    }

    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            Self::Follower => TIER_FOLLOWER,
            Self::Member => TIER_MEMBER,
            Self::Evangelist => TIER_EVANGELIST,
        }
    }

    /// Fee owed for this tier under the given configuration
    #[must_use]
    pub const fn fee(self, config: &MembershipConfig) -> u64 {
        match self {
            Self::Follower => 0,
            Self::Member => config.membership_fee,
            Self::Evangelist => config.evangelist_fee,
        }
    }
}

/// Registry entry for an account that subscribed to a storefront
/// Key: (seller profile, account)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscriber {
    pub is_member: bool,
    pub is_evangelist: bool,
    /// Timestamp of the first successful paid subscription
    pub subscribed_at: i64,
}

impl Subscriber {
    /// Highest tier this entry currently holds
    #[must_use]
    pub const fn tier(&self) -> SubscriptionTier {
        if self.is_evangelist {
            SubscriptionTier::Evangelist
        } else if self.is_member {
            SubscriptionTier::Member
        } else {
            SubscriptionTier::Follower
        }
    }
}

/// Outcome of a completed purchase, returned to the host
///
/// `seller_proceeds + referral_fee == effective_price` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub listing: ListingKey,
    pub buyer: Pubkey,
    pub base_price: u64,
    /// Discount actually applied, whole percent
    pub discount_pct: u8,
    pub effective_price: u64,
    pub referral_fee: u64,
    pub seller_proceeds: u64,
    /// Referrer credited with `referral_fee`, if eligible
    pub referrer: Option<ProfileId>,
    /// Platform that routed the purchase; recorded only
    pub platform: Option<Pubkey>,
    /// True when this buyer had not purchased the listing before
    pub first_purchase: bool,
    pub purchased_at: i64,
}
