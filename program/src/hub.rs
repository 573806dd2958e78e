//! Host-side dispatch
//!
//! [`CommerceHub`] stands where the social-graph protocol would: it binds a
//! membership module to each storefront and a purchase module (plus an
//! optional referral module) to each listing, forwards the lifecycle
//! boundary calls with their encoded payloads, and exposes the read-only
//! query surface. Queries are total; unbound keys answer with defaults.

use std::cell::RefCell;
use std::rc::Rc;

use anchor_lang::prelude::Pubkey;
use tracing::debug;

use crate::codec::{decode, PurchaseData};
use crate::errors::{CommerceError, Result};
use crate::events::EventLog;
use crate::membership::MembershipModule;
use crate::purchase::{PurchaseModule, PurchaseRequest};
use crate::referral::ReferralModule;
use crate::registry::Table;
use crate::state::{
    CallContext, Listing, ListingKey, MembershipConfig, ProfileId, PurchaseReceipt,
    SubscriptionTier,
};

/// Modules attached to one listing
#[derive(Clone)]
pub struct ListingModules {
    pub purchase: Rc<dyn PurchaseModule>,
    pub referral: Option<Rc<dyn ReferralModule>>,
}

impl std::fmt::Debug for ListingModules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingModules")
            .field("purchase", &self.purchase.module_account())
            .field("referral", &self.referral.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Bindings {
    storefronts: Table<ProfileId, Rc<dyn MembershipModule>>,
    listings: Table<ListingKey, ListingModules>,
}

pub struct CommerceHub {
    events: EventLog,
    bindings: RefCell<Bindings>,
}

impl std::fmt::Debug for CommerceHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bindings = self.bindings.borrow();
        f.debug_struct("CommerceHub")
            .field("storefronts", &bindings.storefronts.len())
            .field("listings", &bindings.listings.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl CommerceHub {
    #[must_use]
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            bindings: RefCell::new(Bindings::default()),
        }
    }

    pub const fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn membership_module(&self, seller: ProfileId) -> Option<Rc<dyn MembershipModule>> {
        self.bindings.borrow().storefronts.get(&seller).cloned()
    }

    pub fn listing_modules(&self, listing: ListingKey) -> Option<ListingModules> {
        self.bindings.borrow().listings.get(&listing).cloned()
    }

    fn bound_listing(&self, listing: ListingKey) -> Result<ListingModules> {
        self.listing_modules(listing)
            .ok_or(CommerceError::UnknownListing(listing))
    }

    fn bound_referral(&self, listing: ListingKey) -> Result<Rc<dyn ReferralModule>> {
        self.bound_listing(listing)?
            .referral
            .ok_or(CommerceError::ModuleNotConfigured("referral"))
    }

    /// `initializeMembership`: attach `module` to a new storefront
    pub fn initialize_membership(
        &self,
        ctx: &CallContext,
        seller: ProfileId,
        module: Rc<dyn MembershipModule>,
        data: &[u8],
    ) -> Result<()> {
        if self.bindings.borrow().storefronts.contains(&seller) {
            return Err(CommerceError::MembershipAlreadyInitialized(seller));
        }
        module.initialize(ctx, seller, data)?;
        self.bindings.borrow_mut().storefronts.insert(seller, module);
        debug!(%seller, "Membership module bound");
        Ok(())
    }

    /// `initializeListing`: attach the purchase module and optional referral module
    ///
    /// Every check that can fail runs before either module records anything.
    pub fn initialize_listing(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        purchase: Rc<dyn PurchaseModule>,
        referral: Option<Rc<dyn ReferralModule>>,
        data: &[u8],
    ) -> Result<()> {
        let already_bound = self.bindings.borrow().listings.contains(&listing)
            || referral
                .as_ref()
                .is_some_and(|module| module.has_listing(listing));
        if already_bound {
            return Err(CommerceError::ListingAlreadyExists(listing));
        }

        purchase.initialize(ctx, listing, data)?;
        if let Some(module) = referral.as_ref() {
            module.initialize(ctx, listing)?;
        }

        self.bindings
            .borrow_mut()
            .listings
            .insert(listing, ListingModules { purchase, referral });
        debug!(%listing, "Listing modules bound");
        Ok(())
    }

    /// `processSubscribe`: payload is [`crate::codec::SubscribeData`]
    pub fn process_subscribe(
        &self,
        ctx: &CallContext,
        seller: ProfileId,
        subscriber: &Pubkey,
        data: &[u8],
    ) -> Result<SubscriptionTier> {
        let module = self
            .membership_module(seller)
            .ok_or(CommerceError::UnknownSeller(seller))?;
        module.process_subscribe(ctx, seller, subscriber, data)
    }

    /// `processEndorsement`: the endorsing profile becomes an eligible referrer
    pub fn process_endorsement(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        referrer: ProfileId,
    ) -> Result<bool> {
        self.bound_referral(listing)?
            .record_endorsement(ctx, listing, referrer)
    }

    /// `processPurchase`: payload is [`PurchaseData`]
    pub fn process_purchase(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        buyer: &Pubkey,
        data: &[u8],
    ) -> Result<PurchaseReceipt> {
        let payload: PurchaseData = decode(data)?;
        let modules = self.bound_listing(listing)?;
        let membership = self.membership_module(listing.seller);

        let request = PurchaseRequest::new(listing, *buyer)
            .with_referrer(payload.referrer())
            .with_platform(payload.platform())
            .with_membership(membership.as_deref())
            .with_referral(modules.referral.as_deref());
        modules.purchase.purchase(ctx, &request)
    }

    pub fn withdraw_referral_fees(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        referrer: ProfileId,
    ) -> Result<u64> {
        self.bound_listing(listing)?
            .purchase
            .withdraw_referral_fees(ctx, listing, referrer)
    }

    pub fn get_product_data(&self, listing: ListingKey) -> Listing {
        self.listing_modules(listing)
            .map(|modules| modules.purchase.get_product_data(listing))
            .unwrap_or_default()
    }

    pub fn get_profile_data(&self, seller: ProfileId) -> MembershipConfig {
        self.membership_module(seller)
            .map(|module| module.get_profile_data(seller))
            .unwrap_or_default()
    }

    pub fn is_buyer(&self, listing: ListingKey, account: &Pubkey) -> bool {
        self.listing_modules(listing)
            .is_some_and(|modules| modules.purchase.is_buyer(listing, account))
    }

    pub fn is_member(&self, seller: ProfileId, account: &Pubkey) -> bool {
        self.membership_module(seller)
            .is_some_and(|module| module.is_member(seller, account))
    }

    pub fn is_evangelist(&self, seller: ProfileId, account: &Pubkey) -> bool {
        self.membership_module(seller)
            .is_some_and(|module| module.is_evangelist(seller, account))
    }

    pub fn is_referrer(&self, listing: ListingKey, referrer: ProfileId) -> bool {
        self.listing_modules(listing)
            .and_then(|modules| modules.referral)
            .is_some_and(|module| module.is_referrer(listing, referrer))
    }

    pub fn referral_balance(&self, listing: ListingKey, referrer: ProfileId) -> u64 {
        self.listing_modules(listing)
            .map_or(0, |modules| modules.purchase.referral_balance(listing, referrer))
    }
}
