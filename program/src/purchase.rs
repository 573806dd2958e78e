//! Purchase module
//!
//! Per-listing product configuration and the purchase settlement flow. A
//! purchase asks the seller's membership module whether the buyer gets the
//! member discount and the listing's referral module whether the supplied
//! referrer earns the referral fee, settles through the engine, then records
//! the buyer and accrues the referrer's withdrawable balance.

use std::cell::RefCell;
use std::rc::Rc;

use anchor_lang::prelude::Pubkey;
use tracing::{info, warn};

use crate::codec::{decode, ListingInitData};
use crate::errors::{CommerceError, Result};
use crate::events::{CommerceEvent, EventLog, ListingSetting};
use crate::guard::ReentrancyGuard;
use crate::identity::ProfileDirectory;
use crate::membership::MembershipModule;
use crate::referral::ReferralModule;
use crate::registry::{Interner, Table};
use crate::settlement::{quote, validate_percentage, SettlementEngine};
use crate::state::{CallContext, Listing, ListingKey, ProfileId, PurchaseReceipt};

/// Inputs of one purchase call
///
/// The collaborating modules are optional: a storefront without a membership
/// module never grants the member discount, a listing without a referral
/// module never pays a referral fee.
#[derive(Clone, Copy)]
pub struct PurchaseRequest<'a> {
    pub listing: ListingKey,
    pub buyer: Pubkey,
    pub referrer: Option<ProfileId>,
    pub platform: Option<Pubkey>,
    pub membership: Option<&'a dyn MembershipModule>,
    pub referral: Option<&'a dyn ReferralModule>,
}

impl<'a> PurchaseRequest<'a> {
    #[must_use]
    pub const fn new(listing: ListingKey, buyer: Pubkey) -> Self {
        Self {
            listing,
            buyer,
            referrer: None,
            platform: None,
            membership: None,
            referral: None,
        }
    }

    #[must_use]
    pub const fn with_referrer(mut self, referrer: Option<ProfileId>) -> Self {
        self.referrer = referrer;
        self
    }

    #[must_use]
    pub const fn with_platform(mut self, platform: Option<Pubkey>) -> Self {
        self.platform = platform;
        self
    }

    #[must_use]
    pub fn with_membership(mut self, membership: Option<&'a dyn MembershipModule>) -> Self {
        self.membership = membership;
        self
    }

    #[must_use]
    pub fn with_referral(mut self, referral: Option<&'a dyn ReferralModule>) -> Self {
        self.referral = referral;
        self
    }

    fn buyer_is_member(&self) -> bool {
        self.membership
            .is_some_and(|module| module.is_member(self.listing.seller, &self.buyer))
    }

    /// Referrer that qualifies for the fee split, if any
    fn eligible_referrer(&self) -> Option<ProfileId> {
        let referrer = self.referrer?;
        self.referral
            .is_some_and(|module| module.is_referrer(self.listing, referrer))
            .then_some(referrer)
    }
}

impl std::fmt::Debug for PurchaseRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseRequest")
            .field("listing", &self.listing)
            .field("buyer", &self.buyer)
            .field("referrer", &self.referrer)
            .field("platform", &self.platform)
            .field("membership", &self.membership.is_some())
            .field("referral", &self.referral.is_some())
            .finish()
    }
}

/// Capability interface of a collect-style purchase module
pub trait PurchaseModule {
    /// Account buyers approve as spender; also holds accrued referral fees
    fn module_account(&self) -> Pubkey;

    /// Create a listing with every rate at zero and the general discount disabled
    fn publish(&self, ctx: &CallContext, listing: ListingKey, base_price: u64, currency: Pubkey)
        -> Result<()>;

    fn set_general_discount_enabled(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        enabled: bool,
    ) -> Result<()>;

    fn set_general_discount_pct(&self, ctx: &CallContext, listing: ListingKey, pct: u8)
        -> Result<()>;

    fn set_member_discount_pct(&self, ctx: &CallContext, listing: ListingKey, pct: u8)
        -> Result<()>;

    fn set_referral_fee_pct(&self, ctx: &CallContext, listing: ListingKey, pct: u8) -> Result<()>;

    /// Listing configuration, zeroed for unknown keys
    fn get_product_data(&self, listing: ListingKey) -> Listing;

    fn purchase(&self, ctx: &CallContext, request: &PurchaseRequest<'_>) -> Result<PurchaseReceipt>;

    fn is_buyer(&self, listing: ListingKey, account: &Pubkey) -> bool;

    /// Referral fees accrued and not yet withdrawn
    fn referral_balance(&self, listing: ListingKey, referrer: ProfileId) -> u64;

    /// Pay the referrer's whole accrued balance to the calling controller account
    fn withdraw_referral_fees(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        referrer: ProfileId,
    ) -> Result<u64>;

    /// Host hook for publication creation; payload is [`ListingInitData`]
    fn initialize(&self, ctx: &CallContext, listing: ListingKey, data: &[u8]) -> Result<()> {
        let init: ListingInitData = decode(data)?;
        self.publish(ctx, listing, init.price, init.currency())
    }
}

#[derive(Debug, Default)]
struct PurchaseState {
    listings: Table<ListingKey, Listing>,
    buyers: Interner<(ListingKey, Pubkey)>,
    referral_ledger: Table<(ListingKey, ProfileId), u64>,
}

/// Purchase module backed by in-process registries
#[derive(Debug)]
pub struct StorePurchase {
    engine: SettlementEngine,
    directory: Rc<dyn ProfileDirectory>,
    events: EventLog,
    state: RefCell<PurchaseState>,
    purchase_guard: ReentrancyGuard<(ListingKey, Pubkey)>,
    withdraw_guard: ReentrancyGuard<(ListingKey, ProfileId)>,
}

impl StorePurchase {
    pub fn new(engine: SettlementEngine, directory: Rc<dyn ProfileDirectory>, events: EventLog) -> Self {
        Self {
            engine,
            directory,
            events,
            state: RefCell::new(PurchaseState::default()),
            purchase_guard: ReentrancyGuard::new(),
            withdraw_guard: ReentrancyGuard::new(),
        }
    }

    fn listing(&self, listing: ListingKey) -> Result<Listing> {
        self.state
            .borrow()
            .listings
            .get(&listing)
            .copied()
            .ok_or(CommerceError::UnknownListing(listing))
    }

    /// Apply one setting after checking existence, then ownership
    fn update_listing(
        &self,
        ctx: &CallContext,
        key: ListingKey,
        setting: ListingSetting,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let listing = state
            .listings
            .get_mut(&key)
            .ok_or(CommerceError::UnknownListing(key))?;
        if listing.seller != ctx.caller {
            return Err(CommerceError::Unauthorized);
        }

        match setting {
            ListingSetting::GeneralDiscountEnabled(enabled) => {
                listing.general_discount_enabled = enabled;
            }
            ListingSetting::GeneralDiscountPct(pct) => {
                listing.general_discount_pct = validate_percentage(pct)?;
            }
            ListingSetting::MemberDiscountPct(pct) => {
                listing.member_discount_pct = validate_percentage(pct)?;
            }
            ListingSetting::ReferralFeePct(pct) => {
                listing.referral_fee_pct = validate_percentage(pct)?;
            }
        }
        drop(state);

        info!(listing = %key, ?setting, "Listing updated");
        self.events.emit(CommerceEvent::ListingUpdated {
            listing: key,
            setting,
        });
        Ok(())
    }
}

impl PurchaseModule for StorePurchase {
    fn module_account(&self) -> Pubkey {
        *self.engine.escrow()
    }

    fn publish(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        base_price: u64,
        currency: Pubkey,
    ) -> Result<()> {
        if !self.directory.is_controller(listing.seller, &ctx.caller) {
            return Err(CommerceError::Unauthorized);
        }

        let mut state = self.state.borrow_mut();
        if state.listings.contains(&listing) {
            return Err(CommerceError::ListingAlreadyExists(listing));
        }
        state
            .listings
            .insert(listing, Listing::new(ctx.caller, currency, base_price));
        drop(state);

        info!(%listing, base_price, %currency, "Listing published");
        self.events.emit(CommerceEvent::ListingPublished {
            listing,
            seller: ctx.caller,
            currency,
            base_price,
        });
        Ok(())
    }

    fn set_general_discount_enabled(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        enabled: bool,
    ) -> Result<()> {
        self.update_listing(ctx, listing, ListingSetting::GeneralDiscountEnabled(enabled))
    }

    fn set_general_discount_pct(&self, ctx: &CallContext, listing: ListingKey, pct: u8) -> Result<()> {
        self.update_listing(ctx, listing, ListingSetting::GeneralDiscountPct(pct))
    }

    fn set_member_discount_pct(&self, ctx: &CallContext, listing: ListingKey, pct: u8) -> Result<()> {
        self.update_listing(ctx, listing, ListingSetting::MemberDiscountPct(pct))
    }

    fn set_referral_fee_pct(&self, ctx: &CallContext, listing: ListingKey, pct: u8) -> Result<()> {
        self.update_listing(ctx, listing, ListingSetting::ReferralFeePct(pct))
    }

    fn get_product_data(&self, listing: ListingKey) -> Listing {
        self.listing(listing).unwrap_or_default()
    }

    fn purchase(&self, ctx: &CallContext, request: &PurchaseRequest<'_>) -> Result<PurchaseReceipt> {
        let key = request.listing;
        let buyer = request.buyer;
        let listing = self.listing(key)?;
        let _token = self.purchase_guard.enter((key, buyer))?;

        let referrer = request.eligible_referrer();
        let price = quote(&listing, request.buyer_is_member(), referrer.is_some())?;

        // Accrual must fit before any value moves.
        if let Some(referrer) = referrer {
            self.referral_balance(key, referrer)
                .checked_add(price.referral_fee)
                .ok_or(CommerceError::ArithmeticError)?;
        }

        self.engine
            .settle_purchase(&listing.currency, &buyer, &listing.seller, &price)
            .inspect_err(|err| {
                warn!(listing = %key, %buyer, error = %err, "Purchase settlement failed");
            })?;

        let mut state = self.state.borrow_mut();
        let (_, first_purchase) = state.buyers.intern((key, buyer));
        if let Some(referrer) = referrer {
            if price.referral_fee > 0 {
                let accrued = state
                    .referral_ledger
                    .get_or_insert_with((key, referrer), || 0);
                *accrued = accrued.saturating_add(price.referral_fee);
            }
        }
        drop(state);

        let receipt = PurchaseReceipt {
            listing: key,
            buyer,
            base_price: price.base_price,
            discount_pct: price.discount_pct,
            effective_price: price.effective_price,
            referral_fee: price.referral_fee,
            seller_proceeds: price.seller_proceeds,
            referrer,
            platform: request.platform,
            first_purchase,
            purchased_at: ctx.timestamp,
        };

        info!(
            listing = %key,
            %buyer,
            effective_price = receipt.effective_price,
            seller_proceeds = receipt.seller_proceeds,
            referral_fee = receipt.referral_fee,
            "Product purchased"
        );
        self.events.emit(CommerceEvent::ProductPurchased {
            listing: key,
            buyer,
            effective_price: receipt.effective_price,
            seller_proceeds: receipt.seller_proceeds,
            referral_fee: receipt.referral_fee,
            referrer,
            platform: receipt.platform,
        });
        Ok(receipt)
    }

    fn is_buyer(&self, listing: ListingKey, account: &Pubkey) -> bool {
        self.state.borrow().buyers.contains(&(listing, *account))
    }

    fn referral_balance(&self, listing: ListingKey, referrer: ProfileId) -> u64 {
        self.state
            .borrow()
            .referral_ledger
            .get(&(listing, referrer))
            .copied()
            .unwrap_or(0)
    }

    fn withdraw_referral_fees(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        referrer: ProfileId,
    ) -> Result<u64> {
        let item = self.listing(listing)?;
        if !self.directory.is_controller(referrer, &ctx.caller) {
            return Err(CommerceError::Unauthorized);
        }
        let key = (listing, referrer);
        let _token = self.withdraw_guard.enter(key)?;

        // Zero the entry before the outbound transfer.
        let amount = {
            let mut state = self.state.borrow_mut();
            match state.referral_ledger.get_mut(&key) {
                Some(accrued) if *accrued > 0 => std::mem::take(accrued),
                _ => return Err(CommerceError::NothingToWithdraw),
            }
        };

        if let Err(err) = self.engine.release(&item.currency, &ctx.caller, amount) {
            warn!(%listing, %referrer, error = %err, "Referral payout failed");
            let mut state = self.state.borrow_mut();
            let accrued = state.referral_ledger.get_or_insert_with(key, || 0);
            *accrued = accrued.saturating_add(amount);
            return Err(CommerceError::PaymentFailed);
        }

        info!(%listing, %referrer, amount, "Referral fees withdrawn");
        self.events.emit(CommerceEvent::ReferralFeesWithdrawn {
            listing,
            referrer,
            destination: ctx.caller,
            amount,
        });
        Ok(amount)
    }
}
