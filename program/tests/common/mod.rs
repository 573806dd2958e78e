//! Shared fixture for the integration suites
//!
//! Builds one storefront with the membership, purchase and referral modules
//! bound through a `CommerceHub`, backed by an in-memory ledger and profile
//! directory. Mirrors the demo setup: membership fee 10000, evangelist fee
//! 1000, one listing priced at 10000.

#![allow(dead_code)]

use std::rc::Rc;

use anchor_lang::prelude::Pubkey;
use storefront_protocol::codec::{ListingInitData, MembershipInitData, PurchaseData, SubscribeData};
use storefront_protocol::{
    CallContext, CommerceHub, EndorsementReferral, EventLog, ListingKey, MembershipModule,
    MemoryDirectory, MemoryLedger, ProfileId, PublicationId, PurchaseModule, PurchaseReceipt,
    ReferralModule, Result, SettlementEngine, StoreMembership, StorePurchase, SubscriptionTier,
    TokenLedger,
};

pub const MEMBERSHIP_FEE: u64 = 10_000;
pub const EVANGELIST_FEE: u64 = 1_000;
pub const LISTING_PRICE: u64 = 10_000;
pub const NOW: i64 = 1_700_000_000;

pub struct World {
    pub ledger: Rc<MemoryLedger>,
    pub directory: Rc<MemoryDirectory>,
    pub events: EventLog,
    pub hub: CommerceHub,
    pub membership: Rc<StoreMembership>,
    pub purchase: Rc<StorePurchase>,
    pub referral: Rc<EndorsementReferral>,
    pub currency: Pubkey,
    pub seller: Pubkey,
    pub seller_profile: ProfileId,
    pub listing: ListingKey,
}

impl World {
    /// Storefront with fees configured and one published listing, no rates set
    pub fn new() -> Self {
        let ledger = Rc::new(MemoryLedger::new());
        let directory = Rc::new(MemoryDirectory::new());
        let events = EventLog::new();
        let currency = Pubkey::new_unique();

        let membership = Rc::new(StoreMembership::new(
            SettlementEngine::new(ledger.clone(), Pubkey::new_unique()),
            directory.clone(),
            events.clone(),
        ));
        let purchase = Rc::new(StorePurchase::new(
            SettlementEngine::new(ledger.clone(), Pubkey::new_unique()),
            directory.clone(),
            events.clone(),
        ));
        let referral = Rc::new(EndorsementReferral::new(directory.clone(), events.clone()));
        let hub = CommerceHub::new(events.clone());

        let seller = Pubkey::new_unique();
        let seller_profile = directory.create_profile(seller);
        let listing = ListingKey {
            seller: seller_profile,
            listing: PublicationId(1),
        };
        let ctx = CallContext::new(seller, NOW);

        hub.initialize_membership(
            &ctx,
            seller_profile,
            membership.clone(),
            &MembershipInitData::new(&currency, &seller).encode(),
        )
        .unwrap();
        membership
            .set_membership_fee(&ctx, seller_profile, MEMBERSHIP_FEE)
            .unwrap();
        membership
            .set_evangelist_fee(&ctx, seller_profile, EVANGELIST_FEE)
            .unwrap();
        hub.initialize_listing(
            &ctx,
            listing,
            purchase.clone(),
            Some(referral.clone() as Rc<dyn ReferralModule>),
            &ListingInitData::new(&currency, LISTING_PRICE).encode(),
        )
        .unwrap();

        Self {
            ledger,
            directory,
            events,
            hub,
            membership,
            purchase,
            referral,
            currency,
            seller,
            seller_profile,
            listing,
        }
    }

    pub const fn ctx(&self, caller: Pubkey) -> CallContext {
        CallContext::new(caller, NOW)
    }

    pub const fn seller_ctx(&self) -> CallContext {
        self.ctx(self.seller)
    }

    pub fn balance(&self, account: &Pubkey) -> u64 {
        self.ledger.balance_of(&self.currency, account)
    }

    pub fn escrow_balance(&self) -> u64 {
        self.balance(&self.purchase.module_account())
    }

    pub fn fund(&self, account: &Pubkey, amount: u64) {
        self.ledger.mint(&self.currency, account, amount).unwrap();
    }

    pub fn approve_purchase(&self, owner: &Pubkey, amount: u64) {
        self.ledger
            .approve(&self.currency, owner, &self.purchase.module_account(), amount);
    }

    pub fn approve_membership(&self, owner: &Pubkey, amount: u64) {
        self.ledger
            .approve(&self.currency, owner, &self.membership.module_account(), amount);
    }

    /// Account funded with `amount` and approving both modules for all of it
    pub fn funded_account(&self, amount: u64) -> Pubkey {
        let account = Pubkey::new_unique();
        self.fund(&account, amount);
        self.approve_purchase(&account, amount);
        self.approve_membership(&account, amount);
        account
    }

    /// New profile able to act as a referrer, with its controlling account
    pub fn referrer_profile(&self) -> (Pubkey, ProfileId) {
        let owner = Pubkey::new_unique();
        (owner, self.directory.create_profile(owner))
    }

    pub fn subscribe(&self, account: &Pubkey, tier: SubscriptionTier) -> Result<SubscriptionTier> {
        self.hub.process_subscribe(
            &self.ctx(*account),
            self.seller_profile,
            account,
            &SubscribeData::new(tier).encode(),
        )
    }

    pub fn endorse(&self, owner: &Pubkey, referrer: ProfileId) -> Result<bool> {
        self.hub
            .process_endorsement(&self.ctx(*owner), self.listing, referrer)
    }

    pub fn buy(&self, buyer: &Pubkey, referrer: Option<ProfileId>) -> Result<PurchaseReceipt> {
        self.hub.process_purchase(
            &self.ctx(*buyer),
            self.listing,
            buyer,
            &PurchaseData::new(None, referrer).encode(),
        )
    }

    pub fn withdraw(&self, owner: &Pubkey, referrer: ProfileId) -> Result<u64> {
        self.hub
            .withdraw_referral_fees(&self.ctx(*owner), self.listing, referrer)
    }

    pub fn set_member_discount(&self, pct: u8) {
        self.purchase
            .set_member_discount_pct(&self.seller_ctx(), self.listing, pct)
            .unwrap();
    }

    pub fn set_referral_fee(&self, pct: u8) {
        self.purchase
            .set_referral_fee_pct(&self.seller_ctx(), self.listing, pct)
            .unwrap();
    }

    pub fn enable_general_discount(&self, pct: u8) {
        let ctx = self.seller_ctx();
        self.purchase
            .set_general_discount_enabled(&ctx, self.listing, true)
            .unwrap();
        self.purchase
            .set_general_discount_pct(&ctx, self.listing, pct)
            .unwrap();
    }

    pub fn is_referrer(&self, referrer: ProfileId) -> bool {
        self.referral.is_referrer(self.listing, referrer)
    }
}
