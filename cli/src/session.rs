//! In-memory protocol session
//!
//! Stands up the three commerce modules behind a `CommerceHub` with an
//! in-memory ledger and profile directory, and hands out named accounts so
//! command output can refer to "seller", "buyer" and so on.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anchor_lang::prelude::Pubkey;
use anyhow::{anyhow, Result};
use storefront_protocol::codec::{ListingInitData, MembershipInitData, PurchaseData, SubscribeData};
use storefront_protocol::{
    CallContext, CommerceHub, EndorsementReferral, EventLog, ListingKey, MembershipModule,
    MemoryDirectory, MemoryLedger, ProfileId, PublicationId, PurchaseModule, PurchaseReceipt,
    ReferralModule, SettlementEngine, StoreMembership, StorePurchase, SubscriptionTier,
    TokenLedger,
};
use tracing::debug;

/// Session clock start, advanced one second per call
const GENESIS_TIMESTAMP: i64 = 1_700_000_000;

/// Rate settings applied right after a listing is published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingTerms {
    pub price: u64,
    /// General discount percentage; `None` leaves the general discount disabled
    pub general_discount: Option<u8>,
    pub member_discount: u8,
    pub referral_fee: u8,
}

pub struct Session {
    ledger: Rc<MemoryLedger>,
    directory: Rc<MemoryDirectory>,
    events: EventLog,
    hub: CommerceHub,
    membership: Rc<StoreMembership>,
    purchase: Rc<StorePurchase>,
    referral: Rc<EndorsementReferral>,
    currency: Pubkey,
    accounts: BTreeMap<String, Pubkey>,
    clock: Cell<i64>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        let ledger = Rc::new(MemoryLedger::new());
        let directory = Rc::new(MemoryDirectory::new());
        let events = EventLog::new();

        let membership = Rc::new(StoreMembership::new(
            SettlementEngine::new(ledger.clone(), derive_address(b"membership-module")),
            directory.clone(),
            events.clone(),
        ));
        let purchase = Rc::new(StorePurchase::new(
            SettlementEngine::new(ledger.clone(), derive_address(b"purchase-module")),
            directory.clone(),
            events.clone(),
        ));
        let referral = Rc::new(EndorsementReferral::new(directory.clone(), events.clone()));

        Self {
            ledger,
            directory,
            hub: CommerceHub::new(events.clone()),
            events,
            membership,
            purchase,
            referral,
            currency: derive_address(b"currency"),
            accounts: BTreeMap::new(),
            clock: Cell::new(GENESIS_TIMESTAMP),
        }
    }

    pub const fn hub(&self) -> &CommerceHub {
        &self.hub
    }

    pub const fn currency(&self) -> &Pubkey {
        &self.currency
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn membership_account(&self) -> Pubkey {
        self.membership.module_account()
    }

    pub fn purchase_account(&self) -> Pubkey {
        self.purchase.module_account()
    }

    /// Account registered under `name`, created on first use
    pub fn account(&mut self, name: &str) -> Pubkey {
        *self
            .accounts
            .entry(name.to_string())
            .or_insert_with(|| derive_address(name.as_bytes()))
    }

    /// Name an account was registered under
    pub fn name_of(&self, account: &Pubkey) -> Option<&str> {
        self.accounts
            .iter()
            .find_map(|(name, key)| (key == account).then_some(name.as_str()))
    }

    fn ctx(&self, caller: Pubkey) -> CallContext {
        let now = self.clock.get();
        self.clock.set(now.saturating_add(1));
        CallContext::new(caller, now)
    }

    pub fn balance(&self, account: &Pubkey) -> u64 {
        self.ledger.balance_of(&self.currency, account)
    }

    pub fn mint(&self, account: &Pubkey, amount: u64) -> Result<()> {
        self.ledger.mint(&self.currency, account, amount)?;
        debug!(%account, amount, "Minted");
        Ok(())
    }

    pub fn approve(&self, owner: &Pubkey, spender: &Pubkey, amount: u64) {
        self.ledger.approve(&self.currency, owner, spender, amount);
    }

    pub fn create_profile(&self, owner: &Pubkey) -> ProfileId {
        self.directory.create_profile(*owner)
    }

    /// Create the membership storefront for `profile` and set both fees
    pub fn open_storefront(
        &self,
        owner: &Pubkey,
        profile: ProfileId,
        membership_fee: u64,
        evangelist_fee: u64,
    ) -> Result<()> {
        let ctx = self.ctx(*owner);
        self.hub.initialize_membership(
            &ctx,
            profile,
            self.membership.clone(),
            &MembershipInitData::new(&self.currency, owner).encode(),
        )?;
        self.membership
            .set_evangelist_fee(&ctx, profile, evangelist_fee)?;
        self.membership
            .set_membership_fee(&ctx, profile, membership_fee)?;
        Ok(())
    }

    /// Publish a listing with both the purchase and referral modules, then apply `terms`
    pub fn publish_listing(
        &self,
        owner: &Pubkey,
        profile: ProfileId,
        publication: u64,
        terms: &ListingTerms,
    ) -> Result<ListingKey> {
        let key = ListingKey {
            seller: profile,
            listing: PublicationId(publication),
        };
        let ctx = self.ctx(*owner);
        let referral: Rc<dyn ReferralModule> = self.referral.clone();
        self.hub.initialize_listing(
            &ctx,
            key,
            self.purchase.clone(),
            Some(referral),
            &ListingInitData::new(&self.currency, terms.price).encode(),
        )?;

        if let Some(pct) = terms.general_discount {
            self.purchase.set_general_discount_enabled(&ctx, key, true)?;
            self.purchase.set_general_discount_pct(&ctx, key, pct)?;
        }
        self.purchase
            .set_member_discount_pct(&ctx, key, terms.member_discount)?;
        self.purchase
            .set_referral_fee_pct(&ctx, key, terms.referral_fee)?;
        Ok(key)
    }

    pub fn subscribe(
        &self,
        account: &Pubkey,
        seller: ProfileId,
        tier: SubscriptionTier,
    ) -> Result<SubscriptionTier> {
        let ctx = self.ctx(*account);
        Ok(self.hub.process_subscribe(
            &ctx,
            seller,
            account,
            &SubscribeData::new(tier).encode(),
        )?)
    }

    pub fn endorse(&self, owner: &Pubkey, listing: ListingKey, referrer: ProfileId) -> Result<bool> {
        let ctx = self.ctx(*owner);
        Ok(self.hub.process_endorsement(&ctx, listing, referrer)?)
    }

    pub fn buy(
        &self,
        buyer: &Pubkey,
        listing: ListingKey,
        referrer: Option<ProfileId>,
    ) -> Result<PurchaseReceipt> {
        let ctx = self.ctx(*buyer);
        Ok(self.hub.process_purchase(
            &ctx,
            listing,
            buyer,
            &PurchaseData::new(None, referrer).encode(),
        )?)
    }

    pub fn withdraw(&self, owner: &Pubkey, listing: ListingKey, referrer: ProfileId) -> Result<u64> {
        let ctx = self.ctx(*owner);
        self.hub
            .withdraw_referral_fees(&ctx, listing, referrer)
            .map_err(|e| anyhow!("Referral withdrawal failed: {e}"))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic 32-byte address for a session label
fn derive_address(label: &[u8]) -> Pubkey {
    let mut bytes = [0_u8; 32];
    for (slot, byte) in bytes.iter_mut().zip(label.iter().chain(std::iter::repeat(&0xA5))) {
        *slot = *byte;
    }
    Pubkey::new_from_array(bytes)
}
