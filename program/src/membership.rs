//! Membership module
//!
//! Turns a storefront's follow action into a paid subscription. Sellers set a
//! membership fee and an evangelist fee; subscribing charges the fee for the
//! requested tier from the subscriber straight to the storefront controller
//! and then records the subscriber. Members qualify for the member discount
//! on the seller's listings.

use std::cell::RefCell;
use std::rc::Rc;

use anchor_lang::prelude::Pubkey;
use tracing::{info, warn};

use crate::codec::{decode, MembershipInitData, SubscribeData};
use crate::errors::{CommerceError, Result};
use crate::events::{CommerceEvent, EventLog};
use crate::guard::ReentrancyGuard;
use crate::identity::ProfileDirectory;
use crate::registry::Table;
use crate::settlement::SettlementEngine;
use crate::state::{CallContext, MembershipConfig, ProfileId, Subscriber, SubscriptionTier};

/// Capability interface of a follow-style membership module
pub trait MembershipModule {
    /// Account subscribers approve as spender for membership fees
    fn module_account(&self) -> Pubkey;

    /// Attach the module to a new storefront with zero fees
    fn register_storefront(
        &self,
        ctx: &CallContext,
        seller: ProfileId,
        currency: Pubkey,
        controller: Pubkey,
    ) -> Result<()>;

    /// Replace the storefront's fees and currency (controller only)
    fn configure(
        &self,
        ctx: &CallContext,
        seller: ProfileId,
        membership_fee: u64,
        evangelist_fee: u64,
        currency: Pubkey,
    ) -> Result<()>;

    fn set_membership_fee(&self, ctx: &CallContext, seller: ProfileId, fee: u64) -> Result<()>;

    fn set_evangelist_fee(&self, ctx: &CallContext, seller: ProfileId, fee: u64) -> Result<()>;

    /// Charge the tier's fee and record the subscriber
    fn subscribe(
        &self,
        ctx: &CallContext,
        seller: ProfileId,
        subscriber: &Pubkey,
        tier: SubscriptionTier,
    ) -> Result<()>;

    fn is_member(&self, seller: ProfileId, account: &Pubkey) -> bool;

    fn is_evangelist(&self, seller: ProfileId, account: &Pubkey) -> bool;

    /// Registry entry for `account`, if it ever subscribed
    fn subscriber(&self, seller: ProfileId, account: &Pubkey) -> Option<Subscriber>;

    /// Storefront configuration, zeroed for unknown sellers
    fn get_profile_data(&self, seller: ProfileId) -> MembershipConfig;

    /// Host hook for storefront creation; payload is [`MembershipInitData`]
    fn initialize(&self, ctx: &CallContext, seller: ProfileId, data: &[u8]) -> Result<()> {
        let init: MembershipInitData = decode(data)?;
        self.register_storefront(ctx, seller, init.currency(), init.controller())
    }

    /// Host hook for follow actions; payload is [`SubscribeData`]
    fn process_subscribe(
        &self,
        ctx: &CallContext,
        seller: ProfileId,
        subscriber: &Pubkey,
        data: &[u8],
    ) -> Result<SubscriptionTier> {
        let payload: SubscribeData = decode(data)?;
        let tier = payload.tier()?;
        self.subscribe(ctx, seller, subscriber, tier)?;
        Ok(tier)
    }
}

#[derive(Debug, Default)]
struct MembershipState {
    configs: Table<ProfileId, MembershipConfig>,
    subscribers: Table<(ProfileId, Pubkey), Subscriber>,
}

/// Membership module backed by in-process registries
#[derive(Debug)]
pub struct StoreMembership {
    engine: SettlementEngine,
    directory: Rc<dyn ProfileDirectory>,
    events: EventLog,
    state: RefCell<MembershipState>,
    guard: ReentrancyGuard<(ProfileId, Pubkey)>,
}

impl StoreMembership {
    pub fn new(engine: SettlementEngine, directory: Rc<dyn ProfileDirectory>, events: EventLog) -> Self {
        Self {
            engine,
            directory,
            events,
            state: RefCell::new(MembershipState::default()),
            guard: ReentrancyGuard::new(),
        }
    }

    /// Stored config with `controller` read from the profile's current owner
    fn config(&self, seller: ProfileId) -> Result<MembershipConfig> {
        let mut config = self
            .state
            .borrow()
            .configs
            .get(&seller)
            .copied()
            .ok_or(CommerceError::UnknownSeller(seller))?;
        if let Some(controller) = self.directory.controller_of(seller) {
            config.controller = controller;
        }
        Ok(config)
    }

    /// Apply `update` to the seller's config after checking the caller controls the profile now
    fn update_config(
        &self,
        ctx: &CallContext,
        seller: ProfileId,
        update: impl FnOnce(&mut MembershipConfig),
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let config = state
            .configs
            .get_mut(&seller)
            .ok_or(CommerceError::UnknownSeller(seller))?;
        if !self.directory.is_controller(seller, &ctx.caller) {
            return Err(CommerceError::Unauthorized);
        }
        config.controller = ctx.caller;
        update(&mut *config);
        let (membership_fee, evangelist_fee) = (config.membership_fee, config.evangelist_fee);
        drop(state);

        info!(%seller, membership_fee, evangelist_fee, "Membership fees updated");
        self.events.emit(CommerceEvent::MembershipFeesUpdated {
            seller,
            membership_fee,
            evangelist_fee,
        });
        Ok(())
    }
}

impl MembershipModule for StoreMembership {
    fn module_account(&self) -> Pubkey {
        *self.engine.escrow()
    }

    fn register_storefront(
        &self,
        ctx: &CallContext,
        seller: ProfileId,
        currency: Pubkey,
        controller: Pubkey,
    ) -> Result<()> {
        if !self.directory.is_controller(seller, &controller)
            || !self.directory.is_controller(seller, &ctx.caller)
        {
            return Err(CommerceError::Unauthorized);
        }

        let mut state = self.state.borrow_mut();
        if state.configs.contains(&seller) {
            return Err(CommerceError::MembershipAlreadyInitialized(seller));
        }
        state.configs.insert(
            seller,
            MembershipConfig {
                membership_fee: 0,
                evangelist_fee: 0,
                currency,
                controller,
            },
        );
        drop(state);

        info!(%seller, %controller, %currency, "Storefront membership initialized");
        self.events.emit(CommerceEvent::MembershipInitialized {
            seller,
            controller,
            currency,
        });
        Ok(())
    }

    fn configure(
        &self,
        ctx: &CallContext,
        seller: ProfileId,
        membership_fee: u64,
        evangelist_fee: u64,
        currency: Pubkey,
    ) -> Result<()> {
        self.update_config(ctx, seller, |config| {
            config.membership_fee = membership_fee;
            config.evangelist_fee = evangelist_fee;
            config.currency = currency;
        })
    }

    fn set_membership_fee(&self, ctx: &CallContext, seller: ProfileId, fee: u64) -> Result<()> {
        self.update_config(ctx, seller, |config| config.membership_fee = fee)
    }

    fn set_evangelist_fee(&self, ctx: &CallContext, seller: ProfileId, fee: u64) -> Result<()> {
        self.update_config(ctx, seller, |config| config.evangelist_fee = fee)
    }

    fn subscribe(
        &self,
        ctx: &CallContext,
        seller: ProfileId,
        subscriber: &Pubkey,
        tier: SubscriptionTier,
    ) -> Result<()> {
        let config = self.config(seller)?;
        let key = (seller, *subscriber);
        let _token = self.guard.enter(key)?;

        let held = self
            .state
            .borrow()
            .subscribers
            .get(&key)
            .map_or(SubscriptionTier::Follower, Subscriber::tier);
        if tier < held {
            return Err(CommerceError::AlreadySubscribed);
        }

        let amount = tier.fee(&config);
        if tier > SubscriptionTier::Follower {
            self.engine
                .collect_direct(&config.currency, subscriber, &config.controller, amount)
                .map_err(|err| {
                    warn!(%seller, %subscriber, error = %err, "Membership fee transfer failed");
                    CommerceError::InsufficientAllowance
                })?;

            // Registry write strictly after the transfer succeeded.
            let mut state = self.state.borrow_mut();
            let entry = state.subscribers.get_or_insert_with(key, || Subscriber {
                is_member: false,
                is_evangelist: false,
                subscribed_at: ctx.timestamp,
            });
            entry.is_member = true;
            entry.is_evangelist |= tier == SubscriptionTier::Evangelist;
        }

        info!(%seller, %subscriber, ?tier, amount, "Subscribed");
        self.events.emit(CommerceEvent::Subscribed {
            seller,
            subscriber: *subscriber,
            tier,
            amount,
        });
        Ok(())
    }

    fn is_member(&self, seller: ProfileId, account: &Pubkey) -> bool {
        self.subscriber(seller, account)
            .is_some_and(|entry| entry.is_member)
    }

    fn is_evangelist(&self, seller: ProfileId, account: &Pubkey) -> bool {
        self.subscriber(seller, account)
            .is_some_and(|entry| entry.is_evangelist)
    }

    fn subscriber(&self, seller: ProfileId, account: &Pubkey) -> Option<Subscriber> {
        self.state
            .borrow()
            .subscribers
            .get(&(seller, *account))
            .copied()
    }

    fn get_profile_data(&self, seller: ProfileId) -> MembershipConfig {
        self.config(seller).unwrap_or_default()
    }
}
