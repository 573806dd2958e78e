//! Referral module
//!
//! Mirror-style endorsements make the endorsing profile an eligible referrer
//! for that one listing. Eligibility is monotonic and the module never moves
//! value; the purchase module asks it whether a supplied referrer qualifies
//! for the referral fee split.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use crate::errors::{CommerceError, Result};
use crate::events::{CommerceEvent, EventLog};
use crate::identity::ProfileDirectory;
use crate::registry::Interner;
use crate::state::{CallContext, ListingKey, ProfileId};

/// Capability interface of a reference (endorsement) module
pub trait ReferralModule {
    /// Attach the module to a freshly published listing
    fn initialize(&self, ctx: &CallContext, listing: ListingKey) -> Result<()>;

    /// Record that `referrer` endorsed `listing`
    ///
    /// Returns `true` when the referrer became eligible with this call and
    /// `false` when it already was (a repeat endorsement is not an error).
    fn record_endorsement(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        referrer: ProfileId,
    ) -> Result<bool>;

    fn is_referrer(&self, listing: ListingKey, referrer: ProfileId) -> bool;

    /// Whether `listing` was already attached to this module
    fn has_listing(&self, listing: ListingKey) -> bool;
}

#[derive(Debug, Default)]
struct ReferralState {
    listings: Interner<ListingKey>,
    eligible: Interner<(ListingKey, ProfileId)>,
}

/// Referral module backed by in-process registries
#[derive(Debug)]
pub struct EndorsementReferral {
    directory: Rc<dyn ProfileDirectory>,
    events: EventLog,
    state: RefCell<ReferralState>,
}

impl EndorsementReferral {
    pub fn new(directory: Rc<dyn ProfileDirectory>, events: EventLog) -> Self {
        Self {
            directory,
            events,
            state: RefCell::new(ReferralState::default()),
        }
    }

    /// Number of distinct referrers recorded for `listing`
    pub fn referrer_count(&self, listing: ListingKey) -> usize {
        self.state
            .borrow()
            .eligible
            .keys()
            .filter(|(key, _)| *key == listing)
            .count()
    }
}

impl ReferralModule for EndorsementReferral {
    fn initialize(&self, _ctx: &CallContext, listing: ListingKey) -> Result<()> {
        let (_, fresh) = self.state.borrow_mut().listings.intern(listing);
        if !fresh {
            return Err(CommerceError::ListingAlreadyExists(listing));
        }
        debug!(%listing, "Referral module attached");
        Ok(())
    }

    fn record_endorsement(
        &self,
        ctx: &CallContext,
        listing: ListingKey,
        referrer: ProfileId,
    ) -> Result<bool> {
        if !self.has_listing(listing) {
            return Err(CommerceError::UnknownListing(listing));
        }
        if !self.directory.is_controller(referrer, &ctx.caller) {
            return Err(CommerceError::Unauthorized);
        }

        let (_, fresh) = self
            .state
            .borrow_mut()
            .eligible
            .intern((listing, referrer));

        if fresh {
            info!(%listing, %referrer, "Referrer endorsed listing");
            self.events
                .emit(CommerceEvent::EndorsementRecorded { listing, referrer });
        }
        Ok(fresh)
    }

    fn is_referrer(&self, listing: ListingKey, referrer: ProfileId) -> bool {
        self.state.borrow().eligible.contains(&(listing, referrer))
    }

    fn has_listing(&self, listing: ListingKey) -> bool {
        self.state.borrow().listings.contains(&listing)
    }
}
