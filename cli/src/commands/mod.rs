//! Command implementations for the storefront CLI
//!
//! Each command replays one demo scenario against a fresh in-memory session.
//! Later scenarios build on the setup of earlier ones, the same way the demo
//! tasks run in sequence.

pub mod buy_product;
pub mod create_seller_profile;
pub mod list_product;
pub mod refer_member_buy_product;

use anchor_lang::prelude::Pubkey;

use crate::session::{ListingTerms, Session};
use crate::utils::formatting::ScenarioReport;

// Re-export command execution functions for easy access
pub use buy_product::execute as execute_buy_product;
pub use create_seller_profile::execute as execute_create_seller_profile;
pub use list_product::execute as execute_list_product;
pub use refer_member_buy_product::execute as execute_refer_member_buy_product;

/// Storefront and listing parameters shared by every scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioOptions {
    pub membership_fee: u64,
    pub evangelist_fee: u64,
    pub terms: ListingTerms,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            membership_fee: 10_000,
            evangelist_fee: 1_000,
            terms: ListingTerms {
                price: 10_000,
                general_discount: Some(10),
                member_discount: 10,
                referral_fee: 1,
            },
        }
    }
}

/// Snapshot of a named account's balance taken before a scenario moves value
#[derive(Debug, Clone)]
pub(crate) struct BalanceSnapshot {
    name: String,
    account: Pubkey,
    before: u64,
}

impl BalanceSnapshot {
    pub(crate) fn take(session: &mut Session, name: &str) -> Self {
        let account = session.account(name);
        Self {
            name: name.to_string(),
            before: session.balance(&account),
            account,
        }
    }

    pub(crate) fn record(&self, session: &Session, report: &mut ScenarioReport) {
        report.balance(
            &self.name,
            self.account.to_string(),
            self.before,
            session.balance(&self.account),
        );
    }
}
