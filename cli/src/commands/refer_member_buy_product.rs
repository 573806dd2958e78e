//! Refer, subscribe and buy command implementation

use anyhow::Result;
use storefront_protocol::SubscriptionTier;
use tracing::info;

use super::{list_product, BalanceSnapshot, ScenarioOptions};
use crate::config::StorefrontCliConfig;
use crate::session::Session;
use crate::utils::formatting::ScenarioReport;

/// Funds minted to the buyer, enough for the membership fee and the purchase
pub const BUYER_FUNDS: u64 = 100_000;

/// Execute the refer-member-buy-product scenario
///
/// A referrer profile endorses the listing, the buyer becomes a member and
/// buys through the referrer, then the referrer withdraws the accrued fee.
///
/// # Errors
/// Returns error if any protocol call in the scenario fails
pub fn execute(
    session: &mut Session,
    options: &ScenarioOptions,
    config: &StorefrontCliConfig,
) -> Result<ScenarioReport> {
    info!("Starting refer-member-buy-product scenario");
    let mut report = ScenarioReport::new("refer-member-buy-product");
    let product = list_product::setup(session, options, config, &mut report)?;
    let seller_profile = product.storefront.profile;

    let buyer = session.account("buyer");
    let referrer_owner = session.account("referrer");
    session.mint(&buyer, BUYER_FUNDS)?;
    report.step(format!("Minted {} to buyer", config.format_amount(BUYER_FUNDS)));

    let seller = BalanceSnapshot::take(session, "seller");
    let buyer_balance = BalanceSnapshot::take(session, "buyer");
    let referrer_balance = BalanceSnapshot::take(session, "referrer");

    let referrer = session.create_profile(&referrer_owner);
    report.step(format!("Created referrer profile {referrer}"));
    session.endorse(&referrer_owner, product.listing, referrer)?;
    report.step(format!("Referrer {referrer} mirrored listing {}", product.listing));

    session.approve(&buyer, &session.membership_account(), options.membership_fee);
    session.subscribe(&buyer, seller_profile, SubscriptionTier::Member)?;
    report.step(format!(
        "Buyer followed storefront {seller_profile} as a member for {}",
        config.format_amount(options.membership_fee)
    ));

    session.approve(&buyer, &session.purchase_account(), options.terms.price);
    let receipt = session.buy(&buyer, product.listing, Some(referrer))?;
    report.step(format!(
        "Buyer purchased listing {} through referrer {referrer} for {}",
        product.listing,
        config.format_amount(receipt.effective_price)
    ));

    let withdrawn = session.withdraw(&referrer_owner, product.listing, referrer)?;
    report.step(format!(
        "Referrer withdrew {} in referral fees",
        config.format_amount(withdrawn)
    ));

    let hub = session.hub();
    report.observe("Is referrer", hub.is_referrer(product.listing, referrer));
    report.observe("Is member", hub.is_member(seller_profile, &buyer));
    report.observe("Is buyer", hub.is_buyer(product.listing, &buyer));
    report.observe("Effective price", config.format_amount(receipt.effective_price));
    report.observe("Seller proceeds", config.format_amount(receipt.seller_proceeds));
    report.observe("Referral fee", config.format_amount(receipt.referral_fee));
    report.observe("Referral fees withdrawn", config.format_amount(withdrawn));
    report.observe(
        "Referral balance after",
        config.format_amount(hub.referral_balance(product.listing, referrer)),
    );

    seller.record(session, &mut report);
    buyer_balance.record(session, &mut report);
    referrer_balance.record(session, &mut report);
    report.events = session.event_count();
    Ok(report)
}
