//! Buy product command implementation

use anyhow::Result;
use tracing::info;

use super::{list_product, BalanceSnapshot, ScenarioOptions};
use crate::config::StorefrontCliConfig;
use crate::session::Session;
use crate::utils::formatting::ScenarioReport;

/// Execute the buy product scenario
///
/// A non-member buyer is funded with exactly the list price, approves the
/// purchase module and buys the listing with no referrer and no platform.
///
/// # Errors
/// Returns error if any protocol call in the scenario fails
pub fn execute(
    session: &mut Session,
    options: &ScenarioOptions,
    config: &StorefrontCliConfig,
) -> Result<ScenarioReport> {
    info!("Starting buy-product scenario");
    let mut report = ScenarioReport::new("buy-product");
    let product = list_product::setup(session, options, config, &mut report)?;
    let price = options.terms.price;

    let buyer = session.account("buyer");
    session.mint(&buyer, price)?;
    report.step(format!("Minted {} to buyer", config.format_amount(price)));

    let seller = BalanceSnapshot::take(session, "seller");
    let buyer_balance = BalanceSnapshot::take(session, "buyer");

    session.approve(&buyer, &session.purchase_account(), price);
    report.step("Buyer approved the purchase module");

    let receipt = session.buy(&buyer, product.listing, None)?;
    report.step(format!(
        "Buyer purchased listing {} for {}",
        product.listing,
        config.format_amount(receipt.effective_price)
    ));

    report.observe("Effective price", config.format_amount(receipt.effective_price));
    report.observe("Seller proceeds", config.format_amount(receipt.seller_proceeds));
    report.observe("Referral fee", config.format_amount(receipt.referral_fee));
    report.observe("Is buyer", session.hub().is_buyer(product.listing, &buyer));

    seller.record(session, &mut report);
    buyer_balance.record(session, &mut report);
    report.events = session.event_count();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_member_gets_general_discount() {
        let mut session = Session::new();
        let config = StorefrontCliConfig::default();

        let report = execute(&mut session, &ScenarioOptions::default(), &config).unwrap();

        assert_eq!(report.observation("Effective price"), Some("9000"));
        assert_eq!(report.observation("Referral fee"), Some("0"));
        assert_eq!(report.observation("Is buyer"), Some("true"));
        assert_eq!(report.balance_of("seller").map(|b| b.after), Some(9_000));
        assert_eq!(report.balance_of("buyer").map(|b| b.after), Some(1_000));
    }

    #[test]
    fn test_full_price_without_discounts() {
        let mut session = Session::new();
        let config = StorefrontCliConfig::default();
        let mut options = ScenarioOptions::default();
        options.terms.general_discount = None;

        let report = execute(&mut session, &options, &config).unwrap();

        assert_eq!(report.observation("Seller proceeds"), Some("10000"));
        assert_eq!(report.balance_of("buyer").map(|b| b.after), Some(0));
    }
}
