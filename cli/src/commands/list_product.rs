//! List product command implementation

use anyhow::Result;
use storefront_protocol::ListingKey;
use tracing::info;

use super::create_seller_profile::{self, Storefront};
use super::ScenarioOptions;
use crate::config::StorefrontCliConfig;
use crate::session::Session;
use crate::utils::formatting::ScenarioReport;

/// Publication id the demo listing is posted under
pub const DEMO_PUBLICATION: u64 = 1;

/// A published, configured listing on a storefront
#[derive(Debug, Clone, Copy)]
pub struct ListedProduct {
    pub storefront: Storefront,
    pub listing: ListingKey,
}

/// Open the storefront and publish the demo listing with the requested terms
///
/// # Errors
/// Returns error if publishing or configuring the listing fails
pub fn setup(
    session: &mut Session,
    options: &ScenarioOptions,
    config: &StorefrontCliConfig,
    report: &mut ScenarioReport,
) -> Result<ListedProduct> {
    let storefront = create_seller_profile::setup(session, options, config, report)?;
    let terms = options.terms;

    let listing = session.publish_listing(
        &storefront.owner,
        storefront.profile,
        DEMO_PUBLICATION,
        &terms,
    )?;
    report.step(format!(
        "Published listing {listing} priced at {}",
        config.format_amount(terms.price)
    ));

    let general = terms
        .general_discount
        .map_or_else(|| "disabled".to_string(), |pct| format!("{pct}%"));
    report.step(format!(
        "Configured general discount {general}, member discount {}%, referral fee {}%",
        terms.member_discount, terms.referral_fee
    ));

    Ok(ListedProduct {
        storefront,
        listing,
    })
}

/// Execute the list product scenario
///
/// # Errors
/// Returns error if any protocol call in the scenario fails
pub fn execute(
    session: &mut Session,
    options: &ScenarioOptions,
    config: &StorefrontCliConfig,
) -> Result<ScenarioReport> {
    info!("Starting list-product scenario");
    let mut report = ScenarioReport::new("list-product");

    let product = setup(session, options, config, &mut report)?;
    let data = session.hub().get_product_data(product.listing);

    report.observe("Listing", product.listing);
    report.observe("Base price", config.format_amount(data.base_price));
    report.observe("General discount enabled", data.general_discount_enabled);
    report.observe("General discount %", data.general_discount_pct);
    report.observe("Member discount %", data.member_discount_pct);
    report.observe("Referral fee %", data.referral_fee_pct);
    report.events = session.event_count();
    Ok(report)
}
