//! Create seller profile command implementation

use anchor_lang::prelude::Pubkey;
use anyhow::Result;
use storefront_protocol::ProfileId;
use tracing::info;

use super::ScenarioOptions;
use crate::config::StorefrontCliConfig;
use crate::session::Session;
use crate::utils::formatting::ScenarioReport;

/// A seller profile with the membership module attached
#[derive(Debug, Clone, Copy)]
pub struct Storefront {
    pub owner: Pubkey,
    pub profile: ProfileId,
}

/// Create the "seller" profile and open its membership storefront
///
/// # Errors
/// Returns error if the membership module rejects initialization or fee updates
pub fn setup(
    session: &mut Session,
    options: &ScenarioOptions,
    config: &StorefrontCliConfig,
    report: &mut ScenarioReport,
) -> Result<Storefront> {
    let owner = session.account("seller");
    let profile = session.create_profile(&owner);
    report.step(format!("Created seller profile {profile} owned by {owner}"));

    session.open_storefront(&owner, profile, options.membership_fee, options.evangelist_fee)?;
    report.step(format!(
        "Attached membership module (membership fee {}, evangelist fee {})",
        config.format_amount(options.membership_fee),
        config.format_amount(options.evangelist_fee)
    ));

    Ok(Storefront { owner, profile })
}

/// Execute the create seller profile scenario
///
/// # Errors
/// Returns error if any protocol call in the scenario fails
pub fn execute(
    session: &mut Session,
    options: &ScenarioOptions,
    config: &StorefrontCliConfig,
) -> Result<ScenarioReport> {
    info!("Starting create-seller-profile scenario");
    let mut report = ScenarioReport::new("create-seller-profile");

    let storefront = setup(session, options, config, &mut report)?;
    let data = session.hub().get_profile_data(storefront.profile);

    report.observe("Seller profile", storefront.profile);
    report.observe("Controller", data.controller);
    report.observe("Currency", data.currency);
    report.observe("Membership fee", config.format_amount(data.membership_fee));
    report.observe("Evangelist fee", config.format_amount(data.evangelist_fee));
    report.events = session.event_count();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storefront_reports_configured_fees() {
        let mut session = Session::new();
        let config = StorefrontCliConfig::default();

        let report = execute(&mut session, &ScenarioOptions::default(), &config).unwrap();

        assert_eq!(report.observation("Seller profile"), Some("1"));
        assert_eq!(report.observation("Membership fee"), Some("10000"));
        assert_eq!(report.observation("Evangelist fee"), Some("1000"));
        // Initialized plus two fee updates
        assert_eq!(report.events, 3);
    }
}
