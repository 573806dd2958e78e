//! Storefront CLI - Command-line interface for the storefront commerce modules
//!
//! Replays the storefront demo flows (seller profile, product listing, plain
//! purchase, referred member purchase) against an in-memory protocol session
//! and reports balances and registry state.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use storefront_cli::commands::{self, ScenarioOptions};
use storefront_cli::session::{ListingTerms, Session};
use storefront_cli::utils::formatting::{format_report_human, format_report_json, ScenarioReport};
use storefront_cli::StorefrontCliConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "storefront-cli",
    version,
    about = "Command-line interface for the storefront commerce modules"
)]
struct Cli {
    /// Output format
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,

    /// Divisor for displaying currency amounts, a power of ten (e.g. 100 for two decimals)
    #[arg(long)]
    decimals_divisor: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

/// Storefront fees and listing terms used by every scenario
#[derive(Args, Debug, Clone)]
struct ScenarioArgs {
    /// Membership fee in currency base units
    #[arg(long, default_value = "10000")]
    membership_fee: u64,

    /// Evangelist fee in currency base units
    #[arg(long, default_value = "1000")]
    evangelist_fee: u64,

    /// Listing price in currency base units
    #[arg(long, default_value = "10000")]
    price: u64,

    /// General discount percentage for non-members
    #[arg(long, default_value = "10")]
    general_discount: u8,

    /// Leave the general discount disabled
    #[arg(long)]
    no_general_discount: bool,

    /// Member discount percentage
    #[arg(long, default_value = "10")]
    member_discount: u8,

    /// Referral fee percentage of the discounted price
    #[arg(long, default_value = "1")]
    referral_fee: u8,
}

impl ScenarioArgs {
    fn options(&self) -> ScenarioOptions {
        ScenarioOptions {
            membership_fee: self.membership_fee,
            evangelist_fee: self.evangelist_fee,
            terms: ListingTerms {
                price: self.price,
                general_discount: (!self.no_general_discount).then_some(self.general_discount),
                member_discount: self.member_discount,
                referral_fee: self.referral_fee,
            },
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a seller profile with the membership module and set its fees
    CreateSellerProfile {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },

    /// Publish a product listing and configure its discounts and referral fee
    ListProduct {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },

    /// Buy the listed product as a non-member with no referrer
    BuyProduct {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },

    /// Refer the product, subscribe as a member, buy through the referrer and withdraw the fee
    ReferMemberBuyProduct {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = StorefrontCliConfig::new();
    if let Some(divisor) = cli.decimals_divisor {
        if !StorefrontCliConfig::is_valid_divisor(divisor) {
            return Err(anyhow::anyhow!(
                "Invalid decimals divisor: {divisor}. Use a power of ten (1, 10, 100, ...)"
            ));
        }
        config.currency_decimals_divisor = divisor;
    }

    // Use configuration with CLI overrides
    let default_output_format = parse_output_format(&config.default_output_format)?;
    let output_format = cli.output.as_ref().unwrap_or(&default_output_format);

    let result = execute_command(&cli, &config);

    // Handle output formatting
    match result {
        Ok(report) => match output_format {
            OutputFormat::Human => println!("{}", format_report_human(&report, &config)),
            OutputFormat::Json => {
                let json_output = serde_json::json!({
                    "success": true,
                    "data": format_report_json(&report)?
                });
                println!("{}", serde_json::to_string_pretty(&json_output)?);
            }
        },
        Err(e) => {
            match output_format {
                OutputFormat::Human => eprintln!("Error: {e}"),
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "success": false,
                        "error": e.to_string()
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Parse output format from string
fn parse_output_format(format_str: &str) -> Result<OutputFormat> {
    match format_str.to_lowercase().as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        _ => Err(anyhow::anyhow!("Invalid output format: {}", format_str)),
    }
}

fn execute_command(cli: &Cli, config: &StorefrontCliConfig) -> Result<ScenarioReport> {
    let mut session = Session::new();

    match &cli.command {
        Commands::CreateSellerProfile { scenario } => {
            commands::execute_create_seller_profile(&mut session, &scenario.options(), config)
        }

        Commands::ListProduct { scenario } => {
            commands::execute_list_product(&mut session, &scenario.options(), config)
        }

        Commands::BuyProduct { scenario } => {
            commands::execute_buy_product(&mut session, &scenario.options(), config)
        }

        Commands::ReferMemberBuyProduct { scenario } => {
            commands::execute_refer_member_buy_product(&mut session, &scenario.options(), config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(args: &[&str]) -> ListingTerms {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::BuyProduct { scenario } => scenario.options().terms,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_general_discount_defaults_to_ten_percent() {
        assert_eq!(terms(&["storefront-cli", "buy-product"]).general_discount, Some(10));
    }

    #[test]
    fn test_general_discount_flags() {
        let custom = terms(&["storefront-cli", "buy-product", "--general-discount", "25"]);
        assert_eq!(custom.general_discount, Some(25));

        let disabled = terms(&["storefront-cli", "buy-product", "--no-general-discount"]);
        assert_eq!(disabled.general_discount, None);
    }
}
