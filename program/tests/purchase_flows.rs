//! Integration tests for the purchase settlement flow
//!
//! Test coverage:
//! - Full price purchase with no discount and no referrer
//! - Member discount plus referral fee held in escrow
//! - General discount for non-members
//! - Member discount precedence over the general discount
//! - Ineligible referrers earn nothing
//! - Buyer registry monotonicity across repeat purchases
//! - Failed payments leave balances, registries and events untouched

mod common;

use anchor_lang::prelude::Pubkey;
use common::{World, LISTING_PRICE, MEMBERSHIP_FEE, NOW};
use storefront_protocol::codec::PurchaseData;
use storefront_protocol::{CommerceError, CommerceEvent, ProfileId, PurchaseModule, SubscriptionTier};

/// Flow A: no referrer, no discount
#[test]
fn test_full_price_purchase_pays_seller_everything() {
    let world = World::new();
    let buyer = world.funded_account(LISTING_PRICE);

    let receipt = world.buy(&buyer, None).unwrap();

    assert_eq!(receipt.effective_price, 10_000);
    assert_eq!(receipt.seller_proceeds, 10_000);
    assert_eq!(receipt.referral_fee, 0);
    assert_eq!(receipt.referrer, None);
    assert!(receipt.first_purchase);
    assert_eq!(receipt.purchased_at, NOW);
    assert_eq!(world.balance(&world.seller), 10_000, "Seller receives the full price");
    assert_eq!(world.balance(&buyer), 0, "Buyer pays the full price");
    assert_eq!(world.escrow_balance(), 0, "Nothing is held without a referrer");
}

/// Flow B: member buyer with an eligible referrer
#[test]
fn test_member_purchase_with_referrer_accrues_fee_on_discounted_price() {
    let world = World::new();
    world.set_member_discount(10);
    world.set_referral_fee(1);

    let buyer = world.funded_account(MEMBERSHIP_FEE + LISTING_PRICE);
    world.subscribe(&buyer, SubscriptionTier::Member).unwrap();
    let (referrer_owner, referrer) = world.referrer_profile();
    world.endorse(&referrer_owner, referrer).unwrap();

    let seller_before = world.balance(&world.seller);
    let receipt = world.buy(&buyer, Some(referrer)).unwrap();

    assert_eq!(receipt.discount_pct, 10);
    assert_eq!(receipt.effective_price, 9_000);
    assert_eq!(receipt.referral_fee, 90, "Fee is a cut of the discounted price");
    assert_eq!(receipt.seller_proceeds, 8_910);
    assert_eq!(receipt.referrer, Some(referrer));
    assert_eq!(world.balance(&world.seller) - seller_before, 8_910);
    assert_eq!(world.escrow_balance(), 90, "Referral fee is held, not paid out");
    assert_eq!(world.hub.referral_balance(world.listing, referrer), 90);
    assert_eq!(world.balance(&referrer_owner), 0);
}

/// Flow C: general discount only, non-member, no referrer
#[test]
fn test_general_discount_applies_to_non_members() {
    let world = World::new();
    world.enable_general_discount(10);
    let buyer = world.funded_account(LISTING_PRICE);

    let receipt = world.buy(&buyer, None).unwrap();

    assert_eq!(receipt.effective_price, 9_000);
    assert_eq!(receipt.seller_proceeds, 9_000);
    assert_eq!(receipt.referral_fee, 0);
    assert_eq!(world.balance(&buyer), 1_000);
    assert_eq!(world.escrow_balance(), 0, "No referral fee recorded anywhere");
}

#[test]
fn test_general_discount_ignored_while_disabled() {
    let world = World::new();
    world
        .purchase
        .set_general_discount_pct(&world.seller_ctx(), world.listing, 50)
        .unwrap();
    let buyer = world.funded_account(LISTING_PRICE);

    let receipt = world.buy(&buyer, None).unwrap();
    assert_eq!(receipt.effective_price, LISTING_PRICE);
}

/// Member discount wins over the general discount and the two never stack
#[test]
fn test_member_discount_takes_precedence() {
    let world = World::new();
    world.enable_general_discount(30);
    world.set_member_discount(10);

    let member = world.funded_account(MEMBERSHIP_FEE + LISTING_PRICE);
    world.subscribe(&member, SubscriptionTier::Member).unwrap();
    let outsider = world.funded_account(LISTING_PRICE);

    assert_eq!(world.buy(&member, None).unwrap().effective_price, 9_000);
    assert_eq!(world.buy(&outsider, None).unwrap().effective_price, 7_000);
}

#[test]
fn test_follower_gets_no_member_discount() {
    let world = World::new();
    world.set_member_discount(10);
    let buyer = world.funded_account(LISTING_PRICE);
    world.subscribe(&buyer, SubscriptionTier::Follower).unwrap();

    assert_eq!(world.buy(&buyer, None).unwrap().effective_price, LISTING_PRICE);
}

/// A referrer that never endorsed the listing earns nothing
#[test]
fn test_unendorsed_referrer_earns_nothing() {
    let world = World::new();
    world.set_referral_fee(5);
    let (_, referrer) = world.referrer_profile();
    let buyer = world.funded_account(LISTING_PRICE);

    let receipt = world.buy(&buyer, Some(referrer)).unwrap();

    assert_eq!(receipt.referral_fee, 0);
    assert_eq!(receipt.referrer, None);
    assert_eq!(receipt.seller_proceeds, LISTING_PRICE);
    assert_eq!(world.hub.referral_balance(world.listing, referrer), 0);
}

#[test]
fn test_seller_proceeds_plus_fee_equals_effective_price() {
    for (discount, fee) in [(0_u8, 0_u8), (10, 1), (17, 33), (99, 100), (100, 50)] {
        let world = World::new();
        world.set_member_discount(discount);
        world.set_referral_fee(fee);
        let buyer = world.funded_account(MEMBERSHIP_FEE + LISTING_PRICE);
        world.subscribe(&buyer, SubscriptionTier::Member).unwrap();
        let (owner, referrer) = world.referrer_profile();
        world.endorse(&owner, referrer).unwrap();

        let receipt = world.buy(&buyer, Some(referrer)).unwrap();

        assert_eq!(
            receipt.seller_proceeds + receipt.referral_fee,
            receipt.effective_price,
            "discount={discount} fee={fee}"
        );
        assert!(receipt.effective_price <= receipt.base_price);
    }
}

/// `isBuyer` stays true across repeat purchases
#[test]
fn test_is_buyer_is_monotonic() {
    let world = World::new();
    let buyer = world.funded_account(LISTING_PRICE * 3);
    assert!(!world.hub.is_buyer(world.listing, &buyer));

    assert!(world.buy(&buyer, None).unwrap().first_purchase);
    assert!(world.hub.is_buyer(world.listing, &buyer));

    for _ in 0..2 {
        let receipt = world.buy(&buyer, None).unwrap();
        assert!(!receipt.first_purchase, "Repeat purchase is not a first purchase");
        assert!(world.hub.is_buyer(world.listing, &buyer));
    }
    assert_eq!(world.balance(&world.seller), LISTING_PRICE * 3);
}

/// Insufficient allowance aborts with no visible effect
#[test]
fn test_payment_failure_has_no_partial_effects() {
    let world = World::new();
    world.set_referral_fee(10);
    let (owner, referrer) = world.referrer_profile();
    world.endorse(&owner, referrer).unwrap();

    let buyer = Pubkey::new_unique();
    world.fund(&buyer, LISTING_PRICE);
    world.approve_purchase(&buyer, LISTING_PRICE - 1);
    let events_before = world.events.len();

    let err = world.buy(&buyer, Some(referrer)).unwrap_err();

    assert_eq!(err, CommerceError::PaymentFailed);
    assert_eq!(world.balance(&buyer), LISTING_PRICE);
    assert_eq!(world.balance(&world.seller), 0);
    assert_eq!(world.escrow_balance(), 0);
    assert!(!world.hub.is_buyer(world.listing, &buyer));
    assert_eq!(world.hub.referral_balance(world.listing, referrer), 0);
    assert_eq!(world.events.len(), events_before, "Aborted purchase emits nothing");
}

#[test]
fn test_payment_failure_on_insufficient_balance() {
    let world = World::new();
    let buyer = Pubkey::new_unique();
    world.fund(&buyer, LISTING_PRICE / 2);
    world.approve_purchase(&buyer, LISTING_PRICE);

    assert_eq!(world.buy(&buyer, None), Err(CommerceError::PaymentFailed));
    assert_eq!(world.balance(&buyer), LISTING_PRICE / 2);
}

#[test]
fn test_purchase_unknown_listing_fails() {
    let world = World::new();
    let buyer = world.funded_account(LISTING_PRICE);
    let mut missing = world.listing;
    missing.listing.0 += 1;

    let err = world
        .hub
        .process_purchase(
            &world.ctx(buyer),
            missing,
            &buyer,
            &PurchaseData::new(None, None).encode(),
        )
        .unwrap_err();
    assert_eq!(err, CommerceError::UnknownListing(missing));
}

#[test]
fn test_platform_account_is_recorded_only() {
    let world = World::new();
    world.set_referral_fee(5);
    let platform = Pubkey::new_unique();
    let buyer = world.funded_account(LISTING_PRICE);

    let receipt = world
        .hub
        .process_purchase(
            &world.ctx(buyer),
            world.listing,
            &buyer,
            &PurchaseData::new(Some(&platform), None).encode(),
        )
        .unwrap();

    assert_eq!(receipt.platform, Some(platform));
    assert_eq!(world.balance(&platform), 0, "Platform takes no cut");
    assert_eq!(receipt.seller_proceeds, LISTING_PRICE);
    assert!(matches!(
        world.events.last(),
        Some(CommerceEvent::ProductPurchased { platform: Some(p), .. }) if p == platform
    ));
}

#[test]
fn test_malformed_purchase_payload_is_rejected() {
    let world = World::new();
    let buyer = world.funded_account(LISTING_PRICE);

    let err = world
        .hub
        .process_purchase(&world.ctx(buyer), world.listing, &buyer, &[1, 2, 3])
        .unwrap_err();
    assert!(matches!(err, CommerceError::InvalidModuleData(_)));
    assert_eq!(world.balance(&buyer), LISTING_PRICE);
}

#[test]
fn test_zero_price_listing_settles_without_transfers() {
    let world = World::new();
    world.set_member_discount(100);
    let buyer = world.funded_account(MEMBERSHIP_FEE);
    world.subscribe(&buyer, SubscriptionTier::Member).unwrap();

    let receipt = world.buy(&buyer, Some(ProfileId(99))).unwrap();
    assert_eq!(receipt.effective_price, 0);
    assert!(world.hub.is_buyer(world.listing, &buyer));
}
