//! Protocol constants
//!
//! Percentages and tier codes shared by the membership, referral and purchase
//! modules. These values are part of the boundary contract with the host
//! protocol and must not change once listings exist.

/// Divisor for whole-percent calculations
///
/// All discount and referral rates are whole percentages in `0..=100`, so a
/// cut of an amount is `amount * pct / PERCENT_DIVISOR` with floor division.
///
/// # Examples
/// ```ignore
/// // 10% of 10_000:
/// let cut = (10_000_u128 * 10) / PERCENT_DIVISOR;
/// // cut = 1_000
/// ```
pub const PERCENT_DIVISOR: u128 = 100;

/// Largest accepted percentage value for any rate field
pub const MAX_PERCENT: u8 = 100;

/// Subscribe payload tier code for a plain follow (no membership, no charge)
pub const TIER_FOLLOWER: u64 = 0;

/// Subscribe payload tier code for a paid membership
pub const TIER_MEMBER: u64 = 1;

/// Subscribe payload tier code for an evangelist membership
pub const TIER_EVANGELIST: u64 = 2;

/// Profile id value the host uses to say "no referrer" in purchase payloads
pub const NO_REFERRER: u64 = 0;
