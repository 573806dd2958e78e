//! Settlement engine
//!
//! Pure discount and fee arithmetic plus the transfer orchestration shared by
//! the membership and purchase modules. The engine keeps no registries; each
//! module owns one engine bound to the module's own account, which acts as
//! the approved spender and as the escrow for held referral fees.

use std::rc::Rc;

use anchor_lang::prelude::Pubkey;
use tracing::{debug, error, warn};

use crate::constants::{MAX_PERCENT, PERCENT_DIVISOR};
use crate::errors::{CommerceError, Result};
use crate::ledger::{LedgerError, TokenLedger};
use crate::state::Listing;

/// Price breakdown for one purchase
///
/// Invariants: `effective_price <= base_price` and
/// `seller_proceeds + referral_fee == effective_price`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceQuote {
    pub base_price: u64,
    /// Discount applied, whole percent (0 when none applied)
    pub discount_pct: u8,
    pub effective_price: u64,
    pub referral_fee: u64,
    pub seller_proceeds: u64,
}

/// Reject rates outside `0..=100`
pub fn validate_percentage(pct: u8) -> Result<u8> {
    if pct > MAX_PERCENT {
        return Err(CommerceError::InvalidPercentage(pct));
    }
    Ok(pct)
}

/// `amount * pct / 100` with floor division
pub fn percent_of(amount: u64, pct: u8) -> Result<u64> {
    let pct = validate_percentage(pct)?;
    u64::try_from(
        u128::from(amount)
            .checked_mul(u128::from(pct))
            .ok_or(CommerceError::ArithmeticError)?
            .checked_div(PERCENT_DIVISOR)
            .ok_or(CommerceError::ArithmeticError)?,
    )
    .map_err(|_| CommerceError::ArithmeticError)
}

/// `base - base * pct / 100`; the floored cut is removed, no remainder is redistributed
pub fn apply_discount(base_price: u64, pct: u8) -> Result<u64> {
    let cut = percent_of(base_price, pct)?;
    base_price
        .checked_sub(cut)
        .ok_or(CommerceError::ArithmeticError)
}

/// Discount rate a buyer qualifies for
///
/// Member discount wins when the buyer is a member; otherwise the general
/// discount applies only while enabled. The two never stack.
#[must_use]
pub const fn applicable_discount(listing: &Listing, buyer_is_member: bool) -> u8 {
    if buyer_is_member {
        listing.member_discount_pct
    } else if listing.general_discount_enabled {
        listing.general_discount_pct
    } else {
        0
    }
}

/// Compute the full price breakdown for a purchase
///
/// The referral fee is a cut of the discounted price the buyer actually pays.
pub fn quote(listing: &Listing, buyer_is_member: bool, referral_eligible: bool) -> Result<PriceQuote> {
    let discount_pct = applicable_discount(listing, buyer_is_member);
    let effective_price = apply_discount(listing.base_price, discount_pct)?;

    let referral_fee = if referral_eligible {
        percent_of(effective_price, listing.referral_fee_pct)?
    } else {
        0
    };

    let seller_proceeds = effective_price
        .checked_sub(referral_fee)
        .ok_or(CommerceError::ArithmeticError)?;

    let quote = PriceQuote {
        base_price: listing.base_price,
        discount_pct,
        effective_price,
        referral_fee,
        seller_proceeds,
    };
    debug!(?quote, buyer_is_member, referral_eligible, "Computed price quote");
    Ok(quote)
}

/// Transfer orchestration against the injected ledger
pub struct SettlementEngine {
    ledger: Rc<dyn TokenLedger>,
    escrow: Pubkey,
}

impl std::fmt::Debug for SettlementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementEngine")
            .field("escrow", &self.escrow)
            .finish_non_exhaustive()
    }
}

impl SettlementEngine {
    /// Bind an engine to the module account `escrow`
    ///
    /// Payers approve `escrow` as spender; held fees sit in its balance.
    pub fn new(ledger: Rc<dyn TokenLedger>, escrow: Pubkey) -> Self {
        Self { ledger, escrow }
    }

    #[must_use]
    pub const fn escrow(&self) -> &Pubkey {
        &self.escrow
    }

    pub fn ledger(&self) -> &dyn TokenLedger {
        self.ledger.as_ref()
    }

    /// Pull `amount` straight from `payer` to `payee`
    pub fn collect_direct(
        &self,
        currency: &Pubkey,
        payer: &Pubkey,
        payee: &Pubkey,
        amount: u64,
    ) -> std::result::Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        self.ledger
            .transfer_from(currency, &self.escrow, payer, payee, amount)
    }

    /// Settle a quoted purchase
    ///
    /// Pulls `seller_proceeds` from the buyer straight to the seller, then
    /// `referral_fee` from the buyer into escrow, where it waits for the
    /// referrer to withdraw it. Balance, allowance and both credits are
    /// checked before either leg runs, and the seller leg goes first, so a
    /// rejected purchase moves nothing and spends no allowance.
    pub fn settle_purchase(
        &self,
        currency: &Pubkey,
        buyer: &Pubkey,
        seller: &Pubkey,
        quote: &PriceQuote,
    ) -> Result<()> {
        if quote.effective_price == 0 {
            return Ok(());
        }
        self.check_purchase(currency, buyer, seller, quote)
            .map_err(|err| {
                warn!(%buyer, error = %err, "Purchase rejected before settlement");
                CommerceError::PaymentFailed
            })?;

        if quote.seller_proceeds > 0 {
            self.ledger
                .transfer_from(currency, &self.escrow, buyer, seller, quote.seller_proceeds)
                .map_err(|err| {
                    warn!(%seller, error = %err, "Seller leg rejected");
                    CommerceError::PaymentFailed
                })?;
        }

        if quote.referral_fee > 0 {
            // Escrow credit was checked above; failing here means the ledger
            // changed under us after the seller was already paid.
            if let Err(err) = self.ledger.transfer_from(
                currency,
                &self.escrow,
                buyer,
                &self.escrow,
                quote.referral_fee,
            ) {
                error!(
                    %buyer,
                    %seller,
                    paid = quote.seller_proceeds,
                    error = %err,
                    "Referral fee leg failed after seller was paid"
                );
                return Err(CommerceError::SettlementIncomplete(quote.seller_proceeds));
            }
        }

        Ok(())
    }

    /// Everything the two purchase legs need, read from the ledger up front
    fn check_purchase(
        &self,
        currency: &Pubkey,
        buyer: &Pubkey,
        seller: &Pubkey,
        quote: &PriceQuote,
    ) -> std::result::Result<(), LedgerError> {
        let available = self.ledger.balance_of(currency, buyer);
        if available < quote.effective_price {
            return Err(LedgerError::InsufficientBalance {
                required: quote.effective_price,
                available,
            });
        }

        let approved = self.ledger.allowance(currency, buyer, &self.escrow);
        if approved < quote.effective_price {
            return Err(LedgerError::InsufficientAllowance {
                required: quote.effective_price,
                approved,
            });
        }

        for (account, amount) in [(seller, quote.seller_proceeds), (&self.escrow, quote.referral_fee)] {
            if account != buyer {
                self.ledger
                    .balance_of(currency, account)
                    .checked_add(amount)
                    .ok_or(LedgerError::Overflow { account: *account })?;
            }
        }
        Ok(())
    }

    /// Pay `amount` held in escrow out to `to`
    pub fn release(
        &self,
        currency: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> std::result::Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        self.ledger.transfer(currency, &self.escrow, to, amount)
    }
}
