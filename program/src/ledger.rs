//! Currency ledger capability
//!
//! The fungible-token contract is an external collaborator. Modules only see
//! the [`TokenLedger`] trait, injected into the settlement engine, and must
//! assume any call into it can fail or run arbitrary code (including calls back
//! into the modules).
//!
//! [`MemoryLedger`] is an in-memory implementation with balances and
//! allowances, used by the CLI session and the test suites.

use std::cell::RefCell;
use std::collections::HashMap;

use anchor_lang::prelude::Pubkey;
use thiserror::Error;
use tracing::debug;

/// Failures reported by the currency ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("Insufficient allowance: required {required}, approved {approved}")]
    InsufficientAllowance { required: u64, approved: u64 },

    #[error("Balance overflow for {account}")]
    Overflow { account: Pubkey },

    #[error("Account {account} is frozen")]
    Frozen { account: Pubkey },
}

/// Fungible currency interface as seen by the modules
///
/// Methods take `&self`: implementations own their interior mutability so a
/// transfer can legally re-enter a module while the module is mid-call.
pub trait TokenLedger {
    /// Balance of `owner` in `currency`
    fn balance_of(&self, currency: &Pubkey, owner: &Pubkey) -> u64;

    /// Amount `spender` may still move out of `owner`'s balance
    fn allowance(&self, currency: &Pubkey, owner: &Pubkey, spender: &Pubkey) -> u64;

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance on `from`
    fn transfer_from(
        &self,
        currency: &Pubkey,
        spender: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Move `amount` out of `from`, which is the calling module's own account
    fn transfer(
        &self,
        currency: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError>;
}

#[derive(Debug, Default)]
struct Books {
    balances: HashMap<(Pubkey, Pubkey), u64>,
    allowances: HashMap<(Pubkey, Pubkey, Pubkey), u64>,
}

impl Books {
    fn balance(&self, currency: &Pubkey, owner: &Pubkey) -> u64 {
        self.balances.get(&(*currency, *owner)).copied().unwrap_or(0)
    }

    fn allowance(&self, currency: &Pubkey, owner: &Pubkey, spender: &Pubkey) -> u64 {
        self.allowances
            .get(&(*currency, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn credit(&mut self, currency: &Pubkey, owner: &Pubkey, amount: u64) -> Result<(), LedgerError> {
        let entry = self.balances.entry((*currency, *owner)).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: *owner })?;
        Ok(())
    }

    fn move_funds(
        &mut self,
        currency: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let available = self.balance(currency, from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                required: amount,
                available,
            })?;
        // Check the credit side before touching either balance.
        if from != to {
            self.balance(currency, to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow { account: *to })?;
        }
        self.balances.insert((*currency, *from), remaining);
        self.credit(currency, to, amount)
    }
}

/// In-memory fungible token ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    books: RefCell<Books>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new units for `owner`
    pub fn mint(&self, currency: &Pubkey, owner: &Pubkey, amount: u64) -> Result<(), LedgerError> {
        self.books.borrow_mut().credit(currency, owner, amount)
    }

    /// Set `spender`'s allowance on `owner`'s funds, replacing any previous value
    pub fn approve(&self, currency: &Pubkey, owner: &Pubkey, spender: &Pubkey, amount: u64) {
        self.books
            .borrow_mut()
            .allowances
            .insert((*currency, *owner, *spender), amount);
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, currency: &Pubkey, owner: &Pubkey) -> u64 {
        self.books.borrow().balance(currency, owner)
    }

    fn allowance(&self, currency: &Pubkey, owner: &Pubkey, spender: &Pubkey) -> u64 {
        self.books.borrow().allowance(currency, owner, spender)
    }

    fn transfer_from(
        &self,
        currency: &Pubkey,
        spender: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mut books = self.books.borrow_mut();
        let approved = books.allowance(currency, from, spender);
        let left = approved
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                required: amount,
                approved,
            })?;
        books.move_funds(currency, from, to, amount)?;
        books.allowances.insert((*currency, *from, *spender), left);
        debug!(%from, %to, amount, "transfer_from");
        Ok(())
    }

    fn transfer(
        &self,
        currency: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.books
            .borrow_mut()
            .move_funds(currency, from, to, amount)?;
        debug!(%from, %to, amount, "transfer");
        Ok(())
    }
}
