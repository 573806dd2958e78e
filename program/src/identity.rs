//! Read-only view of the social graph's profile ownership
//!
//! Modules never write to the social graph; they only ask which account
//! controls a profile when authorizing seller or referrer actions.

use std::cell::RefCell;

use anchor_lang::prelude::Pubkey;

use crate::state::ProfileId;

pub trait ProfileDirectory {
    /// Account currently controlling `profile`, if the profile exists
    fn controller_of(&self, profile: ProfileId) -> Option<Pubkey>;

    fn is_controller(&self, profile: ProfileId, account: &Pubkey) -> bool {
        self.controller_of(profile).as_ref() == Some(account)
    }
}

impl std::fmt::Debug for dyn ProfileDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProfileDirectory")
    }
}

/// In-memory profile registry; ids are assigned sequentially from 1
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    owners: RefCell<Vec<Pubkey>>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new profile controlled by `owner` and return its id
    pub fn create_profile(&self, owner: Pubkey) -> ProfileId {
        let mut owners = self.owners.borrow_mut();
        owners.push(owner);
        ProfileId(owners.len() as u64)
    }

    /// Hand control of an existing profile to `owner`
    ///
    /// Returns `false` when the profile does not exist.
    pub fn transfer_profile(&self, profile: ProfileId, owner: Pubkey) -> bool {
        let Some(index) = usize::try_from(profile.0)
            .ok()
            .and_then(|id| id.checked_sub(1))
        else {
            return false;
        };
        match self.owners.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = owner;
                true
            }
            None => false,
        }
    }

    pub fn profile_count(&self) -> usize {
        self.owners.borrow().len()
    }
}

impl ProfileDirectory for MemoryDirectory {
    fn controller_of(&self, profile: ProfileId) -> Option<Pubkey> {
        let index = usize::try_from(profile.0).ok()?.checked_sub(1)?;
        self.owners.borrow().get(index).copied()
    }
}
