//! Boundary payload codec
//!
//! The host protocol hands each module an opaque byte blob per lifecycle
//! event. Blobs are borsh-encoded structs; addresses travel as 32 raw bytes
//! and the all-zero address / profile id 0 mean "not supplied".

use anchor_lang::prelude::Pubkey;
use borsh::{BorshDeserialize, BorshSerialize};

use crate::constants::NO_REFERRER;
use crate::errors::{CommerceError, Result};
use crate::state::{ProfileId, SubscriptionTier};

/// Decode a whole blob, rejecting trailing bytes
pub fn decode<T: BorshDeserialize>(data: &[u8]) -> Result<T> {
    T::try_from_slice(data).map_err(|e| CommerceError::InvalidModuleData(e.to_string()))
}

fn encode_struct<T: BorshSerialize>(value: &T) -> Vec<u8> {
    // Serializing fixed-size fields into a Vec cannot fail.
    borsh::to_vec(value).unwrap_or_default()
}

fn optional_address(bytes: [u8; 32]) -> Option<Pubkey> {
    bytes
        .iter()
        .any(|byte| *byte != 0)
        .then(|| Pubkey::new_from_array(bytes))
}

/// Payload of `initializeListing`: `(currency, price)`
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListingInitData {
    pub currency: [u8; 32],
    pub price: u64,
}

impl ListingInitData {
    #[must_use]
    pub fn new(currency: &Pubkey, price: u64) -> Self {
        Self {
            currency: currency.to_bytes(),
            price,
        }
    }

    #[must_use]
    pub const fn currency(&self) -> Pubkey {
        Pubkey::new_from_array(self.currency)
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_struct(self)
    }
}

/// Payload of `initializeMembership`: `(currency, sellerControllerAccount)`
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MembershipInitData {
    pub currency: [u8; 32],
    pub controller: [u8; 32],
}

impl MembershipInitData {
    #[must_use]
    pub fn new(currency: &Pubkey, controller: &Pubkey) -> Self {
        Self {
            currency: currency.to_bytes(),
            controller: controller.to_bytes(),
        }
    }

    #[must_use]
    pub const fn currency(&self) -> Pubkey {
        Pubkey::new_from_array(self.currency)
    }

    #[must_use]
    pub const fn controller(&self) -> Pubkey {
        Pubkey::new_from_array(self.controller)
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_struct(self)
    }
}

/// Payload of `processSubscribe`: `(tier)`
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscribeData {
    pub tier: u64,
}

impl SubscribeData {
    #[must_use]
    pub const fn new(tier: SubscriptionTier) -> Self {
        Self { tier: tier.code() }
    }

    pub fn tier(&self) -> Result<SubscriptionTier> {
        SubscriptionTier::from_code(self.tier)
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_struct(self)
    }
}

/// Payload of `processPurchase`: `(platformAccount, referrerId)`
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurchaseData {
    pub platform: [u8; 32],
    pub referrer: u64,
}

impl PurchaseData {
    #[must_use]
    pub fn new(platform: Option<&Pubkey>, referrer: Option<ProfileId>) -> Self {
        Self {
            platform: platform.map_or([0; 32], |p| p.to_bytes()),
            referrer: referrer.map_or(NO_REFERRER, |id| id.0),
        }
    }

    #[must_use]
    pub fn platform(&self) -> Option<Pubkey> {
        optional_address(self.platform)
    }

    #[must_use]
    pub const fn referrer(&self) -> Option<ProfileId> {
        if self.referrer == NO_REFERRER {
            None
        } else {
            Some(ProfileId(self.referrer))
        }
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_struct(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_payload_decodes() {
        let currency = Pubkey::new_unique();
        let bytes = ListingInitData::new(&currency, 10_000).encode();

        let decoded: ListingInitData = decode(&bytes).unwrap();
        assert_eq!(decoded.currency(), currency);
        assert_eq!(decoded.price, 10_000);
    }

    #[test]
    fn test_purchase_payload_zero_values_mean_none() {
        let bytes = PurchaseData::new(None, None).encode();
        let decoded: PurchaseData = decode(&bytes).unwrap();

        assert_eq!(decoded.platform(), None);
        assert_eq!(decoded.referrer(), None);
    }

    #[test]
    fn test_purchase_payload_carries_referrer_and_platform() {
        let platform = Pubkey::new_unique();
        let bytes = PurchaseData::new(Some(&platform), Some(ProfileId(2))).encode();
        let decoded: PurchaseData = decode(&bytes).unwrap();

        assert_eq!(decoded.platform(), Some(platform));
        assert_eq!(decoded.referrer(), Some(ProfileId(2)));
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let bytes = SubscribeData::new(SubscriptionTier::Member).encode();
        let err = decode::<SubscribeData>(&bytes[..4]).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidModuleData(_)));
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = SubscribeData::new(SubscriptionTier::Evangelist).encode();
        bytes.push(0);
        assert!(decode::<SubscribeData>(&bytes).is_err());
    }

    #[test]
    fn test_unknown_tier_code_decodes_but_fails_validation() {
        let bytes = SubscribeData { tier: 9 }.encode();
        let decoded: SubscribeData = decode(&bytes).unwrap();
        assert_eq!(decoded.tier(), Err(CommerceError::InvalidTier(9)));
    }
}
