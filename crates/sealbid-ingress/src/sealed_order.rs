//! Sealed-order envelope.
//!
//! A sealed order is a NaCl `crypto_box` (x25519 + XSalsa20-Poly1305) of a
//! 16-byte plaintext:
//!
//! ```text
//! [0..8)   price multiple (ticks), little endian
//! [8..16)  base quantity, little endian
//! ```
//!
//! Both the user and the auctioneer derive the same [`SharedKey`] from
//! their own secret and the other's public key, so either side can open
//! the envelope. A wrong key fails authentication and surfaces as
//! [`AuctionError::InvalidSharedKey`].

use std::fmt;

use crypto_box::{
    PublicKey, SalsaBox, SecretKey,
    aead::{Aead, generic_array::GenericArray},
};
use rand::{CryptoRng, RngCore};
use sealbid_types::{
    AuctionError, EncryptionPubkey, Result,
    constants::{NONCE_LEN, SEALED_PLAINTEXT_LEN},
};

/// Decrypted contents of a sealed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderPayload {
    /// Limit price as a number of ticks.
    pub price_multiple: u64,
    pub base_quantity: u64,
}

impl OrderPayload {
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SEALED_PLAINTEXT_LEN] {
        let mut out = [0u8; SEALED_PLAINTEXT_LEN];
        out[..8].copy_from_slice(&self.price_multiple.to_le_bytes());
        out[8..].copy_from_slice(&self.base_quantity.to_le_bytes());
        out
    }

    /// Parse an opened plaintext. Anything but exactly 16 bytes is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; SEALED_PLAINTEXT_LEN] =
            bytes.try_into().map_err(|_| AuctionError::InvalidSharedKey)?;
        let mut price = [0u8; 8];
        let mut quantity = [0u8; 8];
        price.copy_from_slice(&bytes[..8]);
        quantity.copy_from_slice(&bytes[8..]);
        Ok(Self {
            price_multiple: u64::from_le_bytes(price),
            base_quantity: u64::from_le_bytes(quantity),
        })
    }
}

/// Nonce and ciphertext as submitted with `new_encrypted_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedEnvelope {
    pub nonce: [u8; NONCE_LEN],
    pub cipher_text: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// An x25519 key pair. Users hold one per auction side; the auctioneer
/// holds one per auction. The secret half never leaves this struct.
pub struct EncryptionKeypair {
    secret: SecretKey,
}

impl EncryptionKeypair {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            secret: SecretKey::generate(rng),
        }
    }

    #[must_use]
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            secret: SecretKey::from(bytes),
        }
    }

    #[must_use]
    pub fn public(&self) -> EncryptionPubkey {
        EncryptionPubkey(*self.secret.public_key().as_bytes())
    }

    /// Key shared with the holder of `their_public`.
    #[must_use]
    pub fn shared_key(&self, their_public: &EncryptionPubkey) -> SharedKey {
        SharedKey(SalsaBox::new(&PublicKey::from(their_public.0), &self.secret))
    }
}

impl fmt::Debug for EncryptionKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKeypair")
            .field("public", &self.public())
            .finish_non_exhaustive()
    }
}

/// Precomputed Diffie-Hellman key between one user and the auctioneer.
pub struct SharedKey(SalsaBox);

impl SharedKey {
    pub fn seal(&self, nonce: &[u8; NONCE_LEN], payload: &OrderPayload) -> Result<Vec<u8>> {
        self.0
            .encrypt(GenericArray::from_slice(nonce.as_slice()), &payload.to_bytes()[..])
            .map_err(|_| AuctionError::Internal("sealing failed".into()))
    }

    pub fn open(&self, nonce: &[u8; NONCE_LEN], cipher_text: &[u8]) -> Result<OrderPayload> {
        let plain = self
            .0
            .decrypt(GenericArray::from_slice(nonce.as_slice()), cipher_text)
            .map_err(|_| AuctionError::InvalidSharedKey)?;
        OrderPayload::from_bytes(&plain)
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedKey(..)")
    }
}

/// Seal an order for the auctioneer under a fresh random nonce.
pub fn seal_order<R: RngCore + CryptoRng>(
    user: &EncryptionKeypair,
    auctioneer: &EncryptionPubkey,
    payload: &OrderPayload,
    rng: &mut R,
) -> Result<SealedEnvelope> {
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);
    let cipher_text = user.shared_key(auctioneer).seal(&nonce, payload)?;
    Ok(SealedEnvelope { nonce, cipher_text })
}
