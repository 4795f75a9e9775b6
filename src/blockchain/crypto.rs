use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// A SHA-256 digest identifying a block or a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The all-zero hash, used before a value has been hashed
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Hashes the given byte slices in order
    pub fn digest<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Hash(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short prefix for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Hash {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::DecodingError(e.to_string()))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidHash("Expected 32 bytes".to_string()))?;
        Ok(Hash(array))
    }
}

/// Represents an output owner (ed25519 public key in base58 format)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Creates a new address from a public key
    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        Address(bs58::encode(public_key.as_bytes()).into_string())
    }

    /// Converts the address back to the public key it encodes
    pub fn to_public_key(&self) -> Result<VerifyingKey, CryptoError> {
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        VerifyingKey::from_bytes(&bytes.try_into().map_err(|_| {
            CryptoError::InvalidPublicKey("Invalid public key bytes".to_string())
        })?)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = Address(s.to_string());
        address.to_public_key()?;
        Ok(address)
    }
}

/// An ed25519 signature in base58 format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalSignature(pub String);

impl DigitalSignature {
    pub fn from_signature(signature: &Signature) -> Self {
        DigitalSignature(bs58::encode(signature.to_bytes()).into_string())
    }

    pub fn to_signature(&self) -> Result<Signature, CryptoError> {
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        let signature_bytes: [u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidSignature("Invalid signature length".to_string())
        })?;

        Ok(Signature::from_bytes(&signature_bytes))
    }
}

/// A keypair able to sign transaction inputs
#[derive(Debug, Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Creates a new wallet with a random keypair
    pub fn new() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let address = Address::from_public_key(&signing_key.verifying_key());

        Wallet {
            signing_key,
            address,
        }
    }

    /// Creates a wallet from an existing 32-byte secret key
    pub fn from_secret_key(secret_key_bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_array: [u8; 32] = secret_key_bytes.try_into().map_err(|_| {
            CryptoError::InvalidPrivateKey("Invalid private key length".to_string())
        })?;

        let signing_key = SigningKey::from_bytes(&bytes_array);
        let address = Address::from_public_key(&signing_key.verifying_key());

        Ok(Wallet {
            signing_key,
            address,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Signs a message with the wallet's private key
    pub fn sign(&self, message: &[u8]) -> DigitalSignature {
        DigitalSignature::from_signature(&self.signing_key.sign(message))
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Verifies a signature against a message and the owner's address.
///
/// Malformed addresses and signatures verify as `false`.
pub fn verify_signature(message: &[u8], signature: &DigitalSignature, address: &Address) -> bool {
    let public_key = match address.to_public_key() {
        Ok(key) => key,
        Err(_) => return false,
    };
    let signature = match signature.to_signature() {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    public_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_and_verification() {
        let wallet = Wallet::new();
        let message = b"spend output 0";

        let signature = wallet.sign(message);
        assert!(verify_signature(message, &signature, wallet.address()));
        assert!(!verify_signature(b"spend output 1", &signature, wallet.address()));

        let other = Wallet::new();
        assert!(!verify_signature(message, &signature, other.address()));
    }

    #[test]
    fn test_address_conversion() {
        let wallet = Wallet::new();
        let public_key = wallet.address().to_public_key().unwrap();
        assert_eq!(public_key.as_bytes(), wallet.public_key().as_bytes());

        let parsed: Address = wallet.address().0.parse().unwrap();
        assert_eq!(&parsed, wallet.address());
        assert!("not-base58-0OIl".parse::<Address>().is_err());
    }

    #[test]
    fn test_wallet_from_secret_key() {
        let wallet = Wallet::from_secret_key(&[7u8; 32]).unwrap();
        let again = Wallet::from_secret_key(&[7u8; 32]).unwrap();
        assert_eq!(wallet.address(), again.address());
        assert!(Wallet::from_secret_key(&[1u8; 5]).is_err());
    }

    #[test]
    fn test_malformed_signature_does_not_verify() {
        let wallet = Wallet::new();
        let bogus = DigitalSignature("abc".to_string());
        assert!(!verify_signature(b"msg", &bogus, wallet.address()));
    }

    #[test]
    fn test_hash_hex_round_trip() {
        let hash = Hash::digest([b"abc".as_slice()]);
        let parsed: Hash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);
        assert_eq!(hash.to_string().len(), 64);
        assert_eq!(hash.short().len(), 8);
        assert!("zz".parse::<Hash>().is_err());
    }
}
