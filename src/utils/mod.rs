//! Utility functions and helpers
//!
//! Cryptographic collaborators (hashing, signing, signature verification)
//! and the bincode serialization layer used for canonical bytes and storage.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_encode, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, new_key_pair,
    ripemd160_digest, sha256_digest, EcdsaP256Verifier, SignatureVerifier,
};

pub use serialization::{deserialize, serialize};
