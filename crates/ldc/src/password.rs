//! Stored LDC portal credential.

use zeroize::Zeroize;

use crmsync_core::DomainResult;

use crate::ldc_account::errors;

/// An already-encrypted portal password.
///
/// Encryption happens elsewhere; this type only carries the ciphertext. It is
/// never printed (`Debug` and `Display` are redacted), never put in events,
/// and wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedPassword(String);

impl EncryptedPassword {
    /// Fails with `LdcAccount.InvalidPassword` when blank. The ciphertext is
    /// stored byte for byte; surrounding whitespace may belong to the payload.
    pub fn create(ciphertext: &str) -> DomainResult<Self> {
        if ciphertext.trim().is_empty() {
            return Err(errors::invalid_password());
        }
        Ok(Self(ciphertext.to_string()))
    }

    /// The ciphertext, for handing to the decrypting collaborator.
    pub fn expose_ciphertext(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for EncryptedPassword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("EncryptedPassword(**redacted**)")
    }
}

impl core::fmt::Display for EncryptedPassword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("**redacted**")
    }
}

impl Drop for EncryptedPassword {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
