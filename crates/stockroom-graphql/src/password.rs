//! Password hashing and verification for user accounts.
//!
//! Stored secrets are argon2 PHC strings (`$argon2id$v=19$…`). Comparing a
//! stored secret as plaintext is only done when a [`PasswordPolicy`] allows
//! it, for databases seeded before hashing was introduced.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{Error, Result};

/// Hash `password` into an argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// How a stored secret is checked against a supplied password.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasswordPolicy {
  pub allow_plaintext: bool,
}

impl PasswordPolicy {
  pub fn strict() -> Self { Self { allow_plaintext: false } }

  pub fn allowing_plaintext() -> Self { Self { allow_plaintext: true } }

  /// `true` when `password` matches `stored`.
  pub fn verify(&self, password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
      Ok(parsed) => Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok(),
      Err(_) if self.allow_plaintext => {
        tracing::warn!("stored password is not a hash; comparing as plaintext");
        password == stored
      }
      Err(_) => false,
    }
  }
}
