use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::HashError;

/// Secret used to build the decoy hash for timing-equalised lookups.
const DECOY_SECRET: &str = "decoy-credential-for-unknown-accounts";

/// Credential verifier backed by Argon2id.
///
/// Every call to [`hash`](Self::hash) draws a fresh random salt which is embedded
/// in the returned PHC string together with the algorithm parameters, so a stored
/// blob is self-describing and can be verified by any service holding this type.
#[derive(Clone)]
pub struct CredentialVerifier {
    params: Params,
    decoy_hash: Option<String>,
}

impl CredentialVerifier {
    /// Create a verifier with the Argon2 default cost parameters.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
            decoy_hash: None,
        }
    }

    /// Create a verifier with explicit cost parameters.
    ///
    /// # Arguments
    /// * `memory_kib` - Memory cost in KiB
    /// * `iterations` - Number of passes
    /// * `parallelism` - Degree of parallelism
    ///
    /// # Errors
    /// * `InvalidParameters` - Parameters are outside the ranges Argon2 accepts
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| HashError::InvalidParameters(e.to_string()))?;

        Ok(Self {
            params,
            decoy_hash: None,
        })
    }

    /// Precompute the decoy hash used by [`burn_decoy`](Self::burn_decoy).
    ///
    /// # Errors
    /// * `HashingFailed` - Hash computation failed
    pub fn with_decoy(mut self) -> Result<Self, HashError> {
        self.decoy_hash = Some(self.hash(DECOY_SECRET)?);
        Ok(self)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext secret for storage.
    ///
    /// # Returns
    /// PHC string (algorithm, parameters, salt and digest)
    ///
    /// # Errors
    /// * `HashingFailed` - Hash computation failed
    pub fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::HashingFailed(e.to_string()))
    }

    /// Check a plaintext secret against a stored PHC hash.
    ///
    /// The parameters embedded in the hash are used, not the ones this verifier
    /// was built with, so hashes made with older cost settings keep verifying.
    ///
    /// # Returns
    /// True if the secret matches, false otherwise
    ///
    /// # Errors
    /// * `MalformedHash` - Stored value is not a parseable PHC string
    pub fn verify(&self, secret: &str, hash_blob: &str) -> Result<bool, HashError> {
        let parsed_hash =
            PasswordHash::new(hash_blob).map_err(|e| HashError::MalformedHash(e.to_string()))?;

        Ok(self
            .argon2()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Spend the same work as a real verification and discard the result.
    ///
    /// Used when the account does not exist so that response timing does not
    /// reveal whether an email is registered. No-op without a decoy.
    pub fn burn_decoy(&self, secret: &str) {
        if let Some(decoy_hash) = &self.decoy_hash {
            let _ = self.verify(secret, decoy_hash);
        }
    }
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_verifier() -> CredentialVerifier {
        CredentialVerifier::with_params(8 * 1024, 1, 1).expect("valid params")
    }

    #[test]
    fn test_hash_and_verify() {
        let verifier = cheap_verifier();
        let secret = "correct horse battery staple";

        let hash = verifier.hash(secret).expect("Failed to hash secret");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verifier.verify(secret, &hash).expect("Failed to verify"));
        assert!(!verifier
            .verify("wrong secret", &hash)
            .expect("Failed to verify"));
    }

    #[test]
    fn test_salt_differs_per_call() {
        let verifier = cheap_verifier();

        let first = verifier.hash("same-secret").unwrap();
        let second = verifier.hash("same-secret").unwrap();

        assert_ne!(first, second);
        assert!(verifier.verify("same-secret", &first).unwrap());
        assert!(verifier.verify("same-secret", &second).unwrap());
    }

    #[test]
    fn test_verify_uses_parameters_from_hash() {
        let strong = CredentialVerifier::with_params(16 * 1024, 2, 1).unwrap();
        let hash = strong.hash("secret").unwrap();

        assert!(cheap_verifier().verify("secret", &hash).unwrap());
    }

    #[test]
    fn test_verify_malformed_hash() {
        let result = cheap_verifier().verify("secret", "not-a-phc-string");
        assert!(matches!(result, Err(HashError::MalformedHash(_))));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = CredentialVerifier::with_params(1, 0, 1);
        assert!(matches!(result, Err(HashError::InvalidParameters(_))));
    }

    #[test]
    fn test_burn_decoy_without_decoy_is_noop() {
        cheap_verifier().burn_decoy("anything");
        cheap_verifier()
            .with_decoy()
            .expect("decoy hash")
            .burn_decoy("anything");
    }
}
