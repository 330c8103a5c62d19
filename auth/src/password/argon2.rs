use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;

/// Password hashing implementation.
///
/// Argon2id with a random salt per hash. Verification reads the cost
/// parameters back from the stored PHC string, so hashes produced with
/// different costs stay verifiable.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a hasher with the library's recommended Argon2id parameters.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Create a hasher with explicit cost parameters.
    ///
    /// # Arguments
    /// * `memory_kib` - Memory cost in KiB (at least 8)
    /// * `iterations` - Time cost (at least 1)
    ///
    /// # Errors
    /// * `InvalidParameters` - Parameters are outside Argon2's accepted range
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password.
    ///
    /// # Returns
    /// PHC string format hash (algorithm, parameters, salt and hash)
    ///
    /// # Errors
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash in constant time.
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `VerificationFailed` - Stored hash is not a valid PHC string, or
    ///   verification failed for a reason other than a mismatch
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            PasswordError::VerificationFailed(format!("Invalid password hash: {}", e))
        })?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_hasher() -> PasswordHasher {
        PasswordHasher::with_cost(8, 1).expect("valid parameters")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap_hasher();
        let password = "secret1";

        let hash = hasher.hash(password).expect("Failed to hash password");
        assert!(hash.starts_with("$argon2id$"));

        assert!(hasher.verify(password, &hash).expect("Failed to verify"));
        assert!(!hasher.verify("secret2", &hash).expect("Failed to verify"));
        assert!(!hasher.verify("", &hash).expect("Failed to verify"));
    }

    #[test]
    fn test_salted() {
        let hasher = cheap_hasher();
        let a = hasher.hash("same_password").unwrap();
        let b = hasher.hash("same_password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_across_costs() {
        let hash = cheap_hasher().hash("secret1").unwrap();
        assert!(PasswordHasher::new().verify("secret1", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = cheap_hasher();
        let result = hasher.verify("password", "invalid_hash");
        assert!(matches!(result, Err(PasswordError::VerificationFailed(_))));
    }

    #[test]
    fn test_invalid_cost() {
        assert!(matches!(
            PasswordHasher::with_cost(0, 0),
            Err(PasswordError::InvalidParameters(_))
        ));
    }
}
