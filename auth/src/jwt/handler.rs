use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::Error as JsonWebTokenError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// JWT token handler for encoding and decoding tokens.
///
/// Generic over the claims type so each token kind keeps its own payload.
/// Signs with HS256 and accepts nothing else on decode: a token whose header
/// names another algorithm is rejected before its claims are looked at.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    ///
    /// # Returns
    /// JwtHandler configured with HS256
    ///
    /// # Errors
    /// * `EmptySecret` - The secret is empty
    pub fn new(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::EmptySecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        })
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token.
    ///
    /// The signature is checked first, then `exp` (required, no leeway: a
    /// token is expired once the current second is past `exp`).
    ///
    /// # Errors
    /// * `InvalidSignature` - Wrong key or unexpected algorithm
    /// * `TokenExpired` - Current time is past `exp`
    /// * `MissingClaim` - `exp` is absent
    /// * `Malformed` - Not a JWT, or claims do not fit `T`
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(classify)
    }
}

fn classify(error: JsonWebTokenError) -> JwtError {
    match error.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName => JwtError::InvalidSignature(error.to_string()),
        ErrorKind::MissingRequiredClaim(claim) => JwtError::MissingClaim(claim.clone()),
        _ => JwtError::Malformed(error.to_string()),
    }
}
