use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::Grant;
use super::claims::TokenKind;
use super::errors::JwtError;

#[derive(Debug, Clone, Copy)]
enum KeyFamily {
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    fn of(algorithm: Algorithm) -> Result<Self, JwtError> {
        match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => Ok(KeyFamily::Rsa),
            Algorithm::ES256 | Algorithm::ES384 => Ok(KeyFamily::Ec),
            Algorithm::EdDSA => Ok(KeyFamily::Ed),
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Err(
                JwtError::UnsupportedAlgorithm(format!("{:?} is symmetric", algorithm)),
            ),
        }
    }

    fn encoding_key(self, pem: &[u8]) -> Result<EncodingKey, JwtError> {
        let key = match self {
            KeyFamily::Rsa => EncodingKey::from_rsa_pem(pem),
            KeyFamily::Ec => EncodingKey::from_ec_pem(pem),
            KeyFamily::Ed => EncodingKey::from_ed_pem(pem),
        };
        key.map_err(|e| JwtError::KeyLoad(format!("Invalid private key: {}", e)))
    }

    fn decoding_key(self, pem: &[u8]) -> Result<DecodingKey, JwtError> {
        let key = match self {
            KeyFamily::Rsa => DecodingKey::from_rsa_pem(pem),
            KeyFamily::Ec => DecodingKey::from_ec_pem(pem),
            KeyFamily::Ed => DecodingKey::from_ed_pem(pem),
        };
        key.map_err(|e| JwtError::KeyLoad(format!("Invalid public key: {}", e)))
    }
}

/// Asymmetric token codec.
///
/// Signs with a private key and verifies with the matching public key, using one
/// fixed algorithm. A codec built with only the public key can verify tokens
/// issued elsewhere but refuses to issue.
pub struct TokenCodec {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
}

impl TokenCodec {
    /// Parse an algorithm name, rejecting symmetric algorithms.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Unknown name or an HMAC algorithm
    pub fn parse_algorithm(name: &str) -> Result<Algorithm, JwtError> {
        let algorithm = Algorithm::from_str(name)
            .map_err(|_| JwtError::UnsupportedAlgorithm(name.to_string()))?;
        KeyFamily::of(algorithm)?;
        Ok(algorithm)
    }

    /// Build a signing and verifying codec from PEM-encoded keys.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Algorithm is symmetric
    /// * `KeyLoad` - Either key cannot be parsed for the algorithm's key family
    pub fn from_pem(
        algorithm: Algorithm,
        private_pem: &[u8],
        public_pem: &[u8],
    ) -> Result<Self, JwtError> {
        let family = KeyFamily::of(algorithm)?;

        Ok(Self {
            encoding_key: Some(family.encoding_key(private_pem)?),
            decoding_key: family.decoding_key(public_pem)?,
            algorithm,
            validation: Self::validation(algorithm),
        })
    }

    /// Build a verify-only codec from a PEM-encoded public key.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Algorithm is symmetric
    /// * `KeyLoad` - Key cannot be parsed
    pub fn verifier_from_pem(algorithm: Algorithm, public_pem: &[u8]) -> Result<Self, JwtError> {
        let family = KeyFamily::of(algorithm)?;

        Ok(Self {
            encoding_key: None,
            decoding_key: family.decoding_key(public_pem)?,
            algorithm,
            validation: Self::validation(algorithm),
        })
    }

    /// Load both keys from the filesystem.
    ///
    /// Intended for startup; any failure here should stop the service.
    pub fn from_files(
        algorithm: Algorithm,
        private_key_path: &Path,
        public_key_path: &Path,
    ) -> Result<Self, JwtError> {
        let private_pem = read_key(private_key_path)?;
        let public_pem = read_key(public_key_path)?;
        Self::from_pem(algorithm, &private_pem, &public_pem)
    }

    /// Load a verify-only codec from a public key file.
    pub fn verifier_from_file(algorithm: Algorithm, public_key_path: &Path) -> Result<Self, JwtError> {
        let public_pem = read_key(public_key_path)?;
        Self::verifier_from_pem(algorithm, &public_pem)
    }

    fn validation(algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn can_issue(&self) -> bool {
        self.encoding_key.is_some()
    }

    /// Sign a grant that expires `ttl` from now.
    ///
    /// # Errors
    /// * `SigningUnavailable` - Codec was built without a private key
    /// * `EncodingFailed` - Signing failed
    pub fn issue(&self, grant: &Grant, ttl: Duration) -> Result<String, JwtError> {
        self.issue_at(grant, ttl, Utc::now())
    }

    /// Sign a grant with an explicit issuance instant.
    pub fn issue_at(
        &self,
        grant: &Grant,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let encoding_key = self
            .encoding_key
            .as_ref()
            .ok_or(JwtError::SigningUnavailable)?;

        let claims = Claims::from_grant(grant, ttl, issued_at);

        encode(&Header::new(self.algorithm), &claims, encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify signature, algorithm and expiry and decode the claims.
    ///
    /// # Errors
    /// * `Expired` - Signature is valid but `exp` has passed
    /// * `Malformed` - Any other failure (bad signature, wrong key, wrong
    ///   algorithm, missing or mistyped claims, garbage input)
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Malformed(e.to_string()),
            })
    }

    /// Verify a token and require a specific kind.
    ///
    /// # Errors
    /// * `WrongKind` - Token is valid but of the other kind
    /// * Every error of [`verify`](Self::verify)
    pub fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let claims = self.verify(token)?;

        if claims.token_type != expected {
            return Err(JwtError::WrongKind {
                expected,
                found: claims.token_type,
            });
        }

        Ok(claims)
    }
}

fn read_key(path: &Path) -> Result<Vec<u8>, JwtError> {
    fs::read(path).map_err(|e| JwtError::KeyLoad(format!("{}: {}", path.display(), e)))
}
