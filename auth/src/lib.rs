//! Authentication utilities library
//!
//! Shared by the owning user service and the authenticating service:
//! - Password hashing and verification (Argon2id)
//! - Asymmetric JWT issuance and verification with typed access/refresh claims
//! - Account role and status checks
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::CredentialVerifier;
//!
//! let verifier = CredentialVerifier::new();
//! let hash = verifier.hash("my_password").unwrap();
//! assert!(verifier.verify("my_password", &hash).unwrap());
//! assert!(!verifier.verify("other_password", &hash).unwrap());
//! ```
//!
//! ## JWT Tokens
//! ```
//! use std::path::Path;
//!
//! use auth::{Algorithm, Grant, Role, TokenCodec, TokenKind};
//! use chrono::Duration;
//! use uuid::Uuid;
//!
//! let codec = TokenCodec::from_files(
//!     Algorithm::RS256,
//!     Path::new("testdata/jwt-private.pem"),
//!     Path::new("testdata/jwt-public.pem"),
//! )
//! .unwrap();
//!
//! let user_id = Uuid::new_v4();
//! let token = codec
//!     .issue(&Grant::access(user_id, "alice@example.com", Role::Buyer), Duration::minutes(15))
//!     .unwrap();
//! let claims = codec.verify_kind(&token, TokenKind::Access).unwrap();
//! assert_eq!(claims.sub, "alice@example.com");
//! assert_eq!(claims.uid, user_id);
//! ```

pub mod account;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use account::AccountStateError;
pub use account::AccountStatus;
pub use account::normalize_email;
pub use account::Role;
pub use jwt::Algorithm;
pub use jwt::Claims;
pub use jwt::Grant;
pub use jwt::JwtError;
pub use jwt::TokenCodec;
pub use jwt::TokenKind;
pub use password::CredentialVerifier;
pub use password::HashError;
