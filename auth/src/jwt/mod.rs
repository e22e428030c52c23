pub mod claims;
pub mod codec;
pub mod errors;

pub use claims::Claims;
pub use claims::Grant;
pub use claims::TokenKind;
pub use codec::TokenCodec;
pub use errors::JwtError;
pub use jsonwebtoken::Algorithm;
