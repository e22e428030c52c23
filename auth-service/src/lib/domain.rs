pub mod shadow;
pub mod token;
