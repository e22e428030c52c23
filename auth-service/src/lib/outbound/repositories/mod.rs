pub mod memory;
pub mod shadow_user;

pub use memory::InMemoryShadowUserRepository;
pub use shadow_user::PostgresShadowUserRepository;
