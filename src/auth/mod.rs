mod claims;
pub mod extractors;
pub mod jwt;
pub mod password;
pub mod services;

pub use extractors::AuthToken;
pub use services::AuthService;
