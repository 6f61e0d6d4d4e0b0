pub mod access_jwt;
pub mod factory;
pub mod password;
pub mod token_issuer;

pub use access_jwt::{AccessJwtError, AccessTokenVerifier, VerifiedAccessToken};
pub use factory::{build_account_service, build_auth_service};
pub use password::{PasswordEncoder, PasswordError, PasswordMatcher};
pub use token_issuer::{IssuedAccessToken, JwtIssuer};
