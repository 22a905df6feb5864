//! Authentication module
//!
//! JWT bearer authentication, argon2 password hashing and the social login
//! providers.

mod jwt;
mod middleware;
mod password;
pub mod social;

pub use jwt::{Claims, JwtService, TokenSubject};
pub use middleware::{AdminUser, AuthUser};
pub use password::PasswordService;
pub use social::{SocialError, SocialLogin, SocialProvider, SocialUserInfo};
