//! Authentication: password hashing, JWT issuance, bearer extraction

mod extract;
mod password;
mod tokens;

pub use extract::AuthUser;
pub use password::PasswordHasher;
pub use tokens::{Claims, TokenIssuer, TokenKind, TokenPair};
