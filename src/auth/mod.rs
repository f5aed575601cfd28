//! Authentication: secret verifiers, token issuance and the request guard

pub mod clock;
pub mod issuer;
pub mod jwt;
pub mod password;
pub mod verifier;

pub use clock::{system_clock, Clock, FixedClock, SharedClock, SystemClock};
pub use issuer::{normalize_email, Principal, TokenIssuer};
pub use jwt::{Claims, IdentityToken, JwtKeys, MIN_SECRET_LEN};
pub use password::{hash_secret, verify_secret};
pub use verifier::{extract_bearer_token, AuthContext, TokenVerifier};
