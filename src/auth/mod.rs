//! Authentication: password hashing, bearer tokens, and the sign-up, log-in and
//! password reset endpoints.

mod log_in;
mod middleware;
mod otp;
mod password;
mod password_reset;
mod sign_up;
mod test_email;
mod token;

pub use log_in::log_in;
pub use middleware::auth_guard;
pub use otp::OTP_DURATION;
pub use password::{PasswordHash, ValidatedPassword};
pub use password_reset::{forgot_password, reset_password};
pub use sign_up::sign_up;
pub use test_email::{get_protected, send_test_email};
pub use token::{DEFAULT_TOKEN_DURATION, JwtKeys};

#[cfg(test)]
pub use token::{decode_jwt, encode_jwt};
