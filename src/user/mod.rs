//! Users: the user table, profile endpoints and password changes.

mod core;
mod password_endpoint;
mod profile_endpoint;

pub use core::{
    NewUser, User, UserId, create_user, create_user_table, get_user_by_email, get_user_by_id,
    update_password,
};
pub use password_endpoint::update_password_endpoint;
pub use profile_endpoint::{get_profile, update_profile};

#[cfg(test)]
pub use core::{ProfileUpdate, update_user_profile};
