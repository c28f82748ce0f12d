pub mod error;
pub mod user;

pub use error::{DbError, Result};
pub use user::User;
