pub mod friend;
pub mod user;

pub use friend::*;
pub use user::*;
