pub mod booking;
pub mod error;
pub mod hold;
pub mod identity;
pub mod repository;

pub use error::{CoreError, CoreResult};
pub use identity::{Requester, User};
