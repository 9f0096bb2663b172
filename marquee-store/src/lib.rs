pub mod app_config;
pub mod booking_store;
pub mod hold_store;
pub mod users;

pub use booking_store::InMemoryBookingStore;
pub use hold_store::InMemoryHoldStore;
pub use users::InMemoryUserDirectory;
