pub mod directory;
pub mod models;
pub mod seed;

pub use directory::{CatalogDirectory, InMemoryCatalog};
pub use models::{Hall, Screening, Seat, SeatType, TicketType};
