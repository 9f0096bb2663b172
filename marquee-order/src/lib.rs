pub mod cart;
pub mod fulfillment;
pub mod manager;
pub mod orchestrator;
pub mod views;

pub use cart::{CartItem, CartSessionStore, SessionCart};
pub use fulfillment::BookingCodeGenerator;
pub use manager::CartManager;
pub use orchestrator::{CheckoutConfirmation, CheckoutOrchestrator, CheckoutRequest};
pub use views::{CartItemView, CartView, TicketOptionView};
