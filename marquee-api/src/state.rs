use std::sync::Arc;

use tokio::sync::broadcast;

use marquee_catalog::CatalogDirectory;
use marquee_core::repository::UserDirectory;
use marquee_order::{BookingCodeGenerator, CartManager, CartSessionStore, CheckoutOrchestrator};
use marquee_seating::{ChannelPublisher, HoldRegistry, SeatMapUpdate};
use marquee_store::app_config::SeatingConfig;
use marquee_store::{InMemoryBookingStore, InMemoryHoldStore};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HoldRegistry>,
    pub cart_manager: Arc<CartManager>,
    pub checkout: Arc<CheckoutOrchestrator>,
    pub updates_tx: broadcast::Sender<SeatMapUpdate>,
}

impl AppState {
    /// Wires the whole engine over in-memory stores: publisher, hold store,
    /// booking store, registry, cart manager and checkout orchestrator.
    pub fn build(
        catalog: Arc<dyn CatalogDirectory>,
        users: Arc<dyn UserDirectory>,
        seating: &SeatingConfig,
    ) -> Self {
        let publisher = ChannelPublisher::new(seating.stream_capacity);
        let updates_tx = publisher.sender();

        let holds = Arc::new(InMemoryHoldStore::new());
        let bookings = Arc::new(InMemoryBookingStore::new());
        let carts = Arc::new(CartSessionStore::new());

        let registry = Arc::new(HoldRegistry::new(
            catalog.clone(),
            holds.clone(),
            bookings.clone(),
            Arc::new(publisher),
            seating.hold_minutes,
        ));
        let cart_manager = Arc::new(CartManager::new(
            carts.clone(),
            catalog.clone(),
            holds.clone(),
            registry.clone(),
        ));
        let checkout = Arc::new(CheckoutOrchestrator::new(
            carts,
            catalog,
            holds,
            users,
            bookings,
            registry.clone(),
            Arc::new(BookingCodeGenerator::new()),
        ));

        Self {
            registry,
            cart_manager,
            checkout,
            updates_tx,
        }
    }
}
