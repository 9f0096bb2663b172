use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_catalog::CatalogDirectory;
use marquee_core::booking::{Booking, BookingSeat, BookingStatus};
use marquee_core::repository::{BookingRepository, HoldStore, TicketCodeGenerator, UserDirectory};
use marquee_core::{CoreError, CoreResult, Requester};
use marquee_seating::HoldRegistry;

use crate::cart::CartSessionStore;
use crate::views::CartItemView;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub cardholder_name: Option<String>,
    pub payment_method: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutConfirmation {
    pub booking_number: String,
    pub payment_reference: String,
    pub total_cents: i32,
    pub items: Vec<CartItemView>,
    pub ticket_code: String,
}

/// Converts a consistent cart-plus-holds set into one persisted booking.
/// Every validation runs before the first write, so a failed checkout
/// leaves the cart and the holds exactly as they were.
pub struct CheckoutOrchestrator {
    carts: Arc<CartSessionStore>,
    catalog: Arc<dyn CatalogDirectory>,
    holds: Arc<dyn HoldStore>,
    users: Arc<dyn UserDirectory>,
    bookings: Arc<dyn BookingRepository>,
    registry: Arc<HoldRegistry>,
    codes: Arc<dyn TicketCodeGenerator>,
}

impl CheckoutOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        carts: Arc<CartSessionStore>,
        catalog: Arc<dyn CatalogDirectory>,
        holds: Arc<dyn HoldStore>,
        users: Arc<dyn UserDirectory>,
        bookings: Arc<dyn BookingRepository>,
        registry: Arc<HoldRegistry>,
        codes: Arc<dyn TicketCodeGenerator>,
    ) -> Self {
        Self {
            carts,
            catalog,
            holds,
            users,
            bookings,
            registry,
            codes,
        }
    }

    pub async fn finalize_checkout(
        &self,
        screening_id: Uuid,
        request: CheckoutRequest,
        requester: &Requester,
    ) -> CoreResult<CheckoutConfirmation> {
        let Some(username) = requester.username() else {
            return Err(CoreError::Unauthenticated(
                "login required to complete checkout".to_string(),
            ));
        };

        // The cart is taken as-is. Reconciliation belongs to the read path;
        // here any drift between cart and holds must abort loudly instead
        // of silently shrinking the order.
        let cart = self.carts.snapshot(&requester.session_id);
        if !cart.is_bound_to(screening_id) {
            return Err(CoreError::FailedPrecondition(
                "cart is bound to another screening".to_string(),
            ));
        }
        if cart.is_empty() {
            return Err(CoreError::FailedPrecondition(
                "cannot finalize checkout with an empty cart".to_string(),
            ));
        }

        let screening = self
            .catalog
            .screening(screening_id)
            .await?
            .ok_or_else(|| CoreError::not_found("screening", screening_id))?;
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| CoreError::not_found("user", username))?;

        let held: HashSet<Uuid> = self
            .holds
            .active_owned_by(screening_id, requester, Utc::now())
            .await?
            .into_iter()
            .map(|h| h.seat_id)
            .collect();
        let in_cart: HashSet<Uuid> = cart.seat_ids().into_iter().collect();
        validate_locks(&held, &in_cart)?;

        let mut booking = Booking::new(user.id, screening.id);
        booking.customer_email = request
            .customer_email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
            .unwrap_or(&user.email)
            .to_string();
        booking.customer_phone = request.customer_phone.clone();
        booking.payment_method = request.payment_method.clone();
        booking.payment_reference = payment_reference();
        booking.status = BookingStatus::Confirmed;

        for item in cart.items() {
            let seat = self
                .catalog
                .seat(item.seat_id)
                .await?
                .ok_or_else(|| CoreError::not_found("seat", item.seat_id))?;
            let ticket_type = self
                .catalog
                .ticket_type(item.ticket_type_id)
                .await?
                .ok_or_else(|| CoreError::not_found("ticket type", item.ticket_type_id))?;
            // Sold outright: this path never passes through RESERVED.
            booking.add_seat(BookingSeat::occupied(
                seat.id,
                ticket_type.id,
                item.price_cents,
            ));
        }

        let saved = self.bookings.save(booking).await?;
        tracing::info!(booking = %saved.booking_number, %screening_id, "booking committed");

        // Post-commit: give the seats' holds back (covers holds dropped
        // from the cart mid-flow too), push the fresh map, empty the cart.
        self.registry
            .release_all(screening_id, &requester.session_id)
            .await?;
        if let Err(err) = self.registry.broadcast_seat_map(screening_id).await {
            tracing::error!(%screening_id, %err, "post-checkout broadcast failed");
        }
        self.carts.clear(&requester.session_id);

        let ticket_code = self.codes.generate(&saved.booking_number)?;

        Ok(CheckoutConfirmation {
            booking_number: saved.booking_number,
            payment_reference: saved.payment_reference,
            total_cents: saved.total_cents,
            items: cart.items().iter().map(Into::into).collect(),
            ticket_code,
        })
    }
}

/// The held set and the cart set must match exactly; any drift means a hold
/// expired or was stolen mid-session.
fn validate_locks(held: &HashSet<Uuid>, in_cart: &HashSet<Uuid>) -> CoreResult<()> {
    if held.len() != in_cart.len() || !in_cart.is_subset(held) {
        return Err(CoreError::Conflict(
            "one or more seats are no longer locked; reselect your seats".to_string(),
        ));
    }
    Ok(())
}

fn payment_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("PAY-{}", id[..8].to_uppercase())
}
