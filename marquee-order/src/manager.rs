use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use marquee_catalog::{CatalogDirectory, Screening, TicketType};
use marquee_core::hold::SeatHold;
use marquee_core::repository::HoldStore;
use marquee_core::{CoreError, CoreResult, Requester};
use marquee_seating::HoldRegistry;

use crate::cart::{CartItem, CartSessionStore};
use crate::views::{CartView, TicketOptionView};

/// Mutates the session cart while keeping it reconciled against the hold
/// registry. The hold is the capability token here: a seat can only enter
/// the cart while its requester owns an ACTIVE hold on it.
pub struct CartManager {
    carts: Arc<CartSessionStore>,
    catalog: Arc<dyn CatalogDirectory>,
    holds: Arc<dyn HoldStore>,
    registry: Arc<HoldRegistry>,
}

impl CartManager {
    pub fn new(
        carts: Arc<CartSessionStore>,
        catalog: Arc<dyn CatalogDirectory>,
        holds: Arc<dyn HoldStore>,
        registry: Arc<HoldRegistry>,
    ) -> Self {
        Self {
            carts,
            catalog,
            holds,
            registry,
        }
    }

    /// A cart bound to some other screening yields an empty view without
    /// being touched; otherwise stale items are dropped before the view is
    /// built.
    pub async fn get_cart(&self, screening_id: Uuid, requester: &Requester) -> CoreResult<CartView> {
        let bound = self
            .carts
            .with_cart(&requester.session_id, |cart| cart.is_bound_to(screening_id));
        if !bound {
            tracing::debug!(%screening_id, "cart bound elsewhere; returning empty view");
            return Ok(CartView::empty(screening_id));
        }

        let locks = self.owned_locks(screening_id, requester).await?;
        let dropped = self
            .carts
            .with_cart(&requester.session_id, |cart| cart.drop_stale(&locks));
        if dropped > 0 {
            tracing::debug!(dropped, session = %requester.session_id, "dropped cart items with no surviving hold");
        }
        Ok(self.view(screening_id, requester))
    }

    pub async fn ticket_options(&self) -> CoreResult<Vec<TicketOptionView>> {
        Ok(self
            .catalog
            .active_ticket_types()
            .await?
            .into_iter()
            .map(|t| TicketOptionView {
                ticket_type_id: t.id,
                name: t.name,
                price_cents: t.price_cents,
            })
            .collect())
    }

    pub async fn add_seat(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        ticket_type_id: Uuid,
        requester: &Requester,
    ) -> CoreResult<CartView> {
        let screening = self.active_screening(screening_id).await?;
        let seat = self
            .catalog
            .seat(seat_id)
            .await?
            .ok_or_else(|| CoreError::not_found("seat", seat_id))?;
        if seat.hall_id != screening.hall_id {
            return Err(CoreError::FailedPrecondition(
                "seat does not belong to the screening hall".to_string(),
            ));
        }
        let ticket_type = self.active_ticket_type(ticket_type_id).await?;
        let lock = self
            .owned_lock(screening_id, seat_id, requester)
            .await?
            .ok_or_else(|| {
                CoreError::FailedPrecondition(
                    "seat must be locked before it can be added to the cart".to_string(),
                )
            })?;

        self.carts.with_cart(&requester.session_id, |cart| {
            // Switching screenings silently discards the old selection.
            if !cart.is_bound_to(screening_id) {
                cart.clear();
            }
            if cart.contains_seat(seat_id) {
                return Err(CoreError::Conflict(
                    "seat already present in cart".to_string(),
                ));
            }
            cart.insert(CartItem {
                seat_id,
                row: seat.row,
                number: seat.number,
                ticket_type_id: ticket_type.id,
                ticket_type_name: ticket_type.name.clone(),
                price_cents: ticket_type.price_cents,
                hold_expires_at: lock.expires_at,
            });
            cart.screening_id = Some(screening_id);
            Ok(())
        })?;

        Ok(self.view(screening_id, requester))
    }

    pub async fn update_ticket_type(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        ticket_type_id: Uuid,
        requester: &Requester,
    ) -> CoreResult<CartView> {
        self.ensure_cart_contains(screening_id, seat_id, requester)?;
        let ticket_type = self.active_ticket_type(ticket_type_id).await?;
        self.active_screening(screening_id).await?;
        let lock = self
            .owned_lock(screening_id, seat_id, requester)
            .await?
            .ok_or_else(|| {
                CoreError::FailedPrecondition(
                    "seat is no longer locked; lock it again".to_string(),
                )
            })?;

        self.carts.with_cart(&requester.session_id, |cart| {
            let Some(item) = cart.item_mut(seat_id) else {
                return Err(CoreError::not_found("cart item", seat_id));
            };
            item.ticket_type_id = ticket_type.id;
            item.ticket_type_name = ticket_type.name.clone();
            item.price_cents = ticket_type.price_cents;
            item.hold_expires_at = lock.expires_at;
            Ok(())
        })?;

        Ok(self.view(screening_id, requester))
    }

    /// Taking a seat out of the cart is the user dropping it, so the
    /// underlying hold is released as well (and the release broadcasts).
    pub async fn remove_seat(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        requester: &Requester,
    ) -> CoreResult<CartView> {
        self.ensure_cart_contains(screening_id, seat_id, requester)?;

        self.carts.with_cart(&requester.session_id, |cart| {
            cart.remove_seat(seat_id);
            if cart.is_empty() {
                cart.clear();
            }
        });

        self.registry
            .release_seat(screening_id, seat_id, requester)
            .await?;

        Ok(self.view(screening_id, requester))
    }

    fn view(&self, screening_id: Uuid, requester: &Requester) -> CartView {
        self.carts.with_cart(&requester.session_id, |cart| {
            if !cart.is_bound_to(screening_id) || cart.is_empty() {
                return CartView::empty(screening_id);
            }
            CartView {
                screening_id,
                items: cart.items().iter().map(Into::into).collect(),
                subtotal_cents: cart.subtotal_cents(),
            }
        })
    }

    fn ensure_cart_contains(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        requester: &Requester,
    ) -> CoreResult<()> {
        self.carts.with_cart(&requester.session_id, |cart| {
            if !cart.is_bound_to(screening_id) {
                return Err(CoreError::FailedPrecondition(
                    "cart is bound to a different screening".to_string(),
                ));
            }
            if !cart.contains_seat(seat_id) {
                return Err(CoreError::not_found("cart item", seat_id));
            }
            Ok(())
        })
    }

    async fn owned_locks(
        &self,
        screening_id: Uuid,
        requester: &Requester,
    ) -> CoreResult<HashMap<Uuid, SeatHold>> {
        let list = self
            .holds
            .active_owned_by(screening_id, requester, Utc::now())
            .await?;
        Ok(list.into_iter().map(|h| (h.seat_id, h)).collect())
    }

    async fn owned_lock(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        requester: &Requester,
    ) -> CoreResult<Option<SeatHold>> {
        let hold = self
            .holds
            .find_active(screening_id, seat_id, Utc::now())
            .await?;
        Ok(hold.filter(|h| h.owned_by(requester)))
    }

    async fn active_screening(&self, screening_id: Uuid) -> CoreResult<Screening> {
        self.catalog
            .screening(screening_id)
            .await?
            .filter(|s| s.active)
            .ok_or_else(|| CoreError::not_found("screening", screening_id))
    }

    async fn active_ticket_type(&self, ticket_type_id: Uuid) -> CoreResult<TicketType> {
        self.catalog
            .ticket_type(ticket_type_id)
            .await?
            .filter(|t| t.active)
            .ok_or_else(|| CoreError::not_found("ticket type", ticket_type_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use marquee_catalog::seed::{demo_catalog, DemoCatalog};
    use marquee_seating::{SeatMapPublisher, SeatMapUpdate};
    use marquee_store::{InMemoryBookingStore, InMemoryHoldStore};

    struct NullPublisher;

    impl SeatMapPublisher for NullPublisher {
        fn publish(&self, _update: SeatMapUpdate) {}
    }

    struct Fixture {
        demo: DemoCatalog,
        holds: Arc<InMemoryHoldStore>,
        registry: Arc<HoldRegistry>,
        manager: CartManager,
    }

    fn fixture() -> Fixture {
        let demo = demo_catalog();
        let holds = Arc::new(InMemoryHoldStore::new());
        let bookings = Arc::new(InMemoryBookingStore::new());
        let registry = Arc::new(HoldRegistry::new(
            demo.catalog.clone(),
            holds.clone(),
            bookings,
            Arc::new(NullPublisher),
            10,
        ));
        let manager = CartManager::new(
            Arc::new(CartSessionStore::new()),
            demo.catalog.clone(),
            holds.clone(),
            registry.clone(),
        );
        Fixture {
            demo,
            holds,
            registry,
            manager,
        }
    }

    #[tokio::test]
    async fn adding_an_unlocked_seat_fails() {
        let f = fixture();
        let alice = Requester::anonymous("s1");
        let err = f
            .manager
            .add_seat(
                f.demo.screening_id,
                f.demo.seat_ids[0],
                f.demo.standard_ticket_id,
                &alice,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn added_seat_mirrors_ticket_price_and_hold_expiry() {
        let f = fixture();
        let alice = Requester::anonymous("s1");
        let seat = f.demo.seat_ids[0];

        f.registry
            .lock_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();
        f.manager
            .add_seat(f.demo.screening_id, seat, f.demo.standard_ticket_id, &alice)
            .await
            .unwrap();

        let hold = f
            .holds
            .find_active(f.demo.screening_id, seat, Utc::now())
            .await
            .unwrap()
            .unwrap();

        let cart = f.manager.get_cart(f.demo.screening_id, &alice).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].price_cents, 1500);
        assert_eq!(cart.items[0].hold_expires_at, hold.expires_at);
        assert_eq!(cart.subtotal_cents, 1500);
    }

    #[tokio::test]
    async fn duplicate_seat_in_cart_conflicts() {
        let f = fixture();
        let alice = Requester::anonymous("s1");
        let seat = f.demo.seat_ids[0];

        f.registry
            .lock_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();
        f.manager
            .add_seat(f.demo.screening_id, seat, f.demo.standard_ticket_id, &alice)
            .await
            .unwrap();
        let err = f
            .manager
            .add_seat(f.demo.screening_id, seat, f.demo.standard_ticket_id, &alice)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn switching_screenings_clears_the_previous_selection() {
        let f = fixture();
        let alice = Requester::anonymous("s1");
        let seat_a = f.demo.seat_ids[0];
        let seat_b = f.demo.seat_ids[1];

        f.registry
            .lock_seat(f.demo.screening_id, seat_a, &alice)
            .await
            .unwrap();
        f.manager
            .add_seat(f.demo.screening_id, seat_a, f.demo.standard_ticket_id, &alice)
            .await
            .unwrap();

        f.registry
            .lock_seat(f.demo.other_screening_id, seat_b, &alice)
            .await
            .unwrap();
        let cart = f
            .manager
            .add_seat(
                f.demo.other_screening_id,
                seat_b,
                f.demo.standard_ticket_id,
                &alice,
            )
            .await
            .unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].seat_id, seat_b);

        // The old screening now reads as empty without disturbing the cart.
        let old = f.manager.get_cart(f.demo.screening_id, &alice).await.unwrap();
        assert!(old.items.is_empty());
    }

    #[tokio::test]
    async fn stale_items_are_dropped_on_read() {
        let f = fixture();
        let alice = Requester::anonymous("s1");
        let kept = f.demo.seat_ids[0];
        let lost = f.demo.seat_ids[1];

        f.registry
            .lock_seat(f.demo.screening_id, kept, &alice)
            .await
            .unwrap();
        f.manager
            .add_seat(f.demo.screening_id, kept, f.demo.standard_ticket_id, &alice)
            .await
            .unwrap();

        // The second hold gets a very short lease so it can genuinely expire
        // and be swept mid-session.
        let now = Utc::now();
        f.holds
            .acquire(
                f.demo.screening_id,
                lost,
                &alice,
                now + Duration::milliseconds(500),
                now,
            )
            .await
            .unwrap();
        f.manager
            .add_seat(f.demo.screening_id, lost, f.demo.student_ticket_id, &alice)
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(600)).await;
        f.holds.expire_due(Utc::now()).await.unwrap();

        let cart = f.manager.get_cart(f.demo.screening_id, &alice).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].seat_id, kept);
        assert_eq!(cart.subtotal_cents, 1500);
    }

    #[tokio::test]
    async fn removing_a_seat_releases_its_hold() {
        let f = fixture();
        let alice = Requester::anonymous("s1");
        let seat = f.demo.seat_ids[0];

        f.registry
            .lock_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();
        f.manager
            .add_seat(f.demo.screening_id, seat, f.demo.standard_ticket_id, &alice)
            .await
            .unwrap();

        let cart = f
            .manager
            .remove_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();
        assert!(cart.items.is_empty());
        assert!(f
            .holds
            .find_active(f.demo.screening_id, seat, Utc::now())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_ticket_type_reprices_the_item() {
        let f = fixture();
        let alice = Requester::anonymous("s1");
        let seat = f.demo.seat_ids[0];

        f.registry
            .lock_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();
        f.manager
            .add_seat(f.demo.screening_id, seat, f.demo.standard_ticket_id, &alice)
            .await
            .unwrap();

        let cart = f
            .manager
            .update_ticket_type(f.demo.screening_id, seat, f.demo.student_ticket_id, &alice)
            .await
            .unwrap();
        assert_eq!(cart.items[0].price_cents, 1100);
        assert_eq!(cart.items[0].ticket_type_name, "STUDENT");
        assert_eq!(cart.subtotal_cents, 1100);
    }

    #[tokio::test]
    async fn ticket_options_come_back_cheapest_first() {
        let f = fixture();
        let options = f.manager.ticket_options().await.unwrap();
        assert!(options.len() >= 3);
        assert!(options
            .windows(2)
            .all(|w| w[0].price_cents <= w[1].price_cents));
    }
}
