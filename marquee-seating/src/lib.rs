pub mod broadcast;
pub mod registry;
pub mod seatmap;
pub mod sweeper;

pub use broadcast::{ChannelPublisher, SeatMapPublisher, SeatMapUpdate};
pub use registry::HoldRegistry;
pub use seatmap::{resolve_seat_state, SeatMapView, SeatState, SeatStatusView};
pub use sweeper::{HoldSweeper, SweeperHandle};
