pub mod models;
pub mod status;
pub mod tracking;
pub mod repository;
pub mod manager;
pub mod memory;

pub use models::{max_amount, DraftItem, NewOrder, NewOrderItem, Order, OrderDraft, OrderItem};
pub use status::{OrderStatus, TransitionError};
pub use tracking::{NewTrackingEvent, TrackingEvent};
pub use repository::OrderRepository;
pub use manager::{OrderManager, StatusChange};
pub use memory::InMemoryOrderRepository;
