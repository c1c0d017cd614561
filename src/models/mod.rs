pub mod order_status;

pub use order_status::{DisplayTier, OrderStatus, PaymentStatus, FULFILLMENT_STEPS};
