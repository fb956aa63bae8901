//! Aggregates module
pub mod category;
pub mod comment;
pub mod manufacturer;
pub mod order;
pub mod pharmacy;
pub mod position;
pub mod product;
pub mod rating;

pub use category::Category;
pub use comment::{Comment, ModerationOutcome};
pub use manufacturer::Manufacturer;
pub use order::{Checkout, CheckoutError, DeliveryMethod, DeliveryStatus, Order, PaymentMethod, PaymentStatus};
pub use pharmacy::Pharmacy;
pub use position::{OrderLine, Position};
pub use product::Product;
pub use rating::Rating;

/// Derived-field maintenance that every store runs before an insert or update.
pub trait BeforeSave {
    fn before_save(&mut self) -> crate::Result<()>;
}
