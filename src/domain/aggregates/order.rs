//! Order Aggregate

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use super::{BeforeSave, OrderLine};
use crate::domain::value_objects::{PostIndex, PostIndexError};

/// Enum stored and transmitted as its human-readable label.
macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self { $(Self::$variant => $label),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }

        impl FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }
    };
}

labelled_enum!(DeliveryMethod {
    DoorDelivery => "Door delivery",
    SelfDelivery => "Self-delivery",
});

labelled_enum!(PaymentMethod {
    Prepayment => "Prepayment",
    UponReceipt => "Upon receipt",
});

labelled_enum!(PaymentStatus {
    PendingPayment => "Pending payment",
    UponReceipt => "Payment upon receipt",
    Paid => "Paid",
});

labelled_enum!(DeliveryStatus {
    WithoutAction => "Without action",
    InDelivery => "In delivery",
    ReadyForPickup => "Ready for pickup",
    Delivered => "Delivered",
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
    pub delivery_method: Option<DeliveryMethod>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub pharmacy_id: Option<i64>,
    pub receipt_date: Option<NaiveDate>,
    pub receipt_time: Option<NaiveTime>,
    pub stripe_order_id: Option<String>,
    pub stripe_payment_id: Option<String>,
    pub key: Option<String>,
    pub is_paid: bool,
    pub in_progress: bool,
    pub closed: bool,
    pub address: Option<String>,
    pub post_index: Option<String>,
}

impl Order {
    pub fn place(customer_id: i64, lines: Vec<OrderLine>) -> Self {
        Self {
            id: 0,
            customer_id,
            lines,
            // Storage keeps microseconds; the key must survive a round trip.
            created_at: Utc::now().trunc_subsecs(6),
            delivery_method: None,
            payment_method: None,
            payment_status: PaymentStatus::PendingPayment,
            delivery_status: DeliveryStatus::WithoutAction,
            pharmacy_id: None,
            receipt_date: None,
            receipt_time: None,
            stripe_order_id: None,
            stripe_payment_id: None,
            key: None,
            is_paid: false,
            in_progress: false,
            closed: false,
            address: None,
            post_index: None,
        }
    }

    pub fn numb_of_positions(&self) -> usize { self.lines.len() }

    /// Uses current product prices, so repricing a product changes the total of existing orders.
    pub fn total_price(&self) -> Decimal { self.lines.iter().map(OrderLine::line_total).sum() }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}/orders/{}/{}/", base_url.trim_end_matches('/'), self.customer_id, self.id)
    }

    pub fn receipt_datetime(&self) -> Option<NaiveDateTime> {
        Some(self.receipt_date?.and_time(self.receipt_time?))
    }

    pub fn check_out(&mut self, checkout: Checkout) -> Result<(), CheckoutError> {
        let status = checkout.validate()?;
        self.delivery_method = Some(checkout.delivery_method);
        self.payment_method = Some(checkout.payment_method);
        self.address = non_blank(checkout.address);
        self.post_index = non_blank(checkout.post_index);
        self.pharmacy_id = checkout.pharmacy_id;
        self.receipt_date = checkout.receipt_date;
        self.receipt_time = checkout.receipt_time;
        self.payment_status = status;
        Ok(())
    }
}

impl BeforeSave for Order {
    fn before_save(&mut self) -> crate::Result<()> {
        self.key = Some(order_key(self.created_at));
        Ok(())
    }
}

/// Eight-digit display key: SHA-256 of the creation timestamp (RFC 3339,
/// microseconds, UTC) reduced modulo 10^8. Stable across processes; not unique.
pub fn order_key(created_at: DateTime<Utc>) -> String {
    let stamp = created_at.to_rfc3339_opts(SecondsFormat::Micros, true);
    let digest = Sha256::digest(stamp.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    format!("{:08}", u64::from_be_bytes(head) % 100_000_000)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Delivery and payment selection submitted at checkout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checkout {
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub address: Option<String>,
    pub post_index: Option<String>,
    pub pharmacy_id: Option<i64>,
    pub receipt_date: Option<NaiveDate>,
    pub receipt_time: Option<NaiveTime>,
}

impl Checkout {
    pub fn new(delivery_method: DeliveryMethod, payment_method: PaymentMethod) -> Self {
        Self { delivery_method, payment_method, address: None, post_index: None, pharmacy_id: None, receipt_date: None, receipt_time: None }
    }

    /// Checks method compatibility and the post index; returns the payment
    /// status the order takes on success.
    pub fn validate(&self) -> Result<PaymentStatus, CheckoutError> {
        let address = self.address.as_deref().map(str::trim).filter(|a| !a.is_empty());
        let index = self.post_index.as_deref().map(str::trim).filter(|i| !i.is_empty());
        let pickup = self.pharmacy_id.is_some() || self.receipt_date.is_some() || self.receipt_time.is_some();

        let status = match (self.delivery_method, self.payment_method) {
            (DeliveryMethod::DoorDelivery, PaymentMethod::Prepayment) => {
                if pickup { return Err(CheckoutError::PickupNotNeeded); }
                PaymentStatus::PendingPayment
            }
            (DeliveryMethod::SelfDelivery, PaymentMethod::UponReceipt) => {
                if address.is_some() || index.is_some() { return Err(CheckoutError::AddressNotNeeded); }
                PaymentStatus::UponReceipt
            }
            _ => return Err(CheckoutError::IncompatibleMethods),
        };

        if let Some(index) = index {
            PostIndex::new(index).map_err(CheckoutError::PostIndex)?;
        }
        Ok(status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError { IncompatibleMethods, AddressNotNeeded, PickupNotNeeded, PostIndex(PostIndexError) }
impl std::error::Error for CheckoutError {}
impl fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompatibleMethods => write!(f, "Sorry, you can't use this payment method with the delivery method here."),
            Self::AddressNotNeeded => write!(f, "You don't need to enter the address or post index if you use self-delivery."),
            Self::PickupNotNeeded => write!(f, "Pickup pharmacy and receipt time are only used with self-delivery."),
            Self::PostIndex(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product;

    fn line(position_id: i64, amount: i32, price: Decimal) -> OrderLine {
        OrderLine { position_id, amount, product: product::sample("Item", price, 10) }
    }

    fn door(address: &str, index: &str) -> Checkout {
        let mut c = Checkout::new(DeliveryMethod::DoorDelivery, PaymentMethod::Prepayment);
        c.address = Some(address.into());
        c.post_index = Some(index.into());
        c
    }

    #[test]
    fn test_total_price() {
        let order = Order::place(1, vec![line(1, 2, Decimal::new(1050, 2)), line(2, 3, Decimal::new(200, 2))]);
        assert_eq!(order.total_price(), Decimal::new(2700, 2));
        assert_eq!(order.numb_of_positions(), 2);
    }

    #[test]
    fn test_total_price_empty() {
        let order = Order::place(1, vec![]);
        assert_eq!(order.total_price(), Decimal::ZERO);
        assert_eq!(order.numb_of_positions(), 0);
    }

    #[test]
    fn test_door_delivery_prepayment() {
        let mut order = Order::place(1, vec![]);
        order.check_out(door("X", "12345")).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::PendingPayment);
        assert_eq!(order.payment_status.as_str(), "Pending payment");
        assert_eq!(order.address.as_deref(), Some("X"));
        assert_eq!(order.post_index.as_deref(), Some("12345"));
    }

    #[test]
    fn test_self_delivery_rejects_address() {
        let mut c = Checkout::new(DeliveryMethod::SelfDelivery, PaymentMethod::UponReceipt);
        c.address = Some("X".into());
        assert_eq!(c.validate(), Err(CheckoutError::AddressNotNeeded));
        assert!(CheckoutError::AddressNotNeeded.to_string().contains("don't need to enter the address"));
    }

    #[test]
    fn test_self_delivery_upon_receipt() {
        let mut order = Order::place(1, vec![]);
        let mut c = Checkout::new(DeliveryMethod::SelfDelivery, PaymentMethod::UponReceipt);
        c.address = Some("   ".into());
        c.pharmacy_id = Some(3);
        c.receipt_date = NaiveDate::from_ymd_opt(2026, 10, 20);
        c.receipt_time = NaiveTime::from_hms_opt(15, 30, 0);
        order.check_out(c).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::UponReceipt);
        assert_eq!(order.address, None);
        assert_eq!(order.receipt_datetime().unwrap().to_string(), "2026-10-20 15:30:00");
    }

    #[test]
    fn test_incompatible_methods() {
        for (d, p) in [
            (DeliveryMethod::DoorDelivery, PaymentMethod::UponReceipt),
            (DeliveryMethod::SelfDelivery, PaymentMethod::Prepayment),
        ] {
            assert_eq!(Checkout::new(d, p).validate(), Err(CheckoutError::IncompatibleMethods));
        }
    }

    #[test]
    fn test_long_post_index_rejected() {
        assert_eq!(door("X", "1234567").validate(), Err(CheckoutError::PostIndex(PostIndexError::TooLong)));
        let mut c = Checkout::new(DeliveryMethod::SelfDelivery, PaymentMethod::UponReceipt);
        c.post_index = Some("1234567".into());
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_pickup_rejected_for_door_delivery() {
        let mut c = door("X", "12345");
        c.pharmacy_id = Some(1);
        assert_eq!(c.validate(), Err(CheckoutError::PickupNotNeeded));
    }

    #[test]
    fn test_order_key_is_stable() {
        let mut order = Order::place(1, vec![]);
        order.before_save().unwrap();
        let key = order.key.clone().unwrap();
        assert_eq!(key.len(), 8);
        assert!(key.chars().all(|c| c.is_ascii_digit()));
        order.before_save().unwrap();
        assert_eq!(order.key.as_deref(), Some(key.as_str()));
        assert_eq!(order_key(order.created_at), key);
    }

    #[test]
    fn test_url_and_labels() {
        let mut order = Order::place(4, vec![]);
        order.id = 12;
        assert_eq!(order.url("http://127.0.0.1:8000"), "http://127.0.0.1:8000/orders/4/12/");
        assert_eq!("Self-delivery".parse::<DeliveryMethod>(), Ok(DeliveryMethod::SelfDelivery));
        assert!("Teleport".parse::<DeliveryMethod>().is_err());
        assert_eq!(DeliveryStatus::WithoutAction.to_string(), "Without action");
    }
}
