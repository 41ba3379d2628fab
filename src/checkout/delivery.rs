//! Delivery methods
//!
//! The checkout's delivery choice as a tagged union. Each variant knows its
//! own delivery price contribution; selection is validated against the
//! currently valid methods rather than silently cleared.

use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;

new_key_type! {
    /// Shipping Method Key
    pub struct ShippingMethodKey;
}

new_key_type! {
    /// Collection Point Key
    pub struct CollectionPointKey;
}

/// A shipping method listed in the checkout's channel.
#[derive(Debug, Clone)]
pub struct ShippingMethod<'a> {
    key: ShippingMethodKey,
    name: String,
    price: Money<'a, Currency>,
}

impl<'a> ShippingMethod<'a> {
    /// Create a shipping method with its channel-listed price.
    pub fn new(key: ShippingMethodKey, name: impl Into<String>, price: Money<'a, Currency>) -> Self {
        Self {
            key,
            name: name.into(),
            price,
        }
    }

    /// Return the method key.
    pub fn key(&self) -> ShippingMethodKey {
        self.key
    }

    /// Return the method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the channel-listed price.
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }
}

/// A warehouse pickup point. Pickup carries no delivery charge.
#[derive(Debug, Clone)]
pub struct CollectionPoint {
    key: CollectionPointKey,
    name: String,
}

impl CollectionPoint {
    /// Create a collection point.
    pub fn new(key: CollectionPointKey, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
        }
    }

    /// Return the warehouse key.
    pub fn key(&self) -> CollectionPointKey {
        self.key
    }

    /// Return the collection point name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The checkout's delivery choice.
#[derive(Debug, Clone, Default)]
pub enum DeliveryMethod<'a> {
    /// No delivery method chosen yet.
    #[default]
    None,

    /// Deliver with a shipping method.
    Shipping(ShippingMethod<'a>),

    /// Customer picks the order up from a warehouse.
    CollectionPoint(CollectionPoint),
}

impl<'a> DeliveryMethod<'a> {
    /// The delivery price contribution of this method, before any shipping
    /// voucher.
    ///
    /// No method and pickup cost nothing; a shipping method costs its listed
    /// price, or nothing when the cart needs no physical delivery.
    pub fn delivery_price(
        &self,
        currency: &'static Currency,
        shipping_required: bool,
    ) -> Money<'a, Currency> {
        match self {
            DeliveryMethod::None | DeliveryMethod::CollectionPoint(_) => {
                Money::from_minor(0, currency)
            }
            DeliveryMethod::Shipping(method) => {
                if shipping_required {
                    *method.price()
                } else {
                    Money::from_minor(0, currency)
                }
            }
        }
    }

    /// Whether this choice is valid against the current shipping method list.
    pub fn is_valid_choice(&self, valid_shipping: &[ShippingMethodKey]) -> bool {
        match self {
            DeliveryMethod::None | DeliveryMethod::CollectionPoint(_) => true,
            DeliveryMethod::Shipping(method) => valid_shipping.contains(&method.key()),
        }
    }

    /// The pickup warehouse to filter stock lookups by, if any.
    pub fn collection_warehouse(&self) -> Option<CollectionPointKey> {
        match self {
            DeliveryMethod::CollectionPoint(point) => Some(point.key()),
            _ => None,
        }
    }

    /// A display name for the chosen method.
    pub fn name(&self) -> &str {
        match self {
            DeliveryMethod::None => "none",
            DeliveryMethod::Shipping(method) => method.name(),
            DeliveryMethod::CollectionPoint(point) => point.name(),
        }
    }
}
