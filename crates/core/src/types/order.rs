//! Order records as listed on the artisan dashboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::id::OrderId;
use super::price::Price;
use super::status::OrderStatus;

/// A single customer order for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: String,
    pub product: String,
    pub date: NaiveDate,
    pub status: OrderStatus,
    pub total: Price,
}

impl Order {
    /// Whether this order is a non-cancelled sale of `product_name`.
    ///
    /// Product names are compared exactly, as stored.
    #[must_use]
    pub fn is_sale_of(&self, product_name: &str) -> bool {
        self.product == product_name && self.status.counts_as_sale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(product: &str, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new("ORD900"),
            customer: "Test Customer".to_string(),
            product: product.to_string(),
            date: NaiveDate::from_ymd_opt(2023, 11, 23).expect("valid date"),
            status,
            total: Price::inr_from_paise(25_900),
        }
    }

    #[test]
    fn test_is_sale_of_matches_exact_name() {
        let o = order("Ganjifa Cards", OrderStatus::Shipped);
        assert!(o.is_sale_of("Ganjifa Cards"));
        assert!(!o.is_sale_of("ganjifa cards"));
        assert!(!o.is_sale_of("Ganjifa"));
    }

    #[test]
    fn test_cancelled_order_is_not_a_sale() {
        let o = order("Ganjifa Cards", OrderStatus::Cancelled);
        assert!(!o.is_sale_of("Ganjifa Cards"));
    }

    #[test]
    fn test_order_serialization_shape() {
        let o = order("Kolhapuri Chappals", OrderStatus::Fulfilled);
        let json = serde_json::to_value(&o).expect("serialize");
        assert_eq!(json["id"], "ORD900");
        assert_eq!(json["status"], "Fulfilled");
        assert_eq!(json["date"], "2023-11-23");
    }
}
