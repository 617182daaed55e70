//! Read-only order history.
//!
//! The dashboard has no order database of its own yet; the in-memory store
//! carries the artisan's sample order book and is the single source for both
//! the order listing and the units-sold tool.

use async_trait::async_trait;
use chrono::NaiveDate;
use kalakar_core::{Order, OrderId, OrderStatus, Price};
use thiserror::Error;
use tracing::instrument;

/// Errors from an order source.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// The backing store could not be reached.
    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

/// Source of past orders.
#[async_trait]
pub trait OrderHistory: Send + Sync {
    /// All orders, in store order.
    async fn orders(&self) -> Result<Vec<Order>, OrderStoreError>;

    /// Number of non-cancelled orders whose product name matches
    /// `product_name` exactly.
    async fn sales_volume_for_product(&self, product_name: &str) -> Result<u64, OrderStoreError> {
        let orders = self.orders().await?;
        Ok(orders.iter().filter(|o| o.is_sale_of(product_name)).count() as u64)
    }
}

/// Order history held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Vec<Order>,
}

/// (id, customer, product, (year, month, day), status, total in paise)
type SampleOrder = (&'static str, &'static str, &'static str, (i32, u32, u32), OrderStatus, i64);

const SAMPLE_ORDERS: &[SampleOrder] = &[
    ("ORD001", "Ravi Kumar", "Ganjifa Cards", (2023, 11, 23), OrderStatus::Fulfilled, 25_900),
    ("ORD002", "Priya Sharma", "Kolhapuri Chappals", (2023, 11, 20), OrderStatus::Shipped, 46_900),
    ("ORD003", "Amit Patel", "Ganjifa Cards", (2023, 11, 22), OrderStatus::Processing, 25_900),
    ("ORD004", "Sunita Devi", "Kolhapuri Chappals", (2023, 11, 21), OrderStatus::Fulfilled, 46_900),
    ("ORD005", "Vikram Singh", "Ganjifa Cards", (2023, 11, 24), OrderStatus::Pending, 25_900),
    ("ORD006", "Anjali Gupta", "Kolhapuri Chappals", (2023, 11, 19), OrderStatus::Cancelled, 46_900),
    ("ORD007", "Deepak Verma", "Ganjifa Cards", (2023, 11, 25), OrderStatus::Processing, 25_900),
    ("ORD008", "Meera Iyer", "Kolhapuri Chappals", (2023, 11, 18), OrderStatus::Fulfilled, 46_900),
    ("ORD009", "Rajesh Singh", "Handwoven Pashmina Shawl", (2023, 11, 26), OrderStatus::Shipped, 850_000),
    ("ORD010", "Sneha Reddy", "Handwoven Pashmina Shawl", (2023, 11, 27), OrderStatus::Processing, 850_000),
    ("ORD011", "Kavita Nair", "Handwoven Pashmina Shawl", (2023, 11, 28), OrderStatus::Fulfilled, 850_000),
    ("ORD012", "Suresh Menon", "Handwoven Pashmina Shawl", (2023, 11, 28), OrderStatus::Fulfilled, 850_000),
];

impl InMemoryOrderStore {
    /// Create a store over the given orders.
    #[must_use]
    pub const fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// Store seeded with the twelve sample orders (ORD001 to ORD012).
    #[must_use]
    pub fn with_sample_orders() -> Self {
        let orders = SAMPLE_ORDERS
            .iter()
            .map(|&(id, customer, product, (y, m, d), status, paise)| Order {
                id: OrderId::new(id),
                customer: customer.to_string(),
                product: product.to_string(),
                date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
                status,
                total: Price::inr_from_paise(paise),
            })
            .collect();
        Self::new(orders)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderHistory for InMemoryOrderStore {
    async fn orders(&self) -> Result<Vec<Order>, OrderStoreError> {
        Ok(self.orders.clone())
    }

    #[instrument(skip(self))]
    async fn sales_volume_for_product(&self, product_name: &str) -> Result<u64, OrderStoreError> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.is_sale_of(product_name))
            .count() as u64)
    }
}
