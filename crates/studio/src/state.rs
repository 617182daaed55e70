//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StudioConfig;
use crate::flows::Flows;
use crate::services::OrderHistory;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StudioConfig,
    flows: Flows,
    orders: Arc<dyn OrderHistory>,
}

impl AppState {
    #[must_use]
    pub fn new(config: StudioConfig, flows: Flows, orders: Arc<dyn OrderHistory>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                flows,
                orders,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StudioConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn flows(&self) -> &Flows {
        &self.inner.flows
    }

    #[must_use]
    pub fn orders(&self) -> &dyn OrderHistory {
        self.inner.orders.as_ref()
    }
}
