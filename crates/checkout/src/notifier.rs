//! Invoice delivery.

use std::sync::Arc;

use async_trait::async_trait;
use domain::Customer;
use store::Order;
use tokio::sync::RwLock;

use crate::error::NotifyError;
use crate::invoice::Invoice;

/// Trait for sending order invoices to customers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the invoice for a committed order.
    async fn send_invoice(&self, customer: &Customer, order: &Order) -> Result<(), NotifyError>;
}

/// Notifier that writes the rendered invoice to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send_invoice(&self, customer: &Customer, order: &Order) -> Result<(), NotifyError> {
        let invoice = Invoice::render(customer, order);
        tracing::info!(
            to = %invoice.to,
            subject = %invoice.subject,
            body = %invoice.body,
            "invoice sent"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<Invoice>,
    fail: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail every delivery.
    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    /// Returns the invoices delivered so far.
    pub async fn sent(&self) -> Vec<Invoice> {
        self.state.read().await.sent.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send_invoice(&self, customer: &Customer, order: &Order) -> Result<(), NotifyError> {
        let mut state = self.state.write().await;
        if state.fail {
            return Err(NotifyError::Delivery("SMTP connection refused".to_string()));
        }
        state.sent.push(Invoice::render(customer, order));
        Ok(())
    }
}
