//! Ticket issuance for paid orders.
//!
//! When an order flips to `paid`, [`TicketOrderHook`] expands it into one
//! ticket per attendee with a unique code and QR image, then mails the
//! purchaser and every other attendee.

mod code;
mod processor;
mod qr;
mod types;

pub use code::{issue_code, random_code, to_base36, MAX_CODE_ATTEMPTS, TICKET_CODE_ALPHABET};
pub use processor::{split_price, OrderProcessor, OrderSummary};
pub use qr::{render_qr_data_uri, verification_url};
pub use types::{parse_attendees, Attendee, Order, OrderStatus, Ticket, TicketStatus};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::error;

use crate::hooks::{ActionHook, HookContext, HookError, HookMeta};
use crate::items::{fields, Item, StoreError};
use crate::metrics::ORDERS_PROCESSED;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Order has no attendees")]
    NoAttendees,

    #[error("Invalid attendee list: {0}")]
    InvalidAttendees(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Action on `orders.items.update` that issues tickets once the payload
/// sets `status = paid`. Each order is processed on its own; a failing
/// order is logged and the remaining keys still run.
pub struct TicketOrderHook {
    processor: Arc<OrderProcessor>,
}

impl TicketOrderHook {
    pub fn new(processor: Arc<OrderProcessor>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl ActionHook for TicketOrderHook {
    fn name(&self) -> &'static str {
        "ticket_order"
    }

    async fn action(&self, payload: &Item, meta: &HookMeta, _ctx: &HookContext) -> Result<(), HookError> {
        if fields::text(payload, "status").as_deref() != Some(OrderStatus::Paid.as_str()) {
            return Ok(());
        }

        for order_id in &meta.keys {
            match self.processor.process(order_id).await {
                Ok(summary) if summary.skipped => {
                    ORDERS_PROCESSED.with_label_values(&["skipped"]).inc();
                }
                Ok(_) => {
                    ORDERS_PROCESSED.with_label_values(&["issued"]).inc();
                }
                Err(e) => {
                    ORDERS_PROCESSED.with_label_values(&["failed"]).inc();
                    error!(order_id = %order_id, "Failed to process paid order: {}", e);
                }
            }
        }

        Ok(())
    }
}
