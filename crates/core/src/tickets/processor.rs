//! Expands a paid order into tickets and sends the ticket mails.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{info, warn};

use super::code::issue_code;
use super::qr::{render_qr_data_uri, verification_url};
use super::{Attendee, Order, OrderError, Ticket, TicketStatus};
use crate::items::{fields, Item, ItemQuery, ItemStore, StoreError};
use crate::mail::{send_tracked, templates, EmailMessage, Mailer};
use crate::metrics::TICKETS_ISSUED;

/// Split `total_cents` into `count` shares that sum to the total.
/// The first `total % count` shares carry one extra cent.
pub fn split_price(total_cents: i64, count: usize) -> Vec<i64> {
    if count == 0 {
        return Vec::new();
    }
    let n = count as i64;
    let base = total_cents.div_euclid(n);
    let remainder = total_cents.rem_euclid(n) as usize;
    (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Outcome of processing one order.
#[derive(Debug, Clone, Default)]
pub struct OrderSummary {
    pub order_id: String,
    pub tickets: Vec<Ticket>,
    pub emails_sent: usize,
    pub emails_failed: usize,
    /// Order was already marked as issued; nothing happened.
    pub skipped: bool,
}

pub struct OrderProcessor {
    store: Arc<dyn ItemStore>,
    mailer: Option<Arc<dyn Mailer>>,
    website_url: String,
}

impl OrderProcessor {
    pub fn new(
        store: Arc<dyn ItemStore>,
        mailer: Option<Arc<dyn Mailer>>,
        website_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            website_url: website_url.into(),
        }
    }

    /// Issue tickets for a paid order and send the confirmation mails.
    pub async fn process(&self, order_id: &str) -> Result<OrderSummary, OrderError> {
        let item = self
            .store
            .get("orders", order_id)?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;
        let order: Order = fields::to_record(item)?;

        if order.tickets_issued_at.is_some() {
            warn!(order_id, "Tickets already issued for order, skipping");
            return Ok(OrderSummary {
                order_id: order_id.to_string(),
                skipped: true,
                ..Default::default()
            });
        }

        let attendees = order.attendees()?;
        // A previous run may have stopped halfway; only the missing attendees get a ticket.
        let mut tickets = self
            .store
            .find("tickets", &ItemQuery::new().filter("order", order_id))?
            .into_iter()
            .map(fields::to_record::<Ticket>)
            .collect::<Result<Vec<_>, _>>()?;
        if !tickets.is_empty() {
            warn!(order_id, existing = tickets.len(), "Resuming partially issued order");
        }
        let issued = self.issue_tickets(&order, &attendees, tickets.len())?;
        TICKETS_ISSUED.inc_by(issued.len() as u64);
        info!(order_id, count = issued.len(), "Issued tickets");
        tickets.extend(issued);

        let mut summary = OrderSummary {
            order_id: order_id.to_string(),
            tickets,
            ..Default::default()
        };

        match &self.mailer {
            Some(mailer) => {
                let conference_title = self.conference_title(&order);
                let messages = ticket_messages(&order, &summary.tickets, conference_title.as_deref());
                let results =
                    join_all(messages.iter().map(|m| send_tracked(mailer.as_ref(), m))).await;
                for (message, result) in messages.iter().zip(results) {
                    match result {
                        Ok(()) => summary.emails_sent += 1,
                        Err(e) => {
                            summary.emails_failed += 1;
                            warn!(order_id, to = %message.to, template = %message.template, "Failed to send ticket mail: {}", e);
                        }
                    }
                }
            }
            None => warn!(order_id, "No mail transport configured, ticket mails not sent"),
        }

        let mut marker = Item::new();
        marker.insert(
            "tickets_issued_at".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        self.store.update("orders", order_id, &marker)?;

        Ok(summary)
    }

    /// Persist one ticket per attendee, starting at position `from`.
    /// Synchronous so the RNG never crosses an await point.
    fn issue_tickets(
        &self,
        order: &Order,
        attendees: &[Attendee],
        from: usize,
    ) -> Result<Vec<Ticket>, OrderError> {
        // Shares are positional so a resumed order still sums to the total.
        let prices = split_price(order.total_cents, attendees.len());
        let conference = order.conference_id();
        let mut rng = rand::thread_rng();
        let mut batch: HashSet<String> = HashSet::new();
        let mut tickets = Vec::with_capacity(attendees.len().saturating_sub(from));

        for (attendee, price_cents) in attendees.iter().zip(prices).skip(from) {
            let ticket_code = issue_code(&mut rng, now_millis(), |code| {
                if batch.contains(code) {
                    return Ok::<bool, StoreError>(true);
                }
                let taken = self
                    .store
                    .find("tickets", &ItemQuery::new().filter("ticket_code", code).limit(1))?;
                Ok(!taken.is_empty())
            })?;
            batch.insert(ticket_code.clone());

            let qr_code = match render_qr_data_uri(&verification_url(&self.website_url, &ticket_code)) {
                Ok(uri) => uri,
                Err(e) => {
                    warn!(code = %ticket_code, "QR code generation failed: {}", e);
                    String::new()
                }
            };

            let ticket = Ticket {
                id: String::new(),
                order: order.id.clone(),
                conference: conference.clone(),
                ticket_code,
                attendee_first_name: attendee.first_name.clone(),
                attendee_last_name: attendee.last_name.clone(),
                attendee_email: attendee.email.clone(),
                price_cents,
                status: TicketStatus::Valid,
                qr_code,
            };
            let stored = self.store.insert("tickets", fields::from_record(&ticket)?)?;
            tickets.push(fields::to_record(stored)?);
        }

        Ok(tickets)
    }

    fn conference_title(&self, order: &Order) -> Option<String> {
        let id = order.conference_id()?;
        match self.store.get("conferences", &id) {
            Ok(Some(conference)) => fields::text(&conference, "title"),
            Ok(None) => None,
            Err(e) => {
                warn!(conference = %id, "Failed to load conference: {}", e);
                None
            }
        }
    }
}

/// Purchaser confirmation plus one mail per attendee whose address differs
/// from the purchaser's (case-insensitive).
fn ticket_messages(order: &Order, tickets: &[Ticket], conference_title: Option<&str>) -> Vec<EmailMessage> {
    let purchaser_name = order.purchaser_name();
    let purchaser_email = order.purchaser_email.trim().to_lowercase();

    let mut messages = Vec::with_capacity(tickets.len() + 1);
    if !purchaser_email.is_empty() {
        messages.push(templates::ticket_confirmation(
            order.purchaser_email.trim(),
            &purchaser_name,
            conference_title,
            tickets,
        ));
    }
    for ticket in tickets {
        let email = ticket.attendee_email.trim().to_lowercase();
        if !email.is_empty() && email != purchaser_email {
            messages.push(templates::attendee_ticket(ticket, &purchaser_name, conference_title));
        }
    }
    messages
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::SqliteItemStore;
    use crate::testing::MockMailer;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_split_price_sums_to_total() {
        assert_eq!(split_price(10000, 2), vec![5000, 5000]);
        assert_eq!(split_price(10000, 3), vec![3334, 3333, 3333]);
        assert_eq!(split_price(5, 4), vec![2, 1, 1, 1]);
        assert_eq!(split_price(0, 3), vec![0, 0, 0]);
        assert!(split_price(100, 0).is_empty());
        for (total, count) in [(9999, 7), (1, 5), (123457, 11)] {
            assert_eq!(split_price(total, count).iter().sum::<i64>(), total);
        }
    }

    fn setup(mailer: Option<Arc<MockMailer>>) -> (Arc<SqliteItemStore>, OrderProcessor) {
        let store = Arc::new(SqliteItemStore::in_memory().unwrap());
        let processor = OrderProcessor::new(
            store.clone(),
            mailer.map(|m| m as Arc<dyn Mailer>),
            "https://www.programmier.bar",
        );
        (store, processor)
    }

    fn insert_order(store: &SqliteItemStore, attendees: serde_json::Value) {
        store
            .insert(
                "orders",
                fields::object(json!({
                    "id": "o1",
                    "purchaser_first_name": "Bea",
                    "purchaser_last_name": "Käufer",
                    "purchaser_email": "Bea@Example.com",
                    "total_cents": 10000,
                    "attendees_json": attendees,
                    "status": "paid",
                })),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_process_issues_tickets_and_mails() {
        let mailer = Arc::new(MockMailer::new());
        let (store, processor) = setup(Some(mailer.clone()));
        insert_order(
            &store,
            json!([
                {"first_name": "Bea", "last_name": "Käufer", "email": "bea@example.com"},
                {"first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com"}
            ]),
        );

        let summary = processor.process("o1").await.unwrap();

        assert_eq!(summary.tickets.len(), 2);
        assert_ne!(summary.tickets[0].ticket_code, summary.tickets[1].ticket_code);
        assert!(summary.tickets.iter().all(|t| t.price_cents == 5000));
        assert!(summary.tickets.iter().all(|t| t.qr_code.starts_with("data:image/svg+xml")));
        assert!(summary.tickets.iter().all(|t| !t.id.is_empty()));

        // Purchaser confirmation plus Ada; Bea's own ticket is covered by the confirmation.
        assert_eq!(summary.emails_sent, 2);
        let sent = mailer.sent_messages().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].template, "ticket_confirmation");
        assert_eq!(sent[1].to, "ada@example.com");

        let stored = store
            .find("tickets", &ItemQuery::new().filter("order", "o1"))
            .unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn test_process_is_skipped_when_tickets_exist() {
        let (store, processor) = setup(None);
        insert_order(
            &store,
            json!([{"first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com"}]),
        );

        let first = processor.process("o1").await.unwrap();
        assert_eq!(first.tickets.len(), 1);

        let second = processor.process("o1").await.unwrap();
        assert!(second.skipped);
        assert_eq!(
            store.find("tickets", &ItemQuery::new()).unwrap().len(),
            1
        );
    }

    /// Delegates to SQLite but fails the `fail_at`-th ticket insert.
    struct FlakyTicketStore {
        inner: SqliteItemStore,
        ticket_inserts: AtomicUsize,
        fail_at: usize,
    }

    impl ItemStore for FlakyTicketStore {
        fn insert(&self, collection: &str, item: Item) -> Result<Item, StoreError> {
            if collection == "tickets"
                && self.ticket_inserts.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_at
            {
                return Err(StoreError::Database("disk I/O error".to_string()));
            }
            self.inner.insert(collection, item)
        }

        fn get(&self, collection: &str, id: &str) -> Result<Option<Item>, StoreError> {
            self.inner.get(collection, id)
        }

        fn update(&self, collection: &str, id: &str, patch: &Item) -> Result<Item, StoreError> {
            self.inner.update(collection, id, patch)
        }

        fn find(&self, collection: &str, query: &ItemQuery) -> Result<Vec<Item>, StoreError> {
            self.inner.find(collection, query)
        }

        fn delete(&self, collection: &str, id: &str) -> Result<Item, StoreError> {
            self.inner.delete(collection, id)
        }
    }

    #[tokio::test]
    async fn test_interrupted_order_is_completed_on_retry() {
        let store = Arc::new(FlakyTicketStore {
            inner: SqliteItemStore::in_memory().unwrap(),
            ticket_inserts: AtomicUsize::new(0),
            fail_at: 2,
        });
        let mailer = Arc::new(MockMailer::new());
        let processor = OrderProcessor::new(
            store.clone(),
            Some(mailer.clone() as Arc<dyn Mailer>),
            "https://www.programmier.bar",
        );
        insert_order(
            &store.inner,
            json!([
                {"first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com"},
                {"first_name": "Grace", "last_name": "Hopper", "email": "grace@example.com"},
                {"first_name": "Linus", "last_name": "Torvalds", "email": "linus@example.com"}
            ]),
        );

        let first = processor.process("o1").await;
        assert!(matches!(first, Err(OrderError::Store(_))));
        let partial = store
            .find("tickets", &ItemQuery::new().filter("order", "o1"))
            .unwrap();
        assert_eq!(partial.len(), 1);
        assert!(mailer.sent_messages().await.is_empty());
        assert!(store.get("orders", "o1").unwrap().unwrap().get("tickets_issued_at").is_none());

        let retry = processor.process("o1").await.unwrap();
        assert!(!retry.skipped);
        assert_eq!(retry.tickets.len(), 3);
        assert_eq!(retry.tickets[0].ticket_code, partial[0]["ticket_code"].as_str().unwrap());
        assert_eq!(
            retry.tickets.iter().map(|t| t.price_cents).collect::<Vec<_>>(),
            vec![3334, 3333, 3333]
        );
        assert_eq!(
            retry.tickets.iter().map(|t| t.attendee_first_name.as_str()).collect::<Vec<_>>(),
            vec!["Ada", "Grace", "Linus"]
        );
        // Purchaser confirmation plus three attendees.
        assert_eq!(mailer.sent_messages().await.len(), 4);
        assert!(store
            .get("orders", "o1")
            .unwrap()
            .unwrap()
            .get("tickets_issued_at")
            .is_some_and(|v| v.is_string()));

        let third = processor.process("o1").await.unwrap();
        assert!(third.skipped);
        assert_eq!(
            store.find("tickets", &ItemQuery::new()).unwrap().len(),
            3
        );
        assert_eq!(mailer.sent_messages().await.len(), 4);
    }

    #[tokio::test]
    async fn test_process_fails_without_attendees() {
        let (store, processor) = setup(None);
        insert_order(&store, json!("[]"));

        let result = processor.process("o1").await;
        assert!(matches!(result, Err(OrderError::NoAttendees)));
        assert!(store.find("tickets", &ItemQuery::new()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_unknown_order() {
        let (_store, processor) = setup(None);
        assert!(matches!(
            processor.process("missing").await,
            Err(OrderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mail_failures_do_not_fail_order() {
        let mailer = Arc::new(MockMailer::new());
        mailer
            .set_next_error(crate::mail::MailError::Transport("smtp down".to_string()))
            .await;
        let (store, processor) = setup(Some(mailer.clone()));
        insert_order(
            &store,
            json!([{"first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com"}]),
        );

        let summary = processor.process("o1").await.unwrap();
        assert_eq!(summary.tickets.len(), 1);
        assert_eq!(summary.emails_failed, 1);
        assert_eq!(summary.emails_sent, 1);
    }
}
