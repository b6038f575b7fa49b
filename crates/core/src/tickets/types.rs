//! Order and ticket records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::OrderError;

/// Order lifecycle state. Orders are created by the checkout flow and
/// flipped to `paid` by the payment webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Ticket state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Valid,
    CheckedIn,
    Cancelled,
}

/// An order as stored in the `orders` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub purchaser_first_name: String,
    #[serde(default)]
    pub purchaser_last_name: String,
    #[serde(default)]
    pub purchaser_email: String,
    /// Order total in cents.
    #[serde(default)]
    pub total_cents: i64,
    /// Attendee list, either a JSON array or its string encoding.
    #[serde(default)]
    pub attendees_json: Value,
    #[serde(default)]
    pub conference: Option<Value>,
    /// Set once every attendee has a ticket.
    #[serde(default)]
    pub tickets_issued_at: Option<String>,
}

impl Order {
    pub fn purchaser_name(&self) -> String {
        format!("{} {}", self.purchaser_first_name, self.purchaser_last_name)
            .trim()
            .to_string()
    }

    /// Conference relation id, if the order belongs to one.
    pub fn conference_id(&self) -> Option<String> {
        match self.conference.as_ref()? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            Value::Object(nested) => nested.get("id").and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Parse the attendee list, tolerating both array and string forms.
    pub fn attendees(&self) -> Result<Vec<Attendee>, OrderError> {
        parse_attendees(&self.attendees_json)
    }
}

/// One person attending on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    pub email: String,
    #[serde(default, alias = "ticketType", skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<String>,
}

impl Attendee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Parse `attendees_json`; an empty or unparseable list is an error.
pub fn parse_attendees(value: &Value) -> Result<Vec<Attendee>, OrderError> {
    let attendees: Vec<Attendee> = match value {
        Value::Array(_) => serde_json::from_value(value.clone())
            .map_err(|e| OrderError::InvalidAttendees(e.to_string()))?,
        Value::String(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)
            .map_err(|e| OrderError::InvalidAttendees(e.to_string()))?,
        _ => Vec::new(),
    };

    if attendees.is_empty() {
        return Err(OrderError::NoAttendees);
    }
    Ok(attendees)
}

/// A ticket as stored in the `tickets` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub order: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference: Option<String>,
    pub ticket_code: String,
    pub attendee_first_name: String,
    pub attendee_last_name: String,
    pub attendee_email: String,
    pub price_cents: i64,
    pub status: TicketStatus,
    /// QR code as an embeddable data URI; empty when rendering failed.
    pub qr_code: String,
}

impl Ticket {
    pub fn attendee_name(&self) -> String {
        format!("{} {}", self.attendee_first_name, self.attendee_last_name)
            .trim()
            .to_string()
    }
}
