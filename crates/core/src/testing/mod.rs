//! Testing utilities and mock implementations.
//!
//! Mocks for every external service trait plus record fixtures, so hooks
//! and endpoints can be exercised without SMTP, social networks or
//! HappyScribe.
//!
//! # Example
//!
//! ```rust,ignore
//! use programmierbar_core::testing::{MockMailer, MockSocialPublisher};
//!
//! let mailer = Arc::new(MockMailer::new());
//! // run the workflow...
//! assert_eq!(mailer.sent_messages().await.len(), 2);
//! ```

mod memory_files;
mod mock_mailer;
mod mock_social;
mod mock_transcriber;

pub use memory_files::MemoryFileStore;
pub use mock_mailer::{MockMailer, RecordedEmail};
pub use mock_social::MockSocialPublisher;
pub use mock_transcriber::MockTranscriber;

/// Record fixtures.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::items::{fields, Item};

    /// Attendee entry for `attendees_json`.
    pub fn attendee(first_name: &str, last_name: &str, email: &str) -> Value {
        json!({"first_name": first_name, "last_name": last_name, "email": email})
    }

    /// Pending order from Bea Käufer over `total_cents`.
    pub fn order(id: &str, total_cents: i64, attendees: Vec<Value>) -> Item {
        fields::object(json!({
            "id": id,
            "purchaser_first_name": "Bea",
            "purchaser_last_name": "Käufer",
            "purchaser_email": "bea@example.com",
            "total_cents": total_cents,
            "attendees_json": attendees,
            "status": "pending",
        }))
    }

    pub fn podcast(id: &str, title: &str) -> Item {
        fields::object(json!({
            "id": id,
            "type": "deep_dive",
            "number": 150,
            "title": title,
            "publishing_status": "content_review",
        }))
    }

    /// Generated content item in status `generated`.
    pub fn generated_content(id: &str, podcast: &str, content_type: &str, text: &str) -> Item {
        fields::object(json!({
            "id": id,
            "podcast": podcast,
            "content_type": content_type,
            "status": "generated",
            "generated_text": text,
        }))
    }

    pub fn speaker(first_name: &str, last_name: &str) -> Item {
        fields::object(json!({"first_name": first_name, "last_name": last_name}))
    }

    pub fn conference(id: &str, title: &str, slug: &str) -> Item {
        fields::object(json!({"id": id, "title": title, "slug": slug}))
    }
}
