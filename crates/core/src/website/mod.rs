//! Operations behind the public website endpoints.

mod conference;
mod contact;

pub use conference::{find_conference, ConferenceWithAgenda};
pub use contact::{submit_contact, ContactError, ContactForm, ContactOutcome};
