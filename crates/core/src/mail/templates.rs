//! HTML and plain-text renderings of the messages the workflows send.

use std::fmt::Write;

use super::EmailMessage;
use crate::tickets::Ticket;

const SIGNATURE_TEXT: &str = "Viele Grüße\nDein programmier.bar Team";
const SIGNATURE_HTML: &str = "<p>Viele Grüße<br>Dein programmier.bar Team</p>";

/// Escape text for inclusion in HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render cents as a German price, e.g. `1234` -> `12,34 €`.
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}{},{:02} €", sign, cents / 100, cents % 100)
}

fn event_name(conference_title: Option<&str>) -> String {
    conference_title
        .map(|title| title.to_string())
        .unwrap_or_else(|| "die programmier.bar".to_string())
}

fn wrap_html(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"de\"><head><meta charset=\"utf-8\"></head>\
         <body style=\"font-family: sans-serif; line-height: 1.5;\">{}{}</body></html>",
        body, SIGNATURE_HTML
    )
}

fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p.trim()).replace('\n', "<br>")))
        .collect()
}

/// Purchaser confirmation listing every ticket of the order.
pub fn ticket_confirmation(
    to: &str,
    purchaser_name: &str,
    conference_title: Option<&str>,
    tickets: &[Ticket],
) -> EmailMessage {
    let event = event_name(conference_title);
    let total: i64 = tickets.iter().map(|t| t.price_cents).sum();

    let mut text = format!(
        "Hallo {},\n\nvielen Dank für deine Bestellung! Hier sind deine Tickets für {}:\n\n",
        purchaser_name, event
    );
    let mut rows = String::new();
    for ticket in tickets {
        let _ = writeln!(
            text,
            "- {} ({}): {}",
            ticket.attendee_name(),
            ticket.ticket_code,
            format_price(ticket.price_cents)
        );
        let _ = write!(
            rows,
            "<tr><td>{}</td><td><code>{}</code></td><td>{}</td></tr>",
            escape_html(&ticket.attendee_name()),
            escape_html(&ticket.ticket_code),
            format_price(ticket.price_cents)
        );
    }
    let _ = write!(
        text,
        "\nGesamt: {}\n\nJede Person erhält ihr Ticket mit QR-Code zusätzlich per E-Mail.\n\n{}",
        format_price(total),
        SIGNATURE_TEXT
    );

    let html = wrap_html(&format!(
        "<p>Hallo {},</p><p>vielen Dank für deine Bestellung! Hier sind deine Tickets für {}:</p>\
         <table cellpadding=\"4\"><tr><th>Name</th><th>Code</th><th>Preis</th></tr>{}</table>\
         <p><strong>Gesamt: {}</strong></p>\
         <p>Jede Person erhält ihr Ticket mit QR-Code zusätzlich per E-Mail.</p>",
        escape_html(purchaser_name),
        escape_html(&event),
        rows,
        format_price(total)
    ));

    EmailMessage {
        to: to.to_string(),
        reply_to: None,
        subject: format!("Deine Tickets für {}", event),
        html,
        text,
        template: "ticket_confirmation".to_string(),
    }
}

/// Ticket for a single attendee, including the QR code when available.
pub fn attendee_ticket(
    ticket: &Ticket,
    purchaser_name: &str,
    conference_title: Option<&str>,
) -> EmailMessage {
    let event = event_name(conference_title);

    let text = format!(
        "Hallo {},\n\n{} hat ein Ticket für {} für dich gebucht.\n\n\
         Dein Ticket-Code: {}\n\nBitte zeige den Code oder den QR-Code beim Einlass vor.\n\n{}",
        ticket.attendee_first_name, purchaser_name, event, ticket.ticket_code, SIGNATURE_TEXT
    );

    let qr = if ticket.qr_code.is_empty() {
        String::new()
    } else {
        format!(
            "<p><img src=\"{}\" alt=\"QR-Code {}\" width=\"200\" height=\"200\"></p>",
            ticket.qr_code,
            escape_html(&ticket.ticket_code)
        )
    };

    let html = wrap_html(&format!(
        "<p>Hallo {},</p><p>{} hat ein Ticket für {} für dich gebucht.</p>\
         <p>Dein Ticket-Code: <strong><code>{}</code></strong></p>{}\
         <p>Bitte zeige den Code oder den QR-Code beim Einlass vor.</p>",
        escape_html(&ticket.attendee_first_name),
        escape_html(purchaser_name),
        escape_html(&event),
        escape_html(&ticket.ticket_code),
        qr
    ));

    EmailMessage {
        to: ticket.attendee_email.clone(),
        reply_to: None,
        subject: format!("Dein Ticket für {}", event),
        html,
        text,
        template: "attendee_ticket".to_string(),
    }
}

/// Contact form message forwarded to the team. Replies go to the sender.
pub fn contact_form(to: &str, name: &str, email: &str, message: &str) -> EmailMessage {
    let text = format!(
        "Neue Nachricht über das Kontaktformular\n\nName: {}\nE-Mail: {}\n\n{}\n",
        name, email, message
    );
    let html = wrap_html(&format!(
        "<p>Neue Nachricht über das Kontaktformular</p>\
         <p><strong>Name:</strong> {}<br><strong>E-Mail:</strong> {}</p>{}",
        escape_html(name),
        escape_html(email),
        paragraphs(message)
    ));

    EmailMessage {
        to: to.to_string(),
        reply_to: Some(email.to_string()),
        subject: format!("Kontaktanfrage von {}", name),
        html,
        text,
        template: "contact".to_string(),
    }
}

/// Approved heise document for a podcast episode.
pub fn heise_document(to: &str, podcast_title: &str, document: &str) -> EmailMessage {
    let text = format!(
        "Hallo,\n\nanbei der freigegebene Text zur Folge \"{}\":\n\n{}\n\n{}",
        podcast_title, document, SIGNATURE_TEXT
    );
    let html = wrap_html(&format!(
        "<p>Hallo,</p><p>anbei der freigegebene Text zur Folge „{}“:</p><hr>{}<hr>",
        escape_html(podcast_title),
        paragraphs(document)
    ));

    EmailMessage {
        to: to.to_string(),
        reply_to: None,
        subject: format!("programmier.bar: {}", podcast_title),
        html,
        text,
        template: "heise_document".to_string(),
    }
}

/// Team notification after a speaker submitted the portal form.
pub fn portal_submission(to: &str, speaker_name: &str, speaker_id: &str) -> EmailMessage {
    let text = format!(
        "{} hat das Speaker-Portal ausgefüllt (Speaker-ID {}).\n\
         Bitte prüfe die Angaben und gib sie frei.\n",
        speaker_name, speaker_id
    );
    let html = wrap_html(&format!(
        "<p><strong>{}</strong> hat das Speaker-Portal ausgefüllt (Speaker-ID {}).</p>\
         <p>Bitte prüfe die Angaben und gib sie frei.</p>",
        escape_html(speaker_name),
        escape_html(speaker_id)
    ));

    EmailMessage {
        to: to.to_string(),
        reply_to: None,
        subject: format!("Speaker-Portal: {} hat Daten eingereicht", speaker_name),
        html,
        text,
        template: "portal_submission".to_string(),
    }
}
