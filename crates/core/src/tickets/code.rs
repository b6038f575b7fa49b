//! Ticket code generation.

use rand::Rng;
use tracing::warn;

use crate::metrics::TICKET_CODE_FALLBACKS;

/// Unambiguous alphabet: no `I`, `O`, `0` or `1`.
pub const TICKET_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Random characters after the `TKT-` prefix.
pub const TICKET_CODE_LENGTH: usize = 6;

/// Draws before falling back to a timestamp suffix.
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Draw a random `TKT-XXXXXX` code.
pub fn random_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let body: String = (0..TICKET_CODE_LENGTH)
        .map(|_| TICKET_CODE_ALPHABET[rng.gen_range(0..TICKET_CODE_ALPHABET.len())] as char)
        .collect();
    format!("TKT-{}", body)
}

/// Lowercase base-36 rendering.
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Draw codes until `is_taken` reports a free one. After
/// [`MAX_CODE_ATTEMPTS`] collisions, returns `TKT-XXXXXX-<base36 millis>`.
pub fn issue_code<R, F, E>(rng: &mut R, now_millis: u64, mut is_taken: F) -> Result<String, E>
where
    R: Rng + ?Sized,
    F: FnMut(&str) -> Result<bool, E>,
{
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = random_code(rng);
        if !is_taken(&code)? {
            return Ok(code);
        }
    }

    let code = format!("{}-{}", random_code(rng), to_base36(now_millis).to_uppercase());
    TICKET_CODE_FALLBACKS.inc();
    warn!(code = %code, "Ticket code space collided {} times, using timestamp suffix", MAX_CODE_ATTEMPTS);
    Ok(code)
}
