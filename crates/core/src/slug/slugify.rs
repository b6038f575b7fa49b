use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '/' | '.' | '-')
}

/// Turn arbitrary text into a URL-safe slug.
///
/// German umlauts are transliterated, other diacritics are dropped, anything
/// outside `[a-z0-9/.\- ]` is removed and runs of separators become a
/// single hyphen.
pub fn slugify(text: &str) -> String {
    let transliterated: String = text
        .to_lowercase()
        .chars()
        .flat_map(|c| match c {
            'ä' => vec!['a', 'e'],
            'ö' => vec!['o', 'e'],
            'ü' => vec!['u', 'e'],
            'ß' => vec!['s', 's'],
            other => vec![other],
        })
        .collect();

    let cleaned: String = transliterated
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || is_separator(*c))
        .collect();

    let mut slug = String::with_capacity(cleaned.len());
    let mut pending_separator = false;
    for c in cleaned.trim_matches(is_separator).chars() {
        if is_separator(c) {
            pending_separator = true;
            continue;
        }
        if pending_separator {
            slug.push('-');
            pending_separator = false;
        }
        slug.push(c);
    }
    slug
}
