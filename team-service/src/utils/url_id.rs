//! Team URL identifier rules.

const RESERVED_URL_IDS: &[&str] = &[
    "www", "web", "admin", "support", "notify", "test", "demo", "mail", "team", "channel",
    "internal", "localhost", "stag", "post", "cluster", "api",
];

pub const MIN_URL_ID_LENGTH: usize = 4;
pub const MAX_URL_ID_LENGTH: usize = 64;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// True when `url_id` is a reserved word, or starts with one followed by a dash
/// (`api-v2`), compared case-insensitively.
pub fn is_reserved_url_id(url_id: &str) -> bool {
    let url_id = url_id.trim().to_lowercase();
    RESERVED_URL_IDS.iter().any(|reserved| {
        url_id == *reserved
            || url_id
                .strip_prefix(reserved)
                .is_some_and(|rest| rest.starts_with('-'))
    })
}

/// Lower-case ASCII letters, digits and dashes; starts and ends with an
/// alphanumeric; no doubled dashes.
pub fn is_valid_url_id(url_id: &str) -> bool {
    if url_id.len() < MIN_URL_ID_LENGTH || url_id.len() > MAX_URL_ID_LENGTH {
        return false;
    }

    let bytes = url_id.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    edge_ok(bytes[0])
        && edge_ok(bytes[bytes.len() - 1])
        && bytes
            .iter()
            .all(|&b| edge_ok(b) || b == b'-')
        && !url_id.contains("--")
}
