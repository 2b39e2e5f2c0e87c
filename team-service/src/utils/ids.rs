use rand::Rng;

/// Length of every team, user and channel id.
pub const ID_LENGTH: usize = 26;

// 32 symbols, so each character carries 5 bits (130 bits per id).
const ID_ALPHABET: &[u8] = b"abcdefghijkmnopqrstuwxyz13456789";

pub fn new_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}
