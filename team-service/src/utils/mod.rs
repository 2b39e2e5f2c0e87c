pub mod ids;
pub mod password;
pub mod url_id;

pub use ids::{is_valid_id, new_id, ID_LENGTH};
pub use password::{hash_password, verify_password, Password};
pub use url_id::{is_reserved_url_id, is_valid_url_id, normalize_email};
