use sha2::{Digest, Sha256};

/// Content-addressed identity: lower-case hex SHA-256 over a node's full
/// name path. Equal paths always hash to equal identities, which is what
/// makes persistence idempotent.
pub type Identity = String;

/// Hash `parts` in order into one identity string.
pub fn content_identity<I, S>(parts: I) -> Identity
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
