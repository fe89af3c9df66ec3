use sha2::{Digest, Sha256};

/// Sign `data` with the shared secret the ingestion endpoint knows.
///
/// The endpoint recomputes `hex(SHA-256(secret + "--" + data))` and compares,
/// so this must stay byte-for-byte identical to its scheme. Either input being
/// empty produces no signature.
pub fn sign(data: &str, shared_secret: &str) -> String {
    if data.is_empty() || shared_secret.is_empty() {
        return String::new();
    }

    let mut hasher = Sha256::new();
    hasher.update(shared_secret.as_bytes());
    hasher.update(b"--");
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}
