use blake3::Hasher;

/// Full 32-byte BLAKE3 digest of canonical query text.
#[inline]
pub fn hash_canonical(canonical: &str) -> [u8; 32] {
    *blake3::hash(canonical.as_bytes()).as_bytes()
}

/// Hashes `(name, rendered value)` pairs in iteration order, truncated to 64 bits.
///
/// Callers pass pairs in a stable order (e.g. from a `BTreeMap`). Each field is
/// length-prefixed so `("ab", "c")` and `("a", "bc")` cannot collide. The value only
/// separates bindings that share the same canonical text, so a wrong hit needs two
/// bindings of one query to collide, which at 64 bits is negligible (`P ≈ n² / 2^65`).
pub fn hash_bindings<'a>(bindings: impl IntoIterator<Item = (&'a str, &'a str)>) -> u64 {
    let mut hasher = Hasher::new();
    for (name, value) in bindings {
        hasher.update(&(name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }
    truncate_to_u64(&hasher.finalize())
}

#[inline]
fn truncate_to_u64(hash: &blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Digest identifying one cache slot.
///
/// Combines the canonical text, the optional binding fingerprint and the
/// access-control flag, so results fetched under different enforcement or different
/// bindings never share a slot.
#[inline]
pub fn hash_cache_key(
    canonical: &str,
    bindings_hash: Option<u64>,
    enforce_access_control: bool,
) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(canonical.as_bytes());
    hasher.update(b"|");
    match bindings_hash {
        Some(h) => {
            hasher.update(b"b");
            hasher.update(&h.to_le_bytes());
        }
        None => {
            hasher.update(b"-");
        }
    }
    hasher.update(b"|");
    hasher.update(&[u8::from(enforce_access_control)]);
    *hasher.finalize().as_bytes()
}

/// Lower-case hex rendering of a 32-byte digest.
#[inline]
pub fn digest_hex(digest: &[u8; 32]) -> String {
    blake3::Hash::from_bytes(*digest).to_hex().to_string()
}
