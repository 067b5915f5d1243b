use sha2::{Digest, Sha256};

pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// First four digest bytes as hex; enough to tell correlation keys apart in logs.
pub fn short_key_hash(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!(
        "{:02x}{:02x}{:02x}{:02x}",
        digest[0], digest[1], digest[2], digest[3]
    )
}

#[cfg(test)]
mod tests {
    use super::{sha256_hex, short_key_hash};

    #[test]
    fn unit_sha256_hex_matches_known_digest() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn unit_short_key_hash_is_prefix_of_full_digest() {
        assert_eq!(short_key_hash("abc"), "ba7816bf");
    }
}
