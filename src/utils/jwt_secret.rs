use rand::Rng;

/// Generate a random 32-byte signing secret, hex encoded
pub fn generate_jwt_secret() -> String {
    let mut rng = rand::thread_rng();
    let secret: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    hex::encode(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_jwt_secret() {
        let first = generate_jwt_secret();
        let second = generate_jwt_secret();

        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
