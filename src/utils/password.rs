/// Characters accepted as the "special character" of a password
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Hash a password using bcrypt with the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify a password against a stored bcrypt hash
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hashed)
}

/// Check password composition rules.
///
/// Returns the list of missing requirements, empty when the password is accepted.
pub fn missing_password_requirements(password: &str) -> Vec<&'static str> {
    let mut missing = Vec::new();

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        missing.push("at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        missing.push("at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        missing.push("at least one number");
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        missing.push("at least one special character");
    }

    missing
}

/// Validate password strength, producing a readable message on failure
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    let missing = missing_password_requirements(password);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("Password must contain {}", missing.join(", ")))
    }
}

/// Minimal structural email check: one '@', non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    // bcrypt's minimum cost keeps the tests fast
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify_password() {
        let hashed = hash_password("P@ssw0rd1", TEST_COST).unwrap();

        assert!(!hashed.is_empty());
        assert!(verify_password("P@ssw0rd1", &hashed).unwrap());
        assert!(!verify_password("wrong_password", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("P@ssw0rd1", TEST_COST).unwrap();
        let second = hash_password("P@ssw0rd1", TEST_COST).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("P@ssw0rd1").is_ok());

        let err = validate_password_strength("password").unwrap_err();
        assert_eq!(
            err,
            "Password must contain at least one uppercase letter, at least one number, at least one special character"
        );

        assert_eq!(
            missing_password_requirements("PASSWORD1!"),
            vec!["at least one lowercase letter"]
        );
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("alice@x.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("alice@x"));
        assert!(!is_valid_email("alice@@x.com"));
        assert!(!is_valid_email("al ice@x.com"));
        assert!(!is_valid_email("alice@.com"));
    }
}
