//! Password hashing (bcrypt)

use bcrypt::{hash, verify, DEFAULT_COST};

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

pub fn verify_password(password: &str, hashed: &str) -> bool {
    verify(password, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hashed = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hashed));
        assert!(!verify_password("wrong", &hashed));
    }

    #[test]
    fn garbage_hash_does_not_verify() {
        assert!(!verify_password("s3cret", "not-a-bcrypt-hash"));
    }
}
