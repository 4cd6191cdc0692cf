use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "12345678", "123456789", "1234567890", "qwerty123", "iloveyou",
    "admin123", "letmein1", "11111111", "abc12345", "sunshine",
];

/// Password strength rules checked before a user row is created.
/// All violations are reported at once.
pub fn validate_password(plain: &str) -> Result<(), String> {
    let mut problems = Vec::new();

    if plain.chars().count() < 8 {
        problems.push("This password is too short. It must contain at least 8 characters.");
    }
    if !plain.is_empty() && plain.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.");
    }
    if COMMON_PASSWORDS.contains(&plain.to_lowercase().as_str()) {
        problems.push("This password is too common.");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join(" "))
    }
}

#[cfg(test)]
mod hash_tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        let msg = err.to_string();
        assert!(!msg.is_empty());
    }
}

#[cfg(test)]
mod strength_tests {
    use super::*;

    #[test]
    fn short_password_is_rejected() {
        let err = validate_password("abc1234").unwrap_err();
        assert!(err.contains("too short"));
    }

    #[test]
    fn numeric_password_is_rejected() {
        let err = validate_password("81726354").unwrap_err();
        assert!(err.contains("entirely numeric"));
    }

    #[test]
    fn common_password_is_rejected() {
        let err = validate_password("Password1").unwrap_err();
        assert!(err.contains("too common"));
    }

    #[test]
    fn short_numeric_password_reports_both_problems() {
        let err = validate_password("1234").unwrap_err();
        assert!(err.contains("too short"));
        assert!(err.contains("entirely numeric"));
    }

    #[test]
    fn reasonable_password_passes() {
        assert!(validate_password("tape-loop-47-minutes").is_ok());
    }
}
