//! Password validation: hard gates for vault creation plus a strength report

use secrecy::{ExposeSecret, SecretString};

use crate::error::{VaultError, VaultResult};

/// Minimum password length accepted at vault creation.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Gate a new password at vault-creation time.
///
/// Mismatch is checked before weakness so a typo in the confirmation never
/// reads as a strength problem.
pub fn check_new_password(password: &SecretString, confirm: &SecretString) -> VaultResult<()> {
    if password.expose_secret() != confirm.expose_secret() {
        return Err(VaultError::PasswordMismatch);
    }
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(VaultError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Strength band derived from the check score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

/// Non-blocking strength report: five checks, score 0-5.
#[derive(Debug, Clone)]
pub struct StrengthReport {
    pub score: u8,
    pub strength: Strength,
    pub has_length: bool,
    pub has_uppercase: bool,
    pub has_lowercase: bool,
    pub has_digit: bool,
    pub has_special: bool,
    pub recommendations: Vec<&'static str>,
}

const SPECIAL: &str = "!@#$%^&*(),.?\":{}|<>";

/// Score a password for display. Advisory only; the hard gate is
/// [`check_new_password`].
pub fn strength_report(password: &SecretString) -> StrengthReport {
    let pw = password.expose_secret();

    let has_length = pw.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_uppercase = pw.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = pw.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = pw.chars().any(|c| c.is_ascii_digit());
    let has_special = pw.chars().any(|c| SPECIAL.contains(c));

    let score = [has_length, has_uppercase, has_lowercase, has_digit, has_special]
        .iter()
        .filter(|&&c| c)
        .count() as u8;

    let strength = match score {
        0..=2 => Strength::Weak,
        3..=4 => Strength::Medium,
        _ => Strength::Strong,
    };

    let recommendations = if score < 5 {
        vec![
            "Use at least 8 characters",
            "Include uppercase and lowercase letters",
            "Add numbers and special characters",
        ]
    } else {
        Vec::new()
    };

    StrengthReport {
        score,
        strength,
        has_length,
        has_uppercase,
        has_lowercase,
        has_digit,
        has_special,
        recommendations,
    }
}
