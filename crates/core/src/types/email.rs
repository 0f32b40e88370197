//! Login email address.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("Veuillez saisir votre adresse e-mail")]
    Empty,
    #[error("L'adresse e-mail ne doit pas dépasser {max} caractères")]
    TooLong { max: usize },
    #[error("Adresse e-mail invalide")]
    Malformed,
}

/// An email address as typed into the login form.
///
/// Surrounding whitespace is stripped and the domain is lower-cased; the local
/// part is left untouched because the backend compares it verbatim. The error
/// messages are user-facing and shown on the login form.
///
/// ```
/// use innovation_portal_core::Email;
///
/// let email = Email::parse("  Amina@Corp.Example ").unwrap();
/// assert_eq!(email.as_str(), "Amina@corp.example");
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("amina").is_err());
/// assert!(Email::parse("amina@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an `Email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, or is not of
    /// the form `local@domain` with both parts non-empty.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = trimmed.rsplit_once('@').ok_or(EmailError::Malformed)?;
        if local.is_empty() || domain.is_empty() || domain.contains(char::is_whitespace) {
            return Err(EmailError::Malformed);
        }

        Ok(Self(format!("{local}@{}", domain.to_lowercase())))
    }

    /// Returns the normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_domain_only() {
        let email = Email::parse("\tJean.Dupont@Innov.Example\n").expect("valid");
        assert_eq!(email.as_str(), "Jean.Dupont@innov.example");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["jean", "@innov.example", "jean@", "jean@innov example"] {
            assert_eq!(Email::parse(raw), Err(EmailError::Malformed), "{raw}");
        }
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let long = format!("{}@innov.example", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email: Email = "a@b.c".parse().expect("valid");
        assert_eq!(serde_json::to_string(&email).expect("json"), "\"a@b.c\"");
    }
}
