//! Client-side checks run before `/login` and `/signup` are called.
//!
//! Messages are user-facing and returned through [`AuthError::Validation`].

use crate::error::{AuthError, Result};
use crate::types::{Credentials, SignupRequest};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // A dot with at least one character on each side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::validation("email", "Email is required"));
    }
    if !is_valid_email(email) {
        return Err(AuthError::validation(
            "email",
            "Please enter a valid email address",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(AuthError::validation("password", "Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::validation("name", "Full name is required"));
    }
    if name.chars().count() < MIN_NAME_LEN {
        return Err(AuthError::validation(
            "name",
            format!("Name must be at least {} characters", MIN_NAME_LEN),
        ));
    }
    Ok(())
}

/// Login form: both fields present, then e-mail shape, then password length.
pub fn validate_credentials(credentials: &Credentials) -> Result<()> {
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(AuthError::validation("credentials", "Please fill in all fields"));
    }
    validate_email(&credentials.email)?;
    validate_password(&credentials.password)
}

/// Signup form, checked in display order so the first problem is reported.
pub fn validate_signup(request: &SignupRequest) -> Result<()> {
    validate_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn field_of(result: Result<()>) -> &'static str {
        match result {
            Err(AuthError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));

        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada@.com"));
        assert!(!is_valid_email("ada@example."));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada @example.com"));
        assert!(!is_valid_email("ada.example.com"));
    }

    #[test]
    fn test_login_validation_order() {
        let missing = Credentials::new("", "secret1");
        assert_eq!(field_of(validate_credentials(&missing)), "credentials");

        let bad_email = Credentials::new("ada", "secret1");
        assert_eq!(field_of(validate_credentials(&bad_email)), "email");

        let short = Credentials::new("ada@example.com", "12345");
        assert_eq!(field_of(validate_credentials(&short)), "password");

        let ok = Credentials::new("ada@example.com", "123456");
        assert!(validate_credentials(&ok).is_ok());
    }

    #[test]
    fn test_signup_validation() {
        let short_name = SignupRequest::new("A", "ada@example.com", "secret1", Role::User);
        assert_eq!(field_of(validate_signup(&short_name)), "name");

        let blank_name = SignupRequest::new("   ", "ada@example.com", "secret1", Role::User);
        let err = validate_signup(&blank_name).unwrap_err();
        assert_eq!(err.to_string(), "Full name is required");

        let short_pw = SignupRequest::new("Ada", "ada@example.com", "abc", Role::Admin);
        let err = validate_signup(&short_pw).unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");

        let ok = SignupRequest::new("Ada", "ada@example.com", "abcdef", Role::Admin);
        assert!(validate_signup(&ok).is_ok());
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(validate_password("ééééé").is_err());
        assert!(validate_password("éééééé").is_ok());
    }
}
