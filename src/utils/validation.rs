use crate::utils::error::{FunnelError, Result};
use url::Url;

/// Longest alphanumeric sender Brevo accepts for SMS.
const MAX_SMS_SENDER_LEN: usize = 11;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> FunnelError {
    FunnelError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// API bases must be absolute http(s) URLs.
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }
    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

/// Credentials are optional in the config but required by the stage that uses them.
pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| FunnelError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// Loose `local@domain.tld` shape check for the sender address.
pub fn validate_email(field_name: &str, value: &str) -> Result<()> {
    let valid = value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
        && !value.contains(char::is_whitespace);
    if !valid {
        return Err(invalid(field_name, value, "Expected an email address"));
    }
    Ok(())
}

/// Brevo SMS sender: 1 to 11 ASCII letters, digits or spaces.
pub fn validate_sms_sender(field_name: &str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len == 0 || len > MAX_SMS_SENDER_LEN {
        return Err(invalid(
            field_name,
            value,
            format!("Sender must be 1 to {} characters", MAX_SMS_SENDER_LEN),
        ));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
        return Err(invalid(
            field_name,
            value,
            "Sender may only contain letters, digits and spaces",
        ));
    }
    Ok(())
}

/// Repository names only take `[A-Za-z0-9._-]`; the site id is appended to this prefix.
pub fn validate_repo_prefix(field_name: &str, value: &str) -> Result<()> {
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid(
            field_name,
            value,
            "Only letters, digits, '.', '_' and '-' are allowed in repository names",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("github.api_base", "https://api.github.com").is_ok());
        assert!(validate_url("github.api_base", "http://localhost:8080").is_ok());
        assert!(validate_url("github.api_base", "").is_err());
        assert!(validate_url("github.api_base", "invalid-url").is_err());
        assert!(validate_url("github.api_base", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("pipeline.prospects_per_run", 5, 1).is_ok());
        assert!(validate_positive_number("pipeline.prospects_per_run", 0, 1).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let token: Option<String> = None;
        let err = validate_required_field("github.token", &token).unwrap_err();
        assert!(matches!(err, FunnelError::MissingConfigError { field } if field == "github.token"));

        let token = Some("ghp_x".to_string());
        assert_eq!(validate_required_field("github.token", &token).unwrap(), "ghp_x");
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("schedule.hour", 23, 0, 23).is_ok());
        assert!(validate_range("schedule.hour", 24, 0, 23).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("brevo.sender_email", "contact@amens.fr").is_ok());
        assert!(validate_email("brevo.sender_email", "contact").is_err());
        assert!(validate_email("brevo.sender_email", "@amens.fr").is_err());
        assert!(validate_email("brevo.sender_email", "a b@amens.fr").is_err());
    }

    #[test]
    fn test_validate_sms_sender() {
        assert!(validate_sms_sender("brevo.sender_sms", "Amens").is_ok());
        assert!(validate_sms_sender("brevo.sender_sms", "").is_err());
        assert!(validate_sms_sender("brevo.sender_sms", "AmensBienEtre").is_err());
        assert!(validate_sms_sender("brevo.sender_sms", "Amens-Pro").is_err());
    }

    #[test]
    fn test_validate_repo_prefix() {
        assert!(validate_repo_prefix("github.repo_prefix", "sitevitrine-").is_ok());
        assert!(validate_repo_prefix("github.repo_prefix", "").is_ok());
        assert!(validate_repo_prefix("github.repo_prefix", "site vitrine/").is_err());
    }
}
