use crate::domain::model::{Prospect, NULL_MARKER};

pub const COUNTRY_PREFIX: &str = "+33";
const MIN_PHONE_LEN: usize = 10;

/// Phone used for SMS: `telephone`, then `portable`, then `mobile`.
pub fn contact_phone(prospect: &Prospect) -> Option<String> {
    prospect.first_text(&["telephone", "portable", "mobile"])
}

/// True when the raw value is long enough to be worth a send attempt.
pub fn is_plausible(raw: &str) -> bool {
    let raw = raw.trim();
    raw != NULL_MARKER && raw.chars().count() >= MIN_PHONE_LEN
}

/// Normalizes a French number to international form.
///
/// Whitespace, dots and dashes are dropped. Numbers that already start with `+`
/// pass through, a leading `0` becomes `+33`, anything else gets `+33` prepended.
/// Returns `None` for values that fail [`is_plausible`].
pub fn normalize_phone(raw: &str) -> Option<String> {
    if !is_plausible(raw) {
        return None;
    }

    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '-')
        .collect();

    if compact.starts_with('+') {
        Some(compact)
    } else if let Some(rest) = compact.strip_prefix('0') {
        Some(format!("{}{}", COUNTRY_PREFIX, rest))
    } else {
        Some(format!("{}{}", COUNTRY_PREFIX, compact))
    }
}
