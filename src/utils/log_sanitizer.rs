//! Masking of personal data and secrets before they reach the logs.

const VISIBLE_CHARS: usize = 3;
const VISIBLE_TOKEN_CHARS: usize = 6;

fn prefix(value: &str, chars: usize) -> &str {
    match value.char_indices().nth(chars) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Mask an email address for safe logging.
///
/// Keeps at most three characters of the local part and the whole domain:
/// `user@example.com` becomes `use***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => format!("{}***@{}", prefix(local, VISIBLE_CHARS), domain),
        None => format!("{}***", prefix(email, VISIBLE_CHARS)),
    }
}

/// Mask an opaque token, keeping enough to correlate log lines.
pub fn mask_token(token: &str) -> String {
    format!("{}...", prefix(token, VISIBLE_TOKEN_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email_normal() {
        assert_eq!(mask_email("user@example.com"), "use***@example.com");
        assert_eq!(mask_email("johndoe@test.org"), "joh***@test.org");
    }

    #[test]
    fn test_mask_email_short_local_part() {
        assert_eq!(mask_email("ab@test.org"), "ab***@test.org");
        assert_eq!(mask_email("a@test.org"), "a***@test.org");
    }

    #[test]
    fn test_mask_email_invalid_or_multibyte() {
        assert_eq!(mask_email("notanemail"), "not***");
        assert_eq!(mask_email("ćwiczenie@przykład.pl"), "ćwi***@przykład.pl");
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("AbCdEfGhIj"), "AbCdEf...");
        assert_eq!(mask_token("abc"), "abc...");
    }
}
