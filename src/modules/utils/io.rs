/// Helper function to validate email format
pub fn is_valid_email(email: &str) -> bool {
    // Basic email validation
    email.contains('@')
        && email.contains('.')
        && !email.contains(' ')
        && email.chars().filter(|&c| c == '@').count() == 1
        && email.len() >= 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        // Valid emails
        assert!(is_valid_email("admin@example.com"));
        assert!(is_valid_email("ops.team@shop.example.co.uk"));
        assert!(is_valid_email("admin+seed@example.com"));

        // Invalid emails
        assert!(!is_valid_email("admin@example")); // Missing TLD
        assert!(!is_valid_email("admin example.com")); // Contains space
        assert!(!is_valid_email("admin")); // No @ symbol
        assert!(!is_valid_email("")); // Empty string
        assert!(!is_valid_email("admin@@example.com")); // Multiple @ symbols
    }
}
