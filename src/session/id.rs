use crate::utils::crypto::generate_token;

/// Bytes of CSPRNG output per session id
const SESSION_ID_BYTES: usize = 16;

/// Opaque identifier for one login, 22 base64url characters
#[must_use]
pub fn new_session_id() -> String {
    generate_token(SESSION_ID_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_session_ids_are_unique_and_url_safe() {
        let ids: HashSet<String> = (0..1000).map(|_| new_session_id()).collect();
        assert_eq!(ids.len(), 1000);

        for id in &ids {
            assert_eq!(id.len(), 22);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }
}
