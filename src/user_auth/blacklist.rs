//! Revoked token registry
//!
//! Tokens are remembered until their own expiry; after that the signature
//! check rejects them anyway and the entry is dropped.

use chrono::Utc;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct TokenBlacklist {
    revoked: DashMap<String, usize>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `token`, which expires at unix time `exp`.
    pub fn revoke(&self, token: &str, exp: usize) {
        self.purge_expired(Utc::now().timestamp().max(0) as usize);
        self.revoked.insert(token.to_string(), exp);
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.revoked.contains_key(token)
    }

    /// Drop entries whose token expired before `now`.
    pub fn purge_expired(&self, now: usize) {
        self.revoked.retain(|_, exp| *exp >= now);
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke_and_check() {
        let blacklist = TokenBlacklist::new();
        let far_future = usize::MAX;
        assert!(!blacklist.is_revoked("abc"));
        blacklist.revoke("abc", far_future);
        assert!(blacklist.is_revoked("abc"));
        assert!(!blacklist.is_revoked("abd"));
    }

    #[test]
    fn test_expired_entries_are_purged() {
        let blacklist = TokenBlacklist::new();
        blacklist.revoke("old", 1);
        blacklist.revoke("new", usize::MAX);
        // The second revoke purged the already-expired first entry
        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.is_revoked("new"));
    }
}
