use std::fmt;

use sha2::{Digest, Sha256};

/// Pre-shared bearer token authenticating the relay -> resolver link
///
/// Presented tokens are compared by SHA-256 digest.
#[derive(Clone)]
pub struct LinkToken {
    token: String,
    digest: [u8; 32],
}

impl fmt::Debug for LinkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LinkToken(..)")
    }
}

impl LinkToken {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let digest = Sha256::digest(token.as_bytes()).into();
        Self { token, digest }
    }

    /// Value for an `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Check an `Authorization` header value
    pub fn verify_bearer(&self, header: &str) -> bool {
        match header.strip_prefix("Bearer ") {
            Some(presented) => {
                let presented: [u8; 32] = Sha256::digest(presented.trim().as_bytes()).into();
                presented == self.digest
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bearer_roundtrip() {
        let token = LinkToken::new("private-link");
        assert_eq!(token.bearer(), "Bearer private-link");
        assert!(token.verify_bearer(&token.bearer()));
        assert!(!token.verify_bearer("Bearer other"));
        assert!(!token.verify_bearer("private-link"));
        assert_eq!(format!("{:?}", token), "LinkToken(..)");
    }
}
