use serde::{Deserialize, Serialize};

/// Role yang dikenal oleh booking & chat core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Specialist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Specialist => "specialist",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Role::Client),
            "specialist" => Some(Role::Specialist),
            _ => None,
        }
    }
}

/// Model JWT claims yang di-issue oleh auth service eksternal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    pub sub: i32,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String,
    pub jti: String,
}

impl TokenClaims {
    /// Cek apakah token adalah access token
    pub fn is_access_token(&self) -> bool {
        self.token_type == "access"
    }

    /// Role yang sudah di-parse, None kalau role tidak dikenal
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    pub fn is_specialist(&self) -> bool {
        self.role() == Some(Role::Specialist)
    }

    pub fn is_client(&self) -> bool {
        self.role() == Some(Role::Client)
    }

    /// Cek apakah token sudah expired berdasarkan current time
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_claims() -> TokenClaims {
        let now = chrono::Utc::now().timestamp();
        TokenClaims {
            sub: 123,
            email: "test@example.com".to_string(),
            role: "client".to_string(),
            exp: now + 900,
            iat: now,
            token_type: "access".to_string(),
            jti: "unique-jti-123".to_string(),
        }
    }

    #[test]
    fn test_is_access_token() {
        let mut claims = create_test_claims();
        assert!(claims.is_access_token());

        claims.token_type = "refresh".to_string();
        assert!(!claims.is_access_token());
    }

    #[test]
    fn test_role_parsing() {
        let mut claims = create_test_claims();
        assert!(claims.is_client());
        assert!(!claims.is_specialist());

        claims.role = "specialist".to_string();
        assert_eq!(claims.role(), Some(Role::Specialist));

        claims.role = "admin".to_string();
        assert_eq!(claims.role(), None);
    }

    #[test]
    fn test_is_expired() {
        let mut claims = create_test_claims();
        assert!(!claims.is_expired());

        claims.exp = chrono::Utc::now().timestamp() - 1;
        assert!(claims.is_expired());
    }
}
