//! Auth configuration types

/// Credential applied to every request as a header
#[derive(Clone)]
pub struct AuthConfig {
    /// Header carrying the credential
    pub header_name: String,
    /// Prefix placed before the value
    pub prefix: String,
    /// The secret value
    pub value: String,
}

impl AuthConfig {
    /// Read the Docs token auth: `Authorization: Token <token>`
    pub fn api_token(token: impl Into<String>) -> Self {
        Self {
            header_name: "Authorization".to_string(),
            prefix: "Token ".to_string(),
            value: token.into(),
        }
    }

    /// Full header value
    pub fn header_value(&self) -> String {
        format!("{}{}", self.prefix, self.value)
    }
}

// The key value never shows up in logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("header_name", &self.header_name)
            .field("prefix", &self.prefix)
            .field("value", &"<redacted>")
            .finish()
    }
}
