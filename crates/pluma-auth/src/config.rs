//! Authentication configuration.

/// Configuration for the identity service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Optional pepper prepended to passwords before Argon2id hashing
    /// and verification.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Password-reset window in seconds (default: 900 = 15 minutes).
    pub reset_token_lifetime_secs: u64,
    /// PEM-encoded Ed25519 private key for admin JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for admin JWT verification.
    pub jwt_public_key_pem: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Admin token lifetime in seconds (default: 7_200 = 2 hours).
    pub admin_token_lifetime_secs: u64,
    /// Email of the single administrative account.
    pub admin_email: String,
    /// Argon2id PHC-format hash of the administrative password.
    pub admin_password_hash: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pepper: None,
            min_password_length: 8,
            reset_token_lifetime_secs: 900,
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            jwt_issuer: "pluma".into(),
            admin_token_lifetime_secs: 7_200,
            admin_email: String::new(),
            admin_password_hash: String::new(),
        }
    }
}
