//! Identity service — signup, login, and password-reset orchestration.

use chrono::{DateTime, Duration, Utc};
use pluma_core::error::{PlumaError, PlumaResult};
use pluma_core::models::user::CreateUser;
use pluma_core::repository::UserRepository;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Maximum bio length in characters.
const MAX_BIO_LEN: usize = 500;

/// Input for the signup flow.
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub dob: DateTime<Utc>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub terms_accepted: bool,
}

/// Successful signup result. The password hash never leaves the
/// repository layer.
#[derive(Debug, Clone)]
pub struct SignupOutput {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Minimal public identity returned on login.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub username: String,
    pub email: String,
}

/// Result of a password-reset request. The response is shaped the
/// same whether or not the account exists.
#[derive(Debug, Clone)]
pub struct ResetRequestOutput {
    pub message: String,
    /// The raw token, present only when an account matched. Exposing
    /// it here is a development convenience; production delivery is
    /// out-of-band.
    pub reset_token: Option<String>,
}

/// Identity service.
///
/// Generic over the user repository so that the auth layer has no
/// dependency on the database crate.
pub struct IdentityService<U: UserRepository> {
    users: U,
    config: AuthConfig,
}

impl<U: UserRepository> IdentityService<U> {
    pub fn new(users: U, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Register a new account. All validation happens before any
    /// write reaches the store.
    pub async fn signup(&self, input: SignupInput) -> PlumaResult<SignupOutput> {
        // 1. Local validation — nothing below touches the store.
        if input.password != input.confirm_password {
            return Err(PlumaError::validation("Passwords do not match"));
        }
        if input.password.len() < self.config.min_password_length {
            return Err(PlumaError::validation(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        if input.username.trim().is_empty()
            || input.email.trim().is_empty()
            || input.full_name.trim().is_empty()
        {
            return Err(PlumaError::validation(
                "Full name, username, and email are required",
            ));
        }
        if !input.terms_accepted {
            return Err(PlumaError::validation("Terms must be accepted"));
        }
        if let Some(bio) = &input.bio {
            if bio.chars().count() > MAX_BIO_LEN {
                return Err(PlumaError::validation(format!(
                    "Bio must be at most {MAX_BIO_LEN} characters"
                )));
            }
        }

        // 2. Uniqueness check on email OR username (exact match). The
        //    unique indexes are the backstop for races.
        if self
            .users
            .username_or_email_taken(&input.username, &input.email)
            .await?
        {
            return Err(PlumaError::Conflict {
                entity: "user".into(),
            });
        }

        // 3. Persist. The repository hashes the password with Argon2id.
        let user = self
            .users
            .create(CreateUser {
                full_name: input.full_name,
                username: input.username,
                email: input.email,
                password: input.password,
                dob: input.dob,
                gender: input.gender,
                bio: input.bio,
                profile_pic: input.profile_pic,
                category: input.category,
                country: input.country,
                terms_accepted: input.terms_accepted,
            })
            .await?;

        Ok(SignupOutput {
            id: user.id,
            username: user.username,
            email: user.email,
        })
    }

    /// Authenticate with email or username plus password.
    ///
    /// "User not found" and "Incorrect password" stay distinguishable
    /// here; only the reset-request flow blurs them.
    pub async fn login(&self, email_or_username: &str, password: &str) -> PlumaResult<LoginOutput> {
        // 1. Lookup by exact match on email OR username.
        let user = self.users.get_by_login(email_or_username).await?;

        // 2. Verify password.
        let valid = password::verify_password(
            password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::IncorrectPassword.into());
        }

        Ok(LoginOutput {
            username: user.username,
            email: user.email,
        })
    }

    /// Open a password-reset window for the matching account.
    ///
    /// Always returns a success-shaped response — a missing account is
    /// indistinguishable from a match, which prevents user
    /// enumeration through this endpoint.
    pub async fn request_password_reset(
        &self,
        email_or_username: &str,
    ) -> PlumaResult<ResetRequestOutput> {
        let message = "If that account exists, a reset link has been sent".to_string();

        let user = match self.users.get_by_login(email_or_username).await {
            Ok(user) => user,
            Err(PlumaError::NotFound { .. }) => {
                return Ok(ResetRequestOutput {
                    message,
                    reset_token: None,
                });
            }
            Err(e) => return Err(e),
        };

        let raw = token::generate_reset_token();
        let expires_at =
            Utc::now() + Duration::seconds(self.config.reset_token_lifetime_secs as i64);
        self.users
            .set_reset_token(user.id, &token::hash_reset_token(&raw), expires_at)
            .await?;

        Ok(ResetRequestOutput {
            message,
            reset_token: Some(raw),
        })
    }

    /// Consume a reset token and store the new password.
    ///
    /// The token is single-use: the repository clears the token digest
    /// and expiry in the same write that stores the new hash, so a
    /// second attempt with the same token fails.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> PlumaResult<()> {
        // 1. Local validation.
        if new_password.is_empty() || confirm_password.is_empty() {
            return Err(PlumaError::validation("Password must not be empty"));
        }
        if new_password != confirm_password {
            return Err(PlumaError::validation("Passwords do not match"));
        }
        if new_password.len() < self.config.min_password_length {
            return Err(PlumaError::validation(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }

        // 2. Find the holder of this exact token with an open window.
        let user = self
            .users
            .get_by_reset_token(&token::hash_reset_token(raw_token), Utc::now())
            .await
            .map_err(|e| match e {
                PlumaError::NotFound { .. } => AuthError::ResetTokenExpiredOrInvalid.into(),
                other => other,
            })?;

        // 3. Store the new hash and close the window.
        self.users.reset_password(user.id, new_password).await
    }

    /// Authenticate the administrative account and issue a bearer
    /// token carrying the `admin` role claim.
    pub async fn admin_login(&self, email: &str, password: &str) -> PlumaResult<String> {
        if email != self.config.admin_email {
            return Err(AuthError::InvalidAdminCredentials.into());
        }

        let valid = password::verify_password(
            password,
            &self.config.admin_password_hash,
            self.config.pepper.as_deref(),
        )
        .map_err(|_| AuthError::InvalidAdminCredentials)?;
        if !valid {
            return Err(AuthError::InvalidAdminCredentials.into());
        }

        Ok(token::issue_admin_token(email, &self.config)?)
    }
}
