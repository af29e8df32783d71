use color_eyre::Result;

use crate::db::models::{AuthUser, EmailAlreadyRegistered};
use crate::db::Db;
use crate::email::ResendEmailSender;
use crate::models::{Profile, Role};

// ---------------------------------------------------------------------------
// AuthRepository trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn email_exists(&self, email: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> impl std::future::Future<Output = Result<i32>> + Send;

    fn create_unverified_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> impl std::future::Future<Output = Result<(i32, String)>> + Send;

    fn create_user_session(
        &self,
        user_id: i32,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn is_email_verified(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send;

    fn get_user_by_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send;

    fn find_profile(
        &self,
        user_id: i32,
    ) -> impl std::future::Future<Output = Result<Option<Profile>>> + Send;

    fn delete_user_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn verify_email_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn regenerate_verification_token(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
}

impl AuthRepository for Db {
    async fn email_exists(&self, email: &str) -> Result<bool> {
        Db::email_exists(self, email).await
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<i32> {
        Db::create_user(self, email, password, full_name, role).await
    }

    async fn create_unverified_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<(i32, String)> {
        Db::create_unverified_user(self, email, password, full_name, role).await
    }

    async fn create_user_session(&self, user_id: i32) -> Result<String> {
        Db::create_user_session(self, user_id).await
    }

    async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        Db::verify_user_password(self, email, password).await
    }

    async fn is_email_verified(&self, email: &str) -> Result<bool> {
        Db::is_email_verified(self, email).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        Db::find_user_by_email(self, email).await
    }

    async fn get_user_by_session(&self, session_id: &str) -> Result<Option<AuthUser>> {
        Db::get_user_by_session(self, session_id).await
    }

    async fn find_profile(&self, user_id: i32) -> Result<Option<Profile>> {
        Db::find_profile(self, user_id).await
    }

    async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        Db::delete_user_session(self, session_id).await
    }

    async fn verify_email_token(&self, token: &str) -> Result<bool> {
        Db::verify_email_token(self, token).await
    }

    async fn regenerate_verification_token(&self, email: &str) -> Result<Option<String>> {
        Db::regenerate_verification_token(self, email).await
    }
}

// ---------------------------------------------------------------------------
// EmailSender trait
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait EmailSender: Send + Sync {
    /// Whether email sending is configured (false in dev mode).
    fn is_enabled(&self) -> bool;

    fn send_verification_email(
        &self,
        to_email: &str,
        verification_url: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum SignInOutcome {
    /// Sign-in succeeded. Contains the session token.
    Success(String),
    /// Email or password was empty.
    EmptyFields,
    /// Password was incorrect (or email not found).
    InvalidCredentials,
    /// Credentials correct but email not yet confirmed.
    EmailNotVerified,
}

#[derive(Debug)]
pub enum SignUpOutcome {
    /// User created and session started (no confirmation required).
    SignedIn(String),
    /// User created, confirmation link sent; not usable until confirmed.
    ConfirmationPending(String),
    /// User created, but the confirmation email could not be sent.
    ConfirmationEmailFailed(String),
    /// Required fields were empty.
    EmptyFields,
    /// Role was missing or not one of student / teacher.
    MissingRole,
    /// Email already in use.
    EmailTaken,
}

/// Identity resolved from a session token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub user: AuthUser,
    /// Absent when the identity exists but its profile row does not.
    pub profile: Option<Profile>,
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

pub struct AuthService<R: AuthRepository = Db, E: EmailSender = ResendEmailSender> {
    repo: R,
    email: E,
    base_url: String,
}

impl<R: AuthRepository + Clone, E: EmailSender + Clone> Clone for AuthService<R, E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            email: self.email.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

impl<R: AuthRepository, E: EmailSender> AuthService<R, E> {
    pub fn new(repo: R, email: E, base_url: String) -> Self {
        Self {
            repo,
            email,
            base_url,
        }
    }

    /// Whether sign-up requires email confirmation.
    pub fn confirmation_required(&self) -> bool {
        self.email.is_enabled()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome> {
        if email.is_empty() || password.is_empty() {
            return Ok(SignInOutcome::EmptyFields);
        }

        let verified = self.repo.verify_user_password(email, password).await?;

        if !verified {
            return Ok(SignInOutcome::InvalidCredentials);
        }

        if self.confirmation_required() {
            let email_verified = self.repo.is_email_verified(email).await?;
            if !email_verified {
                return Ok(SignInOutcome::EmailNotVerified);
            }
        }

        let user =
            self.repo.find_user_by_email(email).await?.ok_or_else(|| {
                color_eyre::eyre::eyre!("user not found after password verification")
            })?;

        let session_token = self.repo.create_user_session(user.id).await?;

        Ok(SignInOutcome::Success(session_token))
    }

    /// `role` is the raw form value; anything other than `student` or
    /// `teacher` is rejected before the repository is touched.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: &str,
    ) -> Result<SignUpOutcome> {
        if email.is_empty() || password.is_empty() || full_name.trim().is_empty() {
            return Ok(SignUpOutcome::EmptyFields);
        }

        let Ok(role) = role.parse::<Role>() else {
            return Ok(SignUpOutcome::MissingRole);
        };

        let exists = self.repo.email_exists(email).await?;
        if exists {
            return Ok(SignUpOutcome::EmailTaken);
        }

        let full_name = full_name.trim();

        if !self.confirmation_required() {
            // Dev mode: create user and session immediately
            let user_id = match self.repo.create_user(email, password, full_name, role).await {
                Ok(user_id) => user_id,
                Err(e) if e.is::<EmailAlreadyRegistered>() => return Ok(SignUpOutcome::EmailTaken),
                Err(e) => return Err(e),
            };
            let session_token = self.repo.create_user_session(user_id).await?;
            return Ok(SignUpOutcome::SignedIn(session_token));
        }

        let token = match self
            .repo
            .create_unverified_user(email, password, full_name, role)
            .await
        {
            Ok((_user_id, token)) => token,
            Err(e) if e.is::<EmailAlreadyRegistered>() => return Ok(SignUpOutcome::EmailTaken),
            Err(e) => return Err(e),
        };

        let verification_url = format!("{}/verify-email/{}", self.base_url, token);

        if let Err(e) = self
            .email
            .send_verification_email(email, &verification_url)
            .await
        {
            tracing::error!("failed to send verification email to {email}: {e}");
            return Ok(SignUpOutcome::ConfirmationEmailFailed(email.to_string()));
        }

        Ok(SignUpOutcome::ConfirmationPending(email.to_string()))
    }

    pub async fn sign_out(&self, session_id: &str) -> Result<()> {
        self.repo.delete_user_session(session_id).await
    }

    /// Identity and profile behind a session token, `None` for unknown tokens.
    pub async fn current_session(&self, session_id: &str) -> Result<Option<SessionUser>> {
        let Some(user) = self.repo.get_user_by_session(session_id).await? else {
            return Ok(None);
        };

        let profile = self.repo.find_profile(user.id).await?;
        if profile.is_none() {
            tracing::warn!("user {} has a session but no profile", user.id);
        }

        Ok(Some(SessionUser { user, profile }))
    }

    pub async fn verify_email(&self, token: &str) -> Result<bool> {
        self.repo.verify_email_token(token).await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<()> {
        let token = self.repo.regenerate_verification_token(email).await?;

        if let Some(token) = token {
            let verification_url = format!("{}/verify-email/{}", self.base_url, token);
            self.email
                .send_verification_email(email, &verification_url)
                .await?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
