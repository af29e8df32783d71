//! Per-request session context and the route guard that reads it.

use color_eyre::Result;
use tokio::sync::watch;

use crate::db::models::AuthUser;
use crate::models::Profile;
use crate::services::auth::{
    AuthRepository, AuthService, EmailSender, SessionUser, SignInOutcome, SignUpOutcome,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing may be decided from the session yet.
    Resolving,
    Resolved(Option<SessionUser>),
}

/// Owned session state: identity, profile and whether resolution has
/// finished. Only the context's own methods write to it; readers either ask
/// for a snapshot or hold a [`watch::Receiver`].
pub struct SessionContext {
    state: watch::Sender<SessionState>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Resolving);
        Self { state }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_resolving(&self) -> bool {
        matches!(*self.state.borrow(), SessionState::Resolving)
    }

    pub fn user(&self) -> Option<AuthUser> {
        match &*self.state.borrow() {
            SessionState::Resolved(Some(session)) => Some(session.user.clone()),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<Profile> {
        match &*self.state.borrow() {
            SessionState::Resolved(Some(session)) => session.profile.clone(),
            _ => None,
        }
    }

    /// Look the token up and settle the state. Lookup failures are logged and
    /// resolve to signed out.
    pub async fn resolve<R: AuthRepository, E: EmailSender>(
        &self,
        auth: &AuthService<R, E>,
        token: Option<&str>,
    ) {
        let session = match token {
            Some(token) => match auth.current_session(token).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!("could not resolve session: {e}");
                    None
                }
            },
            None => None,
        };

        self.state.send_replace(SessionState::Resolved(session));
    }

    /// Wait until the first resolution has completed.
    pub async fn resolved(&self) -> SessionState {
        let mut rx = self.subscribe();
        let state = match rx
            .wait_for(|state| !matches!(state, SessionState::Resolving))
            .await
        {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.state(),
        };
        state
    }

    pub async fn sign_in<R: AuthRepository, E: EmailSender>(
        &self,
        auth: &AuthService<R, E>,
        email: &str,
        password: &str,
    ) -> Result<SignInOutcome> {
        let outcome = auth.sign_in(email, password).await?;
        if let SignInOutcome::Success(token) = &outcome {
            self.resolve(auth, Some(token)).await;
        }
        Ok(outcome)
    }

    pub async fn sign_up<R: AuthRepository, E: EmailSender>(
        &self,
        auth: &AuthService<R, E>,
        email: &str,
        password: &str,
        full_name: &str,
        role: &str,
    ) -> Result<SignUpOutcome> {
        let outcome = auth.sign_up(email, password, full_name, role).await?;
        if let SignUpOutcome::SignedIn(token) = &outcome {
            self.resolve(auth, Some(token)).await;
        }
        Ok(outcome)
    }

    /// Clears identity and profile. Safe to call any number of times, with or
    /// without a token; the local state is cleared even if the backend call
    /// fails.
    pub async fn sign_out<R: AuthRepository, E: EmailSender>(
        &self,
        auth: &AuthService<R, E>,
        token: Option<&str>,
    ) -> Result<()> {
        self.state.send_replace(SessionState::Resolved(None));
        match token {
            Some(token) => auth.sign_out(token).await,
            None => Ok(()),
        }
    }
}

/// A session that passed the guard: identity and profile are both present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedIn {
    pub user: AuthUser,
    pub profile: Profile,
}

#[derive(Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Loading,
    RedirectToSignIn,
    Allow(SignedIn),
}

pub struct RouteGuard;

impl RouteGuard {
    pub fn evaluate(state: &SessionState) -> GuardDecision {
        match state {
            SessionState::Resolving => GuardDecision::Loading,
            SessionState::Resolved(Some(SessionUser {
                user,
                profile: Some(profile),
            })) => GuardDecision::Allow(SignedIn {
                user: user.clone(),
                profile: profile.clone(),
            }),
            SessionState::Resolved(_) => GuardDecision::RedirectToSignIn,
        }
    }
}
