//! Authentication state.
//!
//! A [`Session`] is created once at process start and owns the only
//! subscription to auth changes. Screens and route checks read from it
//! instead of tracking auth themselves.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
  #[default]
  Unauthenticated,
  Authenticated(Principal),
}

impl AuthState {
  pub fn is_authenticated(&self) -> bool { matches!(self, Self::Authenticated(_)) }
}

// ─── Provider ────────────────────────────────────────────────────────────────

/// Validates credentials and ends sessions.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Check `email`/`password`; on success the provider is signed in.
  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Principal, Self::Error>> + Send + 'a;

  fn sign_out(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// Current auth state plus change notification.
#[derive(Debug)]
pub struct Session {
  state: watch::Sender<AuthState>,
}

impl Default for Session {
  fn default() -> Self { Self::new() }
}

impl Session {
  pub fn new() -> Self {
    let (state, _) = watch::channel(AuthState::Unauthenticated);
    Self { state }
  }

  /// A receiver that observes every state change.
  pub fn subscribe(&self) -> watch::Receiver<AuthState> { self.state.subscribe() }

  pub fn current(&self) -> AuthState { self.state.borrow().clone() }

  pub fn is_authenticated(&self) -> bool { self.state.borrow().is_authenticated() }

  /// Sign in through `provider`. A failure leaves the state unchanged.
  pub async fn sign_in<P: IdentityProvider>(
    &self,
    provider: &P,
    email: &str,
    password: &str,
  ) -> Result<Principal, P::Error> {
    let principal = provider.sign_in(email, password).await?;
    tracing::info!(email = %principal.email, "signed in");
    self.state.send_replace(AuthState::Authenticated(principal.clone()));
    Ok(principal)
  }

  /// Sign out through `provider`. The local state is cleared even if the
  /// provider call fails; the error is still returned.
  pub async fn sign_out<P: IdentityProvider>(&self, provider: &P) -> Result<(), P::Error> {
    let result = provider.sign_out().await;
    self.state.send_replace(AuthState::Unauthenticated);
    tracing::info!("signed out");
    result
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicBool, Ordering};

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("invalid credentials")]
  struct Invalid;

  #[derive(Default)]
  struct Fixed {
    signed_out: AtomicBool,
  }

  impl IdentityProvider for Fixed {
    type Error = Invalid;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, Invalid> {
      if email == "admin@example.com" && password == "hunter2" {
        Ok(Principal { email: email.to_owned() })
      } else {
        Err(Invalid)
      }
    }

    async fn sign_out(&self) -> Result<(), Invalid> {
      self.signed_out.store(true, Ordering::SeqCst);
      Ok(())
    }
  }

  #[tokio::test]
  async fn sign_in_notifies_subscribers() {
    let session = Session::new();
    let mut rx = session.subscribe();
    assert!(!rx.borrow().is_authenticated());

    session.sign_in(&Fixed::default(), "admin@example.com", "hunter2").await.unwrap();

    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_authenticated());
    assert!(session.is_authenticated());
  }

  #[tokio::test]
  async fn bad_credentials_leave_state_unchanged() {
    let session = Session::new();
    let rx = session.subscribe();

    assert!(session.sign_in(&Fixed::default(), "admin@example.com", "nope").await.is_err());
    assert!(!rx.has_changed().unwrap());
    assert_eq!(session.current(), AuthState::Unauthenticated);
  }

  #[tokio::test]
  async fn sign_out_clears_state() {
    let provider = Fixed::default();
    let session = Session::new();
    session.sign_in(&provider, "admin@example.com", "hunter2").await.unwrap();

    session.sign_out(&provider).await.unwrap();

    assert!(provider.signed_out.load(Ordering::SeqCst));
    assert!(!session.is_authenticated());
  }
}
