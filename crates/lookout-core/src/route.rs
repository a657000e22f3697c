//! Console screens and the auth guard in front of them.

use uuid::Uuid;

use crate::session::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  Login,
  Records,
  Record(Uuid),
  Dashboard,
}

impl Route {
  pub fn requires_auth(self) -> bool { !matches!(self, Self::Login) }

  /// Where a navigation to `self` actually lands given `auth`.
  ///
  /// Protected screens redirect to [`Route::Login`] when signed out; the
  /// login screen redirects to [`Route::Records`] when signed in.
  pub fn guard(self, auth: &AuthState) -> Route {
    match (self, auth.is_authenticated()) {
      (Self::Login, true) => Self::Records,
      (route, false) if route.requires_auth() => Self::Login,
      (route, _) => route,
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::session::Principal;

  use super::*;

  fn signed_in() -> AuthState {
    AuthState::Authenticated(Principal { email: "admin@example.com".into() })
  }

  #[test]
  fn signed_out_users_land_on_login() {
    let auth = AuthState::Unauthenticated;
    assert_eq!(Route::Records.guard(&auth), Route::Login);
    assert_eq!(Route::Dashboard.guard(&auth), Route::Login);
    assert_eq!(Route::Record(Uuid::nil()).guard(&auth), Route::Login);
    assert_eq!(Route::Login.guard(&auth), Route::Login);
  }

  #[test]
  fn signed_in_users_skip_login() {
    let auth = signed_in();
    assert_eq!(Route::Login.guard(&auth), Route::Records);
    assert_eq!(Route::Dashboard.guard(&auth), Route::Dashboard);
    let id = Uuid::from_u128(7);
    assert_eq!(Route::Record(id).guard(&auth), Route::Record(id));
  }
}
