//! Core types and trait definitions for the Lookout admin console.
//!
//! This crate is free of HTTP and database dependencies. It holds the
//! visitor record model, the table pipeline (filter, sort, paginate,
//! select), dashboard aggregates, the profile view, and the session and
//! routing state shared by every front end.

// Native `async fn` in traits; suppress the advisory lint about `Send`
// bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod error;
pub mod profile;
pub mod record;
pub mod route;
pub mod session;
pub mod store;
pub mod table;

pub use error::{Error, Result};
pub use record::{VisitorFields, VisitorRecord};
pub use session::{AuthState, IdentityProvider, Principal, Session};
pub use store::{QueryField, RecordStore};
