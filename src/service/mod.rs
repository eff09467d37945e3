//! Account and link workflows, independent of the HTTP layer.
//!
//! Every function takes the resolved [`Session`](crate::auth::Session) and
//! enforces authentication and ownership itself, so handlers only translate
//! between forms, responses and these calls.

pub mod accounts;
pub mod helpers;
pub mod links;
