//! Authentication system.
//!
//! Browser-style session authentication: users log in with email/password,
//! receive a JWT in a secure HTTP-only cookie, and the [`current_user`]
//! extractor resolves that cookie back into a `CurrentUser` for handlers.
//!
//! # Modules
//!
//! - [`current_user`]: extractor for getting the authenticated user in handlers
//! - [`password`]: password hashing and verification using Argon2
//! - [`session`]: JWT session token creation and verification

pub mod current_user;
pub mod password;
pub mod session;
