//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides
//! strongly-typed operations for one table, and returns domain models from
//! [`crate::db::models`]. Multi-statement mutations (webhook confirmation,
//! bet settlement) open their own transaction on the wrapped connection.

pub mod games;
pub mod payments;
pub mod users;

pub use games::GameRounds;
pub use payments::Payments;
pub use users::Users;
