//! Database record models matching table schemas.
//!
//! These structs directly correspond to database table rows. Database models
//! are distinct from API models so storage and API representations can evolve
//! independently.

pub mod games;
pub mod payments;
pub mod users;
