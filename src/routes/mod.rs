//! Router Module Index
//!
//! Splits the application surface by the access class the route guard assigns it.
//! The guard itself is a single middleware over the merged router (see `create_router`);
//! this split only keeps the handlers grouped by who can reach them.

/// Routes reachable without a session.
pub mod public;

/// Routes open to any signed-in user.
pub mod authenticated;

/// Routes restricted to users with the `admin` role.
pub mod admin;
