//! Routers split by access level. Each module's protection is applied where it is
//! mounted in `create_router` or by the handlers it registers.

/// Anonymous, read-only catalog plus registration.
pub mod public;

/// Any valid session (401 otherwise).
pub mod authenticated;

/// `creator` or `admin` role, checked in each handler (403 otherwise).
pub mod creator;

/// `admin` role only, checked in each handler (403 otherwise).
pub mod admin;

/// Gated pages: redirect instead of error statuses.
pub mod pages;
