//! HTTP routing, handlers, and middleware.

pub(crate) mod constants;
pub(crate) mod errors;
pub(crate) mod health;
pub(crate) mod initialize;
pub(crate) mod output;
pub(crate) mod process;
pub mod router;
pub(crate) mod tracking;
