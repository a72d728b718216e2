//! Import, move, export, and maintenance flows for the phonebank store.
//!
//! Every flow takes an explicit request value and any [`PhoneStore`], so the
//! same pipeline serves the command-line front end and the tests. Long
//! operations report through a [`ProgressSink`]; destructive ones ask a
//! [`Confirm`] collaborator first.
//!
//! [`PhoneStore`]: phonebank_core::store::PhoneStore
//! [`ProgressSink`]: phonebank_core::progress::ProgressSink

pub mod error;
pub mod exporter;
pub mod files;
pub mod import;
pub mod manage;
pub mod mover;
pub mod request;

pub use error::{Error, Result};
pub use manage::Confirm;

#[cfg(test)]
pub(crate) mod test_helpers;
