//! Core types and algorithms for the phonebank record store.
//!
//! No database or file-system code lives here. The crate holds the
//! phone-number normalizer, the batch classifier, the record and partition
//! types, and the [`PhoneStore`](store::PhoneStore) trait that storage
//! backends implement.

// Native `async fn` in trait impls; the trait itself spells out `Send`.
#![allow(async_fn_in_trait)]

pub mod classify;
pub mod error;
pub mod normalize;
pub mod partition;
pub mod progress;
pub mod record;
pub mod store;

pub use error::{Error, Result};
pub use normalize::normalize;
pub use partition::PartitionId;

/// Number of records written or checked per storage round trip.
pub const CHUNK_SIZE: usize = 1000;
