//! Runtime contexts of the relay.
//!
//! A relay is one [`Coordinator`] plus any number of [`ViewContext`]s, all sharing a
//! [`RelayBus`](crate::bus::RelayBus). The coordinator owns the credential store and is its only
//! writer; views keep a per-context login state machine converged through bus confirmations and
//! never touch the store after attaching.

pub mod coordinator;
pub mod view;

pub use coordinator::*;
pub use view::*;
