//! Session domain: the credential record, its secret, the freshness policy,
//! and the raw-payload trust boundary.

pub mod freshness;
pub mod payload;
pub mod record;
pub mod secret;

pub use freshness::*;
pub use payload::*;
pub use record::*;
pub use secret::*;
