//! MX resolution.
//!
//! [`resolve_mx`] turns a domain into an ordered list of [`MxHost`]
//! candidates. The resolver is abstracted behind [`LookupMx`] so that the
//! probe pipeline can be exercised without DNS.

mod error;
mod resolver;
mod types;

pub use error::MxError;
pub use resolver::{LookupMx, SystemResolver, normalize_domain, resolve_mx};
pub use types::MxHost;
