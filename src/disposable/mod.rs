//! Disposable domain registry.
//!
//! [`DisposableRegistry`] answers `is_disposable` from an immutable
//! [`DisposableSet`] snapshot that refreshes replace wholesale. Lists come
//! from any [`DomainSource`]; [`FnSource`] and [`FileSource`] cover the
//! common cases.

mod builtin;
mod error;
mod registry;
mod source;

pub use error::RegistryError;
pub use registry::{DisposableRegistry, DisposableSet};
pub use source::{DomainSource, FetchError, FileSource, FnSource};

#[cfg(test)]
mod tests;
