//! Trust boundary of a personal news aggregator.
//!
//! Two independent components, composed by the application at startup and on
//! every feed write:
//!
//! - [`sanitize`] — pure, stateless sanitization of every untrusted string
//!   field (titles, descriptions, authors, links) before it is rendered or
//!   stored.
//! - [`migrate`] — the versioned feed-collection migration engine, run once
//!   per application load, which brings the persisted feed list to the
//!   current schema without ever silently discarding user customization.
//!
//! The migration engine talks to persistence only through the [`store`]
//! key-value port, so it can be tested against an in-memory store and run in
//! production against the SQLite-backed one.

pub mod config;
pub mod migrate;
pub mod sanitize;
pub mod store;
