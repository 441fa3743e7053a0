//! # couchboot
//!
//! Bootstraps a CouchDB instance for an application server. A run checks
//! whether the server is still in "admin party" mode, installs or repairs the
//! admin credentials kept in the data directory, provisions the `plugins` and
//! `app` databases with a locked-down security document, seeds the app config
//! document and finally installs the application's `admin` account.
//!
//! Every step talks to CouchDB's HTTP admin API and runs strictly in sequence;
//! the first failure aborts the run. Partially created resources are left in
//! place and reported, never rolled back.
//!
//! ## Known limitation
//!
//! The credential store is read and written without cross-process locking.
//! Two concurrent runs against the same data directory can race; a single
//! provisioning run per data directory is assumed.

pub mod cli;
pub mod couch;
pub mod credentials;
pub mod error;
pub mod prompt;

#[cfg(test)]
pub(crate) mod testing;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Short git commit of the build, `unknown` outside a git checkout.
#[must_use]
pub fn git_commit_hash() -> &'static str {
    built_info::GIT_COMMIT_HASH_SHORT.unwrap_or("unknown")
}
