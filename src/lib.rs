//! Catalog manager for the RIT numerical-relativity waveform archive.
//!
//! Reconciles three sources of truth — the remote archive listing, the
//! on-disk cache, and the in-memory table — into one consistent catalog
//! of simulation metadata, and resolves per-simulation file names across
//! the quasicircular and eccentric naming schemes.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod domain;
pub mod error;
pub mod metadata;
pub mod names;
pub mod output;
pub mod store;
