//! RustySRTP implements Secure RTP and Secure RTCP (RFC 3711) packet protection.
//!
//! A [`Session`](srtp::Session) is created from an ordered list of
//! [`StreamPolicy`](srtp::StreamPolicy) values and then protects outgoing and
//! unprotects incoming RTP/RTCP packets in place, with rollover tracking, replay
//! detection and key-usage limits per stream.
//!
//! The crate is structured into a few modules:
//! - `srtp`: policies, per-stream state, sessions and the packet transforms.
//! - `log`: the leveled logging sink used throughout the engine.
//! - `config`: INI-style configuration loading for logging and SRTP defaults.

/// Handles configuration loading and management.
pub mod config;
/// Logging utilities for the library.
pub mod log;
/// SRTP/SRTCP protection engine.
pub mod srtp;

pub use srtp::{
    CryptoPolicy, EventRecord, KeyLimit, Session, SrtpError, SrtpEvent, SrtpProfile,
    SsrcSelector, StreamPolicy, deinit, init,
};
