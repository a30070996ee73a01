//! Network Module
//!
//! Connection and dialing abstractions.
//!
//! ## Architecture
//! - Dialer opens one connection per call (no pooling, no reuse)
//! - DeadlineStream fixes an absolute deadline for the whole exchange
//! - Connection is dropped, and so closed, when the call returns

mod connection;
mod dialer;

pub use connection::{Connection, DeadlineStream};
pub use dialer::{Dialer, TcpDialer};
