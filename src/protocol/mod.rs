//! Protocol Module
//!
//! Defines the cgminer API wire formats and the transport contract.
//!
//! ## JSON Format
//!
//! ### Request
//! ```text
//! {"command":"pools","parameter":"0,1"}
//! ```
//!
//! ### Response
//! ```text
//! {"STATUS":[{"STATUS":"S","Code":7,"Msg":"1 Pool(s)"}],"POOLS":[{...},{...}]}\0
//! ```
//!
//! ## Plain-Text Format
//!
//! ### Request
//! ```text
//! pools,0,1
//! ```
//!
//! ### Response
//! ```text
//! STATUS=S,Code=7,Msg=1 Pool(s)|POOL=0,URL=...,Status=Alive|POOL=1,...|\0
//! ```
//!
//! Sections are separated by `|` or `;` depending on firmware, fields by `,`.
//!
//! ### Status Codes
//! - S: success
//! - I: informational
//! - W: warning
//! - E: error
//! - F: fatal

mod command;
mod response;
mod framing;
mod de;
mod transport;
mod json;
mod text;

pub use command::Command;
pub use response::{Response, Status, StatusCode};
pub use framing::{read_framed, TERMINATOR};
pub use de::{from_value, DecodeError};
pub use transport::{Transport, WireFormat};
pub use json::JsonTransport;
pub use text::PlainTextTransport;
