//! OpenNIDS packet decoding engine
//!
//! Incrementally decodes a raw byte buffer through the protocol stack
//! (link → network → transport → application) into a typed, layered
//! [`Packet`]. Built for adversarial input: every read is bounds-checked,
//! every declared length is cross-checked, and decoding never panics.
//!
//! ## Design
//!
//! - **Zero-copy**: headers borrow from the caller's buffer; nothing is
//!   copied or allocated beyond the layer vector.
//! - **Fail-soft**: a malformed or truncated header returns a typed
//!   [`ParseError`]; an unrecognized payload is *not* an error: decoding
//!   stops and the tail is kept as opaque payload, optionally labeled by a
//!   heuristic sniffer.
//! - **Closed dispatch**: the protocol set is a closed enum taxonomy shared
//!   with the rule layer, so protocol additions are exhaustiveness-checked.
//!
//! ```
//! use nids_decode::{decode, DecodeOptions, LinkProtocol};
//!
//! let frame: &[u8] = &[0u8; 14];
//! match decode(frame, LinkProtocol::Ethernet, &DecodeOptions::default()) {
//!     Ok(packet) => println!("{} layers", packet.layers.len()),
//!     Err(err) => println!("decode failed: {err}"),
//! }
//! ```

mod cursor;
mod error;
mod layer;
mod mac;
mod packet;
mod pipeline;
mod protocol;
mod sniff;

pub mod decoders;

pub use cursor::{ByteCursor, CursorError};
pub use error::{ParseError, Result};
pub use layer::{ApplicationLayer, LinkLayer, NetworkLayer, TransportLayer};
pub use mac::{InvalidMacAddress, MacAddress};
pub use packet::{DecodeOptions, Layer, Packet};
pub use pipeline::decode;
pub use protocol::{
    ApplicationNaiveProtocol, ApplicationProtocol, LinkProtocol, NetworkProtocol, ProtocolType,
    TransportProtocol, UnknownProtocolName,
};
pub use sniff::sniff_application;
