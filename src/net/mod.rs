//! Two-peer networking
//!
//! Each peer is authoritative for its own player and streams 4-byte messages
//! describing every change; the other end replays them onto a mirror.

pub mod codec;
pub mod link;
pub mod message;
pub mod sync;
pub mod transport;

pub use link::{INBOX_CAPACITY, PeerLink};
pub use message::{Frame, Message, MessageType, ProtocolError};
pub use sync::{PeerAction, apply_to_mirror};
pub use transport::{ChannelTransport, NetError, TcpTransport, Transport};
