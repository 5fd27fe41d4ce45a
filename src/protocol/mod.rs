//! MX Speak protocol implementation
//!
//! Field tables, local headers, packet framing, typed requests and the
//! point information reply decoder.

pub mod codes;
pub mod content;
pub mod decode;
pub mod header;
pub mod packet;
pub mod request;

pub use self::content::{ByteContainer, FieldTable};
pub use self::decode::{decode, decode_v5, decode_v6, DecodedReply};
pub use self::header::{Header, HeaderDefaults, LocalHeaderV5, LocalHeaderV6};
pub use self::packet::{checksum, Packet, SequenceCounter};
pub use self::request::{
    PacketId, PanelDetailsRequest, PointInformationRequest, Request, RequestKind, RestartPanel,
};
