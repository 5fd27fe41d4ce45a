//! Typed requests sent to the panel

use crate::core::{FieldValue, ProtocolVersion, Result};

use super::content::FieldTable;
use super::header::{Header, HeaderDefaults};
use super::packet::Packet;

/// Reply length of a point information request, either revision
pub const POINT_INFO_REPLY_LEN: usize = 55;
/// Reply length of an MX Speak 5 panel details request
pub const PANEL_DETAILS_REPLY_LEN_V5: usize = 30;
/// Reply length of an MX Speak 6 panel details request
pub const PANEL_DETAILS_REPLY_LEN_V6: usize = 31;

/// Number of area bytes in a point information request
pub const AREA_COUNT: usize = 30;

/// Packet identifiers carried in the header's `packet_id` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketId {
    /// Placeholder for an unset id
    Invalid = 0x00,
    /// Network software version
    NetVersionRequest = 0x01,
    /// Panel restart
    RestartRequest = 0x02,
    /// Panel identity and configuration summary
    PanelDetailsRequest = 0x04,
    /// State of a single point
    PointInformationRequest = 0x0d,
}

impl From<PacketId> for u8 {
    fn from(id: PacketId) -> Self {
        id as u8
    }
}

/// Request type, which fixes the packet id and the reply length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Restart the panel; no reply follows
    Restart(ProtocolVersion),
    /// Panel identity and configuration summary
    PanelDetails(ProtocolVersion),
    /// State of a single point
    PointInformation(ProtocolVersion),
}

impl RequestKind {
    /// Packet id sent in the header
    pub fn packet_id(&self) -> PacketId {
        match self {
            RequestKind::Restart(_) => PacketId::RestartRequest,
            RequestKind::PanelDetails(_) => PacketId::PanelDetailsRequest,
            RequestKind::PointInformation(_) => PacketId::PointInformationRequest,
        }
    }

    /// Protocol revision of the request
    pub fn version(&self) -> ProtocolVersion {
        match *self {
            RequestKind::Restart(version)
            | RequestKind::PanelDetails(version)
            | RequestKind::PointInformation(version) => version,
        }
    }

    /// Size of the reply that follows the ACK, zero when none is expected
    pub fn expected_reply_len(&self) -> usize {
        match self {
            RequestKind::Restart(_) => 0,
            RequestKind::PanelDetails(ProtocolVersion::V5) => PANEL_DETAILS_REPLY_LEN_V5,
            RequestKind::PanelDetails(ProtocolVersion::V6) => PANEL_DETAILS_REPLY_LEN_V6,
            RequestKind::PointInformation(_) => POINT_INFO_REPLY_LEN,
        }
    }
}

/// Something that can be turned into a packet and written to the panel
pub trait Request {
    /// Request type
    fn kind(&self) -> RequestKind;

    /// Payload fields following the header
    fn payload(&self) -> Result<FieldTable> {
        Ok(FieldTable::new())
    }

    /// Builds the packet for this request
    fn to_packet(&self, defaults: &HeaderDefaults) -> Result<Packet> {
        let kind = self.kind();
        let header = Header::build(kind.version(), kind.packet_id().into(), defaults, &[])?;
        Packet::build(header, self.payload()?)
    }
}

/// Restart the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPanel {
    /// Protocol revision of the request
    pub version: ProtocolVersion,
}

impl RestartPanel {
    /// Restart request for `version`
    pub fn new(version: ProtocolVersion) -> Self {
        Self { version }
    }
}

impl Request for RestartPanel {
    fn kind(&self) -> RequestKind {
        RequestKind::Restart(self.version)
    }
}

/// Ask the panel for its details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelDetailsRequest {
    /// Protocol revision of the request
    pub version: ProtocolVersion,
}

impl PanelDetailsRequest {
    /// Panel details request for `version`
    pub fn new(version: ProtocolVersion) -> Self {
        Self { version }
    }
}

impl Request for PanelDetailsRequest {
    fn kind(&self) -> RequestKind {
        RequestKind::PanelDetails(self.version)
    }
}

/// Ask the panel for the state of one point
///
/// Serialized as 48 one-byte fields; the group is split high byte first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointInformationRequest {
    /// Protocol revision of the request
    pub version: ProtocolVersion,
    /// Panel network node
    pub node: u8,
    /// Channel the point sits on
    pub channel: u8,
    /// Address on the channel
    pub channel_address: u8,
    pub point_category: u8,
    /// Physical point number
    pub point_number: u8,
    /// Logical point number, 253 by default
    pub logical_point_number: u8,
    /// 254 when no zone applies
    pub logical_point_zone: u8,
    pub device_category: u8,
    /// Sent high byte first
    pub group: u16,
    pub output_point_state_store: u8,
    pub multi_area_type: u8,
    /// Area membership bytes
    pub areas: [u8; AREA_COUNT],
    pub area240: u8,
    /// Device type filter, 127 by default
    pub device_type: u8,
    pub request_type: u8,
    /// Search mode, 10 by default
    pub search_type: u8,
}

impl PointInformationRequest {
    /// Request with every field at its default
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            node: 0,
            channel: 0,
            channel_address: 0,
            point_category: 0,
            point_number: 0,
            logical_point_number: 253,
            logical_point_zone: 254,
            device_category: 0,
            group: 0,
            output_point_state_store: 0,
            multi_area_type: 0,
            areas: [0; AREA_COUNT],
            area240: 0,
            device_type: 127,
            request_type: 0,
            search_type: 10,
        }
    }

    /// Request for the point at `point_number`
    pub fn for_point(version: ProtocolVersion, point_number: u8) -> Self {
        Self {
            point_number,
            ..Self::new(version)
        }
    }
}

impl Request for PointInformationRequest {
    fn kind(&self) -> RequestKind {
        RequestKind::PointInformation(self.version)
    }

    fn payload(&self) -> Result<FieldTable> {
        let [group_high, group_low] = self.group.to_be_bytes();

        let mut fields: Vec<(String, FieldValue)> = vec![
            ("node".into(), self.node.into()),
            ("channel".into(), self.channel.into()),
            ("channel_address".into(), self.channel_address.into()),
            ("point_category".into(), self.point_category.into()),
            ("point_number".into(), self.point_number.into()),
            ("logical_point_number".into(), self.logical_point_number.into()),
            ("logical_point_zone".into(), self.logical_point_zone.into()),
            ("device_category".into(), self.device_category.into()),
            ("group0".into(), group_high.into()),
            ("group1".into(), group_low.into()),
            ("output_point_state_store".into(), self.output_point_state_store.into()),
            ("reserved0".into(), 0u8.into()),
            ("reserved1".into(), 0u8.into()),
            ("multi_area_type".into(), self.multi_area_type.into()),
        ];
        fields.extend(
            self.areas
                .iter()
                .enumerate()
                .map(|(i, area)| (format!("areas{}", i), FieldValue::Byte(*area))),
        );
        fields.push(("area240".into(), self.area240.into()));
        fields.push(("device_type".into(), self.device_type.into()));
        fields.push(("request_type".into(), self.request_type.into()));
        fields.push(("search_type".into(), self.search_type.into()));

        FieldTable::from_fields(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::content::ByteContainer;

    #[test]
    fn test_expected_reply_lengths() {
        use ProtocolVersion::*;
        assert_eq!(RequestKind::Restart(V5).expected_reply_len(), 0);
        assert_eq!(RequestKind::Restart(V6).expected_reply_len(), 0);
        assert_eq!(RequestKind::PanelDetails(V5).expected_reply_len(), 30);
        assert_eq!(RequestKind::PanelDetails(V6).expected_reply_len(), 31);
        assert_eq!(RequestKind::PointInformation(V5).expected_reply_len(), 55);
        assert_eq!(RequestKind::PointInformation(V6).expected_reply_len(), 55);
    }

    #[test]
    fn test_point_information_payload() {
        let mut request = PointInformationRequest::for_point(ProtocolVersion::V5, 17);
        request.group = 0x0102;
        let payload = request.payload().unwrap();

        assert_eq!(payload.len(), 48);
        let keys: Vec<_> = payload.keys().collect();
        assert_eq!(&keys[..5], &["node", "channel", "channel_address", "point_category", "point_number"]);
        assert_eq!(keys[14], "areas0");
        assert_eq!(keys[43], "areas29");
        assert_eq!(&keys[44..], &["area240", "device_type", "request_type", "search_type"]);

        let bytes = payload.to_bytes();
        assert_eq!(bytes[4], 17);
        assert_eq!(bytes[5], 253);
        assert_eq!(bytes[6], 254);
        assert_eq!(&bytes[8..10], &[0x01, 0x02]);
        assert_eq!(bytes[45], 127);
        assert_eq!(bytes[47], 10);
    }

    #[test]
    fn test_point_information_packet() {
        let request = PointInformationRequest::for_point(ProtocolVersion::V6, 3);
        let packet = request.to_packet(&HeaderDefaults::default()).unwrap();

        assert_eq!(packet.fields().len(), 11 + 48);
        assert_eq!(packet.header().packet_length(), 11 + 48);
        let bytes = packet.serialize(1);
        assert_eq!(bytes.len(), 2 + 11 + 48 + 1);
        assert_eq!(bytes[11], PacketId::PointInformationRequest as u8);
    }

    #[test]
    fn test_point_information_packet_both_versions() {
        let defaults = HeaderDefaults::default();
        for (version, header_len) in [(ProtocolVersion::V5, 9), (ProtocolVersion::V6, 11)] {
            let mut request = PointInformationRequest::for_point(version, 42);
            request.channel = 12;
            let packet = request.to_packet(&defaults).unwrap();

            assert_eq!(packet.header().packet_length() as usize, header_len + 48);
            // The header channel and the payload channel are separate bytes
            assert_eq!(packet.get_parameter("channel"), Some(&FieldValue::Byte(0)));
            assert_eq!(packet.get_parameter("payload.channel"), Some(&FieldValue::Byte(12)));

            let bytes = packet.serialize(1);
            assert_eq!(bytes.len(), 2 + header_len + 48 + 1);
            assert_eq!(bytes[2 + header_len + 1], 12);
            assert_eq!(bytes[2 + header_len + 4], 42);
        }
    }

    #[test]
    fn test_restart_uses_requested_version() {
        let defaults = HeaderDefaults::default();
        let packet = RestartPanel::new(ProtocolVersion::V6).to_packet(&defaults).unwrap();
        assert_eq!(packet.header().version(), ProtocolVersion::V6);
        assert_eq!(packet.header().packet_length(), 11);

        let packet = PanelDetailsRequest::new(ProtocolVersion::V5).to_packet(&defaults).unwrap();
        assert_eq!(packet.header().version(), ProtocolVersion::V5);
        assert_eq!(packet.to_bytes()[8], PacketId::PanelDetailsRequest as u8);
    }
}
