//! Point information reply decoding
//!
//! A reply is a framed packet of fixed length:
//!
//! ```text
//! [SOH][seq][reply header][reply payload][checksum]
//! ```
//!
//! Each field has a constant byte offset that depends on the protocol
//! revision, because the MX Speak 6 header is two bytes longer. Decoding
//! copies the raw values into a [`FieldTable`], then replaces enumerated
//! codes with their labels. Codes missing from a table stay numeric.

use std::fmt;

use crate::core::{Error, FieldValue, ProtocolVersion, Result};

use super::codes::*;
use super::content::{ByteContainer, FieldTable};
use super::packet::checksum;
use super::request::POINT_INFO_REPLY_LEN;

/// Name of the reply status field
pub const REPLY_STATUS: &str = "reply_status";

/// How a field is read from the raw reply
#[derive(Clone, Copy)]
enum FieldKind {
    /// Single byte kept as is
    Raw,
    /// Two bytes, high byte first
    Word,
    /// Single byte looked up in a code table
    Coded(fn(u8) -> FieldValue),
}

/// Name, offset and kind of one reply field
#[derive(Clone, Copy)]
pub struct FieldSpec {
    name: &'static str,
    offset: usize,
    kind: FieldKind,
}

impl FieldSpec {
    const fn raw(name: &'static str, offset: usize) -> Self {
        Self { name, offset, kind: FieldKind::Raw }
    }

    const fn word(name: &'static str, offset: usize) -> Self {
        Self { name, offset, kind: FieldKind::Word }
    }

    const fn coded(name: &'static str, offset: usize, lookup: fn(u8) -> FieldValue) -> Self {
        Self { name, offset, kind: FieldKind::Coded(lookup) }
    }

    /// Field name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Offset of the field's first byte in the raw reply
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn width(&self) -> usize {
        match self.kind {
            FieldKind::Word => 2,
            _ => 1,
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .finish()
    }
}

/// MX Speak 5 point information reply layout
pub static POINT_INFO_V5: [FieldSpec; 44] = [
    FieldSpec::raw("sequence_number", 1),
    FieldSpec::raw("packet_length", 2),
    FieldSpec::raw("packet_id", 10),
    FieldSpec::coded(REPLY_STATUS, 11, ReplyStatus::field_value),
    FieldSpec::coded("flags", 12, PointFlags::field_value),
    FieldSpec::raw("node", 13),
    FieldSpec::coded("channel", 14, Channel::field_value),
    FieldSpec::coded("channel_address", 15, ChannelAddress::field_value),
    FieldSpec::coded("point_category", 16, PointCategory::field_value),
    FieldSpec::coded("point_number", 17, PointNumber::field_value),
    FieldSpec::raw("logical_point_number", 18),
    FieldSpec::coded("logical_point_zone", 19, LogicalPointZone::field_value),
    FieldSpec::raw("device_type", 20),
    FieldSpec::raw("auxiliary_point_attributes", 21),
    FieldSpec::word("group", 22),
    FieldSpec::raw("area_type", 24),
    FieldSpec::raw("area_number", 25),
    FieldSpec::coded("sector_id", 26, SectorId::field_value),
    FieldSpec::coded("loop_type", 27, LoopType::field_value),
    FieldSpec::raw("raw_identity", 28),
    FieldSpec::raw("actual_device_type", 29),
    FieldSpec::raw("mode_and_sensitivity", 30),
    FieldSpec::raw("raw_analogue_value1", 31),
    FieldSpec::raw("raw_analogue_value2", 32),
    FieldSpec::raw("raw_analogue_value3", 33),
    FieldSpec::coded("lta_flags", 34, LtaFlags::field_value),
    FieldSpec::raw("raw_lta", 35),
    FieldSpec::raw("dirtiness", 36),
    FieldSpec::coded("units_of_measure1", 37, UnitOfMeasure::field_value),
    FieldSpec::coded("units_of_measure2", 38, UnitOfMeasure::field_value),
    FieldSpec::coded("units_of_measure3", 39, UnitOfMeasure::field_value),
    FieldSpec::raw("converted_value1", 40),
    FieldSpec::raw("converted_value2", 41),
    FieldSpec::raw("converted_value3", 42),
    FieldSpec::coded("instantaneous_active_state", 43, InstantaneousActiveState::field_value),
    FieldSpec::raw("instantaneous_fault_state", 44),
    FieldSpec::coded("confirmed_active_state", 45, ConfirmedActiveState::field_value),
    FieldSpec::raw("confirmed_fault_state", 46),
    FieldSpec::raw("acknowledged_active_state", 47),
    FieldSpec::raw("acknowledged_fault_state", 48),
    FieldSpec::coded("output_forced_mode", 49, OutputForcedMode::field_value),
    FieldSpec::coded("output_unforced_state", 50, OutputState::field_value),
    FieldSpec::coded("output_forced_state", 51, OutputState::field_value),
    FieldSpec::raw("checksum", 54),
];

/// MX Speak 6 point information reply layout
pub static POINT_INFO_V6: [FieldSpec; 45] = [
    FieldSpec::raw("sequence_number", 1),
    FieldSpec::raw("packet_length", 2),
    FieldSpec::raw("protocol_signature", 3),
    FieldSpec::raw("packet_id", 11),
    FieldSpec::coded(REPLY_STATUS, 13, ReplyStatus::field_value),
    FieldSpec::coded("flags", 14, PointFlags::field_value),
    FieldSpec::raw("node", 15),
    FieldSpec::coded("channel", 16, Channel::field_value),
    FieldSpec::coded("channel_address", 17, ChannelAddress::field_value),
    FieldSpec::coded("point_category", 18, PointCategory::field_value),
    FieldSpec::coded("point_number", 19, PointNumber::field_value),
    FieldSpec::raw("logical_point_number", 20),
    FieldSpec::coded("logical_point_zone", 21, LogicalPointZone::field_value),
    FieldSpec::raw("device_type", 22),
    FieldSpec::raw("auxiliary_point_attributes", 23),
    FieldSpec::word("group", 24),
    FieldSpec::raw("area_type", 26),
    FieldSpec::raw("area_number", 27),
    FieldSpec::coded("sector_id", 28, SectorId::field_value),
    FieldSpec::coded("loop_type", 29, LoopType::field_value),
    FieldSpec::raw("raw_identity", 30),
    FieldSpec::raw("actual_device_type", 31),
    FieldSpec::raw("mode_and_sensitivity", 32),
    FieldSpec::raw("raw_analogue_value1", 33),
    FieldSpec::raw("raw_analogue_value2", 34),
    FieldSpec::raw("raw_analogue_value3", 35),
    FieldSpec::coded("lta_flags", 36, LtaFlags::field_value),
    FieldSpec::raw("raw_lta", 37),
    FieldSpec::raw("dirtiness", 38),
    FieldSpec::coded("units_of_measure1", 39, UnitOfMeasure::field_value),
    FieldSpec::coded("units_of_measure2", 40, UnitOfMeasure::field_value),
    FieldSpec::coded("units_of_measure3", 41, UnitOfMeasure::field_value),
    FieldSpec::raw("converted_value1", 42),
    FieldSpec::raw("converted_value2", 43),
    FieldSpec::raw("converted_value3", 44),
    FieldSpec::coded("instantaneous_active_state", 45, InstantaneousActiveState::field_value),
    FieldSpec::raw("instantaneous_fault_state", 46),
    FieldSpec::coded("confirmed_active_state", 47, ConfirmedActiveState::field_value),
    FieldSpec::raw("confirmed_fault_state", 48),
    FieldSpec::raw("acknowledged_active_state", 49),
    FieldSpec::raw("acknowledged_fault_state", 50),
    FieldSpec::coded("output_forced_mode", 51, OutputForcedMode::field_value),
    FieldSpec::coded("output_unforced_state", 52, OutputState::field_value),
    FieldSpec::coded("output_forced_state", 53, OutputState::field_value),
    FieldSpec::raw("checksum", 54),
];

/// Reply layout for `version`
pub fn layout(version: ProtocolVersion) -> &'static [FieldSpec] {
    match version {
        ProtocolVersion::V5 => &POINT_INFO_V5,
        ProtocolVersion::V6 => &POINT_INFO_V6,
    }
}

/// A point information reply after decoding
#[derive(Debug, Clone)]
pub struct DecodedReply {
    version: ProtocolVersion,
    raw: Vec<u8>,
    fields: FieldTable,
}

/// Decodes an MX Speak 5 point information reply
pub fn decode_v5(raw: &[u8]) -> Result<DecodedReply> {
    decode(ProtocolVersion::V5, raw)
}

/// Decodes an MX Speak 6 point information reply
pub fn decode_v6(raw: &[u8]) -> Result<DecodedReply> {
    decode(ProtocolVersion::V6, raw)
}

/// Decodes a point information reply of either revision
pub fn decode(version: ProtocolVersion, raw: &[u8]) -> Result<DecodedReply> {
    let specs = layout(version);
    let required = specs
        .iter()
        .map(|spec| spec.offset + spec.width())
        .max()
        .unwrap_or(POINT_INFO_REPLY_LEN);
    if raw.len() < required {
        return Err(Error::FrameTooShort {
            expected: required,
            actual: raw.len(),
        });
    }

    let mut fields = FieldTable::new();
    for spec in specs {
        let value = match spec.kind {
            FieldKind::Word => {
                FieldValue::Word(u16::from_be_bytes([raw[spec.offset], raw[spec.offset + 1]]))
            }
            _ => FieldValue::Byte(raw[spec.offset]),
        };
        fields.insert(spec.name, value)?;
    }

    // Substitute labels for enumerated codes
    for spec in specs {
        if let FieldKind::Coded(lookup) = spec.kind {
            fields.set(spec.name, lookup(raw[spec.offset]))?;
        }
    }

    Ok(DecodedReply {
        version,
        raw: raw.to_vec(),
        fields: fields.into_fixed(),
    })
}

impl DecodedReply {
    /// Protocol revision the reply was decoded with
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Bytes the reply was decoded from
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Decoded value of a field
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// True iff the reply status code is 0
    pub fn reply_successful(&self) -> bool {
        self.reply_status() == ReplyStatus::Success
    }

    /// Raw code of a field, before label substitution
    pub fn raw_byte(&self, name: &str) -> Option<u8> {
        layout(self.version)
            .iter()
            .find(|spec| spec.name == name)
            .and_then(|spec| self.raw.get(spec.offset).copied())
    }

    fn code(&self, name: &str) -> u8 {
        self.raw_byte(name).unwrap_or_default()
    }

    /// Outcome of the request
    pub fn reply_status(&self) -> ReplyStatus {
        ReplyStatus::from(self.code(REPLY_STATUS))
    }

    /// Point condition flags
    pub fn flags(&self) -> PointFlags {
        PointFlags::from(self.code("flags"))
    }

    /// Channel the point sits on
    pub fn channel(&self) -> Channel {
        Channel::from(self.code("channel"))
    }

    /// Kind of point
    pub fn point_category(&self) -> PointCategory {
        PointCategory::from(self.code("point_category"))
    }

    /// Physical point number as a plain address
    pub fn point_number(&self) -> u8 {
        self.code("point_number")
    }

    /// Device type code, kept numeric
    pub fn device_type(&self) -> u8 {
        self.code("device_type")
    }

    /// Group, reassembled high byte first
    pub fn group(&self) -> u16 {
        self.fields
            .get("group")
            .and_then(FieldValue::as_word)
            .unwrap_or_default()
    }

    /// Sector the point belongs to
    pub fn sector_id(&self) -> SectorId {
        SectorId::from(self.code("sector_id"))
    }

    /// Loop protocol
    pub fn loop_type(&self) -> LoopType {
        LoopType::from(self.code("loop_type"))
    }

    /// Long-term average availability
    pub fn lta_flags(&self) -> LtaFlags {
        LtaFlags::from(self.code("lta_flags"))
    }

    /// Units of the three analogue values
    pub fn units_of_measure(&self) -> [UnitOfMeasure; 3] {
        [
            UnitOfMeasure::from(self.code("units_of_measure1")),
            UnitOfMeasure::from(self.code("units_of_measure2")),
            UnitOfMeasure::from(self.code("units_of_measure3")),
        ]
    }

    /// Active state as currently sensed
    pub fn instantaneous_active_state(&self) -> InstantaneousActiveState {
        InstantaneousActiveState::from(self.code("instantaneous_active_state"))
    }

    /// Active state after confirmation
    pub fn confirmed_active_state(&self) -> ConfirmedActiveState {
        ConfirmedActiveState::from(self.code("confirmed_active_state"))
    }

    /// Whether the output is forced
    pub fn output_forced_mode(&self) -> OutputForcedMode {
        OutputForcedMode::from(self.code("output_forced_mode"))
    }

    /// Output state when not forced
    pub fn output_unforced_state(&self) -> OutputState {
        OutputState::from(self.code("output_unforced_state"))
    }

    /// Output state while forced
    pub fn output_forced_state(&self) -> OutputState {
        OutputState::from(self.code("output_forced_state"))
    }

    /// Whether the trailing checksum matches the bytes before it
    pub fn checksum_valid(&self) -> bool {
        match self.raw.get(1..POINT_INFO_REPLY_LEN - 1) {
            Some(body) => checksum(body) == self.code("checksum"),
            None => false,
        }
    }

    /// Field values as one comma-separated line
    pub fn to_csv(&self) -> String {
        self.fields.to_csv()
    }
}

impl ByteContainer for DecodedReply {
    fn fields(&self) -> &FieldTable {
        &self.fields
    }
}

impl fmt::Display for DecodedReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv())
    }
}

/// Builds a well-formed raw reply with every field zero except `values`
#[cfg(test)]
pub(crate) fn encode_reply(version: ProtocolVersion, values: &[(&str, u8)]) -> Vec<u8> {
    let mut raw = vec![0u8; POINT_INFO_REPLY_LEN];
    raw[0] = crate::core::SOH;
    for &(name, value) in values {
        let spec = layout(version)
            .iter()
            .find(|spec| spec.name == name)
            .expect("field exists in layout");
        raw[spec.offset] = value;
    }
    let last = POINT_INFO_REPLY_LEN - 1;
    raw[last] = checksum(&raw[1..last]);
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_are_consistent() {
        for version in [ProtocolVersion::V5, ProtocolVersion::V6] {
            let specs = layout(version);
            let mut seen = std::collections::HashSet::new();
            let mut last_end = 0;
            for spec in specs {
                assert!(seen.insert(spec.name), "duplicate field {}", spec.name);
                assert!(spec.offset >= last_end, "overlap at {}", spec.name);
                last_end = spec.offset + spec.width();
            }
            assert_eq!(last_end, POINT_INFO_REPLY_LEN);
        }
        assert_eq!(POINT_INFO_V6.len(), POINT_INFO_V5.len() + 1);
    }

    #[test]
    fn test_decode_v5_known_codes() {
        let raw = encode_reply(
            ProtocolVersion::V5,
            &[
                ("sequence_number", 3),
                ("channel", 12),
                ("point_category", 0),
                ("point_number", 42),
                ("device_type", 7),
                ("loop_type", 1),
                ("units_of_measure1", 1),
                ("instantaneous_active_state", 3),
                ("output_forced_mode", 1),
                ("output_forced_state", 2),
            ],
        );
        let reply = decode_v5(&raw).unwrap();

        assert!(reply.reply_successful());
        assert_eq!(reply.get(REPLY_STATUS), Some(&FieldValue::Label("Success")));
        assert_eq!(reply.get("channel"), Some(&FieldValue::Label("MP Loop")));
        assert_eq!(reply.get("point_category"), Some(&FieldValue::Label("Real")));
        assert_eq!(reply.get("point_number"), Some(&FieldValue::Byte(42)));
        assert_eq!(reply.get("loop_type"), Some(&FieldValue::Label("MX Digital")));
        assert_eq!(reply.get("units_of_measure1"), Some(&FieldValue::Label("Degrees C")));
        assert_eq!(reply.get("sequence_number"), Some(&FieldValue::Byte(3)));

        assert_eq!(reply.channel(), Channel::MpLoop);
        assert_eq!(reply.point_number(), 42);
        assert_eq!(reply.device_type(), 7);
        assert_eq!(reply.instantaneous_active_state(), InstantaneousActiveState::Active);
        assert_eq!(reply.output_forced_mode(), OutputForcedMode::Forced);
        assert_eq!(reply.output_forced_state(), OutputState::Pulse1);
        assert!(reply.checksum_valid());
    }

    #[test]
    fn test_decode_v6_offsets() {
        let raw = encode_reply(
            ProtocolVersion::V6,
            &[("protocol_signature", 0xe4), ("point_number", 9), ("loop_type", 4)],
        );
        let reply = decode_v6(&raw).unwrap();

        assert_eq!(reply.version(), ProtocolVersion::V6);
        assert_eq!(raw[19], 9);
        assert_eq!(reply.point_number(), 9);
        assert_eq!(reply.get("protocol_signature"), Some(&FieldValue::Byte(0xe4)));
        assert_eq!(reply.loop_type(), LoopType::Sti);
        // Same bytes read as V5 land on different fields
        let as_v5 = decode_v5(&raw).unwrap();
        assert_ne!(as_v5.point_number(), 9);
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        let raw = encode_reply(
            ProtocolVersion::V5,
            &[
                ("channel", 9),
                ("loop_type", 77),
                ("units_of_measure2", 200),
                ("confirmed_active_state", 99),
            ],
        );
        let reply = decode_v5(&raw).unwrap();

        assert_eq!(reply.get("channel"), Some(&FieldValue::Byte(9)));
        assert_eq!(reply.get("loop_type"), Some(&FieldValue::Byte(77)));
        assert_eq!(reply.get("units_of_measure2"), Some(&FieldValue::Byte(200)));
        assert_eq!(reply.get("confirmed_active_state"), Some(&FieldValue::Byte(99)));
        assert_eq!(reply.channel(), Channel::Unknown(9));
    }

    #[test]
    fn test_group_is_big_endian() {
        let mut raw = encode_reply(ProtocolVersion::V5, &[]);
        raw[22] = 0x12;
        raw[23] = 0x34;
        let reply = decode_v5(&raw).unwrap();
        assert_eq!(reply.group(), 0x1234);
        assert_eq!(reply.get("group"), Some(&FieldValue::Word(0x1234)));
    }

    #[test]
    fn test_reply_successful_only_for_zero() {
        for status in [1u8, 2, 254, 255] {
            let raw = encode_reply(ProtocolVersion::V6, &[(REPLY_STATUS, status)]);
            let reply = decode_v6(&raw).unwrap();
            assert!(!reply.reply_successful(), "status {}", status);
        }
        let raw = encode_reply(ProtocolVersion::V6, &[(REPLY_STATUS, 1)]);
        assert_eq!(
            decode_v6(&raw).unwrap().get(REPLY_STATUS),
            Some(&FieldValue::Label("Failure"))
        );
    }

    #[test]
    fn test_short_reply_rejected() {
        let result = decode_v5(&[0x01, 0x02, 0x03]);
        assert!(matches!(
            result,
            Err(Error::FrameTooShort { expected: 55, actual: 3 })
        ));
    }

    #[test]
    fn test_bad_checksum_is_reported_not_fatal() {
        let mut raw = encode_reply(ProtocolVersion::V5, &[("point_number", 5)]);
        raw[54] = raw[54].wrapping_add(1);
        let reply = decode_v5(&raw).unwrap();
        assert!(!reply.checksum_valid());
        assert_eq!(reply.point_number(), 5);
    }

    #[test]
    fn test_csv_rendering_order() {
        let raw = encode_reply(ProtocolVersion::V5, &[("sequence_number", 2), ("packet_length", 41)]);
        let reply = decode_v5(&raw).unwrap();
        let csv = reply.to_csv();
        assert!(csv.starts_with("2,41,0,Success,Input Forced,0,MP CPU/Software Channel,"));
        assert_eq!(csv.split(',').count(), POINT_INFO_V5.len());
        assert_eq!(reply.to_string(), csv);
    }
}
