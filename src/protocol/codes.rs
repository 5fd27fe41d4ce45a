//! Code tables for enumerated reply fields
//!
//! Every table is an enum with an `Unknown(u8)` variant, so a code the table
//! does not list is carried through as its raw value instead of failing.

use std::fmt;

use crate::core::FieldValue;

macro_rules! code_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $code:literal => $variant:ident : $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[doc = $label]
                $variant,
            )+
            /// Code not listed in the table
            Unknown(u8),
        }

        impl $name {
            /// Descriptive label, `None` for unknown codes
            pub fn label(&self) -> Option<&'static str> {
                match self {
                    $( $name::$variant => Some($label), )+
                    $name::Unknown(_) => None,
                }
            }

            /// Label for known codes, raw byte for unknown ones
            pub fn field_value(code: u8) -> FieldValue {
                match $name::from(code).label() {
                    Some(label) => FieldValue::Label(label),
                    None => FieldValue::Byte(code),
                }
            }
        }

        impl From<u8> for $name {
            fn from(code: u8) -> Self {
                match code {
                    $( $code => $name::$variant, )+
                    other => $name::Unknown(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                match value {
                    $( $name::$variant => $code, )+
                    $name::Unknown(code) => code,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.label() {
                    Some(label) => f.write_str(label),
                    None => write!(f, "{}", u8::from(*self)),
                }
            }
        }
    };
}

code_table! {
    /// Outcome of a request
    ReplyStatus {
        0 => Success: "Success",
        1 => Failure: "Failure",
    }
}

code_table! {
    /// Point condition flags
    PointFlags {
        0 => InputForced: "Input Forced",
        1 => UntestedOrFailed: "Point Untested or Failed",
        2 => InputIsolated: "Input Isolated",
        4 => OutputIsolated: "Output Isolated",
        8 => OutOfCompensation: "Out of Compensation",
        16 => PointType: "Point Type",
        32 => LoopFault: "Loop Fault",
        64 => OutputUnderTest: "Output Under Test",
    }
}

code_table! {
    /// Panel communication channel
    Channel {
        0 => MpCpu: "MP CPU/Software Channel",
        1 => RBus: "RBus (Remote Bus)",
        2 => Com1: "COM1",
        3 => Com2: "COM2",
        4 => Com3: "COM3 (Network Port)",
        5 => LNet: "LNet (Local Ethernet)",
        6 => ServiceBus: "Service Bus",
        7 => AllChannels: "All Channels",
        12 => MpLoop: "MP Loop",
        13 => MpNonLoop: "MP Non-Loop",
        14 => CommPortsStatuses: "Comm Ports Statuses",
        15 => CommNodesStatuses: "Comm Nodes Statuses",
    }
}

code_table! {
    /// Address on a channel
    ChannelAddress {
        255 => All: "All",
    }
}

code_table! {
    /// Kind of point
    PointCategory {
        0 => Real: "Real",
        1 => Pseudo: "Pseudo",
        2 => XBus: "XBus (Expansion Bus)",
        3 => Timer: "Timer",
        4 => Menu: "Menu",
        5 => Isolate: "Isolate",
        6 => User: "User",
        254 => NotAPoint: "Not a Point",
        255 => All: "All",
    }
}

code_table! {
    /// Physical point number
    PointNumber {
        253 => NoPhysicalAddress: "No Physical Address Provided",
        255 => All: "All",
    }
}

code_table! {
    /// Zone of a logical point
    LogicalPointZone {
        254 => NotApplicable: "Zone N/A",
    }
}

code_table! {
    /// Sector a point belongs to
    SectorId {
        254 => NotInSector: "Not in Sector",
    }
}

code_table! {
    /// Loop protocol
    LoopType {
        0 => Thorn: "Thorn",
        1 => MxDigital: "MX Digital",
        2 => NotLoop: "Not Loop",
        3 => Zetfas: "Zetfas",
        4 => Sti: "STI",
    }
}

code_table! {
    /// Long-term average availability
    LtaFlags {
        0 => LtaAvailable: "LTA Available",
        1 => DirtinessAvailable: "Dirtiness Available",
    }
}

code_table! {
    /// Unit attached to an analogue value
    UnitOfMeasure {
        0 => Invalid: "Invalid",
        1 => DegreesC: "Degrees C",
        2 => DegreesF: "Degrees F",
        3 => Ppm: "ppm (parts per million)",
        4 => ObscurationPerFoot: "%/ft obscuration",
        5 => ObscurationPerMetre: "%/m obscuration",
        6 => YValue: "Y value",
        7 => Amps: "Amps",
        8 => Volts: "Volts",
        9 => NotInstalled: "Not Installed",
        10 => MilliAmps: "mA",
    }
}

code_table! {
    /// Instantaneous active state of a point
    InstantaneousActiveState {
        0 => Clear: "Clear",
        1 => PreAlarm: "Pre-Alarm",
        2 => AlarmVerifying: "Alarm Verifying",
        3 => Active: "Active",
        4 => Resetting: "Resetting",
        5 => Test: "Test",
    }
}

code_table! {
    /// Confirmed active state of a point
    ConfirmedActiveState {
        0 => Clear: "Clear",
        1 => PreAlarm: "Pre-Alarm",
        2 => AlarmVerifying: "Alarm Verifying",
        3 => Active: "Active",
        4 => Resetting: "Resetting",
        5 => Test: "Test",
        6 => ActivateWarning: "Activate Warning",
    }
}

code_table! {
    /// Whether an output is forced
    OutputForcedMode {
        0 => Unforced: "Currently Unforced",
        1 => Forced: "Currently Forced",
    }
}

code_table! {
    /// Drive state of an output
    OutputState {
        0 => Off: "Off",
        1 => On: "On",
        2 => Pulse1: "Pulse 1 (pulsing mode 1)",
        3 => Pulse2: "Pulse 2 (pulsing mode 2)",
        4 => NoOutput: "Point With No Output",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(ReplyStatus::from(0), ReplyStatus::Success);
        assert_eq!(Channel::from(12), Channel::MpLoop);
        assert_eq!(UnitOfMeasure::from(10).label(), Some("mA"));
        assert_eq!(ConfirmedActiveState::from(6), ConfirmedActiveState::ActivateWarning);
    }

    #[test]
    fn test_unknown_code_falls_back() {
        assert_eq!(Channel::from(9), Channel::Unknown(9));
        assert_eq!(Channel::from(9).label(), None);
        assert_eq!(Channel::field_value(9), FieldValue::Byte(9));
        assert_eq!(LoopType::field_value(200), FieldValue::Byte(200));
        assert_eq!(Channel::field_value(3), FieldValue::Label("COM2"));
    }

    #[test]
    fn test_code_conversion_back() {
        assert_eq!(u8::from(PointCategory::NotAPoint), 254);
        assert_eq!(u8::from(PointFlags::Unknown(3)), 3);
        assert_eq!(u8::from(OutputState::Pulse2), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(LoopType::MxDigital.to_string(), "MX Digital");
        assert_eq!(SectorId::from(7).to_string(), "7");
    }
}
