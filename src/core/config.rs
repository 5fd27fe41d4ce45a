//! Process configuration
//!
//! The configuration is a JSON document, normally `config.json` in the working
//! directory. Every section is optional and falls back to the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serialport::{DataBits, Parity, StopBits};

use super::error::{Error, Result};
use super::types::ProtocolVersion;

/// Default configuration file name
pub const CONFIG_PATH: &str = "config.json";

/// Complete process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    /// Protocol revision spoken by the panel
    #[serde(default)]
    pub mx_speak_version: ProtocolVersion,
    /// Per-platform port names
    #[serde(default)]
    pub com: ComConfig,
    /// Serial line parameters
    #[serde(default)]
    pub serial: SerialConfig,
    /// Period between polling passes over the discovered points
    #[serde(
        default = "default_time_period",
        serialize_with = "super::serde::serialize_duration",
        deserialize_with = "super::serde::deserialize_duration"
    )]
    pub time_period: Duration,
    /// Period between requests during discovery
    #[serde(
        default = "default_polling_time_period",
        serialize_with = "super::serde::serialize_duration",
        deserialize_with = "super::serde::deserialize_duration"
    )]
    pub polling_time_period: Duration,
    /// Highest point address scanned during discovery
    #[serde(default = "default_maximum_point_number")]
    pub maximum_point_number: u8,
    /// Packet construction defaults
    #[serde(default)]
    pub packets: PacketConfig,
    /// Reply log settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Port names keyed by host platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComConfig {
    /// Port used on Windows hosts
    pub windows: Option<String>,
    /// Port used on Linux hosts
    pub linux: Option<String>,
}

impl Default for ComConfig {
    fn default() -> Self {
        ComConfig {
            windows: Some("COM1".to_string()),
            linux: Some("/dev/ttyUSB0".to_string()),
        }
    }
}

/// Serial line parameters
///
/// `bytesize` and `stopbits` are kept as raw JSON so that a non-integer value
/// is reported as an invalid value rather than a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SerialConfig {
    /// Line speed
    pub baudrate: u32,
    /// Timeout applied to each raw channel read
    #[serde(
        serialize_with = "super::serde::serialize_duration",
        deserialize_with = "super::serde::deserialize_duration"
    )]
    pub timeout: Duration,
    /// Data bits per character (5 to 8)
    pub bytesize: Value,
    /// Parity name
    pub parity: String,
    /// Stop bits (1 or 2)
    pub stopbits: Value,
    /// Time allowed for a full reply before the request is abandoned
    #[serde(
        serialize_with = "super::serde::serialize_duration",
        deserialize_with = "super::serde::deserialize_duration"
    )]
    pub resend_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baudrate: 9600,
            timeout: Duration::from_secs(1),
            bytesize: Value::from(8),
            parity: "none".to_string(),
            stopbits: Value::from(1),
            resend_timeout: Duration::from_secs(5),
        }
    }
}

/// Header defaults used when building packets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PacketConfig {
    /// Value of the MX Speak 6 protocol signature field
    pub mx_speak_signature: u8,
    /// Default packet length of an MX Speak 5 local header
    pub mx5_default_packet_length: u8,
    /// Default packet length of an MX Speak 6 local header
    pub mx6_default_packet_length: u8,
}

impl Default for PacketConfig {
    fn default() -> Self {
        PacketConfig {
            mx_speak_signature: 0xe4,
            mx5_default_packet_length: 0x09,
            mx6_default_packet_length: 0x0b,
        }
    }
}

/// Reply log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write decoded replies to a CSV file
    pub enabled: bool,
    /// Directory holding the CSV file
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            enabled: false,
            directory: PathBuf::from("logs"),
        }
    }
}

fn default_time_period() -> Duration {
    Duration::from_secs(5)
}

fn default_polling_time_period() -> Duration {
    Duration::from_millis(500)
}

fn default_maximum_point_number() -> u8 {
    u8::MAX
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            mx_speak_version: ProtocolVersion::default(),
            com: ComConfig::default(),
            serial: SerialConfig::default(),
            time_period: default_time_period(),
            polling_time_period: default_polling_time_period(),
            maximum_point_number: default_maximum_point_number(),
            packets: PacketConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Configuration {
    /// Loads and validates configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_json(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parses and validates configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks every value that is converted lazily
    pub fn validate(&self) -> Result<()> {
        self.data_bits()?;
        self.parity()?;
        self.stop_bits()?;

        if self.serial.resend_timeout.is_zero() {
            return Err(Error::invalid_value("resend-timeout must be greater than zero"));
        }

        Ok(())
    }

    /// Returns the port name configured for the host platform
    pub fn channel_port(&self) -> Result<String> {
        let port = if cfg!(target_os = "windows") {
            self.com.windows.clone()
        } else if cfg!(target_os = "linux") {
            self.com.linux.clone()
        } else {
            return Err(Error::unsupported_platform(format!(
                "platforms of type '{}' are not supported",
                std::env::consts::OS
            )));
        };

        port.ok_or_else(|| {
            Error::config(format!("no port configured for '{}'", std::env::consts::OS))
        })
    }

    /// Line speed
    pub fn baud_rate(&self) -> u32 {
        self.serial.baudrate
    }

    /// Timeout for a single raw read
    pub fn read_timeout(&self) -> Duration {
        self.serial.timeout
    }

    /// Time allowed for a full reply
    pub fn resend_timeout(&self) -> Duration {
        self.serial.resend_timeout
    }

    /// Data bits per character
    pub fn data_bits(&self) -> Result<DataBits> {
        let value = integer_setting("bytesize", &self.serial.bytesize)?;
        match value {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            other => Err(Error::invalid_value(format!(
                "Invalid bytesize value '{}': bytesize can only be 5, 6, 7 or 8",
                other
            ))),
        }
    }

    /// Parity mode
    pub fn parity(&self) -> Result<Parity> {
        match self.serial.parity.as_str() {
            "none" => Ok(Parity::None),
            "odd" => Ok(Parity::Odd),
            "even" => Ok(Parity::Even),
            other => Err(Error::invalid_value(format!(
                "Invalid parity value '{}': parity can only be 'none', 'odd' or 'even'",
                other
            ))),
        }
    }

    /// Stop bits per character
    pub fn stop_bits(&self) -> Result<StopBits> {
        let value = integer_setting("stopbits", &self.serial.stopbits)?;
        match value {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            other => Err(Error::invalid_value(format!(
                "Invalid stopbits value '{}': stopbits must be either 1 or 2",
                other
            ))),
        }
    }
}

fn integer_setting(name: &str, value: &Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        Error::invalid_value(format!(
            "Invalid {} value '{}': {} must be an integer value",
            name, value, name
        ))
    })
}
