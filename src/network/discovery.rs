use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::{Configuration, ProtocolVersion, Result};
use crate::protocol::{
    decode, DecodedReply, HeaderDefaults, PanelDetailsRequest, PointInformationRequest, Request,
    RestartPanel,
};
use crate::time::Clock;
use crate::transport::{Channel, Transport};
use crate::util::{to_hex, ReplyLog};

/// Longest sleep between two clock polls while waiting for a tick
const IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// Replies for other points tolerated in one query before giving up
const STALE_REPLY_LIMIT: usize = 3;

/// Configuration for discovery and polling
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Protocol revision spoken by the panel
    pub version: ProtocolVersion,
    /// Header values used for every request
    pub header_defaults: HeaderDefaults,
    /// Period between polling passes
    pub time_period: Duration,
    /// Period between requests during discovery
    pub polling_time_period: Duration,
    /// Highest address scanned during discovery
    pub maximum_point_number: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig::from_configuration(&Configuration::default())
    }
}

impl ControllerConfig {
    /// Takes the protocol version, header defaults and periods from `config`
    pub fn from_configuration(config: &Configuration) -> Self {
        ControllerConfig {
            version: config.mx_speak_version,
            header_defaults: HeaderDefaults::from(&config.packets),
            time_period: config.time_period,
            polling_time_period: config.polling_time_period,
            maximum_point_number: config.maximum_point_number,
        }
    }
}

/// Result of polling one discovered point
#[derive(Debug, Clone)]
pub struct PointReport {
    /// Point address
    pub address: u8,
    /// Decoded reply, `None` when the panel did not answer in time
    pub reply: Option<DecodedReply>,
}

impl PointReport {
    /// True when the point did not answer
    pub fn is_timeout(&self) -> bool {
        self.reply.is_none()
    }
}

/// Drives point discovery and the recurring polling of discovered points
///
/// Exactly one request is in flight at any time. Addresses are always
/// processed in ascending order.
pub struct Controller<C> {
    transport: Transport<C>,
    config: ControllerConfig,
    discovered: Vec<u8>,
    log: Box<dyn ReplyLog>,
}

impl<C: Channel> Controller<C> {
    /// Creates a controller with an empty discovered set
    pub fn new(transport: Transport<C>, config: ControllerConfig, log: Box<dyn ReplyLog>) -> Self {
        Controller {
            transport,
            config,
            discovered: Vec::new(),
            log,
        }
    }

    /// Discovery and polling settings
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Transport to the panel
    pub fn transport(&self) -> &Transport<C> {
        &self.transport
    }

    /// Points confirmed live by the last discovery
    pub fn discovered(&self) -> &[u8] {
        &self.discovered
    }

    /// Scans every address from 0 to the maximum point number, one request
    /// per discovery tick
    ///
    /// An address is kept when its reply reports success. Addresses that time
    /// out are treated as absent and not retried. Replaces the result of any
    /// earlier discovery.
    pub fn discover(&mut self) -> Result<&[u8]> {
        self.discovered.clear();
        let period = self.config.polling_time_period;
        let mut clock = Clock::started();

        info!(
            maximum = self.config.maximum_point_number,
            version = %self.config.version,
            "starting point discovery"
        );

        for address in 0..=self.config.maximum_point_number {
            wait_for_tick(&mut clock, period);

            match self.query_point(address)? {
                Some(reply) if reply.reply_successful() => {
                    info!(address, device_type = reply.device_type(), "point discovered");
                    self.log.emit(&format!("discovered,{}", address))?;
                    self.discovered.push(address);
                }
                Some(reply) => debug!(address, status = %reply.reply_status(), "no point"),
                None => debug!(address, "no reply, treating point as absent"),
            }
        }

        info!(count = self.discovered.len(), "discovery complete");
        Ok(&self.discovered)
    }

    /// Queries every discovered point once, in ascending order
    pub fn poll_once(&mut self) -> Result<Vec<PointReport>> {
        let addresses = self.discovered.clone();
        let mut reports = Vec::with_capacity(addresses.len());

        for address in addresses {
            let reply = self.query_point(address)?;
            match &reply {
                Some(reply) => {
                    info!(
                        address,
                        device_type = reply.device_type(),
                        state = %reply.instantaneous_active_state(),
                        "point polled"
                    );
                    if !reply.checksum_valid() {
                        warn!(address, "reply checksum mismatch");
                    }
                    self.log.emit(&format!("{},{}", address, reply.to_csv()))?;
                }
                None => warn!(address, "point did not answer"),
            }
            reports.push(PointReport { address, reply });
        }

        Ok(reports)
    }

    /// Polls the discovered points once per polling tick until
    /// `keep_running` returns false
    ///
    /// `keep_running` receives the number of completed passes. Returns that
    /// number when the loop stops.
    pub fn run_polling(&mut self, mut keep_running: impl FnMut(usize) -> bool) -> Result<usize> {
        let period = self.config.time_period;
        let mut clock = Clock::started();
        let mut passes = 0;

        info!(points = self.discovered.len(), period = ?period, "starting polling");

        while keep_running(passes) {
            if clock.time_elapsed(period) {
                self.poll_once()?;
                passes += 1;
            } else {
                thread::sleep(clock.remaining(period).min(IDLE_BACKOFF));
            }
        }

        Ok(passes)
    }

    /// Sends a restart request; the panel does not reply
    pub fn restart(&mut self) -> Result<()> {
        let packet = RestartPanel::new(self.config.version).to_packet(&self.config.header_defaults)?;
        self.transport.write_packet(&packet)?;
        info!("restart requested");
        Ok(())
    }

    /// Requests the panel details and returns the raw reply bytes
    pub fn panel_details(&mut self) -> Result<Option<Vec<u8>>> {
        let request = PanelDetailsRequest::new(self.config.version);
        let packet = request.to_packet(&self.config.header_defaults)?;
        let reply = self
            .transport
            .exchange(&packet, request.kind().expected_reply_len())?;

        if let Some(bytes) = &reply {
            info!(bytes = %to_hex(bytes), "panel details");
        }
        Ok(reply)
    }

    /// Requests point information for `address`
    ///
    /// A reply carrying another point number belongs to an earlier request
    /// and is dropped. Reading continues until the matching reply arrives,
    /// a read times out, or too many foreign replies were seen.
    fn query_point(&mut self, address: u8) -> Result<Option<DecodedReply>> {
        let request = PointInformationRequest::for_point(self.config.version, address);
        let packet = request.to_packet(&self.config.header_defaults)?;
        let expected = request.kind().expected_reply_len();

        let mut raw = self.transport.exchange(&packet, expected)?;
        let mut stale = 0;
        while let Some(bytes) = raw {
            let reply = decode(self.config.version, &bytes)?;
            if reply.point_number() == address {
                return Ok(Some(reply));
            }

            warn!(
                address,
                replied = reply.point_number(),
                "discarding reply for another point"
            );
            stale += 1;
            if stale >= STALE_REPLY_LIMIT {
                break;
            }
            raw = self.transport.read_reply(expected)?;
        }
        Ok(None)
    }
}

/// Blocks until the clock ticks, sleeping in short steps
fn wait_for_tick(clock: &mut Clock, period: Duration) {
    while !clock.time_elapsed(period) {
        thread::sleep(clock.remaining(period).min(IDLE_BACKOFF));
    }
}
