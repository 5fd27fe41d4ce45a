//! In-memory channels standing in for the serial line

use std::collections::{BTreeSet, VecDeque};
use std::io::{self, Read, Write};
use std::time::Duration;

use super::Channel;
use crate::core::{ProtocolVersion, ACK};
use crate::protocol::decode::{encode_reply, REPLY_STATUS};
use crate::protocol::{PacketId, RequestKind};

/// Replays scripted chunks, one chunk per read at most, and records writes
///
/// Once the script is exhausted every read times out. Discarding input drops
/// whatever is left of the script.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    incoming: VecDeque<io::Result<Vec<u8>>>,
    written: Vec<Vec<u8>>,
    timeouts: Vec<Duration>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk(mut self, bytes: &[u8]) -> Self {
        self.incoming.push_back(Ok(bytes.to_vec()));
        self
    }

    pub fn with_error(mut self, kind: io::ErrorKind) -> Self {
        self.incoming.push_back(Err(io::Error::new(kind, "scripted failure")));
        self
    }

    /// Scripted bytes not yet read
    pub fn pending(&self) -> usize {
        self.incoming
            .iter()
            .map(|chunk| chunk.as_ref().map_or(0, Vec::len))
            .sum()
    }

    pub fn written(&self) -> &[Vec<u8>] {
        &self.written
    }

    /// Every read timeout set, in order
    pub fn timeouts(&self) -> &[Duration] {
        &self.timeouts
    }
}

impl Channel for ScriptedChannel {
    fn discard_input(&mut self) -> io::Result<()> {
        self.incoming.clear();
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.timeouts.push(timeout);
        Ok(())
    }
}

impl Read for ScriptedChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.incoming.pop_front() {
            Some(Ok(mut chunk)) => {
                let n = buf.len().min(chunk.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    let rest = chunk.split_off(n);
                    self.incoming.push_front(Ok(rest));
                }
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "no data")),
        }
    }
}

impl Write for ScriptedChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Panel that answers point information and panel details requests
///
/// Points in the live set reply with status 0, every other address replies
/// with status 1. Points in the silent set never answer. Points in the late
/// set answer only once the next request has been written, ahead of the
/// answer to that request.
#[derive(Debug)]
pub struct SimulatedPanel {
    version: ProtocolVersion,
    live: BTreeSet<u8>,
    silent: BTreeSet<u8>,
    late: BTreeSet<u8>,
    held: Option<Vec<u8>>,
    outgoing: VecDeque<u8>,
    requests: Vec<Vec<u8>>,
}

impl SimulatedPanel {
    pub fn new(version: ProtocolVersion, live: impl IntoIterator<Item = u8>) -> Self {
        SimulatedPanel {
            version,
            live: live.into_iter().collect(),
            silent: BTreeSet::new(),
            late: BTreeSet::new(),
            held: None,
            outgoing: VecDeque::new(),
            requests: Vec::new(),
        }
    }

    pub fn with_silent(mut self, silent: impl IntoIterator<Item = u8>) -> Self {
        self.silent.extend(silent);
        self
    }

    pub fn with_late(mut self, late: impl IntoIterator<Item = u8>) -> Self {
        self.late_replies(late);
        self
    }

    /// Delays the answers of `late` from now on
    pub fn late_replies(&mut self, late: impl IntoIterator<Item = u8>) {
        self.late.extend(late);
    }

    /// Every framed request received, in order
    pub fn requests(&self) -> &[Vec<u8>] {
        &self.requests
    }

    /// Point numbers of the point information requests received
    pub fn polled_points(&self) -> Vec<u8> {
        let header_len = self.header_len();
        self.requests
            .iter()
            .filter(|request| self.packet_id(request) == Some(PacketId::PointInformationRequest as u8))
            .filter_map(|request| request.get(2 + header_len + 4).copied())
            .collect()
    }

    fn header_len(&self) -> usize {
        match self.version {
            ProtocolVersion::V5 => 9,
            ProtocolVersion::V6 => 11,
        }
    }

    fn packet_id(&self, request: &[u8]) -> Option<u8> {
        let offset = match self.version {
            ProtocolVersion::V5 => 2 + 8,
            ProtocolVersion::V6 => 2 + 9,
        };
        request.get(offset).copied()
    }

    fn respond(&mut self, request: &[u8]) {
        let seq = request.get(1).copied().unwrap_or_default();

        match self.packet_id(request) {
            Some(id) if id == PacketId::PointInformationRequest as u8 => {
                let Some(&point) = request.get(2 + self.header_len() + 4) else {
                    return;
                };
                if self.silent.contains(&point) {
                    return;
                }
                let status = if self.live.contains(&point) { 0 } else { 1 };
                let reply = encode_reply(
                    self.version,
                    &[
                        ("sequence_number", seq),
                        (REPLY_STATUS, status),
                        ("point_number", point),
                        ("device_type", 0x20),
                        ("channel", 12),
                        ("loop_type", 1),
                    ],
                );
                let mut answer = vec![ACK];
                answer.extend(reply);
                if self.late.contains(&point) {
                    self.held = Some(answer);
                } else {
                    self.outgoing.extend(answer);
                }
            }
            Some(id) if id == PacketId::PanelDetailsRequest as u8 => {
                let len = RequestKind::PanelDetails(self.version).expected_reply_len();
                self.outgoing.push_back(ACK);
                self.outgoing.extend((0..len).map(|i| i as u8));
            }
            _ => {}
        }
    }
}

impl Read for SimulatedPanel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.outgoing.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "panel idle"));
        }
        let n = buf.len().min(self.outgoing.len());
        for (slot, byte) in buf.iter_mut().zip(self.outgoing.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for SimulatedPanel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(held) = self.held.take() {
            self.outgoing.extend(held);
        }
        self.requests.push(buf.to_vec());
        self.respond(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Channel for SimulatedPanel {
    fn discard_input(&mut self) -> io::Result<()> {
        self.outgoing.clear();
        Ok(())
    }

    fn set_read_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }
}
