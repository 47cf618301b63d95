//! Scripted meter for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::time::Instant;

use neva_core::checksum;
use neva_core::constants::{ACK, ETX, NAK, SOH, STX};
use neva_transport::{Error, Result, Transport};

/// Observable side of the fake link
#[derive(Debug, Default)]
pub struct LinkLog {
    pub open: bool,
    pub opened: usize,
    pub closed: usize,
    pub flushed: usize,
    pub last_flush: Option<Instant>,
    pub last_close: Option<Instant>,
    /// Every packet written, with the (virtual) time it was written
    pub sent: Vec<(Instant, Vec<u8>)>,
    pub baud_changes: Vec<u32>,
}

impl LinkLog {
    pub fn packets(&self) -> Vec<Vec<u8>> {
        self.sent.iter().map(|(_, p)| p.clone()).collect()
    }

    /// Send times of packets starting with `prefix`
    pub fn times_of(&self, prefix: &[u8]) -> Vec<Instant> {
        self.sent
            .iter()
            .filter(|(_, p)| p.starts_with(prefix))
            .map(|(t, _)| *t)
            .collect()
    }
}

/// Behaviour of the simulated meter
#[derive(Debug, Clone)]
pub struct FakeMeter {
    pub identification: Vec<u8>,
    /// Frame sent after the speed selection packet (without check byte)
    pub speed_frame: Vec<u8>,
    /// Password packets answered with NAK before the first ACK; `None` never ACKs
    pub rejections: Option<usize>,
    /// Register address -> value text
    pub registers: HashMap<String, String>,
    /// Send a wrong check byte on checksummed frames
    pub corrupt_checksums: bool,
}

impl Default for FakeMeter {
    fn default() -> Self {
        Self {
            identification: b"\0/ABC5MT174.03\n".to_vec(),
            speed_frame: vec![STX, ETX],
            rejections: Some(0),
            registers: HashMap::new(),
            corrupt_checksums: false,
        }
    }
}

impl FakeMeter {
    pub fn with_register(mut self, address: &str, value: &str) -> Self {
        self.registers.insert(address.to_string(), value.to_string());
        self
    }

    fn frame(&self, body: Vec<u8>) -> Vec<u8> {
        let mut frame = checksum::append(&body).to_vec();
        if self.corrupt_checksums {
            if let Some(last) = frame.last_mut() {
                *last ^= 0xFF;
            }
        }
        frame
    }

    fn respond(&mut self, packet: &[u8]) -> Vec<u8> {
        match packet {
            [b'/', b'?', b'!', ..] => self.identification.clone(),
            [ACK, ..] => self.frame(self.speed_frame.clone()),
            [SOH, b'P', ..] => match self.rejections.as_mut() {
                Some(0) => vec![ACK],
                Some(n) => {
                    *n -= 1;
                    vec![NAK]
                }
                None => vec![NAK],
            },
            [SOH, b'R', b'1', STX, rest @ ..] => {
                let address: Vec<u8> = rest.iter().take_while(|&&b| b != b'(').copied().collect();
                let address = String::from_utf8_lossy(&address).into_owned();

                let mut body = vec![STX];
                match self.registers.get(&address) {
                    Some(value) => {
                        body.extend_from_slice(format!("{}({})", address, value).as_bytes())
                    }
                    None => body.extend_from_slice(b"OTHER(5)"),
                }
                body.push(ETX);
                self.frame(body)
            }
            _ => Vec::new(),
        }
    }
}

/// In-memory transport driven by a [`FakeMeter`]
pub struct FakeLink {
    meter: FakeMeter,
    log: Arc<Mutex<LinkLog>>,
    rx: VecDeque<u8>,
    baud_rate: u32,
}

impl FakeLink {
    pub fn new(meter: FakeMeter) -> (Self, Arc<Mutex<LinkLog>>) {
        let log = Arc::new(Mutex::new(LinkLog::default()));
        let link = Self {
            meter,
            log: log.clone(),
            rx: VecDeque::new(),
            baud_rate: 300,
        };
        (link, log)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.log.lock().unwrap().open {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }
}

#[async_trait]
impl Transport for FakeLink {
    async fn open(&mut self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        if log.open {
            return Err(Error::AlreadyConnected);
        }
        log.open = true;
        log.opened += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.open = false;
        log.closed += 1;
        log.last_close = Some(Instant::now());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.log.lock().unwrap().open
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.log
            .lock()
            .unwrap()
            .sent
            .push((Instant::now(), data.to_vec()));
        let reply = self.meter.respond(data);
        self.rx.extend(reply);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut log = self.log.lock().unwrap();
        log.flushed += 1;
        log.last_flush = Some(Instant::now());
        Ok(())
    }

    async fn read_until(&mut self, terminator: u8) -> Result<BytesMut> {
        self.ensure_open()?;
        let mut buf = BytesMut::new();
        while let Some(b) = self.rx.pop_front() {
            buf.extend_from_slice(&[b]);
            if b == terminator {
                break;
            }
        }
        Ok(buf)
    }

    async fn read_up_to(&mut self, len: usize) -> Result<BytesMut> {
        self.ensure_open()?;
        let n = len.min(self.rx.len());
        Ok(self.rx.drain(..n).collect())
    }

    async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.baud_rate = baud_rate;
        self.log.lock().unwrap().baud_changes.push(baud_rate);
        Ok(())
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn remote_addr(&self) -> String {
        "fake".to_string()
    }
}
