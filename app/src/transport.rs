//! Framed TCP to the CallManager. One writer half guarded by a lock so a
//! frame (or a coalesced burst of frames) is always one atomic write, and a
//! reader half with a short timeout so the receive loop can poll the stop
//! signal. Shutdown is idempotent and safe from any thread.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;

use sccp_core::{encode_frame, FrameHeader, FRAME_HEADER_LEN};

const READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("connection closed")]
    Closed,

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Transport {
    writer: Mutex<TcpStream>,
    // separate clone so shutdown never waits on the writer lock
    control: TcpStream,
}

impl Transport {
    pub fn connect(server: &str, port: u16) -> Result<Self, TransportError> {
        let addr = format!("{server}:{port}");
        let stream = TcpStream::connect((server, port)).map_err(|source| {
            TransportError::Connect {
                addr: addr.clone(),
                source,
            }
        })?;
        stream.set_nodelay(true).ok();
        let control = stream.try_clone()?;
        Ok(Self {
            writer: Mutex::new(stream),
            control,
        })
    }

    /// A reader half with the poll timeout applied. The clone shares the
    /// OS socket, so `shutdown` unblocks it.
    pub fn reader(&self) -> Result<FrameReader, TransportError> {
        let stream = self.control.try_clone()?;
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        Ok(FrameReader { stream })
    }

    /// Write one framed message atomically.
    pub fn send(&self, message_id: u32, body: &[u8]) -> Result<(), TransportError> {
        let frame = encode_frame(message_id, body);
        let mut writer = self.writer.lock().unwrap();
        writer.write_all(&frame)?;
        Ok(())
    }

    /// Coalesce several frames into one TCP write. CUCM relies on getting
    /// the post-registration stat burst this way.
    pub fn send_all(&self, frames: &[(u32, Vec<u8>)]) -> Result<(), TransportError> {
        let mut buf = Vec::new();
        for (message_id, body) in frames {
            buf.extend_from_slice(&encode_frame(*message_id, body));
        }
        let mut writer = self.writer.lock().unwrap();
        writer.write_all(&buf)?;
        Ok(())
    }

    /// Half-close then close. Safe to call repeatedly and from any thread;
    /// errors (already closed) are ignored.
    pub fn shutdown(&self) {
        let _ = self.control.shutdown(Shutdown::Both);
    }
}

pub enum ReadOutcome {
    Msg { message_id: u32, payload: Vec<u8> },
    Timeout,
    Closed,
    Error(std::io::Error),
}

pub struct FrameReader {
    stream: TcpStream,
}

impl FrameReader {
    /// Read exactly one frame. `Timeout` only happens on a clean frame
    /// boundary; mid-frame the reader keeps waiting for the rest.
    pub fn read_one(&mut self) -> ReadOutcome {
        let mut header = [0u8; FRAME_HEADER_LEN];
        match read_full(&mut self.stream, &mut header, true) {
            ReadStatus::Done => {}
            ReadStatus::Timeout => return ReadOutcome::Timeout,
            ReadStatus::Closed => return ReadOutcome::Closed,
            ReadStatus::Error(e) => return ReadOutcome::Error(e),
        }

        let header = match FrameHeader::parse(&header) {
            Ok(h) => h,
            Err(e) => {
                return ReadOutcome::Error(std::io::Error::new(
                    ErrorKind::InvalidData,
                    e.to_string(),
                ))
            }
        };
        let payload_len = match header.payload_len() {
            Ok(len) => len,
            Err(e) => {
                return ReadOutcome::Error(std::io::Error::new(
                    ErrorKind::InvalidData,
                    e.to_string(),
                ))
            }
        };

        let mut payload = vec![0u8; payload_len];
        match read_full(&mut self.stream, &mut payload, false) {
            ReadStatus::Done => ReadOutcome::Msg {
                message_id: header.message_id,
                payload,
            },
            ReadStatus::Timeout => unreachable!("mid-frame reads do not time out"),
            ReadStatus::Closed => ReadOutcome::Closed,
            ReadStatus::Error(e) => ReadOutcome::Error(e),
        }
    }
}

enum ReadStatus {
    Done,
    Timeout,
    Closed,
    Error(std::io::Error),
}

/// Fill `buf` completely. With `timeout_at_start`, a timeout before the
/// first byte reports `Timeout`; once any byte has arrived the frame is in
/// flight and we keep reading.
fn read_full(stream: &mut TcpStream, buf: &mut [u8], timeout_at_start: bool) -> ReadStatus {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return ReadStatus::Closed,
            Ok(n) => filled += n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                if filled == 0 && timeout_at_start {
                    return ReadStatus::Timeout;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return ReadStatus::Error(e),
        }
    }
    ReadStatus::Done
}
