// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use std::io::{self, Read, Write};
use std::time::Duration;
use log::debug;
use thiserror::Error;

// ============================================================================
// SerialPort Trait
// ============================================================================

/// Trait for the serial operations the transfer driver needs
pub trait SerialPort: Send {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Read whatever arrives before `timeout`. A timeout is reported as
    /// `ErrorKind::TimedOut` or as `Ok(0)`.
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

// ============================================================================
// Errors
// ============================================================================

/// The device could not be opened (missing, busy, permission denied)
#[derive(Debug, Error)]
#[error("{port}: {source}")]
pub struct ConnectionError {
    pub port: String,
    #[source]
    pub source: serialport::Error,
}

// ============================================================================
// Session
// ============================================================================

/// An open connection to the device. Closed exactly once, on drop at the latest.
pub struct Session {
    name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl Session {
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Self, ConnectionError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|source| ConnectionError {
                port: port_name.to_string(),
                source,
            })?;

        debug!("Opened {} at {} baud, timeout {:?}", port_name, baud_rate, timeout);

        Ok(Session {
            name: port_name.to_string(),
            port: Some(port),
        })
    }

    #[cfg(test)]
    pub fn from_port(port_name: &str, port: Box<dyn serialport::SerialPort>) -> Self {
        Session {
            name: port_name.to_string(),
            port: Some(port),
        }
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub fn close(&mut self) {
        if let Some(port) = self.port.take() {
            drop(port);
            debug!("Closed {}", self.name);
        }
    }

    fn port(&mut self) -> io::Result<&mut Box<dyn serialport::SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port is closed"))
    }
}

impl SerialPort for Session {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let port = self.port()?;
        port.write_all(buf)?;
        port.flush()?;
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        let port = self.port()?;
        port.set_timeout(timeout).map_err(io::Error::other)?;
        port.read(buf)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_open() {
            self.close();
        }
    }
}

// ============================================================================
// Mock Serial Port for Testing
// ============================================================================

/// Turn device lines into a mock script. An empty string becomes a timeout.
#[cfg(test)]
pub fn script_lines(lines: &[&str]) -> Vec<Option<u8>> {
    let mut script = Vec::new();
    for line in lines {
        if line.is_empty() {
            script.push(None);
        } else {
            script.extend(line.bytes().map(Some));
            script.push(Some(b'\n'));
        }
    }
    script
}

#[cfg(test)]
pub struct MockSerialPort {
    // Data to return on reads (None = timeout)
    read_buffer: Vec<Option<u8>>,
    read_pos: usize,
    // Track what was written
    write_log: Vec<u8>,
    // Expected writes for verification
    expected_writes: Vec<u8>,
    // Read error returned once the script reaches this position
    fail_at: Option<(usize, io::ErrorKind)>,
}

#[cfg(test)]
impl MockSerialPort {
    pub fn new(responses: Vec<Option<u8>>, expected_writes: Vec<u8>) -> Self {
        MockSerialPort {
            read_buffer: responses,
            read_pos: 0,
            write_log: Vec::new(),
            expected_writes,
            fail_at: None,
        }
    }

    pub fn fail_at(mut self, pos: usize, kind: io::ErrorKind) -> Self {
        self.fail_at = Some((pos, kind));
        self
    }
}

#[cfg(test)]
impl SerialPort for MockSerialPort {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_log.extend_from_slice(buf);
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        if let Some((pos, kind)) = self.fail_at {
            if pos == self.read_pos {
                self.fail_at = None;
                return Err(io::Error::new(kind, "Mock port failure"));
            }
        }

        // Every read has to be scripted
        assert!(
            self.read_pos < self.read_buffer.len(),
            "MockSerialPort read past end of script ({} entries)",
            self.read_buffer.len()
        );

        if self.read_buffer[self.read_pos].is_none() {
            self.read_pos += 1;
            return Err(io::Error::new(io::ErrorKind::TimedOut, "Mock timeout"));
        }

        let mut bytes_read = 0;
        while bytes_read < buf.len() && self.read_pos < self.read_buffer.len() {
            match self.read_buffer[self.read_pos] {
                Some(byte) => {
                    buf[bytes_read] = byte;
                    bytes_read += 1;
                    self.read_pos += 1;
                }
                None => break,
            }
        }

        Ok(bytes_read)
    }
}

#[cfg(test)]
impl Drop for MockSerialPort {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }

        assert_eq!(
            self.read_pos,
            self.read_buffer.len(),
            "MockSerialPort dropped with {} unconsumed responses (read {} of {} entries)",
            self.read_buffer.len() - self.read_pos,
            self.read_pos,
            self.read_buffer.len()
        );

        assert_eq!(
            String::from_utf8_lossy(&self.write_log),
            String::from_utf8_lossy(&self.expected_writes),
            "MockSerialPort write log mismatch"
        );
    }
}
