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

//! Line framing on top of the raw serial stream

use std::io;
use std::time::{Duration, Instant};
use crate::serial::SerialPort;

/// Read one newline-terminated line, or whatever arrived before `timeout`
/// elapsed. The timeout covers the whole line, not each byte. An empty result
/// means nothing (or only whitespace) arrived in time. A zero timeout still
/// returns the bytes already waiting.
pub fn read_line(serial: &mut dyn SerialPort, timeout: Duration) -> io::Result<String> {
    // No deadline when it is not representable
    let deadline = Instant::now().checked_add(timeout);
    let mut raw = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        let remaining = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => timeout,
        };
        if remaining.is_zero() && !timeout.is_zero() {
            break;
        }

        match serial.read_timeout(&mut byte, remaining) {
            Ok(0) => break,
            Ok(_) => {
                raw.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(decode(&raw))
}

/// Decode as UTF-8, dropping invalid bytes, and trim surrounding whitespace
pub fn decode(raw: &[u8]) -> String {
    let mut text = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::{MockSerialPort, script_lines};

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn test_decode_drops_invalid_bytes() {
        assert_eq!(decode(b"ab\xffcd\xfe"), "abcd");
        assert_eq!(decode(b"\x80\x81"), "");
        assert_eq!(decode("temp: 21\u{b0}C".as_bytes()), "temp: 21\u{b0}C");
    }

    #[test]
    fn test_decode_drops_truncated_sequence() {
        // First two bytes of a three-byte sequence
        assert_eq!(decode(b"x\xe2\x82y"), "xy");
    }

    #[test]
    fn test_decode_trims_whitespace() {
        assert_eq!(decode(b"  value,1\r\n"), "value,1");
        assert_eq!(decode(b" \t\r\n"), "");
    }

    #[test]
    fn test_read_line_stops_at_newline() {
        let mut mock = MockSerialPort::new(script_lines(&["first", "second"]), vec![]);
        assert_eq!(read_line(&mut mock, TIMEOUT).unwrap(), "first");
        assert_eq!(read_line(&mut mock, TIMEOUT).unwrap(), "second");
    }

    #[test]
    fn test_read_line_timeout_yields_empty() {
        let mut mock = MockSerialPort::new(vec![None], vec![]);
        assert_eq!(read_line(&mut mock, TIMEOUT).unwrap(), "");
    }

    #[test]
    fn test_read_line_partial_line_before_timeout() {
        let mut mock = MockSerialPort::new(vec![Some(b'a'), Some(b'b'), None], vec![]);
        assert_eq!(read_line(&mut mock, TIMEOUT).unwrap(), "ab");
    }

    #[test]
    fn test_read_line_with_invalid_bytes() {
        let mut mock = MockSerialPort::new(
            vec![Some(b'o'), Some(0xff), Some(b'k'), Some(b'\r'), Some(b'\n')],
            vec![],
        );
        assert_eq!(read_line(&mut mock, TIMEOUT).unwrap(), "ok");
    }

    #[test]
    fn test_read_line_zero_timeout_reads_waiting_bytes() {
        let mut mock = MockSerialPort::new(vec![Some(b'h'), Some(b'i'), Some(b'\n'), None], vec![]);
        assert_eq!(read_line(&mut mock, Duration::ZERO).unwrap(), "hi");
        assert_eq!(read_line(&mut mock, Duration::ZERO).unwrap(), "");
    }

    #[test]
    fn test_read_line_huge_timeout() {
        let mut mock = MockSerialPort::new(script_lines(&["x"]), vec![]);
        assert_eq!(read_line(&mut mock, Duration::from_secs(u64::MAX)).unwrap(), "x");
    }

    #[test]
    fn test_read_line_propagates_port_error() {
        let mut mock = MockSerialPort::new(vec![Some(b'a')], vec![])
            .fail_at(1, io::ErrorKind::BrokenPipe);
        let err = read_line(&mut mock, TIMEOUT).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
