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

//! Serial device discovery and the interactive device prompt

use std::io::{self, BufRead, Write};
use std::num::IntErrorKind;
use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[from] serialport::Error),
    #[error("prompt I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Rejected prompt input. Never fatal: the prompt prints it and asks again.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Invalid input. Please enter a number.")]
    NotANumber,
    #[error("Invalid selection. Choose a number between 0 and {max}.")]
    OutOfRange { max: usize },
}

/// Device names of all serial ports, in the order the OS reports them
pub fn list_ports() -> Result<Vec<String>, PortError> {
    let ports = serialport::available_ports()?;
    debug!("Found {} serial port(s)", ports.len());
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Parse a prompt answer into an index below `count`. `count` must be non-zero.
pub fn parse_selection(input: &str, count: usize) -> Result<usize, SelectionError> {
    let out_of_range = SelectionError::OutOfRange { max: count - 1 };

    let choice = match input.trim().parse::<i64>() {
        Ok(choice) => choice,
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            return Err(out_of_range);
        }
        Err(_) => return Err(SelectionError::NotANumber),
    };

    match usize::try_from(choice) {
        Ok(index) if index < count => Ok(index),
        _ => Err(out_of_range),
    }
}

/// Print the numbered device list and prompt until a valid index is entered.
/// Returns `None` when there is nothing to choose from or the input is closed.
pub fn select_port<R: BufRead, W: Write>(
    ports: &[String],
    input: &mut R,
    output: &mut W,
) -> Result<Option<String>, PortError> {
    if ports.is_empty() {
        writeln!(output, "No serial ports found. Please connect your device.")?;
        return Ok(None);
    }

    writeln!(output, "Available serial ports:")?;
    for (i, port) in ports.iter().enumerate() {
        writeln!(output, "{}: {}", i, port)?;
    }

    let max = ports.len() - 1;
    let mut answer = String::new();
    loop {
        write!(output, "Select the serial port (0-{}): ", max)?;
        output.flush()?;

        answer.clear();
        if input.read_line(&mut answer)? == 0 {
            writeln!(output)?;
            return Ok(None);
        }

        match parse_selection(&answer, ports.len()) {
            Ok(index) => return Ok(Some(ports[index].clone())),
            Err(e) => writeln!(output, "{}", e)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ports() -> Vec<String> {
        vec![
            "/dev/ttyS0".to_string(),
            "/dev/ttyACM0".to_string(),
            "/dev/ttyUSB0".to_string(),
        ]
    }

    fn run(ports: &[String], input: &str) -> (Option<String>, String) {
        let mut input = Cursor::new(input.as_bytes().to_vec());
        let mut output = Vec::new();
        let selected = select_port(ports, &mut input, &mut output).unwrap();
        (selected, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("0\n", 3), Ok(0));
        assert_eq!(parse_selection(" 2 ", 3), Ok(2));
        assert_eq!(parse_selection("+1", 3), Ok(1));
        assert_eq!(parse_selection("3", 3), Err(SelectionError::OutOfRange { max: 2 }));
        assert_eq!(parse_selection("-1", 3), Err(SelectionError::OutOfRange { max: 2 }));
        assert_eq!(
            parse_selection("99999999999999999999999", 3),
            Err(SelectionError::OutOfRange { max: 2 })
        );
        assert_eq!(parse_selection("abc", 3), Err(SelectionError::NotANumber));
        assert_eq!(parse_selection("1.5", 3), Err(SelectionError::NotANumber));
        assert_eq!(parse_selection("", 3), Err(SelectionError::NotANumber));
    }

    #[test]
    fn test_select_valid_index() {
        let ports = ports();
        for (i, expected) in ports.iter().enumerate() {
            let (selected, _) = run(&ports, &format!("{}\n", i));
            assert_eq!(selected.as_ref(), Some(expected));
        }
    }

    #[test]
    fn test_select_lists_ports() {
        let (_, printed) = run(&ports(), "1\n");
        assert!(printed.starts_with(
            "Available serial ports:\n0: /dev/ttyS0\n1: /dev/ttyACM0\n2: /dev/ttyUSB0\n"
        ));
        assert!(printed.ends_with("Select the serial port (0-2): "));
    }

    #[test]
    fn test_select_reprompts_on_invalid_input() {
        let (selected, printed) = run(&ports(), "usb\n7\n-1\n\n2\n");
        assert_eq!(selected.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(printed.matches("Select the serial port (0-2): ").count(), 5);
        assert_eq!(printed.matches("Invalid input. Please enter a number.").count(), 2);
        assert_eq!(
            printed.matches("Invalid selection. Choose a number between 0 and 2.").count(),
            2
        );
    }

    #[test]
    fn test_select_no_ports() {
        let (selected, printed) = run(&[], "0\n");
        assert_eq!(selected, None);
        assert_eq!(printed, "No serial ports found. Please connect your device.\n");
    }

    #[test]
    fn test_select_closed_input() {
        let (selected, _) = run(&ports(), "nope\n");
        assert_eq!(selected, None);
    }
}
