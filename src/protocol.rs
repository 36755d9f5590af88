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

//! Serial dump protocol constants and line classification

/// Enter transfer mode - first command sent once the port has settled
pub const ENTER_TRANSFER: &[u8] = b"U\n";

/// Reboot - sent once after the device reports it is done, never acknowledged
pub const REBOOT: &[u8] = b"R\n";

/// Done sentinel - any line containing this ends the session
pub const DONE_SENTINEL: &str = "Iam done";

/// Comment prefix - status lines from the device, ignored between files
pub const COMMENT_PREFIX: char = '#';

/// How a line read while waiting for the next file is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Sentinel,
    Comment,
    Empty,
    FileName(&'a str),
}

/// Classify a decoded, trimmed line. The sentinel check wins over the comment check.
pub fn classify(line: &str) -> LineKind<'_> {
    if line.contains(DONE_SENTINEL) {
        LineKind::Sentinel
    } else if line.starts_with(COMMENT_PREFIX) {
        LineKind::Comment
    } else if line.is_empty() {
        LineKind::Empty
    } else {
        LineKind::FileName(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("Iam done"), LineKind::Sentinel);
        assert_eq!(classify("ok, Iam done now"), LineKind::Sentinel);
        assert_eq!(classify("# Iam done"), LineKind::Sentinel);
        assert_eq!(classify("#status: 3 files"), LineKind::Comment);
        assert_eq!(classify(""), LineKind::Empty);
        assert_eq!(classify("log_0001.csv"), LineKind::FileName("log_0001.csv"));
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(classify("iam done"), LineKind::FileName("iam done"));
    }
}
