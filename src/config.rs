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

//! Run configuration

use std::path::PathBuf;
use std::time::Duration;

/// Must match the firmware's serial speed
pub const DEFAULT_BAUD_RATE: u32 = 921_600;

pub const DEFAULT_OUTPUT_PATH: &str = "combined_output.csv";

/// Also the gap that ends a file payload
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// The board resets when the port opens
pub const OPEN_SETTLE_DELAY: Duration = Duration::from_secs(2);

pub const COMMAND_SETTLE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Config {
    pub baud_rate: u32,
    pub read_timeout: Duration,
    /// Wait after opening the port, before the first command
    pub open_settle: Duration,
    /// Wait after sending the enter-transfer command
    pub command_settle: Duration,
    pub output_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            open_settle: OPEN_SETTLE_DELAY,
            command_settle: COMMAND_SETTLE_DELAY,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}
