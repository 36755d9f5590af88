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

//! Serial dump of device log files into one local file

mod config;
mod framing;
mod output;
mod ports;
mod protocol;
mod receiver;
mod serial;

use clap::Parser;
use log::{debug, LevelFilter};
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use config::{Config, DEFAULT_BAUD_RATE, DEFAULT_OUTPUT_PATH};
use output::OutputStore;
use serial::Session;

const MAX_TIMEOUT_SECS: u64 = 3600;

#[derive(Parser)]
#[command(name = "serdump")]
#[command(about = "Dump the files a device streams over its serial port into one file", long_about = None)]
struct Cli {
    /// Serial port to use (e.g., /dev/ttyACM0 or COM3); prompts when omitted
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// File that collects the received data, replaced on every run
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Read timeout in seconds; a silence this long ends a file
    #[arg(long, default_value = "2", value_name = "SECS",
          value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS))]
    timeout: u64,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            baud_rate: self.baud,
            read_timeout: Duration::from_secs(self.timeout),
            output_path: self.output.clone(),
            ..Config::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = cli.config();
    debug!("{:?}", config);

    let store = match OutputStore::create(&config.output_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to reset {}: {}", config.output_path.display(), e);
            std::process::exit(1);
        }
    };

    let port_name = match cli.port {
        Some(port) => port,
        None => match prompt_for_port() {
            Ok(Some(port)) => port,
            Ok(None) => {
                println!("No serial port selected. Exiting...");
                return;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    };

    let session = match Session::open(&port_name, config.baud_rate, config.read_timeout) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error opening serial port: {}", e);
            std::process::exit(1);
        }
    };

    // The board resets when the port opens
    thread::sleep(config.open_settle);

    println!("Listening for data on {}...", port_name);

    match receiver::run_transfer(Box::new(session), store, &config) {
        Ok(files) => debug!("{} file(s) saved", files),
        Err(e) => {
            eprintln!("Transfer failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn prompt_for_port() -> Result<Option<String>, ports::PortError> {
    let ports = ports::list_ports()?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    ports::select_port(&ports, &mut stdin.lock(), &mut stdout.lock())
}
