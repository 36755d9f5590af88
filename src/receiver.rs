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

use std::io;
use std::marker::PhantomData;
use std::thread;
use std::time::Duration;
use log::{debug, warn};
use thiserror::Error;
use crate::config::Config;
use crate::framing::read_line;
use crate::output::OutputStore;
use crate::protocol::*;
use crate::serial::SerialPort;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(io::Error),
    #[error("failed to write {name} to output: {source}")]
    Output {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("Transfer complete ({files} file(s))")]
    TransferComplete { files: usize },
}

// ============================================================================
// States
// ============================================================================

pub struct Connected;
pub struct AwaitingNextFile;
pub struct ReceivingFile;

// ============================================================================
// FSM Structure
// ============================================================================

pub struct TransferFsm<State> {
    state: PhantomData<State>,
    serial: Box<dyn SerialPort>,
    store: OutputStore,
    read_timeout: Duration,
    command_settle: Duration,
    file_name: String,
    file_lines: Vec<String>,
    files_saved: usize,
}

// ============================================================================
// Trait
// ============================================================================

pub trait TransferState: Send {
    fn step(self: Box<Self>) -> Result<Box<dyn TransferState>, TransferError>;
}

// ============================================================================
// Helper to transition states
// ============================================================================

impl<S> TransferFsm<S> {
    fn transition<T>(self) -> Box<TransferFsm<T>> {
        Box::new(TransferFsm {
            state: PhantomData,
            serial: self.serial,
            store: self.store,
            read_timeout: self.read_timeout,
            command_settle: self.command_settle,
            file_name: self.file_name,
            file_lines: self.file_lines,
            files_saved: self.files_saved,
        })
    }

    fn io_error(&self, e: io::Error) -> TransferError {
        let type_name = std::any::type_name::<S>();
        let state_name = type_name.split("::").last().unwrap_or(type_name);
        TransferError::Io(io::Error::new(
            e.kind(),
            format!("{} (in state: {})", e, state_name)
        ))
    }

    fn read_line(&mut self) -> Result<String, TransferError> {
        match read_line(self.serial.as_mut(), self.read_timeout) {
            Ok(line) => Ok(line),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

// ============================================================================
// State Implementations
// ============================================================================

impl TransferState for TransferFsm<Connected> {
    fn step(self: Box<Self>) -> Result<Box<dyn TransferState>, TransferError> {
        let mut fsm = *self;

        if let Err(e) = fsm.serial.write_all(ENTER_TRANSFER) {
            return Err(fsm.io_error(e));
        }
        debug!("Sent: 'U'");

        thread::sleep(fsm.command_settle);

        let next = fsm.transition::<AwaitingNextFile>();
        Ok(next as Box<dyn TransferState>)
    }
}

impl TransferState for TransferFsm<AwaitingNextFile> {
    fn step(self: Box<Self>) -> Result<Box<dyn TransferState>, TransferError> {
        let mut fsm = *self;

        let line = fsm.read_line()?;
        match classify(&line) {
            LineKind::Sentinel => {
                debug!("Received: {:?} (done)", line);
                println!("Data transfer completed.");

                println!("Sending reboot command to the device...");
                match fsm.serial.write_all(REBOOT) {
                    Ok(()) => debug!("Sent: 'R'"),
                    Err(e) => warn!("Reboot command not sent: {}", e),
                }

                Err(TransferError::TransferComplete { files: fsm.files_saved })
            }
            LineKind::Comment => {
                debug!("Received comment: {:?}", line);
                Ok(Box::new(fsm) as Box<dyn TransferState>)
            }
            LineKind::Empty => Ok(Box::new(fsm) as Box<dyn TransferState>),
            LineKind::FileName(name) => {
                println!("Receiving data from: {}", name);
                fsm.file_name = name.to_string();
                fsm.file_lines.clear();

                let next = fsm.transition::<ReceivingFile>();
                Ok(next as Box<dyn TransferState>)
            }
        }
    }
}

impl TransferState for TransferFsm<ReceivingFile> {
    fn step(self: Box<Self>) -> Result<Box<dyn TransferState>, TransferError> {
        let mut fsm = *self;

        let line = fsm.read_line()?;
        if !line.is_empty() {
            fsm.file_lines.push(line);
            return Ok(Box::new(fsm) as Box<dyn TransferState>);
        }

        // A read timeout ends the file
        debug!("End of {} after {} line(s)", fsm.file_name, fsm.file_lines.len());

        let data = fsm.file_lines.join("\n");
        if let Err(source) = fsm.store.append_block(&fsm.file_name, &data) {
            return Err(TransferError::Output { name: fsm.file_name, source });
        }
        println!("Saved data from {} to {}", fsm.file_name, fsm.store.path().display());

        fsm.files_saved += 1;
        fsm.file_lines.clear();

        let next = fsm.transition::<AwaitingNextFile>();
        Ok(next as Box<dyn TransferState>)
    }
}

// ============================================================================
// Constructor & Runner
// ============================================================================

impl TransferFsm<Connected> {
    pub fn new(serial: Box<dyn SerialPort>, store: OutputStore, config: &Config) -> Box<dyn TransferState> {
        Box::new(TransferFsm {
            state: PhantomData::<Connected>,
            serial,
            store,
            read_timeout: config.read_timeout,
            command_settle: config.command_settle,
            file_name: String::new(),
            file_lines: Vec::new(),
            files_saved: 0,
        })
    }
}

/// Drive the transfer until the device reports it is done. Returns the number
/// of files written. The serial port is dropped, and so closed, on every exit.
pub fn run_transfer(
    serial: Box<dyn SerialPort>,
    store: OutputStore,
    config: &Config,
) -> Result<usize, TransferError> {
    let mut state = TransferFsm::new(serial, store, config);

    loop {
        match state.step() {
            Ok(next_state) => {
                state = next_state;
            }
            Err(TransferError::TransferComplete { files }) => {
                return Ok(files);
            }
            Err(e) => {
                return Err(e);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
