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

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use log::debug;

/// The single file that collects every received block of one run
#[derive(Debug, Clone)]
pub struct OutputStore {
    path: PathBuf,
}

impl OutputStore {
    /// Start a fresh store, removing whatever a previous run left behind
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed previous output {:?}", path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(OutputStore { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one block under a `# Data from <name>` marker. The file is
    /// opened and closed on every call.
    pub fn append_block(&self, name: &str, data: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "# Data from {}", name)?;
        file.write_all(data.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}
