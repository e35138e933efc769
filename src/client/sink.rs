use std::io::{self, Write};

use super::{Path, ResultPage};
use crate::protocol::DirEntry;

/// Receives listing pages in the order they were read
pub trait ResultSink: Send {
    /// Called once before the pages of `path`, or its favorites, are delivered
    fn begin(&mut self, path: &Path) {
        let _ = path;
    }

    fn accept(&mut self, page: ResultPage);
}

/// Keeps every entry in memory
#[derive(Debug, Default)]
pub struct CollectSink {
    entries: Vec<DirEntry>,
}

impl CollectSink {
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DirEntry> {
        self.entries
    }
}

impl ResultSink for CollectSink {
    fn accept(&mut self, page: ResultPage) {
        self.entries.extend(page);
    }
}

/// Writes one long-format line per entry. The first write error stops
/// output and is returned from [`WriterSink::finish`]
pub struct WriterSink<W: Write + Send> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write + Send> WriterSink<W> {
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write + Send> ResultSink for WriterSink<W> {
    fn accept(&mut self, page: ResultPage) {
        if self.error.is_some() {
            return;
        }

        for entry in page {
            if let Err(err) = writeln!(self.writer, "{}", entry.long_format()) {
                error!("writing listing: {}", err);
                self.error = Some(err);
                return;
            }
        }
    }
}
