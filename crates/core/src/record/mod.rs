use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

use chrono::NaiveTime;

use crate::Result;

pub const HEADER: &str = "Timestamp,Instrument";
const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Append-only CSV of notes played in the playground.
///
/// The header is written once per file; every note adds one
/// newline-terminated row and is flushed straight away so an abrupt exit
/// loses nothing.
#[derive(Debug)]
pub struct NoteLog<W: Write> {
    writer: W,
    rows: usize,
}

impl NoteLog<BufWriter<File>> {
    /// Opens `path` for appending, creating it if needed. The header is only
    /// written when the file is new or empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let fresh = file.metadata()?.len() == 0;
        tracing::debug!(path = %path.display(), fresh, "note log opened");

        let writer = BufWriter::new(file);
        if fresh {
            Self::new(writer)
        } else {
            Ok(Self::append_to(writer))
        }
    }
}

impl<W: Write> NoteLog<W> {
    /// Starts a new log on `writer`, header first.
    pub fn new(mut writer: W) -> Result<Self> {
        writeln!(writer, "{HEADER}")?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    /// Continues a log whose header is already in place.
    pub fn append_to(writer: W) -> Self {
        Self { writer, rows: 0 }
    }

    pub fn record(&mut self, time: NaiveTime, instrument: &str) -> Result<()> {
        writeln!(
            self.writer,
            "{},{}",
            time.format(TIME_FORMAT),
            escape(instrument)
        )?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written through this handle.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn escape(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}
