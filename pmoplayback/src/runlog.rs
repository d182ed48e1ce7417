//! Timestamped record of what a run went through.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use pmocontrol::PlaybackItem;

use crate::outcome::Outcome;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Append,
    Overwrite,
}

/// One tab-separated line per completed item or container:
///
/// ```text
/// 2024-03-01 21:15:02	played	42	Moment's Notice	http://nas/42.flac
/// 2024-03-01 21:15:02	container	m1	Blue Train
/// ```
pub struct RunLog {
    out: Box<dyn Write>,
}

impl RunLog {
    pub fn open(path: &Path, mode: LogMode) -> io::Result<Self> {
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            LogMode::Append => options.append(true),
            LogMode::Overwrite => options.write(true).truncate(true),
        };
        let file: File = options.open(path)?;
        Ok(Self::from_writer(file))
    }

    pub fn from_writer(out: impl Write + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    fn line(&mut self, fields: &[&str]) -> io::Result<()> {
        let now = Local::now().format(TIMESTAMP_FORMAT);
        let fields: Vec<String> = fields.iter().map(|f| sanitize(f)).collect();
        writeln!(self.out, "{}\t{}", now, fields.join("\t"))?;
        self.out.flush()
    }

    pub fn played(&mut self, item: &PlaybackItem) -> io::Result<()> {
        self.line(&["played", &item.id, &item.title, &item.url])
    }

    pub fn failed(&mut self, item: &PlaybackItem, outcome: &Outcome) -> io::Result<()> {
        self.line(&["failed", &item.id, &item.title, outcome.kind()])
    }

    pub fn container(&mut self, id: &str, title: &str) -> io::Result<()> {
        self.line(&["container", id, title])
    }
}

// tabs and newlines would break the line format
fn sanitize(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}
