//! Playlist output: bare URLs, or URLs preceded by a JSON record.

use std::io::{self, Write};

use pmocontrol::PlaybackItem;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of the metadata line of an extended playlist
pub const EXTENDED_MARKER: &str = "#EXTITEM:";

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("Playlist output: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid playlist record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line does not start with #EXTITEM:")]
    NotAMarker,
}

/// Metadata line of an extended playlist: exactly `id`, `url` and `title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtendedRecord {
    pub id: String,
    pub url: String,
    pub title: String,
}

impl From<&PlaybackItem> for ExtendedRecord {
    fn from(item: &PlaybackItem) -> Self {
        Self {
            id: item.id.clone(),
            url: item.url.clone(),
            title: item.title.clone(),
        }
    }
}

impl From<ExtendedRecord> for PlaybackItem {
    fn from(record: ExtendedRecord) -> Self {
        PlaybackItem {
            id: record.id,
            url: record.url,
            title: record.title,
        }
    }
}

impl ExtendedRecord {
    pub fn to_marker(&self) -> Result<String, PlaylistError> {
        Ok(format!("{}{}", EXTENDED_MARKER, serde_json::to_string(self)?))
    }

    pub fn parse_marker(line: &str) -> Result<Self, PlaylistError> {
        let json = line
            .trim_end()
            .strip_prefix(EXTENDED_MARKER)
            .ok_or(PlaylistError::NotAMarker)?;
        Ok(serde_json::from_str(json)?)
    }
}

/// Writes playlist lines to `out`.
pub struct PlaylistWriter<W: Write> {
    out: W,
}

impl<W: Write> PlaylistWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Bare URL line
    pub fn write_plain(&mut self, item: &PlaybackItem) -> Result<(), PlaylistError> {
        writeln!(self.out, "{}", item.url)?;
        Ok(())
    }

    /// Marker line, then the URL line
    pub fn write_extended(&mut self, item: &PlaybackItem) -> Result<(), PlaylistError> {
        writeln!(self.out, "{}", ExtendedRecord::from(item).to_marker()?)?;
        self.write_plain(item)
    }

    /// Free-form line, for dry runs
    pub fn write_note(&mut self, note: &str) -> Result<(), PlaylistError> {
        writeln!(self.out, "{}", note)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), PlaylistError> {
        Ok(self.out.flush()?)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Reads an extended playlist back; bare URL lines without a preceding
/// marker get an empty id and title.
pub fn read_extended_playlist(text: &str) -> Result<Vec<PlaybackItem>, PlaylistError> {
    let mut items = Vec::new();
    let mut pending: Option<ExtendedRecord> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with(EXTENDED_MARKER) {
            pending = Some(ExtendedRecord::parse_marker(line)?);
        } else if line.starts_with('#') {
            continue;
        } else {
            let item = match pending.take() {
                Some(record) => PlaybackItem {
                    url: line.to_string(),
                    ..record.into()
                },
                None => PlaybackItem {
                    id: String::new(),
                    url: line.to_string(),
                    title: String::new(),
                },
            };
            items.push(item);
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> PlaybackItem {
        PlaybackItem {
            id: "7".to_string(),
            url: "http://x/7.mp3".to_string(),
            title: "Song".to_string(),
        }
    }

    #[test]
    fn record_has_exactly_three_keys() {
        let marker = ExtendedRecord::from(&song()).to_marker().unwrap();
        let json: serde_json::Value =
            serde_json::from_str(marker.strip_prefix(EXTENDED_MARKER).unwrap()).unwrap();

        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object["id"], "7");
        assert_eq!(object["url"], "http://x/7.mp3");
        assert_eq!(object["title"], "Song");

        let back: PlaybackItem = ExtendedRecord::parse_marker(&marker).unwrap().into();
        assert_eq!(back, song());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let line = r#"#EXTITEM:{"id":"7","url":"u","title":"t","extra":1}"#;
        assert!(matches!(
            ExtendedRecord::parse_marker(line),
            Err(PlaylistError::Json(_))
        ));
    }

    #[test]
    fn plain_line_is_not_a_marker() {
        assert!(matches!(
            ExtendedRecord::parse_marker("http://x/7.mp3"),
            Err(PlaylistError::NotAMarker)
        ));
    }

    #[test]
    fn writer_emits_marker_then_url() {
        let mut writer = PlaylistWriter::new(Vec::new());
        writer.write_extended(&song()).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(EXTENDED_MARKER));
        assert_eq!(lines[1], "http://x/7.mp3");

        assert_eq!(read_extended_playlist(&text).unwrap(), vec![song()]);
    }

    #[test]
    fn plain_writer_emits_url_only() {
        let mut writer = PlaylistWriter::new(Vec::new());
        writer.write_plain(&song()).unwrap();
        assert_eq!(writer.into_inner(), b"http://x/7.mp3\n");
    }

    #[test]
    fn titles_with_quotes_survive() {
        let item = PlaybackItem {
            title: r#"Say "Hi" \ Bye"#.to_string(),
            ..song()
        };
        let marker = ExtendedRecord::from(&item).to_marker().unwrap();
        let back: PlaybackItem = ExtendedRecord::parse_marker(&marker).unwrap().into();
        assert_eq!(back.title, item.title);
    }
}
