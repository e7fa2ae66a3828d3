//! Recent connections file
//!
//! Plain text, one value per line:
//!
//! ```text
//! eng                         <- language token
//! 2                           <- number of entries
//! 00:16:53:0A:1B:2C  [NXT]    <- entries, address in the first 17 chars
//! 00:16:53:0A:1B:2D  [unknown]
//! ```

use crate::domain::models::{DeviceAddress, DeviceRecord};
use anyhow::Context;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const RECENTS_FILE: &str = "recent_connections.cfg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    pub fn token(&self) -> &'static str {
        match self {
            Self::English => "eng",
            Self::Spanish => "spa",
        }
    }

    /// Unknown tokens fall back to English
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "spa" => Self::Spanish,
            _ => Self::English,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Previously bound devices plus the selected language
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecentConnections {
    pub language: Language,
    entries: Vec<String>,
}

impl RecentConnections {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Address of every entry, in file order
    pub fn addresses(&self) -> Vec<DeviceAddress> {
        self.entries
            .iter()
            .filter_map(|e| DeviceRecord::address_from_line(e))
            .collect()
    }

    /// Remember an entry; duplicates are ignored
    pub fn add(&mut self, entry: impl Into<String>) -> bool {
        let entry = entry.into().trim_end().to_string();
        if DeviceRecord::address_from_line(&entry).is_none() || self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines();
        let language = lines.next().map(Language::from_token).unwrap_or_default();
        let count = lines
            .next()
            .and_then(|l| l.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let mut recents = Self {
            language,
            entries: Vec::new(),
        };
        for line in lines.take(count) {
            if !recents.add(line) {
                warn!("Skipping recent entry {:?}", line);
            }
        }
        recents
    }

    pub fn serialize(&self) -> String {
        let mut text = format!("{}\n{}\n", self.language.token(), self.entries.len());
        for entry in &self.entries {
            text.push_str(entry);
            text.push('\n');
        }
        text
    }

    /// Load from `path`; a missing file is an empty list
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Ok(Self::parse(&text))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, self.serialize()).with_context(|| format!("writing {:?}", path))?;
        info!("Saved {} recent connection(s)", self.entries.len());
        Ok(())
    }

    pub fn default_path(config_dir: &Path) -> PathBuf {
        config_dir.join(RECENTS_FILE)
    }
}
