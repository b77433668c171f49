//! The ingestion request resolved once per run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::mapping::IndexMapping;
use crate::notification::NotificationSettings;

/// What the data file asks the reindexer to do.
///
/// `Create` builds a fresh dated index and swaps the alias onto it.
/// `Update` bulk-loads into whatever the alias currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexAction {
    Create,
    Update,
}

impl IndexAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexAction::Create => "create",
            IndexAction::Update => "update",
        }
    }
}

impl fmt::Display for IndexAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a filename carries an action other than `create` or `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseActionError(pub String);

impl fmt::Display for ParseActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action '{}', expected create or update", self.0)
    }
}

impl std::error::Error for ParseActionError {}

impl FromStr for IndexAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(IndexAction::Create),
            "update" => Ok(IndexAction::Update),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

/// Compute the physical index name for a run.
///
/// `update` writes straight through the alias; `create` gets a dated index
/// of the form `<alias>-<timestamp>`.
pub fn real_index_name(alias: &str, action: IndexAction, data_time: &str) -> String {
    match action {
        IndexAction::Update => alias.to_string(),
        IndexAction::Create => format!("{}-{}", alias, data_time),
    }
}

/// A named position in the object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySegment {
    Root,
    Profile,
    Alias,
    FileName,
}

/// Ordered list of segment names consumed positionally from the object key.
///
/// The key is split on `/`; segment `i` of the key is assigned to
/// `segments()[i]`. The order is a deployment convention:
/// `root/profile/alias/file` is the default, `root/alias/profile/file` is
/// the other layout seen in practice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    segments: [KeySegment; 4],
}

impl KeyLayout {
    /// `<root>/<profile>/<alias>/<file>`
    pub fn profile_first() -> Self {
        Self {
            segments: [
                KeySegment::Root,
                KeySegment::Profile,
                KeySegment::Alias,
                KeySegment::FileName,
            ],
        }
    }

    /// `<root>/<alias>/<profile>/<file>`
    pub fn alias_first() -> Self {
        Self {
            segments: [
                KeySegment::Root,
                KeySegment::Alias,
                KeySegment::Profile,
                KeySegment::FileName,
            ],
        }
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    /// Position of `segment` within the key.
    pub fn position(&self, segment: KeySegment) -> usize {
        self.segments
            .iter()
            .position(|s| *s == segment)
            .unwrap_or(self.segments.len())
    }
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::profile_first()
    }
}

impl FromStr for KeyLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "root/profile/alias" | "profile-first" => Ok(Self::profile_first()),
            "root/alias/profile" | "alias-first" => Ok(Self::alias_first()),
            other => Err(format!("unknown key layout '{}'", other)),
        }
    }
}

/// Everything one run needs to know, resolved before any engine call.
///
/// Created once by the resolver and only read afterwards.
#[derive(Debug, Clone)]
pub struct IngestionRequest {
    /// Identifies this run in logs and notifications.
    pub run_id: Uuid,
    /// Bucket holding both the data file and its config document.
    pub bucket: String,
    /// Full object key of the data file.
    pub key: String,
    pub root: String,
    /// Directory of the data file including the trailing `/`.
    pub config_dir: String,
    pub alias: String,
    pub profile: String,
    pub file_name: String,
    /// The 14-digit timestamp from the filename.
    pub data_time: String,
    pub action: IndexAction,
    pub real_index: String,
    pub field_delimiter: String,
    /// `None` disables multi-value splitting.
    pub array_delimiter: Option<String>,
    pub mapping: IndexMapping,
    /// Analysis settings merged into the index settings on creation.
    pub analysis: Option<Value>,
    pub notification: NotificationSettings,
}

impl IngestionRequest {
    /// True when index creation, alias swap and cleanup must be skipped.
    ///
    /// That is the case for `update` runs and for a `create` whose computed
    /// real index collides with the alias name itself.
    pub fn reuses_existing_index(&self) -> bool {
        self.action == IndexAction::Update || self.alias == self.real_index
    }

    /// Pattern matching every dated index ever built for this alias.
    pub fn dated_index_pattern(&self) -> String {
        format!("{}-20*", self.alias)
    }

    /// Where the consumed source file is archived.
    pub fn backup_key(&self) -> String {
        format!(
            "{}/backup/{}/{}/{}/{}",
            self.root, self.profile, self.real_index, self.action, self.file_name
        )
    }
}
