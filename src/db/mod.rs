mod document;
mod marker;
mod record;
mod series;

use serde::{Deserialize, Serialize};

pub(crate) use document::load_document;
pub(crate) use marker::{Marker, MarkerDate, MarkerOffset, end_offset, format_duration};
pub(crate) use record::GlobalRecord;
pub(crate) use series::{AliasTarget, NextEntry, SeriesStore};

/// The one playable reference an entry or record points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MediaRef {
    Video(String),
    Audio(String),
}

impl MediaRef {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Self::Video(media) | Self::Audio(media) => media,
        }
    }

    pub(crate) fn is_audio(&self) -> bool {
        matches!(self, Self::Audio(_))
    }

    /// Same kind of reference pointing somewhere else.
    pub(crate) fn with_media(&self, media: String) -> Self {
        match self {
            Self::Video(_) => Self::Video(media),
            Self::Audio(_) => Self::Audio(media),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Viewing {
    pub(crate) start: String,
    pub(crate) end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct MediaEntry {
    #[serde(flatten)]
    pub(crate) media: MediaRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) duration: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) viewings: Vec<Viewing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) title: Option<String>,
}

impl MediaEntry {
    pub(crate) fn new(media: MediaRef) -> Self {
        Self {
            media,
            alias: None,
            duration: None,
            viewings: Vec::new(),
            comment: None,
            title: None,
        }
    }

    /// An entry is complete once its last viewing ended at the full duration
    /// or at the `finished?` sentinel. Entries never viewed are never complete.
    pub(crate) fn is_complete(&self) -> bool {
        let Some(last) = self.viewings.last() else {
            return false;
        };
        match end_offset(&last.end) {
            Some(offset) => {
                offset == MarkerOffset::FINISHED || Some(offset) == self.duration.as_deref()
            }
            None => false,
        }
    }

    /// Offset in seconds where the last unfinished viewing stopped.
    pub(crate) fn resume_position(&self) -> Option<f64> {
        if self.is_complete() {
            return None;
        }
        let last = self.viewings.last()?;
        end_offset(&last.end).and_then(marker::parse_duration)
    }
}

/// One completed session in the global record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RecordEntry {
    #[serde(flatten)]
    pub(crate) media: MediaRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) duration: Option<String>,
    pub(crate) start: String,
    pub(crate) end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) title: Option<String>,
}
