// Known places the upstream puts format lists
//
// Checked in order; every location that yields entries contributes them.

use serde_json::Value;

use super::{fields, heuristics};
use crate::downloader::models::{FormatDescriptor, MediaKind};

/// One place a format list may live in the payload
#[derive(Debug, Clone, Copy)]
pub enum Location {
    /// A dedicated list (or single object) under this key
    List(&'static str),
    /// The generic "formats" list, entries whose type tag names the kind
    TaggedFormats,
}

pub const AUDIO_LOCATIONS: &[Location] = &[
    Location::List("raw_audio"),
    Location::List("audio"),
    Location::List("audios"),
    Location::List("audio_formats"),
    Location::TaggedFormats,
];

pub const VIDEO_LOCATIONS: &[Location] = &[
    Location::List("download"),
    Location::List("raw_video"),
    Location::List("video"),
    Location::List("videos"),
    Location::List("video_formats"),
    Location::TaggedFormats,
];

const GENERIC_FORMATS_KEY: &str = "formats";

pub fn locations(kind: MediaKind) -> &'static [Location] {
    match kind {
        MediaKind::Audio => AUDIO_LOCATIONS,
        MediaKind::Video => VIDEO_LOCATIONS,
    }
}

/// Entries stored under `key`: an array, or a lone object treated as one entry
fn entries<'a>(data: &'a Value, key: &str) -> Option<Vec<&'a Value>> {
    match &data[key] {
        Value::Array(items) => Some(items.iter().collect()),
        obj @ Value::Object(_) => Some(vec![obj]),
        _ => None,
    }
}

impl Location {
    /// Descriptors found here, or None when the location is absent
    pub fn extract(&self, data: &Value, kind: MediaKind) -> Option<Vec<FormatDescriptor>> {
        match self {
            Self::List(key) => {
                let items = entries(data, key)?;
                Some(
                    items
                        .into_iter()
                        .filter_map(|entry| fields::descriptor(entry, kind))
                        .collect(),
                )
            }
            Self::TaggedFormats => {
                let items = entries(data, GENERIC_FORMATS_KEY)?;
                Some(
                    items
                        .into_iter()
                        .filter(|entry| {
                            fields::type_tag(entry).map_or(false, |t| t.contains(kind.as_str()))
                        })
                        .filter_map(|entry| fields::descriptor(entry, kind))
                        .collect(),
                )
            }
        }
    }
}

/// Last resort: classify every generic entry by extension/codec/dimensions
pub fn classify_generic(data: &Value, kind: MediaKind) -> Vec<FormatDescriptor> {
    let Some(items) = entries(data, GENERIC_FORMATS_KEY) else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter(|entry| match kind {
            MediaKind::Audio => heuristics::looks_like_audio(entry),
            MediaKind::Video => heuristics::looks_like_video(entry),
        })
        .filter_map(|entry| fields::descriptor(entry, kind))
        .collect()
}
