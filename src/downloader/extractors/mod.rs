// Format normalizer - turns an upstream metadata document into a catalog
//
// The upstream response shape is not stable: audio and video lists show up
// under several keys, or only inside a generic "formats" list. Known
// locations are checked in order and concatenated; only when a kind finds
// nothing there is the generic list classified heuristically. Ids are
// unique per list afterwards (first seen wins).

mod fields;
mod heuristics;
mod shapes;

use std::collections::HashSet;

use serde_json::Value;

use crate::downloader::models::{FormatCatalog, FormatDescriptor, MediaKind};

pub use shapes::{Location, AUDIO_LOCATIONS, VIDEO_LOCATIONS};

/// Normalize a raw metadata document. Never fails; bad input gives an empty catalog.
pub fn normalize(raw: &Value) -> FormatCatalog {
    let Some(data) = payload(raw) else {
        return FormatCatalog::default();
    };

    FormatCatalog {
        title: fields::text(data, &["title"]),
        audio: collect(data, MediaKind::Audio),
        video: collect(data, MediaKind::Video),
    }
}

/// The object holding format lists: `data` when it is an object, else the root
fn payload(raw: &Value) -> Option<&Value> {
    match &raw["data"] {
        data @ Value::Object(_) => Some(data),
        _ if raw.is_object() => Some(raw),
        _ => None,
    }
}

fn collect(data: &Value, kind: MediaKind) -> Vec<FormatDescriptor> {
    let mut found: Vec<FormatDescriptor> = shapes::locations(kind)
        .iter()
        .filter_map(|location| location.extract(data, kind))
        .flatten()
        .collect();

    if found.is_empty() {
        found = shapes::classify_generic(data, kind);
    }

    dedup_by_id(found)
}

fn dedup_by_id(formats: Vec<FormatDescriptor>) -> Vec<FormatDescriptor> {
    let mut seen = HashSet::new();
    formats
        .into_iter()
        .filter(|f| seen.insert(f.id.clone()))
        .collect()
}
