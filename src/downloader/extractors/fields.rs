// Lenient field readers for upstream format entries
//
// The upstream is inconsistent about key names and value types: the same
// attribute may arrive as a number, a numeric string ("128kbps") or under
// one of several aliases. Everything here returns Option and never fails.

use regex::Regex;
use serde_json::Value;

use crate::downloader::models::{FormatDescriptor, MediaKind};

lazy_static::lazy_static! {
    static ref LEADING_NUMBER_RE: Regex = Regex::new(r"^\s*(\d+(?:\.\d+)?)").unwrap();
    static ref RESOLUTION_RE: Regex = Regex::new(r"(\d{2,5})\s*[xX×]\s*(\d{2,5})").unwrap();
    static ref HEIGHT_LABEL_RE: Regex = Regex::new(r"(?i)^\s*(\d{3,4})p").unwrap();
}

const ID_KEYS: &[&str] = &["id", "format_id", "itag", "format"];
const EXT_KEYS: &[&str] = &["ext", "extension", "container"];
const MIME_KEYS: &[&str] = &["mime_type", "mimeType", "mime"];
const TYPE_KEYS: &[&str] = &["type", "media_type", "kind"];
const AUDIO_CODEC_KEYS: &[&str] = &["acodec", "audio_codec"];
const VIDEO_CODEC_KEYS: &[&str] = &["vcodec", "video_codec"];
const BITRATE_KEYS: &[&str] = &["abr", "audio_bitrate"];
const SAMPLE_RATE_KEYS: &[&str] = &["asr", "audio_sample_rate", "sample_rate", "audioSampleRate"];
const RESOLUTION_KEYS: &[&str] = &["resolution", "res"];
const NOTE_KEYS: &[&str] = &[
    "res_text",
    "format_note",
    "quality_label",
    "qualityLabel",
    "quality",
    "label",
    "note",
];
const SIZE_KEYS: &[&str] = &["filesize", "filesize_approx", "size", "content_length", "contentLength"];
const URL_KEYS: &[&str] = &["url", "download_url", "downloadUrl"];

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => LEADING_NUMBER_RE
            .captures(s)
            .and_then(|caps| caps[1].parse::<f64>().ok()),
        _ => None,
    }?;

    (n.is_finite() && n > 0.0).then_some(n)
}

/// First positive number found under any of `keys`
pub fn number(entry: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| as_number(&entry[*key]))
}

/// First non-empty string found under any of `keys`
pub fn text(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        entry[*key]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Format identifier; numeric itags are stringified
pub fn identifier(entry: &Value) -> Option<String> {
    ID_KEYS.iter().find_map(|key| match &entry[*key] {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(match n.as_f64() {
            // 140.0 is the itag 140
            Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        _ => None,
    })
}

/// Lowercase container extension, falling back to the MIME subtype
pub fn extension(entry: &Value) -> Option<String> {
    if let Some(ext) = text(entry, EXT_KEYS) {
        return Some(ext.trim_start_matches('.').to_lowercase());
    }

    let mime = text(entry, MIME_KEYS)?;
    let subtype = mime.split('/').nth(1)?.split(';').next()?.trim().to_lowercase();
    match subtype.as_str() {
        "" => None,
        "mpeg" => Some("mp3".to_string()),
        _ => Some(subtype),
    }
}

/// Lowercase type tag ("audio", "video", "audio_only", ...)
pub fn type_tag(entry: &Value) -> Option<String> {
    text(entry, TYPE_KEYS).map(|t| t.to_lowercase())
}

/// Codec name, treating "none" as absent
fn codec(entry: &Value, keys: &[&str]) -> Option<String> {
    text(entry, keys).filter(|c| !c.eq_ignore_ascii_case("none"))
}

pub fn audio_codec(entry: &Value) -> Option<String> {
    codec(entry, AUDIO_CODEC_KEYS)
}

pub fn video_codec(entry: &Value) -> Option<String> {
    codec(entry, VIDEO_CODEC_KEYS)
}

/// Width and height, from explicit fields or a "WxH" resolution string
pub fn dimensions(entry: &Value) -> (Option<u32>, Option<u32>) {
    let width = number(entry, &["width"]).map(|w| w as u32);
    let height = number(entry, &["height"]).map(|h| h as u32);
    if width.is_some() && height.is_some() {
        return (width, height);
    }

    let parsed = RESOLUTION_KEYS.iter().find_map(|key| {
        let caps = RESOLUTION_RE.captures(entry[*key].as_str()?)?;
        Some((caps[1].parse::<u32>().ok()?, caps[2].parse::<u32>().ok()?))
    });

    match parsed {
        Some((w, h)) => (width.or(Some(w)), height.or(Some(h))),
        None => (width, height),
    }
}

/// Build a descriptor for one entry; None when it has no identifier
pub fn descriptor(entry: &Value, kind: MediaKind) -> Option<FormatDescriptor> {
    let id = identifier(entry)?;
    let note = text(entry, NOTE_KEYS);
    let (width, mut height) = dimensions(entry);

    // Video labels like "720p" stand in for a missing height
    if kind == MediaKind::Video && height.is_none() {
        height = note
            .as_deref()
            .and_then(|n| HEIGHT_LABEL_RE.captures(n))
            .and_then(|caps| caps[1].parse().ok());
    }

    let bitrate = match kind {
        MediaKind::Audio => number(entry, BITRATE_KEYS).or_else(|| number(entry, &["bitrate"])),
        MediaKind::Video => number(entry, BITRATE_KEYS),
    };

    Some(FormatDescriptor {
        id,
        extension: extension(entry).unwrap_or_default(),
        media_kind: kind,
        bitrate,
        sample_rate: number(entry, SAMPLE_RATE_KEYS),
        width,
        height,
        note,
        file_size: number(entry, SIZE_KEYS).map(|s| s as u64),
        url: text(entry, URL_KEYS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_strings() {
        let entry = json!({ "abr": "128kbps", "asr": 44100, "height": "0" });
        assert_eq!(number(&entry, &["abr"]), Some(128.0));
        assert_eq!(number(&entry, &["asr"]), Some(44100.0));
        assert_eq!(number(&entry, &["height"]), None);
        assert_eq!(number(&entry, &["missing"]), None);
    }

    #[test]
    fn test_identifier_aliases() {
        assert_eq!(identifier(&json!({ "itag": 140 })), Some("140".to_string()));
        assert_eq!(identifier(&json!({ "format_id": " 251 " })), Some("251".to_string()));
        assert_eq!(identifier(&json!({ "itag": 140.0 })), Some("140".to_string()));
        assert_eq!(identifier(&json!({ "itag": 22.5 })), Some("22.5".to_string()));
        assert_eq!(identifier(&json!({ "id": "" })), None);
        assert_eq!(identifier(&json!("140")), None);
    }

    #[test]
    fn test_extension_from_mime() {
        let entry = json!({ "mimeType": "audio/mpeg; codecs=mp3" });
        assert_eq!(extension(&entry), Some("mp3".to_string()));
        let entry = json!({ "ext": ".M4A" });
        assert_eq!(extension(&entry), Some("m4a".to_string()));
    }

    #[test]
    fn test_dimensions_from_resolution() {
        let entry = json!({ "resolution": "1920x1080" });
        assert_eq!(dimensions(&entry), (Some(1920), Some(1080)));
    }

    #[test]
    fn test_video_height_from_label() {
        let entry = json!({ "id": "22", "res_text": "720p", "ext": "mp4" });
        let d = descriptor(&entry, MediaKind::Video).unwrap();
        assert_eq!(d.height, Some(720));
        assert_eq!(d.note.as_deref(), Some("720p"));

        let d = descriptor(&entry, MediaKind::Audio).unwrap();
        assert_eq!(d.height, None);
    }

    #[test]
    fn test_codec_none_is_absent() {
        let entry = json!({ "acodec": "opus", "vcodec": "none" });
        assert_eq!(audio_codec(&entry).as_deref(), Some("opus"));
        assert_eq!(video_codec(&entry), None);
    }
}
