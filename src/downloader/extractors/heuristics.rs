// Heuristic audio/video classification for untyped format entries

use serde_json::Value;

use super::fields;

const AUDIO_CONTAINERS: &[&str] = &["m4a", "mp3", "aac", "opus", "ogg", "oga", "weba", "wav", "flac"];
const VIDEO_CONTAINERS: &[&str] = &["mp4", "webm", "mkv", "mov", "avi", "flv", "3gp", "ts", "m4v"];

/// Audio container, audio type tag, or an audio codec without a video codec
pub fn looks_like_audio(entry: &Value) -> bool {
    let by_ext = fields::extension(entry).map_or(false, |e| AUDIO_CONTAINERS.contains(&e.as_str()));
    let by_tag = fields::type_tag(entry).map_or(false, |t| t.contains("audio"));
    let by_codec = fields::audio_codec(entry).is_some() && fields::video_codec(entry).is_none();

    by_ext || by_tag || by_codec
}

/// Video container, a video codec, or both dimensions populated
pub fn looks_like_video(entry: &Value) -> bool {
    let by_ext = fields::extension(entry).map_or(false, |e| VIDEO_CONTAINERS.contains(&e.as_str()));
    let by_codec = fields::video_codec(entry).is_some();
    let (width, height) = fields::dimensions(entry);

    by_ext || by_codec || (width.is_some() && height.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audio_detection() {
        assert!(looks_like_audio(&json!({ "ext": "m4a" })));
        assert!(looks_like_audio(&json!({ "type": "Audio Only" })));
        assert!(looks_like_audio(&json!({ "ext": "webm", "acodec": "opus", "vcodec": "none" })));
        assert!(!looks_like_audio(&json!({ "ext": "webm", "acodec": "opus", "vcodec": "vp9" })));
    }

    #[test]
    fn test_video_detection() {
        assert!(looks_like_video(&json!({ "ext": "mp4" })));
        assert!(looks_like_video(&json!({ "vcodec": "avc1.4d401f" })));
        assert!(looks_like_video(&json!({ "width": 640, "height": 360 })));
        assert!(!looks_like_video(&json!({ "height": 360 })));
        assert!(!looks_like_video(&json!({ "ext": "mp3", "acodec": "mp3" })));
    }
}
