// FormatSelector - picks one descriptor per quality policy
//
// Ranking is quality-descending over a priority chain:
// - audio bitrate
// - audio sample rate
// - pixel height
// - file size
// The first attribute present on both sides decides; otherwise the next one
// is consulted, and if none decide the original order stands.

use std::cmp::Ordering;

use super::models::{FormatDescriptor, QualityPolicy};

/// Format selector over a canonical descriptor list
pub struct FormatSelector;

impl FormatSelector {
    /// Pick a descriptor, or None for an empty list
    pub fn select<'a>(
        formats: &'a [FormatDescriptor],
        policy: &QualityPolicy,
    ) -> Option<&'a FormatDescriptor> {
        let ranked = Self::rank(formats);

        match policy {
            QualityPolicy::Best => ranked.first().copied(),
            QualityPolicy::Worst => ranked.last().copied(),
            QualityPolicy::Matching(token) => {
                let needle = token.to_lowercase();
                ranked
                    .iter()
                    .find(|f| {
                        f.note
                            .as_ref()
                            .map_or(false, |n| n.to_lowercase().contains(&needle))
                    })
                    .or_else(|| ranked.first())
                    .copied()
            }
        }
    }

    /// Descriptors ordered best first, ties keep input order
    pub fn rank(formats: &[FormatDescriptor]) -> Vec<&FormatDescriptor> {
        // The chain is not a total order when attributes are sparse, so this
        // is a stable insertion pass instead of slice::sort_by.
        let mut ranked: Vec<&FormatDescriptor> = Vec::with_capacity(formats.len());

        for format in formats {
            let pos = ranked
                .iter()
                .rposition(|placed| Self::compare(placed, format) != Ordering::Less)
                .map_or(0, |i| i + 1);
            ranked.insert(pos, format);
        }

        ranked
    }

    /// Quality comparison along the priority chain
    pub fn compare(a: &FormatDescriptor, b: &FormatDescriptor) -> Ordering {
        let chain: [fn(&FormatDescriptor) -> Option<f64>; 4] = [
            |f| f.bitrate,
            |f| f.sample_rate,
            |f| f.height.map(f64::from),
            |f| f.file_size.map(|s| s as f64),
        ];

        for key in chain {
            if let (Some(x), Some(y)) = (key(a), key(b)) {
                match x.partial_cmp(&y) {
                    Some(Ordering::Equal) | None => continue,
                    Some(order) => return order,
                }
            }
        }

        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::MediaKind;

    fn audio(id: &str, abr: Option<f64>, note: Option<&str>) -> FormatDescriptor {
        let mut f = FormatDescriptor::new(id, MediaKind::Audio);
        f.bitrate = abr;
        f.note = note.map(str::to_string);
        f
    }

    fn video(id: &str, height: Option<u32>, size: Option<u64>) -> FormatDescriptor {
        let mut f = FormatDescriptor::new(id, MediaKind::Video);
        f.height = height;
        f.file_size = size;
        f
    }

    #[test]
    fn test_best_and_worst_by_bitrate() {
        let formats = vec![audio("a", Some(128.0), None), audio("b", Some(320.0), None)];

        let best = FormatSelector::select(&formats, &QualityPolicy::Best).unwrap();
        let worst = FormatSelector::select(&formats, &QualityPolicy::Worst).unwrap();
        assert_eq!(best.id, "b");
        assert_eq!(worst.id, "a");
    }

    #[test]
    fn test_empty_list() {
        for policy in [
            QualityPolicy::Best,
            QualityPolicy::Worst,
            QualityPolicy::Matching("720p".to_string()),
        ] {
            assert!(FormatSelector::select(&[], &policy).is_none());
        }
    }

    #[test]
    fn test_chain_falls_through() {
        // same height, size decides
        let formats = vec![
            video("small", Some(720), Some(10)),
            video("big", Some(720), Some(50)),
            video("low", Some(360), Some(90)),
        ];
        let ranked: Vec<&str> = FormatSelector::rank(&formats)
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(ranked, vec!["big", "small", "low"]);
    }

    #[test]
    fn test_sample_rate_before_height() {
        let mut a = audio("a", None, None);
        a.sample_rate = Some(48000.0);
        a.height = Some(100);
        let mut b = audio("b", None, None);
        b.sample_rate = Some(44100.0);
        b.height = Some(1000);

        assert_eq!(FormatSelector::compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_stable_without_attributes() {
        let formats = vec![
            audio("first", None, None),
            audio("second", None, None),
            audio("third", None, None),
        ];
        let best = FormatSelector::select(&formats, &QualityPolicy::Best).unwrap();
        let worst = FormatSelector::select(&formats, &QualityPolicy::Worst).unwrap();
        assert_eq!(best.id, "first");
        assert_eq!(worst.id, "third");
    }

    #[test]
    fn test_matching_token() {
        let formats = vec![
            audio("low", Some(48.0), Some("48kbps")),
            audio("mid", Some(128.0), Some("128kbps Medium")),
            audio("high", Some(160.0), Some("160kbps")),
        ];

        let picked =
            FormatSelector::select(&formats, &QualityPolicy::Matching("MEDIUM".to_string()))
                .unwrap();
        assert_eq!(picked.id, "mid");

        // unmatched token falls back to best
        let picked =
            FormatSelector::select(&formats, &QualityPolicy::Matching("8k".to_string())).unwrap();
        assert_eq!(picked.id, "high");
    }

    #[test]
    fn test_best_is_maximum() {
        let formats = vec![
            video("a", Some(480), None),
            video("b", Some(1080), None),
            video("c", Some(720), None),
            video("d", Some(144), None),
        ];
        let best = FormatSelector::select(&formats, &QualityPolicy::Best).unwrap();
        let worst = FormatSelector::select(&formats, &QualityPolicy::Worst).unwrap();

        assert!(formats
            .iter()
            .all(|f| FormatSelector::compare(best, f) != Ordering::Less));
        assert!(formats
            .iter()
            .all(|f| FormatSelector::compare(worst, f) != Ordering::Greater));
        assert_eq!((best.id.as_str(), worst.id.as_str()), ("b", "d"));
    }
}
