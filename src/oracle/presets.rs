// fitbatch/src/oracle/presets.rs
use super::{DimensionOracle, DimensionSuggestion, OracleError};

struct Preset {
    /// Every term must appear in the query.
    terms: &'static [&'static str],
    width: u32,
    height: u32,
    reasoning: &'static str,
}

// More specific entries first; the first match wins.
const PRESETS: &[Preset] = &[
    Preset { terms: &["instagram", "story"], width: 1080, height: 1920, reasoning: "Instagram story, 9:16" },
    Preset { terms: &["instagram", "reel"], width: 1080, height: 1920, reasoning: "Instagram reel, 9:16" },
    Preset { terms: &["instagram", "portrait"], width: 1080, height: 1350, reasoning: "Instagram portrait post, 4:5" },
    Preset { terms: &["instagram", "landscape"], width: 1080, height: 566, reasoning: "Instagram landscape post, 1.91:1" },
    Preset { terms: &["instagram"], width: 1080, height: 1080, reasoning: "Instagram square post" },
    Preset { terms: &["youtube", "thumbnail"], width: 1280, height: 720, reasoning: "YouTube thumbnail, 16:9" },
    Preset { terms: &["youtube", "banner"], width: 2560, height: 1440, reasoning: "YouTube channel art" },
    Preset { terms: &["youtube", "short"], width: 1080, height: 1920, reasoning: "YouTube Shorts, 9:16" },
    Preset { terms: &["youtube"], width: 1920, height: 1080, reasoning: "YouTube full HD video frame" },
    Preset { terms: &["tiktok"], width: 1080, height: 1920, reasoning: "TikTok vertical video, 9:16" },
    Preset { terms: &["facebook", "cover"], width: 851, height: 315, reasoning: "Facebook page cover" },
    Preset { terms: &["facebook", "story"], width: 1080, height: 1920, reasoning: "Facebook story, 9:16" },
    Preset { terms: &["facebook"], width: 1200, height: 630, reasoning: "Facebook link/feed image" },
    Preset { terms: &["twitter", "header"], width: 1500, height: 500, reasoning: "X/Twitter header, 3:1" },
    Preset { terms: &["x", "header"], width: 1500, height: 500, reasoning: "X/Twitter header, 3:1" },
    Preset { terms: &["twitter"], width: 1600, height: 900, reasoning: "X/Twitter in-feed image, 16:9" },
    Preset { terms: &["linkedin", "banner"], width: 1584, height: 396, reasoning: "LinkedIn profile banner, 4:1" },
    Preset { terms: &["linkedin"], width: 1200, height: 627, reasoning: "LinkedIn shared image" },
    Preset { terms: &["pinterest"], width: 1000, height: 1500, reasoning: "Pinterest pin, 2:3" },
    Preset { terms: &["open", "graph"], width: 1200, height: 630, reasoning: "Open Graph preview" },
    Preset { terms: &["og"], width: 1200, height: 630, reasoning: "Open Graph preview" },
    Preset { terms: &["avatar"], width: 400, height: 400, reasoning: "Square profile picture" },
    Preset { terms: &["profile"], width: 400, height: 400, reasoning: "Square profile picture" },
    Preset { terms: &["4k"], width: 3840, height: 2160, reasoning: "UHD 4K, 16:9" },
    Preset { terms: &["1080p"], width: 1920, height: 1080, reasoning: "Full HD, 16:9" },
    Preset { terms: &["full", "hd"], width: 1920, height: 1080, reasoning: "Full HD, 16:9" },
    Preset { terms: &["720p"], width: 1280, height: 720, reasoning: "HD, 16:9" },
    Preset { terms: &["wallpaper"], width: 1920, height: 1080, reasoning: "Desktop wallpaper, 16:9" },
];

fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{}y", stem)
    } else if word.len() > 3 {
        word.strip_suffix('s').unwrap_or(word).to_string()
    } else {
        word.to_string()
    }
}

/// Offline oracle backed by a fixed table of common platform sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresetOracle;

impl PresetOracle {
    pub fn new() -> Self {
        Self
    }
}

impl DimensionOracle for PresetOracle {
    fn suggest_dimensions(&self, query: &str) -> Result<DimensionSuggestion, OracleError> {
        let words: Vec<String> = query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();

        let matches = |term: &str| words.iter().any(|w| w == term || singular(w) == term);

        PRESETS
            .iter()
            .find(|preset| preset.terms.iter().all(|term| matches(*term)))
            .map(|preset| DimensionSuggestion {
                width: preset.width,
                height: preset.height,
                reasoning: preset.reasoning.to_string(),
            })
            .ok_or_else(|| OracleError::NoMatch(query.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggest(query: &str) -> Option<(u32, u32)> {
        PresetOracle
            .suggest_dimensions(query)
            .ok()
            .map(|s| (s.width, s.height))
    }

    #[test]
    fn specific_entries_win_over_generic_ones() {
        assert_eq!(suggest("Instagram Stories"), Some((1080, 1920)));
        assert_eq!(suggest("instagram"), Some((1080, 1080)));
        assert_eq!(suggest("YouTube thumbnail"), Some((1280, 720)));
    }

    #[test]
    fn matches_whole_words_only() {
        assert_eq!(suggest("boxes"), None);
        assert_eq!(suggest("header for X"), Some((1500, 500)));
    }

    #[test]
    fn unknown_queries_fail() {
        assert!(matches!(
            PresetOracle.suggest_dimensions("my grandmother's fridge"),
            Err(OracleError::NoMatch(_))
        ));
    }
}
