//! Tone heuristics that pick a feeling (and a matching palette) from an
//! assistant response.
//!
//! A leading `[feeling:<name>]` tag is authoritative. Without one, keyword
//! hits are counted per feeling and the best-scoring feeling wins.

use serde::{Deserialize, Serialize};

use crate::model::{Feeling, Palette};

/// Results below this confidence should leave the orb untouched.
pub const CONFIDENCE_THRESHOLD: f32 = 0.3;

const TAG_PREFIX: &str = "[feeling:";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub feeling: Feeling,
    pub palette: Option<Palette>,
    pub confidence: f32,
}

impl SentimentResult {
    pub fn is_confident(&self) -> bool {
        self.confidence >= CONFIDENCE_THRESHOLD
    }
}

const FEELING_KEYWORDS: &[(Feeling, &[&str], Palette)] = &[
    (
        Feeling::Warmth,
        &[
            "understand",
            "care",
            "sorry to hear",
            "here for you",
            "empathy",
            "compassion",
            "appreciate",
            "thinking of you",
            "support",
            "comfort",
        ],
        Palette::AutumnBracken,
    ),
    (
        Feeling::Delight,
        &[
            "great",
            "wonderful",
            "exciting",
            "love",
            "fantastic",
            "amazing",
            "excellent",
            "awesome",
            "brilliant",
            "thrilled",
        ],
        Palette::DawnLight,
    ),
    (
        Feeling::Curiosity,
        &[
            "interesting",
            "tell me more",
            "wonder",
            "fascinating",
            "curious",
            "explore",
            "what if",
            "how does",
            "intriguing",
            "dig deeper",
        ],
        Palette::GlenGreen,
    ),
    (
        Feeling::Concern,
        &[
            "careful",
            "warning",
            "unfortunately",
            "be aware",
            "caution",
            "risk",
            "danger",
            "worried",
            "issue",
            "problem",
        ],
        Palette::RowanBerry,
    ),
    (
        Feeling::Focus,
        &[
            "specifically",
            "exactly",
            "precisely",
            "step by step",
            "in detail",
            "technically",
            "let me break",
            "the key point",
            "to clarify",
            "implementation",
        ],
        Palette::SilverMist,
    ),
    (
        Feeling::Calm,
        &[
            "relax",
            "take your time",
            "no rush",
            "peaceful",
            "gently",
            "easy",
            "breathe",
            "settle",
            "steady",
            "quietly",
        ],
        Palette::HeatherMist,
    ),
    (
        Feeling::Playful,
        &[
            "haha", "fun", "joke", "silly", "laugh", "pun", "whimsy", "goofy", "playful", "cheeky",
        ],
        Palette::LochGreyGreen,
    ),
];

/// Classifies the tone of `text`.
pub fn classify(text: &str) -> SentimentResult {
    if let Some((_, feeling)) = parse_tag(text) {
        return SentimentResult {
            feeling,
            palette: palette_for(feeling),
            confidence: 1.0,
        };
    }

    let lower = text.to_lowercase();
    let mut best: Option<(Feeling, Palette, usize)> = None;
    for &(feeling, keywords, palette) in FEELING_KEYWORDS {
        let hits = keywords.iter().filter(|kw| lower.contains(*kw)).count();
        if hits > best.map_or(0, |(_, _, score)| score) {
            best = Some((feeling, palette, hits));
        }
    }

    match best {
        Some((feeling, palette, hits)) => SentimentResult {
            feeling,
            palette: Some(palette),
            confidence: confidence_for_hits(hits),
        },
        None => SentimentResult {
            feeling: Feeling::Neutral,
            palette: None,
            confidence: 0.0,
        },
    }
}

/// Removes a valid leading `[feeling:<name>]` tag, returning the remaining
/// text and the tagged feeling.
pub fn strip_feeling_tag(text: &str) -> Option<(String, Feeling)> {
    parse_tag(text).map(|(rest, feeling)| (rest.trim_start().to_string(), feeling))
}

/// Palette paired with `feeling`; neutral has none.
pub fn palette_for(feeling: Feeling) -> Option<Palette> {
    FEELING_KEYWORDS
        .iter()
        .find(|(f, _, _)| *f == feeling)
        .map(|&(_, _, palette)| palette)
}

fn parse_tag(text: &str) -> Option<(&str, Feeling)> {
    let trimmed = text.trim_start();
    let body = trimmed.strip_prefix(TAG_PREFIX)?;
    let end = body.find(']')?;
    // Tags must use the exact lower-case name.
    let feeling = Feeling::ALL
        .into_iter()
        .find(|f| f.as_str() == &body[..end])?;
    Some((&body[end + 1..], feeling))
}

fn confidence_for_hits(hits: usize) -> f32 {
    match hits {
        0 => 0.0,
        1 => 0.35,
        2 => 0.55,
        3 => 0.70,
        n => (0.70 + 0.05 * (n as f32 - 3.0)).min(0.90),
    }
}
