//! Free-text classifiers for the orb's own voice command grammar.
//!
//! Each matcher lower-cases its input and walks an ordered table of substring
//! keys; the first entry with a matching key wins. `None` means "not for me"
//! and callers treat it as a no-op. The matchers are independent so a caller
//! can layer them in whatever precedence it needs.

use crate::model::{Feeling, Mode, Palette};

const MODE_TABLE: &[(&[&str], Mode)] = &[
    (&["listening", "listen"], Mode::Listening),
    (&["thinking", "think", "ponder"], Mode::Thinking),
    (&["speaking", "speak", "talking"], Mode::Speaking),
    (&["idle", "sleep", "quiet", "at rest"], Mode::Idle),
];

// Reset phrases come first so "reset orb palette" never falls through to a
// named palette.
const PALETTE_TABLE: &[(&[&str], Palette)] = &[
    (
        &[
            "reset",
            "default",
            "clear palette",
            "clear colour",
            "clear color",
            "original colo",
        ],
        Palette::ModeDefault,
    ),
    (&["heather"], Palette::HeatherMist),
    (&["glen"], Palette::GlenGreen),
    (&["loch", "grey green", "gray green"], Palette::LochGreyGreen),
    (&["bracken", "autumn"], Palette::AutumnBracken),
    (&["silver"], Palette::SilverMist),
    (&["rowan", "berry"], Palette::RowanBerry),
    (&["moss", "stone"], Palette::MossStone),
    (&["dawn", "sunrise"], Palette::DawnLight),
    (&["peat", "earth"], Palette::PeatEarth),
];

const FEELING_TABLE: &[(&[&str], Feeling)] = &[
    (&["neutral"], Feeling::Neutral),
    (&["calm", "relax", "peaceful", "serene"], Feeling::Calm),
    (&["curious", "curiosity", "inquisitive"], Feeling::Curiosity),
    (&["warm", "caring", "affection"], Feeling::Warmth),
    (&["concern", "worried", "worry", "anxious"], Feeling::Concern),
    (&["delight", "joy", "happy", "excited"], Feeling::Delight),
    (&["focus", "concentrat"], Feeling::Focus),
    (&["playful", "silly", "cheeky"], Feeling::Playful),
];

pub fn match_mode(text: &str) -> Option<Mode> {
    first_match(MODE_TABLE, &text.to_lowercase())
}

pub fn match_palette(text: &str) -> Option<Palette> {
    first_match(PALETTE_TABLE, &normalize(text))
}

pub fn match_feeling(text: &str) -> Option<Feeling> {
    first_match(FEELING_TABLE, &normalize(text))
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect()
}

fn first_match<T: Copy>(table: &[(&[&str], T)], haystack: &str) -> Option<T> {
    table
        .iter()
        .find(|(keys, _)| keys.iter().any(|key| haystack.contains(key)))
        .map(|&(_, target)| target)
}
