//! Team name text normalization.
//!
//! Maps a raw, user-supplied team name to the matching key used by every tier
//! of the matcher. Roster names go through the same function when the
//! snapshot is built, so both sides of a comparison share one key space.

use std::sync::OnceLock;

use crate::error::{NormalizerError, Result};

/// Words that introduce an "<institution> of <place>" name
const INSTITUTION_WORDS: &[&str] = &["university", "college"];

/// Institutional and sport words stripped from the end of a name.
///
/// No entry may end in "state": "Michigan State University" has to keep its
/// "State" while losing "University".
const INSTITUTIONAL_SUFFIXES: &[&str] = &[
    "university",
    "college",
    "mens basketball",
    "mens",
    "basketball",
];

/// Mascot nicknames stripped from the end of a name
const MASCOT_SUFFIXES: &[&str] = &[
    "wildcats",
    "bulldogs",
    "tigers",
    "bears",
    "eagles",
    "panthers",
    "lions",
    "hawks",
    "cougars",
    "huskies",
    "spartans",
    "blue devils",
    "tar heels",
    "jayhawks",
    "orange",
    "cardinals",
    "trojans",
    "bruins",
    "wolverines",
    "buckeyes",
    "fighting irish",
    "crimson tide",
    "hoosiers",
    "terrapins",
    "terps",
    "cavaliers",
    "hokies",
    "demon deacons",
    "hurricane",
    "hurricanes",
    "seminoles",
    "gators",
    "aggies",
    "longhorns",
    "sooners",
    "cyclones",
    "mountaineers",
    "scarlet knights",
    "golden gophers",
    "cornhuskers",
    "badgers",
    "nittany lions",
    "boilermakers",
    "hawkeyes",
    "rebels",
    "commodores",
    "razorbacks",
    "volunteers",
    "vols",
    "gamecocks",
    "red storm",
    "friars",
    "musketeers",
    "pirates",
    "raiders",
    "rams",
    "ramblers",
    "peacocks",
    "golden eagles",
    "blue jays",
    "hoya",
    "hoyas",
    "redmen",
];

/// Full suffix vocabulary, longest first so "blue devils" is tried before any
/// shorter entry could clip part of it. Equal lengths keep declaration order.
fn suffixes_longest_first() -> &'static [&'static str] {
    static SORTED: OnceLock<Vec<&'static str>> = OnceLock::new();
    SORTED.get_or_init(|| {
        let mut all: Vec<&'static str> = INSTITUTIONAL_SUFFIXES
            .iter()
            .chain(MASCOT_SUFFIXES.iter())
            .copied()
            .collect();
        all.sort_by_key(|s| std::cmp::Reverse(s.len()));
        all
    })
}

/// Normalize a team name into its matching key.
///
/// Steps, in order:
/// 1. Reject empty / whitespace-only input
/// 2. Trim and lowercase
/// 3. Punctuation: `&` becomes a space, apostrophes vanish, anything else that
///    is not alphanumeric, whitespace, or `-` becomes a space
/// 4. "University of X" / "College of X" collapses to "X"
/// 5. One longest-first pass of suffix stripping over the tail
/// 6. Whitespace collapse
///
/// # Examples
///
/// ```
/// use ncaa_team_normalizer::normalize;
///
/// assert_eq!(normalize("St. John's").unwrap(), "st johns");
/// assert_eq!(normalize("Duke Blue Devils").unwrap(), "duke");
/// assert_eq!(normalize("Michigan State University").unwrap(), "michigan state");
/// ```
pub fn normalize(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NormalizerError::invalid_input("team name cannot be empty"));
    }

    let lowered = trimmed.to_lowercase();
    let cleaned = remove_punctuation(&lowered);

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let joined = drop_institution_prefix(&tokens).join(" ");

    let stripped = remove_suffixes(&joined);
    Ok(collapse_whitespace(&stripped))
}

/// Apply step 3 of [`normalize`]: "St. John's" -> "st  johns", "texas a&m" -> "texas a m"
fn remove_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| !is_apostrophe(*c))
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}')
}

/// "university of north carolina" -> "north carolina". Only the first "of" is
/// considered, and only when an institution word sits right before it.
fn drop_institution_prefix<'a, 'b>(tokens: &'b [&'a str]) -> &'b [&'a str] {
    match tokens.iter().position(|t| *t == "of") {
        Some(idx) if idx > 0 && INSTITUTION_WORDS.contains(&tokens[idx - 1]) => &tokens[idx + 1..],
        _ => tokens,
    }
}

/// Single ordered scan over the suffix vocabulary; each entry is removed if it
/// sits at the end of the current text on a word boundary.
fn remove_suffixes(text: &str) -> String {
    let mut current = text;
    for suffix in suffixes_longest_first() {
        if let Some(head) = strip_trailing_word(current, suffix) {
            current = head;
        }
    }
    current.trim().to_string()
}

fn strip_trailing_word<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let head = text.trim_end().strip_suffix(suffix)?;
    match head.chars().last() {
        Some(c) if is_word_char(c) => None,
        _ => Some(head),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
