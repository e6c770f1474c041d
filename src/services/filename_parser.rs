//! Filename parser for movie and episode release names
//!
//! Parses names like:
//! - "Inception (2010) [1080p] [BluRay]"
//! - "The.Matrix.1999.1080p.BluRay.x264"
//! - "Breaking Bad S01 E03 720p WEB-DL"
//! - "Severance.S02E05.Trojan.Horse.2160p.AMZN.WEB-DL"
//!
//! Each media kind has an ordered rule list tried most-specific-first; the
//! first structural match wins. The ordering is load-bearing: an explicit
//! `S01E02` rule must run before a bare `01x02` rule, which must run before
//! a bare episode-number rule, or `S01E02` would be misread as episode 01.
//!
//! Pure and deterministic; no I/O. A non-matching name returns `None`,
//! which is an expected outcome for non-conforming filenames, not an error.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Parsed movie information from a file path
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedMovieFile {
    pub file_name: String,
    pub file_path: String,
    pub title: String,
    pub year: Option<i32>,
    pub resolution: Option<String>,
    pub quality: Option<String>,
    pub rip: Option<String>,
    pub sound: Option<String>,
    pub provider: Option<String>,
}

/// Parsed episode information from a file path
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedEpisodeFile {
    pub file_name: String,
    pub file_path: String,
    pub series_name: String,
    pub season_number: i32,
    pub episode_number: i32,
    pub resolution: Option<String>,
    pub quality: Option<String>,
    pub rip: Option<String>,
    pub sound: Option<String>,
    pub provider: Option<String>,
}

/// Quality attributes extracted from tag text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedAttributes {
    pub resolution: Option<String>,
    pub quality: Option<String>,
    pub rip: Option<String>,
    pub sound: Option<String>,
    pub provider: Option<String>,
}

/// Intermediate output of a movie rule's extractor
struct MovieParts {
    title: String,
    year: Option<i32>,
    attr_text: String,
}

struct MovieRule {
    pattern: Regex,
    extract: fn(&Captures) -> Option<MovieParts>,
}

/// Intermediate output of an episode rule's extractor
struct EpisodeParts {
    series: String,
    season: i32,
    episode: i32,
}

struct EpisodeRule {
    pattern: Regex,
    extract: fn(&Captures) -> Option<EpisodeParts>,
}

fn cap_str(caps: &Captures, name: &str) -> String {
    caps.name(name).map(|m| m.as_str().to_string()).unwrap_or_default()
}

fn cap_num<T: std::str::FromStr>(caps: &Captures, name: &str) -> Option<T> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

/// Movie rules, most specific first. Do not reorder.
static MOVIE_RULES: Lazy<Vec<MovieRule>> = Lazy::new(|| {
    vec![
        // Title (Year) [tag] [tag]...
        MovieRule {
            pattern: Regex::new(
                r"^(?P<title>.+?)[. _]*\((?P<year>(?:19|20)\d{2})\)[. _]*(?P<tags>.*)$",
            )
            .unwrap(),
            extract: |caps| {
                Some(MovieParts {
                    title: cap_str(caps, "title"),
                    year: cap_num(caps, "year"),
                    attr_text: cap_str(caps, "tags"),
                })
            },
        },
        // Title.Year.tags
        MovieRule {
            pattern: Regex::new(
                r"^(?P<title>.+?)[. _](?P<year>(?:19|20)\d{2})(?:[. _](?P<tags>.+))?$",
            )
            .unwrap(),
            extract: |caps| {
                Some(MovieParts {
                    title: cap_str(caps, "title"),
                    year: cap_num(caps, "year"),
                    attr_text: cap_str(caps, "tags"),
                })
            },
        },
        // Title [tag][tag]...
        MovieRule {
            pattern: Regex::new(
                r"^(?P<title>[^\[\]]+?)[. _]*(?P<tags>(?:\[[^\]]*\][. _]*)+)$",
            )
            .unwrap(),
            extract: |caps| {
                Some(MovieParts {
                    title: cap_str(caps, "title"),
                    year: None,
                    attr_text: cap_str(caps, "tags"),
                })
            },
        },
        // Title (tag tag)
        MovieRule {
            pattern: Regex::new(r"^(?P<title>[^()]+?)\s*\((?P<tags>[^)]*)\)$").unwrap(),
            extract: |caps| {
                Some(MovieParts {
                    title: cap_str(caps, "title"),
                    year: None,
                    attr_text: cap_str(caps, "tags"),
                })
            },
        },
        // Bare title fallback
        MovieRule {
            pattern: Regex::new(r"^(?P<title>.*\w.*)$").unwrap(),
            extract: |caps| {
                Some(MovieParts {
                    title: cap_str(caps, "title"),
                    year: None,
                    attr_text: String::new(),
                })
            },
        },
    ]
});

/// Episode rules, most specific first. Do not reorder.
static EPISODE_RULES: Lazy<Vec<EpisodeRule>> = Lazy::new(|| {
    vec![
        // Series S01 E02 ... (space-separated markers)
        EpisodeRule {
            pattern: Regex::new(
                r"^(?P<series>.+?)[. _\-]+[Ss](?P<s>\d{1,2})[. _\-]+[Ee](?P<e>\d{1,3})(?:\b.*)?$",
            )
            .unwrap(),
            extract: standard_episode_parts,
        },
        // Series S01E02 / Series.S01E02.Title (joined markers)
        EpisodeRule {
            pattern: Regex::new(
                r"^(?P<series>.+?)[. _\-]+[Ss](?P<s>\d{1,2})[Ee](?P<e>\d{1,3})(?:\b.*)?$",
            )
            .unwrap(),
            extract: standard_episode_parts,
        },
        // Series 01x02 variants
        EpisodeRule {
            pattern: Regex::new(
                r"^(?P<series>.+?)[. _\-]+(?P<s>\d{1,2})x(?P<e>\d{2,3})(?:\b.*)?$",
            )
            .unwrap(),
            extract: standard_episode_parts,
        },
        // Series 01v2 (versioned single episode number, season implied)
        EpisodeRule {
            pattern: Regex::new(r"^(?P<series>.+?)[. _\-]+(?P<e>\d{1,4})v\d+(?:\b.*)?$")
                .unwrap(),
            extract: seasonless_episode_parts,
        },
        // Series - 01 - Title (seasonless with trailing title)
        EpisodeRule {
            pattern: Regex::new(r"^(?P<series>.+?)\s*-\s*(?P<e>\d{1,3})\s*-\s*.+$").unwrap(),
            extract: seasonless_episode_parts,
        },
        // Series 101 (combined season+episode digits, no trailing title)
        EpisodeRule {
            pattern: Regex::new(r"^(?P<series>.+?)[. _\-]+(?P<s>\d)(?P<e>\d{2})$").unwrap(),
            extract: standard_episode_parts,
        },
        // Series - 01 (bare episode number, no trailing title)
        EpisodeRule {
            pattern: Regex::new(r"^(?P<series>.+?)[. _\-]+(?P<e>\d{1,2})$").unwrap(),
            extract: seasonless_episode_parts,
        },
    ]
});

fn standard_episode_parts(caps: &Captures) -> Option<EpisodeParts> {
    Some(EpisodeParts {
        series: cap_str(caps, "series"),
        season: cap_num(caps, "s")?,
        episode: cap_num(caps, "e")?,
    })
}

fn seasonless_episode_parts(caps: &Captures) -> Option<EpisodeParts> {
    Some(EpisodeParts {
        series: cap_str(caps, "series"),
        season: 1,
        episode: cap_num(caps, "e")?,
    })
}

/// Parse a movie file path
///
/// Returns `None` when no rule matches the base name.
pub fn parse_movie(path: &str) -> Option<ParsedMovieFile> {
    let (file_name, stem) = split_path(path)?;

    for rule in MOVIE_RULES.iter() {
        let Some(caps) = rule.pattern.captures(&stem) else {
            continue;
        };
        let Some(parts) = (rule.extract)(&caps) else {
            continue;
        };

        let title = clean_title(&parts.title);
        if title.is_empty() {
            continue;
        }

        let attrs = extract_attributes(&parts.attr_text);
        return Some(ParsedMovieFile {
            file_name,
            file_path: path.to_string(),
            title,
            year: parts.year,
            resolution: attrs.resolution,
            quality: attrs.quality,
            rip: attrs.rip,
            sound: attrs.sound,
            provider: attrs.provider,
        });
    }

    None
}

/// Parse an episode file path
///
/// Returns `None` when no rule matches the base name.
pub fn parse_episode(path: &str) -> Option<ParsedEpisodeFile> {
    let (file_name, stem) = split_path(path)?;

    for rule in EPISODE_RULES.iter() {
        let Some(caps) = rule.pattern.captures(&stem) else {
            continue;
        };
        let Some(parts) = (rule.extract)(&caps) else {
            continue;
        };

        let series_name = clean_title(&parts.series);
        if series_name.is_empty() {
            continue;
        }

        // Episodes carry their tags anywhere in the name, so re-scan the
        // whole stem rather than just the text after the marker.
        let attrs = extract_episode_attributes(&stem);
        return Some(ParsedEpisodeFile {
            file_name,
            file_path: path.to_string(),
            series_name,
            season_number: parts.season,
            episode_number: parts.episode,
            resolution: attrs.resolution,
            quality: attrs.quality,
            rip: attrs.rip,
            sound: attrs.sound,
            provider: attrs.provider,
        });
    }

    None
}

/// Split a path into (file name, extension-stripped stem)
fn split_path(path: &str) -> Option<(String, String)> {
    let p = Path::new(path);
    let file_name = p.file_name()?.to_str()?.to_string();
    let stem = p.file_stem()?.to_str()?.to_string();
    Some((file_name, stem))
}

/// Title cleanup: dots and underscores become spaces, whitespace collapses
pub fn clean_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c.is_whitespace())
        .to_string()
}

const RESOLUTION_TAGS: &[(&str, &str)] = &[
    ("2160p", "2160p"),
    ("4k", "2160p"),
    ("uhd", "2160p"),
    ("1080p", "1080p"),
    ("720p", "720p"),
    ("576p", "576p"),
    ("480p", "480p"),
];

const QUALITY_TAGS: &[(&str, &str)] = &[
    ("x265", "x265"),
    ("h265", "x265"),
    ("hevc", "x265"),
    ("x264", "x264"),
    ("h264", "x264"),
    ("10bit", "10bit"),
    ("hdr10", "HDR10"),
    ("hdr", "HDR"),
    ("remux", "REMUX"),
];

const RIP_TAGS: &[(&str, &str)] = &[
    ("bluray", "BluRay"),
    ("blu-ray", "BluRay"),
    ("bdrip", "BDRip"),
    ("brrip", "BRRip"),
    ("web-dl", "WEB-DL"),
    ("webdl", "WEB-DL"),
    ("webrip", "WEBRip"),
    ("hdtv", "HDTV"),
    ("dvdrip", "DVDRip"),
    ("hdrip", "HDRip"),
    ("cam", "CAM"),
];

const SOUND_TAGS: &[(&str, &str)] = &[
    ("atmos", "Atmos"),
    ("truehd", "TrueHD"),
    ("dts-hd", "DTS-HD"),
    ("dts", "DTS"),
    ("ddp5.1", "DDP5.1"),
    ("ddp", "DD+"),
    ("dd5.1", "DD5.1"),
    ("ac3", "AC3"),
    ("aac", "AAC"),
    ("flac", "FLAC"),
];

const PROVIDER_TAGS: &[(&str, &str)] = &[
    ("amzn", "AMZN"),
    ("amazon", "AMZN"),
    ("netflix", "NF"),
    ("nf", "NF"),
    ("dsnp", "DSNP"),
    ("disney", "DSNP"),
    ("hmax", "HMAX"),
    ("hulu", "HULU"),
    ("atvp", "ATVP"),
    ("pcok", "PCOK"),
];

/// Substring match with non-alphanumeric boundaries on both sides
///
/// Tag keys may themselves contain separators (WEB-DL, DDP5.1), so naive
/// token splitting would destroy them; phrase matching keeps them intact
/// while still rejecting "cam" inside "Camelot".
fn contains_tag(text: &str, key: &str) -> bool {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(pos) = text[start..].find(key) {
        let abs = start + pos;
        let end = abs + key.len();
        let before_ok = abs == 0 || !bytes[abs - 1].is_ascii_alphanumeric();
        let after_ok = end == text.len() || !bytes[end].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return true;
        }
        start = abs + 1;
    }
    false
}

fn find_tag(text_lower: &str, tags: &[(&str, &str)]) -> Option<String> {
    tags.iter()
        .find(|(key, _)| contains_tag(text_lower, key))
        .map(|(_, canonical)| canonical.to_string())
}

/// Classify tag text into quality attributes
///
/// Each slot takes the first matching keyword from its table; tables are
/// ordered so longer keys (hdr10, dts-hd) win over their prefixes.
pub fn extract_attributes(attr_text: &str) -> ParsedAttributes {
    let lower = attr_text.to_lowercase();
    ParsedAttributes {
        resolution: find_tag(&lower, RESOLUTION_TAGS),
        quality: find_tag(&lower, QUALITY_TAGS),
        rip: find_tag(&lower, RIP_TAGS),
        sound: find_tag(&lower, SOUND_TAGS),
        provider: find_tag(&lower, PROVIDER_TAGS),
    }
}

impl ParsedAttributes {
    fn is_empty(&self) -> bool {
        self.resolution.is_none()
            && self.quality.is_none()
            && self.rip.is_none()
            && self.sound.is_none()
            && self.provider.is_none()
    }
}

static BRACKET_GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]").unwrap());

/// Episode attribute extraction
///
/// Classifies the whole stem by keyword, then re-scans bracket groups and
/// assigns any group with no recognized keyword positionally into the first
/// empty slot (resolution, quality, rip, sound, provider).
pub fn extract_episode_attributes(stem: &str) -> ParsedAttributes {
    let mut attrs = extract_attributes(stem);

    for group in BRACKET_GROUP_RE.captures_iter(stem) {
        let text = group.get(1).map(|m| m.as_str()).unwrap_or("");
        if extract_attributes(text).is_empty() {
            assign_positionally(text, &mut attrs);
        }
    }

    attrs
}

fn assign_positionally(text: &str, attrs: &mut ParsedAttributes) {
    let value = text.trim().to_string();
    if value.is_empty() {
        return;
    }
    let slot = [
        &mut attrs.resolution,
        &mut attrs.quality,
        &mut attrs.rip,
        &mut attrs.sound,
        &mut attrs.provider,
    ]
    .into_iter()
    .find(|slot| slot.is_none());
    if let Some(slot) = slot {
        *slot = Some(value);
    }
}

static SEASON_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[. _\-\s]*\b(?:S\d{1,2}\b|Season[. _]?\d+).*$").unwrap());
static PAREN_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((?:19|20)\d{2}\).*$").unwrap());
static BRACKET_TAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*$").unwrap());
static BARE_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[. _\-\s]+\b(?:19|20)\d{2}\b.*$").unwrap());
static QUALITY_TAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[. _\-\s]+\b(?:2160p|1080p|720p|576p|480p|4k|uhd|bluray|blu-ray|bdrip|brrip|web-dl|webdl|webrip|hdtv|dvdrip|hdrip|x26[45]|h26[45]|hevc|remux|complete)\b.*$")
        .unwrap()
});

/// Heuristic series name from a directory name
///
/// Used when an entire folder of episode files failed to parse and a single
/// grouped conflict is raised for it. Strips, in order: extension-like
/// suffix, everything from a season marker onward, parenthesized year and
/// bracket tags, bare year, quality keywords onward; then normalizes
/// separators.
pub fn series_name_from_folder(folder_name: &str) -> String {
    let mut name = folder_name.to_string();

    if let Some(stem) = Path::new(&name).file_stem().and_then(|s| s.to_str()) {
        name = stem.to_string();
    }

    name = SEASON_MARKER_RE.replace(&name, "").to_string();
    name = PAREN_YEAR_RE.replace(&name, "").to_string();
    name = BRACKET_TAIL_RE.replace(&name, "").to_string();
    name = BARE_YEAR_RE.replace(&name, "").to_string();
    name = QUALITY_TAIL_RE.replace(&name, "").to_string();

    clean_title(&name)
}

static LANGUAGE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:eng(?:lish)?|ita(?:lian)?|french|german|spanish|multi|vostfr|dual|sub(?:bed)?|dub(?:bed)?)\b")
        .unwrap()
});
static TRAILING_KIND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:series|show|season)$").unwrap());

/// Second, more aggressive cleanup pass for folder-derived series names
///
/// Applied when the first extracted name yields zero resolver candidates:
/// strips language tags, a leading "The", and trailing Series/Show/Season.
pub fn simplify_series_name(name: &str) -> String {
    let mut simplified = LANGUAGE_TAG_RE.replace_all(name, "").to_string();
    simplified = TRAILING_KIND_RE.replace(simplified.trim(), "").to_string();
    let simplified = simplified.trim();
    let simplified = simplified.strip_prefix("The ").unwrap_or(simplified);
    clean_title(simplified)
}
