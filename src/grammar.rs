use std::sync::LazyLock;

use itertools::Itertools;
use regex::{Captures, Regex};
use tracing::debug;

use crate::errors::{Error, Result};

/// Canonical comparison named by a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    DeeplyStrictlyEqual,
    DeeplyEqual,
    StrictlyEqual,
    CaseInsensitiveEqual,
    Equal,
    HaveMembers,
    IncludeMembers,
    HaveProperty,
    HaveType,
    MatchSchema,
    Match,
    Contain,
    Above,
    Below,
    GreaterThan,
    LessThan,
    Satisfy,
}

/// Literal keyword text, compound keywords ahead of any keyword they contain.
/// The alternation is built in this order, so a shorter keyword listed first
/// would win over the compound one in embedded matching.
pub const VOCABULARY: &[(&str, Keyword)] = &[
    ("deeply strictly equal", Keyword::DeeplyStrictlyEqual),
    ("deeply equal", Keyword::DeeplyEqual),
    ("strictly equal", Keyword::StrictlyEqual),
    ("case insensitive equal", Keyword::CaseInsensitiveEqual),
    ("equal", Keyword::Equal),
    ("have member", Keyword::HaveMembers),
    ("include member", Keyword::IncludeMembers),
    ("have property", Keyword::HaveProperty),
    ("have type", Keyword::HaveType),
    ("match schema", Keyword::MatchSchema),
    ("match", Keyword::Match),
    ("contain", Keyword::Contain),
    ("above", Keyword::Above),
    ("below", Keyword::Below),
    ("greater than", Keyword::GreaterThan),
    ("less than", Keyword::LessThan),
    ("satisfy", Keyword::Satisfy),
];

const fn contains_bytes(hay: &[u8], needle: &[u8]) -> bool {
    let mut i = 0;
    while i + needle.len() <= hay.len() {
        let mut j = 0;
        while j < needle.len() && hay[i + j] == needle[j] {
            j += 1;
        }
        if j == needle.len() {
            return true;
        }
        i += 1;
    }
    false
}

/// No keyword may appear before a later keyword that contains it.
pub const fn longest_first(vocabulary: &[(&str, Keyword)]) -> bool {
    let mut i = 0;
    while i < vocabulary.len() {
        let mut j = i + 1;
        while j < vocabulary.len() {
            if contains_bytes(vocabulary[j].0.as_bytes(), vocabulary[i].0.as_bytes()) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    longest_first(VOCABULARY),
    "VOCABULARY lists a keyword before a compound keyword containing it"
);

impl Keyword {
    pub fn literal(self) -> &'static str {
        VOCABULARY
            .iter()
            .find(|(_, k)| *k == self)
            .map(|(lit, _)| *lit)
            .unwrap_or_default()
    }

    pub fn from_literal(lit: &str) -> Option<Self> {
        VOCABULARY.iter().find(|(l, _)| *l == lit).map(|(_, k)| *k)
    }

    /// Registry name of the matcher this keyword is bound to.
    pub fn matcher_name(self) -> &'static str {
        match self {
            Self::Equal => "to_simple_equal",
            Self::StrictlyEqual => "to_equal",
            Self::DeeplyEqual => "to_deep_equal",
            Self::DeeplyStrictlyEqual => "to_deep_strict_equal",
            Self::HaveMembers => "to_have_members",
            Self::IncludeMembers => "to_include_members",
            Self::Match => "to_match",
            Self::Contain => "to_contain",
            Self::Above | Self::GreaterThan => "to_be_greater_than",
            Self::Below | Self::LessThan => "to_be_less_than",
            Self::HaveType => "to_have_type",
            Self::HaveProperty => "to_have_property",
            Self::MatchSchema => "to_match_schema",
            Self::CaseInsensitiveEqual => "to_case_insensitive_equal",
            Self::Satisfy => "to_satisfy",
        }
    }
}

const LEAD_IN: &str = "(?:is |do |does |to )?";
const NEGATION: &str = "(?P<reverse>not |to not )?";
const TO_BE: &str = "(?:to )?(?:be )?";
const SOFTLY: &str = "(?P<soft>softly )?";

fn phrase_pattern() -> String {
    let keywords = VOCABULARY.iter().map(|(lit, _)| regex::escape(lit)).join("|");
    format!("{LEAD_IN}{NEGATION}{TO_BE}{SOFTLY}(?:(?P<validation>{keywords})(?:s|es| to)?)")
}

static ANCHORED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}$", phrase_pattern())).expect("phrase grammar compiles"));

static EMBEDDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("({})", phrase_pattern())).expect("phrase grammar compiles"));

/// Modifiers and keyword extracted from one phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseMatch {
    pub reverse: bool,
    pub soft: bool,
    pub keyword: Keyword,
}

impl PhraseMatch {
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let keyword = Keyword::from_literal(caps.name("validation")?.as_str())?;
        Some(Self {
            reverse: caps.name("reverse").is_some(),
            soft: caps.name("soft").is_some(),
            keyword,
        })
    }
}

/// Parse a whole phrase such as `"is not softly greater than"`.
pub fn parse_phrase(phrase: &str) -> Result<PhraseMatch> {
    let found = ANCHORED
        .captures(phrase)
        .and_then(|caps| PhraseMatch::from_captures(&caps))
        .ok_or_else(|| Error::ValidationNotSupported(phrase.to_string()))?;
    debug!(phrase, keyword = ?found.keyword, reverse = found.reverse, soft = found.soft, "phrase resolved");
    Ok(found)
}

/// First recognised phrase embedded in a longer sentence.
pub fn find_phrase(sentence: &str) -> Option<PhraseMatch> {
    EMBEDDED
        .captures(sentence)
        .and_then(|caps| PhraseMatch::from_captures(&caps))
}

/// Unanchored grammar, for callers building larger step patterns.
pub fn phrase_regex() -> &'static Regex {
    &EMBEDDED
}
