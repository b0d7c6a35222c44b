//! Lexicon tables.
//!
//! Lexicons are plain data injected into the detectors at construction time.
//! The bundled tables are a small English/Dutch seed; alternative tables can
//! be loaded from YAML for other locales or for tests.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::{CoreError, Emotion, Result, RiskKind};

/// How lexicon terms are matched against lower-cased text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Plain substring containment ("sad" matches "crusade")
    #[default]
    Substring,
    /// Term must be flanked by non-alphanumeric characters or text edges
    WordBoundary,
}

impl MatchMode {
    /// Byte offset of the first match of `term` in `haystack`.
    pub fn find(&self, haystack: &str, term: &str) -> Option<usize> {
        if term.is_empty() {
            return None;
        }

        match self {
            MatchMode::Substring => haystack.find(term),
            MatchMode::WordBoundary => haystack
                .match_indices(term)
                .map(|(start, _)| start)
                .find(|&start| is_word_bounded(haystack, start, start + term.len())),
        }
    }

    /// Whether `term` occurs in `haystack`.
    pub fn contains(&self, haystack: &str, term: &str) -> bool {
        self.find(haystack, term).is_some()
    }

    /// Parse a mode name (`substring` or `word_boundary`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "substring" => Some(MatchMode::Substring),
            "word_boundary" | "word" => Some(MatchMode::WordBoundary),
            _ => None,
        }
    }
}

fn is_word_bounded(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric());
    let after = haystack[end..]
        .chars()
        .next()
        .map_or(true, |c| !c.is_alphanumeric());
    before && after
}

/// Lower-case and trim terms, dropping empty ones.
///
/// Repeated terms are kept: every listed occurrence counts as a match.
fn normalize_terms<S: AsRef<str>>(terms: &[S]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn default_weight() -> f64 {
    1.0
}

/// Terms and weight for one emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// Emotion category
    pub emotion: Emotion,
    /// Trigger terms (lower case)
    pub terms: Vec<String>,
    /// Category weight
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Emotion lexicon. Entry order decides score ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LexiconTable {
    entries: Vec<LexiconEntry>,
}

impl LexiconTable {
    /// Build a table from entries, normalizing and validating them.
    pub fn new(entries: Vec<LexiconEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(entries.len());

        for entry in entries {
            if !seen.insert(entry.emotion) {
                return Err(CoreError::Lexicon(format!(
                    "duplicate emotion entry '{}'",
                    entry.emotion
                )));
            }
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(CoreError::Lexicon(format!(
                    "invalid weight {} for '{}'",
                    entry.weight, entry.emotion
                )));
            }
            normalized.push(LexiconEntry {
                emotion: entry.emotion,
                terms: normalize_terms(&entry.terms),
                weight: entry.weight,
            });
        }

        Ok(Self { entries: normalized })
    }

    /// The bundled 12-emotion seed lexicon.
    pub fn builtin() -> Self {
        let entries = BUILTIN_EMOTIONS
            .iter()
            .map(|(emotion, terms)| LexiconEntry {
                emotion: *emotion,
                terms: normalize_terms(terms),
                weight: 1.0,
            })
            .collect();
        Self { entries }
    }

    /// Load from YAML (a list of `{emotion, terms, weight}` entries).
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let entries: Vec<LexiconEntry> = serde_yaml::from_str(yaml)?;
        Self::new(entries)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Entries in lexicon order.
    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    /// Look up the entry for an emotion.
    pub fn get(&self, emotion: Emotion) -> Option<&LexiconEntry> {
        self.entries.iter().find(|e| e.emotion == emotion)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LexiconTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Terms for one risk category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTerms {
    /// Risk kind the category maps to
    pub kind: RiskKind,
    /// Trigger terms (lower case)
    pub terms: Vec<String>,
}

/// Risk lexicon. Category order decides confidence ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskLexicon {
    categories: Vec<RiskTerms>,
}

impl RiskLexicon {
    /// Build a lexicon from categories, normalizing and validating them.
    pub fn new(categories: Vec<RiskTerms>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(categories.len());

        for category in categories {
            if !seen.insert(category.kind) {
                return Err(CoreError::Lexicon(format!(
                    "duplicate risk category '{}'",
                    category.kind.category()
                )));
            }
            normalized.push(RiskTerms {
                kind: category.kind,
                terms: normalize_terms(&category.terms),
            });
        }

        Ok(Self {
            categories: normalized,
        })
    }

    /// The bundled five-category risk lexicon.
    pub fn builtin() -> Self {
        let categories = BUILTIN_RISKS
            .iter()
            .map(|(kind, terms)| RiskTerms {
                kind: *kind,
                terms: normalize_terms(terms),
            })
            .collect();
        Self { categories }
    }

    /// Load from YAML (a list of `{kind, terms}` entries).
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let categories: Vec<RiskTerms> = serde_yaml::from_str(yaml)?;
        Self::new(categories)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Categories in detection order.
    pub fn categories(&self) -> &[RiskTerms] {
        &self.categories
    }

    /// Look up the terms for a kind.
    pub fn get(&self, kind: RiskKind) -> Option<&RiskTerms> {
        self.categories.iter().find(|c| c.kind == kind)
    }
}

impl Default for RiskLexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN_EMOTIONS: &[(Emotion, &[&str])] = &[
    (
        Emotion::Joy,
        &[
            "happy", "joy", "excited", "thrilled", "delighted", "cheerful", "optimistic",
            "pleased", "satisfied", "grateful", "blissful", "ecstatic", "elated", "jubilant",
            "merry", "glad", "content", "blij", "geweldig", "fantastisch",
        ],
    ),
    (
        Emotion::Sadness,
        &[
            "sad", "sorrow", "grief", "melancholy", "depressed", "miserable", "heartbroken",
            "devastated", "despair", "gloomy", "downcast", "dejected", "disheartened",
            "crestfallen", "woeful", "mournful", "tearful", "verdrietig", "somber", "treurig",
        ],
    ),
    (
        Emotion::Anger,
        &[
            "angry", "mad", "furious", "rage", "irritated", "annoyed", "frustrated", "enraged",
            "livid", "incensed", "outraged", "indignant", "resentful", "bitter", "hostile",
            "aggressive", "violent", "wrathful", "boos", "woedend", "kwaad",
        ],
    ),
    (
        Emotion::Fear,
        &[
            "afraid", "scared", "terrified", "frightened", "anxious", "worried", "nervous",
            "panic", "dread", "horror", "alarm", "apprehension", "trepidation", "unease",
            "distress", "agitation", "restlessness", "tension", "bang", "angstig", "bezorgd",
        ],
    ),
    (
        Emotion::Surprise,
        &[
            "surprised", "shocked", "amazed", "astonished", "startled", "stunned", "bewildered",
            "confused", "perplexed", "puzzled", "baffled", "mystified", "flabbergasted",
            "dumbfounded", "speechless", "taken aback", "caught off guard", "verrast",
            "verbaasd", "geschokt",
        ],
    ),
    (
        Emotion::Disgust,
        &[
            "disgusted", "revolted", "repulsed", "sickened", "nauseated", "appalled",
            "horrified", "offended", "outraged", "scandalized", "shocked", "disturbed",
            "uncomfortable", "uneasy", "squeamish", "grossed out", "creeped out", "walgelijk",
            "afschuwelijk", "misselijk",
        ],
    ),
    (
        Emotion::Trust,
        &[
            "trust", "confident", "secure", "safe", "reliable", "dependable", "faithful",
            "loyal", "devoted", "committed", "dedicated", "steadfast", "firm", "stable",
            "solid", "sure", "certain", "assured", "vertrouwen", "betrouwbaar", "veilig",
        ],
    ),
    (
        Emotion::Anticipation,
        &[
            "excited", "eager", "enthusiastic", "hopeful", "optimistic", "expectant",
            "anticipating", "looking forward", "thrilled", "elated", "jubilant", "ecstatic",
            "overjoyed", "delighted", "pleased", "satisfied", "content", "verwachtingsvol",
            "uitkijkend", "hoopvol",
        ],
    ),
    (
        Emotion::Shame,
        &[
            "ashamed", "embarrassed", "humiliated", "mortified", "disgraced", "guilty",
            "remorseful", "regretful", "contrite", "penitent", "apologetic", "sheepish",
            "abashed", "chagrined", "discomfited", "flustered", "uncomfortable", "schaamte",
            "beschaamd", "vernederd",
        ],
    ),
    (
        Emotion::Pride,
        &[
            "proud", "accomplished", "achieved", "successful", "victorious", "triumphant",
            "elated", "exultant", "jubilant", "ecstatic", "thrilled", "delighted", "pleased",
            "satisfied", "content", "fulfilled", "gratified", "trots", "trots", "geslaagd",
        ],
    ),
    (
        Emotion::Love,
        &[
            "love", "adore", "cherish", "treasure", "beloved", "darling", "sweetheart",
            "honey", "dear", "close", "intimate", "affectionate", "tender", "warm", "caring",
            "devoted", "passionate", "romantic", "liefde", "houden van", "dierbaar",
        ],
    ),
    (
        Emotion::Contempt,
        &[
            "contempt", "disdain", "scorn", "derision", "mockery", "ridicule", "sarcasm",
            "cynicism", "skepticism", "doubt", "suspicion", "mistrust", "disbelief",
            "incredulity", "amazement", "astonishment", "surprise", "minachting", "verachting",
            "spot",
        ],
    ),
];

const BUILTIN_RISKS: &[(RiskKind, &[&str])] = &[
    (
        RiskKind::SelfHarmIdeation,
        &[
            "hurt myself", "harm myself", "hurt myself", "self harm", "self-harm",
            "cut myself", "cutting", "burn myself", "burning", "hit myself", "hit myself",
            "punch myself", "scratch myself",
            "bite myself", "self injury", "self-injury", "self mutilation", "self-mutilation",
            "self destructive", "self-destructive", "self sabotage", "self-sabotage",
            "zelfbeschadiging", "zichzelf pijn doen", "zichzelf verwonden",
        ],
    ),
    (
        RiskKind::SuicideIntent,
        &[
            "kill myself", "end my life", "end it all", "not want to live", "better off dead",
            "world without me", "disappear forever", "suicide", "take my own life",
            "end myself", "not here anymore", "give up", "give up on life",
            "life not worth living", "nothing to live for", "no point living",
            "wish i was dead", "want to die", "ready to die", "time to die", "end this",
            "zelfmoord", "eigen leven beëindigen", "niet meer willen leven", "opgeven",
            "geen zin meer in leven",
        ],
    ),
    (
        RiskKind::SelfHate,
        &[
            "hate myself", "despise myself", "loathe myself", "disgusted with myself",
            "worthless", "useless", "pathetic", "stupid", "idiot", "failure", "loser",
            "waste of space", "burden", "disappointment", "let down", "not good enough",
            "never good enough", "always mess up", "ruin everything", "everyone hates me",
            "nobody likes me", "better without me", "haat mezelf", "veracht mezelf",
            "waardeloos", "mislukking", "loser", "niemand houdt van me", "beter zonder mij",
        ],
    ),
    (
        RiskKind::Isolation,
        &[
            "alone", "lonely", "isolated", "nobody understands", "nobody cares",
            "no one to talk to", "no friends", "everyone left me", "abandoned", "rejected",
            "unwanted", "unloved", "forgotten", "invisible", "nobody notices",
            "nobody would miss me", "easier if i wasn't here", "alleen", "eenzaam",
            "geïsoleerd", "niemand begrijpt me", "niemand geeft om me", "verlaten", "vergeten",
            "onzichtbaar",
        ],
    ),
    (
        RiskKind::Hopelessness,
        &[
            "hopeless", "no hope", "never get better", "always be like this",
            "nothing will change", "stuck forever", "no way out", "trapped", "no future",
            "no point", "pointless", "meaningless", "empty", "numb", "dead inside",
            "feel nothing", "can't feel anything", "hopeloos", "geen hoop", "wordt nooit beter",
            "geen uitweg", "geen toekomst", "zinloos", "leeg", "voel niets",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_emotion_in_order() {
        let table = LexiconTable::builtin();
        let order: Vec<_> = table.entries().iter().map(|e| e.emotion).collect();
        assert_eq!(order, Emotion::ALL.to_vec());
        assert!(table.entries().iter().all(|e| e.weight == 1.0));
    }

    #[test]
    fn test_builtin_keeps_repeated_terms() {
        let pride = LexiconTable::builtin().get(Emotion::Pride).unwrap().terms.clone();
        assert_eq!(pride.len(), 20);
        assert_eq!(pride.iter().filter(|t| t.as_str() == "trots").count(), 2);

        let risks = RiskLexicon::builtin();
        let count = |kind: RiskKind, term: &str| {
            risks
                .get(kind)
                .unwrap()
                .terms
                .iter()
                .filter(|t| t.as_str() == term)
                .count()
        };
        assert_eq!(count(RiskKind::SelfHarmIdeation, "hurt myself"), 2);
        assert_eq!(count(RiskKind::SelfHarmIdeation, "hit myself"), 2);
        assert_eq!(count(RiskKind::SelfHate, "loser"), 2);

        let risks = RiskLexicon::builtin();
        let order: Vec<_> = risks.categories().iter().map(|c| c.kind).collect();
        assert_eq!(order, RiskKind::ALL.to_vec());
    }

    #[test]
    fn test_substring_mode_matches_inside_words() {
        assert!(MatchMode::Substring.contains("a class act", "ass"));
        assert!(!MatchMode::WordBoundary.contains("a class act", "ass"));
    }

    #[test]
    fn test_word_boundary_mode() {
        let mode = MatchMode::WordBoundary;
        assert_eq!(mode.find("i feel sad, really sad", "sad"), Some(7));
        assert!(mode.contains("sad", "sad"));
        assert!(mode.contains("(sad)", "sad"));
        assert!(!mode.contains("crusade", "sad"));
        assert!(mode.contains("i will hurt myself.", "hurt myself"));
        // A later bounded occurrence still counts.
        assert_eq!(mode.find("crusade sad", "sad"), Some(8));
    }

    #[test]
    fn test_empty_term_never_matches() {
        assert!(!MatchMode::Substring.contains("anything", ""));
    }

    #[test]
    fn test_match_mode_parse() {
        assert_eq!(MatchMode::parse("word-boundary"), Some(MatchMode::WordBoundary));
        assert_eq!(MatchMode::parse("Substring"), Some(MatchMode::Substring));
        assert_eq!(MatchMode::parse("fuzzy"), None);
    }

    #[test]
    fn test_yaml_lexicon_is_normalized() {
        let yaml = r#"
- emotion: joy
  terms: ["Happy", "happy", "  glad "]
- emotion: fear
  terms: [scared]
  weight: 0.5
"#;
        let table = LexiconTable::from_yaml(yaml).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(Emotion::Joy).unwrap().terms,
            vec!["happy", "happy", "glad"]
        );
        assert_eq!(table.get(Emotion::Joy).unwrap().weight, 1.0);
        assert_eq!(table.get(Emotion::Fear).unwrap().weight, 0.5);
    }

    #[test]
    fn test_duplicate_emotion_rejected() {
        let yaml = r#"
- emotion: joy
  terms: [happy]
- emotion: joy
  terms: [glad]
"#;
        assert!(matches!(
            LexiconTable::from_yaml(yaml),
            Err(CoreError::Lexicon(_))
        ));
    }

    #[test]
    fn test_risk_lexicon_yaml_roundtrip() {
        let lexicon = RiskLexicon::builtin();
        let yaml = lexicon.to_yaml().unwrap();
        let parsed = RiskLexicon::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, lexicon);
    }
}
