//! Normalization policy: toggle bundles, stop words, stemmers, and the
//! region-scoped configuration selector.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;

use crate::errors::{DupscanError, DupscanResult};
use crate::normalize::regions::{RegionCatalog, RegionSet};

// ---------------------------------------------------------------------------
// 1. Pluggable capabilities
// ---------------------------------------------------------------------------

/// Word stemming capability.
///
/// Stateless by contract: implementations are constructed once, owned by the
/// configuration, and shared read-only across normalizer instances.
pub trait Stemmer: Send + Sync + std::fmt::Debug {
    fn stem(&self, word: &str) -> String;
}

/// Suffix-stripping stemmer backed by a fixed per-language suffix table.
///
/// Longest matching suffix wins; a word is never stemmed below three
/// characters.
#[derive(Debug)]
pub struct SuffixStemmer {
    suffixes: Vec<&'static str>,
}

impl SuffixStemmer {
    pub fn english() -> Self {
        Self {
            suffixes: vec!["ations", "ation", "ingly", "ings", "edly", "ing", "ed", "es", "ly", "s"],
        }
    }
}

impl Stemmer for SuffixStemmer {
    fn stem(&self, word: &str) -> String {
        let mut best: Option<&str> = None;
        for suffix in &self.suffixes {
            if word.len() > suffix.len() + 2 && word.ends_with(suffix) {
                if best.is_none_or(|b| suffix.len() > b.len()) {
                    best = Some(suffix);
                }
            }
        }
        match best {
            Some(suffix) => word[..word.len() - suffix.len()].to_string(),
            None => word.to_string(),
        }
    }
}

/// Case-insensitive stop-word lookup.
#[derive(Clone, Debug, Default)]
pub struct StopWordSet {
    words: HashSet<String>,
}

impl StopWordSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }
}

// ---------------------------------------------------------------------------
// 2. TokenConfiguration
// ---------------------------------------------------------------------------

/// One named bundle of independent normalization switches.
///
/// All toggles default to off. `validate` fails fast when a toggle is
/// enabled without its backing resource — that is a configuration error,
/// never a silently skipped rule.
#[derive(Clone, Debug, Default)]
pub struct TokenConfiguration {
    pub ignore_comments: bool,
    pub ignore_delimiters: bool,
    pub ignore_preprocessor_directives: bool,
    pub ignore_this_references: bool,
    pub normalize_fully_qualified_names: bool,
    pub ignore_visibility_modifiers: bool,
    pub ignore_stop_words: bool,
    pub ignore_end_of_statement_tokens: bool,
    pub normalize_identifiers: bool,
    pub normalize_string_literals: bool,
    pub normalize_char_literals: bool,
    pub normalize_integer_literals: bool,
    pub normalize_float_literals: bool,
    pub normalize_boolean_literals: bool,
    pub normalize_type_keywords: bool,
    pub stem_words: bool,
    pub stop_words: Option<Arc<StopWordSet>>,
    pub stemmer: Option<Arc<dyn Stemmer>>,
}

impl TokenConfiguration {
    /// The toggle set used for code clone detection when nothing else is
    /// configured: literals and identifiers collapse, layout-only tokens
    /// are kept.
    pub fn code_clone_default() -> Self {
        Self {
            ignore_comments: true,
            normalize_identifiers: true,
            normalize_string_literals: true,
            normalize_char_literals: true,
            normalize_integer_literals: true,
            normalize_float_literals: true,
            normalize_boolean_literals: true,
            normalize_type_keywords: true,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> DupscanResult<()> {
        if self.stem_words && self.stemmer.is_none() {
            return Err(DupscanError::Config(
                "stem_words enabled without a configured stemmer".to_string(),
            ));
        }
        if self.ignore_stop_words && self.stop_words.is_none() {
            return Err(DupscanError::Config(
                "ignore_stop_words enabled without a configured stop-word set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serializable toggle subset of [`TokenConfiguration`].
///
/// Stop words travel as a word list and the stemmer as a named choice; both
/// are turned into their runtime capabilities by [`TokenConfigurationSpec::build`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenConfigurationSpec {
    pub ignore_comments: bool,
    pub ignore_delimiters: bool,
    pub ignore_preprocessor_directives: bool,
    pub ignore_this_references: bool,
    pub normalize_fully_qualified_names: bool,
    pub ignore_visibility_modifiers: bool,
    pub ignore_stop_words: bool,
    pub ignore_end_of_statement_tokens: bool,
    pub normalize_identifiers: bool,
    pub normalize_string_literals: bool,
    pub normalize_char_literals: bool,
    pub normalize_integer_literals: bool,
    pub normalize_float_literals: bool,
    pub normalize_boolean_literals: bool,
    pub normalize_type_keywords: bool,
    pub stem_words: bool,
    pub stop_words: Option<Vec<String>>,
    pub stemmer: Option<StemmerChoice>,
}

/// Closed set of stemmer implementations selectable from configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemmerChoice {
    English,
}

impl TokenConfigurationSpec {
    pub fn build(&self) -> DupscanResult<TokenConfiguration> {
        let config = TokenConfiguration {
            ignore_comments: self.ignore_comments,
            ignore_delimiters: self.ignore_delimiters,
            ignore_preprocessor_directives: self.ignore_preprocessor_directives,
            ignore_this_references: self.ignore_this_references,
            normalize_fully_qualified_names: self.normalize_fully_qualified_names,
            ignore_visibility_modifiers: self.ignore_visibility_modifiers,
            ignore_stop_words: self.ignore_stop_words,
            ignore_end_of_statement_tokens: self.ignore_end_of_statement_tokens,
            normalize_identifiers: self.normalize_identifiers,
            normalize_string_literals: self.normalize_string_literals,
            normalize_char_literals: self.normalize_char_literals,
            normalize_integer_literals: self.normalize_integer_literals,
            normalize_float_literals: self.normalize_float_literals,
            normalize_boolean_literals: self.normalize_boolean_literals,
            normalize_type_keywords: self.normalize_type_keywords,
            stem_words: self.stem_words,
            stop_words: self
                .stop_words
                .as_ref()
                .map(|words| Arc::new(StopWordSet::new(words))),
            stemmer: self.stemmer.map(|choice| match choice {
                StemmerChoice::English => Arc::new(SuffixStemmer::english()) as Arc<dyn Stemmer>,
            }),
        };
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// 3. NormalizationStrategy and the per-root resolver
// ---------------------------------------------------------------------------

/// A configuration registered under a name, scoped to a named region set.
#[derive(Clone, Debug)]
pub struct NamedConfiguration {
    pub name: String,
    pub region_set: String,
    pub configuration: Arc<TokenConfiguration>,
}

/// The full normalization policy for a run: registration-ordered named
/// configurations plus the default fallback and the global flags.
///
/// Strategies are constructed once before processing and are immutable
/// thereafter; per-root region lookups are derived via [`resolver`].
///
/// [`resolver`]: NormalizationStrategy::resolver
#[derive(Clone, Debug)]
pub struct NormalizationStrategy {
    named: Vec<NamedConfiguration>,
    default: Arc<TokenConfiguration>,
    pub keep_end_of_statement_tokens: bool,
    pub debug_extension: Option<String>,
}

impl NormalizationStrategy {
    pub fn new(
        named: Vec<NamedConfiguration>,
        default: TokenConfiguration,
    ) -> DupscanResult<Self> {
        default.validate()?;
        for config in &named {
            config.configuration.validate()?;
        }
        Ok(Self {
            named,
            default: Arc::new(default),
            keep_end_of_statement_tokens: false,
            debug_extension: None,
        })
    }

    pub fn with_keep_end_of_statement(mut self, keep: bool) -> Self {
        self.keep_end_of_statement_tokens = keep;
        self
    }

    pub fn with_debug_extension(mut self, extension: Option<String>) -> Self {
        self.debug_extension = extension;
        self
    }

    /// Build the offset→configuration lookup for one input root.
    ///
    /// Called once per root; initializing a new root means building a new
    /// resolver. A named configuration whose region set is missing from the
    /// catalog is a fatal configuration error.
    pub fn resolver(&self, catalog: &RegionCatalog) -> DupscanResult<ConfigResolver> {
        let mut entries = Vec::with_capacity(self.named.len());
        for config in &self.named {
            let set = catalog.get(&config.region_set).ok_or_else(|| {
                DupscanError::Config(format!(
                    "configuration '{}' references unknown region set '{}'",
                    config.name, config.region_set
                ))
            })?;
            entries.push((Arc::clone(&config.configuration), set.clone()));
        }
        Ok(ConfigResolver {
            entries,
            default: Arc::clone(&self.default),
        })
    }
}

/// Per-root lookup from (origin, offset) to the active configuration.
///
/// At most one configuration applies per token: the first registered
/// configuration whose region set covers the offset wins, else the default.
#[derive(Clone, Debug)]
pub struct ConfigResolver {
    entries: Vec<(Arc<TokenConfiguration>, RegionSet)>,
    default: Arc<TokenConfiguration>,
}

impl ConfigResolver {
    /// Resolver with no named configurations; every token gets `default`.
    pub fn default_only(default: TokenConfiguration) -> Self {
        Self {
            entries: Vec::new(),
            default: Arc::new(default),
        }
    }

    pub fn active_for(&self, origin: &str, offset: usize) -> &TokenConfiguration {
        for (config, set) in &self.entries {
            if set.contains(origin, offset) {
                return config;
            }
        }
        &self.default
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::regions::Region;

    #[test]
    fn test_suffix_stemmer_strips_longest_suffix() {
        let stemmer = SuffixStemmer::english();
        assert_eq!(stemmer.stem("normalizations"), "normaliz");
        assert_eq!(stemmer.stem("running"), "runn");
        assert_eq!(stemmer.stem("tokens"), "token");
        assert_eq!(stemmer.stem("dogs"), "dog");
        // Too short to stem.
        assert_eq!(stemmer.stem("is"), "is");
        assert_eq!(stemmer.stem("its"), "its");
    }

    #[test]
    fn test_stop_word_set_is_case_insensitive() {
        let set = StopWordSet::new(["the", "And"]);
        assert!(set.contains("THE"));
        assert!(set.contains("and"));
        assert!(!set.contains("token"));
    }

    #[test]
    fn test_validate_stemmer_required() {
        let config = TokenConfiguration {
            stem_words: true,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DupscanError::Config(_))));
    }

    #[test]
    fn test_validate_stop_words_required() {
        let config = TokenConfiguration {
            ignore_stop_words: true,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DupscanError::Config(_))));
    }

    #[test]
    fn test_spec_builds_runtime_capabilities() {
        let json = r#"{
            "stem_words": true,
            "stemmer": "english",
            "ignore_stop_words": true,
            "stop_words": ["the", "a"]
        }"#;
        let spec: TokenConfigurationSpec = serde_json::from_str(json).unwrap();
        let config = spec.build().unwrap();
        assert!(config.stemmer.is_some());
        assert!(config.stop_words.as_ref().unwrap().contains("The"));
    }

    #[test]
    fn test_resolver_first_matching_configuration_wins() {
        let mut set_a = RegionSet::default();
        set_a.set_regions("a.java", vec![Region { start: 0, end: 10 }]);
        let mut set_b = RegionSet::default();
        set_b.set_regions("a.java", vec![Region { start: 5, end: 20 }]);

        let mut catalog = RegionCatalog::default();
        catalog.insert("first", set_a);
        catalog.insert("second", set_b);

        let named = vec![
            NamedConfiguration {
                name: "comments-off".to_string(),
                region_set: "first".to_string(),
                configuration: Arc::new(TokenConfiguration {
                    ignore_comments: true,
                    ..Default::default()
                }),
            },
            NamedConfiguration {
                name: "delimiters-off".to_string(),
                region_set: "second".to_string(),
                configuration: Arc::new(TokenConfiguration {
                    ignore_delimiters: true,
                    ..Default::default()
                }),
            },
        ];
        let strategy = NormalizationStrategy::new(named, TokenConfiguration::default()).unwrap();
        let resolver = strategy.resolver(&catalog).unwrap();

        // Offset 7 is covered by both sets; registration order decides.
        assert!(resolver.active_for("a.java", 7).ignore_comments);
        assert!(!resolver.active_for("a.java", 7).ignore_delimiters);
        // Offset 15 only matches the second set.
        assert!(resolver.active_for("a.java", 15).ignore_delimiters);
        // Offset 30 falls back to the default.
        let default = resolver.active_for("a.java", 30);
        assert!(!default.ignore_comments && !default.ignore_delimiters);
    }

    #[test]
    fn test_resolver_unknown_region_set_is_fatal() {
        let named = vec![NamedConfiguration {
            name: "x".to_string(),
            region_set: "missing".to_string(),
            configuration: Arc::new(TokenConfiguration::default()),
        }];
        let strategy = NormalizationStrategy::new(named, TokenConfiguration::default()).unwrap();
        let err = strategy.resolver(&RegionCatalog::default());
        assert!(matches!(err, Err(DupscanError::Config(_))));
    }
}
