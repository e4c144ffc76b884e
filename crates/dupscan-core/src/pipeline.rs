//! End-to-end detection runs: discovery, scanning, normalization, clone
//! detection, and report assembly.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use indexmap::IndexMap;
use rayon::prelude::*;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{DupscanError, DupscanResult};
use crate::models::{SentinelUnit, Token, Unit};
use crate::normalize::config::{
    NamedConfiguration, NormalizationStrategy, TokenConfigurationSpec,
};
use crate::normalize::debug::DebugRenderer;
use crate::normalize::filter::{FilteringProvider, SourceGaps};
use crate::normalize::normalizer::TokenNormalizer;
use crate::normalize::provider::FileTokenProvider;
use crate::normalize::regions::{RegionCatalog, RegionCatalogSpec, RegionSet};
use crate::repetition::params::RepetitionParameters;
use crate::repetition::statements::mark_repetitive_regions;
use crate::report::detect::detect_clones;
use crate::report::model::{CloneReport, ReportValue, SourceFileDescriptor};
use crate::scanner::cache::TokenCache;
use crate::scanner::filesystem::{discover_files, stable_file_id, SourceFile};
use crate::scanner::lexer::tokenize;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A named configuration as it appears in a config file.
#[derive(Clone, Debug, Deserialize)]
pub struct NamedConfigurationSpec {
    pub name: String,
    pub region_set: String,
    #[serde(default)]
    pub configuration: TokenConfigurationSpec,
}

/// Full configuration of a detection run.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Character encoding label for scanned sources. Only UTF-8 (labels
    /// `utf-8`/`utf8`, case-insensitive) is supported; any other label is
    /// a configuration error. Ill-formed bytes in a file are replaced with
    /// U+FFFD instead of failing the file. The label is part of the token
    /// cache key.
    pub encoding: String,
    pub min_clone_length: usize,
    pub cache_capacity: usize,
    pub default_configuration: TokenConfigurationSpec,
    pub named_configurations: Vec<NamedConfigurationSpec>,
    pub regions: RegionCatalogSpec,
    /// Name of the region set whose regions are dropped before
    /// normalization, if any.
    pub ignore_region_set: Option<String>,
    pub ignore_patterns: Vec<String>,
    pub keep_end_of_statement_tokens: bool,
    pub debug_extension: Option<String>,
    /// When set, structurally repetitive statement regions are counted and
    /// recorded in the report values.
    pub repetition: Option<RepetitionParameters>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            encoding: "utf-8".to_string(),
            min_clone_length: 10,
            cache_capacity: 1024,
            default_configuration: TokenConfigurationSpec::default(),
            named_configurations: Vec::new(),
            regions: RegionCatalogSpec::default(),
            ignore_region_set: None,
            ignore_patterns: Vec::new(),
            keep_end_of_statement_tokens: false,
            debug_extension: None,
            repetition: None,
        }
    }
}

impl DetectionConfig {
    pub fn from_json(json: &str) -> DupscanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

struct ScannedFile {
    file: SourceFile,
    source: String,
    tokens: Arc<Vec<Token>>,
    readable: bool,
}

/// Runs the whole pipeline over a directory tree and returns the report.
///
/// Configuration problems fail the run up front. A file that cannot be
/// read degrades to zero tokens with a warning and the run continues.
pub fn run_detection(root: &Path, config: &DetectionConfig) -> DupscanResult<CloneReport> {
    let started = Instant::now();

    validate_encoding(&config.encoding)?;
    let catalog = RegionCatalog::from_spec(&config.regions);
    let strategy = build_strategy(config)?;
    let resolver = Arc::new(strategy.resolver(&catalog)?);
    let ignore_regions = match &config.ignore_region_set {
        Some(name) => catalog
            .get(name)
            .cloned()
            .ok_or_else(|| DupscanError::Config(format!("unknown ignore region set '{name}'")))?,
        None => RegionSet::default(),
    };
    let ignore_patterns = compile_patterns(&config.ignore_patterns)?;

    let files = discover_files(root);
    let files_seen = files.len();
    let cache = TokenCache::new(config.cache_capacity);

    let scanned: Vec<ScannedFile> = match rayon::ThreadPoolBuilder::new().build() {
        Ok(pool) => pool.install(|| {
            files
                .into_par_iter()
                .map(|file| scan_file(file, &cache, &config.encoding))
                .collect()
        }),
        Err(e) => {
            warn!(error = %e, "thread pool unavailable, scanning sequentially");
            files
                .into_iter()
                .map(|file| scan_file(file, &cache, &config.encoding))
                .collect()
        }
    };
    let files_scanned = scanned.iter().filter(|s| s.readable).count();

    // Normalization is per file: each file gets its own filter/normalizer
    // pair over the shared read-only strategy.
    let mut all_units: Vec<Unit> = Vec::new();
    let mut units_produced = 0usize;
    for entry in &scanned {
        let origin = entry.file.path.clone();
        let gaps = SourceGaps::new(HashMap::from([(origin.clone(), entry.source.clone())]));
        let provider = FileTokenProvider::new(vec![Arc::clone(&entry.tokens)]);
        let filter = FilteringProvider::new(
            provider,
            gaps,
            ignore_regions.clone(),
            ignore_patterns.clone(),
        );
        let renderer = strategy.debug_extension.as_ref().map(|extension| {
            let mut renderer = DebugRenderer::new(extension.clone());
            renderer.register_source(origin.clone(), entry.source.clone());
            renderer
        });
        let mut normalizer =
            TokenNormalizer::new(filter, Arc::clone(&resolver), entry.file.language)
                .with_keep_end_of_statement(strategy.keep_end_of_statement_tokens)
                .with_debug_renderer(renderer);
        while let Some(unit) = normalizer.produce_next()? {
            if matches!(unit, Unit::Content(_)) {
                units_produced += 1;
            }
            all_units.push(unit);
        }
        all_units.push(Unit::Sentinel(SentinelUnit { origin }));
    }
    debug!(units = all_units.len(), "normalization finished");

    let mut file_ids: IndexMap<String, u32> = IndexMap::new();
    let mut source_files = Vec::new();
    for entry in &scanned {
        let id = stable_file_id(&entry.file.path);
        file_ids.insert(entry.file.path.clone(), id);
        source_files.push(SourceFileDescriptor {
            id,
            path: entry.file.path.clone(),
            location: entry.file.absolute.display().to_string(),
            length: entry.file.size_bytes,
            fingerprint: content_fingerprint(&entry.source),
        });
    }

    let clone_classes = detect_clones(&all_units, config.min_clone_length, &file_ids)?;

    let mut report = CloneReport {
        timestamp: Some(Utc::now().fixed_offset()),
        source_files,
        clone_classes,
        ..CloneReport::default()
    };
    report.values.set("filesSeen", ReportValue::Integer(files_seen as i64));
    report
        .values
        .set("filesScanned", ReportValue::Integer(files_scanned as i64));
    report
        .values
        .set("unitsProduced", ReportValue::Integer(units_produced as i64));
    if let Some(params) = config.repetition {
        let regions = mark_repetitive_regions(&all_units, params);
        report
            .values
            .set("repetitiveRegions", ReportValue::Integer(regions.len() as i64));
    }
    report.values.set_transient(
        "elapsedMs",
        ReportValue::Integer(started.elapsed().as_millis() as i64),
    );
    report.sort_for_output();
    Ok(report)
}

fn build_strategy(config: &DetectionConfig) -> DupscanResult<NormalizationStrategy> {
    let mut named = Vec::with_capacity(config.named_configurations.len());
    for spec in &config.named_configurations {
        named.push(NamedConfiguration {
            name: spec.name.clone(),
            region_set: spec.region_set.clone(),
            configuration: Arc::new(spec.configuration.build()?),
        });
    }
    let default = config.default_configuration.build()?;
    Ok(NormalizationStrategy::new(named, default)?
        .with_keep_end_of_statement(config.keep_end_of_statement_tokens)
        .with_debug_extension(config.debug_extension.clone()))
}

fn validate_encoding(encoding: &str) -> DupscanResult<()> {
    if encoding.eq_ignore_ascii_case("utf-8") || encoding.eq_ignore_ascii_case("utf8") {
        Ok(())
    } else {
        Err(DupscanError::Config(format!(
            "unsupported encoding '{encoding}': only UTF-8 input is supported"
        )))
    }
}

fn compile_patterns(patterns: &[String]) -> DupscanResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .map_err(|e| DupscanError::Config(format!("bad ignore pattern '{pattern}': {e}")))
        })
        .collect()
}

fn scan_file(file: SourceFile, cache: &TokenCache, encoding: &str) -> ScannedFile {
    let (source, readable) = match std::fs::read(&file.absolute) {
        Ok(bytes) => (String::from_utf8_lossy(&bytes).into_owned(), true),
        Err(e) => {
            warn!(path = %file.path, error = %e, "failed to read source file, treating as empty");
            (String::new(), false)
        }
    };
    let tokens = cache.get_or_scan(&file.path, encoding, file.language, || {
        tokenize(&source, file.language, &file.path)
    });
    ScannedFile {
        file,
        source,
        tokens,
        readable,
    }
}

fn content_fingerprint(source: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn config(min_clone_length: usize) -> DetectionConfig {
        DetectionConfig {
            min_clone_length,
            ..DetectionConfig::default()
        }
    }

    #[test]
    fn test_run_detects_cross_file_duplication() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.java", "int total = base + base;\n");
        write_file(&dir, "b.java", "int total = base + base;\n");
        let report = run_detection(dir.path(), &config(4)).unwrap();

        assert_eq!(report.source_files.len(), 2);
        assert_eq!(report.clone_classes.len(), 1);
        let class = &report.clone_classes[0];
        assert_eq!(class.clones.len(), 2);
        let file_ids: Vec<u32> = class.clones.iter().map(|c| c.source_file_id).collect();
        let mut expected: Vec<u32> = report.source_files.iter().map(|f| f.id).collect();
        expected.sort_unstable();
        let mut got = file_ids.clone();
        got.sort_unstable();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_run_over_empty_tree_yields_empty_report() {
        let dir = TempDir::new().unwrap();
        let report = run_detection(dir.path(), &config(4)).unwrap();
        assert!(report.source_files.is_empty());
        assert!(report.clone_classes.is_empty());
        assert_eq!(
            report.values.get("filesSeen"),
            Some(&ReportValue::Integer(0))
        );
    }

    #[test]
    fn test_run_records_statistics() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.java", "int x = 1;\n");
        let report = run_detection(dir.path(), &config(50)).unwrap();
        assert_eq!(
            report.values.get("filesScanned"),
            Some(&ReportValue::Integer(1))
        );
        match report.values.get("unitsProduced") {
            Some(ReportValue::Integer(n)) => assert!(*n > 0),
            other => panic!("unexpected unitsProduced: {other:?}"),
        }
        // Elapsed time is transient and must not reach the wire.
        let xml = crate::report::writer::write_report(&report).unwrap();
        assert!(!xml.contains("elapsedMs"));
    }

    #[test]
    fn test_unknown_ignore_region_set_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(4);
        cfg.ignore_region_set = Some("missing".to_string());
        assert!(run_detection(dir.path(), &cfg).is_err());
    }

    #[test]
    fn test_bad_ignore_pattern_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(4);
        cfg.ignore_patterns = vec!["(".to_string()];
        assert!(run_detection(dir.path(), &cfg).is_err());
    }

    #[test]
    fn test_config_from_json_defaults() {
        let cfg = DetectionConfig::from_json("{\"min_clone_length\": 7}").unwrap();
        assert_eq!(cfg.min_clone_length, 7);
        assert_eq!(cfg.encoding, "utf-8");
        assert!(cfg.named_configurations.is_empty());
    }

    #[test]
    fn test_non_ascii_source_is_scanned() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.java", "long prixé = prixTotal;\n");
        // Latin-1 bytes decode to U+FFFD and must not take the run down.
        fs::write(dir.path().join("b.java"), b"int caf\xe9 = 1;\n").unwrap();
        let report = run_detection(dir.path(), &config(50)).unwrap();
        assert_eq!(
            report.values.get("filesScanned"),
            Some(&ReportValue::Integer(2))
        );
    }

    #[test]
    fn test_unsupported_encoding_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(4);
        cfg.encoding = "latin-1".to_string();
        let err = run_detection(dir.path(), &cfg).unwrap_err();
        assert!(err.to_string().contains("latin-1"));
    }

    #[test]
    fn test_encoding_label_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(4);
        cfg.encoding = "UTF8".to_string();
        assert!(run_detection(dir.path(), &cfg).is_ok());
    }

    #[test]
    fn test_identifier_normalization_matches_renamed_code() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.java", "total = alpha + alpha;\n");
        write_file(&dir, "b.java", "sum = beta + beta;\n");
        let mut cfg = config(4);
        cfg.default_configuration.normalize_identifiers = true;
        let report = run_detection(dir.path(), &cfg).unwrap();
        assert_eq!(report.clone_classes.len(), 1);
        assert_eq!(report.clone_classes[0].clones.len(), 2);
    }
}
