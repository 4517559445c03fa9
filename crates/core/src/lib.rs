//! reflgen — reflection metadata and serialization code generation for C++.
//!
//! Scans one translation unit for classes marked with `[[refl]]` (or named as
//! the build target), collects their annotated fields and methods, and emits
//! companion C++ that registers them with the runtime property system and
//! implements `save`/`load`.
//!
//! # Modules
//!
//! - [`preprocess`] — Comment and `final` keyword stripping
//! - [`decl`] — Declaration boundary recognition behind the [`decl::DeclParser`] trait
//! - [`locate`] — Class header discovery and brace-balanced body isolation
//! - [`extract`] — Field, method, base and component extraction per class
//! - [`emit`] — Registration, static metadata and serialization rendering
//! - [`types`] — Configuration, per-class metadata, the class registry
//! - [`error`] — Error type shared by every stage

pub mod decl;
pub mod emit;
pub mod error;
pub mod extract;
pub mod locate;
pub mod preprocess;
pub mod types;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

pub use error::{Error, Result};
pub use types::{ClassMeta, ClassRegistry, GenConfig};

use decl::{DeclParser, TokenDeclParser};
use extract::{extract_class, Markers};
use locate::ClassLocator;

// ---------------------------------------------------------------------------
// .reflgen.toml config loading
// ---------------------------------------------------------------------------

/// File name looked up next to the input translation unit.
pub const CONFIG_FILE_NAME: &str = ".reflgen.toml";

/// Known keys in `.reflgen.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] = &[
    "refl_attributes",
    "component_markers",
    "impls_macro",
    "component_base",
    "class_keywords",
    "strip_keyword",
];

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn string_list(table: &toml::Table, key: &str) -> Option<Vec<String>> {
    let value = table.get(key)?;
    let list: Option<Vec<String>> = value
        .as_array()
        .and_then(|arr| arr.iter().map(|v| v.as_str().map(|s| s.to_string())).collect());
    match list {
        Some(list) if !list.is_empty() => Some(list),
        _ => {
            warn!(key, "Expected a non-empty array of strings in {CONFIG_FILE_NAME}, keeping default");
            None
        }
    }
}

fn string_value(table: &toml::Table, key: &str) -> Option<String> {
    let value = table.get(key)?;
    match value.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            warn!(key, "Expected a string in {CONFIG_FILE_NAME}, keeping default");
            None
        }
    }
}

/// Parse generator configuration from TOML text, merging overrides into the defaults.
///
/// Unknown keys trigger a warning with a typo suggestion; values of the wrong
/// type are ignored with a warning.
pub fn parse_reflgen_config(content: &str, path: &Path) -> Result<GenConfig> {
    let table = content.parse::<toml::Table>().map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    for key in table.keys() {
        if KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            continue;
        }
        let suggestion = KNOWN_CONFIG_KEYS.iter().min_by_key(|k| edit_distance(key, k));
        match suggestion {
            Some(suggestion) if edit_distance(key, suggestion) <= 3 => warn!(
                key = key.as_str(),
                suggestion = *suggestion,
                "Unknown key in {CONFIG_FILE_NAME} — did you mean '{suggestion}'?"
            ),
            _ => warn!(
                key = key.as_str(),
                "Unknown key in {CONFIG_FILE_NAME} (known keys: {})",
                KNOWN_CONFIG_KEYS.join(", ")
            ),
        }
    }

    let mut config = GenConfig::new();
    if let Some(v) = string_list(&table, "refl_attributes") {
        config.refl_attributes = v;
    }
    if let Some(v) = string_list(&table, "component_markers") {
        config.component_markers = v;
    }
    if let Some(v) = string_list(&table, "class_keywords") {
        config.class_keywords = v;
    }
    if let Some(v) = string_value(&table, "impls_macro") {
        config.impls_macro = v;
    }
    if let Some(v) = string_value(&table, "component_base") {
        config.component_base = v;
    }
    if let Some(v) = string_value(&table, "strip_keyword") {
        config.strip_keyword = v;
    }
    Ok(config)
}

/// Load generator configuration from a `.reflgen.toml` file.
pub fn load_reflgen_config(path: &Path) -> Result<GenConfig> {
    debug!(path = %path.display(), "Loading config");
    let content = std::fs::read_to_string(path)
        .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    parse_reflgen_config(&content, path)
}

/// `.reflgen.toml` in the input file's directory, if one exists.
pub fn find_config_for(input: &Path) -> Option<PathBuf> {
    let dir = input.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let candidate = dir.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Result of one generator run.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Generated C++ source, written verbatim by the caller.
    pub source: String,
    /// Metadata for every selected class, in discovery order.
    pub registry: ClassRegistry,
}

/// Scan an already preprocessed buffer and collect metadata for every class
/// named `target` or carrying the reflection attribute in its header.
pub fn collect_classes(
    buf: &str,
    target: &str,
    config: &GenConfig,
    parser: &dyn DeclParser,
) -> Result<ClassRegistry> {
    let markers = Markers::new(config);
    let mut registry = ClassRegistry::new();

    for decl in ClassLocator::new(buf, config) {
        let decl = decl?;
        if decl.name != target && !markers.is_reflected(decl.header) {
            debug!(class = decl.name.as_str(), "Skipping class");
            continue;
        }
        info!(class = decl.name.as_str(), "Generating meta info");
        let meta = extract_class(&decl, config, &markers, parser);
        debug!(
            class = meta.name.as_str(),
            fields = meta.fields.len(),
            methods = meta.methods.len(),
            component = meta.is_component,
            "Class extracted"
        );
        if registry.insert(meta).is_some() {
            warn!(class = decl.name.as_str(), "Class declared twice, keeping the last one");
        }
    }
    Ok(registry)
}

/// Run the whole pipeline over one translation unit with a custom declaration parser.
pub fn generate_with(
    source: &str,
    target: &str,
    config: &GenConfig,
    parser: &dyn DeclParser,
) -> Result<Generated> {
    let buf = preprocess::strip_source(source, &config.strip_keyword);
    let registry = collect_classes(&buf, target, config, parser)?;
    let source = emit::render(&registry, target);
    Ok(Generated { source, registry })
}

/// Run the whole pipeline over one translation unit.
pub fn generate(source: &str, target: &str, config: &GenConfig) -> Result<Generated> {
    generate_with(source, target, config, &TokenDeclParser::new())
}

/// Read `input`, generate, and write the result to `output`, creating its
/// parent directory if needed and overwriting any existing file.
pub fn generate_file(
    target: &str,
    input: &Path,
    output: &Path,
    config: &GenConfig,
) -> Result<Generated> {
    let source = std::fs::read_to_string(input)
        .map_err(|source| Error::Io { path: input.to_path_buf(), source })?;
    let generated = generate(&source, target, config)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|source| Error::Io { path: parent.to_path_buf(), source })?;
    }
    std::fs::write(output, &generated.source)
        .map_err(|source| Error::Io { path: output.to_path_buf(), source })?;

    info!(
        target_class = target,
        classes = generated.registry.len(),
        output = %output.display(),
        "Wrote generated metadata"
    );
    Ok(generated)
}
