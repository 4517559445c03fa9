//! Member and base extraction for one selected class.
//!
//! Detection is textual: component markers and the implements macro are found
//! by substring/regex search over the class body (header included), while
//! field and method boundaries come from a [`DeclParser`] and are only looked
//! for after the header.

use regex::Regex;
use tracing::debug;

use crate::decl::{trim_decl_name, DeclParser};
use crate::locate::ClassDecl;
use crate::types::{dedup_preserving_order, ClassMeta, GenConfig};

const FIELD_DELIMS: &[char] = &[';', '=', '{'];
const METHOD_DELIMS: &[char] = &['(', '='];

// ---------------------------------------------------------------------------
// Marker patterns
// ---------------------------------------------------------------------------

/// Compiled patterns for one run, built once from [`GenConfig`].
pub struct Markers {
    /// `[[ refl ]]` / `[[ akari::refl ]]` with optional inner whitespace.
    pub refl: Regex,
    /// `AKR_IMPLS ( ... )`, shortest match.
    pub impls: Regex,
}

impl Markers {
    pub fn new(config: &GenConfig) -> Self {
        let attrs: Vec<String> = config.refl_attributes.iter().map(|a| regex::escape(a)).collect();
        let refl = Regex::new(&format!(r"\[\[\s*(?:{})\s*\]\]", attrs.join("|")))
            .expect("reflection marker pattern is valid");
        let impls = Regex::new(&format!(r"{}\s*\(([^)]*)\)", regex::escape(&config.impls_macro)))
            .expect("implements pattern is valid");
        Markers { refl, impls }
    }

    /// Whether a class header carries the reflection attribute.
    pub fn is_reflected(&self, header: &str) -> bool {
        self.refl.is_match(header)
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Build the metadata record for a selected class.
pub fn extract_class(
    decl: &ClassDecl<'_>,
    config: &GenConfig,
    markers: &Markers,
    parser: &dyn DeclParser,
) -> ClassMeta {
    let body = decl.body;
    let mut meta = ClassMeta::new(decl.name.clone());

    meta.is_component = config.component_markers.iter().any(|m| body.contains(m.as_str()));
    if meta.is_component {
        meta.bases.insert(config.component_base.clone());
        meta.methods.push("commit".to_string());
    }
    meta.bases.extend(implemented_bases(body, markers));

    // Header attributes select the class; members start after the opening brace.
    let members_from = decl.header.len();
    meta.fields.extend(scan_members(
        body,
        members_from,
        markers,
        |b, p| parser.field_end(b, p),
        parser,
        FIELD_DELIMS,
    ));
    meta.methods.extend(scan_members(
        body,
        members_from,
        markers,
        |b, p| parser.method_end(b, p),
        parser,
        METHOD_DELIMS,
    ));

    dedup_preserving_order(&mut meta.fields);
    dedup_preserving_order(&mut meta.methods);
    meta
}

/// Base names listed in the first implements-macro invocation of `body`.
pub fn implemented_bases(body: &str, markers: &Markers) -> Vec<String> {
    markers
        .impls
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|args| {
            args.as_str()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Walk every reflection marker in `body` from offset `from` and collect the
/// names of the declarations `end_of` recognizes. Unrecognized markers are skipped.
fn scan_members<F>(
    body: &str,
    from: usize,
    markers: &Markers,
    end_of: F,
    parser: &dyn DeclParser,
    delims: &[char],
) -> Vec<String>
where
    F: Fn(&str, usize) -> Option<usize>,
{
    let mut names = Vec::new();
    let mut start = from;
    while let Some(m) = markers.refl.find_at(body, start) {
        if let Some(end) = end_of(body, m.start()) {
            let name_start = parser.name_start(body, m.start());
            let name = trim_decl_name(&body[name_start.min(end)..end], delims);
            if name.is_empty() {
                debug!(offset = m.start(), "Empty declaration name after marker");
            } else {
                names.push(name.to_string());
            }
        }
        start = m.end();
    }
    names
}
