use crate::paths;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Read-only view of which capability sub-specifications exist.
pub trait CapabilityLookup {
    fn exists(&self, capability: &str) -> bool;
}

/// Capabilities on disk: `<specs_dir>/<capability>/<marker>` must be a file.
#[derive(Debug, Clone)]
pub struct FsCapabilities {
    specs_dir: PathBuf,
    marker: String,
}

impl FsCapabilities {
    pub fn new(specs_dir: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        Self {
            specs_dir: specs_dir.into(),
            marker: marker.into(),
        }
    }

    pub fn for_change(change_dir: &Path) -> Self {
        Self::new(change_dir.join(paths::SPECS_DIR), paths::CAPABILITY_MARKER)
    }
}

impl CapabilityLookup for FsCapabilities {
    fn exists(&self, capability: &str) -> bool {
        // Nothing that could resolve outside specs_dir.
        if capability.is_empty() || capability.contains(&['/', '\\', '.'][..]) {
            return false;
        }
        self.specs_dir
            .join(capability)
            .join(&self.marker)
            .is_file()
    }
}

/// In-memory lookup, handy for callers that already know the capability set.
#[derive(Debug, Clone, Default)]
pub struct KnownCapabilities(BTreeSet<String>);

impl KnownCapabilities {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }
}

impl CapabilityLookup for KnownCapabilities {
    fn exists(&self, capability: &str) -> bool {
        self.0.contains(capability)
    }
}

// ---------------------------------------------------------------------------
// Name matching
// ---------------------------------------------------------------------------

static NUMBER_PREFIX_RE: OnceLock<Regex> = OnceLock::new();
static NON_ALNUM_RE: OnceLock<Regex> = OnceLock::new();

fn number_prefix_re() -> &'static Regex {
    NUMBER_PREFIX_RE.get_or_init(|| Regex::new(r"^\s*\d+\.").unwrap())
}

fn non_alnum_re() -> &'static Regex {
    NON_ALNUM_RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

/// Kebab-case capability name for a section title.
///
/// `"3. Support Aider!"` becomes `"support-aider"`. Titles with nothing but
/// digits and punctuation normalize to `""`, which never matches.
pub fn normalize_capability_name(name: &str) -> String {
    let without_prefix = number_prefix_re().replace(name, "");
    let lower = without_prefix.to_lowercase();
    let kebab = non_alnum_re().replace_all(&lower, "-");
    let kebab = kebab.trim_matches('-');
    if kebab.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return String::new();
    }
    kebab.to_string()
}

/// Capability name for `section_name` if one exists in `lookup`.
pub fn match_section_to_capability(
    section_name: &str,
    lookup: &dyn CapabilityLookup,
) -> Option<String> {
    let capability = normalize_capability_name(section_name);
    if capability.is_empty() || !lookup.exists(&capability) {
        return None;
    }
    Some(capability)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
