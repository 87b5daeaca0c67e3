use crate::host::Host;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

// -----------------------------------------------------------------------------
// Resolver configuration
// -----------------------------------------------------------------------------

/// Search configuration handed over by the build-time transform. Absent
/// entries are empty; `root` accepts a single string or a list.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    #[serde(deserialize_with = "string_or_seq")]
    pub root: Vec<String>,
    pub alias: IndexMap<String, String>,
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(root)) => vec![root],
        Some(OneOrMany::Many(roots)) => roots,
        None => vec![],
    })
}

// -----------------------------------------------------------------------------
// Specifier resolution
// -----------------------------------------------------------------------------

/// Resolves an import specifier to the path a mock registration should key
/// on: the raw specifier when it resolves directly (or when nothing does),
/// otherwise an alias- or root-expanded path.
pub struct SpecifierResolver<'a> {
    host: &'a dyn Host,
    config: &'a ResolverConfig,
    search_dir: &'a Path,
}

impl<'a> SpecifierResolver<'a> {
    pub fn new(host: &'a dyn Host, config: &'a ResolverConfig, search_dir: &'a Path) -> Self {
        SpecifierResolver {
            host,
            config,
            search_dir,
        }
    }

    /// Best effort: the raw specifier comes back unchanged when nothing
    /// resolves, and a later load of that path is allowed to fail.
    pub fn resolve(&self, specifier: &str) -> String {
        if self.host.resolve_specifier(specifier, self.search_dir).is_some() {
            return specifier.to_string();
        }
        if let Some(hit) = self.resolve_aliased(specifier) {
            return hit;
        }
        if let Some(hit) = self.resolve_from_roots(specifier) {
            return hit;
        }
        specifier.to_string()
    }

    fn resolve_aliased(&self, specifier: &str) -> Option<String> {
        for (key, target) in &self.config.alias {
            let rest = if specifier == key {
                ""
            } else if let Some(rest) = specifier.strip_prefix(key).and_then(|r| r.strip_prefix('/')) {
                rest
            } else {
                continue;
            };
            let substituted = if rest.is_empty() {
                target.clone()
            } else {
                format!("{target}/{rest}")
            };
            if self.host.resolve_specifier(&substituted, self.search_dir).is_some() {
                return Some(substituted);
            }
            if let Some(hit) = self.resolve_from_roots(&substituted) {
                return Some(hit);
            }
        }
        None
    }

    /// Walk the search directory's ancestors looking for each configured
    /// root: an ancestor whose trailing components are the root is used as
    /// is, otherwise the root is joined beneath the ancestor. First
    /// candidate from which the specifier resolves wins. Matching whole
    /// components keeps a root name that merely occurs inside an unrelated
    /// segment from hijacking the search.
    fn resolve_from_roots(&self, specifier: &str) -> Option<String> {
        for root in &self.config.root {
            let parts: Vec<&str> = root
                .split('/')
                .filter(|part| !part.is_empty() && *part != ".")
                .collect();
            if parts.is_empty() {
                continue;
            }
            for ancestor in self.search_dir.ancestors() {
                let base = if ends_with_components(ancestor, &parts) {
                    ancestor.to_path_buf()
                } else {
                    let mut joined = ancestor.to_path_buf();
                    for part in &parts {
                        joined.push(part);
                    }
                    joined
                };
                let candidate = normalize_path(&base.join(specifier));
                let candidate = candidate.display().to_string();
                if self.host.resolve_specifier(&candidate, self.search_dir).is_some() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

fn ends_with_components(path: &Path, parts: &[&str]) -> bool {
    let components: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();
    components.len() >= parts.len() && components[components.len() - parts.len()..] == *parts
}

/// Lexically resolve `.` and `..` segments without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
