use crate::exports::{passthrough, ExportMap, ExportRef, ExportValue, ES_MODULE_FLAG};
use crate::paths::normalize_path;
use crate::registry::{MockFactory, ModuleRegistry};
use crate::resolver::{ExportKind, ReferenceRecord};
use indexmap::IndexMap;
use std::path::Path;
use std::rc::Rc;

// -----------------------------------------------------------------------------
// Module substitution
// -----------------------------------------------------------------------------

/// One mocked position inside an owning module.
#[derive(Debug, Clone)]
pub struct MockTarget {
    /// Dotted identifier path as recorded at the reference site.
    pub identifier: String,
    pub kind: ExportKind,
}

/// Group the records by owning module and register one registry interceptor
/// per module. Never raises: a mock that cannot be installed is reported and
/// the real module stays in place.
pub fn apply(records: &[ReferenceRecord], current_path: &Path, registry: &mut dyn ModuleRegistry) {
    let current_dir = current_path.parent().unwrap_or_else(|| Path::new("."));

    let mut groups: IndexMap<String, Vec<MockTarget>> = IndexMap::new();
    for record in records {
        let key = if record.module_path.starts_with('.') {
            normalize_path(&current_dir.join(&record.module_path))
                .display()
                .to_string()
        } else {
            record.module_path.clone()
        };
        groups.entry(key).or_default().push(MockTarget {
            identifier: record.identifier.clone(),
            kind: record.kind,
        });
    }

    for (key, targets) in groups {
        let factory_key = key.clone();
        let factory: MockFactory = Box::new(move |registry: &mut dyn ModuleRegistry| {
            let actual = registry.require_actual(&factory_key)?;
            Ok(patch_exports(&actual, &targets))
        });
        if let Err(err) = registry.register_mock(&key, factory) {
            tracing::warn!(module = %key, error = %err, "could not register component mock");
        }
    }
}

/// Shallow-clone the real exports and splice the stand-in over each targeted
/// position, in insertion order. Untouched exports keep their identity; only
/// the clones along a target path are new objects.
pub fn patch_exports(actual: &ExportRef, targets: &[MockTarget]) -> ExportRef {
    let mut mocked: ExportMap = match &**actual {
        ExportValue::Object(map) => map.clone(),
        _ => ExportMap::new(),
    };
    mocked.insert(ES_MODULE_FLAG.to_string(), Rc::new(ExportValue::Bool(true)));

    for target in targets {
        let mut segments: Vec<&str> = target
            .identifier
            .split('.')
            .filter(|segment| !segment.is_empty())
            .collect();
        // The leading segment of a namespace reference is the namespace
        // object itself, not an export of the owning module.
        if target.kind == ExportKind::Namespace && !segments.is_empty() {
            segments.remove(0);
        }

        match target.kind {
            ExportKind::Namespace if segments.is_empty() => {
                // The whole namespace object is the target: the module's
                // entire export value becomes the stand-in, marker and all.
                return passthrough();
            }
            ExportKind::Default => {
                mocked.insert("default".to_string(), passthrough());
            }
            _ => splice_path(&mut mocked, &segments),
        }
    }

    Rc::new(ExportValue::Object(mocked))
}

/// Copy-on-path descent: clone each intermediate object so its siblings stay
/// shared with the real module, then overwrite the final segment.
fn splice_path(map: &mut ExportMap, segments: &[&str]) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), passthrough());
        }
        [head, rest @ ..] => {
            let mut inner = match map.get(*head).map(Rc::as_ref) {
                Some(ExportValue::Object(existing)) => existing.clone(),
                // Anything else gets a fresh object grown around the path.
                _ => ExportMap::new(),
            };
            splice_path(&mut inner, rest);
            map.insert((*head).to_string(), Rc::new(ExportValue::Object(inner)));
        }
    }
}
