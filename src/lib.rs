//! Auto-mocks the imported UI components a module uses. Static analysis
//! finds every component reference that roots at an import (direct tag
//! usage, namespace members, or higher-order wrapper results), then a
//! deferred patch replaces exactly those exports with a pass-through
//! stand-in the next time each owning module loads. Everything else the
//! owning modules export stays real.

pub mod bindings;
pub mod exports;
pub mod host;
pub mod paths;
pub mod registry;
pub mod resolver;
pub mod synth;

pub use exports::{passthrough, ExportRef, ExportValue, Props, ES_MODULE_FLAG};
pub use host::{FsHost, Host};
pub use paths::ResolverConfig;
pub use registry::{InMemoryRegistry, MockFactory, ModuleRegistry, RegistryError};
pub use resolver::{resolve_references, ExportKind, ReferenceRecord};

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutoMockError {
    /// The build-time transform either did not run or handed over something
    /// that is not an imported identifier. The one failure surfaced to the
    /// caller instead of swallowed.
    #[error(
        "auto-mock transform is not enabled or a non-imported identifier was passed to the mock marker"
    )]
    MissingPaths,
}

/// Runtime half of the mock marker: analyze the module at `file_path` (as
/// imported from the test at `test_path`) and register one export patch per
/// owning module of the components it uses.
///
/// Anything short of a configuration error degrades to "no mocking": an
/// unresolvable or unreadable target module is a silent no-op, and analysis
/// failures simply produce no registrations.
pub fn auto_mock_components(
    file_path: Option<&str>,
    test_path: Option<&str>,
    resolvers: &ResolverConfig,
    host: &dyn Host,
    registry: &mut dyn ModuleRegistry,
) -> Result<(), AutoMockError> {
    let (Some(file_path), Some(test_path)) = (non_empty(file_path), non_empty(test_path)) else {
        return Err(AutoMockError::MissingPaths);
    };

    let test_dir = Path::new(test_path).parent().unwrap_or_else(|| Path::new("."));
    let Some(current_path) = host.resolve_specifier(file_path, test_dir) else {
        tracing::debug!(specifier = file_path, "mock target did not resolve, skipping");
        return Ok(());
    };
    let Ok(source) = host.read_source(&current_path) else {
        tracing::debug!(path = %current_path.display(), "mock target is unreadable, skipping");
        return Ok(());
    };
    if source.is_empty() {
        return Ok(());
    }

    // The analyzed module's own directory anchors both the relative-path
    // join for registry keys and the fallback specifier search.
    let current_dir = current_path.parent().unwrap_or_else(|| Path::new("."));
    let records = resolver::resolve_references(&source, resolvers, current_dir, host);
    if !records.is_empty() {
        synth::apply(&records, &current_path, registry);
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
