use indexmap::IndexMap;
use std::rc::Rc;

// -----------------------------------------------------------------------------
// Module export shape
// -----------------------------------------------------------------------------

/// Key carrying the ES-module interop marker on a mocked export object.
pub const ES_MODULE_FLAG: &str = "__esModule";

pub type ExportRef = Rc<ExportValue>;

/// Insertion-ordered export object; `Rc` entries keep identity observable so
/// untouched exports stay shared with the real module after patching.
pub type ExportMap = IndexMap<String, ExportRef>;

#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    /// A module's export surface or a nested namespace object.
    Object(ExportMap),
    Bool(bool),
    Str(String),
    /// The neutral stand-in spliced over mocked positions.
    Passthrough,
}

impl ExportValue {
    pub fn object<I, K>(entries: I) -> ExportRef
    where
        I: IntoIterator<Item = (K, ExportRef)>,
        K: Into<String>,
    {
        Rc::new(ExportValue::Object(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn str(value: impl Into<String>) -> ExportRef {
        Rc::new(ExportValue::Str(value.into()))
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, ExportValue::Passthrough)
    }

    /// Look up a nested export by its dotted path.
    pub fn get_path(&self, path: &str) -> Option<ExportRef> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = match self {
            ExportValue::Object(map) => map.get(first)?.clone(),
            _ => return None,
        };
        for segment in segments {
            let next = match &*current {
                ExportValue::Object(map) => map.get(segment)?.clone(),
                _ => return None,
            };
            current = next;
        }
        Some(current)
    }

    /// Invoke this export as a component. Only the pass-through stand-in
    /// renders; it gives back exactly its `children` input and nothing else.
    pub fn render(&self, props: Option<&Props>) -> Option<ExportRef> {
        match self {
            ExportValue::Passthrough => props.and_then(|p| p.children.clone()),
            _ => None,
        }
    }
}

pub fn passthrough() -> ExportRef {
    Rc::new(ExportValue::Passthrough)
}

/// Props handed to a rendered component. Only `children` means anything to
/// the stand-in; it never validates, tracks, or transforms the rest.
#[derive(Debug, Default, Clone)]
pub struct Props {
    pub children: Option<ExportRef>,
}

impl Props {
    pub fn with_children(children: ExportRef) -> Self {
        Props {
            children: Some(children),
        }
    }
}
