use crate::bindings::{Binding, BindingIndex, ImportBinding, ImportForm};
use crate::host::Host;
use crate::paths::{ResolverConfig, SpecifierResolver};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, Globals, Mark, SourceMap, GLOBALS};
use swc_core::ecma::ast::*;
use swc_core::ecma::parser::{EsSyntax, Parser, StringInput, Syntax};
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::visit::{Visit, VisitWith};

// -----------------------------------------------------------------------------
// Reference records
// -----------------------------------------------------------------------------

/// Which slot of the owning module's export surface a reference roots at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Default,
    Namespace,
    Named,
}

impl From<ImportForm> for ExportKind {
    fn from(form: ImportForm) -> Self {
        match form {
            ImportForm::Default => ExportKind::Default,
            ImportForm::Namespace => ExportKind::Namespace,
            ImportForm::Named => ExportKind::Named,
        }
    }
}

/// One component reference, resolved to its owning module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceRecord {
    /// Dotted access chain rooted at the imported name, e.g. `NS.Foo.Bar`.
    pub identifier: String,
    pub kind: ExportKind,
    /// Resolved specifier of the module that exports the referenced symbol.
    pub module_path: String,
}

// -----------------------------------------------------------------------------
// Reference resolution
// -----------------------------------------------------------------------------

/// Walk one module's source and report every reference to an imported
/// component, in source order, de-duplicated by dotted identifier. Mocking
/// is best effort: parse or traversal failure yields an empty list.
pub fn resolve_references(
    source: &str,
    config: &ResolverConfig,
    search_dir: &Path,
    host: &dyn Host,
) -> Vec<ReferenceRecord> {
    let Some(mut program) = parse(source) else {
        return vec![];
    };
    GLOBALS.set(&Globals::new(), || {
        let unresolved_mark = Mark::new();
        let top_level_mark = Mark::new();
        program.mutate(&mut resolver(unresolved_mark, top_level_mark, false));

        let mut finder = ReferenceFinder {
            bindings: BindingIndex::collect(&program),
            specifiers: SpecifierResolver::new(host, config, search_dir),
            seen: HashSet::new(),
            records: vec![],
        };
        program.visit_with(&mut finder);
        finder.records
    })
}

fn parse(source: &str) -> Option<Program> {
    let cm: Lrc<SourceMap> = Default::default();
    let file = cm.new_source_file(FileName::Anon.into(), source.to_string());
    let syntax = Syntax::Es(EsSyntax {
        jsx: true,
        ..Default::default()
    });
    let mut parser = Parser::new(syntax, StringInput::from(&*file), None);
    let module = parser.parse_module().ok()?;
    if !parser.take_errors().is_empty() {
        return None;
    }
    Some(Program::Module(module))
}

/// Wrapper-result unwinding stops here.
const MAX_UNWRAP_DEPTH: usize = 8;

struct ReferenceFinder<'a> {
    bindings: BindingIndex,
    specifiers: SpecifierResolver<'a>,
    seen: HashSet<String>,
    records: Vec<ReferenceRecord>,
}

impl ReferenceFinder<'_> {
    fn push_record(&mut self, identifier: String, import: &ImportBinding) {
        // First reference under a dotted name wins, whatever module later
        // ones would resolve to.
        if !self.seen.insert(identifier.clone()) {
            return;
        }
        self.records.push(ReferenceRecord {
            identifier,
            kind: import.form.into(),
            module_path: self.specifiers.resolve(&import.source),
        });
    }

    /// Find the component argument of an HOC-like call and chase it back to
    /// an import, unwrapping locally-declared wrapper results along the way.
    fn unwrap_component_call(
        &self,
        call: &CallExpr,
        depth: usize,
        chased: &mut HashSet<Id>,
    ) -> Option<(String, ImportBinding)> {
        if depth > MAX_UNWRAP_DEPTH {
            return None;
        }
        let arg = call
            .args
            .iter()
            .filter(|arg| arg.spread.is_none())
            .map(|arg| &*arg.expr)
            .find(|expr| matches!(expr, Expr::Ident(_) | Expr::Member(_)))?;
        let root = leftmost_ident(arg)?;
        if !chased.insert(root.to_id()) {
            return None; // self-referential declaration
        }
        match self.bindings.get(&root.to_id())? {
            Binding::Import(import) => Some((dotted_expr_path(arg)?, import.clone())),
            Binding::Local { init } => {
                let inner = wrapper_call(init.as_deref()?)?;
                self.unwrap_component_call(inner, depth + 1, chased)
            }
        }
    }

    fn resolve_call(&self, call: &CallExpr) -> Option<(String, ImportBinding)> {
        // `wrap(config)(Component)` chains put the interesting call in
        // callee position; try it before the call itself.
        if let Callee::Expr(callee) = &call.callee {
            if let Expr::Call(inner) = &**callee {
                if let Some(hit) = self.unwrap_component_call(inner, 0, &mut HashSet::new()) {
                    return Some(hit);
                }
            }
        }
        self.unwrap_component_call(call, 0, &mut HashSet::new())
    }

    fn resolve_tag(&self, name: &JSXElementName) -> Option<(String, ImportBinding)> {
        match name {
            JSXElementName::JSXMemberExpr(member) => {
                let root = leftmost_jsx_ident(member);
                match self.bindings.get(&root.to_id())? {
                    Binding::Import(import) => Some((dotted_jsx_path(member), import.clone())),
                    Binding::Local { .. } => None,
                }
            }
            JSXElementName::Ident(tag) => match self.bindings.get(&tag.to_id())? {
                Binding::Import(import) => Some((tag.sym.to_string(), import.clone())),
                Binding::Local { init } => match init.as_deref()? {
                    // `const Alias = Imported;` / `const Alias = NS.Foo;`
                    init @ (Expr::Ident(_) | Expr::Member(_)) => {
                        let root = leftmost_ident(init)?;
                        match self.bindings.get(&root.to_id())? {
                            Binding::Import(import) => {
                                Some((dotted_expr_path(init)?, import.clone()))
                            }
                            Binding::Local { .. } => None,
                        }
                    }
                    // `const Wrapped = withHOC(Base);` / `const S = styled(Base)\`..\`;`
                    init @ (Expr::Call(_) | Expr::TaggedTpl(_)) => {
                        let call = wrapper_call(init)?;
                        self.unwrap_component_call(call, 0, &mut HashSet::new())
                    }
                    _ => None,
                },
            },
            // XML-style namespaced tags are not component references.
            JSXElementName::JSXNamespacedName(_) => None,
        }
    }
}

impl Visit for ReferenceFinder<'_> {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let Some((identifier, import)) = self.resolve_call(call) {
            self.push_record(identifier, &import);
        }
        call.visit_children_with(self);
    }

    fn visit_jsx_opening_element(&mut self, elem: &JSXOpeningElement) {
        if let Some((identifier, import)) = self.resolve_tag(&elem.name) {
            self.push_record(identifier, &import);
        }
        elem.visit_children_with(self);
    }
}

// -----------------------------------------------------------------------------
// Chain walking
// -----------------------------------------------------------------------------

/// The call to unwind from a wrapper-result initializer: the initializer
/// itself (or a tagged template's tag) when it is a call, stepping into the
/// callee when the callee is a call in its own right.
fn wrapper_call(init: &Expr) -> Option<&CallExpr> {
    let call = match init {
        Expr::Call(call) => call,
        Expr::TaggedTpl(tagged) => match &*tagged.tag {
            Expr::Call(call) => call,
            _ => return None,
        },
        _ => return None,
    };
    if let Callee::Expr(callee) = &call.callee {
        if let Expr::Call(inner) = &**callee {
            return Some(inner);
        }
    }
    Some(call)
}

fn leftmost_ident(expr: &Expr) -> Option<&Ident> {
    match expr {
        Expr::Ident(id) => Some(id),
        Expr::Member(member) => leftmost_ident(&member.obj),
        _ => None,
    }
}

fn dotted_expr_path(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(id) => Some(id.sym.to_string()),
        Expr::Member(member) => {
            let prop = match &member.prop {
                MemberProp::Ident(name) => &name.sym,
                // Computed and private members have no static name.
                _ => return None,
            };
            Some(format!("{}.{}", dotted_expr_path(&member.obj)?, prop))
        }
        _ => None,
    }
}

fn leftmost_jsx_ident(member: &JSXMemberExpr) -> &Ident {
    match &member.obj {
        JSXObject::Ident(root) => root,
        JSXObject::JSXMemberExpr(inner) => leftmost_jsx_ident(inner),
    }
}

fn dotted_jsx_path(member: &JSXMemberExpr) -> String {
    let base = match &member.obj {
        JSXObject::Ident(root) => root.sym.to_string(),
        JSXObject::JSXMemberExpr(inner) => dotted_jsx_path(inner),
    };
    format!("{}.{}", base, member.prop.sym)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    /// Host that resolves nothing, so specifiers come back raw.
    struct NullHost;

    impl Host for NullHost {
        fn read_source(&self, _path: &Path) -> io::Result<String> {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }

        fn resolve_specifier(&self, _specifier: &str, _from_dir: &Path) -> Option<PathBuf> {
            None
        }
    }

    fn resolve(source: &str) -> Vec<ReferenceRecord> {
        resolve_references(
            source,
            &ResolverConfig::default(),
            Path::new("/project/src"),
            &NullHost,
        )
    }

    fn record(identifier: &str, kind: ExportKind, module_path: &str) -> ReferenceRecord {
        ReferenceRecord {
            identifier: identifier.into(),
            kind,
            module_path: module_path.into(),
        }
    }

    #[test]
    fn default_import_tag_usage() {
        let records = resolve("import Foo from 'X';\nexport default () => <Foo/>;");
        assert_eq!(records, vec![record("Foo", ExportKind::Default, "X")]);
    }

    #[test]
    fn named_import_tag_usage() {
        let records = resolve("import { Button } from './ui';\nconst App = () => <Button/>;");
        assert_eq!(records, vec![record("Button", ExportKind::Named, "./ui")]);
    }

    #[test]
    fn namespace_member_tag_usage() {
        let records = resolve("import * as NS from 'X';\nconst App = () => <NS.Foo/>;");
        assert_eq!(records, vec![record("NS.Foo", ExportKind::Namespace, "X")]);
    }

    #[test]
    fn deep_namespace_member_tag_usage() {
        let records = resolve("import * as NS from 'X';\nconst App = () => <NS.Foo.Bar/>;");
        assert_eq!(records, vec![record("NS.Foo.Bar", ExportKind::Namespace, "X")]);
    }

    #[test]
    fn repeated_usage_is_deduplicated_in_source_order() {
        let records = resolve(
            "import Foo from 'X';\nimport { Bar } from 'Y';\n\
             const App = () => <div><Foo/><Bar/><Foo/></div>;",
        );
        assert_eq!(records, vec![
            record("Foo", ExportKind::Default, "X"),
            record("Bar", ExportKind::Named, "Y"),
        ]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let source = "import Foo from 'X';\nimport * as NS from 'Y';\n\
                      const App = () => <div><NS.A/><Foo/><NS.B.C/></div>;";
        assert_eq!(resolve(source), resolve(source));
    }

    #[test]
    fn local_alias_of_an_import_re_resolves() {
        let records = resolve(
            "import { Button } from './ui';\nconst B = Button;\nconst App = () => <B/>;",
        );
        assert_eq!(records, vec![record("Button", ExportKind::Named, "./ui")]);
    }

    #[test]
    fn local_alias_of_a_namespace_member_re_resolves() {
        let records =
            resolve("import * as NS from 'X';\nconst F = NS.Foo;\nconst App = () => <F/>;");
        assert_eq!(records, vec![record("NS.Foo", ExportKind::Namespace, "X")]);
    }

    #[test]
    fn hoc_wrapped_local_resolves_to_the_wrapped_import() {
        let records = resolve(
            "import Base from 'X';\nimport { withTheme } from './theme';\n\
             const Wrapped = withTheme(Base);\nconst App = () => <Wrapped/>;",
        );
        assert_eq!(records, vec![record("Base", ExportKind::Default, "X")]);
    }

    #[test]
    fn direct_hoc_call_is_a_reference_site() {
        let records =
            resolve("import Base from 'X';\nimport { withTheme } from './theme';\nwithTheme(Base);");
        assert_eq!(records, vec![record("Base", ExportKind::Default, "X")]);
    }

    #[test]
    fn chained_hoc_call_site_resolves_through_the_outer_call() {
        let records = resolve(
            "import Base from 'X';\nimport { connect } from 'store';\n\
             const mapState = (s) => s;\nexport default connect(mapState)(Base);",
        );
        assert_eq!(records, vec![record("Base", ExportKind::Default, "X")]);
    }

    #[test]
    fn tagged_template_wrapper_unwinds_to_the_component() {
        let records = resolve(
            "import styled from 'styler';\nimport Base from './base';\n\
             const Fancy = styled(Base)`color: red;`;\nconst App = () => <Fancy/>;",
        );
        assert_eq!(records, vec![record("Base", ExportKind::Default, "./base")]);
    }

    #[test]
    fn tagged_template_with_a_plain_tag_is_not_unwound() {
        // `styled.div\`..\`` has no component argument anywhere.
        let records = resolve(
            "import styled from 'styler';\nconst Box = styled.div`color: red;`;\n\
             const App = () => <Box/>;",
        );
        assert_eq!(records, vec![]);
    }

    #[test]
    fn two_layer_wrapper_chain_unwinds_to_the_import() {
        let records = resolve(
            "import Base from 'X';\nimport { memoize } from 'm';\nimport { withTheme } from 't';\n\
             const Inner = withTheme(Base);\nconst Outer = memoize(Inner);\n\
             const App = () => <Outer/>;",
        );
        assert_eq!(records, vec![record("Base", ExportKind::Default, "X")]);
    }

    #[test]
    fn member_expression_call_argument_resolves() {
        let records = resolve("import * as UI from 'X';\nregister(UI.Button);");
        assert_eq!(records, vec![record("UI.Button", ExportKind::Namespace, "X")]);
    }

    #[test]
    fn computed_member_arguments_have_no_static_path() {
        let records = resolve("import * as UI from 'X';\nconst k = 'Button';\nregister(UI[k]);");
        assert_eq!(records, vec![]);
    }

    #[test]
    fn spread_arguments_are_ignored() {
        let records = resolve("import Base from 'X';\nconst parts = [Base];\nwrap(...parts);");
        assert_eq!(records, vec![]);
    }

    #[test]
    fn shadowing_parameter_is_not_a_module_reference() {
        let records = resolve(
            "import Button from './b';\n\
             function row(Button) { return <Button/>; }\n\
             const App = () => <Button/>;",
        );
        assert_eq!(records, vec![record("Button", ExportKind::Default, "./b")]);
    }

    #[test]
    fn intrinsic_lowercase_tags_are_skipped() {
        let records = resolve("const App = () => <div><span>hi</span></div>;");
        assert_eq!(records, vec![]);
    }

    #[test]
    fn locally_declared_components_are_skipped() {
        let records = resolve(
            "const Local = () => null;\nfunction Other() { return null; }\n\
             const App = () => <div><Local/><Other/></div>;",
        );
        assert_eq!(records, vec![]);
    }

    #[test]
    fn self_referential_declarations_terminate() {
        let records = resolve("const Loop = wrap(Loop);\nconst App = () => <Loop/>;");
        assert_eq!(records, vec![]);
    }

    #[test]
    fn parse_failure_yields_no_records() {
        assert_eq!(resolve("import { from 'X';"), vec![]);
        assert_eq!(resolve("const App = () => <div>"), vec![]);
    }
}
