use std::collections::HashMap;
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{Visit, VisitWith};

// -----------------------------------------------------------------------------
// Scope/binding index
// -----------------------------------------------------------------------------

/// How an import statement binds its local name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportForm {
    Default,
    Namespace,
    Named,
}

#[derive(Debug, Clone)]
pub struct ImportBinding {
    /// The import specifier as written in the source.
    pub source: String,
    pub form: ImportForm,
}

/// A name introduced in the analyzed module: by an import statement, or by a
/// local declaration (keeping the initializer when one exists, so wrapper
/// results can be chased back to their component argument).
#[derive(Debug, Clone)]
pub enum Binding {
    Import(ImportBinding),
    Local { init: Option<Box<Expr>> },
}

/// `Id -> Binding` over the whole program. Keys carry the syntax context
/// assigned by the resolver pass, so lookups are scope-correct: a shadowing
/// declaration and the import it shadows are distinct ids.
#[derive(Debug, Default)]
pub struct BindingIndex {
    map: HashMap<Id, Binding>,
}

impl BindingIndex {
    pub fn collect(program: &Program) -> Self {
        let mut index = BindingIndex::default();
        program.visit_with(&mut BindingCollector {
            out: &mut index.map,
        });
        index
    }

    pub fn get(&self, id: &Id) -> Option<&Binding> {
        self.map.get(id)
    }
}

struct BindingCollector<'a> {
    out: &'a mut HashMap<Id, Binding>,
}

impl Visit for BindingCollector<'_> {
    fn visit_var_declarator(&mut self, d: &VarDeclarator) {
        if let Some(name) = d.name.as_ident() {
            self.out
                .insert(name.to_id(), Binding::Local { init: d.init.clone() });
        }
        d.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.out.insert(n.ident.to_id(), Binding::Local { init: None });
        n.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.out.insert(n.ident.to_id(), Binding::Local { init: None });
        n.visit_children_with(self);
    }

    fn visit_import_decl(&mut self, n: &ImportDecl) {
        for specifier in &n.specifiers {
            let (local, form) = match specifier {
                ImportSpecifier::Named(named) => (&named.local, ImportForm::Named),
                ImportSpecifier::Default(def) => (&def.local, ImportForm::Default),
                ImportSpecifier::Namespace(ns) => (&ns.local, ImportForm::Namespace),
            };
            self.out.insert(
                local.to_id(),
                Binding::Import(ImportBinding {
                    source: n.src.value.to_string(),
                    form,
                }),
            );
        }
        n.visit_children_with(self);
    }
}
