//! Class member removal on packaged framework sources.
//!
//! Members are located on the syntax tree and removed by splicing out their
//! byte ranges, so the rest of the file is reproduced byte for byte. A member
//! that surviving code still refers to (`this.json`, `this.#cachedBody`, or a
//! destructured `{ bodyCache }`) is kept even if the caller asked for its
//! removal. The result is re-parsed and semantically checked before it is
//! handed out.

use std::collections::BTreeSet;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPatternKind, BindingProperty, Class, ClassElement, Declaration, Expression,
    MethodDefinitionKind, ModuleExportName, PrivateFieldExpression, PrivateInExpression, Program,
    PropertyKey, Statement, StaticMemberExpression,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser, ParserReturn};
use oxc_semantic::SemanticBuilder;
use oxc_span::{GetSpan, SourceType, Span};

/// Why a file could not be specialized. Callers treat every variant as
/// "leave the file alone".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExciseError {
    #[error("failed to parse source: {0}")]
    Parse(String),

    #[error("class `{0}` not found")]
    ClassNotFound(String),

    #[error("rewritten source is invalid: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Property,
    PrivateField,
    Accessor,
}

/// One named instance member of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMember {
    pub name: String,
    pub kind: MemberKind,
    pub span: Span,
}

/// Rewritten source and the members actually removed, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excision {
    pub code: String,
    pub removed: Vec<String>,
}

fn parse<'a>(allocator: &'a Allocator, source: &'a str) -> Result<ParserReturn<'a>, ExciseError> {
    let ret = Parser::new(allocator, source, SourceType::mjs()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(ExciseError::Parse(error.to_string()));
    }
    Ok(ret)
}

/// Name of a member key as it is accessed (`#name` for private members).
fn key_name(key: &PropertyKey) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::PrivateIdentifier(ident) => Some(format!("#{}", ident.name)),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

/// Local name a module exports as `exported`, if it does.
fn local_for_export(program: &Program, exported: &str) -> Option<String> {
    program.body.iter().find_map(|statement| match statement {
        Statement::ExportNamedDeclaration(export) if export.source.is_none() => export
            .specifiers
            .iter()
            .find(|spec| export_name(&spec.exported) == exported)
            .map(|spec| export_name(&spec.local)),
        _ => None,
    })
}

fn class_in_declaration<'p, 'a>(declaration: &'p Declaration<'a>, name: &str) -> Option<&'p Class<'a>> {
    match declaration {
        Declaration::ClassDeclaration(class) => class
            .id
            .as_ref()
            .filter(|id| id.name == name)
            .map(|_| &**class),
        Declaration::VariableDeclaration(var) => var.declarations.iter().find_map(|declarator| {
            let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind else {
                return None;
            };
            if ident.name != name {
                return None;
            }
            match &declarator.init {
                Some(Expression::ClassExpression(class)) => Some(&**class),
                _ => None,
            }
        }),
        _ => None,
    }
}

/// Top-level class bound to `name`: `class X {}`, `var X = class {}`, or
/// either form behind `export`.
fn class_by_local<'p, 'a>(program: &'p Program<'a>, name: &str) -> Option<&'p Class<'a>> {
    program.body.iter().find_map(|statement| match statement {
        Statement::ClassDeclaration(class) => class
            .id
            .as_ref()
            .filter(|id| id.name == name)
            .map(|_| &**class),
        Statement::VariableDeclaration(var) => var.declarations.iter().find_map(|declarator| {
            let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind else {
                return None;
            };
            match &declarator.init {
                Some(Expression::ClassExpression(class)) if ident.name == name => Some(&**class),
                _ => None,
            }
        }),
        Statement::ExportNamedDeclaration(export) => export
            .declaration
            .as_ref()
            .and_then(|declaration| class_in_declaration(declaration, name)),
        _ => None,
    })
}

/// Class the module exports as `exported`, following `export { Local as X }`.
pub fn find_exported_class<'p, 'a>(program: &'p Program<'a>, exported: &str) -> Option<&'p Class<'a>> {
    let local = local_for_export(program, exported).unwrap_or_else(|| exported.to_string());
    class_by_local(program, &local)
}

/// Named, non-static members of `class`. Constructors and computed keys are
/// never candidates.
pub fn collect_members(class: &Class) -> Vec<ClassMember> {
    let mut members = Vec::new();
    for element in &class.body.body {
        let (key, kind, is_static) = match element {
            ClassElement::MethodDefinition(method) => {
                let kind = match method.kind {
                    MethodDefinitionKind::Constructor => continue,
                    MethodDefinitionKind::Get | MethodDefinitionKind::Set => MemberKind::Accessor,
                    MethodDefinitionKind::Method => MemberKind::Method,
                };
                (&method.key, kind, method.r#static)
            }
            ClassElement::PropertyDefinition(prop) => (&prop.key, MemberKind::Property, prop.r#static),
            ClassElement::AccessorProperty(accessor) => {
                (&accessor.key, MemberKind::Accessor, accessor.r#static)
            }
            _ => continue,
        };
        if is_static {
            continue;
        }
        let Some(name) = key_name(key) else {
            continue;
        };
        let kind = if matches!(key, PropertyKey::PrivateIdentifier(_)) {
            MemberKind::PrivateField
        } else {
            kind
        };
        members.push(ClassMember {
            name,
            kind,
            span: element.span(),
        });
    }
    members
}

/// Member names referenced anywhere in the program outside `skip`.
struct ReferenceCollector<'s> {
    skip: &'s [Span],
    names: BTreeSet<String>,
}

impl<'a> Visit<'a> for ReferenceCollector<'_> {
    fn visit_class_element(&mut self, element: &ClassElement<'a>) {
        if self.skip.contains(&element.span()) {
            return;
        }
        walk::walk_class_element(self, element);
    }

    fn visit_static_member_expression(&mut self, expr: &StaticMemberExpression<'a>) {
        self.names.insert(expr.property.name.to_string());
        walk::walk_static_member_expression(self, expr);
    }

    fn visit_private_field_expression(&mut self, expr: &PrivateFieldExpression<'a>) {
        self.names.insert(format!("#{}", expr.field.name));
        walk::walk_private_field_expression(self, expr);
    }

    fn visit_private_in_expression(&mut self, expr: &PrivateInExpression<'a>) {
        self.names.insert(format!("#{}", expr.left.name));
        walk::walk_private_in_expression(self, expr);
    }

    fn visit_binding_property(&mut self, prop: &BindingProperty<'a>) {
        if let Some(name) = prop.key.static_name() {
            self.names.insert(name.to_string());
        }
        walk::walk_binding_property(self, prop);
    }
}

/// Parse `source` and check it the way the bundler would.
pub fn validate(source: &str) -> Result<(), ExciseError> {
    let allocator = Allocator::default();
    let ret = parse(&allocator, source).map_err(|e| ExciseError::Invalid(e.to_string()))?;
    let semantic = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .build(&ret.program);
    match semantic.errors.first() {
        Some(error) => Err(ExciseError::Invalid(error.to_string())),
        None => Ok(()),
    }
}

/// Remove the members of `class_name` listed in `names` from `source`.
pub fn excise_members(
    source: &str,
    class_name: &str,
    names: &[String],
) -> Result<Excision, ExciseError> {
    let allocator = Allocator::default();
    let ret = parse(&allocator, source)?;
    let class = find_exported_class(&ret.program, class_name)
        .ok_or_else(|| ExciseError::ClassNotFound(class_name.to_string()))?;

    let mut doomed: Vec<ClassMember> = collect_members(class)
        .into_iter()
        .filter(|member| names.contains(&member.name))
        .collect();

    // Keep whatever the remaining code still reaches, until nothing changes.
    loop {
        let skip: Vec<Span> = doomed.iter().map(|member| member.span).collect();
        let mut collector = ReferenceCollector {
            skip: &skip,
            names: BTreeSet::new(),
        };
        collector.visit_program(&ret.program);

        let before = doomed.len();
        doomed.retain(|member| !collector.names.contains(&member.name));
        if doomed.len() == before {
            break;
        }
    }

    doomed.sort_by_key(|member| member.span.start);
    let mut code = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for member in &doomed {
        let (start, end) = (member.span.start as usize, member.span.end as usize);
        if start < cursor {
            continue;
        }
        code.push_str(&source[cursor..start]);
        cursor = end;
    }
    code.push_str(&source[cursor..]);

    validate(&code)?;

    let removed = names
        .iter()
        .filter(|name| doomed.iter().any(|member| &member.name == *name))
        .cloned()
        .collect();
    Ok(Excision { code, removed })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT: &str = r#"var Context = class {
  #status = 200;
  #renderer;
  constructor(req) {
    this.req = req;
  }
  get res() {
    return this.#status;
  }
  render = (...args) => {
    this.#renderer ??= (content) => this.html(content);
    return this.#renderer(...args);
  };
  setRenderer = (renderer) => {
    this.#renderer = renderer;
  };
  json = (object) => {
    return new Response(JSON.stringify(object), { status: this.#status });
  };
  html = (html) => new Response(html);
  text = (text) => new Response(text);
};
export { Context };
"#;

    const REQUEST: &str = r#"var HonoRequest = class {
  bodyCache = {};
  constructor(request) {
    this.raw = request;
  }
  #cachedBody = (key) => {
    const { bodyCache, raw } = this;
    return bodyCache[key] ??= raw[key]();
  };
  json() {
    return this.#cachedBody("text").then((text) => JSON.parse(text));
  }
  text() {
    return this.#cachedBody("text");
  }
  header(name) {
    return this.raw.headers.get(name);
  }
};
export { HonoRequest };
"#;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn parse_members(source: &str, class_name: &str) -> Vec<(String, MemberKind)> {
        let allocator = Allocator::default();
        let ret = parse(&allocator, source).unwrap();
        let class = find_exported_class(&ret.program, class_name).unwrap();
        collect_members(class)
            .into_iter()
            .map(|m| (m.name, m.kind))
            .collect()
    }

    #[test]
    fn test_collects_member_kinds() {
        let members = parse_members(CONTEXT, "Context");
        assert!(members.contains(&("#status".to_string(), MemberKind::PrivateField)));
        assert!(members.contains(&("res".to_string(), MemberKind::Accessor)));
        assert!(members.contains(&("json".to_string(), MemberKind::Property)));
        assert!(!members.iter().any(|(name, _)| name == "constructor"));
    }

    #[test]
    fn test_finds_renamed_export() {
        let source = "var Hono = class { route() {} };\nexport { Hono as HonoBase };\n";
        let members = parse_members(source, "HonoBase");
        assert_eq!(members, vec![("route".to_string(), MemberKind::Method)]);
    }

    #[test]
    fn test_finds_class_declaration() {
        let source = "export class Base { mount() {} fire() {} }\n";
        assert_eq!(parse_members(source, "Base").len(), 2);
    }

    #[test]
    fn test_removes_requested_members() {
        let excision =
            excise_members(CONTEXT, "Context", &names(&["json", "setRenderer", "render"])).unwrap();

        assert_eq!(excision.removed, names(&["json", "setRenderer", "render"]));
        assert!(!excision.code.contains("JSON.stringify"));
        assert!(!excision.code.contains("setRenderer"));
        assert!(excision.code.contains("html = (html) => new Response(html);"));
        assert!(excision.code.contains("text = (text) => new Response(text);"));
    }

    #[test]
    fn test_keeps_members_still_referenced() {
        // `render` stays, and its default renderer calls `this.html`.
        let excision = excise_members(CONTEXT, "Context", &names(&["html", "json"])).unwrap();

        assert_eq!(excision.removed, names(&["json"]));
        assert!(excision.code.contains("html = (html)"));
    }

    #[test]
    fn test_private_helper_kept_while_a_reader_survives() {
        let excision = excise_members(
            REQUEST,
            "HonoRequest",
            &names(&["json", "bodyCache", "#cachedBody"]),
        )
        .unwrap();

        // `text()` still calls `#cachedBody`, which destructures `bodyCache`.
        assert_eq!(excision.removed, names(&["json"]));
        assert!(excision.code.contains("#cachedBody = (key)"));
        assert!(excision.code.contains("bodyCache = {};"));
    }

    #[test]
    fn test_all_readers_removed() {
        let excision = excise_members(
            REQUEST,
            "HonoRequest",
            &names(&["json", "text", "bodyCache", "#cachedBody"]),
        )
        .unwrap();

        assert_eq!(excision.removed.len(), 4);
        assert!(!excision.code.contains("#cachedBody"));
        assert!(excision.code.contains("header(name)"));
        validate(&excision.code).unwrap();
    }

    #[test]
    fn test_missing_class_is_reported() {
        let err = excise_members("export const x = 1;\n", "Context", &names(&["json"])).unwrap_err();
        assert_eq!(err, ExciseError::ClassNotFound("Context".to_string()));
    }

    #[test]
    fn test_unparseable_source_is_reported() {
        let err = excise_members("var Context = class {", "Context", &names(&["json"])).unwrap_err();
        assert!(matches!(err, ExciseError::Parse(_)));
    }

    #[test]
    fn test_nothing_to_remove_is_identity() {
        let excision = excise_members(CONTEXT, "Context", &names(&["redirect"])).unwrap();
        assert!(excision.removed.is_empty());
        assert_eq!(excision.code, CONTEXT);
    }
}
