//! Precomputed tables for the framework's `PreparedRegExpRouter`.
//!
//! The regexp router normally builds its matcher on the first request: every
//! path is tokenized into a character trie, the trie is folded into a single
//! anchored regular expression, and handlers are slotted by capture index.
//! This module performs the same construction at build time and renders the
//! result as the JavaScript literal `[matchers, relocateMap]` that the prepared
//! router's constructor accepts. At startup the application's own `get`/`post`
//! calls only have to drop handlers into the slots recorded in `relocateMap`.
//!
//! Construction rules (token order, conflict checks, child ordering) follow the
//! runtime router exactly, because the table must match what it would have
//! built. Paths it would reject surface as [`UnsupportedPath`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::routes::RouteTable;

const LABEL_REG_EXP_STR: &str = "[^/]+";
const ONLY_WILDCARD_REG_EXP_STR: &str = ".*";
const TAIL_WILDCARD_REG_EXP_STR: &str = "(?:|/.*)";
const REG_EXP_META_CHARS: &str = ".\\+*[^]$()";

static BRACE_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^}]+\}").expect("static pattern"));
static PATH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?::[^/]+)|(?:/\*$)|.").expect("static pattern"));
static PARAM_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:([^{}]+)(?:\{(.+)\})?$").expect("static pattern"));
static MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\d+)|@(\d+)|\.\*\$").expect("static pattern"));

/// A route path the prepared router cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("path `{path}` cannot be precomputed")]
pub struct UnsupportedPath {
    pub path: String,
}

impl UnsupportedPath {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

/// Trie insertion conflict. Converted to [`UnsupportedPath`] by the caller,
/// which knows the path being inserted.
#[derive(Debug)]
struct PathError;

/// `(param name, variable index)` in token order.
type ParamAssoc = Vec<(String, Option<usize>)>;
/// Param name to capture (or variable) index.
type ParamIndexMap = IndexMap<String, Option<usize>>;

/// String length as the runtime measures it (UTF-16 code units).
fn js_len(s: &str) -> usize {
    s.encode_utf16().count()
}

fn is_wildcard(key: &str) -> bool {
    key == ONLY_WILDCARD_REG_EXP_STR || key == TAIL_WILDCARD_REG_EXP_STR
}

fn is_meta_char(key: &str) -> bool {
    let mut chars = key.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if REG_EXP_META_CHARS.contains(c))
}

/// String order as the runtime compares with `<` (UTF-16 code units).
fn js_cmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Child ordering inside one trie node: literal characters, then longer
/// custom patterns, then plain labels, then wildcards.
///
/// Ties are `Equal` so the stable sort keeps insertion order, which is where
/// the runtime's insertion sort leaves them too. `sort_by` requires a total
/// order, so a tie can never report `Greater` both ways.
fn compare_key(a: &str, b: &str) -> Ordering {
    let (la, lb) = (js_len(a), js_len(b));
    if la == 1 {
        return if lb == 1 { js_cmp(a, b) } else { Ordering::Less };
    }
    if lb == 1 {
        return Ordering::Greater;
    }

    match (is_wildcard(a), is_wildcard(b)) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    if a == LABEL_REG_EXP_STR {
        return Ordering::Greater;
    }
    if b == LABEL_REG_EXP_STR {
        return Ordering::Less;
    }

    if la == lb { js_cmp(a, b) } else { lb.cmp(&la) }
}

/// `(a|b)` becomes `(?:a|b)`; any other capturing group is rejected.
fn normalize_custom_pattern(pattern: &str) -> Result<String, PathError> {
    if pattern == ".*" {
        return Err(PathError);
    }

    let mut normalized = pattern.to_string();
    if let Some(inner) = pattern.strip_prefix('(') {
        let whole_group = !inner.starts_with("?:")
            && inner
                .strip_suffix(')')
                .is_some_and(|body| !body.is_empty() && !body.contains(')'));
        if whole_group {
            normalized = format!("(?:{inner}");
        }
    }

    let has_capture = normalized
        .match_indices('(')
        .any(|(at, _)| !normalized[at + 1..].starts_with("?:"));
    if has_capture {
        return Err(PathError);
    }
    Ok(normalized)
}

/// Classify a token: `Some((name, pattern))` for parameters and wildcards,
/// `None` for a literal character.
fn token_pattern(token: &str, is_last: bool) -> Result<Option<(String, String)>, PathError> {
    match token {
        "*" if is_last => Ok(Some((String::new(), ONLY_WILDCARD_REG_EXP_STR.to_string()))),
        "*" => Ok(Some((String::new(), LABEL_REG_EXP_STR.to_string()))),
        "/*" => Ok(Some((String::new(), TAIL_WILDCARD_REG_EXP_STR.to_string()))),
        _ => {
            let Some(caps) = PARAM_TOKEN.captures(token) else {
                return Ok(None);
            };
            let name = caps[1].to_string();
            let pattern = match caps.get(2) {
                Some(custom) => normalize_custom_pattern(custom.as_str())?,
                None => LABEL_REG_EXP_STR.to_string(),
            };
            Ok(Some((name, pattern)))
        }
    }
}

#[derive(Debug, Default)]
struct Node {
    index: Option<usize>,
    var_index: Option<usize>,
    children: IndexMap<String, Node>,
}

impl Node {
    fn insert(
        &mut self,
        tokens: &[String],
        index: usize,
        params: &mut ParamAssoc,
        next_var: &mut usize,
        check_only: bool,
    ) -> Result<(), PathError> {
        let Some((token, rest)) = tokens.split_first() else {
            if self.index.is_some() {
                return Err(PathError);
            }
            if !check_only {
                self.index = Some(index);
            }
            return Ok(());
        };

        let key = match token_pattern(token, rest.is_empty())? {
            Some((name, pattern)) => {
                if !self.children.contains_key(&pattern) {
                    if self.children.keys().any(|k| !is_wildcard(k)) {
                        return Err(PathError);
                    }
                    if check_only {
                        return Ok(());
                    }
                    let mut child = Node::default();
                    if !name.is_empty() {
                        child.var_index = Some(*next_var);
                        *next_var += 1;
                    }
                    self.children.insert(pattern.clone(), child);
                }
                if !check_only && !name.is_empty() {
                    params.push((name, self.children[&pattern].var_index));
                }
                pattern
            }
            None => {
                if !self.children.contains_key(token) {
                    if self
                        .children
                        .keys()
                        .any(|k| js_len(k) > 1 && !is_wildcard(k))
                    {
                        return Err(PathError);
                    }
                    if check_only {
                        return Ok(());
                    }
                    self.children.insert(token.clone(), Node::default());
                }
                token.clone()
            }
        };

        match self.children.get_mut(&key) {
            Some(child) => child.insert(rest, index, params, next_var, check_only),
            None => Err(PathError),
        }
    }

    fn build_regexp_str(&self) -> String {
        let mut keys: Vec<&String> = self.children.keys().collect();
        keys.sort_by(|a, b| compare_key(a, b));

        let mut parts = Vec::with_capacity(keys.len() + 1);
        if let Some(index) = self.index {
            parts.push(format!("#{index}"));
        }
        for key in keys {
            let child = &self.children[key];
            let head = match child.var_index {
                Some(var) => format!("({key})@{var}"),
                None if is_meta_char(key) => format!("\\{key}"),
                None => key.clone(),
            };
            parts.push(head + &child.build_regexp_str());
        }

        match parts.len() {
            0 => String::new(),
            1 => parts.remove(0),
            _ => format!("(?:{})", parts.join("|")),
        }
    }
}

#[derive(Debug, Default)]
struct Trie {
    next_var: usize,
    root: Node,
}

/// Folded trie: anchored pattern, capture index to handler slot, variable
/// index to capture index.
struct TrieRegExp {
    pattern: String,
    handler_slots: BTreeMap<usize, usize>,
    param_captures: HashMap<usize, usize>,
}

impl Trie {
    fn insert(&mut self, path: &str, index: usize, check_only: bool) -> Result<ParamAssoc, PathError> {
        // Brace groups may contain `/`; hide them from the tokenizer.
        let mut groups: Vec<(String, String)> = Vec::new();
        let mut path = path.to_string();
        loop {
            let mut replaced = false;
            path = BRACE_GROUP
                .replace_all(&path, |caps: &Captures<'_>| {
                    let mark = format!("@\\{}", groups.len());
                    groups.push((mark.clone(), caps[0].to_string()));
                    replaced = true;
                    mark
                })
                .into_owned();
            if !replaced {
                break;
            }
        }

        let mut tokens: Vec<String> = PATH_TOKEN
            .find_iter(&path)
            .map(|m| m.as_str().to_string())
            .collect();
        for (mark, original) in groups.iter().rev() {
            if let Some(token) = tokens.iter_mut().rev().find(|t| t.contains(mark.as_str())) {
                *token = token.replacen(mark.as_str(), original, 1);
            }
        }

        let mut params = ParamAssoc::new();
        self.root
            .insert(&tokens, index, &mut params, &mut self.next_var, check_only)?;
        Ok(params)
    }

    fn build_regexp(&self) -> TrieRegExp {
        let folded = self.root.build_regexp_str();
        let mut handler_slots = BTreeMap::new();
        let mut param_captures = HashMap::new();
        if folded.is_empty() {
            return TrieRegExp {
                pattern: "^$".to_string(),
                handler_slots,
                param_captures,
            };
        }

        let mut capture = 0usize;
        let replaced = MARKERS.replace_all(&folded, |caps: &Captures<'_>| {
            if let Some(handler) = caps.get(1) {
                capture += 1;
                handler_slots.insert(capture, handler.as_str().parse().unwrap_or_default());
                "$()".to_string()
            } else if let Some(var) = caps.get(2) {
                capture += 1;
                param_captures.insert(var.as_str().parse().unwrap_or_default(), capture);
                String::new()
            } else {
                String::new()
            }
        });

        TrieRegExp {
            pattern: format!("^{replaced}"),
            handler_slots,
            param_captures,
        }
    }
}

#[derive(Debug, Clone)]
struct HandlerEntry {
    /// Handlers are identified by the path that registered them.
    handler: String,
    param_count: usize,
}

#[derive(Debug)]
struct Middleware {
    pattern: Regex,
    handlers: Vec<HandlerEntry>,
}

/// Anchored pattern a wildcard path matches other paths with.
fn wildcard_regex(path: &str) -> Result<Regex, regex::Error> {
    if path == "*" {
        return Regex::new("");
    }
    let (body, tail) = match path.strip_suffix("/*") {
        Some(body) => (body, true),
        None => (path, false),
    };

    let mut pattern = String::from("^");
    for c in body.chars() {
        // A lone brace is literal to the runtime but a repetition here.
        if REG_EXP_META_CHARS.contains(c) || c == '{' || c == '}' {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    if tail {
        pattern.push_str(TAIL_WILDCARD_REG_EXP_STR);
    }
    pattern.push('$');
    Regex::new(&pattern)
}

/// `/api/animals/:type?` expands to `/api/animals` and `/api/animals/:type`.
fn expand_optional_parameter(path: &str) -> Option<Vec<String>> {
    if !path.ends_with('?') || !path.contains(':') {
        return None;
    }

    let mut results: Vec<String> = Vec::new();
    let mut base = String::new();
    for segment in path.split('/') {
        if !segment.is_empty() && !segment.contains(':') {
            base.push('/');
            base.push_str(segment);
        } else if segment.contains(':') {
            if segment.contains('?') {
                if results.is_empty() && base.is_empty() {
                    results.push("/".to_string());
                } else {
                    results.push(base.clone());
                }
                base.push('/');
                base.push_str(&segment.replacen('?', "", 1));
                results.push(base.clone());
            } else {
                base.push('/');
                base.push_str(segment);
            }
        }
    }

    let mut unique: Vec<String> = Vec::with_capacity(results.len());
    for path in results {
        if !unique.contains(&path) {
            unique.push(path);
        }
    }
    Some(unique)
}

/// Route registrations for the wildcard method, collected before building.
#[derive(Debug, Default)]
struct RegExpTable {
    middleware: IndexMap<String, Middleware>,
    routes: IndexMap<String, Vec<HandlerEntry>>,
}

impl RegExpTable {
    /// Handlers of the longest middleware pattern matching `path`.
    fn inherited_middleware(&self, path: &str) -> Vec<HandlerEntry> {
        let mut keys: Vec<&String> = self.middleware.keys().collect();
        keys.sort_by_key(|k| std::cmp::Reverse(js_len(k)));
        keys.into_iter()
            .map(|k| &self.middleware[k])
            .find(|m| m.pattern.is_match(path))
            .map(|m| m.handlers.clone())
            .unwrap_or_default()
    }

    fn add(&mut self, path: &str, handler: &str) -> Result<(), UnsupportedPath> {
        let path = if path == "/*" { "*" } else { path };
        let param_count = path.matches("/:").count();

        if path.ends_with('*') {
            let pattern = wildcard_regex(path).map_err(|_| UnsupportedPath::new(path))?;
            if !self.middleware.contains_key(path) {
                let handlers = self.inherited_middleware(path);
                self.middleware.insert(
                    path.to_string(),
                    Middleware {
                        pattern: pattern.clone(),
                        handlers,
                    },
                );
            }

            let entry = HandlerEntry {
                handler: handler.to_string(),
                param_count,
            };
            for (other, middleware) in self.middleware.iter_mut() {
                if pattern.is_match(other) {
                    middleware.handlers.push(entry.clone());
                }
            }
            for (other, handlers) in self.routes.iter_mut() {
                if pattern.is_match(other) {
                    handlers.push(entry.clone());
                }
            }
            return Ok(());
        }

        let paths = expand_optional_parameter(path).unwrap_or_else(|| vec![path.to_string()]);
        let len = paths.len();
        for (i, expanded) in paths.into_iter().enumerate() {
            if !self.routes.contains_key(&expanded) {
                let inherited = self.inherited_middleware(&expanded);
                self.routes.insert(expanded.clone(), inherited);
            }
            if let Some(handlers) = self.routes.get_mut(&expanded) {
                handlers.push(HandlerEntry {
                    handler: handler.to_string(),
                    param_count: (param_count + i + 1).saturating_sub(len),
                });
            }
        }
        Ok(())
    }

    fn build(self) -> Result<Matcher, UnsupportedPath> {
        let mut registrations: Vec<(bool, String, Vec<HandlerEntry>)> = self
            .middleware
            .into_iter()
            .map(|(path, m)| (path, m.handlers))
            .chain(self.routes)
            .map(|(path, handlers)| {
                let is_static = !(path.contains('*') || path.contains("/:"));
                (is_static, path, handlers)
            })
            .collect();
        if registrations.is_empty() {
            return Ok(Matcher::never());
        }

        // Dynamic paths first, shortest first; static paths last, only checked
        // for conflicts. Ties keep registration order.
        registrations.sort_by(|(a_static, a, _), (b_static, b, _)| match (*a_static, *b_static) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => js_len(a).cmp(&js_len(b)),
        });

        let mut trie = Trie::default();
        let mut handler_data: Vec<Vec<(String, ParamIndexMap)>> = Vec::new();
        let mut static_map: IndexMap<String, Vec<String>> = IndexMap::new();

        for (is_static, path, handlers) in registrations {
            if is_static {
                static_map.insert(
                    path.clone(),
                    handlers.iter().map(|h| h.handler.clone()).collect(),
                );
            }

            let assoc = trie
                .insert(&path, handler_data.len(), is_static)
                .map_err(|_| UnsupportedPath::new(&path))?;
            if is_static {
                continue;
            }

            let mut slot = Vec::with_capacity(handlers.len());
            for entry in handlers {
                let mut map = ParamIndexMap::new();
                for k in (0..entry.param_count).rev() {
                    let (name, var) = assoc.get(k).ok_or_else(|| UnsupportedPath::new(&path))?;
                    map.insert(name.clone(), *var);
                }
                slot.push((entry.handler, map));
            }
            handler_data.push(slot);
        }

        let folded = trie.build_regexp();
        let mut handlers = BTreeMap::new();
        for (capture, data_index) in &folded.handler_slots {
            let Some(slot) = handler_data.get(*data_index) else {
                continue;
            };
            let slot = slot
                .iter()
                .map(|(handler, map)| {
                    let map = map
                        .iter()
                        .map(|(name, var)| {
                            let capture = var.and_then(|v| folded.param_captures.get(&v).copied());
                            (name.clone(), capture)
                        })
                        .collect();
                    (handler.clone(), map)
                })
                .collect();
            handlers.insert(*capture, slot);
        }

        Ok(Matcher {
            pattern: folded.pattern,
            handlers,
            static_map,
        })
    }
}

/// One built matcher: pattern, handler slots by capture index, static paths.
#[derive(Debug)]
struct Matcher {
    pattern: String,
    handlers: BTreeMap<usize, Vec<(String, ParamIndexMap)>>,
    static_map: IndexMap<String, Vec<String>>,
}

impl Matcher {
    fn never() -> Self {
        Self {
            pattern: "^$".to_string(),
            handlers: BTreeMap::new(),
            static_map: IndexMap::new(),
        }
    }

    /// `[/pattern/, slots, staticMap]` with every handler list emptied.
    fn render(&self) -> String {
        let slot_count = self.handlers.keys().next_back().map_or(0, |last| last + 1);
        let slots: Vec<&str> = (0..slot_count)
            .map(|i| if self.handlers.contains_key(&i) { "[]" } else { "0" })
            .collect();
        let statics: Vec<String> = self
            .static_map
            .keys()
            .map(|path| format!("{}:[[],[]]", json_string(path)))
            .collect();

        format!(
            "[{},[{}],{{{}}}]",
            regex_literal(&self.pattern),
            slots.join(","),
            statics.join(",")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Index(usize),
    /// Static path holding the handler; empty for the path itself.
    Static(String),
}

#[derive(Debug, Default)]
struct Relocation {
    slots: Vec<Slot>,
    params: Option<ParamIndexMap>,
}

/// Where each registered path's handler has to be placed at startup.
fn relocation_map(paths: &[&str], matcher: &Matcher) -> IndexMap<String, Relocation> {
    let mut relocations: IndexMap<String, Relocation> = IndexMap::new();

    for &path in paths {
        if path == "/*" || path == "*" {
            continue;
        }

        for (capture, slot) in &matcher.handlers {
            for (handler, map) in slot {
                if handler != path {
                    continue;
                }
                let entry = relocations.entry(path.to_string()).or_default();
                let index = Slot::Index(*capture);
                if !entry.slots.contains(&index) {
                    entry.slots.push(index);
                }
                let params = entry.params.get_or_insert_with(ParamIndexMap::new);
                for (name, capture) in map {
                    params.insert(name.clone(), *capture);
                }
            }
        }

        for (static_path, handlers) in &matcher.static_map {
            if !handlers.iter().any(|h| h == path) {
                continue;
            }
            let entry = relocations.entry(path.to_string()).or_default();
            let value = if static_path == path {
                String::new()
            } else {
                static_path.clone()
            };
            let slot = Slot::Static(value);
            if !entry.slots.contains(&slot) {
                entry.slots.push(slot);
            }
        }
    }

    relocations
}

fn render_relocations(relocations: &IndexMap<String, Relocation>) -> String {
    let entries: Vec<String> = relocations
        .iter()
        .map(|(path, relocation)| {
            let slots: Vec<String> = relocation
                .slots
                .iter()
                .map(|slot| match slot {
                    Slot::Index(i) => i.to_string(),
                    Slot::Static(path) => json_string(path),
                })
                .collect();
            let body = match &relocation.params {
                Some(params) => format!("[[{}],{}]", slots.join(","), render_params(params)),
                None => format!("[[{}]]", slots.join(",")),
            };
            format!("{}:[{body}]", json_string(path))
        })
        .collect();
    format!("{{{}}}", entries.join(","))
}

/// Unresolved indices are omitted, as `JSON.stringify` drops `undefined`.
fn render_params(params: &ParamIndexMap) -> String {
    let fields: Vec<String> = params
        .iter()
        .filter_map(|(name, capture)| capture.map(|c| format!("{}:{c}", json_string(name))))
        .collect();
    format!("{{{}}}", fields.join(","))
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Render a pattern as a regex literal, escaping `/` outside character classes.
fn regex_literal(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('/');
    let mut escaped = false;
    let mut in_class = false;
    for c in pattern.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '[' => {
                in_class = true;
                out.push(c);
            }
            ']' => {
                in_class = false;
                out.push(c);
            }
            '/' if !in_class => out.push_str("\\/"),
            _ => out.push(c),
        }
    }
    out.push('/');
    out
}

/// Serialize the route table into prepared-router constructor arguments.
///
/// Only distinct paths matter: the method is attached at startup when the
/// application registers its handlers. Fails if any path is outside what the
/// regexp router can express (conflicting parameters at one position, a
/// capturing group in a custom pattern, a named `.*` capture).
pub fn serialize_routes(routes: &RouteTable) -> Result<String, UnsupportedPath> {
    let paths = routes.distinct_paths();

    let mut table = RegExpTable::default();
    for path in &paths {
        table.add(path, path)?;
    }
    let matcher = table.build()?;
    let relocations = relocation_map(&paths, &matcher);

    Ok(format!(
        "[{{\"ALL\":{}}},{}]",
        matcher.render(),
        render_relocations(&relocations)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::RouteEntry;

    fn table(routes: &[(&str, &str)]) -> RouteTable {
        routes
            .iter()
            .map(|(method, path)| RouteEntry::new(*method, *path))
            .collect()
    }

    #[test]
    fn test_static_and_param_routes() {
        let routes = table(&[("GET", "/"), ("GET", "/posts/:id")]);
        let serialized = serialize_routes(&routes).unwrap();
        insta::assert_snapshot!(serialized, @r#"[{"ALL":[/^\/posts\/([^/]+)$()/,[0,0,[]],{"/":[[],[]]}]},{"/":[[""]],"/posts/:id":[[2],{"id":1}]}]"#);
    }

    #[test]
    fn test_wildcard_middleware_is_folded_in() {
        let routes = table(&[("ALL", "/*"), ("GET", "/"), ("GET", "/api/:id")]);
        let serialized = serialize_routes(&routes).unwrap();
        insta::assert_snapshot!(serialized, @r#"[{"ALL":[/^(?:\/api\/([^/]+)$()|.*$())/,[0,0,[],[]],{"/":[[],[]]}]},{"/":[[""]],"/api/:id":[[2],{"id":1}]}]"#);
    }

    #[test]
    fn test_empty_table_never_matches() {
        let serialized = serialize_routes(&RouteTable::default()).unwrap();
        assert_eq!(serialized, r#"[{"ALL":[/^$/,[],{}]},{}]"#);
    }

    #[test]
    fn test_capturing_alternation_is_unsupported() {
        let routes = table(&[("GET", "/files/:name{(a|b)c}")]);
        let err = serialize_routes(&routes).unwrap_err();
        assert_eq!(err.path, "/files/:name{(a|b)c}");
    }

    #[test]
    fn test_whole_alternation_is_made_non_capturing() {
        let routes = table(&[("GET", "/files/:kind{(png|jpg)}")]);
        let serialized = serialize_routes(&routes).unwrap();
        assert!(serialized.contains("((?:png|jpg))"));
    }

    #[test]
    fn test_named_catch_all_is_unsupported() {
        let routes = table(&[("GET", "/files/:rest{.*}")]);
        assert!(serialize_routes(&routes).is_err());
    }

    #[test]
    fn test_ambiguous_params_are_unsupported() {
        let routes = table(&[("GET", "/:user/entries"), ("GET", "/entry/:name")]);
        let err = serialize_routes(&routes).unwrap_err();
        assert_eq!(err.path, "/:user/entries");
    }

    #[test]
    fn test_optional_parameter_expands() {
        assert_eq!(
            expand_optional_parameter("/api/animals/:type?"),
            Some(vec!["/api/animals".to_string(), "/api/animals/:type".to_string()])
        );
        assert_eq!(
            expand_optional_parameter("/:id?"),
            Some(vec!["/".to_string(), "/:id".to_string()])
        );
        assert_eq!(expand_optional_parameter("/api/animals"), None);
    }

    #[test]
    fn test_optional_parameter_relocates_to_every_slot() {
        let routes = table(&[("GET", "/api/:type?")]);
        let serialized = serialize_routes(&routes).unwrap();
        assert!(serialized.contains(r#""/api/:type?":[[2,"/api"],{"type":1}]"#));
    }

    #[test]
    fn test_compare_key_order() {
        let mut keys = vec![TAIL_WILDCARD_REG_EXP_STR, LABEL_REG_EXP_STR, "\\d+", "b", "a"];
        keys.sort_by(|a, b| compare_key(a, b));
        assert_eq!(keys, vec!["a", "b", "\\d+", LABEL_REG_EXP_STR, TAIL_WILDCARD_REG_EXP_STR]);
    }

    #[test]
    fn test_compare_key_ties_keep_insertion_order() {
        let mut keys = vec![TAIL_WILDCARD_REG_EXP_STR, ONLY_WILDCARD_REG_EXP_STR];
        keys.sort_by(|a, b| compare_key(a, b));
        assert_eq!(keys, vec![TAIL_WILDCARD_REG_EXP_STR, ONLY_WILDCARD_REG_EXP_STR]);

        let mut keys = vec![ONLY_WILDCARD_REG_EXP_STR, TAIL_WILDCARD_REG_EXP_STR];
        keys.sort_by(|a, b| compare_key(a, b));
        assert_eq!(keys, vec![ONLY_WILDCARD_REG_EXP_STR, TAIL_WILDCARD_REG_EXP_STR]);
    }

    #[test]
    fn test_compare_key_uses_utf16_order() {
        // U+FF5E precedes U+1F600 by code point but follows its surrogates.
        assert_eq!("\u{ff5e}x".cmp("\u{1f600}"), Ordering::Less);
        assert_eq!(compare_key("\u{ff5e}x", "\u{1f600}"), Ordering::Greater);
    }

    #[test]
    fn test_wildcard_regex_treats_braces_literally() {
        let pattern = wildcard_regex("/files/{id}/*").unwrap();
        assert!(pattern.is_match("/files/{id}/a.txt"));
        assert!(pattern.is_match("/files/{id}"));
        assert!(!pattern.is_match("/files/7/a.txt"));

        let exact = wildcard_regex("/a{2}*").unwrap();
        assert!(exact.is_match("/a{2}*"));
        assert!(!exact.is_match("/aa"));
    }

    #[test]
    fn test_registration_ties_keep_order() {
        let routes = table(&[("GET", "/b"), ("GET", "/a"), ("GET", "/x/:id"), ("GET", "/y/:id")]);
        let serialized = serialize_routes(&routes).unwrap();
        let b = serialized.find("\"/b\"").unwrap();
        let a = serialized.find("\"/a\"").unwrap();
        assert!(b < a);
    }

    #[test]
    fn test_regex_literal_escapes_outside_classes() {
        assert_eq!(regex_literal("^/a/([^/]+)"), r"/^\/a\/([^/]+)/");
        assert_eq!(regex_literal(r"^\/x"), r"/^\/x/");
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let routes = table(&[
            ("GET", "/"),
            ("GET", "/users/:id"),
            ("POST", "/users"),
            ("ALL", "/admin/*"),
            ("GET", "/admin/stats"),
        ]);
        let first = serialize_routes(&routes).unwrap();
        let second = serialize_routes(&routes).unwrap();
        assert_eq!(first, second);
    }
}
