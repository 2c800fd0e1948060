//! Generated stand-in for the framework entry module.

use crate::framework::HONO_BASE_FILE;
use crate::router::RouterChoice;

const REG_EXP_ROUTER: &str = "./router/reg-exp-router/index.js";
const TRIE_ROUTER: &str = "./router/trie-router/index.js";

/// Source of a replacement `hono` entry module whose `Hono` class installs
/// `choice` instead of the framework's runtime router selection.
///
/// Imports are relative to the framework's `dist/` directory.
pub fn router_module(choice: &RouterChoice) -> String {
    let (import, construct) = match choice {
        RouterChoice::Prepared(params) => (
            format!("import {{ PreparedRegExpRouter }} from \"{REG_EXP_ROUTER}\";"),
            format!("new PreparedRegExpRouter(...{params})"),
        ),
        RouterChoice::RegExpBased => (
            format!("import {{ RegExpRouter }} from \"{REG_EXP_ROUTER}\";"),
            "new RegExpRouter()".to_string(),
        ),
        RouterChoice::TrieBased => (
            format!("import {{ TrieRouter }} from \"{TRIE_ROUTER}\";"),
            "new TrieRouter()".to_string(),
        ),
    };

    format!(
        r#"import {{ HonoBase }} from "./{HONO_BASE_FILE}";
{import}

class Hono extends HonoBase {{
  constructor(options = {{}}) {{
    super(options);
    this.router = options.router ?? {construct};
  }}
}}

export {{ Hono }};
"#
    )
}
