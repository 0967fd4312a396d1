//! Attack-signature matchers: SQL injection, XSS, traversal, file inclusion,
//! command injection.
//!
//! Pattern tables live in [`RuleTable`] (serde-loadable, versioned) and are
//! compiled once into an immutable [`SignatureRules`]. Matching is
//! case-insensitive and runs over the raw URL and over one round of percent
//! decoding; per family the larger total wins, so a payload visible in both
//! forms is counted once.

use super::url_parts::{percent_decode_once, UrlParts};
use crate::error::{EngineError, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Version tag of the built-in pattern tables.
pub const RULES_VERSION: &str = "2024.1";

/// Pattern tables, one list per signature slot. Families missing from a
/// loaded file keep their built-in patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTable {
    pub version: String,
    pub sql_keyword: Vec<String>,
    pub sql_operator: Vec<String>,
    pub sql_function: Vec<String>,
    pub sql_comment: Vec<String>,
    pub sql_quote: Vec<String>,
    pub sql_equals: Vec<String>,
    pub sql_union: Vec<String>,
    pub sql_or_injection: Vec<String>,
    pub xss_keyword: Vec<String>,
    pub xss_tag: Vec<String>,
    pub xss_event_handler: Vec<String>,
    pub xss_js_protocol: Vec<String>,
    pub xss_encoded_script: Vec<String>,
    pub xss_html_entities: Vec<String>,
    pub directory_traversal: Vec<String>,
    pub file_inclusion: Vec<String>,
    pub command_injection: Vec<String>,
}

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            version: RULES_VERSION.to_string(),
            sql_keyword: patterns(&[
                r"\b(?:select|insert|update|delete|drop|union|from|where|table|into|values|exec|execute|declare|alter|create|truncate|having|join|database|information_schema|sysobjects|shutdown)\b",
            ]),
            sql_operator: patterns(&[
                r"\b(?:and|or|not|xor|like|between|rlike|regexp)\b",
                r"<>|!=|<=|>=|\|\||&&",
            ]),
            sql_function: patterns(&[
                r"\b(?:sleep|benchmark|pg_sleep|waitfor|concat|group_concat|char|chr|ascii|substring|substr|mid|length|count|version|database|user|current_user|load_file|extractvalue|updatexml|cast|convert|hex|unhex|md5|ifnull|coalesce|exec|xp_cmdshell|sp_executesql)\s*\(",
                r"\bdbms_pipe\.receive_message\b",
            ]),
            sql_comment: patterns(&[r"--(?:\s|$)", r"/\*|\*/", r#"['")]\s*#"#]),
            sql_quote: patterns(&[
                r#"['"]\s*(?:\bor\b|\band\b|\bunion\b|\bselect\b|\bhaving\b|;|--|#|/\*)"#,
                r#"['"]\s*(?:=|<|>)\s*['"]"#,
                r#"=\s*['"]\s*;"#,
            ]),
            sql_equals: patterns(&[
                r#"(?:'[^']*'|"[^"]*"|\b\d+)\s*(?:=|<>|!=)\s*(?:'[^']*'?|"[^"]*"?|\d+\b)"#,
            ]),
            sql_union: patterns(&[
                r"\bunion\b(?:\s|/\*.*?\*/)+(?:all(?:\s|/\*.*?\*/)+)?(?:distinct(?:\s|/\*.*?\*/)+)?select\b",
            ]),
            sql_or_injection: patterns(&[
                r#"\bor\b\s*(?:'[^']*'|"[^"]*"|\d+|true\b)\s*(?:=|<|>|\blike\b)"#,
                r#"['"]\s*or\s*['"]"#,
                r"\bor\s+true\b",
            ]),
            xss_keyword: patterns(&[
                r"\b(?:script|alert|prompt|confirm|eval|expression|fromcharcode|innerhtml|outerhtml|settimeout|setinterval|atob|vbscript|javascript)\b",
                r"\bdocument\s*\.\s*(?:cookie|write|domain|location)\b",
                r"\bwindow\s*\.\s*(?:location|open)\b",
            ]),
            xss_tag: patterns(&[
                r"<\s*/?\s*(?:script|img|iframe|frameset|frame|svg|object|embed|body|input|form|style|link|meta|video|audio|source|details|marquee|base|math|applet|textarea|button|a)\b",
            ]),
            xss_event_handler: patterns(&[
                r"\bon(?:error|load|unload|click|dblclick|mouse(?:over|out|down|up|move|enter|leave)|focus|blur|change|submit|reset|select|key(?:down|up|press)|input|animation(?:start|end|iteration)|transitionend|toggle|pointer(?:over|down|enter)|begin|resize|scroll|drag|drop|wheel|copy|paste|message|hashchange|pageshow|beforeunload|contextmenu)\s*=",
            ]),
            xss_js_protocol: patterns(&[
                r"(?:java|vb|live)script\s*:",
                r"data\s*:\s*text/html",
                r"data\s*:\s*image/svg\+xml",
            ]),
            xss_encoded_script: patterns(&[
                r"%3c\s*(?:%2f|/)?\s*script",
                r"&lt;\s*/?\s*script",
                r"&#0*60;?\s*/?\s*script|&#x0*3c;?\s*/?\s*script",
                r"%253c",
                r"\\x3c|\\u003c|%u003c",
            ]),
            xss_html_entities: patterns(&[
                r"&#x?[0-9a-f]{1,7};?",
                r"&(?:lt|gt|quot|apos|amp|sol|colon|lpar|rpar|tab|newline);",
            ]),
            directory_traversal: patterns(&[
                r"\.\.[/\\]",
                r"(?:%2e|\.){2}(?:%2f|%5c)",
                r"%2e%2e[/\\]",
                r"%252e%252e",
                r"%c0%ae|%c0%af|%c1%9c",
                r"\.\.;/",
            ]),
            file_inclusion: patterns(&[
                r"\b(?:php|file|zip|phar|data|expect|glob|compress\.zlib|jar|gopher|dict|ldap|tftp)://",
                r"\b(?:include|inc|require|page|file|filename|path|doc|document|folder|template|tpl|load|read|dir|lang|module|view|layout|conf|config)=\s*(?:https?://|ftp://|/|\\|\.\.|[a-z]:[\\/]|[\w.-]+\.(?:php|phtml|inc|txt|ini|conf|cfg|log|env|xml|sh)\b)",
                r"/etc/(?:passwd|shadow|hosts|group)\b",
                r"/proc/self/",
                r"\bboot\.ini\b|c:[\\/]windows",
                r"\.htaccess\b|\bwp-config\.php\b",
            ]),
            command_injection: patterns(&[r"&&|\|\||\$\(|\$\{|[;|`\n]"]),
        }
    }
}

impl RuleTable {
    /// Load a JSON rule table. Any failure is a startup configuration error.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let table: RuleTable = serde_json::from_str(&data)?;
        Ok(table)
    }
}

/// Which part of the URL a family inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Url,
    PathAndQuery,
}

/// Whether the decoded form is scanned as well as the raw one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forms {
    RawAndDecoded,
    RawOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Count,
    Presence,
}

#[derive(Debug, Clone)]
struct Matcher {
    regexes: Vec<Regex>,
    scope: Scope,
    forms: Forms,
    mode: Mode,
}

impl Matcher {
    fn compile(
        family: &'static str,
        list: &[String],
        scope: Scope,
        forms: Forms,
        mode: Mode,
    ) -> Result<Self> {
        let mut regexes = Vec::with_capacity(list.len());
        for pattern in list {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| EngineError::RuleCompile {
                    family,
                    pattern: pattern.clone(),
                    source,
                })?;
            regexes.push(regex);
        }
        Ok(Self {
            regexes,
            scope,
            forms,
            mode,
        })
    }

    fn total(&self, haystack: &str) -> u32 {
        self.regexes
            .iter()
            .map(|re| re.find_iter(haystack).count() as u32)
            .sum()
    }

    fn count(&self, input: &ScanInput) -> u32 {
        let (raw, decoded) = match self.scope {
            Scope::Url => (&input.url, &input.url_decoded),
            Scope::PathAndQuery => (&input.path_query, &input.path_query_decoded),
        };
        let mut n = self.total(raw);
        if self.forms == Forms::RawAndDecoded && decoded != raw {
            n = n.max(self.total(decoded));
        }
        match self.mode {
            Mode::Count => n,
            Mode::Presence => n.min(1),
        }
    }
}

/// Lower-cased raw and decoded views of one URL, built once per call.
#[derive(Debug, Clone)]
pub struct ScanInput {
    url: String,
    url_decoded: String,
    path_query: String,
    path_query_decoded: String,
}

impl ScanInput {
    pub fn new(url: &str, parts: &UrlParts<'_>) -> Self {
        let path_query = if parts.query.is_empty() {
            parts.path.to_string()
        } else {
            format!("{}?{}", parts.path, parts.query)
        };
        Self {
            url: url.to_lowercase(),
            url_decoded: percent_decode_once(url).to_lowercase(),
            path_query_decoded: percent_decode_once(&path_query).to_lowercase(),
            path_query: path_query.to_lowercase(),
        }
    }
}

/// Signature slot values for one URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureCounts {
    pub sql_keyword_count: u32,
    pub sql_operator_count: u32,
    pub sql_function_count: u32,
    pub sql_comment_pattern: u32,
    pub sql_quote_pattern: u32,
    pub sql_equals_pattern: u32,
    pub sql_union_pattern: u32,
    pub sql_or_injection: u32,
    pub xss_keyword_count: u32,
    pub xss_tag_count: u32,
    pub xss_event_handler: u32,
    pub xss_js_protocol: u32,
    pub xss_encoded_script: u32,
    pub xss_html_entities: u32,
    pub directory_traversal: u32,
    pub file_inclusion: u32,
    pub command_injection: u32,
}

impl SignatureCounts {
    /// True when every injection-signature slot is zero.
    pub fn is_clean(&self) -> bool {
        *self == SignatureCounts::default()
    }
}

/// Compiled, immutable signature rule set. Share it by reference or `Arc`.
#[derive(Debug, Clone)]
pub struct SignatureRules {
    version: String,
    sql_keyword: Matcher,
    sql_operator: Matcher,
    sql_function: Matcher,
    sql_comment: Matcher,
    sql_quote: Matcher,
    sql_equals: Matcher,
    sql_union: Matcher,
    sql_or_injection: Matcher,
    xss_keyword: Matcher,
    xss_tag: Matcher,
    xss_event_handler: Matcher,
    xss_js_protocol: Matcher,
    xss_encoded_script: Matcher,
    xss_html_entities: Matcher,
    directory_traversal: Matcher,
    file_inclusion: Matcher,
    command_injection: Matcher,
}

impl SignatureRules {
    pub fn compile(table: &RuleTable) -> Result<Self> {
        use Forms::*;
        use Mode::*;
        use Scope::*;

        let rules = Self {
            version: table.version.clone(),
            sql_keyword: Matcher::compile("sql_keyword", &table.sql_keyword, Url, RawAndDecoded, Count)?,
            sql_operator: Matcher::compile("sql_operator", &table.sql_operator, Url, RawAndDecoded, Count)?,
            sql_function: Matcher::compile("sql_function", &table.sql_function, Url, RawAndDecoded, Count)?,
            sql_comment: Matcher::compile("sql_comment", &table.sql_comment, Url, RawAndDecoded, Presence)?,
            sql_quote: Matcher::compile("sql_quote", &table.sql_quote, Url, RawAndDecoded, Presence)?,
            sql_equals: Matcher::compile("sql_equals", &table.sql_equals, Url, RawAndDecoded, Presence)?,
            sql_union: Matcher::compile("sql_union", &table.sql_union, Url, RawAndDecoded, Presence)?,
            sql_or_injection: Matcher::compile("sql_or_injection", &table.sql_or_injection, Url, RawAndDecoded, Presence)?,
            xss_keyword: Matcher::compile("xss_keyword", &table.xss_keyword, Url, RawAndDecoded, Count)?,
            xss_tag: Matcher::compile("xss_tag", &table.xss_tag, Url, RawAndDecoded, Count)?,
            xss_event_handler: Matcher::compile("xss_event_handler", &table.xss_event_handler, Url, RawAndDecoded, Count)?,
            xss_js_protocol: Matcher::compile("xss_js_protocol", &table.xss_js_protocol, Url, RawAndDecoded, Count)?,
            xss_encoded_script: Matcher::compile("xss_encoded_script", &table.xss_encoded_script, Url, RawOnly, Count)?,
            xss_html_entities: Matcher::compile("xss_html_entities", &table.xss_html_entities, Url, RawOnly, Count)?,
            directory_traversal: Matcher::compile("directory_traversal", &table.directory_traversal, Url, RawAndDecoded, Count)?,
            file_inclusion: Matcher::compile("file_inclusion", &table.file_inclusion, Url, RawAndDecoded, Count)?,
            command_injection: Matcher::compile("command_injection", &table.command_injection, PathAndQuery, RawAndDecoded, Count)?,
        };

        info!(
            version = %rules.version,
            patterns = rules.pattern_count(),
            "signature rules compiled"
        );
        Ok(rules)
    }

    /// Compile the built-in tables.
    pub fn builtin() -> Result<Self> {
        Self::compile(&RuleTable::default())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn matchers(&self) -> [&Matcher; 17] {
        [
            &self.sql_keyword,
            &self.sql_operator,
            &self.sql_function,
            &self.sql_comment,
            &self.sql_quote,
            &self.sql_equals,
            &self.sql_union,
            &self.sql_or_injection,
            &self.xss_keyword,
            &self.xss_tag,
            &self.xss_event_handler,
            &self.xss_js_protocol,
            &self.xss_encoded_script,
            &self.xss_html_entities,
            &self.directory_traversal,
            &self.file_inclusion,
            &self.command_injection,
        ]
    }

    /// Total number of compiled patterns across all families.
    pub fn pattern_count(&self) -> usize {
        self.matchers().iter().map(|m| m.regexes.len()).sum()
    }

    pub fn scan(&self, input: &ScanInput) -> SignatureCounts {
        let mut quote = self.sql_quote.count(input);
        if quote == 0 && (has_unbalanced_quotes(&input.url) || has_unbalanced_quotes(&input.url_decoded)) {
            quote = 1;
        }

        let counts = SignatureCounts {
            sql_keyword_count: self.sql_keyword.count(input),
            sql_operator_count: self.sql_operator.count(input),
            sql_function_count: self.sql_function.count(input),
            sql_comment_pattern: self.sql_comment.count(input),
            sql_quote_pattern: quote,
            sql_equals_pattern: self.sql_equals.count(input),
            sql_union_pattern: self.sql_union.count(input),
            sql_or_injection: self.sql_or_injection.count(input),
            xss_keyword_count: self.xss_keyword.count(input),
            xss_tag_count: self.xss_tag.count(input),
            xss_event_handler: self.xss_event_handler.count(input),
            xss_js_protocol: self.xss_js_protocol.count(input),
            xss_encoded_script: self.xss_encoded_script.count(input),
            xss_html_entities: self.xss_html_entities.count(input),
            directory_traversal: self.directory_traversal.count(input),
            file_inclusion: self.file_inclusion.count(input),
            command_injection: self.command_injection.count(input),
        };

        if !counts.is_clean() {
            debug!(?counts, "signature matched");
        }
        counts
    }
}

fn has_unbalanced_quotes(s: &str) -> bool {
    s.matches('\'').count() % 2 == 1 || s.matches('"').count() % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(url: &str) -> SignatureCounts {
        let rules = SignatureRules::builtin().unwrap();
        let parts = UrlParts::parse(url);
        rules.scan(&ScanInput::new(url, &parts))
    }

    #[test]
    fn builtin_tables_compile() {
        let rules = SignatureRules::builtin().unwrap();
        assert_eq!(rules.version(), RULES_VERSION);
        assert!(rules.pattern_count() >= 17);
    }

    #[test]
    fn bad_pattern_is_a_compile_error() {
        let table = RuleTable {
            xss_tag: vec!["<(script".to_string()],
            ..RuleTable::default()
        };
        let err = SignatureRules::compile(&table).unwrap_err();
        assert!(matches!(err, EngineError::RuleCompile { family: "xss_tag", .. }));
    }

    #[test]
    fn benign_cdn_url_is_clean() {
        assert!(scan("https://cdn.example.com/image.jpg").is_clean());
    }

    #[test]
    fn stacked_sql_query() {
        let c = scan("http://bank.com/transfer?to='; DROP TABLE users;--");
        assert!(c.sql_keyword_count >= 2);
        assert_eq!(c.sql_comment_pattern, 1);
        assert_eq!(c.sql_quote_pattern, 1);
        assert_eq!(c.command_injection, 2);
    }

    #[test]
    fn classic_or_tautology() {
        let c = scan("/login?user=admin' OR '1'='1");
        assert_eq!(c.sql_or_injection, 1);
        assert_eq!(c.sql_equals_pattern, 1);
        assert_eq!(c.sql_quote_pattern, 1);
        assert!(c.sql_operator_count >= 1);
    }

    #[test]
    fn union_select_with_comment_obfuscation() {
        assert_eq!(scan("/p?id=1 UNION/**/ALL SELECT null").sql_union_pattern, 1);
        assert_eq!(scan("/p?id=1+union+select+1").sql_union_pattern, 1);
    }

    #[test]
    fn script_tag_is_xss_not_sql() {
        let c = scan("http://attacker.com?q=<script>alert('xss')</script>");
        assert!(c.xss_keyword_count >= 1);
        assert_eq!(c.xss_tag_count, 2);
        assert_eq!(c.sql_keyword_count, 0);
        assert_eq!(c.sql_operator_count, 0);
        assert_eq!(c.sql_function_count, 0);
        assert_eq!(c.sql_comment_pattern, 0);
        assert_eq!(c.sql_quote_pattern, 0);
        assert_eq!(c.sql_equals_pattern, 0);
        assert_eq!(c.sql_union_pattern, 0);
        assert_eq!(c.sql_or_injection, 0);
    }

    #[test]
    fn encoded_payload_is_caught_once() {
        let plain = scan("/q?x=<script>");
        let encoded = scan("/q?x=%3Cscript%3E");
        assert_eq!(plain.xss_tag_count, 1);
        assert_eq!(encoded.xss_tag_count, 1);
        assert_eq!(encoded.xss_encoded_script, 1);
        assert_eq!(plain.xss_encoded_script, 0);
    }

    #[test]
    fn event_handler_and_js_protocol() {
        let c = scan("/p?x=<img src=x onerror=alert(1)>&u=JavaScript:alert(1)");
        assert_eq!(c.xss_event_handler, 1);
        assert_eq!(c.xss_js_protocol, 1);
        assert_eq!(scan("/p?one=1").xss_event_handler, 0);
    }

    #[test]
    fn html_entities() {
        let c = scan("/p?x=&lt;b&gt;&#60;&#x3c;");
        assert_eq!(c.xss_html_entities, 4);
    }

    #[test]
    fn traversal_plain_and_encoded() {
        assert_eq!(scan("/files/../../etc/passwd").directory_traversal, 2);
        assert_eq!(scan("/files/%2e%2e%2fsecret").directory_traversal, 1);
        assert_eq!(scan("/files/..\\boot.ini").directory_traversal, 1);
    }

    #[test]
    fn file_inclusion_indicators() {
        assert!(scan("/index.php?page=php://filter/resource=index").file_inclusion >= 1);
        assert!(scan("/index.php?file=../../etc/passwd").file_inclusion >= 2);
        assert_eq!(scan("/index.php?page=2").file_inclusion, 0);
    }

    #[test]
    fn command_chaining_in_path_or_query_only() {
        assert_eq!(scan("/ping?host=127.0.0.1;cat /etc/passwd").command_injection, 1);
        assert_eq!(scan("/run?c=$(whoami)").command_injection, 1);
        assert_eq!(scan("/run?c=a%26%26b").command_injection, 1);
        assert_eq!(scan("/run?c=`id`").command_injection, 2);
    }

    #[test]
    fn truncated_escape_is_literal_text() {
        let c = scan("/x?y=%E0%A4%");
        assert_eq!(c.xss_tag_count, 0);
    }

    #[test]
    fn partial_rule_file_keeps_builtin_families() {
        let table: RuleTable = serde_json::from_str(r#"{"version":"custom-1","xss_tag":["<blink"]}"#).unwrap();
        assert_eq!(table.version, "custom-1");
        assert_eq!(table.sql_keyword, RuleTable::default().sql_keyword);
        let rules = SignatureRules::compile(&table).unwrap();
        let url = "/x?<blink>";
        let c = rules.scan(&ScanInput::new(url, &UrlParts::parse(url)));
        assert_eq!(c.xss_tag_count, 1);
    }

    #[test]
    fn sql_function_calls() {
        assert_eq!(scan("/item?id=1 AND sleep(5)").sql_function_count, 1);
        assert_eq!(scan("/p?x=concat(0x7e,version())").sql_function_count, 2);
        assert_eq!(scan("/p?f=load_file('/etc/passwd')").sql_function_count, 1);
        assert_eq!(scan("/p?f=LOAD_FILE%28'x'%29").sql_function_count, 1);
        // a bare word without a call is not a function
        assert_eq!(scan("/blog/sleep-tips").sql_function_count, 0);
    }

    #[test]
    fn encoded_script_forms() {
        for url in [
            "/p?x=&lt;script&gt;",
            "/p?x=&#60;script",
            "/p?x=&#x3c;script",
            "/p?x=%253cscript%253e",
            "/p?x=\\x3cscript",
            "/p?x=\\u003cscript",
            "/p?x=%u003cscript",
        ] {
            assert_eq!(scan(url).xss_encoded_script, 1, "{url}");
        }
        assert_eq!(scan("/p?x=%3C%2Fscript%3E").xss_encoded_script, 1);
        assert_eq!(scan("/p?x=script").xss_encoded_script, 0);
    }
}
