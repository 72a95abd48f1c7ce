//! Named-placeholder query formatting.
//!
//! Templates refer to values as `:name`. [`format_query`] replaces every
//! placeholder whose name is bound with the escaped literal of its value and
//! leaves everything else untouched, so unbound names and unrelated colons
//! (casts, time literals) pass through as written.
//!
//! Escaping is a capability passed in explicitly through the [`Escaper`] trait.
//! [`MySqlEscaper`] implements the MySQL driver's literal rules.

use crate::db::observer::{QueryEvent, SharedObserver, notify};
use crate::models::{Bindings, SqlValue};
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};
use std::sync::{Arc, LazyLock};

static NAMED_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_]+)").expect("placeholder pattern is valid"));

/// Renders bound values as SQL literals.
pub trait Escaper: Send + Sync {
    fn escape(&self, value: &SqlValue) -> String;
}

/// Literal rendering compatible with MySQL's default `sql_mode`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlEscaper;

impl Escaper for MySqlEscaper {
    fn escape(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::List(items) => items
                .iter()
                .map(|item| match item {
                    SqlValue::List(_) => format!("({})", self.escape(item)),
                    _ => self.escape(item),
                })
                .collect::<Vec<_>>()
                .join(", "),
            other => escape_scalar(other),
        }
    }
}

fn escape_scalar(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::UInt(u) => u.to_string(),
        // MySQL has no literal for NaN or infinities
        SqlValue::Float(f) if !f.is_finite() => "NULL".to_string(),
        SqlValue::Float(f) => escape_float(*f),
        SqlValue::String(s) => escape_string(s),
        SqlValue::Bytes(bytes) => format!("X'{}'", hex::encode(bytes)),
        SqlValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        SqlValue::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
        SqlValue::Json(json) => escape_string(&json.to_string()),
        SqlValue::Raw(sql) => sql.clone(),
        SqlValue::List(_) => MySqlEscaper.escape(value),
    }
}

/// Plain decimal inside `1e-7..1e21`, exponent notation outside it.
fn escape_float(f: f64) -> String {
    let magnitude = f.abs();
    if f == 0.0 || (1e-7..1e21).contains(&magnitude) {
        f.to_string()
    } else {
        format!("{f:e}")
    }
}

/// Quote a string literal, backslash-escaping the characters MySQL treats specially.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Substitute bound values into `template`.
///
/// Returns the template unchanged when `bindings` is absent or empty.
///
/// # Examples
///
/// ```
/// use db_access_layer::bindings;
/// use db_access_layer::db::format::{MySqlEscaper, format_query};
///
/// let b = bindings! { "id" => 5 };
/// assert_eq!(
///     format_query("SELECT * FROM t WHERE id = :id", Some(&b), &MySqlEscaper),
///     "SELECT * FROM t WHERE id = 5"
/// );
/// assert_eq!(format_query("SELECT :missing", Some(&b), &MySqlEscaper), "SELECT :missing");
/// ```
pub fn format_query(template: &str, bindings: Option<&Bindings>, escaper: &dyn Escaper) -> String {
    let Some(bindings) = bindings.filter(|b| !b.is_empty()) else {
        return template.to_string();
    };

    NAMED_PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match bindings.get(&caps[1]) {
            Some(value) => escaper.escape(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Content hash of a query template (hex SHA-256), used to correlate executions.
pub fn query_id(template: &str) -> String {
    hex::encode(Sha256::digest(template.as_bytes()))
}

/// Per-pool formatting hook: an escaper plus the optional debug observer.
#[derive(Clone)]
pub struct QueryFormatter {
    escaper: Arc<dyn Escaper>,
    observer: Option<SharedObserver>,
}

impl std::fmt::Debug for QueryFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFormatter")
            .field("debug", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl QueryFormatter {
    pub fn new(escaper: Arc<dyn Escaper>, observer: Option<SharedObserver>) -> Self {
        Self { escaper, observer }
    }

    /// MySQL escaping with the given observer.
    pub fn mysql(observer: Option<SharedObserver>) -> Self {
        Self::new(Arc::new(MySqlEscaper), observer)
    }

    /// Format `template`, reporting the result to the observer when bindings were given.
    pub fn format(&self, template: &str, bindings: Option<&Bindings>) -> String {
        let Some(bindings) = bindings else {
            return template.to_string();
        };

        let formatted = format_query(template, Some(bindings), self.escaper.as_ref());

        if let Some(observer) = &self.observer {
            let id = query_id(template);
            notify(
                observer.as_ref(),
                &QueryEvent::Formatted {
                    sql: &formatted,
                    query_id: &id,
                },
            );
        }

        formatted
    }
}

impl Default for QueryFormatter {
    fn default() -> Self {
        Self::mysql(None)
    }
}
