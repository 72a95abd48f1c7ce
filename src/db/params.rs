//! Parameter binding utilities for list-valued queries.
//!
//! [`paramify`] turns an ordered list of values into uniquely named placeholder
//! tokens plus the matching [`Bindings`], so a caller can splice the tokens into
//! a template (for example an `IN (...)` clause) and pass the bindings alongside.

use crate::models::{Bindings, SqlValue};

/// Placeholder tokens and their bound values, produced by [`paramify`].
///
/// Token `i` is `":" + prefix + i`; the matching key in [`values`](Self::values)
/// is `prefix + i`. Names are unique within one set but not across sets built
/// with the same prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSet {
    values: Bindings,
    tokens: Vec<String>,
}

impl ParamSet {
    /// Placeholder name to value map.
    pub fn values(&self) -> &Bindings {
        &self.values
    }

    /// Placeholder tokens (with the leading colon), in input order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Tokens joined by `", "`, ready to drop into an `IN (...)` clause.
    pub fn placeholder_list(&self) -> String {
        self.tokens.join(", ")
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Consume the set, returning the bindings.
    pub fn into_values(self) -> Bindings {
        self.values
    }
}

/// Bind an ordered list of values to placeholders named `prefix0`, `prefix1`, ...
///
/// # Examples
///
/// ```
/// use db_access_layer::{paramify, SqlValue};
///
/// let set = paramify(["a", "b"], "p");
/// assert_eq!(set.tokens(), [":p0", ":p1"]);
/// assert_eq!(set.values()["p1"], SqlValue::from("b"));
/// ```
pub fn paramify<I, V>(list: I, prefix: &str) -> ParamSet
where
    I: IntoIterator<Item = V>,
    V: Into<SqlValue>,
{
    let iter = list.into_iter();
    let (lower, _) = iter.size_hint();
    let mut values = Bindings::with_capacity(lower);
    let mut tokens = Vec::with_capacity(lower);

    for (index, item) in iter.enumerate() {
        let key = format!("{prefix}{index}");
        tokens.push(format!(":{key}"));
        values.insert(key, item.into());
    }

    ParamSet { values, tokens }
}
