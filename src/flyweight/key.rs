//! Construction signatures and the cache keys derived from them.

use std::any::type_name;
use std::fmt;

use super::config::KeyMode;

/// A single construction argument, kept as its rendered text and type name
///
/// Both renderings are kept: `Display` for positional arguments and `Debug`
/// for keyword values, where `"1"` must stay distinct from `1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    text: String,
    repr: String,
    type_tag: &'static str,
}

impl Argument {
    /// Captures the `Display` and `Debug` forms and the type of a value
    pub fn new<A: fmt::Display + fmt::Debug>(value: A) -> Self {
        Self {
            text: value.to_string(),
            repr: format!("{:?}", value),
            type_tag: normalize_tag(type_name::<A>()),
        }
    }

    /// The `Display` rendering of the argument
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The `Debug` rendering; strings come out quoted and escaped
    pub fn repr(&self) -> &str {
        &self.repr
    }

    /// The argument's type name, with references stripped
    pub fn type_tag(&self) -> &'static str {
        self.type_tag
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// `&str`, `&&str` and `String` all describe the same text argument.
fn normalize_tag(tag: &'static str) -> &'static str {
    let tag = tag.trim_start_matches('&');
    match tag {
        "alloc::string::String" | "std::string::String" => "str",
        other => other,
    }
}

/// Positional and keyword arguments of a construction request
///
/// # Example
///
/// ```rust
/// use pattyrn::flyweight::{KeyMode, Signature};
///
/// let sig = Signature::new().arg("Spade").arg(3).kwarg("deck", 1);
/// assert_eq!(sig.key("Card", KeyMode::Display).as_str(), r#"Spade3{"deck": 1}Card"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    positional: Vec<Argument>,
    keyword: Vec<(String, Argument)>,
}

impl Signature {
    /// Creates an empty signature
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument
    pub fn arg<A: fmt::Display + fmt::Debug>(mut self, value: A) -> Self {
        self.positional.push(Argument::new(value));
        self
    }

    /// Sets a keyword argument, replacing an earlier value for the same name in place
    pub fn kwarg<A: fmt::Display + fmt::Debug>(mut self, name: impl Into<String>, value: A) -> Self {
        let name = name.into();
        let argument = Argument::new(value);
        match self.keyword.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = argument,
            None => self.keyword.push((name, argument)),
        }
        self
    }

    /// Positional arguments in call order
    pub fn positional(&self) -> &[Argument] {
        &self.positional
    }

    /// Keyword arguments in insertion order
    pub fn keyword(&self) -> &[(String, Argument)] {
        &self.keyword
    }

    /// Looks up a positional argument by index
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.positional.get(index)
    }

    /// Looks up a keyword argument by name
    pub fn get_kwarg(&self, name: &str) -> Option<&Argument> {
        self.keyword
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, arg)| arg)
    }

    /// Total number of arguments
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    /// Checks if the signature has no arguments
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Derives the cache key for this signature within a constructor family
    pub fn key(&self, family: &str, mode: KeyMode) -> CacheKey {
        match mode {
            KeyMode::Display => self.display_key(family),
            KeyMode::Tagged => self.tagged_key(family),
        }
    }

    // Positional arguments are joined bare; the keyword mapping quotes
    // names and string values so its boundaries cannot be forged.
    fn display_key(&self, family: &str) -> CacheKey {
        let mut key: String = self.positional.iter().map(Argument::as_str).collect();

        key.push('{');
        let kwargs: Vec<String> = self
            .keyword
            .iter()
            .map(|(name, arg)| format!("{:?}: {}", name, arg.repr))
            .collect();
        key.push_str(&kwargs.join(", "));
        key.push('}');

        key.push_str(family);
        CacheKey(key)
    }

    fn tagged_key(&self, family: &str) -> CacheKey {
        let mut key = String::new();
        push_field(&mut key, family);

        for arg in &self.positional {
            key.push('a');
            push_argument(&mut key, arg);
        }

        let mut keyword: Vec<&(String, Argument)> = self.keyword.iter().collect();
        keyword.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, arg) in keyword {
            key.push('k');
            push_field(&mut key, name);
            push_argument(&mut key, arg);
        }

        CacheKey(key)
    }
}

fn push_field(out: &mut String, field: &str) {
    out.push_str(&field.len().to_string());
    out.push(':');
    out.push_str(field);
}

fn push_argument(out: &mut String, arg: &Argument) {
    push_field(out, arg.type_tag);
    push_field(out, &arg.text);
}

/// Key under which a flyweight instance is pooled
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps a caller-supplied key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}
