//! Minimal CSS selector support.
//!
//! Only compound selectors are understood: an optional tag name (or `*`),
//! followed by any number of `#id`, `.class`, `[attr]` and `[attr=value]`
//! parts. Selector lists are comma separated. Combinators are not supported;
//! the widgets only ever need `closest()` and flat queries.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\*|[A-Za-z][A-Za-z0-9-]*)").expect("tag regex"));

static PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:#(?P<id>[\w-]+)|\.(?P<class>[\w-]+)|\[\s*(?P<attr>[\w-]+)\s*(?:=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\]\s]*))\s*)?\])"#,
    )
    .expect("selector part regex")
});

/// Errors produced when parsing a selector string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported selector syntax at `{rest}` in `{input}`")]
    Unsupported { input: String, rest: String },
}

/// An attribute condition: presence, or presence with an exact value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrMatch {
    pub name: String,
    pub value: Option<String>,
}

/// A single compound selector such as `a.tsd-anchor[name=foo]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrMatch>,
}

impl Selector {
    /// Selector matching every element with the given tag.
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            ..Self::default()
        }
    }

    /// Selector matching every element carrying `class`.
    pub fn class(class: &str) -> Self {
        Self::default().with_class(class)
    }

    /// Add a class condition.
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    /// Add an attribute condition, optionally requiring an exact value.
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: Option<&str>) -> Self {
        self.attrs.push(AttrMatch {
            name: name.to_string(),
            value: value.map(ToOwned::to_owned),
        });
        self
    }

    /// Parse a single compound selector.
    ///
    /// # Errors
    /// Returns [`SelectorError`] when the input is empty or uses syntax
    /// outside the supported subset.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut selector = Self::default();
        let mut rest = trimmed;
        if let Some(m) = TAG.find(rest) {
            if m.as_str() != "*" {
                selector.tag = Some(m.as_str().to_ascii_lowercase());
            }
            rest = &rest[m.end()..];
        }

        while !rest.is_empty() {
            let Some(caps) = PART.captures(rest) else {
                return Err(SelectorError::Unsupported {
                    input: input.to_string(),
                    rest: rest.to_string(),
                });
            };
            if let Some(id) = caps.name("id") {
                selector.id = Some(id.as_str().to_string());
            } else if let Some(class) = caps.name("class") {
                selector.classes.push(class.as_str().to_string());
            } else if let Some(attr) = caps.name("attr") {
                let value = caps
                    .name("dq")
                    .or_else(|| caps.name("sq"))
                    .or_else(|| caps.name("bare"))
                    .map(|v| v.as_str().to_string());
                selector.attrs.push(AttrMatch {
                    name: attr.as_str().to_string(),
                    value,
                });
            }
            rest = &rest[caps.get(0).map_or(rest.len(), |m| m.end())..];
        }

        Ok(selector)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(tag) = &self.tag {
            write!(f, "{tag}")?;
            wrote = true;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
            wrote = true;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
            wrote = true;
        }
        for attr in &self.attrs {
            match &attr.value {
                Some(value) => write!(f, "[{}=\"{value}\"]", attr.name)?,
                None => write!(f, "[{}]", attr.name)?,
            }
            wrote = true;
        }
        if !wrote {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// A comma separated list of compound selectors; matches if any member does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorList(pub Vec<Selector>);

impl SelectorList {
    /// Parse `a, b, c`.
    ///
    /// # Errors
    /// Returns the first member's [`SelectorError`].
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        input
            .split(',')
            .map(Selector::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Selector> {
        self.0.iter()
    }
}

impl From<Selector> for SelectorList {
    fn from(selector: Selector) -> Self {
        Self(vec![selector])
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}
