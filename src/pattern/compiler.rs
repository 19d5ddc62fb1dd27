//! Route pattern compilation.
//!
//! A route pattern is split on `/` and every non-empty segment is turned into
//! a regex fragment:
//!
//! | Segment        | Compiles to                                         |
//! |----------------|-----------------------------------------------------|
//! | `users`        | `/users`, every non-alphanumeric character escaped  |
//! | `:name`        | `/(helper)` where `helper` comes from the registry  |
//! | `:name?`       | `(/helper)?`, the trailing modifier applies to the group |
//! | `{name:regex}` | `/(regex)`; `{name}` uses `name` itself as the regex |
//! | `*` (first)    | matches every path, nothing captured                |
//! | `*` (later)    | `(?:/.*)?`, any trailing content, nothing captured  |
//!
//! The assembled expression is anchored at both ends and tolerates a single
//! trailing `/`.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use super::helpers::HelperRegistry;
use super::ParamVec;
use crate::error::PatternError;

/// Synthetic capture group names are `__vi0`, `__vi1`, ... so fragments that
/// carry their own groups cannot shift parameter positions.
const GROUP_PREFIX: &str = "__vi";

#[derive(Debug, Clone)]
enum Matcher {
    /// Whole-path wildcard (`/*`)
    Any,
    Regex(Regex),
}

#[derive(Debug, Clone)]
struct ParamSlot {
    name: Arc<str>,
    group: usize,
}

/// A route pattern compiled into a matcher plus its ordered parameter names.
///
/// Immutable once built; identical pattern text always compiles to an
/// equivalent value, which is what makes caching by pattern text sound.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    matcher: Matcher,
    params: Vec<ParamSlot>,
}

impl CompiledPattern {
    fn any(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            matcher: Matcher::Any,
            params: Vec::new(),
        }
    }

    /// The pattern text this was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// True for the `/*` whole-path wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self.matcher, Matcher::Any)
    }

    /// Source of the generated regex, `None` for the wildcard.
    #[must_use]
    pub fn regex_source(&self) -> Option<&str> {
        match &self.matcher {
            Matcher::Any => None,
            Matcher::Regex(re) => Some(re.as_str()),
        }
    }

    /// Parameter names in the order their segments appear.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|slot| slot.name.as_ref())
    }

    /// Run the matcher against `url`.
    ///
    /// Returns `None` when the URL does not match. Captured values lose one
    /// leading `/` (left over from optional groups); captures that are empty
    /// are not reported at all.
    #[must_use]
    pub fn captures(&self, url: &str) -> Option<ParamVec> {
        let re = match &self.matcher {
            Matcher::Any => return Some(ParamVec::new()),
            Matcher::Regex(re) => re,
        };
        let caps = re.captures(url)?;

        let mut params = ParamVec::new();
        for slot in &self.params {
            let Some(found) = caps.get(slot.group) else {
                continue;
            };
            let value = found.as_str();
            let value = value.strip_prefix('/').unwrap_or(value);
            if value.is_empty() {
                continue;
            }
            params.push((Arc::clone(&slot.name), value.to_string()));
        }
        Some(params)
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            Matcher::Any => write!(f, "{} => *", self.pattern),
            Matcher::Regex(re) => write!(f, "{} => {}", self.pattern, re.as_str()),
        }
    }
}

/// One parsed `/`-delimited segment.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'p> {
    Literal(&'p str),
    Wildcard,
    /// `{name:regex}` or `{name}`
    Explicit { name: &'p str, regex: &'p str },
    /// `:name`, optionally followed by a modifier character
    Helper { name: &'p str, modifier: Option<char> },
}

fn is_modifier(c: char) -> bool {
    !(c.is_alphanumeric() || c == '_' || c == '{' || c == '}')
}

fn parse_segment(segment: &str) -> Result<Segment<'_>, PatternError> {
    let mut chars = segment.chars();
    let (Some(first), rest) = (chars.next(), chars.as_str()) else {
        return Ok(Segment::Literal(segment));
    };

    if rest.is_empty() {
        // Lone meta characters are plain text, except the wildcard.
        return Ok(if first == '*' {
            Segment::Wildcard
        } else {
            Segment::Literal(segment)
        });
    }

    match first {
        '{' => {
            let inner = rest
                .strip_suffix('}')
                .ok_or_else(|| PatternError::UnbalancedBrace {
                    segment: segment.to_string(),
                })?;
            let (name, regex) = match inner.split_once(':') {
                Some((name, regex)) => (name, Some(regex)),
                None => (inner, None),
            };
            if name.is_empty() {
                return Err(PatternError::EmptyParamName {
                    segment: segment.to_string(),
                });
            }
            match regex {
                Some("") => Err(PatternError::EmptyRegex {
                    segment: segment.to_string(),
                }),
                Some(regex) => Ok(Segment::Explicit { name, regex }),
                None => Ok(Segment::Explicit { name, regex: name }),
            }
        }
        ':' => {
            let (name, modifier) = match rest.chars().last() {
                Some(last) if is_modifier(last) => {
                    (&rest[..rest.len() - last.len_utf8()], Some(last))
                }
                _ => (rest, None),
            };
            if name.is_empty() {
                return Err(PatternError::EmptyParamName {
                    segment: segment.to_string(),
                });
            }
            Ok(Segment::Helper { name, modifier })
        }
        _ if segment.ends_with('}') => Err(PatternError::UnbalancedBrace {
            segment: segment.to_string(),
        }),
        _ => Ok(Segment::Literal(segment)),
    }
}

/// Escape every non-alphanumeric character so it only ever matches itself.
pub(crate) fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut buf = [0u8; 4];
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.push(c);
        } else {
            out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        }
    }
    out
}

/// Compiles route patterns against a [`HelperRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct PatternCompiler<'h> {
    helpers: &'h HelperRegistry,
}

impl<'h> PatternCompiler<'h> {
    /// Compiler reading `:name` fragments from `helpers`.
    #[must_use]
    pub fn new(helpers: &'h HelperRegistry) -> Self {
        Self { helpers }
    }

    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for an empty pattern, unbalanced braces, an
    /// empty parameter name or explicit regex, or an expression the regex
    /// engine rejects.
    pub fn compile(&self, pattern: &str) -> Result<CompiledPattern, PatternError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut source = String::with_capacity(trimmed.len() * 2 + 8);
        source.push('^');
        let mut names: Vec<Arc<str>> = Vec::new();

        let segments = trimmed.split('/').filter(|s| !s.is_empty());
        for (position, segment) in segments.enumerate() {
            match parse_segment(segment)? {
                Segment::Wildcard if position == 0 => {
                    debug!(pattern = trimmed, "Compiled whole-path wildcard");
                    return Ok(CompiledPattern::any(trimmed));
                }
                Segment::Wildcard => source.push_str("(?:/.*)?"),
                Segment::Literal(text) => {
                    source.push('/');
                    source.push_str(&escape_literal(text));
                }
                Segment::Explicit { name, regex } => {
                    source.push_str("/(?P<");
                    source.push_str(&group_name(names.len()));
                    source.push('>');
                    source.push_str(regex);
                    source.push(')');
                    names.push(Arc::from(name));
                }
                Segment::Helper { name, modifier } => {
                    let fragment = self.helpers.resolve(name);
                    let group = group_name(names.len());
                    match modifier {
                        // The separator goes inside the group so an optional
                        // segment consumes it together with its content.
                        Some(modifier) => {
                            source.push_str("(?P<");
                            source.push_str(&group);
                            source.push_str(">/(?:");
                            source.push_str(&fragment);
                            source.push_str("))");
                            source.push(modifier);
                        }
                        None => {
                            source.push_str("/(?P<");
                            source.push_str(&group);
                            source.push_str(">(?:");
                            source.push_str(&fragment);
                            source.push_str("))");
                        }
                    }
                    names.push(Arc::from(name));
                }
            }
        }
        source.push_str("/?$");

        let regex = Regex::new(&source).map_err(|source| PatternError::InvalidRegex {
            pattern: trimmed.to_string(),
            source,
        })?;

        let params = names
            .into_iter()
            .enumerate()
            .filter_map(|(i, name)| {
                let group = group_name(i);
                regex
                    .capture_names()
                    .position(|n| n == Some(group.as_str()))
                    .map(|group| ParamSlot { name, group })
            })
            .collect::<Vec<_>>();

        debug!(
            pattern = trimmed,
            regex = %regex.as_str(),
            params = params.len(),
            "Compiled route pattern"
        );

        Ok(CompiledPattern {
            pattern: trimmed.to_string(),
            matcher: Matcher::Regex(regex),
            params,
        })
    }
}

fn group_name(index: usize) -> String {
    format!("{GROUP_PREFIX}{index}")
}
