//! Selectors
//!
//! Parser and matcher for the selector subset lazy loading needs: comma
//! lists of compound selectors (`tag`, `*`, `#id`, `.class`, `[attr]`,
//! `[attr=value]`) joined by descendant or `>` combinators.

use std::collections::HashSet;

use crate::NodeId;

/// Selector parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector `{selector}`: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

/// Read access to element data for matching
pub(crate) trait ElementSource {
    fn tag_name(&self, node: NodeId) -> Option<&str>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
}

/// Simple selector types
#[derive(Debug, Clone, PartialEq, Eq)]
enum SimpleSelector {
    /// `*`
    Universal,
    /// Tag name, stored lowercase
    Tag(String),
    Id(String),
    Class(String),
    AttrExists(String),
    AttrEquals(String, String),
}

impl SimpleSelector {
    fn matches(&self, node: NodeId, source: &impl ElementSource) -> bool {
        match self {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(tag) => source.tag_name(node).is_some_and(|t| t.eq_ignore_ascii_case(tag)),
            SimpleSelector::Id(id) => source.attribute(node, "id") == Some(id.as_str()),
            SimpleSelector::Class(class) => source
                .attribute(node, "class")
                .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class)),
            SimpleSelector::AttrExists(name) => source.attribute(node, name).is_some(),
            SimpleSelector::AttrEquals(name, value) => source.attribute(node, name) == Some(value.as_str()),
        }
    }
}

/// Compound selector (simple selectors that must all match)
#[derive(Debug, Clone, PartialEq, Eq)]
struct CompoundSelector {
    selectors: Vec<SimpleSelector>,
}

impl CompoundSelector {
    fn matches(&self, node: NodeId, source: &impl ElementSource) -> bool {
        self.selectors.iter().all(|s| s.matches(node, source))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// Compound selectors joined by combinators, matched right to left
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    compounds: Vec<CompoundSelector>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

impl ComplexSelector {
    fn matches(&self, node: NodeId, source: &impl ElementSource) -> bool {
        let mut failed = HashSet::new();
        self.matches_from(self.compounds.len() - 1, node, source, &mut failed)
    }

    /// `failed` records `(index, node)` pairs already known not to match,
    /// so each pair is tried at most once per call
    fn matches_from(
        &self,
        index: usize,
        node: NodeId,
        source: &impl ElementSource,
        failed: &mut HashSet<(usize, NodeId)>,
    ) -> bool {
        if failed.contains(&(index, node)) {
            return false;
        }
        let matched = self.compounds[index].matches(node, source)
            && (index == 0
                || match self.combinators[index - 1] {
                    Combinator::Child => source
                        .parent(node)
                        .is_some_and(|parent| self.matches_from(index - 1, parent, source, failed)),
                    Combinator::Descendant => {
                        let mut ancestor = source.parent(node);
                        let mut found = false;
                        while let Some(current) = ancestor {
                            if self.matches_from(index - 1, current, source, failed) {
                                found = true;
                                break;
                            }
                            ancestor = source.parent(current);
                        }
                        found
                    }
                });
        if !matched {
            failed.insert((index, node));
        }
        matched
    }
}

/// Parsed comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let selectors = Parser::new(text).parse_list()?;
        Ok(Self { selectors })
    }

    pub(crate) fn matches(&self, node: NodeId, source: &impl ElementSource) -> bool {
        self.selectors.iter().any(|s| s.matches(node, source))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

struct Parser<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError {
            selector: self.text.to_string(),
            reason: reason.into(),
        }
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(c) => self.error(format!("unexpected `{}`", c)),
            None => self.error("expected selector"),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Skip whitespace; true if any was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek().filter(|c| is_ident_char(*c)) {
            ident.push(c);
            self.pos += 1;
        }
        ident
    }

    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>, SelectorError> {
        let mut list = Vec::new();
        loop {
            self.skip_whitespace();
            list.push(self.parse_complex()?);
            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(list)
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(ComplexSelector { compounds, combinators })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut selectors = Vec::new();

        match self.peek() {
            Some('*') => {
                self.bump();
                selectors.push(SimpleSelector::Universal);
            }
            Some(c) if is_ident_char(c) => {
                selectors.push(SimpleSelector::Tag(self.ident().to_ascii_lowercase()));
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    let id = self.ident();
                    if id.is_empty() {
                        return Err(self.error("expected id after `#`"));
                    }
                    selectors.push(SimpleSelector::Id(id));
                }
                Some('.') => {
                    self.bump();
                    let class = self.ident();
                    if class.is_empty() {
                        return Err(self.error("expected class name after `.`"));
                    }
                    selectors.push(SimpleSelector::Class(class));
                }
                Some('[') => {
                    self.bump();
                    selectors.push(self.parse_attribute()?);
                }
                _ => break,
            }
        }

        if selectors.is_empty() {
            return Err(self.unexpected());
        }
        Ok(CompoundSelector { selectors })
    }

    fn parse_attribute(&mut self) -> Result<SimpleSelector, SelectorError> {
        self.skip_whitespace();
        let name = self.ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.error("expected attribute name"));
        }
        self.skip_whitespace();

        match self.bump() {
            Some(']') => Ok(SimpleSelector::AttrExists(name)),
            Some('=') => {
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.bump();
                        let mut value = String::new();
                        loop {
                            match self.bump() {
                                Some(c) if c == quote => break,
                                Some(c) => value.push(c),
                                None => return Err(self.error("unterminated string")),
                            }
                        }
                        value
                    }
                    _ => {
                        let value = self.ident();
                        if value.is_empty() {
                            return Err(self.error("expected attribute value"));
                        }
                        value
                    }
                };
                self.skip_whitespace();
                if self.bump() != Some(']') {
                    return Err(self.error("expected `]`"));
                }
                Ok(SimpleSelector::AttrEquals(name, value))
            }
            _ => Err(self.error("expected `]`")),
        }
    }
}
