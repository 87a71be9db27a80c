use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::error::{NodeError, NodeResult};
use super::pattern::{NodePattern, SubResult};

/// Exact string comparison against a text element.
#[derive(Clone, PartialEq, Eq)]
pub struct LiteralNode {
    text: String,
    case_insensitive: bool,
}

impl LiteralNode {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            case_insensitive: false,
        }
    }

    /// ASCII case-insensitive comparison.
    pub fn case_insensitive<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            case_insensitive: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for LiteralNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text)?;
        if self.case_insensitive {
            f.write_str("/i")?;
        }
        Ok(())
    }
}

impl<T: AsRef<str>> NodePattern<T> for LiteralNode {
    fn matches(&self, node: &T) -> bool {
        let node = node.as_ref();
        if self.case_insensitive {
            node.eq_ignore_ascii_case(&self.text)
        } else {
            node == self.text
        }
    }
}

/// Whole-element regex match over a text element.
///
/// When the expression has capture groups, a match reports the captured
/// strings as its sub-result (`Vec<Option<String>>`, group 0 first).
#[derive(Clone)]
pub struct RegexNode {
    source: String,
    regex: Regex,
}

impl RegexNode {
    pub fn new(pattern: &str) -> NodeResult<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            NodeError::InvalidRegex {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for RegexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source)
    }
}

impl<T: AsRef<str>> NodePattern<T> for RegexNode {
    fn matches(&self, node: &T) -> bool {
        self.regex.is_match(node.as_ref())
    }

    fn match_with_result(&self, node: &T) -> Option<SubResult> {
        if self.regex.captures_len() <= 1 {
            return self.matches(node).then_some(None);
        }
        let captures = self.regex.captures(node.as_ref())?;
        let groups: Vec<Option<String>> = captures
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()))
            .collect();
        Some(Some(Arc::new(groups)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_respects_case_mode() {
        assert!(LiteralNode::new("Fox").matches(&"Fox"));
        assert!(!LiteralNode::new("Fox").matches(&"fox"));
        assert!(LiteralNode::case_insensitive("Fox").matches(&"fOX"));
        assert!(LiteralNode::new("fox").matches(&String::from("fox")));
    }

    #[test]
    fn regex_matches_whole_element() {
        let node = RegexNode::new("[0-9]+").expect("regex should compile");
        assert!(node.matches(&"2024"));
        assert!(!node.matches(&"v2024"));
    }

    #[test]
    fn regex_reports_captures() {
        let node = RegexNode::new("([a-z]+)-([0-9]+)").expect("regex should compile");
        let result = node
            .match_with_result(&"item-42")
            .expect("element should match")
            .expect("captures should be reported");
        let groups = result
            .downcast_ref::<Vec<Option<String>>>()
            .expect("captures are strings");
        assert_eq!(groups[1].as_deref(), Some("item"));
        assert_eq!(groups[2].as_deref(), Some("42"));
    }

    #[test]
    fn invalid_regex_is_reported() {
        let err = RegexNode::new("(unclosed").expect_err("regex should fail");
        match err {
            NodeError::InvalidRegex { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
