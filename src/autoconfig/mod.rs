//! Configuration inference: turns one rendered page into a scraper config.
//!
//! The stages run in this order, each mutating the [`FieldManager`] produced
//! by the previous one:
//!
//! 1. [`indexer`] emits one [`FieldCandidate`] per visible value,
//! 2. [`squash`] merges candidates repeated across sibling items,
//! 3. [`filter`] drops rare or static groups and colors the survivors,
//! 4. [`synth`] derives the item selector and the field records.

pub mod filter;
pub mod indexer;
pub mod squash;
pub mod synth;

pub use filter::Rgb;

use crate::utils;
use itertools::Itertools;
use std::fmt;
use std::ops::{Deref, DerefMut};

const ESCAPED: [char; 7] = [':', '>', '[', ']', '/', '!', '%'];

/// One element along a [`Path`].
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub tag_name: String,
    pub classes: Vec<String>,
    pub pseudo_classes: Vec<String>,
}

impl Node {
    pub fn new<S: Into<String>>(tag_name: S) -> Self {
        Node {
            tag_name: tag_name.into(),
            ..Default::default()
        }
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pseudo_classes<I, S>(mut self, pseudo_classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pseudo_classes = pseudo_classes.into_iter().map(Into::into).collect();
        self
    }

    /// Index carried by an `nth-child(n)` pseudo-class, if any.
    pub fn nth_child(&self) -> Option<usize> {
        self.pseudo_classes.iter().find_map(|p| {
            p.strip_prefix("nth-child(")
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|n| n.trim().parse().ok())
        })
    }
}

fn same_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().sorted().eq(b.iter().sorted())
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.tag_name == other.tag_name
            && same_set(&self.classes, &other.classes)
            && same_set(&self.pseudo_classes, &other.pseudo_classes)
    }
}

impl Eq for Node {}

fn write_class(f: &mut fmt::Formatter<'_>, class: &str) -> fmt::Result {
    let mut chars = class.chars().peekable();
    if let Some(digit) = chars.next_if(char::is_ascii_digit) {
        write!(f, "\\3{} ", digit)?;
    }
    for c in chars {
        if ESCAPED.contains(&c) {
            write!(f, "\\")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag_name)?;
        for class in &self.classes {
            write!(f, ".")?;
            write_class(f, class)?;
        }
        for pseudo in &self.pseudo_classes {
            write!(f, ":{}", pseudo)?;
        }
        Ok(())
    }
}

/// Sequence of nodes from `body` down to the element owning a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(pub Vec<Node>);

impl Path {
    pub fn distance(&self, other: &Path) -> usize {
        utils::levenshtein(&self.to_string(), &other.to_string())
    }

    /// The part of the path below the first `depth` nodes.
    pub fn relative(&self, depth: usize) -> Path {
        Path(self.0.iter().skip(depth).cloned().collect())
    }
}

impl From<Vec<Node>> for Path {
    fn from(nodes: Vec<Node>) -> Self {
        Path(nodes)
    }
}

impl Deref for Path {
    type Target = Vec<Node>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Path {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(" > "))
    }
}

/// A captured value together with the emission index it was found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub value: String,
    pub index: usize,
}

/// A value location on the page, either a single emitted token or a group of
/// merged repetitions.
#[derive(Debug, Clone, Default)]
pub struct FieldCandidate {
    pub path: Path,
    /// Attribute the value is read from, empty for text content.
    pub attr: String,
    /// Position among the non-empty text children of the owning element.
    pub text_index: usize,
    pub count: usize,
    pub examples: Vec<Example>,
    pub strip_index: usize,
    pub emission_index: usize,
    pub name: String,
    pub color: Rgb,
    pub distance: f64,
}

impl FieldCandidate {
    pub fn new<A, V>(path: Path, attr: A, text_index: usize, value: V, emission_index: usize) -> Self
    where
        A: Into<String>,
        V: Into<String>,
    {
        FieldCandidate {
            path,
            attr: attr.into(),
            text_index,
            count: 1,
            examples: vec![Example {
                value: value.into(),
                index: emission_index,
            }],
            emission_index,
            ..Default::default()
        }
    }

    pub fn example_values(&self) -> impl Iterator<Item = &str> {
        self.examples.iter().map(|e| e.value.as_str())
    }
}

type CanonicalKey<'a> = (String, &'a str, usize, usize, Vec<&'a str>, &'a str, usize);

/// Ordered collection of candidates or groups for one page.
#[derive(Debug, Clone, Default)]
pub struct FieldManager(Vec<FieldCandidate>);

impl FieldManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<FieldCandidate> {
        self.0
    }

    fn canonical(&self) -> Vec<CanonicalKey<'_>> {
        self.0
            .iter()
            .map(|f| {
                (
                    f.path.to_string(),
                    f.attr.as_str(),
                    f.text_index,
                    f.count,
                    f.example_values().collect(),
                    f.name.as_str(),
                    f.strip_index,
                )
            })
            .sorted()
            .collect()
    }
}

impl PartialEq for FieldManager {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.canonical() == other.canonical()
    }
}

impl Deref for FieldManager {
    type Target = Vec<FieldCandidate>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for FieldManager {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<FieldCandidate>> for FieldManager {
    fn from(fields: Vec<FieldCandidate>) -> Self {
        FieldManager(fields)
    }
}

impl FromIterator<FieldCandidate> for FieldManager {
    fn from_iter<I: IntoIterator<Item = FieldCandidate>>(iter: I) -> Self {
        FieldManager(iter.into_iter().collect())
    }
}

impl IntoIterator for FieldManager {
    type Item = FieldCandidate;
    type IntoIter = std::vec::IntoIter<FieldCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(path: &[Node], value: &str, index: usize) -> FieldCandidate {
        FieldCandidate::new(Path(path.to_vec()), "", 0, value, index)
    }

    #[test]
    fn test_node_display_escapes_reserved_characters() {
        let node = Node::new("div").with_classes(["md:flex", "a>b", "w-[10px]", "x/y", "x!", "p%"]);
        assert_eq!(
            node.to_string(),
            r"div.md\:flex.a\>b.w-\[10px\].x\/y.x\!.p\%"
        );

        let node = Node::new("div").with_classes(["1/2"]);
        assert_eq!(node.to_string(), r"div.\31 \/2");
    }

    #[test]
    fn test_node_display_digit_class() {
        let node = Node::new("span").with_classes(["2xl"]);
        assert_eq!(node.to_string(), "span.\\32 xl");

        let node = Node::new("li")
            .with_classes(["item", "sm:block"])
            .with_pseudo_classes(["nth-child(3)"]);
        assert_eq!(node.to_string(), "li.item.sm\\:block:nth-child(3)");
    }

    #[test]
    fn test_node_display_leaves_other_characters() {
        let node = Node::new("div").with_classes(["a_b-c", "ä"]);
        assert_eq!(node.to_string(), "div.a_b-c.ä");
    }

    #[test]
    fn test_node_equality_ignores_order() {
        let a = Node::new("div")
            .with_classes(["a", "b"])
            .with_pseudo_classes(["first", "nth-child(2)"]);
        let b = Node::new("div")
            .with_classes(["b", "a"])
            .with_pseudo_classes(["nth-child(2)", "first"]);
        assert_eq!(a, b);
        assert_ne!(a, Node::new("div").with_classes(["a"]));
        assert_ne!(a, Node::new("span").with_classes(["a", "b"]));
    }

    #[test]
    fn test_nth_child() {
        let node = Node::new("li").with_pseudo_classes(["nth-child(12)"]);
        assert_eq!(node.nth_child(), Some(12));
        assert_eq!(Node::new("li").nth_child(), None);
    }

    #[test]
    fn test_path_display_and_distance() {
        let x = Path(vec![
            Node::new("body"),
            Node::new("div").with_classes(["a"]),
            Node::new("span").with_classes(["x"]),
        ]);
        let mut y = x.clone();
        y[2] = Node::new("span").with_classes(["y"]);

        assert_eq!(x.to_string(), "body > div.a > span.x");
        assert_eq!(x.distance(&y), 1);
        assert_eq!(x.relative(2).to_string(), "span.x");
        assert_eq!(x.relative(3).to_string(), "");
    }

    #[test]
    fn test_field_manager_equality() {
        let body = Node::new("body");
        let p = Node::new("p");
        let a = candidate(&[body.clone()], "a", 0);
        let b = candidate(&[body.clone(), p.clone()], "b", 1);
        let c = candidate(&[body, p], "c", 2);

        let fm1 = FieldManager::from(vec![a.clone(), b.clone(), c.clone()]);
        let fm2 = FieldManager::from(vec![c.clone(), a.clone(), b.clone()]);
        let fm3 = FieldManager::from(vec![a, b]);

        assert_eq!(fm1, fm1.clone());
        assert_eq!(fm1, fm2);
        assert_ne!(fm1, fm3);

        let mut renamed = fm2.clone();
        renamed[0].name = "title".to_string();
        assert_ne!(fm1, renamed);
    }
}
