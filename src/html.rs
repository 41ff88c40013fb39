//! Minimal HTML document builder.
//!
//! Documents are assembled bottom-up as a tree of [`Node`]s and serialized
//! once. Only a closed set of tags is supported (see [`Tag`]); looking up any
//! other tag name through [`make_node`] fails with [`UnknownTagError`].
//!
//! Attribute values and text children are written verbatim. Callers are
//! expected to pass trusted content; nothing is escaped.

use std::fmt::{self, Write};
use std::str::FromStr;

use indexmap::IndexMap;

/// Ordered attribute map. Serialization follows insertion order.
pub type Attributes = IndexMap<String, String>;

/// Doctype declaration plus the blank line preceding the root element.
const DOCTYPE: &str = "<!doctype html>\n\n";

/// Tags the builder knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Title,
    Meta,
    Body,
    Pre,
    A,
    Ul,
    Li,
    Span,
}

impl Tag {
    /// Every registered tag, in declaration order.
    pub const ALL: [Tag; 10] = [
        Tag::Html,
        Tag::Head,
        Tag::Title,
        Tag::Meta,
        Tag::Body,
        Tag::Pre,
        Tag::A,
        Tag::Ul,
        Tag::Li,
        Tag::Span,
    ];

    /// The tag name as written in markup.
    pub fn name(self) -> &'static str {
        match self {
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Title => "title",
            Tag::Meta => "meta",
            Tag::Body => "body",
            Tag::Pre => "pre",
            Tag::A => "a",
            Tag::Ul => "ul",
            Tag::Li => "li",
            Tag::Span => "span",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tag {
    type Err = UnknownTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .into_iter()
            .find(|tag| tag.name() == s)
            .ok_or_else(|| UnknownTagError(s.to_string()))
    }
}

/// A tag name outside the registered set was requested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTML tag `{0}`")]
pub struct UnknownTagError(pub String);

/// A child of a [`Node`]: either a nested element or literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Node(Node),
    Text(String),
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

/// One HTML element. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    tag: Tag,
    attributes: Attributes,
    children: Vec<Child>,
}

impl Node {
    pub fn new(tag: Tag, attributes: Attributes, children: Vec<Child>) -> Self {
        Self {
            tag,
            attributes,
            children,
        }
    }

    /// An element without attributes.
    pub fn element(tag: Tag, children: Vec<Child>) -> Self {
        Self::new(tag, Attributes::new(), children)
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Nodes without children render as `<tag/>`.
    pub fn is_self_closing(&self) -> bool {
        self.children.is_empty()
    }

    fn write_to(&self, out: &mut String) {
        let tag = self.tag.name();
        out.push('<');
        out.push_str(tag);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        if self.is_self_closing() {
            out.push_str("/>\n");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Child::Node(node) => node.write_to(out),
                Child::Text(text) => out.push_str(text),
            }
        }
        let _ = writeln!(out, "</{tag}>");
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}

/// Constructor bound to a single tag, as returned by [`make_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFactory {
    tag: Tag,
}

impl NodeFactory {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn build(&self, attributes: Attributes, children: Vec<Child>) -> Node {
        Node::new(self.tag, attributes, children)
    }

    /// Shorthand for [`NodeFactory::build`] with no attributes.
    pub fn with_children(&self, children: Vec<Child>) -> Node {
        Node::element(self.tag, children)
    }
}

impl From<Tag> for NodeFactory {
    fn from(tag: Tag) -> Self {
        Self { tag }
    }
}

/// Look up the constructor for `tag_name`.
pub fn make_node(tag_name: &str) -> Result<NodeFactory, UnknownTagError> {
    tag_name.parse::<Tag>().map(NodeFactory::from)
}

/// Build an [`Attributes`] map from `(name, value)` pairs, keeping their order.
pub fn attrs<I, K, V>(pairs: I) -> Attributes
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Render a node and its subtree to markup.
pub fn serialize(node: &Node) -> String {
    let mut out = String::new();
    node.write_to(&mut out);
    out
}

/// Wrap `children` in `<html>` and prefix the doctype.
pub fn document(children: Vec<Child>) -> String {
    let root = Node::element(Tag::Html, children);
    format!("{DOCTYPE}{}", serialize(&root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        assert_eq!(document(vec![]), "<!doctype html>\n\n<html/>\n");
    }

    #[test]
    fn test_self_closing_with_attributes() {
        let meta = Node::new(Tag::Meta, attrs([("charset", "utf-8")]), vec![]);
        assert_eq!(serialize(&meta), "<meta charset=\"utf-8\"/>\n");
    }

    #[test]
    fn test_nested_children_and_text() {
        let title = Node::element(Tag::Title, vec!["Foo".into()]);
        let head = Node::element(Tag::Head, vec![title.into()]);
        assert_eq!(serialize(&head), "<head><title>Foo</title>\n</head>\n");
    }

    #[test]
    fn test_attribute_order_follows_insertion() {
        let a = Node::new(
            Tag::A,
            attrs([("href", "https://example.com"), ("title", "ex")]),
            vec!["Example".into()],
        );
        assert_eq!(
            serialize(&a),
            "<a href=\"https://example.com\" title=\"ex\">Example</a>\n"
        );

        let reversed = Node::new(
            Tag::A,
            attrs([("title", "ex"), ("href", "https://example.com")]),
            vec!["Example".into()],
        );
        assert!(serialize(&reversed).starts_with("<a title=\"ex\" href="));
    }

    #[test]
    fn test_values_are_not_escaped() {
        let pre = Node::element(Tag::Pre, vec!["<b> & \"q\"".into()]);
        assert_eq!(serialize(&pre), "<pre><b> & \"q\"</pre>\n");
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let build = || {
            Node::element(
                Tag::Ul,
                vec![
                    Node::element(Tag::Li, vec!["one".into()]).into(),
                    Node::element(Tag::Li, vec!["two".into()]).into(),
                ],
            )
        };
        assert_eq!(serialize(&build()), serialize(&build()));
        assert_eq!(build().to_string(), serialize(&build()));
    }

    #[test]
    fn test_make_node_registered_tags() {
        for tag in Tag::ALL {
            let factory = make_node(tag.name()).unwrap();
            assert_eq!(factory.tag(), tag);
        }
        let span = make_node("span")
            .unwrap()
            .build(attrs([("id", "x")]), vec!["hi".into()]);
        assert_eq!(serialize(&span), "<span id=\"x\">hi</span>\n");
    }

    #[test]
    fn test_make_node_unknown_tag() {
        let err = make_node("div").unwrap_err();
        assert_eq!(err, UnknownTagError("div".to_string()));
        assert_eq!(err.to_string(), "unknown HTML tag `div`");
    }

    #[test]
    fn test_with_children_has_no_attributes() {
        let li = make_node("li").unwrap().with_children(vec!["x".into()]);
        assert!(li.attributes().is_empty());
        assert_eq!(li.children().len(), 1);
        assert!(!li.is_self_closing());
    }
}
