//! Owned element trees.
//!
//! `roxmltree` documents borrow their input, which does not fit a scanner
//! that discards its buffer after every element. Fragments are parsed once
//! with `roxmltree` and copied into an owned [`Node`] tree.

use roxmltree::Document;

use crate::error::Result;

/// One element of a parsed tree.
///
/// `text` is the character data before the first child element and `tail`
/// the character data after this element's closing tag, up to the next
/// sibling. Both are `None` when there is no such text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    tail: Option<String>,
    children: Vec<Node>,
}

impl Node {
    fn from_roxml(node: roxmltree::Node<'_, '_>) -> Self {
        Self {
            name: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            text: node.text().map(str::to_string),
            tail: node.tail().map(str::to_string),
            children: node
                .children()
                .filter(|child| child.is_element())
                .map(Self::from_roxml)
                .collect(),
        }
    }

    /// Tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Text before the first child element.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text following this element inside its parent.
    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// Concatenated character data of this element and all its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(tail) = &child.tail {
                out.push_str(tail);
            }
        }
    }
}

/// Depth-first, pre-order iterator over descendant elements.
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A complete element isolated from the input, with the fragment it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    source: String,
    root: Node,
}

impl Element {
    /// Parse a self-contained, well-formed element string.
    ///
    /// # Examples
    /// ```
    /// use cv_harvester::xml::Element;
    ///
    /// let element = Element::parse(r#"<cv id="1"><x>a</x></cv>"#).unwrap();
    /// assert_eq!(element.root().name(), "cv");
    /// assert_eq!(element.root().attribute("id"), Some("1"));
    /// ```
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let root = {
            let doc = Document::parse(&source)?;
            Node::from_roxml(doc.root_element())
        };
        Ok(Self { source, root })
    }

    /// Root node of the tree.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The exact fragment this element was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Consume the element, keeping only the fragment.
    pub fn into_source(self) -> String {
        self.source
    }
}
