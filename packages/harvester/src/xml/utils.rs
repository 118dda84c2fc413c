//! Lookup helpers over element trees.

use super::path::ElementPath;
use super::tree::Node;

/// First direct child named `tag`.
///
/// # Examples
/// ```
/// use cv_harvester::xml::{find_child, Element};
///
/// let cv = Element::parse(r#"<cv id="9"><salary>90000</salary></cv>"#).unwrap();
///
/// assert!(find_child(cv.root(), "salary").is_some());
/// assert!(find_child(cv.root(), "jobTitle").is_none());
/// ```
pub fn find_child<'a>(node: &'a Node, tag: &str) -> Option<&'a Node> {
    node.children().iter().find(|child| child.name() == tag)
}

/// Every direct child named `tag`, in document order.
pub fn find_children<'a>(node: &'a Node, tag: &'a str) -> impl Iterator<Item = &'a Node> {
    node.children().iter().filter(move |child| child.name() == tag)
}

/// First node matched by a path given as text.
///
/// Returns `None` both when nothing matches and when `path` does not parse;
/// use [`ElementPath::parse`] directly to tell the two apart.
///
/// # Examples
/// ```
/// use cv_harvester::xml::{find_by_path, Element};
///
/// let cv = Element::parse(
///     r#"<cv ><educationList><educationType><qualification>Юрист</qualification></educationType></educationList></cv>"#,
/// )
/// .unwrap();
///
/// let q = find_by_path(cv.root(), "educationList/educationType/qualification");
/// assert_eq!(q.and_then(|n| n.text()), Some("Юрист"));
/// assert!(find_by_path(cv.root(), ".//qualification").is_some());
/// ```
pub fn find_by_path<'a>(node: &'a Node, path: &str) -> Option<&'a Node> {
    ElementPath::parse(path)?.find(node)
}

/// Leading text of `node` with surrounding whitespace removed; `""` when the
/// node has none.
pub fn get_text(node: &Node) -> String {
    node.text().map(str::trim).unwrap_or("").to_string()
}

/// Text at a compiled path, or `""` when the path matches nothing.
pub fn find_text(node: &Node, path: &ElementPath) -> String {
    path.find(node).map(get_text).unwrap_or_default()
}
