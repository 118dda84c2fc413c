//! Element paths used to project fields out of a tree.
//!
//! Supported syntax is the small subset used by field mappings:
//!
//! | Form | Meaning |
//! |---|---|
//! | `tag` | child element named `tag` |
//! | `*` | any child element |
//! | `.` | the current element |
//! | `a/b/c` | step through children |
//! | `.//tag` or `a//tag` | any descendant named `tag` |

use super::tree::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Tag(String),
}

impl NameTest {
    fn matches(&self, node: &Node) -> bool {
        match self {
            Self::Any => true,
            Self::Tag(tag) => node.name() == tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Current,
    Child(NameTest),
    Descendant(NameTest),
}

/// A compiled element path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    raw: String,
    steps: Vec<Step>,
}

impl ElementPath {
    /// Compile a path. Returns `None` for absolute paths, empty paths and
    /// paths ending in `/`.
    ///
    /// # Examples
    /// ```
    /// use cv_harvester::xml::ElementPath;
    ///
    /// assert!(ElementPath::parse("kop/nr").is_some());
    /// assert!(ElementPath::parse(".//nr").is_some());
    /// assert!(ElementPath::parse("/root").is_none());
    /// assert!(ElementPath::parse("kop/").is_none());
    /// ```
    pub fn parse(path: &str) -> Option<Self> {
        let mut steps = Vec::new();
        let mut descend = false;

        for (i, segment) in path.split('/').enumerate() {
            match segment {
                "" if i == 0 || descend => return None,
                "" => descend = true,
                "." if descend => return None,
                "." => steps.push(Step::Current),
                name => {
                    let test = if name == "*" {
                        NameTest::Any
                    } else {
                        NameTest::Tag(name.to_string())
                    };
                    steps.push(if descend {
                        Step::Descendant(test)
                    } else {
                        Step::Child(test)
                    });
                    descend = false;
                }
            }
        }

        if descend || steps.is_empty() {
            return None;
        }

        Some(Self {
            raw: path.to_string(),
            steps,
        })
    }

    /// The path as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// All matching nodes, in step order.
    pub fn select<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        let mut current = vec![node];
        for step in &self.steps {
            current = match step {
                Step::Current => current,
                Step::Child(test) => current
                    .into_iter()
                    .flat_map(|n| n.children().iter().filter(|c| test.matches(c)))
                    .collect(),
                Step::Descendant(test) => current
                    .into_iter()
                    .flat_map(|n| n.descendants().filter(|d| test.matches(d)))
                    .collect(),
            };
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// First matching node.
    pub fn find<'a>(&self, node: &'a Node) -> Option<&'a Node> {
        self.select(node).into_iter().next()
    }
}
