//! Parsed element trees and path navigation.

mod path;
mod tree;
mod utils;

pub use path::ElementPath;
pub use tree::{Descendants, Element, Node};
pub use utils::{find_by_path, find_child, find_children, find_text, get_text};
