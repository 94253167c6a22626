//! Optional, templated configuration values.

mod capability;
mod error;
mod loose;
mod optional;
mod strategy;

pub use capability::{parse_boxed, ConfigValue, TextParse, TextParser, TypeDescriptor};
pub use error::{BoxError, CoercionError, DecodeError};
pub use optional::Optional;
pub use strategy::{convert, Strategy};

/// Untyped configuration node as produced by the loader.
pub type RawNode = serde_json::Value;

/// Decodes the node at a dotted `path` inside `tree`.
///
/// Missing segments yield [`Optional::Absent`]. Numeric segments index into
/// arrays.
pub fn decode_field<T: ConfigValue>(tree: &RawNode, path: &str) -> Result<Optional<T>, DecodeError> {
    Optional::decode(lookup(tree, path))
}

fn lookup<'a>(tree: &'a RawNode, path: &str) -> Option<&'a RawNode> {
    if path.is_empty() {
        return Some(tree);
    }
    path.split('.').try_fold(tree, |node, segment| match node {
        RawNode::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => node.get(segment),
    })
}
