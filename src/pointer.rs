//! Pointer resolution over document trees.
//!
//! Pointers have the form `#/segment/segment/...`. Each segment is percent-decoded,
//! then `~1` becomes `/` and `~0` becomes `~`. Once a pointer reaches its target,
//! `$ref` indirections are followed up to a fixed number of hops.

use crate::tree::NodeShape;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;

/// Prefix every supported pointer starts with.
pub const POINTER_PREFIX: &str = "#/";

/// Default number of `$ref` hops followed after the initial pointer.
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 8;

/// Decode one pointer segment. Returns `None` if percent-decoding does not yield UTF-8.
///
/// # Examples
///
/// ```
/// use block_highlighter::pointer::decode_token;
///
/// assert_eq!(decode_token("a~1b").as_deref(), Some("a/b"));
/// assert_eq!(decode_token("m~0n").as_deref(), Some("m~n"));
/// assert_eq!(decode_token("~01").as_deref(), Some("~1"));
/// assert_eq!(decode_token("two%20words").as_deref(), Some("two words"));
/// ```
pub fn decode_token(segment: &str) -> Option<String> {
    let decoded: Cow<'_, str> = urlencoding::decode(segment).ok()?;
    Some(decoded.replace("~1", "/").replace("~0", "~"))
}

/// Resolve a pointer to the node it names, without following `$ref` indirections.
///
/// Arrays accept only in-range non-negative integer segments; objects accept only
/// existing keys. Anything else, including a pointer without the `#/` prefix,
/// resolves to `None`.
pub fn resolve_raw<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    let path = pointer.strip_prefix(POINTER_PREFIX)?;

    let mut current = root;
    for segment in path.split('/') {
        let token = decode_token(segment)?;
        current = match current {
            Value::Array(items) => {
                let index = token.parse::<usize>().ok()?;
                items.get(index)?
            },
            Value::Object(fields) => fields.get(&token)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Resolve a pointer and follow `$ref` indirections with the default hop limit.
///
/// # Examples
///
/// ```
/// use block_highlighter::pointer::resolve;
/// use serde_json::json;
///
/// let tree = json!({
///     "body": {"children": [{"$ref": "#/texts/1"}]},
///     "texts": [{"text": "zero"}, {"text": "one"}]
/// });
/// let node = resolve(&tree, "#/body/children/0").unwrap();
/// assert_eq!(node["text"], "one");
/// assert!(resolve(&tree, "#/texts/9").is_none());
/// assert!(resolve(&tree, "/texts/0").is_none());
/// ```
pub fn resolve<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    resolve_with_depth(root, pointer, DEFAULT_MAX_REFERENCE_DEPTH)
}

/// Resolve a pointer, following at most `max_depth` `$ref` hops.
///
/// Resolution stops early when a reference points back to a pointer already seen in
/// this chain, when a reference does not resolve, or when the hop limit is reached.
/// In those cases the result is the last node in the chain that had content of its
/// own (an object with fields besides `$ref`), or `None` if there was none.
pub fn resolve_with_depth<'a>(root: &'a Value, pointer: &str, max_depth: usize) -> Option<&'a Value> {
    let mut node = resolve_raw(root, pointer)?;
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(pointer);
    let mut last_concrete: Option<&'a Value> = None;

    for _ in 0..max_depth {
        let NodeShape::Reference {
            target,
            carries_content,
        } = NodeShape::classify(node)
        else {
            return Some(node);
        };
        if carries_content {
            last_concrete = Some(node);
        }
        if !visited.insert(target) {
            log::debug!("Reference cycle at '{}' while resolving '{}'", target, pointer);
            return last_concrete;
        }
        match resolve_raw(root, target) {
            Some(next) => node = next,
            None => {
                log::debug!("Dangling reference '{}' while resolving '{}'", target, pointer);
                return last_concrete;
            },
        }
    }

    match NodeShape::classify(node) {
        NodeShape::Reference {
            carries_content: true,
            ..
        } => Some(node),
        NodeShape::Reference { .. } => {
            log::debug!("Reference depth {} exceeded while resolving '{}'", max_depth, pointer);
            last_concrete
        },
        _ => Some(node),
    }
}
