use std::fmt;

/// Attribute marking an element as wanting a random message; the value is the source URL.
pub const SOURCE_ATTRIBUTE: &str = "data-saria-random-message-src";

/// Optional attribute making several elements share one random draw.
pub const GROUP_ATTRIBUTE: &str = "data-saria-random-message-id";

/// Names of the marker attributes the loader looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub source: String,
    pub group: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            source: SOURCE_ATTRIBUTE.to_string(),
            group: GROUP_ATTRIBUTE.to_string(),
        }
    }
}

/// A document node that can be inspected for marker attributes.
///
/// `Handle` is a cheap identifier used later to write content back into the
/// node without holding a borrow of the document.
pub trait MarkedNode {
    type Handle: Copy + Eq + fmt::Debug;

    fn handle(&self) -> Self::Handle;
    fn attribute(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElementError {
    #[error("element {handle} does not carry the {attribute} attribute")]
    MissingSource { handle: String, attribute: String },
}

/// True iff `node` carries the source marker attribute.
pub fn is_valid_element<N: MarkedNode>(node: &N, markers: &Markers) -> bool {
    node.attribute(&markers.source).is_some()
}

/// One node wanting randomized content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetElement<H> {
    handle: H,
    url: String,
    group_key: String,
}

impl<H: Copy + fmt::Debug> TargetElement<H> {
    /// Builds a target directly. The group key is trimmed; whitespace-only keys become empty.
    pub fn new(handle: H, url: impl Into<String>, group_key: &str) -> Self {
        Self {
            handle,
            url: url.into(),
            group_key: group_key.trim().to_string(),
        }
    }

    pub fn from_node<N>(node: &N, markers: &Markers) -> Result<Self, ElementError>
    where
        N: MarkedNode<Handle = H>,
    {
        let url = node
            .attribute(&markers.source)
            .ok_or_else(|| ElementError::MissingSource {
                handle: format!("{:?}", node.handle()),
                attribute: markers.source.clone(),
            })?;
        let group_key = node.attribute(&markers.group).unwrap_or_default();
        Ok(Self::new(node.handle(), url, group_key))
    }

    pub fn handle(&self) -> H {
        self.handle
    }

    /// Source URL, verbatim from the attribute.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Trimmed group key; empty when the element is its own group.
    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    pub fn has_group_key(&self) -> bool {
        !self.group_key.is_empty()
    }
}
