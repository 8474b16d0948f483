use ego_tree::{NodeId, NodeRef, Tree};
use loader_logging::loader_warn;
use message_loader_core::{MarkedNode, Markers, TargetElement};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::oneshot;

use crate::LoaderError;

/// A scraper element viewed through the marker-attribute interface.
pub struct DomElement<'a>(pub ElementRef<'a>);

impl MarkedNode for DomElement<'_> {
    type Handle = NodeId;

    fn handle(&self) -> NodeId {
        self.0.id()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.0.value().attr(name)
    }
}

/// Builds the `[attribute]` selector used to discover marked elements.
pub fn marker_selector(attribute: &str) -> Result<Selector, LoaderError> {
    let invalid = |message: String| LoaderError::InvalidMarker {
        attribute: attribute.to_string(),
        message,
    };
    if attribute.trim().is_empty() {
        return Err(invalid("attribute name is empty".to_string()));
    }
    Selector::parse(&format!("[{attribute}]")).map_err(|err| invalid(err.to_string()))
}

/// A parsed, mutable HTML document.
#[derive(Debug, Clone)]
pub struct Page {
    html: Html,
}

impl Page {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Serializes the whole document.
    pub fn html(&self) -> String {
        self.html.html()
    }

    /// Marker-bearing elements in document order.
    pub fn targets(&self, markers: &Markers) -> Result<Vec<TargetElement<NodeId>>, LoaderError> {
        let selector = marker_selector(&markers.source)?;
        let mut targets = Vec::new();
        for element in self.select(&selector) {
            match TargetElement::from_node(&DomElement(element), markers) {
                Ok(target) => targets.push(target),
                Err(err) => loader_warn!("skipping element: {}", err),
            }
        }
        Ok(targets)
    }

    /// Attached elements matching `selector`, in document order.
    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(move |element| selector.matches(element))
    }

    pub fn select_first(&self, selector: &Selector) -> Option<NodeId> {
        self.select(selector).next().map(|element| element.id())
    }

    pub fn body(&self) -> Option<NodeId> {
        let selector = Selector::parse("body").ok()?;
        self.select_first(&selector)
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    pub fn inner_html(&self, id: NodeId) -> Option<String> {
        self.element(id).map(|element| element.inner_html())
    }

    pub fn text(&self, id: NodeId) -> Option<String> {
        self.element(id).map(|element| element.text().collect())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.value().attr(name))
    }

    /// Child elements of `id`, skipping text and comment nodes.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.html
            .tree
            .get(id)
            .map(|node| {
                node.children()
                    .filter(|child| child.value().is_element())
                    .map(|child| child.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replaces the children of `id` with `html` parsed as a fragment.
    ///
    /// Returns false if `id` is not an element of this document.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        let children: Vec<NodeId> = self
            .html
            .tree
            .get(id)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default();
        for child in children {
            if let Some(mut child) = self.html.tree.get_mut(child) {
                child.detach();
            }
        }
        self.append_html(id, html);
        true
    }

    /// Appends `html` parsed as a fragment after the existing children of `id`.
    ///
    /// Returns the ids of the appended top-level nodes; empty if `id` is not
    /// an element of this document.
    pub fn append_html(&mut self, id: NodeId, html: &str) -> Vec<NodeId> {
        if self.element(id).is_none() {
            return Vec::new();
        }
        let fragment = Html::parse_fragment(html);
        let added = fragment
            .root_element()
            .children()
            .filter_map(|child| copy_subtree(&mut self.html.tree, id, child))
            .collect();
        added
    }

    /// Detaches `id` and its subtree from the document.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        match self.html.tree.get_mut(id) {
            Some(mut node) => {
                node.detach();
                true
            }
            None => false,
        }
    }
}

fn copy_subtree(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) -> Option<NodeId> {
    let copied = tree.get_mut(parent)?.append(source.value().clone()).id();
    for child in source.children() {
        copy_subtree(tree, copied, child);
    }
    Some(copied)
}

/// A document that is either ready or still loading.
pub enum Document {
    Ready(Page),
    Loading(oneshot::Receiver<Page>),
}

impl Document {
    pub fn is_loading(&self) -> bool {
        matches!(self, Document::Loading(_))
    }

    /// Resolves once the page content is available.
    pub async fn ready(self) -> Result<Page, LoaderError> {
        match self {
            Document::Ready(page) => Ok(page),
            Document::Loading(pending) => pending.await.map_err(|_| LoaderError::DocumentAbandoned),
        }
    }
}

impl From<Page> for Document {
    fn from(page: Page) -> Self {
        Document::Ready(page)
    }
}

/// Fires the content-ready notification for a loading [`Document`].
pub struct DocumentReady {
    tx: oneshot::Sender<Page>,
}

impl DocumentReady {
    /// Hands over the finished page. Returns it back if nobody is waiting any more.
    pub fn finish(self, page: Page) -> Result<(), Page> {
        self.tx.send(page)
    }
}

/// Creates a document in the loading state together with its ready notifier.
pub fn document_loading() -> (DocumentReady, Document) {
    let (tx, rx) = oneshot::channel();
    (DocumentReady { tx }, Document::Loading(rx))
}
