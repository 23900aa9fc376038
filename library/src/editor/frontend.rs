//! The seam between an editing session and whatever displays it.

use image::RgbaImage;
use log::info;

use crate::config::EditorConfig;
use crate::model::project::arena::{LinkId, NodeId};
use crate::model::project::graph::GraphStore;
use crate::model::project::graph_node::Position;

/// Callbacks a session makes into its user interface.
pub trait Frontend {
    /// Where the next node should be placed on the canvas.
    fn free_position(&mut self, graph: &GraphStore) -> Position;

    fn selected_nodes(&self) -> Vec<NodeId>;

    fn selected_links(&self) -> Vec<LinkId>;

    /// Shows a new preview, or clears it when `None`.
    fn present(&mut self, preview: Option<&RgbaImage>);

    /// Reports the outcome of a user-facing operation.
    fn notify(&mut self, title: &str, message: &str);
}

/// Lets a session hold `Box<dyn Frontend>` when the frontend is chosen at runtime.
impl<F: Frontend + ?Sized> Frontend for Box<F> {
    fn free_position(&mut self, graph: &GraphStore) -> Position {
        (**self).free_position(graph)
    }

    fn selected_nodes(&self) -> Vec<NodeId> {
        (**self).selected_nodes()
    }

    fn selected_links(&self) -> Vec<LinkId> {
        (**self).selected_links()
    }

    fn present(&mut self, preview: Option<&RgbaImage>) {
        (**self).present(preview)
    }

    fn notify(&mut self, title: &str, message: &str) {
        (**self).notify(title, message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

/// A frontend without a screen: selection is set by hand and notices are kept.
#[derive(Debug, Default)]
pub struct HeadlessFrontend {
    config: EditorConfig,
    placed: usize,
    nodes: Vec<NodeId>,
    links: Vec<LinkId>,
    notices: Vec<Notice>,
    preview_size: Option<(u32, u32)>,
}

impl HeadlessFrontend {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn select_nodes(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        self.nodes = nodes.into_iter().collect();
    }

    pub fn select_links(&mut self, links: impl IntoIterator<Item = LinkId>) {
        self.links = links.into_iter().collect();
    }

    pub fn clear_selection(&mut self) {
        self.nodes.clear();
        self.links.clear();
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    /// Dimensions of the preview most recently presented.
    pub fn preview_size(&self) -> Option<(u32, u32)> {
        self.preview_size
    }
}

impl Frontend for HeadlessFrontend {
    /// Next free slot on the placement grid. Slots already holding a node are skipped.
    fn free_position(&mut self, graph: &GraphStore) -> Position {
        loop {
            let position = self.config.grid_position(self.placed);
            self.placed += 1;
            if !graph.nodes().any(|node| node.position == position) {
                return position;
            }
        }
    }

    fn selected_nodes(&self) -> Vec<NodeId> {
        self.nodes.clone()
    }

    fn selected_links(&self) -> Vec<LinkId> {
        self.links.clone()
    }

    fn present(&mut self, preview: Option<&RgbaImage>) {
        self.preview_size = preview.map(|image| image.dimensions());
    }

    fn notify(&mut self, title: &str, message: &str) {
        info!("{}: {}", title, message);
        self.notices.push(Notice {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}
