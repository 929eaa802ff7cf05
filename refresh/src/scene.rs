//! Scene graph queries.
//!
//! The compositor reads the object tree through [`SceneGraph`] only. The
//! toolkit owns the real widget tree; [`Scene`] is an arena implementation
//! of the same queries where nodes refer to each other by [`NodeId`] and
//! children are kept in creation order (later children paint on top).

use alloc::vec::Vec;

use bitflags::bitflags;

use crate::area::{Coord, Rect};

/// Fully opaque.
pub const OPA_COVER: u8 = 255;
/// Fully transparent.
pub const OPA_TRANSP: u8 = 0;

/// Index of a node in its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

bitflags! {
    /// Per-node state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// The node and its subtree are not drawn.
        const HIDDEN = 1 << 0;
    }
}

/// Read-only view of the object tree used while refreshing.
pub trait SceneGraph {
    /// Tight bounding box in screen coordinates.
    fn bounds(&self, node: NodeId) -> Rect;

    /// Extra pixels drawn around the bounds (shadow, outline).
    fn ext_draw_pad(&self, node: NodeId) -> Coord;

    /// Check if the node is hidden.
    fn is_hidden(&self, node: NodeId) -> bool;

    /// Opacity of the node itself.
    fn opacity(&self, node: NodeId) -> u8;

    /// Children in creation order.
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Parent node, `None` for screens and layers.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Bounds grown by the extra draw padding.
    fn ext_bounds(&self, node: NodeId) -> Rect {
        self.bounds(node).expand(self.ext_draw_pad(node))
    }

    /// Opacity after scaling by every ancestor's opacity.
    fn effective_opacity(&self, node: NodeId) -> u8 {
        let mut opa = self.opacity(node) as u32;
        let mut parent = self.parent(node);
        while let Some(p) = parent {
            if opa == OPA_TRANSP as u32 {
                break;
            }
            opa = opa * self.opacity(p) as u32 / OPA_COVER as u32;
            parent = self.parent(p);
        }
        opa as u8
    }
}

/// A node stored in a [`Scene`].
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Bounding box in screen coordinates
    pub bounds: Rect,
    /// Extra draw padding around the bounds
    pub ext_draw_pad: Coord,
    /// Opacity (0-255)
    pub opacity: u8,
    /// State flags
    pub flags: NodeFlags,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    fn new(bounds: Rect, parent: Option<NodeId>) -> Self {
        Self {
            bounds,
            ext_draw_pad: 0,
            opacity: OPA_COVER,
            flags: NodeFlags::empty(),
            parent,
            children: Vec::new(),
        }
    }

    /// Parent node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in creation order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena backed object tree.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Create a parentless node: a screen or an overlay layer.
    pub fn create_root(&mut self, bounds: Rect) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode::new(bounds, None));
        id
    }

    /// Create a node as the last (topmost) child of `parent`.
    pub fn create_child(&mut self, parent: NodeId, bounds: Rect) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode::new(bounds, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Get a node.
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    /// Get a node for modification.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    /// Show or hide a node.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.flags.set(NodeFlags::HIDDEN, hidden);
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SceneGraph for Scene {
    fn bounds(&self, node: NodeId) -> Rect {
        self.nodes[node.0].bounds
    }

    fn ext_draw_pad(&self, node: NodeId) -> Coord {
        self.nodes[node.0].ext_draw_pad
    }

    fn is_hidden(&self, node: NodeId) -> bool {
        self.nodes[node.0].flags.contains(NodeFlags::HIDDEN)
    }

    fn opacity(&self, node: NodeId) -> u8 {
        self.nodes[node.0].opacity
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }
}
