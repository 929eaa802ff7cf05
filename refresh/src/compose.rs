//! Recursive Compositor
//!
//! Redraws one clip area starting from the object found by the occlusion
//! culler. The top object's subtree is drawn first, then the walk goes up
//! the parent chain and redraws every sibling created after the current
//! branch, since those paint above it.
//!
//! Both walks use an explicit stack so scene depth is not bounded by the
//! call stack.

use alloc::vec::Vec;

use crate::area::Rect;
use crate::design::{Design, DrawLayer};
use crate::display::DisplayId;
use crate::scene::{NodeId, SceneGraph};

/// State shared by every draw call of one rendered area.
///
/// This replaces a global "display being refreshed": draw code asks the
/// context which display it renders for. Code outside a refresh pass can
/// build its own context to draw for an arbitrary display into its own
/// buffer.
pub struct RefreshContext<'a> {
    display: DisplayId,
    layer: DrawLayer<'a>,
}

impl<'a> RefreshContext<'a> {
    /// Create a context drawing into `layer` on behalf of `display`.
    pub fn new(display: DisplayId, layer: DrawLayer<'a>) -> Self {
        Self { display, layer }
    }

    /// Display being refreshed.
    pub fn display(&self) -> DisplayId {
        self.display
    }

    /// Target layer.
    pub fn layer(&mut self) -> &mut DrawLayer<'a> {
        &mut self.layer
    }

    fn draw_main<D: Design + ?Sized>(&mut self, design: &mut D, node: NodeId, clip: &Rect) {
        self.layer.set_clip(*clip);
        design.draw_main(self, node, clip);
    }

    fn draw_post<D: Design + ?Sized>(&mut self, design: &mut D, node: NodeId, clip: &Rect) {
        self.layer.set_clip(*clip);
        design.draw_post(self, node, clip);
    }
}

/// Redraw `mask` starting from `top`.
///
/// `top` is the object returned by the occlusion culler; `None` falls back
/// to `screen`.
pub fn refresh_area<S, D>(
    ctx: &mut RefreshContext<'_>,
    scene: &S,
    design: &mut D,
    top: Option<NodeId>,
    screen: NodeId,
    mask: &Rect,
) where
    S: SceneGraph + ?Sized,
    D: Design + ?Sized,
{
    let top = top.unwrap_or(screen);

    draw_node(ctx, scene, design, top, mask);

    // Later siblings paint above the current branch, redraw them too
    let mut border = top;
    while let Some(parent) = scene.parent(border) {
        let siblings = scene.children(parent);
        if let Some(pos) = siblings.iter().position(|&c| c == border) {
            for &sibling in &siblings[pos + 1..] {
                draw_node(ctx, scene, design, sibling, mask);
            }
        }

        if !scene.is_hidden(parent) {
            if let Some(clip) = scene.ext_bounds(parent).intersect(mask) {
                ctx.draw_post(design, parent, &clip);
            }
        }

        border = parent;
    }
}

struct Frame {
    node: NodeId,
    /// Clip of the node's own drawing (extended bounds)
    ext_clip: Rect,
    /// Clip of the children (tight bounds), `None` if they are all outside
    child_clip: Option<Rect>,
    next_child: usize,
}

/// Draw the node's main part, the node's area of `mask` covers.
fn enter<S, D>(
    ctx: &mut RefreshContext<'_>,
    scene: &S,
    design: &mut D,
    node: NodeId,
    mask: &Rect,
) -> Option<Frame>
where
    S: SceneGraph + ?Sized,
    D: Design + ?Sized,
{
    if scene.is_hidden(node) {
        return None;
    }

    let ext_clip = scene.ext_bounds(node).intersect(mask)?;
    ctx.draw_main(design, node, &ext_clip);

    // Children are never visible outside the tight bounds
    let child_clip = scene.bounds(node).intersect(mask);

    Some(Frame {
        node,
        ext_clip,
        child_clip,
        next_child: 0,
    })
}

/// Draw `node` and its subtree clipped to `mask`.
///
/// The main part of every node is drawn before its children (in creation
/// order), the post part after them.
pub fn draw_node<S, D>(
    ctx: &mut RefreshContext<'_>,
    scene: &S,
    design: &mut D,
    node: NodeId,
    mask: &Rect,
) where
    S: SceneGraph + ?Sized,
    D: Design + ?Sized,
{
    let Some(root) = enter(ctx, scene, design, node, mask) else {
        return;
    };

    let mut stack: Vec<Frame> = Vec::new();
    stack.push(root);

    while let Some(frame) = stack.last_mut() {
        let children = scene.children(frame.node);
        let next = match frame.child_clip {
            Some(clip) if frame.next_child < children.len() => {
                let child = children[frame.next_child];
                frame.next_child += 1;
                Some((child, clip))
            }
            _ => None,
        };

        match next {
            Some((child, parent_clip)) => {
                if let Some(child_mask) = scene.ext_bounds(child).intersect(&parent_clip) {
                    if let Some(child_frame) = enter(ctx, scene, design, child, &child_mask) {
                        stack.push(child_frame);
                    }
                }
            }
            None => {
                let (node, ext_clip) = (frame.node, frame.ext_clip);
                stack.pop();
                ctx.draw_post(design, node, &ext_clip);
            }
        }
    }
}
