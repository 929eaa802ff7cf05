//! Occlusion Culler
//!
//! Finds the deepest object that paints every pixel of a dirty area so the
//! compositor can start drawing there instead of at the screen.

use alloc::vec::Vec;

use crate::area::Rect;
use crate::design::Design;
use crate::scene::{NodeId, SceneGraph, OPA_COVER};

struct Frame {
    node: NodeId,
    /// Children not visited yet, counted from the topmost one down
    remaining: usize,
}

/// Find the deepest visible object fully and opaquely covering `area`.
///
/// Children are searched topmost first. Returns `None` when nothing under
/// `root` (`root` included) covers the area.
pub fn find_top_object<S, D>(scene: &S, design: &D, area: &Rect, root: NodeId) -> Option<NodeId>
where
    S: SceneGraph + ?Sized,
    D: Design + ?Sized,
{
    let candidate = |node: NodeId| !scene.is_hidden(node) && scene.bounds(node).contains(area);

    if !candidate(root) {
        return None;
    }

    let mut stack = Vec::new();
    stack.push(Frame {
        node: root,
        remaining: scene.children(root).len(),
    });

    while let Some(frame) = stack.last_mut() {
        if frame.remaining > 0 {
            frame.remaining -= 1;
            let child = scene.children(frame.node)[frame.remaining];
            if candidate(child) {
                stack.push(Frame {
                    node: child,
                    remaining: scene.children(child).len(),
                });
            }
            continue;
        }

        // No child covers the area, check the node itself
        let node = frame.node;
        stack.pop();
        if is_cover(scene, design, node, area) {
            return Some(node);
        }
    }

    None
}

fn is_cover<S, D>(scene: &S, design: &D, node: NodeId, area: &Rect) -> bool
where
    S: SceneGraph + ?Sized,
    D: Design + ?Sized,
{
    scene.opacity(node) == OPA_COVER
        && design.covers(node, area)
        && scene.effective_opacity(node) == OPA_COVER
}
