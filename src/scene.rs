use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use glam::Vec3;

use crate::math::Aabb;
use crate::texture::ImageResource;

/// Flat-shaded material with an optional image binding. `needs_upload`
/// mirrors the renderer contract: set whenever `map` changes, cleared by
/// whoever uploads the image to the display path.
#[derive(Debug, Default)]
pub struct Material {
    pub base_color: [f32; 3],
    pub map: Option<ImageResource>,
    pub needs_upload: bool,
}

impl Material {
    pub fn colored(base_color: [f32; 3]) -> Self {
        Self {
            base_color,
            map: None,
            needs_upload: false,
        }
    }

    /// Bind a new image and return the previously bound one, which the
    /// caller releases. The swap order matters: the new image is in place
    /// before the old one ever leaves, so the material is never blank.
    #[must_use = "the previous image must be released by the caller"]
    pub fn attach_map(&mut self, image: ImageResource) -> Option<ImageResource> {
        let previous = self.map.replace(image);
        self.needs_upload = true;
        previous
    }
}

/// Renderable geometry: bounds in the owning model's local space plus the
/// material displayed on it.
#[derive(Debug)]
pub struct Mesh {
    pub bounds: Aabb,
    pub material: Material,
}

/// One scene-graph node. Position and scale apply to the whole subtree;
/// rotations are baked into mesh bounds at import time.
#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub position: Vec3,
    pub scale: Vec3,
    pub mesh: Option<Mesh>,
    pub children: Vec<NodeHandle>,
}

pub type NodeHandle = Rc<RefCell<Node>>;

/// Non-owning reference to a node, as held by players and pick
/// registrations. The scene graph keeps ownership.
pub type NodeRef = Weak<RefCell<Node>>;

impl Node {
    pub fn new(name: impl Into<String>) -> NodeHandle {
        Rc::new(RefCell::new(Self {
            name: name.into(),
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            mesh: None,
            children: Vec::new(),
        }))
    }

    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> NodeHandle {
        let node = Self::new(name);
        node.borrow_mut().mesh = Some(mesh);
        node
    }
}

/// Depth-first search for a node by name, including the root itself.
pub fn find_named(root: &NodeHandle, name: &str) -> Option<NodeHandle> {
    if root.borrow().name == name {
        return Some(root.clone());
    }
    let children = root.borrow().children.clone();
    children.iter().find_map(|child| find_named(child, name))
}

/// Visit every mesh-bearing node under `root` with its world-space
/// bounds, accumulating subtree position/scale on the way down.
pub fn visit_meshes(root: &NodeHandle, f: &mut impl FnMut(&NodeHandle, Aabb)) {
    visit_inner(root, Vec3::ZERO, Vec3::ONE, f);
}

fn visit_inner(
    node: &NodeHandle,
    parent_pos: Vec3,
    parent_scale: Vec3,
    f: &mut impl FnMut(&NodeHandle, Aabb),
) {
    let (pos, scale, bounds, children) = {
        let n = node.borrow();
        let pos = parent_pos + parent_scale * n.position;
        let scale = parent_scale * n.scale;
        let bounds = n.mesh.as_ref().map(|m| m.bounds.transformed(pos, scale));
        (pos, scale, bounds, n.children.clone())
    };
    // The borrow is released above: the visitor may mutate the node.
    if let Some(bounds) = bounds {
        f(node, bounds);
    }
    for child in &children {
        visit_inner(child, pos, scale, f);
    }
}

/// World-space bounds of every mesh under `root`, if any.
pub fn world_bounds(root: &NodeHandle) -> Option<Aabb> {
    let mut total: Option<Aabb> = None;
    visit_meshes(root, &mut |_, bounds| {
        total = Some(match total {
            Some(t) => t.union(&bounds),
            None => bounds,
        });
    });
    total
}

/// Clone `image` onto every mesh material under `root`, for models that
/// ship one baked texture covering the whole thing.
pub fn apply_texture(root: &NodeHandle, image: &ImageResource) {
    visit_meshes(root, &mut |node, _| {
        if let Some(mesh) = node.borrow_mut().mesh.as_mut() {
            drop(mesh.material.attach_map(image.clone()));
        }
    });
}

/// Shared re-render request line between players and the render loop:
/// players raise it after a frame attach, the loop takes it and redraws.
#[derive(Clone, Default)]
pub struct RedrawFlag(Rc<Cell<bool>>);

impl RedrawFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.set(true);
    }

    pub fn take(&self) -> bool {
        self.0.replace(false)
    }

    pub fn is_set(&self) -> bool {
        self.0.get()
    }
}
