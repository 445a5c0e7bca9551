use std::path::Path;

use anyhow::{Context, Result};
use glam::{Mat4, Vec3};

use crate::math::Aabb;
use crate::scene::{Material, Mesh, Node, NodeHandle};

/// Imports a glTF file as a scene-graph-lite tree. Node names are
/// preserved so surfaces can be found by name afterwards; rotations are
/// baked into each mesh's bounds, leaving scene-level position/scale as
/// the only live transforms.
pub fn load_scene(path: impl AsRef<Path>) -> Result<NodeHandle> {
    let path = path.as_ref();
    let (doc, buffers, _images) = gltf::import(path)
        .with_context(|| format!("failed to load glTF file {}", path.display()))?;

    log::info!(
        "loaded {}: {} scenes, {} nodes, {} meshes",
        path.display(),
        doc.scenes().count(),
        doc.nodes().count(),
        doc.meshes().count()
    );

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let root = Node::new(stem);

    for scene in doc.scenes() {
        for node in scene.nodes() {
            let child = import_node(&node, &buffers, &Mat4::IDENTITY)?;
            root.borrow_mut().children.push(child);
        }
    }

    Ok(root)
}

fn import_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent_transform: &Mat4,
) -> Result<NodeHandle> {
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());
    let world = *parent_transform * local;

    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let imported = Node::new(name);

    if let Some(mesh) = node.mesh() {
        imported.borrow_mut().mesh = Some(import_mesh(&mesh, buffers, &world)?);
    }

    for child in node.children() {
        let child = import_node(&child, buffers, &world)?;
        imported.borrow_mut().children.push(child);
    }

    Ok(imported)
}

fn import_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data], world: &Mat4) -> Result<Mesh> {
    let mut bounds: Option<Aabb> = None;
    let mut base_color = [0.6f32, 0.6, 0.6];

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let positions = reader
            .read_positions()
            .context("mesh primitive has no positions")?;

        let vertices: Vec<Vec3> = positions
            .map(|pos| world.transform_point3(Vec3::from_array(pos)))
            .collect();
        if vertices.is_empty() {
            continue;
        }

        let primitive_bounds = Aabb::from_points(&vertices);
        bounds = Some(match bounds {
            Some(b) => b.union(&primitive_bounds),
            None => primitive_bounds,
        });

        let factor = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor();
        base_color = [factor[0], factor[1], factor[2]];
    }

    let bounds = bounds.unwrap_or_else(|| {
        log::warn!("mesh {:?} has no geometry", mesh.name());
        Aabb::new(Vec3::ZERO, Vec3::ZERO)
    });

    Ok(Mesh {
        bounds,
        material: Material::colored(base_color),
    })
}
