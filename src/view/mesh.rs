// Wavefront OBJ import and GPU mesh storage.
//
// Faces are fan-triangulated. Files without normals get smooth per-vertex
// normals from the summed face normals of each shared position.

use std::collections::HashMap;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::error::AssetError;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Axis-aligned bounds; starts inverted so the first point sets both corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn empty() -> Self {
        Self { min: Vec3::splat(f32::INFINITY), max: Vec3::splat(f32::NEG_INFINITY) }
    }

    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bbox: Aabb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FaceVertex {
    v: usize,
    vt: Option<usize>,
    vn: Option<usize>,
}

#[derive(Debug, Default)]
struct ObjGroup {
    name: Option<String>,
    triangles: Vec<[FaceVertex; 3]>,
}

#[derive(Debug, Default)]
pub struct ObjFile {
    positions: Vec<Vec3>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<Vec3>,
    groups: Vec<ObjGroup>,
}

fn parse_floats<const N: usize>(parts: &[&str]) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    for (slot, s) in out.iter_mut().zip(parts) {
        *slot = s.parse().ok()?;
    }
    (parts.len() >= N).then_some(out)
}

/// OBJ indices are 1-based; negatives count back from the end.
fn resolve_index(raw: &str, len: usize) -> Option<usize> {
    let i: isize = raw.parse().ok()?;
    if i > 0 {
        let i = (i - 1) as usize;
        (i < len).then_some(i)
    } else if i < 0 {
        len.checked_sub(i.unsigned_abs())
    } else {
        None
    }
}

/// Parse OBJ vertex reference: "v", "v/vt", "v/vt/vn", or "v//vn"
fn parse_obj_vertex(s: &str, obj: &ObjFile) -> Option<FaceVertex> {
    let mut parts = s.split('/');
    let v = resolve_index(parts.next()?, obj.positions.len())?;
    let vt = match parts.next().filter(|p| !p.is_empty()) {
        Some(p) => Some(resolve_index(p, obj.tex_coords.len())?),
        None => None,
    };
    let vn = match parts.next().filter(|p| !p.is_empty()) {
        Some(p) => Some(resolve_index(p, obj.normals.len())?),
        None => None,
    };
    Some(FaceVertex { v, vt, vn })
}

pub fn parse_obj(source: &str, path: &Path) -> Result<ObjFile, AssetError> {
    let mut obj = ObjFile::default();
    let mut current = ObjGroup::default();
    let err = |line: usize, message: String| AssetError::Obj { path: path.to_path_buf(), line, message };

    for (line_no, line) in source.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&parts[1..])
                    .ok_or_else(|| err(line_no, "malformed vertex".into()))?;
                obj.positions.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&parts[1..])
                    .ok_or_else(|| err(line_no, "malformed texture coordinate".into()))?;
                obj.tex_coords.push([u, v]);
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&parts[1..])
                    .ok_or_else(|| err(line_no, "malformed normal".into()))?;
                obj.normals.push(Vec3::new(x, y, z));
            }
            "o" | "g" => {
                let name = parts.get(1).map(|s| s.to_string());
                let previous = std::mem::replace(&mut current, ObjGroup { name, triangles: Vec::new() });
                if !previous.triangles.is_empty() {
                    obj.groups.push(previous);
                }
            }
            "f" => {
                let face = parts[1..]
                    .iter()
                    .map(|s| parse_obj_vertex(s, &obj).ok_or_else(|| err(line_no, format!("bad face vertex `{s}`"))))
                    .collect::<Result<Vec<_>, _>>()?;
                if face.len() < 3 {
                    return Err(err(line_no, "face with fewer than 3 vertices".into()));
                }
                // fan triangulation
                for i in 1..face.len() - 1 {
                    current.triangles.push([face[0], face[i], face[i + 1]]);
                }
            }
            _ => {}
        }
    }
    if !current.triangles.is_empty() {
        obj.groups.push(current);
    }
    Ok(obj)
}

/// Area-weighted smooth normals per position index.
pub fn gouraud_normals(positions: &[Vec3], triangles: &[[usize; 3]]) -> Vec<Vec3> {
    let mut sums = vec![Vec3::ZERO; positions.len()];
    for &[a, b, c] in triangles {
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        sums[a] += face;
        sums[b] += face;
        sums[c] += face;
    }
    sums.into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            if n == Vec3::ZERO { Vec3::Y } else { n }
        })
        .collect()
}

impl ObjFile {
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().filter_map(|g| g.name.as_deref())
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.triangles.len()).sum()
    }

    /// Builds one indexed mesh from the given groups, deduplicating
    /// identical (position, uv, normal) triples.
    fn build<'a>(&self, name: &str, groups: impl Iterator<Item = &'a ObjGroup>) -> MeshData {
        let triangles: Vec<[FaceVertex; 3]> = groups.flat_map(|g| g.triangles.iter().copied()).collect();

        let needs_normals = triangles.iter().flatten().any(|fv| fv.vn.is_none());
        let smooth = if needs_normals {
            let by_position: Vec<[usize; 3]> = triangles.iter().map(|t| [t[0].v, t[1].v, t[2].v]).collect();
            gouraud_normals(&self.positions, &by_position)
        } else {
            Vec::new()
        };

        let mut lookup: HashMap<FaceVertex, u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::with_capacity(triangles.len() * 3);
        let mut bbox = Aabb::empty();

        for fv in triangles.iter().flatten() {
            let index = *lookup.entry(*fv).or_insert_with(|| {
                let pos = self.positions[fv.v];
                bbox.extend(pos);
                let normal = match fv.vn {
                    Some(n) if !needs_normals => self.normals[n],
                    _ => smooth[fv.v],
                };
                // flip v: OBJ origin is bottom-left, wgpu top-left
                let uv = fv.vt.map(|t| self.tex_coords[t]).map(|[u, v]| [u, 1.0 - v]).unwrap_or([0.0, 0.0]);
                vertices.push(Vertex { pos: pos.to_array(), normal: normal.to_array(), uv });
                (vertices.len() - 1) as u32
            });
            indices.push(index);
        }

        MeshData { name: name.to_string(), vertices, indices, bbox }
    }

    /// The whole file under `stem`, then each named group under its own name.
    pub fn into_meshes(&self, stem: &str) -> Vec<MeshData> {
        let mut meshes = vec![self.build(stem, self.groups.iter())];
        for group in &self.groups {
            if let Some(name) = group.name.as_deref().filter(|n| *n != stem) {
                meshes.push(self.build(name, std::iter::once(group)));
            }
        }
        meshes
    }
}

pub fn load_obj(path: &Path) -> Result<Vec<MeshData>, AssetError> {
    let source = std::fs::read_to_string(path).map_err(|source| AssetError::Io { path: path.to_path_buf(), source })?;
    let obj = parse_obj(&source, path)?;
    if obj.triangle_count() == 0 {
        return Err(AssetError::EmptyMesh { path: path.to_path_buf() });
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("mesh");
    let meshes = obj.into_meshes(stem);
    tracing::info!(
        path = %path.display(),
        triangles = obj.triangle_count(),
        shapes = meshes.len(),
        generated_normals = obj.normals.is_empty(),
        "loaded mesh"
    );
    Ok(meshes)
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub bbox: Aabb,
}

impl MeshData {
    pub fn upload(&self, device: &wgpu::Device) -> GpuMesh {
        let vertex_label = format!("{} vertices", self.name);
        let index_label = format!("{} indices", self.name);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(vertex_label.as_str()),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(index_label.as_str()),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
            bbox: self.bbox,
        }
    }
}

/// Uploaded meshes addressed by shape name
#[derive(Default)]
pub struct MeshLibrary {
    meshes: Vec<GpuMesh>,
    by_name: HashMap<String, usize>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first mesh registered under a name.
    pub fn register(&mut self, device: &wgpu::Device, data: &MeshData) {
        if self.by_name.contains_key(&data.name) {
            tracing::warn!(name = %data.name, "duplicate mesh name ignored");
            return;
        }
        self.by_name.insert(data.name.clone(), self.meshes.len());
        self.meshes.push(data.upload(device));
    }

    pub fn load_file(&mut self, device: &wgpu::Device, path: &Path) -> Result<(), AssetError> {
        for data in load_obj(path)? {
            self.register(device, &data);
        }
        Ok(())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, index: usize) -> Option<&GpuMesh> {
        self.meshes.get(index)
    }

    pub fn require(&self, names: &[&str]) -> Result<(), AssetError> {
        match names.iter().find(|n| !self.by_name.contains_key(**n)) {
            Some(missing) => Err(AssetError::MissingMesh(missing.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad in the xy plane
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

    fn parse(src: &str) -> ObjFile {
        match parse_obj(src, Path::new("test.obj")) {
            Ok(obj) => obj,
            Err(e) => panic!("parse failed: {e}"),
        }
    }

    #[test]
    fn test_quad_fan_triangulated() {
        let obj = parse(QUAD);
        assert_eq!(obj.triangle_count(), 2);
        let meshes = obj.into_meshes("plane");
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].name, "plane");
        assert_eq!(meshes[1].name, "quad");
        assert_eq!(meshes[0].vertices.len(), 4);
        assert_eq!(meshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let meshes = parse(QUAD).into_meshes("plane");
        for v in &meshes[0].vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_uv_v_flipped() {
        let meshes = parse(QUAD).into_meshes("plane");
        assert_eq!(meshes[0].vertices[0].uv, [0.0, 1.0]);
        assert_eq!(meshes[0].vertices[2].uv, [1.0, 0.0]);
    }

    #[test]
    fn test_bbox() {
        let meshes = parse(QUAD).into_meshes("plane");
        let bbox = meshes[0].bbox;
        assert_eq!(bbox.min, Vec3::ZERO);
        assert_eq!(bbox.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(bbox.center(), Vec3::new(0.5, 0.5, 0.0));
        assert!(Aabb::empty().is_empty());
    }

    #[test]
    fn test_explicit_normals_kept() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 -1\nf 1//1 2//1 3//1\n";
        let meshes = parse(src).into_meshes("tri");
        assert_eq!(meshes.len(), 1);
        assert!(meshes[0].vertices.iter().all(|v| v.normal == [0.0, 0.0, -1.0]));
    }

    #[test]
    fn test_negative_indices() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let meshes = parse(src).into_meshes("tri");
        assert_eq!(meshes[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_out_of_range_index_reports_line() {
        let src = "v 0 0 0\nv 1 0 0\n\nf 1 2 9\n";
        match parse_obj(src, Path::new("bad.obj")) {
            Err(AssetError::Obj { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected obj error, got {other:?}"),
        }
    }

    #[test]
    fn test_groups_split_by_name() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\no a\nf 1 2 3\no b\nf 1 2 4\n";
        let obj = parse(src);
        assert_eq!(obj.group_names().collect::<Vec<_>>(), vec!["a", "b"]);
        let meshes = obj.into_meshes("both");
        assert_eq!(meshes.len(), 3);
        assert_eq!(meshes[0].indices.len(), 6);
        assert_eq!(meshes[2].name, "b");
    }

    #[test]
    fn test_gouraud_shared_vertex_averages() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        // faces with normals +Z and +Y share vertex 0
        let normals = gouraud_normals(&positions, &[[0, 1, 2], [0, 3, 1]]);
        assert!((normals[0] - Vec3::new(0.0, 1.0, 1.0).normalize()).length() < 1e-5);
        assert_eq!(normals[2], Vec3::Z);
    }
}
