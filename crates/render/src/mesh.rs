use bytemuck::{Pod, Zeroable};

/// Position + color, 6 floats.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Position + color + texcoord, 8 floats.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

/// Which vertex layout the room is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshVariant {
    #[default]
    Colored,
    Textured,
}

impl MeshVariant {
    pub fn floats_per_vertex(self) -> usize {
        match self {
            MeshVariant::Colored => 6,
            MeshVariant::Textured => 8,
        }
    }
}

/// Static indexed triangle mesh.
#[derive(Debug, Clone)]
pub struct Mesh<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

impl<V> Mesh<V> {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Room extents: x and z in [-10, 10], y in [0, 5].
pub const ROOM_HALF_WIDTH: f32 = 10.0;
pub const ROOM_HEIGHT: f32 = 5.0;
/// World units covered by one repetition of the texture.
pub const TEXTURE_TILE: f32 = 2.0;

struct Face {
    corners: [[f32; 3]; 4],
    color: [f32; 3],
    /// Which two world axes drive the texcoords.
    uv_axes: (usize, usize),
}

fn room_faces() -> [Face; 6] {
    let w = ROOM_HALF_WIDTH;
    let h = ROOM_HEIGHT;
    // Corners wind counter-clockwise when seen from inside the room.
    [
        // floor
        Face {
            corners: [[-w, 0.0, -w], [-w, 0.0, w], [w, 0.0, w], [w, 0.0, -w]],
            color: [0.55, 0.55, 0.55],
            uv_axes: (0, 2),
        },
        // ceiling
        Face {
            corners: [[-w, h, -w], [w, h, -w], [w, h, w], [-w, h, w]],
            color: [0.8, 0.8, 0.8],
            uv_axes: (0, 2),
        },
        // north wall, z = -w
        Face {
            corners: [[-w, 0.0, -w], [w, 0.0, -w], [w, h, -w], [-w, h, -w]],
            color: [0.7, 0.7, 0.7],
            uv_axes: (0, 1),
        },
        // south wall, z = +w
        Face {
            corners: [[w, 0.0, w], [-w, 0.0, w], [-w, h, w], [w, h, w]],
            color: [0.7, 0.7, 0.7],
            uv_axes: (0, 1),
        },
        // west wall, x = -w
        Face {
            corners: [[-w, 0.0, w], [-w, 0.0, -w], [-w, h, -w], [-w, h, w]],
            color: [0.65, 0.65, 0.65],
            uv_axes: (2, 1),
        },
        // east wall, x = +w
        Face {
            corners: [[w, 0.0, -w], [w, 0.0, w], [w, h, w], [w, h, -w]],
            color: [0.65, 0.65, 0.65],
            uv_axes: (2, 1),
        },
    ]
}

fn room<V>(make: impl Fn(&Face, [f32; 3]) -> V) -> Mesh<V> {
    let faces = room_faces();
    let mut vertices = Vec::with_capacity(faces.len() * 4);
    let mut indices = Vec::with_capacity(faces.len() * 6);
    for face in &faces {
        let base = vertices.len() as u32;
        vertices.extend(face.corners.iter().map(|c| make(face, *c)));
        indices.extend([0, 1, 2, 2, 3, 0].map(|i| base + i));
    }
    Mesh { vertices, indices }
}

/// The box room with per-face vertex colors.
pub fn room_colored() -> Mesh<ColorVertex> {
    room(|face, position| ColorVertex {
        position,
        color: face.color,
    })
}

/// The box room with texcoords tiling every [`TEXTURE_TILE`] units.
pub fn room_textured() -> Mesh<TexturedVertex> {
    room(|face, position| TexturedVertex {
        position,
        color: [1.0, 1.0, 1.0],
        uv: [
            position[face.uv_axes.0] / TEXTURE_TILE,
            position[face.uv_axes.1] / TEXTURE_TILE,
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn vertex_layouts_match_float_counts() {
        assert_eq!(
            std::mem::size_of::<ColorVertex>(),
            MeshVariant::Colored.floats_per_vertex() * 4
        );
        assert_eq!(
            std::mem::size_of::<TexturedVertex>(),
            MeshVariant::Textured.floats_per_vertex() * 4
        );
    }

    #[test]
    fn room_has_six_quads() {
        let mesh = room_colored();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn room_stays_within_bounds() {
        for v in room_colored().vertices {
            let [x, y, z] = v.position;
            assert!(x.abs() <= ROOM_HALF_WIDTH);
            assert!(z.abs() <= ROOM_HALF_WIDTH);
            assert!((0.0..=ROOM_HEIGHT).contains(&y));
        }
    }

    #[test]
    fn triangles_face_into_the_room() {
        let mesh = room_colored();
        let center = Vec3::new(0.0, ROOM_HEIGHT / 2.0, 0.0);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            assert!(normal.dot(center - a) > 0.0, "triangle {tri:?} faces outward");
        }
    }

    #[test]
    fn texcoords_repeat_across_faces() {
        let mesh = room_textured();
        let max_uv = mesh
            .vertices
            .iter()
            .flat_map(|v| v.uv)
            .fold(0.0_f32, |acc, u| acc.max(u.abs()));
        assert_eq!(max_uv, ROOM_HALF_WIDTH / TEXTURE_TILE);
    }

    #[test]
    fn both_variants_share_geometry() {
        let colored = room_colored();
        let textured = room_textured();
        assert_eq!(colored.indices, textured.indices);
        for (c, t) in colored.vertices.iter().zip(&textured.vertices) {
            assert_eq!(c.position, t.position);
        }
    }
}
