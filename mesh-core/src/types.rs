/// Identifier for a vertex in a [`crate::mesh::Mesh`].
///
/// This is an index into `Mesh::vertices`, and is only meaningful within
/// the lifetime of a given `Mesh` instance (subdivision replaces the
/// vertex list wholesale).
pub type VertexId = usize;

/// Identifier for an edge, indexing into `Mesh::edges`.
pub type EdgeId = usize;

/// Identifier for a triangular face, indexing into `Mesh::faces`.
pub type FaceId = usize;

/// Canonical unordered pair of vertex indices used to key the edge map.
///
/// The constructor enforces `a <= b`, so the same two vertices always
/// produce the same key regardless of the order they are named in. This
/// is the single place the canonical-ordering rule lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub a: VertexId,
    pub b: VertexId,
}

impl EdgeKey {
    pub fn new(v1: VertexId, v2: VertexId) -> Self {
        if v1 <= v2 {
            Self { a: v1, b: v2 }
        } else {
            Self { a: v2, b: v1 }
        }
    }
}
