/// Geometry primitives for mesh rendering
use nalgebra::{Point3, Vector3};

/// A 3D vertex position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
        }
    }

    pub fn coords(&self) -> [f32; 3] {
        [self.position.x, self.position.y, self.position.z]
    }
}

impl From<[f32; 3]> for Vertex {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// A triangle face defined by three ordered vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Unit face normal following the vertex winding.
    ///
    /// Degenerate triangles yield the zero vector.
    pub fn normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    fn include(&mut self, p: &Point3<f32>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }
}

/// An immutable batch of triangles ready for drawing.
///
/// Batches are built once by the loader and then shared read-only by the
/// render list and any draw pass in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBatch {
    triangles: Vec<Triangle>,
}

impl MeshBatch {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Triangle> {
        self.triangles.iter()
    }

    /// Bounding box over every vertex, `None` for an empty batch.
    ///
    /// Non-finite coordinates are skipped so a single bad vertex can't
    /// blow up the framing of the whole model.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter())
            .map(|v| v.position)
            .filter(|p| p.iter().all(|c| c.is_finite()));

        let first = points.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in points {
            bounds.include(&p);
        }
        Some(bounds)
    }
}

impl From<Vec<Triangle>> for MeshBatch {
    fn from(triangles: Vec<Triangle>) -> Self {
        Self::new(triangles)
    }
}

impl<'a> IntoIterator for &'a MeshBatch {
    type Item = &'a Triangle;
    type IntoIter = std::slice::Iter<'a, Triangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tri(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Triangle {
        Triangle::new(a.into(), b.into(), c.into())
    }

    #[test]
    fn test_normal_follows_winding() {
        let ccw = tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert_relative_eq!(ccw.normal(), Vector3::new(0.0, 0.0, 1.0));

        let cw = tri([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]);
        assert_relative_eq!(cw.normal(), Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_degenerate_normal_is_zero() {
        let line = tri([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]);
        assert_eq!(line.normal(), Vector3::zeros());
    }

    #[test]
    fn test_bounds() {
        assert!(MeshBatch::empty().bounds().is_none());

        let batch = MeshBatch::new(vec![
            tri([-1.0, 0.0, 2.0], [3.0, 1.0, 0.0], [0.0, -4.0, 1.0]),
            tri([0.0, 0.0, 0.0], [f32::NAN, 9.0, 9.0], [0.5, 0.5, 5.0]),
        ]);
        let bounds = batch.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(-1.0, -4.0, 0.0));
        assert_eq!(bounds.max, Point3::new(3.0, 1.0, 5.0));
        assert_relative_eq!(bounds.center(), Point3::new(1.0, -1.5, 2.5));
        assert_relative_eq!(bounds.extent(), Vector3::new(4.0, 5.0, 5.0));
    }
}
