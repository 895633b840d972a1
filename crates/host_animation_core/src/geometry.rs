use bevy_math::{Vec2, Vec3};

const EPSILON: f32 = 1e-6;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexId {
    /// E.g. part of the super-triangle in the delaunay triangulation algorithm
    #[default]
    NotProvided,
    /// An index into the original vertex list
    Index(usize),
}

impl VertexId {
    pub fn index(&self) -> Option<usize> {
        match self {
            VertexId::NotProvided => None,
            VertexId::Index(i) => Some(*i),
        }
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub val: Vec2,
    pub id: VertexId,
}

impl Vertex {
    pub fn new(p: Vec2, id: VertexId) -> Self {
        Self { val: p, id }
    }
}

#[derive(Default, Clone, Copy, Debug)]
pub struct Edge {
    pub p: Vertex,
    pub q: Vertex,
}

impl Edge {
    pub fn new(p: Vertex, q: Vertex) -> Self {
        Self { p, q }
    }

    /// Position of the projection of `v` onto the segment, clamped to `[0, 1]` (0 at `p`, 1 at
    /// `q`).
    pub fn segment_parameter(&self, v: Vec2) -> f32 {
        let pq = self.q.val - self.p.val;
        let length_squared = pq.length_squared();
        if length_squared <= EPSILON * EPSILON {
            return 0.;
        }
        ((v - self.p.val).dot(pq) / length_squared).clamp(0., 1.)
    }

    pub fn closest_point_to(&self, v: Vec2) -> Vec2 {
        let t = self.segment_parameter(v);
        self.p.val + (self.q.val - self.p.val) * t
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        (self.p == other.p && self.q == other.q) || (self.p == other.q && self.q == other.p)
    }
}

#[derive(Default, Clone, Debug)]
pub struct Triangle {
    pub p: Vertex,
    pub q: Vertex,
    pub r: Vertex,
}

impl Triangle {
    pub fn new(p: Vertex, q: Vertex, r: Vertex) -> Self {
        Self { p, q, r }
    }

    /// A triangle comfortably enclosing every vertex.
    pub fn super_triangle(vertices: &[Vertex]) -> Self {
        let min = vertices
            .iter()
            .map(|v| v.val)
            .fold(Vec2::INFINITY, Vec2::min);
        let max = vertices
            .iter()
            .map(|v| v.val)
            .fold(Vec2::NEG_INFINITY, Vec2::max);
        let extent = (max - min).max_element().max(1.);
        let margin = extent * 10.;
        Self {
            p: Vertex::new(
                Vec2::new(min.x - margin, min.y - margin * 3.),
                VertexId::NotProvided,
            ),
            q: Vertex::new(
                Vec2::new(min.x - margin, max.y + margin),
                VertexId::NotProvided,
            ),
            r: Vertex::new(
                Vec2::new(max.x + margin * 3., max.y + margin),
                VertexId::NotProvided,
            ),
        }
    }

    /// Twice the signed area
    pub fn doubled_area(&self) -> f32 {
        (self.q.val - self.p.val).perp_dot(self.r.val - self.p.val)
    }

    pub fn is_degenerate(&self) -> bool {
        self.doubled_area().abs() <= EPSILON
    }

    pub fn circumcenter(&self) -> Option<Vec2> {
        let (a, b, c) = (self.p.val, self.q.val, self.r.val);
        let d = 2. * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
        if d.abs() <= EPSILON {
            return None;
        }

        let (la, lb, lc) = (a.length_squared(), b.length_squared(), c.length_squared());
        let x = (la * (b.y - c.y) + lb * (c.y - a.y) + lc * (a.y - b.y)) / d;
        let y = (la * (c.x - b.x) + lb * (a.x - c.x) + lc * (b.x - a.x)) / d;

        Some(Vec2::new(x, y))
    }

    pub fn circumradius_given_center(&self, circumcenter: Vec2) -> f32 {
        self.p.val.distance(circumcenter)
    }

    pub fn edges(&self) -> [Edge; 3] {
        [
            Edge::new(self.p, self.q),
            Edge::new(self.q, self.r),
            Edge::new(self.r, self.p),
        ]
    }

    pub fn vertices(&self) -> [Vertex; 3] {
        [self.p, self.q, self.r]
    }

    pub fn all_vertices_have_index(&self) -> bool {
        self.vertices().iter().all(|v| v.id.index().is_some())
    }

    pub fn barycentric_coordinates(&self, v: Vec2) -> Vec3 {
        let v0 = self.q.val - self.p.val;
        let v1 = self.r.val - self.p.val;
        let v2 = v - self.p.val;

        let d00 = v0.dot(v0);
        let d01 = v0.dot(v1);
        let d11 = v1.dot(v1);
        let d20 = v2.dot(v0);
        let d21 = v2.dot(v1);

        let denom = d00 * d11 - d01 * d01;
        if denom.abs() <= EPSILON {
            return Vec3::X;
        }
        let y = (d11 * d20 - d01 * d21) / denom;
        let z = (d00 * d21 - d01 * d20) / denom;
        let x = 1. - y - z;

        Vec3::new(x, y, z)
    }

    pub fn contains(&self, v: Vec2) -> bool {
        let bary = self.barycentric_coordinates(v);

        bary.x >= -EPSILON && bary.y >= -EPSILON && bary.z >= -EPSILON
    }
}

#[derive(Default, Clone, Debug)]
pub struct CachedTriangle {
    triangle: Triangle,
    circumcenter: Option<Vec2>,
    circumradius: Option<f32>,
}

impl CachedTriangle {
    pub fn from_triangle(triangle: Triangle) -> Self {
        let circumcenter = triangle.circumcenter();
        let circumradius = circumcenter.map(|c| triangle.circumradius_given_center(c));

        Self {
            triangle,
            circumcenter,
            circumradius,
        }
    }

    pub fn inner(&self) -> &Triangle {
        &self.triangle
    }

    /// `None` for degenerate triangles, which have no circumcircle.
    pub fn in_circumcircle(&self, v: Vec2) -> Option<bool> {
        Some(v.distance(self.circumcenter?) <= self.circumradius?)
    }

    /// Finds the closest point inside the triangle to the given point, and the distance to it.
    ///
    /// Note that the distance is 0 if the point is inside the triangle.
    pub fn distance_to_point(&self, p: Vec2) -> (Vec2, f32) {
        if self.triangle.contains(p) {
            return (p, 0.);
        }

        let (closest_point, closest_distance_squared) = self
            .triangle
            .edges()
            .into_iter()
            .map(|edge| edge.closest_point_to(p))
            .map(|closest_point| (closest_point, closest_point.distance_squared(p)))
            .fold((p, f32::INFINITY), |best, candidate| {
                if candidate.1 < best.1 { candidate } else { best }
            });

        (closest_point, closest_distance_squared.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, i: usize) -> Vertex {
        Vertex::new(Vec2::new(x, y), VertexId::Index(i))
    }

    #[test]
    fn circumcenter_of_right_triangle_is_hypotenuse_midpoint() {
        let triangle = Triangle::new(vertex(0., 0., 0), vertex(2., 0., 1), vertex(0., 2., 2));
        let center = triangle.circumcenter().unwrap();
        assert!(center.distance(Vec2::new(1., 1.)) < 1e-5);
    }

    #[test]
    fn collinear_triangle_has_no_circumcenter() {
        let triangle = Triangle::new(vertex(0., 0., 0), vertex(1., 1., 1), vertex(2., 2., 2));
        assert!(triangle.is_degenerate());
        assert!(triangle.circumcenter().is_none());
    }

    #[test]
    fn barycentric_coordinates_of_vertices() {
        let triangle = Triangle::new(vertex(0., 0., 0), vertex(1., 0., 1), vertex(0., 1., 2));
        assert!(triangle.barycentric_coordinates(Vec2::new(1., 0.)).abs_diff_eq(Vec3::Y, 1e-5));
        assert!(triangle.barycentric_coordinates(Vec2::new(0., 1.)).abs_diff_eq(Vec3::Z, 1e-5));
        assert!(triangle.contains(Vec2::new(0.2, 0.2)));
        assert!(!triangle.contains(Vec2::new(1., 1.)));
    }

    #[test]
    fn distance_to_point_projects_onto_nearest_edge() {
        let triangle = CachedTriangle::from_triangle(Triangle::new(
            vertex(0., 0., 0),
            vertex(1., 0., 1),
            vertex(0., 1., 2),
        ));
        let (closest, distance) = triangle.distance_to_point(Vec2::new(0.5, -2.));
        assert!(closest.distance(Vec2::new(0.5, 0.)) < 1e-5);
        assert!((distance - 2.).abs() < 1e-5);
    }

    #[test]
    fn segment_parameter_clamps() {
        let edge = Edge::new(vertex(0., 0., 0), vertex(2., 0., 1));
        assert_eq!(edge.segment_parameter(Vec2::new(-1., 3.)), 0.);
        assert_eq!(edge.segment_parameter(Vec2::new(5., 3.)), 1.);
        assert!((edge.segment_parameter(Vec2::new(0.5, 3.)) - 0.25).abs() < 1e-5);
    }
}
