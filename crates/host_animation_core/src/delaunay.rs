use bevy_math::Vec2;

use super::geometry::{CachedTriangle, Edge, Triangle, Vertex, VertexId};

/// Delaunay triangulation of a set of 2D anchor points, built incrementally with the
/// Bowyer-Watson algorithm.
#[derive(Default, Clone, Debug)]
pub struct Triangulation {
    triangles: Vec<CachedTriangle>,
}

impl Triangulation {
    pub fn from_points_delaunay(points: &[Vec2]) -> Self {
        let vertices = points
            .iter()
            .enumerate()
            .map(|(i, v)| Vertex::new(*v, VertexId::Index(i)))
            .collect::<Vec<_>>();
        let super_triangle = Triangle::super_triangle(&vertices);
        let mut triangles = vec![CachedTriangle::from_triangle(super_triangle)];
        for vertex in vertices {
            triangles = add_vertex(triangles, vertex);
        }

        Triangulation {
            triangles: triangles
                .into_iter()
                .filter(|triangle| {
                    triangle.inner().all_vertices_have_index() && !triangle.inner().is_degenerate()
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = &Triangle> {
        self.triangles.iter().map(CachedTriangle::inner)
    }

    /// Expresses `p` as a convex combination of the vertices of one triangle, returned as
    /// `(point index, weight)` pairs.
    ///
    /// Points inside the triangulation use the barycentric coordinates of the triangle that
    /// contains them. Points outside are first projected onto the closest point of the nearest
    /// triangle. Weights are non-negative and sum to 1.
    pub fn find_linear_combination(&self, p: Vec2) -> Option<[(usize, f32); 3]> {
        let (triangle, closest_p) = self
            .triangles
            .iter()
            .map(|t| (t, t.distance_to_point(p)))
            .fold(None, |best: Option<(&CachedTriangle, (Vec2, f32))>, candidate| {
                match best {
                    Some(best) if best.1.1 <= candidate.1.1 => Some(best),
                    _ => Some(candidate),
                }
            })
            .map(|(t, (closest_p, _))| (t.inner(), closest_p))?;

        let bary = triangle
            .barycentric_coordinates(closest_p)
            .max(bevy_math::Vec3::ZERO);
        let sum = bary.element_sum();
        let bary = if sum > 0. {
            bary / sum
        } else {
            bevy_math::Vec3::X
        };

        Some([
            (triangle.p.id.index()?, bary.x),
            (triangle.q.id.index()?, bary.y),
            (triangle.r.id.index()?, bary.z),
        ])
    }
}

fn add_vertex(triangles: Vec<CachedTriangle>, vertex: Vertex) -> Vec<CachedTriangle> {
    let mut edges: Vec<Edge> = vec![];

    let mut triangles: Vec<CachedTriangle> = triangles
        .into_iter()
        .filter(|triangle| {
            if triangle.in_circumcircle(vertex.val).unwrap_or(true) {
                edges.extend(triangle.inner().edges());
                false
            } else {
                true
            }
        })
        .collect();

    // Edges shared by two removed triangles are interior to the cavity; only the boundary of the
    // cavity is reconnected to the new vertex.
    let boundary = edges
        .iter()
        .filter(|edge| edges.iter().filter(|other| other == edge).count() == 1)
        .copied()
        .collect::<Vec<_>>();

    triangles.extend(
        boundary
            .into_iter()
            .map(|edge| CachedTriangle::from_triangle(Triangle::new(edge.p, edge.q, vertex))),
    );

    triangles
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_basic_triangulation() {
        let triangulation = Triangulation::from_points_delaunay(&[
            Vec2::new(0., 0.),
            Vec2::new(1., 0.),
            Vec2::new(0., 1.),
        ]);

        assert_eq!(triangulation.triangles().count(), 1);
    }

    #[test]
    fn square_splits_into_two_triangles() {
        let triangulation = Triangulation::from_points_delaunay(&[
            Vec2::new(0., 0.),
            Vec2::new(1., 0.),
            Vec2::new(1., 1.),
            Vec2::new(0., 1.),
        ]);

        assert_eq!(triangulation.triangles().count(), 2);
    }

    #[test]
    fn grid_satisfies_empty_circumcircle_property() {
        let points = (0..4)
            .flat_map(|x| (0..3).map(move |y| Vec2::new(x as f32 * 1.3, y as f32 + x as f32 * 0.1)))
            .collect::<Vec<_>>();
        let triangulation = Triangulation::from_points_delaunay(&points);

        assert!(!triangulation.is_empty());
        for triangle in triangulation.triangles() {
            let center = triangle.circumcenter().unwrap();
            let radius = triangle.circumradius_given_center(center);
            for point in &points {
                assert!(point.distance(center) >= radius - 1e-3);
            }
        }
    }

    #[test]
    fn collinear_points_have_no_triangles() {
        let triangulation = Triangulation::from_points_delaunay(&[
            Vec2::new(0., 0.),
            Vec2::new(1., 1.),
            Vec2::new(2., 2.),
        ]);

        assert!(triangulation.is_empty());
        assert!(triangulation.find_linear_combination(Vec2::ZERO).is_none());
    }

    #[test]
    fn test_linear_combination() {
        let triangulation = Triangulation::from_points_delaunay(&[
            Vec2::new(0., 0.),
            Vec2::new(1., 0.),
            Vec2::new(0., 1.),
        ]);

        let linear_combination = triangulation
            .find_linear_combination(Vec2::new(0.1, 0.1))
            .unwrap();
        let sum: f32 = linear_combination.iter().map(|(_, w)| w).sum();

        assert!((sum - 1.).abs() < 1e-5);
        for (i, w) in linear_combination {
            let expected = match i {
                0 => 0.8,
                _ => 0.1,
            };
            assert!((w - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn outside_point_projects_onto_nearest_edge() {
        let triangulation = Triangulation::from_points_delaunay(&[
            Vec2::new(0., 0.),
            Vec2::new(2., 0.),
            Vec2::new(0., 2.),
        ]);

        let linear_combination = triangulation
            .find_linear_combination(Vec2::new(1., -5.))
            .unwrap();
        for (i, w) in linear_combination {
            assert!(w >= 0.);
            let expected = match i {
                2 => 0.,
                _ => 0.5,
            };
            assert!((w - expected).abs() < 1e-5);
        }
    }
}
