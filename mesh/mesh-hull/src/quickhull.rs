//! Incremental quickhull with per-face conflict lists.
//!
//! Facets that still have outside points sit on a worklist; the region
//! visible from each eye point is found by walking shared edges, and dead
//! facet slots are reused.

use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::{ConvexHull, HullError, HullParams, HullResult};

/// A hull facet with its supporting plane and outside set.
struct Face {
    vertices: [usize; 3],
    normal: Vector3<f64>,
    offset: f64,
    outside: Vec<usize>,
    alive: bool,
}

impl Face {
    /// Build a facet oriented so `interior` lies behind it.
    fn new(a: usize, b: usize, c: usize, points: &[Point3<f64>], interior: &Point3<f64>) -> Self {
        let mut face = Self::unoriented([a, b, c], points);
        if face.distance(interior) > 0.0 {
            face = Self::unoriented([a, c, b], points);
        }
        face
    }

    fn unoriented(vertices: [usize; 3], points: &[Point3<f64>]) -> Self {
        let [a, b, c] = vertices.map(|i| points[i]);
        let cross = (b - a).cross(&(c - a));
        let norm = cross.norm();
        // Sliver facets get a zero normal so nothing is ever above them.
        let normal = if norm > f64::MIN_POSITIVE {
            cross / norm
        } else {
            Vector3::zeros()
        };
        Self {
            vertices,
            normal,
            offset: normal.dot(&a.coords),
            outside: Vec::new(),
            alive: true,
        }
    }

    fn distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Scale-relative tolerance: `1e-10 * (1 + max |coordinate|)`.
fn default_epsilon(points: &[Point3<f64>]) -> f64 {
    let max_abs = points
        .iter()
        .flat_map(|p| p.coords.iter().map(|c| c.abs()))
        .fold(0.0_f64, f64::max);
    1e-10 * (1.0 + max_abs)
}

/// Pick four affinely independent points, or report how the input collapses.
fn initial_simplex(points: &[Point3<f64>], eps: f64) -> HullResult<[usize; 4]> {
    let mut extremes = [0usize; 6];
    for (i, p) in points.iter().enumerate() {
        for axis in 0..3 {
            if p[axis] < points[extremes[axis * 2]][axis] {
                extremes[axis * 2] = i;
            }
            if p[axis] > points[extremes[axis * 2 + 1]][axis] {
                extremes[axis * 2 + 1] = i;
            }
        }
    }

    // Farthest pair among the axis extremes.
    let mut best = (0.0, extremes[0], extremes[1]);
    for (n, &i) in extremes.iter().enumerate() {
        for &j in &extremes[n + 1..] {
            let d = (points[i] - points[j]).norm();
            if d > best.0 {
                best = (d, i, j);
            }
        }
    }
    let (span, i0, i1) = best;
    if span <= eps {
        return Err(HullError::Degenerate {
            shape: "coincident",
        });
    }

    // Farthest from the line through i0 and i1.
    let dir = (points[i1] - points[i0]) / span;
    let (line_dist, i2) = farthest(points, |p| {
        let v = p - points[i0];
        (v - dir * v.dot(&dir)).norm()
    });
    if line_dist <= eps {
        return Err(HullError::Degenerate { shape: "collinear" });
    }

    // Farthest from the plane through i0, i1 and i2.
    let normal = (points[i1] - points[i0])
        .cross(&(points[i2] - points[i0]))
        .normalize();
    let (plane_dist, i3) = farthest(points, |p| normal.dot(&(p - points[i0])).abs());
    if plane_dist <= eps {
        return Err(HullError::Degenerate { shape: "coplanar" });
    }

    Ok([i0, i1, i2, i3])
}

fn farthest(points: &[Point3<f64>], metric: impl Fn(&Point3<f64>) -> f64) -> (f64, usize) {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (metric(p), i))
        .fold((f64::NEG_INFINITY, 0), |acc, cur| if cur.0 > acc.0 { cur } else { acc })
}

/// Collapse exact duplicates, which de-indexed triangle soups are full of.
fn unique_points(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let mut seen: HashSet<[u64; 3]> = HashSet::with_capacity(points.len());
    points
        .iter()
        // `+ 0.0` folds negative zero onto zero.
        .filter(|p| seen.insert([p.x, p.y, p.z].map(|c| (c + 0.0).to_bits())))
        .copied()
        .collect()
}

/// Live facets, a directed-edge index for adjacency, and reusable dead slots.
struct Facets {
    faces: Vec<Face>,
    edges: HashMap<(usize, usize), usize>,
    free: Vec<usize>,
}

impl Facets {
    fn new() -> Self {
        Self {
            faces: Vec::new(),
            edges: HashMap::new(),
            free: Vec::new(),
        }
    }

    fn insert(&mut self, face: Face) -> usize {
        let edges = face.edges();
        let slot = if let Some(slot) = self.free.pop() {
            self.faces[slot] = face;
            slot
        } else {
            self.faces.push(face);
            self.faces.len() - 1
        };
        for edge in edges {
            self.edges.insert(edge, slot);
        }
        slot
    }

    /// Kill a facet and hand back its outside set.
    fn remove(&mut self, slot: usize) -> Vec<usize> {
        let face = &mut self.faces[slot];
        face.alive = false;
        for edge in face.edges() {
            if self.edges.get(&edge) == Some(&slot) {
                self.edges.remove(&edge);
            }
        }
        self.free.push(slot);
        std::mem::take(&mut self.faces[slot].outside)
    }

    /// Facet across the directed edge `(u, v)`, i.e. the owner of `(v, u)`.
    fn neighbor(&self, (u, v): (usize, usize)) -> Option<usize> {
        self.edges.get(&(v, u)).copied()
    }

    /// Facets visible from `eye`, grown from `seed` across shared edges,
    /// plus the horizon edges bounding that region.
    fn visible_region(
        &self,
        seed: usize,
        eye: &Point3<f64>,
        eps: f64,
    ) -> (Vec<usize>, Vec<(usize, usize)>) {
        let mut visible = vec![seed];
        let mut marked: HashSet<usize> = HashSet::new();
        marked.insert(seed);
        let mut horizon = Vec::new();
        let mut next = 0;
        while next < visible.len() {
            let fi = visible[next];
            next += 1;
            for edge in self.faces[fi].edges() {
                match self.neighbor(edge) {
                    Some(ni) if marked.contains(&ni) => {}
                    Some(ni) if self.faces[ni].distance(eye) > eps => {
                        marked.insert(ni);
                        visible.push(ni);
                    }
                    _ => horizon.push(edge),
                }
            }
        }
        (visible, horizon)
    }

    fn live(&self) -> impl Iterator<Item = &Face> {
        self.faces.iter().filter(|f| f.alive)
    }
}

/// Assign `point` to the facet (among `candidates`) it is farthest above.
/// Points that are above no facet are inside and get dropped.
fn assign(faces: &mut [Face], candidates: &[usize], point: usize, p: &Point3<f64>, eps: f64) {
    let mut best: Option<(f64, usize)> = None;
    for &fi in candidates {
        let d = faces[fi].distance(p);
        if d > eps && best.is_none_or(|(bd, _)| d > bd) {
            best = Some((d, fi));
        }
    }
    if let Some((_, fi)) = best {
        faces[fi].outside.push(point);
    }
}

pub(crate) fn build(input: &[Point3<f64>], params: &HullParams) -> HullResult<ConvexHull> {
    if input.len() < 4 {
        return Err(HullError::InsufficientPoints { count: input.len() });
    }
    if let Some(index) = input
        .iter()
        .position(|p| !p.coords.iter().all(|c| c.is_finite()))
    {
        return Err(HullError::NonFinitePoint { index });
    }

    let points = unique_points(input);
    let points = points.as_slice();
    let eps = params.epsilon.unwrap_or_else(|| default_epsilon(points));
    let simplex = initial_simplex(points, eps)?;
    let interior = Point3::from(
        simplex
            .iter()
            .fold(Vector3::zeros(), |acc, &i| acc + points[i].coords)
            / 4.0,
    );

    let [a, b, c, d] = simplex;
    let mut facets = Facets::new();
    let initial: Vec<usize> = [(a, b, c), (a, b, d), (a, c, d), (b, c, d)]
        .into_iter()
        .map(|(x, y, z)| facets.insert(Face::new(x, y, z, points, &interior)))
        .collect();
    for (i, p) in points.iter().enumerate() {
        if !simplex.contains(&i) {
            assign(&mut facets.faces, &initial, i, p, eps);
        }
    }

    let mut pending: Vec<usize> = initial
        .into_iter()
        .filter(|&fi| !facets.faces[fi].outside.is_empty())
        .collect();
    let mut iterations = 0usize;
    while let Some(fi) = pending.pop() {
        let face = &facets.faces[fi];
        if !face.alive {
            continue;
        }
        let Some(eye) = face.outside.iter().copied().max_by(|&x, &y| {
            face.distance(&points[x])
                .total_cmp(&face.distance(&points[y]))
        }) else {
            continue;
        };

        iterations += 1;
        if let Some(limit) = params.max_iterations {
            if iterations > limit {
                return Err(HullError::MaxIterationsExceeded { limit });
            }
        }

        let eye_point = points[eye];
        let (visible, horizon) = facets.visible_region(fi, &eye_point, eps);

        let mut orphans = Vec::new();
        for slot in visible {
            orphans.append(&mut facets.remove(slot));
        }

        // Horizon edges keep the winding of the facet they came from, so the
        // new facets face outward without consulting the interior point.
        let created: Vec<usize> = horizon
            .into_iter()
            .map(|(u, v)| facets.insert(Face::unoriented([u, v, eye], points)))
            .collect();

        for point in orphans {
            if point != eye {
                assign(&mut facets.faces, &created, point, &points[point], eps);
            }
        }
        pending.extend(
            created
                .into_iter()
                .filter(|&slot| !facets.faces[slot].outside.is_empty()),
        );
    }

    let positions: Vec<Point3<f64>> = facets
        .live()
        .flat_map(|f| f.vertices.map(|i| points[i]))
        .collect();

    debug!(
        input = input.len(),
        unique = points.len(),
        triangles = positions.len() / 3,
        iterations,
        epsilon = eps,
        "Built convex hull"
    );
    Ok(ConvexHull { positions })
}
