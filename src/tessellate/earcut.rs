//! Earcut-based fill tessellation (polygons with holes).
//!
//! Outline contours are cleaned up, classified into outer rings and holes with the
//! configured fill rule, then each outer-with-holes group is triangulated by earcut and
//! appended to the target group as a plain triangle list.

use earcutr::earcut;

use super::{Outline, TessError, Tessellator};
use crate::render::{RenderGroup, Vertex};
use crate::util::config::{self, FillRule, InkConfig};

type Ring = Vec<Vertex>;

/// Default tessellator used by fill builders.
#[derive(Clone, Debug)]
pub struct EarcutTessellator {
    fill_rule: FillRule,
    min_ring_area: f32,
    dedupe_epsilon: f32,
}

impl Default for EarcutTessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl EarcutTessellator {
    /// Tessellator configured from `inkfill.cfg`.
    pub fn new() -> Self {
        Self::with_config(config::ink_config())
    }

    pub fn with_config(cfg: &InkConfig) -> Self {
        Self {
            fill_rule: cfg.fill_rule,
            min_ring_area: cfg.min_ring_area,
            dedupe_epsilon: cfg.dedupe_epsilon,
        }
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = rule;
    }

    /// Triangulate `outline` into a triangle list without touching any render group.
    pub fn triangulate(&self, outline: Outline<'_>) -> Result<Vec<Vertex>, TessError> {
        let eps = self.dedupe_epsilon;
        let mut rings: Vec<Ring> = outline.contours().map(<[Vertex]>::to_vec).collect();
        for r in rings.iter_mut() {
            clean_ring(r, eps);
        }
        rings.retain(|r| r.len() >= 3 && ring_area(r) > self.min_ring_area);
        if rings.is_empty() {
            return Ok(Vec::new());
        }

        let mut tris: Vec<Vertex> = Vec::new();
        for group in group_rings(&rings, self.fill_rule, eps) {
            let mut coords: Vec<f64> = Vec::new();
            let mut hole_starts: Vec<usize> = Vec::new();
            let mut flat: Vec<Vertex> = Vec::new();

            append_ring(&mut coords, &mut flat, group.outer);
            for h in group.holes {
                hole_starts.push(flat.len());
                append_ring(&mut coords, &mut flat, h);
            }

            let idx = earcut(&coords, &hole_starts, 2).map_err(|_| TessError::EarcutFailed)?;
            if idx.len() % 3 != 0 {
                return Err(TessError::InvalidTriangulation(idx.len()));
            }
            for i in idx {
                let v = flat.get(i).copied().ok_or(TessError::InvalidTriangulation(i))?;
                tris.push(v);
            }
        }
        Ok(tris)
    }
}

impl Tessellator for EarcutTessellator {
    fn expand_render_group(&mut self, outline: Outline<'_>, target: &mut RenderGroup) -> Result<usize, TessError> {
        // Triangulate fully before appending so a failure leaves the target untouched.
        let tris = self.triangulate(outline)?;
        let appended = target.push_triangles(&tris);
        log::debug!(
            "earcut: {} outline verts -> {} triangles at {:?}",
            outline.vertices.len(),
            tris.len() / 3,
            appended
        );
        Ok(appended.len())
    }
}

// -----------------
// Ring cleanup
// -----------------

#[inline(always)]
fn near(a: &Vertex, b: &Vertex, eps: f32) -> bool {
    (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps
}

/// Directed edges of a closed ring, including the closing edge.
fn edges(ring: &[Vertex]) -> impl Iterator<Item = (&Vertex, &Vertex)> {
    ring.iter().zip(ring.iter().cycle().skip(1))
}

/// Signed turn at `cur`; zero when `prev`, `cur`, `next` are collinear.
#[inline(always)]
fn turn(prev: &Vertex, cur: &Vertex, next: &Vertex) -> f32 {
    (cur.x - prev.x) * (next.y - cur.y) - (cur.y - prev.y) * (next.x - cur.x)
}

/// Merge near-duplicate neighbours, drop the explicit closing point(s) earcut does not
/// want, then drop near-collinear points unless that would leave fewer than 3.
fn clean_ring(ring: &mut Ring, eps: f32) {
    ring.dedup_by(|cur, prev| near(cur, prev, eps));
    while ring.len() >= 2 && near(&ring[0], &ring[ring.len() - 1], eps) {
        ring.pop();
    }
    let n = ring.len();
    if n < 3 {
        return;
    }

    let keep: Vec<bool> = (0..n)
        .map(|i| turn(&ring[(i + n - 1) % n], &ring[i], &ring[(i + 1) % n]).abs() >= eps)
        .collect();
    if keep.iter().filter(|&&k| k).count() >= 3 {
        let mut keep = keep.into_iter();
        ring.retain(|_| keep.next().unwrap_or(true));
    }
}

// -----------------
// Ring geometry
// -----------------

#[derive(Clone, Copy, Debug)]
struct Bbox {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bbox {
    fn of(ring: &[Vertex]) -> Self {
        let first = Self { min_x: ring[0].x, min_y: ring[0].y, max_x: ring[0].x, max_y: ring[0].y };
        ring.iter().skip(1).fold(first, |b, v| Self {
            min_x: b.min_x.min(v.x),
            min_y: b.min_y.min(v.y),
            max_x: b.max_x.max(v.x),
            max_y: b.max_y.max(v.y),
        })
    }

    /// Strictly inside; points on the box edge cannot be inside the ring either.
    fn contains(&self, p: (f32, f32)) -> bool {
        p.0 > self.min_x && p.0 < self.max_x && p.1 > self.min_y && p.1 < self.max_y
    }

    fn extent(&self) -> f32 {
        (self.max_x - self.min_x).max(self.max_y - self.min_y)
    }

    /// Largest absolute coordinate, which bounds f32 spacing around the ring.
    fn magnitude(&self) -> f32 {
        self.min_x.abs().max(self.min_y.abs()).max(self.max_x.abs()).max(self.max_y.abs())
    }
}

/// Shoelace, taken relative to the first vertex so large offsets keep their precision.
fn ring_area(ring: &[Vertex]) -> f32 {
    let (ox, oy) = (ring[0].x, ring[0].y);
    let twice: f32 = edges(ring)
        .map(|(a, b)| (a.x - ox) * (b.y - oy) - (b.x - ox) * (a.y - oy))
        .sum();
    (twice * 0.5).abs()
}

#[inline(always)]
fn is_left(a: &Vertex, b: &Vertex, p: (f32, f32)) -> f32 {
    (b.x - a.x) * (p.1 - a.y) - (p.0 - a.x) * (b.y - a.y)
}

fn winding_number(p: (f32, f32), ring: &[Vertex]) -> i32 {
    edges(ring)
        .map(|(a, b)| {
            if a.y <= p.1 {
                (b.y > p.1 && is_left(a, b, p) > 0.0) as i32
            } else {
                -((b.y <= p.1 && is_left(a, b, p) < 0.0) as i32)
            }
        })
        .sum()
}

/// Even-odd crossing test.
fn point_in_ring(p: (f32, f32), ring: &[Vertex]) -> bool {
    let (px, py) = p;
    edges(ring)
        .filter(|(a, b)| (a.y > py) != (b.y > py) && px < (b.x - a.x) * (py - a.y) / (b.y - a.y) + a.x)
        .count()
        % 2
        == 1
}

/// A point just inside the ring, next to its first non-degenerate edge.
///
/// The inward offset scales with the ring's size and with the f32 spacing at its
/// coordinates, so it never rounds back onto the edge.
fn sample_point_inside(ring: &[Vertex], bbox: &Bbox, eps: f32) -> (f32, f32) {
    let offset = (bbox.extent() * 0.01)
        .max(bbox.magnitude() * f32::EPSILON * 16.0)
        .max(f32::MIN_POSITIVE);
    let (a, b) = edges(ring).find(|(a, b)| !near(a, b, eps)).unwrap_or((&ring[0], &ring[1]));

    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len > 0.0 {
        let (nx, ny) = (-dy / len * offset, dx / len * offset);
        let (mx, my) = ((a.x + b.x) * 0.5, (a.y + b.y) * 0.5);
        for c in [(mx + nx, my + ny), (mx - nx, my - ny)] {
            if point_in_ring(c, ring) {
                return c;
            }
        }
    }

    let n = ring.len() as f32;
    let (sx, sy) = ring.iter().fold((0.0f32, 0.0f32), |(sx, sy), v| (sx + v.x, sy + v.y));
    (sx / n, sy / n)
}

// -----------------
// Hole handling
// -----------------

/// Facts about one cleaned ring, computed once per tessellation.
struct RingInfo<'a> {
    points: &'a [Vertex],
    bbox: Bbox,
    area: f32,
    sample: (f32, f32),
}

impl RingInfo<'_> {
    fn contains(&self, p: (f32, f32)) -> bool {
        self.bbox.contains(p) && point_in_ring(p, self.points)
    }
}

struct RingGroup<'a> {
    outer: &'a [Vertex],
    holes: Vec<&'a [Vertex]>,
}

/// Total order used for nesting: by area, ties broken by ring index.
fn rank_cmp(infos: &[RingInfo<'_>], a: usize, b: usize) -> core::cmp::Ordering {
    infos[a].area.total_cmp(&infos[b].area).then(a.cmp(&b))
}

/// Pair every filled ring with the unfilled rings nested under it.
///
/// A ring is filled when the fill rule, evaluated just inside it against all rings,
/// says so. A ring's parent is the lowest-ranked ring that outranks it and contains its
/// sample point. Parents always outrank children, so the parent chain is acyclic even
/// when self-intersecting rings contain each other's samples. Unfilled rings attach to
/// their nearest filled ancestor; rings with none are dropped.
fn group_rings(rings: &[Ring], rule: FillRule, eps: f32) -> Vec<RingGroup<'_>> {
    let infos: Vec<RingInfo<'_>> = rings
        .iter()
        .map(|r| {
            let bbox = Bbox::of(r);
            RingInfo { points: r, bbox, area: ring_area(r), sample: sample_point_inside(r, &bbox, eps) }
        })
        .collect();

    let parent: Vec<Option<usize>> = (0..infos.len())
        .map(|i| {
            (0..infos.len())
                .filter(|&j| rank_cmp(&infos, j, i).is_gt() && infos[j].contains(infos[i].sample))
                .min_by(|&a, &b| rank_cmp(&infos, a, b))
        })
        .collect();

    let filled: Vec<bool> = infos
        .iter()
        .map(|info| {
            let p = info.sample;
            match rule {
                FillRule::EvenOdd => infos.iter().filter(|o| o.contains(p)).count() % 2 == 1,
                FillRule::NonZero => infos.iter().map(|o| winding_number(p, o.points)).sum::<i32>() != 0,
            }
        })
        .collect();

    let mut groups: Vec<RingGroup<'_>> = Vec::new();
    let mut group_of: Vec<Option<usize>> = vec![None; infos.len()];
    for (i, info) in infos.iter().enumerate().filter(|(i, _)| filled[*i]) {
        group_of[i] = Some(groups.len());
        groups.push(RingGroup { outer: info.points, holes: Vec::new() });
    }

    for (i, info) in infos.iter().enumerate().filter(|(i, _)| !filled[*i]) {
        let owner = std::iter::successors(parent[i], |&p| parent[p])
            .take(infos.len())
            .find_map(|p| group_of[p]);
        if let Some(g) = owner {
            groups[g].holes.push(info.points);
        }
    }

    groups
}

fn append_ring(coords: &mut Vec<f64>, flat: &mut Vec<Vertex>, ring: &[Vertex]) {
    for v in ring {
        coords.push(v.x as f64);
        coords.push(v.y as f64);
        flat.push(*v);
    }
}
