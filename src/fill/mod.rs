//! Fill builder: accumulate one sub-path's outline into a render group, then hand it to a
//! tessellator.
//!
//! Preconditions (not enforced): builders targeting the same render group are driven
//! strictly one after another, create -> move/line -> end -> destroy. Append order in the
//! shared buffer is the outline, so interleaving two builders corrupts both.

use smallvec::SmallVec;

use crate::render::{Point, RenderGroupId, RenderGroups, Vertex};
use crate::tessellate::{Outline, Tessellator};

/// Why a builder call did nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Skip {
    MissingRenderGroup,
    MissingBuffer,
    MissingTessellator,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendStatus {
    /// The point was appended at this buffer index.
    Appended { index: usize },
    Skipped(Skip),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndStatus {
    /// The tessellator ran once and appended this many vertices to the target.
    Expanded { appended: usize },
    Skipped(Skip),
}

/// Buffer span of the vertices this builder appended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct OutlineSpan {
    start: usize,
    len: usize,
}

/// Per-sub-path fill build state.
///
/// Holds non-owning handles only: `render_group` resolves through the caller's
/// `RenderGroups`, and `fill` is any `Copy` handle (a borrowed `&Fill`, an id, an opaque
/// pointer) passed through untouched. Outline points live in the render group's buffer.
#[derive(Debug)]
pub struct FillInfo<F: Copy> {
    render_group: RenderGroupId,
    fill: F,
    span: Option<OutlineSpan>,
    /// Outline-relative offsets of the points appended by `move_to`.
    contour_starts: SmallVec<[u32; 4]>,
}

impl<F: Copy> FillInfo<F> {
    /// Bind a new builder to `render_group`. `None` when the group does not exist.
    pub fn create(groups: &RenderGroups, render_group: RenderGroupId, fill: F) -> Option<Self> {
        groups.get(render_group)?;
        Some(Self { render_group, fill, span: None, contour_starts: SmallVec::new() })
    }

    pub fn render_group(&self) -> RenderGroupId {
        self.render_group
    }

    pub fn fill(&self) -> F {
        self.fill
    }

    /// Number of outline vertices appended so far.
    pub fn outline_len(&self) -> usize {
        self.span.map(|s| s.len).unwrap_or(0)
    }

    pub fn contour_starts(&self) -> &[u32] {
        &self.contour_starts
    }

    /// Begin (or restart) a contour at `position`.
    ///
    /// Appends exactly like `line_to`; the contour start is only recorded on the builder.
    pub fn move_to(&mut self, groups: &mut RenderGroups, position: Point) -> AppendStatus {
        let offset = self.outline_len() as u32;
        let status = self.add_vertex(groups, position);
        if let AppendStatus::Appended { .. } = status {
            self.contour_starts.push(offset);
        }
        status
    }

    pub fn line_to(&mut self, groups: &mut RenderGroups, position: Point) -> AppendStatus {
        self.add_vertex(groups, position)
    }

    fn add_vertex(&mut self, groups: &mut RenderGroups, position: Point) -> AppendStatus {
        let Some(group) = groups.get_mut(self.render_group) else {
            return AppendStatus::Skipped(Skip::MissingRenderGroup);
        };
        let Some(buf) = group.vertices_mut() else {
            return AppendStatus::Skipped(Skip::MissingBuffer);
        };
        let index = buf.push(position);

        let span = self.span.get_or_insert(OutlineSpan { start: index, len: 0 });
        if index != span.start + span.len {
            log::warn!(
                "fill outline in group {} is not contiguous (expected index {}, got {}); builders interleaved",
                self.render_group.index(),
                span.start + span.len,
                index
            );
        }
        span.len += 1;

        #[cfg(feature = "verbose_logs")]
        log::trace!("fill add_vertex group={} idx={} ({}, {})", self.render_group.index(), index, position.x, position.y);

        AppendStatus::Appended { index }
    }

    /// Finish the outline: run `tessellator` once, writing fill geometry into `target`.
    ///
    /// `target` may differ from the bound group. The outline itself stays in the bound
    /// group's buffer. Tessellation failures are logged and report zero appended vertices.
    pub fn end(
        &self,
        tessellator: Option<&mut dyn Tessellator>,
        groups: &mut RenderGroups,
        target: RenderGroupId,
    ) -> EndStatus {
        let Some(tessellator) = tessellator else {
            return EndStatus::Skipped(Skip::MissingTessellator);
        };

        let outline: Vec<Vertex> = self.outline_vertices(groups);
        let Some(target_group) = groups.get_mut(target) else {
            return EndStatus::Skipped(Skip::MissingRenderGroup);
        };

        let appended = match tessellator.expand_render_group(Outline::new(&outline, &self.contour_starts), target_group) {
            Ok(n) => n,
            Err(err) => {
                log::debug!("fill end group={} target={}: {}", self.render_group.index(), target.index(), err);
                0
            }
        };
        log::debug!(
            "fill end group={} target={} outline={} appended={}",
            self.render_group.index(),
            target.index(),
            outline.len(),
            appended
        );
        EndStatus::Expanded { appended }
    }

    /// Release the builder. The render group and its buffer are left as they are.
    pub fn destroy(self) {}

    /// Copy of this builder's outline from its bound group; empty if it is gone.
    fn outline_vertices(&self, groups: &RenderGroups) -> Vec<Vertex> {
        let (Some(span), Some(buf)) = (self.span, groups.get(self.render_group).and_then(|g| g.vertices())) else {
            return Vec::new();
        };
        let end = (span.start + span.len).min(buf.len());
        let start = span.start.min(end);
        buf.as_slice()[start..end].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Color, RenderGroup};
    use crate::tessellate::TessError;

    #[derive(Debug, PartialEq)]
    struct SolidFill(u32);

    /// Records every expansion and appends a fixed marker vertex per call.
    #[derive(Default)]
    struct RecordingTessellator {
        calls: Vec<(usize, Vec<u32>)>,
        targets: Vec<usize>,
    }

    impl Tessellator for RecordingTessellator {
        fn expand_render_group(&mut self, outline: Outline<'_>, target: &mut RenderGroup) -> Result<usize, TessError> {
            self.calls.push((outline.vertices.len(), outline.contour_starts.to_vec()));
            self.targets.push(target.vertex_count());
            let marker = [Vertex::new(Point::new(-1.0, -1.0), Color { r: 255, g: 0, b: 0, a: 255 }); 3];
            Ok(target.push_triangles(&marker).len())
        }
    }

    struct FailingTessellator;

    impl Tessellator for FailingTessellator {
        fn expand_render_group(&mut self, _outline: Outline<'_>, _target: &mut RenderGroup) -> Result<usize, TessError> {
            Err(TessError::EarcutFailed)
        }
    }

    fn positions(groups: &RenderGroups, id: RenderGroupId) -> Vec<(f32, f32)> {
        groups.get(id).unwrap().vertices().unwrap().as_slice().iter().map(|v| (v.x, v.y)).collect()
    }

    #[test]
    fn create_then_destroy_leaves_buffer_alone() {
        let mut groups = RenderGroups::new();
        let rg = groups.insert(RenderGroup::new());
        let fill = SolidFill(0xff00ff);

        let info = FillInfo::create(&groups, rg, &fill).unwrap();
        assert_eq!(info.fill(), &fill);
        assert_eq!(info.render_group(), rg);
        info.destroy();
        assert_eq!(groups.get(rg).unwrap().vertex_count(), 0);
    }

    #[test]
    fn create_without_group_returns_none() {
        let mut groups = RenderGroups::new();
        let rg = groups.insert(RenderGroup::new());
        groups.remove(rg);
        assert!(FillInfo::create(&groups, rg, ()).is_none());
    }

    #[test]
    fn points_append_in_call_order_as_opaque_black() {
        let mut groups = RenderGroups::new();
        let rg = groups.insert(RenderGroup::new());
        let mut info = FillInfo::create(&groups, rg, ()).unwrap();

        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0), Point::new(2.5, -7.0)];
        assert_eq!(info.move_to(&mut groups, pts[0]), AppendStatus::Appended { index: 0 });
        for (i, p) in pts.iter().enumerate().skip(1) {
            assert_eq!(info.line_to(&mut groups, *p), AppendStatus::Appended { index: i });
        }

        let buf = groups.get(rg).unwrap().vertices().unwrap();
        assert_eq!(buf.len(), pts.len());
        for (v, p) in buf.as_slice().iter().zip(pts.iter()) {
            assert_eq!(v.position(), *p);
            assert_eq!(v.color(), Color::OPAQUE_BLACK);
        }
        assert_eq!(info.outline_len(), 4);
        assert_eq!(info.contour_starts(), &[0]);
    }

    #[test]
    fn move_to_and_line_to_append_the_same_vertex() {
        let mut groups = RenderGroups::new();
        let rg = groups.insert(RenderGroup::new());
        let mut info = FillInfo::create(&groups, rg, ()).unwrap();

        info.move_to(&mut groups, Point::new(1.0, 2.0));
        info.line_to(&mut groups, Point::new(1.0, 2.0));
        info.move_to(&mut groups, Point::new(1.0, 2.0));

        let buf = groups.get(rg).unwrap().vertices().unwrap();
        assert_eq!(buf.len(), 3);
        assert!(buf.as_slice().iter().all(|v| *v == buf.as_slice()[0]));
        assert_eq!(info.contour_starts(), &[0, 2]);
    }

    #[test]
    fn appends_into_missing_group_or_buffer_are_no_ops() {
        let mut groups = RenderGroups::new();
        let bare = groups.insert(RenderGroup::without_buffer());
        let gone = groups.insert(RenderGroup::new());
        let other = groups.insert(RenderGroup::new());
        groups.get_mut(other).unwrap().vertices_mut().unwrap().push(Point::new(5.0, 5.0));

        let mut on_bare = FillInfo::create(&groups, bare, ()).unwrap();
        assert_eq!(on_bare.move_to(&mut groups, Point::new(1.0, 1.0)), AppendStatus::Skipped(Skip::MissingBuffer));
        assert_eq!(on_bare.line_to(&mut groups, Point::new(2.0, 1.0)), AppendStatus::Skipped(Skip::MissingBuffer));
        assert_eq!(on_bare.outline_len(), 0);
        assert!(on_bare.contour_starts().is_empty());

        let mut on_gone = FillInfo::create(&groups, gone, ()).unwrap();
        groups.remove(gone);
        assert_eq!(on_gone.line_to(&mut groups, Point::new(1.0, 1.0)), AppendStatus::Skipped(Skip::MissingRenderGroup));

        assert_eq!(positions(&groups, other), vec![(5.0, 5.0)]);
    }

    #[test]
    fn end_without_tessellator_keeps_outline() {
        let mut groups = RenderGroups::new();
        let rg = groups.insert(RenderGroup::new());
        let mut info = FillInfo::create(&groups, rg, ()).unwrap();
        info.move_to(&mut groups, Point::new(0.0, 0.0));
        info.line_to(&mut groups, Point::new(10.0, 0.0));
        info.line_to(&mut groups, Point::new(10.0, 10.0));

        assert_eq!(info.end(None, &mut groups, rg), EndStatus::Skipped(Skip::MissingTessellator));
        assert_eq!(positions(&groups, rg), vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert!(groups.get(rg).unwrap().triangle_ranges().is_empty());
    }

    #[test]
    fn end_with_missing_target_does_not_call_tessellator() {
        let mut groups = RenderGroups::new();
        let rg = groups.insert(RenderGroup::new());
        let target = groups.insert(RenderGroup::new());
        groups.remove(target);
        let mut info = FillInfo::create(&groups, rg, ()).unwrap();
        info.move_to(&mut groups, Point::new(0.0, 0.0));

        let mut tess = RecordingTessellator::default();
        assert_eq!(info.end(Some(&mut tess), &mut groups, target), EndStatus::Skipped(Skip::MissingRenderGroup));
        assert!(tess.calls.is_empty());
    }

    #[test]
    fn triangle_scenario_expands_once_into_target() {
        let mut groups = RenderGroups::new();
        let rg = groups.insert(RenderGroup::new());
        let fill_a = SolidFill(1);
        let mut tess = RecordingTessellator::default();

        let mut info = FillInfo::create(&groups, rg, &fill_a).unwrap();
        info.move_to(&mut groups, Point::new(0.0, 0.0));
        info.line_to(&mut groups, Point::new(10.0, 0.0));
        info.line_to(&mut groups, Point::new(10.0, 10.0));

        assert_eq!(positions(&groups, rg), vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert!(groups.get(rg).unwrap().vertices().unwrap().as_slice().iter().all(|v| v.color() == Color::OPAQUE_BLACK));

        assert_eq!(info.end(Some(&mut tess), &mut groups, rg), EndStatus::Expanded { appended: 3 });
        info.destroy();

        assert_eq!(tess.calls, vec![(3, vec![0])]);
        assert_eq!(tess.targets, vec![3]);
        assert_eq!(groups.get(rg).unwrap().vertex_count(), 6);
    }

    #[test]
    fn sequential_builders_keep_their_own_order() {
        let mut groups = RenderGroups::new();
        let rg = groups.insert(RenderGroup::new());
        let mut tess = RecordingTessellator::default();

        let first = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)];
        let second = [(5.0, 5.0), (6.0, 5.0), (6.0, 6.0)];
        for pts in [first, second] {
            let mut info = FillInfo::create(&groups, rg, ()).unwrap();
            info.move_to(&mut groups, Point::from(pts[0]));
            info.line_to(&mut groups, Point::from(pts[1]));
            info.line_to(&mut groups, Point::from(pts[2]));
            info.end(Some(&mut tess), &mut groups, rg);
            info.destroy();
        }

        let got = positions(&groups, rg);
        assert_eq!(got.len(), 12);
        assert_eq!(&got[0..3], &first);
        assert_eq!(&got[6..9], &second);
        // Each builder handed only its own three points to the tessellator.
        assert_eq!(tess.calls, vec![(3, vec![0]), (3, vec![0])]);
        assert_eq!(groups.get(rg).unwrap().triangle_ranges(), &[3..6, 9..12]);
    }

    #[test]
    fn end_can_target_a_different_group() {
        let mut groups = RenderGroups::new();
        let outline_group = groups.insert(RenderGroup::new());
        let out = groups.insert(RenderGroup::new());
        let mut tess = RecordingTessellator::default();

        let mut info = FillInfo::create(&groups, outline_group, ()).unwrap();
        info.move_to(&mut groups, Point::new(0.0, 0.0));
        info.line_to(&mut groups, Point::new(4.0, 0.0));
        assert_eq!(info.end(Some(&mut tess), &mut groups, out), EndStatus::Expanded { appended: 3 });

        assert_eq!(tess.calls, vec![(2, vec![0])]);
        assert_eq!(groups.get(outline_group).unwrap().vertex_count(), 2);
        assert_eq!(groups.get(out).unwrap().vertex_count(), 3);
    }

    #[test]
    fn tessellation_failure_reports_nothing_appended() {
        let mut groups = RenderGroups::new();
        let rg = groups.insert(RenderGroup::new());
        let mut info = FillInfo::create(&groups, rg, ()).unwrap();
        info.move_to(&mut groups, Point::new(0.0, 0.0));

        let mut tess = FailingTessellator;
        assert_eq!(info.end(Some(&mut tess), &mut groups, rg), EndStatus::Expanded { appended: 0 });
        assert_eq!(groups.get(rg).unwrap().vertex_count(), 1);
    }

    #[test]
    fn overlapping_self_intersecting_contours_still_end() {
        use crate::tessellate::EarcutTessellator;
        use crate::util::config::{FillRule, InkConfig};

        let pts = [
            (40.0, 0.0),
            (0.0, 20.0),
            (20.0, 30.0),
            (20.0, 0.0),
            (0.0, 30.0),
            (40.0, 40.0),
            (40.0, 30.0),
            (30.0, 40.0),
            (10.0, 40.0),
            (30.0, 30.0),
            (0.0, 40.0),
        ];

        for rule in [FillRule::EvenOdd, FillRule::NonZero] {
            let mut groups = RenderGroups::new();
            let rg = groups.insert(RenderGroup::new());
            let mut tess = EarcutTessellator::with_config(&InkConfig { fill_rule: rule, ..InkConfig::default() });

            let mut info = FillInfo::create(&groups, rg, ()).unwrap();
            for (i, p) in pts.iter().enumerate() {
                if i % 3 == 0 {
                    info.move_to(&mut groups, Point::from(*p));
                } else {
                    info.line_to(&mut groups, Point::from(*p));
                }
            }
            assert_eq!(info.contour_starts(), &[0, 3, 6, 9]);

            let EndStatus::Expanded { appended } = info.end(Some(&mut tess), &mut groups, rg) else {
                panic!("end skipped under {rule:?}");
            };
            assert_eq!(appended % 3, 0);

            let group = groups.get(rg).unwrap();
            assert_eq!(group.vertex_count(), pts.len() + appended);
            let outline = &group.vertices().unwrap().as_slice()[..pts.len()];
            for (v, p) in outline.iter().zip(pts.iter()) {
                assert_eq!((v.x, v.y), *p);
                assert_eq!(v.color(), Color::OPAQUE_BLACK);
            }
        }
    }

    #[test]
    fn earcut_fills_a_two_contour_outline() {
        use crate::tessellate::EarcutTessellator;
        use crate::util::config::{FillRule, InkConfig};

        let mut groups = RenderGroups::new();
        let rg = groups.insert(RenderGroup::new());
        let mut tess = EarcutTessellator::with_config(&InkConfig { fill_rule: FillRule::EvenOdd, ..InkConfig::default() });

        let mut info = FillInfo::create(&groups, rg, ()).unwrap();
        for ring in [[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)], [(20.0, 0.0), (30.0, 0.0), (30.0, 10.0), (20.0, 10.0)]] {
            info.move_to(&mut groups, Point::from(ring[0]));
            for p in &ring[1..] {
                info.line_to(&mut groups, Point::from(*p));
            }
        }
        assert_eq!(info.contour_starts(), &[0, 4]);

        // Two disjoint squares, two triangles each.
        assert_eq!(info.end(Some(&mut tess), &mut groups, rg), EndStatus::Expanded { appended: 12 });
        assert_eq!(groups.get(rg).unwrap().triangle_count(), 4);
    }
}
