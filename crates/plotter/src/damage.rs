//! Works out which graphics must be redrawn in a frame.
//!
//! A graphic is redrawn if it asked to be ([`DrawAction::Invalidate`] or
//! [`DrawAction::Animate`]), if it has never been drawn, or if it moved since
//! it was last drawn. Every redrawn graphic's viewport is cleared before
//! drawing, which destroys the pixels of anything else in that region, so any
//! graphic overlapping a redrawn one must be redrawn too, whether it sits
//! above or below it. This repeats until no more graphics are pulled in.
//!
//! Graphics with an empty viewport never overlap anything and are only drawn
//! when they ask to be.

use geometry::Viewport;
use smallvec::SmallVec;
use structures::FlagVec;

use crate::graphic::DrawAction;

/// What the tracker needs to know about one graphic in the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub action: DrawAction,
    pub viewport: Viewport,
    /// Where the graphic was drawn last, or `None` if it never was.
    pub drawn_at: Option<Viewport>,
}

impl Candidate {
    /// A graphic that has already been drawn at `viewport`.
    #[must_use]
    pub fn settled(action: DrawAction, viewport: Viewport) -> Self {
        Self {
            action,
            viewport,
            drawn_at: Some(viewport),
        }
    }

    /// A graphic that has never been drawn.
    #[must_use]
    pub fn fresh(action: DrawAction, viewport: Viewport) -> Self {
        Self {
            action,
            viewport,
            drawn_at: None,
        }
    }

    fn moved_from(&self) -> Option<Viewport> {
        self.drawn_at.filter(|previous| *previous != self.viewport)
    }

    fn wants_redraw(&self) -> bool {
        match self.action {
            DrawAction::Invalidate | DrawAction::Animate => true,
            DrawAction::Sleep => {
                !self.viewport.is_empty() && (self.drawn_at.is_none() || self.moved_from().is_some())
            }
        }
    }
}

/// The outcome of damage tracking for one frame.
#[derive(Default)]
pub struct Damage {
    redraw: FlagVec,
    regions: Vec<Viewport>,
}

impl Damage {
    /// Whether the graphic at `index` in draw order must be redrawn.
    #[must_use]
    pub fn must_redraw(&self, index: usize) -> bool {
        self.redraw.get(index)
    }

    /// Indices of the graphics to redraw, in draw order.
    pub fn redraws(&self) -> impl Iterator<Item = usize> + '_ {
        self.redraw.iter_ones()
    }

    #[must_use]
    pub fn redraw_count(&self) -> usize {
        self.redraw.count_ones()
    }

    /// Regions of the surface whose pixels are stale and must be cleared
    /// before redrawing. Regions may overlap.
    #[must_use]
    pub fn regions(&self) -> &[Viewport] {
        &self.regions
    }

    /// True if nothing needs to be cleared or drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.redraw.count_ones() == 0
    }
}

/// Computes [`Damage`] frame by frame, carrying damage that did not come from
/// a graphic (removed graphics, window exposure) into the next computation.
#[derive(Default)]
pub struct DamageTracker {
    pending: SmallVec<[Viewport; 4]>,
    damage: Damage,
}

impl DamageTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a region as stale for the next computation. Empty regions are
    /// ignored.
    pub fn add_damage(&mut self, region: Viewport) {
        if !region.is_empty() {
            self.pending.push(region);
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Decides which of `candidates` (in draw order) must be redrawn.
    ///
    /// If `escalate_to` is given, any damage at all grows to cover that
    /// region, which is normally the whole surface.
    pub fn compute(&mut self, candidates: &[Candidate], escalate_to: Option<Viewport>) -> &Damage {
        let Damage { redraw, regions } = &mut self.damage;
        redraw.clear();
        regions.clear();
        regions.extend(self.pending.drain(..));

        for (index, candidate) in candidates.iter().enumerate() {
            if let Some(previous) = candidate.moved_from() {
                if !previous.is_empty() {
                    regions.push(previous);
                }
            }

            if candidate.wants_redraw() {
                redraw.set(index, true);
                if !candidate.viewport.is_empty() {
                    regions.push(candidate.viewport);
                }
            }
        }

        if let Some(surface) = escalate_to {
            if !surface.is_empty() && (!regions.is_empty() || redraw.count_ones() > 0) {
                regions.clear();
                regions.push(surface);
            }
        }

        loop {
            let mut changed = false;

            for (index, candidate) in candidates.iter().enumerate() {
                if redraw.get(index) || candidate.viewport.is_empty() {
                    continue;
                }

                if regions.iter().any(|r| r.intersects(&candidate.viewport)) {
                    redraw.set(index, true);
                    regions.push(candidate.viewport);
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        &self.damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DrawAction::*;

    fn vp(x: i32, y: i32, w: i32, h: i32) -> Viewport {
        Viewport::from_xywh(x, y, w, h)
    }

    fn redraws(tracker: &mut DamageTracker, candidates: &[Candidate]) -> Vec<usize> {
        tracker.compute(candidates, None).redraws().collect()
    }

    #[test]
    fn empty_registry() {
        let mut tracker = DamageTracker::new();
        let damage = tracker.compute(&[], None);
        assert!(damage.is_empty());
        assert_eq!(damage.redraw_count(), 0);
    }

    #[test]
    fn sleeping_graphics_are_skipped() {
        let mut tracker = DamageTracker::new();
        let candidates = [
            Candidate::settled(Sleep, vp(0, 0, 10, 10)),
            Candidate::settled(Sleep, vp(5, 5, 10, 10)),
        ];

        assert!(tracker.compute(&candidates, None).is_empty());
    }

    #[test]
    fn overlap_below_invalidated_graphic_redraws() {
        let mut tracker = DamageTracker::new();
        let a = Candidate::settled(Sleep, vp(0, 0, 10, 10));

        let b = Candidate::settled(Invalidate, vp(5, 5, 10, 10));
        assert_eq!(redraws(&mut tracker, &[a, b]), vec![0, 1]);

        let b = Candidate::settled(Invalidate, vp(20, 20, 5, 5));
        assert_eq!(redraws(&mut tracker, &[a, b]), vec![1]);
    }

    #[test]
    fn overlap_above_invalidated_graphic_redraws() {
        let mut tracker = DamageTracker::new();
        let candidates = [
            Candidate::settled(Invalidate, vp(0, 0, 10, 10)),
            Candidate::settled(Sleep, vp(5, 5, 10, 10)),
        ];

        assert_eq!(redraws(&mut tracker, &candidates), vec![0, 1]);
    }

    #[test]
    fn cascade_is_transitive() {
        let mut tracker = DamageTracker::new();
        // A chain where only neighbours overlap, invalidated at one end.
        let candidates = [
            Candidate::settled(Sleep, vp(0, 0, 10, 10)),
            Candidate::settled(Sleep, vp(8, 0, 10, 10)),
            Candidate::settled(Sleep, vp(16, 0, 10, 10)),
            Candidate::settled(Invalidate, vp(24, 0, 10, 10)),
            Candidate::settled(Sleep, vp(100, 100, 10, 10)),
        ];

        let damage = tracker.compute(&candidates, None);
        assert_eq!(damage.redraws().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(!damage.must_redraw(4));
    }

    #[test]
    fn animate_always_redraws() {
        let mut tracker = DamageTracker::new();
        let candidates = [Candidate::settled(Animate, vp(0, 0, 1, 1))];

        for _ in 0..3 {
            assert_eq!(redraws(&mut tracker, &candidates), vec![0]);
        }
    }

    #[test]
    fn fresh_graphics_draw_once() {
        let mut tracker = DamageTracker::new();
        let fresh = [Candidate::fresh(Sleep, vp(0, 0, 100, 100))];
        assert_eq!(redraws(&mut tracker, &fresh), vec![0]);

        let settled = [Candidate::settled(Sleep, vp(0, 0, 100, 100))];
        assert!(redraws(&mut tracker, &settled).is_empty());
    }

    #[test]
    fn zero_area_sleep_is_always_skipped() {
        let mut tracker = DamageTracker::new();
        let candidates = [
            Candidate::fresh(Sleep, vp(5, 5, 0, 0)),
            Candidate::settled(Sleep, vp(0, 5, 10, 0)),
            Candidate::settled(Animate, vp(0, 0, 10, 10)),
        ];

        assert_eq!(redraws(&mut tracker, &candidates), vec![2]);

        tracker.add_damage(vp(0, 0, 100, 100));
        assert_eq!(redraws(&mut tracker, &candidates), vec![2]);
    }

    #[test]
    fn zero_area_invalidate_still_draws_but_damages_nothing() {
        let mut tracker = DamageTracker::new();
        let candidates = [
            Candidate::settled(Sleep, vp(0, 0, 10, 10)),
            Candidate::settled(Invalidate, vp(5, 5, 0, 0)),
        ];

        let damage = tracker.compute(&candidates, None);
        assert_eq!(damage.redraws().collect::<Vec<_>>(), vec![1]);
        assert!(damage.regions().is_empty());
    }

    #[test]
    fn pending_damage_applies_once() {
        let mut tracker = DamageTracker::new();
        let candidates = [
            Candidate::settled(Sleep, vp(0, 0, 10, 10)),
            Candidate::settled(Sleep, vp(50, 50, 10, 10)),
        ];

        tracker.add_damage(vp(0, 0, 0, 0));
        assert!(!tracker.has_pending());

        tracker.add_damage(vp(2, 2, 2, 2));
        assert!(tracker.has_pending());
        let damage = tracker.compute(&candidates, None);
        assert_eq!(damage.redraws().collect::<Vec<_>>(), vec![0]);
        assert!(damage.regions().contains(&vp(2, 2, 2, 2)));

        assert!(tracker.compute(&candidates, None).is_empty());
    }

    #[test]
    fn moved_graphic_damages_old_region() {
        let mut tracker = DamageTracker::new();
        let moved = Candidate {
            action: Sleep,
            viewport: vp(50, 50, 10, 10),
            drawn_at: Some(vp(0, 0, 10, 10)),
        };
        let candidates = [Candidate::settled(Sleep, vp(5, 5, 10, 10)), moved];

        let damage = tracker.compute(&candidates, None);
        assert_eq!(damage.redraws().collect::<Vec<_>>(), vec![0, 1]);
        assert!(damage.regions().contains(&vp(0, 0, 10, 10)));
    }

    #[test]
    fn escalation_redraws_everything_visible() {
        let mut tracker = DamageTracker::new();
        let surface = vp(0, 0, 200, 200);
        let candidates = [
            Candidate::settled(Sleep, vp(0, 0, 10, 10)),
            Candidate::settled(Invalidate, vp(100, 100, 10, 10)),
            Candidate::settled(Sleep, vp(150, 0, 10, 10)),
            Candidate::settled(Sleep, vp(10, 10, 0, 0)),
        ];

        let damage = tracker.compute(&candidates, Some(surface));
        assert_eq!(damage.redraws().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(damage.regions()[0], surface);

        let idle = [Candidate::settled(Sleep, vp(0, 0, 10, 10))];
        assert!(tracker.compute(&idle, Some(surface)).is_empty());
    }
}
