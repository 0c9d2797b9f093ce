//! Left-hand wall following over a binary membership predicate.

use std::collections::HashSet;

use super::polygon::{Polygon, Winding};
use crate::api::FilterError;
use crate::buffer::{Selection, SelectionMask};
use crate::progress::{scan_rows, CancelFlag, Monitor, ProgressSink};

/// Headings in clockwise order on a y-down grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    const CLOCKWISE: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Rotate by `quarters` clockwise quarter turns (negative turns left).
    fn turn(self, quarters: i32) -> Direction {
        let i = self as i32 + quarters;
        Self::CLOCKWISE[i.rem_euclid(4) as usize]
    }
}

/// Tracer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSettings {
    /// Emit counter-clockwise hole boundaries.
    ///
    /// Default: `true`
    pub include_holes: bool,

    /// Drop polygons with fewer vertices than this.
    ///
    /// Default: `1` (keep single-pixel regions)
    pub min_points: usize,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            include_holes: true,
            min_points: 1,
        }
    }
}

impl TraceSettings {
    /// Default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to keep hole boundaries.
    #[inline]
    pub fn include_holes(mut self, enabled: bool) -> Self {
        self.include_holes = enabled;
        self
    }

    /// Minimum vertex count of an emitted polygon.
    #[inline]
    pub fn min_points(mut self, count: usize) -> Self {
        self.min_points = count;
        self
    }
}

/// Extracts boundary polygons from a selection.
///
/// The mask is scanned row-major. Every side of a foreground pixel that
/// faces background (or the image border) is a boundary edge. The first
/// edge not yet walked starts a contour, which is followed with the
/// background kept on the left until the walk returns to its start heading
/// in its first direction. Every edge passed on the way is recorded, so a
/// boundary is traced exactly once while a pixel may belong to several
/// boundaries: a ring one pixel wide yields both its outline and its hole.
///
/// The net number of quarter turns decides the winding: `+4` is an outer
/// boundary ([`Winding::Clockwise`]), `-4` a hole
/// ([`Winding::CounterClockwise`]). An isolated pixel is a single-point
/// clockwise polygon.
///
/// # Example
///
/// ```
/// use artpaint_filters::{SelectionMask, SelectionTracer, TraceSettings, Winding};
///
/// let mut mask = SelectionMask::new(3, 3).unwrap();
/// mask.set(1, 1, true);
///
/// let polygons = SelectionTracer::new(TraceSettings::new()).trace(&mask).unwrap();
/// assert_eq!(polygons.len(), 1);
/// assert_eq!(polygons[0].points(), &[(1, 1)]);
/// assert_eq!(polygons[0].winding(), Winding::Clockwise);
/// ```
#[derive(Clone)]
pub struct SelectionTracer<'a> {
    settings: TraceSettings,
    progress: Option<&'a dyn ProgressSink>,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> SelectionTracer<'a> {
    /// A tracer with no progress sink or cancel flag.
    pub fn new(settings: TraceSettings) -> Self {
        Self {
            settings,
            progress: None,
            cancel: None,
        }
    }

    /// Report progress to `sink`.
    #[inline]
    pub fn progress(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Poll `flag` between scanned rows.
    #[inline]
    pub fn cancel(mut self, flag: &'a CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Trace every boundary of `mask`.
    pub fn trace(&self, mask: &SelectionMask) -> Result<Vec<Polygon>, FilterError> {
        self.trace_predicate(mask, mask.width(), mask.height())
    }

    /// Trace every boundary of `selection` inside `width x height`.
    pub fn trace_predicate(
        &self,
        selection: &dyn Selection,
        width: u32,
        height: u32,
    ) -> Result<Vec<Polygon>, FilterError> {
        let walker = Walker {
            selection,
            width: width as i32,
            height: height as i32,
            step_limit: 4 * width as usize * height as usize + 4,
        };
        let monitor = Monitor::new(self.progress, self.cancel, height as usize);
        let mut visited = HashSet::new();
        let mut polygons = Vec::new();

        scan_rows(height, &monitor, |y| {
            for x in 0..width as i32 {
                let pixel = (x, y as i32);
                if !walker.is_set(pixel) {
                    continue;
                }
                for wall in Direction::CLOCKWISE {
                    let faces_background = !walker.is_set(walker.neighbour(pixel, wall));
                    if !faces_background || visited.contains(&(pixel, wall)) {
                        continue;
                    }
                    let polygon = walker.follow(pixel, wall, &mut visited);
                    if self.keeps(&polygon) {
                        polygons.push(polygon);
                    }
                }
            }
        })
        .inspect_err(|_| tracing::info!("Trace cancelled"))?;

        tracing::debug!(width, height, polygons = polygons.len(), "Trace finished");
        Ok(polygons)
    }

    fn keeps(&self, polygon: &Polygon) -> bool {
        polygon.len() >= self.settings.min_points
            && (self.settings.include_holes || polygon.winding() != Winding::CounterClockwise)
    }
}

/// A pixel side facing background.
type Edge = ((i32, i32), Direction);

struct Walker<'s> {
    selection: &'s dyn Selection,
    width: i32,
    height: i32,
    step_limit: usize,
}

impl Walker<'_> {
    #[inline]
    fn is_set(&self, (x, y): (i32, i32)) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height && self.selection.contains(x, y)
    }

    #[inline]
    fn neighbour(&self, (x, y): (i32, i32), dir: Direction) -> (i32, i32) {
        let (dx, dy) = dir.offset();
        (x + dx, y + dy)
    }

    /// Next move from `p` facing `heading`: left, straight, right, back.
    /// Every wall tried before the move is recorded in `visited`.
    fn step(
        &self,
        p: (i32, i32),
        heading: Direction,
        visited: &mut HashSet<Edge>,
    ) -> Option<(Direction, i32)> {
        for quarter in [-1, 0, 1, 2] {
            let dir = heading.turn(quarter);
            if self.is_set(self.neighbour(p, dir)) {
                return Some((dir, quarter));
            }
            visited.insert((p, dir));
        }
        None
    }

    /// Walk the boundary that starts with `wall` of `start` on the left.
    fn follow(&self, start: (i32, i32), wall: Direction, visited: &mut HashSet<Edge>) -> Polygon {
        let Some((first, _)) = self.step(start, wall.turn(1), visited) else {
            return Polygon::new(vec![start], Winding::Clockwise);
        };

        let mut points = vec![start];
        let mut turns = 0;
        let mut heading = first;
        let mut pos = self.neighbour(start, first);
        for _ in 0..self.step_limit {
            // The pixel we came from is always set, so a move exists.
            let Some((dir, quarter)) = self.step(pos, heading, visited) else {
                break;
            };
            turns += quarter;
            if pos == start && dir == first {
                return Polygon::new(points, Winding::from_turns(turns));
            }
            points.push(pos);
            heading = dir;
            pos = self.neighbour(pos, dir);
        }

        tracing::warn!(?start, ?wall, "Contour did not close");
        Polygon::new(points, Winding::Unknown)
    }
}
