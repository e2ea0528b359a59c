//! Rational media timestamps and the trim/scope window math.
//!
//! All positions on the movie timeline are kept as `value / timescale`
//! rationals so repeated window arithmetic never accumulates float drift.
//! Comparisons and arithmetic cross-multiply through `i128`, so two times
//! expressed in different timescales compare by their rational value.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A position (or span) on a single monotonic media timeline.
///
/// `value` counts ticks of `1 / timescale` seconds. Negative values are
/// legal: the scope clamp near time zero can push `scope_start` below the
/// timeline origin (see [`TimeWindow::recompute_scope`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MediaTime {
    value: i64,
    timescale: i32,
}

impl MediaTime {
    /// Create a time from raw tick value and timescale.
    pub fn new(value: i64, timescale: i32) -> Self {
        debug_assert!(timescale > 0, "timescale must be positive");
        Self { value, timescale }
    }

    /// Create a time from seconds, rounded to the nearest tick.
    pub fn from_seconds(seconds: f64, timescale: i32) -> Self {
        Self {
            value: (seconds * f64::from(timescale)).round() as i64,
            timescale,
        }
    }

    /// The zero position.
    pub fn zero() -> Self {
        Self {
            value: 0,
            timescale: 1,
        }
    }

    /// Raw tick value.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Ticks per second.
    pub fn timescale(&self) -> i32 {
        self.timescale
    }

    /// The time as floating-point seconds (display and ffmpeg args only).
    pub fn seconds(&self) -> f64 {
        self.value as f64 / f64::from(self.timescale)
    }

    /// Re-express this time in another timescale, rounding to nearest.
    pub fn rescale(&self, timescale: i32) -> Self {
        if timescale == self.timescale {
            return *self;
        }
        let num = i128::from(self.value) * i128::from(timescale);
        let den = i128::from(self.timescale);
        // round half away from zero
        let half = den / 2;
        let rounded = if num >= 0 {
            (num + half) / den
        } else {
            (num - half) / den
        };
        Self {
            value: rounded as i64,
            timescale,
        }
    }

    /// Raise the timescale to at least `min_timescale`.
    ///
    /// A poster grabbed at t=0 can arrive with timescale 1, which is far
    /// too coarse for sub-second window math; everything downstream wants
    /// at least the usual 600.
    pub fn promote_timescale(&self, min_timescale: i32) -> Self {
        if self.timescale >= min_timescale {
            *self
        } else {
            self.rescale(min_timescale)
        }
    }

    /// Clamp to zero from below.
    pub fn clamped_to_zero(self) -> Self {
        self.max(Self::zero())
    }

    /// `mm:ss.cc` display form, used for on-screen time labels.
    pub fn to_mmss(&self) -> String {
        let (sign, secs) = self.sign_split();
        let minutes = (secs / 60.0) as u64;
        let seconds = secs % 60.0;
        format!("{}{:02}:{:05.2}", sign, minutes, seconds)
    }

    /// `mm.ss.cc` filename-safe form, used in output basenames.
    pub fn to_filename_component(&self) -> String {
        let (sign, secs) = self.sign_split();
        let minutes = (secs / 60.0) as u64;
        let seconds = (secs % 60.0) as u64;
        let centis = ((secs % 1.0) * 100.0).round() as u64;
        format!("{}{:02}.{:02}.{:02}", sign, minutes, seconds, centis.min(99))
    }

    fn sign_split(&self) -> (&'static str, f64) {
        let secs = self.seconds();
        if secs < 0.0 { ("-", -secs) } else { ("", secs) }
    }

    fn common(self, other: Self) -> (i64, i64, i32) {
        let timescale = self.timescale.max(other.timescale);
        (
            self.rescale(timescale).value,
            other.rescale(timescale).value,
            timescale,
        )
    }
}

impl PartialEq for MediaTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MediaTime {}

impl PartialOrd for MediaTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaTime {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.value) * i128::from(other.timescale);
        let rhs = i128::from(other.value) * i128::from(self.timescale);
        lhs.cmp(&rhs)
    }
}

impl Add for MediaTime {
    type Output = MediaTime;

    fn add(self, other: Self) -> Self {
        let (a, b, timescale) = self.common(other);
        Self::new(a + b, timescale)
    }
}

impl Sub for MediaTime {
    type Output = MediaTime;

    fn sub(self, other: Self) -> Self {
        let (a, b, timescale) = self.common(other);
        Self::new(a - b, timescale)
    }
}

impl fmt::Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_mmss())
    }
}

/// A half-open-by-convention time range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: MediaTime,
    pub end: MediaTime,
}

impl TimeRange {
    pub fn new(start: MediaTime, end: MediaTime) -> Self {
        Self { start, end }
    }

    /// Range duration (may be negative for degenerate input).
    pub fn duration(&self) -> MediaTime {
        self.end - self.start
    }

    /// Inclusive containment check.
    pub fn contains(&self, time: MediaTime) -> bool {
        self.start <= time && time <= self.end
    }
}

/// Poster/trim/scope timestamps for one pairing.
///
/// Invariant: `start <= poster <= end`. The scope window additionally
/// maintains a minimum duration even when the trim window collapses
/// against an asset bound; see [`TimeWindow::recompute_scope`]. The
/// export pipeline reads this struct but never mutates it; only
/// explicit user-driven bound changes go through [`TimeWindow::set_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub poster: MediaTime,
    pub start: MediaTime,
    pub end: MediaTime,
    pub scope_start: MediaTime,
    pub scope_end: MediaTime,
}

impl TimeWindow {
    /// Build the initial window around a poster frame.
    ///
    /// `start = max(0, poster - half_span)`, `end = min(duration, poster +
    /// half_span)`, then the scope is derived for `min_scope_duration`.
    pub fn initial(
        poster: MediaTime,
        duration: MediaTime,
        half_span: MediaTime,
        min_scope_duration: MediaTime,
    ) -> Self {
        let start = (poster - half_span).clamped_to_zero();
        let end = (poster + half_span).min(duration);
        let mut window = Self {
            poster,
            start,
            end,
            scope_start: start,
            scope_end: end,
        };
        window.recompute_scope(duration, min_scope_duration);
        window
    }

    /// Apply a user-driven bound change and re-derive the scope.
    ///
    /// The trim bounds are clamped into `[0, duration]`; the scope bounds
    /// are not (see `recompute_scope`).
    pub fn set_bounds(
        &mut self,
        start: MediaTime,
        end: MediaTime,
        duration: MediaTime,
        min_scope_duration: MediaTime,
    ) {
        self.start = start.clamped_to_zero();
        self.end = end.min(duration);
        self.recompute_scope(duration, min_scope_duration);
    }

    /// Re-derive the scope window from the trim bounds.
    ///
    /// The clamp is asymmetric: when the trim window touches the timeline
    /// origin the *end* stays fixed and the scope extends backward
    /// (`scope_start = end - min_scope_duration`); when it touches the
    /// asset's end the *start* stays fixed and the scope extends forward.
    /// A poster close to zero on a short asset can therefore produce a
    /// negative `scope_start`. That value is preserved, not clamped; the
    /// trim bounds are what get zero-clamped where they are consumed.
    pub fn recompute_scope(&mut self, duration: MediaTime, min_scope_duration: MediaTime) {
        let zero = MediaTime::zero();
        if self.start.max(zero) == zero {
            // trim window pinned against the origin
            self.scope_start = self.end - min_scope_duration;
            self.scope_end = self.end;
        } else if self.end.min(duration) == duration {
            // trim window pinned against the asset end
            self.scope_start = self.start;
            self.scope_end = self.start + min_scope_duration;
        } else {
            self.scope_start = self.start;
            self.scope_end = self.end;
        }
    }

    /// The trim range, clamped into the asset's bounds for the exporters.
    pub fn trim_range(&self, duration: MediaTime) -> TimeRange {
        TimeRange::new(self.start.clamped_to_zero(), self.end.min(duration))
    }

    /// The scope range as currently derived (possibly out of bounds).
    pub fn scope_range(&self) -> TimeRange {
        TimeRange::new(self.scope_start, self.scope_end)
    }

    /// Whether a proposed scope drag keeps the poster inside the scope.
    ///
    /// Drags that would move the scope off the poster frame are refused by
    /// the caller before any bound change is applied.
    pub fn permits_scope(&self, proposed: TimeRange) -> bool {
        proposed.contains(self.poster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(seconds: f64) -> MediaTime {
        MediaTime::from_seconds(seconds, 600)
    }

    #[test]
    fn compares_across_timescales() {
        let a = MediaTime::new(600, 600); // 1.0s
        let b = MediaTime::new(30, 30); // 1.0s
        assert_eq!(a, b);
        assert!(MediaTime::new(601, 600) > b);
        assert!(MediaTime::new(-1, 600) < MediaTime::zero());
    }

    #[test]
    fn arithmetic_uses_common_timescale() {
        let a = MediaTime::new(600, 600);
        let b = MediaTime::new(1, 2); // 0.5s
        let sum = a + b;
        assert_eq!(sum, MediaTime::from_seconds(1.5, 600));
        assert_eq!((a - b), MediaTime::from_seconds(0.5, 600));
    }

    #[test]
    fn promote_timescale_raises_coarse_clocks() {
        let coarse = MediaTime::new(0, 1);
        let promoted = coarse.promote_timescale(600);
        assert_eq!(promoted.timescale(), 600);
        assert_eq!(promoted.value(), 0);

        let fine = MediaTime::new(44_100, 44_100);
        assert_eq!(fine.promote_timescale(600).timescale(), 44_100);
    }

    #[test]
    fn display_formats() {
        assert_eq!(t(90.25).to_mmss(), "01:30.25");
        assert_eq!(t(90.25).to_filename_component(), "01.30.25");
        assert_eq!(t(-1.0).to_mmss(), "-00:01.00");
        assert_eq!(t(30.0).to_filename_component(), "00.30.00");
    }

    #[test]
    fn initial_window_bounds_poster() {
        // poster 30.0s, duration 60s, half span 1.5s: untouched bounds
        let w = TimeWindow::initial(t(30.0), t(60.0), t(1.5), t(3.0));
        assert_eq!(w.start, t(28.5));
        assert_eq!(w.end, t(31.5));
        assert!(w.start <= w.poster && w.poster <= w.end);
        // neither bound touched: scope equals trim
        assert_eq!(w.scope_start, t(28.5));
        assert_eq!(w.scope_end, t(31.5));
    }

    #[test]
    fn initial_window_stays_within_asset() {
        for poster in [0.0, 0.4, 30.0, 59.9, 60.0] {
            let w = TimeWindow::initial(t(poster), t(60.0), t(1.5), t(3.0));
            assert!(w.start >= MediaTime::zero());
            assert!(w.end <= t(60.0));
            assert!(w.start <= w.poster && w.poster <= w.end);
        }
    }

    #[test]
    fn scope_clamped_at_origin_anchors_end() {
        // poster 0.5s: start clamps to 0, end = 2.0s
        let w = TimeWindow::initial(t(0.5), t(60.0), t(1.5), t(3.0));
        assert_eq!(w.start, t(0.0));
        assert_eq!(w.end, t(2.0));
        // underflow absorbed backward from the fixed end; the negative
        // scope_start is preserved
        assert_eq!(w.scope_end, w.end);
        assert_eq!(w.scope_start, t(-1.0));
        assert_eq!(w.scope_range().duration(), t(3.0));
    }

    #[test]
    fn scope_clamped_at_asset_end_anchors_start() {
        let w = TimeWindow::initial(t(59.5), t(60.0), t(1.5), t(3.0));
        assert_eq!(w.start, t(58.0));
        assert_eq!(w.end, t(60.0));
        assert_eq!(w.scope_start, w.start);
        assert_eq!(w.scope_end, t(61.0));
        assert_eq!(w.scope_range().duration(), t(3.0));
    }

    #[test]
    fn trim_range_clamps_but_scope_does_not() {
        let mut w = TimeWindow::initial(t(0.5), t(60.0), t(1.5), t(3.0));
        w.set_bounds(t(-2.0), t(2.0), t(60.0), t(3.0));
        let trim = w.trim_range(t(60.0));
        assert_eq!(trim.start, t(0.0));
        assert_eq!(trim.end, t(2.0));
        assert!(w.scope_start < MediaTime::zero());
    }

    #[test]
    fn scope_drag_must_keep_poster() {
        let w = TimeWindow::initial(t(30.0), t(60.0), t(1.5), t(3.0));
        assert!(w.permits_scope(TimeRange::new(t(29.0), t(32.0))));
        assert!(!w.permits_scope(TimeRange::new(t(31.0), t(34.0))));
        // poster on the boundary still counts as contained
        assert!(w.permits_scope(TimeRange::new(t(30.0), t(33.0))));
    }
}
