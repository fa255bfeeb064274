use std::fmt::Write as _;

/// Largest corner radius of an elbow edge.
pub const CORNER_RADIUS: f32 = 35.0;

type Point = (f32, f32);

#[derive(Default)]
struct PathData(String);

impl PathData {
    fn move_to(&mut self, (x, y): Point) -> &mut Self {
        let _ = write!(self.0, "M {x:.2} {y:.2}");
        self
    }

    fn line_to(&mut self, (x, y): Point) -> &mut Self {
        let _ = write!(self.0, " L {x:.2} {y:.2}");
        self
    }

    fn curve_to(&mut self, (c1x, c1y): Point, (c2x, c2y): Point, (x, y): Point) -> &mut Self {
        let _ = write!(
            self.0,
            " C {c1x:.2} {c1y:.2} {c2x:.2} {c2y:.2} {x:.2} {y:.2}"
        );
        self
    }

    fn finish(&mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

fn direction(delta: f32) -> f32 {
    if delta < 0.0 { -1.0 } else { 1.0 }
}

/// Elbow edge that leaves `s` vertically, runs horizontally at mid height and
/// enters `t` vertically. `m` is an optional lead-in point drawn before `s`;
/// `sy` pushes the horizontal run away from `s`.
pub fn diagonal(s: Point, t: Point, m: Option<Point>, sy: f32) -> String {
    let (x, y0) = s;
    let (ex, ey) = t;
    let (mx, my) = m.unwrap_or(s);
    let xrvs = direction(ex - x);
    let yrvs = direction(ey - y0);
    let y = y0 + sy;

    let r = CORNER_RADIUS
        .min((ex - x).abs() / 2.0)
        .min((ey - y).abs() / 2.0);
    let h = (ey - y).abs() / 2.0 - r;
    let w = (ex - x).abs() - r * 2.0;
    let run = y + h * yrvs + r * yrvs;

    PathData::default()
        .move_to((mx, my))
        .line_to((x, my))
        .line_to((x, y))
        .line_to((x, y + h * yrvs))
        .curve_to((x, run), (x, run), (x + r * xrvs, run))
        .line_to((x + w * xrvs + r * xrvs, run))
        .curve_to((ex, run), (ex, run), (ex, ey - h * yrvs))
        .line_to((ex, ey))
        .finish()
}

/// Horizontal counterpart of [`diagonal`] for left/right layouts.
pub fn hdiagonal(s: Point, t: Point, m: Option<Point>) -> String {
    let (x, y) = s;
    let (ex, ey) = t;
    let (mx, my) = m.unwrap_or(s);
    let xrvs = direction(ex - x);
    let yrvs = direction(ey - y);

    let r = CORNER_RADIUS
        .min((ex - x).abs() / 2.0)
        .min((ey - y).abs() / 2.0);
    let w = (ex - x).abs() / 2.0 - r;
    let run = x + w * xrvs + r * xrvs;

    PathData::default()
        .move_to((mx, my))
        .line_to((mx, y))
        .line_to((x, y))
        .line_to((x + w * xrvs, y))
        .curve_to((run, y), (run, y), (run, y + r * yrvs))
        .line_to((run, ey - r * yrvs))
        .curve_to((run, ey), (run, ey), (ex - w * xrvs, ey))
        .line_to((ex, ey))
        .finish()
}

/// Smooth horizontal-tangent curve, used for cross-links between nodes.
pub fn link_horizontal(s: Point, t: Point) -> String {
    let mid = (s.0 + t.0) / 2.0;
    PathData::default()
        .move_to(s)
        .curve_to((mid, s.1), (mid, t.1), t)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_runs_from_child_to_parent() {
        let d = diagonal((100.0, 200.0), (0.0, 0.0), None, 0.0);
        assert!(d.starts_with("M 100.00 200.00"), "{d}");
        assert!(d.ends_with("L 0.00 0.00"), "{d}");
        assert_eq!(d.matches(" C ").count(), 2);
    }

    #[test]
    fn diagonal_clamps_corner_radius() {
        // 10 px apart horizontally: radius shrinks to 5
        let d = diagonal((10.0, 100.0), (0.0, 0.0), None, 0.0);
        assert!(d.contains("L 5.00 50.00"), "{d}");
    }

    #[test]
    fn diagonal_uses_lead_in_point() {
        let d = diagonal((50.0, 100.0), (0.0, 0.0), Some((80.0, 120.0)), 0.0);
        assert!(d.starts_with("M 80.00 120.00 L 50.00 120.00 L 50.00 100.00"), "{d}");
    }

    #[test]
    fn straight_vertical_edge_has_no_sideways_run() {
        let d = diagonal((0.0, 210.0), (0.0, 150.0), None, 0.0);
        assert!(d.contains("L 0.00 180.00"), "{d}");
        assert!(!d.contains("NaN"));
    }

    #[test]
    fn hdiagonal_bends_at_mid_width() {
        let d = hdiagonal((0.0, 100.0), (200.0, 0.0), None);
        assert!(d.starts_with("M 0.00 100.00"), "{d}");
        assert!(d.contains("L 65.00 100.00"), "{d}");
        assert!(d.ends_with("L 200.00 0.00"), "{d}");
    }

    #[test]
    fn link_horizontal_curve() {
        assert_eq!(
            link_horizontal((0.0, 0.0), (100.0, 50.0)),
            "M 0.00 0.00 C 50.00 0.00 50.00 50.00 100.00 50.00"
        );
    }
}
