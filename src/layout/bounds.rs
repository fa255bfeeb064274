use super::*;

/// Padding added around fitted nodes.
pub const FIT_PADDING: f32 = 50.0;
/// Share of the viewport the fitted nodes may fill.
pub const FIT_FILL: f32 = 0.9;
pub const MAX_FIT_SCALE: f32 = 8.0;
pub const ZOOM_IN_FACTOR: f32 = 1.3;
pub const ZOOM_OUT_FACTOR: f32 = 0.78;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub animate: bool,
    /// Rescale to fill the viewport; otherwise keep the current scale.
    pub scale: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            animate: true,
            scale: true,
        }
    }
}

/// Orientation-aware bounding box of node rectangles.
pub fn compute_bounds<'a>(
    nodes: impl IntoIterator<Item = &'a NodeLayout>,
    binding: &LayoutBinding,
) -> Option<Bounds> {
    let mut bounds: Option<Bounds> = None;
    for node in nodes {
        let (min_x, max_x, min_y, max_y) = binding.extents(&node.node_box());
        if ![min_x, max_x, min_y, max_y].iter().all(|v| v.is_finite()) {
            continue;
        }
        bounds = Some(match bounds {
            None => Bounds {
                min_x,
                max_x,
                min_y,
                max_y,
            },
            Some(b) => Bounds {
                min_x: b.min_x.min(min_x),
                max_x: b.max_x.max(max_x),
                min_y: b.min_y.min(min_y),
                max_y: b.max_y.max(max_y),
            },
        });
    }
    bounds
}

/// Transform that centers `bounds` in the viewport, optionally scaling it to
/// fill 90% of the tighter axis.
pub fn fit_transform(
    bounds: Bounds,
    viewport_width: f32,
    viewport_height: f32,
    options: FitOptions,
    current_scale: f32,
) -> ViewportTransform {
    let x0 = bounds.min_x - FIT_PADDING;
    let x1 = bounds.max_x + FIT_PADDING;
    let y0 = bounds.min_y - FIT_PADDING;
    let y1 = bounds.max_y + FIT_PADDING;

    let mut scale = current_scale;
    if options.scale && viewport_width > 0.0 && viewport_height > 0.0 {
        let ratio = ((x1 - x0) / viewport_width).max((y1 - y0) / viewport_height);
        let fitted = (FIT_FILL / ratio).min(MAX_FIT_SCALE);
        if fitted.is_finite() && fitted > 0.0 {
            scale = fitted;
        }
    }
    if !scale.is_finite() || scale <= 0.0 {
        scale = 1.0;
    }

    let translate_x = viewport_width / 2.0 - scale * (x0 + x1) / 2.0;
    let translate_y = viewport_height / 2.0 - scale * (y0 + y1) / 2.0;
    ViewportTransform {
        translate_x: finite_or(translate_x, 0.0),
        translate_y: finite_or(translate_y, 0.0),
        scale,
        animate: options.animate,
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Pan/zoom state of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale_extent: [f32; 2],
    pub transform: ViewportTransform,
}

impl Viewport {
    pub fn new(width: f32, height: f32, scale_extent: [f32; 2]) -> Self {
        Self {
            width,
            height,
            scale_extent,
            transform: ViewportTransform::default(),
        }
    }

    /// Fits `bounds`, or centers the origin when there is nothing to fit.
    pub fn fit(&mut self, bounds: Option<Bounds>, options: FitOptions) -> ViewportTransform {
        let transform = match bounds {
            Some(bounds) => {
                let mut t = fit_transform(
                    bounds,
                    self.width,
                    self.height,
                    options,
                    self.transform.scale,
                );
                t.scale = self.clamp(t.scale);
                t
            }
            None => ViewportTransform {
                translate_x: self.width / 2.0,
                translate_y: self.height / 2.0,
                scale: self.transform.scale,
                animate: options.animate,
            },
        };
        self.transform = transform;
        transform
    }

    /// Zooms about the viewport center. Negative scales reset to 1.
    pub fn zoom(&mut self, scale: f32) -> ViewportTransform {
        let target = if scale < 0.0 || !scale.is_finite() { 1.0 } else { scale };
        let target = self.clamp(target);
        let (cx, cy) = (self.width / 2.0, self.height / 2.0);
        let t = self.transform;
        let ratio = target / t.scale;
        self.transform = ViewportTransform {
            translate_x: cx - (cx - t.translate_x) * ratio,
            translate_y: cy - (cy - t.translate_y) * ratio,
            scale: target,
            animate: true,
        };
        self.transform
    }

    pub fn zoom_in(&mut self) -> ViewportTransform {
        self.zoom(self.transform.scale * ZOOM_IN_FACTOR)
    }

    pub fn zoom_out(&mut self) -> ViewportTransform {
        self.zoom(self.transform.scale * ZOOM_OUT_FACTOR)
    }

    fn clamp(&self, scale: f32) -> f32 {
        let [lo, hi] = self.scale_extent;
        if lo <= hi { scale.clamp(lo, hi) } else { scale }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn bounds(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Bounds {
        Bounds {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    #[test]
    fn fits_four_hundred_by_three_hundred() {
        let t = fit_transform(
            bounds(0.0, 400.0, 0.0, 300.0),
            800.0,
            600.0,
            FitOptions::default(),
            1.0,
        );
        // padded to 500 x 400 -> max(0.625, 0.667) -> 0.9 / 0.667
        assert!((t.scale - 1.35).abs() < EPS, "{}", t.scale);
        assert!((t.translate_x - (400.0 - 1.35 * 200.0)).abs() < 1e-2);
        assert!((t.translate_y - (300.0 - 1.35 * 150.0)).abs() < 1e-2);
        assert!(t.animate);
    }

    #[test]
    fn tiny_bounds_cap_at_max_scale() {
        let t = fit_transform(bounds(0.0, 0.0, 0.0, 0.0), 8000.0, 6000.0, FitOptions::default(), 1.0);
        assert_eq!(t.scale, MAX_FIT_SCALE);
    }

    #[test]
    fn keeps_scale_when_not_requested() {
        let options = FitOptions {
            animate: false,
            scale: false,
        };
        let t = fit_transform(bounds(-50.0, 50.0, 0.0, 100.0), 800.0, 600.0, options, 0.5);
        assert_eq!(t.scale, 0.5);
        assert_eq!(t.translate_x, 400.0);
        assert_eq!(t.translate_y, 300.0 - 0.5 * 50.0);
    }

    #[test]
    fn zero_viewport_never_yields_nan() {
        let t = fit_transform(bounds(0.0, 10.0, 0.0, 10.0), 0.0, 0.0, FitOptions::default(), 1.0);
        assert!(t.scale.is_finite() && t.translate_x.is_finite() && t.translate_y.is_finite());
    }

    #[test]
    fn zoom_clamps_and_resets_negative() {
        let mut viewport = Viewport::new(800.0, 600.0, [0.5, 4.0]);
        assert_eq!(viewport.zoom(10.0).scale, 4.0);
        assert_eq!(viewport.zoom(-3.0).scale, 1.0);
        let zoomed = viewport.zoom_in();
        assert!((zoomed.scale - 1.3).abs() < EPS);
        let zoomed = viewport.zoom_out();
        assert!((zoomed.scale - 1.3 * 0.78).abs() < EPS);
    }

    #[test]
    fn zoom_keeps_viewport_center_fixed() {
        let mut viewport = Viewport::new(800.0, 600.0, [0.001, 20.0]);
        let t = viewport.zoom(2.0);
        // content point under the center before zooming: (400, 300)
        assert!((t.translate_x + 400.0 * 2.0 - 400.0).abs() < EPS);
        assert!((t.translate_y + 300.0 * 2.0 - 300.0).abs() < EPS);
    }

    #[test]
    fn empty_fit_centers_origin() {
        let mut viewport = Viewport::new(800.0, 600.0, [0.001, 20.0]);
        let t = viewport.fit(None, FitOptions::default());
        assert_eq!((t.translate_x, t.translate_y, t.scale), (400.0, 300.0, 1.0));
    }
}
