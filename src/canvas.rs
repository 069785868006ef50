use glam::{Vec2, Vec3};

/// Straight-alpha RGBA color with channels in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb8a(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r: r as f32 / 255.0, g: g as f32 / 255.0, b: b as f32 / 255.0, a }
    }

    fn lerp(self, other: Rgba, t: f32) -> Rgba {
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// Samples a stop list sorted by offset. Outside the stop range the end colors extend.
pub fn sample_stops(stops: &[GradientStop], t: f32) -> Rgba {
    let Some(first) = stops.first() else {
        return Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let local = if span > 0.0 { (t - a.offset) / span } else { 0.0 };
            return a.color.lerp(b.color, local);
        }
    }
    stops[stops.len() - 1].color
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

#[inline]
fn blend_channel(src: f32, dst: u8, alpha: f32) -> u8 {
    let dst = dst as f32 / 255.0;
    to_u8(src * alpha + dst * (1.0 - alpha))
}

/// Offscreen 2D surface the sky is painted into. Row-major RGBA8, top row first, always opaque.
#[derive(Debug, Clone)]
pub struct SkyCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl SkyCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = vec![0; width as usize * height as usize * 4];
        for px in pixels.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self { width, height, pixels }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns true if the backing store was reallocated.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            return false;
        }
        *self = SkyCanvas::new(width, height);
        true
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    #[inline]
    fn blend_pixel(&mut self, x: u32, y: u32, color: Rgba, coverage: f32) {
        let alpha = (color.a * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let i = self.index(x, y);
        self.pixels[i] = blend_channel(color.r, self.pixels[i], alpha);
        self.pixels[i + 1] = blend_channel(color.g, self.pixels[i + 1], alpha);
        self.pixels[i + 2] = blend_channel(color.b, self.pixels[i + 2], alpha);
        self.pixels[i + 3] = 255;
    }

    /// Opaque top-to-bottom gradient over the whole canvas.
    pub fn fill_vertical_gradient(&mut self, top: Vec3, bottom: Vec3) {
        let height = self.height as f32;
        let row_bytes = self.width as usize * 4;
        for (y, row) in self.pixels.chunks_exact_mut(row_bytes).enumerate() {
            let t = (y as f32 + 0.5) / height;
            let c = top.lerp(bottom, t);
            let rgba = [to_u8(c.x), to_u8(c.y), to_u8(c.z), 255];
            for px in row.chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
    }

    /// Blends one color over every pixel.
    pub fn fill_overlay(&mut self, color: Rgba) {
        let alpha = color.a.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = blend_channel(color.r, px[0], alpha);
            px[1] = blend_channel(color.g, px[1], alpha);
            px[2] = blend_channel(color.b, px[2], alpha);
        }
    }

    /// Radial gradient disc spanning `inner_radius..outer_radius`, stop offsets mapped onto that span.
    /// Pixels inside the inner radius take the first stop color.
    pub fn fill_radial_gradient(
        &mut self,
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        stops: &[GradientStop],
    ) {
        if outer_radius <= 0.0 || stops.is_empty() {
            return;
        }
        let span = (outer_radius - inner_radius).max(f32::EPSILON);
        let Some((x0, y0, x1, y1)) = self.clip_box(
            center.x - outer_radius,
            center.y - outer_radius,
            center.x + outer_radius,
            center.y + outer_radius,
        ) else {
            return;
        };
        let outer_sq = outer_radius * outer_radius;
        for y in y0..y1 {
            let dy = y as f32 + 0.5 - center.y;
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - center.x;
                let dist_sq = dx * dx + dy * dy;
                if dist_sq > outer_sq {
                    continue;
                }
                let t = ((dist_sq.sqrt() - inner_radius) / span).max(0.0);
                let color = sample_stops(stops, t);
                self.blend_pixel(x, y, color, 1.0);
            }
        }
    }

    /// Anti-aliased segment whose color follows `stops` from `from` (offset 0) to `to` (offset 1).
    pub fn stroke_gradient_line(&mut self, from: Vec2, to: Vec2, width: f32, stops: &[GradientStop]) {
        if stops.is_empty() || width <= 0.0 {
            return;
        }
        let half = width * 0.5;
        let reach = half + 1.0;
        let Some((x0, y0, x1, y1)) = self.clip_box(
            from.x.min(to.x) - reach,
            from.y.min(to.y) - reach,
            from.x.max(to.x) + reach,
            from.y.max(to.y) + reach,
        ) else {
            return;
        };
        let axis = to - from;
        let len_sq = axis.length_squared().max(f32::EPSILON);
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let t = ((p - from).dot(axis) / len_sq).clamp(0.0, 1.0);
                let dist = p.distance(from + axis * t);
                let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let color = sample_stops(stops, t);
                self.blend_pixel(x, y, color, coverage);
            }
        }
    }

    /// Integer pixel rectangle `[x0, x1) x [y0, y1)` clipped to the canvas.
    fn clip_box(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Option<(u32, u32, u32, u32)> {
        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = (max_x.ceil().max(0.0) as u32).min(self.width);
        let y1 = (max_y.ceil().max(0.0) as u32).min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }
}
