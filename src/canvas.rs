use crate::error::Error;
use ndarray::{s, Array3};
use std::{
    convert::TryFrom,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Width and height of the device's square canvases.
pub(crate) const CANVAS_SIZE: usize = 240;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) struct Color {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Color {
    pub(crate) const BLACK: Self = Self::rgb(0, 0, 0);

    pub(crate) const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub(crate) const fn hex(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) struct Point {
    pub(crate) x: i32,
    pub(crate) y: i32,
}

impl Point {
    pub(crate) const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct PointStyle {
    pub(crate) color: Color,
    /// Clip the square to its inscribed circle.
    pub(crate) rounded: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct LineStyle {
    pub(crate) color: Color,
    pub(crate) width: u16,
    pub(crate) round_caps: bool,
}

/// The drawing surface the renderer targets.
pub(crate) trait Canvas {
    /// Fill a `size` x `size` square whose top-left corner is `origin`.
    fn draw_point(&mut self, origin: Point, size: u16, style: &PointStyle);

    fn draw_line(&mut self, points: [Point; 2], style: &LineStyle);

    fn clear(&mut self, color: Color);
}

/// An RGB pixel buffer, rows by columns by channel.
#[derive(Debug, Clone)]
pub(crate) struct RasterCanvas {
    pixels: Array3<u8>,
}

impl RasterCanvas {
    pub(crate) fn new(width: usize, height: usize, background: Color) -> Self {
        let mut canvas = Self {
            pixels: Array3::zeros((height, width, 3)),
        };
        canvas.clear(background);
        canvas
    }

    pub(crate) fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub(crate) fn height(&self) -> usize {
        self.pixels.dim().0
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let (row, col) = self.index(x, y)?;
        let px = self.pixels.slice(s![row, col, ..]);
        Some(Color::rgb(px[0], px[1], px[2]))
    }

    fn index(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let col = usize::try_from(x).ok().filter(|&col| col < self.width())?;
        let row = usize::try_from(y).ok().filter(|&row| row < self.height())?;
        Some((row, col))
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some((row, col)) = self.index(x, y) {
            let mut px = self.pixels.slice_mut(s![row, col, ..]);
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
        }
    }

    /// Stamp a `size` wide brush centered on `(cx, cy)`.
    fn stamp(&mut self, cx: i32, cy: i32, size: i32, round: bool, color: Color) {
        let half = size / 2;
        for dy in -half..=half {
            for dx in -half..=half {
                if round && dx * dx + dy * dy > half * half {
                    continue;
                }
                self.set_pixel(cx + dx, cy + dy, color);
            }
        }
    }

    /// Write the buffer as a binary (P6) PPM image.
    pub(crate) fn write_ppm<P>(&self, path: P) -> Result<(), Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let write = || -> std::io::Result<()> {
            let mut out = BufWriter::new(File::create(path)?);
            write!(out, "P6\n{} {}\n255\n", self.width(), self.height())?;
            let bytes = self.pixels.iter().copied().collect::<Vec<u8>>();
            out.write_all(&bytes)?;
            out.flush()
        };
        write().map_err(|e| Error::WriteCanvas(e, path.to_path_buf()))
    }
}

const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const ABOVE: u8 = 4;
const BELOW: u8 = 8;

/// Inclusive rectangle that line segments are cut down to before rasterizing.
#[derive(Debug, Copy, Clone)]
struct ClipRect {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl ClipRect {
    fn outcode(&self, (x, y): (i64, i64)) -> u8 {
        let mut code = 0;
        if x < self.min_x {
            code |= LEFT;
        } else if x > self.max_x {
            code |= RIGHT;
        }
        if y < self.min_y {
            code |= ABOVE;
        } else if y > self.max_y {
            code |= BELOW;
        }
        code
    }

    /// Cohen-Sutherland clipping. `None` when no part of the segment lies
    /// inside.
    fn clip(&self, mut a: (i64, i64), mut b: (i64, i64)) -> Option<((i64, i64), (i64, i64))> {
        let (mut code_a, mut code_b) = (self.outcode(a), self.outcode(b));
        // each pass pins one endpoint to an edge; rounding can cost one extra
        for _ in 0..8 {
            if code_a | code_b == 0 {
                return Some((a, b));
            }
            if code_a & code_b != 0 {
                return None;
            }
            let code = if code_a != 0 { code_a } else { code_b };
            let point = if code & ABOVE != 0 {
                (interpolate(a.0, b.0, a.1, b.1, self.min_y), self.min_y)
            } else if code & BELOW != 0 {
                (interpolate(a.0, b.0, a.1, b.1, self.max_y), self.max_y)
            } else if code & LEFT != 0 {
                (self.min_x, interpolate(a.1, b.1, a.0, b.0, self.min_x))
            } else {
                (self.max_x, interpolate(a.1, b.1, a.0, b.0, self.max_x))
            };
            if code == code_a {
                a = point;
                code_a = self.outcode(a);
            } else {
                b = point;
                code_b = self.outcode(b);
            }
        }
        None
    }
}

/// The `u` coordinate where the segment crosses `v == at`. Only called when
/// the endpoints straddle `at`, so `v0 != v1`.
fn interpolate(u0: i64, u1: i64, v0: i64, v1: i64, at: i64) -> i64 {
    let (u0, u1, v0, v1, at) = (
        i128::from(u0),
        i128::from(u1),
        i128::from(v0),
        i128::from(v1),
        i128::from(at),
    );
    (u0 + (u1 - u0) * (at - v0) / (v1 - v0)) as i64
}

impl Canvas for RasterCanvas {
    fn draw_point(&mut self, origin: Point, size: u16, style: &PointStyle) {
        let size = i32::from(size);
        for py in 0..size {
            for px in 0..size {
                if style.rounded {
                    // distance from the square's center, in half pixels
                    let cx = 2 * px + 1 - size;
                    let cy = 2 * py + 1 - size;
                    if cx * cx + cy * cy > size * size {
                        continue;
                    }
                }
                self.set_pixel(
                    origin.x.saturating_add(px),
                    origin.y.saturating_add(py),
                    style.color,
                );
            }
        }
    }

    fn draw_line(&mut self, [from, to]: [Point; 2], style: &LineStyle) {
        let width = i32::from(style.width.max(1));
        let half = i64::from(width / 2);
        let bounds = ClipRect {
            min_x: -half,
            min_y: -half,
            max_x: self.width() as i64 - 1 + half,
            max_y: self.height() as i64 - 1 + half,
        };
        let ((x0, y0), (x1, y1)) = match bounds.clip(
            (i64::from(from.x), i64::from(from.y)),
            (i64::from(to.x), i64::from(to.y)),
        ) {
            Some(segment) => segment,
            None => return,
        };

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        // clipped coordinates lie within a brush width of the canvas
        loop {
            self.stamp(x as i32, y as i32, width, style.round_caps, style.color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn clear(&mut self, color: Color) {
        for mut px in self.pixels.rows_mut() {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
        }
    }
}
