/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;
use stlview_core::projection::project_to_screen;
use stlview_core::{Camera, Triangle};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// ASCII renderer that turns triangle streams into terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// Rasterize every triangle, in order. Returns how many reached the screen.
    pub fn render<I>(&mut self, triangles: I, model_matrix: &Matrix4<f32>, camera: &Camera) -> usize
    where
        I: IntoIterator<Item = Triangle>,
    {
        let mvp = camera.view_projection() * model_matrix;
        triangles
            .into_iter()
            .filter(|triangle| self.render_triangle(triangle, model_matrix, &mvp))
            .count()
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model_matrix: &Matrix4<f32>,
        mvp: &Matrix4<f32>,
    ) -> bool {
        let Some(screen_coords) = self.project(triangle, mvp) else {
            return false; // Triangle is clipped
        };

        // Two-sided Lambert shading against a light at the eye
        let normal = model_matrix
            .transform_vector(&triangle.normal())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        let brightness = normal.dot(&Vector3::z()).abs();

        // Skip the blank slot so edge-on faces stay visible
        let steps = (LUMINOSITY_RAMP.len() - 2) as f32;
        let char_index = 1 + (brightness * steps).round() as usize;
        let character = LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)];

        self.rasterize_triangle(&screen_coords, character);
        true
    }

    fn project(&self, triangle: &Triangle, mvp: &Matrix4<f32>) -> Option<[(f32, f32, f32); 3]> {
        let mut coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in coords.iter_mut().zip(&triangle.vertices) {
            *slot = project_to_screen(
                &vertex.position,
                mvp,
                self.width as u32,
                self.height as u32,
            )?;
        }
        Some(coords)
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    // Degenerate on screen
                    return;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            writer.queue(MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    _ => Color::Cyan,
                };
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use stlview_core::Vertex;

    fn facing_triangle(z: f32) -> Triangle {
        Triangle::new(
            Vertex::new(-1.0, -1.0, z),
            Vertex::new(1.0, -1.0, z),
            Vertex::new(0.0, 1.0, z),
        )
    }

    #[test]
    fn test_barycentric_centroid() {
        let (w0, w1, w2) =
            barycentric((0.0, 0.0), (3.0, 0.0), (0.0, 3.0), (1.0, 1.0)).unwrap();
        assert_relative_eq!(w0, 1.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(w1, 1.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(w2, 1.0 / 3.0, epsilon = 1e-6);

        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)).is_none());
    }

    #[test]
    fn test_facing_triangle_is_brightest() {
        let camera = Camera::new(40, 20);
        let mut renderer = AsciiRenderer::new(40, 20);
        let drawn = renderer.render([facing_triangle(0.0)], &Matrix4::identity(), &camera);

        assert_eq!(drawn, 1);
        assert_eq!(renderer.char_at(20, 10), Some('@'));
        assert_eq!(renderer.char_at(0, 0), Some(' '));
    }

    #[test]
    fn test_nearer_triangle_wins() {
        let camera = Camera::new(40, 20);
        let mut renderer = AsciiRenderer::new(40, 20);
        let tilted = Triangle::new(
            Vertex::new(-1.0, -1.0, 1.0),
            Vertex::new(1.0, -1.0, 1.0),
            Vertex::new(0.0, 1.0, 0.0),
        );
        renderer.render([facing_triangle(-1.0), tilted], &Matrix4::identity(), &camera);

        let c = renderer.char_at(20, 10).unwrap();
        assert_ne!(c, '@');
        assert_ne!(c, ' ');
    }

    #[test]
    fn test_clipped_triangle_is_skipped() {
        let camera = Camera::new(40, 20);
        let mut renderer = AsciiRenderer::new(40, 20);
        let drawn = renderer.render([facing_triangle(10.0)], &Matrix4::identity(), &camera);
        assert_eq!(drawn, 0);
    }

    #[test]
    fn test_resize_and_clear() {
        let camera = Camera::new(40, 20);
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render([facing_triangle(0.0)], &Matrix4::identity(), &camera);

        renderer.resize(10, 4);
        assert_eq!((renderer.width(), renderer.height()), (10, 4));
        assert_eq!(renderer.char_at(9, 3), Some(' '));
        assert_eq!(renderer.char_at(10, 0), None);

        renderer.render([facing_triangle(0.0)], &Matrix4::identity(), &Camera::new(10, 4));
        renderer.clear();
        assert!((0..4).all(|y| (0..10).all(|x| renderer.char_at(x, y) == Some(' '))));
    }

    #[test]
    fn test_draw_writes_every_cell() {
        let renderer = AsciiRenderer::new(3, 2);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(' ').count(), 6);
    }
}
