/// Terminal host for the mesh viewer
use crossterm::{
    cursor,
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use nalgebra::Matrix4;
use std::io::{self, stdout, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stlview_core::{Camera, DrawPass, MeshBatch, RenderList, RotationState, Transform};

pub mod config;
pub mod loader;
pub mod renderer;

pub use config::ViewerConfig;
pub use loader::{parse_dropped_path, BackgroundLoader, LoadOutcome};
pub use renderer::AsciiRenderer;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: u32 = 2;

/// Main application struct for terminal mesh viewing
pub struct TerminalApp {
    config: ViewerConfig,
    list: Arc<RenderList>,
    loader: BackgroundLoader,
    camera: Camera,
    renderer: AsciiRenderer,
    fit: FitCache,
    auto_rotate: bool,
    running: bool,
    status: String,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

/// Fit transform of the batch being drawn, rebuilt when the batch changes
struct FitCache {
    batch: Option<Arc<MeshBatch>>,
    matrix: Matrix4<f32>,
}

impl FitCache {
    fn new() -> Self {
        Self {
            batch: None,
            matrix: Matrix4::identity(),
        }
    }

    fn matrix_for(&mut self, pass: &DrawPass) -> Matrix4<f32> {
        let same = match (&self.batch, pass.batch()) {
            (Some(cached), Some(drawn)) => Arc::ptr_eq(cached, drawn),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.batch = pass.batch().cloned();
            self.matrix = self
                .batch
                .as_deref()
                .and_then(MeshBatch::bounds)
                .map_or_else(Matrix4::identity, |bounds| Transform::fit_matrix(&bounds));
        }
        self.matrix
    }
}

impl TerminalApp {
    pub fn new(config: ViewerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let list = Arc::new(RenderList::new());

        Ok(Self {
            loader: BackgroundLoader::new(Arc::clone(&list)),
            list,
            camera: Camera::new(width as u32, height as u32 * CELL_ASPECT)
                .with_distance(config.camera_distance)
                .with_fov(config.fov_radians()),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            fit: FitCache::new(),
            auto_rotate: config.auto_rotate,
            running: true,
            status: "Drop an STL file onto the terminal to load it".to_string(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            config,
        })
    }

    /// Queue a file for loading; the current model stays up meanwhile
    pub fn open(&mut self, path: PathBuf) -> io::Result<()> {
        self.status = format!("Loading {}...", path.display());
        self.loader.request(path)
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableBracketedPaste,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableBracketedPaste,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_secs(1) / self.config.fps.max(1);
        log::info!("render loop started at {} fps", self.config.fps);

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?)?;
            }

            // Update
            self.update();

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        log::info!("render loop stopped");
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(width, height) => {
                log::debug!("resized to {}x{}", width, height);
                self.renderer.resize(width as usize, height as usize);
                self.camera
                    .set_viewport(width as u32, height as u32 * CELL_ASPECT);
                execute!(stdout(), terminal::Clear(ClearType::All))?;
            }
            Event::Paste(text) => match parse_dropped_path(&text) {
                Some(path) => self.open(path)?,
                None => {
                    log::debug!("ignoring paste that is not a path: {:?}", text);
                    self.status = "Pasted text is not a file path".to_string();
                }
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }

        let step = self.config.rotate_step;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('w') | KeyCode::Up => self.list.rotate(step, 0.0),
            KeyCode::Char('s') | KeyCode::Down => self.list.rotate(-step, 0.0),
            KeyCode::Char('a') | KeyCode::Left => self.list.rotate(0.0, -step),
            KeyCode::Char('d') | KeyCode::Right => self.list.rotate(0.0, step),
            KeyCode::Char(' ') => self.auto_rotate = !self.auto_rotate,
            KeyCode::Char('r') => self.list.set_rotation(RotationState::zero()),
            KeyCode::Char('c') => {
                self.list.clear();
                self.status = "Model unloaded".to_string();
            }
            _ => {}
        }
    }

    fn update(&mut self) {
        while let Some(outcome) = self.loader.poll() {
            self.status = match &outcome {
                LoadOutcome::Loaded { path, triangles } => {
                    format!("{} ({} triangles)", path.display(), triangles)
                }
                LoadOutcome::Failed { error, .. } => format!("Load failed: {error}"),
                LoadOutcome::Superseded { .. } => continue,
            };
        }

        if self.auto_rotate {
            self.list.rotate(self.config.spin_x, self.config.spin_y);
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let pass = self.list.draw();
        let triangles = pass.len();
        let model = Transform::rotation_matrix(&self.list.rotation()) * self.fit.matrix_for(&pass);

        self.renderer.clear();
        self.renderer.render(pass, &model, &self.camera);

        let mut stdout = stdout();
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let (width, _) = terminal::size()?;
        let mut overlay = format!(
            "stlview | FPS: {:.1} | {} triangles | WASD/Arrows=Rotate Space=Spin R=Reset C=Clear Q=Quit | {}",
            self.fps, triangles, self.status
        );
        if let Some((cut, _)) = overlay.char_indices().nth(width as usize) {
            overlay.truncate(cut);
        }
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(overlay),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use stlview_core::{Triangle, Vertex};

    fn batch_between(min: f32, max: f32) -> MeshBatch {
        MeshBatch::new(vec![Triangle::new(
            Vertex::new(min, min, min),
            Vertex::new(max, min, min),
            Vertex::new(max, max, max),
        )])
    }

    #[test]
    fn test_fit_follows_drawn_batch() {
        let list = RenderList::new();
        let mut fit = FitCache::new();
        assert_relative_eq!(fit.matrix_for(&list.draw()), Matrix4::identity());

        list.submit(batch_between(0.0, 2.0));
        let first = list.draw();

        // Swap lands after the pass was taken
        list.submit(batch_between(10.0, 20.0));
        let m = fit.matrix_for(&first);
        assert_relative_eq!(m.transform_point(&Point3::new(1.0, 1.0, 1.0)), Point3::origin());

        let m = fit.matrix_for(&list.draw());
        assert_relative_eq!(
            m.transform_point(&Point3::new(15.0, 15.0, 15.0)),
            Point3::origin(),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            m.transform_point(&Point3::new(20.0, 20.0, 20.0)),
            Point3::new(1.0, 1.0, 1.0),
            epsilon = 1e-6
        );

        list.clear();
        assert_relative_eq!(fit.matrix_for(&list.draw()), Matrix4::identity());
    }
}
