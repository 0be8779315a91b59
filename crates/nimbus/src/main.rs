mod canvas;
mod logging;

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use nimbus_config::Config;
use nimbus_core::{Preset, Viewport};
use nimbus_engine::{PresetOptions, Scene, build_scene};
use ratatui::{
    DefaultTerminal, Frame,
    layout::Rect,
    style::{Style, Stylize},
    text::Line,
    widgets::Paragraph,
};

use crate::canvas::PixelCanvas;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let log_path = logging::init()?;
    log::info!("logging to {}", log_path.display());
    let config = Config::load()?;
    let terminal = ratatui::init();
    let result = App::new(config).run(terminal);
    ratatui::restore();
    result
}

/// Fixed-rate frame clock. Events are drained until the deadline of the
/// current frame passes, so the scene is stepped exactly once per frame no
/// matter how many events arrive.
#[derive(Debug, Clone, Copy)]
struct FramePacer {
    frame_time: Duration,
    deadline: Instant,
}

impl FramePacer {
    fn new(fps: u32, now: Instant) -> Self {
        Self {
            frame_time: Duration::from_secs_f64(1.0 / f64::from(fps.max(1))),
            deadline: now,
        }
    }

    /// Start a frame at `now`.
    fn begin(&mut self, now: Instant) {
        self.deadline = now + self.frame_time;
    }

    /// Time left in the current frame, `None` once it is over.
    fn remaining(&self, now: Instant) -> Option<Duration> {
        let left = self.deadline.saturating_duration_since(now);
        (!left.is_zero()).then_some(left)
    }
}

/// The main application which holds the state and logic of the application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    running: bool,
    /// Loaded settings.
    config: Config,
    /// Preset currently on screen.
    preset: Preset,
    /// Seed every scene of this run is built from.
    seed: u64,
    /// Scene sized to the current terminal, absent while the terminal is empty.
    scene: Option<Scene>,
    /// Pixels of the last stepped frame.
    canvas: PixelCanvas,
    /// Terminal size the scene was built for, in cells.
    last_size: (u16, u16),
}

impl App {
    /// Construct a new instance of [`App`].
    pub fn new(config: Config) -> Self {
        let seed = config.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });
        log::info!("seed {seed}, preset {}", config.preset.name());
        Self {
            running: false,
            preset: config.preset,
            canvas: PixelCanvas::new(Viewport::default(), config.sky),
            config,
            seed,
            scene: None,
            last_size: (0, 0),
        }
    }

    /// Run the application's main loop at the configured frame rate.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        let mut pacer = FramePacer::new(self.config.fps, Instant::now());
        self.running = true;
        while self.running {
            pacer.begin(Instant::now());
            let size = terminal.size()?;
            self.fit(size.width, size.height)?;
            if let Some(scene) = self.scene.as_mut() {
                scene.step();
                self.canvas.paint(scene.render());
            }
            terminal.draw(|frame| self.render(frame))?;
            while self.running
                && let Some(timeout) = pacer.remaining(Instant::now())
            {
                self.handle_crossterm_events(timeout)?;
            }
        }
        log::info!("exiting");
        Ok(())
    }

    /// Rebuild the scene when the terminal size changed. Each cell holds
    /// two pixels stacked vertically.
    fn fit(&mut self, cols: u16, rows: u16) -> color_eyre::Result<()> {
        if (cols, rows) == self.last_size && (self.scene.is_some() || cols == 0 || rows == 0) {
            return Ok(());
        }
        self.last_size = (cols, rows);
        let viewport = Viewport::new(u32::from(cols), u32::from(rows) * 2);
        self.canvas = PixelCanvas::new(viewport, self.config.sky);
        if viewport.area() == 0 {
            self.scene = None;
            return Ok(());
        }
        log::info!("terminal is {cols}x{rows}, building {}", self.preset.name());
        self.scene = Some(build_scene(
            self.preset,
            viewport,
            &self.preset_options(),
            self.seed,
        )?);
        Ok(())
    }

    fn preset_options(&self) -> PresetOptions {
        PresetOptions {
            text: self.config.text.clone(),
            color: self.config.particle_color,
            population: self.config.population,
            post_reset_population: self.config.post_reset_population,
            cycle_period: self.config.cycle_period,
        }
    }

    /// Renders the user interface.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(&self.canvas, area);

        let lines = self.config.caption.len() as u16;
        if lines == 0 || area.height <= lines + 1 || area.width < 3 {
            return;
        }
        let caption: Vec<Line> = self
            .config
            .caption
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let line = Line::from(text.as_str());
                if i == 0 { line.bold() } else { line }
            })
            .collect();
        let caption_area = Rect::new(
            area.x + 1,
            area.bottom() - lines - 1,
            area.width - 2,
            lines,
        );
        let style = Style::new().fg(self.config.particle_color.into());
        frame.render_widget(Paragraph::new(caption).style(style), caption_area);
    }

    /// Reads the crossterm events and updates the state of [`App`].
    /// Waits at most `timeout` for one event.
    fn handle_crossterm_events(&mut self, timeout: Duration) -> color_eyre::Result<()> {
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                // The next frame picks up the new size.
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char('p')) => self.next_preset(),
            _ => {}
        }
    }

    /// Switch to the next preset; the scene is rebuilt on the next frame.
    fn next_preset(&mut self) {
        self.preset = self.preset.next();
        self.scene = None;
        log::info!("switching to {}", self.preset.name());
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}
