use crate::clock::Millis;
use crate::config::{save_settings_atomic, Paths, Settings};
use crate::input::{collect_input_nonblocking, map_event, Command};
use crate::render::{draw_frame, pet_contains, Button, Grid, Layout, Terminal, View};
use crate::sim::{Outcome, Pet};
use crate::soil::RandomSource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::time::{Duration, Instant};

fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(StdRng::from_entropy()),
    }
}

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    pet: Pet,
    term: Terminal,
    grid: Grid,
    layout: Layout,
    view: View,
    started: Instant,
    should_quit: bool,
}

impl App {
    fn init(settings: Settings, paths: Paths) -> anyhow::Result<Self> {
        let pet = Pet::new(settings.rules.clone(), random_source(settings.seed));
        let term = Terminal::begin()?;
        let grid = Grid {
            cell_w: settings.cell_px_w,
            cell_h: settings.cell_px_h,
        };
        let layout = Layout::new(term.rows, settings.rules.food.len());
        let view = View {
            color: settings.enable_color,
            food_menu: false,
            status: None,
        };

        let mut app = Self {
            settings,
            paths,
            pet,
            term,
            grid,
            layout,
            view,
            started: Instant::now(),
            should_quit: false,
        };
        app.fit_stage();
        log::info!(
            "session started on a {}x{} terminal",
            app.term.cols,
            app.term.rows
        );
        Ok(app)
    }

    fn elapsed_ms(&self) -> Millis {
        self.started.elapsed().as_millis() as Millis
    }

    fn fit_stage(&mut self) {
        self.pet
            .resize(self.grid.stage(self.term.cols, self.term.rows));
        self.layout = Layout::new(self.term.rows, self.pet.rules().food.len());
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        while !self.should_quit {
            let frame_start = Instant::now();
            if self.term.resize_if_needed()? {
                self.fit_stage();
            }

            // timers first, so commands act on the present instant
            self.pet.advance_to(self.elapsed_ms());

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(cmd) = map_event(&ev) {
                    self.apply(cmd);
                }
                if self.should_quit {
                    break;
                }
            }

            draw_frame(&mut self.term, &self.pet, &self.view, &self.layout, self.grid)?;

            let spent = frame_start.elapsed();
            if spent < frame_dt {
                std::thread::sleep(frame_dt - spent);
            }
        }

        self.pet.teardown();
        self.term.end()?;
        self.settings.enable_color = self.view.color;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        log::info!("session ended after {}ms", self.pet.now());
        Ok(())
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Feed(i) => {
                if let Some(id) = self.pet.rules().food.get(i).map(|f| f.id.clone()) {
                    let outcome = self.pet.feed(&id);
                    self.report(outcome);
                }
            }
            Command::Pet => {
                let outcome = self.pet.pet();
                self.report(outcome);
            }
            Command::Play => {
                let outcome = self.pet.play();
                self.report(outcome);
            }
            Command::ToggleSleep => {
                self.pet.toggle_sleep();
                if self.pet.is_sleeping() {
                    self.view.food_menu = false;
                }
            }
            Command::CleanOldest => {
                let outcome = self.pet.clean_oldest();
                self.report(outcome);
            }
            Command::ToggleFoodMenu => {
                self.view.food_menu = !self.view.food_menu && !self.pet.is_sleeping();
            }
            Command::ToggleColor => self.view.color = !self.view.color,
            Command::Quit => self.should_quit = true,
            Command::PointerDown(x, y) => self.pointer_down(x, y),
            Command::PointerMove(x, y) => {
                let at = self.grid.cell_center(x, y);
                if self.pet.drag().is_dragging() {
                    self.pet.update_drag(at);
                } else {
                    self.pet.track_pointer(at);
                }
            }
            Command::PointerUp(x, y) => {
                let at = self.grid.cell_center(x, y);
                if self.pet.drag().is_dragging() {
                    let outcome = self.pet.end_drag(at);
                    self.report(outcome);
                } else {
                    self.pet.track_pointer(at);
                }
            }
        }
    }

    /// Hit tests in paint order, topmost first: menu, controls, messes, pet.
    fn pointer_down(&mut self, x: u16, y: u16) {
        let at = self.grid.cell_center(x, y);
        self.pet.track_pointer(at);

        if self.view.food_menu {
            if let Some(i) = self.layout.food_at(x, y) {
                if let Some(id) = self.pet.rules().food.get(i).map(|f| f.id.clone()) {
                    let outcome = self.pet.begin_drag(&id, at);
                    self.report(outcome);
                }
                return;
            }
        }

        if let Some(button) = self.layout.button_at(x, y) {
            let cmd = match button {
                Button::Feed => Command::ToggleFoodMenu,
                Button::Play => Command::Play,
                Button::Sleep => Command::ToggleSleep,
            };
            self.apply(cmd);
            return;
        }

        let hit = self
            .pet
            .messes()
            .find(|m| {
                let (mx, my) = self.grid.cell_of(m.at);
                (mx - x as i32).abs() <= 1 && my == y as i32
            })
            .map(|m| m.id);
        if let Some(id) = hit {
            let outcome = self.pet.clean(id);
            self.report(outcome);
            return;
        }

        if pet_contains(&self.pet, at) {
            let outcome = self.pet.pet();
            self.report(outcome);
        }
    }

    fn report(&mut self, outcome: Outcome) {
        if let Outcome::Rejected(reject) = outcome {
            if let Some(msg) = reject.message() {
                self.view.status = Some((msg, self.pet.now()));
            }
        }
    }
}

pub(crate) fn run(settings: Settings, paths: Paths) -> anyhow::Result<()> {
    let mut app = App::init(settings, paths)?;
    let result = app.run();
    if result.is_err() {
        // leave the terminal usable even when the loop bailed out
        let _ = app.term.end();
    }
    result
}

/// Runs the simulation on a simulated clock with no terminal, printing one
/// JSON snapshot per decay period to stdout.
pub(crate) fn run_headless(settings: Settings, seconds: u64) -> anyhow::Result<()> {
    let mut pet = Pet::new(settings.rules.clone(), random_source(settings.seed));
    let step = settings.rules.tick_ms;
    let end = seconds.saturating_mul(1000);
    log::info!("headless run for {seconds}s, step {step}ms");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut t = 0;
    while t < end {
        t = (t + step).min(end);
        pet.advance_to(t);
        serde_json::to_writer(&mut out, &pet.snapshot())?;
        writeln!(out)?;
    }
    pet.teardown();
    Ok(())
}
