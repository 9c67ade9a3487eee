//! Neon Runner entry point
//!
//! Browser host on wasm32 (Canvas 2D, keyboard, DOM HUD and menus driven by
//! requestAnimationFrame). On native there is no window; the binary prints
//! the level roster or runs a level headless.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, KeyboardEvent};

    use neon_runner::input::InputState;
    use neon_runner::renderer::{DrawCommand, Renderer, build_scene, colors};
    use neon_runner::sim::{GameEvent, Viewport, World};
    use neon_runner::{Difficulty, GameError, Phase, Session, Settings};

    /// Longest frame fed to the session; a backgrounded tab resumes in one step
    const MAX_FRAME_MS: f64 = 250.0;

    /// Paints draw lists onto a Canvas 2D context
    struct CanvasPainter {
        ctx: CanvasRenderingContext2d,
        viewport: Viewport,
    }

    impl Renderer for CanvasPainter {
        fn render(&mut self, world: &World) {
            for command in build_scene(world) {
                self.paint(&command);
            }
        }
    }

    impl CanvasPainter {
        fn paint(&self, command: &DrawCommand) {
            let ctx = &self.ctx;
            match command {
                DrawCommand::Clear { color } => {
                    ctx.set_fill_style_str(&colors::css(color));
                    ctx.fill_rect(
                        0.0,
                        0.0,
                        self.viewport.width as f64,
                        self.viewport.height as f64,
                    );
                }
                DrawCommand::Rect { rect, color } => {
                    ctx.set_fill_style_str(&colors::css(color));
                    ctx.fill_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
                }
                DrawCommand::Circle {
                    center,
                    radius,
                    color,
                } => {
                    ctx.set_fill_style_str(&colors::css(color));
                    ctx.begin_path();
                    let _ = ctx.arc(
                        center.x as f64,
                        center.y as f64,
                        *radius as f64,
                        0.0,
                        std::f64::consts::TAU,
                    );
                    ctx.fill();
                }
                DrawCommand::Line {
                    from,
                    to,
                    width,
                    color,
                } => {
                    ctx.set_stroke_style_str(&colors::css(color));
                    ctx.set_line_width(*width as f64);
                    ctx.begin_path();
                    ctx.move_to(from.x as f64, from.y as f64);
                    ctx.line_to(to.x as f64, to.y as f64);
                    ctx.stroke();
                }
            }
        }
    }

    /// Game instance holding the session and everything the browser needs
    struct Game {
        session: Session,
        input: InputState,
        painter: CanvasPainter,
        canvas: HtmlCanvasElement,
        document: Document,
        last_time: f64,
        now: f64,
        /// When the troll toast should disappear
        toast_until: Option<f64>,
    }

    impl Game {
        /// Match the canvas backing store to its CSS size and tell the session
        fn resize(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let dpr = window.device_pixel_ratio();
            let rect = self.canvas.get_bounding_client_rect();
            self.canvas.set_width((rect.width() * dpr).round() as u32);
            self.canvas.set_height((rect.height() * dpr).round() as u32);
            let _ = self.painter.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);

            let viewport = Viewport::new(rect.width() as f32, rect.height() as f32);
            self.painter.viewport = viewport;
            let events = self.session.resize(viewport);
            self.handle_events(events);
        }

        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (time - self.last_time).clamp(0.0, MAX_FRAME_MS)
            } else {
                neon_runner::consts::FRAME_MS
            };
            self.last_time = time;
            self.now = time;

            let events = self.session.frame(dt, &self.input.snapshot());
            if !events.is_empty() {
                self.handle_events(events);
            }

            if self.toast_until.is_some_and(|until| time >= until) {
                self.toast_until = None;
                set_visible(&self.document, "trollMessage", false);
            }
        }

        fn render(&mut self) {
            if let Some(world) = self.session.world() {
                self.painter.render(world);
            }
        }

        /// Apply the result of a menu command
        fn command(&mut self, result: Result<Vec<GameEvent>, GameError>) {
            match result {
                Ok(events) => {
                    self.input.clear();
                    self.handle_events(events);
                }
                Err(e) => {
                    log::warn!("{e}");
                    self.toast(&e.to_string(), 2000.0);
                }
            }
        }

        fn handle_events(&mut self, events: Vec<GameEvent>) {
            for event in events {
                match event {
                    GameEvent::TrollActivated {
                        message, toast_ms, ..
                    } => self.toast(message, toast_ms),
                    GameEvent::LevelCompleted { level, score } => {
                        set_text(&self.document, "completeLevel", &level.to_string());
                        set_text(&self.document, "completeScore", &score.to_string());
                    }
                    GameEvent::GameOver { score } => {
                        set_text(&self.document, "finalScore", &score.to_string());
                    }
                    _ => {}
                }
            }
            self.update_hud();
            self.sync_overlays();
        }

        fn toast(&mut self, message: &str, duration_ms: f64) {
            set_text(&self.document, "trollMessage", message);
            set_visible(&self.document, "trollMessage", true);
            self.toast_until = Some(self.now + duration_ms);
        }

        fn update_hud(&self) {
            let state = self.session.state();
            let doc = &self.document;
            set_text(doc, "levelLabel", &format!("LEVEL: {}", state.current_level));
            set_text(doc, "scoreLabel", &format!("SCORE: {}", state.score));
            set_text(doc, "livesLabel", &format!("LIVES: {}", state.lives));
            if let Some(world) = self.session.world() {
                set_text(
                    doc,
                    "dotsLabel",
                    &format!("DOTS: {}/{}", world.collected_count(), world.total_dots()),
                );
            }
            set_text(doc, "difficultyLabel", state.difficulty.as_str());
        }

        fn sync_overlays(&self) {
            let phase = self.session.phase();
            let doc = &self.document;
            set_visible(doc, "mainMenu", phase == Phase::MainMenu);
            set_visible(doc, "hud", phase == Phase::Playing);
            set_visible(doc, "levelComplete", phase == Phase::LevelComplete);
            set_visible(doc, "gameOver", phase == Phase::GameOver);
            if phase != Phase::MainMenu {
                set_visible(doc, "levelSelect", false);
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Neon Runner starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .ok_or("no #gameCanvas")?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let seed = js_sys::Date::now() as u64;
        let session = Session::new(Settings::load(), seed);
        log::info!("Session created with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            session,
            input: InputState::new(),
            painter: CanvasPainter {
                ctx,
                viewport: Viewport::default(),
            },
            canvas,
            document: document.clone(),
            last_time: 0.0,
            now: 0.0,
            toast_until: None,
        }));

        {
            let mut g = game.borrow_mut();
            g.resize();
            g.update_hud();
            g.sync_overlays();
        }

        setup_input_handlers(&window, game.clone());
        setup_resize(&window, game.clone());
        setup_menu_buttons(&document, &game);

        request_animation_frame(game);

        log::info!("Neon Runner running!");
        Ok(())
    }

    fn setup_input_handlers(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if game.borrow_mut().input.key_down(&event.key()) {
                    event.prevent_default(); // no page scroll on space/arrows
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input.key_up(&event.key());
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keys released while unfocused never send keyup
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().input.clear();
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn on_click(
        document: &Document,
        id: &str,
        game: &Rc<RefCell<Game>>,
        action: impl Fn(&Rc<RefCell<Game>>) + 'static,
    ) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("#{id} missing from page");
            return;
        };
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            action(&game);
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_menu_buttons(document: &Document, game: &Rc<RefCell<Game>>) {
        on_click(document, "startBtn", game, |game| {
            let mut g = game.borrow_mut();
            let result = g.session.start();
            g.command(result);
        });
        on_click(document, "levelsBtn", game, show_level_select);
        on_click(document, "nextBtn", game, |game| {
            let mut g = game.borrow_mut();
            let result = g.session.next_level();
            g.command(result);
        });
        on_click(document, "retryBtn", game, |game| {
            let mut g = game.borrow_mut();
            let result = g.session.retry();
            g.command(result);
        });
        on_click(document, "restartBtn", game, |game| {
            let mut g = game.borrow_mut();
            let result = g.session.restart();
            g.command(result);
        });
        for id in ["menuBtn", "overMenuBtn"] {
            on_click(document, id, game, |game| {
                let mut g = game.borrow_mut();
                g.session.return_to_menu();
                g.command(Ok(Vec::new()));
            });
        }

        for (id, difficulty) in [
            ("easyBtn", Difficulty::Easy),
            ("mediumBtn", Difficulty::Medium),
            ("hardBtn", Difficulty::Hard),
        ] {
            on_click(document, id, game, move |game| {
                let mut g = game.borrow_mut();
                let result = g.session.set_difficulty(difficulty).map(|()| Vec::new());
                g.command(result);
            });
        }
    }

    /// Fill `#levelGrid` with one button per level, locked ones disabled
    fn show_level_select(game: &Rc<RefCell<Game>>) {
        let g = game.borrow();
        let document = g.document.clone();
        let Some(grid) = document.get_element_by_id("levelGrid") else {
            return;
        };
        grid.set_inner_html("");

        for level in 1..=g.session.total_levels() {
            let Ok(btn) = document.create_element("button") else {
                continue;
            };
            btn.set_text_content(Some(&level.to_string()));
            if !g.session.is_level_unlocked(level) {
                let _ = btn.set_attribute("disabled", "");
            } else if g.session.state().completed_levels.contains(&level) {
                let _ = btn.set_attribute("class", "done");
            }

            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                let result = g.session.select_level(level);
                g.command(result);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
            let _ = grid.append_child(&btn);
        }
        set_visible(&document, "levelSelect", true);
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        web_sys::console::error_1(&e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use neon_runner::{Session, Settings};

    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = Settings::load();

    match args.first().map(String::as_str) {
        Some("levels") => {
            let session = Session::new(settings, 0);
            println!("{}", serde_json::to_string_pretty(session.levels())?);
        }
        Some("simulate") => {
            let level = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(1);
            let frames = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(600);
            native::simulate(settings, level, frames)?;
        }
        _ => {
            eprintln!("usage: neon-runner [levels | simulate <level> <frames>]");
            eprintln!("the playable game is the wasm32 build");
        }
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use neon_runner::consts::FRAME_MS;
    use neon_runner::renderer::{CommandRecorder, Renderer};
    use neon_runner::sim::{TickInput, Viewport};
    use neon_runner::{Phase, Session, Settings};

    const SEED: u64 = 0x5EED;

    /// Run `level` with no input for up to `frames` frames, logging events,
    /// then print the session state as JSON.
    pub fn simulate(
        mut settings: Settings,
        level: u32,
        frames: u64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        settings.unlock_all_levels = true;
        let mut session = Session::new(settings, SEED);
        session.resize(Viewport::new(1280.0, 720.0));
        session.select_level(level)?;

        let mut recorder = CommandRecorder::default();
        let input = TickInput::default();
        for frame in 0..frames {
            for event in session.frame(FRAME_MS, &input) {
                log::info!("frame {frame}: {event:?}");
            }
            if let Some(world) = session.world() {
                recorder.render(world);
            }
            if session.phase() != Phase::Playing {
                break;
            }
        }

        log::info!(
            "{} frames rendered, {} draw commands in the last one",
            recorder.frames,
            recorder.commands.len()
        );
        println!("{}", serde_json::to_string_pretty(session.state())?);
        Ok(())
    }
}
