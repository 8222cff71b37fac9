//! Skyflap entry point
//!
//! Browser builds drive the session from requestAnimationFrame; native
//! builds run a headless autopilot session and log the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_host {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{KeyboardEvent, MouseEvent, TouchEvent};

    use skyflap::audio::{AudioSink, LogAudio};
    use skyflap::sim::GamePhase;
    use skyflap::{BestScores, GameLoopScheduler, Session, Settings};

    struct Host {
        session: Session,
        scheduler: GameLoopScheduler,
        audio: LogAudio,
        /// Latest requestAnimationFrame timestamp
        last_raf_ms: f64,
        /// An animation frame is already requested
        frame_pending: bool,
        shown_score: Option<u64>,
        shown_phase: Option<GamePhase>,
    }

    impl Host {
        fn new(seed: u64) -> Self {
            let settings = Settings::load();
            let mut audio = LogAudio::default();
            audio.set_volume(settings.sfx_gain());
            let mut scheduler = GameLoopScheduler::default();
            scheduler.start();
            Self {
                session: Session::new(settings, BestScores::load(), seed),
                scheduler,
                audio,
                last_raf_ms: 0.0,
                frame_pending: false,
                shown_score: None,
                shown_phase: None,
            }
        }

        fn frame(&mut self, time: f64) {
            self.last_raf_ms = time;
            if let Some(timing) = self.scheduler.frame(time) {
                let events = self.session.update(timing.delta_ms, js_sys::Date::now());
                self.audio.play_events(&events);
            }
            self.update_hud();
        }

        /// Keep the scheduler in step with the session phase
        fn sync_scheduler(&mut self) {
            match self.session.phase() {
                GamePhase::Pause => self.scheduler.pause(),
                _ => self.scheduler.resume(self.last_raf_ms),
            }
        }

        fn flap(&mut self) {
            self.session.flap();
            self.sync_scheduler();
        }

        fn toggle_pause(&mut self) {
            if self.session.toggle_pause() {
                self.sync_scheduler();
            }
        }

        fn auto_pause(&mut self, reason: &str) {
            if self.session.settings.pause_on_blur && self.session.pause() {
                self.sync_scheduler();
                log::info!("Auto-paused ({reason})");
            }
        }

        fn restart(&mut self) {
            if self.session.restart() {
                self.sync_scheduler();
            }
        }

        fn update_hud(&mut self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            let score = self.session.state.score;
            if self.shown_score != Some(score) {
                if let Some(el) = document.get_element_by_id("hud-score") {
                    el.set_text_content(Some(&score.to_string()));
                }
                self.shown_score = Some(score);
            }

            let phase = self.session.phase();
            if self.shown_phase != Some(phase) {
                for (id, visible) in [
                    ("menu", phase == GamePhase::Menu),
                    ("pause-menu", phase == GamePhase::Pause),
                    ("game-over", phase == GamePhase::GameOver),
                ] {
                    if let Some(el) = document.get_element_by_id(id) {
                        let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                    }
                }
                if phase == GamePhase::GameOver {
                    if let Some(el) = document.get_element_by_id("best-score") {
                        let best = self.session.state.best_score;
                        el.set_text_content(Some(&best.to_string()));
                    }
                }
                self.shown_phase = Some(phase);
            }

            if self.session.settings.show_fps {
                if let Some(el) = document.get_element_by_id("hud-fps") {
                    let fps = self.scheduler.fps();
                    el.set_text_content(Some(&format!("{:.0} fps", fps.average)));
                }
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Skyflap starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window, cannot start");
            return;
        };

        if let Some(loading) = window.document().and_then(|d| d.get_element_by_id("loading")) {
            let _ = loading.set_attribute("class", "hidden");
        }

        let seed = js_sys::Date::now() as u64;
        let host = Rc::new(RefCell::new(Host::new(seed)));
        resize(&window, &host);
        log::info!("Session initialised with seed: {seed}");

        setup_input_handlers(&window, host.clone());
        setup_auto_pause(&window, host.clone());

        resume_loop(&host);
    }

    fn resize(window: &web_sys::Window, host: &Rc<RefCell<Host>>) {
        let width = window.inner_width().ok().and_then(|v| v.as_f64());
        let height = window.inner_height().ok().and_then(|v| v.as_f64());
        if let (Some(w), Some(h)) = (width, height) {
            host.borrow_mut().session.resize(w as f32, h as f32);
        }
    }

    fn setup_input_handlers(window: &web_sys::Window, host: Rc<RefCell<Host>>) {
        // Keyboard
        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let mut h = host.borrow_mut();
                match event.key().as_str() {
                    " " | "ArrowUp" | "w" | "W" => {
                        event.prevent_default();
                        h.flap();
                    }
                    "Escape" | "p" | "P" => h.toggle_pause(),
                    "r" | "R" => h.restart(),
                    "a" | "A" => {
                        let enabled = !h.session.autopilot();
                        h.session.set_autopilot(enabled);
                        log::info!("Autopilot: {enabled}");
                    }
                    _ => {}
                }
                drop(h);
                resume_loop(&host);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse
        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() == 0 {
                    host.borrow_mut().flap();
                    resume_loop(&host);
                }
            });
            let _ = window
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch
        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                host.borrow_mut().flap();
                resume_loop(&host);
            });
            let _ = window
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Viewport
        {
            let window_clone = window.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                resize(&window_clone, &host);
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(window: &web_sys::Window, host: Rc<RefCell<Host>>) {
        // Visibility change (tab switch, minimize)
        if let Some(document) = window.document() {
            let host = host.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    host.borrow_mut().auto_pause("tab hidden");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                host.borrow_mut().auto_pause("window blur");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(host: Rc<RefCell<Host>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(host, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Request a frame unless one is pending or the scheduler is idle
    fn resume_loop(host: &Rc<RefCell<Host>>) {
        let start = {
            let mut h = host.borrow_mut();
            let start = !h.frame_pending && h.scheduler.should_schedule();
            h.frame_pending |= start;
            start
        };
        if start {
            request_animation_frame(host.clone());
        }
    }

    fn game_loop(host: Rc<RefCell<Host>>, time: f64) {
        let again = {
            let mut h = host.borrow_mut();
            h.frame(time);
            // Paused or stopped: input restarts the loop
            h.frame_pending = h.scheduler.should_schedule();
            h.frame_pending
        };
        if again {
            request_animation_frame(host);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use skyflap::audio::{AudioSink, LogAudio};
    use skyflap::consts::REFERENCE_FRAME_MS;
    use skyflap::sim::GamePhase;
    use skyflap::{BestScores, GameLoopScheduler, Session, Settings};

    /// Play one autopilot run for at most `seconds` of simulated time
    pub fn run(seed: u64, seconds: f64) {
        let session = Rc::new(RefCell::new(Session::new(
            Settings::load(),
            BestScores::load(),
            seed,
        )));
        {
            let mut s = session.borrow_mut();
            s.set_autopilot(true);
            s.start();
        }

        let audio = Rc::new(RefCell::new(LogAudio::default()));
        let mut scheduler = GameLoopScheduler::default();
        {
            let session = session.clone();
            let audio = audio.clone();
            scheduler.set_callback(move |timing| {
                let events = session.borrow_mut().update(timing.delta_ms, timing.elapsed_ms);
                audio.borrow_mut().play_events(&events);
                Ok(())
            });
        }

        scheduler.start();
        let end_ms = seconds * 1000.0;
        let mut now = 0.0;
        while now <= end_ms && session.borrow().phase() == GamePhase::Run {
            scheduler.frame(now);
            now += REFERENCE_FRAME_MS as f64;
        }
        let frames = scheduler.frame_count();
        scheduler.stop();

        let s = session.borrow();
        let stats = s.state.stats();
        log::info!(
            "Finished after {frames} frames ({:.1}s simulated): score {}, {} pipes, {} coins, {} combos, {} cues",
            stats.time_alive_ms / 1000.0,
            stats.score,
            stats.pipes_passed,
            stats.coins_collected,
            stats.combos_triggered,
            audio.borrow().played()
        );
        match s.state.snapshot_json() {
            Ok(json) => log::debug!("Final snapshot: {json}"),
            Err(e) => log::error!("Snapshot failed: {e}"),
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web_host::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Skyflap (native) starting headless autopilot run...");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5eed);
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(60.0);

    headless::run(seed, seconds);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
