//! Host-driven frame timing
//!
//! The host (requestAnimationFrame in the browser, a plain loop natively)
//! calls [`GameLoopScheduler::frame`] with a millisecond timestamp. The
//! scheduler clamps the delta, keeps FPS statistics and forwards timing to
//! the registered callback.

use crate::error::SimResult;
use crate::ring::RingBuffer;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Upper bound for a single frame's delta (ms)
    pub max_delta_ms: f64,
    /// Number of FPS samples kept
    pub fps_sample_size: usize,
    /// How often average/min/max are recomputed (ms)
    pub fps_update_interval_ms: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_delta_ms: 50.0,
            fps_sample_size: 60,
            fps_update_interval_ms: 500.0,
        }
    }
}

/// Timing handed to the frame callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Clamped delta (ms)
    pub delta_ms: f32,
    /// Sum of clamped deltas since start (ms)
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FpsStats {
    pub current: f32,
    pub average: f32,
    pub min: f32,
    pub max: f32,
}

type FrameCallback = Box<dyn FnMut(FrameTiming) -> SimResult<()>>;

pub struct GameLoopScheduler {
    pub config: SchedulerConfig,
    running: bool,
    paused: bool,
    start_time: Option<f64>,
    last_frame_time: Option<f64>,
    elapsed_ms: f64,
    frame_count: u64,
    samples: RingBuffer<f32>,
    fps: FpsStats,
    last_fps_update: f64,
    callback: Option<FrameCallback>,
}

impl std::fmt::Debug for GameLoopScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoopScheduler")
            .field("running", &self.running)
            .field("paused", &self.paused)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("frame_count", &self.frame_count)
            .field("fps", &self.fps)
            .finish()
    }
}

impl Default for GameLoopScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl GameLoopScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let samples = RingBuffer::new(config.fps_sample_size);
        Self {
            config,
            running: false,
            paused: false,
            start_time: None,
            last_frame_time: None,
            elapsed_ms: 0.0,
            frame_count: 0,
            samples,
            fps: FpsStats::default(),
            last_fps_update: 0.0,
            callback: None,
        }
    }

    /// Replace the frame callback
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(FrameTiming) -> SimResult<()> + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.paused = false;
        self.last_frame_time = None;
        log::info!("Game loop started");
    }

    /// Cancel and reset frame counters and FPS samples
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.paused = false;
        self.start_time = None;
        self.last_frame_time = None;
        self.elapsed_ms = 0.0;
        self.frame_count = 0;
        self.samples.clear();
        self.fps = FpsStats::default();
        log::info!("Game loop stopped");
    }

    pub fn pause(&mut self) {
        if self.running && !self.paused {
            self.paused = true;
            log::debug!("Game loop paused at {:.0}ms", self.elapsed_ms);
        }
    }

    /// Unpause; the next delta is measured from `now_ms`
    pub fn resume(&mut self, now_ms: f64) {
        if self.running && self.paused {
            self.paused = false;
            self.last_frame_time = Some(now_ms);
            log::debug!("Game loop resumed");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the host should request another frame
    pub fn should_schedule(&self) -> bool {
        self.running && !self.paused
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn fps(&self) -> FpsStats {
        self.fps
    }

    /// Drive one host frame. The first frame after start only stamps time.
    pub fn frame(&mut self, now_ms: f64) -> Option<FrameTiming> {
        if !self.should_schedule() {
            return None;
        }
        let Some(last) = self.last_frame_time else {
            self.start_time.get_or_insert(now_ms);
            self.last_frame_time = Some(now_ms);
            self.last_fps_update = now_ms;
            return None;
        };

        let raw = now_ms - last;
        self.last_frame_time = Some(now_ms);
        self.record_fps(raw, now_ms);
        let timing = self.tick(raw);

        if let Some(callback) = self.callback.as_mut() {
            if let Err(e) = callback(timing) {
                log::error!("Frame callback failed: {e}");
            }
        }
        Some(timing)
    }

    /// Clamp a raw delta into `[0, max_delta_ms]` and accumulate it
    pub fn tick(&mut self, raw_delta_ms: f64) -> FrameTiming {
        let delta = if raw_delta_ms.is_finite() {
            raw_delta_ms.clamp(0.0, self.config.max_delta_ms)
        } else {
            0.0
        };
        self.elapsed_ms += delta;
        self.frame_count += 1;
        FrameTiming {
            delta_ms: delta as f32,
            elapsed_ms: self.elapsed_ms,
        }
    }

    fn record_fps(&mut self, raw_delta_ms: f64, now_ms: f64) {
        if raw_delta_ms > 0.0 {
            self.samples.push((1000.0 / raw_delta_ms) as f32);
        }
        if now_ms - self.last_fps_update < self.config.fps_update_interval_ms
            || self.samples.is_empty()
        {
            return;
        }
        self.last_fps_update = now_ms;

        let (mut sum, mut min, mut max) = (0.0f32, f32::MAX, f32::MIN);
        for &s in self.samples.iter() {
            sum += s;
            min = min.min(s);
            max = max.max(s);
        }
        self.fps = FpsStats {
            current: self.samples.iter().last().copied().unwrap_or(0.0),
            average: sum / self.samples.len() as f32,
            min,
            max,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn started() -> GameLoopScheduler {
        let mut s = GameLoopScheduler::default();
        s.start();
        s
    }

    #[test]
    fn test_first_frame_only_stamps() {
        let mut s = started();
        let calls = Rc::new(RefCell::new(0));
        let c = calls.clone();
        s.set_callback(move |_| {
            *c.borrow_mut() += 1;
            Ok(())
        });
        assert_eq!(s.frame(1000.0), None);
        assert_eq!(*calls.borrow(), 0);

        let t = s.frame(1016.0).unwrap();
        assert_eq!(t.delta_ms, 16.0);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_delta_clamp() {
        let mut s = started();
        assert_eq!(s.tick(500.0).delta_ms, 50.0);
        assert_eq!(s.tick(-20.0).delta_ms, 0.0);
        assert_eq!(s.tick(f64::NAN).delta_ms, 0.0);
        assert_eq!(s.tick(10.0).delta_ms, 10.0);
        assert_eq!(s.elapsed_ms(), 60.0);
    }

    #[test]
    fn test_pause_and_resume_restamp() {
        let mut s = started();
        s.frame(0.0);
        s.frame(16.0);
        s.pause();
        assert!(!s.should_schedule());
        assert_eq!(s.frame(5000.0), None);

        s.resume(10_000.0);
        let t = s.frame(10_016.0).unwrap();
        assert_eq!(t.delta_ms, 16.0);
        // Accumulated time survives the pause
        assert_eq!(t.elapsed_ms, 32.0);
    }

    #[test]
    fn test_frame_chain_ends_while_paused() {
        let mut s = started();
        let mut now = 0.0;
        let mut requested = 0;
        // A host requests the next frame only while should_schedule holds
        while s.should_schedule() && requested < 10 {
            requested += 1;
            s.frame(now);
            now += 16.0;
            if requested == 4 {
                s.pause();
            }
        }
        assert_eq!(requested, 4);
        assert_eq!(s.frame_count(), 3);

        s.resume(now);
        assert!(s.should_schedule());
        s.stop();
        assert!(!s.should_schedule());
    }

    #[test]
    fn test_stop_resets_counters() {
        let mut s = started();
        s.frame(0.0);
        s.frame(16.0);
        s.frame(32.0);
        assert_eq!(s.frame_count(), 2);
        s.stop();
        assert!(!s.is_running());
        assert_eq!(s.frame_count(), 0);
        assert_eq!(s.elapsed_ms(), 0.0);
        assert_eq!(s.fps(), FpsStats::default());
        assert_eq!(s.frame(48.0), None);
    }

    #[test]
    fn test_fps_stats_update_on_interval() {
        let mut s = started();
        let mut now = 0.0;
        s.frame(now);
        for _ in 0..40 {
            now += 20.0;
            s.frame(now);
        }
        let fps = s.fps();
        assert!((fps.average - 50.0).abs() < 0.01);
        assert!((fps.min - 50.0).abs() < 0.01);
        assert!((fps.max - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_callback_error_does_not_stop_loop() {
        let mut s = started();
        s.set_callback(|_| Err(SimError::Callback("render failed".into())));
        s.frame(0.0);
        assert!(s.frame(16.0).is_some());
        assert!(s.frame(32.0).is_some());
        assert!(s.should_schedule());
    }

    #[test]
    fn test_set_callback_replaces() {
        let mut s = started();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let h = hits.clone();
        s.set_callback(move |_| {
            h.borrow_mut().push("first");
            Ok(())
        });
        let h = hits.clone();
        s.set_callback(move |_| {
            h.borrow_mut().push("second");
            Ok(())
        });
        s.frame(0.0);
        s.frame(16.0);
        assert_eq!(*hits.borrow(), vec!["second"]);
    }
}
