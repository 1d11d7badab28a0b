use std::thread;
use std::time::{Duration, Instant};

/// Paces the host loop: sleeps until the next frame is due, but never longer
/// than `idle`, so control changes get picked up quickly.
pub struct IntervalTimer {
    idle: Duration,
    thread_name: String,
    measure_fps: bool,
    last_fps_print: Instant,
    frames: u32,
}

impl IntervalTimer {
    pub fn new(idle: Duration, measure_fps: bool) -> IntervalTimer {
        let cur_thread = thread::current();
        let thread_name = if let Some(name) = cur_thread.name() {
            name
        } else {
            "unnamed"
        };

        IntervalTimer {
            idle,
            thread_name: thread_name.to_string(),
            measure_fps,
            last_fps_print: Instant::now(),
            frames: 0,
        }
    }

    pub fn frame_drawn(&mut self) {
        self.frames += 1;
    }

    /// `None` when nothing is scheduled.
    pub fn sleep_until(&mut self, wake_at: Option<Instant>) {
        if self.measure_fps {
            self.update_fps();
        }

        let duration = self.sleep_duration(Instant::now(), wake_at);
        if duration.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(duration);
        }
    }

    fn sleep_duration(&self, now: Instant, wake_at: Option<Instant>) -> Duration {
        match wake_at {
            Some(wake_at) => wake_at.saturating_duration_since(now).min(self.idle),
            None => self.idle,
        }
    }

    fn update_fps(&mut self) {
        if Instant::now() - self.last_fps_print > Duration::from_secs(1) {
            log::debug!("{} FPS: {}", self.thread_name, self.frames);
            self.frames = 0;
            self.last_fps_print = Instant::now();
        }
    }
}
