use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::controls::Controls;
use crate::intervaltimer::IntervalTimer;
use crate::leds::LedOutput;

/// The host loop: ticks the animations and sleeps until the next frame is due.
pub struct Discoball<O: LedOutput> {
    controls: Arc<Mutex<Controls>>,
    output: O,
    timer: IntervalTimer,
    shutdown: Arc<AtomicBool>,
}

impl<O: LedOutput> Discoball<O> {
    pub fn new(
        controls: Arc<Mutex<Controls>>,
        output: O,
        idle: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Discoball<O> {
        Discoball {
            controls,
            output,
            timer: IntervalTimer::new(idle, true),
            shutdown,
        }
    }

    /// Runs until the shutdown flag is raised and hands back the output.
    pub fn run(mut self) -> O {
        while !self.shutdown.load(Ordering::Relaxed) {
            let wake_at = self.update(Instant::now());
            self.timer.sleep_until(wake_at);
        }

        log::info!("Shutting down");
        self.output
    }

    fn update(&mut self, now: Instant) -> Option<Instant> {
        let mut controls = self.controls.lock().unwrap();
        if controls.tick(now, &mut self.output) {
            self.timer.frame_drawn();
        }
        controls.animations.wake_at(now)
    }
}
