use std::time::{Duration, Instant};

const FPS_SAMPLE_COUNT: usize = 30;

/// Rolling frame-rate counter for the window title.
pub struct FrameCounter {
    samples: [f32; FPS_SAMPLE_COUNT],
    sample_index: usize,
    last_instant: Instant,
    frame_count: u64,
}

impl FrameCounter {
    pub fn new(target_fps: u32) -> Self {
        Self {
            samples: [1.0 / target_fps.max(1) as f32; FPS_SAMPLE_COUNT],
            sample_index: 0,
            last_instant: Instant::now(),
            frame_count: 0,
        }
    }

    /// Records the time elapsed since the previous call.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_instant);
        self.last_instant = now;
        self.record(elapsed);
        elapsed
    }

    pub fn record(&mut self, frame_time: Duration) {
        self.samples[self.sample_index] = frame_time.as_secs_f32();
        self.sample_index = (self.sample_index + 1) % FPS_SAMPLE_COUNT;
        self.frame_count += 1;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> u32 {
        let average = self.samples.iter().sum::<f32>() / FPS_SAMPLE_COUNT as f32;
        if average > 0.0 {
            (1.0 / average).round() as u32
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_target() {
        let counter = FrameCounter::new(60);
        assert_eq!(counter.fps(), 60);
        assert_eq!(counter.frame_count(), 0);
    }

    #[test]
    fn converges_to_measured_rate() {
        let mut counter = FrameCounter::new(60);
        for _ in 0..FPS_SAMPLE_COUNT {
            counter.record(Duration::from_millis(40));
        }
        assert_eq!(counter.fps(), 25);
        assert_eq!(counter.frame_count(), FPS_SAMPLE_COUNT as u64);
    }

    #[test]
    fn averages_over_window() {
        let mut counter = FrameCounter::new(100);
        for _ in 0..FPS_SAMPLE_COUNT / 2 {
            counter.record(Duration::from_millis(30));
        }
        // Half the window at 10ms, half at 30ms.
        assert_eq!(counter.fps(), 50);
    }

    #[test]
    fn zero_frame_times_report_zero() {
        let mut counter = FrameCounter::new(60);
        for _ in 0..FPS_SAMPLE_COUNT {
            counter.record(Duration::ZERO);
        }
        assert_eq!(counter.fps(), 0);
    }
}
