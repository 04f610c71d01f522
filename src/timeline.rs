use std::time::{Duration, Instant};

use crate::error::{GlowgridError, GlowgridResult};
use crate::grid::Frame;
use crate::sched::Deadline;

pub const DEFAULT_FPS: u32 = 24;

/// An ordered sequence of frames plus playback rate and loop flag. The
/// sequence is never empty.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Animation {
    pub frames: Vec<Frame>,
    pub fps: u32,
    #[serde(rename = "loop")]
    pub looped: bool,
}

impl Animation {
    /// Single blank frame at the default rate, looping.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::blank()],
            fps: DEFAULT_FPS,
            looped: true,
        }
    }

    pub fn validate(&self) -> GlowgridResult<()> {
        if self.frames.is_empty() {
            return Err(GlowgridError::validation(
                "animation must have at least one frame",
            ));
        }
        if self.fps == 0 {
            return Err(GlowgridError::validation("animation fps must be > 0"));
        }
        Ok(())
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one playback step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Cursor moved to the next frame.
    Advanced,
    /// Cursor ran off the end and wrapped to the first frame.
    Wrapped,
    /// Cursor ran off the end of a non-looping animation; it stays clamped
    /// on the last frame and playback should stop.
    Completed,
}

/// Owns the animation's frame sequence and the current-frame cursor.
#[derive(Debug)]
pub struct Timeline {
    anim: Animation,
    cursor: usize,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            anim: Animation::new(),
            cursor: 0,
        }
    }
}

impl Timeline {
    pub fn new(anim: Animation) -> GlowgridResult<Self> {
        anim.validate()?;
        Ok(Self { anim, cursor: 0 })
    }

    pub fn animation(&self) -> &Animation {
        &self.anim
    }

    pub fn len(&self) -> usize {
        self.anim.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anim.frames.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn fps(&self) -> u32 {
        self.anim.fps
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.anim.fps = fps.max(1);
    }

    pub fn looped(&self) -> bool {
        self.anim.looped
    }

    pub fn set_looped(&mut self, looped: bool) {
        self.anim.looped = looped;
    }

    pub fn current(&self) -> &Frame {
        &self.anim.frames[self.cursor]
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        &mut self.anim.frames[self.cursor]
    }

    /// Move the cursor; out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.anim.frames.len() {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    /// Append a blank frame and select it.
    pub fn push_blank(&mut self) {
        self.anim.frames.push(Frame::blank());
        self.cursor = self.anim.frames.len() - 1;
    }

    /// Insert a copy of the current frame right after it and select the
    /// copy.
    pub fn duplicate(&mut self) {
        let copy = self.current().clone();
        self.anim.frames.insert(self.cursor + 1, copy);
        self.cursor += 1;
    }

    /// Remove the current frame. Refuses to delete the last remaining
    /// frame; the cursor slides back one slot when possible.
    pub fn remove(&mut self) -> bool {
        if self.anim.frames.len() == 1 {
            return false;
        }
        self.anim.frames.remove(self.cursor);
        self.cursor = self.cursor.saturating_sub(1);
        true
    }

    /// Swap in a whole animation (library load / file import) and reset the
    /// cursor.
    pub fn replace(&mut self, anim: Animation) -> GlowgridResult<()> {
        anim.validate()?;
        self.anim = anim;
        self.cursor = 0;
        Ok(())
    }

    /// Advance the cursor by one playback tick.
    pub fn step(&mut self) -> Step {
        self.cursor += 1;
        if self.cursor >= self.anim.frames.len() {
            if self.anim.looped {
                self.cursor = 0;
                Step::Wrapped
            } else {
                self.cursor = self.anim.frames.len() - 1;
                Step::Completed
            }
        } else {
            Step::Advanced
        }
    }
}

/// The playback clock. Arms one tick deadline at a time; polling with an
/// explicit `Instant` keeps tests off the wall clock and guarantees no tick
/// fires after [`Player::stop`].
#[derive(Debug)]
pub struct Player {
    fps: u32,
    playing: bool,
    tick: Deadline,
}

impl Player {
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            playing: false,
            tick: Deadline::idle(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps))
    }

    pub fn play(&mut self, now: Instant) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.tick.arm(now + self.interval());
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.tick.cancel();
    }

    /// Change the rate. While playing this restarts the tick at the new
    /// interval (stop-then-start, never two pending ticks).
    pub fn set_fps(&mut self, fps: u32, now: Instant) {
        self.fps = fps.max(1);
        if self.playing {
            self.stop();
            self.play(now);
        }
    }

    /// Fire at most one tick and re-arm for the next.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.playing || !self.tick.fire(now) {
            return false;
        }
        self.tick.arm(now + self.interval());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    fn three_frames(looped: bool) -> Timeline {
        let mut anim = Animation::new();
        anim.frames = vec![Frame::blank(), Frame::blank(), Frame::blank()];
        anim.looped = looped;
        Timeline::new(anim).unwrap()
    }

    #[test]
    fn validate_rejects_empty_and_zero_fps() {
        let mut anim = Animation::new();
        anim.frames.clear();
        assert!(anim.validate().is_err());

        let mut anim = Animation::new();
        anim.fps = 0;
        assert!(anim.validate().is_err());
    }

    #[test]
    fn step_wraps_when_looping() {
        let mut tl = three_frames(true);
        assert_eq!(tl.step(), Step::Advanced);
        assert_eq!(tl.step(), Step::Advanced);
        assert_eq!(tl.step(), Step::Wrapped);
        assert_eq!(tl.cursor(), 0);
    }

    #[test]
    fn step_clamps_and_completes_without_loop() {
        let mut tl = three_frames(false);
        tl.step();
        tl.step();
        assert_eq!(tl.step(), Step::Completed);
        assert_eq!(tl.cursor(), 2);
    }

    #[test]
    fn duplicate_inserts_after_cursor_and_selects_copy() {
        let mut tl = three_frames(true);
        tl.current_mut().set(0, 0, Rgb::new(5, 0, 0));
        tl.duplicate();
        assert_eq!(tl.cursor(), 1);
        assert_eq!(tl.len(), 4);
        assert_eq!(tl.current().get(0, 0), Rgb::new(5, 0, 0));
    }

    #[test]
    fn remove_refuses_last_frame() {
        let mut tl = Timeline::new(Animation::new()).unwrap();
        assert!(!tl.remove());
        assert_eq!(tl.len(), 1);
    }

    #[test]
    fn remove_moves_cursor_back() {
        let mut tl = three_frames(true);
        tl.select(2);
        assert!(tl.remove());
        assert_eq!(tl.cursor(), 1);
        assert_eq!(tl.len(), 2);
    }

    #[test]
    fn player_ticks_at_interval() {
        let start = Instant::now();
        let mut player = Player::new(10);
        player.play(start);

        assert!(!player.poll(start + Duration::from_millis(50)));
        assert!(player.poll(start + Duration::from_millis(100)));
        assert!(!player.poll(start + Duration::from_millis(150)));
        assert!(player.poll(start + Duration::from_millis(200)));
    }

    #[test]
    fn stop_cancels_pending_tick() {
        let start = Instant::now();
        let mut player = Player::new(10);
        player.play(start);
        player.stop();
        assert!(!player.poll(start + Duration::from_secs(10)));
    }

    #[test]
    fn fps_change_restarts_without_double_tick() {
        let start = Instant::now();
        let mut player = Player::new(10);
        player.play(start);

        // Halfway to the first tick, speed up to 50 fps: the old 100 ms
        // deadline is gone and the next tick lands 20 ms later.
        let mid = start + Duration::from_millis(50);
        player.set_fps(50, mid);
        assert!(!player.poll(start + Duration::from_millis(60)));
        assert!(player.poll(mid + Duration::from_millis(20)));
        assert!(!player.poll(mid + Duration::from_millis(21)));
    }

    #[test]
    fn play_while_playing_keeps_schedule() {
        let start = Instant::now();
        let mut player = Player::new(10);
        player.play(start);
        player.play(start + Duration::from_millis(90));
        assert!(player.poll(start + Duration::from_millis(100)));
    }
}
