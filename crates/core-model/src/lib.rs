//! High-level editor model: session state plus its view.
//!
//! A `View` owns presentation state that the editing core still has to reason
//! about even without a renderer: which line is at the top of the viewport,
//! how tall the viewport is and whether a reveal animation is in flight.
//!
//! Reveal semantics:
//! * Selection updates made with `show = true` leave a reveal request on the
//!   state; [`EditorModel::sync_reveal`] turns it into a scroll of the view so
//!   the caret line sits inside the margin band.
//! * With animation enabled the scroll is spread over a fixed number of ticks.
//!   A new reveal supersedes any animation still running: the old one is
//!   cancelled (its generation retired) before the new one starts, so two
//!   animations never fight over `first_line`.
//!
//! Invariants:
//! * `first_line` never exceeds the buffer's last line.
//! * At most one `RevealAnimation` exists per view.

use core_state::EditorState;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

mod reveal;
pub use reveal::RevealAnimation;

/// Reveal tuning shared by all views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealConfig {
    pub margin: usize,
    pub animate: bool,
    pub tick: Duration,
    pub steps: u32,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            margin: 1,
            animate: false,
            tick: Duration::from_millis(20),
            steps: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct View {
    pub first_line: usize,
    pub height: usize,
    config: RevealConfig,
    animation: Option<RevealAnimation>,
    generation: u64,
}

impl View {
    pub fn new(height: usize, config: RevealConfig) -> Self {
        Self {
            first_line: 0,
            height,
            config,
            animation: None,
            generation: 0,
        }
    }

    pub fn config(&self) -> RevealConfig {
        self.config
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn animation(&self) -> Option<&RevealAnimation> {
        self.animation.as_ref()
    }

    /// Scroll so `line` is within the margin band. Returns true if the view
    /// changed or an animation was started.
    pub fn reveal_line(&mut self, line: usize, now: Instant) -> bool {
        let Some(target) =
            compute_scroll_intent(self.first_line, line, self.height, self.config.margin)
        else {
            return false;
        };
        if self.config.animate && self.config.steps > 1 {
            self.start_animation(target, now);
        } else {
            self.cancel_animation();
            debug!(target: "model.reveal", from = self.first_line, to = target, "reveal_jump");
            self.first_line = target;
        }
        true
    }

    fn start_animation(&mut self, target: usize, now: Instant) {
        self.cancel_animation();
        self.generation += 1;
        let anim = RevealAnimation::new(
            self.generation,
            self.first_line,
            target,
            self.config.steps,
            self.config.tick,
            now,
        );
        debug!(target: "model.reveal", generation = self.generation, from = self.first_line, to = target, "reveal_animation_start");
        self.animation = Some(anim);
    }

    /// Cancel any running animation, leaving `first_line` where it is.
    pub fn cancel_animation(&mut self) {
        if let Some(old) = self.animation.take() {
            debug!(target: "model.reveal", generation = old.generation(), "reveal_superseded");
        }
    }

    /// Advance a running animation. Returns true if `first_line` moved.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(anim) = self.animation.as_mut() else {
            return false;
        };
        let Some(line) = anim.advance(now) else {
            return false;
        };
        let moved = line != self.first_line;
        self.first_line = line;
        trace!(target: "model.reveal", first_line = line, "reveal_tick");
        if anim.is_finished() {
            self.animation = None;
        }
        moved
    }
}

pub struct EditorModel {
    state: EditorState,
    view: View,
}

impl EditorModel {
    pub fn new(state: EditorState) -> Self {
        Self::with_view(state, View::new(24, RevealConfig::default()))
    }

    pub fn with_view(state: EditorState, view: View) -> Self {
        Self { state, view }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }
    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }
    pub fn view(&self) -> &View {
        &self.view
    }
    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    /// Disjoint mutable access to the state and its view.
    pub fn split_state_and_view(&mut self) -> (&mut EditorState, &mut View) {
        (&mut self.state, &mut self.view)
    }

    /// Consume a pending reveal request from the state and scroll the view.
    pub fn sync_reveal(&mut self, now: Instant) -> bool {
        let Some(sel) = self.state.take_reveal() else {
            return false;
        };
        let line = self.state.buffer().line_at_offset(sel.caret).unwrap_or(0);
        self.view.reveal_line(line, now)
    }
}

/// Compute the desired new first visible line to keep `line` within the
/// vertical viewport subject to a top/bottom margin.
///
/// Returns Some(new_first) if a scroll is needed, else None when the line is
/// already within the permitted band. The computation never underflows.
pub fn compute_scroll_intent(
    first: usize,
    line: usize,
    text_height: usize,
    margin: usize,
) -> Option<usize> {
    if text_height == 0 {
        return None;
    }
    let m = margin.min(text_height.saturating_sub(1) / 2);
    let top = first;
    let bottom = first + text_height;
    if line < top + m {
        let new_first = line.saturating_sub(m);
        if new_first != first {
            return Some(new_first);
        }
    } else if line + m >= bottom {
        let new_first = line + m + 1 - text_height;
        if new_first != first {
            return Some(new_first);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Buffer;

    fn model(lines: usize, height: usize, config: RevealConfig) -> EditorModel {
        let text = (0..lines)
            .map(|i| format!("line{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let st = EditorState::new(Buffer::from_str("t", &text));
        EditorModel::with_view(st, View::new(height, config))
    }

    #[test]
    fn scroll_intent_respects_margin() {
        assert_eq!(compute_scroll_intent(0, 5, 10, 1), None);
        assert_eq!(compute_scroll_intent(0, 9, 10, 1), Some(1));
        assert_eq!(compute_scroll_intent(10, 10, 10, 2), Some(8));
        assert_eq!(compute_scroll_intent(0, 0, 10, 2), None);
        assert_eq!(compute_scroll_intent(0, 3, 0, 2), None);
    }

    #[test]
    fn reveal_jumps_without_animation() {
        let mut m = model(100, 10, RevealConfig::default());
        let start = m.state().buffer().line_start(50).unwrap();
        m.state_mut().set_caret_offset(start, true);
        assert!(m.sync_reveal(Instant::now()));
        assert_eq!(m.view().first_line, 42);
        assert!(!m.view().is_animating());
        assert!(!m.sync_reveal(Instant::now()), "request consumed");
    }

    #[test]
    fn selection_without_show_does_not_scroll() {
        let mut m = model(100, 10, RevealConfig::default());
        let start = m.state().buffer().line_start(50).unwrap();
        m.state_mut().set_caret_offset(start, false);
        assert!(!m.sync_reveal(Instant::now()));
        assert_eq!(m.view().first_line, 0);
    }

    #[test]
    fn animated_reveal_advances_per_tick_and_finishes() {
        let cfg = RevealConfig {
            margin: 0,
            animate: true,
            tick: Duration::from_millis(20),
            steps: 4,
        };
        let mut m = model(200, 10, cfg);
        let t0 = Instant::now();
        let start = m.state().buffer().line_start(49).unwrap();
        m.state_mut().set_caret_offset(start, true);
        assert!(m.sync_reveal(t0));
        assert!(m.view().is_animating());
        assert_eq!(m.view().first_line, 0);
        assert!(!m.view_mut().tick(t0), "not due yet");
        let mut now = t0;
        for _ in 0..4 {
            now += Duration::from_millis(20);
            m.view_mut().tick(now);
        }
        assert_eq!(m.view().first_line, 40);
        assert!(!m.view().is_animating());
    }

    #[test]
    fn new_reveal_supersedes_running_animation() {
        let cfg = RevealConfig {
            margin: 0,
            animate: true,
            tick: Duration::from_millis(20),
            steps: 2,
        };
        let mut view = View::new(10, cfg);
        let t0 = Instant::now();
        view.reveal_line(100, t0);
        let first_gen = view.animation().unwrap().generation();
        view.tick(t0 + Duration::from_millis(20));
        let midway = view.first_line;
        assert!(midway > 0 && midway < 91);
        view.reveal_line(20, t0 + Duration::from_millis(25));
        let anim = view.animation().unwrap();
        assert!(anim.generation() > first_gen);
        assert_eq!(anim.target(), 20);
        view.tick(t0 + Duration::from_millis(45));
        view.tick(t0 + Duration::from_millis(65));
        assert_eq!(view.first_line, 20);
        assert!(!view.is_animating());
    }
}
