//! The editing context: one object owning the timeline, history, tool
//! state, effect parameters and the RNG behind the nondeterministic
//! generators. Collaborators (rendering, transport, CLI) operate through
//! this object; there is no module-level state.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::color::Rgb;
use crate::draw;
use crate::effects::{self, EffectBank, EffectKind};
use crate::error::GlowgridResult;
use crate::grid::Frame;
use crate::history::History;
use crate::timeline::{Animation, Timeline};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Pen,
    Eraser,
    Fill,
    Line,
    Rectangle,
    Circle,
}

/// In-progress pointer stroke: the anchor cell and a copy of the frame as
/// it was before the stroke. Shape tools re-render against `base` on every
/// drag so intermediate positions never leave artifacts behind.
#[derive(Debug)]
struct Stroke {
    anchor: (usize, usize),
    base: Frame,
}

pub struct Editor {
    timeline: Timeline,
    history: History,
    effects: EffectBank,
    rng: StdRng,
    stroke: Option<Stroke>,
    pub tool: Tool,
    pub color: Rgb,
    pub brush_size: u32,
}

impl Editor {
    pub fn new(seed: u64) -> Self {
        Self {
            timeline: Timeline::default(),
            history: History::new(),
            effects: EffectBank::new(),
            rng: StdRng::seed_from_u64(seed),
            stroke: None,
            tool: Tool::Pen,
            color: Rgb::new(0xff, 0x00, 0x4d),
            brush_size: 1,
        }
    }

    pub fn with_animation(anim: Animation, seed: u64) -> GlowgridResult<Self> {
        let mut editor = Self::new(seed);
        editor.timeline = Timeline::new(anim)?;
        Ok(editor)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    pub fn effects_mut(&mut self) -> &mut EffectBank {
        &mut self.effects
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Pointer pressed on a cell: snapshot for undo, remember the stroke
    /// anchor and pre-stroke frame, then apply the tool once.
    pub fn stroke_begin(&mut self, row: usize, col: usize) {
        let base = self.timeline.current().clone();
        self.history.push(base.clone());
        self.stroke = Some(Stroke {
            anchor: (row, col),
            base,
        });
        self.apply_tool(row, col, false);
    }

    /// Pointer dragged onto another cell. Ignored when no stroke is active.
    pub fn stroke_move(&mut self, row: usize, col: usize) {
        if self.stroke.is_some() {
            self.apply_tool(row, col, true);
        }
    }

    /// Pointer released; the stroke result stays on the frame.
    pub fn stroke_end(&mut self) {
        self.stroke = None;
    }

    fn apply_tool(&mut self, row: usize, col: usize, dragging: bool) {
        match self.tool {
            Tool::Pen => {
                let (color, size) = (self.color, self.brush_size);
                draw::brush(self.timeline.current_mut(), row as i32, col as i32, size, color);
            }
            Tool::Eraser => {
                let size = self.brush_size;
                draw::brush(
                    self.timeline.current_mut(),
                    row as i32,
                    col as i32,
                    size,
                    Rgb::BLACK,
                );
            }
            Tool::Fill => {
                if dragging {
                    return;
                }
                let color = self.color;
                draw::flood_fill(self.timeline.current_mut(), row, col, color);
            }
            Tool::Line | Tool::Rectangle | Tool::Circle => {
                let Some(stroke) = &self.stroke else {
                    return;
                };
                let (anchor, base) = (stroke.anchor, stroke.base.clone());
                *self.timeline.current_mut() = base;
                self.draw_shape(anchor, (row, col));
            }
        }
    }

    fn draw_shape(&mut self, (r0, c0): (usize, usize), (r1, c1): (usize, usize)) {
        let color = self.color;
        let (r0, c0, r1, c1) = (r0 as i32, c0 as i32, r1 as i32, c1 as i32);
        let frame = self.timeline.current_mut();
        match self.tool {
            Tool::Line => draw::line(frame, r0, c0, r1, c1, color),
            Tool::Rectangle => {
                draw::rectangle(frame, (r0, c0), (r1, c1), self.brush_size, color)
            }
            Tool::Circle => {
                let radius = f64::from((r1 - r0).pow(2) + (c1 - c0).pow(2))
                    .sqrt()
                    .round() as i32;
                draw::circle(frame, r0, c0, radius, color);
            }
            _ => unreachable!("only shape tools reach draw_shape"),
        }
    }

    /// Blank out the current frame (undoable).
    pub fn clear_frame(&mut self) {
        self.history.push(self.timeline.current().clone());
        *self.timeline.current_mut() = Frame::blank();
    }

    /// Replace the current frame with a generated effect (undoable). The
    /// effect's retained parameter set is used, lazily initialized from its
    /// defaults.
    pub fn apply_effect(&mut self, kind: EffectKind) {
        self.history.push(self.timeline.current().clone());
        let params = self.effects.params(kind).clone();
        *self.timeline.current_mut() = effects::generate(kind, &params, &mut self.rng);
    }

    /// Like [`Editor::apply_effect`] but keyed by wire name; an unknown
    /// name installs a blank frame.
    pub fn apply_named_effect(&mut self, name: &str) {
        match EffectKind::from_name(name) {
            Some(kind) => self.apply_effect(kind),
            None => self.clear_frame(),
        }
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(self.timeline.current_mut())
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(self.timeline.current_mut())
    }

    /// Swap in a loaded or imported animation. The editor's history and
    /// stroke state reset; on error the current animation is untouched.
    pub fn replace_animation(&mut self, anim: Animation) -> GlowgridResult<()> {
        self.timeline.replace(anim)?;
        self.history = History::new();
        self.stroke = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Rgb {
        Rgb::new(255, 0, 0)
    }

    #[test]
    fn pen_stroke_is_undoable() {
        let mut editor = Editor::new(1);
        editor.stroke_begin(0, 0);
        editor.stroke_end();
        assert!(!editor.timeline().current().get(0, 0).is_off());

        assert!(editor.undo());
        assert!(editor.timeline().current().get(0, 0).is_off());
        assert!(editor.redo());
        assert!(!editor.timeline().current().get(0, 0).is_off());
    }

    #[test]
    fn eraser_paints_black() {
        let mut editor = Editor::new(1);
        editor.color = red();
        editor.stroke_begin(2, 2);
        editor.stroke_end();

        editor.tool = Tool::Eraser;
        editor.stroke_begin(2, 2);
        editor.stroke_end();
        assert!(editor.timeline().current().get(2, 2).is_off());
    }

    #[test]
    fn fill_ignores_drag_cells() {
        let mut editor = Editor::new(1);
        editor.tool = Tool::Fill;
        editor.color = red();
        editor.stroke_begin(0, 0);
        // Paint something different so a drag-triggered fill would show.
        editor.timeline_mut().current_mut().set(9, 20, Rgb::new(1, 2, 3));
        editor.stroke_move(9, 20);
        editor.stroke_end();
        assert_eq!(editor.timeline().current().get(9, 20), Rgb::new(1, 2, 3));
    }

    #[test]
    fn shape_drag_never_accumulates_previews() {
        let mut editor = Editor::new(1);
        editor.tool = Tool::Line;
        editor.color = red();

        editor.stroke_begin(0, 0);
        editor.stroke_move(9, 0);
        editor.stroke_move(0, 20);
        editor.stroke_end();

        // Only the final line may remain: nothing from the (0,0)->(9,0)
        // intermediate preview.
        let frame = editor.timeline().current();
        assert!(frame.get(9, 0).is_off());
        assert!(!frame.get(0, 0).is_off());
        assert!(!frame.get(0, 20).is_off());
    }

    #[test]
    fn circle_radius_comes_from_drag_distance() {
        let mut editor = Editor::new(1);
        editor.tool = Tool::Circle;
        editor.color = red();
        editor.stroke_begin(5, 10);
        editor.stroke_move(5, 13);
        editor.stroke_end();

        let frame = editor.timeline().current();
        assert!(!frame.get(5, 13).is_off());
        assert!(!frame.get(5, 7).is_off());
        assert!(!frame.get(2, 10).is_off());
        assert!(!frame.get(8, 10).is_off());
    }

    #[test]
    fn apply_effect_is_undoable_and_seed_stable() {
        let mut a = Editor::new(42);
        let mut b = Editor::new(42);
        a.apply_effect(EffectKind::Fire);
        b.apply_effect(EffectKind::Fire);
        assert_eq!(a.timeline().current(), b.timeline().current());

        assert!(a.undo());
        assert_eq!(a.timeline().current(), &Frame::blank());
    }

    #[test]
    fn unknown_named_effect_blanks_the_frame() {
        let mut editor = Editor::new(1);
        editor.stroke_begin(0, 0);
        editor.stroke_end();
        editor.apply_named_effect("no-such-effect");
        assert_eq!(editor.timeline().current(), &Frame::blank());
    }

    #[test]
    fn replace_animation_resets_history() {
        let mut editor = Editor::new(1);
        editor.stroke_begin(0, 0);
        editor.stroke_end();

        editor.replace_animation(Animation::new()).unwrap();
        assert!(!editor.undo());
        assert_eq!(editor.timeline().cursor(), 0);
    }

    #[test]
    fn replace_rejects_invalid_animation_untouched() {
        let mut editor = Editor::new(1);
        editor.stroke_begin(3, 3);
        editor.stroke_end();
        let before = editor.timeline().current().clone();

        let mut bad = Animation::new();
        bad.frames.clear();
        assert!(editor.replace_animation(bad).is_err());
        assert_eq!(editor.timeline().current(), &before);
    }
}
