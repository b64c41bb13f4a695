//! Screen geometry shared by the renderer and the input mapping.
//!
//! Answer boxes sit in the top corners and the reveal circle at the bottom
//! centre, so every recorded trajectory starts from the same place.

use negtrack_core::{Side, View};

/// Axis-aligned box in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Region {
    pub fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x: cx - w * 0.5,
            y: cy - h * 0.5,
            w,
            h,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    pub fn to_rect(self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_xywh(self.x, self.y, self.w, self.h)
    }
}

/// A clickable control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Start,
    Reveal,
    Choice(Side),
    FormOption(usize),
    FormNext,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
}

impl Layout {
    const BOX_W: f32 = 240.0;
    const BOX_H: f32 = 90.0;
    const BUTTON_W: f32 = 200.0;
    const BUTTON_H: f32 = 56.0;
    const OPTION_H: f32 = 36.0;
    const OPTION_GAP: f32 = 8.0;
    /// Rows in the longest question, the age brackets.
    const MAX_OPTIONS: usize = 7;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }

    pub fn text_width(&self) -> f32 {
        (self.width * 0.7).max(200.0)
    }

    pub fn word_pos(&self) -> (f32, f32) {
        self.center()
    }

    pub fn progress_pos(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.05)
    }

    pub fn start_button(&self) -> Region {
        Region::centered(
            self.width * 0.5,
            self.height * 0.85,
            Self::BUTTON_W,
            Self::BUTTON_H,
        )
    }

    /// Bounding box of the reveal circle.
    pub fn reveal_circle(&self) -> Region {
        let d = (self.height * 0.1).clamp(40.0, 90.0);
        Region::centered(self.width * 0.5, self.height * 0.88, d, d)
    }

    pub fn choice_box(&self, side: Side) -> Region {
        let margin = (self.width * 0.03).max(10.0);
        let cx = match side {
            Side::Left => margin + Self::BOX_W * 0.5,
            Side::Right => self.width - margin - Self::BOX_W * 0.5,
        };
        Region::centered(cx, margin + Self::BOX_H * 0.5, Self::BOX_W, Self::BOX_H)
    }

    pub fn question_pos(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.2)
    }

    pub fn warning_pos(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.28)
    }

    /// Option rows, stacked under the question. On short displays the rows
    /// shrink so the longest list still ends above the Next button.
    pub fn form_option(&self, index: usize) -> Region {
        let top = self.height * 0.34;
        let bottom = self.form_next().y - Self::OPTION_GAP;
        let pitch = ((bottom - top) / Self::MAX_OPTIONS as f32)
            .min(Self::OPTION_H + Self::OPTION_GAP)
            .max(Self::OPTION_GAP + 1.0);
        let h = pitch - Self::OPTION_GAP;
        let y = top + index as f32 * pitch;
        Region::centered(self.width * 0.5, y + h * 0.5, Self::BOX_W * 1.5, h)
    }

    pub fn text_field(&self) -> Region {
        Region::centered(
            self.width * 0.5,
            self.height * 0.45,
            self.text_width(),
            Self::OPTION_H,
        )
    }

    pub fn form_next(&self) -> Region {
        self.start_button()
    }

    /// The control under (x, y) in `view`. `options` is the number of choices
    /// shown by the current question, zero for text questions.
    pub fn hit_test(&self, view: View, options: usize, x: f32, y: f32) -> Option<Target> {
        match view {
            View::Instructions => self.start_button().contains(x, y).then_some(Target::Start),
            View::Stage => {
                if self.hits_reveal(x, y) {
                    return Some(Target::Reveal);
                }
                [Side::Left, Side::Right]
                    .into_iter()
                    .find(|side| self.choice_box(*side).contains(x, y))
                    .map(Target::Choice)
            }
            View::Background => {
                if self.form_next().contains(x, y) {
                    return Some(Target::FormNext);
                }
                (0..options)
                    .find(|i| self.form_option(*i).contains(x, y))
                    .map(Target::FormOption)
            }
            View::Finished => None,
        }
    }

    fn hits_reveal(&self, x: f32, y: f32) -> bool {
        let circle = self.reveal_circle();
        let (cx, cy) = circle.center();
        let r = circle.w * 0.5;
        (x - cx).powi(2) + (y - cy).powi(2) <= r * r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new(1280, 720)
    }

    #[test]
    fn choice_boxes_are_in_top_corners() {
        let l = layout();
        let left = l.choice_box(Side::Left);
        let right = l.choice_box(Side::Right);
        assert!(left.center().0 < l.width * 0.5);
        assert!(right.center().0 > l.width * 0.5);
        assert!(left.center().1 < l.height * 0.25);
        assert_eq!(left.y, right.y);
    }

    #[test]
    fn stage_hits_map_to_controls() {
        let l = layout();
        let (rx, ry) = l.reveal_circle().center();
        assert_eq!(l.hit_test(View::Stage, 0, rx, ry), Some(Target::Reveal));

        let (lx, ly) = l.choice_box(Side::Left).center();
        assert_eq!(
            l.hit_test(View::Stage, 0, lx, ly),
            Some(Target::Choice(Side::Left))
        );
        let (x, y) = l.choice_box(Side::Right).center();
        assert_eq!(
            l.hit_test(View::Stage, 0, x, y),
            Some(Target::Choice(Side::Right))
        );

        let (cx, cy) = l.center();
        assert_eq!(l.hit_test(View::Stage, 0, cx, cy), None);
    }

    #[test]
    fn reveal_is_a_circle_not_its_box() {
        let l = layout();
        let bbox = l.reveal_circle();
        assert_eq!(l.hit_test(View::Stage, 0, bbox.x + 1.0, bbox.y + 1.0), None);
    }

    #[test]
    fn controls_only_hit_in_their_view() {
        let l = layout();
        let (sx, sy) = l.start_button().center();
        assert_eq!(l.hit_test(View::Instructions, 0, sx, sy), Some(Target::Start));
        assert_eq!(l.hit_test(View::Finished, 0, sx, sy), None);

        let (lx, ly) = l.choice_box(Side::Left).center();
        assert_eq!(l.hit_test(View::Instructions, 0, lx, ly), None);
    }

    #[test]
    fn form_options_respect_option_count() {
        let l = layout();
        let (x, y) = l.form_option(2).center();
        assert_eq!(
            l.hit_test(View::Background, 3, x, y),
            Some(Target::FormOption(2))
        );
        assert_eq!(l.hit_test(View::Background, 2, x, y), None);

        let (nx, ny) = l.form_next().center();
        assert_eq!(l.hit_test(View::Background, 3, nx, ny), Some(Target::FormNext));
    }

    #[test]
    fn last_age_row_clears_next_on_short_displays() {
        let l = Layout::new(1024, 600);
        let last = l.form_option(6);
        let (x, _) = last.center();
        let y = last.y + last.h - 2.0;
        assert_eq!(l.hit_test(View::Background, 7, x, y), Some(Target::FormOption(6)));
    }

    #[test]
    fn option_rows_never_reach_next() {
        for (w, h) in [(800, 480), (1024, 600), (1280, 720), (1920, 1080), (2560, 1440)] {
            let l = Layout::new(w, h);
            let next = l.form_next();
            for i in 0..7 {
                let row = l.form_option(i);
                assert!(row.y + row.h <= next.y, "{w}x{h} row {i}");
                assert!(row.h > 0.0);
            }
        }
    }
}
