use crate::layout::{Layout, Region};
use crate::scene::Scene;
use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use anyhow::{Result, anyhow};
use negtrack_cache::{TextId, get_text, intern_all, intern_text, text_count};
use negtrack_core::Side;
use negtrack_timing::Timer;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Rect, Stroke,
    Transform,
};
use tracing::debug;

const PAGE: [u8; 4] = [255, 255, 255, 255];

fn ink() -> Color {
    Color::from_rgba8(0, 0, 0, 255)
}

fn muted() -> Color {
    Color::from_rgba8(170, 170, 170, 255)
}

fn highlight() -> Color {
    Color::from_rgba8(200, 220, 255, 255)
}

fn warning() -> Color {
    Color::from_rgba8(190, 20, 20, 255)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// The revealed word.
    Word,
    /// Answer boxes, buttons and questions.
    Label,
    /// Running text and progress.
    Body,
    Warning,
}

impl TextStyle {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        match self {
            TextStyle::Word => 0,
            TextStyle::Label => 1,
            TextStyle::Body => 2,
            TextStyle::Warning => 3,
        }
    }
}

struct TextCache {
    font: Arc<FontVec>,
    size_px: f32,
    color: Color,
    map: HashMap<TextId, Arc<Pixmap>>,
}

impl TextCache {
    fn new(font: Arc<FontVec>, size_px: f32, color: Color) -> Self {
        Self {
            font,
            size_px,
            color,
            map: HashMap::new(),
        }
    }

    fn get_or_render(&mut self, id: TextId) -> Option<Arc<Pixmap>> {
        if let Some(p) = self.map.get(&id) {
            return Some(Arc::clone(p));
        }
        let text = get_text(id)?;
        let pm = Arc::new(render_text_pixmap(
            &text,
            self.size_px,
            self.font.as_ref(),
            self.color,
        )?);
        self.map.insert(id, Arc::clone(&pm));
        Some(pm)
    }
}

fn layout_glyphs<F: Font>(text: &str, font_size: f32, font: &F) -> (Vec<Glyph>, f32) {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::with_capacity(text.len());
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }
    (glyphs, pen_x)
}

/// Advance width of `text` in pixels.
pub fn measure_text<F: Font>(text: &str, font_size: f32, font: &F) -> f32 {
    layout_glyphs(text, font_size, font).1
}

/// Rasterizes `text` into a tightly cropped, premultiplied pixmap.
///
/// Text with no visible glyphs yields a 1x1 transparent pixmap.
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: Color,
) -> Option<Pixmap> {
    let (glyphs, _) = layout_glyphs(text, font_size, font);

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let outlines: Vec<_> = glyphs
        .iter()
        .filter_map(|g| font.outline_glyph(g.clone()))
        .collect();
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    if outlines.is_empty() {
        return Pixmap::new(1, 1);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    let rgba = color.to_color_u8();
    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let Some(slot) = dst.get_mut(iy as usize * stride + ix as usize) else {
                return;
            };

            // Source over destination, both premultiplied.
            let a = (cov * rgba.alpha() as f32 / 255.0).clamp(0.0, 1.0);
            let inv = 1.0 - a;
            let mix = |s: u8, d: u8| ((s as f32 * a) + d as f32 * inv).round().min(255.0) as u8;
            let out_a = mix(255, slot.alpha());
            let r = mix(rgba.red(), slot.red()).min(out_a);
            let g = mix(rgba.green(), slot.green()).min(out_a);
            let bl = mix(rgba.blue(), slot.blue()).min(out_a);
            if let Some(px) = PremultipliedColorU8::from_rgba(r, g, bl, out_a) {
                *slot = px;
            }
        });
    }

    Some(pm)
}

/// Greedy word wrap. Explicit newlines always break.
pub fn wrap_words(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if measure(&candidate) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::take(&mut line));
                line.push_str(word);
            }
        }
        lines.push(line);
    }
    lines
}

pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub dirty_count: usize,
}

pub struct SkiaRenderer {
    width: u32,
    height: u32,
    layout: Layout,

    font: Arc<FontVec>,
    caches: Vec<TextCache>,
    wrapped: HashMap<(TextId, u32), Vec<TextId>>,

    canvas: Pixmap,
    dirty_regions: Vec<Rect>,
    clear_buffer: Vec<u8>,
    first_frame: bool,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: FontVec, word_size: f32) -> Result<Self> {
        let (width, height) = (width.max(1), height.max(1));
        let font = Arc::new(font);
        let sizes = [
            (TextStyle::Word, word_size, ink()),
            (TextStyle::Label, 30.0, ink()),
            (TextStyle::Body, 22.0, ink()),
            (TextStyle::Warning, 22.0, warning()),
        ];
        let mut caches = Vec::with_capacity(TextStyle::COUNT);
        for (style, size, color) in sizes {
            debug_assert_eq!(style.index(), caches.len());
            caches.push(TextCache::new(Arc::clone(&font), size, color));
        }

        Ok(Self {
            width,
            height,
            layout: Layout::new(width, height),
            font,
            caches,
            wrapped: HashMap::new(),
            canvas: Self::blank_canvas(width, height)?,
            dirty_regions: Vec::with_capacity(32),
            clear_buffer: Self::clear_buffer(width, height),
            first_frame: true,
        })
    }

    fn blank_canvas(width: u32, height: u32) -> Result<Pixmap> {
        let mut canvas = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| anyhow!("cannot allocate {width}x{height} canvas"))?;
        canvas.fill(Color::from_rgba8(PAGE[0], PAGE[1], PAGE[2], PAGE[3]));
        Ok(canvas)
    }

    fn clear_buffer(width: u32, height: u32) -> Vec<u8> {
        PAGE.into_iter()
            .cycle()
            .take((width.max(1) * height.max(1) * 4) as usize)
            .collect()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width.max(1);
        self.height = height.max(1);
        self.layout = Layout::new(self.width, self.height);
        self.canvas = Self::blank_canvas(self.width, self.height)?;
        self.clear_buffer = Self::clear_buffer(self.width, self.height);
        self.wrapped.clear();
        self.dirty_regions.clear();
        self.first_frame = true;
        Ok(())
    }

    /// Rasterizes `texts` ahead of time so the first reveal of each word is not
    /// slower than the rest.
    pub fn preload<'a>(&mut self, texts: impl IntoIterator<Item = &'a str>, style: TextStyle) {
        let cache = &mut self.caches[style.index()];
        let count = intern_all(texts)
            .into_iter()
            .filter(|&id| cache.get_or_render(id).is_some())
            .count();
        debug!(?style, count, interned = text_count(), "text preloaded");
    }

    pub fn render_frame<T: Timer>(
        &mut self,
        scene: &Scene<'_>,
        frame_buffer: &mut [u8],
        timer: &T,
    ) -> Result<FrameStats> {
        if frame_buffer.len() != self.clear_buffer.len() {
            return Err(anyhow!(
                "frame buffer holds {} bytes, canvas needs {}",
                frame_buffer.len(),
                self.clear_buffer.len()
            ));
        }
        let start = timer.now();

        if self.first_frame {
            self.first_frame = false;
            self.canvas.data_mut().copy_from_slice(&self.clear_buffer);
            frame_buffer.copy_from_slice(&self.clear_buffer);
            self.dirty_regions.clear();
        }

        let old_dirty = std::mem::take(&mut self.dirty_regions);
        let t = timer.now();
        self.clear_dirty(&old_dirty);
        let clear = timer.elapsed(t);

        let t = timer.now();
        self.draw_scene(scene);
        let draw = timer.elapsed(t);

        let mut present = old_dirty;
        present.extend_from_slice(&self.dirty_regions);
        Self::coalesce_dirty(&mut present);

        let t = timer.now();
        for rect in &present {
            self.copy_dirty_region(*rect, frame_buffer);
        }
        let copy = timer.elapsed(t);

        Ok(FrameStats {
            clear,
            draw,
            copy,
            total: timer.elapsed(start),
            dirty_count: present.len(),
        })
    }

    fn draw_scene(&mut self, scene: &Scene<'_>) {
        match *scene {
            Scene::Instructions {
                text,
                start_enabled,
            } => {
                let layout = self.layout;
                let line_h = self.caches[TextStyle::Body.index()].size_px * 1.5;
                let lines = self.wrapped_lines(text, TextStyle::Body, layout.text_width());
                let mut y = layout.height * 0.15;
                for id in lines {
                    self.blit_text(id, TextStyle::Body, (layout.width * 0.5, y));
                    y += line_h;
                }
                self.button(layout.start_button(), "Start", start_enabled, false);
            }
            Scene::Stage {
                word,
                reveal_visible,
                choices_enabled,
                left_label,
                right_label,
                progress,
            } => {
                let layout = self.layout;
                for (side, label) in [(Side::Left, left_label), (Side::Right, right_label)] {
                    self.button(layout.choice_box(side), label, choices_enabled, false);
                }
                if let Some(word) = word {
                    self.draw_text(word, TextStyle::Word, layout.word_pos());
                }
                if reveal_visible {
                    self.fill_circle(layout.reveal_circle(), ink());
                }
                if let Some((current, total)) = progress {
                    self.draw_text(
                        &format!("{current} / {total}"),
                        TextStyle::Body,
                        layout.progress_pos(),
                    );
                }
            }
            Scene::Background {
                question,
                options,
                selected,
                text,
                warning,
            } => {
                let layout = self.layout;
                self.draw_text(question, TextStyle::Label, layout.question_pos());
                if let Some(warning) = warning {
                    self.draw_text(warning, TextStyle::Warning, layout.warning_pos());
                }
                for (i, option) in options.iter().enumerate() {
                    self.button(layout.form_option(i), option, true, selected == Some(i));
                }
                if let Some(text) = text {
                    let field = layout.text_field();
                    self.stroke_region(field, ink(), 2.0);
                    if !text.is_empty() {
                        self.draw_live_text(text, TextStyle::Body, field.center());
                    }
                }
                self.button(layout.form_next(), "Next", true, false);
            }
            Scene::Finished => {
                let pos = self.layout.center();
                self.draw_text(
                    "Thank you! Your responses have been recorded.",
                    TextStyle::Label,
                    pos,
                );
            }
        }
    }

    fn wrapped_lines(&mut self, text: &str, style: TextStyle, max_width: f32) -> Vec<TextId> {
        let key = (intern_text(text), max_width as u32);
        if let Some(lines) = self.wrapped.get(&key) {
            return lines.clone();
        }
        let size = self.caches[style.index()].size_px;
        let font = self.font.as_ref();
        let lines: Vec<TextId> = wrap_words(text, max_width, |s| measure_text(s, size, font))
            .iter()
            .map(|line| intern_text(line))
            .collect();
        self.wrapped.insert(key, lines.clone());
        lines
    }

    fn button(&mut self, region: Region, label: &str, enabled: bool, selected: bool) {
        if selected {
            self.fill_region(region, highlight());
        }
        let edge = if enabled { ink() } else { muted() };
        self.stroke_region(region, edge, 2.0);
        self.draw_text(label, TextStyle::Label, region.center());
    }

    fn draw_text(&mut self, text: &str, style: TextStyle, pos: (f32, f32)) {
        self.blit_text(intern_text(text), style, pos);
    }

    /// Typed answers change every keystroke, so they bypass the cache.
    fn draw_live_text(&mut self, text: &str, style: TextStyle, pos: (f32, f32)) {
        let cache = &self.caches[style.index()];
        if let Some(pm) = render_text_pixmap(text, cache.size_px, self.font.as_ref(), cache.color)
        {
            self.blit_pixmap(&pm, pos);
        }
    }

    fn blit_text(&mut self, id: TextId, style: TextStyle, pos: (f32, f32)) {
        if let Some(pm) = self.caches[style.index()].get_or_render(id) {
            self.blit_pixmap(&pm, pos);
        }
    }

    /// Draws `pm` centred on `pos`.
    fn blit_pixmap(&mut self, pm: &Pixmap, pos: (f32, f32)) {
        let (w, h) = (pm.width() as f32, pm.height() as f32);
        let x = (pos.0 - w * 0.5).floor();
        let y = (pos.1 - h * 0.5).floor();
        self.canvas.draw_pixmap(
            x as i32,
            y as i32,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        self.mark_dirty(x, y, w, h);
    }

    fn fill_region(&mut self, region: Region, color: Color) {
        let Some(rect) = region.to_rect() else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color);
        self.canvas
            .fill_rect(rect, &paint, Transform::identity(), None);
        self.mark_dirty(region.x, region.y, region.w, region.h);
    }

    fn stroke_region(&mut self, region: Region, color: Color, width: f32) {
        let Some(path) = region.to_rect().map(PathBuilder::from_rect) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = false;
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.canvas
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        self.mark_dirty(
            region.x - width,
            region.y - width,
            region.w + width * 2.0,
            region.h + width * 2.0,
        );
    }

    fn fill_circle(&mut self, region: Region, color: Color) {
        let (cx, cy) = region.center();
        let Some(path) = PathBuilder::from_circle(cx, cy, region.w * 0.5) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        self.canvas.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            None,
        );
        self.mark_dirty(region.x - 1.0, region.y - 1.0, region.w + 2.0, region.h + 2.0);
    }

    /// Records the on-canvas part of a drawn area.
    fn mark_dirty(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (cw, ch) = (self.width as f32, self.height as f32);
        let x0 = x.floor().clamp(0.0, cw);
        let y0 = y.floor().clamp(0.0, ch);
        let x1 = (x + w).ceil().clamp(0.0, cw);
        let y1 = (y + h).ceil().clamp(0.0, ch);
        if let Some(rect) = Rect::from_ltrb(x0, y0, x1, y1) {
            self.dirty_regions.push(rect);
        }
    }

    fn pixel_span(&self, rect: Rect) -> Option<(usize, usize, usize, usize)> {
        let x0 = rect.x().floor().max(0.0).min(self.width as f32) as usize;
        let y0 = rect.y().floor().max(0.0).min(self.height as f32) as usize;
        let x1 = (rect.x() + rect.width()).ceil().min(self.width as f32) as usize;
        let y1 = (rect.y() + rect.height()).ceil().min(self.height as f32) as usize;
        (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
    }

    fn clear_dirty(&mut self, dirty: &[Rect]) {
        let stride = self.width as usize * 4;
        for rect in dirty {
            let Some((x0, y0, x1, y1)) = self.pixel_span(*rect) else {
                continue;
            };
            let row_len = (x1 - x0) * 4;
            let canvas_data = self.canvas.data_mut();
            for y in y0..y1 {
                let off = y * stride + x0 * 4;
                canvas_data[off..off + row_len]
                    .copy_from_slice(&self.clear_buffer[off..off + row_len]);
            }
        }
    }

    fn copy_dirty_region(&self, dirty: Rect, frame_buffer: &mut [u8]) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(dirty) else {
            return;
        };
        let bytes = (x1 - x0) * 4;
        let row_bytes = self.width as usize * 4;
        let canvas_data = self.canvas.data();
        for row in y0..y1 {
            let off = row * row_bytes + x0 * 4;
            frame_buffer[off..off + bytes].copy_from_slice(&canvas_data[off..off + bytes]);
        }
    }

    /// Merges rects that share a row band and touch horizontally.
    fn coalesce_dirty(rects: &mut Vec<Rect>) {
        rects.sort_by(|a, b| a.y().total_cmp(&b.y()).then(a.x().total_cmp(&b.x())));

        let mut out: Vec<Rect> = Vec::with_capacity(rects.len());
        for r in rects.drain(..) {
            if let Some(last) = out.last_mut() {
                let same_row =
                    (r.y() - last.y()).abs() < 1.0 && (r.height() - last.height()).abs() < 1.0;
                let touching = r.x() <= last.right() + 1.0;
                if same_row && touching {
                    if let Some(merged) = Rect::from_ltrb(
                        last.left().min(r.left()),
                        last.top(),
                        last.right().max(r.right()),
                        last.bottom(),
                    ) {
                        *last = merged;
                        continue;
                    }
                }
            }
            out.push(r);
        }
        *rects = out;
    }
}
