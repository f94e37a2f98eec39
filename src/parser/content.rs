//! Page content interpretation.
//!
//! Walks a page's content stream and collects the two things the structure
//! engine needs: positioned text spans (with font information) and the
//! straight ruling segments drawn on the page. All output coordinates use the
//! top-left page origin of [`BoundingBox`].

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use super::backend::{ContentOp, MediaBox, PageId, PdfBackend, PdfValue};
use super::options::{ErrorMode, PageSelection};
use crate::error::Result;
use crate::model::{font_style_flags, BoundingBox};

/// Rectangles thinner than this are drawn lines, not boxes.
const THIN_RECT: f32 = 2.0;

/// Maximum deviation for a segment to count as axis-aligned.
const AXIS_TOLERANCE: f32 = 1.0;

/// TJ adjustment (thousandths of an em) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A run of text drawn by one show operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Left edge
    pub x0: f32,
    /// Right edge (estimated from glyph advances)
    pub x1: f32,
    /// Top edge (distance from the top of the page)
    pub top: f32,
    /// Bottom edge
    pub bottom: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Base font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    pub is_bold: bool,
    pub is_italic: bool,
}

impl TextSpan {
    /// Create a span whose box extends one font size below `top`.
    pub fn new(
        text: impl Into<String>,
        x0: f32,
        x1: f32,
        top: f32,
        font_size: f32,
        font_name: impl Into<String>,
    ) -> Self {
        let font_name = font_name.into();
        let (is_bold, is_italic) = font_style_flags(&font_name);
        Self {
            text: text.into(),
            x0: x0.min(x1),
            x1: x0.max(x1),
            top,
            bottom: top + font_size,
            font_size,
            font_name,
            is_bold,
            is_italic,
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn bbox(&self, page: usize) -> BoundingBox {
        BoundingBox::new(self.x0, self.top, self.x1, self.bottom, page)
    }

    /// Number of non-whitespace characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

/// Direction of a ruling segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A straight, axis-aligned line drawn on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Segment {
    /// Create a segment with ordered end points.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn horizontal(y: f32, x0: f32, x1: f32) -> Self {
        Self::new(x0, y, x1, y)
    }

    pub fn vertical(x: f32, y0: f32, y1: f32) -> Self {
        Self::new(x, y0, x, y1)
    }

    /// `None` for diagonal segments.
    pub fn orientation(&self) -> Option<Orientation> {
        let dx = self.x1 - self.x0;
        let dy = self.y1 - self.y0;
        if dy <= AXIS_TOLERANCE && dx > dy {
            Some(Orientation::Horizontal)
        } else if dx <= AXIS_TOLERANCE && dy > dx {
            Some(Orientation::Vertical)
        } else {
            None
        }
    }

    pub fn length(&self) -> f32 {
        (self.x1 - self.x0).max(self.y1 - self.y0)
    }
}

/// Everything extracted from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    /// 0-indexed page number
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub spans: Vec<TextSpan>,
    pub segments: Vec<Segment>,
}

impl PageContent {
    /// An empty page of the given size.
    pub fn new(index: usize, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            spans: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Spans whose center lies inside `region`.
    pub fn spans_in<'a>(&'a self, region: &BoundingBox) -> impl Iterator<Item = &'a TextSpan> + 'a {
        let region = *region;
        self.spans.iter().filter(move |s| {
            let (cx, cy) = s.center();
            region.contains_point(cx, cy)
        })
    }

    /// Copy of this page restricted to a region.
    pub fn crop(&self, region: &BoundingBox) -> PageContent {
        let spans = self.spans_in(region).cloned().collect();
        let segments = self
            .segments
            .iter()
            .filter(|s| {
                s.x1 >= region.x0 && s.x0 <= region.x1 && s.y1 >= region.y0 && s.y0 <= region.y1
            })
            .copied()
            .collect();
        PageContent {
            index: self.index,
            width: self.width,
            height: self.height,
            spans,
            segments,
        }
    }
}

/// Extract the content of every selected page.
///
/// In lenient mode a page that cannot be read is logged and returned empty so
/// page indices stay aligned with the document.
pub fn extract_pages<B: PdfBackend + ?Sized>(
    backend: &B,
    selection: &PageSelection,
    error_mode: ErrorMode,
) -> Result<Vec<PageContent>> {
    let page_ids = backend.pages();
    selection.check_bounds(page_ids.len() as u32)?;

    let mut pages = Vec::new();
    for (&page_num, &page_id) in &page_ids {
        if !selection.includes(page_num) {
            continue;
        }

        let index = page_num.saturating_sub(1) as usize;
        match ContentInterpreter::new(backend, page_id).run(index) {
            Ok(page) => pages.push(page),
            Err(e) if error_mode == ErrorMode::Lenient => {
                log::warn!("Failed to read page {}: {}", page_num, e);
                let media = backend.media_box(page_id);
                pages.push(PageContent::new(index, media.width(), media.height()));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(pages)
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(ops: &[PdfValue]) -> Option<Matrix> {
        if ops.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: ops[0].as_number()?,
            b: ops[1].as_number()?,
            c: ops[2].as_number()?,
            d: ops[3].as_number()?,
            e: ops[4].as_number()?,
            f: ops[5].as_number()?,
        })
    }

    fn translation(tx: f32, ty: f32) -> Matrix {
        Matrix {
            e: tx,
            f: ty,
            ..Matrix::IDENTITY
        }
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// Length of the transformed unit vertical vector.
    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text state parameters (PDF 32000-1 §9.3).
#[derive(Debug, Clone)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    font_resource: Vec<u8>,
    font_name: String,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_resource: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn advance(&mut self, tx: f32) {
        self.matrix = Matrix::translation(tx, 0.0).then(&self.matrix);
    }

    /// Horizontal displacement of one glyph in unscaled text space.
    fn glyph_advance(&self, c: char) -> f32 {
        let spacing = if c == ' ' {
            self.char_spacing + self.word_spacing
        } else {
            self.char_spacing
        };
        (glyph_width_em(c) * self.font_size + spacing) * self.horizontal_scale
    }
}

/// Pending path pieces between construction and painting operators.
#[derive(Debug, Default)]
struct PathBuilder {
    lines: Vec<((f32, f32), (f32, f32))>,
    rects: Vec<[(f32, f32); 4]>,
    current: Option<(f32, f32)>,
    start: Option<(f32, f32)>,
}

impl PathBuilder {
    fn move_to(&mut self, p: (f32, f32)) {
        self.current = Some(p);
        self.start = Some(p);
    }

    fn line_to(&mut self, p: (f32, f32)) {
        if let Some(from) = self.current {
            self.lines.push((from, p));
        }
        self.current = Some(p);
    }

    fn close(&mut self) {
        if let (Some(from), Some(to)) = (self.current, self.start) {
            if from != to {
                self.lines.push((from, to));
            }
            self.current = Some(to);
        }
    }

    fn clear(&mut self) {
        *self = PathBuilder::default();
    }
}

/// Content stream interpreter for one page.
pub struct ContentInterpreter<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    page_id: PageId,
    media: MediaBox,
    ctm: Matrix,
    saved: Vec<Matrix>,
    text: TextState,
    in_text: bool,
    path: PathBuilder,
    font_names: HashMap<Vec<u8>, String>,
    spans: Vec<TextSpan>,
    segments: Vec<Segment>,
}

impl<'a, B: PdfBackend + ?Sized> ContentInterpreter<'a, B> {
    pub fn new(backend: &'a B, page_id: PageId) -> Self {
        Self {
            backend,
            page_id,
            media: backend.media_box(page_id),
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            text: TextState::default(),
            in_text: false,
            path: PathBuilder::default(),
            font_names: HashMap::new(),
            spans: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Read, decode and interpret the page's content stream.
    pub fn run(self, index: usize) -> Result<PageContent> {
        let data = self.backend.page_content(self.page_id)?;
        let ops = self.backend.decode_content(&data)?;
        Ok(self.interpret(index, &ops))
    }

    /// Interpret already-decoded operations.
    pub fn interpret(mut self, index: usize, ops: &[ContentOp]) -> PageContent {
        for op in ops {
            self.apply(op);
        }

        log::debug!(
            "Page {}: {} spans, {} segments",
            index,
            self.spans.len(),
            self.segments.len()
        );

        PageContent {
            index,
            width: self.media.width(),
            height: self.media.height(),
            spans: self.spans,
            segments: self.segments,
        }
    }

    fn apply(&mut self, op: &ContentOp) {
        let operands = op.operands.as_slice();
        let num = |i: usize| operands.get(i).and_then(PdfValue::as_number);

        match op.operator.as_str() {
            // Graphics state
            "q" => self.saved.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.ctm = m.then(&self.ctm);
                }
            }

            // Path construction
            "m" => {
                if let (Some(x), Some(y)) = (num(0), num(1)) {
                    let p = self.to_page(x, y);
                    self.path.move_to(p);
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (num(0), num(1)) {
                    let p = self.to_page(x, y);
                    self.path.line_to(p);
                }
            }
            "re" => {
                if let (Some(x), Some(y), Some(w), Some(h)) = (num(0), num(1), num(2), num(3)) {
                    let corners = [
                        self.to_page(x, y),
                        self.to_page(x + w, y),
                        self.to_page(x + w, y + h),
                        self.to_page(x, y + h),
                    ];
                    self.path.rects.push(corners);
                    self.path.move_to(corners[0]);
                }
            }
            "h" => self.path.close(),

            // Path painting
            "S" | "B" | "B*" => self.paint(true),
            "s" | "b" | "b*" => {
                self.path.close();
                self.paint(true);
            }
            "f" | "F" | "f*" => self.paint(false),
            "n" => self.path.clear(),

            // Text objects and state
            "BT" => {
                self.in_text = true;
                self.text.matrix = Matrix::IDENTITY;
                self.text.line_matrix = Matrix::IDENTITY;
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = operands.first() {
                    self.text.font_name = self.font_name(name);
                    self.text.font_resource = name.clone();
                }
                if let Some(size) = num(1) {
                    self.text.font_size = size;
                }
            }
            "Tc" => self.text.char_spacing = num(0).unwrap_or(0.0),
            "Tw" => self.text.word_spacing = num(0).unwrap_or(0.0),
            "Tz" => self.text.horizontal_scale = num(0).unwrap_or(100.0) / 100.0,
            "TL" => self.text.leading = num(0).unwrap_or(0.0),

            // Text positioning
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.text.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.text.leading = -ty;
                    self.text.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.text.matrix = m;
                    self.text.line_matrix = m;
                }
            }
            "T*" => self.text.next_line(),

            // Text showing
            "Tj" => {
                if let Some(value @ PdfValue::Str(_)) = operands.first() {
                    self.show(std::slice::from_ref(value));
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = operands.first() {
                    self.show(items);
                }
            }
            "'" => {
                self.text.next_line();
                if let Some(value @ PdfValue::Str(_)) = operands.first() {
                    self.show(std::slice::from_ref(value));
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (num(0), num(1)) {
                    self.text.word_spacing = aw;
                    self.text.char_spacing = ac;
                }
                self.text.next_line();
                if let Some(value @ PdfValue::Str(_)) = operands.get(2) {
                    self.show(std::slice::from_ref(value));
                }
            }
            _ => {}
        }
    }

    /// Convert user-space coordinates to top-left page coordinates.
    fn to_page(&self, x: f32, y: f32) -> (f32, f32) {
        let (dx, dy) = self.ctm.apply(x, y);
        (dx - self.media.x0, self.media.y1 - dy)
    }

    fn font_name(&mut self, resource: &[u8]) -> String {
        if let Some(name) = self.font_names.get(resource) {
            return name.clone();
        }
        let name = self
            .backend
            .base_font(self.page_id, resource)
            .unwrap_or_else(|| String::from_utf8_lossy(resource).to_string());
        self.font_names.insert(resource.to_vec(), name.clone());
        name
    }

    /// Show strings and kerning adjustments (a Tj operand or a TJ array) as
    /// one span.
    fn show(&mut self, items: &[PdfValue]) {
        if !self.in_text {
            return;
        }

        let start = self.text.matrix.then(&self.ctm);
        let mut text = String::new();

        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    let decoded =
                        self.backend
                            .decode_text(self.page_id, &self.text.font_resource, bytes);
                    for c in decoded.chars() {
                        let advance = self.text.glyph_advance(c);
                        self.text.advance(advance);
                    }
                    text.push_str(&decoded);
                }
                PdfValue::Integer(_) | PdfValue::Real(_) => {
                    let adjustment = item.as_number().unwrap_or(0.0);
                    let tx =
                        -adjustment / 1000.0 * self.text.font_size * self.text.horizontal_scale;
                    self.text.advance(tx);

                    if -adjustment > TJ_SPACE_THRESHOLD
                        && !text.is_empty()
                        && !text.ends_with(' ')
                        && !text.ends_with('\u{00A0}')
                        && !text.chars().last().is_some_and(is_spaceless_script_char)
                    {
                        text.push(' ');
                    }
                }
                _ => {}
            }
        }

        let text: String = text.nfc().collect();
        if text.trim().is_empty() {
            return;
        }

        let end = self.text.matrix.then(&self.ctm);
        let font_size = self.text.font_size * start.vertical_scale();
        let (x_start, baseline) = start.apply(0.0, 0.0);
        let (x_end, _) = end.apply(0.0, 0.0);

        let x0 = x_start.min(x_end) - self.media.x0;
        let x1 = x_start.max(x_end) - self.media.x0;
        // Ascender at 0.8 em above the baseline.
        let top = self.media.y1 - (baseline + font_size * 0.8);

        self.spans.push(TextSpan::new(
            text.trim().to_string(),
            x0,
            x1,
            top,
            font_size,
            self.text.font_name.clone(),
        ));
    }

    /// Turn the pending path into segments. Thin rectangles count whether
    /// stroked or filled; other shapes only when stroked.
    fn paint(&mut self, stroke: bool) {
        let path = std::mem::take(&mut self.path);

        if stroke {
            for (from, to) in &path.lines {
                self.push_segment(Segment::new(from.0, from.1, to.0, to.1));
            }
        }

        for corners in &path.rects {
            let xs = corners.iter().map(|p| p.0);
            let ys = corners.iter().map(|p| p.1);
            let x0 = xs.clone().fold(f32::INFINITY, f32::min);
            let x1 = xs.fold(f32::NEG_INFINITY, f32::max);
            let y0 = ys.clone().fold(f32::INFINITY, f32::min);
            let y1 = ys.fold(f32::NEG_INFINITY, f32::max);
            let (w, h) = (x1 - x0, y1 - y0);

            if w <= THIN_RECT || h <= THIN_RECT {
                if h <= w {
                    let y = (y0 + y1) / 2.0;
                    self.push_segment(Segment::horizontal(y, x0, x1));
                } else {
                    let x = (x0 + x1) / 2.0;
                    self.push_segment(Segment::vertical(x, y0, y1));
                }
            } else if stroke {
                self.push_segment(Segment::horizontal(y0, x0, x1));
                self.push_segment(Segment::horizontal(y1, x0, x1));
                self.push_segment(Segment::vertical(x0, y0, y1));
                self.push_segment(Segment::vertical(x1, y0, y1));
            }
        }
    }

    fn push_segment(&mut self, segment: Segment) {
        match segment.orientation() {
            Some(Orientation::Horizontal) => {
                let y = (segment.y0 + segment.y1) / 2.0;
                self.segments.push(Segment::horizontal(y, segment.x0, segment.x1));
            }
            Some(Orientation::Vertical) => {
                let x = (segment.x0 + segment.x1) / 2.0;
                self.segments.push(Segment::vertical(x, segment.y0, segment.y1));
            }
            None => {}
        }
    }
}

/// Estimated advance width of a glyph, in ems.
fn glyph_width_em(c: char) -> f32 {
    if c == ' ' {
        0.25
    } else if is_wide_char(c) {
        1.0
    } else {
        0.5
    }
}

/// Full-width glyphs: Hangul, CJK ideographs, kana and full-width forms.
fn is_wide_char(c: char) -> bool {
    let code = c as u32;
    (0xAC00..=0xD7A3).contains(&code)
        || (0x1100..=0x11FF).contains(&code)
        || (0x3130..=0x318F).contains(&code)
        || (0xFF00..=0xFFEF).contains(&code)
        || is_spaceless_script_char(c)
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}
