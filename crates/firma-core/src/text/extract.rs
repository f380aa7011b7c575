//! Content-stream interpreter producing [`PageText`].

use super::font::FontInfo;
use super::{PageText, TextBlock, TextLine, TextSpan};
use crate::error::{FirmaError, Result};
use crate::geometry::{PageBox, Rect};
use crate::pdf::{
    lookup, name, number, page_box, page_resources, resolve, resolve_dict, stream_bytes,
};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use std::collections::HashMap;
use std::rc::Rc;

/// Nesting limit for Form XObjects drawing other forms.
const MAX_FORM_DEPTH: usize = 8;
/// Same-line tolerance between baselines, as a fraction of the font size.
const BASELINE_TOLERANCE: f64 = 0.3;
/// Horizontal gap (fraction of font size) above which two runs are separate spans.
const SPAN_BREAK_GAP: f64 = 1.0;
/// Gap (fraction of font size) that reads as a word break inside a span.
const WORD_GAP: f64 = 0.15;

/// Extract the text layout of the page `page_id`, numbered `number` (1-based).
pub fn extract_page(doc: &Document, page_id: ObjectId, number: u32) -> Result<PageText> {
    let page_box = page_box(doc, page_id);
    let content = doc
        .get_page_content(page_id)
        .map_err(|e| FirmaError::PageText {
            page: number,
            reason: e.to_string(),
        })?;

    let mut interpreter = Interpreter::new(doc, page_box);
    interpreter
        .run(&content, page_resources(doc, page_id), Matrix::IDENTITY, 0)
        .map_err(|reason| FirmaError::PageText {
            page: number,
            reason,
        })?;

    Ok(PageText {
        number,
        page_box,
        blocks: interpreter.layout.finish(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
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

    fn translate(tx: f64, ty: f64) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let v = numbers(operands);
        match v.as_slice() {
            [a, b, c, d, e, f] => Some(Matrix {
                a: *a,
                b: *b,
                c: *c,
                d: *d,
                e: *e,
                f: *f,
            }),
            _ => None,
        }
    }

    /// `self × other` in PDF's row-vector convention.
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

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn vertical_scale(&self) -> f64 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Rc<FontInfo>,
    font_key: Vec<u8>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    /// `Tz / 100`.
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            font: Rc::new(FontInfo::default()),
            font_key: Vec::new(),
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

struct Interpreter<'a> {
    doc: &'a Document,
    page_box: PageBox,
    fonts: HashMap<ObjectId, Rc<FontInfo>>,
    layout: LayoutBuilder,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document, page_box: PageBox) -> Self {
        Self {
            doc,
            page_box,
            fonts: HashMap::new(),
            layout: LayoutBuilder::default(),
        }
    }

    fn run(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
        depth: usize,
    ) -> std::result::Result<(), String> {
        let content = Content::decode(content).map_err(|e| e.to_string())?;

        let mut state = GraphicsState::new(ctm);
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut text_matrix = Matrix::IDENTITY;
        let mut line_matrix = Matrix::IDENTITY;

        for Operation { operator, operands } in &content.operations {
            match operator.as_str() {
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        state.ctm = m.then(&state.ctm);
                    }
                }
                "BT" => {
                    text_matrix = Matrix::IDENTITY;
                    line_matrix = Matrix::IDENTITY;
                    self.layout.begin_block();
                }
                "ET" => self.layout.end_block(),
                "Tf" => {
                    if let (Some(Object::Name(key)), Some(size)) =
                        (operands.first(), operands.get(1).and_then(number))
                    {
                        state.font = self.font(resources, key);
                        state.font_key = key.clone();
                        state.font_size = size;
                    }
                }
                "Tc" => set_number(operands, &mut state.char_spacing),
                "Tw" => set_number(operands, &mut state.word_spacing),
                "TL" => set_number(operands, &mut state.leading),
                "Ts" => set_number(operands, &mut state.rise),
                "Tz" => {
                    if let Some(scale) = operands.first().and_then(number) {
                        state.horizontal_scale = scale / 100.0;
                    }
                }
                "Td" | "TD" => {
                    if let [tx, ty] = numbers(operands).as_slice() {
                        if operator == "TD" {
                            state.leading = -ty;
                        }
                        line_matrix = Matrix::translate(*tx, *ty).then(&line_matrix);
                        text_matrix = line_matrix;
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        line_matrix = m;
                        text_matrix = m;
                    }
                }
                "T*" => {
                    line_matrix = Matrix::translate(0.0, -state.leading).then(&line_matrix);
                    text_matrix = line_matrix;
                }
                "Tj" => {
                    if let Some(bytes) = operands.first().and_then(string_bytes) {
                        self.show(&state, &mut text_matrix, bytes);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        for item in items {
                            if let Some(bytes) = string_bytes(item) {
                                self.show(&state, &mut text_matrix, bytes);
                            } else if let Some(adjust) = number(item) {
                                let tx = -adjust / 1000.0
                                    * state.font_size
                                    * state.horizontal_scale;
                                text_matrix = Matrix::translate(tx, 0.0).then(&text_matrix);
                            }
                        }
                    }
                }
                "'" | "\"" => {
                    if operator == "\"" {
                        if let [aw, ac, _] = operands.as_slice() {
                            state.word_spacing = number(aw).unwrap_or(state.word_spacing);
                            state.char_spacing = number(ac).unwrap_or(state.char_spacing);
                        }
                    }
                    line_matrix = Matrix::translate(0.0, -state.leading).then(&line_matrix);
                    text_matrix = line_matrix;
                    if let Some(bytes) = operands.last().and_then(string_bytes) {
                        self.show(&state, &mut text_matrix, bytes);
                    }
                }
                "Do" => {
                    if let Some(key) = operands.first().and_then(name) {
                        self.draw_form(resources, key, &state.ctm, depth)?;
                    }
                }
                _ => {}
            }
        }

        self.layout.end_block();
        Ok(())
    }

    fn font(&mut self, resources: Option<&'a Dictionary>, key: &[u8]) -> Rc<FontInfo> {
        let doc = self.doc;
        let entry = resources
            .and_then(|r| lookup(doc, r, b"Font"))
            .and_then(|fonts| resolve_dict(doc, fonts))
            .and_then(|fonts| fonts.get(key).ok());

        let entry = match entry {
            Some(entry) => entry,
            None => {
                tracing::debug!("font /{} not found in resources", String::from_utf8_lossy(key));
                return Rc::new(FontInfo::default());
            }
        };

        let id = match entry {
            Object::Reference(id) => Some(*id),
            _ => None,
        };
        if let Some(cached) = id.and_then(|id| self.fonts.get(&id)) {
            return Rc::clone(cached);
        }

        let font = Rc::new(
            resolve_dict(doc, entry)
                .map(|dict| FontInfo::load(doc, dict))
                .unwrap_or_default(),
        );
        if let Some(id) = id {
            self.fonts.insert(id, Rc::clone(&font));
        }
        font
    }

    fn draw_form(
        &mut self,
        resources: Option<&'a Dictionary>,
        key: &[u8],
        ctm: &Matrix,
        depth: usize,
    ) -> std::result::Result<(), String> {
        if depth >= MAX_FORM_DEPTH {
            tracing::debug!("form nesting deeper than {} ignored", MAX_FORM_DEPTH);
            return Ok(());
        }
        let doc = self.doc;
        let stream = match resources
            .and_then(|r| lookup(doc, r, b"XObject"))
            .and_then(|x| resolve_dict(doc, x))
            .and_then(|x| lookup(doc, x, key))
        {
            Some(Object::Stream(stream)) => stream,
            _ => return Ok(()),
        };
        if stream.dict.get(b"Subtype").ok().and_then(name) != Some(b"Form".as_slice()) {
            return Ok(());
        }

        let form_matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|m| resolve(doc, m))
            .and_then(|m| match m {
                Object::Array(items) => Matrix::from_operands(items),
                _ => None,
            })
            .unwrap_or(Matrix::IDENTITY);
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|r| resolve_dict(doc, r))
            .or(resources);

        self.layout.end_block();
        self.run(
            &stream_bytes(stream),
            form_resources,
            form_matrix.then(ctm),
            depth + 1,
        )
    }

    /// Emit the glyphs of one shown string and advance the text matrix.
    fn show(&mut self, state: &GraphicsState, text_matrix: &mut Matrix, bytes: &[u8]) {
        let font = &state.font;
        for glyph in font.decode(bytes) {
            let mut advance = glyph.width / 1000.0 * state.font_size + state.char_spacing;
            if glyph.is_word_space() {
                advance += state.word_spacing;
            }
            advance *= state.horizontal_scale;

            let rendering = text_matrix.then(&state.ctm);
            let (sx, sy) = rendering.apply(0.0, state.rise);
            let (ex, _) = rendering.apply(advance, state.rise);
            let size = state.font_size * rendering.vertical_scale();
            *text_matrix = Matrix::translate(advance, 0.0).then(text_matrix);

            if size <= 0.0 || glyph.text.is_empty() {
                continue;
            }
            let (x0, baseline) = self.page_box.to_page_point(sx, sy);
            let (x1, _) = self.page_box.to_page_point(ex, sy);
            self.layout.push(PlacedGlyph {
                text: glyph.text,
                x0: x0.min(x1),
                x1: x0.max(x1),
                baseline,
                size,
                ascent: font.ascent,
                descent: font.descent,
                font_key: state.font_key.clone(),
            });
        }
    }
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(number).collect()
}

fn set_number(operands: &[Object], slot: &mut f64) {
    if let Some(value) = operands.first().and_then(number) {
        *slot = value;
    }
}

fn string_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::String(bytes, StringFormat::Literal | StringFormat::Hexadecimal) => {
            Some(bytes.as_slice())
        }
        _ => None,
    }
}

/// A glyph positioned in top-left page space.
#[derive(Debug, Clone)]
struct PlacedGlyph {
    text: String,
    x0: f64,
    x1: f64,
    baseline: f64,
    size: f64,
    ascent: f64,
    descent: f64,
    font_key: Vec<u8>,
}

impl PlacedGlyph {
    fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

#[derive(Debug)]
struct SpanBuilder {
    text: String,
    x0: f64,
    x1: f64,
    top: f64,
    bottom: f64,
    size: f64,
    font_key: Vec<u8>,
    pending_space: bool,
}

impl SpanBuilder {
    fn start(glyph: PlacedGlyph) -> Self {
        Self {
            x0: glyph.x0,
            x1: glyph.x1,
            top: glyph.baseline - glyph.ascent * glyph.size,
            bottom: glyph.baseline - glyph.descent * glyph.size,
            size: glyph.size,
            font_key: glyph.font_key,
            text: glyph.text,
            pending_space: false,
        }
    }

    fn accepts(&self, glyph: &PlacedGlyph) -> bool {
        let gap = glyph.x0 - self.x1;
        self.font_key == glyph.font_key
            && (self.size - glyph.size).abs() < 0.01
            && gap > -0.5 * self.size
            && gap < SPAN_BREAK_GAP * self.size
    }

    fn append(&mut self, glyph: PlacedGlyph) {
        let gap = glyph.x0 - self.x1;
        if (self.pending_space || gap > WORD_GAP * self.size) && !self.text.ends_with(' ') {
            self.text.push(' ');
        }
        self.pending_space = false;
        self.x1 = self.x1.max(glyph.x1);
        self.top = self.top.min(glyph.baseline - glyph.ascent * glyph.size);
        self.bottom = self.bottom.max(glyph.baseline - glyph.descent * glyph.size);
        self.text.push_str(&glyph.text);
    }

    fn finish(self) -> Option<TextSpan> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }
        let rect = Rect::new(self.x0, self.top, self.x1, self.bottom);
        Some(TextSpan::new(text, rect, self.size))
    }
}

#[derive(Debug)]
struct LineBuilder {
    baseline: f64,
    spans: Vec<SpanBuilder>,
}

#[derive(Debug, Default)]
struct LayoutBuilder {
    blocks: Vec<TextBlock>,
    lines: Vec<LineBuilder>,
}

impl LayoutBuilder {
    fn begin_block(&mut self) {
        self.end_block();
    }

    fn end_block(&mut self) {
        let lines: Vec<TextLine> = self
            .lines
            .drain(..)
            .map(|line| TextLine {
                spans: line.spans.into_iter().filter_map(SpanBuilder::finish).collect(),
            })
            .filter(|line| !line.spans.is_empty())
            .collect();
        if !lines.is_empty() {
            self.blocks.push(TextBlock { lines });
        }
    }

    fn push(&mut self, glyph: PlacedGlyph) {
        let tolerance = BASELINE_TOLERANCE * glyph.size;
        let same_line = self
            .lines
            .last()
            .is_some_and(|line| (line.baseline - glyph.baseline).abs() <= tolerance);
        if !same_line {
            if glyph.is_blank() {
                return;
            }
            self.lines.push(LineBuilder {
                baseline: glyph.baseline,
                spans: Vec::new(),
            });
        }
        let line = match self.lines.last_mut() {
            Some(line) => line,
            None => return,
        };

        if glyph.is_blank() {
            if let Some(span) = line.spans.last_mut() {
                span.pending_space = true;
            }
            return;
        }
        match line.spans.last_mut() {
            Some(span) if span.accepts(&glyph) => span.append(glyph),
            _ => line.spans.push(SpanBuilder::start(glyph)),
        }
    }

    fn finish(mut self) -> Vec<TextBlock> {
        self.end_block();
        self.blocks
    }
}
