use crate::font::GlyphAtlas;
use crate::layout::{Justify, LayoutOptions};

/// Tab stops are placed every `TAB_STOP_FACTOR * draw_size` pixels from
/// the line start. Tabs advance the pen to the next stop and never emit
/// a quad.
const TAB_STOP_FACTOR: f32 = 2.0;

/// Geometry of one measured line.
///
/// `x_positions` holds the justified pen x of every character on the
/// line (delimiters included, the terminating newline excluded), so the
/// layout pass and the index/location queries consume the same data.
#[derive(Debug, Clone, PartialEq)]
pub struct LineInfo {
    /// Index of the line's first character in the source string.
    pub start: usize,
    pub x_positions: Vec<f32>,
    /// Line width with trailing whitespace trimmed; what justification
    /// aligns against.
    pub width: f32,
    /// Justified x origin of the line.
    pub offset: f32,
    /// Untrimmed pen advance over the whole line.
    pub pen_width: f32,
}

impl LineInfo {
    pub fn len(&self) -> usize {
        self.x_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_positions.is_empty()
    }
}

/// Output of a measurement pass over one string.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredText {
    pub lines: Vec<LineInfo>,
    /// Widest line width.
    pub width: f32,
    /// Total block height, `line count × line height`.
    pub height: f32,
    /// Justified y of the first line's top edge.
    pub y_start: f32,
    pub line_height: f32,
    pub draw_size: f32,
    /// `draw_size / native_size` of the atlas measured against.
    pub scale: f32,
}

impl MeasuredText {
    pub fn line_y(&self, index: usize) -> f32 {
        self.y_start + index as f32 * self.line_height
    }
}

pub(crate) fn is_delimiter(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// Pen advance of one character. Unsupported characters advance by zero;
/// tabs jump to the next stop relative to the line start.
pub(crate) fn char_advance(
    atlas: &GlyphAtlas,
    c: char,
    draw_size: f32,
    scale: f32,
    pen: f32,
) -> f32 {
    if c == '\t' {
        let stop = TAB_STOP_FACTOR * draw_size;
        return ((pen / stop).floor() + 1.0) * stop - pen;
    }

    match atlas.glyph_by_code(c as u32) {
        Some(glyph) => (glyph.width as f32 + atlas.spacing() * draw_size) * scale,
        None => 0.0,
    }
}

/// Measures `chars` within `options.area`: breaks lines, applies
/// horizontal justification per line and vertical justification to the
/// whole block.
///
/// Word wrap ends a line at the last delimiter once the pending token
/// would overflow the area width; an unbreakable token wider than the
/// whole area overflows its own line instead. Explicit newlines always
/// break. With `right_to_left` the per-line positions are mirrored so
/// the first logical character sits at the line's right edge.
pub fn measure(atlas: &GlyphAtlas, chars: &[char], options: &LayoutOptions) -> MeasuredText {
    let native = atlas.native_size() as f32;
    let draw_size = if options.size > 0.0 { options.size } else { native };
    let scale = draw_size / native;

    let mut measured = MeasuredText {
        lines: Vec::new(),
        width: 0.0,
        height: 0.0,
        y_start: options.area.min.y,
        line_height: draw_size,
        draw_size,
        scale,
    };

    if chars.is_empty() {
        return measured;
    }

    let area_width = options.area.width();
    let wrap = options.wrap && area_width > 0.0;

    let mut rel: Vec<f32> = Vec::new();
    let mut pen = 0.0_f32;
    let mut line_start = 0_usize;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            push_line(&mut measured, chars, line_start, std::mem::take(&mut rel), pen, options);
            pen = 0.0;
            line_start = i + 1;
            i += 1;
            continue;
        }

        if c == ' ' || c == '\t' {
            rel.push(pen);
            pen += char_advance(atlas, c, draw_size, scale, pen);
            i += 1;
            continue;
        }

        // measure the pending token as a unit for the wrap decision
        let mut token_end = i;
        let mut token_width = 0.0;
        while token_end < chars.len() && !is_delimiter(chars[token_end]) {
            token_width += char_advance(atlas, chars[token_end], draw_size, scale, pen + token_width);
            token_end += 1;
        }

        if wrap && pen > 0.0 && pen + token_width > area_width {
            // the line ends at the last delimiter; the token opens the
            // next line even if it alone overflows the area
            push_line(&mut measured, chars, line_start, std::mem::take(&mut rel), pen, options);
            pen = 0.0;
            line_start = i;
        }

        while i < token_end {
            rel.push(pen);
            pen += char_advance(atlas, chars[i], draw_size, scale, pen);
            i += 1;
        }
    }

    push_line(&mut measured, chars, line_start, rel, pen, options);

    let total_height = measured.lines.len() as f32 * measured.line_height;
    measured.height = total_height;
    measured.y_start = if options.justify.contains(Justify::VCENTER) {
        options.area.min.y + (options.area.height() - total_height) * 0.5
    } else if options.justify.contains(Justify::BOTTOM) {
        options.area.min.y + options.area.height() - total_height
    } else {
        options.area.min.y
    };

    measured
}

fn push_line(
    measured: &mut MeasuredText,
    chars: &[char],
    start: usize,
    rel: Vec<f32>,
    pen: f32,
    options: &LayoutOptions,
) {
    // trailing whitespace does not count toward the justified width
    let mut trimmed = rel.len();
    while trimmed > 0 && matches!(chars[start + trimmed - 1], ' ' | '\t') {
        trimmed -= 1;
    }
    let width = if trimmed < rel.len() { rel[trimmed] } else { pen };

    let area = options.area;
    let offset = if options.justify.contains(Justify::HCENTER) {
        area.min.x + (area.width() - width) * 0.5
    } else if options.justify.contains(Justify::RIGHT) {
        area.min.x + area.width() - width
    } else {
        area.min.x
    };

    let x_positions = if options.right_to_left {
        // mirror within the line so logical order reads right-to-left
        (0..rel.len())
            .map(|k| {
                let next = if k + 1 < rel.len() { rel[k + 1] } else { pen };
                let advance = next - rel[k];
                offset + width - rel[k] - advance
            })
            .collect()
    } else {
        rel.iter().map(|r| offset + r).collect()
    };

    measured.width = measured.width.max(width);
    measured.lines.push(LineInfo {
        start,
        x_positions,
        width,
        offset,
        pen_width: pen,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontFormat, FontStyle, Glyph, GlyphAtlas};
    use crate::math::{Rect, Vec2};
    use crate::texture::TextureId;
    use approx::assert_relative_eq;

    // native size 20; 'a'..'e' are 10 px wide, space is 5 px
    fn test_atlas() -> GlyphAtlas {
        let mut glyphs: Vec<Glyph> = ('a'..='e')
            .map(|c| Glyph {
                code: c as u32,
                width: 10,
                uvs: [0.0, 0.0, 0.1, 0.1],
            })
            .collect();
        glyphs.push(Glyph {
            code: ' ' as u32,
            width: 5,
            uvs: [0.9, 0.9, 1.0, 1.0],
        });

        let mut atlas = GlyphAtlas::new(
            "testa",
            FontStyle::Plain,
            20,
            FontFormat::Bitmap,
            glyphs,
            TextureId::default(),
        );
        atlas.set_spacing(0.0);
        atlas
    }

    fn options(area: Rect) -> LayoutOptions {
        LayoutOptions {
            area,
            size: 20.0,
            wrap: false,
            ..LayoutOptions::default()
        }
    }

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn empty_string_measures_zero() {
        let atlas = test_atlas();
        let m = measure(&atlas, &[], &options(Rect::ZERO));

        assert!(m.lines.is_empty());
        assert_eq!(m.width, 0.0);
        assert_eq!(m.height, 0.0);
    }

    #[test]
    fn unwrapped_line_count_is_newlines_plus_one() {
        let atlas = test_atlas();
        let area = Rect::from_pos_size(Vec2::ZERO, Vec2::new(1000.0, 1000.0));

        for (text, expected) in [("abc", 1), ("a\nb", 2), ("ab\ncd\ne", 3), ("a\n", 2)] {
            let m = measure(&atlas, &chars(text), &options(area));
            assert_eq!(m.lines.len(), expected, "text {text:?}");
        }
    }

    #[test]
    fn advances_sum_to_line_width() {
        let atlas = test_atlas();
        let text = chars("abc de");
        let m = measure(&atlas, &text, &options(Rect::ZERO));

        let mut pen = 0.0;
        for &c in &text {
            pen += char_advance(&atlas, c, 20.0, 1.0, pen);
        }

        assert_eq!(m.lines.len(), 1);
        assert_relative_eq!(m.lines[0].width, pen, epsilon = 1e-4);
    }

    #[test]
    fn measure_is_idempotent() {
        let atlas = test_atlas();
        let text = chars("ab cd\ne");
        let area = Rect::from_pos_size(Vec2::new(3.0, 7.0), Vec2::new(25.0, 100.0));
        let mut opts = options(area);
        opts.wrap = true;
        opts.justify = Justify::VCENTER_HCENTER;

        let a = measure(&atlas, &text, &opts);
        let b = measure(&atlas, &text, &opts);

        assert_eq!(a, b);
    }

    #[test]
    fn wrap_breaks_at_last_delimiter() {
        let atlas = test_atlas();
        // "ab cd": 20 + 5 + 20 = 45; area fits 30 → "cd" moves down
        let area = Rect::from_pos_size(Vec2::ZERO, Vec2::new(30.0, 100.0));
        let mut opts = options(area);
        opts.wrap = true;

        let m = measure(&atlas, &chars("ab cd"), &opts);

        assert_eq!(m.lines.len(), 2);
        // first line keeps "ab " (3 chars), trailing space trimmed from width
        assert_eq!(m.lines[0].len(), 3);
        assert_relative_eq!(m.lines[0].width, 20.0);
        assert_eq!(m.lines[1].start, 3);
        assert_eq!(m.lines[1].len(), 2);
        assert_relative_eq!(m.lines[1].x_positions[0], 0.0);
    }

    #[test]
    fn oversized_token_overflows_its_own_line() {
        let atlas = test_atlas();
        let area = Rect::from_pos_size(Vec2::ZERO, Vec2::new(25.0, 100.0));
        let mut opts = options(area);
        opts.wrap = true;

        // "abcde" is 50 px wide, area is 25: no delimiter to break at
        let m = measure(&atlas, &chars("a abcde"), &opts);

        assert_eq!(m.lines.len(), 2);
        assert_eq!(m.lines[1].start, 2);
        assert_eq!(m.lines[1].len(), 5);
        assert_relative_eq!(m.lines[1].width, 50.0);
    }

    #[test]
    fn newline_breaks_regardless_of_width() {
        let atlas = test_atlas();
        let area = Rect::from_pos_size(Vec2::ZERO, Vec2::new(1000.0, 100.0));
        let mut opts = options(area);
        opts.wrap = true;

        let m = measure(&atlas, &chars("a\nb"), &opts);
        assert_eq!(m.lines.len(), 2);
    }

    #[test]
    fn tab_advances_to_next_stop() {
        let atlas = test_atlas();
        let text = chars("a\tb");
        let m = measure(&atlas, &text, &options(Rect::ZERO));

        // stops every 40 px at draw size 20: 'a' ends at 10, tab jumps to 40
        let line = &m.lines[0];
        assert_relative_eq!(line.x_positions[0], 0.0);
        assert_relative_eq!(line.x_positions[1], 10.0);
        assert_relative_eq!(line.x_positions[2], 40.0);
    }

    #[test]
    fn top_left_and_bottom_right_justification() {
        let atlas = test_atlas();
        let area = Rect::from_pos_size(Vec2::new(10.0, 20.0), Vec2::new(100.0, 50.0));

        let mut opts = options(area);
        opts.justify = Justify::TOP_LEFT;
        let m = measure(&atlas, &chars("ab\ncd"), &opts);
        assert_relative_eq!(m.lines[0].x_positions[0], 10.0);
        assert_relative_eq!(m.y_start, 20.0);

        opts.justify = Justify::BOTTOM_RIGHT;
        let m = measure(&atlas, &chars("ab\ncd"), &opts);
        // last line's rightmost edge lands on the area's right edge
        let last = &m.lines[1];
        assert_relative_eq!(last.offset + last.width, 110.0, epsilon = 1e-4);
        assert_relative_eq!(m.y_start + m.height, 70.0, epsilon = 1e-4);
    }

    #[test]
    fn vcenter_offsets_block_uniformly() {
        let atlas = test_atlas();
        let area = Rect::from_pos_size(Vec2::ZERO, Vec2::new(100.0, 100.0));
        let mut opts = options(area);
        opts.justify = Justify::VCENTER_HCENTER;

        let m = measure(&atlas, &chars("ab\ncd"), &opts);
        assert_relative_eq!(m.y_start, 30.0); // (100 - 2*20) / 2
        assert_relative_eq!(m.lines[0].offset, 40.0); // (100 - 20) / 2
    }

    #[test]
    fn right_to_left_mirrors_line_positions() {
        let atlas = test_atlas();
        let area = Rect::from_pos_size(Vec2::ZERO, Vec2::new(100.0, 50.0));
        let mut opts = options(area);
        opts.right_to_left = true;

        let m = measure(&atlas, &chars("ab"), &opts);
        let line = &m.lines[0];

        // 'b' sits left of 'a'
        assert_relative_eq!(line.x_positions[0], 10.0);
        assert_relative_eq!(line.x_positions[1], 0.0);
    }

    #[test]
    fn spacing_contributes_to_advance() {
        let mut atlas = test_atlas();
        atlas.set_spacing(0.125);

        let m = measure(&atlas, &chars("ab"), &options(Rect::ZERO));
        // advance = (10 + 0.125 * 20) * 1 = 12.5
        assert_relative_eq!(m.lines[0].x_positions[1], 12.5);
    }

    #[test]
    fn scaled_draw_size_scales_advances() {
        let atlas = test_atlas();
        let mut opts = options(Rect::ZERO);
        opts.size = 10.0; // half the native size

        let m = measure(&atlas, &chars("ab"), &opts);
        assert_relative_eq!(m.lines[0].x_positions[1], 5.0);
        assert_relative_eq!(m.line_height, 10.0);
    }
}
