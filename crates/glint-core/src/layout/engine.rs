use crate::font::{Font, GlyphAtlas};
use crate::layout::{measure, Justify, LayoutOptions, LineInfo};
use crate::math::{Rect, Vec2};
use crate::texture::TextureId;

/// One positioned glyph: an axis-aligned quad with the UV rectangle to
/// sample it from. Color is applied when the quad is drawn, so retained
/// layouts can be re-tinted without relayout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    pub rect: Rect,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
}

/// Result of laying out one string: the quads to draw and the atlas
/// texture they sample.
#[derive(Debug, Clone)]
pub struct TextLayout {
    pub quads: Vec<GlyphQuad>,
    /// Number of characters that produced a quad. Unsupported characters
    /// and quads dropped by the clip region are excluded.
    pub rendered: usize,
    pub texture: TextureId,
}

fn select_atlas(font: &Font, size: f32) -> &GlyphAtlas {
    if size > 0.0 {
        font.closest_size(size)
    } else {
        font.default_atlas()
    }
}

/// Lays out `text` into glyph quads.
///
/// Characters are processed in logical order; each supported character
/// emits a quad at its measured pen position, sized by the glyph advance
/// and the line height. Unsupported characters consume their measured
/// advance (zero) and emit nothing. With a clip region, quads fully
/// outside are dropped and partially overlapping quads are intersected,
/// with UVs interpolated proportionally so no off-region pixels are
/// sampled.
pub fn lay_out(font: &Font, text: &str, options: &LayoutOptions) -> TextLayout {
    let atlas = select_atlas(font, options.size);
    let chars: Vec<char> = text.chars().collect();
    let measured = measure(atlas, &chars, options);

    let mut quads = Vec::with_capacity(chars.len());

    for (line_index, line) in measured.lines.iter().enumerate() {
        let y = measured.line_y(line_index);

        for (k, &x) in line.x_positions.iter().enumerate() {
            let c = chars[line.start + k];
            if c == '\t' {
                continue;
            }

            let Some(glyph) = atlas.glyph_by_code(c as u32) else {
                log::debug!("font `{}` has no glyph for {c:?}", atlas.family());
                continue;
            };

            let size = Vec2::new(glyph.width as f32 * measured.scale, measured.line_height);
            let quad = GlyphQuad {
                rect: Rect::from_pos_size(Vec2::new(x, y), size),
                uv_min: Vec2::new(glyph.uvs[0], glyph.uvs[1]),
                uv_max: Vec2::new(glyph.uvs[2], glyph.uvs[3]),
            };

            let quad = match options.clip {
                Some(clip) => match clip_quad(quad, clip) {
                    Some(quad) => quad,
                    None => continue,
                },
                None => quad,
            };

            quads.push(quad);
        }
    }

    TextLayout {
        rendered: quads.len(),
        quads,
        texture: atlas.texture(),
    }
}

/// Lays out text starting at a point, with no justification area,
/// wrapping or clipping.
pub fn lay_out_at(
    font: &Font,
    text: &str,
    pos: Vec2,
    size: f32,
    right_to_left: bool,
) -> TextLayout {
    lay_out(
        font,
        text,
        &LayoutOptions {
            area: Rect::from_pos_size(pos, Vec2::ZERO),
            size,
            justify: Justify::TOP_LEFT,
            wrap: false,
            right_to_left,
            clip: None,
        },
    )
}

/// Intersects a quad with a clip rect. Returns `None` for quads fully
/// outside; partially covered quads get their UVs interpolated in
/// proportion to the positional cut.
pub fn clip_quad(quad: GlyphQuad, clip: Rect) -> Option<GlyphQuad> {
    let clipped = quad.rect.intersect(clip);
    if clipped.is_empty() {
        return None;
    }

    if clipped == quad.rect {
        return Some(quad);
    }

    let size = quad.rect.size();
    let uv_size = quad.uv_max - quad.uv_min;
    let t_min = (clipped.min - quad.rect.min) / size;
    let t_max = (clipped.max - quad.rect.min) / size;

    Some(GlyphQuad {
        rect: clipped,
        uv_min: quad.uv_min + t_min * uv_size,
        uv_max: quad.uv_min + t_max * uv_size,
    })
}

/// Measures a string's width and height without alignment, wrapping or
/// clipping.
pub fn measure_size(font: &Font, text: &str, size: f32) -> (f32, f32) {
    let atlas = select_atlas(font, size);
    let chars: Vec<char> = text.chars().collect();
    let options = LayoutOptions {
        size,
        wrap: false,
        ..LayoutOptions::default()
    };

    let measured = measure(atlas, &chars, &options);
    (measured.width, measured.height)
}

/// Measures a string's bounding box after justification and wrapping
/// within `options.area`.
///
/// With `ignore_clip` the bounds cover the entire string even where it
/// overflows the area; without it the bounds are what would actually be
/// drawn inside the area.
pub fn measure_bounds(font: &Font, text: &str, options: &LayoutOptions, ignore_clip: bool) -> Rect {
    let atlas = select_atlas(font, options.size);
    let chars: Vec<char> = text.chars().collect();
    let measured = measure(atlas, &chars, options);
    if measured.lines.is_empty() {
        return Rect::ZERO;
    }

    let mut bounds: Option<Rect> = None;
    for (line_index, line) in measured.lines.iter().enumerate() {
        let rect = Rect::from_pos_size(
            Vec2::new(line.offset, measured.line_y(line_index)),
            Vec2::new(line.width, measured.line_height),
        );

        bounds = Some(match bounds {
            Some(b) => b.union(rect),
            None => rect,
        });
    }

    let bounds = bounds.unwrap_or(Rect::ZERO);
    if ignore_clip {
        bounds
    } else {
        bounds.intersect(options.area)
    }
}

fn line_end_x(line: &LineInfo, right_to_left: bool) -> f32 {
    if right_to_left {
        line.offset + line.width - line.pen_width
    } else {
        line.offset + line.pen_width
    }
}

/// Returns the pen location of the character at `index`, replaying the
/// same measurement the layout pass uses. `index == text length` yields
/// the end-of-text caret position.
pub fn location_at_index(
    font: &Font,
    text: &str,
    options: &LayoutOptions,
    index: usize,
) -> Option<Vec2> {
    let atlas = select_atlas(font, options.size);
    let chars: Vec<char> = text.chars().collect();
    if index > chars.len() {
        return None;
    }

    let measured = measure(atlas, &chars, options);

    let mut boundary = None;
    for (line_index, line) in measured.lines.iter().enumerate() {
        if index < line.start {
            break;
        }

        if index < line.start + line.len() {
            let k = index - line.start;
            return Some(Vec2::new(line.x_positions[k], measured.line_y(line_index)));
        }

        // end-of-line boundary: a consumed newline or the text end
        boundary = Some(Vec2::new(
            line_end_x(line, options.right_to_left),
            measured.line_y(line_index),
        ));
    }

    boundary
}

/// Returns the index of the character boundary nearest to `location`,
/// or `None` for an empty string.
pub fn index_at_location(
    font: &Font,
    text: &str,
    options: &LayoutOptions,
    location: Vec2,
) -> Option<usize> {
    let atlas = select_atlas(font, options.size);
    let chars: Vec<char> = text.chars().collect();
    let measured = measure(atlas, &chars, options);

    if measured.lines.is_empty() {
        return None;
    }

    let line_index = ((location.y - measured.y_start) / measured.line_height)
        .floor()
        .clamp(0.0, (measured.lines.len() - 1) as f32) as usize;
    let line = &measured.lines[line_index];

    let mut best = line.start + line.len();
    let mut best_dist = (location.x - line_end_x(line, options.right_to_left)).abs();

    for (k, &x) in line.x_positions.iter().enumerate() {
        let dist = (location.x - x).abs();
        if dist < best_dist {
            best = line.start + k;
            best_dist = dist;
        }
    }

    Some(best)
}
