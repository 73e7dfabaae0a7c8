use glint_core::bundle::{write_font, FontRecord};
use glint_core::math::UVec2;
use glint_core::{Error, ErrorKind, FontStyle, Glyph, PixelFormat, Result, TextureData};

/// Padding in pixels between packed glyphs.
pub const GLYPH_PADDING: u32 = 4;

/// Smallest atlas texture dimension tried.
pub const MIN_TEXTURE_SIZE: u32 = 64;

/// Largest atlas texture dimension. A glyph set that does not fit fails
/// the encode job with [`ErrorKind::AtlasCapacity`] instead of growing
/// further.
pub const MAX_TEXTURE_SIZE: u32 = 4096;

/// One pre-rasterized glyph: the character code and its coverage bitmap,
/// one byte per pixel.
#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub code: u32,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    x: u32,
    y: u32,
}

/// Packs glyph bitmaps row by row into a power-of-two atlas and returns
/// the font record holding the glyph table and the composed texture.
///
/// The texture size search is bounded: the square candidate size doubles
/// from [`MIN_TEXTURE_SIZE`] until the set fits or [`MAX_TEXTURE_SIZE`]
/// is exceeded, then the height is tightened down to the smallest power
/// of two that still covers the used rows.
pub fn pack_glyphs(
    family: &str,
    style: FontStyle,
    glyphs: &[GlyphBitmap],
) -> Result<FontRecord> {
    let row_size = glyphs.iter().map(|g| g.height).max().unwrap_or(0) + GLYPH_PADDING;

    let (width, slots) = find_texture_size(glyphs, row_size)?;

    let used_height = slots.iter().map(|s| s.y).max().unwrap_or(0) + row_size;
    let mut height = MIN_TEXTURE_SIZE;
    while height < used_height {
        height *= 2;
    }

    let mut pixels = vec![0_u8; (width * height) as usize];
    let mut table = Vec::with_capacity(glyphs.len());

    for (glyph, slot) in glyphs.iter().zip(&slots) {
        blit(&mut pixels, width, slot, glyph);

        table.push(Glyph {
            code: glyph.code,
            width: glyph.width,
            uvs: [
                slot.x as f32 / width as f32,
                slot.y as f32 / height as f32,
                (slot.x + glyph.width) as f32 / width as f32,
                (slot.y + row_size) as f32 / height as f32,
            ],
        });
    }

    log::info!(
        "packed {} glyphs of `{family}` into a {width}x{height} atlas",
        glyphs.len()
    );

    Ok(FontRecord {
        family: family.to_string(),
        style: style.to_u32(),
        size: row_size,
        character_set: String::new(),
        glyphs: table,
        texture: TextureData {
            format: PixelFormat::Gray8,
            size: UVec2::new(width, height),
            data: pixels,
        },
    })
}

/// Packs and writes a single-font bundle in one step.
pub fn encode_font(
    id: &str,
    family: &str,
    style: FontStyle,
    glyphs: &[GlyphBitmap],
) -> Result<Vec<u8>> {
    let record = pack_glyphs(family, style, glyphs)?;
    Ok(write_font(id, &record))
}

fn find_texture_size(glyphs: &[GlyphBitmap], row_size: u32) -> Result<(u32, Vec<Slot>)> {
    let mut size = MIN_TEXTURE_SIZE;

    while size <= MAX_TEXTURE_SIZE {
        if let Some(slots) = try_pack(glyphs, row_size, size) {
            return Ok((size, slots));
        }

        size *= 2;
    }

    Err(Error::new(
        ErrorKind::AtlasCapacity,
        format!("glyph set does not fit a {MAX_TEXTURE_SIZE}x{MAX_TEXTURE_SIZE} texture"),
    ))
}

fn try_pack(glyphs: &[GlyphBitmap], row_size: u32, size: u32) -> Option<Vec<Slot>> {
    let mut slots = Vec::with_capacity(glyphs.len());
    let mut pen_x = 0;
    let mut row = 0;

    for glyph in glyphs {
        let advance = glyph.width + GLYPH_PADDING;

        if pen_x + advance > size {
            // a glyph wider than the whole texture can never fit, bail
            // out instead of wrapping forever
            if pen_x == 0 {
                return None;
            }

            pen_x = 0;
            row += 1;
            if (row + 1) * row_size > size {
                return None;
            }

            if advance > size {
                return None;
            }
        }

        slots.push(Slot {
            x: pen_x,
            y: row * row_size,
        });
        pen_x += advance;
    }

    Some(slots)
}

fn blit(dst: &mut [u8], dst_width: u32, slot: &Slot, glyph: &GlyphBitmap) {
    for row in 0..glyph.height {
        let src_start = (row * glyph.width) as usize;
        let dst_start = ((slot.y + row) * dst_width + slot.x) as usize;

        dst[dst_start..dst_start + glyph.width as usize]
            .copy_from_slice(&glyph.pixels[src_start..src_start + glyph.width as usize]);
    }
}
