use glint_core::bundle::FontRecord;
use glint_core::math::UVec2;
use glint_core::{Error, ErrorKind, FontStyle, Glyph, PixelFormat, Result, TextureData};

/// Imports glyphs from a sentinel-delimited RGBA strip image.
///
/// The pixel at (0, 0) is the break color. Each band of `font_size`
/// rows holds one line of `character_set` (newlines advance to the next
/// band); within a band, a glyph runs from the current column to the
/// next break-color column. The resulting font keeps the image's full
/// RGBA pixels and the [`FontStyle::Textured`] style.
pub fn import_strip(
    image_data: &[u8],
    family: &str,
    font_size: u32,
    character_set: &str,
) -> Result<FontRecord> {
    let image = image::load_from_memory(image_data)
        .map_err(|e| Error::wrap(ErrorKind::InvalidImage, e))?
        .to_rgba8();

    let (width, height) = image.dimensions();
    if width == 0 || font_size + 1 > height {
        return Err(Error::new(
            ErrorKind::InvalidImage,
            "strip image is smaller than one glyph band",
        ));
    }

    let rgb = |x: u32, y: u32| {
        let p = image.get_pixel(x, y);
        [p[0], p[1], p[2]]
    };

    let break_color = rgb(0, 0);

    let mut glyphs = Vec::new();
    let mut x = 0_u32;
    let mut y = 0_u32;

    for c in character_set.chars() {
        match c {
            '\n' => {
                x = 0;
                y += font_size;

                if y + font_size + 1 > height {
                    return Err(Error::new(
                        ErrorKind::InvalidImage,
                        "character set does not match strip image bands",
                    ));
                }
            }
            '\r' => {}
            _ => {
                let mut char_width = 1;
                while x + char_width < width && rgb(x + char_width, y) != break_color {
                    char_width += 1;
                }

                glyphs.push(Glyph {
                    code: c as u32,
                    width: char_width,
                    uvs: [
                        x as f32 / width as f32,
                        (y + 1) as f32 / height as f32,
                        (x + char_width) as f32 / width as f32,
                        (y + font_size + 1) as f32 / height as f32,
                    ],
                });

                x += char_width;
            }
        }
    }

    log::info!("imported {} textured glyphs for `{family}`", glyphs.len());

    Ok(FontRecord {
        family: family.to_string(),
        style: FontStyle::Textured.to_u32(),
        size: font_size,
        character_set: String::new(),
        glyphs,
        texture: TextureData {
            format: PixelFormat::Rgba8,
            size: UVec2::new(width, height),
            data: image.into_raw(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    const BREAK: Rgba<u8> = Rgba([255, 0, 255, 255]);
    const INK: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn strip_png() -> Vec<u8> {
        // 16x9: one band of 8 rows below a marker row; break columns at
        // x = 0 (the sentinel), 4 and 7
        let mut image = RgbaImage::from_pixel(16, 9, INK);
        for x in [0, 4, 7] {
            image.put_pixel(x, 0, BREAK);
        }

        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn splits_glyphs_at_break_columns() {
        let record = import_strip(&strip_png(), "marks", 8, "ab").unwrap();

        assert_eq!(record.style, FontStyle::Textured.to_u32());
        assert_eq!(record.size, 8);
        assert_eq!(record.texture.format, PixelFormat::Rgba8);
        assert_eq!(record.glyphs.len(), 2);

        let a = &record.glyphs[0];
        assert_eq!(a.width, 4);
        assert_eq!(a.uvs[0], 0.0);
        assert_eq!(a.uvs[2], 4.0 / 16.0);

        let b = &record.glyphs[1];
        assert_eq!(b.width, 3);
        assert_eq!(b.uvs[0], 4.0 / 16.0);
        assert_eq!(b.uvs[2], 7.0 / 16.0);
    }

    #[test]
    fn character_set_outgrowing_bands_is_reported() {
        let err = import_strip(&strip_png(), "marks", 8, "ab\ncd").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
    }

    #[test]
    fn garbage_image_data_is_reported() {
        let err = import_strip(&[1, 2, 3], "marks", 8, "ab").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
    }
}
