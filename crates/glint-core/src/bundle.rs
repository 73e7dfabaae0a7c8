//! Binary font bundle codec.
//!
//! A bundle starts with a 9-byte magic and a 2-byte version, followed by
//! a ref table (`count`, then `{ id, type, offset }` per entry) and the
//! referenced records. A font record is `family`, `style`, `size`,
//! `character_set` (reserved), the glyph table, and the atlas texture
//! (`width`, `height`, `byte_length`, then raw pixels: one byte per
//! pixel for bitmap and distance-field atlases, four for textured ones).
//!
//! All integers are fixed-width and native-endian, written as raw
//! sequential appends with no padding or checksums. The reader
//! bounds-checks every access so a corrupt or truncated file fails with
//! [`ErrorKind::InvalidBundle`] instead of producing undefined glyph
//! data.

use crate::font::Glyph;
use crate::math::UVec2;
use crate::texture::{PixelFormat, TextureData};
use crate::{Error, ErrorKind, Result};

pub const MAGIC: [u8; 9] = [0xAB, b'G', b'N', b'T', 0xBB, b'\r', b'\n', 0x1A, b'\n'];
pub const VERSION: [u8; 2] = [1, 0];

/// Ref table entry type tag for font records.
pub const REF_TYPE_FONT: u32 = 128;

/// One entry of a bundle's ref table.
#[derive(Debug, Clone)]
pub struct BundleRef {
    pub id: String,
    pub ref_type: u32,
    pub offset: u32,
}

/// A decoded font record: everything needed to build a
/// [`GlyphAtlas`](crate::font::GlyphAtlas).
#[derive(Debug, Clone)]
pub struct FontRecord {
    pub family: String,
    pub style: u32,
    pub size: u32,
    pub character_set: String,
    pub glyphs: Vec<Glyph>,
    pub texture: TextureData,
}

/// Reads the ref table of a bundle.
pub fn read_refs(data: &[u8]) -> Result<Vec<BundleRef>> {
    let mut reader = Reader::new(data);
    reader.expect_header()?;

    let count = reader.read_u32()?;
    let mut refs = Vec::with_capacity(count.min(1024) as usize);

    for _ in 0..count {
        refs.push(BundleRef {
            id: reader.read_string()?,
            ref_type: reader.read_u32()?,
            offset: reader.read_u32()?,
        });
    }

    Ok(refs)
}

/// Reads the font record with the given id.
///
/// When `id` is `None` the bundle is expected to contain exactly one
/// font record; anything else is [`ErrorKind::ResourceMissing`].
pub fn read_font(data: &[u8], id: Option<&str>) -> Result<FontRecord> {
    let refs = read_refs(data)?;
    let mut fonts = refs.iter().filter(|r| r.ref_type == REF_TYPE_FONT);

    let font_ref = match id {
        Some(id) => fonts.find(|r| r.id == id).ok_or_else(|| {
            Error::new(ErrorKind::ResourceMissing, format!("no font with id `{id}`"))
        })?,
        None => {
            let first = fonts.next().ok_or_else(|| {
                Error::new(ErrorKind::ResourceMissing, "bundle contains no font")
            })?;

            if fonts.next().is_some() {
                return Err(Error::new(
                    ErrorKind::ResourceMissing,
                    "bundle contains multiple fonts, an id is required",
                ));
            }

            first
        }
    };

    let mut reader = Reader::new(data);
    reader.seek(font_ref.offset as usize)?;
    read_font_record(&mut reader)
}

fn read_font_record(reader: &mut Reader<'_>) -> Result<FontRecord> {
    let family = reader.read_string()?;
    let style = reader.read_u32()?;
    let size = reader.read_u32()?;
    let character_set = reader.read_string()?;

    let glyph_count = reader.read_u32()?;
    let mut glyphs = Vec::with_capacity(glyph_count.min(0x10000) as usize);

    for _ in 0..glyph_count {
        glyphs.push(Glyph {
            code: reader.read_u32()?,
            width: reader.read_u32()?,
            uvs: [
                reader.read_f32()?,
                reader.read_f32()?,
                reader.read_f32()?,
                reader.read_f32()?,
            ],
        });
    }

    let width = reader.read_u32()?;
    let height = reader.read_u32()?;
    let byte_length = reader.read_u32()? as usize;

    let pixel_count = width as usize * height as usize;
    let format = if byte_length == pixel_count {
        PixelFormat::Gray8
    } else if byte_length == pixel_count * 4 {
        PixelFormat::Rgba8
    } else {
        return Err(Error::new(
            ErrorKind::InvalidBundle,
            format!("texture byte length {byte_length} does not match {width}x{height}"),
        ));
    };

    let data = reader.read_bytes(byte_length)?.to_vec();

    Ok(FontRecord {
        family,
        style,
        size,
        character_set,
        glyphs,
        texture: TextureData {
            format,
            size: UVec2::new(width, height),
            data,
        },
    })
}

/// Writes a single-font bundle.
pub fn write_font(id: &str, record: &FontRecord) -> Vec<u8> {
    write_fonts(&[(id, record)])
}

/// Writes a bundle holding several font records, e.g. the pre-baked
/// sizes of one family.
pub fn write_fonts(fonts: &[(&str, &FontRecord)]) -> Vec<u8> {
    let mut out = Vec::new();

    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION);

    write_u32(&mut out, fonts.len() as u32);

    // records follow the ref table back to back
    let table_len: usize = fonts.iter().map(|(id, _)| 4 + id.len() + 8).sum();
    let mut offset = out.len() + table_len;

    for (id, record) in fonts {
        write_string(&mut out, id);
        write_u32(&mut out, REF_TYPE_FONT);
        write_u32(&mut out, offset as u32);
        offset += record_len(record);
    }

    for (_, record) in fonts {
        write_record(&mut out, record);
    }

    out
}

fn record_len(record: &FontRecord) -> usize {
    4 + record.family.len()
        + 4
        + 4
        + 4
        + record.character_set.len()
        + 4
        + record.glyphs.len() * 24
        + 12
        + record.texture.data.len()
}

fn write_record(out: &mut Vec<u8>, record: &FontRecord) {
    write_string(out, &record.family);
    write_u32(out, record.style);
    write_u32(out, record.size);
    write_string(out, &record.character_set);

    write_u32(out, record.glyphs.len() as u32);
    for glyph in &record.glyphs {
        write_u32(out, glyph.code);
        write_u32(out, glyph.width);
        for &uv in &glyph.uvs {
            out.extend_from_slice(&uv.to_ne_bytes());
        }
    }

    write_u32(out, record.texture.size.x);
    write_u32(out, record.texture.size.y);
    write_u32(out, record.texture.data.len() as u32);
    out.extend_from_slice(&record.texture.data);
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_ne_bytes());
}

fn write_string(out: &mut Vec<u8>, str: &str) {
    write_u32(out, str.len() as u32);
    out.extend_from_slice(str.as_bytes());
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data, pos: 0 }
    }

    fn expect_header(&mut self) -> Result<()> {
        if self.read_bytes(MAGIC.len())? != MAGIC {
            return Err(Error::new(ErrorKind::InvalidBundle, "bad bundle magic"));
        }

        let version = self.read_bytes(VERSION.len())?;
        if version[0] != VERSION[0] {
            return Err(Error::new(
                ErrorKind::InvalidBundle,
                format!("unsupported bundle version {}.{}", version[0], version[1]),
            ));
        }

        Ok(())
    }

    fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(truncated());
        }

        self.pos = pos;
        Ok(())
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or_else(truncated)?;
        let bytes = self.data.get(self.pos..end).ok_or_else(truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_ne_bytes(bytes.try_into().unwrap()))
    }

    fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.read_bytes(4)?;
        Ok(f32::from_ne_bytes(bytes.try_into().unwrap()))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::wrap(ErrorKind::InvalidBundle, e))
    }
}

fn truncated() -> Error {
    Error::new(ErrorKind::InvalidBundle, "bundle data is truncated")
}
