use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::asset::AssetSource;
use crate::bundle::{self, FontRecord, REF_TYPE_FONT};
use crate::texture::{TextureId, TextureStore};
use crate::{Error, ErrorKind, Result};

/// Default fixed character spacing, as a fraction of the draw size.
pub const DEFAULT_SPACING: f32 = 0.125;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FontStyle {
    Plain,
    Bold,
    Italic,
    BoldItalic,
    /// Full-color glyphs from an RGBA texture.
    Textured,
}

impl FontStyle {
    pub fn from_u32(value: u32) -> Option<FontStyle> {
        match value {
            0 => Some(FontStyle::Plain),
            1 => Some(FontStyle::Bold),
            2 => Some(FontStyle::Italic),
            4 => Some(FontStyle::BoldItalic),
            5 => Some(FontStyle::Textured),
            _ => None,
        }
    }

    pub fn to_u32(self) -> u32 {
        match self {
            FontStyle::Plain => 0,
            FontStyle::Bold => 1,
            FontStyle::Italic => 2,
            FontStyle::BoldItalic => 4,
            FontStyle::Textured => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FontFormat {
    Bitmap,
    DistanceField,
}

/// One character's rendering metadata: advance width in pixels at the
/// atlas native size, and the UV rectangle (`u0, v0, u1, v1`) into the
/// atlas texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub code: u32,
    pub width: u32,
    pub uvs: [f32; 4],
}

/// Immutable per-size glyph table plus the backing texture.
///
/// Glyph codes are unique and stored in ascending order, so lookup is a
/// binary search. Width and UVs are both derived in the same atlas bake
/// pass and never recomputed after load.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    family: String,
    style: FontStyle,
    native_size: u32,
    format: FontFormat,
    spacing: f32,
    glyphs: Vec<Glyph>,
    texture: TextureId,
}

impl GlyphAtlas {
    pub fn new(
        family: impl Into<String>,
        style: FontStyle,
        native_size: u32,
        format: FontFormat,
        mut glyphs: Vec<Glyph>,
        texture: TextureId,
    ) -> GlyphAtlas {
        glyphs.sort_unstable_by_key(|g| g.code);

        GlyphAtlas {
            family: family.into(),
            style,
            native_size,
            format,
            spacing: DEFAULT_SPACING,
            glyphs,
            texture,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    pub fn native_size(&self) -> u32 {
        self.native_size
    }

    pub fn format(&self) -> FontFormat {
        self.format
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn set_spacing(&mut self, spacing: f32) {
        self.spacing = spacing;
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn glyph_index_by_code(&self, code: u32) -> Option<usize> {
        self.glyphs.binary_search_by_key(&code, |g| g.code).ok()
    }

    pub fn glyph_by_code(&self, code: u32) -> Option<&Glyph> {
        self.glyph_index_by_code(code).map(|i| &self.glyphs[i])
    }

    pub fn supports_character(&self, character: char) -> bool {
        self.glyph_index_by_code(character as u32).is_some()
    }
}

/// A font family: one or more [`GlyphAtlas`]es baked at different native
/// sizes, sharing family and style.
///
/// Immutable once loaded; share between [`Text`](crate::text::Text)
/// objects with [`Arc`].
#[derive(Debug, Clone)]
pub struct Font {
    atlases: SmallVec<[GlyphAtlas; 2]>,
}

impl Font {
    pub fn new(atlas: GlyphAtlas) -> Font {
        Font {
            atlases: smallvec::smallvec![atlas],
        }
    }

    /// Adds an additional pre-baked size of the same family.
    pub fn add_size(&mut self, atlas: GlyphAtlas) {
        debug_assert_eq!(atlas.family, self.atlases[0].family);
        self.atlases.push(atlas);
    }

    pub fn family(&self) -> &str {
        self.atlases[0].family()
    }

    pub fn style(&self) -> FontStyle {
        self.atlases[0].style()
    }

    pub fn format(&self) -> FontFormat {
        self.atlases[0].format()
    }

    pub fn set_format(&mut self, format: FontFormat) {
        for atlas in &mut self.atlases {
            atlas.format = format;
        }
    }

    pub fn size_count(&self) -> usize {
        self.atlases.len()
    }

    /// Native size (max glyph height in pixels) of the atlas at `index`.
    pub fn size(&self, index: usize) -> u32 {
        self.atlases[index].native_size()
    }

    pub fn spacing(&self) -> f32 {
        self.atlases[0].spacing()
    }

    /// Sets the fixed character spacing for every size of this font.
    ///
    /// Spacing is a fraction of the draw size inserted between adjacent
    /// characters. A value of 0.1 at draw size 20 inserts 2 pixels.
    pub fn set_spacing(&mut self, spacing: f32) {
        for atlas in &mut self.atlases {
            atlas.set_spacing(spacing);
        }
    }

    pub fn default_atlas(&self) -> &GlyphAtlas {
        &self.atlases[0]
    }

    /// Selects the atlas whose native size is closest to the requested
    /// size. Ties are broken by preferring the larger size, since
    /// downscaling a too-small atlas loses more detail than upscaling.
    pub fn closest_size(&self, size: f32) -> &GlyphAtlas {
        let mut best = &self.atlases[0];
        let mut best_dist = (best.native_size as f32 - size).abs();

        for atlas in &self.atlases[1..] {
            let dist = (atlas.native_size as f32 - size).abs();
            if dist < best_dist || (dist == best_dist && atlas.native_size > best.native_size) {
                best = atlas;
                best_dist = dist;
            }
        }

        best
    }

    pub fn supports_character(&self, character: char) -> bool {
        self.atlases.iter().any(|a| a.supports_character(character))
    }
}

/// Process-wide font cache keyed by bundle path and resource id.
///
/// The registry is the ownership authority for loaded fonts and their
/// atlas textures: populated at resource-load time, cleared at explicit
/// shutdown. Repeated loads of the same resource share one
/// reference-counted [`Font`].
#[derive(Debug, Default)]
pub struct FontRegistry {
    fonts: HashMap<(PathBuf, Option<String>), Arc<Font>>,
    textures: TextureStore,
}

impl FontRegistry {
    pub fn new() -> FontRegistry {
        FontRegistry::default()
    }

    /// Loads a font from the bundle at `path`.
    ///
    /// When `id` is `None` the bundle must contain exactly one font.
    /// Other font records in the bundle sharing the primary record's
    /// family and style are loaded as additional sizes.
    pub fn load(
        &mut self,
        source: &dyn AssetSource,
        path: impl AsRef<Path>,
        id: Option<&str>,
    ) -> Result<Arc<Font>> {
        let path = path.as_ref();
        let key = (path.to_path_buf(), id.map(str::to_string));

        if let Some(font) = self.fonts.get(&key) {
            return Ok(font.clone());
        }

        let data = source
            .load(path)
            .map_err(|e| e.with_context(format!("failed to load font from {}", path.display())))?;

        let primary = bundle::read_font(&data, id)?;
        let family = primary.family.clone();
        let style = primary.style;

        let mut font = Font::new(self.insert_record(primary)?);

        for font_ref in bundle::read_refs(&data)? {
            if font_ref.ref_type != REF_TYPE_FONT || Some(font_ref.id.as_str()) == id {
                continue;
            }

            let record = bundle::read_font(&data, Some(&font_ref.id))?;
            if record.family != family || record.style != style {
                continue;
            }

            if font.atlases.iter().any(|a| a.native_size == record.size) {
                continue;
            }

            let atlas = self.insert_record(record)?;
            font.add_size(atlas);
        }

        log::debug!(
            "loaded font `{}` ({} sizes) from {}",
            font.family(),
            font.size_count(),
            path.display()
        );

        let font = Arc::new(font);
        self.fonts.insert(key, font.clone());

        Ok(font)
    }

    fn insert_record(&mut self, record: FontRecord) -> Result<GlyphAtlas> {
        let FontRecord {
            family,
            style,
            size,
            glyphs,
            texture,
            ..
        } = record;

        let style = FontStyle::from_u32(style).ok_or_else(|| {
            Error::new(ErrorKind::InvalidBundle, format!("unknown font style {style}"))
        })?;

        let texture = self.textures.insert(texture);

        Ok(GlyphAtlas::new(
            family,
            style,
            size,
            FontFormat::Bitmap,
            glyphs,
            texture,
        ))
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    /// Drops every cached font and texture. Fonts still shared through
    /// an [`Arc`] stay alive, but their textures are gone; call this
    /// only at shutdown.
    pub fn clear(&mut self) {
        self.fonts.clear();
        self.textures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas(size: u32) -> GlyphAtlas {
        GlyphAtlas::new(
            "testa",
            FontStyle::Plain,
            size,
            FontFormat::Bitmap,
            vec![
                Glyph {
                    code: 'A' as u32,
                    width: size / 2,
                    uvs: [0.0, 0.0, 0.1, 0.1],
                },
                Glyph {
                    code: 'B' as u32,
                    width: size / 2 + 2,
                    uvs: [0.1, 0.0, 0.2, 0.1],
                },
            ],
            TextureId::default(),
        )
    }

    #[test]
    fn closest_size_picks_minimal_distance() {
        let mut font = Font::new(atlas(16));
        font.add_size(atlas(24));
        font.add_size(atlas(32));

        assert_eq!(font.closest_size(20.0).native_size(), 24);
        assert_eq!(font.closest_size(15.0).native_size(), 16);
        assert_eq!(font.closest_size(33.0).native_size(), 32);
    }

    #[test]
    fn closest_size_breaks_ties_upward() {
        let mut font = Font::new(atlas(16));
        font.add_size(atlas(24));

        // request 20 is 4 away from both; the larger atlas wins
        assert_eq!(font.closest_size(20.0).native_size(), 24);
    }

    #[test]
    fn glyph_lookup_is_sorted_and_searchable() {
        let atlas = GlyphAtlas::new(
            "testa",
            FontStyle::Plain,
            20,
            FontFormat::Bitmap,
            vec![
                Glyph {
                    code: 'Z' as u32,
                    width: 1,
                    uvs: [0.0; 4],
                },
                Glyph {
                    code: 'A' as u32,
                    width: 2,
                    uvs: [0.0; 4],
                },
            ],
            TextureId::default(),
        );

        assert_eq!(atlas.glyphs()[0].code, 'A' as u32);
        assert_eq!(atlas.glyph_by_code('Z' as u32).unwrap().width, 1);
        assert!(atlas.supports_character('A'));
        assert!(!atlas.supports_character('Q'));
    }

    #[test]
    fn registry_shares_repeated_loads() {
        use crate::asset::MemoryAssetSource;
        use crate::bundle::{write_font, FontRecord};
        use crate::math::UVec2;
        use crate::texture::{PixelFormat, TextureData};

        let record = FontRecord {
            family: "testa".to_string(),
            style: 0,
            size: 20,
            character_set: String::new(),
            glyphs: vec![Glyph {
                code: 'A' as u32,
                width: 10,
                uvs: [0.0, 0.0, 0.1, 0.1],
            }],
            texture: TextureData {
                format: PixelFormat::Gray8,
                size: UVec2::new(2, 2),
                data: vec![0; 4],
            },
        };

        let mut source = MemoryAssetSource::new();
        source.insert("fonts/testa.gnt", write_font("testa", &record));

        let mut registry = FontRegistry::new();
        let a = registry.load(&source, "fonts/testa.gnt", None).unwrap();
        let b = registry.load(&source, "fonts/testa.gnt", None).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.textures().len(), 1);

        registry.clear();
        assert!(registry.textures().is_empty());
    }

    #[test]
    fn registry_collects_family_sizes() {
        use crate::asset::MemoryAssetSource;
        use crate::bundle::{write_fonts, FontRecord};
        use crate::math::UVec2;
        use crate::texture::{PixelFormat, TextureData};

        let record = |size: u32| FontRecord {
            family: "testa".to_string(),
            style: 0,
            size,
            character_set: String::new(),
            glyphs: vec![Glyph {
                code: 'A' as u32,
                width: size / 2,
                uvs: [0.0, 0.0, 0.1, 0.1],
            }],
            texture: TextureData {
                format: PixelFormat::Gray8,
                size: UVec2::new(2, 2),
                data: vec![0; 4],
            },
        };

        let (small, large) = (record(16), record(24));
        let data = write_fonts(&[("testa-16", &small), ("testa-24", &large)]);

        let mut source = MemoryAssetSource::new();
        source.insert("fonts/testa.gnt", data);

        let mut registry = FontRegistry::new();
        let font = registry
            .load(&source, "fonts/testa.gnt", Some("testa-16"))
            .unwrap();

        assert_eq!(font.size_count(), 2);
        assert_eq!(font.closest_size(20.0).native_size(), 24);
        assert_eq!(registry.textures().len(), 2);
    }

    #[test]
    fn registry_reports_missing_resource() {
        use crate::asset::MemoryAssetSource;

        let source = MemoryAssetSource::new();
        let mut registry = FontRegistry::new();

        let err = registry.load(&source, "missing.gnt", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceMissing);
    }
}
