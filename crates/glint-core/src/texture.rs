use std::fmt;

use slotmap::SlotMap;

use crate::math::UVec2;

slotmap::new_key_type! {
    /// Handle to a texture owned by a [`TextureStore`].
    pub struct TextureId;
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PixelFormat {
    /// One byte per pixel. Used for bitmap and distance-field atlases.
    Gray8,
    /// Four bytes per pixel. Used for textured (full color) atlases.
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgba8 => 4,
        }
    }
}

#[derive(Clone)]
pub struct TextureData {
    pub format: PixelFormat,
    pub size: UVec2,
    pub data: Vec<u8>,
}

impl fmt::Debug for TextureData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureData")
            .field("format", &self.format)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Owns the pixel data of every loaded atlas texture.
///
/// The store is the single ownership authority for texture memory: the
/// renderer collaborator reads pixels by id when uploading, and atlases
/// reference their texture by id only.
#[derive(Debug, Default)]
pub struct TextureStore {
    textures: SlotMap<TextureId, TextureData>,
}

impl TextureStore {
    pub fn new() -> TextureStore {
        TextureStore::default()
    }

    pub fn insert(&mut self, data: TextureData) -> TextureId {
        self.textures.insert(data)
    }

    pub fn get(&self, id: TextureId) -> Option<&TextureData> {
        self.textures.get(id)
    }

    pub fn remove(&mut self, id: TextureId) -> Option<TextureData> {
        self.textures.remove(id)
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
