use std::ops::Range;

use crate::color::Color;
use crate::layout::{GlyphQuad, TextLayout};
use crate::math::{Vec2, Vec4};
use crate::texture::TextureId;
use crate::{Error, ErrorKind, Result};

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub pos: Vec2,
    pub tex: Vec2,
    pub color: Vec4,
}

/// One draw call: a contiguous index range into the shared buffers,
/// sampling a single atlas texture.
#[derive(Debug, Clone)]
pub struct Batch {
    pub texture: TextureId,
    pub index_range: Range<u32>,
    pub vertex_range: Range<u32>,
}

/// Accumulates glyph quads into a shared vertex/index buffer and splits
/// them into per-texture draw batches.
///
/// Usage is a strict `start` / `draw_*` / `finish` cycle. The cycle is
/// not reentrant: exactly one may be open per batcher, and every `start`
/// must be paired with a `finish` on all exit paths or the batch never
/// renders. Violations are programmer errors: asserted in debug builds,
/// reported as [`ErrorKind::Usage`] in release.
///
/// Accumulated data stays readable through [`GlyphBatcher::batches`],
/// [`GlyphBatcher::vertices`] and [`GlyphBatcher::indices`] until the
/// next `start`.
#[derive(Debug, Default)]
pub struct GlyphBatcher {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    batches: Vec<Batch>,
    cur_texture: Option<TextureId>,
    last_index: u32,
    last_vertex: u32,
    active: bool,
}

impl GlyphBatcher {
    pub fn new() -> GlyphBatcher {
        GlyphBatcher::default()
    }

    /// Begins an accumulation cycle, clearing the previous cycle's data.
    pub fn start(&mut self) -> Result<()> {
        debug_assert!(!self.active, "batcher started while a cycle is open");
        if self.active {
            return Err(Error::new(
                ErrorKind::Usage,
                "batcher started while a cycle is open",
            ));
        }

        self.vertices.clear();
        self.indices.clear();
        self.batches.clear();
        self.cur_texture = None;
        self.last_index = 0;
        self.last_vertex = 0;
        self.active = true;

        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Appends quads sampling `texture` without issuing a draw call.
    pub fn draw_quads(
        &mut self,
        texture: TextureId,
        quads: &[GlyphQuad],
        color: Color,
    ) -> Result<()> {
        debug_assert!(self.active, "batcher draw outside a start/finish cycle");
        if !self.active {
            return Err(Error::new(
                ErrorKind::Usage,
                "batcher draw outside a start/finish cycle",
            ));
        }

        self.set_texture(texture);

        let color = Vec4::from(color);
        for quad in quads {
            self.add_quad(quad, color);
        }

        Ok(())
    }

    /// Replays a precomputed layout without re-running the layout
    /// algorithm. Returns the number of quads drawn.
    pub fn draw_layout(&mut self, layout: &TextLayout, color: Color) -> Result<usize> {
        self.draw_quads(layout.texture, &layout.quads, color)?;
        Ok(layout.quads.len())
    }

    /// Ends the cycle: flushes the pending batch and makes the
    /// accumulated data available for rendering.
    pub fn finish(&mut self) -> Result<()> {
        debug_assert!(self.active, "batcher finished without a matching start");
        if !self.active {
            return Err(Error::new(
                ErrorKind::Usage,
                "batcher finished without a matching start",
            ));
        }

        self.flush();
        self.active = false;

        Ok(())
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    fn set_texture(&mut self, texture: TextureId) {
        if self.cur_texture != Some(texture) {
            self.flush();
        }

        self.cur_texture = Some(texture);
    }

    fn flush(&mut self) {
        let index_range = self.last_index..self.indices.len() as u32;
        if index_range.is_empty() {
            return;
        }

        let vertex_range = self.last_vertex..self.vertices.len() as u32;

        self.last_index = index_range.end;
        self.last_vertex = vertex_range.end;

        let Some(texture) = self.cur_texture else {
            return;
        };

        self.batches.push(Batch {
            texture,
            index_range,
            vertex_range,
        });
    }

    fn add_quad(&mut self, quad: &GlyphQuad, color: Vec4) {
        let first = self.vertices.len() as u32;
        let (min, max) = (quad.rect.min, quad.rect.max);
        let (uv_min, uv_max) = (quad.uv_min, quad.uv_max);

        self.vertices.push(Vertex {
            pos: min,
            tex: uv_min,
            color,
        });
        self.vertices.push(Vertex {
            pos: Vec2::new(max.x, min.y),
            tex: Vec2::new(uv_max.x, uv_min.y),
            color,
        });
        self.vertices.push(Vertex {
            pos: max,
            tex: uv_max,
            color,
        });
        self.vertices.push(Vertex {
            pos: Vec2::new(min.x, max.y),
            tex: Vec2::new(uv_min.x, uv_max.y),
            color,
        });

        self.indices
            .extend_from_slice(&[first, first + 1, first + 2, first + 2, first + 3, first]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Rect;
    use crate::texture::{PixelFormat, TextureData, TextureStore};

    fn quad(x: f32) -> GlyphQuad {
        GlyphQuad {
            rect: Rect::from_pos_size(Vec2::new(x, 0.0), Vec2::new(10.0, 20.0)),
            uv_min: Vec2::ZERO,
            uv_max: Vec2::new(0.1, 0.1),
        }
    }

    fn textures(count: usize) -> Vec<TextureId> {
        let mut store = TextureStore::new();
        (0..count)
            .map(|_| {
                store.insert(TextureData {
                    format: PixelFormat::Gray8,
                    size: crate::math::UVec2::new(1, 1),
                    data: vec![0],
                })
            })
            .collect()
    }

    #[test]
    fn batches_split_per_texture() {
        let tex = textures(2);
        let mut batcher = GlyphBatcher::new();

        batcher.start().unwrap();
        batcher.draw_quads(tex[0], &[quad(0.0), quad(10.0)], Color::WHITE).unwrap();
        batcher.draw_quads(tex[1], &[quad(20.0)], Color::WHITE).unwrap();
        batcher.draw_quads(tex[1], &[quad(30.0)], Color::WHITE).unwrap();
        batcher.finish().unwrap();

        let batches = batcher.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].texture, tex[0]);
        assert_eq!(batches[0].index_range, 0..12);
        assert_eq!(batches[1].texture, tex[1]);
        assert_eq!(batches[1].index_range, 12..24);
        assert_eq!(batcher.vertices().len(), 16);
        assert_eq!(batcher.indices().len(), 24);
    }

    #[test]
    fn cycle_resets_on_start() {
        let tex = textures(1);
        let mut batcher = GlyphBatcher::new();

        batcher.start().unwrap();
        batcher.draw_quads(tex[0], &[quad(0.0)], Color::WHITE).unwrap();
        batcher.finish().unwrap();
        assert_eq!(batcher.batches().len(), 1);

        batcher.start().unwrap();
        assert!(batcher.batches().is_empty());
        assert!(batcher.vertices().is_empty());
        batcher.finish().unwrap();
    }

    #[test]
    #[should_panic(expected = "cycle is open")]
    fn nested_start_asserts_in_debug() {
        let mut batcher = GlyphBatcher::new();
        batcher.start().unwrap();
        let _ = batcher.start();
    }

    #[test]
    #[should_panic(expected = "without a matching start")]
    fn unmatched_finish_asserts_in_debug() {
        let mut batcher = GlyphBatcher::new();
        let _ = batcher.finish();
    }

    #[test]
    fn empty_cycle_produces_no_batches() {
        let mut batcher = GlyphBatcher::new();
        batcher.start().unwrap();
        batcher.finish().unwrap();
        assert!(batcher.batches().is_empty());
    }
}
