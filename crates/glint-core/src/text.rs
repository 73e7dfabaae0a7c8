use std::sync::Arc;

use crate::batch::GlyphBatcher;
use crate::color::Color;
use crate::font::Font;
use crate::layout::{lay_out, Justify, LayoutOptions, TextLayout};
use crate::math::{Rect, Vec2};
use crate::Result;

slotmap::new_key_type! {
    /// Weak reference to the scene node an object is attached to. The
    /// scene side owns the node; holders of a `NodeId` never do.
    pub struct NodeId;
}

/// Capability for objects that render themselves through a
/// [`GlyphBatcher`].
pub trait Drawable {
    /// Draws the object, returning the number of characters actually
    /// rendered.
    fn draw(&mut self, batcher: &mut GlyphBatcher) -> Result<usize>;
}

/// Capability for objects whose visual properties are driven by the
/// animation system. Animated properties never invalidate cached
/// geometry.
pub trait AnimationTarget {
    fn set_animated_opacity(&mut self, opacity: f32);

    fn set_animated_color(&mut self, color: Color);
}

/// A retained text block.
///
/// Vertex coordinates and UVs are computed once and cached, so static
/// labels pay the layout cost when they change instead of every frame.
/// Any mutation of the string or a geometry-affecting property marks the
/// cache dirty; the next [`Text::draw`] lazily recomputes it.
#[derive(Debug, Clone)]
pub struct Text {
    font: Arc<Font>,
    text: String,
    size: f32,
    width: f32,
    height: f32,
    wrap: bool,
    right_to_left: bool,
    justify: Justify,
    clip: Option<Rect>,
    opacity: f32,
    color: Color,
    node: Option<NodeId>,
    cached: Option<TextLayout>,
}

impl Text {
    /// Creates a text block drawn at `size` (0 for the font's native
    /// size) within an unbounded area.
    pub fn new(font: Arc<Font>, text: impl Into<String>, size: f32) -> Text {
        Text {
            font,
            text: text.into(),
            size,
            width: 0.0,
            height: 0.0,
            wrap: true,
            right_to_left: false,
            justify: Justify::TOP_LEFT,
            clip: None,
            opacity: 1.0,
            color: Color::WHITE,
            node: None,
            cached: None,
        }
    }

    pub fn font(&self) -> &Arc<Font> {
        &self.font
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.text != text {
            self.text = text;
            self.cached = None;
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn set_size(&mut self, size: f32) {
        if self.size != size {
            self.size = size;
            self.cached = None;
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn set_width(&mut self, width: f32) {
        if self.width != width {
            self.width = width;
            self.cached = None;
        }
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_height(&mut self, height: f32) {
        if self.height != height {
            self.height = height;
            self.cached = None;
        }
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    pub fn set_wrap(&mut self, wrap: bool) {
        if self.wrap != wrap {
            self.wrap = wrap;
            self.cached = None;
        }
    }

    pub fn right_to_left(&self) -> bool {
        self.right_to_left
    }

    pub fn set_right_to_left(&mut self, right_to_left: bool) {
        if self.right_to_left != right_to_left {
            self.right_to_left = right_to_left;
            self.cached = None;
        }
    }

    pub fn justify(&self) -> Justify {
        self.justify
    }

    pub fn set_justify(&mut self, justify: Justify) {
        if self.justify != justify {
            self.justify = justify;
            self.cached = None;
        }
    }

    pub fn clip(&self) -> Option<Rect> {
        self.clip
    }

    pub fn set_clip(&mut self, clip: Option<Rect>) {
        if self.clip != clip {
            self.clip = clip;
            self.cached = None;
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn set_node(&mut self, node: Option<NodeId>) {
        self.node = node;
    }

    /// True when the next draw will re-run the layout algorithm.
    pub fn needs_layout(&self) -> bool {
        self.cached.is_none()
    }

    fn options(&self) -> LayoutOptions {
        LayoutOptions {
            area: Rect::from_pos_size(Vec2::ZERO, Vec2::new(self.width, self.height)),
            size: self.size,
            justify: self.justify,
            wrap: self.wrap,
            right_to_left: self.right_to_left,
            clip: self.clip,
        }
    }

    /// The cached layout, recomputing it if dirty.
    pub fn layout(&mut self) -> &TextLayout {
        if self.cached.is_none() {
            self.cached = Some(lay_out(&self.font, &self.text, &self.options()));
        }

        self.cached.as_ref().unwrap()
    }

    /// Draws the text, returning the number of characters actually
    /// rendered (unsupported characters excluded).
    pub fn draw(&mut self, batcher: &mut GlyphBatcher) -> Result<usize> {
        let color = self.color.with_opacity(self.opacity);
        self.layout();

        let layout = self.cached.as_ref().unwrap();
        batcher.draw_layout(layout, color)
    }
}

impl Drawable for Text {
    fn draw(&mut self, batcher: &mut GlyphBatcher) -> Result<usize> {
        Text::draw(self, batcher)
    }
}

impl AnimationTarget for Text {
    fn set_animated_opacity(&mut self, opacity: f32) {
        self.set_opacity(opacity);
    }

    fn set_animated_color(&mut self, color: Color) {
        self.set_color(color);
    }
}
