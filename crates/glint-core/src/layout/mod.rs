mod engine;
mod measure;

pub use self::engine::*;
pub use self::measure::*;

use crate::math::Rect;

bitflags::bitflags! {
    /// Alignment of a text block within its layout area: one horizontal
    /// flag combined with one vertical flag, nine combinations total.
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct Justify: u32 {
        const LEFT = 0x01;
        const HCENTER = 0x02;
        const RIGHT = 0x04;
        const TOP = 0x10;
        const VCENTER = 0x20;
        const BOTTOM = 0x40;

        const TOP_LEFT = Self::TOP.bits() | Self::LEFT.bits();
        const VCENTER_LEFT = Self::VCENTER.bits() | Self::LEFT.bits();
        const BOTTOM_LEFT = Self::BOTTOM.bits() | Self::LEFT.bits();
        const TOP_HCENTER = Self::TOP.bits() | Self::HCENTER.bits();
        const VCENTER_HCENTER = Self::VCENTER.bits() | Self::HCENTER.bits();
        const BOTTOM_HCENTER = Self::BOTTOM.bits() | Self::HCENTER.bits();
        const TOP_RIGHT = Self::TOP.bits() | Self::RIGHT.bits();
        const VCENTER_RIGHT = Self::VCENTER.bits() | Self::RIGHT.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
    }
}

impl Justify {
    /// Parses a justify name such as `ALIGN_HCENTER` or
    /// `ALIGN_VCENTER_RIGHT`. Unrecognized names fall back to
    /// [`Justify::TOP_LEFT`].
    pub fn from_name(name: &str) -> Justify {
        match name {
            "ALIGN_LEFT" => Justify::LEFT,
            "ALIGN_HCENTER" => Justify::HCENTER,
            "ALIGN_RIGHT" => Justify::RIGHT,
            "ALIGN_TOP" => Justify::TOP,
            "ALIGN_VCENTER" => Justify::VCENTER,
            "ALIGN_BOTTOM" => Justify::BOTTOM,
            "ALIGN_TOP_LEFT" => Justify::TOP_LEFT,
            "ALIGN_VCENTER_LEFT" => Justify::VCENTER_LEFT,
            "ALIGN_BOTTOM_LEFT" => Justify::BOTTOM_LEFT,
            "ALIGN_TOP_HCENTER" => Justify::TOP_HCENTER,
            "ALIGN_VCENTER_HCENTER" => Justify::VCENTER_HCENTER,
            "ALIGN_BOTTOM_HCENTER" => Justify::BOTTOM_HCENTER,
            "ALIGN_TOP_RIGHT" => Justify::TOP_RIGHT,
            "ALIGN_VCENTER_RIGHT" => Justify::VCENTER_RIGHT,
            "ALIGN_BOTTOM_RIGHT" => Justify::BOTTOM_RIGHT,
            _ => {
                log::warn!("unknown justify name `{name}`, defaulting to top left");
                Justify::TOP_LEFT
            }
        }
    }
}

impl Default for Justify {
    fn default() -> Justify {
        Justify::TOP_LEFT
    }
}

/// Per-call layout parameters. Pure value, no retained state.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Area the text is justified within. A zero-width area disables
    /// wrapping regardless of [`LayoutOptions::wrap`].
    pub area: Rect,
    /// Draw size in pixels; 0 draws at the atlas native size.
    pub size: f32,
    pub justify: Justify,
    pub wrap: bool,
    pub right_to_left: bool,
    /// Region to clip quads against after justification.
    pub clip: Option<Rect>,
}

impl Default for LayoutOptions {
    fn default() -> LayoutOptions {
        LayoutOptions {
            area: Rect::ZERO,
            size: 0.0,
            justify: Justify::TOP_LEFT,
            wrap: true,
            right_to_left: false,
            clip: None,
        }
    }
}
