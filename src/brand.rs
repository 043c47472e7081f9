//! Brand variant classification and the per-variant visual table.
//!
//! Every colour, asset and badge shape on a flyer comes out of the
//! [`Palette`] selected here; nothing else in the layout branches on the
//! store's identity.

use image::Rgba;
use serde::{Deserialize, Serialize};

/// Substring that marks a store as belonging to the primary chain.
pub const PRIMARY_MARKER: &str = "EFE";

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const BRAND_GREY: Rgba<u8> = Rgba([100, 100, 100, 255]);

const PRIMARY_BLUE: Rgba<u8> = Rgba([0, 107, 213, 255]);
const PRIMARY_BLUE_DARK: Rgba<u8> = Rgba([0, 60, 150, 255]);
const PRIMARY_ORANGE: Rgba<u8> = Rgba([255, 100, 0, 255]);
const SECONDARY_YELLOW: Rgba<u8> = Rgba([255, 203, 5, 255]);
const SECONDARY_YELLOW_DARK: Rgba<u8> = Rgba([235, 180, 0, 255]);

/// Visual style of a store's flyers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrandVariant {
    /// Store name contains [`PRIMARY_MARKER`] (blue/orange palette).
    Primary,
    /// Every other store (yellow/black palette).
    Secondary,
}

impl BrandVariant {
    /// Classify a store by a case-insensitive substring test on its name.
    ///
    /// There is no word-boundary check: `"REFERENCIA"` is primary too.
    pub fn classify(store_name: &str) -> Self {
        if store_name.to_uppercase().contains(PRIMARY_MARKER) {
            BrandVariant::Primary
        } else {
            BrandVariant::Secondary
        }
    }

    pub fn palette(self) -> &'static Palette {
        match self {
            BrandVariant::Primary => &PRIMARY_PALETTE,
            BrandVariant::Secondary => &SECONDARY_PALETTE,
        }
    }
}

/// Shape of the white badge holding the logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoBadge {
    Circle { diameter: u32, top: u32 },
    RoundedRect { width: u32, height: u32, radius: u32, top: u32 },
}

/// Shape behind the store name in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLabel {
    /// Rounded pill flush with the right edge.
    Pill,
    /// Slanted banner polygon flush with the right edge.
    Banner,
}

/// All variant-dependent choices used while composing a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgba<u8>,
    pub slogan_band: Rgba<u8>,
    pub slogan_text: Rgba<u8>,
    pub label_fill: Rgba<u8>,
    pub label_text: Rgba<u8>,
    pub sku_badge: Rgba<u8>,
    pub logo_badge: LogoBadge,
    pub store_label: StoreLabel,
    /// File name of the logo inside the asset directory.
    pub logo_asset: &'static str,
    /// File name of the header photo inside the asset directory.
    pub header_asset: &'static str,
}

static PRIMARY_PALETTE: Palette = Palette {
    background: PRIMARY_BLUE_DARK,
    slogan_band: PRIMARY_BLUE,
    slogan_text: WHITE,
    label_fill: PRIMARY_ORANGE,
    label_text: WHITE,
    sku_badge: PRIMARY_ORANGE,
    logo_badge: LogoBadge::Circle {
        diameter: 460,
        top: 40,
    },
    store_label: StoreLabel::Pill,
    logo_asset: "logo-efe-sin-fondo.png",
    header_asset: "efe tienda.jpg",
};

static SECONDARY_PALETTE: Palette = Palette {
    background: SECONDARY_YELLOW_DARK,
    slogan_band: SECONDARY_YELLOW,
    slogan_text: BLACK,
    label_fill: BLACK,
    label_text: SECONDARY_YELLOW,
    sku_badge: BLACK,
    logo_badge: LogoBadge::RoundedRect {
        width: 500,
        height: 380,
        radius: 50,
        top: 0,
    },
    store_label: StoreLabel::Banner,
    logo_asset: "logo-lc-sin-fondo.png",
    header_asset: "LC-MIRAFLORES-LOGO-3D[2].jpg",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_is_case_insensitive() {
        assert_eq!(BrandVariant::classify("EFE San Isidro"), BrandVariant::Primary);
        assert_eq!(BrandVariant::classify("Tienda efe Norte"), BrandVariant::Primary);
        assert_eq!(BrandVariant::classify("Efe"), BrandVariant::Primary);
    }

    #[test]
    fn no_word_boundary_check() {
        assert_eq!(BrandVariant::classify("REFERENCIA"), BrandVariant::Primary);
    }

    #[test]
    fn other_names_are_secondary() {
        assert_eq!(BrandVariant::classify("LC Miraflores"), BrandVariant::Secondary);
        assert_eq!(BrandVariant::classify("E F E"), BrandVariant::Secondary);
    }

    #[test]
    fn classification_is_stable() {
        let name = "Plaza Efectiva";
        let first = BrandVariant::classify(name);
        for _ in 0..10 {
            assert_eq!(BrandVariant::classify(name), first);
        }
    }

    #[test]
    fn palettes_differ_in_every_keyed_choice() {
        let p = BrandVariant::Primary.palette();
        let s = BrandVariant::Secondary.palette();
        assert_ne!(p.background, s.background);
        assert_ne!(p.slogan_band, s.slogan_band);
        assert_ne!(p.slogan_text, s.slogan_text);
        assert_ne!(p.sku_badge, s.sku_badge);
        assert_ne!(p.logo_badge, s.logo_badge);
        assert_ne!(p.store_label, s.store_label);
        assert_ne!(p.logo_asset, s.logo_asset);
        assert_ne!(p.header_asset, s.header_asset);
    }
}
