//! Flyer composition: lay out up to six products and the store header on a
//! fixed-size page.
//!
//! ## Page anatomy (2500 × 3750 px)
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ header photo (darkened)        ( logo )  │  0 – 1000
//! │                        ╱ STORE NAME ▕▕▕▕ │
//! │ (Generado: dd/mm/yyyy)                   │
//! ├──────────────────────────────────────────┤
//! │            ¡SLOGAN BAND!                 │  1030 – 1260
//! ├────────────────────┬─────────────────────┤
//! │ card 0             │ card 1              │  1350
//! │ card 2             │ card 3              │  2150
//! │ card 4             │ card 5              │  2950
//! └────────────────────┴─────────────────────┘
//! ```
//!
//! Composition never fails. A header photo, logo or product image that
//! cannot be loaded is simply not drawn; the shapes around it still are.
//! The only inputs are the products, their pre-fetched images, the config
//! (timestamp included) and the fonts, so identical inputs give identical
//! pixels.

use crate::brand::{BrandVariant, LogoBadge, Palette, StoreLabel, BLACK, BRAND_GREY, WHITE};
use crate::config::FlyerConfig;
use crate::error::{AcquisitionError, FlyerError};
use crate::fonts::{text_width, FontSet};
use crate::pipeline::acquire::{fetch_image, load_asset, ImageSource};
use crate::pipeline::draw;
use crate::product::ProductRecord;
use futures::future::join_all;
use image::{DynamicImage, RgbImage, RgbaImage};
use tracing::debug;

pub const CANVAS_WIDTH: u32 = 2500;
pub const CANVAS_HEIGHT: u32 = 3750;
pub const PRODUCTS_PER_PAGE: usize = 6;

const W: i32 = CANVAS_WIDTH as i32;

// Header
const HEADER_HEIGHT: u32 = 1000;
const HEADER_SHADE: u8 = 60;
const LOGO_MARGIN: i32 = 80;
const STORE_LABEL_PX: f32 = 90.0;
const TIMESTAMP_PX: f32 = 45.0;
const SLOGAN_PX: f32 = 105.0;
const SLOGAN_TOP: i32 = 1030;
const SLOGAN_BOTTOM: i32 = 1260;
const SLOGAN_TEXT_Y: i32 = 1085;

// Grid
const COLUMN_X: [i32; 2] = [110, 1300];
const ROW_Y: [i32; 3] = [1350, 2150, 2950];
const CARD_WIDTH: i32 = 1090;
const CARD_HEIGHT: i32 = 760;
const CARD_RADIUS: i32 = 70;
const PHOTO_BOX: u32 = 550;
const PHOTO_INSET: i32 = 30;
const TEXT_INSET: i32 = 600;
const BRAND_PX: f32 = 55.0;
const TITLE_PX: f32 = 65.0;
const TITLE_LEADING: i32 = 5;
/// Characters per wrapped title line.
pub const TITLE_WRAP_WIDTH: usize = 15;
/// Wrapped title lines beyond this are dropped.
pub const TITLE_MAX_LINES: usize = 4;
const SKU_PX: f32 = 60.0;
const SKU_BADGE_WIDTH: i32 = 470;

/// Everything needed to compose one page, images already fetched.
#[derive(Debug, Clone)]
pub struct PageInput {
    pub store_name: String,
    /// 1-based position of this page in the store's document.
    pub page_number: usize,
    pub products: Vec<ProductRecord>,
    /// One slot per product; `None` where no image could be obtained.
    pub images: Vec<Option<DynamicImage>>,
}

impl PageInput {
    /// A page whose products have no images.
    pub fn without_images(
        store_name: impl Into<String>,
        page_number: usize,
        products: Vec<ProductRecord>,
    ) -> Self {
        let images = vec![None; products.len()];
        Self {
            store_name: store_name.into(),
            page_number,
            products,
            images,
        }
    }
}

/// A product card placed on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    /// Index of the product within the page (0–5).
    pub index: usize,
    pub column: usize,
    pub row: usize,
    pub sku: String,
    /// Whether a product image was pasted on the card.
    pub has_image: bool,
}

/// One rendered flyer page.
#[derive(Debug, Clone)]
pub struct FlyerPage {
    pub page_number: usize,
    pub variant: BrandVariant,
    pub image: RgbImage,
    pub cells: Vec<GridCell>,
}

/// Grid position `(column, row)` of the `index`-th product on a page.
pub fn cell_position(index: usize) -> (usize, usize) {
    (index % 2, index / 2)
}

/// Top-left pixel of the card for the `index`-th product (`index` < 6).
pub fn cell_origin(index: usize) -> (i32, i32) {
    let (column, row) = cell_position(index);
    (COLUMN_X[column], ROW_Y[row])
}

/// Fetch the images for `products` and compose the page on the blocking
/// pool.
///
/// # Errors
/// Only if the blocking task itself dies; asset and network problems are
/// absorbed into the page.
pub async fn render_page(
    products: &[ProductRecord],
    store_name: &str,
    page_number: usize,
    config: &FlyerConfig,
    fonts: &FontSet,
    source: &dyn ImageSource,
) -> Result<FlyerPage, FlyerError> {
    let input = prepare_page(products, store_name, page_number, source).await;
    let config = config.clone();
    let fonts = fonts.clone();
    let store = store_name.to_string();

    tokio::task::spawn_blocking(move || compose_page(&input, &config, &fonts))
        .await
        .map_err(|e| FlyerError::RenderTaskFailed {
            store,
            detail: e.to_string(),
        })
}

/// Fetch every product image on a page concurrently.
///
/// Only the first [`PRODUCTS_PER_PAGE`] products are kept.
pub async fn prepare_page(
    products: &[ProductRecord],
    store_name: &str,
    page_number: usize,
    source: &dyn ImageSource,
) -> PageInput {
    let products: Vec<ProductRecord> = products.iter().take(PRODUCTS_PER_PAGE).cloned().collect();
    let fetches = products
        .iter()
        .map(|p| fetch_image(source, p.image_ref.as_deref()));
    let images = join_all(fetches)
        .await
        .into_iter()
        .zip(&products)
        .map(|(result, product)| match result {
            Ok(img) => Some(img),
            Err(AcquisitionError::MissingReference) => None,
            Err(e) => {
                debug!("SKU {}: image omitted: {}", product.sku, e);
                None
            }
        })
        .collect();

    PageInput {
        store_name: store_name.to_string(),
        page_number,
        products,
        images,
    }
}

/// Compose one page. Pure given its inputs.
pub fn compose_page(input: &PageInput, config: &FlyerConfig, fonts: &FontSet) -> FlyerPage {
    let variant = BrandVariant::classify(&input.store_name);
    let palette = variant.palette();
    let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, palette.background);

    draw_header_photo(&mut canvas, palette, config);
    draw_logo(&mut canvas, palette, config);
    draw_store_label(&mut canvas, palette, fonts, &input.store_name);
    draw_timestamp(&mut canvas, fonts, &config.timestamp_text());
    draw_slogan(&mut canvas, palette, fonts, &config.slogan);

    let cells = input
        .products
        .iter()
        .take(PRODUCTS_PER_PAGE)
        .enumerate()
        .map(|(index, product)| {
            let image = input.images.get(index).and_then(Option::as_ref);
            draw_card(&mut canvas, palette, fonts, index, product, image)
        })
        .collect::<Vec<_>>();

    debug!(
        "Composed page {} for '{}' ({} products)",
        input.page_number,
        input.store_name,
        cells.len()
    );

    FlyerPage {
        page_number: input.page_number,
        variant,
        image: DynamicImage::ImageRgba8(canvas).to_rgb8(),
        cells,
    }
}

fn draw_header_photo(canvas: &mut RgbaImage, palette: &Palette, config: &FlyerConfig) {
    let path = config.asset_dir.join(palette.header_asset);
    match load_asset(&path) {
        Ok(photo) => {
            let mut band = draw::cover(&photo, CANVAS_WIDTH, HEADER_HEIGHT);
            draw::darken(&mut band, HEADER_SHADE);
            draw::paste(canvas, &band, 0, 0);
        }
        Err(e) => debug!("Header photo skipped: {}", e),
    }
}

fn draw_logo(canvas: &mut RgbaImage, palette: &Palette, config: &FlyerConfig) {
    let logo = load_asset(&config.asset_dir.join(palette.logo_asset));
    if let Err(ref e) = logo {
        debug!("Logo skipped: {}", e);
    }

    match palette.logo_badge {
        LogoBadge::Circle { diameter, top } => {
            let d = diameter as i32;
            let (x, y) = (W - d - LOGO_MARGIN, top as i32);
            draw::fill_circle(canvas, x, y, d, WHITE);
            if let Ok(logo) = logo {
                let side = (diameter as f32 * 0.85) as u32;
                let fitted = draw::contain(&logo, side, side);
                let lx = x + (d - fitted.width() as i32) / 2;
                let ly = y + (d - fitted.height() as i32) / 2;
                draw::paste(canvas, &fitted, lx, ly);
            }
        }
        LogoBadge::RoundedRect {
            width,
            height,
            radius,
            top,
        } => {
            let (w, h) = (width as i32, height as i32);
            let (x, y) = (W - w - LOGO_MARGIN, top as i32);
            draw::fill_rounded_rect(canvas, x, y, x + w, y + h, radius as i32, WHITE);
            if let Ok(logo) = logo {
                let fitted = draw::contain(
                    &logo,
                    (width as f32 * 0.85) as u32,
                    (height as f32 * 0.80) as u32,
                );
                let lx = x + (w - fitted.width() as i32) / 2;
                let ly = y + (h - fitted.height() as i32) / 2 + 10;
                draw::paste(canvas, &fitted, lx, ly);
            }
        }
    }
}

fn draw_store_label(canvas: &mut RgbaImage, palette: &Palette, fonts: &FontSet, store_name: &str) {
    let label = store_name.to_uppercase();
    let font = &fonts.extrabold_condensed;
    let tw = text_width(font, STORE_LABEL_PX, &label) as i32;

    match palette.store_label {
        StoreLabel::Pill => {
            draw::fill_rounded_rect(canvas, W - tw - 150, 620, W, 800, 50, palette.label_fill);
            draw::text(canvas, font, STORE_LABEL_PX, W - tw - 80, 655, &label, palette.label_text);
        }
        StoreLabel::Banner => {
            let p = W - tw - 250;
            draw::fill_polygon(
                canvas,
                &[(p, 720), (p + 100, 520), (W, 520), (W, 720)],
                palette.label_fill,
            );
            draw::text(canvas, font, STORE_LABEL_PX, W - tw - 100, 570, &label, palette.label_text);
        }
    }
}

fn draw_timestamp(canvas: &mut RgbaImage, fonts: &FontSet, text: &str) {
    let font = &fonts.bold_condensed;
    let tw = text_width(font, TIMESTAMP_PX, text) as i32;
    draw::fill_rounded_rect(canvas, 0, 850, tw + 80, 960, 40, WHITE);
    draw::text(canvas, font, TIMESTAMP_PX, 40, 880, text, BLACK);
}

fn draw_slogan(canvas: &mut RgbaImage, palette: &Palette, fonts: &FontSet, slogan: &str) {
    let font = &fonts.extrabold;
    let sw = text_width(font, SLOGAN_PX, slogan) as i32;
    draw::fill_rect(canvas, 0, SLOGAN_TOP, W, SLOGAN_BOTTOM, palette.slogan_band);
    draw::text(
        canvas,
        font,
        SLOGAN_PX,
        (W - sw) / 2,
        SLOGAN_TEXT_Y,
        slogan,
        palette.slogan_text,
    );
}

fn draw_card(
    canvas: &mut RgbaImage,
    palette: &Palette,
    fonts: &FontSet,
    index: usize,
    product: &ProductRecord,
    image: Option<&DynamicImage>,
) -> GridCell {
    let (column, row) = cell_position(index);
    let (x, y) = cell_origin(index);
    draw::fill_rounded_rect(canvas, x, y, x + CARD_WIDTH, y + CARD_HEIGHT, CARD_RADIUS, WHITE);

    if let Some(img) = image {
        let photo = draw::shrink_to_fit(img, PHOTO_BOX, PHOTO_BOX);
        let py = y + (CARD_HEIGHT - photo.height() as i32) / 2;
        draw::paste(canvas, &photo, x + PHOTO_INSET, py);
    }

    let tx = x + TEXT_INSET;
    draw::text(
        canvas,
        &fonts.semibold,
        BRAND_PX,
        tx,
        y + 80,
        &product.brand.to_uppercase(),
        BRAND_GREY,
    );

    let mut ty = y + 160;
    for line in wrap_title(&product.title) {
        draw::text(canvas, &fonts.regular_condensed, TITLE_PX, tx, ty, &line, BLACK);
        ty += TITLE_PX as i32 + TITLE_LEADING;
    }

    let badge_x = tx - 20;
    draw::fill_rounded_rect(
        canvas,
        badge_x,
        y + 620,
        badge_x + SKU_BADGE_WIDTH,
        y + 710,
        20,
        palette.sku_badge,
    );
    let sku_w = text_width(&fonts.bold_condensed, SKU_PX, &product.sku) as i32;
    draw::text(
        canvas,
        &fonts.bold_condensed,
        SKU_PX,
        badge_x + (SKU_BADGE_WIDTH - sku_w) / 2,
        y + 635,
        &product.sku,
        WHITE,
    );

    GridCell {
        index,
        column,
        row,
        sku: product.sku.clone(),
        has_image: image.is_some(),
    }
}

/// Wrap a title to [`TITLE_WRAP_WIDTH`] characters and keep at most
/// [`TITLE_MAX_LINES`] lines.
pub fn wrap_title(title: &str) -> Vec<String> {
    let mut lines = wrap_text(title, TITLE_WRAP_WIDTH);
    lines.truncate(TITLE_MAX_LINES);
    lines
}

/// Greedy word wrap, measured in characters.
///
/// Lines break on whitespace and after a hyphen joining two words
/// (`NO-FROST` → `NO-` + `FROST`). A piece longer than `width` first tops
/// up the current line, then is cut into `width`-sized pieces.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        for (j, piece) in hyphen_pieces(word).into_iter().enumerate() {
            // Pieces of one word join without a space.
            let sep = usize::from(j == 0);
            let mut rest = piece;
            while !rest.is_empty() {
                let gap = if line_len == 0 { 0 } else { sep };
                if line_len + gap + rest.len() <= width {
                    if gap == 1 {
                        line.push(' ');
                    }
                    line.extend(rest.iter());
                    line_len += gap + rest.len();
                    rest.clear();
                } else if line_len > 0 {
                    if rest.len() > width {
                        let room = width.saturating_sub(line_len + gap);
                        if room > 0 {
                            if gap == 1 {
                                line.push(' ');
                            }
                            line.extend(rest.drain(..room));
                        }
                    }
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                } else {
                    lines.push(rest.drain(..width).collect());
                }
            }
        }
    }
    if line_len > 0 {
        lines.push(line);
    }
    lines
}

/// Split a word after each hyphen that has at least two letters before it
/// and a letter after it.
fn hyphen_pieces(word: &str) -> Vec<Vec<char>> {
    let chars: Vec<char> = word.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;
    for i in 2..chars.len().saturating_sub(1) {
        let breaks = chars[i] == '-'
            && chars[i - 1].is_alphabetic()
            && chars[i - 2].is_alphabetic()
            && chars[i + 1].is_alphabetic();
        if breaks {
            pieces.push(chars[start..=i].to_vec());
            start = i + 1;
        }
    }
    pieces.push(chars[start..].to_vec());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::tests::system_font;
    use chrono::NaiveDate;

    fn fonts() -> Option<FontSet> {
        system_font().map(FontSet::uniform)
    }

    fn config() -> FlyerConfig {
        let at = NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        FlyerConfig::builder()
            .asset_dir("/nonexistent-assets")
            .generated_at(at)
            .build()
            .unwrap()
    }

    fn products(n: usize) -> Vec<ProductRecord> {
        (0..n)
            .map(|i| ProductRecord::new("Samsung", format!("SKU-{i}"), format!("Producto numero {i}")))
            .collect()
    }

    #[test]
    fn cells_fill_two_columns_three_rows() {
        assert_eq!(cell_position(0), (0, 0));
        assert_eq!(cell_position(1), (1, 0));
        assert_eq!(cell_position(2), (0, 1));
        assert_eq!(cell_position(5), (1, 2));
        assert_eq!(cell_origin(0), (110, 1350));
        assert_eq!(cell_origin(3), (1300, 2150));
        assert_eq!(cell_origin(4), (110, 2950));
    }

    #[test]
    fn cards_stay_on_canvas() {
        for i in 0..PRODUCTS_PER_PAGE {
            let (x, y) = cell_origin(i);
            assert!(x + CARD_WIDTH <= W);
            assert!(y + CARD_HEIGHT <= CANVAS_HEIGHT as i32);
        }
    }

    #[test]
    fn wrap_breaks_on_whitespace() {
        assert_eq!(
            wrap_text("Televisor LED 55 pulgadas Smart", 15),
            vec!["Televisor LED", "55 pulgadas", "Smart"]
        );
    }

    #[test]
    fn wrap_splits_long_words() {
        assert_eq!(
            wrap_text("ABCDEFGHIJKLMNOPQRST", 15),
            vec!["ABCDEFGHIJKLMNO", "PQRST"]
        );
        assert_eq!(
            wrap_text("TV SUPERCALIFRAGILISTIC", 15),
            vec!["TV SUPERCALIFRA", "GILISTIC"]
        );
    }

    #[test]
    fn wrap_breaks_after_hyphens() {
        assert_eq!(
            wrap_title("LAVADORA-SECADORA LG 20KG"),
            vec!["LAVADORA-", "SECADORA LG", "20KG"]
        );
        assert_eq!(
            wrap_text("Refrigeradora NO-FROST 300L", 15),
            vec!["Refrigeradora", "NO-FROST 300L"]
        );
        assert_eq!(wrap_text("MODELO X-200", 15), vec!["MODELO X-200"]);
        assert_eq!(wrap_text("AB-CD-EF-GH-IJ-KL", 6), vec!["AB-CD-", "EF-GH-", "IJ-KL"]);
    }

    #[test]
    fn wrap_handles_empty_and_blank() {
        assert!(wrap_text("", 15).is_empty());
        assert!(wrap_text("   \t ", 15).is_empty());
    }

    #[test]
    fn title_is_truncated_to_four_lines() {
        let title = "uno dos tres cuatro cinco seis siete ocho nueve diez once doce trece catorce";
        assert!(wrap_text(title, TITLE_WRAP_WIDTH).len() > TITLE_MAX_LINES);
        let lines = wrap_title(title);
        assert_eq!(lines.len(), TITLE_MAX_LINES);
        assert!(lines.iter().all(|l| l.chars().count() <= TITLE_WRAP_WIDTH));
    }

    #[test]
    fn page_has_fixed_size_and_ordered_cells() {
        let Some(fonts) = fonts() else {
            println!("SKIP — no system font available");
            return;
        };
        let input = PageInput::without_images("LC Miraflores", 1, products(5));
        let page = compose_page(&input, &config(), &fonts);
        assert_eq!(page.image.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert_eq!(page.variant, BrandVariant::Secondary);
        assert_eq!(page.cells.len(), 5);
        for (i, cell) in page.cells.iter().enumerate() {
            assert_eq!(cell.index, i);
            assert_eq!((cell.column, cell.row), (i % 2, i / 2));
            assert_eq!(cell.sku, format!("SKU-{i}"));
            assert!(!cell.has_image);
        }
    }

    #[test]
    fn only_first_six_products_are_drawn() {
        let Some(fonts) = fonts() else {
            println!("SKIP — no system font available");
            return;
        };
        let input = PageInput::without_images("EFE Centro", 1, products(9));
        let page = compose_page(&input, &config(), &fonts);
        assert_eq!(page.cells.len(), PRODUCTS_PER_PAGE);
        assert_eq!(page.cells.last().unwrap().sku, "SKU-5");
    }

    #[test]
    fn empty_page_is_header_only() {
        let Some(fonts) = fonts() else {
            println!("SKIP — no system font available");
            return;
        };
        let input = PageInput::without_images("EFE Centro", 1, Vec::new());
        let page = compose_page(&input, &config(), &fonts);
        assert!(page.cells.is_empty());
        // The first card slot shows plain background.
        let (x, y) = cell_origin(0);
        let bg = BrandVariant::Primary.palette().background;
        let px = page.image.get_pixel((x + CARD_WIDTH / 2) as u32, (y + CARD_HEIGHT / 2) as u32);
        assert_eq!(px.0, [bg[0], bg[1], bg[2]]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let Some(fonts) = fonts() else {
            println!("SKIP — no system font available");
            return;
        };
        let mut input = PageInput::without_images("Tienda EFE Arequipa", 2, products(4));
        input.images[1] = Some(DynamicImage::new_rgb8(800, 600));
        let a = compose_page(&input, &config(), &fonts);
        let b = compose_page(&input, &config(), &fonts);
        assert!(a.cells[1].has_image);
        assert_eq!(a.image.as_raw(), b.image.as_raw());
    }

    #[test]
    fn timestamp_changes_pixels() {
        let Some(fonts) = fonts() else {
            println!("SKIP — no system font available");
            return;
        };
        let input = PageInput::without_images("LC Surco", 1, products(1));
        let later = FlyerConfig {
            generated_at: config().generated_at + chrono::Duration::hours(3),
            ..config()
        };
        let a = compose_page(&input, &config(), &fonts);
        let b = compose_page(&input, &later, &fonts);
        assert_ne!(a.image.as_raw(), b.image.as_raw());
    }

    #[test]
    fn variant_drives_background() {
        let Some(fonts) = fonts() else {
            println!("SKIP — no system font available");
            return;
        };
        let efe = compose_page(&PageInput::without_images("efe norte", 1, vec![]), &config(), &fonts);
        let lc = compose_page(&PageInput::without_images("LC Norte", 1, vec![]), &config(), &fonts);
        let bottom = CANVAS_HEIGHT - 5;
        let p = BrandVariant::Primary.palette().background;
        let s = BrandVariant::Secondary.palette().background;
        assert_eq!(efe.image.get_pixel(5, bottom).0, [p[0], p[1], p[2]]);
        assert_eq!(lc.image.get_pixel(5, bottom).0, [s[0], s[1], s[2]]);
    }
}
