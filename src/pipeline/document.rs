//! Document assembly: pages → one multi-page PDF per store.
//!
//! Each page is JPEG-encoded as soon as it is composed, so a store with
//! dozens of pages holds compressed pages in memory rather than full
//! 2500 × 3750 rasters. The PDF embeds every JPEG unchanged (`DCTDecode`)
//! as a full-page image.

use crate::pipeline::compose::FlyerPage;
use image::codecs::jpeg::JpegEncoder;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

/// Characters left unescaped in a document URL, besides ASCII alphanumerics.
const URL_FILENAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// A page ready to embed: JPEG bytes plus pixel size.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub page_number: usize,
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl EncodedPage {
    /// JPEG-encode a composed page.
    pub fn encode(page: &FlyerPage, quality: u8) -> Result<Self, image::ImageError> {
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(&page.image)?;
        debug!("Encoded page {} → {} bytes JPEG", page.page_number, jpeg.len());
        Ok(Self {
            page_number: page.page_number,
            width: page.image.width(),
            height: page.image.height(),
            jpeg,
        })
    }
}

/// The ordered pages of one store.
#[derive(Debug, Clone)]
pub struct FlyerDocument {
    pub store_name: String,
    pages: Vec<EncodedPage>,
}

impl FlyerDocument {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            pages: Vec::new(),
        }
    }

    /// Append an already encoded page.
    pub fn push(&mut self, page: EncodedPage) {
        self.pages.push(page);
    }

    pub fn pages(&self) -> &[EncodedPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Serialise to PDF bytes; one PDF page per flyer page, sized at `dpi`.
    pub fn to_pdf(&self, dpi: u32) -> Vec<u8> {
        let mut pdf = Pdf::new();
        let catalog_id = Ref::new(1);
        let tree_id = Ref::new(2);
        // Three objects per page: page, image, content stream.
        let ids = |i: usize| {
            let base = 3 + 3 * i as i32;
            (Ref::new(base), Ref::new(base + 1), Ref::new(base + 2))
        };

        pdf.catalog(catalog_id).pages(tree_id);
        pdf.pages(tree_id)
            .kids((0..self.pages.len()).map(|i| ids(i).0))
            .count(self.pages.len() as i32);

        let image_name = Name(b"Im0");
        let scale = 72.0 / dpi.max(1) as f32;
        for (i, page) in self.pages.iter().enumerate() {
            let (page_id, image_id, content_id) = ids(i);
            let (w_pt, h_pt) = (page.width as f32 * scale, page.height as f32 * scale);

            let mut p = pdf.page(page_id);
            p.media_box(Rect::new(0.0, 0.0, w_pt, h_pt));
            p.parent(tree_id);
            p.contents(content_id);
            p.resources().x_objects().pair(image_name, image_id);
            p.finish();

            let mut image = pdf.image_xobject(image_id, &page.jpeg);
            image.filter(Filter::DctDecode);
            image.width(page.width as i32);
            image.height(page.height as i32);
            image.color_space().device_rgb();
            image.bits_per_component(8);
            image.finish();

            let mut content = Content::new();
            content.save_state();
            content.transform([w_pt, 0.0, 0.0, h_pt, 0.0, 0.0]);
            content.x_object(image_name);
            content.restore_state();
            pdf.stream(content_id, &content.finish());
        }

        pdf.finish()
    }
}

/// Keep only alphanumerics, space, `-` and `_`.
///
/// Idempotent: sanitising a sanitised name returns it unchanged.
pub fn sanitize_store_name(store_name: &str) -> String {
    store_name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect()
}

/// File name of a store's document, e.g. `LENTO_EFE Centro.pdf`.
pub fn document_file_name(prefix: &str, store_name: &str) -> String {
    format!("{}{}.pdf", prefix, sanitize_store_name(store_name))
}

/// Public URL of a document: base URL + percent-encoded file name.
pub fn document_url(base_url: &str, file_name: &str) -> String {
    format!("{}{}", base_url, utf8_percent_encode(file_name, URL_FILENAME))
}
