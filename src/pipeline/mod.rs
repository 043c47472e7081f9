//! Pipeline stages for flyer generation.
//!
//! ## Data Flow
//!
//! ```text
//! acquire ──▶ compose ──▶ document
//! (HTTP GET)   (raster)    (JPEG → PDF)
//! ```
//!
//! 1. [`acquire`]: fetch product images and load template assets; every
//!    failure is absorbed into "no image"
//! 2. [`draw`]: raster primitives (rounded boxes, polygons, text, image
//!    fitting) used by the layout
//! 3. [`compose`]: the fixed flyer layout: header, slogan and a 2 × 3
//!    product grid; CPU-bound, run inside `spawn_blocking`
//! 4. [`document`]: JPEG-encode pages, assemble the per-store PDF and derive
//!    its file name and public URL

pub mod acquire;
pub mod compose;
pub mod document;
pub mod draw;
