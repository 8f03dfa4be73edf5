//! Page bitmap production (spec §9 "Optional image pipeline dependencies").
//!
//! PDF rasterization (poppler/pdfium/pdf2image in the original) is an
//! external collaborator; this module only defines the seam the rest of the
//! crate programs against, so the core compiles and runs with no rasterizer
//! configured at all — the vendor detector (C4) and preflight check degrade
//! to their non-image paths when [`ImageProducer::page_image`] returns
//! `None`.

use std::path::Path;

/// A single decoded page, grayscale, row-major.
#[derive(Debug, Clone)]
pub struct PageBitmap {
    pub width: u32,
    pub height: u32,
    /// Row-major grayscale samples, one byte per pixel.
    pub pixels: Vec<u8>,
}

impl PageBitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width as usize) * (height as usize));
        Self { width, height, pixels }
    }

    /// Mean and population standard deviation of pixel intensity, used by
    /// the preflight OCRability check (a near-uniform page is almost
    /// certainly blank or unreadable).
    pub fn intensity_stats(&self) -> (f64, f64) {
        if self.pixels.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.pixels.len() as f64;
        let mean = self.pixels.iter().map(|&p| p as f64).sum::<f64>() / n;
        let variance = self.pixels.iter().map(|&p| (p as f64 - mean).powi(2)).sum::<f64>() / n;
        (mean, variance.sqrt())
    }

    /// Crop a rectangular region of interest, clamped to the bitmap bounds.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> PageBitmap {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let width = width.min(self.width.saturating_sub(x));
        let height = height.min(self.height.saturating_sub(y));
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize));
        for row in y..y + height {
            let start = (row as usize) * (self.width as usize) + x as usize;
            pixels.extend_from_slice(&self.pixels[start..start + width as usize]);
        }
        PageBitmap { width, height, pixels }
    }
}

/// Yields page bitmaps for a source file. Concrete producers (poppler,
/// pdfium bindings, a TIFF/JPEG/PNG loader) are swappable per deployment;
/// the core only depends on this trait.
pub trait ImageProducer: Send + Sync {
    /// Render `path` at `dpi`, one bitmap per page. An empty result is not
    /// an error — callers treat it the same as "no image available".
    fn render_pages(&self, path: &Path, dpi: u32) -> Result<Vec<PageBitmap>, std::io::Error>;
}

/// A producer that never yields an image, for deployments with no
/// rasterizer configured. Every consumer of [`ImageProducer`] must behave
/// correctly against this (spec §9: "must work when no image is
/// available").
pub struct NoImageProducer;

impl ImageProducer for NoImageProducer {
    fn render_pages(&self, _path: &Path, _dpi: u32) -> Result<Vec<PageBitmap>, std::io::Error> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_stats_of_uniform_bitmap_has_zero_stddev() {
        let bitmap = PageBitmap::new(4, 4, vec![128u8; 16]);
        let (mean, stddev) = bitmap.intensity_stats();
        assert_eq!(mean, 128.0);
        assert_eq!(stddev, 0.0);
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let bitmap = PageBitmap::new(4, 4, (0..16).collect());
        let cropped = bitmap.crop(2, 2, 10, 10);
        assert_eq!(cropped.width, 2);
        assert_eq!(cropped.height, 2);
    }

    #[test]
    fn no_image_producer_yields_empty_pages() {
        let producer = NoImageProducer;
        let pages = producer.render_pages(Path::new("anything.pdf"), 300).unwrap();
        assert!(pages.is_empty());
    }
}
