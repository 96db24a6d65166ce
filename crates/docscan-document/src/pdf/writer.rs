// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — scanned page images to PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use docscan_core::PaperSize;
use docscan_core::error::{DocscanError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// Page margin around each scanned image.
const MARGIN_MM: f32 = 15.0;

/// Resolution scanned pages are assumed to have.
const SCAN_DPI: f32 = 150.0;

/// Builds PDFs from captured page images, one image per page.
pub struct PdfWriter {
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Single-page PDF containing `image_bytes`.
    pub fn create_from_image(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        self.create_from_images(&[image_bytes])
    }

    /// PDF with one page per image, in order.
    ///
    /// Each image is scaled to fit inside the page margins, preserving its
    /// aspect ratio and never upscaled, then centred on the page.
    #[instrument(skip_all, fields(pages = images.len()))]
    pub fn create_from_images<B: AsRef<[u8]>>(&self, images: &[B]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(DocscanError::PdfError(
                "cannot create a PDF without any pages".into(),
            ));
        }

        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Scanned Document");
        info!(paper = ?self.paper_size, title, "creating scan PDF");

        let mut doc = PdfDocument::new(title);
        let mut pages = Vec::with_capacity(images.len());

        for (index, bytes) in images.iter().enumerate() {
            let decoded = ::image::load_from_memory(bytes.as_ref()).map_err(|err| {
                DocscanError::ImageError(format!("failed to decode page {}: {err}", index + 1))
            })?;

            let img_width = decoded.width() as usize;
            let img_height = decoded.height() as usize;
            let raw = RawImage {
                pixels: RawImageData::U8(decoded.to_rgb8().into_raw()),
                width: img_width,
                height: img_height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let placement = fit_to_page(page_w, page_h, img_width, img_height);
            debug!(
                page = index + 1,
                rendered_w_pt = placement.rendered_w_pt,
                rendered_h_pt = placement.rendered_h_pt,
                scale = placement.scale,
                "page image placed"
            );

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(placement.x_pt)),
                    translate_y: Some(Pt(placement.y_pt)),
                    scale_x: Some(placement.scale),
                    scale_y: Some(placement.scale),
                    dpi: Some(SCAN_DPI),
                    rotate: None,
                },
            }];
            pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(warnings = warnings.len(), "PDF serialised with warnings");
        }
        Ok(output)
    }

    /// Build the PDF for `images` and write it to `path`.
    pub fn write_images_to_file<B: AsRef<[u8]>>(
        &self,
        images: &[B],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let bytes = self.create_from_images(images)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("wrote scan PDF to {}", path.as_ref().display());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    x_pt: f32,
    y_pt: f32,
    scale: f32,
    rendered_w_pt: f32,
    rendered_h_pt: f32,
}

/// Where an image of `img_width` × `img_height` pixels lands on the page.
fn fit_to_page(page_w: Mm, page_h: Mm, img_width: usize, img_height: usize) -> Placement {
    let usable_w_pt = Mm(page_w.0 - 2.0 * MARGIN_MM).into_pt().0;
    let usable_h_pt = Mm(page_h.0 - 2.0 * MARGIN_MM).into_pt().0;

    let img_w_pt = img_width as f32 / SCAN_DPI * 72.0;
    let img_h_pt = img_height as f32 / SCAN_DPI * 72.0;

    let scale = (usable_w_pt / img_w_pt).min(usable_h_pt / img_h_pt).min(1.0);
    let rendered_w_pt = img_w_pt * scale;
    let rendered_h_pt = img_h_pt * scale;

    let margin_pt = Mm(MARGIN_MM).into_pt().0;
    Placement {
        x_pt: margin_pt + (usable_w_pt - rendered_w_pt) / 2.0,
        y_pt: margin_pt + (usable_h_pt - rendered_h_pt) / 2.0,
        scale,
        rendered_w_pt,
        rendered_h_pt,
    }
}
