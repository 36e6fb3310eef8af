use chrono::{DateTime, Utc};
use tracing::warn;

use crate::features::pdf_reports::services::pdf_canvas::{
    text_width, wrap_text, PdfCanvas, PlacedImage, CONTENT_WIDTH, MARGIN, PAGE_WIDTH,
};
use crate::features::rncs::models::{PhotoStage, Rnc};
use crate::features::settings::Logo;

const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 9.5;
const LABEL_WIDTH: f32 = 130.0;
const LOGO_MAX_WIDTH: f32 = 110.0;
const LOGO_MAX_HEIGHT: f32 = 50.0;
const PHOTO_GAP: f32 = 12.0;
const PHOTO_SLOT_HEIGHT: f32 = 190.0;
const CAPTION_HEIGHT: f32 = 14.0;

pub const UNAVAILABLE_CAPTION: &str = "Foto indisponível";

/// Photo link with the bytes fetched for this report, if any
#[derive(Debug, Clone)]
pub struct ReportPhoto {
    pub stage: PhotoStage,
    pub filename: String,
    pub url: String,
    pub data: Option<Vec<u8>>,
}

fn format_timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|v| v.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default()
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

/// Scale (w, h) to fit inside the box, never upscaling
fn fit_within(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max_width / width).min(max_height / height).min(1.0);
    (width * scale, height * scale)
}

fn section_heading(canvas: &mut PdfCanvas, title: &str) {
    canvas.ensure_space(HEADING_SIZE * 3.0);
    canvas.y -= 10.0;
    canvas.fill_rect(MARGIN, canvas.y - 16.0, CONTENT_WIDTH, 16.0, 0.9);
    canvas.text(MARGIN + 4.0, canvas.y - 12.0, HEADING_SIZE, true, title);
    canvas.y -= 20.0;
}

/// Two-column "label: value" rows; long values wrap in the value column
fn field_rows(canvas: &mut PdfCanvas, rows: &[(&str, String)]) {
    let value_x = MARGIN + LABEL_WIDTH;
    let value_width = CONTENT_WIDTH - LABEL_WIDTH;

    for (label, value) in rows {
        canvas.ensure_space(BODY_SIZE * 1.3);
        canvas.text(MARGIN, canvas.y - BODY_SIZE, BODY_SIZE, true, label);
        canvas.paragraph(value_x, value_width, BODY_SIZE, false, or_dash(value));
        canvas.y -= 3.0;
        canvas.line(MARGIN, canvas.y, PAGE_WIDTH - MARGIN, canvas.y, 0.85);
    }
}

fn text_block(canvas: &mut PdfCanvas, title: &str, body: &str) {
    section_heading(canvas, title);
    canvas.paragraph(MARGIN, CONTENT_WIDTH, BODY_SIZE, false, or_dash(body));
}

fn header(canvas: &mut PdfCanvas, rnc: &Rnc, logo: Option<&PlacedImage>) {
    let top = canvas.y;
    let mut title_x = MARGIN;

    if let Some(logo) = logo {
        let (w, h) = fit_within(logo.width_px, logo.height_px, LOGO_MAX_WIDTH, LOGO_MAX_HEIGHT);
        canvas.draw_image(logo, MARGIN, top - h, w, h);
        title_x += w + 12.0;
    }

    canvas.text(
        title_x,
        top - TITLE_SIZE,
        TITLE_SIZE,
        true,
        "Relatório de Não Conformidade",
    );
    let number = format!("RNC {}", rnc.rnc_number);
    canvas.text(title_x, top - TITLE_SIZE - 18.0, 12.0, true, &number);

    let status = format!("Status: {}", rnc.status.label());
    let status_width = text_width(&status, 11.0, true);
    canvas.text(
        PAGE_WIDTH - MARGIN - status_width,
        top - TITLE_SIZE,
        11.0,
        true,
        &status,
    );

    canvas.y = top - LOGO_MAX_HEIGHT - 6.0;
    canvas.line(MARGIN, canvas.y, PAGE_WIDTH - MARGIN, canvas.y, 0.3);
}

fn photo_slot(canvas: &mut PdfCanvas, photo: &ReportPhoto, x: f32, top: f32, width: f32) {
    let image_height = PHOTO_SLOT_HEIGHT - CAPTION_HEIGHT;
    let image = match photo.data.clone().map(|bytes| canvas.embed_image(bytes)) {
        Some(Ok(image)) => Some(image),
        Some(Err(e)) => {
            warn!("Could not decode photo {}: {}", photo.url, e);
            None
        }
        None => None,
    };

    match image {
        Some(image) => {
            let (w, h) = fit_within(image.width_px, image.height_px, width, image_height);
            let x_offset = (width - w) / 2.0;
            canvas.draw_image(&image, x + x_offset, top - h, w, h);
            canvas.text(x, top - image_height - 10.0, 8.0, false, &photo.filename);
        }
        None => {
            canvas.stroke_rect(x, top - image_height, width, image_height, 0.6);
            canvas.text(
                x + 8.0,
                top - image_height / 2.0,
                10.0,
                true,
                UNAVAILABLE_CAPTION,
            );
            let mut caption_y = top - image_height / 2.0 - 14.0;
            for line in wrap_text(&photo.url, 7.0, false, width - 16.0).into_iter().take(4) {
                canvas.text(x + 8.0, caption_y, 7.0, false, &line);
                caption_y -= 9.0;
            }
        }
    }
}

fn photo_section(canvas: &mut PdfCanvas, stage: PhotoStage, photos: &[&ReportPhoto]) {
    if photos.is_empty() {
        return;
    }
    section_heading(canvas, &format!("Fotos - {}", stage.label()));

    let slot_width = (CONTENT_WIDTH - PHOTO_GAP) / 2.0;
    for pair in photos.chunks(2) {
        canvas.ensure_space(PHOTO_SLOT_HEIGHT + PHOTO_GAP);
        let top = canvas.y - 4.0;
        for (i, photo) in pair.iter().enumerate() {
            let x = MARGIN + i as f32 * (slot_width + PHOTO_GAP);
            photo_slot(canvas, photo, x, top, slot_width);
        }
        canvas.y = top - PHOTO_SLOT_HEIGHT - PHOTO_GAP;
    }
}

/// Lay out the full report for one RNC
pub fn render_rnc_report(
    rnc: &Rnc,
    photos: &[ReportPhoto],
    logo: Option<&Logo>,
) -> lopdf::Result<Vec<u8>> {
    let mut canvas = PdfCanvas::new();

    let logo = match logo.map(|l| canvas.embed_image(l.data.clone())).transpose() {
        Ok(placed) => placed,
        Err(e) => {
            warn!("Ignoring logo that could not be decoded: {}", e);
            None
        }
    };
    header(&mut canvas, rnc, logo.as_ref());

    section_heading(&mut canvas, "Identificação");
    field_rows(
        &mut canvas,
        &[
            (
                "Data da inspeção",
                rnc.inspection_date
                    .map(|d| d.format("%d/%m/%Y").to_string())
                    .unwrap_or_default(),
            ),
            ("Emitente", rnc.issuer.clone()),
            ("Área", rnc.area.clone()),
            ("PEP", rnc.pep.clone()),
            ("Título", rnc.title.clone()),
            ("Responsável", rnc.responsible.clone()),
            ("Documentos de referência", rnc.reference_docs.clone()),
            ("Causador", rnc.cause.clone()),
            ("Processo envolvido", rnc.process.clone()),
            ("Origem", rnc.origin.clone()),
            ("Severidade", rnc.severity.clone()),
            ("Categoria", rnc.category.clone()),
            ("Responsável pela ação", rnc.action_responsible.clone()),
            ("Aberta em", format_timestamp(Some(rnc.created_at))),
        ],
    );

    text_block(&mut canvas, "Descrição", &rnc.description);
    text_block(&mut canvas, "Ações", &rnc.actions);

    if rnc.closed_at.is_some() {
        section_heading(&mut canvas, "Encerramento");
        field_rows(
            &mut canvas,
            &[
                ("Encerrada em", format_timestamp(rnc.closed_at)),
                ("Encerrada por", rnc.closed_by.clone().unwrap_or_default()),
                ("Eficácia", rnc.effectiveness.clone().unwrap_or_default()),
                ("Observações", rnc.closing_notes.clone().unwrap_or_default()),
                (
                    "Descrição",
                    rnc.closing_description.clone().unwrap_or_default(),
                ),
            ],
        );
    }

    if rnc.reopened_at.is_some() {
        section_heading(&mut canvas, "Reabertura");
        field_rows(
            &mut canvas,
            &[
                ("Reaberta em", format_timestamp(rnc.reopened_at)),
                ("Reaberta por", rnc.reopened_by.clone().unwrap_or_default()),
                ("Motivo", rnc.reopening_reason.clone().unwrap_or_default()),
                (
                    "Descrição",
                    rnc.reopening_description.clone().unwrap_or_default(),
                ),
            ],
        );
    }

    if rnc.cancelled_at.is_some() {
        section_heading(&mut canvas, "Cancelamento");
        field_rows(
            &mut canvas,
            &[
                ("Cancelada em", format_timestamp(rnc.cancelled_at)),
                ("Cancelada por", rnc.cancelled_by.clone().unwrap_or_default()),
                (
                    "Motivo",
                    rnc.cancellation_reason.clone().unwrap_or_default(),
                ),
            ],
        );
    }

    for stage in [PhotoStage::Opening, PhotoStage::Closing, PhotoStage::Reopening] {
        let staged: Vec<&ReportPhoto> = photos.iter().filter(|p| p.stage == stage).collect();
        photo_section(&mut canvas, stage, &staged);
    }

    canvas.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{png_bytes, sample_rnc};
    use chrono::Utc;
    use lopdf::Document;

    fn report_photo(stage: PhotoStage, data: Option<Vec<u8>>) -> ReportPhoto {
        ReportPhoto {
            stage,
            filename: "foto.png".to_string(),
            url: "https://storage.example.com/rnc-fotos/2025-001/abertura/a.png".to_string(),
            data,
        }
    }

    #[test]
    fn test_fit_within_never_upscales() {
        assert_eq!(fit_within(4.0, 2.0, 100.0, 100.0), (4.0, 2.0));
        assert_eq!(fit_within(400.0, 200.0, 100.0, 100.0), (100.0, 50.0));
        assert_eq!(fit_within(100.0, 400.0, 100.0, 100.0), (25.0, 100.0));
        assert_eq!(fit_within(0.0, 10.0, 100.0, 100.0), (0.0, 0.0));
    }

    #[test]
    fn test_report_with_photos_and_missing_photo() {
        let mut rnc = sample_rnc("2025-001");
        rnc.closed_at = Some(Utc::now());
        rnc.closed_by = Some("Qualidade".to_string());

        let photos = vec![
            report_photo(PhotoStage::Opening, Some(png_bytes())),
            report_photo(PhotoStage::Opening, None),
            report_photo(PhotoStage::Closing, Some(b"corrupted".to_vec())),
        ];

        let bytes = render_rnc_report(&rnc, &photos, None).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(!doc.get_pages().is_empty());
    }

    #[test]
    fn test_report_with_logo_and_bad_logo() {
        let rnc = sample_rnc("2025-002");
        let logo = Logo {
            content_type: "image/png".to_string(),
            data: png_bytes(),
        };
        assert!(render_rnc_report(&rnc, &[], Some(&logo)).is_ok());

        let broken = Logo {
            content_type: "image/png".to_string(),
            data: vec![0x89, b'P', b'N', b'G'],
        };
        assert!(render_rnc_report(&rnc, &[], Some(&broken)).is_ok());
    }

    #[test]
    fn test_long_description_spills_onto_more_pages() {
        let mut rnc = sample_rnc("2025-003");
        rnc.description = "Trinca no cordão de solda. ".repeat(600);

        let bytes = render_rnc_report(&rnc, &[], None).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }
}
