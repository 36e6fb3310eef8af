//! Minimal page-oriented PDF writer on top of lopdf
//!
//! Coordinates are PDF points with the origin at the bottom-left corner.
//! Text uses the built-in Helvetica faces with WinAnsi encoding.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 40.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Map text to WinAnsi bytes; unmappable characters become `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| match c {
            '\t' => b' ',
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            c if (' '..='~').contains(&c) => c as u8,
            c if ('\u{A0}'..='\u{FF}').contains(&c) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn char_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_WIDTHS[(c as usize) - 32],
        'à'..='å' | 'è'..='ë' | 'ò'..='ö' | 'ù'..='ü' | 'ñ' => 556,
        'ç' | 'ì'..='ï' => 500,
        'À'..='Å' | 'È'..='Ë' => 667,
        'Ç' | 'Ù'..='Ü' => 722,
        'Ò'..='Ö' => 778,
        'Ì'..='Ï' => 278,
        _ => 556,
    }
}

/// Rendered width of `text` in points
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c) as u32).sum();
    let width = units as f32 * size / 1000.0;
    if bold {
        width * 1.05
    } else {
        width
    }
}

/// Greedy word wrap; words longer than a line are split by character
pub fn wrap_text(text: &str, size: f32, bold: bool, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };

            if text_width(&candidate, size, bold) <= max_width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }

            if text_width(word, size, bold) <= max_width {
                line = word.to_string();
            } else {
                for c in word.chars() {
                    line.push(c);
                    if text_width(&line, size, bold) > max_width {
                        line.pop();
                        lines.push(std::mem::take(&mut line));
                        line.push(c);
                    }
                }
            }
        }

        lines.push(line);
    }

    lines
}

/// Image registered in the document, ready to be drawn
#[derive(Debug, Clone)]
pub struct PlacedImage {
    name: String,
    id: ObjectId,
    pub width_px: f32,
    pub height_px: f32,
}

#[derive(Default)]
struct Page {
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
}

/// Accumulates pages and a vertical cursor for flowing layout
pub struct PdfCanvas {
    doc: Document,
    pages: Vec<Page>,
    image_count: usize,
    /// Current baseline cursor on the last page
    pub y: f32,
}

impl Default for PdfCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfCanvas {
    pub fn new() -> Self {
        let mut canvas = Self {
            doc: Document::with_version("1.5"),
            pages: Vec::new(),
            image_count: 0,
            y: PAGE_HEIGHT - MARGIN,
        };
        canvas.new_page();
        canvas
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Start a new page unless `height` still fits above the bottom margin
    pub fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last].operations
    }

    pub fn text(&mut self, x: f32, y: f32, size: f32, bold: bool, text: &str) {
        let font = if bold { BOLD_FONT } else { REGULAR_FONT };
        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
        ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    /// Write wrapped text at the cursor, breaking pages as needed
    pub fn paragraph(&mut self, x: f32, width: f32, size: f32, bold: bool, text: &str) {
        let leading = size * 1.3;
        for line in wrap_text(text, size, bold, width) {
            self.ensure_space(leading);
            self.y -= leading;
            self.text(x, self.y + size * 0.3, size, bold, &line);
        }
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, gray: f32) {
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("G", vec![gray.into()]));
        ops.push(Operation::new("w", vec![0.5_f32.into()]));
        ops.push(Operation::new("m", vec![x1.into(), y1.into()]));
        ops.push(Operation::new("l", vec![x2.into(), y2.into()]));
        ops.push(Operation::new("S", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gray: f32) {
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("g", vec![gray.into()]));
        ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        ops.push(Operation::new("f", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gray: f32) {
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("G", vec![gray.into()]));
        ops.push(Operation::new("w", vec![0.75_f32.into()]));
        ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        ops.push(Operation::new("S", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    /// Decode and embed a raster image (PNG, JPEG)
    pub fn embed_image(&mut self, bytes: Vec<u8>) -> lopdf::Result<PlacedImage> {
        let stream = lopdf::xobject::image_from(bytes)?;
        let width_px = stream.dict.get(b"Width").and_then(Object::as_i64)? as f32;
        let height_px = stream.dict.get(b"Height").and_then(Object::as_i64)? as f32;

        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        let id = self.doc.add_object(stream);

        Ok(PlacedImage {
            name,
            id,
            width_px,
            height_px,
        })
    }

    /// Draw an embedded image with its bottom-left corner at (x, y)
    pub fn draw_image(&mut self, image: &PlacedImage, x: f32, y: f32, width: f32, height: f32) {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        let page = &mut self.pages[last];
        if !page.images.iter().any(|(name, _)| *name == image.name) {
            page.images.push((image.name.clone(), image.id));
        }

        page.operations.push(Operation::new("q", vec![]));
        page.operations.push(Operation::new(
            "cm",
            vec![
                width.into(),
                0_i64.into(),
                0_i64.into(),
                height.into(),
                x.into(),
                y.into(),
            ],
        ));
        page.operations
            .push(Operation::new("Do", vec![Object::Name(image.name.clone().into_bytes())]));
        page.operations.push(Operation::new("Q", vec![]));
    }

    /// Assemble the page tree and serialize the document
    pub fn finish(mut self) -> lopdf::Result<Vec<u8>> {
        let pages_id = self.doc.new_object_id();
        let regular_id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for page in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: page.operations,
            };
            let content_id = self
                .doc
                .add_object(Stream::new(dictionary! {}, content.encode()?));

            let mut xobjects = lopdf::Dictionary::new();
            for (name, id) in page.images {
                xobjects.set(name.into_bytes(), id);
            }

            let resources = dictionary! {
                "Font" => dictionary! {
                    REGULAR_FONT => regular_id,
                    BOLD_FONT => bold_id,
                },
                "XObject" => xobjects,
            };

            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0_i64.into(), 0_i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::png_bytes;

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Ação"), vec![b'A', 0xE7, 0xE3, b'o']);
        assert_eq!(encode_win_ansi("a – b"), vec![b'a', b' ', 0x96, b' ', b'b']);
        assert_eq!(encode_win_ansi("日"), vec![b'?']);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "Solda com trinca longitudinal no cordão de acabamento da viga principal";
        let lines = wrap_text(text, 10.0, false, 150.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 10.0, false) <= 150.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_keeps_blank_lines_and_splits_long_words() {
        let lines = wrap_text("a\n\nb", 10.0, false, 100.0);
        assert_eq!(lines, vec!["a", "", "b"]);

        let long = "x".repeat(200);
        let lines = wrap_text(&long, 10.0, false, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), long);
    }

    #[test]
    fn test_finish_produces_loadable_pdf() {
        let mut canvas = PdfCanvas::new();
        canvas.text(MARGIN, 800.0, 12.0, true, "Relatório");
        let image = canvas.embed_image(png_bytes()).unwrap();
        assert_eq!((image.width_px, image.height_px), (4.0, 2.0));
        canvas.draw_image(&image, MARGIN, 600.0, 40.0, 20.0);
        canvas.new_page();
        canvas.text(MARGIN, 800.0, 10.0, false, "segunda página");

        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_embed_rejects_garbage() {
        let mut canvas = PdfCanvas::new();
        assert!(canvas.embed_image(b"not an image".to_vec()).is_err());
    }
}
