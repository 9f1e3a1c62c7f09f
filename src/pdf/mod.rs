//! # PDF Serializer
//!
//! Takes the laid-out pages and writes a PDF 1.7 file byte by byte.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, pages, content streams
//! ...
//! xref                <- byte offsets of each object
//! trailer             <- root and info references
//! %%EOF
//! ```
//!
//! Only the standard Type1 fonts are used, so nothing is embedded. Text is
//! encoded as WinAnsi; characters outside it print as `?`.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::InvoicerError;
use crate::font::{FontContext, StandardFont};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage};
use crate::model::Metadata;

const PRODUCER: &str = concat!("Invoicer ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfWriter {
    fonts: FontContext,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font resources in `/F{index}` order.
    font_objects: Vec<(StandardFont, usize)>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(&self, pages: &[LayoutPage], metadata: &Metadata) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
        };

        // 0 = placeholder (objects are 1-indexed), 1 = Catalog, 2 = Pages
        for _ in 0..3 {
            builder.objects.push(PdfObject { data: vec![] });
        }

        self.register_fonts(&mut builder, pages);

        let mut page_obj_ids: Vec<usize> = Vec::new();
        let font_resources = Self::build_font_resource_dict(&builder.font_objects);

        for page in pages {
            let content = self.build_content_stream(page, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_obj_id = builder.objects.len();
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            builder.objects.push(PdfObject { data: content_data });

            let page_obj_id = builder.objects.len();
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >> >> >>",
                page.width, page.height, content_obj_id, font_resources
            );
            builder.objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
            page_obj_ids.push(page_obj_id);
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = builder.objects.len();
        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::encode_text(title));
        }
        if let Some(ref author) = metadata.author {
            let _ = write!(info, "/Author ({}) ", Self::encode_text(author));
        }
        if let Some(ref subject) = metadata.subject {
            let _ = write!(info, "/Subject ({}) ", Self::encode_text(subject));
        }
        let _ = write!(info, "/Producer ({}) /Creator (Invoicer) >>", PRODUCER);
        builder.objects.push(PdfObject {
            data: info.into_bytes(),
        });

        self.serialize(&builder, info_obj_id)
    }

    /// Write laid-out pages to any byte sink.
    pub fn write_to<W: IoWrite>(
        &self,
        pages: &[LayoutPage],
        metadata: &Metadata,
        out: &mut W,
    ) -> Result<(), InvoicerError> {
        out.write_all(&self.write(pages, metadata))?;
        out.flush()?;
        Ok(())
    }

    /// Register each standard font used on any page, in first-use order.
    /// There is always at least one font so every page has a resource.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        let mut used: Vec<StandardFont> = Vec::new();
        for element in pages.iter().flat_map(|p| p.elements.iter()) {
            if let DrawCommand::Text { font, .. } = &element.draw {
                let std_font = self.fonts.resolve(font);
                if !used.contains(&std_font) {
                    used.push(std_font);
                }
            }
        }
        if used.is_empty() {
            used.push(StandardFont::Helvetica);
        }

        for std_font in used {
            let obj_id = builder.objects.len();
            let font_dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                 /Encoding /WinAnsiEncoding >>",
                std_font.pdf_name()
            );
            builder.objects.push(PdfObject {
                data: font_dict.into_bytes(),
            });
            builder.font_objects.push((std_font, obj_id));
        }
    }

    fn build_font_resource_dict(font_objects: &[(StandardFont, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn font_index(font: StandardFont, font_objects: &[(StandardFont, usize)]) -> usize {
        font_objects
            .iter()
            .position(|(f, _)| *f == font)
            .unwrap_or(0)
    }

    /// Build the content stream for a single page.
    fn build_content_stream(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height, builder);
        }
        stream
    }

    /// Write a single layout element as PDF operators. Layout y runs down
    /// from the top of the page; PDF y runs up from the bottom.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
    ) {
        let pdf_y = page_height - element.y;
        match &element.draw {
            DrawCommand::Text {
                text,
                font,
                font_size,
                word_spacing,
            } => {
                let idx = Self::font_index(self.fonts.resolve(font), &builder.font_objects);
                let _ = write!(stream, "BT\n0 0 0 rg\n/F{} {:.1} Tf\n", idx, font_size);
                if *word_spacing != 0.0 {
                    let _ = write!(stream, "{:.3} Tw\n", word_spacing);
                }
                let _ = write!(
                    stream,
                    "{:.2} {:.2} Td\n({}) Tj\n",
                    element.x,
                    pdf_y,
                    Self::encode_text(text.trim_end_matches(' '))
                );
                if *word_spacing != 0.0 {
                    stream.push_str("0 Tw\n");
                }
                stream.push_str("ET\n");
            }
            DrawCommand::Line { thickness } => {
                let _ = write!(
                    stream,
                    "q\n0 0 0 RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    thickness,
                    element.x,
                    pdf_y,
                    element.x + element.width,
                    pdf_y
                );
            }
        }
    }

    /// Encode text as the body of a PDF literal string: WinAnsi bytes, with
    /// `\ ( )` escaped and anything outside printable ASCII as an octal escape.
    fn encode_text(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// holds smart quotes, bullets, dashes and the euro sign.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80),
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85),
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89),
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91),
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95),
            0x2013 => Some(0x96),
            0x2014 => Some(0x97),
            0x02DC => Some(0x98),
            0x2122 => Some(0x99),
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}
