//! Single-page PDF 1.4 writer: base-14 Helvetica text, line boxes and an optional
//! full-page JPEG background.

use std::fmt::Write as _;

use crate::certificate::jpeg::JpegImage;

/// Landscape A4 in points.
pub const PAGE_WIDTH: f32 = 842.0;
pub const PAGE_HEIGHT: f32 = 595.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }

    fn base_font(&self) -> &'static str {
        match self {
            Self::Regular => "Helvetica",
            Self::Bold => "Helvetica-Bold",
        }
    }
}

/// Approximate advance width in 1/1000 em, close to the Helvetica AFM metrics.
fn glyph_width(c: char, font: Font) -> u32 {
    let base = match c {
        ' ' | '.' | ',' | ':' | ';' | '!' | 'i' | 'j' | 'l' | '\'' | '|' => 278,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | '/' => 333,
        'm' | 'M' => 833,
        'w' => 722,
        'W' => 944,
        'A'..='Z' => 667,
        _ => 556,
    };
    match font {
        Font::Regular => base,
        Font::Bold => base + base / 20,
    }
}

pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c, font)).sum();
    units as f32 * size / 1000.0
}

/// WinAnsi byte for the typographic characters Windows-1252 places in `0x80..=0x9F`.
fn winansi_extra(c: char) -> Option<u8> {
    let byte = match c {
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        _ => return None,
    };
    Some(byte)
}

/// Encodes `text` as the body of a PDF literal string using WinAnsi code points.
///
/// Characters outside ASCII that WinAnsi can show become octal escapes, anything else
/// becomes `?`.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => match winansi_extra(c) {
                Some(byte) => {
                    let _ = write!(out, "\\{:03o}", byte);
                }
                None => out.push('?'),
            },
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct PageBuilder {
    ops: String,
    background: Option<JpegImage>,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(mut self, image: JpegImage) -> Self {
        self.background = Some(image);
        self
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    pub fn text(&mut self, font: Font, size: f32, x: f32, y: f32, text: &str) -> &mut Self {
        let _ = writeln!(
            self.ops,
            "BT /{} {:.1} Tf {:.2} {:.2} Td ({}) Tj ET",
            font.resource(),
            size,
            x,
            y,
            escape_text(text)
        );
        self
    }

    pub fn centered_text(&mut self, font: Font, size: f32, y: f32, text: &str) -> &mut Self {
        let x = ((PAGE_WIDTH - text_width(text, font, size)) / 2.0).max(0.0);
        self.text(font, size, x, y, text)
    }

    /// Stroked rectangle.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, line_width: f32) -> &mut Self {
        let _ = writeln!(
            self.ops,
            "{:.2} w {:.2} {:.2} {:.2} {:.2} re S",
            line_width, x, y, width, height
        );
        self
    }

    pub fn gray(&mut self, level: f32) -> &mut Self {
        let level = level.clamp(0.0, 1.0);
        let _ = writeln!(self.ops, "{:.2} g {:.2} G", level, level);
        self
    }

    fn content_stream(&self) -> String {
        let mut content = String::new();
        if self.background.is_some() {
            let _ = writeln!(
                content,
                "q {:.0} 0 0 {:.0} 0 0 cm /Im1 Do Q",
                PAGE_WIDTH, PAGE_HEIGHT
            );
        }
        content.push_str(&self.ops);
        content
    }

    pub fn finish(self) -> Vec<u8> {
        let mut objects: Vec<Vec<u8>> = Vec::with_capacity(7);
        objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
        objects.push(b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec());

        let xobject = if self.background.is_some() {
            " /XObject << /Im1 7 0 R >>"
        } else {
            ""
        };
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.0} {:.0}] \
                 /Resources << /Font << /F1 4 0 R /F2 5 0 R >>{} >> /Contents 6 0 R >>",
                PAGE_WIDTH, PAGE_HEIGHT, xobject
            )
            .into_bytes(),
        );

        for font in [Font::Regular, Font::Bold] {
            objects.push(
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.base_font()
                )
                .into_bytes(),
            );
        }

        let content = self.content_stream();
        objects.push(stream_object(
            &format!("<< /Length {} >>", content.len()),
            content.as_bytes(),
        ));

        if let Some(image) = &self.background {
            let info = image.info();
            let mut dict = format!(
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /{} \
                 /BitsPerComponent 8 /Filter /DCTDecode /Length {}",
                info.width,
                info.height,
                info.color_space(),
                image.data().len()
            );
            // Adobe CMYK JPEGs are stored inverted
            if info.components == 4 {
                dict.push_str(" /Decode [1 0 1 0 1 0 1 0]");
            }
            dict.push_str(" >>");
            objects.push(stream_object(&dict, image.data()));
        }

        assemble(&objects)
    }
}

fn stream_object(dict: &str, data: &[u8]) -> Vec<u8> {
    let mut object = Vec::with_capacity(dict.len() + data.len() + 32);
    object.extend_from_slice(dict.as_bytes());
    object.extend_from_slice(b"\nstream\n");
    object.extend_from_slice(data);
    object.extend_from_slice(b"\nendstream");
    object
}

/// Lays out numbered objects, the cross-reference table and the trailer.
fn assemble(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(object);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_at = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in &offsets {
        let _ = writeln!(xref, "{:010} 00000 n ", offset);
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    );
    out.extend_from_slice(xref.as_bytes());
    out
}
