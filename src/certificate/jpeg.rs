//! Just enough JPEG parsing to embed a baseline or progressive image as a PDF `DCTDecode`
//! stream: frame dimensions and component count.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum JpegError {
    #[error("missing SOI marker")]
    NotJpeg,
    #[error("truncated segment at byte {0}")]
    Truncated(usize),
    #[error("no frame header before scan data")]
    NoFrame,
    #[error("unsupported component count: {0}")]
    UnsupportedComponents(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u16,
    pub height: u16,
    pub components: u8,
}

impl JpegInfo {
    pub fn color_space(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }
}

/// A decoded-enough template ready for embedding.
#[derive(Debug, Clone)]
pub struct JpegImage {
    info: JpegInfo,
    data: Vec<u8>,
}

impl JpegImage {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, JpegError> {
        let info = read_header(&data)?;
        Ok(Self { info, data })
    }

    pub fn info(&self) -> JpegInfo {
        self.info
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn is_frame_marker(marker: u8) -> bool {
    matches!(
        marker,
        0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF
    )
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16, JpegError> {
    match bytes.get(at..at + 2) {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => Err(JpegError::Truncated(at)),
    }
}

/// Walks the marker segments up to the first frame header.
pub fn read_header(bytes: &[u8]) -> Result<JpegInfo, JpegError> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return Err(JpegError::NotJpeg);
    }

    let mut pos = 2;
    loop {
        while bytes.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let marker = *bytes.get(pos).ok_or(JpegError::Truncated(pos))?;
        pos += 1;

        match marker {
            // standalone markers carry no length
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return Err(JpegError::NoFrame),
            _ => {}
        }

        let length = read_u16(bytes, pos)? as usize;
        if length < 2 || pos + length > bytes.len() {
            return Err(JpegError::Truncated(pos));
        }

        if is_frame_marker(marker) {
            if length < 8 {
                return Err(JpegError::Truncated(pos));
            }
            let height = read_u16(bytes, pos + 3)?;
            let width = read_u16(bytes, pos + 5)?;
            let components = bytes[pos + 7];
            if !matches!(components, 1 | 3 | 4) {
                return Err(JpegError::UnsupportedComponents(components));
            }
            return Ok(JpegInfo {
                width,
                height,
                components,
            });
        }

        pos += length;
    }
}
