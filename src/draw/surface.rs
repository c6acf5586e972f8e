use crate::draw::model::Color;
use crate::errors::OverlayError;
use anyhow::{Context, Result};
use base64::Engine as _;
use std::io::Cursor;

const DATA_URL_PNG_PREFIX: &str = "data:image/png;base64,";

/// Full-viewport RGBA raster the drawing engine paints on. Holds at most one
/// pixel snapshot, used by shape tools to restore the pre-preview state on
/// every pointer move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    snapshot: Option<Vec<u8>>,
}

impl RasterSurface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize).saturating_mul(height as usize).saturating_mul(4);
        Self {
            width,
            height,
            pixels: vec![0u8; len],
            snapshot: None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = ((y * self.width + x) * 4) as usize;
        Color::rgba(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.snapshot = None;
    }

    /// Capture the current pixels for later `restore` calls. Replaces any
    /// previous snapshot.
    pub fn snapshot(&mut self) {
        self.snapshot = Some(self.pixels.clone());
    }

    /// Restore the captured pixels, keeping the snapshot for the next
    /// restore. Returns false when no snapshot was taken.
    pub fn restore(&mut self) -> bool {
        match &self.snapshot {
            Some(saved) => {
                self.pixels.copy_from_slice(saved);
                true
            }
            None => false,
        }
    }

    pub fn discard_snapshot(&mut self) {
        self.snapshot = None;
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .context("raster buffer does not match its dimensions")?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .context("encode raster surface as png")?;
        Ok(out.into_inner())
    }

    pub fn to_data_url(&self) -> Result<String> {
        let png = self.to_png_bytes()?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        Ok(format!("{DATA_URL_PNG_PREFIX}{encoded}"))
    }
}

/// Decode a `data:image/png;base64,` URL back into PNG bytes. Corrupt input
/// is a `MalformedData` error so the caller can abort only the attach step.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, OverlayError> {
    let payload = data_url
        .strip_prefix(DATA_URL_PNG_PREFIX)
        .ok_or_else(|| OverlayError::MalformedData("missing image/png data URL prefix".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| OverlayError::MalformedData(format!("invalid base64 payload: {e}")))?;
    image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .map_err(|e| OverlayError::MalformedData(format!("invalid png payload: {e}")))?;
    Ok(bytes)
}
