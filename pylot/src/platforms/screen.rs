use super::Recognizer;
use crate::errors::PilotError;
use crate::types::{BBox, RecognizedWord, Region};
use image::{DynamicImage, GrayImage, RgbaImage};
use tracing::{debug, instrument};
use uni_ocr::{OcrEngine, OcrProvider};

// Blank rows tolerated inside one text line (descenders, thin glyphs).
const MAX_ROW_GAP: u32 = 1;
// Runs of lit rows shorter than this are noise, not text.
const MIN_LINE_HEIGHT: u32 = 3;
// Margin kept around each line so OCR sees whole glyphs.
const LINE_PADDING: u32 = 2;

/// Reads text from the primary monitor: capture, threshold, OCR.
pub struct ScreenRecognizer {
    threshold: u8,
}

impl ScreenRecognizer {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    async fn capture_filtered(&self, region: Region) -> Result<GrayImage, PilotError> {
        let image = tokio::task::spawn_blocking(move || capture_region(region))
            .await
            .map_err(|e| PilotError::Capture(format!("Task join error: {e}")))??;
        Ok(threshold_filter(&image, self.threshold))
    }
}

#[async_trait::async_trait]
impl Recognizer for ScreenRecognizer {
    #[instrument(level = "debug", skip(self))]
    async fn read_words(&self, region: Region) -> Result<Vec<RecognizedWord>, PilotError> {
        let filtered = self.capture_filtered(region).await?;
        let lines = segment_lines(&filtered);
        debug!(lines = lines.len(), "Segmented text lines");

        let mut words = Vec::new();
        for line in lines {
            let crop = image::imageops::crop_imm(
                &filtered,
                line.x as u32,
                line.y as u32,
                line.width,
                line.height,
            )
            .to_image();
            let text = ocr(&DynamicImage::ImageLuma8(crop)).await?;
            words.extend(split_words(&text, line));
        }
        Ok(words)
    }

    #[instrument(level = "debug", skip(self))]
    async fn read_text(&self, region: Region) -> Result<String, PilotError> {
        let filtered = self.capture_filtered(region).await?;
        ocr(&DynamicImage::ImageLuma8(filtered)).await
    }
}

async fn ocr(image: &DynamicImage) -> Result<String, PilotError> {
    let engine = OcrEngine::new(OcrProvider::Auto)
        .map_err(|e| PilotError::Recognition(format!("Failed to create OCR engine: {e}")))?;

    let (text, _language, _confidence) = engine
        .recognize_image(image)
        .await
        .map_err(|e| PilotError::Recognition(format!("OCR recognition failed: {e}")))?;

    Ok(text)
}

/// Capture `region` from the primary monitor.
///
/// Region coordinates are relative to the primary monitor's origin.
fn capture_region(region: Region) -> Result<RgbaImage, PilotError> {
    let monitors = xcap::Monitor::all()
        .map_err(|e| PilotError::Capture(format!("Failed to get monitors: {e}")))?;

    let mut primary_monitor: Option<xcap::Monitor> = None;
    for monitor in monitors {
        match monitor.is_primary() {
            Ok(true) => {
                primary_monitor = Some(monitor);
                break;
            }
            Ok(false) => continue,
            Err(e) => {
                return Err(PilotError::Capture(format!(
                    "Error checking monitor primary status: {e}"
                )));
            }
        }
    }
    let primary_monitor = primary_monitor
        .ok_or_else(|| PilotError::Capture("Could not find primary monitor".to_string()))?;

    let image = primary_monitor
        .capture_image()
        .map_err(|e| PilotError::Capture(format!("Failed to capture screen: {e}")))?;

    crop_to_region(&image, region)
}

fn crop_to_region(image: &RgbaImage, region: Region) -> Result<RgbaImage, PilotError> {
    let (width, height) = image.dimensions();
    let x = region.x.max(0) as u32;
    let y = region.y.max(0) as u32;
    if x >= width || y >= height {
        return Err(PilotError::Capture(format!(
            "Region {region} lies outside the {width}x{height} screen"
        )));
    }
    let w = region.width.min(width - x);
    let h = region.height.min(height - y);
    Ok(image::imageops::crop_imm(image, x, y, w, h).to_image())
}

/// Grayscale `image` and blank every pixel not brighter than `threshold`.
///
/// Overview and scanner text is bright on a dark background; this drops the
/// background texture before OCR.
pub fn threshold_filter(image: &RgbaImage, threshold: u8) -> GrayImage {
    let mut gray = image::imageops::grayscale(image);
    for pixel in gray.pixels_mut() {
        if pixel[0] <= threshold {
            pixel[0] = 0;
        }
    }
    gray
}

/// Split a thresholded image into horizontal text lines.
pub fn segment_lines(image: &GrayImage) -> Vec<BBox> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let row_lit = |y: u32| (0..width).any(|x| image.get_pixel(x, y)[0] > 0);

    let mut runs: Vec<(u32, u32)> = Vec::new();
    let mut current: Option<(u32, u32)> = None;
    for y in 0..height {
        if row_lit(y) {
            current = match current {
                Some((start, _)) => Some((start, y)),
                None => Some((y, y)),
            };
        } else if let Some((start, end)) = current {
            if y - end > MAX_ROW_GAP {
                runs.push((start, end));
                current = None;
            }
        }
    }
    runs.extend(current);

    runs.into_iter()
        .filter(|(start, end)| end - start + 1 >= MIN_LINE_HEIGHT)
        .filter_map(|(start, end)| {
            let lit_columns = (0..width)
                .filter(|&x| (start..=end).any(|y| image.get_pixel(x, y)[0] > 0));
            let (min_x, max_x) = lit_columns.fold(None, |acc, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })?;

            let x0 = min_x.saturating_sub(LINE_PADDING);
            let y0 = start.saturating_sub(LINE_PADDING);
            let x1 = (max_x + LINE_PADDING).min(width - 1);
            let y1 = (end + LINE_PADDING).min(height - 1);
            Some(BBox::new(x0 as i32, y0 as i32, x1 - x0 + 1, y1 - y0 + 1))
        })
        .collect()
}

/// Split one recognized line into words.
///
/// OCR only reports the line, so each word's box is estimated from its
/// character offset within the line.
pub fn split_words(text: &str, line: BBox) -> Vec<RecognizedWord> {
    let chars: Vec<char> = text.trim().chars().collect();
    let total = chars.len() as u64;
    let mut words = Vec::new();

    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }

        let width = line.width as u64;
        let x = line.x + (width * start as u64 / total) as i32;
        let word_width = (width * (i - start) as u64 / total).max(1) as u32;
        words.push(RecognizedWord::new(
            chars[start..i].iter().collect::<String>(),
            BBox::new(x, line.y, word_width, line.height),
        ));
    }
    words
}
