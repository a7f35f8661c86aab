use crate::config::ExportConfig;
use crate::errors::ShareError;
use crate::export::preload::ImageCache;
use crate::render::{escape_html, RenderedCard, RenderedList};
use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use resvg::usvg::fontdb::Database;
use resvg::{tiny_skia, usvg};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, trace};
use unicode_width::UnicodeWidthChar;

const PADDING: u32 = 16;
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

const TEXT_INSET: u32 = 8;
const HEADER_HEIGHT: u32 = 36;
const TITLE_BASELINE: u32 = 24;
const INFO_BASELINE: u32 = 58;
const STORY_TOP: u32 = 84;
const LINE_HEIGHT: u32 = 18;
const TITLE_FONT: u32 = 18;
const BODY_FONT: u32 = 13;
/// Approximate advance of one narrow column at the body size; wide
/// characters take two.
const COLUMN_WIDTH: u32 = 7;

const PREFERRED_FAMILIES: &[&str] = &[
    "Noto Sans CJK TC",
    "Noto Sans TC",
    "Microsoft JhengHei",
    "PingFang TC",
    "Noto Sans",
    "DejaVu Sans",
    "Liberation Sans",
    "Arial",
];

#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    pub scale: u32,
    /// Full scrollable size of the region in logical pixels.
    pub width: u32,
    pub height: u32,
    pub card_size: u32,
    pub use_cors: bool,
    pub background: Rgba<u8>,
    /// Accept images whose pixels may not be readable back.
    pub allow_taint: bool,
}

impl RasterOptions {
    pub fn for_region(region: &RenderedList, config: &ExportConfig) -> Self {
        let (width, height) = region_size(region.cards.len(), config.card_size);
        RasterOptions {
            scale: config.scale(),
            width,
            height,
            card_size: config.card_size,
            use_cors: true,
            background: WHITE,
            allow_taint: true,
        }
    }
}

/// Each card is one row: a square image box beside a text column of the same width.
pub fn region_size(cards: usize, card_size: u32) -> (u32, u32) {
    let rows = u32::try_from(cards).unwrap_or(u32::MAX);
    let width = card_size.saturating_mul(2).saturating_add(PADDING * 3);
    let height = rows
        .saturating_mul(card_size.saturating_add(PADDING))
        .saturating_add(PADDING);
    (width, height)
}

/// Left edge of a card's text column in logical pixels.
pub fn text_column_x(card_size: u32) -> u32 {
    PADDING * 2 + card_size
}

/// Top edge of the card in `row` in logical pixels.
pub fn card_top(row: usize, card_size: u32) -> u32 {
    let row = u32::try_from(row).unwrap_or(u32::MAX);
    PADDING.saturating_add(row.saturating_mul(card_size.saturating_add(PADDING)))
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(
        &self,
        region: &RenderedList,
        images: &ImageCache,
        options: &RasterOptions,
    ) -> Result<RgbaImage, ShareError>;
}

/// Draws the card sheet (frames, titles, premiere info, story preview)
/// from SVG, then places each loaded cover into its image box. Cards
/// without a cover keep a blank box.
#[derive(Clone)]
pub struct CardSheetRasterizer {
    fontdb: Arc<Database>,
}

impl CardSheetRasterizer {
    pub fn new() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();

        let family = PREFERRED_FAMILIES
            .iter()
            .find(|wanted| {
                db.faces()
                    .any(|face| face.families.iter().any(|(name, _)| name.as_str() == **wanted))
            })
            .map(|name| name.to_string())
            .or_else(|| {
                db.faces()
                    .next()
                    .and_then(|face| face.families.first().map(|(name, _)| name.clone()))
            });
        match family {
            Some(family) => {
                debug!("Card text uses font family {}", family);
                db.set_sans_serif_family(family);
            }
            None => debug!("No system fonts found, card text will not be drawn"),
        }

        CardSheetRasterizer {
            fontdb: Arc::new(db),
        }
    }

    pub fn has_fonts(&self) -> bool {
        self.fontdb.faces().next().is_some()
    }
}

impl Default for CardSheetRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Rasterizer for CardSheetRasterizer {
    async fn rasterize(
        &self,
        region: &RenderedList,
        images: &ImageCache,
        options: &RasterOptions,
    ) -> Result<RgbaImage, ShareError> {
        if region.is_empty() {
            return Err(ShareError::RasterizeError("region has no cards".to_string()));
        }

        let scaled = |value: u32| {
            value
                .checked_mul(options.scale)
                .ok_or_else(|| ShareError::RasterizeError("region too large".to_string()))
        };
        let width = scaled(options.width)?;
        let height = scaled(options.height)?;
        let box_size = scaled(options.card_size)?;
        if width == 0 || height == 0 || box_size == 0 {
            return Err(ShareError::RasterizeError("region has zero size".to_string()));
        }
        debug!(
            "Rasterizing {} cards at {}x{} (scale {})",
            region.cards.len(),
            width,
            height,
            options.scale
        );

        let svg = card_sheet_svg(region, options);
        trace!("Card sheet SVG is {} bytes", svg.len());
        let mut usvg_options = usvg::Options::default();
        usvg_options.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(&svg, &usvg_options)
            .map_err(|e| ShareError::RasterizeError(e.to_string()))?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| ShareError::RasterizeError("cannot allocate canvas".to_string()))?;
        let scale = options.scale as f32;
        resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

        // the sheet starts with an opaque background, so premultiplied
        // pixels equal straight RGBA
        let mut canvas = RgbaImage::from_raw(width, height, pixmap.take())
            .ok_or_else(|| ShareError::RasterizeError("canvas size mismatch".to_string()))?;

        for (row, card) in region.cards.iter().enumerate() {
            let cover = match card.image_url.as_deref().and_then(|url| images.get(url.trim())) {
                Some(cover) => cover,
                None => {
                    trace!("No cover for {}, leaving box blank", card.name);
                    continue;
                }
            };

            let (cover_w, cover_h) = cover.dimensions();
            if cover_w == 0 || cover_h == 0 {
                continue;
            }
            let factor = f64::min(
                box_size as f64 / cover_w as f64,
                box_size as f64 / cover_h as f64,
            );
            let fit_w = ((cover_w as f64 * factor).round() as u32).clamp(1, box_size);
            let fit_h = ((cover_h as f64 * factor).round() as u32).clamp(1, box_size);
            let resized = imageops::resize(cover, fit_w, fit_h, FilterType::Triangle);

            let box_x = i64::from(PADDING * options.scale);
            let box_y = i64::from(card_top(row, options.card_size)) * i64::from(options.scale);
            let x = box_x + i64::from((box_size - fit_w) / 2);
            let y = box_y + i64::from((box_size - fit_h) / 2);
            imageops::overlay(&mut canvas, &resized, x, y);
        }

        Ok(canvas)
    }
}

fn card_sheet_svg(region: &RenderedList, options: &RasterOptions) -> String {
    let Rgba([r, g, b, _]) = options.background;
    let mut svg = String::new();
    // write! into a String cannot fail
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\
         <rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" fill=\"#{r:02x}{g:02x}{b:02x}\"/>",
        w = options.width,
        h = options.height,
    );
    for (row, card) in region.cards.iter().enumerate() {
        card_svg(&mut svg, card, card_top(row, options.card_size), options);
    }
    svg.push_str("</svg>");
    svg
}

fn card_svg(svg: &mut String, card: &RenderedCard, top: u32, options: &RasterOptions) {
    let size = options.card_size;
    let text_x = text_column_x(size);
    let inner = text_x + TEXT_INSET;
    let max_cols = (size.saturating_sub(TEXT_INSET * 2) / COLUMN_WIDTH) as usize;
    let title_cols = max_cols * BODY_FONT as usize / TITLE_FONT as usize;

    let _ = write!(
        svg,
        "<rect x=\"{fx}\" y=\"{fy}\" width=\"{fw}\" height=\"{fh}\" fill=\"none\" stroke=\"#d9d9d9\"/>\
         <rect x=\"{text_x}\" y=\"{top}\" width=\"{size}\" height=\"{HEADER_HEIGHT}\" fill=\"#f3f4f6\"/>\
         <g font-family=\"sans-serif\">\
         <text x=\"{inner}\" y=\"{ty}\" font-size=\"{TITLE_FONT}\" font-weight=\"bold\" fill=\"#222222\">{title}</text>\
         <text x=\"{inner}\" y=\"{iy}\" font-size=\"{BODY_FONT}\" fill=\"#555555\">{info}</text>",
        fx = PADDING / 2,
        fy = top - PADDING / 2,
        fw = options.width - PADDING,
        fh = size + PADDING,
        ty = top + TITLE_BASELINE,
        iy = top + INFO_BASELINE,
        title = escape_html(&first_line(&card.name, title_cols)),
        info = escape_html(&format!(
            "首播日期：{} 首播時間：{}",
            card.premiere_date, card.premiere_time
        )),
    );

    let max_lines = (size.saturating_sub(STORY_TOP) / LINE_HEIGHT) as usize;
    for (index, line) in wrap(&card.story_preview, max_cols)
        .into_iter()
        .take(max_lines)
        .enumerate()
    {
        let _ = write!(
            svg,
            "<text x=\"{inner}\" y=\"{y}\" font-size=\"{BODY_FONT}\" fill=\"#333333\">{line}</text>",
            y = top + STORY_TOP + index as u32 * LINE_HEIGHT,
            line = escape_html(&line),
        );
    }
    svg.push_str("</g>");
}

/// Breaks text into lines of at most `max_cols` display columns.
pub fn wrap(text: &str, max_cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut cols = 0;
    for c in text.chars() {
        let c = if c.is_whitespace() { ' ' } else { c };
        let width = c.width().unwrap_or(0);
        if cols + width > max_cols.max(1) && !line.is_empty() {
            lines.push(line.trim_end().to_string());
            line.clear();
            cols = 0;
            if c == ' ' {
                continue;
            }
        }
        line.push(c);
        cols += width;
    }
    if !line.trim().is_empty() {
        lines.push(line.trim_end().to_string());
    }
    lines
}

fn first_line(text: &str, max_cols: usize) -> String {
    let mut lines = wrap(text, max_cols);
    match lines.len() {
        0 => String::new(),
        1 => lines.remove(0),
        _ => format!("{}…", lines.remove(0)),
    }
}
