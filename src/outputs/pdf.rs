//! PDF rendering of the one-page report, the artifact that gets published.
//!
//! Rendering is split in two: [`layout`] places every text run, rule and the
//! logo on A4 pages in millimetres, and [`render_pdf`] only draws what the
//! layout produced. Text widths are estimated from the font size, so line
//! breaks are approximate but never run into the margins.
//!
//! ```text
//! [logo]                 Daily Investment Report
//!                                     19.08.2025
//! ──────────────────────────────────────────────
//! • headline 1
//! • headline 2
//!
//! Title
//! NZZ — 18.08.25 – Summary (Company A, Company B)
//! ──────────────────────────────────────────────
//! footer
//! ```

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use printpdf::image_crate::{self, DynamicImage, RgbImage};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rgb,
};
use tokio::fs;
use tracing::{info, instrument, warn};

use super::markdown::display_date;
use crate::config::DocumentConfig;
use crate::error::{ReportError, ReportResult};
use crate::models::{Report, ReportArticle};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_X: f32 = 17.0;
const MARGIN_TOP: f32 = 15.0;
const MARGIN_BOTTOM: f32 = 16.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

const LOGO_WIDTH: f32 = 50.0;
const BULLET_INDENT: f32 = 3.5;
const MAX_HEADLINES: usize = 5;
const IMAGE_DPI: f32 = 300.0;

const PT_TO_MM: f32 = 25.4 / 72.0;

const RULE_GRAY: (f32, f32, f32) = (0.902, 0.902, 0.902);
const LINK_BLUE: (f32, f32, f32) = (0.043, 0.357, 0.827);

/// Font size and line height in points.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TextStyle {
    size: f32,
    leading: f32,
    bold: bool,
}

const TITLE: TextStyle = TextStyle {
    size: 15.0,
    leading: 19.0,
    bold: true,
};
const ARTICLE_TITLE: TextStyle = TextStyle {
    size: 11.5,
    leading: 15.0,
    bold: true,
};
const BODY: TextStyle = TextStyle {
    size: 9.3,
    leading: 13.0,
    bold: false,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Placed {
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        link: bool,
        text: String,
    },
    Rule {
        y: f32,
    },
    Logo {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Placed>,
}

/// Font and logo bytes; any of them may be missing.
#[derive(Debug, Clone, Default)]
pub struct PdfAssets {
    pub regular: Option<Vec<u8>>,
    pub bold: Option<Vec<u8>>,
    pub logo: Option<Vec<u8>>,
}

/// Name of the report PDF for a run date.
pub fn pdf_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{date}.pdf")
}

/// Estimated width of `text` in millimetres.
fn text_width(text: &str, style: TextStyle) -> f32 {
    let em = if style.bold { 0.56 } else { 0.52 };
    text.chars().count() as f32 * style.size * em * PT_TO_MM
}

/// Greedy word wrap to `max_width` millimetres. Words wider than a line are
/// split by character.
fn wrap(text: &str, style: TextStyle, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, style) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for ch in word.chars() {
            current.push(ch);
            if text_width(&current, style) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, ch.to_string()));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct PageCursor {
    pages: Vec<Page>,
    y: f32,
}

impl PageCursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: PAGE_HEIGHT - MARGIN_TOP,
        }
    }

    fn page(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Start a new page unless `height` mm still fit above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN_BOTTOM {
            self.pages.push(Page::default());
            self.y = PAGE_HEIGHT - MARGIN_TOP;
        }
    }

    fn gap(&mut self, points: f32) {
        self.y -= points * PT_TO_MM;
    }

    fn rule(&mut self) {
        self.reserve(1.0);
        let y = self.y;
        self.page().items.push(Placed::Rule { y });
    }

    /// Wrapped paragraph; `lead` is drawn as a link in front of the text.
    fn paragraph(&mut self, lead: Option<&str>, text: &str, style: TextStyle, indent: f32) {
        let full = match lead {
            Some(lead) if text.is_empty() => lead.to_string(),
            Some(lead) => format!("{lead} {text}"),
            None => text.to_string(),
        };
        let x = MARGIN_X + indent;
        for (i, line) in wrap(&full, style, CONTENT_WIDTH - indent).into_iter().enumerate() {
            let line_height = style.leading * PT_TO_MM;
            self.reserve(line_height);
            self.y -= line_height;
            let y = self.y;
            let size = style.size;
            let bold = style.bold;

            let lead_here = lead.filter(|l| i == 0 && !l.is_empty() && line.starts_with(*l));
            match lead_here {
                Some(lead) => {
                    let rest = line[lead.len()..].to_string();
                    self.page().items.push(Placed::Text {
                        x,
                        y,
                        size,
                        bold,
                        link: true,
                        text: lead.to_string(),
                    });
                    if !rest.trim().is_empty() {
                        self.page().items.push(Placed::Text {
                            x: x + text_width(lead, style),
                            y,
                            size,
                            bold,
                            link: false,
                            text: rest,
                        });
                    }
                }
                None => self.page().items.push(Placed::Text {
                    x,
                    y,
                    size,
                    bold,
                    link: false,
                    text: line,
                }),
            }
        }
    }
}

/// Place the report on A4 pages. `logo_px` is the logo's pixel size, if
/// one will be drawn.
pub fn layout(
    report: &Report,
    date: NaiveDate,
    doc: &DocumentConfig,
    logo_px: Option<(u32, u32)>,
) -> Vec<Page> {
    let mut cur = PageCursor::new();
    let top = cur.y;

    // header: logo on the left, title and date right-aligned
    let logo_height = match logo_px {
        Some((w, h)) if w > 0 && h > 0 => {
            let height = h as f32 * LOGO_WIDTH / w as f32;
            cur.page().items.push(Placed::Logo {
                x: MARGIN_X,
                y: top - height,
                width: LOGO_WIDTH,
                height,
            });
            height
        }
        _ => 0.0,
    };
    let right = PAGE_WIDTH - MARGIN_X;
    let date_text = date.format("%d.%m.%Y").to_string();
    let title_y = top - TITLE.leading * PT_TO_MM;
    let date_y = title_y - BODY.leading * PT_TO_MM;
    cur.page().items.push(Placed::Text {
        x: right - text_width(&doc.title, TITLE),
        y: title_y,
        size: TITLE.size,
        bold: true,
        link: false,
        text: doc.title.clone(),
    });
    cur.page().items.push(Placed::Text {
        x: right - text_width(&date_text, BODY),
        y: date_y,
        size: BODY.size,
        bold: false,
        link: false,
        text: date_text,
    });
    cur.y = (top - logo_height).min(date_y - 2.0);

    cur.gap(4.0);
    cur.rule();
    cur.gap(6.0);

    for headline in report.headline.iter().take(MAX_HEADLINES) {
        let line_height = BODY.leading * PT_TO_MM;
        cur.reserve(line_height);
        let y = cur.y - line_height;
        cur.page().items.push(Placed::Text {
            x: MARGIN_X,
            y,
            size: BODY.size,
            bold: false,
            link: false,
            text: "•".to_string(),
        });
        cur.paragraph(None, headline, BODY, BULLET_INDENT);
        cur.gap(5.0);
    }
    cur.gap(10.0);

    for article in &report.articles {
        cur.gap(6.0);
        let title = if article.title.trim().is_empty() {
            "(ohne Titel)"
        } else {
            article.title.trim()
        };
        cur.paragraph(None, title, ARTICLE_TITLE, 0.0);
        cur.gap(2.0);
        let source = if article.source.is_empty() {
            "Quelle"
        } else {
            article.source.as_str()
        };
        cur.paragraph(Some(source), &info_line(article), BODY, 0.0);
        cur.gap(4.0);
    }

    cur.gap(6.0);
    cur.rule();
    cur.gap(3.0);
    cur.paragraph(None, &doc.footer, BODY, 0.0);
    cur.pages
}

/// `— 18.08.25 – Summary (Companies)`, the part after the source link.
fn info_line(article: &ReportArticle) -> String {
    let mut parts = Vec::new();
    if let Some(date) = display_date(&article.date) {
        parts.push(format!("— {date}"));
    }
    if !article.summary.trim().is_empty() {
        parts.push(format!("– {}", article.summary.trim()));
    }
    if !article.companies.is_empty() {
        parts.push(format!("({})", article.companies.join(", ")));
    }
    parts.join(" ")
}

fn rgb((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Logo composited onto white, since transparency is dropped.
fn flatten_logo(bytes: &[u8]) -> ReportResult<DynamicImage> {
    let rgba = image_crate::load_from_memory(bytes)
        .map_err(|e| ReportError::Render(format!("logo: {e}")))?
        .to_rgba8();
    let flat = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        image_crate::Rgb([blend(r), blend(g), blend(b)])
    });
    Ok(DynamicImage::ImageRgb8(flat))
}

fn load_font(
    pdf: &PdfDocumentReference,
    bytes: Option<&[u8]>,
    fallback: BuiltinFont,
) -> ReportResult<IndirectFontRef> {
    if let Some(bytes) = bytes {
        match pdf.add_external_font(Cursor::new(bytes)) {
            Ok(font) => return Ok(font),
            Err(e) => warn!(error = ?e, "Font rejected; falling back to Helvetica"),
        }
    }
    pdf.add_builtin_font(fallback)
        .map_err(|e| ReportError::Render(format!("{e:?}")))
}

fn draw_page(
    layer: &PdfLayerReference,
    page: &Page,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
    logo: Option<&DynamicImage>,
) {
    for item in &page.items {
        match item {
            Placed::Text {
                x,
                y,
                size,
                bold: is_bold,
                link,
                text,
            } => {
                layer.set_fill_color(rgb(if *link { LINK_BLUE } else { (0.0, 0.0, 0.0) }));
                let font = if *is_bold { bold } else { regular };
                layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), font);
            }
            Placed::Rule { y } => {
                layer.set_outline_color(rgb(RULE_GRAY));
                layer.set_outline_thickness(0.7);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(MARGIN_X), Mm(*y)), false),
                        (Point::new(Mm(PAGE_WIDTH - MARGIN_X), Mm(*y)), false),
                    ],
                    is_closed: false,
                });
            }
            Placed::Logo {
                x,
                y,
                width,
                height,
            } => {
                let Some(img) = logo else { continue };
                let natural_w = img.width() as f32 * 25.4 / IMAGE_DPI;
                let natural_h = img.height() as f32 * 25.4 / IMAGE_DPI;
                Image::from_dynamic_image(img).add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(*x)),
                        translate_y: Some(Mm(*y)),
                        scale_x: Some(width / natural_w),
                        scale_y: Some(height / natural_h),
                        dpi: Some(IMAGE_DPI),
                        ..Default::default()
                    },
                );
            }
        }
    }
}

/// Render the report as PDF bytes.
///
/// A logo that does not decode is left out; a font that does not load falls
/// back to Helvetica.
pub fn render_pdf(
    report: &Report,
    date: NaiveDate,
    doc: &DocumentConfig,
    assets: &PdfAssets,
) -> ReportResult<Vec<u8>> {
    let logo = match assets.logo.as_deref().map(flatten_logo) {
        Some(Ok(img)) => Some(img),
        Some(Err(e)) => {
            warn!(error = %e, "Logo unusable; rendering without it");
            None
        }
        None => None,
    };
    let pages = layout(report, date, doc, logo.as_ref().map(|i| (i.width(), i.height())));

    let (pdf, first_page, first_layer) =
        PdfDocument::new(doc.title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = load_font(&pdf, assets.regular.as_deref(), BuiltinFont::Helvetica)?;
    let bold = load_font(&pdf, assets.bold.as_deref(), BuiltinFont::HelveticaBold)?;

    for (i, page) in pages.iter().enumerate() {
        let (page_idx, layer_idx) = if i == 0 {
            (first_page, first_layer)
        } else {
            pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1")
        };
        let layer = pdf.get_page(page_idx).get_layer(layer_idx);
        draw_page(&layer, page, &regular, &bold, logo.as_ref());
    }

    pdf.save_to_bytes()
        .map_err(|e| ReportError::Render(format!("{e:?}")))
}

/// Write the rendered PDF into `output_dir` and return its path.
#[instrument(level = "info", skip_all, fields(%output_dir))]
pub async fn write_report_pdf(
    report: &Report,
    date: NaiveDate,
    doc: &DocumentConfig,
    assets: &PdfAssets,
    output_dir: &str,
) -> ReportResult<PathBuf> {
    let bytes = render_pdf(report, date, doc, assets)?;
    let path = Path::new(output_dir).join(pdf_filename(&doc.file_prefix, date));
    fs::write(&path, &bytes).await?;
    info!(path = %path.display(), bytes = bytes.len(), "Wrote report PDF");
    Ok(path)
}

async fn fetch_bytes(client: &reqwest::Client, url: &str) -> ReportResult<Vec<u8>> {
    let resp = client.get(url).send().await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Download the logo and fonts named in `doc`. Failures are logged and
/// leave the asset empty.
#[instrument(level = "info", skip_all)]
pub async fn fetch_assets(doc: &DocumentConfig, timeout: Duration) -> PdfAssets {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Cannot build asset client; using built-in fonts");
            return PdfAssets::default();
        }
    };

    let fetch = |name: &'static str, url: Option<String>| {
        let client = client.clone();
        async move {
            let url = url.filter(|u| !u.trim().is_empty())?;
            match fetch_bytes(&client, &url).await {
                Ok(bytes) => {
                    info!(asset = name, %url, bytes = bytes.len(), "Fetched PDF asset");
                    Some(bytes)
                }
                Err(e) => {
                    warn!(asset = name, %url, error = %e, "PDF asset unavailable");
                    None
                }
            }
        }
    };

    let (regular, bold, logo) = tokio::join!(
        fetch("font_regular", doc.font_regular_url.clone()),
        fetch("font_bold", doc.font_bold_url.clone()),
        fetch("logo", doc.logo_url.clone()),
    );
    PdfAssets {
        regular,
        bold,
        logo,
    }
}
