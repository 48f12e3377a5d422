use std::io::Cursor;

use ab_glyph::{FontRef, PxScale};
use anyhow::{ensure, Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::warn;

use ap_core::accommodation::AccommodationRecord;
use ap_core::pass::{EncodedPass, PassResources};
use ap_core::ports::PassRendererPort;
use ap_core::Raster;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const HEADER: Rgba<u8> = Rgba([43, 45, 110, 255]);
const PHOTO_PLACEHOLDER: Rgba<u8> = Rgba([214, 214, 222, 255]);
const STRIPE: Rgba<u8> = Rgba([20, 20, 28, 255]);
const FOOTER: Rgba<u8> = Rgba([46, 160, 90, 255]);
const TEXT: Rgba<u8> = Rgba([28, 28, 36, 255]);
const TEXT_MUTED: Rgba<u8> = Rgba([90, 90, 104, 255]);

/// DejaVu Sans, see `assets/DejaVuSans-LICENSE.txt`.
static PASS_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Pass layout with height = 3/2 of the width.
///
/// Top to bottom: header band with the brand mark, the holder's photo
/// cropped square, an identity strip derived from the record, the holder's
/// name, MI number and college, a footer band.
pub struct RasterPassRenderer;

impl RasterPassRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RasterPassRenderer {
    fn default() -> Self {
        Self::new()
    }
}

struct Layout {
    width: u32,
    height: u32,
    header: u32,
    margin: u32,
    photo_side: u32,
    strip_top: u32,
    strip_height: u32,
    text_top: u32,
    footer: u32,
}

impl Layout {
    fn for_width(width: u32) -> Self {
        let height = width.saturating_mul(3) / 2;
        let header = (height / 8).max(1);
        let margin = (width / 20).max(1);
        let photo_side = (width / 2).max(1);
        let strip_top = header + margin + photo_side + margin;
        let strip_height = (height / 10).max(1);
        Self {
            width,
            height,
            header,
            margin,
            photo_side,
            strip_top,
            strip_height,
            text_top: strip_top + strip_height + margin,
            footer: (height / 16).max(1),
        }
    }
}

impl PassRendererPort for RasterPassRenderer {
    fn rasterize(
        &self,
        record: &AccommodationRecord,
        resources: &PassResources,
        width: u32,
    ) -> Result<Raster> {
        ensure!(width >= 64, "pass width {width} is too small");
        let layout = Layout::for_width(width);
        let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, BACKGROUND);

        fill(&mut canvas, 0, 0, layout.width, layout.header, HEADER);
        if let Some(mark) = resources.brand_mark.as_deref().and_then(decode_resource) {
            draw_brand_mark(&mut canvas, &layout, &mark);
        }

        let photo_x = (layout.width - layout.photo_side) / 2;
        let photo_y = layout.header + layout.margin;
        match resources.photo.as_deref().and_then(decode_resource) {
            Some(photo) => {
                let square = photo
                    .resize_to_fill(layout.photo_side, layout.photo_side, FilterType::Triangle)
                    .to_rgba8();
                imageops::overlay(&mut canvas, &square, photo_x.into(), photo_y.into());
            }
            None => fill(
                &mut canvas,
                photo_x,
                photo_y,
                layout.photo_side,
                layout.photo_side,
                PHOTO_PLACEHOLDER,
            ),
        }

        draw_identity_strip(&mut canvas, &layout, record);
        let font = FontRef::try_from_slice(PASS_FONT).context("load pass font")?;
        draw_holder_details(&mut canvas, &layout, &font, record);
        fill(
            &mut canvas,
            0,
            layout.height - layout.footer,
            layout.width,
            layout.footer,
            FOOTER,
        );

        let (width, height) = canvas.dimensions();
        Ok(Raster::new(width, height, canvas.into_raw()))
    }

    fn encode(&self, raster: &Raster) -> Result<EncodedPass> {
        ensure!(raster.is_well_formed(), "pass raster is malformed: {raster:?}");
        let image = RgbaImage::from_raw(raster.width, raster.height, raster.rgba.clone())
            .context("pass raster buffer too small")?;

        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut bytes, ImageFormat::Png)
            .context("encode pass to png")?;
        Ok(EncodedPass {
            bytes: bytes.into_inner(),
        })
    }
}

fn decode_resource(bytes: &[u8]) -> Option<DynamicImage> {
    match image::load_from_memory(bytes) {
        Ok(image) => Some(image),
        Err(err) => {
            warn!(error = %err, "Pass resource could not be decoded, omitting");
            None
        }
    }
}

fn fill(canvas: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let x_end = x.saturating_add(width).min(canvas.width());
    let y_end = y.saturating_add(height).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

fn draw_brand_mark(canvas: &mut RgbaImage, layout: &Layout, mark: &DynamicImage) {
    let max_edge = (layout.header * 4 / 5).max(1);
    let (width, height) = mark.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let (target_width, target_height) = fit_within(width, height, max_edge);
    let resized = imageops::resize(mark, target_width, target_height, FilterType::Triangle);

    let x = (layout.width.saturating_sub(target_width)) / 2;
    let y = (layout.header.saturating_sub(target_height)) / 2;
    imageops::overlay(canvas, &resized, x.into(), y.into());
}

fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width >= height {
        let scaled = (f64::from(height) * f64::from(max_edge) / f64::from(width)).round() as u32;
        (max_edge, scaled.max(1))
    } else {
        let scaled = (f64::from(width) * f64::from(max_edge) / f64::from(height)).round() as u32;
        (scaled.max(1), max_edge)
    }
}

/// One bar per bit of a blake3 digest over the holder's identity fields.
fn draw_identity_strip(canvas: &mut RgbaImage, layout: &Layout, record: &AccommodationRecord) {
    let mut hasher = blake3::Hasher::new();
    for field in [&record.mi_no, &record.email, &record.name] {
        hasher.update(field.as_bytes());
        hasher.update(&[0]);
    }
    let digest = hasher.finalize();

    let usable = layout.width.saturating_sub(layout.margin * 2);
    let bits = digest.as_bytes().len() as u32 * 8;
    let bar = (usable / bits).max(1);
    let left = layout.margin + (usable.saturating_sub(bar * bits)) / 2;

    for (index, byte) in digest.as_bytes().iter().enumerate() {
        for bit in 0..8u32 {
            if byte >> (7 - bit) & 1 == 1 {
                let x = left + (index as u32 * 8 + bit) * bar;
                fill(canvas, x, layout.strip_top, bar, layout.strip_height, STRIPE);
            }
        }
    }
}

/// Name, MI number and college, centered, one line each. Lines wider than
/// the pass are scaled down to fit; empty fields are skipped.
fn draw_holder_details(
    canvas: &mut RgbaImage,
    layout: &Layout,
    font: &FontRef<'_>,
    record: &AccommodationRecord,
) {
    let base = layout.width as f32 / 14.0;
    let lines = [
        (record.name.trim(), base, TEXT),
        (record.mi_no.trim(), base * 0.8, TEXT),
        (record.college.trim(), base * 0.7, TEXT_MUTED),
    ];

    let usable = layout.width.saturating_sub(layout.margin * 2).max(1);
    let bottom = layout.height.saturating_sub(layout.footer);
    let mut y = layout.text_top;
    for (text, size, color) in lines {
        if text.is_empty() {
            continue;
        }
        let mut scale = PxScale::from(size);
        let (mut text_width, _) = text_size(scale, font, text);
        if text_width > usable {
            scale = PxScale::from(size * usable as f32 / text_width as f32);
            text_width = text_size(scale, font, text).0;
        }
        let line_height = (scale.y * 1.3).ceil() as u32;
        if y.saturating_add(line_height) > bottom {
            break;
        }
        let x = layout.width.saturating_sub(text_width) / 2;
        draw_text_mut(canvas, color, x as i32, y as i32, scale, font, text);
        y += line_height;
    }
}
