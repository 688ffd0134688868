//! Draws category overlays onto clean artwork and re-encodes the result.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{imageops, AnimationDecoder, DynamicImage, GenericImageView, ImageDecoder, RgbaImage};
use tracing::{debug, warn};

use overgrid_model::{ArtStyle, CompositeResult, RawArtwork};

use crate::container::{self, WebpInfo};
use crate::loader::OverlaySet;
use crate::OverlayError;

#[derive(Debug, Clone, Default)]
pub struct CompositorConfig {
    /// Re-encode animated WEBP artwork as APNG, for Steam builds that
    /// can't play animated WEBP grids.
    pub convert_webp_to_apng: bool,
    /// Decoded-RGBA budget for the APNG conversion; 0 disables the gate.
    pub max_animation_bytes: u64,
}

/// Applies every overlay matching the game's tags, in tag order, so a
/// later tag's overlay is drawn on top.
///
/// Returns None when there is nothing to do and the clean bytes should
/// be written unchanged. The output extension follows the encoder that
/// produced the bytes, not the input's: single-frame WEBP comes back as
/// PNG, and converted animations come back as APNG under "png".
pub fn decorate(
    artwork: &RawArtwork,
    style: ArtStyle,
    tags: &[String],
    overlays: &OverlaySet,
    config: &CompositorConfig,
) -> Result<Option<CompositeResult>, OverlayError> {
    let matched: Vec<&DynamicImage> = tags
        .iter()
        .filter_map(|tag| overlays.get(tag, style))
        .collect();

    if let Some(info) = container::probe_webp(&artwork.bytes) {
        if info.is_animated() {
            return decorate_animated_webp(artwork, &matched, info, config);
        }
        // Single-frame WEBP falls through to the static path.
    } else if let Some(info) = container::probe_png(&artwork.bytes) {
        if info.is_animated() {
            if matched.is_empty() {
                return Ok(None);
            }
            return decorate_apng(artwork, &matched, info.num_plays);
        }
    }

    if matched.is_empty() {
        return Ok(None);
    }
    decorate_static(artwork, &matched)
}

fn decorate_static(
    artwork: &RawArtwork,
    matched: &[&DynamicImage],
) -> Result<Option<CompositeResult>, OverlayError> {
    let mut base = image::load_from_memory(&artwork.bytes)
        .map_err(|e| OverlayError::Decode(e.to_string()))?
        .to_rgba8();

    for overlay in matched {
        let (width, height) = overlay.dimensions();
        // Overlays come in the style's canonical size; the base is
        // scaled to match rather than the other way around.
        if base.dimensions() != (width, height) {
            base = imageops::resize(&base, width, height, imageops::FilterType::Triangle);
        }
        imageops::overlay(&mut base, &overlay.to_rgba8(), 0, 0);
    }

    let mut out = Cursor::new(Vec::new());
    let ext = if artwork.ext == "jpg" {
        let rgb = DynamicImage::ImageRgba8(base).to_rgb8();
        JpegEncoder::new_with_quality(&mut out, 95)
            .encode_image(&rgb)
            .map_err(|e| OverlayError::Encode(e.to_string()))?;
        "jpg"
    } else {
        DynamicImage::ImageRgba8(base)
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| OverlayError::Encode(e.to_string()))?;
        "png"
    };
    Ok(Some(CompositeResult {
        bytes: out.into_inner(),
        ext: ext.into(),
    }))
}

fn decorate_animated_webp(
    artwork: &RawArtwork,
    matched: &[&DynamicImage],
    info: WebpInfo,
    config: &CompositorConfig,
) -> Result<Option<CompositeResult>, OverlayError> {
    let mut convert = config.convert_webp_to_apng;
    if convert && config.max_animation_bytes > 0 && info.decoded_size() > config.max_animation_bytes
    {
        warn!(
            needed = info.decoded_size(),
            budget = config.max_animation_bytes,
            "animation too large to convert to APNG, keeping WEBP"
        );
        convert = false;
    }

    // Without overlays or a format change there is nothing to re-encode.
    if matched.is_empty() && !convert {
        return Ok(None);
    }

    let scaled = scale_overlays(matched, info.width, info.height);
    let decoder = WebPDecoder::new(Cursor::new(artwork.bytes.as_slice()))
        .map_err(|e| OverlayError::Decode(e.to_string()))?;
    let frames = decoder.into_frames();

    if convert {
        debug!(frames = info.frame_count, "converting animated WEBP to APNG");
        let bytes = encode_apng(
            frames,
            &scaled,
            info.width,
            info.height,
            info.frame_count,
            u32::from(info.loop_count),
        )?;
        Ok(Some(CompositeResult {
            bytes,
            ext: "png".into(),
        }))
    } else {
        let bytes = encode_webp(frames, &scaled, info.width, info.height, info.loop_count)?;
        Ok(Some(CompositeResult {
            bytes,
            ext: "webp".into(),
        }))
    }
}

fn decorate_apng(
    artwork: &RawArtwork,
    matched: &[&DynamicImage],
    num_plays: u32,
) -> Result<Option<CompositeResult>, OverlayError> {
    let decoder = PngDecoder::new(Cursor::new(artwork.bytes.as_slice()))
        .map_err(|e| OverlayError::Decode(e.to_string()))?;
    let (width, height) = decoder.dimensions();
    let frame_count = container::probe_png(&artwork.bytes)
        .map(|info| info.frame_count)
        .unwrap_or(1);
    let apng = decoder
        .apng()
        .map_err(|e| OverlayError::Decode(e.to_string()))?;

    let scaled = scale_overlays(matched, width, height);
    let bytes = encode_apng(
        apng.into_frames(),
        &scaled,
        width,
        height,
        frame_count,
        num_plays,
    )?;
    Ok(Some(CompositeResult {
        bytes,
        ext: "png".into(),
    }))
}

/// Scales each overlay to the animation canvas once, up front.
fn scale_overlays(matched: &[&DynamicImage], width: u32, height: u32) -> Vec<RgbaImage> {
    matched
        .iter()
        .map(|overlay| {
            if overlay.dimensions() == (width, height) {
                overlay.to_rgba8()
            } else {
                imageops::resize(*overlay, width, height, imageops::FilterType::Triangle)
            }
        })
        .collect()
}

fn frame_millis(delay: image::Delay) -> u32 {
    let (numer, denom) = delay.numer_denom_ms();
    if denom == 0 {
        numer
    } else {
        numer / denom
    }
}

/// Streams frames through overlay compositing into an APNG, one frame
/// buffer at a time. Frames are full composites, so dispose is "none"
/// and blend is "over".
fn encode_apng(
    frames: image::Frames<'_>,
    overlays: &[RgbaImage],
    width: u32,
    height: u32,
    frame_count: u32,
    num_plays: u32,
) -> Result<Vec<u8>, OverlayError> {
    fn enc(e: png::EncodingError) -> OverlayError {
        OverlayError::Encode(e.to_string())
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_animated(frame_count, num_plays).map_err(enc)?;
        let mut writer = encoder.write_header().map_err(enc)?;

        for frame in frames {
            let frame = frame.map_err(|e| OverlayError::Decode(e.to_string()))?;
            let millis = frame_millis(frame.delay());
            let mut buffer = frame.into_buffer();
            for overlay in overlays {
                imageops::overlay(&mut buffer, overlay, 0, 0);
            }
            writer
                .set_frame_delay(millis.min(u32::from(u16::MAX)) as u16, 1000)
                .map_err(enc)?;
            writer.set_dispose_op(png::DisposeOp::None).map_err(enc)?;
            writer.set_blend_op(png::BlendOp::Over).map_err(enc)?;
            writer.write_image_data(buffer.as_raw()).map_err(enc)?;
        }
        writer.finish().map_err(enc)?;
    }
    Ok(out)
}

/// Re-encodes a decorated animation as lossless WEBP with the original
/// frame timing.
fn encode_webp(
    frames: image::Frames<'_>,
    overlays: &[RgbaImage],
    width: u32,
    height: u32,
    loop_count: u16,
) -> Result<Vec<u8>, OverlayError> {
    fn enc(e: webp_animation::Error) -> OverlayError {
        OverlayError::Encode(format!("{e:?}"))
    }

    let mut encoder = webp_animation::Encoder::new_with_options(
        (width, height),
        webp_animation::EncoderOptions {
            anim_params: webp_animation::AnimParams {
                loop_count: i32::from(loop_count),
            },
            kmin: 9,
            kmax: 17,
            encoding_config: Some(webp_animation::EncodingConfig {
                encoding_type: webp_animation::EncodingType::Lossless,
                ..Default::default()
            }),
            ..Default::default()
        },
    )
    .map_err(enc)?;

    let mut timestamp = 0i32;
    for frame in frames {
        let frame = frame.map_err(|e| OverlayError::Decode(e.to_string()))?;
        let millis = frame_millis(frame.delay()).max(1);
        let mut buffer = frame.into_buffer();
        for overlay in overlays {
            imageops::overlay(&mut buffer, overlay, 0, 0);
        }
        encoder.add_frame(buffer.as_raw(), timestamp).map_err(enc)?;
        timestamp += millis as i32;
    }
    let data = encoder.finalize(timestamp).map_err(enc)?;
    Ok(data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_overlays;
    use overgrid_model::Provenance;
    use std::fs;
    use std::path::Path;

    fn png_bytes(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, image::Rgba(color));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn write_overlay(path: &Path, w: u32, h: u32, color: [u8; 4]) {
        fs::write(path, png_bytes(w, h, color)).unwrap();
    }

    fn artwork(bytes: Vec<u8>, ext: &str) -> RawArtwork {
        RawArtwork {
            bytes,
            ext: ext.into(),
            provenance: Provenance::SteamServer,
        }
    }

    fn overlays_with_banner(color: [u8; 4], w: u32, h: u32) -> OverlaySet {
        let tmp = tempfile::tempdir().unwrap();
        write_overlay(&tmp.path().join("favorites.banner.png"), w, h, color);
        load_overlays(tmp.path()).unwrap()
    }

    fn animated_webp(frames: u32, w: u32, h: u32) -> Vec<u8> {
        let mut encoder = webp_animation::Encoder::new((w, h)).unwrap();
        for i in 0..frames {
            let shade = (i * 40) as u8;
            let frame = RgbaImage::from_pixel(w, h, image::Rgba([shade, 0, 255 - shade, 255]));
            encoder.add_frame(frame.as_raw(), (i * 100) as i32).unwrap();
        }
        let data = encoder.finalize((frames * 100) as i32).unwrap();
        data.to_vec()
    }

    #[test]
    fn no_matching_overlay_is_a_no_op() {
        let overlays = overlays_with_banner([255, 0, 0, 255], 4, 4);
        let art = artwork(png_bytes(4, 4, [0, 0, 255, 255]), "png");
        let result = decorate(
            &art,
            ArtStyle::Cover, // overlay set only has a banner entry
            &["Favorites".into()],
            &overlays,
            &CompositorConfig::default(),
        )
        .unwrap();
        assert!(result.is_none());

        let result = decorate(
            &art,
            ArtStyle::Banner,
            &["Shooters".into()],
            &overlays,
            &CompositorConfig::default(),
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn static_png_gets_overlay_pixels() {
        let overlays = overlays_with_banner([255, 0, 0, 255], 4, 4);
        let art = artwork(png_bytes(4, 4, [0, 0, 255, 255]), "png");
        let result = decorate(
            &art,
            ArtStyle::Banner,
            &["Favorites".into()],
            &overlays,
            &CompositorConfig::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(result.ext, "png");
        let decoded = image::load_from_memory(&result.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn jpg_input_stays_jpg() {
        let base = {
            let img = image::RgbImage::from_pixel(8, 8, image::Rgb([0, 0, 255]));
            let mut out = Cursor::new(Vec::new());
            DynamicImage::ImageRgb8(img)
                .write_to(&mut out, image::ImageFormat::Jpeg)
                .unwrap();
            out.into_inner()
        };
        let overlays = overlays_with_banner([255, 0, 0, 255], 8, 8);
        let result = decorate(
            &artwork(base, "jpg"),
            ArtStyle::Banner,
            &["Favorites".into()],
            &overlays,
            &CompositorConfig::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(result.ext, "jpg");
        let decoded = image::load_from_memory(&result.bytes).unwrap().to_rgb8();
        let pixel = decoded.get_pixel(4, 4).0;
        assert!(pixel[0] > 200 && pixel[2] < 60, "expected red, got {pixel:?}");
    }

    #[test]
    fn base_is_scaled_to_overlay_size() {
        let overlays = overlays_with_banner([255, 0, 0, 128], 4, 4);
        let art = artwork(png_bytes(16, 16, [0, 255, 0, 255]), "png");
        let result = decorate(
            &art,
            ArtStyle::Banner,
            &["Favorites".into()],
            &overlays,
            &CompositorConfig::default(),
        )
        .unwrap()
        .unwrap();

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
    }

    #[test]
    fn single_frame_webp_is_reencoded_as_png() {
        let webp = {
            let mut encoder = webp_animation::Encoder::new((4, 4)).unwrap();
            let frame = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
            encoder.add_frame(frame.as_raw(), 0).unwrap();
            encoder.finalize(100).unwrap().to_vec()
        };
        let overlays = overlays_with_banner([255, 0, 0, 255], 4, 4);
        let result = decorate(
            &artwork(webp, "webp"),
            ArtStyle::Banner,
            &["Favorites".into()],
            &overlays,
            &CompositorConfig::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(result.ext, "png");
    }

    #[test]
    fn animated_webp_keeps_format_and_frames() {
        let overlays = overlays_with_banner([255, 0, 0, 255], 8, 8);
        let result = decorate(
            &artwork(animated_webp(3, 8, 8), "webp"),
            ArtStyle::Banner,
            &["Favorites".into()],
            &overlays,
            &CompositorConfig::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(result.ext, "webp");
        let info = container::probe_webp(&result.bytes).unwrap();
        assert_eq!(info.frame_count, 3);
        assert!(info.is_animated());
    }

    #[test]
    fn animated_webp_converts_to_apng() {
        let overlays = overlays_with_banner([255, 0, 0, 255], 8, 8);
        let result = decorate(
            &artwork(animated_webp(3, 8, 8), "webp"),
            ArtStyle::Banner,
            &["Favorites".into()],
            &overlays,
            &CompositorConfig {
                convert_webp_to_apng: true,
                max_animation_bytes: 0,
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(result.ext, "png");
        let info = container::probe_png(&result.bytes).unwrap();
        assert_eq!(info.frame_count, 3);
        assert!(info.is_animated());
    }

    #[test]
    fn conversion_preserves_distinct_frame_delays() {
        let webp = {
            let mut encoder = webp_animation::Encoder::new((8, 8)).unwrap();
            let mut timestamp = 0i32;
            for (i, millis) in [40i32, 120, 80].into_iter().enumerate() {
                let shade = (i as u8) * 60;
                let frame =
                    RgbaImage::from_pixel(8, 8, image::Rgba([shade, 0, 255 - shade, 255]));
                encoder.add_frame(frame.as_raw(), timestamp).unwrap();
                timestamp += millis;
            }
            encoder.finalize(timestamp).unwrap().to_vec()
        };

        let result = decorate(
            &artwork(webp, "webp"),
            ArtStyle::Banner,
            &[],
            &OverlaySet::default(),
            &CompositorConfig {
                convert_webp_to_apng: true,
                max_animation_bytes: 0,
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(result.ext, "png");

        let apng = PngDecoder::new(Cursor::new(result.bytes.as_slice()))
            .unwrap()
            .apng()
            .unwrap();
        let delays: Vec<u32> = apng
            .into_frames()
            .map(|frame| frame_millis(frame.unwrap().delay()))
            .collect();
        assert_eq!(delays, vec![40, 120, 80]);
    }

    #[test]
    fn conversion_happens_even_without_overlays() {
        let result = decorate(
            &artwork(animated_webp(2, 8, 8), "webp"),
            ArtStyle::Banner,
            &[],
            &OverlaySet::default(),
            &CompositorConfig {
                convert_webp_to_apng: true,
                max_animation_bytes: 0,
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(result.ext, "png");
        assert!(container::probe_png(&result.bytes).unwrap().is_animated());
    }

    #[test]
    fn over_budget_animation_stays_webp() {
        let overlays = overlays_with_banner([255, 0, 0, 255], 8, 8);
        let result = decorate(
            &artwork(animated_webp(3, 8, 8), "webp"),
            ArtStyle::Banner,
            &["Favorites".into()],
            &overlays,
            &CompositorConfig {
                convert_webp_to_apng: true,
                // 3 frames of 8x8 RGBA need 768 bytes.
                max_animation_bytes: 100,
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(result.ext, "webp");
    }

    #[test]
    fn untouched_animated_webp_is_a_no_op() {
        let result = decorate(
            &artwork(animated_webp(2, 8, 8), "webp"),
            ArtStyle::Banner,
            &[],
            &OverlaySet::default(),
            &CompositorConfig::default(),
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn apng_input_stays_animated_png() {
        // Build an APNG by converting a WEBP animation first.
        let apng = decorate(
            &artwork(animated_webp(3, 8, 8), "webp"),
            ArtStyle::Banner,
            &[],
            &OverlaySet::default(),
            &CompositorConfig {
                convert_webp_to_apng: true,
                max_animation_bytes: 0,
            },
        )
        .unwrap()
        .unwrap();

        let overlays = overlays_with_banner([255, 0, 0, 255], 8, 8);
        let result = decorate(
            &artwork(apng.bytes, "png"),
            ArtStyle::Banner,
            &["Favorites".into()],
            &overlays,
            &CompositorConfig::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(result.ext, "png");
        let info = container::probe_png(&result.bytes).unwrap();
        assert_eq!(info.frame_count, 3);
    }

    #[test]
    fn later_tags_draw_on_top() {
        let tmp = tempfile::tempdir().unwrap();
        write_overlay(&tmp.path().join("first.banner.png"), 4, 4, [0, 255, 0, 255]);
        write_overlay(&tmp.path().join("second.banner.png"), 4, 4, [255, 0, 0, 255]);
        let overlays = load_overlays(tmp.path()).unwrap();

        let art = artwork(png_bytes(4, 4, [0, 0, 255, 255]), "png");
        let result = decorate(
            &art,
            ArtStyle::Banner,
            &["First".into(), "Second".into()],
            &overlays,
            &CompositorConfig::default(),
        )
        .unwrap()
        .unwrap();

        let decoded = image::load_from_memory(&result.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(2, 2).0, [255, 0, 0, 255]);
    }
}
