//! End-to-end resize runs with the real `image`-crate engine.
//!
//! Sources are generated in memory, pushed through `Resizer` into a memory
//! or local-directory store, and the stored derivatives decoded back to
//! check their size, format and pixels.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tempfile::TempDir;
use thumbnailer::address::ObjectAddress;
use thumbnailer::config::ResizerConfig;
use thumbnailer::error::Stage;
use thumbnailer::imaging::{OutputFormat, RelativeRegion, RustBackend};
use thumbnailer::store::{LocalStore, MemoryStore, ObjectStore};
use thumbnailer::{RequestContext, ResizeError, ResizeRequest, Resizer};

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// 200x100 image: left half red, right half blue.
fn split_image() -> DynamicImage {
    let img = RgbImage::from_fn(200, 100, |x, _| if x < 100 { RED } else { BLUE });
    DynamicImage::ImageRgb8(img)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn memory_resizer(key: &str, format: ImageFormat) -> Resizer<MemoryStore, RustBackend> {
    let store = MemoryStore::new();
    store.insert(
        ObjectAddress::new("bucket", key),
        encode(&split_image(), format),
        "application/octet-stream",
    );
    Resizer::new(store, RustBackend::new(), ResizerConfig::default())
}

fn sized(source: &str, width: u32, height: u32) -> ResizeRequest {
    let mut request = ResizeRequest::new(source);
    request.width = Some(width);
    request.height = Some(height);
    request
}

fn is_close(pixel: Rgb<u8>, expected: Rgb<u8>) -> bool {
    pixel
        .0
        .iter()
        .zip(expected.0.iter())
        .all(|(a, b)| (*a as i16 - *b as i16).abs() < 40)
}

#[tokio::test]
async fn png_source_becomes_png_derivative() {
    let r = memory_resizer("photos/split.png", ImageFormat::Png);
    let result = r
        .resize(&sized("s3://bucket/photos/split.png", 50, 40), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(result.format, OutputFormat::Png);
    assert_eq!(result.destination_address, "s3://bucket/thumbnail/photos/split.png");

    let stored = r
        .store()
        .object(&ObjectAddress::new("bucket", "thumbnail/photos/split.png"))
        .unwrap();
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(image::guess_format(&stored.data).unwrap(), ImageFormat::Png);
    let out = image::load_from_memory(&stored.data).unwrap();
    assert_eq!((out.width(), out.height()), (50, 40));
}

#[tokio::test]
async fn jpg_source_becomes_jpeg_derivative() {
    let r = memory_resizer("split.jpg", ImageFormat::Jpeg);
    let result = r
        .resize(&sized("s3://bucket/split.jpg", 32, 32), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(result.format, OutputFormat::Jpg);
    let stored = r
        .store()
        .object(&ObjectAddress::new("bucket", "thumbnail/split.jpg"))
        .unwrap();
    assert_eq!(stored.content_type, "image/jpeg");
    assert_eq!(image::guess_format(&stored.data).unwrap(), ImageFormat::Jpeg);
    let out = image::load_from_memory(&stored.data).unwrap();
    assert_eq!((out.width(), out.height()), (32, 32));
}

#[tokio::test]
async fn bmp_source_defaults_to_png_under_original_name() {
    let r = memory_resizer("scan.bmp", ImageFormat::Bmp);
    let result = r
        .resize(&sized("s3://bucket/scan.bmp", 20, 10), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(result.format, OutputFormat::Png);
    let stored = r
        .store()
        .object(&ObjectAddress::new("bucket", "thumbnail/scan.bmp"))
        .unwrap();
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(image::guess_format(&stored.data).unwrap(), ImageFormat::Png);
}

#[tokio::test]
async fn region_selects_the_blue_half() {
    let r = memory_resizer("split.png", ImageFormat::Png);
    let mut request = sized("s3://bucket/split.png", 20, 20);
    request.region = Some(RelativeRegion {
        top: 0.0,
        left: 0.5,
        width: 0.5,
        height: 1.0,
    });
    request.zoom_out_factor = Some(1.0);
    r.resize(&request, &RequestContext::new()).await.unwrap();

    let stored = r
        .store()
        .object(&ObjectAddress::new("bucket", "thumbnail/split.png"))
        .unwrap();
    let out = image::load_from_memory(&stored.data).unwrap().to_rgb8();
    assert_eq!(out.dimensions(), (20, 20));
    for (x, y) in [(0, 0), (10, 10), (19, 19)] {
        assert!(is_close(*out.get_pixel(x, y), BLUE), "pixel {},{}", x, y);
    }
}

#[tokio::test]
async fn zoomed_region_takes_in_both_halves() {
    let r = memory_resizer("split.png", ImageFormat::Png);
    let mut request = sized("s3://bucket/split.png", 40, 20);
    // 20px wide strip centered on the boundary; zoom 4 widens it to 80px.
    request.region = Some(RelativeRegion {
        top: 0.25,
        left: 0.45,
        width: 0.1,
        height: 0.5,
    });
    request.zoom_out_factor = Some(4.0);
    r.resize(&request, &RequestContext::new()).await.unwrap();

    let stored = r
        .store()
        .object(&ObjectAddress::new("bucket", "thumbnail/split.png"))
        .unwrap();
    let out = image::load_from_memory(&stored.data).unwrap().to_rgb8();
    assert!(is_close(*out.get_pixel(2, 10), RED));
    assert!(is_close(*out.get_pixel(37, 10), BLUE));
}

#[tokio::test]
async fn undecodable_source_fails_in_the_right_stage() {
    let store = MemoryStore::new();
    store.insert(ObjectAddress::new("bucket", "bad.jpg"), &b"not an image"[..], "image/jpeg");
    let r = Resizer::new(store, RustBackend::new(), ResizerConfig::default());
    let ctx = RequestContext::new();

    let err = r
        .resize(&ResizeRequest::new("s3://bucket/bad.jpg"), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, ResizeError::TransformFailed { .. }));

    let mut with_region = ResizeRequest::new("s3://bucket/bad.jpg");
    with_region.region = Some(RelativeRegion {
        top: 0.0,
        left: 0.0,
        width: 1.0,
        height: 1.0,
    });
    let err = r.resize(&with_region, &ctx).await.unwrap_err();
    assert_eq!(err.stage(), Stage::Extract);
    assert_eq!(r.store().put_count(), 0);
}

#[tokio::test]
async fn local_store_round_trip_and_reuse() {
    let tmp = TempDir::new().unwrap();
    let store = LocalStore::new(tmp.path()).await.unwrap();
    store
        .put(
            &ObjectAddress::new("bucket", "profile/me.png"),
            encode(&split_image(), ImageFormat::Png).into(),
            "image/png",
        )
        .await
        .unwrap();
    let r = Resizer::new(store, RustBackend::new(), ResizerConfig::default());
    let ctx = RequestContext::new();
    let request = sized("s3://bucket/profile/me.png", 30, 30);

    let first = r.resize(&request, &ctx).await.unwrap();
    let written = tmp.path().join("bucket/thumbnail/profile/me.png");
    assert!(!first.cached);
    assert!(written.is_file());
    let modified = std::fs::metadata(&written).unwrap().modified().unwrap();

    let second = r.resize(&request, &ctx).await.unwrap();
    assert!(second.cached);
    assert_eq!(
        std::fs::metadata(&written).unwrap().modified().unwrap(),
        modified
    );

    let out = image::open(&written).unwrap();
    assert_eq!((out.width(), out.height()), (30, 30));
}
