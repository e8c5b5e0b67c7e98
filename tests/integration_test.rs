use std::path::Path;

use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
use imagelab::{LoadError, Operation, OutputFormat, SaveError, Session};

fn write_fixture(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let path = dir.join(name);
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 2) as u8, (y * 5) as u8, ((x ^ y) * 3) as u8])
    });
    img.save(&path).unwrap();
    path
}

fn mean_abs_diff(a: &DynamicImage, b: &DynamicImage) -> f64 {
    let (a, b) = (a.to_rgb8(), b.to_rgb8());
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs() as u64)
        .sum();
    total as f64 / a.as_raw().len() as f64
}

#[test]
fn load_sets_processed_equal_to_original() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "photo.png", 100, 50);

    let mut session = Session::new();
    let info = session.load(&path).unwrap();

    assert_eq!(info.filename, "photo.png");
    assert_eq!((info.width, info.height), (100, 50));
    assert_eq!(session.filename(), Some("photo.png"));
    assert_eq!(
        session.processed().unwrap().as_bytes(),
        session.original().unwrap().as_bytes()
    );
}

#[test]
fn rotate_example_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "wide.png", 100, 50);
    let mut session = Session::new();
    session.load(&path).unwrap();

    session.apply(Operation::Rotate90);
    assert_eq!(session.processed().unwrap().dimensions(), (50, 100));

    for _ in 0..3 {
        session.apply(Operation::Rotate90);
    }
    assert_eq!(session.processed().unwrap().dimensions(), (100, 50));
    assert_eq!(
        session.processed().unwrap().as_bytes(),
        session.original().unwrap().as_bytes()
    );
}

#[test]
fn reset_after_many_operations_restores_load_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "busy.png", 40, 30);
    let mut session = Session::new();
    session.load(&path).unwrap();
    let loaded = session.processed().unwrap().clone();

    for op in [
        Operation::Blur,
        Operation::Sharpen,
        Operation::FindEdges,
        Operation::Emboss,
        Operation::Brightness(2.5),
        Operation::Contrast(0.3),
        Operation::Grayscale,
        Operation::Rotate270,
        Operation::FlipHorizontal,
    ] {
        assert!(session.apply(op));
    }
    assert_ne!(session.processed().unwrap().dimensions(), loaded.dimensions());

    assert!(session.reset());
    assert_eq!(session.processed().unwrap().as_bytes(), loaded.as_bytes());
}

#[test]
fn failed_load_keeps_previous_session() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_fixture(dir.path(), "good.png", 10, 10);
    let bad = dir.path().join("broken.png");
    std::fs::write(&bad, b"this is not a png").unwrap();

    let mut session = Session::new();
    session.load(&good).unwrap();
    session.apply(Operation::FlipVertical);
    let before = session.processed().unwrap().clone();
    let events = session.subscribe();

    let err: LoadError = session.load(&bad).unwrap_err();
    assert_eq!(err.path, bad);
    assert_eq!(session.filename(), Some("good.png"));
    assert_eq!(session.processed().unwrap().as_bytes(), before.as_bytes());
    assert!(events.try_recv().is_err());
}

#[test]
fn png_save_then_reload_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "in.png", 33, 21);
    let mut session = Session::new();
    session.load(&path).unwrap();
    session.apply(Operation::Emboss);

    let out = dir.path().join("out.png");
    let written = session.save(&out, None).unwrap();
    assert_eq!(written, out);

    let mut reloaded = Session::new();
    reloaded.load(&written).unwrap();
    assert_eq!(
        reloaded.original().unwrap().to_rgb8().as_raw(),
        session.processed().unwrap().to_rgb8().as_raw()
    );
}

#[test]
fn jpeg_save_is_close_and_gets_default_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("smooth.png");
    RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8 * 3, y as u8 * 4, 128]))
        .save(&path)
        .unwrap();

    let mut session = Session::new();
    session.load(&path).unwrap();
    let written = session.save(&dir.path().join("export"), None).unwrap();
    assert_eq!(written.extension().unwrap(), "jpg");

    let mut reloaded = Session::new();
    reloaded.load(&written).unwrap();
    let decoded = reloaded.original().unwrap();
    assert_eq!(decoded.dimensions(), (64, 48));
    assert!(mean_abs_diff(decoded, session.processed().unwrap()) < 4.0);
}

#[test]
fn jpeg_save_of_transparent_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alpha.png");
    RgbaImage::from_pixel(8, 8, Rgba([200, 10, 10, 90]))
        .save(&path)
        .unwrap();

    let mut session = Session::new();
    session.load(&path).unwrap();
    let written = session
        .save(&dir.path().join("flat.jpeg"), Some(OutputFormat::Jpeg))
        .unwrap();
    assert!(written.exists());
}

#[test]
fn unsupported_extension_is_save_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "in.png", 4, 4);
    let mut session = Session::new();
    session.load(&path).unwrap();

    let result = session.save(&dir.path().join("out.gif"), None);
    assert!(matches!(result, Err(SaveError::UnsupportedFormat(_))));
}

#[test]
fn events_follow_user_actions() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "ev.png", 6, 6);
    let mut session = Session::new();
    let events = session.subscribe();

    session.apply(Operation::Blur);
    session.load(&path).unwrap();
    session.apply(Operation::Grayscale);
    session.reset();
    session.save(&dir.path().join("ev_out.bmp"), None).unwrap();

    let received: Vec<String> = events.try_iter().map(|e| e.status_text()).collect();
    assert_eq!(
        received,
        vec![
            "Loaded: ev.png",
            "Applied: Grayscale Conversion",
            "Reset to original image",
            "Saved to: ev_out.bmp",
        ]
    );
    assert!(events.try_recv().is_err());
}

#[test]
fn explicit_format_conflicting_with_extension_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "in.png", 5, 5);
    let mut session = Session::new();
    session.load(&path).unwrap();
    let events = session.subscribe();

    let target = dir.path().join("out.jpg");
    let result = session.save(&target, Some(OutputFormat::Png));
    assert!(matches!(result, Err(SaveError::FormatMismatch { .. })));
    assert!(!target.exists());
    assert!(events.try_recv().is_err());

    let written = session.save(&dir.path().join("out"), Some(OutputFormat::Png)).unwrap();
    assert_eq!(written, dir.path().join("out.png"));
    assert_eq!(
        image::ImageFormat::from_path(&written).unwrap(),
        image::ImageFormat::Png
    );
    assert_eq!(image::open(&written).unwrap().to_rgb8().as_raw(), session.processed().unwrap().to_rgb8().as_raw());
}
