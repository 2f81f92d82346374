//! End-to-end checks through the library: load from disk, gate, render in the
//! background, drain, save, and read back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use asciitiler::io::{SaveFormat, encode_and_write, load_image, load_startup_image};
use asciitiler::jobs::{RenderQueue, RenderResult};
use asciitiler::ops::glyph::GlyphStamp;
use asciitiler::ops::tiles::TileSize;
use asciitiler::state::Session;
use image::{Rgba, RgbaImage};

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 3) as u8, (y * 5) as u8, 200, 255]))
}

fn wait_for_result(queue: &mut RenderQueue) -> RenderResult {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut last = None;
    while queue.pending_jobs() > 0 {
        assert!(Instant::now() < deadline, "render did not finish");
        if let Some(r) = queue.drain_latest() {
            last = Some(r);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    last.expect("a rendered image")
}

#[test]
fn load_render_save_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    let src = gradient(57, 41);
    encode_and_write(&src, &input, SaveFormat::Png, 90).unwrap();

    let (placeholder, origin) = load_startup_image(&dir.path().join("read"));
    assert!(origin.is_none());
    let mut session = Session::from_startup(
        placeholder,
        origin,
        TileSize::default(),
        Duration::from_millis(100),
    );
    let mut queue = RenderQueue::new(Arc::new(GlyphStamp::fallback()));

    let request = session
        .load_path(&input, Instant::now())
        .unwrap()
        .expect("first request is accepted");
    queue.submit(request);
    let result = wait_for_result(&mut queue);

    assert_eq!(result.image.dimensions(), (57, 41));
    assert_eq!(result.image.get_pixel(19, 35), src.get_pixel(10, 30));
    assert_eq!(result.image, session.render_now(&GlyphStamp::fallback()));

    let output = dir.path().join("tiles.png");
    asciitiler::app::save_to(&result.image, &output).unwrap();
    assert_eq!(load_image(&output).unwrap(), result.image);
}

#[test]
fn throttled_slider_still_renders_the_accepted_size() {
    let mut session = Session::from_startup(
        gradient(30, 30),
        None,
        TileSize::default(),
        Duration::from_millis(100),
    );
    let mut queue = RenderQueue::new(Arc::new(GlyphStamp::fallback()));
    let t0 = Instant::now();

    let mut generations = Vec::new();
    for (i, size) in [4u32, 8, 12, 16].into_iter().enumerate() {
        let now = t0 + Duration::from_millis(20 * i as u64);
        if let Some(request) = session.set_tile_size(size, now).unwrap() {
            generations.push(queue.submit(request));
        }
    }
    assert_eq!(generations, vec![1]);

    let result = wait_for_result(&mut queue);
    assert_eq!(result.tile_size.get(), 4);
    assert_eq!(session.tile_size().get(), 16);
}
