// ============================================================================
// ASYNC RENDER PIPELINE: background tile rendering with channel completion
// ============================================================================
//
// Every submitted job is stamped with a generation number. Jobs run on the
// rayon pool and are never cancelled; the UI drains the channel without
// blocking and only installs a result that is newer than the one on screen.
// ============================================================================

use image::RgbaImage;
use std::sync::mpsc;
use std::sync::Arc;

use crate::ops::glyph::GlyphStamp;
use crate::ops::tiles::{TileSize, render_tiles};

/// Snapshot of the inputs a render job needs.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    pub source: Arc<RgbaImage>,
    pub tile_size: TileSize,
}

/// Result delivered from a background render job.
#[derive(Debug)]
pub struct RenderResult {
    pub generation: u64,
    pub tile_size: TileSize,
    pub image: RgbaImage,
}

enum RenderMessage {
    Completed(RenderResult),
    Panicked { generation: u64, message: String },
}

pub struct RenderQueue {
    sender: mpsc::Sender<RenderMessage>,
    receiver: mpsc::Receiver<RenderMessage>,
    glyph: Arc<GlyphStamp>,
    /// Generation of the most recently submitted job.
    latest_generation: u64,
    /// Generation of the result currently on screen (0 = none).
    displayed_generation: u64,
    /// Jobs submitted but not yet drained.
    pending_jobs: usize,
    /// Woken when a job finishes so the UI polls immediately.
    repaint: Option<egui::Context>,
}

impl RenderQueue {
    pub fn new(glyph: Arc<GlyphStamp>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            glyph,
            latest_generation: 0,
            displayed_generation: 0,
            pending_jobs: 0,
            repaint: None,
        }
    }

    /// Request a repaint of `ctx` whenever a job completes.
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    pub fn glyph(&self) -> &Arc<GlyphStamp> {
        &self.glyph
    }

    pub fn pending_jobs(&self) -> usize {
        self.pending_jobs
    }

    pub fn displayed_generation(&self) -> u64 {
        self.displayed_generation
    }

    /// Start a render job on the rayon pool. Returns the job's generation.
    pub fn submit(&mut self, request: RenderRequest) -> u64 {
        self.latest_generation += 1;
        let generation = self.latest_generation;
        self.pending_jobs += 1;

        let sender = self.sender.clone();
        let glyph = Arc::clone(&self.glyph);
        let repaint = self.repaint.clone();
        let RenderRequest { source, tile_size } = request;

        rayon::spawn(move || {
            let rendered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                render_tiles(&source, tile_size, &glyph)
            }));
            let msg = match rendered {
                Ok(image) => RenderMessage::Completed(RenderResult {
                    generation,
                    tile_size,
                    image,
                }),
                Err(panic_info) => {
                    let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "unknown panic payload".to_string()
                    };
                    RenderMessage::Panicked {
                        generation,
                        message,
                    }
                }
            };
            // Receiver gone means the window closed; nothing to do.
            let _ = sender.send(msg);
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });

        generation
    }

    /// Drain everything currently in the channel without blocking.
    ///
    /// Returns the newest completed result if it is newer than the one on
    /// screen; older results are dropped.
    pub fn drain_latest(&mut self) -> Option<RenderResult> {
        let mut newest: Option<RenderResult> = None;
        while let Ok(msg) = self.receiver.try_recv() {
            self.pending_jobs = self.pending_jobs.saturating_sub(1);
            match msg {
                RenderMessage::Completed(result) => {
                    if result.generation <= self.displayed_generation
                        || newest
                            .as_ref()
                            .is_some_and(|n| n.generation > result.generation)
                    {
                        crate::log_info!(
                            "Dropping stale render #{} ({})",
                            result.generation,
                            result.tile_size
                        );
                        continue;
                    }
                    newest = Some(result);
                }
                RenderMessage::Panicked {
                    generation,
                    message,
                } => {
                    crate::log_err!("Render #{} panicked: {}", generation, message);
                }
            }
        }

        if let Some(result) = &newest {
            self.displayed_generation = result.generation;
        }
        newest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::time::{Duration, Instant};

    fn request(w: u32, h: u32, tile: u32) -> RenderRequest {
        let img = RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        RenderRequest {
            source: Arc::new(img),
            tile_size: TileSize::new(tile).unwrap(),
        }
    }

    /// Poll until every submitted job has been drained, keeping the last result.
    fn drain_all(queue: &mut RenderQueue) -> Option<RenderResult> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut last = None;
        while queue.pending_jobs() > 0 {
            assert!(Instant::now() < deadline, "render jobs did not finish");
            if let Some(r) = queue.drain_latest() {
                last = Some(r);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        last
    }

    #[test]
    fn submitted_job_delivers_same_sized_image() {
        let mut queue = RenderQueue::new(Arc::new(GlyphStamp::fallback()));
        let generation = queue.submit(request(40, 30, 8));
        assert_eq!(generation, 1);
        let result = drain_all(&mut queue).expect("a result");
        assert_eq!(result.generation, 1);
        assert_eq!(result.tile_size.get(), 8);
        assert_eq!(result.image.dimensions(), (40, 30));
        assert_eq!(queue.displayed_generation(), 1);
    }

    #[test]
    fn empty_queue_drains_to_nothing() {
        let mut queue = RenderQueue::new(Arc::new(GlyphStamp::fallback()));
        assert!(queue.drain_latest().is_none());
        assert_eq!(queue.pending_jobs(), 0);
    }

    #[test]
    fn newest_generation_wins_after_a_burst() {
        let mut queue = RenderQueue::new(Arc::new(GlyphStamp::fallback()));
        for tile in [3, 9, 27, 5] {
            queue.submit(request(64, 64, tile));
        }
        let last = drain_all(&mut queue).expect("a result");
        assert_eq!(last.generation, 4);
        assert_eq!(last.tile_size.get(), 5);
        assert_eq!(queue.displayed_generation(), 4);
    }

    #[test]
    fn results_older_than_the_displayed_one_are_dropped() {
        let mut queue = RenderQueue::new(Arc::new(GlyphStamp::fallback()));
        queue.submit(request(16, 16, 4));
        drain_all(&mut queue);
        assert_eq!(queue.displayed_generation(), 1);

        // Inject a late result from an older generation straight into the channel.
        let stale = RenderResult {
            generation: 1,
            tile_size: TileSize::new(2).unwrap(),
            image: RgbaImage::new(1, 1),
        };
        queue.pending_jobs += 1;
        queue.sender.send(RenderMessage::Completed(stale)).unwrap();
        assert!(queue.drain_latest().is_none());
        assert_eq!(queue.pending_jobs(), 0);
    }

    #[test]
    fn older_result_arriving_after_newer_one_is_dropped() {
        let mut queue = RenderQueue::new(Arc::new(GlyphStamp::fallback()));
        for generation in [3, 2] {
            queue.pending_jobs += 1;
            queue
                .sender
                .send(RenderMessage::Completed(RenderResult {
                    generation,
                    tile_size: TileSize::new(generation as u32).unwrap(),
                    image: RgbaImage::new(2, 2),
                }))
                .unwrap();
        }

        let shown = queue.drain_latest().expect("newest result");
        assert_eq!(shown.generation, 3);
        assert_eq!(shown.tile_size.get(), 3);
        assert_eq!(queue.displayed_generation(), 3);
        assert_eq!(queue.pending_jobs(), 0);
    }

    #[test]
    fn panicked_job_is_counted_and_reported_without_result() {
        let mut queue = RenderQueue::new(Arc::new(GlyphStamp::fallback()));
        queue.pending_jobs += 1;
        queue
            .sender
            .send(RenderMessage::Panicked {
                generation: 1,
                message: "boom".to_string(),
            })
            .unwrap();
        assert!(queue.drain_latest().is_none());
        assert_eq!(queue.pending_jobs(), 0);
        assert_eq!(queue.displayed_generation(), 0);
    }
}
