//! winch demo - Scroll a synthetic gallery and watch images load
//!
//! `RUST_LOG=debug winch-demo` shows registration and sweep detail.

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use winch::{Config, DOMRect, Document, EventKind, EventTarget, Mount, WinchContext};

const IMAGES: usize = 24;
const ROW_HEIGHT: f64 = 320.0;
const SCROLL_STEP: f64 = 240.0;
const FRAME: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_json(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };

    let ctx = WinchContext::new(config);
    let doc = gallery();
    let mount = Mount::scan(&ctx, &doc, &Default::default());

    tracing::info!("scrolling {} images", IMAGES);
    smol::block_on(async {
        let mut frame = 0u64;
        while mount.images().iter().any(|image| !image.is_loaded()) {
            smol::Timer::after(FRAME).await;
            frame += 1;

            // Scroll every sixth frame (~10 times a second)
            if frame % 6 == 0 {
                doc.translate_subtree(doc.body(), 0.0, -SCROLL_STEP);
                doc.dispatch(EventTarget::Window, EventKind::Scroll);
            }
            ctx.event_loop().tick(FRAME.as_millis() as u64);
        }
    });

    for image in mount.images() {
        tracing::info!("{:?} loaded: {}", image.node(), image.source_url().unwrap_or_default());
    }
    tracing::info!("all images loaded after {} ms", ctx.event_loop().now());
    mount.dispose();
    Ok(())
}

fn gallery() -> Document {
    let doc = Document::new("https://images.example.com/gallery/");
    doc.set_window_size(1024.0, 768.0);

    let master = doc.create_element("div");
    doc.set_attribute(master, "winch-master", "");
    doc.append_child(doc.body(), master);

    for i in 0..IMAGES {
        let image = doc.create_element("winch-img");
        doc.set_attribute(image, "data-src", &format!("photo-{:02}.jpg", i));
        doc.set_bounding_rect(image, DOMRect::from_xywh(0.0, i as f64 * ROW_HEIGHT, 1024.0, 300.0));
        doc.append_child(doc.body(), image);
    }
    doc
}
