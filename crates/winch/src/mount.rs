//! Markup mount
//!
//! Scans a document for winch markers and builds the matching components.
//! Markers may carry a `data-` prefix.
//!
//! | marker                      | component           | value                     |
//! |-----------------------------|---------------------|---------------------------|
//! | `winch-master`              | `GlobalCoordinator` | surrogate selector list   |
//! | `winch-scroll-trigger`      | `LocalCoordinator`  | descendant selector list  |
//! | `<winch-img>` / `winch-img` | `LazyImage`         | -                         |
//!
//! Placeholders also read `winch-img-class` (extra class for the loaded
//! `<img>`) and `img-loaded` (name of a hook from the mount's hook table).

use std::collections::HashMap;

use winch_core::WinchContext;
use winch_dom::{Document, NodeId};

use crate::master::GlobalCoordinator;
use crate::placeholder::{LazyImage, LazyImageOptions, LoadedHook};
use crate::scroll_trigger::LocalCoordinator;

const MASTER_SELECTOR: &str = "[winch-master], [data-winch-master]";
const TRIGGER_SELECTOR: &str = "[winch-scroll-trigger], [data-winch-scroll-trigger]";
const IMAGE_SELECTOR: &str = "winch-img, [winch-img], [data-winch-img]";

/// Components built from one document scan
#[derive(Debug, Default)]
pub struct Mount {
    masters: Vec<GlobalCoordinator>,
    triggers: Vec<LocalCoordinator>,
    images: Vec<LazyImage>,
}

impl Mount {
    /// Build every marked component. Coordinators come first so the
    /// viewport is measured before placeholders register.
    pub fn scan(ctx: &WinchContext, doc: &Document, hooks: &HashMap<String, LoadedHook>) -> Self {
        let masters = query(doc, MASTER_SELECTOR)
            .into_iter()
            .map(|node| {
                let surrogates = marker(doc, node, "winch-master");
                GlobalCoordinator::attach(ctx, doc, surrogates.as_deref())
            })
            .collect();

        let triggers = query(doc, TRIGGER_SELECTOR)
            .into_iter()
            .map(|node| {
                let selectors = marker(doc, node, "winch-scroll-trigger");
                LocalCoordinator::attach(ctx, doc, node, selectors.as_deref())
            })
            .collect();

        let images: Vec<LazyImage> = query(doc, IMAGE_SELECTOR)
            .into_iter()
            .map(|node| LazyImage::create(ctx, doc, node, image_options(doc, node, hooks)))
            .collect();

        tracing::info!("mounted {} lazy images", images.len());
        Self {
            masters,
            triggers,
            images,
        }
    }

    pub fn masters(&self) -> &[GlobalCoordinator] {
        &self.masters
    }

    pub fn triggers(&self) -> &[LocalCoordinator] {
        &self.triggers
    }

    pub fn images(&self) -> &[LazyImage] {
        &self.images
    }

    /// Dispose every component
    pub fn dispose(&self) {
        for master in &self.masters {
            master.dispose();
        }
        for trigger in &self.triggers {
            trigger.dispose();
        }
        for image in &self.images {
            image.dispose();
        }
    }
}

fn query(doc: &Document, selector: &str) -> Vec<NodeId> {
    doc.query_selector_all(selector).unwrap_or_default()
}

/// Non-empty marker value, plain or `data-` prefixed
fn marker(doc: &Document, node: NodeId, name: &str) -> Option<String> {
    doc.get_attribute(node, name)
        .or_else(|| doc.get_attribute(node, &format!("data-{}", name)))
        .filter(|value| !value.trim().is_empty())
}

fn image_options(doc: &Document, node: NodeId, hooks: &HashMap<String, LoadedHook>) -> LazyImageOptions {
    let on_loaded = marker(doc, node, "img-loaded").and_then(|name| {
        let hook = hooks.get(name.trim()).cloned();
        if hook.is_none() {
            tracing::warn!("unknown img-loaded hook `{}`", name);
        }
        hook
    });
    LazyImageOptions {
        source: None,
        load_class: marker(doc, node, "winch-img-class"),
        on_loaded,
    }
}
