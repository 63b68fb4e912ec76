//! Lazy image placeholder
//!
//! Stands in for an image until it scrolls into view. On create it tags
//! itself not-loaded, subscribes to the validate bus and registers its
//! source URL with the visibility registry, retrying while the URL is
//! unavailable. Loading swaps in a real `<img>` and the placeholder tears
//! itself down shortly after.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use winch_core::{ElementBox, LoadCallback, SubscriptionId, TimerId, Validator, WinchContext};
use winch_dom::{Document, NodeId};

/// Class present until the image loads
pub const NOT_LOADED_CLASS: &str = "winch-img-not-loaded";
/// Class swapped in on load
pub const LOADED_CLASS: &str = "winch-img-loaded";
/// Class on the generated `<img>`
pub const IMAGE_CLASS: &str = "winch-img";
/// Source attributes, in precedence order
pub const SOURCE_ATTRIBUTES: [&str; 4] = ["src", "data-src", "img-src", "data-img-src"];

/// Bound source expression; `None` defers to the source attributes
pub type SourceFn = Rc<dyn Fn() -> Option<String>>;
/// On-loaded hook; errors are logged and dropped
pub type LoadedHook = Rc<dyn Fn() -> anyhow::Result<()>>;

/// Placeholder options
#[derive(Clone, Default)]
pub struct LazyImageOptions {
    pub source: Option<SourceFn>,
    /// Extra class for the generated `<img>`
    pub load_class: Option<String>,
    pub on_loaded: Option<LoadedHook>,
}

impl fmt::Debug for LazyImageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyImageOptions")
            .field("source", &self.source.is_some())
            .field("load_class", &self.load_class)
            .field("on_loaded", &self.on_loaded.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct Lifecycle {
    loaded: bool,
    disposed: bool,
    attempts: u32,
    retry_timer: Option<TimerId>,
    teardown_timer: Option<TimerId>,
    subscription: Option<SubscriptionId>,
}

struct Inner {
    ctx: WinchContext,
    doc: Document,
    node: NodeId,
    options: LazyImageOptions,
    lifecycle: RefCell<Lifecycle>,
}

/// Lazy image component handle.
///
/// A pending retry timer and the registry entry keep the component alive
/// until it loads, so dropping every handle does not stop the lifecycle.
/// Only the validate bus holds a weak reference.
#[derive(Clone)]
pub struct LazyImage {
    inner: Rc<Inner>,
}

impl LazyImage {
    /// Attach a placeholder to `node` and make the first registration attempt
    pub fn create(ctx: &WinchContext, doc: &Document, node: NodeId, options: LazyImageOptions) -> Self {
        let image = Self {
            inner: Rc::new(Inner {
                ctx: ctx.clone(),
                doc: doc.clone(),
                node,
                options,
                lifecycle: RefCell::new(Lifecycle::default()),
            }),
        };
        doc.add_class(node, NOT_LOADED_CLASS);

        let weak = image.downgrade();
        let subscription = ctx.bus().subscribe(move || {
            if let Some(image) = upgrade(&weak) {
                image.on_validate();
            }
        });
        image.inner.lifecycle.borrow_mut().subscription = Some(subscription);

        image.register(1);
        image
    }

    fn downgrade(&self) -> Weak<Inner> {
        Rc::downgrade(&self.inner)
    }

    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    /// Resolved source URL: the bound expression first, then the source
    /// attributes, joined onto the document base
    pub fn source_url(&self) -> Option<String> {
        let Inner { doc, node, options, .. } = &*self.inner;
        let raw = options
            .source
            .as_ref()
            .and_then(|source| source())
            .or_else(|| {
                SOURCE_ATTRIBUTES
                    .iter()
                    .filter_map(|name| doc.get_attribute(*node, name))
                    .find(|value| !value.is_empty())
            })?;
        if raw.is_empty() {
            return None;
        }
        Some(doc.resolve_url(&raw))
    }

    pub fn bounding_box(&self) -> ElementBox {
        self.inner.doc.bounding_client_rect(self.inner.node).into()
    }

    pub fn is_visible(&self) -> bool {
        winch_core::is_visible(&self.bounding_box(), &self.inner.ctx.viewport().master_box())
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.lifecycle.borrow().loaded
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.lifecycle.borrow().disposed
    }

    /// Registration attempts made so far
    pub fn attempts(&self) -> u32 {
        self.inner.lifecycle.borrow().attempts
    }

    fn register(&self, attempt: u32) {
        {
            let mut lifecycle = self.inner.lifecycle.borrow_mut();
            if lifecycle.disposed {
                return;
            }
            lifecycle.attempts = attempt;
            lifecycle.retry_timer = None;
        }

        let ctx = &self.inner.ctx;
        let url = self.source_url();
        let registered = match &url {
            Some(url) => ctx.registry().register(url, self.load_callback(), self.validator()),
            None => false,
        };
        if registered {
            tracing::debug!("registered {} on attempt {}", url.unwrap_or_default(), attempt);
            return;
        }

        let config = ctx.config();
        if attempt < config.register_max_attempts {
            tracing::trace!("registration attempt {} refused, retrying", attempt);
            let image = self.clone();
            let timer = ctx
                .event_loop()
                .set_timeout(config.register_retry_interval_ms, move || image.register(attempt + 1));
            self.inner.lifecycle.borrow_mut().retry_timer = Some(timer);
        } else {
            tracing::debug!("registration refused {} times, loading directly", attempt);
            self.load_self();
        }
    }

    // The registry drops both closures when the key fires
    fn load_callback(&self) -> LoadCallback {
        let image = self.clone();
        Rc::new(move || {
            image.load_self();
        })
    }

    fn validator(&self) -> Validator {
        let image = self.clone();
        Rc::new(move || !image.is_disposed() && image.is_visible())
    }

    fn on_validate(&self) {
        if !self.is_visible() {
            return;
        }
        self.load_self();
        if let Some(url) = self.source_url() {
            self.inner.ctx.registry().fire(&url);
        }
    }

    /// Swap in the real image. Runs once; returns false on later calls.
    pub fn load_self(&self) -> bool {
        let retry = {
            let mut lifecycle = self.inner.lifecycle.borrow_mut();
            if lifecycle.loaded || lifecycle.disposed {
                return false;
            }
            lifecycle.loaded = true;
            lifecycle.retry_timer.take()
        };
        let Inner { ctx, doc, node, options, .. } = &*self.inner;
        if let Some(timer) = retry {
            ctx.event_loop().clear_timeout(timer);
        }

        doc.add_class(*node, LOADED_CLASS);
        doc.remove_class(*node, NOT_LOADED_CLASS);

        let img = doc.create_element("img");
        doc.add_class(img, IMAGE_CLASS);
        if let Some(class) = &options.load_class {
            doc.add_class(img, class);
        }
        let url = self.source_url();
        if let Some(url) = &url {
            doc.set_attribute(img, "src", url);
        }
        doc.remove_children(*node);
        doc.append_child(*node, img);
        tracing::debug!("loaded {}", url.as_deref().unwrap_or("<no source>"));

        if let Some(hook) = &options.on_loaded {
            if let Err(err) = hook() {
                tracing::warn!("img-loaded hook failed: {:#}", err);
            }
        }

        let image = self.clone();
        let teardown = ctx.event_loop().set_timeout(ctx.config().teardown_delay_ms, move || image.dispose());
        self.inner.lifecycle.borrow_mut().teardown_timer = Some(teardown);
        true
    }

    /// Cancel pending timers and leave the validate bus
    pub fn dispose(&self) {
        let (retry, teardown, subscription) = {
            let mut lifecycle = self.inner.lifecycle.borrow_mut();
            if lifecycle.disposed {
                return;
            }
            lifecycle.disposed = true;
            (
                lifecycle.retry_timer.take(),
                lifecycle.teardown_timer.take(),
                lifecycle.subscription.take(),
            )
        };
        let ctx = &self.inner.ctx;
        for timer in [retry, teardown].into_iter().flatten() {
            ctx.event_loop().clear_timeout(timer);
        }
        if let Some(subscription) = subscription {
            ctx.bus().unsubscribe(subscription);
        }
        tracing::trace!("placeholder {:?} disposed", self.inner.node);
    }
}

fn upgrade(weak: &Weak<Inner>) -> Option<LazyImage> {
    weak.upgrade().map(|inner| LazyImage { inner })
}

impl fmt::Debug for LazyImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyImage")
            .field("node", &self.inner.node)
            .field("options", &self.inner.options)
            .field("lifecycle", &*self.inner.lifecycle.borrow())
            .finish()
    }
}
