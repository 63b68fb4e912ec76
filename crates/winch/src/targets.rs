//! Watch-target resolution shared by the coordinators

use winch_core::{WinchContext, WinchError};
use winch_dom::{Document, EventKind, EventTarget, ListenerId, NodeId};

/// Resolve a comma-separated selector list, in list order.
///
/// Each entry is queried on its own against `scope`'s descendants, or the
/// whole document when `scope` is `None`. Blank entries are skipped. The
/// first malformed entry fails the whole list.
pub(crate) fn resolve(doc: &Document, scope: Option<NodeId>, list: &str) -> Result<Vec<NodeId>, WinchError> {
    let mut nodes = Vec::new();
    for selector in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let found = match scope {
            Some(scope) => doc.query_selector_all_in(scope, selector),
            None => doc.query_selector_all(selector),
        }
        .map_err(|_| WinchError::InvalidSelector {
            selector: selector.to_string(),
        })?;
        nodes.extend(found);
    }
    Ok(nodes)
}

/// Listen for `kinds` on `target`; each event requests a throttled validation
pub(crate) fn watch(ctx: &WinchContext, doc: &Document, target: EventTarget, kinds: &[EventKind]) -> Vec<ListenerId> {
    kinds
        .iter()
        .map(|kind| {
            let ctx = ctx.clone();
            doc.add_event_listener(target, *kind, move |event| {
                tracing::trace!("{} on {:?}", event.kind.name(), event.target);
                ctx.trigger_validation();
            })
        })
        .collect()
}
