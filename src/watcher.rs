use crate::popup::{Point, PointerTarget, PopupHandle};
use crate::translate::Translator;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub target: PointerTarget,
}

/// Called after a translation lands so the host can redraw.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// Turns pointer releases over the page into translation requests.
pub struct SelectionWatcher {
    popup: PopupHandle,
    translator: Arc<dyn Translator>,
    runtime: Handle,
    notify: Notify,
}

impl SelectionWatcher {
    pub fn new(
        popup: PopupHandle,
        translator: Arc<dyn Translator>,
        runtime: Handle,
        notify: Notify,
    ) -> Self {
        Self {
            popup,
            translator,
            runtime,
            notify,
        }
    }

    /// Returns the spawned translation task, or `None` when the release was
    /// on the popup itself or nothing was selected.
    pub fn on_pointer_release(&self, event: PointerEvent, selection: &str) -> Option<JoinHandle<()>> {
        if event.target == PointerTarget::Popup {
            return None;
        }
        let text = selection.trim();
        if text.is_empty() {
            return None;
        }

        let request = self.popup.lock().show(event.position);
        tracing::info!(request, chars = text.chars().count(), "translating selection");

        let text = text.to_owned();
        let popup = self.popup.clone();
        let translator = Arc::clone(&self.translator);
        let notify = Arc::clone(&self.notify);
        Some(self.runtime.spawn(async move {
            let result = translator.translate(&text).await;
            let applied = popup.lock().resolve(request, result);
            if applied {
                tracing::debug!(request, "translation applied");
            }
            notify();
        }))
    }
}

/// Hides the popup on any press outside of it.
pub struct DismissWatcher {
    popup: PopupHandle,
}

impl DismissWatcher {
    pub fn new(popup: PopupHandle) -> Self {
        Self { popup }
    }

    pub fn on_pointer_press(&self, event: PointerEvent) -> bool {
        if event.target == PointerTarget::Popup {
            return false;
        }
        let mut popup = self.popup.lock();
        let was_visible = popup.visible();
        popup.hide();
        was_visible
    }
}
