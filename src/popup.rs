use crate::clipboard::{ClipboardBackend, ClipboardResult};
use crate::translate::TranslationResult;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const LOADING_TEXT: &str = "翻訳中...";
pub const FAILED_TEXT: &str = "翻訳に失敗しました";
pub const COPY_LABEL: &str = "コピー";
pub const COPIED_LABEL: &str = "完了！";

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Where a pointer event landed relative to the popup surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Popup,
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PopupContent {
    #[default]
    Idle,
    Loading,
    Translated(String),
    Failed,
}

impl PopupContent {
    /// The text shown in the result area.
    pub fn text(&self) -> &str {
        match self {
            PopupContent::Idle => "",
            PopupContent::Loading => LOADING_TEXT,
            PopupContent::Translated(s) => s,
            PopupContent::Failed => FAILED_TEXT,
        }
    }
}

impl From<TranslationResult> for PopupContent {
    fn from(result: TranslationResult) -> Self {
        match result {
            TranslationResult::Translated(s) => PopupContent::Translated(s),
            TranslationResult::Failed => PopupContent::Failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PopupState {
    visible: bool,
    position: Point,
    content: PopupContent,
    copy_visible: bool,
    copy_feedback_until: Option<Instant>,
    generation: RequestId,
    bounds: Option<Bounds>,
    offset_y: f32,
    feedback: Duration,
}

impl PopupState {
    pub fn new(offset_y: f32, feedback: Duration) -> Self {
        Self {
            visible: false,
            position: Point::default(),
            content: PopupContent::Idle,
            copy_visible: false,
            copy_feedback_until: None,
            generation: 0,
            bounds: None,
            offset_y,
            feedback,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn content(&self) -> &PopupContent {
        &self.content
    }

    pub fn copy_visible(&self) -> bool {
        self.copy_visible
    }

    pub fn copy_feedback_active(&self) -> bool {
        self.copy_feedback_until.is_some()
    }

    pub fn copy_label(&self) -> &'static str {
        if self.copy_feedback_active() {
            COPIED_LABEL
        } else {
            COPY_LABEL
        }
    }

    /// Deadline of the copy feedback, if one is running.
    pub fn feedback_deadline(&self) -> Option<Instant> {
        self.copy_feedback_until
    }

    /// Opens the popup in its loading state just below `at` and starts a new
    /// request generation.
    pub fn show(&mut self, at: Point) -> RequestId {
        self.generation += 1;
        self.visible = true;
        self.position = Point::new(at.x, at.y + self.offset_y);
        self.content = PopupContent::Loading;
        self.copy_visible = false;
        self.generation
    }

    pub fn set_result(&mut self, result: TranslationResult) {
        self.copy_visible = result.is_translated();
        self.content = result.into();
    }

    /// Applies `result` only if `request` is still the latest generation.
    pub fn resolve(&mut self, request: RequestId, result: TranslationResult) -> bool {
        if request != self.generation {
            tracing::debug!(request, latest = self.generation, "dropping stale translation");
            return false;
        }
        self.set_result(result);
        true
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Records the on-screen rectangle the popup was last drawn in.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = Some(bounds);
    }

    pub fn hit_test(&self, p: Point) -> PointerTarget {
        match self.bounds {
            Some(b) if self.visible && b.contains(p) => PointerTarget::Popup,
            _ => PointerTarget::Page,
        }
    }

    /// Copies the displayed translation. Returns `Ok(false)` without touching
    /// the clipboard or the feedback when there is nothing to copy.
    pub fn copy(
        &mut self,
        clipboard: &mut dyn ClipboardBackend,
        now: Instant,
    ) -> ClipboardResult<bool> {
        let text = self.content.text();
        if !self.copy_visible || text.is_empty() || text == LOADING_TEXT {
            return Ok(false);
        }
        clipboard.write_text(text)?;
        self.copy_feedback_until = Some(now + self.feedback);
        Ok(true)
    }

    /// Reverts the copy label once its feedback deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if matches!(self.copy_feedback_until, Some(deadline) if now >= deadline) {
            self.copy_feedback_until = None;
        }
    }
}

/// Shared handle to the single popup state.
#[derive(Debug, Clone)]
pub struct PopupHandle(Arc<Mutex<PopupState>>);

impl PopupHandle {
    pub fn new(state: PopupState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub fn lock(&self) -> MutexGuard<'_, PopupState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
