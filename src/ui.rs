use crate::clipboard::{ClipboardBackend, SystemClipboard};
use crate::popup::{Bounds, Point, PopupHandle};
use crate::translate::Translator;
use crate::watcher::{DismissWatcher, Notify, PointerEvent, SelectionWatcher};
use eframe::egui;
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;

const TITLE: &str = "jaen-popup";
const POPUP_MAX_WIDTH: f32 = 360.0;
const WELCOME_TEXT: &str = "Copy some text, press Reload, then select part of it to translate.\n\
テキストをコピーして再読み込みを押し、翻訳したい部分を選択してください。";

const CJK_FONT_CANDIDATES: &[&str] = &[
    r"C:\Windows\Fonts\YuGothM.ttc",
    r"C:\Windows\Fonts\meiryo.ttc",
    r"C:\Windows\Fonts\msgothic.ttc",
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
];

fn to_point(p: egui::Pos2) -> Point {
    Point::new(p.x, p.y)
}

/// Slice of `text` between two char offsets, in either order.
fn char_slice(text: &str, a: usize, b: usize) -> &str {
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    let byte_at = |idx: usize| {
        text.char_indices()
            .nth(idx)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };
    &text[byte_at(start)..byte_at(end)]
}

/// The read-only page the user selects text in.
///
/// The selection survives a drag that leaves the view, so a release past the
/// last line still sees it. A press outside the view drops it.
struct PageView {
    text: String,
    selection: String,
    rect: Option<egui::Rect>,
    armed: bool,
}

impl PageView {
    fn new(text: String) -> Self {
        Self {
            text,
            selection: String::new(),
            rect: None,
            armed: false,
        }
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
        self.selection.clear();
        self.armed = false;
    }

    /// Draws the page and returns the current selection.
    fn show(&mut self, ui: &mut egui::Ui) -> &str {
        let press = ui.input(|i| {
            if i.pointer.any_pressed() {
                i.pointer.interact_pos()
            } else {
                None
            }
        });
        if let Some(pos) = press {
            // Compared against last frame's rectangle.
            self.armed = self.rect.is_some_and(|r| r.contains(pos));
            if !self.armed {
                self.selection.clear();
            }
        }

        let text = self.text.as_str();
        let mut view: &str = text;
        let mut rect = None;
        let mut range = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let output = egui::TextEdit::multiline(&mut view)
                    .desired_width(f32::INFINITY)
                    .show(ui);
                rect = Some(output.response.rect);
                range = output.cursor_range.map(|r| {
                    let c = r.as_ccursor_range();
                    (c.primary.index, c.secondary.index)
                });
            });
        if self.armed {
            if let Some((a, b)) = range {
                self.selection = char_slice(text, a, b).to_string();
            }
        }
        self.rect = rect;
        &self.selection
    }
}

struct PopupApp {
    page: PageView,
    popup: PopupHandle,
    selection: SelectionWatcher,
    dismiss: DismissWatcher,
    clipboard: SystemClipboard,
    fonts_set: bool,
}

impl PopupApp {
    fn new(
        popup: PopupHandle,
        translator: Arc<dyn Translator>,
        runtime: Handle,
        notify: Notify,
    ) -> Self {
        let mut app = Self {
            page: PageView::new(String::new()),
            selection: SelectionWatcher::new(popup.clone(), translator, runtime, notify),
            dismiss: DismissWatcher::new(popup.clone()),
            popup,
            clipboard: SystemClipboard::new(),
            fonts_set: false,
        };
        app.reload_page();
        app
    }

    fn reload_page(&mut self) {
        match self.clipboard.read_text() {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!(chars = text.chars().count(), "page loaded from clipboard");
                self.page.set_text(text);
            }
            Ok(_) => self.page.set_text(WELCOME_TEXT.to_string()),
            Err(err) => {
                tracing::warn!(%err, "could not read clipboard for page");
                self.page.set_text(WELCOME_TEXT.to_string());
            }
        }
    }

    fn ensure_fonts(&mut self, ctx: &egui::Context) {
        if self.fonts_set {
            return;
        }
        self.fonts_set = true;
        let loaded = CJK_FONT_CANDIDATES
            .iter()
            .find_map(|path| fs::read(path).ok().map(|bytes| (*path, bytes)));
        match loaded {
            Some((path, bytes)) => {
                let mut fonts = egui::FontDefinitions::default();
                fonts
                    .font_data
                    .insert("cjk".to_owned(), egui::FontData::from_owned(bytes));
                fonts
                    .families
                    .entry(egui::FontFamily::Proportional)
                    .or_default()
                    .push("cjk".to_owned());
                fonts
                    .families
                    .entry(egui::FontFamily::Monospace)
                    .or_default()
                    .push("cjk".to_owned());
                ctx.set_fonts(fonts);
                tracing::info!(path, "loaded CJK font");
            }
            None => tracing::warn!("no CJK font found; Japanese may render as boxes"),
        }
    }

    fn pointer_event(&self, pos: egui::Pos2) -> PointerEvent {
        let position = to_point(pos);
        let target = self.popup.lock().hit_test(position);
        PointerEvent { position, target }
    }

    fn popup_view(&mut self, ctx: &egui::Context) {
        let state = self.popup.lock().clone();
        if !state.visible() {
            return;
        }
        let pos = state.position();
        let mut copy_clicked = false;
        let area = egui::Area::new(egui::Id::new("translation_popup"))
            .order(egui::Order::Foreground)
            .fixed_pos(egui::pos2(pos.x, pos.y))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(POPUP_MAX_WIDTH);
                    ui.label(state.content().text());
                    if state.copy_visible() && ui.button(state.copy_label()).clicked() {
                        copy_clicked = true;
                    }
                });
            });
        let rect = area.response.rect;
        self.popup.lock().set_bounds(Bounds {
            min: to_point(rect.min),
            max: to_point(rect.max),
        });

        if copy_clicked {
            let now = Instant::now();
            let copied = self.popup.lock().copy(&mut self.clipboard, now);
            match copied {
                Ok(true) => tracing::info!("translation copied to clipboard"),
                Ok(false) => {}
                Err(err) => tracing::warn!(%err, "failed to copy translation"),
            }
        }
    }
}

impl eframe::App for PopupApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_fonts(ctx);

        let now = Instant::now();
        {
            let mut popup = self.popup.lock();
            popup.tick(now);
            if let Some(deadline) = popup.feedback_deadline() {
                ctx.request_repaint_after(deadline.saturating_duration_since(now));
            }
        }

        let (pressed, released, pos) = ctx.input(|i| {
            (
                i.pointer.any_pressed(),
                i.pointer.any_released(),
                i.pointer.interact_pos(),
            )
        });
        // Hit-test against the popup rectangle from the previous frame.
        let event = pos.map(|p| self.pointer_event(p));
        if let (true, Some(ev)) = (pressed, event) {
            if self.dismiss.on_pointer_press(ev) {
                tracing::debug!("popup dismissed");
            }
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Page");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Reload").clicked() {
                        self.reload_page();
                    }
                });
            });
        });

        let mut selected = String::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            selected = self.page.show(ui).to_owned();
        });

        if let (true, Some(ev)) = (released, event) {
            // The task is detached; its result lands through the popup handle.
            let _ = self.selection.on_pointer_release(ev, &selected);
        }

        self.popup_view(ctx);
    }
}

/// Runs the page window on the calling thread until it is closed.
pub fn run(
    popup: PopupHandle,
    translator: Arc<dyn Translator>,
    runtime: Handle,
) -> anyhow::Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITLE)
            .with_inner_size([720.0, 520.0])
            .with_always_on_top(),
        ..Default::default()
    };
    tracing::info!("starting UI event loop");
    eframe::run_native(
        TITLE,
        native_options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let notify: Notify = Arc::new(move || ctx.request_repaint());
            Box::new(PopupApp::new(popup, translator, runtime, notify))
        }),
    )
    .map_err(|e| anyhow::anyhow!("UI event loop failed: {e}"))?;
    tracing::info!("UI event loop exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{char_slice, PageView};
    use eframe::egui;

    struct Frames {
        ctx: egui::Context,
        time: f64,
    }

    impl Frames {
        fn new() -> Self {
            Self {
                ctx: egui::Context::default(),
                time: 0.0,
            }
        }

        /// Runs one frame with `events` and returns what the page reports as
        /// selected.
        fn run(&mut self, page: &mut PageView, events: Vec<egui::Event>) -> String {
            self.time += 0.1;
            let input = egui::RawInput {
                screen_rect: Some(egui::Rect::from_min_size(
                    egui::Pos2::ZERO,
                    egui::vec2(640.0, 480.0),
                )),
                time: Some(self.time),
                events,
                ..Default::default()
            };
            let mut selected = String::new();
            let _ = self.ctx.run(input, |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    selected = page.show(ui).to_owned();
                });
            });
            selected
        }
    }

    fn button(pos: egui::Pos2, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::NONE,
        }
    }

    /// Drags from the first character to past the bottom of the view and
    /// returns the selection read on the release frame, plus the release
    /// point.
    fn drag_past_bottom(frames: &mut Frames, page: &mut PageView) -> (String, egui::Pos2) {
        frames.run(page, vec![]);
        let rect = page.rect.expect("page laid out");
        let start = rect.min + egui::vec2(4.5, 6.0);
        let across = start + egui::vec2(60.0, 0.0);
        let below = egui::pos2(across.x, rect.max.y + 80.0);

        frames.run(page, vec![egui::Event::PointerMoved(start), button(start, true)]);
        frames.run(page, vec![egui::Event::PointerMoved(across)]);
        frames.run(page, vec![egui::Event::PointerMoved(below)]);
        let selected = frames.run(page, vec![button(below, false)]);
        (selected, below)
    }

    #[test]
    fn char_slice_handles_multibyte_and_reversed_ranges() {
        let text = "今日はgood天気";
        assert_eq!(char_slice(text, 0, 3), "今日は");
        assert_eq!(char_slice(text, 7, 3), "good");
        assert_eq!(char_slice(text, 7, 99), "天気");
        assert_eq!(char_slice(text, 2, 2), "");
    }

    #[test]
    fn release_below_the_view_keeps_the_selection() {
        let mut frames = Frames::new();
        let mut page = PageView::new("hello world\nsecond line".to_string());
        let (selected, below) = drag_past_bottom(&mut frames, &mut page);

        assert!(!page.rect.unwrap().contains(below));
        assert!(selected.starts_with("hello world"), "{selected:?}");
    }

    #[test]
    fn press_outside_the_view_drops_the_selection() {
        let mut frames = Frames::new();
        let mut page = PageView::new("hello world\nsecond line".to_string());
        let (selected, below) = drag_past_bottom(&mut frames, &mut page);
        assert!(!selected.is_empty());

        let after = frames.run(
            &mut page,
            vec![egui::Event::PointerMoved(below), button(below, true), button(below, false)],
        );
        assert_eq!(after, "");
    }

    #[test]
    fn new_text_starts_without_selection() {
        let mut frames = Frames::new();
        let mut page = PageView::new("hello world".to_string());
        drag_past_bottom(&mut frames, &mut page);
        page.set_text("別のページ".to_string());
        assert_eq!(frames.run(&mut page, vec![]), "");
    }
}
