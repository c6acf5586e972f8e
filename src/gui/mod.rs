pub mod popup;
pub mod strip;

use crate::avatar::AvatarDrag;
use crate::capture::{CaptureBackend, ScreenFrameBackend};
use crate::composer::{Composer, CurrentUser, SaveOutcome, SaveProgress};
use crate::draw::overlay::INDICATOR_LABEL;
use crate::draw::toolbar::StripCommand;
use crate::errors::OverlayError;
use crate::handoff::{self, TagHandoff, TAG_HANDOFF_KEY};
use crate::markers::MarkerStore;
use crate::mode::{
    ClickOutcome, ClickTarget, DesiredCursor, InteractionMode, ModeController, SurfaceClick,
    SurfaceTarget,
};
use crate::notices::{self, NoticeKind};
use crate::providers::{AttachmentStorage, Notification, NotificationProvider, StaffMember};
use crate::settings::OverlaySettings;
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use popup::{DragEvent, TagPopupView};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strip::DrawStripView;

/// External collaborators the panel persists through.
pub struct Collaborators {
    pub storage: Arc<dyn AttachmentStorage>,
    pub provider: Arc<dyn NotificationProvider>,
}

struct SaveTask {
    rx: mpsc::Receiver<Result<SaveOutcome, OverlayError>>,
}

/// The host-facing annotation panel. The host drives it once per frame with
/// `show(ctx, is_open, on_close)`; everything else is self-contained.
pub struct OverlayPanel {
    user: CurrentUser,
    available_staff: Vec<StaffMember>,
    settings: OverlaySettings,
    collaborators: Collaborators,
    controller: ModeController,
    composer: Composer,
    markers: MarkerStore,
    avatar: AvatarDrag,
    capture_backend: Box<dyn CaptureBackend>,
    popup_view: TagPopupView,
    strip_view: DrawStripView,
    toasts: Toasts,
    save_task: Option<SaveTask>,
    sketch_texture: Option<egui::TextureHandle>,
    handoff_bubble: Option<TagHandoff>,
    panel_rect: Option<egui::Rect>,
    avatar_rect: Option<egui::Rect>,
    was_open: bool,
}

impl OverlayPanel {
    pub fn new(
        user: CurrentUser,
        available_staff: Vec<StaffMember>,
        settings: OverlaySettings,
        collaborators: Collaborators,
    ) -> Self {
        let mut composer = Composer::default();
        composer.set_screen_capture_limit(Duration::from_secs(settings.screen_capture_limit_secs));

        let mut controller = ModeController::new(1280.0, 800.0);
        controller.engine_mut().set_tool(settings.last_tool);
        controller.engine_mut().set_color(settings.last_color);
        controller.engine_mut().set_width(settings.last_width);

        Self {
            markers: MarkerStore::with_ttl(Duration::from_millis(settings.marker_ttl_ms)),
            handoff_bubble: handoff::take(TAG_HANDOFF_KEY),
            user,
            available_staff,
            settings,
            collaborators,
            controller,
            composer,
            avatar: AvatarDrag::default(),
            capture_backend: Box::new(ScreenFrameBackend),
            popup_view: TagPopupView::default(),
            strip_view: DrawStripView::default(),
            toasts: Toasts::new()
                .anchor(egui::Align2::RIGHT_BOTTOM, (-12.0, -12.0))
                .direction(egui::Direction::BottomUp),
            save_task: None,
            sketch_texture: None,
            panel_rect: None,
            avatar_rect: None,
            was_open: false,
        }
    }

    /// Inject a capture backend (a real recorder, or a mock).
    pub fn set_capture_backend(&mut self, backend: Box<dyn CaptureBackend>) {
        self.capture_backend = backend;
    }

    /// Open the composer pre-populated as a reply to `notification`.
    pub fn open_reply(&mut self, notification: &Notification) {
        self.composer.reply_from_notification(notification, &self.available_staff);
        let (vw, vh) = self.controller.viewport();
        let (x, y) = notification.coords.unwrap_or((vw / 2.0, vh / 2.0));
        match self.controller.open_popup_for_reply(x, y) {
            Ok((px, py)) => {
                self.composer.open_at(px, py);
                self.popup_view.sync_from(&self.composer);
            }
            Err(err) => tracing::error!(?err, "could not open reply popup"),
        }
    }

    pub fn show(&mut self, ctx: &egui::Context, is_open: bool, on_close: &mut dyn FnMut()) {
        let now = Instant::now();
        self.poll_save_task(now);

        if !is_open {
            if self.was_open {
                // Never leave stale popup or recording state across a
                // hide/show cycle.
                self.controller.host_closed();
                self.composer.host_closed();
                self.popup_view = TagPopupView::default();
                self.was_open = false;
                if let Err(err) = self.settings.save(&crate::settings::settings_path()) {
                    tracing::debug!(?err, "could not persist overlay settings");
                }
            }
            return;
        }
        self.was_open = true;

        let screen = ctx.screen_rect();
        self.controller.set_viewport(screen.width(), screen.height());
        self.composer.tick_captures(now);
        self.markers.tick(now);

        self.panel_ui(ctx, on_close);
        if self.controller.mode() == InteractionMode::Drawing {
            self.drawing_ui(ctx);
        }
        self.surface_click_ui(ctx);
        self.avatar_ui(ctx, screen);
        self.popup_ui(ctx, now);
        self.markers_ui(ctx);
        self.handoff_bubble_ui(ctx);
        self.toasts_ui(ctx);
        self.apply_cursor(ctx);

        // Keep TTL sweeps and capture pumps running while idle.
        ctx.request_repaint_after(Duration::from_millis(250));
    }

    fn panel_ui(&mut self, ctx: &egui::Context, on_close: &mut dyn FnMut()) {
        let response = egui::SidePanel::right("tag_overlay_panel")
            .default_width(250.0)
            .resizable(true)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Collaboration");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("✕").clicked() {
                            on_close();
                        }
                    });
                });
                ui.separator();

                let drawing = self.controller.mode() == InteractionMode::Drawing;
                if drawing && self.controller.tag_drop_logically_armed() {
                    ui.label(
                        egui::RichText::new("Tag drop temporarily disabled while drawing.")
                            .italics(),
                    );
                } else {
                    let armed = self.controller.tag_drop_armed();
                    let label = if armed { "Cancel tag drop" } else { "Start tag drop" };
                    if ui.button(label).clicked() {
                        if armed {
                            self.controller.disarm_tag_drop();
                        } else if let Err(err) = self.controller.arm_tag_drop() {
                            tracing::error!(?err, "could not arm tag drop");
                        }
                    }
                    if armed {
                        ui.small("Click anywhere on the page to place a tag.");
                    }
                }

                let draw_label = if drawing { "Finish drawing" } else { "Draw on page" };
                if ui.button(draw_label).clicked() {
                    if drawing {
                        self.finish_drawing(true);
                    } else if let Err(err) = self.controller.enter_drawing() {
                        tracing::error!(?err, "could not enter drawing mode");
                    }
                }

                ui.separator();
                if ui.button("Mark all as read").clicked() {
                    if let Err(err) = self.collaborators.provider.mark_all_as_read() {
                        notices::push_error(err.to_string());
                    }
                }
            })
            .response;
        self.panel_rect = Some(response.rect);
    }

    fn drawing_ui(&mut self, ctx: &egui::Context) {
        let state = *self.controller.engine().state();
        let frame = self.strip_view.ui(
            ctx,
            state.tool,
            state.stroke.color,
            state.stroke.width,
            &self.settings.quick_colors,
        );

        if let Some(surface) = self.controller.engine_mut().lifecycle_mut().surface_mut() {
            surface.set_strip_hover(frame.hovered);
        }

        if let Some(command) = frame.command {
            self.apply_strip_command(command);
        }

        // Pointer events reach the raster only when the strip is not
        // hovered; the engine re-checks through the surface input flag.
        if !frame.hovered {
            let (pressed, down, released, pos) = ctx.input(|i| {
                (
                    i.pointer.primary_pressed(),
                    i.pointer.primary_down(),
                    i.pointer.primary_released(),
                    i.pointer.latest_pos(),
                )
            });
            if let Some(pos) = pos {
                let (x, y) = (pos.x.round() as i32, pos.y.round() as i32);
                if pressed {
                    self.controller.engine_mut().pointer_down(x, y);
                } else if down {
                    self.controller.engine_mut().pointer_move(x, y);
                } else if released {
                    if let Err(err) = self.controller.engine_mut().pointer_up(x, y) {
                        tracing::error!(?err, "failed to serialize stroke preview");
                    }
                }
            }
        }

        self.paint_sketch_surface(ctx);
    }

    fn apply_strip_command(&mut self, command: StripCommand) {
        match command {
            StripCommand::SelectTool(tool) => {
                self.controller.engine_mut().set_tool(tool);
                self.settings.last_tool = tool;
            }
            StripCommand::SelectColor(color) => {
                self.controller.engine_mut().set_color(color);
                self.settings.last_color = color;
            }
            StripCommand::WidthDown => {
                let width = self.controller.engine().state().stroke.width.saturating_sub(1).max(1);
                self.controller.engine_mut().set_width(width);
                self.settings.last_width = width;
            }
            StripCommand::WidthUp => {
                let width = (self.controller.engine().state().stroke.width + 1).min(24);
                self.controller.engine_mut().set_width(width);
                self.settings.last_width = width;
            }
            StripCommand::Save => self.finish_drawing(true),
            StripCommand::Exit => self.finish_drawing(false),
        }
    }

    /// Leave drawing mode; when `keep` is set the raster is attached to the
    /// composer as the tag's sketch.
    fn finish_drawing(&mut self, keep: bool) {
        if keep {
            let data_url = match self.controller.engine().preview_data_url() {
                Some(url) => Some(url.to_string()),
                None => self
                    .controller
                    .engine()
                    .lifecycle()
                    .surface()
                    .and_then(|s| s.raster().to_data_url().ok()),
            };
            if let Some(url) = data_url {
                if let Err(err) = self.composer.attach_drawing(&url) {
                    notices::push_error(err.to_string());
                }
            }
        }
        if let Err(err) = self.controller.exit_drawing() {
            tracing::error!(?err, "could not exit drawing mode");
        }
    }

    fn paint_sketch_surface(&mut self, ctx: &egui::Context) {
        let Some(surface) = self.controller.engine().lifecycle().surface() else {
            return;
        };
        if !surface.visible() {
            return;
        }
        let (w, h) = surface.raster().size();
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [w as usize, h as usize],
            surface.raster().pixels(),
        );
        let texture = self.sketch_texture.insert(ctx.load_texture(
            "tag_overlay_sketch",
            image,
            egui::TextureOptions::NEAREST,
        ));

        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Middle,
            egui::Id::new("tag_overlay_sketch_layer"),
        ));
        painter.image(
            texture.id(),
            egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(w as f32, h as f32)),
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        if surface.indicator_visible() {
            let screen = ctx.screen_rect();
            let banner_pos = egui::pos2(screen.center().x, screen.top() + 18.0);
            let banner_rect = egui::Rect::from_center_size(banner_pos, egui::vec2(360.0, 26.0));
            painter.rect_filled(
                banner_rect,
                6.0,
                egui::Color32::from_rgba_unmultiplied(180, 40, 40, 220),
            );
            painter.text(
                banner_pos,
                egui::Align2::CENTER_CENTER,
                INDICATOR_LABEL,
                egui::FontId::proportional(13.0),
                egui::Color32::WHITE,
            );
        }
    }

    fn surface_click_ui(&mut self, ctx: &egui::Context) {
        if !self.controller.tag_drop_armed() {
            return;
        }
        let (pressed, pos) = ctx.input(|i| (i.pointer.primary_pressed(), i.pointer.latest_pos()));
        let (Some(pos), true) = (pos, pressed) else {
            return;
        };

        let click = SurfaceClick {
            x: pos.x,
            y: pos.y,
            target: self.click_target_at(ctx, pos),
        };
        match self.controller.handle_surface_click(&click) {
            ClickOutcome::PopupOpened { x, y } => {
                self.composer.reset();
                self.composer.open_at(x, y);
                self.popup_view.sync_from(&self.composer);
            }
            ClickOutcome::Excluded | ClickOutcome::Ignored => {}
        }
    }

    /// Best-effort target chain for the exclusion heuristic: the overlay's
    /// own rectangles first, then whatever egui reports as interactive.
    fn click_target_at(&self, ctx: &egui::Context, pos: egui::Pos2) -> ClickTarget {
        let mut chain = Vec::new();
        if self.panel_rect.is_some_and(|rect| rect.contains(pos)) {
            chain.push(SurfaceTarget::PanelChrome);
        }
        if self.avatar_rect.is_some_and(|rect| rect.contains(pos)) {
            chain.push(SurfaceTarget::AvatarBubble);
        }
        if chain.is_empty() && ctx.is_pointer_over_area() {
            chain.push(SurfaceTarget::InteractiveControl);
        }
        chain.push(SurfaceTarget::HostSurface);
        ClickTarget { chain }
    }

    fn avatar_ui(&mut self, ctx: &egui::Context, screen: egui::Rect) {
        let active = matches!(
            self.controller.mode(),
            InteractionMode::TagDropArmed | InteractionMode::DraggingAvatar
        );
        if !active {
            self.avatar_rect = None;
            return;
        }

        let offset = self.avatar.offset();
        let base = screen.right_bottom() - egui::vec2(76.0, 76.0) + egui::vec2(offset.0, offset.1);
        let area = egui::Area::new(egui::Id::new("tag_overlay_avatar"))
            .fixed_pos(base)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(egui::vec2(52.0, 52.0), egui::Sense::drag());
                let dragging = self.avatar.is_dragging();
                let fill = if dragging {
                    egui::Color32::from_rgb(40, 120, 220)
                } else {
                    egui::Color32::from_rgb(70, 90, 160)
                };
                ui.painter().circle_filled(rect.center(), 24.0, fill);
                ui.painter().circle_stroke(
                    rect.center(),
                    24.0,
                    egui::Stroke::new(2.0, egui::Color32::WHITE),
                );
                let initial = self.user.name.chars().next().unwrap_or('?');
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    initial,
                    egui::FontId::proportional(20.0),
                    egui::Color32::WHITE,
                );
                response
            });

        let response = area.inner;
        self.avatar_rect = Some(response.rect);

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.avatar.begin(pos.x, pos.y);
                if let Err(err) = self.controller.avatar_drag_started() {
                    tracing::error!(?err, "avatar drag could not start");
                }
            }
        } else if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.avatar.update(pos.x, pos.y);
            }
        } else if response.drag_stopped() {
            let release = response
                .interact_pointer_pos()
                .map(|p| (p.x, p.y))
                .unwrap_or((base.x, base.y));
            let outcome = self.avatar.release(release.0, release.1);
            match self.controller.avatar_drag_finished(outcome) {
                Ok(Some((x, y))) => {
                    self.composer.reset();
                    self.composer.open_at(x, y);
                    self.popup_view.sync_from(&self.composer);
                }
                Ok(None) => {}
                Err(err) => tracing::error!(?err, "avatar drop could not open popup"),
            }
        }
    }

    fn popup_ui(&mut self, ctx: &egui::Context, now: Instant) {
        let Some(position) = self.controller.popup_position() else {
            return;
        };
        let actions =
            self.popup_view.ui(ctx, position, &mut self.composer, &self.available_staff);

        match actions.drag {
            DragEvent::Started(pos) => {
                if let Err(err) = self.controller.begin_popup_drag(pos.x, pos.y) {
                    tracing::error!(?err, "popup drag could not start");
                }
            }
            DragEvent::Dragged(pos) => self.controller.update_popup_drag(pos.x, pos.y),
            DragEvent::Released => {
                if let Err(err) = self.controller.end_popup_drag() {
                    tracing::error!(?err, "popup drag could not end");
                }
            }
            DragEvent::None => {}
        }

        if actions.toggle_audio {
            if let Err(err) = self.composer.toggle_audio(self.capture_backend.as_mut(), now) {
                notices::push_error(err.to_string());
            }
        }
        if actions.toggle_screen {
            if self.composer.recording_screen() {
                self.composer.stop_screen_capture(now);
            } else if let Err(err) =
                self.composer.start_screen_capture(self.capture_backend.as_mut(), now)
            {
                notices::push_error(err.to_string());
            }
        }
        if actions.draw_full_page {
            if let Err(err) = self.controller.enter_drawing() {
                tracing::error!(?err, "could not enter drawing mode from popup");
            }
        }
        if actions.save {
            self.spawn_save();
        }
        if actions.close {
            self.controller.close_popup();
            self.composer.reset();
            self.popup_view = TagPopupView::default();
        }
    }

    fn spawn_save(&mut self) {
        if self.save_task.is_some() {
            return;
        }
        match self.composer.begin_save(&self.user) {
            Ok(job) => {
                let storage = Arc::clone(&self.collaborators.storage);
                let provider = Arc::clone(&self.collaborators.provider);
                let (tx, rx) = mpsc::channel();
                std::thread::spawn(move || {
                    let mut progress =
                        |p: SaveProgress| tracing::debug!(progress = ?p, "tag save progress");
                    let _ = tx.send(job.run(storage.as_ref(), provider.as_ref(), &mut progress));
                });
                self.save_task = Some(SaveTask { rx });
            }
            Err(err) => {
                // Validation shows inline in the popup; anything else toasts.
                if !err.is_validation() {
                    notices::push_error(err.to_string());
                }
            }
        }
    }

    fn poll_save_task(&mut self, now: Instant) {
        let Some(task) = &self.save_task else {
            return;
        };
        match task.rx.try_recv() {
            Ok(Ok(outcome)) => {
                self.save_task = None;
                if self.composer.apply_save_success(&outcome) {
                    self.controller.close_popup();
                    self.popup_view = TagPopupView::default();
                    if let Some(marker) = outcome.marker(now) {
                        self.markers.push(marker);
                    }
                    notices::push_success(if outcome.is_reply {
                        "Reply sent."
                    } else {
                        "Tag created."
                    });
                }
            }
            Ok(Err(err)) => {
                self.save_task = None;
                notices::push_error(err.to_string());
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => self.save_task = None,
        }
    }

    fn markers_ui(&self, ctx: &egui::Context) {
        if self.markers.is_empty() {
            return;
        }
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("tag_overlay_markers"),
        ));
        for marker in self.markers.markers() {
            let center = egui::pos2(marker.x, marker.y);
            painter.circle_filled(
                center,
                12.0,
                egui::Color32::from_rgba_unmultiplied(0, 110, 220, 200),
            );
            painter.circle_stroke(center, 12.0, egui::Stroke::new(2.0, egui::Color32::WHITE));
            if marker.sketch_preview.is_some() {
                painter.circle_filled(
                    center + egui::vec2(9.0, 9.0),
                    4.0,
                    egui::Color32::from_rgb(255, 180, 0),
                );
            }
        }
    }

    fn handoff_bubble_ui(&mut self, ctx: &egui::Context) {
        let Some(bubble) = self.handoff_bubble.clone() else {
            return;
        };
        let (vw, vh) = self.controller.viewport();
        let (x, y) = bubble.coords.unwrap_or((vw / 2.0, vh / 2.0));
        let (x, y) = crate::placement::resolve(x, y, 260.0, 120.0, vw, vh);

        let mut dismiss = false;
        let mut reply = false;
        egui::Window::new("tag_overlay_handoff")
            .id(egui::Id::new("tag_overlay_handoff"))
            .fixed_pos(egui::pos2(x, y))
            .collapsible(false)
            .resizable(false)
            .title_bar(false)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(&bubble.sender_name).strong());
                ui.label(&bubble.comment);
                ui.horizontal(|ui| {
                    if ui.small_button("Reply").clicked() {
                        reply = true;
                    }
                    if ui.small_button("Dismiss").clicked() {
                        dismiss = true;
                    }
                });
            });

        if reply {
            let notification = Notification {
                id: bubble.id.clone(),
                comment: bubble.comment.clone(),
                sender_id: String::new(),
                sender_name: bubble.sender_name.clone(),
                coords: bubble.coords,
                conversation_id: None,
                attachments: vec![],
                read: true,
                requires_approval: false,
                approval_status: None,
            };
            self.open_reply(&notification);
            self.handoff_bubble = None;
        } else if dismiss {
            self.handoff_bubble = None;
        }
    }

    fn toasts_ui(&mut self, ctx: &egui::Context) {
        let duration = self.settings.notice_duration_secs as f64;
        for notice in notices::drain() {
            let kind = match notice.kind {
                NoticeKind::Info => ToastKind::Info,
                NoticeKind::Success => ToastKind::Success,
                NoticeKind::Error => ToastKind::Error,
            };
            self.toasts.add(Toast {
                text: notice.text.into(),
                kind,
                options: ToastOptions::default().duration_in_seconds(duration),
            });
        }
        self.toasts.show(ctx);
    }

    fn apply_cursor(&self, ctx: &egui::Context) {
        let icon = match self.controller.cursor() {
            DesiredCursor::Default => egui::CursorIcon::Default,
            DesiredCursor::Crosshair => egui::CursorIcon::Crosshair,
            DesiredCursor::Grabbing => egui::CursorIcon::Grabbing,
        };
        if icon != egui::CursorIcon::Default {
            ctx.set_cursor_icon(icon);
        }
    }
}
