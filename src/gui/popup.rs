use crate::attachment::{AttachmentKind, PreviewSource};
use crate::composer::Composer;
use crate::providers::StaffMember;
use eframe::egui;

/// What the composer popup asked the panel to do this frame.
#[derive(Debug, Default)]
pub struct PopupActions {
    pub close: bool,
    pub save: bool,
    pub draw_full_page: bool,
    pub toggle_audio: bool,
    pub toggle_screen: bool,
    pub drag: DragEvent,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum DragEvent {
    #[default]
    None,
    Started(egui::Pos2),
    Dragged(egui::Pos2),
    Released,
}

/// The tag composer window. Holds only edit buffers; all authoritative
/// state lives in the `Composer`.
#[derive(Default)]
pub struct TagPopupView {
    pub comment_buffer: String,
    pub staff_search: String,
}

impl TagPopupView {
    pub fn sync_from(&mut self, composer: &Composer) {
        self.comment_buffer = composer.comment().to_string();
        self.staff_search.clear();
    }

    pub fn ui(
        &mut self,
        ctx: &egui::Context,
        position: (f32, f32),
        composer: &mut Composer,
        available_staff: &[StaffMember],
    ) -> PopupActions {
        let mut actions = PopupActions::default();
        let title = if composer.is_reply() { "Reply to tag" } else { "Create new tag" };

        egui::Window::new(title)
            .id(egui::Id::new("tag_overlay_popup"))
            .fixed_pos(egui::pos2(position.0, position.1))
            .collapsible(false)
            .resizable(false)
            .title_bar(false)
            .show(ctx, |ui| {
                ui.set_width(crate::placement::POPUP_WIDTH - 16.0);

                // Drag handle header; movement routes through the mode
                // controller so the viewport clamp stays authoritative.
                let header = ui
                    .horizontal(|ui| {
                        ui.label(egui::RichText::new(title).strong());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("✕").clicked() {
                                actions.close = true;
                            }
                        });
                    })
                    .response
                    .interact(egui::Sense::drag());
                if header.drag_started() {
                    if let Some(pos) = header.interact_pointer_pos() {
                        actions.drag = DragEvent::Started(pos);
                    }
                } else if header.dragged() {
                    if let Some(pos) = header.interact_pointer_pos() {
                        actions.drag = DragEvent::Dragged(pos);
                    }
                } else if header.drag_stopped() {
                    actions.drag = DragEvent::Released;
                }
                ui.separator();

                let comment = ui.add(
                    egui::TextEdit::multiline(&mut self.comment_buffer)
                        .desired_rows(2)
                        .hint_text("Add a comment or @mention someone"),
                );
                if comment.changed() {
                    composer.set_comment(&self.comment_buffer);
                }
                ui.small(format!(
                    "{}/{}",
                    composer.comment().chars().count(),
                    crate::composer::MAX_COMMENT_LENGTH
                ));

                ui.horizontal(|ui| {
                    let mic_label = if composer.recording_audio() { "⏹ Stop mic" } else { "🎙 Record" };
                    if ui.button(mic_label).clicked() {
                        actions.toggle_audio = true;
                    }
                    let screen_label =
                        if composer.recording_screen() { "⏹ Stop screen" } else { "🖵 Screen" };
                    if ui.button(screen_label).clicked() {
                        actions.toggle_screen = true;
                    }
                    if ui.button("🖌 Draw on page").clicked() {
                        actions.draw_full_page = true;
                    }
                });

                ui.separator();
                self.staff_section(ui, composer, available_staff);
                self.attachments_section(ui, composer);

                let mut approval = composer.requires_approval();
                if ui.checkbox(&mut approval, "Requires approval").changed() {
                    composer.set_requires_approval(approval);
                }

                if let Some(error) = composer.validation_error() {
                    ui.colored_label(egui::Color32::LIGHT_RED, error);
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        actions.close = true;
                    }
                    let save_label = if composer.is_reply() { "Send reply" } else { "Create tag" };
                    if ui.button(save_label).clicked() {
                        actions.save = true;
                    }
                });
            });

        actions
    }

    fn staff_section(
        &mut self,
        ui: &mut egui::Ui,
        composer: &mut Composer,
        available_staff: &[StaffMember],
    ) {
        ui.label("Notify staff *");
        let mut toggled: Option<StaffMember> = None;
        ui.horizontal_wrapped(|ui| {
            for member in composer.selected_staff() {
                if ui.small_button(format!("{} ✕", member.name)).clicked() {
                    toggled = Some(member.clone());
                }
            }
        });

        ui.add(
            egui::TextEdit::singleline(&mut self.staff_search)
                .hint_text("Search and add staff...")
                .desired_width(f32::INFINITY),
        );
        if !self.staff_search.is_empty() {
            let candidates: Vec<StaffMember> = composer
                .staff_candidates(available_staff, &self.staff_search)
                .into_iter()
                .cloned()
                .collect();
            for candidate in candidates {
                if ui.selectable_label(false, &candidate.name).clicked() {
                    toggled = Some(candidate);
                    self.staff_search.clear();
                }
            }
        }
        if let Some(member) = toggled {
            composer.select_staff(&member);
        }
    }

    fn attachments_section(&mut self, ui: &mut egui::Ui, composer: &mut Composer) {
        if composer.attachments().is_empty() {
            return;
        }
        ui.label("Attachments:");
        let mut remove: Option<usize> = None;
        ui.horizontal_wrapped(|ui| {
            for (index, attachment) in composer.attachments().iter().enumerate() {
                let label = match (attachment.placeholder, attachment.kind) {
                    (true, AttachmentKind::Audio) => "🎙 recording…".to_string(),
                    (true, AttachmentKind::Video) => "🖵 recording…".to_string(),
                    (true, _) => "…".to_string(),
                    (false, _) => attachment.file_name.clone(),
                };
                ui.group(|ui| {
                    if let PreviewSource::LocalBlob(id) = attachment.preview {
                        if let Some(bytes) = composer.blobs().get(id) {
                            ui.add(
                                egui::Image::from_bytes(
                                    format!("bytes://tag_overlay/{}", attachment.id),
                                    bytes.to_vec(),
                                )
                                .max_size(egui::vec2(56.0, 56.0)),
                            );
                        }
                    }
                    ui.small(label);
                    if ui.small_button("✕").clicked() {
                        remove = Some(index);
                    }
                });
            }
        });
        if let Some(index) = remove {
            composer.remove_attachment(index);
        }
    }
}
