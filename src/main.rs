use eframe::egui;
use std::sync::Arc;
use tag_overlay::composer::CurrentUser;
use tag_overlay::gui::{Collaborators, OverlayPanel};
use tag_overlay::providers::memory::{MemoryProvider, MemoryStorage};
use tag_overlay::providers::StaffMember;
use tag_overlay::settings::{settings_path, OverlaySettings};

struct TagOverlayApp {
    panel: OverlayPanel,
    panel_open: bool,
}

impl eframe::App for TagOverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Host surface");
            ui.label("Arm tag drop from the panel, then click anywhere to place a tag.");
            if !self.panel_open && ui.button("Open annotation panel").clicked() {
                self.panel_open = true;
            }
        });

        let mut close_requested = false;
        self.panel.show(ctx, self.panel_open, &mut || close_requested = true);
        if close_requested {
            self.panel_open = false;
        }
    }
}

fn main() -> eframe::Result<()> {
    let settings = OverlaySettings::load_or_default(&settings_path());
    tag_overlay::logging::init(settings.debug_logging);

    let user = CurrentUser { id: "user_1".into(), name: "Current User".into() };
    let available_staff = vec![
        StaffMember { id: "staff_1".into(), name: "Alice Wonderland".into() },
        StaffMember { id: "staff_2".into(), name: "Bob The Builder".into() },
        StaffMember { id: "staff_3".into(), name: "Carol Mills".into() },
    ];
    let collaborators = Collaborators {
        storage: Arc::new(MemoryStorage::default()),
        provider: Arc::new(MemoryProvider::default()),
    };

    let panel = OverlayPanel::new(user, available_staff, settings, collaborators);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Tag Overlay",
        options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Box::new(TagOverlayApp { panel, panel_open: true })
        }),
    )
}
