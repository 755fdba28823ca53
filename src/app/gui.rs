use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use eframe::egui;
use egui::{Color32, RichText};
use tracing::{info, warn};

use crate::app::controller::{
    DisabledReason, MirrorButton, MirrorController, CONNECT_HINT, DEBUGGING_HINT,
};
use crate::app::error::AppError;
use crate::app::logging::new_trace_id;
use crate::app::mirror::MirrorEmitter;
use crate::app::models::MirrorEvent;
use crate::app::state::AppState;

pub const WINDOW_TITLE: &str = "AndroidMirror";
const START_LABEL: &str = "Start Screen Mirror";

#[derive(Debug, Clone, Copy, Default)]
pub struct GuiOptions {
    /// Start mirroring right after the initial device check.
    pub start_on_launch: bool,
    /// Close the window once the mirror session has ended.
    pub exit_after_mirror: bool,
}

/// Desktop shell over [`MirrorController`]. Mirror exits arrive from the
/// supervisor worker on a channel and are applied in `update`.
pub struct MirrorApp {
    state: AppState,
    controller: MirrorController,
    events: Receiver<MirrorEvent>,
    emitter: MirrorEmitter,
    options: GuiOptions,
}

impl MirrorApp {
    pub fn new(state: AppState, ctx: egui::Context, options: GuiOptions) -> Self {
        let (tx, events) = mpsc::channel::<MirrorEvent>();
        let emitter: MirrorEmitter = Arc::new(move |event| {
            if tx.send(event).is_ok() {
                ctx.request_repaint();
            }
        });

        let mut app = Self {
            state,
            controller: MirrorController::new(),
            events,
            emitter,
            options,
        };
        app.refresh();
        if options.start_on_launch {
            app.start_mirror();
        }
        app
    }

    pub fn controller(&self) -> &MirrorController {
        &self.controller
    }

    pub fn refresh(&mut self) {
        let trace_id = new_trace_id();
        self.controller.apply_probe(self.state.probe(&trace_id));
    }

    pub fn start_mirror(&mut self) {
        let trace_id = new_trace_id();
        let state = &self.state;
        let emitter = Arc::clone(&self.emitter);
        if let Err(err) = self
            .controller
            .begin_mirror(&trace_id, || state.start_mirror(&trace_id, emitter))
        {
            warn!(trace_id = %trace_id, code = %err.code, error = %err.error, "mirror not started");
        }
    }

    /// Applies queued mirror events; returns `true` if one of them ended the
    /// current session.
    pub fn drain_events(&mut self) -> bool {
        let mut ended = false;
        while let Ok(event) = self.events.try_recv() {
            ended |= self.controller.handle_mirror_event(&event);
        }
        ended
    }

    fn show(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new(DEBUGGING_HINT).color(Color32::YELLOW));
            ui.label(CONNECT_HINT);
        });
        ui.separator();

        let view = self.controller.view();
        egui::ScrollArea::vertical()
            .max_height(160.0)
            .show(ui, |ui| {
                if view.device_text.is_empty() {
                    ui.label(RichText::new("Device info will appear here...").color(Color32::GRAY));
                } else {
                    ui.label(RichText::new(&view.device_text).monospace());
                }
            });
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            let enabled = view.button == MirrorButton::Enabled;
            let button = ui
                .add_enabled(enabled, egui::Button::new(START_LABEL))
                .on_disabled_hover_text(match view.button {
                    MirrorButton::Disabled(DisabledReason::Mirroring) => "Screen mirror is running",
                    _ => "No device connected",
                });
            if button.clicked() {
                self.start_mirror();
            }
            if ui.button("Refresh").clicked() {
                self.refresh();
            }
        });

        if let Some(notice) = view.notice.as_deref() {
            ui.add_space(4.0);
            ui.label(RichText::new(notice).color(Color32::GRAY));
        }
    }
}

impl eframe::App for MirrorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.drain_events() && self.options.exit_after_mirror {
            info!("mirror session ended, closing window");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::CentralPanel::default().show(ctx, |ui| self.show(ui));
    }
}

impl Drop for MirrorApp {
    fn drop(&mut self) {
        if self.controller.is_mirroring() {
            warn!("exiting while the mirror window is still open");
        }
    }
}

pub fn run_gui(state: AppState, options: GuiOptions) -> Result<(), AppError> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 320.0])
            .with_title(WINDOW_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(MirrorApp::new(state, cc.egui_ctx.clone(), options)) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|err| AppError::system(format!("GUI error: {err}"), new_trace_id()))
}
