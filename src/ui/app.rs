//! Main Murmur application struct and eframe integration
//!
//! This module contains the main MurmurApp that implements eframe::App.

use crate::ui::components::{InputAction, InputBar, MessageList};
use crate::ui::state::{AppState, VoiceState};
use crate::ui::theme::Theme;
use egui::{CentralPanel, RichText, TopBottomPanel};
use tracing::info;

/// Main Murmur application
pub struct MurmurApp {
    /// Whether the app has been initialized
    initialized: bool,
    /// Application state
    state: AppState,
    /// UI theme
    theme: Theme,
}

impl MurmurApp {
    /// Create a new Murmur application
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        Self {
            initialized: false,
            state,
            theme,
        }
    }

    /// Initialize the application (called on first frame)
    fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        info!("Murmur UI initialized");
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("Murmur")
                        .size(20.0)
                        .strong()
                        .color(self.theme.text_primary),
                );

                if self.state.is_generating() {
                    ui.label(
                        RichText::new("responding...")
                            .size(12.0)
                            .color(self.theme.primary),
                    );
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("Clear").clicked() {
                        self.state.clear_transcript();
                    }
                });
            });
            ui.add_space(6.0);
        });
    }

    fn show_input(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input").show(ctx, |ui| {
            ui.add_space(6.0);

            if let Some(error) = &self.state.last_error {
                ui.label(
                    RichText::new(error)
                        .size(12.0)
                        .color(self.theme.error),
                );
            }

            let action = InputBar::new(
                &mut self.state.input_text,
                self.state.voice_state,
                &self.theme,
            )
            .show(ui);

            match action {
                InputAction::Send => self.state.send_message(),
                InputAction::StartVoice => self.state.start_voice_input(),
                InputAction::None => {}
            }

            ui.add_space(6.0);
        });
    }
}

impl eframe::App for MurmurApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.initialize();

        // Apply backend events before rendering this frame
        self.state.poll_events();

        self.show_header(ctx);
        self.show_input(ctx);

        CentralPanel::default().show(ctx, |ui| {
            MessageList::new(&self.state.transcript, &self.theme).show(ui);
        });

        // Keep repainting while something is animating or tokens may arrive
        if self.state.is_generating() || self.state.voice_state == VoiceState::Listening {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
