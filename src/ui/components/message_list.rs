//! Scrollable conversation view.
//!
//! Renders the transcript as chat bubbles: user turns right-aligned,
//! bot turns left-aligned, with a blinking cursor on the in-progress turn.

use crate::transcript::{Transcript, Turn};
use crate::ui::theme::Theme;
use egui::{Frame, Layout, RichText, ScrollArea, Ui};

pub struct MessageList<'a> {
    transcript: &'a Transcript,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(transcript: &'a Transcript, theme: &'a Theme) -> Self {
        Self { transcript, theme }
    }

    /// Show the conversation, pinned to the newest turn.
    pub fn show(&self, ui: &mut Ui) {
        if self.transcript.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(
                    RichText::new("Ask something to get started")
                        .size(14.0)
                        .color(self.theme.text_muted),
                );
            });
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                for turn in self.transcript.turns() {
                    self.show_turn(ui, turn);
                    ui.add_space(self.theme.spacing_sm);
                }
            });
    }

    fn show_turn(&self, ui: &mut Ui, turn: &Turn) {
        let layout = if turn.is_user() {
            Layout::right_to_left(egui::Align::TOP)
        } else {
            Layout::left_to_right(egui::Align::TOP)
        };

        ui.with_layout(layout, |ui| {
            ui.set_max_width(ui.available_width() * 0.8);

            Frame::none()
                .fill(self.theme.bubble_fill(turn.is_user()))
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.vertical(|ui| {
                        ui.horizontal_wrapped(|ui| {
                            ui.label(
                                RichText::new(&turn.content)
                                    .size(14.0)
                                    .color(self.theme.text_primary),
                            );

                            if turn.streaming {
                                // Blinking cursor while tokens are arriving
                                let time = ui.ctx().input(|i| i.time);
                                if (time * 2.0) as i32 % 2 == 0 {
                                    ui.label(
                                        RichText::new("▌").color(self.theme.primary).size(14.0),
                                    );
                                }
                            }
                        });

                        ui.label(
                            RichText::new(turn.timestamp.format("%H:%M").to_string())
                                .size(11.0)
                                .color(self.theme.text_muted),
                        );
                    });
                });
        });
    }
}
