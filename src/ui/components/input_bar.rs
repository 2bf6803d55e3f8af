//! Message input bar with send and voice buttons.

use crate::ui::state::VoiceState;
use crate::ui::theme::Theme;
use egui::{Button, Key, RichText, TextEdit, Ui};

/// What the user asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Send,
    StartVoice,
}

pub struct InputBar<'a> {
    input_text: &'a mut String,
    voice_state: VoiceState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(input_text: &'a mut String, voice_state: VoiceState, theme: &'a Theme) -> Self {
        Self {
            input_text,
            voice_state,
            theme,
        }
    }

    /// Show the bar; returns the action to take.
    pub fn show(&mut self, ui: &mut Ui) -> InputAction {
        let mut action = InputAction::None;

        ui.horizontal(|ui| {
            let voice_label = match self.voice_state {
                VoiceState::Idle => RichText::new("🎤").size(16.0),
                VoiceState::Listening => RichText::new("🎤")
                    .size(16.0)
                    .color(self.theme.listening),
            };
            if ui
                .add_enabled(
                    self.voice_state == VoiceState::Idle,
                    Button::new(voice_label).rounding(self.theme.button_rounding),
                )
                .clicked()
            {
                action = InputAction::StartVoice;
            }

            let send_clicked = ui
                .add(
                    Button::new(RichText::new("Send").size(14.0))
                        .rounding(self.theme.button_rounding),
                )
                .clicked();

            // Text field fills the rest of the row
            let edit = ui.add_sized(
                ui.available_size(),
                TextEdit::singleline(self.input_text).hint_text(match self.voice_state {
                    VoiceState::Idle => "Type a message",
                    VoiceState::Listening => "Listening...",
                }),
            );

            let enter_pressed =
                edit.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));

            if send_clicked || enter_pressed {
                action = InputAction::Send;
                edit.request_focus();
            }
        });

        action
    }
}
