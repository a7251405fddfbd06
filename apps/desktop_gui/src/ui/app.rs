//! Single-window tracker app: renders the view for the current workflow step
//! and forwards user intents to the backend worker.
//!
//! The UI thread never touches the session directly; it renders from the
//! latest [`SessionSnapshot`] and queues [`BackendCommand`]s. While a queued
//! command is in flight the triggering control is disabled, so the worker
//! never has more than one outstanding operation.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use image::GenericImageView;
use shared::domain::{EncodedPhoto, SetupPhase, WorkflowStep};
use tracker_core::SessionSnapshot;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(79, 70, 229);
const ACCENT_SOFT: egui::Color32 = egui::Color32::from_rgb(238, 242, 255);
const AMBER_SOFT: egui::Color32 = egui::Color32::from_rgb(255, 251, 235);
const AMBER_TEXT: egui::Color32 = egui::Color32::from_rgb(180, 83, 9);
const GREEN_SOFT: egui::Color32 = egui::Color32::from_rgb(220, 252, 231);
const GREEN_TEXT: egui::Color32 = egui::Color32::from_rgb(22, 101, 52);
const ERROR_TEXT: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
const MUTED: egui::Color32 = egui::Color32::from_rgb(148, 163, 184);

pub struct TrackerApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    snapshot: SessionSnapshot,
    vendor_name_input: String,
    code_input: String,
    pre_notes_input: String,
    post_notes_input: String,

    error: Option<UiError>,
    status: String,
    processing: bool,

    setup_previews: HashMap<&'static str, egui::TextureHandle>,
}

impl TrackerApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            snapshot: SessionSnapshot {
                step: WorkflowStep::Login,
                record: None,
                active_code: None,
                summary: None,
            },
            vendor_name_input: String::new(),
            code_input: String::new(),
            pre_notes_input: String::new(),
            post_notes_input: String::new(),
            error: None,
            status: String::new(),
            processing: false,
            setup_previews: HashMap::new(),
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_backend_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.status = message,
                UiEvent::SessionUpdated(snapshot) => {
                    self.processing = false;
                    if snapshot.step != self.snapshot.step {
                        // A transition clears the pending input and any
                        // inline error from the previous view.
                        self.code_input.clear();
                        self.error = None;
                        match snapshot.step {
                            WorkflowStep::Login => {
                                self.vendor_name_input.clear();
                                self.pre_notes_input.clear();
                                self.post_notes_input.clear();
                                self.setup_previews.clear();
                            }
                            WorkflowStep::Setup => {
                                if let Some(record) = &snapshot.record {
                                    self.pre_notes_input = record.setup.pre_notes.clone();
                                    self.post_notes_input = record.setup.post_notes.clone();
                                }
                            }
                            _ => {}
                        }
                    }
                    self.snapshot = snapshot;
                }
                UiEvent::Error(err) => {
                    self.processing = false;
                    tracing::debug!(
                        context = ?err.context(),
                        category = ?err.category(),
                        "inline error surfaced"
                    );
                    self.error = Some(err);
                }
            }
        }
    }

    fn pick_image_file() -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
            .pick_file()
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("tracker_top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading(
                    egui::RichText::new(self.snapshot.step.title())
                        .color(ACCENT)
                        .strong(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let show_logout = !matches!(
                        self.snapshot.step,
                        WorkflowStep::Login | WorkflowStep::Summary
                    );
                    if show_logout && ui.button("Log out").clicked() {
                        self.error = None;
                        self.dispatch(BackendCommand::Reset);
                    }
                });
            });
            if self.snapshot.step.progress_position().is_some() {
                ui.add_space(4.0);
                self.render_progress(ui);
            }
            ui.add_space(6.0);
        });
    }

    fn render_progress(&self, ui: &mut egui::Ui) {
        let Some(position) = self.snapshot.step.progress_position() else {
            return;
        };
        let stations: [(u8, &str); 4] = [
            (1, "Check-In"),
            (2, "Start"),
            (3, "Progress"),
            (4, "Closing"),
        ];

        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), 44.0),
            egui::Sense::hover(),
        );
        let painter = ui.painter();
        let inner = rect.shrink2(egui::vec2(36.0, 0.0));
        let y = rect.top() + 14.0;
        let radius = 8.0;
        let gap = inner.width() / (stations.len() as f32 - 1.0);

        painter.line_segment(
            [egui::pos2(inner.left(), y), egui::pos2(inner.right(), y)],
            egui::Stroke::new(2.0, MUTED),
        );
        let reached_x = inner.left() + gap * f32::from(position - 1);
        painter.line_segment(
            [egui::pos2(inner.left(), y), egui::pos2(reached_x, y)],
            egui::Stroke::new(2.0, ACCENT),
        );

        for (idx, (station, label)) in stations.iter().enumerate() {
            let center = egui::pos2(inner.left() + gap * idx as f32, y);
            let reached = *station <= position;
            painter.circle_filled(center, radius, if reached { ACCENT } else { MUTED });
            if *station == position {
                painter.circle_stroke(center, radius + 3.0, egui::Stroke::new(2.0, ACCENT));
            }
            painter.text(
                egui::pos2(center.x, y + radius + 5.0),
                egui::Align2::CENTER_TOP,
                *label,
                egui::FontId::proportional(11.0),
                if reached { ACCENT } else { MUTED },
            );
        }
    }

    fn render_error_inline(&self, ui: &mut egui::Ui) {
        if let Some(err) = &self.error {
            ui.add_space(4.0);
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(err.message()).color(ERROR_TEXT).small());
            });
        }
    }

    fn render_login(&mut self, ui: &mut egui::Ui) {
        egui::Frame::new()
            .fill(ACCENT_SOFT)
            .stroke(egui::Stroke::new(1.0, ACCENT))
            .corner_radius(egui::CornerRadius::same(8))
            .inner_margin(egui::Margin::same(12))
            .show(ui, |ui| {
                ui.label(
                    egui::RichText::new(
                        "Welcome to Zappy Vendor Tracking. Please enter your vendor \
                         name to begin your assignment.",
                    )
                    .color(ACCENT),
                );
            });
        ui.add_space(12.0);

        ui.label("Vendor Name / ID");
        let name_edit = ui.add(
            egui::TextEdit::singleline(&mut self.vendor_name_input)
                .hint_text("e.g. John Doe - Floral")
                .desired_width(f32::INFINITY),
        );
        ui.add_space(8.0);

        let can_submit = !self.vendor_name_input.trim().is_empty();
        let submit_pressed =
            name_edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let clicked = ui
            .add_enabled(can_submit, egui::Button::new("Sign In"))
            .clicked();
        if can_submit && (clicked || submit_pressed) {
            self.error = None;
            self.dispatch(BackendCommand::SubmitLogin {
                name: self.vendor_name_input.clone(),
            });
        }
        self.render_error_inline(ui);
    }

    fn render_check_in(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(16.0);
            ui.heading("Check-in at Event Location");
            ui.label(
                egui::RichText::new(
                    "Take a photo of the venue upon arrival to start your session.",
                )
                .color(MUTED),
            );
            ui.add_space(16.0);

            let label = if self.processing {
                "Processing Location..."
            } else {
                "Capture Photo & Check-in"
            };
            let clicked = ui
                .add_enabled(
                    !self.processing,
                    egui::Button::new(egui::RichText::new(label).strong())
                        .min_size(egui::vec2(260.0, 40.0)),
                )
                .clicked();
            if clicked {
                if let Some(photo_path) = Self::pick_image_file() {
                    self.error = None;
                    self.processing = true;
                    self.dispatch(BackendCommand::CheckIn { photo_path });
                }
            }
        });
        self.render_error_inline(ui);
    }

    fn render_verification(&mut self, ui: &mut egui::Ui) {
        if let Some(code) = &self.snapshot.active_code {
            let code = code.to_string();
            egui::Frame::new()
                .fill(AMBER_SOFT)
                .stroke(egui::Stroke::new(1.0, AMBER_TEXT))
                .corner_radius(egui::CornerRadius::same(8))
                .inner_margin(egui::Margin::same(12))
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("Customer Mock Trigger:").color(AMBER_TEXT));
                    ui.label(
                        egui::RichText::new(code)
                            .monospace()
                            .size(28.0)
                            .color(AMBER_TEXT)
                            .strong(),
                    );
                    ui.label(
                        egui::RichText::new(
                            "* In a real app, this would be sent to the customer's phone.",
                        )
                        .italics()
                        .small()
                        .color(AMBER_TEXT),
                    );
                });
        }
        ui.add_space(12.0);

        ui.vertical_centered(|ui| {
            let heading = if self.snapshot.step == WorkflowStep::OtpStart {
                "Verify Event Start"
            } else {
                "Verify Event Completion"
            };
            ui.heading(heading);
            ui.label(
                egui::RichText::new("Enter the 4-digit code provided by the customer.")
                    .color(MUTED),
            );
            ui.add_space(12.0);

            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.code_input)
                    .hint_text("0 0 0 0")
                    .font(egui::TextStyle::Heading)
                    .horizontal_align(egui::Align::Center)
                    .desired_width(180.0),
            );
            if edit.changed() {
                self.code_input = sanitized_code(&self.code_input);
            }

            ui.add_space(8.0);
            let submit_pressed =
                edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let clicked = ui
                .add_enabled(
                    self.code_input.len() == 4,
                    egui::Button::new(egui::RichText::new("Confirm & Proceed").strong())
                        .min_size(egui::vec2(220.0, 36.0)),
                )
                .clicked();
            if (clicked || submit_pressed) && self.code_input.len() == 4 {
                self.error = None;
                self.dispatch(BackendCommand::SubmitCode {
                    input: self.code_input.clone(),
                });
            }
        });
        self.render_error_inline(ui);
    }

    fn render_setup(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            self.render_setup_phase(ui, SetupPhase::Pre, "1. Pre-Setup Status");
            ui.add_space(16.0);
            self.render_setup_phase(ui, SetupPhase::Post, "2. Post-Setup Status");
            ui.add_space(16.0);

            self.render_error_inline(ui);
            ui.vertical_centered(|ui| {
                let clicked = ui
                    .add_enabled(
                        !self.processing,
                        egui::Button::new(egui::RichText::new("Ready for Handover").strong())
                            .min_size(egui::vec2(260.0, 44.0)),
                    )
                    .clicked();
                if clicked {
                    self.error = None;
                    self.dispatch(BackendCommand::FinishSetup);
                }
            });
        });
    }

    fn render_setup_phase(&mut self, ui: &mut egui::Ui, phase: SetupPhase, heading: &str) {
        ui.heading(heading);
        ui.separator();

        match self.setup_preview(ui, phase) {
            Some(texture) => {
                let size = texture.size_vec2();
                let max_width = (ui.available_width() - 16.0).clamp(120.0, 420.0);
                let mut preview_size = size;
                if preview_size.x > max_width {
                    preview_size *= max_width / preview_size.x;
                }
                ui.add(egui::Image::new(&texture).fit_to_exact_size(preview_size));
            }
            None => {
                let label = match phase {
                    SetupPhase::Pre => "+ Add Pre-Setup Photo",
                    SetupPhase::Post => "+ Add Post-Setup Photo",
                };
                let clicked = ui
                    .add_enabled(
                        !self.processing,
                        egui::Button::new(egui::RichText::new(label).color(ACCENT))
                            .min_size(egui::vec2(260.0, 80.0)),
                    )
                    .clicked();
                if clicked {
                    if let Some(photo_path) = Self::pick_image_file() {
                        self.error = None;
                        self.processing = true;
                        self.dispatch(BackendCommand::AttachSetupPhoto { phase, photo_path });
                    }
                }
            }
        }

        ui.add_space(6.0);
        let notes = match phase {
            SetupPhase::Pre => &mut self.pre_notes_input,
            SetupPhase::Post => &mut self.post_notes_input,
        };
        let hint = format!("Add optional notes for {}...", phase.label());
        let response = ui.add(
            egui::TextEdit::multiline(notes)
                .hint_text(hint)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            let text = notes.clone();
            self.dispatch(BackendCommand::SetSetupNotes { phase, text });
        }
    }

    /// Texture for an uploaded setup photo, decoded once and cached for the
    /// rest of the session (photos are write-once).
    fn setup_preview(&mut self, ui: &egui::Ui, phase: SetupPhase) -> Option<egui::TextureHandle> {
        let key = phase.label();
        if let Some(texture) = self.setup_previews.get(key) {
            return Some(texture.clone());
        }
        let photo = self
            .snapshot
            .record
            .as_ref()
            .and_then(|record| record.setup.photo(phase))
            .cloned()?;
        let texture = decode_preview_texture(ui.ctx(), key, &photo)?;
        self.setup_previews.insert(key, texture.clone());
        Some(texture)
    }

    fn render_summary(&mut self, ui: &mut egui::Ui) {
        egui::Frame::new()
            .fill(GREEN_SOFT)
            .stroke(egui::Stroke::new(1.0, GREEN_TEXT))
            .corner_radius(egui::CornerRadius::same(10))
            .inner_margin(egui::Margin::same(16))
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading(egui::RichText::new("Event Completed!").color(GREEN_TEXT));
                    ui.label(
                        egui::RichText::new("All tracker data has been synced to Zappy servers.")
                            .color(GREEN_TEXT)
                            .small(),
                    );
                });
            });
        ui.add_space(12.0);

        if let Some(summary) = self.snapshot.summary.clone() {
            egui::Frame::new()
                .stroke(egui::Stroke::new(1.0, MUTED))
                .corner_radius(egui::CornerRadius::same(8))
                .inner_margin(egui::Margin::same(12))
                .show(ui, |ui| {
                    ui.strong("Tracker Summary");
                    ui.separator();
                    summary_row(ui, "Vendor:", &summary.vendor_id);
                    summary_row(ui, "Check-in:", &local_time_label(summary.checked_in_at));
                    summary_row(
                        ui,
                        "Location:",
                        &format_location(summary.location.latitude, summary.location.longitude),
                    );
                    summary_row(
                        ui,
                        "Duration:",
                        &format!("{} mins", summary.duration_minutes),
                    );
                });
        }

        ui.add_space(12.0);
        ui.vertical_centered(|ui| {
            if ui
                .add(
                    egui::Button::new(egui::RichText::new("Start New Assignment").strong())
                        .min_size(egui::vec2(260.0, 40.0)),
                )
                .clicked()
            {
                self.error = None;
                self.dispatch(BackendCommand::Reset);
            }
        });
    }
}

impl eframe::App for TrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_backend_events();

        self.render_top_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.set_max_width(560.0);
            match self.snapshot.step {
                WorkflowStep::Login => self.render_login(ui),
                WorkflowStep::CheckIn => self.render_check_in(ui),
                WorkflowStep::OtpStart | WorkflowStep::OtpComplete => {
                    self.render_verification(ui)
                }
                WorkflowStep::Setup => self.render_setup(ui),
                WorkflowStep::Summary => self.render_summary(ui),
            }

            if !self.status.is_empty() {
                ui.add_space(8.0);
                ui.label(egui::RichText::new(self.status.as_str()).small().color(MUTED));
            }
        });

        // Keep draining worker events even when the user is idle.
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

fn summary_row(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(label).color(MUTED));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.strong(value);
        });
    });
}

/// Digits only, at most four.
fn sanitized_code(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(4)
        .collect()
}

fn format_location(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.4}, {longitude:.4}")
}

fn local_time_label(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string()
}

fn decode_preview_texture(
    ctx: &egui::Context,
    key: &str,
    photo: &EncodedPhoto,
) -> Option<egui::TextureHandle> {
    let bytes = match photo.decode_bytes() {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!("failed to decode stored photo payload: {err}");
            return None;
        }
    };
    let decoded = match image::load_from_memory(&bytes) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::warn!("failed to decode photo for preview: {err}");
            return None;
        }
    };

    let (orig_w, orig_h) = decoded.dimensions();
    let max_dimension = 480.0_f32;
    let scale = (max_dimension / (orig_w.max(orig_h) as f32)).min(1.0);
    let resized = if scale < 1.0 {
        decoded.resize(
            (orig_w as f32 * scale).max(1.0) as u32,
            (orig_h as f32 * scale).max(1.0) as u32,
            image::imageops::FilterType::Triangle,
        )
    } else {
        decoded
    };
    let rgba = resized.to_rgba8();
    let [w, h] = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied([w, h], rgba.as_raw());
    Some(ctx.load_texture(
        format!("setup-photo:{key}"),
        color_image,
        egui::TextureOptions::LINEAR,
    ))
}

#[cfg(test)]
mod tests {
    use super::{format_location, sanitized_code};

    #[test]
    fn code_input_keeps_at_most_four_digits() {
        assert_eq!(sanitized_code("1234"), "1234");
        assert_eq!(sanitized_code("12 34-56"), "1234");
        assert_eq!(sanitized_code("abc"), "");
        assert_eq!(sanitized_code("9"), "9");
    }

    #[test]
    fn locations_render_with_four_decimal_places() {
        assert_eq!(format_location(13.7563, 100.5018), "13.7563, 100.5018");
        assert_eq!(format_location(51.0, -0.1276), "51.0000, -0.1276");
    }
}
