use crate::domain::input::{MAX_POWER_LEVEL, MIN_POWER_LEVEL};
use eframe::egui;

pub struct Components;

impl Components {
    pub fn card<R>(
        ui: &mut egui::Ui,
        title: &str,
        add_contents: impl FnOnce(&mut egui::Ui) -> R,
    ) -> R {
        let stroke = ui.style().visuals.widgets.noninteractive.bg_stroke;
        let bg = ui.style().visuals.widgets.noninteractive.bg_fill;

        egui::Frame::none()
            .inner_margin(egui::Margin::same(10.0))
            .stroke(stroke)
            .fill(bg)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new(title).strong().size(15.0));
                    ui.add_space(6.0);
                    add_contents(ui)
                })
                .inner
            })
            .inner
    }

    pub fn status_banner(
        ui: &mut egui::Ui,
        text: &str,
        bg_color: egui::Color32,
        text_color: egui::Color32,
    ) {
        ui.add_sized(
            [ui.available_width(), 28.0],
            egui::Label::new(
                egui::RichText::new(text)
                    .color(text_color)
                    .background_color(bg_color)
                    .size(14.0)
                    .strong(),
            )
            .wrap_mode(egui::TextWrapMode::Extend),
        );
    }

    /// Power level bar over the 50..=100 range
    pub fn power_gauge(ui: &mut egui::Ui, label: &str, level: u8, active: bool) {
        let span = (MAX_POWER_LEVEL - MIN_POWER_LEVEL) as f32;
        let fraction = (level.saturating_sub(MIN_POWER_LEVEL)) as f32 / span;
        ui.horizontal(|ui| {
            let text = egui::RichText::new(label);
            ui.label(if active { text.strong() } else { text });
            ui.add(egui::ProgressBar::new(fraction).text(format!("{}", level)));
        });
    }
}
