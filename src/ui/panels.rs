use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};
use rnavista::config::Settings;
use rnavista::data::model::DistanceMode;
use rnavista::data::registry::NumberingSource;
use rnavista::geometry::ContactColoring;

use crate::state::{AppState, FigureKind};

// ---------------------------------------------------------------------------
// Left side panel – figure selection and filter widgets
// ---------------------------------------------------------------------------

/// Render the left options panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Figure");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            figure_selector(ui, state);
            ui.separator();

            egui::CollapsingHeader::new(RichText::new("Contact filter").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    let mut settings = state.settings.clone();
                    if filter_widgets(ui, &mut settings) {
                        state.set_settings(settings);
                    }
                });

            egui::CollapsingHeader::new(RichText::new("Layout & alignment").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    let mut settings = state.settings.clone();
                    if layout_widgets(ui, &mut settings) {
                        state.set_settings(settings);
                    }
                });

            ui.separator();
            samples_list(ui, state);

            if !state.warnings.is_empty() {
                ui.separator();
                ui.strong(format!("{} positions not drawn", state.warnings.len()));
                for warning in &state.warnings {
                    ui.label(RichText::new(warning.to_string()).small());
                }
            }
        });
}

fn figure_selector(ui: &mut Ui, state: &mut AppState) {
    let current = state.figure_kind;
    egui::ComboBox::from_id_salt("figure_kind")
        .selected_text(current.label())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in FigureKind::ALL {
                if ui.selectable_label(current == kind, kind.label()).clicked() {
                    state.set_figure_kind(kind);
                }
            }
        });

    let labels: Vec<String> = state
        .session
        .as_ref()
        .map(|s| s.samples().iter().map(|sample| sample.label.clone()).collect())
        .unwrap_or_default();

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Sample");
        let selected = state.sample.clone().unwrap_or_default();
        egui::ComboBox::from_id_salt("sample")
            .selected_text(&selected)
            .show_ui(ui, |ui: &mut Ui| {
                for label in &labels {
                    if ui.selectable_label(selected == *label, label).clicked() {
                        state.select_sample(label.clone());
                    }
                }
            });
    });

    if state.figure_kind == FigureKind::Comparison {
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Compare with");
            let selected = state.other_sample.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("other_sample")
                .selected_text(&selected)
                .show_ui(ui, |ui: &mut Ui| {
                    for label in &labels {
                        if ui.selectable_label(selected == *label, label).clicked() {
                            state.select_other_sample(label.clone());
                        }
                    }
                });
        });
    }
}

/// Checkbox plus value for an optional number. Returns true when changed.
fn optional_value<T: egui::emath::Numeric>(ui: &mut Ui, label: &str, value: &mut Option<T>, default: T) -> bool {
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        let mut enabled = value.is_some();
        if ui.checkbox(&mut enabled, label).changed() {
            *value = enabled.then_some(default);
            changed = true;
        }
        if let Some(v) = value.as_mut() {
            changed |= ui.add(DragValue::new(v).speed(0.5)).changed();
        }
    });
    changed
}

fn filter_widgets(ui: &mut Ui, settings: &mut Settings) -> bool {
    let classify = &mut settings.classify;
    let mut changed = false;
    changed |= optional_value(ui, "Min statistic", &mut classify.statistic_threshold, 20.0);
    changed |= optional_value(ui, "Max 3-D distance (Å)", &mut classify.max_contact_distance, 30.0);
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Distance over models");
        changed |= ui.radio_value(&mut classify.distance_mode, DistanceMode::Min, "min").changed();
        changed |= ui.radio_value(&mut classify.distance_mode, DistanceMode::Mean, "mean").changed();
    });
    changed |= optional_value(ui, "Min structure distance", &mut classify.min_structure_distance, 10);
    changed |= ui.checkbox(&mut classify.positive_only, "Positive correlations only").changed();
    changed |= ui.checkbox(&mut classify.unpaired_only, "Unpaired nucleotides only").changed();
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Scoring slack");
        changed |= ui.add(DragValue::new(&mut settings.score_slack).range(0..=10)).changed();
    });
    changed
}

fn layout_widgets(ui: &mut Ui, settings: &mut Settings) -> bool {
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        let mut enabled = settings.layout.region.is_some();
        if ui.checkbox(&mut enabled, "Region").changed() {
            settings.layout.region = enabled.then_some((1, 100));
            changed = true;
        }
        if let Some((start, end)) = settings.layout.region.as_mut() {
            changed |= ui.add(DragValue::new(start).range(1..=usize::MAX)).changed();
            changed |= ui.add(DragValue::new(end).range(1..=usize::MAX)).changed();
        }
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Colour contacts by");
        egui::ComboBox::from_id_salt("contact_coloring")
            .selected_text(settings.layout.contact_coloring.label())
            .show_ui(ui, |ui: &mut Ui| {
                for coloring in ContactColoring::ALL {
                    changed |= ui
                        .selectable_value(&mut settings.layout.contact_coloring, coloring, coloring.label())
                        .changed();
                }
            });
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Histogram bin (Å)");
        changed |= ui
            .add(DragValue::new(&mut settings.layout.histogram_bin_width).range(0.5..=50.0))
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Circle gap (°)");
        changed |= ui
            .add(DragValue::new(&mut settings.layout.circle_gap_degrees).range(0.0..=180.0))
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Mismatches allowed");
        changed |= ui
            .add(DragValue::new(&mut settings.align.max_mismatches).range(0..=20))
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Number contacts like");
        egui::ComboBox::from_id_salt("contact_numbering")
            .selected_text(settings.contact_numbering.label())
            .show_ui(ui, |ui: &mut Ui| {
                for source in NumberingSource::ALL {
                    changed |= ui
                        .selectable_value(&mut settings.contact_numbering, source, source.label())
                        .changed();
                }
            });
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("3-D atom");
        changed |= ui.text_edit_singleline(&mut settings.pdb_atom).lost_focus();
    });
    changed
}

fn samples_list(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Samples");
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Add files to");
        ui.text_edit_singleline(&mut state.load_label)
            .on_hover_text("Sample name for the next opened file; empty uses the file name");
    });
    let Some(session) = &state.session else {
        ui.label("No data loaded.");
        return;
    };
    ui.label(format!("{} – {} nt", session.sequence().name(), session.length()));
    for sample in session.samples() {
        ui.label(format!("{}: {}", sample.label, sample.summary().join(", ")));
        if let Some(source) = sample.contact_numbering() {
            ui.label(RichText::new(format!("  contacts numbered like {}", source.label())).small());
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Load settings…").clicked() {
                open_settings_dialog(state);
                ui.close_menu();
            }
            if ui.button("Clear session").clicked() {
                state.clear();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            ui.label(format!("{} samples on {}", session.samples().len(), session.sequence().name()));
        }

        if let Some(score) = state.figure.as_ref().and_then(|f| f.score()) {
            ui.separator();
            ui.label(format!(
                "sensitivity {:.2} ({}/{})  PPV {:.2} ({}/{})",
                score.sensitivity,
                score.matched_reference,
                score.reference_total,
                score.ppv,
                score.matched_contacts,
                score.contact_total
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open RNA data")
        .add_filter(
            "Supported files",
            &["fa", "fasta", "txt", "map", "ct", "db", "dbn", "coords", "tsv", "json", "pdb", "cif"],
        )
        .add_filter("Sequence", &["fa", "fasta"])
        .add_filter("Profiles & correlations", &["txt", "map"])
        .add_filter("Structures", &["ct", "db", "dbn"])
        .add_filter("Diagram coordinates", &["coords", "tsv", "json"])
        .add_filter("3-D models", &["pdb", "cif"])
        .pick_files();

    for path in files.unwrap_or_default() {
        if let Err(e) = state.open_path(&path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

pub fn open_settings_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Load settings")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match Settings::load(&path) {
            Ok(settings) => state.set_settings(settings),
            Err(e) => {
                log::error!("Failed to load settings: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
