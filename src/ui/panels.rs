use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::{Choice, Dimension};
use crate::data::pipeline::{Outcome, PipelineError};
use crate::data::schema::SchemaError;
use crate::state::{AppState, View};
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel: one multi-select per dimension.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let options = match &state.view {
        View::Ready(cycle) => cycle.options.clone(),
        View::Pending => {
            ui.label("Loading…");
            return;
        }
        View::Halted(_) => {
            ui.label("Fix the data source, then File → Reload.");
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for dim in Dimension::ALL {
                let values = options.get(dim);
                let all_ticked = state.is_ticked(dim, &Choice::All);
                let summary = if all_ticked {
                    "All".to_string()
                } else {
                    let n = state.choices.get(&dim).map_or(0, |c| c.len());
                    format!("{n}/{}", values.len())
                };

                egui::CollapsingHeader::new(
                    RichText::new(format!("Select {dim}  ({summary})")).strong(),
                )
                .id_salt(dim.label())
                .default_open(dim != Dimension::State)
                .show(ui, |ui: &mut Ui| {
                    let mut checked = all_ticked;
                    if ui.checkbox(&mut checked, RichText::new("All").italics()).changed() {
                        state.set_ticked(dim, Choice::All, checked);
                    }

                    for val in values {
                        let choice = Choice::Value(val.clone());
                        let mut checked = state.is_ticked(dim, &choice);
                        let mut text = RichText::new(val.to_string());
                        if dim == Dimension::Gender {
                            if let Some(cm) = &state.color_map {
                                text = text.color(cm.color_for(val));
                            }
                        }
                        if ui.checkbox(&mut checked, text).changed() {
                            state.set_ticked(dim, choice, checked);
                        }
                    }
                });
            }
        });
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
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(state.data_path.display().to_string());

        if let View::Ready(cycle) = &state.view {
            ui.separator();
            let visible = match &cycle.outcome {
                Outcome::Rendered(r) => r.filtered.len(),
                Outcome::NoData => 0,
            };
            ui.label(format!(
                "{} rows loaded, {} visible",
                cycle.table.len(),
                visible
            ));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Title, then either the halt message, the no-data notice, or chart + table.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Provisional Natality Data Dashboard");
    ui.label(RichText::new("Birth Analysis by State and Gender").size(16.0));
    ui.separator();

    match &state.view {
        View::Pending => {}
        View::Halted(err) => halt_message(ui, err),
        View::Ready(cycle) => match &cycle.outcome {
            Outcome::NoData => {
                ui.label(
                    RichText::new("No data available for selected filters.")
                        .color(Color32::from_rgb(200, 140, 0)),
                );
            }
            Outcome::Rendered(r) => {
                plot::births_chart(ui, &r.aggregated, state.color_map.as_ref());
                ui.separator();
                table::filtered_table(ui, &r.filtered);
            }
        },
    }
}

fn halt_message(ui: &mut Ui, err: &PipelineError) {
    match err {
        PipelineError::Schema(SchemaError::MissingFields { missing, available }) => {
            let names: Vec<&str> = missing.iter().map(|f| f.name()).collect();
            ui.label(
                RichText::new(format!("Missing required logical fields: {names:?}"))
                    .color(Color32::RED),
            );
            ui.label("Available columns:");
            ScrollArea::vertical().show(ui, |ui: &mut Ui| {
                for col in available {
                    ui.monospace(col);
                }
            });
        }
        PipelineError::Load(e) => {
            ui.label(RichText::new(e.to_string()).color(Color32::RED));
        }
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open natality data")
        .add_filter("Supported files", &["csv", "tsv", "txt", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("TSV", &["tsv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.set_data_path(path);
    }
}
