use eframe::egui::{self, ScrollArea, TextStyle, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::schema::BirthTable;

/// Every filtered row, in order, under a leading row-number column.
pub fn filtered_table(ui: &mut Ui, table: &BirthTable) {
    let row_height = TextStyle::Body.resolve(ui.style()).size + 6.0;

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(40.0))
            .columns(Column::auto().at_least(80.0), table.columns().len())
            .min_scrolled_height(0.0)
            .header(row_height, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong("#");
                });
                for name in table.columns() {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(row_height, table.len(), |mut row| {
                    let idx = row.index();
                    row.col(|ui: &mut Ui| {
                        ui.label(idx.to_string());
                    });
                    for cell in &table.rows()[idx] {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell.to_string());
                        });
                    }
                });
            });
    });
}
