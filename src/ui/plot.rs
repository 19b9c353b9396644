use std::collections::BTreeSet;

use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Plot};

use crate::color::ColorMap;
use crate::data::aggregate::AggregateRow;
use crate::data::model::Value;

/// Share of each state's slot taken by its group of bars.
const GROUP_WIDTH: f64 = 0.8;

// ---------------------------------------------------------------------------
// Births bar chart (central panel)
// ---------------------------------------------------------------------------

/// Grouped bar chart: one slot per state, one bar per gender inside it.
pub fn births_chart(ui: &mut Ui, aggregated: &[AggregateRow], color_map: Option<&ColorMap>) {
    ui.strong("Total Births by State and Gender");

    // `aggregated` is sorted by state, so deduplicating keeps that order.
    let mut states: Vec<&Value> = aggregated.iter().map(|r| &r.state).collect();
    states.dedup();
    let genders: BTreeSet<&Value> = aggregated.iter().map(|r| &r.gender).collect();

    legend(ui, &genders, color_map);

    let bar_width = GROUP_WIDTH / genders.len().max(1) as f64;
    let charts: Vec<BarChart> = genders
        .iter()
        .enumerate()
        .map(|(gi, &gender)| {
            let bars: Vec<Bar> = aggregated
                .iter()
                .filter(|r| &r.gender == gender)
                .filter_map(|r| {
                    let si = states.iter().position(|&s| s == &r.state)?;
                    let x = si as f64 - GROUP_WIDTH / 2.0 + bar_width * (gi as f64 + 0.5);
                    Some(
                        Bar::new(x, r.births)
                            .width(bar_width)
                            .name(format!("{} / {}", r.state, label(gender))),
                    )
                })
                .collect();

            BarChart::new(bars)
                .name(label(gender))
                .color(series_color(gender, color_map))
        })
        .collect();

    let state_names: Vec<String> = states.iter().map(|s| label(s)).collect();

    ui.scope(|ui: &mut Ui| {
        ui.visuals_mut().extreme_bg_color = Color32::WHITE;
        Plot::new("births_chart")
            .height(360.0)
            .x_axis_label("State")
            .y_axis_label("Total Births")
            .x_axis_formatter(move |mark, _range| {
                let v = mark.value;
                if v < 0.0 || (v - v.round()).abs() > 1e-6 {
                    return String::new();
                }
                state_names
                    .get(v.round() as usize)
                    .cloned()
                    .unwrap_or_default()
            })
            .include_y(0.0)
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(false)
            .allow_zoom(true)
            .show(ui, |plot_ui| {
                for chart in charts {
                    plot_ui.bar_chart(chart);
                }
            });
    });
}

/// "Gender" legend row with one swatch per plotted series.
fn legend(ui: &mut Ui, genders: &BTreeSet<&Value>, color_map: Option<&ColorMap>) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Gender");
        for (name, color) in legend_entries(genders, color_map) {
            ui.label(RichText::new("■").color(color));
            ui.label(name);
        }
    });
}

/// Label and bar colour of each series, in the order the series are drawn.
fn legend_entries(
    genders: &BTreeSet<&Value>,
    color_map: Option<&ColorMap>,
) -> Vec<(String, Color32)> {
    genders
        .iter()
        .map(|&g| (label(g), series_color(g, color_map)))
        .collect()
}

fn series_color(gender: &Value, color_map: Option<&ColorMap>) -> Color32 {
    color_map.map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(gender))
}

fn label(value: &Value) -> String {
    match value {
        Value::Null => "(missing)".to_string(),
        v => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_lists_only_plotted_genders() {
        let all = [Value::from("F"), Value::from("M")];
        let cm = ColorMap::new(&all);
        let plotted: BTreeSet<&Value> = BTreeSet::from([&all[0]]);

        let entries = legend_entries(&plotted, Some(&cm));
        assert_eq!(entries, vec![("F".to_string(), cm.color_for(&all[0]))]);
    }

    #[test]
    fn missing_gender_series_gets_an_entry() {
        let all = [Value::from("F"), Value::from("M")];
        let cm = ColorMap::new(&all);
        let null = Value::Null;
        let plotted: BTreeSet<&Value> = BTreeSet::from([&null, &all[1]]);

        let entries = legend_entries(&plotted, Some(&cm));
        assert_eq!(
            entries,
            vec![
                ("(missing)".to_string(), Color32::GRAY),
                ("M".to_string(), cm.color_for(&all[1])),
            ]
        );
    }
}
