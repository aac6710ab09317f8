use std::f64::consts::PI;

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, PlotUi, Polygon, Text};
use rnavista::color::{
    class_color, generate_palette, nucleotide_color, origin_color, reactivity_color, StatisticGradient,
};
use rnavista::data::model::{ContactClass, Sequence};
use rnavista::figure::{ArcFigure, DistanceFigure, HeatmapFigure, OverlayFigure, QcFigure, SkylineFigure};
use rnavista::geometry::{ArcDescriptor, ContactColoring};

use crate::state::{AppState, FigureGeometry};

/// Sequences longer than this are drawn without per-nucleotide letters.
const MAX_LABELLED_LENGTH: usize = 300;

// ---------------------------------------------------------------------------
// Figure plot (central panel)
// ---------------------------------------------------------------------------

/// Render the current figure in the central panel. Each figure is drawn in its
/// own `Plot::show` scope.
pub fn figure_plot(ui: &mut Ui, state: &AppState) {
    let Some(figure) = &state.figure else {
        ui.centered_and_justified(|ui: &mut Ui| {
            let hint = if state.session.is_none() {
                "Open a sequence, profile or structure  (File → Open…)"
            } else {
                "Nothing to draw for this figure – see the status bar"
            };
            ui.heading(hint);
        });
        return;
    };

    match figure {
        FigureGeometry::Skyline(skyline) => skyline_plot(ui, skyline),
        FigureGeometry::Arcs(arcs) => arc_plot(ui, arcs),
        FigureGeometry::Overlay(overlay) => overlay_plot(ui, overlay),
        FigureGeometry::Heatmap(heatmap) => heatmap_plot(ui, heatmap),
        FigureGeometry::Distance(distance) => distance_plot(ui, distance),
        FigureGeometry::Qc(qc) => qc_plot(ui, qc),
    }
}

fn sequence_letters(plot_ui: &mut PlotUi, sequence: &Sequence, y: f64) {
    if sequence.len() > MAX_LABELLED_LENGTH {
        return;
    }
    for (k, nt) in sequence.as_str().chars().enumerate() {
        let text = RichText::new(nt.to_string()).monospace().color(nucleotide_color(nt));
        plot_ui.text(Text::new(PlotPoint::new((k + 1) as f64, y), text));
    }
}

/// Colour of one contact under the figure's colouring. Close contacts take the
/// dark end of the distance gradient.
fn contact_color(
    coloring: ContactColoring,
    gradient: &StatisticGradient,
    weight: Option<f64>,
    class: Option<ContactClass>,
) -> Color32 {
    match coloring {
        ContactColoring::Class => class.map_or(Color32::GRAY, class_color),
        ContactColoring::Distance => weight.map_or(Color32::GRAY, |w| gradient.reversed().color_for(w)),
        ContactColoring::Statistic | ContactColoring::Tag => {
            weight.map_or(Color32::GRAY, |w| gradient.color_for(w))
        }
    }
}

// -- skyline --

fn skyline_plot(ui: &mut Ui, figure: &SkylineFigure) {
    let palette = generate_palette(figure.series.len());
    Plot::new("skyline_plot")
        .legend(Legend::default())
        .x_axis_label("Nucleotide")
        .y_axis_label("Reactivity")
        .show(ui, |plot_ui| {
            for (series, &color) in figure.series.iter().zip(&palette) {
                for run in &series.runs {
                    let line = Line::new(PlotPoints::from(run.clone()))
                        .name(&series.label)
                        .color(color)
                        .width(1.5);
                    plot_ui.line(line);
                }
            }
            sequence_letters(plot_ui, &figure.sequence, -0.1);
        });
}

// -- arcs --

/// Half-circle through both endpoints, above the axis (`up`) or below it.
fn arc_points(arc: &ArcDescriptor, up: bool) -> PlotPoints {
    let sign = if up { 1.0 } else { -1.0 };
    let steps = 48;
    (0..=steps)
        .map(|k| {
            let theta = PI * k as f64 / steps as f64;
            [
                arc.center - arc.radius * theta.cos(),
                sign * arc.height * theta.sin(),
            ]
        })
        .collect()
}

fn arc_plot(ui: &mut Ui, figure: &ArcFigure) {
    let gradient = StatisticGradient::spanning(figure.contacts.iter().filter_map(|a| a.weight));
    let length = figure.sequence.len() as f64;
    Plot::new("arc_plot")
        .data_aspect(1.0)
        .show_grid(false)
        .x_axis_label("Nucleotide")
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(vec![[0.5, 0.0], [length + 0.5, 0.0]]))
                    .color(Color32::GRAY)
                    .width(1.0),
            );
            for (arc, origin) in &figure.pairs {
                plot_ui.line(Line::new(arc_points(arc, true)).color(origin_color(*origin)).width(1.5));
            }
            for arc in &figure.contacts {
                let color = contact_color(figure.coloring, &gradient, arc.weight, arc.class);
                plot_ui.line(Line::new(arc_points(arc, false)).color(color).width(1.5));
            }
            sequence_letters(plot_ui, &figure.sequence, 0.0);
        });
}

// -- secondary structure / circle --

fn overlay_plot(ui: &mut Ui, figure: &OverlayFigure) {
    let gradient = StatisticGradient::spanning(figure.contacts.iter().filter_map(|s| s.weight));
    Plot::new("overlay_plot")
        .data_aspect(1.0)
        .show_grid(false)
        .show_axes(false)
        .show(ui, |plot_ui| {
            for path in &figure.backbone {
                plot_ui.line(Line::new(PlotPoints::from(path.clone())).color(Color32::LIGHT_GRAY).width(1.0));
            }
            for segment in &figure.pairs {
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![segment.from, segment.to]))
                        .color(Color32::DARK_GRAY)
                        .width(1.5),
                );
            }
            for segment in &figure.contacts {
                let color = contact_color(figure.coloring, &gradient, segment.weight, segment.class);
                plot_ui.line(Line::new(PlotPoints::from(vec![segment.from, segment.to])).color(color).width(2.5));
            }
            for mark in &figure.nucleotides {
                let text = RichText::new(mark.nucleotide.to_string())
                    .monospace()
                    .strong()
                    .color(reactivity_color(mark.reactivity));
                plot_ui.text(Text::new(PlotPoint::new(mark.xy[0], mark.xy[1]), text));
            }
        });
}

// -- heatmap --

fn heatmap_plot(ui: &mut Ui, figure: &HeatmapFigure) {
    let gradient = StatisticGradient::spanning(figure.grid.cells().map(|(_, _, v)| v));
    Plot::new("heatmap_plot")
        .data_aspect(1.0)
        .x_axis_label("i")
        .y_axis_label("j")
        .show(ui, |plot_ui| {
            for (i, j, value) in figure.grid.cells() {
                let (x, y) = (i as f64, j as f64);
                let square = vec![
                    [x - 0.5, y - 0.5],
                    [x + 0.5, y - 0.5],
                    [x + 0.5, y + 0.5],
                    [x - 0.5, y + 0.5],
                ];
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(square))
                        .fill_color(gradient.color_for(value))
                        .stroke(Stroke::NONE),
                );
            }
            for contour in &figure.contours {
                plot_ui.line(Line::new(PlotPoints::from(contour.points.clone())).color(Color32::BLACK).width(1.0));
            }
        });
}

// -- 3-D distance histogram --

fn distance_plot(ui: &mut Ui, figure: &DistanceFigure) {
    Plot::new("distance_plot")
        .legend(Legend::default())
        .x_axis_label("3-D distance (Å)")
        .y_axis_label("Fraction")
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(figure.background.outline()))
                    .name(format!("All pairs ({})", figure.background.total()))
                    .color(Color32::GRAY)
                    .fill(0.0),
            );
            plot_ui.line(
                Line::new(PlotPoints::from(figure.contacts.outline()))
                    .name(format!("Contacts ({})", figure.contacts.total()))
                    .color(Color32::from_rgb(0xd6, 0x27, 0x28))
                    .width(2.0),
            );
        });
}

// -- QC --

fn qc_plot(ui: &mut Ui, figure: &QcFigure) {
    let height = ui.available_height() / 2.0 - 8.0;
    Plot::new("qc_depth_plot")
        .legend(Legend::default())
        .height(height)
        .y_axis_label("Read depth")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::from(figure.read_depth.clone())).name("Modified read depth"));
            plot_ui.line(Line::new(PlotPoints::from(figure.effective_depth.clone())).name("Effective depth"));
        });
    ui.separator();
    Plot::new("qc_rate_plot")
        .legend(Legend::default())
        .x_axis_label("Nucleotide")
        .y_axis_label("Mutation rate")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::from(figure.modified_rate.clone())).name("Modified"));
            plot_ui.line(Line::new(PlotPoints::from(figure.background_rate.clone())).name("Untreated"));
        });
}
