use crate::data_models::{DailyPoint, SeriesKey, Treatment};
use crate::errors::PipelineError;
use crate::metric::{Metric, MetricSpec};
use crate::parallel::PanelResult;
use chrono::{Duration, NaiveDate};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

const PANEL_WIDTH: u32 = 620;
const PANEL_HEIGHT: u32 = 430;
const ROW_LABEL_GUTTER: u32 = 70;
const CAPTION_BAND: u32 = 60;

const TREATMENT_ROWS: [Treatment; 2] = [Treatment::WellWatered, Treatment::WaterLimited];

type SvgArea<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Per-metric panel styling: the simulated trace color and how the
/// measured series renders (markers with error bars for LAI, a second
/// line for canopy temperature).
struct PanelStyle {
    simulated_color: RGBColor,
    measured_color: RGBColor,
    measured_as_line: bool,
}

fn style_for(metric: Metric) -> PanelStyle {
    match metric {
        Metric::Lai => PanelStyle {
            simulated_color: BLACK,
            measured_color: RED,
            measured_as_line: false,
        },
        Metric::CanopyTemp => PanelStyle {
            simulated_color: RED,
            measured_color: BLACK,
            measured_as_line: true,
        },
    }
}

/// Render the comparison grid (rows = treatment, columns = genotype) to an
/// SVG file. A panel whose extraction failed renders an unavailable
/// placeholder; the rest of the figure still draws.
pub fn render_grid(panels: &[PanelResult], metric: Metric, out: &Path) -> Result<(), PipelineError> {
    render_grid_impl(panels, metric, out).map_err(|e| PipelineError::Render(e.to_string()))?;
    crate::metrics::METRICS
        .lock()
        .record_panels_rendered(panels.len() as u64);
    info!("Saved comparison figure to {}", out.display());
    Ok(())
}

fn render_grid_impl(panels: &[PanelResult], metric: Metric, out: &Path) -> Result<(), Box<dyn Error>> {
    let genotypes = column_order(panels);
    let cols = genotypes.len().max(1);
    let spec = metric.spec();
    let style = style_for(metric);

    let width = ROW_LABEL_GUTTER + PANEL_WIDTH * cols as u32;
    let height = CAPTION_BAND + PANEL_HEIGHT * TREATMENT_ROWS.len() as u32;

    let root = SVGBackend::new(out, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    draw_captions(&root, &genotypes)?;

    let grid_area = root.margin(CAPTION_BAND, 0, ROW_LABEL_GUTTER, 0);
    let areas = grid_area.split_evenly((TREATMENT_ROWS.len(), cols));

    let by_key: HashMap<(Treatment, &str), &PanelResult> = panels
        .iter()
        .map(|p| ((p.key.treatment, p.key.genotype.as_str()), p))
        .collect();

    for (row, treatment) in TREATMENT_ROWS.iter().enumerate() {
        for (col, genotype) in genotypes.iter().enumerate() {
            let area = &areas[row * cols + col];
            let key = SeriesKey::new(genotype.clone(), *treatment);
            match by_key.get(&(*treatment, genotype.as_str())) {
                Some(panel) if panel.is_extracted() => {
                    let show_legend = row == 0 && col == 0;
                    draw_panel(area, panel, spec, &style, show_legend)?;
                }
                Some(panel) => {
                    let reason = panel.error.as_deref().unwrap_or("extraction failed");
                    draw_unavailable_message(area, &key, reason)?;
                }
                None => {
                    draw_unavailable_message(area, &key, "no simulation file")?;
                }
            }
        }
    }

    root.present()?;
    Ok(())
}

/// Column order follows the well-watered file order, with any
/// water-limited-only genotypes appended.
fn column_order(panels: &[PanelResult]) -> Vec<String> {
    let mut genotypes: Vec<String> = Vec::new();
    for panel in panels {
        if !genotypes.contains(&panel.key.genotype) {
            genotypes.push(panel.key.genotype.clone());
        }
    }
    genotypes
}

fn draw_captions(root: &SvgArea<'_>, genotypes: &[String]) -> Result<(), Box<dyn Error>> {
    let caption_style = TextStyle::from(("sans-serif", 26).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    for (col, genotype) in genotypes.iter().enumerate() {
        let x = ROW_LABEL_GUTTER as i32
            + col as i32 * PANEL_WIDTH as i32
            + PANEL_WIDTH as i32 / 2;
        root.draw(&Text::new(
            genotype.clone(),
            (x, CAPTION_BAND as i32 / 2),
            caption_style.clone(),
        ))?;
    }

    let row_style = TextStyle::from(("sans-serif", 24).into_font())
        .color(&BLACK)
        .transform(FontTransform::Rotate270)
        .pos(Pos::new(HPos::Center, VPos::Center));
    for (row, treatment) in TREATMENT_ROWS.iter().enumerate() {
        let y = CAPTION_BAND as i32
            + row as i32 * PANEL_HEIGHT as i32
            + PANEL_HEIGHT as i32 / 2;
        root.draw(&Text::new(
            treatment.label(),
            (ROW_LABEL_GUTTER as i32 / 2, y),
            row_style.clone(),
        ))?;
    }
    Ok(())
}

fn draw_panel(
    area: &SvgArea<'_>,
    panel: &PanelResult,
    spec: &MetricSpec,
    style: &PanelStyle,
    show_legend: bool,
) -> Result<(), Box<dyn Error>> {
    let Some((start, end)) = union_date_range(panel) else {
        return draw_unavailable_message(area, &panel.key, "no data points");
    };
    let x_range = (start - Duration::days(1))..(end + Duration::days(1));

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(32)
        .y_label_area_size(48)
        .build_cartesian_2d(x_range, spec.y_range.0..spec.y_range.1)?;

    chart
        .configure_mesh()
        .y_desc(spec.axis_label)
        .x_labels(6)
        .y_labels(5)
        .x_label_formatter(&|d: &NaiveDate| d.format("%m-%d").to_string())
        .light_line_style(&BLACK.mix(0.15))
        .label_style(("sans-serif", 13))
        .draw()?;

    let sim_color = style.simulated_color;
    chart
        .draw_series(LineSeries::new(
            panel.simulated.points().iter().map(|p| (p.date, p.mean)),
            sim_color.stroke_width(2),
        ))?
        .label(spec.simulated_label)
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], sim_color.stroke_width(2))
        });

    let measured_color = style.measured_color;
    if style.measured_as_line {
        chart
            .draw_series(LineSeries::new(
                panel.measured.points().iter().map(|p| (p.date, p.mean)),
                measured_color.stroke_width(2),
            ))?
            .label(spec.measured_label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], measured_color.stroke_width(2))
            });
    } else {
        chart
            .draw_series(
                panel
                    .measured
                    .points()
                    .iter()
                    .map(|p| Circle::new((p.date, p.mean), 5, measured_color.stroke_width(2))),
            )?
            .label(spec.measured_label)
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, measured_color.stroke_width(2)));

        chart.draw_series(panel.measured.points().iter().filter_map(error_bar_point).map(
            |(date, low, mid, high)| {
                ErrorBar::new_vertical(date, low, mid, high, measured_color.filled(), 6)
            },
        ))?;
    }

    if show_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(("sans-serif", 14))
            .draw()?;
    }
    Ok(())
}

fn error_bar_point(point: &DailyPoint) -> Option<(NaiveDate, f64, f64, f64)> {
    point
        .std_dev
        .map(|sd| (point.date, point.mean - sd, point.mean, point.mean + sd))
}

/// The union of both series' date coverage. The series are never joined;
/// dates covered by only one side simply leave the other side blank there.
fn union_date_range(panel: &PanelResult) -> Option<(NaiveDate, NaiveDate)> {
    let ranges = [
        panel.simulated.date_range(),
        panel.measured.date_range(),
    ];
    let mut union: Option<(NaiveDate, NaiveDate)> = None;
    for (start, end) in ranges.into_iter().flatten() {
        union = Some(match union {
            None => (start, end),
            Some((s, e)) => (s.min(start), e.max(end)),
        });
    }
    union
}

fn draw_unavailable_message(
    area: &SvgArea<'_>,
    key: &SeriesKey,
    reason: &str,
) -> Result<(), Box<dyn Error>> {
    let (width, height) = area.dim_in_pixel();
    let text_style = TextStyle::from(("sans-serif", 16).into_font())
        .color(&RED)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(
        format!("{} unavailable: {}", key, reason),
        (width as i32 / 2, height as i32 / 2),
        text_style,
    ))?;
    Ok(())
}
