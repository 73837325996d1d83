//! Wind rose rendering: a direction/speed frequency histogram drawn as a
//! polar stacked bar chart and saved as a PNG.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::WindroseError;
use crate::model::{ForecastTable, sanitize};

/// Angular sectors in the rose, 22.5 degrees each.
pub const SECTOR_COUNT: usize = 16;
/// Stacked speed bins per sector.
pub const SPEED_BIN_COUNT: usize = 6;

const SECTOR_WIDTH_DEG: f64 = 360.0 / SECTOR_COUNT as f64;
/// Fraction of each sector's angular width that is filled.
const SECTOR_OPENING: f64 = 0.8;
/// Square canvas, 5 inches at 300 dpi.
const CANVAS_SIZE: u32 = 1500;
const RING_COUNT: usize = 4;

const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";
const FILENAME_FORMAT: &str = "%d.%m.%Y_%H-%M";

/// Bin fill colors, slowest to fastest.
const BIN_COLORS: [RGBColor; SPEED_BIN_COUNT] = [
    RGBColor(59, 76, 192),
    RGBColor(98, 130, 234),
    RGBColor(141, 176, 254),
    RGBColor(246, 183, 156),
    RGBColor(222, 96, 77),
    RGBColor(178, 24, 43),
];

const COMPASS_LABELS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Rendering options for [`plot_windrose`].
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub output_dir: PathBuf,
    /// Open the saved chart in the platform image viewer. No-op when the
    /// environment is headless.
    pub show_chart: bool,
}

impl ChartOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            show_chart: config.show_chart,
        }
    }
}

/// Relative frequency of wind observations per direction sector and speed
/// bin. Frequencies are percentages: all cells together sum to 100.
#[derive(Debug, Clone)]
pub struct WindroseHistogram {
    /// Lower bounds of the speed bins; the last bin is open-ended.
    speed_edges: [f64; SPEED_BIN_COUNT],
    freq: [[f64; SPEED_BIN_COUNT]; SECTOR_COUNT],
}

impl WindroseHistogram {
    pub fn from_table(table: &ForecastTable) -> Result<Self, WindroseError> {
        let records = table.records();
        if records.is_empty() {
            return Err(WindroseError::EmptyData);
        }

        let mut min_speed = f64::INFINITY;
        let mut max_speed = f64::NEG_INFINITY;
        for record in records {
            min_speed = min_speed.min(record.speed);
            max_speed = max_speed.max(record.speed);
        }

        let mut speed_edges = [0.0; SPEED_BIN_COUNT];
        for (i, edge) in speed_edges.iter_mut().enumerate() {
            *edge = min_speed
                + (max_speed - min_speed) * i as f64 / (SPEED_BIN_COUNT as f64 - 1.0);
        }

        let mut counts = [[0usize; SPEED_BIN_COUNT]; SECTOR_COUNT];
        for record in records {
            let sector = Self::sector_of(record.direction);
            let bin = Self::bin_of(&speed_edges, record.speed);
            counts[sector][bin] += 1;
        }

        let total = records.len() as f64;
        let mut freq = [[0.0; SPEED_BIN_COUNT]; SECTOR_COUNT];
        for sector in 0..SECTOR_COUNT {
            for bin in 0..SPEED_BIN_COUNT {
                freq[sector][bin] = counts[sector][bin] as f64 * 100.0 / total;
            }
        }

        Ok(Self { speed_edges, freq })
    }

    /// Sector i covers [i * 22.5, (i + 1) * 22.5) degrees, so directions of
    /// 0 and 359 degrees land in adjacent (wrapping) sectors rather than
    /// being merged.
    pub fn sector_of(direction: f64) -> usize {
        let wrapped = direction.rem_euclid(360.0);
        ((wrapped / SECTOR_WIDTH_DEG) as usize).min(SECTOR_COUNT - 1)
    }

    fn bin_of(edges: &[f64; SPEED_BIN_COUNT], speed: f64) -> usize {
        let mut bin = 0;
        while bin + 1 < SPEED_BIN_COUNT && speed >= edges[bin + 1] {
            bin += 1;
        }
        bin
    }

    pub fn frequencies(&self) -> &[[f64; SPEED_BIN_COUNT]; SECTOR_COUNT] {
        &self.freq
    }

    pub fn sector_total(&self, sector: usize) -> f64 {
        self.freq[sector].iter().sum()
    }

    pub fn max_sector_total(&self) -> f64 {
        (0..SECTOR_COUNT)
            .map(|s| self.sector_total(s))
            .fold(0.0, f64::max)
    }

    /// Sum over all cells; ~100 up to floating point rounding.
    pub fn total(&self) -> f64 {
        (0..SECTOR_COUNT).map(|s| self.sector_total(s)).sum()
    }

    pub fn speed_bin_label(&self, bin: usize) -> String {
        if bin + 1 < SPEED_BIN_COUNT {
            format!(
                "{:.1} - {:.1} m/s",
                self.speed_edges[bin],
                self.speed_edges[bin + 1]
            )
        } else {
            format!(">= {:.1} m/s", self.speed_edges[bin])
        }
    }
}

/// File name encoding the location label and the covered time span,
/// e.g. `windrose_münchen_29.08.2026_12-00_to_31.08.2026_18-00.png`.
/// Not deduplicated: identical inputs overwrite the same file.
pub fn chart_filename(label: &str, start: NaiveDateTime, end: NaiveDateTime) -> String {
    format!(
        "windrose_{}_{}_to_{}.png",
        sanitize(label),
        start.format(FILENAME_FORMAT),
        end.format(FILENAME_FORMAT),
    )
}

/// Renders the wind rose for `table` and saves it under the output
/// directory, returning the path of the written PNG.
pub fn plot_windrose(
    table: &ForecastTable,
    label: &str,
    options: &ChartOptions,
) -> Result<PathBuf, WindroseError> {
    let histogram = WindroseHistogram::from_table(table)?;
    let (start, end) = table.time_span()?;

    std::fs::create_dir_all(&options.output_dir)
        .map_err(|e| WindroseError::OutputDirCreation(options.output_dir.clone(), e))?;
    let path = options.output_dir.join(chart_filename(label, start, end));

    let title = format!("Wind rose for {label}");
    let subtitle = format!(
        "Period: {} to {}",
        start.format(DISPLAY_FORMAT),
        end.format(DISPLAY_FORMAT)
    );
    draw(&histogram, &title, &subtitle, &path)?;

    info!(path = %path.display(), "wind rose saved");
    if options.show_chart {
        show_image(&path);
    }
    Ok(path)
}

fn render_error(path: &Path, err: impl std::fmt::Display) -> WindroseError {
    WindroseError::Render {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn draw(
    histogram: &WindroseHistogram,
    title: &str,
    subtitle: &str,
    path: &Path,
) -> Result<(), WindroseError> {
    let root = BitMapBackend::new(path, (CANVAS_SIZE, CANVAS_SIZE)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render_error(path, e))?;

    let text_color = RGBColor(40, 40, 40);
    let grid_color = RGBColor(190, 190, 190);

    let centered = Pos::new(HPos::Center, VPos::Top);
    let title_style = TextStyle::from(("sans-serif", 44).into_font())
        .color(&text_color)
        .pos(centered);
    let subtitle_style = TextStyle::from(("sans-serif", 30).into_font())
        .color(&text_color)
        .pos(centered);
    root.draw_text(title, &title_style, (CANVAS_SIZE as i32 / 2, 28))
        .map_err(|e| render_error(path, e))?;
    root.draw_text(subtitle, &subtitle_style, (CANVAS_SIZE as i32 / 2, 84))
        .map_err(|e| render_error(path, e))?;

    // Keep the plot region square so the rose stays circular.
    let plot_area = root.margin(170, 70, 100, 100);
    let mut chart = ChartBuilder::on(&plot_area)
        .build_cartesian_2d(-1.25f64..1.25f64, -1.25f64..1.25f64)
        .map_err(|e| render_error(path, e))?;

    // Radial scale: rings at whole-percent steps covering the largest
    // sector.
    let ring_step = (histogram.max_sector_total() / RING_COUNT as f64)
        .ceil()
        .max(1.0);
    let full_scale = ring_step * RING_COUNT as f64;

    // Polar grid: concentric rings with percentage labels, plus spokes with
    // compass labels.
    for ring in 1..=RING_COUNT {
        let radius = ring as f64 / RING_COUNT as f64;
        let circle: Vec<(f64, f64)> = (0..=180)
            .map(|step| polar_point(step as f64 * 2.0, radius))
            .collect();
        chart
            .draw_series(std::iter::once(PathElement::new(circle, grid_color)))
            .map_err(|e| render_error(path, e))?;

        let label_pos = polar_point(67.5, radius + 0.015);
        chart
            .draw_series(std::iter::once(Text::new(
                format!("{:.0}%", ring as f64 * ring_step),
                label_pos,
                ("sans-serif", 24).into_font().color(&grid_color),
            )))
            .map_err(|e| render_error(path, e))?;
    }

    for (i, compass) in COMPASS_LABELS.iter().enumerate() {
        let angle = i as f64 * 45.0;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, 0.0), polar_point(angle, 1.0)],
                grid_color,
            )))
            .map_err(|e| render_error(path, e))?;

        let label_style = TextStyle::from(("sans-serif", 32).into_font())
            .color(&text_color)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(std::iter::once(Text::new(
                (*compass).to_string(),
                polar_point(angle, 1.1),
                label_style,
            )))
            .map_err(|e| render_error(path, e))?;
    }

    // Stacked wedges: 80% of each sector's angular width is filled, each
    // speed bin stacked outwards with white borders between bins.
    let gap = SECTOR_WIDTH_DEG * (1.0 - SECTOR_OPENING);
    for sector in 0..SECTOR_COUNT {
        let a0 = sector as f64 * SECTOR_WIDTH_DEG + gap / 2.0;
        let a1 = (sector + 1) as f64 * SECTOR_WIDTH_DEG - gap / 2.0;

        let mut inner = 0.0;
        for bin in 0..SPEED_BIN_COUNT {
            let cell = histogram.frequencies()[sector][bin];
            if cell <= 0.0 {
                continue;
            }
            let outer = inner + cell / full_scale;

            let mut points = wedge_points(a0, a1, inner, outer);
            chart
                .draw_series(std::iter::once(Polygon::new(
                    points.clone(),
                    BIN_COLORS[bin].filled(),
                )))
                .map_err(|e| render_error(path, e))?;

            points.push(points[0]);
            chart
                .draw_series(std::iter::once(PathElement::new(
                    points,
                    WHITE.stroke_width(2),
                )))
                .map_err(|e| render_error(path, e))?;

            inner = outer;
        }
    }

    // One empty series per speed bin carries the legend entry.
    for bin in 0..SPEED_BIN_COUNT {
        let color = BIN_COLORS[bin];
        chart
            .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())
            .map_err(|e| render_error(path, e))?
            .label(histogram.speed_bin_label(bin))
            .legend(move |(x, y)| Rectangle::new([(x, y - 8), (x + 18, y + 8)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.85))
        .border_style(&grid_color)
        .label_font(("sans-serif", 28).into_font().color(&text_color))
        .draw()
        .map_err(|e| render_error(path, e))?;

    let legend_title_style = TextStyle::from(("sans-serif", 30).into_font())
        .color(&text_color)
        .pos(Pos::new(HPos::Right, VPos::Top));
    root.draw_text(
        "Wind speed [m/s]",
        &legend_title_style,
        (CANVAS_SIZE as i32 - 110, 136),
    )
    .map_err(|e| render_error(path, e))?;

    root.present().map_err(|e| render_error(path, e))?;
    Ok(())
}

/// Maps a meteorological angle (0 = north, clockwise) and a radius fraction
/// onto chart coordinates.
fn polar_point(angle_deg: f64, radius: f64) -> (f64, f64) {
    let rad = angle_deg.to_radians();
    (radius * rad.sin(), radius * rad.cos())
}

/// Closed outline of an annular wedge between two angles and two radii.
fn wedge_points(a0: f64, a1: f64, r0: f64, r1: f64) -> Vec<(f64, f64)> {
    const ARC_STEPS: usize = 12;
    let mut points = Vec::with_capacity(2 * (ARC_STEPS + 1));
    for step in 0..=ARC_STEPS {
        let angle = a0 + (a1 - a0) * step as f64 / ARC_STEPS as f64;
        points.push(polar_point(angle, r1));
    }
    for step in (0..=ARC_STEPS).rev() {
        let angle = a0 + (a1 - a0) * step as f64 / ARC_STEPS as f64;
        points.push(polar_point(angle, r0));
    }
    points
}

/// Opens the saved chart with the platform image viewer; headless
/// environments (no display) turn this into a no-op.
fn show_image(path: &Path) {
    #[cfg(target_os = "linux")]
    {
        use std::process::Command;
        if std::env::var_os("DISPLAY").is_none() && std::env::var_os("WAYLAND_DISPLAY").is_none() {
            debug!("no display configured; skipping interactive view");
            return;
        }
        if let Err(e) = Command::new("xdg-open").arg(path).spawn() {
            debug!(error = %e, "could not launch image viewer");
        }
    }
    #[cfg(target_os = "macos")]
    {
        use std::process::Command;
        if let Err(e) = Command::new("open").arg(path).spawn() {
            debug!(error = %e, "could not launch image viewer");
        }
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        debug!(path = %path.display(), "interactive view not supported on this platform");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DATETIME_FORMAT, ForecastRecord};

    fn record(datetime: &str, speed: f64, direction: f64) -> ForecastRecord {
        ForecastRecord {
            datetime: NaiveDateTime::parse_from_str(datetime, DATETIME_FORMAT).unwrap(),
            speed,
            direction,
        }
    }

    fn table_of(samples: &[(f64, f64)]) -> ForecastTable {
        samples
            .iter()
            .enumerate()
            .map(|(i, &(speed, direction))| {
                record(
                    &format!("2026-08-29 {:02}:00:00", i % 24),
                    speed,
                    direction,
                )
            })
            .collect()
    }

    #[test]
    fn north_and_359_degrees_fall_into_adjacent_sectors() {
        let zero = WindroseHistogram::sector_of(0.0);
        let almost_north = WindroseHistogram::sector_of(359.0);

        assert_ne!(zero, almost_north);
        assert_eq!(zero, 0);
        assert_eq!(almost_north, SECTOR_COUNT - 1);
        // Adjacent on the circle: the last sector wraps around to the first.
        assert_eq!((almost_north + 1) % SECTOR_COUNT, zero);
    }

    #[test]
    fn sector_boundaries() {
        assert_eq!(WindroseHistogram::sector_of(22.4), 0);
        assert_eq!(WindroseHistogram::sector_of(22.5), 1);
        assert_eq!(WindroseHistogram::sector_of(360.0), 0);
        assert_eq!(WindroseHistogram::sector_of(-45.0), 14);
    }

    #[test]
    fn frequencies_sum_to_one_hundred_percent() {
        let table = table_of(&[
            (1.0, 0.0),
            (2.0, 90.0),
            (3.0, 180.0),
            (4.0, 180.0),
            (5.0, 270.0),
        ]);
        let histogram = WindroseHistogram::from_table(&table).unwrap();

        assert!((histogram.total() - 100.0).abs() < 1e-9);
        assert!((histogram.sector_total(WindroseHistogram::sector_of(180.0)) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = WindroseHistogram::from_table(&ForecastTable::default()).unwrap_err();
        assert!(matches!(err, WindroseError::EmptyData));
    }

    #[test]
    fn speeds_spread_across_bins() {
        let table = table_of(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        let histogram = WindroseHistogram::from_table(&table).unwrap();

        let freq = histogram.frequencies()[0];
        // Slowest sample in the first bin, fastest in the open-ended last
        // bin, the middle one in between.
        assert!(freq[0] > 0.0);
        assert!(freq[SPEED_BIN_COUNT - 1] > 0.0);
        assert!((freq.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_speed_collapses_into_one_bin() {
        let table = table_of(&[(3.0, 0.0), (3.0, 90.0), (3.0, 180.0)]);
        let histogram = WindroseHistogram::from_table(&table).unwrap();

        assert!((histogram.total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn bin_labels_carry_the_speed_unit() {
        let table = table_of(&[(0.0, 0.0), (10.0, 90.0)]);
        let histogram = WindroseHistogram::from_table(&table).unwrap();

        assert_eq!(histogram.speed_bin_label(0), "0.0 - 2.0 m/s");
        assert_eq!(
            histogram.speed_bin_label(SPEED_BIN_COUNT - 1),
            ">= 10.0 m/s"
        );
    }

    #[test]
    fn filename_encodes_label_and_span() {
        let start =
            NaiveDateTime::parse_from_str("2026-08-29 12:00:00", DATETIME_FORMAT).unwrap();
        let end = NaiveDateTime::parse_from_str("2026-08-31 18:00:00", DATETIME_FORMAT).unwrap();

        let name = chart_filename("München", start, end);
        assert_eq!(
            name,
            "windrose_München_29.08.2026_12-00_to_31.08.2026_18-00.png"
        );
    }
}
