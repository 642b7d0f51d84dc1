//! Spectrum widget
//!
//! The analyser node already does the windowed FFT and smoothing; this only
//! resamples its linear bins onto a log frequency axis.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Number of points drawn across the frequency axis
const SPECTRUM_POINTS: usize = 48;

const FLOOR_DB: f64 = -100.0;

/// Pick log-spaced points (20 Hz to Nyquist, capped at 20 kHz) out of
/// `bins_db`. Returns `(log10(hz), dB)` pairs.
pub fn log_points(bins_db: &[f32], sample_rate: f32) -> Vec<(f64, f64)> {
    if bins_db.is_empty() || sample_rate <= 0.0 {
        return Vec::new();
    }
    let bin_hz = sample_rate as f64 / 2.0 / bins_db.len() as f64;
    let max_freq = (sample_rate as f64 / 2.0).min(20_000.0).max(1.0);
    let min_freq = 20.0f64.min(max_freq);
    let ratio = max_freq / min_freq;

    (0..SPECTRUM_POINTS)
        .map(|i| {
            let t = i as f64 / (SPECTRUM_POINTS - 1) as f64;
            let freq = min_freq * ratio.powf(t);
            let index = ((freq / bin_hz).round() as usize).min(bins_db.len() - 1);
            let db = (bins_db[index] as f64).max(FLOOR_DB);
            (freq.log10(), db)
        })
        .collect()
}

/// Render the spectrum analyzer widget
pub fn render_spectrum(frame: &mut Frame, area: Rect, points: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(points);

    let (min_x, max_x) = points
        .first()
        .zip(points.last())
        .map_or((1.0, 4.0), |(a, b)| (a.0, b.0.max(a.0 + 0.1)));
    let max_db = points.iter().map(|(_, db)| *db).fold(FLOOR_DB, f64::max);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([min_x, max_x])
                .labels(vec!["20", "1k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, max_db.max(0.0) + 10.0])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_follow_the_peak_bin() {
        let sample_rate = 48_000.0;
        let mut bins = vec![-120.0f32; 1024];
        // 1 kHz lands in bin 1000 / (24000 / 1024) ≈ 42.7
        for db in &mut bins[40..46] {
            *db = -6.0;
        }
        let points = log_points(&bins, sample_rate);
        assert_eq!(points.len(), SPECTRUM_POINTS);

        let (peak_x, peak_db) = points
            .iter()
            .copied()
            .fold((0.0, f64::MIN), |best, p| if p.1 > best.1 { p } else { best });
        assert_eq!(peak_db, -6.0);
        assert!((10f64.powf(peak_x) - 1_000.0).abs() < 100.0);
        assert!(points.iter().all(|&(_, db)| db >= FLOOR_DB));
    }

    #[test]
    fn empty_input_gives_no_points() {
        assert!(log_points(&[], 48_000.0).is_empty());
    }
}
