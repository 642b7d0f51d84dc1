//! Oscilloscope over the analyser's time-domain buffer

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Periods of the last played note shown at once.
const PERIODS: f32 = 2.0;

/// Render the oscilloscope. With a note frequency, the trace starts on a
/// rising zero crossing and spans a couple of its periods so it stands still.
pub fn render_scope(
    frame: &mut Frame,
    area: Rect,
    samples: &[f32],
    sample_rate: f32,
    note_hz: Option<f32>,
) {
    let block = Block::default().title(" Scope ").borders(Borders::ALL);

    let window = visible_window(samples, sample_rate, note_hz);
    let data: Vec<(f64, f64)> = window
        .iter()
        .enumerate()
        .map(|(i, &sample)| {
            let x = i as f64 / window.len().max(1) as f64;
            (x, sample as f64)
        })
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

fn visible_window(samples: &[f32], sample_rate: f32, note_hz: Option<f32>) -> &[f32] {
    let Some(hz) = note_hz.filter(|hz| *hz > 0.0) else {
        return samples;
    };
    let span = ((sample_rate / hz * PERIODS) as usize).max(16).min(samples.len());
    let search = samples.len().saturating_sub(span);
    let start = (1..search)
        .find(|&i| samples[i - 1] <= 0.0 && samples[i] > 0.0)
        .unwrap_or(search);
    &samples[start..start + span]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_starts_on_rising_zero_crossing() {
        let sample_rate = 48_000.0;
        let hz = 1_000.0;
        let samples: Vec<f32> = (0..2048)
            .map(|i| (std::f32::consts::TAU * hz * (i as f32 + 10.5) / sample_rate).sin())
            .collect();
        let window = visible_window(&samples, sample_rate, Some(hz));
        assert_eq!(window.len(), 96);
        assert!(window[0] > 0.0);
        assert!(window[0] < 0.2);
    }

    #[test]
    fn without_a_note_shows_everything() {
        let samples = vec![0.0; 128];
        assert_eq!(visible_window(&samples, 48_000.0, None).len(), 128);
    }

    #[test]
    fn short_buffers_do_not_panic() {
        let samples = vec![0.0; 8];
        assert_eq!(visible_window(&samples, 48_000.0, Some(20.0)).len(), 8);
    }
}
