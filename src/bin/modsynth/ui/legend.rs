//! Harmonic legend: the first few partial magnitudes of each oscillator

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

use modsynth::{dsp::HarmonicComponents, synth::params::WaveRole, SynthEngine};

/// Harmonics drawn per oscillator
const SHOWN: usize = 12;

pub fn render_legend(frame: &mut Frame, area: Rect, engine: &SynthEngine) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (role, half) in [WaveRole::Modulator, WaveRole::Carrier]
        .into_iter()
        .zip(halves.iter())
    {
        let desc = engine.params().wave(role);
        let title = match role {
            WaveRole::Modulator => format!(" Mod: {} ", desc.kind.name()),
            WaveRole::Carrier => format!(" Car: {} ", desc.kind.name()),
        };
        let color = match role {
            WaveRole::Modulator => Color::Magenta,
            WaveRole::Carrier => Color::Yellow,
        };
        render_harmonics(frame, *half, &title, engine.components(role), color);
    }
}

fn render_harmonics(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    components: &HarmonicComponents,
    color: Color,
) {
    let bars: Vec<Bar> = bar_heights(components)
        .into_iter()
        .enumerate()
        .map(|(i, height)| {
            Bar::default()
                .value(height)
                .text_value(String::new())
                .label(Line::from((i + 1).to_string()))
        })
        .collect();

    let chart = BarChart::default()
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .bar_width(2)
        .bar_gap(1)
        .bar_style(Style::default().fg(color))
        .max(100)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

/// Magnitudes of harmonics 1..=SHOWN, scaled so the largest is 100.
fn bar_heights(components: &HarmonicComponents) -> Vec<u64> {
    let mags: Vec<f32> = (1..=SHOWN).map(|k| components.magnitude(k)).collect();
    let peak = mags.iter().copied().fold(0.0f32, f32::max);
    if peak <= 0.0 {
        return vec![0; SHOWN];
    }
    mags.iter()
        .map(|m| (m / peak * 100.0).round() as u64)
        .collect()
}
