//! TUI for modsynth
//!
//! Parameter list on the left, scope / spectrum / harmonic legend on the
//! right, the playable keyboard underneath.

mod legend;
mod panel;
mod scope;
mod spectrum;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use modsynth::SynthEngine;

use crate::controls::Control;

/// Everything one frame draws, borrowed from the app.
pub struct View<'a> {
    pub engine: &'a SynthEngine,
    pub controls: &'a [Control],
    pub selected: usize,
    pub preset: Option<&'a str>,
    pub octave: i32,
    pub base_note: i32,
    /// Latest analyser samples, oldest first.
    pub scope: &'a [f32],
    /// Latest analyser spectrum in dB, one value per bin.
    pub spectrum: &'a [f32],
    pub midi_ports: &'a [String],
    pub key_release: bool,
    pub status: Option<&'a str>,
}

pub fn render(frame: &mut Frame, view: &View) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(12),   // Params + displays
            Constraint::Length(4), // Keyboard
            Constraint::Length(1), // Help bar
        ])
        .split(area);

    panel::render_header(frame, rows[0], view);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(30)])
        .split(rows[1]);

    panel::render_params(frame, body[0], view);

    let displays = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(35),
            Constraint::Percentage(25),
        ])
        .split(body[1]);

    scope::render_scope(
        frame,
        displays[0],
        view.scope,
        view.engine.sample_rate(),
        view.engine.last_note_hz(),
    );
    let points = spectrum::log_points(view.spectrum, view.engine.sample_rate());
    spectrum::render_spectrum(frame, displays[1], &points);
    legend::render_legend(frame, displays[2], view.engine);

    panel::render_keyboard(frame, rows[2], view);
    panel::render_help(frame, rows[3], view);
}
