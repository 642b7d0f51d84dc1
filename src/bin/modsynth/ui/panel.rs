//! Text panels: header, parameter list, keyboard and help bar

use std::collections::BTreeSet;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use modsynth::{graph::ContextState, synth::SynthMode, Note};

use super::View;
use crate::keymap::{key_offset, note_name};

const LOWER_ROW: &str = "zsxdcvgbhnjm,l.;/";
const UPPER_ROW: &str = "q2w3er5t6y7ui9o0p[=]";

/// Mode, preset, voices and audio state
pub fn render_header(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" modsynth ").borders(Borders::ALL);
    let engine = view.engine;
    let params = engine.params();

    let running = engine.state() == ContextState::Running;
    let midi = if view.midi_ports.is_empty() {
        "MIDI: none".to_string()
    } else {
        format!("MIDI: {}", view.midi_ports.join(", "))
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", params.mode.name()),
            Style::default()
                .fg(match params.mode {
                    SynthMode::Fm => Color::Cyan,
                    SynthMode::Am => Color::Magenta,
                })
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Preset: {}  ", view.preset.unwrap_or("-")),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Voices: {}/{}  ", engine.voice_count(), params.max_voices),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!("Octave: {}  ", view.octave),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            if running { "● Running  " } else { "⏸ Suspended  " },
            Style::default().fg(if running { Color::Green } else { Color::Yellow }),
        ),
        Span::styled(
            format!("{:.1}kHz  ", engine.sample_rate() / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(midi, Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// One line per control; the selected one is highlighted and FM-only
/// controls are dimmed in AM.
pub fn render_params(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" Params ").borders(Borders::ALL);
    let am = view.engine.params().mode == SynthMode::Am;

    let lines: Vec<Line> = view
        .controls
        .iter()
        .enumerate()
        .map(|(i, control)| {
            let selected = i == view.selected;
            let mut style = Style::default();
            if am && control.fm_only() {
                style = style.fg(Color::DarkGray);
            }
            if selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Line::from(vec![
                Span::raw(if selected { "> " } else { "  " }),
                Span::styled(format!("{:<18}", control.label()), style),
                Span::styled(
                    format!(" {}", control.value_text(view.engine)),
                    style.fg(Color::Cyan),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Both key rows with the note each plays; sounding notes light up.
pub fn render_keyboard(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" Keyboard ").borders(Borders::ALL);
    let pressed = view.engine.pressed_notes();

    let lines = vec![
        key_row(UPPER_ROW, view.base_note, pressed),
        key_row(LOWER_ROW, view.base_note, pressed),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn key_row(keys: &str, base_note: Note, pressed: &BTreeSet<Note>) -> Line<'static> {
    let spans: Vec<Span> = keys
        .chars()
        .filter_map(|key| {
            let note = base_note + key_offset(key)?;
            let name = note_name(note);
            let style = if pressed.contains(&note) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if name.contains('#') {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            Some(Span::styled(format!("{key}:{name:<4}"), style))
        })
        .collect();
    Line::from(spans)
}

pub fn render_help(frame: &mut Frame, area: Rect, view: &View) {
    let text = match view.status {
        Some(status) => format!(" {status}"),
        None => {
            let release = if view.key_release { "" } else { "  (keys latch)" };
            format!(
                " [Esc] Quit  [↑↓] Select  [←→] Adjust (Shift ×10)  [F1] FM/AM  [F2/F3] Preset  [F4] Reset  [F5/F6] Octave{release}"
            )
        }
    };
    let color = if view.status.is_some() {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    frame.render_widget(Paragraph::new(text).style(Style::default().fg(color)), area);
}
