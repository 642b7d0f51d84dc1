//! modsynth - application state and event loop

use std::{
    io::stdout,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use cpal::Stream;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use ratatui::DefaultTerminal;
use tracing::{info, warn};

use modsynth::{patch::PresetCatalog, EngineConfig, SynthEngine};

use crate::{audio, controls::Control, keymap::Keymap, midi_input::MidiInputs, ui};

/// How long a key counts as held without a repeat, on terminals that never
/// report key release. Longer than the usual auto-repeat delay.
const LATCH: Duration = Duration::from_millis(600);

/// ~60 fps
const FRAME: Duration = Duration::from_millis(16);

/// Status messages fade after this long.
const STATUS_TTL: Duration = Duration::from_secs(4);

pub struct Options {
    pub preset: Option<String>,
    pub max_voices: Option<usize>,
    pub midi_port: Option<String>,
    pub no_midi: bool,
}

pub struct App {
    engine: SynthEngine,
    catalog: PresetCatalog,
    preset: Option<usize>,
    keymap: Keymap,
    selected: usize,
    midi: Option<MidiInputs>,
    midi_ports: Vec<String>,
    scope: Vec<f32>,
    spectrum: Vec<f32>,
    key_release: bool,
    status: Option<(String, Instant)>,
    should_quit: bool,
    // Audio stops when this drops.
    _stream: Stream,
}

impl App {
    /// Open the audio device, bring the engine up and connect MIDI.
    pub fn new(options: Options, catalog: PresetCatalog) -> EyreResult<Self> {
        let (device, config) = audio::default_output()?;
        let mut engine = SynthEngine::new(EngineConfig {
            sample_rate: config.sample_rate().0 as f32,
            ..EngineConfig::default()
        });
        engine.init()?;

        let mut preset = None;
        if let Some(name) = options.preset.as_deref() {
            let found = catalog.get(name)?;
            engine.apply_preset(found)?;
            preset = catalog.presets().iter().position(|p| p.name == found.name);
        }
        if let Some(n) = options.max_voices {
            engine.set_max_voices(n);
        }

        let stream = audio::start(&device, &config, engine.context().clone())?;

        let midi = if options.no_midi {
            None
        } else {
            match MidiInputs::open(options.midi_port.as_deref()) {
                Ok(inputs) => Some(inputs),
                Err(err) => {
                    warn!(%err, "midi unavailable, keyboard only");
                    None
                }
            }
        };
        let midi_ports = midi
            .as_ref()
            .map(|m| m.port_names().map(str::to_string).collect())
            .unwrap_or_default();

        let scope = vec![0.0; engine.fft_size()];
        let spectrum = vec![-100.0; engine.frequency_bin_count()];

        Ok(Self {
            engine,
            catalog,
            preset,
            keymap: Keymap::new(),
            selected: 0,
            midi,
            midi_ports,
            scope,
            spectrum,
            key_release: false,
            status: None,
            should_quit: false,
            _stream: stream,
        })
    }

    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.key_release = supports_keyboard_enhancement().unwrap_or(false);
        if self.key_release {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        info!(key_release = self.key_release, "ui started");

        let result = self.event_loop(terminal);

        if self.key_release {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_midi();
            if !self.key_release {
                for note in self.keymap.expire(Instant::now(), LATCH) {
                    let result = self.engine.note_off(note);
                    self.report(result);
                }
            }
            self.poll_analyser();
            if self
                .status
                .as_ref()
                .is_some_and(|(_, at)| at.elapsed() > STATUS_TTL)
            {
                self.status = None;
            }

            terminal.draw(|frame| {
                let view = ui::View {
                    engine: &self.engine,
                    controls: &Control::ALL,
                    selected: self.selected,
                    preset: self
                        .preset
                        .and_then(|i| self.catalog.presets().get(i))
                        .map(|p| p.name.as_str()),
                    octave: self.keymap.octave(),
                    base_note: self.keymap.base_note(),
                    scope: &self.scope,
                    spectrum: &self.spectrum,
                    midi_ports: &self.midi_ports,
                    key_release: self.key_release,
                    status: self.status.as_ref().map(|(s, _)| s.as_str()),
                };
                ui::render(frame, &view);
            })?;

            if event::poll(FRAME)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn poll_midi(&mut self) {
        let Some(midi) = self.midi.as_mut() else {
            return;
        };
        let mut failures = Vec::new();
        midi.poll(|msg| {
            if let Err(err) = self.engine.handle_message(msg) {
                failures.push(err);
            }
        });
        for err in failures {
            self.report(Err(err));
        }
    }

    fn poll_analyser(&mut self) {
        let scope = self.engine.time_domain_data(&mut self.scope);
        self.report(scope);
        let spectrum = self.engine.frequency_data(&mut self.spectrum);
        self.report(spectrum);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            if let KeyCode::Char(c) = key.code {
                if let Some(note) = self.keymap.release(c) {
                    let result = self.engine.note_off(note);
                    self.report(result);
                }
            }
            return;
        }

        let steps = if key.modifiers.contains(KeyModifiers::SHIFT) {
            10
        } else {
            1
        };

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Up => {
                self.selected = (self.selected + Control::ALL.len() - 1) % Control::ALL.len()
            }
            KeyCode::Down => self.selected = (self.selected + 1) % Control::ALL.len(),
            KeyCode::Left => self.adjust(-steps),
            KeyCode::Right => self.adjust(steps),
            KeyCode::F(1) => {
                let mode = self.engine.params().mode.toggled();
                self.engine.set_mode(mode);
                self.set_status(format!("{} mode for new notes", mode.name()));
            }
            KeyCode::F(2) => self.step_preset(-1),
            KeyCode::F(3) => self.step_preset(1),
            KeyCode::F(4) => {
                let result = self.engine.init();
                self.keymap.clear();
                self.report(result);
                self.set_status("synth reset".into());
            }
            KeyCode::F(5) => self.keymap.shift_octave(-1),
            KeyCode::F(6) => self.keymap.shift_octave(1),
            KeyCode::Char(c) => {
                if let Some(note) = self.keymap.press(c, Instant::now()) {
                    let result = self.engine.note_on(note);
                    self.report(result);
                }
            }
            _ => {}
        }
    }

    fn adjust(&mut self, steps: i32) {
        let control = Control::ALL[self.selected];
        let result = control.adjust(&mut self.engine, steps);
        self.report(result);
        if control == Control::MaxVoices {
            self.keymap.clear();
        }
    }

    fn step_preset(&mut self, by: isize) {
        let count = self.catalog.len() as isize;
        if count == 0 {
            return;
        }
        let next = match self.preset {
            Some(i) => (i as isize + by).rem_euclid(count),
            None if by < 0 => count - 1,
            None => 0,
        } as usize;

        let preset = &self.catalog.presets()[next];
        let result = self.engine.apply_preset(preset);
        if preset.state.max_voices.is_some() {
            self.keymap.clear();
        }
        self.preset = Some(next);
        self.report(result);
    }

    fn set_status(&mut self, status: String) {
        self.status = Some((status, Instant::now()));
    }

    fn report(&mut self, result: modsynth::Result<()>) {
        if let Err(err) = result {
            warn!(%err, "synth operation failed");
            self.set_status(err.to_string());
        }
    }
}
