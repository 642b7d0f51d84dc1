//! MIDI input from every available port
//!
//! Each port gets its own connection and its own ring buffer; the midir
//! callback decodes and pushes, the UI loop drains.

use midir::{Ignore, MidiInput, MidiInputConnection};
use rtrb::{Consumer, PushError, RingBuffer};
use tracing::{info, warn};

use modsynth::{
    io::{midi_to_synth, MidiEvent},
    synth::message::{MessageReceiver, SynthMessage},
};

const CLIENT_NAME: &str = "modsynth";
const QUEUE_SIZE: usize = 256;

struct Port {
    name: String,
    rx: Consumer<SynthMessage>,
    _connection: MidiInputConnection<()>,
}

pub struct MidiInputs {
    ports: Vec<Port>,
}

impl MidiInputs {
    /// Open every input port, or only those whose name contains `filter`.
    /// Ports that refuse the connection are skipped with a warning.
    pub fn open(filter: Option<&str>) -> Result<Self, midir::InitError> {
        let probe = MidiInput::new(CLIENT_NAME)?;
        let mut ports = Vec::new();

        for (index, port) in probe.ports().iter().enumerate() {
            let Ok(name) = probe.port_name(port) else {
                continue;
            };
            if filter.is_some_and(|f| !name.contains(f)) {
                continue;
            }

            let mut input = MidiInput::new(CLIENT_NAME)?;
            input.ignore(Ignore::All);
            let Some(port) = input.ports().get(index).cloned() else {
                continue;
            };

            let (mut tx, rx) = RingBuffer::<SynthMessage>::new(QUEUE_SIZE);
            let connected = input.connect(
                &port,
                "modsynth-in",
                move |_stamp, bytes, _| {
                    let Some(msg) = MidiEvent::parse(bytes).and_then(|e| midi_to_synth(e, None))
                    else {
                        return;
                    };
                    if let Err(PushError::Full(msg)) = tx.push(msg) {
                        warn!(?msg, "midi queue full, message dropped");
                    }
                },
                (),
            );

            match connected {
                Ok(connection) => {
                    info!(port = %name, "midi input connected");
                    ports.push(Port {
                        name,
                        rx,
                        _connection: connection,
                    });
                }
                Err(err) => warn!(port = %name, %err, "failed to connect midi input"),
            }
        }

        if ports.is_empty() {
            warn!("no midi inputs connected");
        }
        Ok(Self { ports })
    }

    pub fn port_names(&self) -> impl Iterator<Item = &str> {
        self.ports.iter().map(|p| p.name.as_str())
    }

    /// Hand every queued message to `handle`, port by port.
    pub fn poll(&mut self, mut handle: impl FnMut(SynthMessage)) {
        for port in &mut self.ports {
            while let Some(msg) = MessageReceiver::pop(&mut port.rx) {
                handle(msg);
            }
        }
    }
}
