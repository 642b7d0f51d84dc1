//! cpal output stream driving the graph

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, Stream, SupportedStreamConfig,
};
use tracing::{error, info};

use modsynth::{graph::AudioContext, MAX_BLOCK_SIZE};

pub fn default_output() -> EyreResult<(Device, SupportedStreamConfig)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;
    Ok((device, config))
}

/// Start playing `ctx` on `device`. The graph renders mono; every output
/// channel gets the same signal.
pub fn start(
    device: &Device,
    config: &SupportedStreamConfig,
    ctx: AudioContext,
) -> EyreResult<Stream> {
    let channels = config.channels() as usize;
    info!(
        device = %device.name().unwrap_or_default(),
        sample_rate = config.sample_rate().0,
        channels,
        "opening audio output"
    );

    let mut mono = vec![0.0f32; MAX_BLOCK_SIZE];
    let stream = device.build_output_stream(
        &config.config(),
        move |data: &mut [f32], _| {
            for chunk in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                let frames = chunk.len() / channels;
                let block = &mut mono[..frames];
                ctx.render(block);
                for (frame, &s) in chunk.chunks_mut(channels).zip(block.iter()) {
                    frame.fill(s);
                }
            }
        },
        |err| error!(%err, "audio stream error"),
        None,
    )?;

    stream.play()?;
    Ok(stream)
}
