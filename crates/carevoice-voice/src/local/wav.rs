//! PCM16 WAV encoding for captured microphone audio.

use std::io::Cursor;

/// Average interleaved channels into a single mono channel.
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    if channels == 1 {
        return samples.to_vec();
    }
    #[allow(clippy::cast_precision_loss)]
    let scale = channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / scale)
        .collect()
}

/// Encode mono `[-1.0, 1.0]` samples as a 16-bit PCM WAV file.
pub fn encode_pcm16_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut wav = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut wav, spec)?;
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()?;

    Ok(wav.into_inner())
}
