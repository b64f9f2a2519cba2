//! Built-in tone synthesizer.
//!
//! Renders each sentence as a sequence of sine tones, one per word. The
//! output is deterministic, which makes it usable for dry runs of the
//! command line tool and as a synthesizer in tests.

use crate::{AudioChunk, PipelineError, SynthesisItem, SynthesisStream, Synthesizer, TextInput};
use async_trait::async_trait;
use narrator_audio::Samples;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tokio::sync::mpsc;
use tracing::debug;

/// Characters that end a sentence.
const SENTENCE_ENDS: [char; 4] = ['.', '!', '?', ';'];

/// Length of the fade applied to both ends of every tone.
const FADE_MS: u64 = 5;

/// Element type of the rendered samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneSampleFormat {
    #[default]
    F32,
    I16,
}

/// Tone synthesizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    pub sample_rate: u32,
    pub sample_format: ToneSampleFormat,
    /// Peak amplitude in `[0.0, 1.0]`.
    pub amplitude: f32,
    /// Tone length per character of a word.
    pub ms_per_char: u32,
    /// Silence after every word.
    pub gap_ms: u32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            sample_format: ToneSampleFormat::F32,
            amplitude: 0.3,
            ms_per_char: 60,
            gap_ms: 40,
        }
    }
}

/// A [`Synthesizer`] producing one sine tone per word.
///
/// Tokens are buffered until a sentence ends (`.`, `!`, `?` or `;`) or the
/// input is closed; each sentence becomes one [`SynthesisItem`].
#[derive(Debug, Clone, Default)]
pub struct ToneSynthesizer {
    config: ToneConfig,
}

impl ToneSynthesizer {
    pub fn new(config: ToneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToneConfig {
        &self.config
    }
}

#[async_trait]
impl Synthesizer for ToneSynthesizer {
    async fn open_stream(
        &self,
        voice: &str,
    ) -> Result<(TextInput, SynthesisStream), PipelineError> {
        if voice.is_empty() {
            return Err(PipelineError::Synthesis("voice must not be empty".to_string()));
        }
        if self.config.sample_rate == 0 {
            return Err(PipelineError::Synthesis(
                "tone sample rate must be positive".to_string(),
            ));
        }

        let (input, mut text) = TextInput::channel();
        let (tx, output) = SynthesisStream::channel(16);
        let renderer = Renderer {
            config: self.config.clone(),
            base_freq: base_frequency(voice),
        };
        debug!(voice, base_freq = renderer.base_freq, "tone: stream opened");

        tokio::spawn(async move {
            let mut pending = String::new();
            while let Some(token) = text.recv().await {
                pending.push_str(&token);
                if ends_sentence(&pending) {
                    let sentence = std::mem::take(&mut pending);
                    if !send(&tx, renderer.render(&sentence)).await {
                        return;
                    }
                }
            }
            if !pending.trim().is_empty() {
                send(&tx, renderer.render(&pending)).await;
            }
            debug!("tone: stream closed");
        });

        Ok((input, output))
    }
}

async fn send(tx: &mpsc::Sender<SynthesisItem>, item: SynthesisItem) -> bool {
    tx.send(item).await.is_ok()
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(SENTENCE_ENDS)
}

/// Voices named like `am_adam` (second letter `m`) get the lower register.
fn base_frequency(voice: &str) -> f64 {
    match voice.chars().nth(1) {
        Some('m') => 110.0,
        _ => 220.0,
    }
}

/// Maps a word to a pitch within one octave above `base`.
fn word_frequency(base: f64, word: &str) -> f64 {
    let step = word.chars().map(|c| c as u32).sum::<u32>() % 12;
    base * 2f64.powf(step as f64 / 12.0)
}

struct Renderer {
    config: ToneConfig,
    base_freq: f64,
}

impl Renderer {
    fn samples_for(&self, ms: u64) -> usize {
        let samples = u64::from(self.config.sample_rate).saturating_mul(ms) / 1000;
        usize::try_from(samples).unwrap_or(usize::MAX)
    }

    /// Tone length of a word; long words and large `ms_per_char` saturate.
    fn word_ms(&self, word: &str) -> u64 {
        (word.chars().count() as u64).saturating_mul(u64::from(self.config.ms_per_char))
    }

    fn render(&self, sentence: &str) -> SynthesisItem {
        let mut out: Vec<f32> = Vec::new();
        let mut phonemes: Vec<String> = Vec::new();

        for word in sentence.split_whitespace() {
            self.tone(&mut out, word_frequency(self.base_freq, word), self.word_ms(word));
            out.resize(out.len() + self.samples_for(u64::from(self.config.gap_ms)), 0.0);

            let phoneme: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if !phoneme.is_empty() {
                phonemes.push(phoneme);
            }
        }

        let samples = match self.config.sample_format {
            ToneSampleFormat::F32 => Samples::F32(out),
            ToneSampleFormat::I16 => Samples::I16(
                out.iter()
                    .map(|&v| (v.clamp(-1.0, 1.0) * 32767.0).round() as i16)
                    .collect(),
            ),
        };

        SynthesisItem::new(
            sentence.trim(),
            phonemes.join(" "),
            AudioChunk::new(samples, self.config.sample_rate),
        )
    }

    fn tone(&self, out: &mut Vec<f32>, freq: f64, ms: u64) {
        let n = self.samples_for(ms);
        let fade = self.samples_for(FADE_MS).min(n / 2).max(1);
        let rate = self.config.sample_rate as f64;
        let amplitude = self.config.amplitude.clamp(0.0, 1.0) as f64;

        out.reserve(n);
        for i in 0..n {
            let t = i as f64 / rate;
            let edge = i.min(n - 1 - i);
            let envelope = (edge as f64 / fade as f64).min(1.0);
            out.push((amplitude * envelope * (2.0 * PI * freq * t).sin()) as f32);
        }
    }
}

#[cfg(test)]
mod tone_tests {
    use super::*;

    fn config(sample_format: ToneSampleFormat) -> ToneConfig {
        ToneConfig {
            sample_rate: 1000,
            sample_format,
            amplitude: 0.5,
            ms_per_char: 10,
            gap_ms: 0,
        }
    }

    async fn collect(mut stream: SynthesisStream) -> Vec<SynthesisItem> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_one_item_per_sentence() {
        let synth = ToneSynthesizer::new(config(ToneSampleFormat::F32));
        let (input, stream) = synth.open_stream("af_heart").await.unwrap();
        for token in ["Hello", " world.", " Again", " and", " again"] {
            input.push(token).unwrap();
        }
        input.close();

        let items = collect(stream).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "Hello world.");
        assert_eq!(items[0].phonemes, "hello world");
        assert_eq!(items[1].text, "Again and again");
    }

    #[tokio::test]
    async fn test_length_follows_characters() {
        let synth = ToneSynthesizer::new(config(ToneSampleFormat::F32));
        let (input, stream) = synth.open_stream("af_heart").await.unwrap();
        input.push("ab").unwrap();
        input.push(" cde").unwrap();
        input.close();

        let items = collect(stream).await;
        let audio = items[0].audio.as_ref().unwrap();
        assert_eq!(audio.sampling_rate, 1000);
        assert_eq!(audio.len(), 50);

        match audio.samples.as_ref().unwrap() {
            Samples::F32(s) => assert!(s.iter().all(|v| v.abs() <= 0.5)),
            other => panic!("unexpected samples: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_int_sample_format() {
        let synth = ToneSynthesizer::new(config(ToneSampleFormat::I16));
        let (input, stream) = synth.open_stream("am_adam").await.unwrap();
        input.push("word!").unwrap();
        input.close();

        let items = collect(stream).await;
        let samples = items[0].audio.as_ref().unwrap().samples.as_ref().unwrap();
        assert_eq!(samples.kind(), "i16");
        assert_eq!(samples.len(), 50);
    }

    #[tokio::test]
    async fn test_no_text_no_items() {
        let synth = ToneSynthesizer::default();
        let (input, stream) = synth.open_stream("af_heart").await.unwrap();
        input.push("   \n").unwrap();
        input.close();
        assert!(collect(stream).await.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_empty_voice() {
        let synth = ToneSynthesizer::default();
        assert!(matches!(
            synth.open_stream("").await,
            Err(PipelineError::Synthesis(_))
        ));
    }

    #[test]
    fn test_pitch() {
        assert_eq!(base_frequency("am_adam"), 110.0);
        assert_eq!(base_frequency("af_heart"), 220.0);
        assert_eq!(base_frequency("x"), 220.0);

        let f = word_frequency(220.0, "hello");
        assert!((220.0..440.0).contains(&f));
        assert_eq!(f, word_frequency(220.0, "hello"));
    }

    #[test]
    fn test_word_length_saturates() {
        let synth = ToneSynthesizer::new(ToneConfig {
            ms_per_char: u32::MAX,
            ..config(ToneSampleFormat::F32)
        });
        assert_eq!(synth.config().ms_per_char, u32::MAX);

        let renderer = Renderer {
            config: synth.config().clone(),
            base_freq: 220.0,
        };
        assert_eq!(renderer.word_ms("hello"), 5 * u64::from(u32::MAX));
        assert_eq!(renderer.samples_for(u64::MAX), (u64::MAX / 1000) as usize);
        assert_eq!(renderer.samples_for(40), 40);
    }

    #[test]
    fn test_config_yaml_defaults() {
        let config: ToneConfig = serde_yaml::from_str("sample_format: i16\n").unwrap();
        assert_eq!(config.sample_format, ToneSampleFormat::I16);
        assert_eq!(config.sample_rate, 24000);
    }
}
