use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// Playback parameters shared by every utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    /// 1.0 is the synthesizer's normal speed.
    pub rate: f32,
    /// 0.0 (silent) to 1.0 (full).
    pub volume: f32,
    /// 1.0 is the default pitch, range 0.0 to 2.0.
    pub pitch: f32,
    /// Voice is chosen by language prefix, e.g. "en" or "en-GB".
    pub lang: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 0.9,
            volume: 1.0,
            pitch: 1.0,
            lang: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: VoiceSettings,
}

/// Platform text-to-speech. Playback is fire-and-forget.
pub trait SpeechSynthesizer: Send {
    fn speak(&mut self, utterance: &Utterance);
    /// Stop whatever is playing. A no-op when idle.
    fn cancel(&mut self);
    fn is_speaking(&mut self) -> bool;
}

/// Synthesizer used when no speech engine is installed.
#[derive(Debug, Default)]
pub struct SilentSpeech;

impl SpeechSynthesizer for SilentSpeech {
    fn speak(&mut self, utterance: &Utterance) {
        tracing::debug!(text = %utterance.text, "no speech engine, skipping utterance");
    }

    fn cancel(&mut self) {}

    fn is_speaking(&mut self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEngine {
    EspeakNg,
    Espeak,
    SpdSay,
    Say,
}

impl SpeechEngine {
    pub fn all() -> &'static [SpeechEngine] {
        &[
            SpeechEngine::EspeakNg,
            SpeechEngine::Espeak,
            SpeechEngine::SpdSay,
            SpeechEngine::Say,
        ]
    }

    pub fn binary_name(&self) -> &'static str {
        match self {
            Self::EspeakNg => "espeak-ng",
            Self::Espeak => "espeak",
            Self::SpdSay => "spd-say",
            Self::Say => "say",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|e| e.binary_name() == name)
    }

    pub fn is_available(&self) -> bool {
        find_in_path(self.binary_name()).is_some()
    }

    /// Command-line arguments for one utterance.
    pub fn args(&self, utterance: &Utterance) -> Vec<String> {
        let v = &utterance.voice;
        let text = utterance.text.clone();
        match self {
            Self::EspeakNg | Self::Espeak => vec![
                "-s".to_string(),
                ((175.0 * v.rate).round() as i32).to_string(),
                "-a".to_string(),
                ((v.volume.clamp(0.0, 1.0) * 100.0).round() as i32).to_string(),
                "-p".to_string(),
                ((v.pitch.clamp(0.0, 2.0) * 50.0).round().min(99.0) as i32).to_string(),
                "-v".to_string(),
                v.lang.clone(),
                text,
            ],
            Self::SpdSay => vec![
                "-r".to_string(),
                (((v.rate - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32).to_string(),
                "-i".to_string(),
                (((v.volume.clamp(0.0, 1.0) * 200.0) - 100.0).round() as i32).to_string(),
                "-p".to_string(),
                (((v.pitch - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32).to_string(),
                "-l".to_string(),
                v.lang.clone(),
                text,
            ],
            Self::Say => vec![
                "-r".to_string(),
                ((175.0 * v.rate).round() as i32).to_string(),
                text,
            ],
        }
    }
}

fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Speaks through a system text-to-speech command, one child process per utterance.
pub struct CommandSpeech {
    engine: SpeechEngine,
    child: Option<Child>,
}

impl CommandSpeech {
    pub fn new(engine: SpeechEngine) -> Self {
        Self {
            engine,
            child: None,
        }
    }

    /// The configured engine if installed, otherwise the first installed one.
    pub fn detect(preferred: Option<&str>) -> Option<Self> {
        if let Some(engine) = preferred.and_then(SpeechEngine::from_name) {
            if engine.is_available() {
                return Some(Self::new(engine));
            }
            tracing::warn!(engine = engine.binary_name(), "configured speech engine not found");
        }
        SpeechEngine::all()
            .iter()
            .copied()
            .find(|e| e.is_available())
            .map(Self::new)
    }
}

impl SpeechSynthesizer for CommandSpeech {
    fn speak(&mut self, utterance: &Utterance) {
        self.cancel();
        let spawned = Command::new(self.engine.binary_name())
            .args(self.engine.args(utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => self.child = Some(child),
            Err(e) => {
                tracing::warn!(
                    engine = self.engine.binary_name(),
                    error = %e,
                    "failed to start speech"
                )
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if self.engine == SpeechEngine::SpdSay {
            // speech-dispatcher keeps playing after the client exits
            let _ = Command::new("spd-say")
                .arg("--cancel")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }

    fn is_speaking(&mut self) -> bool {
        match self.child.as_mut().map(|c| c.try_wait()) {
            Some(Ok(None)) => true,
            Some(_) => {
                self.child = None;
                false
            }
            None => false,
        }
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Best available synthesizer for this machine.
pub fn system_synthesizer(preferred: Option<&str>) -> Box<dyn SpeechSynthesizer> {
    match CommandSpeech::detect(preferred) {
        Some(speech) => {
            tracing::debug!(engine = speech.engine.binary_name(), "speech engine selected");
            Box::new(speech)
        }
        None => Box::new(SilentSpeech),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(text: &str) -> Utterance {
        Utterance {
            text: text.to_string(),
            voice: VoiceSettings::default(),
        }
    }

    #[test]
    fn test_espeak_args() {
        let mut u = utterance("Turn right");
        u.voice.rate = 1.0;
        let args = SpeechEngine::EspeakNg.args(&u);
        assert_eq!(
            args,
            vec!["-s", "175", "-a", "100", "-p", "50", "-v", "en", "Turn right"]
        );
    }

    #[test]
    fn test_spd_say_args_are_centered_on_zero() {
        let mut u = utterance("Hello");
        u.voice.rate = 1.0;
        u.voice.volume = 0.5;
        let args = SpeechEngine::SpdSay.args(&u);
        assert_eq!(args, vec!["-r", "0", "-i", "0", "-p", "0", "-l", "en", "Hello"]);
    }

    #[test]
    fn test_engine_from_name() {
        assert_eq!(SpeechEngine::from_name("say"), Some(SpeechEngine::Say));
        assert_eq!(SpeechEngine::from_name("festival"), None);
    }

    #[test]
    fn test_silent_speech_never_speaks() {
        let mut s = SilentSpeech;
        s.speak(&utterance("anything"));
        assert!(!s.is_speaking());
    }
}
