use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::routing::RouteStep;
use crate::speech::{SpeechSynthesizer, Utterance, VoiceSettings};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

// Units are lower case only: "5 Mile Road" and "1 M Street" are names, not distances.
static DISTANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\(?(?:\b(?:[Ii]n|[Ff]or)\s+)?\b\d+(?:[.,]\d+)?\s*",
        r"(?:kilometers?|kilometres?|km|meters?|metres?|m|miles?|mi|feet|ft|yards?|yd)\b\)?",
    ))
    .expect("distance pattern")
});

static MANEUVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(SHL|SHR|SL|SR|TL|TR|UT|KL|KR)\b\.?").expect("maneuver pattern")
});

static STREET_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(St|Rd|Ave|Dr)\b(\.?)(\s+\p{Lu})?").expect("street suffix pattern")
});

static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?])").expect("punctuation pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

fn expand(abbreviation: &str) -> &'static str {
    match abbreviation {
        "SL" => "slight left",
        "SR" => "slight right",
        "TL" => "turn left",
        "TR" => "turn right",
        "SHL" => "sharp left",
        "SHR" => "sharp right",
        "UT" => "make a U-turn",
        "KL" => "keep left",
        "KR" => "keep right",
        "St" => "Street",
        "Rd" => "Road",
        "Ave" => "Avenue",
        "Dr" => "Drive",
        _ => "",
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// `St`, `Rd`, `Ave` and `Dr` are spelled out only after a word and not in front of a name,
/// so "Main St." becomes "Main Street" while "St. Mary's" and "Dr. Okello" stay as they are.
fn expand_street_suffixes(text: &str) -> String {
    STREET_SUFFIX
        .replace_all(text, |caps: &Captures| {
            let start = caps.get(0).map_or(0, |m| m.start());
            let after_word = text[..start]
                .trim_end()
                .chars()
                .last()
                .is_some_and(char::is_alphanumeric);
            if caps.get(3).is_some() || !after_word {
                caps[0].to_string()
            } else {
                expand(&caps[1]).to_string()
            }
        })
        .into_owned()
}

/// Turn a routing instruction into something worth reading aloud.
///
/// Markup and distance tokens are dropped and terse abbreviations are spelled out.
pub fn clean_instruction(text: &str) -> String {
    let text = TAG.replace_all(text, " ");
    let text = decode_entities(&text);
    let text = DISTANCE.replace_all(&text, " ");
    let text = MANEUVER.replace_all(&text, |caps: &Captures| expand(&caps[1]).to_string());
    let text = expand_street_suffixes(&text);
    let text = WHITESPACE.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
    text.trim()
        .trim_matches(|c: char| c == ',' || c == ';')
        .trim()
        .to_string()
}

/// Cleaned, non-empty instructions in route order.
pub fn route_script(steps: &[RouteStep]) -> Vec<String> {
    steps
        .iter()
        .map(|s| clean_instruction(&s.instruction))
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn direct_heading(destination: &str) -> String {
    format!("Heading directly to {destination}")
}

/// Voice guidance with at most one utterance audible at a time.
pub struct Narrator {
    synth: Box<dyn SpeechSynthesizer>,
    voice: VoiceSettings,
    enabled: bool,
}

impl Narrator {
    pub fn new(synth: Box<dyn SpeechSynthesizer>, voice: VoiceSettings, enabled: bool) -> Self {
        Self {
            synth,
            voice,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning narration off silences any in-flight utterance immediately.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.synth.cancel();
        }
    }

    pub fn stop(&mut self) {
        self.synth.cancel();
    }

    pub fn is_speaking(&mut self) -> bool {
        self.synth.is_speaking()
    }

    /// Speak one utterance, replacing whatever is playing. Returns whether anything was spoken.
    pub fn say(&mut self, text: &str) -> bool {
        if !self.enabled || text.trim().is_empty() {
            return false;
        }
        self.synth.cancel();
        self.synth.speak(&Utterance {
            text: text.to_string(),
            voice: self.voice.clone(),
        });
        true
    }

    /// Read a whole route as a single utterance.
    pub fn narrate_steps(&mut self, steps: &[RouteStep]) -> bool {
        let script = route_script(steps);
        if script.is_empty() {
            return false;
        }
        self.say(&script.join(". "))
    }
}
