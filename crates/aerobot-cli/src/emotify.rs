/// Tone of a console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Happy,
    Worried,
    Sad,
    Bye,
}

impl Mood {
    fn face(self) -> &'static str {
        match self {
            Mood::Happy => "(^_^)",
            Mood::Worried => "(o_O)",
            Mood::Sad => "(T_T)",
            Mood::Bye => "(^_^)/",
        }
    }
}

/// Formats operator-facing messages, optionally prefixed with an emoticon.
#[derive(Debug, Clone, Copy)]
pub struct Emotifier {
    enabled: bool,
}

impl Emotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn line(&self, mood: Mood, msg: &str) -> String {
        if self.enabled {
            format!("{} {}", mood.face(), msg)
        } else {
            msg.to_string()
        }
    }

    /// Prints a line. The terminal may be in raw mode, so the carriage
    /// return is explicit.
    pub fn say(&self, mood: Mood, msg: &str) {
        print!("{}\r\n", self.line(mood, msg));
    }
}
