use serde::{Deserialize, Serialize};

/// Narration shown during a session, one line at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    lines: Vec<String>,
}

impl Script {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines: lines
                .into_iter()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect(),
        }
    }

    /// Splits prose into sentence lines at `.`, `!` or `?` followed by
    /// whitespace. Titles such as "Dr." do not end a sentence.
    pub fn from_text(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            current.push(ch);
            let at_boundary = chars.peek().map_or(true, |next| next.is_whitespace());
            if matches!(ch, '.' | '!' | '?') && at_boundary && !ends_with_title(&current) {
                lines.push(std::mem::take(&mut current));
            }
        }
        lines.push(current);
        Self::new(lines)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

const TITLES: &[&str] = &["Dr.", "Mr.", "Mrs.", "Ms.", "St."];

fn ends_with_title(fragment: &str) -> bool {
    fragment
        .split_whitespace()
        .last()
        .is_some_and(|word| TITLES.contains(&word))
}

/// Greeting used by the doctor directory page.
pub const DOCTORS_GUIDE: &str = "Namaste! I'm Dr. Aarogya, your trusted AI health companion. \
I'm here to help you find the right medical experts for your healthcare needs. \
Our directory includes certified doctors from across India, with details about their \
specializations, qualifications, and contact information. \
Whether you need a cardiologist, neurologist, or any other specialist, I'll guide you to the right professional.";

pub const MEDICINES_GUIDE: &str = "Namaste! I'm Dr. Aarogya, here to guide you through essential medicines and their proper usage. \
I'll help you understand medications with WHO standards and Jan Aushadhi guidelines. \
That covers dosages, side effects, benefits, and cost-effective alternatives. \
Always consult a healthcare professional before starting any medication.";

pub const CONSULTATION_GUIDE: &str = "Namaste! I'm Dr. Aarogya, your AI health companion. \
Tell me how you are feeling today. \
I can help with a general health check, symptom analysis, or wellness guidance. \
This consultation is informational and does not replace professional medical advice.";
