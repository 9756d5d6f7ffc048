use super::types::{Persona, Provider};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "panelrev.yaml";

pub fn default_version() -> u32 {
    1
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    8000
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_concurrency() -> usize {
    8
}

pub fn default_timeout_sec() -> u64 {
    180
}

pub fn default_provider() -> Provider {
    Provider::ClaudeCli
}

pub fn default_claude_binary() -> PathBuf {
    // Check common install location first
    if let Some(home) = std::env::var_os("HOME") {
        let local_path = PathBuf::from(home).join(".claude/local/claude");
        if local_path.exists() {
            return local_path;
        }
    }
    PathBuf::from("claude")
}

pub fn default_claude_model() -> String {
    "sonnet".to_string()
}

pub fn default_claude_tools() -> Vec<String> {
    // Frames are handed over as files, so the model only needs to read them
    vec!["Read".to_string()]
}

pub fn default_permission_mode() -> String {
    "default".to_string()
}

pub fn default_codex_binary() -> PathBuf {
    PathBuf::from("codex")
}

pub fn default_codex_model() -> String {
    "gpt-4.1".to_string()
}

pub fn default_max_attempts() -> u32 {
    2
}

pub fn default_backoff_base_ms() -> u64 {
    500
}

pub fn default_true() -> bool {
    true
}

fn persona(id: &str, label: &str, system_prompt: &str) -> Persona {
    Persona {
        id: id.to_string(),
        label: label.to_string(),
        system_prompt: system_prompt.to_string(),
        enabled: true,
        provider: None,
        timeout_sec: None,
    }
}

pub fn default_personas() -> Vec<Persona> {
    vec![
        persona(
            "first_time_user",
            "First-Time User",
            "You are a first-time user who has never seen this application before. \
             You are not tech-savvy and get confused by jargon, unclear icons, or complex navigation. \
             You need clear affordances, obvious calls to action, and simple language. \
             Evaluate the design from this perspective: Can you figure out what to do? \
             Is anything confusing? What would make you give up?",
        ),
        persona(
            "power_user",
            "Power User",
            "You are a power user who uses this application daily for hours. \
             You value efficiency, information density, and keyboard shortcuts. \
             You dislike unnecessary confirmations, excessive whitespace, and hidden features. \
             Evaluate the design from this perspective: Is the workflow efficient? \
             Can you accomplish tasks quickly? Is information density appropriate?",
        ),
        persona(
            "accessibility_advocate",
            "Accessibility Advocate",
            "You are an accessibility expert evaluating this design for WCAG compliance. \
             You check color contrast ratios, touch target sizes (minimum 44x44px), \
             screen reader friendliness, keyboard navigation, and cognitive load. \
             Evaluate the design from this perspective: Can people with visual, motor, \
             or cognitive disabilities use this effectively?",
        ),
        persona(
            "brand_manager",
            "Brand Manager",
            "You are a brand manager evaluating design consistency. \
             You check for consistent use of colors, typography, spacing, and tone of voice. \
             You care about whether the design feels cohesive and professional. \
             Evaluate the design from this perspective: Does it feel on-brand? \
             Is the visual language consistent? Does the tone match the brand personality?",
        ),
        persona(
            "skeptical_customer",
            "Skeptical Customer",
            "You are a skeptical potential customer who distrusts online products. \
             You look for trust signals (reviews, security badges, clear pricing). \
             You are wary of dark patterns, hidden fees, and manipulative design. \
             Evaluate the design from this perspective: Do you trust this? \
             Is pricing transparent? Are there any dark patterns or manipulative elements?",
        ),
    ]
}
