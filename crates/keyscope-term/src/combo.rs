//! Single key combos: a key plus modifiers.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyCombo {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Exact modifier match, except that SHIFT is implied by the key itself
    /// for characters (`"A"` matches Shift+a) and for BackTab, which
    /// terminals report together with SHIFT.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        if self.code != key.code {
            return false;
        }
        let mut modifiers = key.modifiers;
        let shift_implied = matches!(key.code, KeyCode::Char(_) | KeyCode::BackTab);
        if shift_implied && !self.modifiers.contains(KeyModifiers::SHIFT) {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        modifiers == self.modifiers
    }

    /// Canonical spelling: `C`, `M`, `S` prefixes in that order.
    pub fn display(&self) -> String {
        let mut parts: Vec<String> = [
            (KeyModifiers::CONTROL, "C"),
            (KeyModifiers::ALT, "M"),
            (KeyModifiers::SHIFT, "S"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.modifiers.contains(*flag))
        .map(|(_, name)| name.to_string())
        .collect();
        let key = match self.code {
            KeyCode::Char('-') if !parts.is_empty() => "Dash".to_string(),
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            code => key_name(code).unwrap_or("Unknown").to_string(),
        };
        parts.push(key);
        parts.join("-")
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&KeyEvent> for KeyCombo {
    fn from(key: &KeyEvent) -> Self {
        Self::new(key.code, key.modifiers)
    }
}

/// Modifier spellings, matched case-insensitively.
const MODIFIER_NAMES: &[(&str, KeyModifiers)] = &[
    ("C", KeyModifiers::CONTROL),
    ("ctrl", KeyModifiers::CONTROL),
    ("control", KeyModifiers::CONTROL),
    ("M", KeyModifiers::ALT),
    ("alt", KeyModifiers::ALT),
    ("meta", KeyModifiers::ALT),
    ("S", KeyModifiers::SHIFT),
    ("shift", KeyModifiers::SHIFT),
];

/// Named keys, matched case-insensitively. The first name listed for a key
/// is the one used for display.
const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("Enter", KeyCode::Enter),
    ("Return", KeyCode::Enter),
    ("Esc", KeyCode::Esc),
    ("Escape", KeyCode::Esc),
    ("Backspace", KeyCode::Backspace),
    ("Delete", KeyCode::Delete),
    ("Del", KeyCode::Delete),
    ("Insert", KeyCode::Insert),
    ("Ins", KeyCode::Insert),
    ("Tab", KeyCode::Tab),
    ("BackTab", KeyCode::BackTab),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("F1", KeyCode::F(1)),
    ("F2", KeyCode::F(2)),
    ("F3", KeyCode::F(3)),
    ("F4", KeyCode::F(4)),
    ("F5", KeyCode::F(5)),
    ("F6", KeyCode::F(6)),
    ("F7", KeyCode::F(7)),
    ("F8", KeyCode::F(8)),
    ("F9", KeyCode::F(9)),
    ("F10", KeyCode::F(10)),
    ("F11", KeyCode::F(11)),
    ("F12", KeyCode::F(12)),
    ("Space", KeyCode::Char(' ')),
    ("Spc", KeyCode::Char(' ')),
    ("Dash", KeyCode::Char('-')),
    ("Minus", KeyCode::Char('-')),
    ("Plus", KeyCode::Char('+')),
    ("Greater", KeyCode::Char('>')),
    ("Less", KeyCode::Char('<')),
    ("Comma", KeyCode::Char(',')),
    ("Period", KeyCode::Char('.')),
    ("Dot", KeyCode::Char('.')),
    ("Slash", KeyCode::Char('/')),
    ("Backslash", KeyCode::Char('\\')),
    ("Semicolon", KeyCode::Char(';')),
    ("Quote", KeyCode::Char('\'')),
    ("Apostrophe", KeyCode::Char('\'')),
    ("Backtick", KeyCode::Char('`')),
    ("Grave", KeyCode::Char('`')),
    ("Equal", KeyCode::Char('=')),
];

fn key_name(code: KeyCode) -> Option<&'static str> {
    NAMED_KEYS
        .iter()
        .find(|(_, named)| *named == code)
        .map(|(name, _)| *name)
}

/// Parse `"C-s"`, `"M-x"`, `"ctrl-alt-Del"`, `"Enter"`, `"?"`, ...
///
/// Shifted letters are stored the way terminals report them: `"S-a"` is the
/// same combo as `"A"`, and `"S-Tab"` is `"BackTab"`.
pub fn parse_key_combo(input: &str) -> Result<KeyCombo, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty key".to_string());
    }

    // A trailing '-' names the dash key itself: "-", "C--", "C-".
    let (mod_str, key_str) = match trimmed.rsplit_once('-') {
        None => ("", trimmed),
        Some((head, "")) => match head.strip_suffix('-') {
            Some("") => return Err("missing modifier before '-'".to_string()),
            Some(mods) => (mods, "-"),
            None => (head, "-"),
        },
        Some((head, key)) => {
            if head.is_empty() {
                return Err("empty modifier segment".to_string());
            }
            (head, key)
        }
    };

    let modifiers = if mod_str.is_empty() {
        KeyModifiers::empty()
    } else {
        mod_str.split('-').try_fold(KeyModifiers::empty(), add_modifier)?
    };
    let code = parse_key_code(key_str)?;
    Ok(normalize_shift(KeyCombo::new(code, modifiers)))
}

fn add_modifier(modifiers: KeyModifiers, raw: &str) -> Result<KeyModifiers, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty modifier segment".to_string());
    }
    let flag = MODIFIER_NAMES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(raw))
        .map(|(_, flag)| *flag)
        .ok_or_else(|| format!("unknown modifier '{}'", raw))?;
    if modifiers.contains(flag) {
        return Err(format!("duplicate modifier '{}'", raw));
    }
    Ok(modifiers | flag)
}

fn parse_key_code(input: &str) -> Result<KeyCode, String> {
    let trimmed = input.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Err("empty key".to_string()),
        (Some(ch), None) => Ok(KeyCode::Char(ch)),
        _ => NAMED_KEYS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
            .map(|(_, code)| *code)
            .ok_or_else(|| format!("unknown key '{}'", trimmed)),
    }
}

fn normalize_shift(combo: KeyCombo) -> KeyCombo {
    if !combo.modifiers.contains(KeyModifiers::SHIFT) {
        return combo;
    }
    let code = match combo.code {
        KeyCode::Char(c) if c.is_ascii_lowercase() => KeyCode::Char(c.to_ascii_uppercase()),
        KeyCode::Char(c) if c.is_ascii_uppercase() => KeyCode::Char(c),
        KeyCode::Tab | KeyCode::BackTab => KeyCode::BackTab,
        _ => return combo,
    };
    let mut modifiers = combo.modifiers;
    modifiers.remove(KeyModifiers::SHIFT);
    KeyCombo::new(code, modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    #[test]
    fn parse_key_combo_ctrl() {
        let combo = parse_key_combo("C-s").expect("combo");
        assert_eq!(combo.code, KeyCode::Char('s'));
        assert!(combo.modifiers.contains(KeyModifiers::CONTROL));
    }

    #[test]
    fn parse_key_combo_long_modifier_names() {
        let combo = parse_key_combo("ctrl-alt-Delete").expect("combo");
        assert_eq!(combo.code, KeyCode::Delete);
        assert_eq!(combo.modifiers, KeyModifiers::CONTROL | KeyModifiers::ALT);
    }

    #[test]
    fn parse_key_combo_function_keys() {
        assert_eq!(parse_key_combo("F1").expect("combo").code, KeyCode::F(1));
        assert_eq!(parse_key_combo("S-f12").expect("combo").code, KeyCode::F(12));
        assert!(parse_key_combo("F13").is_err());
    }

    #[test]
    fn parse_key_combo_dash() {
        let combo = parse_key_combo("-").expect("combo");
        assert_eq!(combo.code, KeyCode::Char('-'));
        let combo = parse_key_combo("C--").expect("combo");
        assert_eq!(combo.code, KeyCode::Char('-'));
        assert!(combo.modifiers.contains(KeyModifiers::CONTROL));
    }

    #[test]
    fn parse_key_combo_rejects_bad_input() {
        assert!(parse_key_combo("").unwrap_err().contains("empty key"));
        assert!(parse_key_combo("C-NotAKey").unwrap_err().contains("unknown key"));
        assert!(parse_key_combo("X-a").unwrap_err().contains("unknown modifier"));
        assert!(parse_key_combo("C-C-s").unwrap_err().contains("duplicate modifier"));
        assert!(parse_key_combo("--").unwrap_err().contains("missing modifier"));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for input in ["C-s", "M-x", "Enter", "C-M-Left", "Space", "?", "F5", "C-Dash"] {
            let combo = parse_key_combo(input).expect("combo");
            assert_eq!(parse_key_combo(&combo.display()).expect("reparse"), combo);
        }
        assert_eq!(parse_key_combo("ctrl-s").expect("combo").display(), "C-s");
    }

    #[test]
    fn matches_requires_exact_modifiers() {
        let combo = parse_key_combo("C-s").expect("combo");
        let plain = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE);
        let ctrl = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        let ctrl_alt = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL | KeyModifiers::ALT);
        assert!(!combo.matches(&plain));
        assert!(combo.matches(&ctrl));
        assert!(!combo.matches(&ctrl_alt));
    }

    #[test]
    fn shifted_characters_match_without_explicit_shift() {
        let combo = parse_key_combo("G").expect("combo");
        let mut shifted = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        shifted.kind = KeyEventKind::Press;
        assert!(combo.matches(&shifted));
    }

    #[test]
    fn backtab_matches_as_terminals_report_it() {
        let combo = parse_key_combo("BackTab").expect("combo");
        let reported = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert!(combo.matches(&reported));
        assert!(combo.matches(&KeyEvent::new(KeyCode::BackTab, KeyModifiers::NONE)));
        assert_eq!(parse_key_combo("S-Tab").expect("combo"), combo);
    }

    #[test]
    fn shift_letter_is_stored_as_the_uppercase_char() {
        let combo = parse_key_combo("S-a").expect("combo");
        assert_eq!(combo, parse_key_combo("A").expect("combo"));
        assert_eq!(combo.display(), "A");
        assert!(combo.matches(&KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)));
        assert!(!combo.matches(&KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)));

        let ctrl_shift = parse_key_combo("C-S-a").expect("combo");
        assert_eq!(ctrl_shift.display(), "C-A");
        assert!(ctrl_shift.matches(&KeyEvent::new(
            KeyCode::Char('A'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT
        )));
    }

    #[test]
    fn shift_on_other_keys_stays_explicit() {
        let combo = parse_key_combo("S-Left").expect("combo");
        assert_eq!(combo.display(), "S-Left");
        assert!(combo.matches(&KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT)));
        assert!(!combo.matches(&KeyEvent::new(KeyCode::Left, KeyModifiers::NONE)));
    }
}
