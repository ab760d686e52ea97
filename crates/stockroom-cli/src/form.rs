//! Keyboard-driven forms: text inputs, option pickers and toggles.

use crossterm::event::{KeyCode, KeyEvent};

// ─── Fields ──────────────────────────────────────────────────────────────────

/// One selectable option: what is shown and what is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
  pub label: String,
  pub value: String,
}

impl Choice {
  pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
    Self { label: label.into(), value: value.into() }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
  Text { value: String, masked: bool },
  Select { options: Vec<Choice>, selected: Option<usize> },
  Toggle(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
  pub key:   &'static str,
  pub label: &'static str,
  pub kind:  FieldKind,
}

impl Field {
  pub fn text(key: &'static str, label: &'static str, value: impl Into<String>) -> Self {
    Self { key, label, kind: FieldKind::Text { value: value.into(), masked: false } }
  }

  pub fn password(key: &'static str, label: &'static str) -> Self {
    Self { key, label, kind: FieldKind::Text { value: String::new(), masked: true } }
  }

  pub fn select(key: &'static str, label: &'static str, options: Vec<Choice>) -> Self {
    Self { key, label, kind: FieldKind::Select { options, selected: None } }
  }

  pub fn toggle(key: &'static str, label: &'static str, on: bool) -> Self {
    Self { key, label, kind: FieldKind::Toggle(on) }
  }

  /// What the field shows on screen.
  pub fn display(&self) -> String {
    match &self.kind {
      FieldKind::Text { value, masked: true } => "•".repeat(value.chars().count()),
      FieldKind::Text { value, .. } => value.clone(),
      FieldKind::Select { options, selected } => selected
        .and_then(|i| options.get(i))
        .map(|c| format!("‹ {} ›", c.label))
        .unwrap_or_else(|| "‹ — ›".to_string()),
      FieldKind::Toggle(on) => (if *on { "[x]" } else { "[ ]" }).to_string(),
    }
  }
}

// ─── Form ────────────────────────────────────────────────────────────────────

/// What a key press did to a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
  Edited,
  Submit,
  Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
  pub title:  String,
  pub fields: Vec<Field>,
  pub focus:  usize,
  /// Validation message shown under the fields.
  pub error:  Option<String>,
}

impl Form {
  pub fn new(title: impl Into<String>, fields: Vec<Field>) -> Self {
    Self { title: title.into(), fields, focus: 0, error: None }
  }

  fn field(&self, key: &str) -> Option<&Field> { self.fields.iter().find(|f| f.key == key) }

  fn field_mut(&mut self, key: &str) -> Option<&mut Field> {
    self.fields.iter_mut().find(|f| f.key == key)
  }

  /// The text of `key`, trimmed. Empty for non-text fields.
  pub fn text(&self, key: &str) -> &str {
    match self.field(key).map(|f| &f.kind) {
      Some(FieldKind::Text { value, .. }) => value.trim(),
      _ => "",
    }
  }

  /// The value of the selected option of `key`.
  pub fn selected(&self, key: &str) -> Option<&str> {
    match self.field(key).map(|f| &f.kind) {
      Some(FieldKind::Select { options, selected }) => {
        selected.and_then(|i| options.get(i)).map(|c| c.value.as_str())
      }
      _ => None,
    }
  }

  pub fn toggled(&self, key: &str) -> bool {
    matches!(self.field(key).map(|f| &f.kind), Some(FieldKind::Toggle(true)))
  }

  pub fn set_text(&mut self, key: &str, text: impl Into<String>) {
    if let Some(Field { kind: FieldKind::Text { value, .. }, .. }) = self.field_mut(key) {
      *value = text.into();
    }
  }

  /// Select the option whose value is `value`; `None` clears the selection.
  pub fn select(&mut self, key: &str, value: Option<&str>) {
    if let Some(Field { kind: FieldKind::Select { options, selected }, .. }) = self.field_mut(key) {
      *selected = value.and_then(|v| options.iter().position(|c| c.value == v));
    }
  }

  /// Replace the options of `key`, keeping the current selection if its value
  /// is still offered.
  pub fn set_options(&mut self, key: &str, new_options: Vec<Choice>) {
    if let Some(Field { kind: FieldKind::Select { options, selected }, .. }) = self.field_mut(key) {
      let current = selected.and_then(|i| options.get(i)).map(|c| c.value.clone());
      *selected = current.and_then(|v| new_options.iter().position(|c| c.value == v));
      *options = new_options;
    }
  }

  pub fn focused_key(&self) -> Option<&'static str> { self.fields.get(self.focus).map(|f| f.key) }

  pub fn handle_key(&mut self, key: KeyEvent) -> FormEvent {
    match key.code {
      KeyCode::Esc => return FormEvent::Cancel,
      KeyCode::Enter => return FormEvent::Submit,
      KeyCode::Tab | KeyCode::Down => {
        if !self.fields.is_empty() {
          self.focus = (self.focus + 1) % self.fields.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        if !self.fields.is_empty() {
          self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
      }
      code => {
        let Some(field) = self.fields.get_mut(self.focus) else {
          return FormEvent::Edited;
        };
        match (&mut field.kind, code) {
          (FieldKind::Text { value, .. }, KeyCode::Char(c)) => value.push(c),
          (FieldKind::Text { value, .. }, KeyCode::Backspace) => {
            value.pop();
          }
          (FieldKind::Select { options, selected }, KeyCode::Right | KeyCode::Char(' ')) => {
            if !options.is_empty() {
              *selected = Some(selected.map_or(0, |i| (i + 1) % options.len()));
            }
          }
          (FieldKind::Select { options, selected }, KeyCode::Left) => {
            if !options.is_empty() {
              *selected = Some(selected.map_or(options.len() - 1, |i| {
                (i + options.len() - 1) % options.len()
              }));
            }
          }
          (FieldKind::Toggle(on), KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) => {
            *on = !*on;
          }
          _ => {}
        }
      }
    }
    FormEvent::Edited
  }
}

// ─── Validation helpers ──────────────────────────────────────────────────────

/// A deliberately loose address check: one `@`, a non-empty local part and
/// a dotted domain without spaces.
pub fn is_valid_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && !email.contains(char::is_whitespace)
    && domain.contains('.')
    && domain.split('.').all(|part| !part.is_empty())
}

/// Parse a quantity typed by the user; commas are accepted as decimal
/// separators.
pub fn parse_number(raw: &str) -> Option<f64> {
  raw.trim().replace(',', ".").parse::<f64>().ok().filter(|n| n.is_finite())
}
