//! [`ConfirmPrompt`]: the yes/no gate in front of destructive actions.

pub const DEFAULT_TITLE: &str = "Confirmar acción";
pub const CANCEL_LABEL: &str = "Cancelar";
pub const CONFIRM_LABEL: &str = "Sí, continuar";

/// A request waiting for an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending<A> {
  pub title:    String,
  pub subtitle: String,
  pub action:   A,
}

/// Holds at most one pending action. Opening a second request replaces the
/// first; nothing is queued.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmPrompt<A> {
  pending: Option<Pending<A>>,
}

impl<A> Default for ConfirmPrompt<A> {
  fn default() -> Self { Self { pending: None } }
}

impl<A> ConfirmPrompt<A> {
  pub fn new() -> Self { Self::default() }

  /// Ask for confirmation of `action`. An empty title falls back to
  /// [`DEFAULT_TITLE`].
  pub fn open(&mut self, title: &str, subtitle: impl Into<String>, action: A) {
    let title = if title.is_empty() { DEFAULT_TITLE } else { title };
    self.pending = Some(Pending {
      title: title.to_string(),
      subtitle: subtitle.into(),
      action,
    });
  }

  pub fn is_open(&self) -> bool { self.pending.is_some() }

  pub fn pending(&self) -> Option<&Pending<A>> { self.pending.as_ref() }

  /// Close the prompt and hand back the action to run.
  pub fn confirm(&mut self) -> Option<A> { self.pending.take().map(|p| p.action) }

  /// Close the prompt without running anything.
  pub fn cancel(&mut self) { self.pending = None; }
}
