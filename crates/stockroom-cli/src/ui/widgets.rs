//! Overlays and pieces shared by the page renderers.

use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::{
  confirm::{CANCEL_LABEL, CONFIRM_LABEL, ConfirmPrompt},
  form::{FieldKind, Form},
  pages::{RowAction, RowMenu},
};

pub fn selected_style() -> Style {
  Style::default()
    .bg(Color::Blue)
    .fg(Color::White)
    .add_modifier(Modifier::BOLD)
}

pub fn dim() -> Style { Style::default().fg(Color::DarkGray) }

pub fn pane(title: impl Into<String>) -> Block<'static> {
  Block::default()
    .title(format!(" {} ", title.into()))
    .borders(Borders::ALL)
    .border_style(dim())
}

/// A `width` × `height` rectangle centred in `area`, clamped to it.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}

// ─── Tables ───────────────────────────────────────────────────────────────────

/// Column layout and empty-state text for a bordered table.
pub struct Grid<'a> {
  pub block:  Block<'static>,
  pub header: &'a [&'static str],
  pub widths: &'a [Constraint],
  pub empty:  &'a str,
}

impl Grid<'_> {
  /// Render `rows` with the one under `cursor` highlighted.
  pub fn draw(self, f: &mut Frame, area: Rect, rows: Vec<Row<'static>>, cursor: usize) {
    if rows.is_empty() {
      let inner = self.block.inner(area);
      f.render_widget(self.block, area);
      f.render_widget(Paragraph::new(Span::styled(self.empty.to_string(), dim())), inner);
      return;
    }
    let header = Row::new(self.header.iter().copied())
      .style(Style::default().add_modifier(Modifier::BOLD))
      .bottom_margin(1);
    let table = Table::new(rows, self.widths.to_vec())
      .header(header)
      .block(self.block)
      .row_highlight_style(selected_style())
      .highlight_symbol("▶ ");
    let mut state = TableState::default().with_selected(Some(cursor));
    f.render_stateful_widget(table, area, &mut state);
  }
}

/// "Activo" in green or "Inactivo" in grey.
pub fn status_span(active: bool) -> Span<'static> {
  if active {
    Span::styled("Activo", Style::default().fg(Color::Green))
  } else {
    Span::styled("Inactivo", dim())
  }
}

// ─── Form overlay ─────────────────────────────────────────────────────────────

/// One line per field, then the validation message and key hints.
pub fn form_lines(form: &Form) -> Vec<Line<'static>> {
  let label_width = form
    .fields
    .iter()
    .map(|field| field.label.chars().count())
    .max()
    .unwrap_or(0);

  let mut lines: Vec<Line> = form
    .fields
    .iter()
    .enumerate()
    .map(|(i, field)| {
      let focused = i == form.focus;
      let value_style = if focused { selected_style() } else { Style::default() };
      let mut value = field.display();
      if focused && matches!(field.kind, FieldKind::Text { .. }) {
        value.push('▏');
      }
      Line::from(vec![
        Span::styled(format!("{:>label_width$}  ", field.label), dim()),
        Span::styled(value, value_style),
      ])
    })
    .collect();

  lines.push(Line::default());
  if let Some(error) = &form.error {
    lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
  }
  lines.push(Line::from(Span::styled(
    "Tab/↑↓ campo  ←→/espacio opción  Enter guardar  Esc cancelar",
    dim(),
  )));
  lines
}

pub fn draw_form(f: &mut Frame, area: Rect, form: &Form) {
  let lines = form_lines(form);
  let height = lines.len() as u16 + 2;
  let popup = centered_rect(72, height, area);
  let block = Block::default()
    .title(format!(" {} ", form.title))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  f.render_widget(Clear, popup);
  f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), popup);
}

// ─── Confirm overlay ──────────────────────────────────────────────────────────

pub fn draw_confirm<A>(f: &mut Frame, area: Rect, prompt: &ConfirmPrompt<A>) {
  let Some(pending) = prompt.pending() else {
    return;
  };
  let lines = vec![
    Line::from(Span::styled(
      pending.title.clone(),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::default(),
    Line::from(pending.subtitle.clone()),
    Line::default(),
    Line::from(vec![
      Span::styled(format!(" {CANCEL_LABEL} (n) "), Style::default().fg(Color::Black).bg(Color::Gray)),
      Span::raw("   "),
      Span::styled(
        format!(" {CONFIRM_LABEL} (s) "),
        Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
      ),
    ]),
  ];
  let popup = centered_rect(64, 9, area);
  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Red));
  f.render_widget(Clear, popup);
  f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), popup);
}

// ─── Row menu ─────────────────────────────────────────────────────────────────

pub fn draw_row_menu(f: &mut Frame, area: Rect, menu: &RowMenu, actions: &[RowAction]) {
  if actions.is_empty() {
    return;
  }
  let lines: Vec<Line> = actions
    .iter()
    .enumerate()
    .map(|(i, action)| {
      let style = if i == menu.cursor { selected_style() } else { Style::default() };
      Line::from(Span::styled(format!(" {} ", action.label()), style))
    })
    .collect();
  let popup = centered_rect(24, actions.len() as u16 + 2, area);
  f.render_widget(Clear, popup);
  f.render_widget(Paragraph::new(lines).block(pane("Acciones")), popup);
}
