//! `/app/nuevo-ingreso`: the entry form with SKU suggestions beside it.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  text::{Line, Span},
  widgets::Paragraph,
};

use super::widgets::{dim, form_lines, pane};
use crate::pages::new_entry::NewEntryPage;

pub fn draw(f: &mut Frame, area: Rect, page: &NewEntryPage) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
    .split(area);

  f.render_widget(
    Paragraph::new(form_lines(&page.form)).block(pane(page.form.title.clone())),
    cols[0],
  );

  let suggestions = page.suggestions(page.form.text("sku"));
  let lines: Vec<Line> = if suggestions.is_empty() {
    vec![Line::from(Span::styled("Escribe un SKU para ver coincidencias.", dim()))]
  } else {
    suggestions.into_iter().map(Line::from).collect()
  };
  f.render_widget(Paragraph::new(lines).block(pane("Coincidencias")), cols[1]);
}
