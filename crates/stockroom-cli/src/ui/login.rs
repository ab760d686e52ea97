//! `/login`: the only screen shown without a session.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use super::widgets::{centered_rect, dim, form_lines};
use crate::pages::login::LoginPage;

pub fn draw(f: &mut Frame, area: Rect, page: &LoginPage) {
  let mut lines = vec![
    Line::from(Span::styled("Ingresa con tu correo y contraseña.", dim())),
    Line::default(),
  ];
  lines.extend(form_lines(&page.form));
  if let Some(error) = &page.error {
    lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
  }
  if page.loading {
    lines.push(Line::from(Span::styled("Ingresando…", Style::default().fg(Color::Yellow))));
  }

  let popup = centered_rect(64, lines.len() as u16 + 2, area);
  let block = Block::default()
    .title(format!(" {} ", page.form.title))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  f.render_widget(Paragraph::new(lines).block(block), popup);
}
