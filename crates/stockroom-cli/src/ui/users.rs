//! `/app/usuarios`.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Style},
  text::{Line, Span},
  widgets::{Cell, Paragraph, Row},
};

use super::widgets::{Grid, dim, draw_confirm, draw_form, draw_row_menu, pane, status_span};
use crate::pages::users::UsersPage;

pub fn draw(f: &mut Frame, area: Rect, page: &UsersPage) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Min(0)])
    .split(area);

  f.render_widget(
    Paragraph::new(Line::from(vec![
      Span::styled(" [n] + Nuevo usuario", Style::default().fg(Color::Green)),
      Span::styled(format!("   Total: {}", page.total()), dim()),
    ])),
    rows[0],
  );

  let table_rows = page
    .rows
    .iter()
    .map(|u| {
      Row::new(vec![
        Cell::from(u.name.clone()),
        Cell::from(u.email.clone()),
        Cell::from(u.role),
        Cell::from(status_span(u.active)),
      ])
    })
    .collect();
  Grid {
    block:  pane(format!("Usuarios ({})", page.total())),
    header: &["Nombre", "Correo", "Rol", "Estado"],
    widths: &[
      Constraint::Percentage(30),
      Constraint::Percentage(40),
      Constraint::Length(15),
      Constraint::Length(10),
    ],
    empty:  "No hay usuarios registrados.",
  }
  .draw(f, rows[1], table_rows, page.cursor);

  if let Some(menu) = &page.menu {
    draw_row_menu(f, area, menu, &page.row_actions(menu.row));
  }
  if let Some(form) = &page.form {
    draw_form(f, area, &form.form);
  }
  draw_confirm(f, area, &page.confirm);
}
