//! `/app/movimientos`: KPI strip and the movement history.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Cell, Paragraph, Row},
};
use stockroom_core::{
  movement::MovementType,
  session::{Role, Session},
};

use super::widgets::{Grid, dim, draw_confirm, draw_form, draw_row_menu, pane};
use crate::pages::movements::{Kpis, MovementsPage};

pub fn draw(f: &mut Frame, area: Rect, page: &MovementsPage, session: &Session) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(3), Constraint::Length(1), Constraint::Min(0)])
    .split(area);

  draw_kpis(f, rows[0], &page.kpis);

  let hint = if session.can(&[Role::Operator, Role::Admin]) {
    Line::from(vec![
      Span::styled(" [n] + Nuevo movimiento", Style::default().fg(Color::Green)),
      Span::styled("   [i] Nuevo ingreso por SKU", dim()),
    ])
  } else {
    Line::default()
  };
  f.render_widget(Paragraph::new(hint), rows[1]);

  let table_rows = page
    .rows
    .iter()
    .map(|m| {
      let style = if m.active { Style::default() } else { dim() };
      Row::new(vec![
        Cell::from(m.created_at.clone()),
        Cell::from(Span::styled(m.label, kind_style(m.kind))),
        Cell::from(format!("{} ({})", m.product, m.sku)),
        Cell::from(m.warehouse.clone()),
        Cell::from(m.quantity.clone()),
        Cell::from(m.reason.clone()),
        Cell::from(m.user.clone()),
      ])
      .style(style)
    })
    .collect();
  Grid {
    block:  pane(format!("Movimientos ({})", page.rows.len())),
    header: &["Fecha", "Tipo", "Producto", "Bodega", "Cant.", "Razón", "Usuario"],
    widths: &[
      Constraint::Length(16),
      Constraint::Length(13),
      Constraint::Percentage(25),
      Constraint::Percentage(15),
      Constraint::Length(7),
      Constraint::Percentage(25),
      Constraint::Percentage(15),
    ],
    empty:  "No hay movimientos registrados.",
  }
  .draw(f, rows[2], table_rows, page.cursor);

  if let Some(menu) = &page.menu {
    draw_row_menu(f, area, menu, &page.row_actions(session));
  }
  if let Some(form) = &page.form {
    draw_form(f, area, &form.form);
  }
  draw_confirm(f, area, &page.confirm);
}

fn kind_style(kind: MovementType) -> Style {
  match kind {
    MovementType::Inbound => Style::default().fg(Color::Green),
    MovementType::Outbound => Style::default().fg(Color::Red),
    MovementType::Transfer => Style::default().fg(Color::Cyan),
    MovementType::Adjustment => Style::default().fg(Color::Yellow),
  }
}

fn draw_kpis(f: &mut Frame, area: Rect, kpis: &Kpis) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Ratio(1, 4); 4])
    .split(area);
  let cards = [
    ("Total", kpis.total, Color::White),
    ("Entradas", kpis.inbound, Color::Green),
    ("Salidas", kpis.outbound, Color::Red),
    ("Transferencias", kpis.transfer, Color::Cyan),
  ];
  for ((title, value, color), col) in cards.into_iter().zip(cols.iter()) {
    f.render_widget(
      Paragraph::new(Span::styled(
        value.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
      ))
      .block(pane(title)),
      *col,
    );
  }
}
