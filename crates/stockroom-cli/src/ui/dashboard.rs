//! `/app/dashboard`.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::Paragraph,
};
use stockroom_core::session::Session;

use super::widgets::{dim, pane, selected_style};
use crate::pages::dashboard::DashboardPage;

pub fn draw(f: &mut Frame, area: Rect, page: &DashboardPage, session: &Session) {
  let mut lines = vec![
    Line::from(Span::styled(
      DashboardPage::greeting(session),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::from(Span::styled("Elige un módulo para continuar.", dim())),
    Line::default(),
  ];
  lines.extend(DashboardPage::entries(session).into_iter().enumerate().map(|(i, route)| {
    let style = if i == page.cursor { selected_style() } else { Style::default() };
    Line::from(vec![
      Span::styled(format!(" {} ", route.title()), style),
      Span::styled(format!("  {}", route.path()), dim()),
    ])
  }));
  f.render_widget(Paragraph::new(lines).block(pane("Dashboard")), area);
}
