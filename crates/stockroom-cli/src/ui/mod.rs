//! TUI rendering: orchestrates all panes.

pub mod dashboard;
pub mod login;
pub mod movements;
pub mod new_entry;
pub mod stock;
pub mod users;
pub mod widgets;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Clear, Paragraph},
};
use stockroom_core::{graphql::GraphqlTransport, route::Route, storage::ClientStorage};

use crate::{
  app::{App, Page},
  pages::users::role_label,
};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<T: GraphqlTransport, S: ClientStorage>(f: &mut Frame, app: &App<T, S>) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);

  if let Some(path) = &app.goto {
    draw_goto(f, area, path);
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<T, S>(f: &mut Frame, area: Rect, app: &App<T, S>) {
  let who = match app.session.user() {
    Some(user) => format!("{} · {}", user.email, role_label(user.role)),
    None => "sin sesión".to_string(),
  };
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    format!(" stockroom  {}", app.route.title()),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{who}  {date} "), Style::default().fg(Color::Gray));

  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body<T, S>(f: &mut Frame, area: Rect, app: &App<T, S>) {
  if let Page::Login(page) = &app.page {
    login::draw(f, area, page);
    return;
  }

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Length(26), Constraint::Min(0)])
    .split(area);

  draw_menu(f, cols[0], app);

  let session = &app.session;
  match &app.page {
    Page::Login(_) => {}
    Page::Dashboard(page) => dashboard::draw(f, cols[1], page, session),
    Page::Stock(page) => stock::draw(f, cols[1], page, session),
    Page::Movements(page) => movements::draw(f, cols[1], page, session),
    Page::NewEntry(page) => new_entry::draw(f, cols[1], page),
    Page::Users(page) => users::draw(f, cols[1], page),
  }
}

/// The routes the session may open, numbered for the digit shortcuts.
fn draw_menu<T, S>(f: &mut Frame, area: Rect, app: &App<T, S>) {
  let lines: Vec<Line> = Route::menu(&app.session)
    .into_iter()
    .enumerate()
    .map(|(i, route)| {
      let style = if route == app.route {
        widgets::selected_style()
      } else {
        Style::default()
      };
      Line::from(vec![
        Span::styled(format!(" {} ", i + 1), widgets::dim()),
        Span::styled(route.title().to_string(), style),
      ])
    })
    .collect();
  f.render_widget(Paragraph::new(lines).block(widgets::pane("Menú")), area);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<T: GraphqlTransport, S: ClientStorage>(f: &mut Frame, area: Rect, app: &App<T, S>) {
  let (mode_label, hints) = if app.goto.is_some() {
    ("IR A", "Escribe una ruta  Enter abrir  Esc cancelar")
  } else {
    match &app.page {
      Page::Login(p) if p.loading => ("LOGIN", "Ingresando…"),
      Page::Login(_) => ("LOGIN", "Tab campo  Enter ingresar  Ctrl-C salir"),
      Page::NewEntry(_) => ("INGRESO", "Enter registrar  Esc limpiar  Ctrl-G ir a  Ctrl-X salir"),
      _ if app.captures_input() => ("EDITAR", "Enter aceptar  Esc cancelar"),
      Page::Dashboard(_) => ("NORMAL", "↑↓/jk mover  Enter abrir  1-9 menú  g ir a  x salir  q cerrar"),
      _ => ("NORMAL", "↑↓/jk mover  Enter acciones  n nuevo  r recargar  1-9 menú  x salir  q cerrar"),
    }
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };
  let status_style = if app.status_msg.starts_with("Error") {
    Style::default().fg(Color::Red)
  } else {
    widgets::dim()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), status_style);

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

// ─── Go-to prompt ─────────────────────────────────────────────────────────────

fn draw_goto(f: &mut Frame, area: Rect, path: &str) {
  let popup = widgets::centered_rect(60, 3, area);
  f.render_widget(Clear, popup);
  f.render_widget(
    Paragraph::new(format!("{path}▏")).block(widgets::pane("Ir a")),
    popup,
  );
}
