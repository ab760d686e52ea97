//! `/app/bodegas-productos`: warehouse, product and inventory tabs.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Cell, Paragraph, Row, Tabs},
};
use stockroom_core::session::Session;

use super::widgets::{Grid, dim, draw_confirm, draw_form, draw_row_menu, pane, status_span};
use crate::pages::stock::{StockPage, Tab};

pub fn draw(f: &mut Frame, area: Rect, page: &StockPage, session: &Session) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // tabs
      Constraint::Length(1), // primary action
      Constraint::Min(0),    // table
    ])
    .split(area);

  let tabs = page.tabs(session);
  let selected = tabs.iter().position(|t| *t == page.tab).unwrap_or(0);
  f.render_widget(
    Tabs::new(tabs.iter().map(|t| t.title()))
      .select(selected)
      .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
      .divider("│"),
    rows[0],
  );

  let primary = page.primary_label(session);
  let primary_style = if primary.contains("bloqueado") { dim() } else { Style::default().fg(Color::Green) };
  f.render_widget(
    Paragraph::new(Line::from(vec![
      Span::styled(format!(" [n] {primary}"), primary_style),
      Span::styled("   [Tab] cambiar pestaña", dim()),
    ])),
    rows[1],
  );

  match page.tab {
    Tab::Warehouses => draw_warehouses(f, rows[2], page),
    Tab::Products => draw_products(f, rows[2], page),
    Tab::Inventory => draw_inventory(f, rows[2], page),
  }

  if let Some(menu) = &page.menu {
    draw_row_menu(f, area, menu, &page.row_actions(session));
  }
  if let Some(form) = &page.form {
    draw_form(f, area, &form.form);
  }
  draw_confirm(f, area, &page.confirm);
}

fn draw_warehouses(f: &mut Frame, area: Rect, page: &StockPage) {
  let rows = page
    .warehouses
    .iter()
    .map(|w| {
      Row::new(vec![
        Cell::from(w.name.clone()),
        Cell::from(w.code.clone()),
        Cell::from(w.address.clone()),
        Cell::from(status_span(w.status == "Activo")),
      ])
    })
    .collect();
  Grid {
    block:  pane(format!("Bodegas ({})", page.warehouses.len())),
    header: &["Nombre", "Código", "Dirección", "Estado"],
    widths: &[
      Constraint::Percentage(30),
      Constraint::Length(10),
      Constraint::Percentage(45),
      Constraint::Length(10),
    ],
    empty:  "No hay bodegas registradas.",
  }
  .draw(f, area, rows, page.cursor);
}

fn draw_products(f: &mut Frame, area: Rect, page: &StockPage) {
  let rows = page
    .products
    .iter()
    .map(|p| {
      Row::new(vec![
        Cell::from(p.name.clone()),
        Cell::from(p.sku.clone()),
        Cell::from(p.unit.clone()),
        Cell::from(p.price.clone()),
        Cell::from(status_span(p.active)),
      ])
    })
    .collect();
  Grid {
    block:  pane(format!("Productos ({})", page.products.len())),
    header: &["Nombre", "SKU", "Unidad", "Precio", "Estado"],
    widths: &[
      Constraint::Percentage(35),
      Constraint::Length(14),
      Constraint::Length(10),
      Constraint::Length(14),
      Constraint::Length(10),
    ],
    empty:  "No hay productos registrados.",
  }
  .draw(f, area, rows, page.cursor);
}

fn draw_inventory(f: &mut Frame, area: Rect, page: &StockPage) {
  let rows = page
    .inventory
    .iter()
    .map(|i| {
      Row::new(vec![
        Cell::from(i.product.clone()),
        Cell::from(i.sku.clone()),
        Cell::from(format!("{} ({})", i.warehouse, i.warehouse_code)),
        Cell::from(i.quantity.clone()),
      ])
    })
    .collect();
  Grid {
    block:  pane(format!("Inventario ({})", page.inventory.len())),
    header: &["Producto", "SKU", "Bodega", "Cantidad"],
    widths: &[
      Constraint::Percentage(35),
      Constraint::Length(14),
      Constraint::Percentage(35),
      Constraint::Length(10),
    ],
    empty:  "Sin existencias registradas.",
  }
  .draw(f, area, rows, page.cursor);
}
