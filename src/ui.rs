use crate::app::{App, Page};
use crate::catalog::{Indicator, Level, ValueKind};
use crate::concepts::CONCEPTS;
use crate::detail::{DetailPanel, Notice};
use crate::filters::{format_value, FilterOption};
use crate::map::MapFrame;
use crate::stats::{key_stats, region_chart};
use crate::style::{MissingValuePolicy, Rgb, NO_DATA_FILL, SELECTED_STROKE};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 32;
const DETAIL_WIDTH: u16 = 42;
const LOG_HEIGHT: u16 = 8;

/// Screen regions of the map page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Areas {
    pub body: Rect,
    pub sidebar: Rect,
    pub map: Rect,
    /// Drawable part of the map, inside its border
    pub map_inner: Rect,
    pub detail: Option<Rect>,
    pub logs: Option<Rect>,
    pub status: Rect,
}

pub fn layout(area: Rect, detail_open: bool, show_logs: bool) -> Areas {
    let mut rows = vec![Constraint::Min(3)];
    if show_logs {
        rows.push(Constraint::Length(LOG_HEIGHT));
    }
    rows.push(Constraint::Length(1));
    let chunks = Layout::default().direction(Direction::Vertical).constraints(rows).split(area);
    let body = chunks[0];

    let mut columns = vec![Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)];
    if detail_open {
        columns.push(Constraint::Length(DETAIL_WIDTH));
    }
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(columns)
        .split(body);

    Areas {
        body,
        sidebar: cols[0],
        map: cols[1],
        map_inner: Block::default().borders(Borders::ALL).inner(cols[1]),
        detail: detail_open.then(|| cols[2]),
        logs: show_logs.then(|| chunks[1]),
        status: chunks[chunks.len() - 1],
    }
}

fn titled(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let areas = layout(frame.area(), app.detail_open, app.show_logs);

    match app.page {
        Page::Map => {
            render_sidebar(frame, app, areas.sidebar);
            render_map(frame, app, areas.map);
            if let (Some(area), Some(panel)) = (areas.detail, app.detail_panel()) {
                render_detail(frame, app, &panel, area);
            }
            if app.search.is_active() {
                render_search(frame, app, areas.map);
            }
        }
        Page::Stats => render_stats(frame, app, areas.body),
        Page::Concepts => render_concepts(frame, areas.body),
    }
    if let Some(area) = areas.logs {
        render_logs(frame, app, area);
    }
    render_status_bar(frame, app, areas.status);
    if let Some(notice) = app.notifications.current() {
        render_notice(frame, notice, areas.body);
    }
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let heading = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(Span::styled("Niveau", heading))];

    for (i, level) in Level::ALL.into_iter().enumerate() {
        let active = app.selection.active_level() == level;
        let style = if active {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", i + 1), dim),
            Span::styled(format!(" {} ", level.label()), style),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Recensement", heading)));
    if app.years.is_empty() {
        lines.push(Line::from(Span::styled(" aucune année", dim)));
    } else {
        let mut spans = vec![Span::raw(" ")];
        for &year in &app.years {
            let style = if app.selection.selected_year() == Some(year) {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::styled(format!(" {year} "), style));
        }
        lines.push(Line::from(spans));
    }

    let national = app
        .demographics
        .as_ref()
        .and_then(|set| set.national())
        .and_then(|record| record.get(Indicator::TotalPopulation));
    if let Some(population) = national {
        lines.push(Line::from(vec![
            Span::styled(" Population nationale ", dim),
            Span::raw(format_value(Some(population), ValueKind::Count)),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Indicateur", heading)));
    match app.selection.active_filter() {
        Some(filter) => {
            if let Some(category) = app.filters.category_of(filter) {
                lines.push(Line::from(Span::styled(format!(" {}", category.title), dim)));
            }
            lines.push(Line::from(Span::raw(format!(" {}", filter.label))));
            lines.extend(legend(filter, app.policy));
        }
        None => lines.push(Line::from(Span::styled(" aucun (f pour choisir)", dim))),
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Sélection", heading)));
    let selected = app
        .selection
        .selection()
        .and_then(|(level, id)| app.catalog.get(level, id));
    match selected {
        Some(zone) => {
            lines.push(Line::from(Span::raw(format!(" {}", zone.name))));
            let mut meta = vec![zone.level.label().to_string()];
            meta.extend(zone.code.clone());
            let parent = zone.parent_level().zip(zone.parent_id).and_then(|(l, id)| app.catalog.get(l, id));
            if let Some(parent) = parent {
                meta.push(format!("dans {}", parent.name));
            }
            lines.push(Line::from(Span::styled(format!(" {}", meta.join(" · ")), dim)));
            if app.zone_export().is_none() {
                lines.push(Line::from(Span::styled(" pas de données", dim)));
            }
        }
        None => lines.push(Line::from(Span::styled(" aucune zone", dim))),
    }

    let paragraph = Paragraph::new(lines)
        .block(titled("RGPH Mauritanie"))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// One swatch line per bucket of the active indicator
fn legend(filter: &FilterOption, policy: MissingValuePolicy) -> Vec<Line<'static>> {
    let last = filter.ramp.len().saturating_sub(1);
    let mut lines: Vec<Line> = filter
        .ramp
        .iter()
        .enumerate()
        .map(|(i, &color)| {
            let lower = i.checked_sub(1).and_then(|j| filter.thresholds.get(j));
            let upper = if i < last { filter.thresholds.get(i) } else { None };
            let range = match (lower, upper) {
                (None, Some(u)) => format!("≤ {}", filter.format(*u)),
                (Some(l), Some(u)) => format!("{} - {}", filter.format(*l), filter.format(*u)),
                (Some(l), None) => format!("> {}", filter.format(*l)),
                (None, None) => String::new(),
            };
            swatch(color, range)
        })
        .collect();
    if policy == MissingValuePolicy::NoData {
        lines.push(swatch(NO_DATA_FILL, "pas de données".to_string()));
    }
    lines
}

fn swatch(color: Rgb, text: String) -> Line<'static> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled("██", Style::default().fg(color.into())),
        Span::raw(format!(" {text}")),
    ])
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.selection.selected_year() {
        Some(year) => format!("Carte · RGPH {year}"),
        None => "Carte".to_string(),
    };
    let block = titled(&title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.loading {
        let text = Paragraph::new("Chargement des zones…")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(text, inner);
        return;
    }

    let mut viewport = app.viewport.clone();
    // Braille gives 2x4 resolution per character
    viewport.resize(inner.width as usize * 2, inner.height as usize * 4);
    let map_frame = app.renderer.render(&app.scene(), &viewport);
    frame.render_widget(MapWidget { frame: map_frame }, inner);
}

/// Braille outlines over per-cell fills, with labels on top
struct MapWidget {
    frame: MapFrame,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cols = area.width.min(self.frame.canvas.width() as u16);
        let rows = area.height.min(self.frame.canvas.height() as u16);

        for row in 0..rows {
            for col in 0..cols {
                let cell = &mut buf[(area.x + col, area.y + row)];
                if let Some(fill) = self.frame.fill(col as usize, row as usize) {
                    cell.set_bg(fill.into());
                }
                if let Some((ch, color)) = self.frame.canvas.cell(col as usize, row as usize) {
                    cell.set_char(ch).set_fg(color.into());
                }
            }
        }

        for label in &self.frame.labels {
            if label.row >= rows {
                continue;
            }
            let y = area.y + label.row;
            for (i, ch) in label.text.chars().enumerate() {
                let col = label.col + i as u16;
                if col >= cols {
                    break;
                }
                let fill = self.frame.fill(col as usize, label.row as usize);
                // Dark text on light fills
                let fg = match fill {
                    Some(bg) if bg.luminance() > 0.5 => Color::Black,
                    _ => Color::White,
                };
                let mut style = Style::default().fg(fg);
                if label.selected {
                    style = style.fg(SELECTED_STROKE.into()).add_modifier(Modifier::BOLD);
                }
                buf[(area.x + col, y)].set_char(ch).set_style(style);
            }
        }
    }
}

fn render_detail(frame: &mut Frame, app: &App, panel: &DetailPanel, area: Rect) {
    let label_width = (area.width as usize).saturating_sub(14).max(8);
    let mut lines = vec![
        Line::from(Span::styled(panel.subtitle.clone(), Style::default().fg(Color::DarkGray))),
        Line::default(),
    ];
    for section in &panel.sections {
        lines.push(Line::from(Span::styled(
            section.title,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        for row in &section.rows {
            lines.push(Line::from(vec![
                Span::raw(format!(" {:<width$}", row.label, width = label_width)),
                Span::styled(format!("{:>10}", row.value), Style::default().fg(Color::Cyan)),
            ]));
        }
        lines.push(Line::default());
    }
    let hint = if app.zone_export().is_some() {
        "e: exporter la zone (xlsx)  Échap: fermer"
    } else {
        "Échap: fermer"
    };
    lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))));

    let paragraph = Paragraph::new(lines).block(titled(&panel.title));
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn render_search(frame: &mut Frame, app: &App, map: Rect) {
    let results = app.search.results();
    let height = (results.len() as u16 + 3).min(map.height);
    let width = map.width.saturating_sub(4).min(50);
    let area = Rect::new(map.x + 2, map.y + 1, width, height);

    let mut lines = vec![Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::raw(app.search.query().to_string()),
        Span::styled("▏", Style::default().fg(Color::Cyan)),
    ])];
    if results.is_empty() && !app.search.query().is_empty() {
        lines.push(Line::from(Span::styled(
            "Aucun résultat",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (i, hit) in results.iter().enumerate() {
        let style = if app.search.cursor() == Some(i) {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(hit.name.clone(), style),
            Span::styled(format!("  {}", hit.level.label()), Style::default().fg(Color::DarkGray)),
        ]));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(titled("Rechercher une zone")), area);
}

fn render_notice(frame: &mut Frame, notice: &Notice, body: Rect) {
    let (message, color, hint) = match notice {
        Notice::Success { message, .. } => (message, Color::Green, None),
        Notice::Error { message } => (message, Color::Red, Some("Entrée/Échap: fermer")),
    };
    let width = (message.chars().count() as u16 + 4).clamp(20, body.width.max(20)).min(body.width);
    let height = if hint.is_some() { 4 } else { 3 };
    let x = body.x + body.width.saturating_sub(width) / 2;
    let y = match notice {
        Notice::Success { .. } => body.y + 1,
        Notice::Error { .. } => body.y + body.height.saturating_sub(height) / 2,
    };
    let area = Rect::new(x, y, width, height).intersection(body);

    let mut lines = vec![Line::from(message.as_str())];
    if let Some(hint) = hint {
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .logs
        .iter()
        .skip(app.logs.len().saturating_sub(visible))
        .map(|l| Line::from(l.as_str()))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(titled("Journal")), area);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.selection.selected_year() {
        Some(year) => format!("Statistiques clés · RGPH {year} · {}", app.stats.region.label(&app.catalog)),
        None => "Statistiques clés".to_string(),
    };
    let block = titled(&title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(set) = app.demographics.as_ref() else {
        let text = Paragraph::new("Aucune donnée chargée")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(text, inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(inner);
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[0]);

    for (stat, &card) in key_stats(set, app.stats.region).iter().zip(cards.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(stat.title, Style::default().fg(Color::Yellow)));
        match stat.progress {
            Some(pct) => {
                let gauge = Gauge::default()
                    .block(block)
                    .gauge_style(Style::default().fg(Color::Cyan))
                    .ratio((pct / 100.0).clamp(0.0, 1.0))
                    .label(stat.value.clone());
                frame.render_widget(gauge, card);
            }
            None => {
                let text = Paragraph::new(vec![
                    Line::from(Span::styled(
                        stat.value.clone(),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(stat.description, Style::default().fg(Color::DarkGray))),
                ])
                .block(block)
                .wrap(Wrap { trim: true });
                frame.render_widget(text, card);
            }
        }
    }

    let bars = region_chart(set, &app.catalog);
    let data: Vec<(&str, u64)> = bars.iter().map(|(name, pop)| (name.as_str(), *pop)).collect();
    let chart = BarChart::default()
        .block(titled("Population par région"))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .data(data.as_slice());
    frame.render_widget(chart, rows[1]);
}

fn concept_lines() -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for concept in CONCEPTS {
        lines.push(Line::from(Span::styled(
            concept.title,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(concept.description));
        lines.push(Line::default());
    }
    lines
}

fn render_concepts(frame: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new(concept_lines())
        .block(titled("Concepts et définitions"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let hints = match app.page {
        Page::Map if app.search.is_active() => " | ↑↓:choisir Entrée:valider Échap:annuler",
        Page::Map => " | 1-3:niveau f/F:indicateur y/Y:année /:chercher e/E:export n:noms g:journal Tab:stats q:quitter",
        Page::Stats => " | [/]:région y/Y:année Tab:concepts q:quitter",
        Page::Concepts => " | Tab:carte q:quitter",
    };
    let status = Line::from(vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(format!("{:.0}", app.viewport.zoom), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", dim),
        Span::styled(app.selection.active_level().label(), Style::default().fg(Color::Magenta)),
        Span::styled(
            if app.show_names { " [N]oms" } else { " [n]oms" },
            Style::default().fg(if app.show_names { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(hints, dim),
    ]);
    frame.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_lines_title_then_text() {
        let lines = concept_lines();
        assert_eq!(lines.len(), CONCEPTS.len() * 3);
        assert_eq!(lines[0].spans[0].content, "Recensement Général de la Population (RGP)");
        assert!(lines[4].spans[0].content.starts_with("Le GeoJSON"));
    }

    #[test]
    fn test_layout_map_inner_inside_border() {
        let areas = layout(Rect::new(0, 0, 120, 40), false, false);
        assert_eq!(areas.sidebar.width, SIDEBAR_WIDTH);
        assert_eq!(areas.map.width, 120 - SIDEBAR_WIDTH);
        assert_eq!(areas.map_inner, Rect::new(SIDEBAR_WIDTH + 1, 1, 120 - SIDEBAR_WIDTH - 2, 37));
        assert_eq!(areas.status, Rect::new(0, 39, 120, 1));
        assert!(areas.detail.is_none());
        assert!(areas.logs.is_none());
    }

    #[test]
    fn test_layout_with_panel_and_logs() {
        let areas = layout(Rect::new(0, 0, 120, 40), true, true);
        assert_eq!(areas.detail.map(|r| r.width), Some(DETAIL_WIDTH));
        assert_eq!(areas.map.width, 120 - SIDEBAR_WIDTH - DETAIL_WIDTH);
        assert_eq!(areas.logs.map(|r| r.height), Some(LOG_HEIGHT));
        assert_eq!(areas.body.height, 40 - LOG_HEIGHT - 1);
    }

    #[test]
    fn test_legend_has_one_line_per_bucket() {
        let registry = crate::filters::FilterRegistry::builtin();
        let filter = registry.options().next().unwrap();
        assert_eq!(legend(filter, MissingValuePolicy::AsZero).len(), filter.ramp.len());
        assert_eq!(legend(filter, MissingValuePolicy::NoData).len(), filter.ramp.len() + 1);
    }
}
