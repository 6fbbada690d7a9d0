//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, EpisodeRow, InputMode, Notice, Overlay, View};
use crate::catalog::{Plan, Script};
use crate::config::{ControlsSettings, EpisodeDisplayField, TimeField, UiSettings};
use crate::player::{PlaybackState, Track};

/// Render a binding for the help line; the space bar needs a name.
fn key_label(binding: &str) -> String {
    if binding == " " {
        "space".to_string()
    } else {
        binding.to_string()
    }
}

/// Render the controls help text from the configured bindings.
fn controls_text(controls: &ControlsSettings, skip_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let entries = [
        (format!("{}/{}", controls.down, controls.up), "move".to_string()),
        (
            format!("{0}{0}/{1}", controls.top, controls.bottom),
            "top/bottom".to_string(),
        ),
        ("enter".to_string(), "play selected".to_string()),
        (key_label(&controls.toggle), "play/pause".to_string()),
        (
            format!("{}/{}", controls.skip_back, controls.skip_forward),
            format!("skip -/+{}s", skip_seconds),
        ),
        (controls.search.clone(), "search".to_string()),
        (controls.compose.clone(), "new episode".to_string()),
        (controls.like.clone(), "like".to_string()),
        (controls.full_player.clone(), "player".to_string()),
        (controls.plans.clone(), "plans".to_string()),
        (controls.profile.clone(), "profile".to_string()),
        (controls.refresh.clone(), "refresh".to_string()),
        (controls.quit.clone(), "quit".to_string()),
    ];
    entries
        .iter()
        .map(|(k, v)| format!("[{}] {}", k, v))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the "now playing" episode text according to `ui` settings.
fn now_playing_track_text(track: &Track, subject: Option<&str>, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in &ui.now_playing_fields {
        match f {
            EpisodeDisplayField::Title => {
                if !track.title.trim().is_empty() {
                    parts.push(track.title.clone());
                }
            }
            EpisodeDisplayField::Author => {
                if !track.author.trim().is_empty() {
                    parts.push(track.author.clone());
                }
            }
            EpisodeDisplayField::Subject => {
                if let Some(s) = subject.map(str::trim).filter(|s| !s.is_empty()) {
                    parts.push(s.to_string());
                }
            }
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(&ui.now_playing_separator)
    }
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    if ui.time_fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.time_separator))
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

/// One list row: "Name - Author  [12:34]  ♥ 3  (generating)  (mine)".
fn episode_row_text(row: &EpisodeRow, user_id: &str) -> String {
    let episode = &row.episode;
    let mut text = format!("{} - {}", episode.name, episode.author_name);

    if let Some(secs) = episode.duration_secs {
        text.push_str(&format!("  [{}]", format_mmss(Duration::from_secs(secs))));
    }

    let likes = episode.like_count();
    if likes > 0 {
        text.push_str(&format!("  ♥ {}", likes));
        if episode.liked_by_user(user_id) {
            text.push_str(" (liked)");
        }
    }

    if !episode.is_ready() {
        text.push_str("  (generating)");
    }
    if row.mine {
        text.push_str("  (mine)");
    }
    text
}

/// Transcript rendering: sections in order, one indented line per cue.
fn script_text(script: &Script) -> String {
    let mut out = String::new();
    for (section, lines) in script {
        out.push_str(section);
        out.push('\n');
        for line in lines {
            if let Some((speaker, text)) = line.iter().next() {
                out.push_str("  ");
                out.push_str(speaker);
                out.push_str(": ");
                out.push_str(text);
                out.push('\n');
            }
        }
        out.push('\n');
    }
    out
}

fn plan_text(plan: &Plan, current_plan: Option<&str>) -> String {
    let mut text = format!(
        "{} - ${:.2}/mo - {} tokens",
        plan.name, plan.price, plan.tokens
    );
    if !plan.features.is_empty() {
        text.push_str(&format!(" ({})", plan.features.join(", ")));
    }
    if current_plan == Some(plan.name.as_str()) {
        text.push_str("  [current]");
    }
    text
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    playback: &PlaybackState,
    play_pending: bool,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
    skip_seconds: u64,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(4),
        ])
        .split(frame.area());
    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" parlando ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box: input line while typing, otherwise notice or a summary.
    let (status, status_style) = match app.input_mode {
        InputMode::Search => (format!("search: {}_", app.input), Style::default()),
        InputMode::Compose => (
            format!("new episode about: {}_", app.input),
            Style::default(),
        ),
        InputMode::Normal => match &app.notice {
            Some(Notice::Error(msg)) => (format!("error: {msg}"), Style::default().fg(Color::Red)),
            Some(Notice::Info(msg)) => (msg.clone(), Style::default()),
            None => {
                let mut parts: Vec<String> = Vec::new();
                match &app.view {
                    View::Home => parts.push(format!("{} episodes", app.rows.len())),
                    View::SearchResults { query } => {
                        parts.push(format!("{} results for \"{}\"", app.rows.len(), query));
                    }
                }
                if let Some(tokens) = app.tokens() {
                    parts.push(format!("tokens: {tokens}"));
                }
                if app.any_generating() {
                    parts.push("generating...".to_string());
                }
                (parts.join(" • "), Style::default())
            }
        },
    };

    let status_par = Paragraph::new(status)
        .style(status_style)
        .slow_blink()
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Episode list
    {
        let list_title = match &app.view {
            View::Home => " episodes ",
            View::SearchResults { .. } => " search results ",
        };

        let total = app.rows.len();
        if total == 0 {
            let hint = format!(
                "No episodes. [{}] refreshes, [{}] starts a new one.",
                controls_settings.refresh, controls_settings.compose
            );
            let empty = Paragraph::new(hint)
                .block(Block::default().borders(Borders::ALL).title(list_title))
                .wrap(Wrap { trim: true });
            frame.render_widget(empty, chunks[2]);
        } else {
            // Center the selected item when possible by creating a visible window.
            // Important: only build ListItems for the visible window (avoid allocating the entire list).
            let list_height = chunks[2].height as usize;
            let sel_pos = app.selected.min(total - 1);
            let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0
            {
                (0, total, sel_pos)
            } else {
                let half = list_height / 2;
                let mut start = if sel_pos > half { sel_pos - half } else { 0 };
                if start + list_height > total {
                    start = total - list_height;
                }
                (start, start + list_height, sel_pos - start)
            };

            let visible_items: Vec<ListItem> = app.rows[start..end]
                .iter()
                .map(|row| ListItem::new(episode_row_text(row, app.user_id())))
                .collect();

            let list = List::new(visible_items)
                .block(Block::default().borders(Borders::ALL).title(list_title))
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol("> ");
            let mut state = ratatui::widgets::ListState::default();
            state.select(Some(selected_pos_in_visible));
            frame.render_stateful_widget(list, chunks[2], &mut state);
        }
    }

    // Mini player
    {
        let block = Block::default().borders(Borders::ALL).title(" player ");
        let inner = block.inner(chunks[3]);
        frame.render_widget(block, chunks[3]);

        match &playback.current {
            Some(track) => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(1), Constraint::Length(1)])
                    .split(inner);

                let state_word = if play_pending {
                    "starting"
                } else if playback.playing {
                    "playing"
                } else {
                    "paused"
                };
                let subject = app.now_playing.as_ref().and_then(|e| e.subject.as_deref());
                let line = format!(
                    "[{}] {}",
                    state_word,
                    now_playing_track_text(track, subject, ui_settings)
                );
                frame.render_widget(Paragraph::new(line), rows[0]);

                let total = playback.effective_duration();
                let ratio = match total {
                    Some(t) if t > Duration::ZERO => {
                        (playback.position.as_secs_f64() / t.as_secs_f64()).clamp(0.0, 1.0)
                    }
                    _ => 0.0,
                };
                let label = now_playing_time_text(playback.position, total, ui_settings)
                    .unwrap_or_else(|| format_mmss(playback.position));
                let gauge = Gauge::default()
                    .gauge_style(Style::default().add_modifier(Modifier::DIM))
                    .ratio(ratio)
                    .label(label);
                frame.render_widget(gauge, rows[1]);
            }
            None => {
                let hint = format!(
                    "Nothing playing. [enter] plays the selected episode, [{}] toggles.",
                    key_label(&controls_settings.toggle)
                );
                frame.render_widget(Paragraph::new(hint), inner);
            }
        }
    }

    // Overlays render inside the list area so header/status/footer stay visible.
    match &app.overlay {
        Overlay::None => {}
        Overlay::FullPlayer {
            show_script,
            script_scroll,
        } => {
            let popup_area = centered_rect_sized(76, 18, chunks[2]);
            frame.render_widget(Clear, popup_area);

            let episode = app.now_playing.as_ref();
            let (text, title) = if *show_script {
                let body = episode
                    .and_then(|e| e.script.as_ref())
                    .map(script_text)
                    .unwrap_or_else(|| "No transcript for this episode.".to_string());
                (
                    body,
                    format!(
                        " transcript ({}/{} scroll, {} back, esc closes) ",
                        controls_settings.down, controls_settings.up, controls_settings.full_player
                    ),
                )
            } else {
                let mut lines: Vec<String> = Vec::new();
                match episode {
                    Some(e) => {
                        lines.push(format!("Title: {}", e.name));
                        lines.push(format!("Author: {}", e.author_name));
                        lines.push(format!("Subject: {}", e.subject.as_deref().unwrap_or("-")));
                        lines.push(format!("Likes: {}", e.like_count()));
                        lines.push(format!(
                            "Duration: {}",
                            format_duration_mmss_ceil(playback.effective_duration())
                        ));
                        if let Some(url) = &e.image_url {
                            lines.push(format!("Art: {url}"));
                        }
                        let time = now_playing_time_text(
                            playback.position,
                            playback.effective_duration(),
                            ui_settings,
                        )
                        .unwrap_or_else(|| format_mmss(playback.position));
                        lines.push(format!("Position: {time}"));
                        if e.script.is_some() {
                            lines.push(String::new());
                            lines.push(format!(
                                "Transcript available, [{}] shows it.",
                                controls_settings.full_player
                            ));
                        }
                    }
                    None => lines.push("Nothing playing.".to_string()),
                }
                (lines.join("\n"), " player (esc closes) ".to_string())
            };

            let mut popup = Paragraph::new(text)
                .block(
                    Block::default()
                        .padding(Padding {
                            left: 1,
                            right: 0,
                            top: 0,
                            bottom: 0,
                        })
                        .borders(Borders::ALL)
                        .title(title),
                )
                .wrap(Wrap { trim: false });
            if *show_script {
                popup = popup.scroll((*script_scroll, 0));
            }
            frame.render_widget(popup, popup_area);
        }
        Overlay::Plans { selected } => {
            let popup_area = centered_rect_sized(64, 14, chunks[2]);
            frame.render_widget(Clear, popup_area);

            let block = Block::default()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .borders(Borders::ALL)
                .title(" plans (enter subscribes, esc closes) ");

            if app.plans.is_empty() {
                let loading = Paragraph::new("Plans are still loading.")
                    .block(block)
                    .wrap(Wrap { trim: true });
                frame.render_widget(loading, popup_area);
            } else {
                let current_plan = app.account.as_ref().map(|a| a.plan.as_str());
                let items: Vec<ListItem> = app
                    .plans
                    .iter()
                    .map(|p| ListItem::new(plan_text(p, current_plan)))
                    .collect();
                let list = List::new(items)
                    .block(block)
                    .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                    .highlight_symbol("> ");
                let mut state = ratatui::widgets::ListState::default();
                state.select(Some((*selected).min(app.plans.len() - 1)));
                frame.render_stateful_widget(list, popup_area, &mut state);
            }
        }
        Overlay::Profile => {
            let popup_area = centered_rect_sized(56, 12, chunks[2]);
            frame.render_widget(Clear, popup_area);

            let text = match &app.account {
                Some(account) => {
                    let mut lines = vec![
                        format!("User: {}", account.username),
                        format!("Plan: {}", account.plan),
                        format!("Tokens: {}", account.tokens),
                    ];
                    if account.cards.is_empty() {
                        lines.push("No cards on file.".to_string());
                    } else {
                        lines.push("Cards:".to_string());
                        for card in &account.cards {
                            lines.push(format!("  **** {}  exp {}", card.last4, card.expiry));
                        }
                    }
                    lines.join("\n")
                }
                None => "Account details are still loading.".to_string(),
            };
            let profile = Paragraph::new(text)
                .block(
                    Block::default()
                        .padding(Padding {
                            left: 1,
                            right: 0,
                            top: 0,
                            bottom: 0,
                        })
                        .borders(Borders::ALL)
                        .title(" profile (esc closes) "),
                )
                .wrap(Wrap { trim: true });
            frame.render_widget(profile, popup_area);
        }
    }

    let footer_text = controls_text(controls_settings, skip_seconds);
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[4]);
}
