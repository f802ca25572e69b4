//! A small full-screen list for picking the synthetic scene the monitor
//! should play.

use crate::dummy_source::Scene;
use crate::gui::error::ScopeGuiError;

use std::io::stdout;

use crossterm::{
    event::{self, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{
        block::{Position, Title},
        *,
    },
    Terminal,
};

/// Presents the labeled scenes and returns the chosen one, or `None` if
/// the user backed out.
pub fn scene_selector(
    mut scenes: Vec<(String, Scene)>,
) -> Result<Option<Scene>, ScopeGuiError> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut cursor = 0;
    let mut list_state = ListState::default().with_selected(Some(cursor));
    let n_scenes = scenes.len();
    let mut selected = None;
    loop {
        let title = Title::from(" Scene Selector ".magenta().bold());
        let instructions = Title::from(Line::from(vec![
            " Navigate ".into(),
            "<Up>/<Down>".magenta().bold(),
            " Select ".into(),
            "<Enter>".magenta().bold(),
            " Quit ".into(),
            "<Q> ".magenta().bold(),
        ]));
        let block = Block::default()
            .title(title.alignment(Alignment::Center))
            .title(
                instructions
                    .alignment(Alignment::Center)
                    .position(Position::Bottom),
            )
            .borders(Borders::ALL);
        let scene_names = scenes.iter().map(|(name, _)| name.clone());
        let list = List::new(scene_names)
            .style(Style::default().fg(Color::White))
            .highlight_symbol(">>")
            .highlight_style(Style::default().fg(Color::Magenta))
            .block(block);
        list_state.select(Some(cursor));
        terminal
            .draw(|frame| {
                let area = frame.size();
                frame.render_stateful_widget(list, area, &mut list_state);
            })
            .unwrap();
        if event::poll(std::time::Duration::from_millis(16)).unwrap() {
            if let event::Event::Key(key) = event::read().unwrap() {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Down => {
                            cursor = (cursor + 1) % n_scenes;
                        }
                        KeyCode::Up => {
                            cursor = (cursor + n_scenes - 1) % n_scenes;
                        }
                        KeyCode::Enter => {
                            selected = Some(cursor);
                            break;
                        }
                        KeyCode::Char('q') => break,
                        _ => {}
                    }
                }
            }
        }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(selected.map(|i| scenes.swap_remove(i).1))
}
