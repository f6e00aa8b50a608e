use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use repochat_core::{update, AppState, Msg};
use repochat_logging::{repochat_info, repochat_warn};

use super::commands::{parse_line, Input, HELP};
use super::config::{resolve_config_path, AppConfig};
use super::effects::EffectRunner;
use super::render;

pub fn run_app() -> anyhow::Result<()> {
    let env = |key: &str| std::env::var(key).ok();
    let config_path = resolve_config_path(env);
    let config = AppConfig::load(&config_path)?.with_env_overrides(env);
    repochat_logging::initialize(&config.log_destination(), config.log_level()?);
    repochat_info!(
        "Starting repochat against {} (config {:?})",
        config.backend_url,
        config_path
    );

    let (input_tx, input_rx) = mpsc::channel::<Input>();
    let effects = EffectRunner::new(config.backend_settings(), input_tx.clone())
        .context("failed to start the network engine")?;
    spawn_terminal_reader(input_tx.clone());

    let mut stdout = io::stdout();
    writeln!(stdout, "{HELP}")?;
    input_tx.send(Input::Msg(Msg::AppStarted))?;

    let mut state = AppState::new();
    while let Ok(input) = input_rx.recv() {
        match input {
            Input::Msg(msg) => {
                let (next, pending) = update(state, msg);
                state = next;
                effects.run(pending);
                if state.consume_dirty() {
                    print_view(&mut stdout, &state)?;
                }
            }
            Input::Status => print_view(&mut stdout, &state)?,
            Input::Help => writeln!(stdout, "{HELP}")?,
            Input::Quit => break,
        }
    }

    // Release any open subscription before the engine goes away.
    let (_, pending) = update(state, Msg::CancelClicked);
    effects.run(pending);
    repochat_info!("repochat stopped");
    Ok(())
}

fn print_view(stdout: &mut io::Stdout, state: &AppState) -> io::Result<()> {
    writeln!(stdout, "\n{}", render::render(&state.view()))?;
    stdout.flush()
}

/// Reads commands from stdin until EOF, which is treated as `quit`.
fn spawn_terminal_reader(input_tx: mpsc::Sender<Input>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    repochat_warn!("Failed to read terminal input: {}", err);
                    break;
                }
            };
            let input = match parse_line(&line) {
                Ok(Some(input)) => input,
                Ok(None) => continue,
                Err(err) => {
                    eprintln!("{err}");
                    continue;
                }
            };
            let quit = input == Input::Quit;
            if input_tx.send(input).is_err() || quit {
                return;
            }
        }
        let _ = input_tx.send(Input::Quit);
    });
}
