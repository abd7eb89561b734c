use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use balance_core::Command;

/// Key-style command letters:
/// - `p` toggle pause
/// - `r` reset
/// - `l` toggle the diagnostic overlay
/// - `q` quit
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "p" => Some(Command::TogglePause),
        "r" => Some(Command::Reset),
        "l" => Some(Command::ToggleDiagnosticOverlay),
        "q" => Some(Command::Quit),
        _ => None,
    }
}

/// Read commands from stdin on a background thread. The thread ends at EOF or once the
/// receiver is gone.
pub fn spawn_stdin_reader() -> std::io::Result<Receiver<Command>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-commands".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                match parse_command(&line) {
                    Some(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    None => tracing::warn!("unknown command {line:?} (use p, r, l or q)"),
                }
            }
        })?;
    Ok(rx)
}
