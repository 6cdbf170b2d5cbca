//! Console presentation
//!
//! Prints one status line per published snapshot and turns stdin lines into
//! monitor requests.

use std::sync::Arc;

use sensorlink_core::monitor::{MonitorRequest, MonitorSnapshot};
use sensorlink_core::reading::Channel;
use sensorlink_core::session::EventCommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Render the one-line live view
pub fn status_line(snapshot: &MonitorSnapshot) -> String {
    let mut line = format!("[{}] #{}", snapshot.connection, snapshot.packet_count);

    if let Some(latest) = &snapshot.latest {
        for channel in Channel::ALL {
            line.push_str(&format!(
                "  {} {:.2}{}",
                channel.column(),
                latest.get(channel),
                channel.unit()
            ));
        }
    }
    if let Some(delta) = snapshot.delta {
        line.push_str(&format!("  ΔT {:.2}°C", delta));
    }

    let event = if snapshot.event_tag.is_empty() {
        "None"
    } else {
        snapshot.event_tag.as_str()
    };
    line.push_str(&format!("  event={}", event));

    if snapshot.test_running {
        line.push_str(&format!("  elapsed={}", snapshot.elapsed));
    }
    line
}

/// Render window statistics; a missing std prints blank
fn summary_lines(snapshot: &MonitorSnapshot) -> Vec<String> {
    snapshot
        .summary
        .channels
        .iter()
        .map(|summary| match &summary.stats {
            Some(stats) => format!(
                "{:<14} mean {:>8.2}  max {:>8.2}  min {:>8.2}  std {:>8}",
                summary.channel.label(),
                stats.mean,
                stats.max,
                stats.min,
                stats.std.map(|s| format!("{:.2}", s)).unwrap_or_default()
            ),
            None => format!("{:<14} (no data)", summary.channel.label()),
        })
        .collect()
}

/// Print snapshots as they are published
pub async fn present(
    mut updates: watch::Receiver<Arc<MonitorSnapshot>>,
    cancel: CancellationToken,
) {
    let mut last_count = u64::MAX;
    let mut last_state = None;
    let mut last_error: Option<String> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let snapshot = updates.borrow_and_update().clone();
        if snapshot.packet_count != last_count || Some(snapshot.connection) != last_state {
            println!("{}", status_line(&snapshot));
            last_count = snapshot.packet_count;
            last_state = Some(snapshot.connection);
        }
        if snapshot.last_error != last_error {
            if let Some(err) = &snapshot.last_error {
                eprintln!("! {}", err);
            }
            last_error = snapshot.last_error.clone();
        }
    }
}

/// Operator input parsed from one stdin line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// An event command
    Event(EventCommand),
    /// Print the full snapshot as JSON
    Status,
    /// Print window statistics
    Summary,
    /// Print the window as CSV
    Export,
    /// Print the whole session log
    ExportLog,
    /// List commands
    Help,
    /// Stop the monitor
    Quit,
}

/// Parse one line of operator input
pub fn parse_input(line: &str) -> Result<ConsoleInput, String> {
    match line.trim().to_ascii_lowercase().as_str() {
        "status" => Ok(ConsoleInput::Status),
        "summary" | "stats" => Ok(ConsoleInput::Summary),
        "export" => Ok(ConsoleInput::Export),
        "export-log" => Ok(ConsoleInput::ExportLog),
        "help" | "?" => Ok(ConsoleInput::Help),
        "quit" | "exit" => Ok(ConsoleInput::Quit),
        other => other
            .parse::<EventCommand>()
            .map(ConsoleInput::Event)
            .map_err(|e| e.to_string()),
    }
}

fn print_help() {
    let events: Vec<&str> = EventCommand::ALL.iter().map(|c| c.name()).collect();
    println!("Events:   {}", events.join(", "));
    println!("Commands: status, summary, export, export-log, help, quit");
}

/// Read operator commands from stdin until EOF, `quit` or cancellation
pub async fn read_commands(
    requests: mpsc::Sender<MonitorRequest>,
    updates: watch::Receiver<Arc<MonitorSnapshot>>,
    cancel: CancellationToken,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read operator input: {}", e);
                break;
            }
        };

        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("{} (type 'help')", e);
                continue;
            }
        };

        let sent = match input {
            ConsoleInput::Event(command) => requests
                .send(MonitorRequest::Annotate(command))
                .await
                .is_ok(),
            ConsoleInput::Status => {
                let snapshot = updates.borrow().clone();
                match serde_json::to_string_pretty(&*snapshot) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("Failed to serialize snapshot: {}", e),
                }
                true
            }
            ConsoleInput::Summary => {
                let snapshot = updates.borrow().clone();
                for line in summary_lines(&snapshot) {
                    println!("{}", line);
                }
                true
            }
            ConsoleInput::Export => {
                let (tx, rx) = oneshot::channel();
                let ok = requests.send(MonitorRequest::ExportWindow(tx)).await.is_ok();
                if let Ok(csv) = rx.await {
                    print!("{}", String::from_utf8_lossy(&csv));
                }
                ok
            }
            ConsoleInput::ExportLog => {
                let (tx, rx) = oneshot::channel();
                let ok = requests.send(MonitorRequest::ExportLog(tx)).await.is_ok();
                match rx.await {
                    Ok(Ok(csv)) => print!("{}", String::from_utf8_lossy(&csv)),
                    Ok(Err(e)) => eprintln!("Failed to read log: {}", e),
                    Err(_) => {}
                }
                ok
            }
            ConsoleInput::Help => {
                print_help();
                true
            }
            ConsoleInput::Quit => {
                cancel.cancel();
                break;
            }
        };

        if !sent {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(
            parse_input("heater"),
            Ok(ConsoleInput::Event(EventCommand::Heater))
        );
        assert_eq!(
            parse_input(" Door-Close "),
            Ok(ConsoleInput::Event(EventCommand::DoorClose))
        );
        assert_eq!(parse_input("STATUS"), Ok(ConsoleInput::Status));
        assert_eq!(parse_input("quit"), Ok(ConsoleInput::Quit));
        assert!(parse_input("reboot").is_err());
    }
}
