//! Interactive session input: turns typed lines into studio commands.
//!
//! Lines arrive over a channel (the binary reads stdin on its own thread).
//! Forwarding stops on `:quit`, when input ends, when the studio goes away,
//! or as soon as shutdown is signalled, even with no line pending.

use tokio::sync::{broadcast, mpsc};

use crate::studio::StudioCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Command(StudioCommand),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    InputClosed,
    Shutdown,
    StudioGone,
}

/// `:quit` / `:q`, `:delete <id>`, anything else is a prompt.
pub fn parse_line(line: String) -> SessionInput {
    match line.trim() {
        ":quit" | ":q" => SessionInput::Quit,
        cmd if cmd.starts_with(":delete ") => SessionInput::Command(StudioCommand::Delete {
            id: cmd.trim_start_matches(":delete ").trim().to_string(),
        }),
        _ => SessionInput::Command(StudioCommand::Generate { prompt: line }),
    }
}

pub async fn forward_lines(
    mut lines: mpsc::Receiver<String>,
    commands: &mpsc::Sender<StudioCommand>,
    mut shutdown: broadcast::Receiver<()>,
) -> SessionEnd {
    loop {
        tokio::select! {
            biased;

            _ = shutdown.recv() => {
                tracing::debug!("Session input stopped by shutdown");
                return SessionEnd::Shutdown;
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    return SessionEnd::InputClosed;
                };
                match parse_line(line) {
                    SessionInput::Quit => return SessionEnd::Quit,
                    SessionInput::Command(cmd) => {
                        if commands.send(cmd).await.is_err() {
                            return SessionEnd::StudioGone;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line(":quit".to_string()), SessionInput::Quit);
        assert_eq!(parse_line("  :q ".to_string()), SessionInput::Quit);
        assert_eq!(
            parse_line(":delete  1700000000000 ".to_string()),
            SessionInput::Command(StudioCommand::Delete {
                id: "1700000000000".to_string()
            })
        );
        assert_eq!(
            parse_line("a cat on a skateboard".to_string()),
            SessionInput::Command(StudioCommand::Generate {
                prompt: "a cat on a skateboard".to_string()
            })
        );
    }

    // ========================================================================
    // TEST: shutdown ends forwarding while no line is pending
    // ========================================================================
    #[tokio::test]
    async fn test_shutdown_stops_waiting_for_input() {
        let (_lines_tx, lines_rx) = mpsc::channel::<String>(4);
        let (cmd_tx, _cmd_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let forwarder =
            tokio::spawn(async move { forward_lines(lines_rx, &cmd_tx, shutdown_rx).await });
        tokio::task::yield_now().await;
        shutdown_tx.send(()).unwrap();

        let end = tokio::time::timeout(std::time::Duration::from_secs(5), forwarder)
            .await
            .expect("forwarding kept waiting for input after shutdown")
            .unwrap();
        assert_eq!(end, SessionEnd::Shutdown);
    }

    #[tokio::test]
    async fn test_forwards_until_quit() {
        let (lines_tx, lines_rx) = mpsc::channel(4);
        let (cmd_tx, mut cmd_rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        lines_tx.send("sunrise".to_string()).await.unwrap();
        lines_tx.send(":quit".to_string()).await.unwrap();
        lines_tx.send("never sent".to_string()).await.unwrap();

        let end = forward_lines(lines_rx, &cmd_tx, shutdown_rx).await;
        assert_eq!(end, SessionEnd::Quit);
        assert_eq!(
            cmd_rx.try_recv().unwrap(),
            StudioCommand::Generate {
                prompt: "sunrise".to_string()
            }
        );
        assert!(cmd_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_input_closed_and_studio_gone() {
        let (lines_tx, lines_rx) = mpsc::channel::<String>(4);
        let (cmd_tx, _cmd_rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        drop(lines_tx);
        assert_eq!(
            forward_lines(lines_rx, &cmd_tx, shutdown_rx).await,
            SessionEnd::InputClosed
        );

        let (lines_tx, lines_rx) = mpsc::channel(4);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        drop(cmd_rx);
        lines_tx.send("orphan".to_string()).await.unwrap();
        assert_eq!(
            forward_lines(lines_rx, &cmd_tx, shutdown_rx).await,
            SessionEnd::StudioGone
        );
    }
}
