//! Plain stdin/stdout interaction

use lcv_proto::StreamEvent;
use lcv_session::SessionEvent;
use std::io::{self, Write};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Print one session event. Assistant text goes to stdout, failures to stderr.
pub fn render(event: &SessionEvent) {
    match event {
        SessionEvent::Stream {
            event: StreamEvent::Message { text },
        } => {
            print!("{}", text);
            let _ = io::stdout().flush();
        }
        SessionEvent::Stream {
            event: StreamEvent::Done,
        } => println!(),
        SessionEvent::Stream {
            event: StreamEvent::Interrupt(interrupt),
        } => {
            tracing::debug!(thread_id = %interrupt.thread_id, "Interrupt received");
        }
        SessionEvent::Error { message } => eprintln!("Error: {}", message),
        SessionEvent::Status { from, to } => tracing::debug!("{} -> {}", from, to),
    }
}

/// Render events until `task` finishes, then return its result.
///
/// Everything the task published is rendered before returning.
pub async fn follow(
    receiver: &mut broadcast::Receiver<SessionEvent>,
    mut task: JoinHandle<lcv_session::Result<()>>,
) -> anyhow::Result<()> {
    let joined = loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Ok(event) => render(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Display fell behind, {} events not shown", skipped);
                }
                Err(RecvError::Closed) => break (&mut task).await,
            },
            joined = &mut task => break joined,
        }
    };

    while let Ok(event) = receiver.try_recv() {
        render(&event);
    }
    joined??;
    Ok(())
}

/// Parse a yes/no reply
pub fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Ask a yes/no question on the terminal. End of input counts as "no".
pub async fn ask(question: String) -> anyhow::Result<bool> {
    let answer = tokio::task::spawn_blocking(move || -> io::Result<bool> {
        loop {
            print!("\n{} [y/n] ", question);
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                println!();
                return Ok(false);
            }
            if let Some(answer) = parse_answer(&input) {
                return Ok(answer);
            }
            println!("Please answer y or n.");
        }
    })
    .await??;
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n"), Some(true));
        assert_eq!(parse_answer(" YES "), Some(true));
        assert_eq!(parse_answer("n"), Some(false));
        assert_eq!(parse_answer("No\r\n"), Some(false));
        assert_eq!(parse_answer("maybe"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[tokio::test]
    async fn test_follow_returns_task_error() {
        let (tx, mut rx) = broadcast::channel(8);
        let task = tokio::spawn(async move {
            let _ = tx.send(SessionEvent::Error {
                message: "HTTP error! status: 500".into(),
            });
            Err(lcv_session::Error::Transport(lcv_proto::Error::status(
                500,
                "http://localhost/analyse",
            )))
        });
        let err = follow(&mut rx, task).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_follow_drains_after_task() {
        let (tx, mut rx) = broadcast::channel(8);
        let task = tokio::spawn(async move {
            let _ = tx.send(SessionEvent::Stream {
                event: StreamEvent::message("hi"),
            });
            let _ = tx.send(SessionEvent::Stream {
                event: StreamEvent::Done,
            });
            Ok(())
        });
        follow(&mut rx, task).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
