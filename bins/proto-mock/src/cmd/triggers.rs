use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Publish(usize),
    Quit,
    Unknown,
}

/// Enter publishes one, `N` publishes N, `q` quits.
pub fn parse_command(line: &str) -> Command {
    let input = line.trim();
    if input.is_empty() {
        return Command::Publish(1);
    }
    if input == "q" || input == "quit" {
        return Command::Quit;
    }
    match input.parse::<usize>() {
        Ok(n) if n > 0 => Command::Publish(n),
        _ => Command::Unknown,
    }
}

/// Turn input lines into step triggers. Returns (dropping the sender) on
/// `q`, EOF or once the publisher stops listening.
pub async fn forward<R>(reader: R, triggers: mpsc::Sender<()>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        };

        match parse_command(&line) {
            Command::Publish(n) => {
                for _ in 0..n {
                    if triggers.send(()).await.is_err() {
                        return;
                    }
                }
            }
            Command::Quit => {
                println!("Bye!");
                break;
            }
            Command::Unknown => println!("  unknown command (Enter, N, q)"),
        }
    }
    tracing::debug!("trigger input closed");
}
