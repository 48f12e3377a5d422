use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use ap_app::ViewScope;

use super::CommandError;

/// Line-oriented questions on stdin that give up when the scope is dismissed.
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub async fn ask(&mut self, question: &str, scope: &ViewScope) -> Result<String, CommandError> {
        print!("{question}");
        let _ = std::io::stdout().flush();

        tokio::select! {
            line = self.lines.next_line() => match line {
                Ok(Some(line)) => Ok(line.trim().to_string()),
                Ok(None) => Err(CommandError::Usage("input closed".to_string())),
                Err(err) => Err(CommandError::failed(format!("failed to read input: {err}"), false)),
            },
            _ = scope.dismissed() => Err(CommandError::Interrupted),
        }
    }
}
