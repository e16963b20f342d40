use std::io;

use remigrate::Prompt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

/// Asks on stdout, reads answers line by line from stdin.
pub struct StdinPrompt {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Prompt for StdinPrompt {
    async fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(question.as_bytes()).await?;
        stdout.flush().await?;

        let answer = self.lines.next_line().await?;
        if answer.is_none() {
            // keep the next output off the prompt line
            stdout.write_all(b"\n").await?;
        }
        Ok(answer)
    }
}
