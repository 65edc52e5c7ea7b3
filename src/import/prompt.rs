use std::io::{BufRead, Stdin, StdinLock, Stdout, Write};

use anyhow::{Context, Result};

/// Yes/no questions put to the user.
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Asks on a terminal-like pair of streams. End of input counts as "no".
pub struct TerminalPrompter<I, O> {
    input: I,
    output: O,
}

impl TerminalPrompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let stdin: Stdin = std::io::stdin();
        Self::new(stdin.lock(), std::io::stdout())
    }
}

impl<I: BufRead, O: Write> TerminalPrompter<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }
}

impl<I: BufRead, O: Write> Prompter for TerminalPrompter<I, O> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        loop {
            write!(self.output, "{} (yes/no) ", question)?;
            self.output.flush().context("flush prompt")?;

            let mut line = String::new();
            let n = self.input.read_line(&mut line).context("read answer")?;
            if n == 0 {
                writeln!(self.output)?;
                return Ok(false);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer yes or no.")?,
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/import/prompt_tests.rs"]
mod tests;
