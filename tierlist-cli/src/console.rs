use crate::error::Error;
use dialoguer::Password;
use std::io::{self, BufRead, BufReader, IsTerminal, Stdin, Stdout, Write};

/// Line based terminal I/O for the menus.
///
/// Generic over the reader and writer so sessions can be scripted.
pub struct Console<R, W> {
    input: R,
    output: W,
    /// Read passwords without echoing them (only possible on a real terminal)
    hide_secrets: bool,
}

impl Console<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        let hide_secrets = io::stdin().is_terminal();
        Console::new(BufReader::new(io::stdin()), io::stdout(), hide_secrets)
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W, hide_secrets: bool) -> Self {
        Console {
            input,
            output,
            hide_secrets,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn print(&mut self, text: &str) -> Result<(), Error> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Show `prompt` and read one line, without its trailing newline.
    /// Fails with `Error::InputClosed` at end of input.
    pub fn ask(&mut self, prompt: &str) -> Result<String, Error> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            // finish the prompt's line
            writeln!(self.output)?;
            return Err(Error::InputClosed);
        }
        Ok(line.trim_end_matches(|c| c == '\n' || c == '\r').to_string())
    }

    /// `ask`, with surrounding whitespace removed
    pub fn ask_trimmed(&mut self, prompt: &str) -> Result<String, Error> {
        Ok(self.ask(prompt)?.trim().to_string())
    }

    /// Read a password, hiding it when attached to a terminal.
    ///
    /// On a terminal the prompt is drawn by dialoguer on stderr and the password
    /// is read from the terminal directly, bypassing `input`. Anything typed ahead
    /// and already buffered in `input` is read after the password.
    pub fn ask_secret(&mut self, prompt: &str) -> Result<String, Error> {
        if self.hide_secrets {
            // earlier output must land before dialoguer's prompt
            self.output.flush()?;
            Ok(Password::new()
                .with_prompt(prompt.trim_end().trim_end_matches(':'))
                .allow_empty_password(true)
                .interact()?)
        } else {
            self.ask(prompt)
        }
    }

    /// Read a number
    pub fn ask_number<N: std::str::FromStr>(&mut self, prompt: &str) -> Result<N, Error> {
        self.ask_trimmed(prompt)?
            .parse::<N>()
            .map_err(|_| Error::InvalidNumberId)
    }
}
