use std::io::{self, BufRead, Write};

use loan_offers::workflows::notification::is_valid_email;

/// Line-oriented prompt adapter; every `ask_*` helper re-prompts until the answer is usable.
pub(crate) struct ConsoleInput<R, W> {
    input: R,
    output: W,
}

impl ConsoleInput<io::StdinLock<'static>, io::Stdout> {
    pub(crate) fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleInput<R, W> {
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub(crate) fn output(&mut self) -> &mut W {
        &mut self.output
    }

    #[cfg(test)]
    pub(crate) fn into_output(self) -> W {
        self.output
    }

    pub(crate) fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }

    pub(crate) fn ask_line(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            ));
        }
        Ok(line.trim().to_string())
    }

    pub(crate) fn ask_float(&mut self, prompt: &str) -> io::Result<f64> {
        loop {
            match self.ask_line(prompt)?.parse::<f64>() {
                Ok(value) if value.is_finite() => return Ok(value),
                _ => self.say("Please enter a valid number.")?,
            }
        }
    }

    pub(crate) fn ask_int_in(&mut self, prompt: &str, allowed: &[u8]) -> io::Result<u8> {
        loop {
            match self.ask_line(prompt)?.parse::<u8>() {
                Ok(value) if allowed.contains(&value) => return Ok(value),
                Ok(_) => self.say(&format!("Please enter one of {allowed:?}."))?,
                Err(_) => self.say("Please enter an integer.")?,
            }
        }
    }

    pub(crate) fn ask_yes_no(&mut self, prompt: &str) -> io::Result<bool> {
        loop {
            match self.ask_line(prompt)?.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Please answer Y/N.")?,
            }
        }
    }

    pub(crate) fn ask_email(&mut self, prompt: &str) -> io::Result<String> {
        loop {
            let email = self.ask_line(prompt)?;
            if is_valid_email(&email) {
                return Ok(email);
            }
            self.say("Invalid email format. Please try again.")?;
        }
    }
}
