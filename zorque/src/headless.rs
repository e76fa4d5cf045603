//! Headless mode for Zorque.
//!
//! A line-oriented stand-in for the touchscreen, for scripted play and
//! automated testing:
//! - Lines `1` to `4` are choices
//! - Lines starting with `#` are commands (`#quit`, `#help`)
//! - Everything else printed is narration, wrapped to a fixed width

use anyhow::Result;
use std::io::{self, BufRead, Write};
use zorque_core::{
    Choice, ChoiceSource, CompletionClient, DisplayError, DisplaySink, Game, GameConfig,
    InputError,
};

const HELP: &str = "Commands:
  1-4          - Choose an action
  #quit        - Exit the game
  #help        - Show this help";

/// Play over stdin/stdout until `#quit` or end of input.
pub fn run(config: GameConfig, completer: CompletionClient, width: usize) -> Result<()> {
    let mut stdout = io::stdout();
    writeln!(stdout, "=== Zorque Headless Mode ===")?;
    writeln!(
        stdout,
        "Model: {}",
        if completer.is_offline() {
            "offline"
        } else {
            config.model.as_str()
        }
    )?;
    writeln!(stdout)?;
    writeln!(stdout, "{HELP}")?;

    let input = StdinChoices::new(io::stdin().lock(), io::stdout());
    let display = StdoutDisplay::new(io::stdout(), width);
    let mut game = Game::new(config, input, completer, display);
    game.run()?;

    println!("Goodbye!");
    Ok(())
}

/// Reads one choice per line.
///
/// Rejected lines get an `[ERROR]` reply on `out`; end of input and `#quit`
/// interrupt the game.
pub struct StdinChoices<R, W> {
    reader: R,
    out: W,
}

impl<R: BufRead, W: Write> StdinChoices<R, W> {
    pub fn new(reader: R, out: W) -> Self {
        Self { reader, out }
    }
}

impl<R: BufRead, W: Write> ChoiceSource for StdinChoices<R, W> {
    fn next_choice(&mut self) -> Result<Choice, InputError> {
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;

            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(InputError::Interrupted);
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(command) = line.strip_prefix('#') {
                match command.trim() {
                    "quit" | "exit" => return Err(InputError::Interrupted),
                    "help" => writeln!(self.out, "{HELP}")?,
                    other => writeln!(self.out, "[ERROR] Unknown command: #{other}")?,
                }
                continue;
            }

            match line.parse().ok().and_then(Choice::new) {
                Some(choice) => return Ok(choice),
                None => writeln!(self.out, "[ERROR] Enter a choice from 1 to 4")?,
            }
        }
    }
}

/// Prints narration as plain lines.
pub struct StdoutDisplay<W> {
    out: W,
    columns: usize,
}

impl<W: Write> StdoutDisplay<W> {
    pub fn new(out: W, columns: usize) -> Self {
        Self {
            out,
            columns: columns.max(1),
        }
    }
}

impl<W: Write> DisplaySink for StdoutDisplay<W> {
    fn write_line(&mut self, line: &str) -> Result<(), DisplayError> {
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    /// A scrolling log cannot be wiped; mark the break with a blank line.
    fn clear(&mut self) -> Result<(), DisplayError> {
        writeln!(self.out)?;
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), DisplayError> {
        self.out.flush()?;
        Ok(())
    }

    fn columns(&self) -> usize {
        self.columns
    }
}
