// 💬 Console prompts - the operator side of `Disambiguator`
// Generic over reader/writer so the year sync and tests can drive it
// without a terminal.

use std::io::{self, BufRead, Write};

use crate::directory::Person;
use crate::error::ResolveError;
use crate::resolver::{Disambiguator, MatchContext};

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Console::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    /// Print a line for the operator
    pub fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)?;
        self.output.flush()
    }

    /// Show `prompt` and read one line. `None` once input is closed.
    pub fn ask_value(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.say(prompt)?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// List `options` with their indexes and read the chosen index.
    ///
    /// Only checks that the answer is a number; range is the caller's call.
    pub fn ask_choice(&mut self, prompt: &str, options: &[String]) -> Result<usize, ResolveError> {
        for (index, option) in options.iter().enumerate() {
            writeln!(self.output, "  [{}] {}", index, option)?;
        }

        let answer = self
            .ask_value(prompt)?
            .ok_or(ResolveError::InputClosed)?;

        answer
            .parse::<usize>()
            .map_err(|_| ResolveError::MalformedInput(answer))
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

// ============================================================================
// DISAMBIGUATOR
// ============================================================================

/// Asks the person running the extraction
pub struct ConsoleDisambiguator<R, W> {
    console: Console<R, W>,
}

impl<R: BufRead, W: Write> ConsoleDisambiguator<R, W> {
    pub fn new(console: Console<R, W>) -> Self {
        ConsoleDisambiguator { console }
    }
}

impl<R: BufRead, W: Write> Disambiguator for ConsoleDisambiguator<R, W> {
    fn choose_match(
        &mut self,
        context: &MatchContext,
        candidates: &[Person],
    ) -> Result<usize, ResolveError> {
        self.console.say(&format!(
            "Multiple results found in PCO for {}:",
            context
        ))?;
        let options: Vec<String> = candidates.iter().map(|p| p.to_string()).collect();
        self.console
            .ask_choice("Enter index of correct id:", &options)
    }

    fn supply_person_id(&mut self, context: &MatchContext) -> Result<String, ResolveError> {
        let prompt = format!("No results found in PCO for {}. Enter PCO ID:", context);
        let id = self
            .console
            .ask_value(&prompt)?
            .ok_or(ResolveError::InputClosed)?;

        if id.is_empty() {
            return Err(ResolveError::MalformedInput(id));
        }
        Ok(id)
    }
}
