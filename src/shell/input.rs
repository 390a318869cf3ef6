use crate::deck::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Navigate(Direction),
    Retry,
    Quit,
}

impl Command {
    /// Map a key name or typed word to a command. Arrow keys arrive either as
    /// names (`ArrowRight`) or raw escape sequences from a terminal.
    pub fn parse(input: &str) -> Option<Self> {
        let key = input.trim_matches(|c: char| c == '\r' || c == '\n' || c == ' ');
        match key {
            "\u{1b}[C" => return Some(Command::Navigate(Direction::Next)),
            "\u{1b}[D" => return Some(Command::Navigate(Direction::Prev)),
            _ => {}
        }

        match key.to_ascii_lowercase().as_str() {
            "arrowright" | "right" | "n" | "next" => Some(Command::Navigate(Direction::Next)),
            "arrowleft" | "left" | "p" | "prev" | "previous" => {
                Some(Command::Navigate(Direction::Prev))
            }
            "r" | "retry" => Some(Command::Retry),
            "q" | "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}
