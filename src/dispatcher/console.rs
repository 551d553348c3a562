use std::io::{BufRead, Write};

use crate::error::Result;

/// Operator-facing line I/O. End of input reads as `None`.
pub struct Console<R, W> {
    input: R,
    pub out: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Blocks until the operator presses Enter; `false` when input closed.
    pub fn acknowledge(&mut self) -> Result<bool> {
        Ok(self.prompt("Press Enter to return to the menu...")?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_strips_line_endings() {
        let mut console = Console::new(Cursor::new("3\r\nnext\n"), Vec::new());
        assert_eq!(console.prompt("> ").unwrap(), Some("3".to_string()));
        assert_eq!(console.prompt("> ").unwrap(), Some("next".to_string()));
        assert_eq!(console.prompt("> ").unwrap(), None);
        assert_eq!(String::from_utf8(console.out).unwrap(), "> > > \n");
    }

    #[test]
    fn test_acknowledge_on_closed_input() {
        let mut console = Console::new(Cursor::new(""), Vec::new());
        assert!(!console.acknowledge().unwrap());
    }
}
