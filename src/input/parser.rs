/// A command line broken into arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLine {
    pub argv: Vec<String>,
    pub background: bool,
}

impl ParsedLine {
    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    #[cfg(test)]
    fn command(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Splits `line` into arguments.
///
/// Arguments are separated by whitespace. An argument opening with `'`
/// runs to the next `'` and may contain spaces; there are no escapes. A
/// final `&` argument is dropped and marks the line as a background job.
pub fn parse_line(line: &str) -> ParsedLine {
    let mut argv = Vec::new();
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        let (token, remainder) = match rest.strip_prefix('\'') {
            Some(quoted) => match quoted.find('\'') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                // unterminated: the rest of the line is the argument
                None => (quoted, ""),
            },
            None => match rest.find(char::is_whitespace) {
                Some(end) => rest.split_at(end),
                None => (rest, ""),
            },
        };

        argv.push(token.to_string());
        rest = remainder.trim_start();
    }

    let background = argv.last().is_some_and(|last| last == "&");
    if background {
        argv.pop();
    }

    ParsedLine { argv, background }
}
