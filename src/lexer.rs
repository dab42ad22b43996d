//! Lexical analysis of a single command line into shell words.

use thiserror::Error;

/// One shell word after quote and escape processing.
pub type Token = String;

/// Ordered words of one input line. The first one names the command.
pub type ArgumentVector = Vec<Token>;

/// Characters a backslash may escape inside double quotes.
const DOUBLE_QUOTE_SPECIAL: [char; 4] = ['\\', '"', '$', '`'];

/// Characters that never need quoting when a token is written back out.
const BARE_SAFE: [char; 10] = ['-', '_', '.', '/', '=', ':', ',', '+', '@', '%'];

/// The quoting context the scanner is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteMode {
    None,
    Single,
    Double,
}

impl QuoteMode {
    /// The character that closes this mode, if it is a quote at all.
    fn delimiter(self) -> Option<char> {
        match self {
            QuoteMode::None => None,
            QuoteMode::Single => Some('\''),
            QuoteMode::Double => Some('"'),
        }
    }
}

/// Errors that can occur during lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    /// Input ended while a quote opened with the given character was still open.
    #[error("syntax error: unterminated {0} quote")]
    UnterminatedQuote(char),
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    mode: QuoteMode,
    buffer: String,
    // Separate from `buffer.is_empty()` so that `""` still yields a word.
    in_word: bool,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            mode: QuoteMode::None,
            buffer: String::new(),
            in_word: false,
        }
    }

    /// Runs the scanner over the whole line.
    ///
    /// Consumes the machine: a scanner holds its cursor and must never be
    /// reused for a second line.
    fn make_tokens(mut self) -> Result<ArgumentVector, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.mode {
                QuoteMode::None => self.handle_unquoted(ch, &mut out),
                QuoteMode::Single => self.handle_single_quote(ch),
                QuoteMode::Double => self.handle_double_quote(ch),
            }
        }

        if let Some(quote) = self.mode.delimiter() {
            return Err(LexingError::UnterminatedQuote(quote));
        }

        self.finish_word(&mut out);
        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn push(&mut self, ch: char) {
        self.buffer.push(ch);
        self.in_word = true;
    }

    fn finish_word(&mut self, out: &mut ArgumentVector) {
        if self.in_word {
            out.push(std::mem::take(&mut self.buffer));
            self.in_word = false;
        }
    }

    fn handle_unquoted(&mut self, ch: char, out: &mut ArgumentVector) {
        match ch {
            c if c.is_whitespace() => self.finish_word(out),
            '\'' => self.open_quote(QuoteMode::Single),
            '"' => self.open_quote(QuoteMode::Double),
            '\\' => match self.read_char() {
                Some(escaped) => self.push(escaped),
                // Nothing left to escape, keep the backslash itself.
                None => self.push('\\'),
            },
            c => self.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.close_quote('\''),
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.close_quote('"'),
            '\\' => match self.peek_char() {
                Some(next) if DOUBLE_QUOTE_SPECIAL.contains(&next) => {
                    self.read_char();
                    self.buffer.push(next);
                }
                _ => self.buffer.push('\\'),
            },
            c => self.buffer.push(c),
        }
    }

    fn open_quote(&mut self, mode: QuoteMode) {
        self.mode = mode;
        self.in_word = true;
    }

    /// A closing quote directly followed by the same quote is swallowed
    /// together with it and the scanner stays inside the quote.
    fn close_quote(&mut self, quote: char) {
        if self.peek_char() == Some(quote) {
            self.read_char();
        } else {
            self.mode = QuoteMode::None;
        }
    }
}

/// Splits one command line into words.
///
/// Whitespace outside quotes separates words. Single quotes preserve
/// everything literally, double quotes only honor backslash before
/// `\`, `"`, `$` and `` ` ``, and an unquoted backslash escapes any
/// character. Quoted and unquoted segments with no whitespace in between
/// form a single word.
///
/// Returns an empty vector for a blank line, or
/// [`LexingError::UnterminatedQuote`] if the line ends inside a quote. No
/// partial result is returned in that case.
pub fn tokenize(line: &str) -> Result<ArgumentVector, LexingError> {
    LexingFSM::new(line).make_tokens()
}

/// Renders `token` as shell text that [`tokenize`] turns back into exactly
/// that one token.
///
/// Text made only of alphanumerics and a few punctuation characters is
/// returned unchanged. Everything else is wrapped in single quotes.
pub fn quote(token: &str) -> String {
    let bare = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_alphanumeric() || BARE_SAFE.contains(&c));
    if bare {
        return token.to_string();
    }

    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('\'');
    for c in token.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}
