use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::{event::LogEvent, Layout};
use crate::error::{ForwarderError, Result};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Date,
    Level,
    Logger,
    Thread,
    Message,
    Module,
    File,
    Line,
    Newline,
}

/// `%d` 的输出格式, UTC 时间
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 模式布局, 例如 `%d %level [%thread] %logger - %msg%n`
#[derive(Debug, Clone)]
pub struct PatternLayout {
    tokens: Vec<Token>,
}

impl PatternLayout {
    pub const DEFAULT_PATTERN: &'static str = "%d %level [%thread] %logger - %msg";

    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            tokens: parse_pattern(pattern)?,
        })
    }
}

fn conversion(word: &str) -> Option<Token> {
    let token = match word {
        "d" | "date" => Token::Date,
        "p" | "le" | "level" => Token::Level,
        "c" | "lo" | "logger" => Token::Logger,
        "t" | "thread" => Token::Thread,
        "m" | "msg" | "message" => Token::Message,
        "M" | "module" => Token::Module,
        "F" | "file" => Token::File,
        "L" | "line" => Token::Line,
        "n" => Token::Newline,
        _ => return None,
    };
    Some(token)
}

fn parse_pattern(pattern: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            literal.push('%');
            continue;
        }

        let mut word = String::new();
        while let Some(&next) = chars.peek() {
            if !next.is_ascii_alphabetic() {
                break;
            }
            word.push(next);
            chars.next();
        }

        let token = conversion(&word).ok_or_else(|| {
            ForwarderError::Config(format!("Unknown conversion word '%{}' in pattern", word))
        })?;
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(token);
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

impl Layout for PatternLayout {
    fn render(&self, event: &LogEvent) -> Result<String> {
        let mut out = String::with_capacity(event.message.len() + 64);
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Date => {
                    let date = DateTime::<Utc>::from(event.timestamp);
                    let _ = write!(out, "{}", date.format(DATE_FORMAT));
                }
                Token::Level => out.push_str(event.level.as_str()),
                Token::Logger => out.push_str(&event.target),
                Token::Thread => out.push_str(event.thread.as_deref().unwrap_or("unnamed")),
                Token::Message => out.push_str(&event.message),
                Token::Module => out.push_str(event.module_path.as_deref().unwrap_or("?")),
                Token::File => out.push_str(event.file.as_deref().unwrap_or("?")),
                Token::Line => match event.line {
                    Some(line) => {
                        let _ = write!(out, "{}", line);
                    }
                    None => out.push('?'),
                },
                Token::Newline => out.push('\n'),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_pattern_render() {
        let layout = PatternLayout::new("%d %level [%thread] %logger - %msg (%file:%line) 100%%%n").unwrap();
        let mut event = LogEvent::new(Level::Debug, "app::cache", "evicted 3 keys");
        event.thread = Some("main".to_string());
        event.timestamp = UNIX_EPOCH + Duration::from_millis(5);

        let rendered = layout.render(&event).unwrap();
        assert_eq!(
            rendered,
            "1970-01-01 00:00:00.005 DEBUG [main] app::cache - evicted 3 keys (?:?) 100%\n"
        );
    }

    #[test]
    fn test_date_conversion() {
        let mut event = LogEvent::default();
        event.timestamp = UNIX_EPOCH + Duration::from_millis(1_480_464_000_123);

        let rendered = PatternLayout::new("%d").unwrap().render(&event).unwrap();
        assert_eq!(rendered, "2016-11-30 00:00:00.123");
        let rendered = PatternLayout::new("[%date]").unwrap().render(&event).unwrap();
        assert_eq!(rendered, "[2016-11-30 00:00:00.123]");
    }

    #[test]
    fn test_unknown_conversion_word() {
        match PatternLayout::new("%msg %bogus") {
            Err(ForwarderError::Config(msg)) => assert!(msg.contains("%bogus")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_default_pattern_parses() {
        assert!(PatternLayout::new(PatternLayout::DEFAULT_PATTERN).is_ok());
    }
}
