//! Command classification and response rendering.
//!
//! Classification is a pure function of the trimmed line. Rendering only
//! consults the clock for `/time`, and the caller supplies that clock.

use chrono::{DateTime, Utc};

/// Sent to the peer when the inactivity timer fires.
pub const INACTIVITY_NOTICE: &str = "Disconnected: Inactivity timeout";

const ECHO_PREFIX: &str = "/echo ";

/// The classified meaning of one inbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Blank line.
    Empty,
    Hello,
    Bye,
    Quit,
    Time,
    /// `/echo <rest>`; holds `<rest>`.
    Echo(&'a str),
    /// Anything unrecognised; echoed back verbatim.
    Other(&'a str),
}

/// What to send back and whether the session ends after sending it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub ends_session: bool,
}

impl Reply {
    fn keep(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ends_session: false,
        }
    }

    fn close(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ends_session: true,
        }
    }

    /// The reply as written to the socket, newline-terminated.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.text.len() + 1);
        out.extend_from_slice(self.text.as_bytes());
        out.push(b'\n');
        out
    }
}

impl<'a> Command<'a> {
    /// Classify a trimmed line. First match wins; matching is case-sensitive.
    pub fn parse(line: &'a str) -> Self {
        match line {
            "" => Command::Empty,
            "hello" => Command::Hello,
            "bye" => Command::Bye,
            "/quit" => Command::Quit,
            "/time" => Command::Time,
            _ => match line.strip_prefix(ECHO_PREFIX) {
                Some(rest) => Command::Echo(rest),
                None => Command::Other(line),
            },
        }
    }

    /// Render the response for this command.
    pub fn respond(&self, now: DateTime<Utc>) -> Reply {
        match self {
            Command::Empty => Reply::keep("Say something. . ."),
            Command::Hello => Reply::keep("Hi there!"),
            Command::Bye => Reply::close("Goodbye!"),
            Command::Quit => Reply::close("Connection closed."),
            Command::Time => Reply::keep(format_rfc1123(now)),
            Command::Echo(rest) => Reply::keep(*rest),
            Command::Other(line) => Reply::keep(*line),
        }
    }
}

/// Classify and render in one step.
pub fn dispatch(line: &str, now: DateTime<Utc>) -> Reply {
    Command::parse(line).respond(now)
}

/// RFC 1123 date as used by HTTP, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_rfc1123(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap()
    }

    #[test]
    fn classify_fixed_commands() {
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("hello"), Command::Hello);
        assert_eq!(Command::parse("bye"), Command::Bye);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/time"), Command::Time);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(Command::parse("Hello"), Command::Other("Hello"));
        assert_eq!(Command::parse("BYE"), Command::Other("BYE"));
    }

    #[test]
    fn echo_prefix() {
        assert_eq!(Command::parse("/echo test 123"), Command::Echo("test 123"));
        assert_eq!(Command::parse("/echo "), Command::Echo(""));
        // No trailing space after trimming, so not the echo command.
        assert_eq!(Command::parse("/echo"), Command::Other("/echo"));
        assert_eq!(Command::parse("/echoes"), Command::Other("/echoes"));
    }

    #[test]
    fn responses_and_termination() {
        let now = fixed_now();
        assert_eq!(dispatch("", now), Reply::keep("Say something. . ."));
        assert_eq!(dispatch("hello", now), Reply::keep("Hi there!"));
        assert_eq!(dispatch("bye", now), Reply::close("Goodbye!"));
        assert_eq!(dispatch("/quit", now), Reply::close("Connection closed."));
        assert_eq!(dispatch("/echo test 123", now), Reply::keep("test 123"));
        assert_eq!(dispatch("anything else", now), Reply::keep("anything else"));
    }

    #[test]
    fn time_uses_rfc1123() {
        let reply = dispatch("/time", fixed_now());
        assert_eq!(reply.text, "Sun, 06 Nov 1994 08:49:37 GMT");
        assert!(!reply.ends_session);
    }

    #[test]
    fn dispatch_is_pure() {
        let now = fixed_now();
        for line in ["", "hello", "bye", "/quit", "/time", "/echo x", "zzz"] {
            let first = dispatch(line, now);
            for _ in 0..3 {
                assert_eq!(dispatch(line, now), first);
            }
        }
    }

    #[test]
    fn wire_form_is_newline_terminated() {
        assert_eq!(dispatch("hello", fixed_now()).to_wire(), b"Hi there!\n");
    }
}
