//! Secure input collection.
//!
//! Secrets and shares are read through a [`LineSource`]:
//!
//! 1. **Terminal** — when standard input is a TTY, echo is turned off
//!    (crossterm raw mode) and nothing is printed while the holder types.
//! 2. **Pipe** — otherwise one plain line is read from standard input with
//!    no prompt, so the tool can be scripted.
//!
//! For combine, shares named with `-i` are loaded from disk first and the
//! remainder is topped up interactively until exactly `t` are held.

use std::fs;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use zeroize::Zeroizing;

use crate::error::{Result, SilentError};
use crate::share::{Secret, Share};

/// Capability for reading one line of sensitive input.
pub trait LineSource {
    /// Whether a human is typing (and echo can be suppressed).
    fn is_interactive(&self) -> bool;

    /// Read one line without its terminator. `Ok(None)` on end of input.
    fn read_line(&mut self, echo: bool) -> Result<Option<Zeroizing<String>>>;
}

/// Standard input, with hidden entry when attached to a terminal.
pub struct TerminalSource {
    interactive: bool,
}

impl TerminalSource {
    pub fn new() -> Self {
        Self {
            interactive: std::io::stdin().is_terminal(),
        }
    }
}

impl Default for TerminalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for TerminalSource {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn read_line(&mut self, echo: bool) -> Result<Option<Zeroizing<String>>> {
        if !echo && self.interactive {
            return read_hidden();
        }
        let mut buf = Zeroizing::new(String::new());
        let n = std::io::stdin()
            .lock()
            .read_line(&mut buf)
            .map_err(|e| SilentError::io("read stdin", e))?;
        if n == 0 {
            return Ok(None);
        }
        strip_line_ending(&mut buf);
        Ok(Some(buf))
    }
}

/// Read the secret to split.
pub fn collect_secret(source: &mut impl LineSource) -> Result<Secret> {
    let line = read_sensitive(source, "the secret")?;
    Ok(Secret::from(line))
}

/// Gather exactly `threshold` shares: files first, in order, then prompts.
///
/// The caller has already checked that `files` holds at most `threshold`
/// entries; any extra would be ignored here rather than read.
pub fn collect_shares(
    files: &[PathBuf],
    threshold: u32,
    source: &mut impl LineSource,
) -> Result<Vec<Share>> {
    let threshold = threshold as usize;
    let mut shares = Vec::with_capacity(threshold);

    for path in files.iter().take(threshold) {
        let raw = Zeroizing::new(
            fs::read_to_string(path)
                .map_err(|e| SilentError::io(format!("read share file {}", path.display()), e))?,
        );
        shares.push(Share::new(raw.trim()));
        tracing::info!(path = %path.display(), "loaded share from file");
    }

    let remaining = threshold - shares.len();
    if remaining > 0 {
        tracing::info!(
            "{} share(s) from files, reading {remaining} more from input",
            shares.len()
        );
    }
    while shares.len() < threshold {
        let line = read_sensitive(source, "a share")?;
        shares.push(Share::from(line));
        tracing::debug!(collected = shares.len(), threshold, "share entered");
    }

    Ok(shares)
}

/// Terminal-aware read: hidden on a TTY, plain line otherwise.
fn read_sensitive(source: &mut impl LineSource, what: &'static str) -> Result<Zeroizing<String>> {
    let echo = !source.is_interactive();
    source.read_line(echo)?.ok_or(SilentError::InputClosed(what))
}

fn strip_line_ending(buf: &mut String) {
    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }
}

// ---------------------------------------------------------------------------
// Hidden terminal entry (raw mode, no echo, no prompt)
// ---------------------------------------------------------------------------

fn read_hidden() -> Result<Option<Zeroizing<String>>> {
    let term_err = |e: std::io::Error| SilentError::io("terminal", e);

    crossterm::terminal::enable_raw_mode().map_err(term_err)?;
    let result = read_hidden_raw();
    crossterm::terminal::disable_raw_mode().map_err(term_err)?;

    // Move past the line the holder typed on, like getpass does.
    let mut err = std::io::stderr();
    writeln!(err).and_then(|_| err.flush()).map_err(term_err)?;

    result
}

/// Inner raw-mode loop. Characters are collected but never written back.
fn read_hidden_raw() -> Result<Option<Zeroizing<String>>> {
    use crossterm::event::{self, Event, KeyEventKind};

    let mut typed = Zeroizing::new(String::new());
    loop {
        let ev = event::read().map_err(|e| SilentError::io("read terminal", e))?;
        let Event::Key(key) = ev else { continue };
        // Ignore key-release events (crossterm sends press + release on some platforms).
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match apply_key(&mut typed, key) {
            None => {}
            Some(KeyOutcome::Submit) => return Ok(Some(typed)),
            Some(KeyOutcome::EndOfInput) => return Ok(None),
            Some(KeyOutcome::Interrupt) => {
                return Err(SilentError::io(
                    "read terminal",
                    std::io::Error::from(std::io::ErrorKind::Interrupted),
                ));
            }
        }
    }
}

/// What a key press ended, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    /// Enter: the line is complete.
    Submit,
    /// Ctrl-D on an empty line.
    EndOfInput,
    /// Ctrl-C.
    Interrupt,
}

/// Line editing for hidden entry.
///
/// Only unmodified (or shifted) characters are typed. Ctrl-H erases like
/// Backspace, Ctrl-U and Ctrl-W clear the line. Any other Ctrl or Alt chord
/// is dropped so it can never land in the value as its plain letter.
fn apply_key(typed: &mut Zeroizing<String>, key: KeyEvent) -> Option<KeyOutcome> {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Enter => return Some(KeyOutcome::Submit),
        KeyCode::Backspace => {
            typed.pop();
        }
        KeyCode::Char(c) if control && !alt => match c.to_ascii_lowercase() {
            'c' => return Some(KeyOutcome::Interrupt),
            'd' if typed.is_empty() => return Some(KeyOutcome::EndOfInput),
            'h' => {
                typed.pop();
            }
            'u' | 'w' => typed.clear(),
            'j' | 'm' => return Some(KeyOutcome::Submit),
            _ => {}
        },
        KeyCode::Char(_) if control || alt => {}
        KeyCode::Char(c) => typed.push(c),
        _ => {}
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted input for tests. Records the echo flag of every read.
    pub(crate) struct ScriptedSource {
        pub interactive: bool,
        pub lines: VecDeque<String>,
        pub echo_flags: Vec<bool>,
    }

    impl ScriptedSource {
        pub fn new(interactive: bool, lines: &[&str]) -> Self {
            Self {
                interactive,
                lines: lines.iter().map(|s| s.to_string()).collect(),
                echo_flags: Vec::new(),
            }
        }

        pub fn reads(&self) -> usize {
            self.echo_flags.len()
        }
    }

    impl LineSource for ScriptedSource {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn read_line(&mut self, echo: bool) -> Result<Option<Zeroizing<String>>> {
            self.echo_flags.push(echo);
            Ok(self.lines.pop_front().map(Zeroizing::new))
        }
    }

    #[test]
    fn secret_read_hidden_on_terminal() {
        let mut src = ScriptedSource::new(true, &["hunter2"]);
        let secret = collect_secret(&mut src).unwrap();
        assert_eq!(secret.expose(), "hunter2");
        assert_eq!(src.echo_flags, vec![false]);
    }

    #[test]
    fn secret_read_plain_from_pipe() {
        let mut src = ScriptedSource::new(false, &["hunter2"]);
        collect_secret(&mut src).unwrap();
        assert_eq!(src.echo_flags, vec![true]);
    }

    #[test]
    fn secret_eof_is_input_closed() {
        let mut src = ScriptedSource::new(false, &[]);
        assert!(matches!(
            collect_secret(&mut src),
            Err(SilentError::InputClosed("the secret"))
        ));
    }

    #[test]
    fn shares_top_up_after_files() {
        let dir = tempfile::tempdir().unwrap();
        let f1 = dir.path().join("prefix1");
        fs::write(&f1, "1-aaaa\n").unwrap();

        let mut src = ScriptedSource::new(true, &["2-bbbb", "3-cccc"]);
        let shares = collect_shares(&[f1], 2, &mut src).unwrap();
        let got: Vec<&str> = shares.iter().map(|s| s.expose()).collect();
        assert_eq!(got, vec!["1-aaaa", "2-bbbb"]);
        // only one prompt, and it was hidden
        assert_eq!(src.echo_flags, vec![false]);
    }

    #[test]
    fn shares_no_prompt_when_files_meet_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let f1 = dir.path().join("a");
        let f2 = dir.path().join("b");
        fs::write(&f1, "  1-aaaa  \n").unwrap();
        fs::write(&f2, "2-bbbb").unwrap();

        let mut src = ScriptedSource::new(true, &["unused"]);
        let shares = collect_shares(&[f1, f2], 2, &mut src).unwrap();
        assert_eq!(shares[0].expose(), "1-aaaa");
        assert_eq!(shares[1].expose(), "2-bbbb");
        assert_eq!(src.reads(), 0);
    }

    #[test]
    fn shares_all_interactive() {
        let mut src = ScriptedSource::new(false, &["1-aa", "2-bb", "3-cc"]);
        let shares = collect_shares(&[], 3, &mut src).unwrap();
        assert_eq!(shares.len(), 3);
        assert_eq!(src.echo_flags, vec![true, true, true]);
    }

    #[test]
    fn shares_eof_before_threshold() {
        let mut src = ScriptedSource::new(false, &["1-aa"]);
        assert!(matches!(
            collect_shares(&[], 2, &mut src),
            Err(SilentError::InputClosed("a share"))
        ));
    }

    #[test]
    fn missing_share_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut src = ScriptedSource::new(false, &[]);
        let err = collect_shares(&[dir.path().join("nope")], 1, &mut src).unwrap_err();
        assert!(matches!(err, SilentError::Io { .. }));
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn ch(c: char) -> KeyEvent {
        press(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        press(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Feed keys until one ends the line; returns the outcome and the text.
    fn type_keys(keys: &[KeyEvent]) -> (Option<KeyOutcome>, String) {
        let mut typed = Zeroizing::new(String::new());
        for key in keys {
            if let Some(outcome) = apply_key(&mut typed, *key) {
                return (Some(outcome), typed.to_string());
            }
        }
        (None, typed.to_string())
    }

    #[test]
    fn enter_submits_typed_text() {
        let shift_a = press(KeyCode::Char('A'), KeyModifiers::SHIFT);
        let enter = press(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            type_keys(&[ch('h'), shift_a, ch('1'), enter, ch('x')]),
            (Some(KeyOutcome::Submit), "hA1".to_string())
        );
    }

    #[test]
    fn backspace_and_ctrl_h_erase_one_char() {
        let backspace = press(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(
            type_keys(&[ch('a'), ch('b'), backspace, ch('c'), ch('d'), ctrl('h')]),
            (None, "ac".to_string())
        );
        // nothing to erase is fine
        assert_eq!(type_keys(&[backspace, ctrl('h')]), (None, String::new()));
    }

    #[test]
    fn ctrl_u_and_ctrl_w_clear_the_line() {
        assert_eq!(type_keys(&[ch('a'), ch('b'), ctrl('u'), ch('c')]), (None, "c".to_string()));
        assert_eq!(type_keys(&[ch('a'), ch('b'), ctrl('w'), ch('d')]), (None, "d".to_string()));
    }

    #[test]
    fn control_chords_never_become_letters() {
        let enter = press(KeyCode::Enter, KeyModifiers::NONE);
        let alt_x = press(KeyCode::Char('x'), KeyModifiers::ALT);
        let ctrl_alt_c = press(KeyCode::Char('c'), KeyModifiers::CONTROL | KeyModifiers::ALT);
        let (outcome, text) = type_keys(&[
            ch('a'),
            ch('b'),
            ctrl('h'),
            ch('c'),
            ctrl('a'),
            ctrl('e'),
            alt_x,
            ctrl_alt_c,
            ch('d'),
            enter,
        ]);
        assert_eq!(outcome, Some(KeyOutcome::Submit));
        assert_eq!(text, "acd");
    }

    #[test]
    fn ctrl_d_ends_input_only_on_empty_line() {
        assert_eq!(type_keys(&[ctrl('d')]), (Some(KeyOutcome::EndOfInput), String::new()));
        assert_eq!(type_keys(&[ch('a'), ctrl('d')]), (None, "a".to_string()));
    }

    #[test]
    fn ctrl_c_interrupts() {
        assert_eq!(
            type_keys(&[ch('a'), ctrl('c'), ch('b')]),
            (Some(KeyOutcome::Interrupt), "a".to_string())
        );
    }

    #[test]
    fn line_endings_stripped() {
        let mut s = String::from("abc\r\n");
        strip_line_ending(&mut s);
        assert_eq!(s, "abc");
        let mut s = String::from("abc\n");
        strip_line_ending(&mut s);
        assert_eq!(s, "abc");
        let mut s = String::from("abc");
        strip_line_ending(&mut s);
        assert_eq!(s, "abc");
    }
}
