//! Legacy self-addressed message intake.
//!
//! Older clients smuggle commands in messages a player sends to themself.
//! The transport container (`inbox.dat`) holds a sequence of records:
//! `from:u16 to:u16 len:u16` (little-endian) followed by `len` payload
//! bytes. Payload text travels with every byte shifted up by a fixed offset
//! and is NUL-terminated; line breaks travel as carriage returns.
//!
//! Only records with `from == to` are scanned. They accept the regular
//! command grammar plus the `OBJECT: Planet <n>` build alias some clients
//! emit; everything else in such a message is ordinary text and is ignored.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::game::commands::{Command, Parsed, apply_parsed, parse_line, parse_planet_id};
use crate::game::report::Reports;
use crate::game::state::{NUM_PLAYERS, State};

/// Name of the message container inside the game directory.
pub const INBOX_FILE_NAME: &str = "inbox.dat";

/// Fixed offset added to every payload byte by the transport.
const TEXT_SHIFT: u8 = 13;

/// Decode transport text: undo the byte shift, stop at the NUL terminator,
/// and translate carriage returns to newlines.
#[must_use]
pub fn decode_text(raw: &[u8]) -> String {
    let mut text = String::new();
    for &byte in raw {
        if byte == 0 {
            break;
        }
        let shifted = byte.wrapping_sub(TEXT_SHIFT);
        if shifted == b'\r' {
            text.push('\n');
        } else {
            text.push(char::from(shifted));
        }
    }
    text
}

/// Encode text the way the transport stores it. Used by tests and tools.
#[must_use]
pub fn encode_text(text: &str) -> Vec<u8> {
    text.bytes()
        .map(|byte| {
            let byte = if byte == b'\n' { b'\r' } else { byte };
            byte.wrapping_add(TEXT_SHIFT)
        })
        .collect()
}

/// Interpret one line of a self-addressed message.
#[must_use]
pub fn parse_message_line(line: &str) -> Parsed {
    let text = line.trim();
    if let Some(rest) = strip_prefix_ci(text, "object:") {
        if let Some(id_part) = strip_prefix_ci(rest.trim(), "planet") {
            return match parse_planet_id(id_part) {
                Some(planet) => Parsed::Command(Command::Build(planet)),
                None => Parsed::Malformed,
            };
        }
        return Parsed::Foreign;
    }
    parse_line(text)
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let (head, tail) = text.split_at_checked(prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then_some(tail)
}

/// One message from the inbox container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxMessage {
    /// Sender slot as stored in the container.
    pub from: u16,
    /// Receiver slot as stored in the container.
    pub to: u16,
    /// Decoded message text.
    pub text: String,
}

/// Forward-only reader over the inbox container.
#[derive(Debug)]
pub struct InboxReader<R> {
    source: R,
}

impl InboxReader<BufReader<File>> {
    /// Open the inbox in the game directory.
    ///
    /// Returns `Ok(None)` if there is no inbox (nothing to scan).
    ///
    /// # Errors
    ///
    /// Propagates any other failure to open the file.
    pub fn open(dir: &Path) -> io::Result<Option<Self>> {
        match File::open(dir.join(INBOX_FILE_NAME)) {
            Ok(file) => Ok(Some(Self::new(BufReader::new(file)))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl<R: Read> InboxReader<R> {
    /// Read messages from any byte source.
    pub fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R: Read> Iterator for InboxReader<R> {
    type Item = io::Result<InboxMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut header = [0u8; 6];
        match read_or_end(&mut self.source, &mut header) {
            Ok(false) => return None,
            Ok(true) => {}
            Err(err) => return Some(Err(err)),
        }
        let from = u16::from_le_bytes([header[0], header[1]]);
        let to = u16::from_le_bytes([header[2], header[3]]);
        let len = usize::from(u16::from_le_bytes([header[4], header[5]]));
        let mut payload = vec![0u8; len];
        if let Err(err) = self.source.read_exact(&mut payload) {
            return Some(Err(err));
        }
        Some(Ok(InboxMessage {
            from,
            to,
            text: decode_text(&payload),
        }))
    }
}

/// Fill `buf` completely, or report a clean end of the stream before the
/// first byte.
fn read_or_end<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => return Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(true)
}

/// Scan self-addressed messages for embedded commands.
///
/// # Errors
///
/// Propagates I/O errors from the container; malformed command lines are
/// handled per player and never abort the pass.
pub fn process_inbox<R: Read>(
    state: &mut State,
    reports: &mut Reports,
    reader: InboxReader<R>,
) -> io::Result<()> {
    log::info!("    Checking messages...");
    for message in reader {
        let message = message?;
        if message.from != message.to {
            continue;
        }
        let Ok(player) = u8::try_from(message.from) else {
            continue;
        };
        if player == 0 || usize::from(player) > NUM_PLAYERS {
            continue;
        }
        for line in message.text.lines() {
            match parse_message_line(line) {
                // Ordinary message text; not for us.
                Parsed::Foreign => {}
                parsed => apply_parsed(state, reports, player, parsed, line),
            }
        }
    }
    Ok(())
}
