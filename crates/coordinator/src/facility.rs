//! Command facilities - where `ProcessCoordinator::listen` gets its commands

use std::io::{BufRead, ErrorKind};

use contracts::CommandRequest;
use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, warn};

/// Source of commands for [`listen`](crate::ProcessCoordinator::listen)
///
/// Delivers one command at a time; `None` signals shutdown.
pub trait CommandFacility {
    fn next_command(&mut self) -> Option<CommandRequest>;
}

/// Message accepted by a [`ChannelCommandFacility`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandMessage {
    Execute(CommandRequest),
    Shutdown,
}

/// Sending half of a command channel
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<CommandMessage>,
}

impl CommandSender {
    /// Queue a command; returns false if the facility is gone
    pub fn execute(&self, request: CommandRequest) -> bool {
        self.tx.send(CommandMessage::Execute(request)).is_ok()
    }

    /// Ask the listener to return
    pub fn shutdown(&self) -> bool {
        self.tx.send(CommandMessage::Shutdown).is_ok()
    }
}

/// Facility fed through an in-process channel
///
/// Stops on an explicit shutdown message or once every sender is dropped.
#[derive(Debug)]
pub struct ChannelCommandFacility {
    rx: Receiver<CommandMessage>,
}

impl ChannelCommandFacility {
    /// Create a connected sender/facility pair
    pub fn channel() -> (CommandSender, Self) {
        let (tx, rx) = channel::unbounded();
        (CommandSender { tx }, Self { rx })
    }
}

impl CommandFacility for ChannelCommandFacility {
    fn next_command(&mut self) -> Option<CommandRequest> {
        match self.rx.recv() {
            Ok(CommandMessage::Execute(request)) => Some(request),
            Ok(CommandMessage::Shutdown) => {
                debug!("command channel received shutdown");
                None
            }
            Err(_) => {
                debug!("all command senders dropped");
                None
            }
        }
    }
}

/// Facility reading one command per line
///
/// Blank lines are skipped; `quit`, `exit` and end of input stop it.
#[derive(Debug)]
pub struct ReaderCommandFacility<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> ReaderCommandFacility<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> CommandFacility for ReaderCommandFacility<R> {
    fn next_command(&mut self) -> Option<CommandRequest> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                // The malformed line has been consumed; keep reading.
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    warn!(error = %e, "skipping command line that is not valid UTF-8");
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read command input");
                    return None;
                }
            }

            let Some(request) = CommandRequest::from_line(&self.line) else {
                continue;
            };
            if request.name.eq_ignore_ascii_case("quit") || request.name.eq_ignore_ascii_case("exit") {
                return None;
            }
            return Some(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_skips_blank_lines_and_stops_on_quit() {
        let input = Cursor::new("configure\n\n  start fast  \nquit\nstop\n");
        let mut facility = ReaderCommandFacility::new(input);

        assert_eq!(facility.next_command(), Some(CommandRequest::new("configure")));
        assert_eq!(
            facility.next_command(),
            Some(CommandRequest::with_args("start", vec!["fast".into()]))
        );
        assert_eq!(facility.next_command(), None);
    }

    #[test]
    fn test_reader_skips_line_with_invalid_utf8() {
        let input = Cursor::new(b"configure\nst\xffart\nstart\nstop\n".to_vec());
        let mut facility = ReaderCommandFacility::new(input);

        assert_eq!(facility.next_command(), Some(CommandRequest::new("configure")));
        assert_eq!(facility.next_command(), Some(CommandRequest::new("start")));
        assert_eq!(facility.next_command(), Some(CommandRequest::new("stop")));
        assert_eq!(facility.next_command(), None);
    }

    #[test]
    fn test_reader_stops_at_end_of_input() {
        let mut facility = ReaderCommandFacility::new(Cursor::new("stop"));
        assert_eq!(facility.next_command(), Some(CommandRequest::new("stop")));
        assert_eq!(facility.next_command(), None);
    }

    #[test]
    fn test_channel_stops_on_shutdown_or_disconnect() {
        let (sender, mut facility) = ChannelCommandFacility::channel();
        assert!(sender.execute(CommandRequest::new("start")));
        assert!(sender.shutdown());
        assert_eq!(facility.next_command(), Some(CommandRequest::new("start")));
        assert_eq!(facility.next_command(), None);

        let (sender, mut facility) = ChannelCommandFacility::channel();
        drop(sender);
        assert_eq!(facility.next_command(), None);
    }
}
