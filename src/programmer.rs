//! Programmer Relay
//!
//! Under the programmer personality the dongle forwards command frames
//! from a bulk OUT endpoint to an in-system-programmer protocol and sends
//! its replies back on bulk IN. The protocol itself lives behind
//! [`ProgrammerProtocol`]; this module only does the relaying.

use heapless::Vec;

use crate::bridge::SendError;
use crate::config::PROGRAMMER_PACKET_SIZE;

/// Largest command or response frame carried in one packet
pub const FRAME_SIZE: usize = PROGRAMMER_PACKET_SIZE as usize;

/// One command or response frame
pub type Frame = Vec<u8, FRAME_SIZE>;

/// Consumer of programmer command frames
pub trait ProgrammerProtocol {
    /// Called once before the first command
    fn init(&mut self) {}

    /// Called on every poll while the host is connected
    fn update_params(&mut self) {}

    /// Handle `command`, leaving any reply in `response`
    fn process_command(&mut self, command: &[u8], response: &mut Frame);
}

/// Bulk endpoint pair used by the relay
pub trait CommandLink {
    /// Check if the host has configured the device
    fn is_configured(&self) -> bool;

    /// Move a received command frame into `frame`; `false` if none arrived
    fn receive_command(&mut self, frame: &mut Frame) -> bool;

    /// Queue a response frame on the IN endpoint
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] when the endpoint cannot take the frame yet.
    fn send_response(&mut self, response: &[u8]) -> Result<(), SendError>;
}

/// Result of one relay poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayStatus {
    /// The host has not configured the device
    Unconfigured,
    /// Nothing to do
    Idle,
    /// A response is still waiting for the IN endpoint
    Busy,
    /// A command was handed to the protocol
    Processed,
}

/// Pumps frames between a [`CommandLink`] and a [`ProgrammerProtocol`]
pub struct ProgrammerRelay<P> {
    protocol: P,
    command: Frame,
    pending: Frame,
}

impl<P: ProgrammerProtocol> ProgrammerRelay<P> {
    /// Initialize `protocol` and wrap it
    pub fn new(mut protocol: P) -> Self {
        protocol.init();
        Self {
            protocol,
            command: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Access the wrapped protocol
    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Service the link once
    pub fn poll<L: CommandLink>(&mut self, link: &mut L) -> RelayStatus {
        if !link.is_configured() {
            return RelayStatus::Unconfigured;
        }

        self.protocol.update_params();

        if !self.flush(link) {
            return RelayStatus::Busy;
        }

        self.command.clear();
        if !link.receive_command(&mut self.command) {
            return RelayStatus::Idle;
        }

        self.protocol.process_command(&self.command, &mut self.pending);
        self.flush(link);
        RelayStatus::Processed
    }

    /// Try to send the pending response; `true` once nothing is pending
    fn flush<L: CommandLink>(&mut self, link: &mut L) -> bool {
        if self.pending.is_empty() {
            return true;
        }
        if link.send_response(&self.pending).is_err() {
            return false;
        }
        self.pending.clear();
        true
    }
}

/// Protocol that drops every command
///
/// Stands in for the real programmer protocol, whose command set is owned
/// elsewhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardCommands {
    dropped: u32,
}

impl DiscardCommands {
    /// Create the placeholder protocol
    #[must_use]
    pub const fn new() -> Self {
        Self { dropped: 0 }
    }

    /// Commands received so far
    #[must_use]
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl ProgrammerProtocol for DiscardCommands {
    fn process_command(&mut self, command: &[u8], _response: &mut Frame) {
        self.dropped = self.dropped.wrapping_add(1);
        #[cfg(feature = "embedded")]
        defmt::warn!("programmer: no protocol, dropped {} byte command", command.len());
        #[cfg(not(feature = "embedded"))]
        let _ = command;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replies with the command reversed
    struct Reverse {
        initialized: bool,
        updates: u32,
    }

    impl ProgrammerProtocol for Reverse {
        fn init(&mut self) {
            self.initialized = true;
        }

        fn update_params(&mut self) {
            self.updates += 1;
        }

        fn process_command(&mut self, command: &[u8], response: &mut Frame) {
            for &byte in command.iter().rev() {
                let _ = response.push(byte);
            }
        }
    }

    #[derive(Default)]
    struct MockLink {
        configured: bool,
        incoming: Option<Frame>,
        in_busy: bool,
        sent: std::vec::Vec<std::vec::Vec<u8>>,
    }

    impl CommandLink for MockLink {
        fn is_configured(&self) -> bool {
            self.configured
        }

        fn receive_command(&mut self, frame: &mut Frame) -> bool {
            match self.incoming.take() {
                Some(data) => {
                    *frame = data;
                    true
                }
                None => false,
            }
        }

        fn send_response(&mut self, response: &[u8]) -> Result<(), SendError> {
            if self.in_busy {
                return Err(SendError::NotReady);
            }
            self.sent.push(response.to_vec());
            Ok(())
        }
    }

    fn frame(bytes: &[u8]) -> Frame {
        Frame::from_slice(bytes).unwrap()
    }

    #[test]
    fn new_initializes_protocol() {
        let relay = ProgrammerRelay::new(Reverse {
            initialized: false,
            updates: 0,
        });
        assert!(relay.protocol().initialized);
    }

    #[test]
    fn unconfigured_does_nothing() {
        let mut relay = ProgrammerRelay::new(Reverse {
            initialized: false,
            updates: 0,
        });
        let mut link = MockLink {
            incoming: Some(frame(&[1, 2, 3])),
            ..MockLink::default()
        };

        assert_eq!(relay.poll(&mut link), RelayStatus::Unconfigured);
        assert!(link.incoming.is_some());
        assert_eq!(relay.protocol().updates, 0);
    }

    #[test]
    fn command_round_trip() {
        let mut relay = ProgrammerRelay::new(Reverse {
            initialized: false,
            updates: 0,
        });
        let mut link = MockLink {
            configured: true,
            incoming: Some(frame(&[1, 2, 3])),
            ..MockLink::default()
        };

        assert_eq!(relay.poll(&mut link), RelayStatus::Processed);
        assert_eq!(link.sent, vec![vec![3, 2, 1]]);
        assert_eq!(relay.poll(&mut link), RelayStatus::Idle);
    }

    #[test]
    fn busy_endpoint_holds_response() {
        let mut relay = ProgrammerRelay::new(Reverse {
            initialized: false,
            updates: 0,
        });
        let mut link = MockLink {
            configured: true,
            incoming: Some(frame(&[7, 8])),
            in_busy: true,
            ..MockLink::default()
        };

        assert_eq!(relay.poll(&mut link), RelayStatus::Processed);
        assert!(link.sent.is_empty());

        // A new command must wait until the old reply is out
        link.incoming = Some(frame(&[9]));
        assert_eq!(relay.poll(&mut link), RelayStatus::Busy);
        assert!(link.incoming.is_some());

        link.in_busy = false;
        assert_eq!(relay.poll(&mut link), RelayStatus::Processed);
        assert_eq!(link.sent, vec![vec![8, 7], vec![9]]);
    }

    #[test]
    fn discard_counts_commands() {
        let mut relay = ProgrammerRelay::new(DiscardCommands::new());
        let mut link = MockLink {
            configured: true,
            incoming: Some(frame(&[0x01])),
            ..MockLink::default()
        };

        assert_eq!(relay.poll(&mut link), RelayStatus::Processed);
        assert_eq!(relay.protocol().dropped(), 1);
        assert!(link.sent.is_empty());
    }
}
