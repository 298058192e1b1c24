use romi_frame::{
    read_packet, DriveCommand, FrameError, PacketWriter, ReaderConfig, SensorFeedback,
    HEADER_SIZE, MAX_FRAME_SIZE,
};
use romi_transport::ByteTransport;
use tracing::{debug, info};

/// A command-and-feedback link to the Romi base controller.
///
/// Drive commands go out as framed base-control payloads; feedback packets are
/// read back and folded into the latest [`SensorFeedback`], so fields a packet
/// does not report keep their previous value.
pub struct Robot<T> {
    writer: PacketWriter<T>,
    config: ReaderConfig,
    feedback: SensorFeedback,
}

impl<T: ByteTransport> Robot<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ReaderConfig::default())
    }

    pub fn with_config(transport: T, config: ReaderConfig) -> Self {
        Self {
            writer: PacketWriter::new(transport),
            config,
            feedback: SensorFeedback::default(),
        }
    }

    /// Bring the base to a known state by commanding it to stop.
    pub fn init(&mut self) -> Result<(), FrameError> {
        self.writer.send_drive(DriveCommand::stop())?;
        info!("robot link initialized");
        Ok(())
    }

    /// Drive each wheel at the given speed in mm/s.
    ///
    /// The base only accepts speed and radius, so the pair is approximated.
    pub fn drive_direct(&mut self, left: i16, right: i16) -> Result<DriveCommand, FrameError> {
        let command = DriveCommand::from_wheel_speeds(left, right);
        debug!(left, right, speed = command.speed, radius = command.radius, "drive direct");
        self.drive(command)?;
        Ok(command)
    }

    pub fn drive(&mut self, command: DriveCommand) -> Result<(), FrameError> {
        self.writer.send_drive(command)
    }

    /// Read one feedback packet and apply it to the latest sensor state.
    pub fn poll_sensors(&mut self) -> Result<&SensorFeedback, FrameError> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let n = read_packet(self.writer.get_mut(), &mut buf, &self.config)?;
        self.feedback.update(&buf[HEADER_SIZE..n - 1])?;
        Ok(&self.feedback)
    }

    /// Sensor state as of the last successful poll.
    pub fn feedback(&self) -> &SensorFeedback {
        &self.feedback
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &T {
        self.writer.get_ref()
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.writer.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.writer.into_inner()
    }
}

impl<T> std::fmt::Debug for Robot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Robot")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Write};
    use std::time::Duration;

    use romi_frame::{checksum, decode_packet};
    use romi_transport::IoTransport;

    use super::*;

    /// Reads from a canned byte stream, records everything written.
    struct Duplex {
        incoming: Cursor<Vec<u8>>,
        outgoing: Vec<u8>,
    }

    impl Duplex {
        fn new(incoming: Vec<u8>) -> IoTransport<Self> {
            IoTransport::new(Self {
                incoming: Cursor::new(incoming),
                outgoing: Vec::new(),
            })
        }
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.incoming.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.outgoing.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0xAA, 0x55, payload.len() as u8];
        out.extend_from_slice(payload);
        out.push(checksum(&out[2..]));
        out
    }

    fn quick() -> ReaderConfig {
        ReaderConfig {
            read_timeout: Duration::from_millis(20),
            ..ReaderConfig::default()
        }
    }

    #[test]
    fn init_sends_stop() {
        let mut robot = Robot::new(Duplex::new(Vec::new()));
        robot.init().unwrap();

        let wire = &robot.get_ref().get_ref().outgoing;
        let packet = decode_packet(wire).unwrap();
        assert_eq!(
            DriveCommand::from_payload(packet.payload()),
            Some(DriveCommand::stop())
        );
    }

    #[test]
    fn drive_direct_sends_approximated_command() {
        let mut robot = Robot::new(Duplex::new(Vec::new()));
        let sent = robot.drive_direct(100, 200).unwrap();
        assert_eq!(sent, DriveCommand::new(200, 185));

        let wire = robot.into_inner().into_inner().outgoing;
        assert_eq!(
            wire,
            vec![0xAA, 0x55, 0x06, 0x01, 0x04, 0xC8, 0x00, 0xB9, 0x00, 0x72]
        );
    }

    #[test]
    fn poll_sensors_accumulates_feedback() {
        let current = [0x06, 0x02, 12, 34];
        let docking = [0x03, 0x03, 1, 2, 3];
        let mut wire = frame(&current);
        // Noise between frames is resynchronized away.
        wire.extend_from_slice(&[0x00, 0xAA, 0x13]);
        wire.extend(frame(&docking));

        let mut robot = Robot::with_config(Duplex::new(wire), quick());

        let first = robot.poll_sensors().unwrap();
        assert_eq!((first.left_current, first.right_current), (12, 34));

        let second = robot.poll_sensors().unwrap().clone();
        assert_eq!(second.docking.left, 3);
        assert_eq!(second.left_current, 12);
        assert_eq!(robot.feedback(), &second);
    }

    #[test]
    fn poll_sensors_reports_closed_link() {
        let mut robot = Robot::with_config(Duplex::new(vec![0xAA, 0x55]), quick());
        assert!(matches!(
            robot.poll_sensors(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn malformed_feedback_is_an_error() {
        let mut robot = Robot::with_config(Duplex::new(frame(&[0x01, 0x02, 0x00])), quick());
        assert!(matches!(
            robot.poll_sensors(),
            Err(FrameError::MalformedFeedback { id: 0x01, .. })
        ));
    }
}
