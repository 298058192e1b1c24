use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use romi_frame::{DriveCommand, Packet, SensorFeedback, HEADER};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// What a payload turned out to be.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Contents {
    Drive(DriveCommand),
    Feedback(Box<SensorFeedback>),
    Unknown,
}

impl Contents {
    pub fn classify(payload: &[u8]) -> Self {
        if let Some(command) = DriveCommand::from_payload(payload) {
            return Self::Drive(command);
        }
        match SensorFeedback::parse(payload) {
            Ok(feedback) if !payload.is_empty() => Self::Feedback(Box::new(feedback)),
            _ => Self::Unknown,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Drive(_) => "drive",
            Self::Feedback(_) => "feedback",
            Self::Unknown => "unknown",
        }
    }

    fn summary(&self) -> String {
        match self {
            Self::Drive(command) => {
                format!("speed={} radius={}", command.speed, command.radius)
            }
            Self::Feedback(feedback) => format!(
                "t={} enc={}/{} battery={} charger={:?}",
                feedback.timestamp,
                feedback.left_encoder,
                feedback.right_encoder,
                feedback.battery_voltage,
                feedback.charger
            ),
            Self::Unknown => "-".to_string(),
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    frame_size: usize,
    payload_size: usize,
    payload: String,
    checksum: String,
    contents: &'a Contents,
}

pub fn print_packet(packet: &Packet<'_>, format: OutputFormat) {
    let contents = Contents::classify(packet.payload());

    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                frame_size: packet.wire_size(),
                payload_size: packet.payload().len(),
                payload: hex(packet.payload()),
                checksum: format!("{:#04x}", packet.checksum()),
                contents: &contents,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SIZE", "PAYLOAD", "CHECKSUM", "KIND", "DETAIL"])
                .add_row(vec![
                    packet.wire_size().to_string(),
                    hex(packet.payload()),
                    format!("{:#04x}", packet.checksum()),
                    contents.label().to_string(),
                    contents.summary(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "size={} payload=[{}] checksum={:#04x} kind={} {}",
                packet.wire_size(),
                hex(packet.payload()),
                packet.checksum(),
                contents.label(),
                contents.summary()
            );
        }
        OutputFormat::Raw => {
            let mut frame = Vec::with_capacity(packet.wire_size());
            frame.extend_from_slice(&HEADER);
            frame.push(packet.payload().len() as u8);
            frame.extend_from_slice(packet.payload());
            frame.push(packet.checksum());
            print_raw(&frame);
        }
    }
}

#[derive(Serialize)]
pub struct ClockSample {
    pub sample: usize,
    pub raw: u32,
    pub now_ns: u64,
    /// Counter periods elapsed, interrupt-reported or inferred.
    pub wraps: u64,
}

pub fn print_clock_samples(samples: &[ClockSample], format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            for sample in samples {
                println!(
                    "{}",
                    serde_json::to_string(sample).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "RAW", "NOW (ns)", "WRAPS"]);
            for sample in samples {
                table.add_row(vec![
                    sample.sample.to_string(),
                    format!("{:#010x}", sample.raw),
                    sample.now_ns.to_string(),
                    sample.wraps.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for sample in samples {
                println!(
                    "#{} raw={:#010x} now_ns={} wraps={}",
                    sample.sample, sample.raw, sample.now_ns, sample.wraps
                );
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Space-separated uppercase hex, e.g. `AA 55 03`.
pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_space_separated() {
        assert_eq!(hex(&[0xAA, 0x55, 0x03]), "AA 55 03");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn classifies_payloads() {
        let drive = DriveCommand::new(-50, 1).to_payload();
        assert!(matches!(
            Contents::classify(&drive),
            Contents::Drive(DriveCommand { speed: -50, radius: 1 })
        ));
        assert!(matches!(
            Contents::classify(&[0x06, 0x02, 1, 2]),
            Contents::Feedback(_)
        ));
        assert!(matches!(
            Contents::classify(&[0x01, 0x02, 0x03]),
            Contents::Unknown
        ));
        assert!(matches!(Contents::classify(&[]), Contents::Unknown));
    }
}
