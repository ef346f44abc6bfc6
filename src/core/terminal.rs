use serde::{Deserialize, Serialize};

use crate::core::apdu::{status_word, ApduReply, ApduRequest};
use crate::core::config::TerminalConfig;
use crate::core::device::{
    ApduProtocol, DeviceDriver, DeviceHandle, EjectMode, NativeReply, Operation,
};
use crate::core::result::{DeviceResult, OperationError, StatusResult};
use crate::core::track::{parse_tracks, TrackData};
use crate::core::utils::{describe_payload, describe_status_word, format_printable};

/// Data returned by `comm_open`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenInfo {
    pub handle: DeviceHandle,
}

/// Card position and bezel settings reported by `get_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionStatus {
    pub at_position: u8,
    pub front_setting: u8,
    pub rear_setting: u8,
}

/// Last diagnostic code kept by the device library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCodeInfo {
    pub error_code: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetection {
    pub card_type: u8,
    pub card_info: u8,
}

/// Outcome of a CPU card cold or warm reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetInfo {
    pub cpu_type: u8,
    /// Answer-to-reset bytes rendered as text
    pub ex_data: String,
}

/// Operation surface of a CRT-310 style card terminal.
///
/// Every method returns a `DeviceResult`; nothing here panics or propagates a
/// driver error. Handles are owned by the caller and passed on each call.
pub struct CardTerminal<D: DeviceDriver> {
    driver: D,
    config: TerminalConfig,
}

impl<D: DeviceDriver> CardTerminal<D> {
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, TerminalConfig::default())
    }

    pub fn with_config(driver: D, config: TerminalConfig) -> Self {
        Self { driver, config }
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Open the serial port the terminal is attached to
    pub fn comm_open(&mut self, port: &str) -> DeviceResult<OpenInfo> {
        self.run("CommOpen", |terminal| {
            let handle = terminal
                .driver
                .open(port)
                .map_err(OperationError::Transport)?
                .ok_or(OperationError::NullHandle)?;
            log::info!("Opened card terminal on {}", port);
            Ok(Some(OpenInfo { handle }))
        })
    }

    pub fn comm_close(&mut self, handle: DeviceHandle) -> StatusResult {
        let result = self.command(handle, Operation::CommClose);
        if result.is_success() {
            log::info!("Closed card terminal session {}", handle.as_raw());
        }
        result
    }

    pub fn reset(&mut self, handle: DeviceHandle, eject: EjectMode) -> StatusResult {
        self.command(handle, Operation::Reset { eject })
    }

    /// Configure card acceptance at the front and rear bezels
    pub fn card_setting(&mut self, handle: DeviceHandle, card_in: u8, enable_back_in: u8) -> StatusResult {
        self.command(
            handle,
            Operation::CardSetting {
                card_in,
                enable_back_in,
            },
        )
    }

    pub fn card_position(&mut self, handle: DeviceHandle, position: u8) -> StatusResult {
        self.command(handle, Operation::CardPosition { position })
    }

    pub fn move_position(&mut self, handle: DeviceHandle, position: u8) -> StatusResult {
        self.command(handle, Operation::MovePosition { position })
    }

    pub fn get_status(&mut self, handle: DeviceHandle) -> DeviceResult<PositionStatus> {
        self.run("CRT310_GetStatus", |terminal| {
            let reply = terminal.call(Some(handle), Operation::GetStatus)?;
            Ok(Some(PositionStatus {
                at_position: reply.output_byte(0)?,
                front_setting: reply.output_byte(1)?,
                rear_setting: reply.output_byte(2)?,
            }))
        })
    }

    /// Read magnetic-stripe tracks. `track` selects the tracks as the reader
    /// firmware defines it.
    pub fn read_track(&mut self, handle: DeviceHandle, track: u8) -> DeviceResult<TrackData> {
        let mode = self.config.read_track_mode;
        self.run("MC_ReadTrack", |terminal| {
            let reply = terminal.call(Some(handle), Operation::ReadTrack { mode, track })?;
            let block = reply.output(0)?;
            let tracks = parse_tracks(&block.data, block.declared_len);

            log::debug!("Read {} track(s) with data", tracks.present_count());
            if terminal.config.log_payloads {
                log::debug!("Track data: {:?}", tracks);
            }
            Ok(Some(tracks))
        })
    }

    /// Fetch the diagnostic code of the last failed call
    pub fn get_err_code(&mut self) -> DeviceResult<ErrorCodeInfo> {
        self.run("GetErrCode", |terminal| {
            let reply = terminal.call(None, Operation::GetErrCode)?;
            let raw: [u8; 4] = reply
                .output(0)?
                .valid()
                .get(..4)
                .and_then(|bytes| bytes.try_into().ok())
                .ok_or(OperationError::MissingOutput { index: 0 })?;
            Ok(Some(ErrorCodeInfo {
                error_code: i32::from_le_bytes(raw),
            }))
        })
    }

    pub fn ic_card_open(&mut self, handle: DeviceHandle) -> StatusResult {
        self.command(handle, Operation::IcCardOpen)
    }

    pub fn ic_card_close(&mut self, handle: DeviceHandle) -> StatusResult {
        self.command(handle, Operation::IcCardClose)
    }

    pub fn detect_card(&mut self, handle: DeviceHandle) -> DeviceResult<CardDetection> {
        self.run("CRT_R_DetectCard", |terminal| {
            let reply = terminal.call(Some(handle), Operation::DetectCard)?;
            Ok(Some(CardDetection {
                card_type: reply.output_byte(0)?,
                card_info: reply.output_byte(1)?,
            }))
        })
    }

    pub fn cpu_cold_reset(&mut self, handle: DeviceHandle, mode: u8) -> DeviceResult<ResetInfo> {
        self.reset_cpu(handle, Operation::CpuColdReset { mode })
    }

    pub fn cpu_warm_reset(&mut self, handle: DeviceHandle) -> DeviceResult<ResetInfo> {
        self.reset_cpu(handle, Operation::CpuWarmReset)
    }

    pub fn cpu_t0_apdu(&mut self, handle: DeviceHandle, command_hex: &str) -> DeviceResult<ApduReply> {
        self.exchange_apdu(handle, ApduProtocol::T0, command_hex)
    }

    pub fn cpu_t1_apdu(&mut self, handle: DeviceHandle, command_hex: &str) -> DeviceResult<ApduReply> {
        self.exchange_apdu(handle, ApduProtocol::T1, command_hex)
    }

    /// Send a hex-encoded APDU and return the hex response, status trailer
    /// included. Malformed hex never reaches the device.
    pub fn exchange_apdu(
        &mut self,
        handle: DeviceHandle,
        protocol: ApduProtocol,
        command_hex: &str,
    ) -> DeviceResult<ApduReply> {
        let name = match protocol {
            ApduProtocol::T0 => "CPU_T0_C_APDU",
            ApduProtocol::T1 => "CPU_T1_C_APDU",
        };
        self.run(name, |terminal| {
            let request = ApduRequest::from_hex(command_hex)?;
            let show = terminal.config.log_payloads;
            log::debug!("Transmitting APDU: {}", describe_payload(request.as_bytes(), show));

            let operation = Operation::Apdu {
                protocol,
                command: request.into_bytes(),
            };
            let reply = terminal.call(Some(handle), operation)?;
            let response = ApduReply::from_output(reply.output(0)?);

            if show {
                log::debug!("Received response: {}", response.ex_data);
            }
            if let Some((sw1, sw2)) = status_word(&response.ex_data) {
                log::debug!(
                    "Status: {:02X} {:02X} ({})",
                    sw1,
                    sw2,
                    describe_status_word(sw1, sw2)
                );
            }
            Ok(Some(response))
        })
    }

    fn reset_cpu(&mut self, handle: DeviceHandle, operation: Operation) -> DeviceResult<ResetInfo> {
        self.run(operation.name(), |terminal| {
            let reply = terminal.call(Some(handle), operation)?;
            let cpu_type = reply.output_byte(0)?;
            let atr = reply.output(1)?.valid();
            log::debug!("CPU card type {} answered reset with {} bytes", cpu_type, atr.len());
            if terminal.config.log_payloads {
                log::debug!("Answer to reset: {}", format_printable(atr));
            }
            Ok(Some(ResetInfo {
                cpu_type,
                ex_data: String::from_utf8_lossy(atr).into_owned(),
            }))
        })
    }

    /// Operation that only reports a native code
    fn command(&mut self, handle: DeviceHandle, operation: Operation) -> StatusResult {
        self.run(operation.name(), |terminal| {
            terminal.call(Some(handle), operation)?;
            Ok(None)
        })
    }

    fn call(&mut self, handle: Option<DeviceHandle>, operation: Operation) -> Result<NativeReply, OperationError> {
        log::debug!("Calling {}", operation.name());
        self.driver
            .invoke(handle, operation)
            .map_err(OperationError::Transport)?
            .ensure_success()
    }

    fn run<T, F>(&mut self, name: &'static str, body: F) -> DeviceResult<T>
    where
        F: FnOnce(&mut Self) -> Result<Option<T>, OperationError>,
    {
        let outcome = body(self);
        if let Err(e) = &outcome {
            log::error!("{} failed: {}", name, e);
        }
        DeviceResult::from_outcome(outcome)
    }
}
