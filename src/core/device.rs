use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::result::OperationError;

/// Opaque handle to an open terminal session, as produced by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceHandle(u64);

impl DeviceHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Card disposition when the terminal is reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EjectMode {
    /// Keep the card where it is
    #[default]
    None,
    /// Eject through the front bezel
    Front,
    /// Capture through the rear
    Rear,
}

impl EjectMode {
    pub fn code(self) -> u8 {
        match self {
            EjectMode::None => 0,
            EjectMode::Front => 1,
            EjectMode::Rear => 2,
        }
    }
}

/// Transmission protocol of a CPU card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApduProtocol {
    T0,
    T1,
}

/// A native call with its already-encoded parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CommClose,
    Reset { eject: EjectMode },
    CardSetting { card_in: u8, enable_back_in: u8 },
    CardPosition { position: u8 },
    MovePosition { position: u8 },
    GetStatus,
    ReadTrack { mode: u8, track: u8 },
    GetErrCode,
    IcCardOpen,
    IcCardClose,
    DetectCard,
    CpuColdReset { mode: u8 },
    CpuWarmReset,
    /// `command.len()` is the length parameter sent with the command
    Apdu {
        protocol: ApduProtocol,
        command: Vec<u8>,
    },
}

impl Operation {
    /// Native function name, used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CommClose => "CommClose",
            Operation::Reset { .. } => "CRT310_Reset",
            Operation::CardSetting { .. } => "CRT310_CardSetting",
            Operation::CardPosition { .. } => "CRT310_CardPosition",
            Operation::MovePosition { .. } => "CRT310_MovePosition",
            Operation::GetStatus => "CRT310_GetStatus",
            Operation::ReadTrack { .. } => "MC_ReadTrack",
            Operation::GetErrCode => "GetErrCode",
            Operation::IcCardOpen => "CRT_IC_CardOpen",
            Operation::IcCardClose => "CRT_IC_CardClose",
            Operation::DetectCard => "CRT_R_DetectCard",
            Operation::CpuColdReset { .. } => "CPU_ColdReset",
            Operation::CpuWarmReset => "CPU_WarmReset",
            Operation::Apdu {
                protocol: ApduProtocol::T0,
                ..
            } => "CPU_T0_C_APDU",
            Operation::Apdu {
                protocol: ApduProtocol::T1,
                ..
            } => "CPU_T1_C_APDU",
        }
    }
}

/// An output parameter filled by the device.
///
/// The buffer may be over-allocated; only `declared_len` bytes are meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutBuffer {
    pub data: Vec<u8>,
    pub declared_len: usize,
}

impl OutBuffer {
    pub fn new(data: Vec<u8>, declared_len: usize) -> Self {
        Self { data, declared_len }
    }

    /// A buffer whose whole content is valid
    pub fn exact(data: Vec<u8>) -> Self {
        let declared_len = data.len();
        Self { data, declared_len }
    }

    /// Single-byte output such as a status or type code
    pub fn byte(value: u8) -> Self {
        Self::exact(vec![value])
    }

    /// The meaningful prefix of the buffer
    pub fn valid(&self) -> &[u8] {
        let len = self.declared_len.min(self.data.len());
        &self.data[..len]
    }
}

/// Raw outcome of a native call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NativeReply {
    pub code: i32,
    pub outputs: Vec<OutBuffer>,
}

impl NativeReply {
    pub fn new(code: i32, outputs: Vec<OutBuffer>) -> Self {
        Self { code, outputs }
    }

    /// Reply of a call that only reports a code
    pub fn status_only(code: i32) -> Self {
        Self {
            code,
            outputs: Vec::new(),
        }
    }

    /// Fail unless the native code signals success
    pub fn ensure_success(self) -> Result<Self, OperationError> {
        if self.code == 0 {
            Ok(self)
        } else {
            Err(OperationError::NativeCode(self.code))
        }
    }

    pub fn output(&self, index: usize) -> Result<&OutBuffer, OperationError> {
        self.outputs
            .get(index)
            .ok_or(OperationError::MissingOutput { index })
    }

    /// First valid byte of a single-byte output
    pub fn output_byte(&self, index: usize) -> Result<u8, OperationError> {
        self.output(index)?
            .valid()
            .first()
            .copied()
            .ok_or(OperationError::MissingOutput { index })
    }
}

/// The native call surface of a card terminal.
///
/// Implementations wrap the vendor library or a serial transport. Exceptional
/// conditions (invalid handle, I/O errors, timeouts) are reported as `Err`;
/// device-level failures as a non-zero `NativeReply::code`.
pub trait DeviceDriver {
    /// Open the port; `Ok(None)` when the library hands back a null handle
    fn open(&mut self, port: &str) -> Result<Option<DeviceHandle>>;

    /// Execute a native call. `handle` is `None` only for `GetErrCode`.
    fn invoke(&mut self, handle: Option<DeviceHandle>, operation: Operation) -> Result<NativeReply>;
}

impl<D: DeviceDriver + ?Sized> DeviceDriver for Box<D> {
    fn open(&mut self, port: &str) -> Result<Option<DeviceHandle>> {
        (**self).open(port)
    }

    fn invoke(&mut self, handle: Option<DeviceHandle>, operation: Operation) -> Result<NativeReply> {
        (**self).invoke(handle, operation)
    }
}
