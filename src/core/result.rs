use anyhow::Context;
use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::core::hex::HexError;

/// `status` value of a successful operation
pub const STATUS_OK: i32 = 0;

/// `status` value of a failed operation
pub const STATUS_FAILED: i32 = -1;

/// Why an operation did not succeed.
///
/// Never crosses the public operation boundary: it is logged and collapsed
/// into a `DeviceResult` failure.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    InvalidHex(#[from] HexError),

    #[error("Transport failure: {0:#}")]
    Transport(anyhow::Error),

    #[error("Device returned native code {0}")]
    NativeCode(i32),

    #[error("Device reply is missing output #{index}")]
    MissingOutput { index: usize },

    #[error("Device returned a null handle")]
    NullHandle,
}

/// Uniform outcome of every device operation.
///
/// Serializes as `{"status":0,"data":{...}}`, `{"status":0}` or
/// `{"status":-1}`. A failure never carries data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceResult<T> {
    status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

/// Result of an operation that produces no outputs
pub type StatusResult = DeviceResult<()>;

impl<T> DeviceResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: STATUS_OK,
            data: Some(data),
        }
    }

    pub fn success_without_data() -> Self {
        Self {
            status: STATUS_OK,
            data: None,
        }
    }

    pub fn failure() -> Self {
        Self {
            status: STATUS_FAILED,
            data: None,
        }
    }

    /// Collapse an operation outcome. `Ok(None)` is a success without outputs.
    pub fn from_outcome(outcome: Result<Option<T>, OperationError>) -> Self {
        match outcome {
            Ok(Some(data)) => Self::success(data),
            Ok(None) => Self::success_without_data(),
            Err(_) => Self::failure(),
        }
    }

    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> DeviceResult<U> {
        DeviceResult {
            status: self.status,
            data: self.data.map(f),
        }
    }
}

/// Only the shapes `to_json` can produce are accepted back
impl<'de, T: Deserialize<'de>> Deserialize<'de> for DeviceResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields, bound(deserialize = "T: Deserialize<'de>"))]
        struct Raw<T> {
            status: i32,
            #[serde(default)]
            data: Option<T>,
        }

        let raw = Raw::<T>::deserialize(deserializer)?;
        match (raw.status, raw.data) {
            (STATUS_OK, data) => Ok(Self {
                status: STATUS_OK,
                data,
            }),
            (STATUS_FAILED, None) => Ok(Self::failure()),
            (STATUS_FAILED, Some(_)) => Err(de::Error::custom("failed result must not carry data")),
            (status, _) => Err(de::Error::custom(format!(
                "status must be {STATUS_OK} or {STATUS_FAILED}, got {status}"
            ))),
        }
    }
}

impl<T: Serialize> DeviceResult<T> {
    /// JSON form handed to host applications
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).context("Failed to serialize device result")
    }
}

/// Normalize a native return code and the outputs decoded for it.
///
/// `outputs` is `None` for operations that produce nothing. Any non-zero code
/// is a failure and drops the outputs, whatever their content.
pub fn normalize<T>(native_code: i32, outputs: Option<T>) -> DeviceResult<T> {
    let outcome = if native_code == 0 {
        Ok(outputs)
    } else {
        Err(OperationError::NativeCode(native_code))
    };
    DeviceResult::from_outcome(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Detected {
        card_type: u8,
    }

    #[test]
    fn test_normalize_success_with_outputs() {
        let result = normalize(0, Some(Detected { card_type: 3 }));
        assert_eq!(result.status(), STATUS_OK);
        assert_eq!(result.data(), Some(&Detected { card_type: 3 }));
    }

    #[test]
    fn test_normalize_success_without_outputs() {
        let result: StatusResult = normalize(0, None);
        assert!(result.is_success());
        assert!(result.data().is_none());
    }

    #[test]
    fn test_normalize_any_nonzero_code_fails() {
        for code in [-1, 1, 2, 0x30, -9999, i32::MAX, i32::MIN] {
            let result = normalize(code, Some(Detected { card_type: 1 }));
            assert_eq!(result.status(), STATUS_FAILED, "code {code}");
            assert!(result.data().is_none(), "code {code}");
        }
    }

    #[test]
    fn test_from_outcome_errors_fail() {
        let hex_err = OperationError::from(HexError::InvalidHexDigit {
            character: 'Z',
            position: 0,
        });
        assert!(!DeviceResult::<Detected>::from_outcome(Err(hex_err)).is_success());

        let transport = OperationError::Transport(anyhow::anyhow!("port closed"));
        assert_eq!(transport.to_string(), "Transport failure: port closed");
        assert_eq!(
            DeviceResult::<Detected>::from_outcome(Err(transport)).status(),
            STATUS_FAILED
        );

        let missing = OperationError::MissingOutput { index: 1 };
        assert!(DeviceResult::<Detected>::from_outcome(Err(missing))
            .into_data()
            .is_none());
    }

    #[test]
    fn test_json_shape() {
        let ok = DeviceResult::success(Detected { card_type: 2 });
        assert_eq!(ok.to_json().unwrap(), r#"{"status":0,"data":{"cardType":2}}"#);

        let bare: StatusResult = DeviceResult::success_without_data();
        assert_eq!(bare.to_json().unwrap(), r#"{"status":0}"#);

        let failed: DeviceResult<Detected> = DeviceResult::failure();
        assert_eq!(failed.to_json().unwrap(), r#"{"status":-1}"#);
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"{"status":0,"data":{"cardType":7}}"#;
        let parsed: DeviceResult<Detected> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, DeviceResult::success(Detected { card_type: 7 }));

        let failed: DeviceResult<Detected> = serde_json::from_str(r#"{"status":-1}"#).unwrap();
        assert!(!failed.is_success());

        let bare: StatusResult = serde_json::from_str(r#"{"status":0}"#).unwrap();
        assert_eq!(bare, DeviceResult::success_without_data());
    }

    #[test]
    fn test_json_rejects_failure_with_data() {
        let err = serde_json::from_str::<DeviceResult<u8>>(r#"{"status":-1,"data":7}"#).unwrap_err();
        assert!(err.to_string().contains("must not carry data"));
    }

    #[test]
    fn test_json_rejects_unknown_status() {
        for json in [r#"{"status":42}"#, r#"{"status":1,"data":3}"#, r#"{"data":3}"#] {
            assert!(serde_json::from_str::<DeviceResult<u8>>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn test_map_keeps_status() {
        let result = DeviceResult::success(4u8).map(|v| v * 2);
        assert_eq!(result.into_data(), Some(8));

        let failed = DeviceResult::<u8>::failure().map(|v| v * 2);
        assert_eq!(failed.status(), STATUS_FAILED);
    }
}
