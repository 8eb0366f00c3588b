//! OCPI status codes carried in every response envelope.
//!
//! The numeric values are fixed by the OCPI standard and must not
//! change; other implementations match on them.

use serde::{Serialize, Serializer};

/// OCPI envelope status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcpiStatus {
    /// 1000
    GenericSuccess,
    /// 2000
    GenericClientError,
    /// 3000
    GenericServerError,
    /// 3001: we could not use the client's API
    UnableToUseClientsApi,
    /// 3002: no mutually supported version
    UnsupportedVersion,
}

impl OcpiStatus {
    /// Numeric status code
    pub fn code(self) -> u16 {
        match self {
            OcpiStatus::GenericSuccess => 1000,
            OcpiStatus::GenericClientError => 2000,
            OcpiStatus::GenericServerError => 3000,
            OcpiStatus::UnableToUseClientsApi => 3001,
            OcpiStatus::UnsupportedVersion => 3002,
        }
    }

    /// Default status message
    pub fn message(self) -> &'static str {
        match self {
            OcpiStatus::GenericSuccess => "Generic success code",
            OcpiStatus::GenericClientError => "Generic client error",
            OcpiStatus::GenericServerError => "Generic server error",
            OcpiStatus::UnableToUseClientsApi => "Unable to use the client's API.",
            OcpiStatus::UnsupportedVersion => "Unsupported version.",
        }
    }

    /// 1xxx codes
    pub fn is_success(self) -> bool {
        (1000..2000).contains(&self.code())
    }
}

impl Serialize for OcpiStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}
