use serde::{Deserialize, Serialize};

use crate::error::QueueError;
use crate::task::TaskId;

/// Transport form of a task handed to an executor.
///
/// Carries the MessagePack-encoded program and the task id the outcome must
/// be correlated with. Priority, timestamps and queue bookkeeping stay local.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTask {
    pub id: TaskId,

    /// MessagePack-encoded program bytes.
    #[serde(with = "serde_bytes")]
    pub prog: Vec<u8>,
}

impl WireTask {
    /// Encode `program` with MessagePack and pair it with `id`.
    pub fn new<P: Serialize + ?Sized>(id: TaskId, program: &P) -> Result<Self, QueueError> {
        Ok(Self {
            id,
            prog: rmp_serde::to_vec(program)?,
        })
    }

    /// Deserialize the program into the expected type.
    pub fn decode_program<P: for<'de> Deserialize<'de>>(&self) -> Result<P, QueueError> {
        Ok(rmp_serde::from_slice(&self.prog)?)
    }

    /// Serialize this whole envelope to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, QueueError> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Deserialize an envelope from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, QueueError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Serialize `Vec<u8>` as a MessagePack bin instead of an int array.
mod serde_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let bytes: &[u8] = Deserialize::deserialize(d)?;
        Ok(bytes.to_vec())
    }
}
