//! Signal records and their wire form.
//!
//! Records are immutable once built. The identity is computed in
//! [`SignalBuilder::build`] and carried with the fields, so it cannot drift
//! from the content it was derived from.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::SignalError;
use crate::identity::{self, Identity};

/// One sample of a multi-valued signal (e.g. a GPS fix split into axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(rename = "Key")]
    pub key: i64,
    #[serde(rename = "Value")]
    pub value: f64,
}

impl KeyValue {
    pub fn new(key: i64, value: f64) -> Self {
        Self { key, value }
    }
}

/// Fields carried alongside a record that never reach the wire and take no
/// part in its identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalContext {
    pub vehicle_number: Option<String>,
    pub speed: Option<f32>,
    pub unit_text: Option<String>,
    pub tenant_id: i32,
}

/// A single signal emitted by a device.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    device_id: String,
    object_id: String,
    timestamp: i64,
    value: Option<String>,
    key_values: Vec<KeyValue>,
    context: SignalContext,
    identity: Identity,
}

impl SignalRecord {
    /// Build a scalar-valued record. `None` falls back to the (empty)
    /// key/value list for identity purposes.
    pub fn new(
        device_id: impl Into<String>,
        object_id: impl Into<String>,
        timestamp: i64,
        value: Option<&str>,
    ) -> Self {
        let device_id = device_id.into();
        let object_id = object_id.into();
        let identity = identity::derive(&object_id, timestamp, &device_id, value, &[]);
        Self {
            device_id,
            object_id,
            timestamp,
            value: value.map(str::to_owned),
            key_values: Vec::new(),
            context: SignalContext::default(),
            identity,
        }
    }

    pub fn builder(
        device_id: impl Into<String>,
        object_id: impl Into<String>,
        timestamp: i64,
    ) -> SignalBuilder {
        SignalBuilder::new(device_id, object_id, timestamp)
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Unix epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn key_values(&self) -> &[KeyValue] {
        &self.key_values
    }

    pub fn context(&self) -> &SignalContext {
        &self.context
    }

    /// Identity computed when the record was built.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// `timestamp` as a point in time; `None` if it does not fit `SystemTime`.
    pub fn observed_at(&self) -> Option<SystemTime> {
        let offset = Duration::from_millis(self.timestamp.unsigned_abs());
        if self.timestamp >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        }
    }

    /// JSON payload written to the store and published on channels.
    ///
    /// All five fields are always present so consumers can re-derive the
    /// identity from the payload alone.
    pub fn to_wire(&self) -> Result<Vec<u8>, SignalError> {
        let wire = WireRef {
            device_id: &self.device_id,
            object_id: &self.object_id,
            timestamp: self.timestamp,
            value: self.value.as_deref(),
            key_values: &self.key_values,
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Parse a payload produced by [`to_wire`](Self::to_wire) and re-derive
    /// its identity. A `null` or missing `keyValue` reads as empty.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, SignalError> {
        let wire: WireOwned = serde_json::from_slice(bytes)?;
        let mut builder = SignalBuilder::new(wire.device_id, wire.object_id, wire.timestamp)
            .key_values(wire.key_values.unwrap_or_default());
        if let Some(value) = wire.value {
            builder = builder.value(value);
        }
        builder.build()
    }
}

#[derive(Serialize)]
struct WireRef<'a> {
    #[serde(rename = "deviceId")]
    device_id: &'a str,
    #[serde(rename = "id")]
    object_id: &'a str,
    timestamp: i64,
    value: Option<&'a str>,
    #[serde(rename = "keyValue")]
    key_values: &'a [KeyValue],
}

#[derive(Deserialize)]
struct WireOwned {
    #[serde(rename = "deviceId")]
    device_id: String,
    #[serde(rename = "id")]
    object_id: String,
    timestamp: i64,
    #[serde(default)]
    value: Option<String>,
    #[serde(rename = "keyValue", default)]
    key_values: Option<Vec<KeyValue>>,
}

/// Builder for records that carry key/value samples or context.
#[derive(Debug, Clone)]
pub struct SignalBuilder {
    device_id: String,
    object_id: String,
    timestamp: i64,
    value: Option<String>,
    key_values: Vec<KeyValue>,
    context: SignalContext,
}

impl SignalBuilder {
    pub fn new(device_id: impl Into<String>, object_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            device_id: device_id.into(),
            object_id: object_id.into(),
            timestamp,
            value: None,
            key_values: Vec::new(),
            context: SignalContext::default(),
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn key_value(mut self, key: i64, value: f64) -> Self {
        self.key_values.push(KeyValue::new(key, value));
        self
    }

    pub fn key_values(mut self, pairs: impl IntoIterator<Item = KeyValue>) -> Self {
        self.key_values.extend(pairs);
        self
    }

    pub fn context(mut self, context: SignalContext) -> Self {
        self.context = context;
        self
    }

    /// Validate and freeze the record.
    ///
    /// Non-finite samples are rejected: JSON cannot carry them, so the
    /// payload would not reproduce the identity.
    pub fn build(self) -> Result<SignalRecord, SignalError> {
        if let Some((index, kv)) = self
            .key_values
            .iter()
            .enumerate()
            .find(|(_, kv)| !kv.value.is_finite())
        {
            return Err(SignalError::NonFinite {
                index,
                value: kv.value,
            });
        }

        let identity = identity::derive(
            &self.object_id,
            self.timestamp,
            &self.device_id,
            self.value.as_deref(),
            &self.key_values,
        );
        Ok(SignalRecord {
            device_id: self.device_id,
            object_id: self.object_id,
            timestamp: self.timestamp,
            value: self.value,
            key_values: self.key_values,
            context: self.context,
            identity,
        })
    }
}
