//! Record codec seam
//!
//! The container layer never interprets record bytes. Turning records into
//! block payloads and decoding a complete container back into records is
//! delegated to a [`RecordCodec`]. [`AvroCodec`] implements it on top of the
//! `apache-avro` crate, whose reader doubles as an independent check that
//! reconstructed chunks are valid containers.

use apache_avro::Schema;
use apache_avro::types::Value;

use crate::block::frame_block;
use crate::codec::Codec;
use crate::error::{OcfError, OcfResult};

/// Encoder and decoder for the records stored in block payloads
pub trait RecordCodec {
    /// Structured record type
    type Record;
    /// Schema descriptor the records are encoded against
    type Schema;

    /// Schema text stored under `avro.schema` in the header
    fn schema_json(&self, schema: &Self::Schema) -> String;

    /// Encode `records` as one block body: object count, payload size and
    /// the payload compressed with `codec`, without the trailing sync token
    fn encode_block(
        &self,
        records: &[Self::Record],
        schema: &Self::Schema,
        codec: Codec,
    ) -> OcfResult<Vec<u8>>;

    /// Decode every record of a complete container (header included)
    fn decode_records(&self, container: &[u8]) -> OcfResult<Vec<Self::Record>>;
}

/// Parsed Avro schema together with the JSON it was parsed from
#[derive(Debug, Clone)]
pub struct AvroSchema {
    json: String,
    parsed: Schema,
}

impl AvroSchema {
    /// Parse a schema from JSON text
    pub fn parse(json: &str) -> OcfResult<Self> {
        let parsed = Schema::parse_str(json).map_err(|e| OcfError::Record(e.to_string()))?;
        Ok(Self {
            json: json.to_string(),
            parsed,
        })
    }

    /// The schema JSON as supplied
    pub fn json(&self) -> &str {
        &self.json
    }

    /// The parsed schema
    pub fn schema(&self) -> &Schema {
        &self.parsed
    }

    /// Convert a JSON document into a record conforming to this schema
    pub fn record_from_json(&self, json: serde_json::Value) -> OcfResult<Value> {
        Value::from(json)
            .resolve(&self.parsed)
            .map_err(|e| OcfError::Record(e.to_string()))
    }
}

/// Convert a decoded record to JSON for display
pub fn record_to_json(record: Value) -> OcfResult<serde_json::Value> {
    serde_json::Value::try_from(record).map_err(|e| OcfError::Record(e.to_string()))
}

/// Record codec backed by the `apache-avro` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct AvroCodec;

impl RecordCodec for AvroCodec {
    type Record = Value;
    type Schema = AvroSchema;

    fn schema_json(&self, schema: &AvroSchema) -> String {
        schema.json.clone()
    }

    fn encode_block(
        &self,
        records: &[Value],
        schema: &AvroSchema,
        codec: Codec,
    ) -> OcfResult<Vec<u8>> {
        let mut payload = Vec::new();
        for record in records {
            let datum = apache_avro::to_avro_datum(&schema.parsed, record.clone())
                .map_err(|e| OcfError::Record(e.to_string()))?;
            payload.extend_from_slice(&datum);
        }
        let compressed = codec.compress(&payload)?;
        Ok(frame_block(records.len(), &compressed))
    }

    fn decode_records(&self, container: &[u8]) -> OcfResult<Vec<Value>> {
        let reader =
            apache_avro::Reader::new(container).map_err(|e| OcfError::Record(e.to_string()))?;
        reader
            .map(|value| value.map_err(|e| OcfError::Record(e.to_string())))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::writer::{ContainerWriter, WriteOptions};
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"{
        "type": "record",
        "name": "Event",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "name", "type": "string"}
        ]
    }"#;

    fn event(id: i64) -> Value {
        Value::Record(vec![
            ("id".to_string(), Value::Long(id)),
            ("name".to_string(), Value::String(format!("event-{id}"))),
        ])
    }

    #[test]
    fn test_round_trip_every_codec() {
        let schema = AvroSchema::parse(SCHEMA).unwrap();
        let records: Vec<Value> = (0..57).map(event).collect();

        for codec in Codec::ALL {
            let options = WriteOptions::default()
                .with_codec(codec)
                .with_sync_interval(10);
            let writer = ContainerWriter::new(options).unwrap();
            let data = writer.to_vec(&AvroCodec, &schema, &records).unwrap();

            let decoded = AvroCodec.decode_records(&data).unwrap();
            assert_eq!(decoded, records, "codec {codec}");
        }
    }

    #[test]
    fn test_schema_mismatch_is_record_error() {
        let schema = AvroSchema::parse(SCHEMA).unwrap();
        let bad = vec![Value::Long(1)];
        let err = AvroCodec
            .encode_block(&bad, &schema, Codec::Null)
            .unwrap_err();
        assert!(matches!(err, OcfError::Record(_)));
    }

    #[test]
    fn test_json_conversion() {
        let schema = AvroSchema::parse(SCHEMA).unwrap();
        let json = serde_json::json!({"id": 7, "name": "event-7"});
        let record = schema.record_from_json(json.clone()).unwrap();
        assert_eq!(record, event(7));
        assert_eq!(record_to_json(record).unwrap(), json);
    }

    #[test]
    fn test_invalid_schema() {
        assert!(matches!(
            AvroSchema::parse("{\"type\": \"nope\"}"),
            Err(OcfError::Record(_))
        ));
    }
}
