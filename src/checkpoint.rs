use crate::error::{ErrorCode, SelectionError};
use crate::model::{Evaluation, Model, ModelKey};
use crate::model_params::ParamVariant;
use crate::partition_descriptor::PartitionDescriptor;
use crate::substitution_model::MatrixId;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Read, Write};

const CHECKPOINT_MAGIC: &str = "phylosel-checkpoint";
const CHECKPOINT_VERSION: u32 = 1;

/// Self-describing snapshot of one partition's evaluation state: identity
/// (id + descriptor) plus every candidate key with its evaluation, if any.
/// Serialized as one JSON line per snapshot so a sink can be appended to
/// while a run progresses; the newest readable record wins on restore.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub magic: String,
    pub version: u32,
    pub partition_id: u32,
    pub descriptor: PartitionDescriptor,
    pub models: Vec<ModelEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub matrix: MatrixId,
    pub variant: ParamVariant,
    /// Readable model name; informational only, ignored on restore.
    pub name: String,
    pub evaluation: Option<Evaluation>,
}

impl ModelEntry {
    pub fn key(&self) -> ModelKey {
        ModelKey::new(self.matrix, self.variant)
    }
}

/// Outcome of a restore: how many evaluations came back, and how many
/// unreadable records (e.g. a line truncated by a crash mid-write) were
/// passed over. A non-zero skip count is the caller's cue to warn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped_records: usize,
}

impl CheckpointRecord {
    pub fn capture(
        partition_id: u32,
        descriptor: &PartitionDescriptor,
        models: &[Model],
    ) -> Self {
        Self {
            magic: CHECKPOINT_MAGIC.to_string(),
            version: CHECKPOINT_VERSION,
            partition_id,
            descriptor: descriptor.clone(),
            models: models
                .iter()
                .map(|model| ModelEntry {
                    matrix: model.matrix(),
                    variant: model.variant(),
                    name: model.name(),
                    evaluation: model.evaluation().cloned(),
                })
                .collect(),
        }
    }

    pub fn is_current_format(&self) -> bool {
        self.magic == CHECKPOINT_MAGIC && self.version == CHECKPOINT_VERSION
    }
}

/// Append one snapshot to the sink.
pub fn write_record(
    out: &mut dyn Write,
    record: &CheckpointRecord,
) -> Result<(), SelectionError> {
    serde_json::to_writer(&mut *out, record)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Scan the source sequentially and keep the newest readable snapshot.
/// Unparseable or foreign-format lines are counted, not fatal; a source
/// with no usable record at all is.
pub fn read_latest(
    source: &mut dyn Read,
) -> Result<(CheckpointRecord, usize), SelectionError> {
    let reader = BufReader::new(source);
    let mut latest = None;
    let mut skipped = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CheckpointRecord>(&line) {
            Ok(record) if record.is_current_format() => latest = Some(record),
            Ok(_) | Err(_) => skipped += 1,
        }
    }
    match latest {
        Some(record) => Ok((record, skipped)),
        None => Err(SelectionError::new(
            ErrorCode::CheckpointCorrupt,
            format!("no usable snapshot in log ({skipped} unreadable records)"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition_descriptor::DataType;

    fn sample_record(partition_id: u32) -> CheckpointRecord {
        let descriptor = PartitionDescriptor::contiguous("p1", 0, 10, DataType::Nucleotide);
        let mut model = Model::new(MatrixId(10), ParamVariant::Gamma);
        model.set_evaluation(Evaluation::scored(42.0));
        let models = vec![model, Model::new(MatrixId(0), ParamVariant::Gamma)];
        CheckpointRecord::capture(partition_id, &descriptor, &models)
    }

    #[test]
    fn test_record_round_trip() {
        let record = sample_record(7);
        let mut buffer = vec![];
        write_record(&mut buffer, &record).unwrap();
        let (back, skipped) = read_latest(&mut buffer.as_slice()).unwrap();
        assert_eq!(back, record);
        assert_eq!(skipped, 0);
        assert_eq!(back.models[0].name, "GTR+G");
        assert_eq!(back.models[0].evaluation.as_ref().unwrap().score, 42.0);
        assert!(back.models[1].evaluation.is_none());
    }

    #[test]
    fn test_newest_record_wins() {
        let mut buffer = vec![];
        write_record(&mut buffer, &sample_record(1)).unwrap();
        write_record(&mut buffer, &sample_record(2)).unwrap();
        let (back, _) = read_latest(&mut buffer.as_slice()).unwrap();
        assert_eq!(back.partition_id, 2);
    }

    #[test]
    fn test_truncated_tail_skipped() {
        let mut buffer = vec![];
        write_record(&mut buffer, &sample_record(1)).unwrap();
        // Simulate a crash mid-append: half a record on the last line.
        buffer.extend_from_slice(br#"{"magic":"phylosel-checkpoint","versi"#);
        let (back, skipped) = read_latest(&mut buffer.as_slice()).unwrap();
        assert_eq!(back.partition_id, 1);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_empty_log_is_corrupt() {
        let err = read_latest(&mut b"".as_slice()).unwrap_err();
        assert_eq!(err.code, ErrorCode::CheckpointCorrupt);
        let err = read_latest(&mut b"garbage\n{\"not\":1}\n".as_slice()).unwrap_err();
        assert_eq!(err.code, ErrorCode::CheckpointCorrupt);
    }
}
