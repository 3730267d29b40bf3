use serde::Serialize;
use uuid::Uuid;

use crate::error::{CardbookError, Result};
use crate::importer;
use crate::models::ExpenseRecord;

/// The working dataset for one session: the ordered bank roster paired with
/// the record list. Keeping them in one value makes the roster/record
/// invariant enforceable: the roster is only ever replaced together with
/// the records, by a successful import.
#[derive(Debug, Default, Serialize)]
pub struct Dataset {
    pub bank_names: Vec<String>,
    pub records: Vec<ExpenseRecord>,
}

impl Dataset {
    /// Parse CSV text into a fresh dataset. Zero parsed records is an
    /// import failure.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut data = Dataset::default();
        data.try_import(text)?;
        Ok(data)
    }

    /// Re-import over an existing dataset. On success the roster and the
    /// records are replaced wholesale; on failure (no parsable rows) the
    /// current contents are left completely untouched.
    pub fn try_import(&mut self, text: &str) -> Result<usize> {
        let parsed = importer::import_csv(text);
        if parsed.is_empty() {
            return Err(CardbookError::EmptyImport);
        }
        self.bank_names = parsed.bank_names;
        self.records = parsed.records;
        Ok(self.records.len())
    }

    /// Prepend a manually entered record. The roster is never extended by
    /// manual entry; amounts for unknown banks simply read as zero.
    pub fn add_record(&mut self, record: ExpenseRecord) {
        self.records.insert(0, record);
    }

    /// Replace the record with the same id, leaving order untouched.
    pub fn update_record(&mut self, record: ExpenseRecord) -> Result<()> {
        let slot = self
            .records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| CardbookError::UnknownRecord(record.id.to_string()))?;
        *slot = record;
        Ok(())
    }

    /// Remove a record by id. Immediate and final; confirmation is the
    /// caller's job.
    pub fn delete_record(&mut self, id: Uuid) -> Result<ExpenseRecord> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CardbookError::UnknownRecord(id.to_string()))?;
        Ok(self.records.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
