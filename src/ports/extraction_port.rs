// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Extraction Port
//!
//! This Port defines the contract for the row materializer.
//!
//! Anything that implements `ExtractionPort` must be able to run a query and
//! hand back every row already rendered to text, aligned with the columns
//! it was given.

use crate::domain::entities::{ColumnDescriptor, RowSet};
use crate::domain::errors::Result;

/// `ExtractionPort` handles the heavy-lifting of the export.
pub trait ExtractionPort: Send + Sync {
    /// Executes `query` for `table` and materializes the full result.
    ///
    /// A failure of the query itself, or of the cursor while rows are being
    /// fetched, is returned as `QueryFailed`. A cell that cannot be converted
    /// is left empty and recorded on the `RowSet` as a scan failure; its row
    /// and the remaining rows are still exported. The result cursor is fully
    /// drained before this returns.
    fn materialize(
        &self,
        table: &str,
        query: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<RowSet>;
}
