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

//! # Metadata Port
//!
//! In Hexagonal Architecture, a **Port** is like a "Slot" or a "Contract".
//!
//! This Port defines what it means to "read column metadata" from a database.
//! The orchestrator does not care whether the answer comes from MySQL or from
//! a mock in a unit test.

use crate::domain::entities::ColumnDescriptor;
use crate::domain::errors::Result;

/// `MetadataPort` is the schema introspector.
pub trait MetadataPort: Send + Sync {
    /// Returns the columns of `table` in the database's native order.
    ///
    /// Fails with `IntrospectionFailed` when the table does not exist, the
    /// connection is unusable, or the metadata query errors. There is no
    /// upper bound on the number of columns returned.
    fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;
}
