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

use crate::domain::entities::ConnectionParams;
use crate::domain::errors::{ExportError, Result};
use log::info;
use mysql::prelude::Queryable;
use mysql::{Conn, Opts, OptsBuilder};
use std::sync::Mutex;
use std::time::Duration;

/// The single MySQL session shared by the metadata and extraction adapters.
///
/// The run is strictly sequential, so one connection is opened at startup and
/// reused for every table. The mutex only serializes access between the two
/// adapters; it is never contended.
pub struct MysqlConnection {
    conn: Mutex<Conn>,
}

impl MysqlConnection {
    /// Opens and verifies the connection. Any failure here is fatal for the run.
    pub fn connect(
        params: &ConnectionParams,
        connect_timeout: Duration,
        query_timeout: Duration,
    ) -> Result<Self> {
        let opts = build_opts(params, connect_timeout, query_timeout);

        info!("Connecting to MySQL at {}...", params);
        let mut conn = Conn::new(opts)
            .map_err(|e| ExportError::ConnectionError(format!("{}: {}", params, e)))?;
        conn.query_drop("SELECT 1")
            .map_err(|e| ExportError::ConnectionError(format!("{}: {}", params, e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&mut Conn) -> Result<T>) -> Result<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| ExportError::ConnectionError("connection lock poisoned".to_string()))?;
        f(&mut guard)
    }
}

/// Socket read/write timeouts double as the per-query deadline.
pub fn build_opts(
    params: &ConnectionParams,
    connect_timeout: Duration,
    query_timeout: Duration,
) -> Opts {
    OptsBuilder::new()
        .ip_or_hostname(Some(params.host.clone()))
        .tcp_port(params.port)
        .user(Some(params.user.clone()))
        .pass(Some(params.password.clone()))
        .db_name(Some(params.database.clone()))
        .init(vec!["SET NAMES utf8mb4"])
        .tcp_connect_timeout(Some(connect_timeout))
        .read_timeout(Some(query_timeout))
        .write_timeout(Some(query_timeout))
        .into()
}
