//! Connectivity probe: one select against `categories`, reported on the console.

use async_trait::async_trait;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::supabase::{Credential, ProbeError, Query, Row, SupabaseClient};

/// Table the probe reads from.
pub const COLLECTION: &str = "categories";

/// Printed in place of a row's name when the row has no `name` key.
pub const MISSING_NAME: &str = "N/A";

/// Read access to remote tables.
#[async_trait]
pub trait TableReader: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, ProbeError>;
}

/// Knobs for a probe run. The defaults perform an unfiltered `select=*`.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub columns: String,
    pub limit: Option<u32>,
    /// Additional tables checked after a successful probe.
    pub also: Vec<String>,
    pub timeout: Option<Duration>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            columns: "*".to_string(),
            limit: None,
            also: Vec::new(),
            timeout: None,
        }
    }
}

impl ProbeOptions {
    fn query(&self) -> Query {
        Query::select_all(COLLECTION)
            .columns(self.columns.clone())
            .limit(self.limit)
    }
}

/// Outcome of the main select, ready to be rendered.
#[derive(Debug)]
pub struct ProbeReport {
    pub result: Result<Vec<Row>, ProbeError>,
}

impl ProbeReport {
    pub fn failed(err: ProbeError) -> Self {
        Self { result: Err(err) }
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Console lines for this outcome, in print order.
    pub fn lines(&self) -> Vec<String> {
        let rows = match &self.result {
            Ok(rows) => rows,
            Err(err) => return vec![format!("Erro ao conectar com o Supabase: {err}")],
        };

        let mut lines = vec![
            "Conexão estabelecida com sucesso!".to_string(),
            format!("Número de categorias encontradas: {}", rows.len()),
        ];

        if rows.is_empty() {
            lines.push("Nenhuma categoria encontrada, mas a conexão está funcionando!".to_string());
        } else {
            lines.push(String::new());
            lines.push("Categorias:".to_string());
            lines.extend(rows.iter().map(|row| {
                format!("- {}", row.name().as_deref().unwrap_or(MISSING_NAME))
            }));
        }
        lines
    }
}

/// Result of checking read access to one extra table.
#[derive(Debug)]
pub struct TableAccess {
    pub table: String,
    pub result: Result<(), ProbeError>,
}

impl TableAccess {
    pub fn line(&self) -> String {
        match &self.result {
            Ok(()) => format!("✅ Acesso à tabela {} confirmado", self.table),
            Err(err) => format!("⚠️ Aviso: Erro ao acessar {}: {err}", self.table),
        }
    }
}

/// Run the main select and collect the outcome.
pub async fn run(reader: &dyn TableReader, query: &Query) -> ProbeReport {
    let start = Instant::now();
    let result = reader.select(query).await;

    match &result {
        Ok(rows) => info!(
            table = %query.table,
            rows = rows.len(),
            duration = ?start.elapsed(),
            "probe succeeded"
        ),
        Err(err) => warn!(
            table = %query.table,
            kind = err.kind(),
            error = %err,
            duration = ?start.elapsed(),
            "probe failed"
        ),
    }

    ProbeReport { result }
}

/// Select one `id` from each table in order. Failures are recorded, never fatal.
pub async fn check_tables(reader: &dyn TableReader, tables: &[String]) -> Vec<TableAccess> {
    let mut checks = Vec::with_capacity(tables.len());
    for table in tables {
        let query = Query::select_all(table.as_str()).columns("id").limit(Some(1));
        let result = reader.select(&query).await.map(|_| ());
        if let Err(err) = &result {
            warn!(table = %table, kind = err.kind(), error = %err, "table access check failed");
        }
        checks.push(TableAccess {
            table: table.clone(),
            result,
        });
    }
    checks
}

/// Probe through an existing reader, print the report to `out`, and return
/// whether the main select succeeded.
pub async fn probe_with<W: Write>(
    reader: &dyn TableReader,
    options: &ProbeOptions,
    out: &mut W,
) -> bool {
    let report = run(reader, &options.query()).await;
    write_lines(out, report.lines());

    if report.succeeded() && !options.also.is_empty() {
        let checks = check_tables(reader, &options.also).await;
        write_lines(out, checks.iter().map(TableAccess::line));
    }

    report.succeeded()
}

/// Build a session for `endpoint` and `credential`, then probe it.
///
/// Session construction failures are reported exactly like query failures.
pub async fn probe<W: Write>(
    endpoint: &str,
    credential: &Credential,
    options: &ProbeOptions,
    out: &mut W,
) -> bool {
    match SupabaseClient::new(endpoint, credential, options.timeout) {
        Ok(client) => probe_with(&client, options, out).await,
        Err(err) => {
            warn!(kind = err.kind(), error = %err, "could not prepare Supabase session");
            let report = ProbeReport::failed(err);
            write_lines(out, report.lines());
            false
        }
    }
}

fn write_lines<W: Write>(out: &mut W, lines: impl IntoIterator<Item = String>) {
    for line in lines {
        if let Err(e) = writeln!(out, "{line}") {
            warn!(error = %e, "failed to write probe output");
            return;
        }
    }
    if let Err(e) = out.flush() {
        warn!(error = %e, "failed to flush probe output");
    }
}
