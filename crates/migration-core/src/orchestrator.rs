//! The orchestrator: sequences validation, introspection, comparison, and
//! synthesis/reporting, and enforces the validation gates and timing
//! windows around each step.

use crate::cancellation::CancellationToken;
use crate::error::{CoreError, CoreResult};
use crate::retry;
use crate::{report, validate};
use schema_describer::{EngineKind, ReadOptions, Schema, SchemaDescriber};
use schema_differ::{Clock, SchemaComparison};
use std::time::Duration;

const CONNECTION_VALIDATION_WINDOW: Duration = Duration::from_secs(30);
const SCHEMA_READ_WINDOW: Duration = Duration::from_secs(5 * 60);
const CONNECTION_RETRY_ATTEMPTS: u32 = 3;
const CONNECTION_RETRY_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// The two connection descriptors plus the engine tag that enter the
/// pipeline.
pub struct DiffRequest<'a> {
    pub source_conn: &'a str,
    pub target_conn: &'a str,
    pub options: ReadOptions,
    pub migration_name: String,
}

/// Everything downstream callers need: the diff, the synthesized script,
/// and the structured report. Held together because the report and the
/// migration script are independent and may be emitted in either order,
/// so neither is thrown away once computed.
pub struct DiffOutcome {
    pub comparison: SchemaComparison,
    pub migration_script: String,
    pub report: report::Report,
}

pub struct DiffEngine<'a> {
    describer: &'a dyn SchemaDescriber,
    engine: EngineKind,
    clock: &'a dyn Clock,
}

impl<'a> DiffEngine<'a> {
    pub fn new(engine: EngineKind, clock: &'a dyn Clock) -> DiffEngine<'a> {
        DiffEngine { describer: engine.describer(), engine, clock }
    }

    /// Build an engine with an injected describer, bypassing
    /// `EngineKind::describer()`'s static dispatch. Used by tests that
    /// drive the pipeline against in-process fixtures instead of a live
    /// database.
    pub fn with_describer(describer: &'a dyn SchemaDescriber, engine: EngineKind, clock: &'a dyn Clock) -> DiffEngine<'a> {
        DiffEngine { describer, engine, clock }
    }

    #[tracing::instrument(skip(self, req, cancel))]
    pub async fn run(&self, req: DiffRequest<'_>, cancel: &CancellationToken) -> CoreResult<DiffOutcome> {
        self.validate_connections(req.source_conn, req.target_conn, cancel).await?;

        tracing::info!("reading source schema");
        let source = self.read_schema(req.source_conn, &req.options, cancel).await?;

        tracing::info!("reading target schema");
        let target = self.read_schema(req.target_conn, &req.options, cancel).await?;

        validate::validate(&source).map_err(CoreError::from)?;
        validate::validate(&target).map_err(CoreError::from)?;

        let comparison = schema_differ::compare(&source, &target);

        let report = report::build(&comparison, self.clock.now(), &req.migration_name, self.engine);
        let migration_script = schema_differ::synthesize(&comparison, self.engine, self.clock, &req.migration_name);

        tracing::info!(
            differences_found = comparison.summary.differences_found,
            "diff complete"
        );

        Ok(DiffOutcome { comparison, migration_script, report })
    }

    async fn validate_connections(&self, source_conn: &str, target_conn: &str, cancel: &CancellationToken) -> CoreResult<()> {
        let window = tokio::time::timeout(CONNECTION_VALIDATION_WINDOW, async {
            for conn in [source_conn, target_conn] {
                let ok = retry::with_backoff(CONNECTION_RETRY_ATTEMPTS, CONNECTION_RETRY_INITIAL_BACKOFF, || async {
                    if self.describer.test_connection(conn).await {
                        Ok(())
                    } else {
                        Err(CoreError::Connection(self.describer.display_name(conn)))
                    }
                })
                .await;

                ok?;
            }

            Ok(())
        });

        tokio::select! {
            result = window => result.map_err(|_| CoreError::Timeout("connection validation window exceeded".into()))?,
            _ = cancel.cancelled() => Err(CoreError::Unexpected(anyhow::anyhow!("cancelled during connection validation"))),
        }
    }

    async fn read_schema(&self, conn: &str, options: &ReadOptions, cancel: &CancellationToken) -> CoreResult<Schema> {
        let read = self.describer.read_schema(conn, options);

        tokio::select! {
            result = tokio::time::timeout(SCHEMA_READ_WINDOW, read) => {
                result.map_err(|_| CoreError::Timeout("schema read window exceeded".into()))?.map_err(CoreError::from)
            }
            _ = cancel.cancelled() => Err(CoreError::Unexpected(anyhow::anyhow!("cancelled during schema read"))),
        }
    }
}
