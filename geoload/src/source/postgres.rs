use futures::StreamExt;
use geoload_config::shared::{
    GeometryFormat, IntoConnectOptions, PgConnectionConfig, SourceTableConfig,
};
use pg_escape::quote_identifier;
use rustls::ClientConfig;
use std::io::BufReader;
use std::pin::Pin;
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::{Client, Config, Connection, NoTls, Row, RowStream, Socket};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{Instrument, debug, error, info};

use crate::error::{ErrorKind, EtlResult};
use crate::{bail, etl_error};
use crate::source::RowSource;
use crate::types::CountyRecord;

/// Spawns a background task to monitor a Postgres connection until it terminates.
fn spawn_postgres_connection<T>(connection: Connection<Socket, T::Stream>)
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let span = tracing::Span::current();
    let task = async move {
        let result = connection.await;

        match result {
            Err(err) => error!("an error occurred during the postgres connection: {}", err),
            Ok(()) => info!("postgres connection terminated successfully"),
        }
    }
    .instrument(span);

    // The `Client` terminates the connection when dropped, so the handle is not kept.
    tokio::spawn(task);
}

/// Builds the full scan query for the source table.
///
/// Identifiers are quoted, and every column is cast so that decoding does not depend on the exact
/// column types of the table.
pub fn build_select_query(table: &SourceTableConfig) -> String {
    let geometry_fn = match table.geometry_format {
        GeometryFormat::Wkt => "ST_AsText",
        GeometryFormat::GeoJson => "ST_AsGeoJSON",
    };

    format!(
        "select {}::int8, {}::text, {}({}) from {}.{}",
        quote_identifier(&table.id_column),
        quote_identifier(&table.county_fp_column),
        geometry_fn,
        quote_identifier(&table.geometry_column),
        quote_identifier(&table.schema),
        quote_identifier(&table.table),
    )
}

/// Row source scanning a PostGIS table.
///
/// Creating the source does no I/O. The connection is opened and the scan query issued on the first
/// call to [`RowSource::next_record`], so nothing touches the source database before the pipeline
/// has provisioned the destination table. Rows are streamed from the server as they are consumed.
/// Dropping the source closes the connection.
pub struct PostgresRowSource {
    pg_connection_config: PgConnectionConfig,
    query: String,
    client: Option<Client>,
    rows: Option<Pin<Box<RowStream>>>,
}

impl PostgresRowSource {
    /// Creates a source scanning `table` in the database described by `pg_connection_config`.
    pub fn new(pg_connection_config: PgConnectionConfig, table: &SourceTableConfig) -> Self {
        Self {
            pg_connection_config,
            query: build_select_query(table),
            client: None,
            rows: None,
        }
    }

    /// Connects to the source database and starts the table scan.
    async fn start_scan(&mut self) -> EtlResult<RowStream> {
        let client = match self.pg_connection_config.tls.enabled {
            true => Self::connect_tls(&self.pg_connection_config).await?,
            false => Self::connect_no_tls(&self.pg_connection_config).await?,
        };

        debug!(query = %self.query, "starting source table scan");
        let stream = client
            .query_raw(self.query.as_str(), Vec::<String>::new())
            .await?;
        self.client = Some(client);

        Ok(stream)
    }

    /// Establishes a connection to Postgres without TLS encryption.
    async fn connect_no_tls(pg_connection_config: &PgConnectionConfig) -> EtlResult<Client> {
        let config: Config = pg_connection_config.with_db();

        let (client, connection) = config.connect(NoTls).await?;
        spawn_postgres_connection::<NoTls>(connection);

        info!("successfully connected to postgres without tls");

        Ok(client)
    }

    /// Establishes a TLS-encrypted connection to Postgres.
    async fn connect_tls(pg_connection_config: &PgConnectionConfig) -> EtlResult<Client> {
        let config: Config = pg_connection_config.with_db();

        let mut root_store = rustls::RootCertStore::empty();
        let mut root_certs_reader =
            BufReader::new(pg_connection_config.tls.trusted_root_certs.as_bytes());
        for cert in rustls_pemfile::certs(&mut root_certs_reader) {
            let cert = cert?;
            root_store.add(cert)?;
        }

        let tls_config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let (client, connection) = config.connect(MakeRustlsConnect::new(tls_config)).await?;
        spawn_postgres_connection::<MakeRustlsConnect>(connection);

        info!("successfully connected to postgres with tls");

        Ok(client)
    }
}

impl RowSource for PostgresRowSource {
    fn name() -> &'static str {
        "postgres"
    }

    async fn next_record(&mut self) -> EtlResult<Option<CountyRecord>> {
        if self.rows.is_none() {
            let stream = self.start_scan().await?;
            self.rows = Some(Box::pin(stream));
        }

        let Some(rows) = self.rows.as_mut() else {
            bail!(ErrorKind::InvalidState, "Source table scan was not started");
        };

        match rows.next().await {
            Some(row) => Ok(Some(decode_row(&row?)?)),
            None => Ok(None),
        }
    }
}

/// Decodes a row produced by [`build_select_query`].
fn decode_row(row: &Row) -> EtlResult<CountyRecord> {
    let id = row.try_get::<_, i64>(0).map_err(|err| {
        etl_error!(
            ErrorKind::ConversionError,
            "Failed to decode county id",
            err.to_string(),
            source: err
        )
    })?;
    let county_fp = row.try_get::<_, String>(1).map_err(|err| {
        etl_error!(
            ErrorKind::ConversionError,
            "Failed to decode county code",
            format!("row {id}: {err}"),
            source: err
        )
    })?;
    let geom = row.try_get::<_, String>(2).map_err(|err| {
        etl_error!(
            ErrorKind::ConversionError,
            "Failed to decode county geometry",
            format!("row {id}: {err}"),
            source: err
        )
    })?;

    Ok(CountyRecord {
        id,
        county_fp,
        geom,
    })
}
