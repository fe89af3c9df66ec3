pub mod azure_table;
pub mod http_client_factory;
pub mod ingestion;
pub mod mock;

pub use azure_table::AzureTableStore;
pub use http_client_factory::HttpClientFactory;
pub use ingestion::HttpIngestionClient;
