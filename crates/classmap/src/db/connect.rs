use crate::{Error, Result};

use classmap_core::Connection;
use url::Url;

/// Opens a connection to the engine named by the URL's scheme.
pub fn connect(url: &str) -> Result<Box<dyn Connection>> {
    let parsed = Url::parse(url)
        .map_err(|e| Error::invalid_connection_url(format!("{e}; url={url}")))?;

    match parsed.scheme() {
        "sqlite" => connect_sqlite(url),
        scheme => Err(Error::invalid_connection_url(format!(
            "unsupported database; scheme={scheme}; url={url}"
        ))),
    }
}

#[cfg(feature = "sqlite")]
fn connect_sqlite(url: &str) -> Result<Box<dyn Connection>> {
    let driver = classmap_driver_sqlite::Sqlite::new(url)?;
    log::debug!("connecting to {}", driver.url());
    Ok(Box::new(driver.connect()?))
}

#[cfg(not(feature = "sqlite"))]
fn connect_sqlite(_url: &str) -> Result<Box<dyn Connection>> {
    Err(Error::invalid_connection_url("`sqlite` feature not enabled"))
}
