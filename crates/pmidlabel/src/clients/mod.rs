//! Clients for the remote services metadata is fetched from.
//!
//! - [`pubmed`] - Client for NCBI E-utilities, serving PubMed records as MEDLINE text
//!
//! # Examples
//!
//! ```no_run
//! use pmidlabel::{clients::PubMedClient, Config, Pmid};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PubMedClient::new(&Config::default())?;
//! let pmid: Pmid = "40237684".parse()?;
//! let medline = client.fetch_medline(&pmid).await?;
//! println!("{medline}");
//! # Ok(())
//! # }
//! ```

pub mod pubmed;

pub use pubmed::PubMedClient;

use super::*;
