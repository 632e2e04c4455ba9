pub use clap::Parser;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::stats::SummaryFormat;

/// Errors raised by configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("probe interval must be greater than zero")]
    ZeroInterval,
    #[error("port must be greater than zero")]
    ZeroPort,
    #[error("host must not be empty")]
    EmptyHost,
}

#[derive(Parser, Debug, Clone)]
#[clap(version, about = "Test HTTP/2 round-trip latency", long_about = None)]
pub struct Configuration {
    /// The hostname or IP (preferably) of the server
    pub host: String,
    /// The port number to connect to
    #[clap(short = 'p', long, default_value_t = 443)]
    pub port: u16,
    /// Output file for latency samples ("-" for stdout)
    #[clap(short = 'o', long, default_value = "-")]
    pub outfile: String,
    /// Seconds between probes
    #[clap(short = 'i', long, default_value_t = 2)]
    pub interval: u64,
    /// Format of the final statistics summary
    #[clap(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub summary_format: SummaryFormat,
}

impl Configuration {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.interval == 0 {
            return Err(ConfigurationError::ZeroInterval);
        }
        if self.port == 0 {
            return Err(ConfigurationError::ZeroPort);
        }
        if self.host.is_empty() {
            return Err(ConfigurationError::EmptyHost);
        }
        Ok(())
    }

    /// Opens the sample sink. Samples are flushed per line by the caller, so
    /// stdout is handed out unbuffered while files get a `BufWriter`.
    pub fn open_outfile(&self) -> io::Result<Box<dyn Write + Send>> {
        if self.outfile == "-" {
            Ok(Box::new(io::stdout()))
        } else {
            Ok(Box::new(BufWriter::new(File::create(&self.outfile)?)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_conf() -> Configuration {
        Configuration {
            host: "192.0.2.1".to_string(),
            port: 443,
            outfile: "-".to_string(),
            interval: 2,
            summary_format: SummaryFormat::Text,
        }
    }

    #[test]
    fn valid_configuration_passes() {
        assert!(base_conf().validate().is_ok());
    }

    #[test]
    fn zero_interval_rejected() {
        let mut conf = base_conf();
        conf.interval = 0;
        assert!(matches!(
            conf.validate(),
            Err(ConfigurationError::ZeroInterval)
        ));
    }

    #[test]
    fn empty_host_rejected() {
        let mut conf = base_conf();
        conf.host.clear();
        assert!(matches!(conf.validate(), Err(ConfigurationError::EmptyHost)));
    }
}
