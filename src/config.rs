use crate::err::{self, Error};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

/// Region used to derive the S3-compatible endpoint when none is given.
pub const DEFAULT_REGION: &str = "us-west-004";

/// Settings for a batch upload. Build it once, call [`Config::validate`], and share it
/// read-only between upload tasks.
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(default))]
pub struct Config {
    /// B2 application key ID (`B2_APPLICATION_KEY_ID`)
    pub key_id: String,
    /// B2 application key (`B2_APPLICATION_KEY`)
    pub key: String,
    /// Public URL that objects are served under (`B2_CUSTOM_URL`). Always ends in `/` after
    /// validation.
    pub base_url: String,
    /// Destination bucket (`B2_BUCKET_NAME`)
    pub bucket: String,
    /// Region of the bucket, used for signing and for the default endpoint.
    pub region: String,
    /// S3-compatible endpoint. Defaults to `https://s3.<region>.backblazeb2.com`.
    pub endpoint: Option<String>,
    /// Maximum number of simultaneous uploads. `None` uploads every file at once.
    pub max_concurrent: Option<usize>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("key_id", &self.key_id)
            .field("key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}

impl Config {
    /// Check that every required value is present and normalize the rest.
    ///
    /// Values are trimmed; a value that is empty after trimming counts as missing. An empty
    /// region falls back to [`DEFAULT_REGION`]. Validating an already validated config is a
    /// no-op.
    pub fn validate(self) -> Result<Config, Error> {
        let key_id = required(self.key_id, "key_id", "B2_APPLICATION_KEY_ID")?;
        let key = required(self.key, "key", "B2_APPLICATION_KEY")?;
        let mut base_url = required(self.base_url, "base_url", "B2_CUSTOM_URL")?;
        let bucket = required(self.bucket, "bucket", "B2_BUCKET_NAME")?;

        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let region = match self.region.trim() {
            "" => DEFAULT_REGION.to_owned(),
            region => region.to_owned(),
        };
        let endpoint = self
            .endpoint
            .map(|e| e.trim().trim_end_matches('/').to_owned())
            .filter(|e| !e.is_empty());

        ensure!(
            self.max_concurrent != Some(0),
            err::InvalidConfig {
                name: "max_concurrent",
                reason: "must be at least 1",
            }
        );

        Ok(Config {
            key_id,
            key,
            base_url,
            bucket,
            region,
            endpoint,
            max_concurrent: self.max_concurrent,
        })
    }

    /// The S3-compatible endpoint to send requests to.
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://s3.{}.backblazeb2.com", self.region),
        }
    }
}

fn required(value: String, name: &'static str, env: &'static str) -> Result<String, Error> {
    let value = value.trim();
    ensure!(!value.is_empty(), err::MissingConfig { name, env });
    Ok(value.to_owned())
}

#[cfg(test)]
mod test {
    use super::*;

    fn complete() -> Config {
        Config {
            key_id: "0041234567890ab0000000001".into(),
            key: "K004secret".into(),
            base_url: "https://cdn.example.com/files".into(),
            bucket: "my-bucket".into(),
            ..Default::default()
        }
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let cfg = complete().validate().unwrap();
        assert_eq!(cfg.base_url, "https://cdn.example.com/files/");

        let cfg = Config {
            base_url: "https://cdn.example.com/".into(),
            ..complete()
        }
        .validate()
        .unwrap();
        assert_eq!(cfg.base_url, "https://cdn.example.com/");
    }

    #[test]
    fn empty_values_are_missing() {
        let cases: Vec<(Config, &str)> = vec![
            (Config { key_id: "".into(), ..complete() }, "key_id"),
            (Config { key: "  ".into(), ..complete() }, "key"),
            (Config { base_url: "".into(), ..complete() }, "base_url"),
            (Config { bucket: "\t".into(), ..complete() }, "bucket"),
        ];
        for (cfg, expected) in cases {
            match cfg.validate() {
                Err(Error::MissingConfig { name, .. }) => assert_eq!(name, expected),
                other => panic!("expected missing {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn endpoint_defaults_to_region() {
        let cfg = complete().validate().unwrap();
        assert_eq!(cfg.region, DEFAULT_REGION);
        assert_eq!(cfg.endpoint(), "https://s3.us-west-004.backblazeb2.com");

        let cfg = Config {
            endpoint: Some("http://localhost:9000/".into()),
            ..complete()
        }
        .validate()
        .unwrap();
        assert_eq!(cfg.endpoint(), "http://localhost:9000");
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let res = Config {
            max_concurrent: Some(0),
            ..complete()
        }
        .validate();
        assert!(matches!(res, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn validate_is_idempotent() {
        let once = complete().validate().unwrap();
        let twice = once.clone().validate().unwrap();
        assert_eq!(once.base_url, twice.base_url);
        assert_eq!(once.endpoint(), twice.endpoint());
    }

    #[test]
    fn debug_hides_key() {
        let out = format!("{:?}", complete());
        assert!(!out.contains("K004secret"));
    }
}
