use std::env;

/// Bucket identity for the photo storage provider.
///
/// Both fields are required before any listing call is attempted; callers
/// treat an absent config as a configuration error, not a transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
}

impl StorageConfig {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Reads `PHOTOS_BUCKET` / `PHOTOS_REGION`. Returns `None` when either is
    /// missing or blank.
    pub fn from_env() -> Option<Self> {
        let bucket = env::var("PHOTOS_BUCKET").ok()?;
        let region = env::var("PHOTOS_REGION").ok()?;
        if bucket.trim().is_empty() || region.trim().is_empty() {
            return None;
        }
        Some(Self { bucket, region })
    }

    /// Virtual-hosted-style endpoint for the bucket.
    pub fn endpoint(&self) -> String {
        format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region)
    }
}
