//! Object names of the form `{YYMMDD}-{hash}{NNN}{.ext}`.
//!
//! The hash part is the first [`HASH_LEN`] hex digits of an MD5 digest over the file path
//! followed by the date stamp, so it is stable for a given path on a given day. The three
//! digit suffix is drawn at random for every upload, which keeps two uploads of the same path
//! on the same day apart with probability 999/1000.
use chrono::NaiveDate;
use md5::{Digest, Md5};
use rand::Rng;
use std::path::Path;

/// `chrono` format of the date stamp, e.g. `261018`.
pub const DATE_FORMAT: &str = "%y%m%d";
/// Number of hex digits kept from the digest.
pub const HASH_LEN: usize = 8;
/// Exclusive upper bound of the random suffix.
const SUFFIX_BOUND: u16 = 1000;

pub fn date_stamp(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Hash component of an object name for `path` uploaded on `date`.
pub fn name_hash(path: &Path, date: NaiveDate) -> String {
    let mut hasher = Md5::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(date_stamp(date).as_bytes());
    let mut digest = format!("{:x}", hasher.finalize());
    digest.truncate(HASH_LEN);
    digest
}

/// Extension of the last path component, leading dot included: everything from the last `.`
/// on. Empty when the file name has no dot.
pub fn extension(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.rfind('.').map(|i| name[i..].to_owned()))
        .unwrap_or_default()
}

/// Generate the object name for `path` uploaded on `date`, drawing the suffix from `rng`.
pub fn object_name<R: Rng + ?Sized>(path: &Path, date: NaiveDate, rng: &mut R) -> String {
    let suffix = rng.gen_range(0..SUFFIX_BOUND);
    format!(
        "{}-{}{:03}{}",
        date_stamp(date),
        name_hash(path, date),
        suffix,
        extension(path)
    )
}
