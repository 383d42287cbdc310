pub mod collection_ext;
pub mod error;
pub mod string_ext;

pub use collection_ext::{sort_desc_by, top_n_desc_by};
pub use error::{ApiError, ApiResult};
pub use string_ext::{StringExt, TRUNCATION_MARKER, mask_secret, truncate_chars};

/// Round to `places` decimal digits (half away from zero)
#[inline]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
