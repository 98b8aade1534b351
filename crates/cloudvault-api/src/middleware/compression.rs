//! Response compression layer.

use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::{DefaultPredicate, NotForContentType, Predicate};

/// Gzip for JSON and other text bodies. ZIP archives are already
/// compressed and go out as-is.
pub fn build_compression_layer() -> CompressionLayer<impl Predicate> {
    let predicate = DefaultPredicate::new().and(NotForContentType::const_new("application/zip"));
    CompressionLayer::new().gzip(true).compress_when(predicate)
}
