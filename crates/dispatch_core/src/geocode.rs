//! Address resolution with a deterministic hash fallback.

use log::warn;
use sha2::{Digest, Sha256};

use crate::error::GeocodeError;
use crate::spatial::Point;

/// Maps a free-text address to a coordinate pair. Implementations must be
/// stable for a given input string.
pub trait AddressResolver: Send + Sync {
    fn resolve(&self, address: &str) -> Result<Point, GeocodeError>;
}

/// Deterministic fallback resolver: derives a stable (x, y) in 0.0–9.9 from
/// a digest of the address text.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashGeocoder;

impl AddressResolver for HashGeocoder {
    fn resolve(&self, address: &str) -> Result<Point, GeocodeError> {
        if address.is_empty() {
            return Ok(Point::new(0.0, 0.0));
        }
        let digest = Sha256::digest(address.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        let h = u64::from_be_bytes(bytes);
        let x = (h % 100) as f64 / 10.0;
        let y = ((h / 100) % 100) as f64 / 10.0;
        Ok(Point::new(x, y))
    }
}

/// Resolves through `resolver`, falling back to [HashGeocoder] when the
/// resolver fails or is unreachable.
pub fn resolve_or_fallback(resolver: &dyn AddressResolver, address: &str) -> Point {
    match resolver.resolve(address) {
        Ok(point) => point,
        Err(err) => {
            warn!("geocoder failed for {address:?} ({err}), using hash fallback");
            HashGeocoder
                .resolve(address)
                .unwrap_or(Point::new(0.0, 0.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_is_stable_for_a_given_address() {
        let a = HashGeocoder.resolve("Calle Gran Via, 28013, Madrid");
        let b = HashGeocoder.resolve("Calle Gran Via, 28013, Madrid");
        assert_eq!(a.expect("point"), b.expect("point"));
    }

    #[test]
    fn distinct_addresses_usually_map_apart() {
        let a = HashGeocoder.resolve("Plaza Mayor").expect("point");
        let b = HashGeocoder.resolve("Calle Serrano").expect("point");
        assert_ne!(a, b);
    }

    #[test]
    fn coordinates_stay_on_the_grid() {
        for address in ["a", "b", "Paseo de la Castellana, 28046", "x y z"] {
            let point = HashGeocoder.resolve(address).expect("point");
            assert!((0.0..10.0).contains(&point.x));
            assert!((0.0..10.0).contains(&point.y));
        }
    }

    #[test]
    fn empty_address_maps_to_origin() {
        assert_eq!(HashGeocoder.resolve("").expect("point"), Point::new(0.0, 0.0));
    }

    struct DownResolver;

    impl AddressResolver for DownResolver {
        fn resolve(&self, _address: &str) -> Result<Point, GeocodeError> {
            Err(GeocodeError::Unreachable("connection refused".to_string()))
        }
    }

    #[test]
    fn unreachable_resolver_falls_back_to_the_hash() {
        let direct = HashGeocoder.resolve("Plaza de Espana").expect("point");
        let fallback = resolve_or_fallback(&DownResolver, "Plaza de Espana");
        assert_eq!(direct, fallback);
    }
}
