use serde::Serialize;

use crate::error::LocatorError;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocatorError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(LocatorError::InvalidCoordinate {
                latitude: Some(latitude),
                longitude: Some(longitude),
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Store rows carry nullable columns; both halves must be present.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, LocatorError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            _ => Err(LocatorError::InvalidCoordinate {
                latitude,
                longitude,
            }),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(36.7538, 3.0588).is_ok());
    }

    #[test]
    fn rejects_out_of_range_and_non_finite() {
        assert!(Coordinate::new(90.5, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.1).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn missing_half_is_invalid() {
        let err = Coordinate::from_parts(Some(36.0), None).unwrap_err();
        assert!(matches!(
            err,
            LocatorError::InvalidCoordinate {
                latitude: Some(_),
                longitude: None
            }
        ));
        assert!(Coordinate::from_parts(None, None).is_err());
        assert!(Coordinate::from_parts(Some(36.0), Some(3.0)).is_ok());
    }
}
