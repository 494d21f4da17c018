//! Route geometry as an encoded polyline (precision 5), the format OSRM
//! and most routing providers return. The encoded string doubles as a
//! route's identity token.

use crate::error::{NavError, Result};
use crate::geo::Coordinate;

const PRECISION: u32 = 5;

pub fn decode(encoded: &str) -> Result<Vec<Coordinate>> {
    let line = polyline::decode_polyline(encoded, PRECISION).map_err(|e| NavError::Polyline {
        message: e.to_string(),
    })?;
    Ok(line.coords().map(|c| Coordinate::from(*c)).collect())
}

pub fn encode(points: &[Coordinate]) -> Result<String> {
    polyline::encode_coordinates(points.iter().map(|p| ::geo::Coord::from(*p)), PRECISION).map_err(|e| {
        NavError::Polyline {
            message: e.to_string(),
        }
    })
}
