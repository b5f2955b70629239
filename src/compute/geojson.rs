//! GeoJSON export of tile and territory outlines.
//!
//! Coordinates are emitted in GeoJSON order (lng, lat), one closed ring per
//! tile.

use crate::compute::grid::Cell;
use crate::error::{ClaimError, Result};
use geoclaim_types::{GridKey, Territory, Tile};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value, feature::Id};
use serde_json::json;

/// Closed ring for one tile.
fn tile_ring(key: &GridKey) -> Result<Vec<Vec<f64>>> {
    let corners = Cell::from_key(key.as_str())?.bounds();
    let mut ring: Vec<Vec<f64>> = corners.iter().map(|(lat, lng)| vec![*lng, *lat]).collect();
    ring.push(vec![corners[0].1, corners[0].0]);
    Ok(ring)
}

/// Outline of a single tile as a GeoJSON polygon.
pub fn tile_geometry(key: &GridKey) -> Result<Geometry> {
    Ok(Geometry::new(Value::Polygon(vec![tile_ring(key)?])))
}

pub fn tile_to_feature(tile: &Tile) -> Result<Feature> {
    let mut properties = JsonObject::new();
    properties.insert("owner_id".to_string(), json!(tile.owner_id));
    properties.insert("owner_name".to_string(), json!(tile.owner_name));
    properties.insert("owner_color".to_string(), json!(tile.owner_color));
    properties.insert("claimed_at".to_string(), json!(tile.claimed_at));

    Ok(Feature {
        bbox: None,
        geometry: Some(tile_geometry(&tile.key)?),
        id: Some(Id::String(tile.key.to_string())),
        properties: Some(properties),
        foreign_members: None,
    })
}

/// A territory as a multipolygon of its enclosed tiles.
pub fn territory_to_feature(territory: &Territory) -> Result<Feature> {
    let polygons = territory
        .enclosed
        .iter()
        .map(|key| tile_ring(key).map(|ring| vec![ring]))
        .collect::<Result<Vec<_>>>()?;

    let mut properties = JsonObject::new();
    properties.insert("owner_id".to_string(), json!(territory.owner_id));
    properties.insert("owner_name".to_string(), json!(territory.owner_name));
    properties.insert("owner_color".to_string(), json!(territory.owner_color));
    properties.insert("captured_at".to_string(), json!(territory.captured_at));
    properties.insert("active".to_string(), json!(territory.active));
    properties.insert("perimeter".to_string(), json!(territory.perimeter));

    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::MultiPolygon(polygons))),
        id: Some(Id::String(territory.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Serializes tiles as a GeoJSON FeatureCollection.
pub fn tiles_to_geojson(tiles: &[Tile]) -> Result<String> {
    let features = tiles
        .iter()
        .map(tile_to_feature)
        .collect::<Result<Vec<_>>>()?;

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    serde_json::to_string(&collection)
        .map_err(|e| ClaimError::Serialization(format!("Failed to serialize tiles: {}", e)))
}

/// Reads the tile key back out of a feature produced by [`tile_to_feature`].
pub fn tile_key_from_feature(feature: &Feature) -> Result<GridKey> {
    let Some(Id::String(raw)) = &feature.id else {
        return Err(ClaimError::InvalidInput(
            "Feature has no string id".to_string(),
        ));
    };
    Ok(Cell::from_key(raw)?.key())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(key: &str) -> Tile {
        let (lat, lng) = crate::compute::grid::parse_key(key).unwrap();
        Tile {
            key: GridKey::from(key),
            owner_id: "alice".to_string(),
            owner_color: "#00ff00".to_string(),
            owner_name: "Alice".to_string(),
            claimed_at: 1_700_000_000_000,
            geohash: String::new(),
            lat,
            lng,
        }
    }

    #[test]
    fn test_tile_geometry_is_closed_ring() {
        let geom = tile_geometry(&GridKey::from("10.0000,20.0000")).unwrap();
        let Value::Polygon(rings) = geom.value else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[0][0], vec![20.0, 10.0]);
        assert_eq!(rings[0][0], rings[0][4]);
    }

    #[test]
    fn test_tiles_to_geojson() {
        let json = tiles_to_geojson(&[tile("1.0000,2.0000"), tile("1.0001,2.0000")]).unwrap();
        let parsed: FeatureCollection = json.parse::<geojson::GeoJson>().unwrap().try_into().unwrap();
        assert_eq!(parsed.features.len(), 2);
        assert_eq!(
            tile_key_from_feature(&parsed.features[1]).unwrap().as_str(),
            "1.0001,2.0000"
        );
    }

    #[test]
    fn test_malformed_key_fails() {
        assert!(tile_geometry(&GridKey::from("nope")).is_err());
    }

    #[test]
    fn test_territory_feature() {
        let territory = Territory {
            id: "t-1".to_string(),
            owner_id: "alice".to_string(),
            owner_name: "Alice".to_string(),
            owner_color: "#00ff00".to_string(),
            perimeter: vec![GridKey::from("0.0001,0.0000")],
            enclosed: vec![GridKey::from("0.0000,0.0000"), GridKey::from("0.0000,0.0001")],
            captured_at: 5,
            active: true,
        };
        let feature = territory_to_feature(&territory).unwrap();
        let Some(Geometry { value: Value::MultiPolygon(polys), .. }) = feature.geometry else {
            panic!("expected multipolygon");
        };
        assert_eq!(polys.len(), 2);
        assert_eq!(feature.properties.unwrap()["active"], json!(true));
    }
}
