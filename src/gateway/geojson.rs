//! GeoJSON encoding shared by every geometry-bearing endpoint.

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::dataset::Shape;

pub fn point_feature(lon: f64, lat: f64, properties: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn linestring_feature(shape: &Shape, properties: Map<String, JsonValue>) -> Feature {
    let coords = shape.points.iter().map(|p| vec![p.lon, p.lat]).collect();
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coords))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
