#![allow(dead_code)]

use meridian_common::{
    dataset::{Dataset, Field, FieldType, FilterRange, RenderFilter},
    value::FieldValue,
};

pub fn s2_fields() -> Vec<Field> {
    vec![
        Field::new("token", FieldType::String, 0),
        Field::new("value", FieldType::Real, 1),
    ]
}

/// S2 rows, the first two without a token
pub fn s2_rows() -> Vec<Vec<FieldValue>> {
    vec![
        vec![FieldValue::Null, 12345.into()],
        vec![FieldValue::Null, 3456.into()],
        vec!["80858004".into(), 0.5979851.into()],
        vec!["8085800c".into(), 0.5446577.into()],
        vec!["80858014".into(), 0.1187031.into()],
        vec!["8085801c".into(), 0.2859463.into()],
        vec!["80858024".into(), 0.1551041.into()],
    ]
}

pub fn hex_id_dataset() -> Dataset {
    let values = [
        ("89283082c2fffff", 64),
        ("8928308288fffff", 73),
        ("89283082c07ffff", 65),
        ("89283082817ffff", 74),
        ("89283082c3bffff", 66),
        ("89283082883ffff", 76),
        ("89283082c33ffff", 43),
        ("89283082c23ffff", 40),
        ("89283082887ffff", 36),
        ("89283082ca7ffff", 27),
        ("89283082cb3ffff", 32),
        ("89283082c0bffff", 26),
        ("89283082ca3ffff", 19),
        ("89283082dcfffff", 18),
        ("89283082d8fffff", 1),
    ];
    let rows = values
        .iter()
        .map(|(hex_id, value)| vec![FieldValue::from(*hex_id), FieldValue::from(*value)])
        .collect();
    Dataset::try_new(
        "h3-hex-id",
        vec![
            Field::new("hex_id", FieldType::String, 0),
            Field::new("value", FieldType::Integer, 1),
        ],
        rows,
    )
    .unwrap()
}

pub const TIMESTAMP: usize = 0;
pub const LAT: usize = 1;
pub const LNG: usize = 2;
pub const TYPES: usize = 3;
pub const TRIP_DISTANCE: usize = 4;

pub fn gps_fields() -> Vec<Field> {
    vec![
        Field::new("gps_data.utc_timestamp", FieldType::Timestamp, TIMESTAMP),
        Field::new("gps_data.lat", FieldType::Real, LAT),
        Field::new("gps_data.lng", FieldType::Real, LNG),
        Field::new("gps_data.types", FieldType::String, TYPES),
        Field::new("trip_distance", FieldType::Real, TRIP_DISTANCE),
    ]
}

fn gps_row(
    timestamp: Option<i64>,
    lat: Option<f64>,
    lng: Option<f64>,
    types: Option<&str>,
    trip_distance: f64,
) -> Vec<FieldValue> {
    vec![
        timestamp.into(),
        lat.into(),
        lng.into(),
        types.into(),
        trip_distance.into(),
    ]
}

/// GPS points with a render filter on the timestamp field.
///
/// Rows 0 and 1 fall outside the filter, row 2 has no position and rows 3 and 6 are
/// filtered out by the row-level index.
pub fn gps_dataset() -> Dataset {
    let rows = vec![
        gps_row(None, Some(29.9900937), Some(31.2590542), Some("driver_analytics_0"), 1.59),
        gps_row(Some(1474071056000), Some(29.9927699), Some(31.2461142), None, 2.38),
        gps_row(Some(1474071116000), None, None, Some("driver_analytics"), 3.01),
        gps_row(Some(1474071178000), Some(29.9870074), Some(31.2175827), Some("driver_gps"), 0.86),
        gps_row(Some(1474071240000), Some(29.9783746), Some(31.2366058), Some("driver_analytics"), 2.37),
        gps_row(Some(1474071301000), Some(29.9803255), Some(31.2307304), Some("driver_analytics"), 7.13),
        gps_row(Some(1474071363000), Some(29.9822185), Some(31.2331213), Some("driver_gps"), 4.4),
        gps_row(Some(1474071425000), Some(29.9910468), Some(31.2441483), Some("driver_analytics"), 11.0),
    ];
    Dataset::try_new("gps", gps_fields(), rows)
        .and_then(|d| d.with_filtered_index(vec![0, 1, 2, 4, 5, 7]))
        .unwrap()
        .with_render_filter(RenderFilter::new(vec![FilterRange {
            field_idx: TIMESTAMP,
            min: 1474071095000.0,
            max: 1474071608000.0,
        }]))
}
