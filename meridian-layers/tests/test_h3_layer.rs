use std::sync::Arc;

use float_cmp::assert_approx_eq;
use meridian_common::{
    dataset::Dataset,
    value::{Attribute, FieldValue, Rgb},
};
use meridian_layers::{
    columns::{find_default_columns, AccessorResolver, Geometry},
    config::{ChannelConfig, LayerConfig},
    error::LayerError,
    format::{Accessor, LayerDataFormatter},
    layer::{AccessorKey, LayerType},
};
use meridian_scales::resolver::{ScaleResolver, ScaleType};
use rstest::rstest;

mod utils;
use utils::hex_id_dataset;

fn h3_config(dataset: &Dataset) -> LayerConfig {
    let columns = find_default_columns(LayerType::H3, dataset.fields())
        .pop()
        .unwrap();
    let value = dataset.field_by_name("value").unwrap().clone();
    LayerConfig::new("h3-hex-id", LayerType::H3, columns)
        .with_color(Rgb::new(241, 92, 23))
        .with_color_channel(ChannelConfig::new(value, ScaleType::Quantile))
}

#[test]
fn test_quantile_color_from_domain_index() -> Result<(), LayerError> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    // Rows with a value inside [11.2, 28]
    let dataset = hex_id_dataset().with_filtered_index_for_domain(vec![9, 11, 12, 13])?;
    let layer_data =
        LayerDataFormatter::default().format(&dataset, &h3_config(&dataset), None, &Default::default())?;

    assert_eq!(
        layer_data.keys(),
        vec!["data", "getHexId", "getFillColor", "getElevation", "getCoverage"]
    );
    assert_eq!(layer_data.data.len(), 15);
    assert_eq!(
        layer_data
            .get(AccessorKey::GetHexId)
            .and_then(|a| a.geometry(&layer_data.data[0])),
        Some(&Geometry::Token("89283082c2fffff".to_string()))
    );
    assert_eq!(
        layer_data.get(AccessorKey::GetCoverage),
        Some(&Accessor::Constant(Attribute::Number(1.0)))
    );
    assert_eq!(
        layer_data.get(AccessorKey::GetElevation),
        Some(&Accessor::Constant(Attribute::Number(0.0)))
    );

    let fill = layer_data.get(AccessorKey::GetFillColor).unwrap();
    let color_of = |index: usize| fill.encode(&layer_data.data[index]);
    // Breakpoints [19, 26, 27] over the domain values 18, 19, 26, 27
    assert_eq!(color_of(13), Some(Attribute::Color(Rgb::new(0x5a, 0x18, 0x46))));
    assert_eq!(color_of(12), Some(Attribute::Color(Rgb::new(0x90, 0x0c, 0x3f))));
    assert_eq!(color_of(11), Some(Attribute::Color(Rgb::new(0xc7, 0x00, 0x39))));
    assert_eq!(color_of(9), Some(Attribute::Color(Rgb::new(0xe3, 0x61, 0x1c))));
    assert_eq!(color_of(0), Some(Attribute::Color(Rgb::new(0xe3, 0x61, 0x1c))));
    assert_eq!(color_of(14), Some(Attribute::Color(Rgb::new(0x5a, 0x18, 0x46))));
    Ok(())
}

#[test]
fn test_coverage_from_field() -> Result<(), LayerError> {
    let mut rows: Vec<Vec<FieldValue>> = hex_id_dataset()
        .rows()
        .iter()
        .map(|row| row.to_vec())
        .collect();
    rows[2][1] = FieldValue::Null;
    let dataset = Dataset::try_new("h3-hex-id", hex_id_dataset().fields().to_vec(), rows)?;
    let value = dataset.field_by_name("value").unwrap().clone();
    let mut config =
        h3_config(&dataset).with_coverage_channel(ChannelConfig::new(value, ScaleType::Linear));
    config.vis_config.coverage = 0.5;
    config.vis_config.coverage_range = [0.2, 1.0];

    let (accessors, scales) = (AccessorResolver::default(), ScaleResolver::default());
    let layer_data = LayerDataFormatter::new(&accessors, &scales).format(
        &dataset,
        &config,
        None,
        &Default::default(),
    )?;
    let coverage = layer_data.get(AccessorKey::GetCoverage).unwrap();
    assert!(matches!(coverage, Accessor::Encoded { field_idx: 1, .. }));

    // Domain [1, 76]
    let coverage_of =
        |index: usize| coverage.encode(&layer_data.data[index]).and_then(|a| a.as_f64());
    assert_approx_eq!(f64, coverage_of(14).unwrap(), 0.2, epsilon = 1e-9);
    assert_approx_eq!(f64, coverage_of(5).unwrap(), 1.0, epsilon = 1e-9);
    assert_approx_eq!(
        f64,
        coverage_of(0).unwrap(),
        0.2 + 0.8 * 63.0 / 75.0,
        epsilon = 1e-9
    );
    assert_eq!(coverage_of(2), Some(0.5));
    Ok(())
}

#[test]
fn test_format_is_idempotent() -> Result<(), LayerError> {
    let (accessors, scales) = (AccessorResolver::default(), ScaleResolver::default());
    let formatter = LayerDataFormatter::new(&accessors, &scales);
    let dataset = hex_id_dataset().with_filtered_index(vec![0, 3, 5, 9])?;
    let config = h3_config(&dataset);

    let first = formatter.format(&dataset, &config, None, &Default::default())?;
    let second = formatter.format(&dataset, &config, None, &Default::default())?;
    assert_eq!(first, second);
    assert!(!Arc::ptr_eq(&first.data, &second.data));
    assert_eq!(scales.len(), 1);
    assert_eq!(accessors.len(), 1);
    Ok(())
}

#[rstest]
#[case(vec![0, 1, 2, 3], vec![0, 2])]
#[case(vec![1, 3], vec![])]
#[case(vec![2], vec![2])]
fn test_null_ids_are_dropped(
    #[case] filtered_index: Vec<usize>,
    #[case] expected: Vec<usize>,
) -> Result<(), LayerError> {
    let mut rows: Vec<Vec<FieldValue>> = hex_id_dataset()
        .rows()
        .iter()
        .map(|row| row.to_vec())
        .collect();
    rows[1][0] = FieldValue::Null;
    rows[3][0] = FieldValue::from("");
    let dataset = Dataset::try_new("h3-hex-id", hex_id_dataset().fields().to_vec(), rows)?
        .with_filtered_index(filtered_index)?;

    let layer_data =
        LayerDataFormatter::default().format(&dataset, &h3_config(&dataset), None, &Default::default())?;
    let indices: Vec<usize> = layer_data.data.iter().map(|d| d.index).collect();
    assert_eq!(indices, expected);
    Ok(())
}

#[test]
fn test_unknown_scale_type_is_reported() {
    let json = r#"{
        "dataId": "h3-hex-id",
        "type": "h3",
        "colorChannel": {"field": {"name": "value", "type": "integer", "index": 1}, "scale": "radial"}
    }"#;
    assert!(serde_json::from_str::<LayerConfig>(json).is_err());

    let err = ScaleType::parse("radial").map_err(LayerError::from).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Scale error: Unknown scale type: `radial`"
    );
}
