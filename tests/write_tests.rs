use std::io::Read;

use nwb::prelude::*;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn basic_session() -> (Registry, ContainerId) {
    let mut reg = Registry::new();
    let file = reg.create_file("test.nwb", "test");
    (reg, file)
}

#[test]
fn test_write_fixed_layout() -> Result<()> {
    init_logging();
    let (reg, file) = basic_session();

    let mut writer = Writer::new(MemBackend::new());
    writer.write(&reg, file, "test.nwb")?;

    let backend = writer.into_backend();
    let written = backend.file("test.nwb").unwrap();
    for path in [
        "general/devices",
        "general/extracellular_ephys",
        "general/intracellular_ephys",
        "general/optogenetics",
        "general/optophysiology",
        "general/specifications",
        "general/subject",
        "stimulus/template",
        "stimulus/presentation",
        "acquisition/timeseries",
        "acquisition/images",
        "epochs",
        "processing",
        "analysis",
    ] {
        assert!(written.node_at(path).is_some(), "missing fixed group {path}");
    }

    assert_eq!(written.dataset("nwb_version"), Some(&Value::Str("NWB-1.0.4".to_string())));
    assert_eq!(written.dataset("session_description"), Some(&Value::Str("test".to_string())));
    match written.dataset("identifier") {
        Some(Value::Str(id)) => assert!(id.starts_with("test.nwb ")),
        other => panic!("bad identifier: {other:?}"),
    }
    match written.dataset("file_create_date") {
        Some(Value::StrList(dates)) => assert_eq!(dates.len(), 1),
        other => panic!("bad file_create_date: {other:?}"),
    }
    assert!(written.dataset("session_start_time").is_some());
    Ok(())
}

#[test]
fn test_write_electrical_series() -> Result<()> {
    let (mut reg, file) = basic_session();
    reg.add_raw_timeseries(
        file,
        TimeSeries::new("series1", "acquisition system")
            .with_data(vec![0.5; 100])
            .with_rate(0.0, 1.0)
            .with_unit("Volts")
            .electrical(vec![0, 1, 2, 3]),
    )?;

    let mut writer = Writer::new(MemBackend::new());
    writer.write(&reg, file, "test.nwb")?;

    let backend = writer.into_backend();
    let written = backend.file("test.nwb").unwrap();
    let base = "acquisition/timeseries/series1";

    assert_eq!(written.dataset(&format!("{base}/data")), Some(&Value::FloatList(vec![0.5; 100])));
    assert_eq!(
        written.attribute(&format!("{base}/data"), "unit"),
        Some(&Value::Str("Volts".to_string()))
    );
    assert_eq!(
        written.attribute(&format!("{base}/data"), "conversion"),
        Some(&Value::Float(1.0))
    );
    assert_eq!(written.dataset(&format!("{base}/starting_time")), Some(&Value::Float(0.0)));
    assert_eq!(
        written.attribute(&format!("{base}/starting_time"), "rate"),
        Some(&Value::Float(1.0))
    );
    assert_eq!(
        written.dataset(&format!("{base}/electrode_idx")),
        Some(&Value::IntList(vec![0, 1, 2, 3]))
    );
    assert_eq!(
        written.attribute(base, "ancestry"),
        Some(&Value::StrList(vec!["TimeSeries".to_string(), "ElectricalSeries".to_string()]))
    );
    assert_eq!(
        written.attribute(base, "neurodata_type"),
        Some(&Value::Str("TimeSeries".to_string()))
    );
    Ok(())
}

#[test]
fn test_epoch_interval_indexing() -> Result<()> {
    let (mut reg, file) = basic_session();
    reg.add_raw_timeseries(
        file,
        TimeSeries::new("series1", "acquisition system")
            .with_data(vec![0.0; 100])
            .with_rate(0.0, 1.0)
            .with_unit("Volts")
            .electrical(vec![0]),
    )?;
    reg.create_epoch(file, "ep1", 10.0, 20.0, vec!["stim".to_string()], None)?;
    reg.set_epoch_timeseries(file, &["ep1"], &["series1"])?;

    let mut writer = Writer::new(MemBackend::new());
    writer.write(&reg, file, "test.nwb")?;

    let backend = writer.into_backend();
    let written = backend.file("test.nwb").unwrap();

    assert_eq!(written.dataset("epochs/ep1/start_time"), Some(&Value::Float(10.0)));
    assert_eq!(written.dataset("epochs/ep1/stop_time"), Some(&Value::Float(20.0)));
    assert_eq!(
        written.dataset("epochs/ep1/tags"),
        Some(&Value::StrList(vec!["stim".to_string()]))
    );
    assert_eq!(written.dataset("epochs/ep1/series1/idx_start"), Some(&Value::Int(10)));
    assert_eq!(written.dataset("epochs/ep1/series1/count"), Some(&Value::Int(11)));
    assert_eq!(
        written.soft_link_target("epochs/ep1/series1/timeseries"),
        Some("acquisition/timeseries/series1")
    );
    Ok(())
}

#[test]
fn test_epoch_with_no_overlap() -> Result<()> {
    let (mut reg, file) = basic_session();
    reg.add_raw_timeseries(
        file,
        TimeSeries::new("series1", "src").with_data(vec![0.0; 10]).with_rate(0.0, 1.0),
    )?;
    reg.create_epoch(file, "late", 100.0, 200.0, vec![], None)?;
    reg.set_epoch_timeseries(file, &["late"], &["series1"])?;

    let mut writer = Writer::new(MemBackend::new());
    writer.write(&reg, file, "test.nwb")?;

    let backend = writer.into_backend();
    let written = backend.file("test.nwb").unwrap();
    assert_eq!(written.dataset("epochs/late/series1/count"), Some(&Value::Int(0)));
    Ok(())
}

#[test]
fn test_duplicate_series_name_before_backend_io() {
    let (mut reg, file) = basic_session();
    reg.add_raw_timeseries(file, TimeSeries::new("series1", "src")).unwrap();
    let err = reg.add_raw_timeseries(file, TimeSeries::new("series1", "src")).unwrap_err();
    assert!(matches!(err, Error::DuplicateName(name) if name == "series1"));

    // Nothing reached the backend.
    let writer = Writer::new(MemBackend::new());
    assert!(writer.backend().is_empty());
}

#[test]
fn test_data_link_within_one_file() -> Result<()> {
    let (mut reg, file) = basic_session();
    let series1 = reg.add_raw_timeseries(
        file,
        TimeSeries::new("series1", "src").with_data(vec![1.0, 2.0, 3.0]).with_rate(0.0, 1.0),
    )?;
    reg.add_raw_timeseries(
        file,
        TimeSeries::new("series2", "src").with_data_link(series1).with_rate(0.0, 1.0),
    )?;

    let mut writer = Writer::new(MemBackend::new());
    writer.write(&reg, file, "test.nwb")?;

    let backend = writer.into_backend();
    let written = backend.file("test.nwb").unwrap();
    assert_eq!(
        written.soft_link_target("acquisition/timeseries/series2/data"),
        Some("acquisition/timeseries/series1/data")
    );
    Ok(())
}

#[test]
fn test_data_link_across_files() -> Result<()> {
    let mut reg = Registry::new();
    let file_a = reg.create_file("a.nwb", "first session");
    let file_b = reg.create_file("b.nwb", "second session");
    let origin = reg.add_raw_timeseries(
        file_a,
        TimeSeries::new("origin", "src").with_data(vec![1.0; 5]).with_rate(0.0, 1.0),
    )?;
    reg.add_stimulus(
        file_b,
        TimeSeries::new("replayed", "src").with_data_link(origin).with_rate(0.0, 1.0),
    )?;

    let mut writer = Writer::new(MemBackend::new());
    writer.write(&reg, file_b, "b.nwb")?;

    let backend = writer.into_backend();
    let written = backend.file("b.nwb").unwrap();
    assert_eq!(
        written.external_link_target("stimulus/presentation/replayed/data"),
        Some(("a.nwb", "acquisition/timeseries/origin/data"))
    );
    Ok(())
}

#[test]
fn test_processing_module_with_clustering() -> Result<()> {
    let (mut reg, file) = basic_session();
    let module = reg.create_processing_module(file, "shank1", "spike sorting output")?;
    let mut ratios = std::collections::BTreeMap::new();
    ratios.insert(2i64, 4.5);
    ratios.insert(0i64, 3.2);
    reg.add_interface(
        module,
        Interface::clustering("klustakwik", ratios, vec![10, 4], vec![0.01, 0.02, 0.5]),
    )?;

    let mut writer = Writer::new(MemBackend::new());
    writer.write(&reg, file, "test.nwb")?;

    let backend = writer.into_backend();
    let written = backend.file("test.nwb").unwrap();
    let base = "processing/shank1/Clustering";

    // Cluster numbers sorted, ratios aligned.
    assert_eq!(written.dataset(&format!("{base}/cluster_nums")), Some(&Value::IntList(vec![0, 2])));
    assert_eq!(
        written.dataset(&format!("{base}/peak_over_rms")),
        Some(&Value::FloatList(vec![3.2, 4.5]))
    );
    assert_eq!(written.dataset(&format!("{base}/num")), Some(&Value::IntList(vec![10, 4])));
    assert_eq!(
        written.attribute(base, "neurodata_type"),
        Some(&Value::Str("Interface".to_string()))
    );
    assert_eq!(
        written.attribute("processing/shank1", "interfaces"),
        Some(&Value::StrList(vec!["Clustering".to_string()]))
    );
    Ok(())
}

#[test]
fn test_electrode_groups_and_general_metadata() -> Result<()> {
    let (mut reg, file) = basic_session();
    reg.file_mut(file).unwrap().experimenter = Some("A. Jones".to_string());
    reg.file_mut(file).unwrap().lab = Some("systems neuro lab".to_string());
    for name in ["g0", "g1", "g2"] {
        reg.create_electrode_group(
            file,
            ElectrodeGroup::new(name, [0.1, 0.2, 0.3], "tetrode", "probe A", "CA1")
                .with_impedance(Impedance::Range(1.0e6, 2.0e6)),
        )?;
    }
    assert_eq!(reg.get_electrode_group_idx(file, "g2"), Some(2));

    let mut writer = Writer::new(MemBackend::new());
    writer.write(&reg, file, "test.nwb")?;

    let backend = writer.into_backend();
    let written = backend.file("test.nwb").unwrap();
    assert_eq!(
        written.dataset("general/extracellular_ephys/g1/location"),
        Some(&Value::Str("CA1".to_string()))
    );
    assert_eq!(
        written.dataset("general/extracellular_ephys/g1/impedance"),
        Some(&Value::FloatList(vec![1.0e6, 2.0e6]))
    );
    assert_eq!(written.dataset("general/experimenter"), Some(&Value::Str("A. Jones".to_string())));
    assert_eq!(
        written.dataset("general/lab"),
        Some(&Value::Str("systems neuro lab".to_string()))
    );
    Ok(())
}

#[test]
fn test_json_dump_roundtrip() -> Result<()> {
    let (mut reg, file) = basic_session();
    reg.add_raw_timeseries(
        file,
        TimeSeries::new("series1", "src").with_data(vec![1.0, 2.0]).with_rate(0.0, 1.0),
    )?;

    let mut writer = Writer::new(MemBackend::new());
    writer.write(&reg, file, "test.nwb")?;
    let backend = writer.into_backend();
    let written = backend.file("test.nwb").unwrap();

    let mut tmp = tempfile::NamedTempFile::new()?;
    written.dump(&mut tmp)?;

    let mut contents = String::new();
    tmp.reopen()?.read_to_string(&mut contents)?;
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed["children"]["acquisition"]["children"]["timeseries"]["children"]["series1"]
            ["children"]["data"]["type"],
        "dataset"
    );
    Ok(())
}
