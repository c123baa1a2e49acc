use camino::Utf8PathBuf;
use nmlpack::neuron::{
    ALL_SEGMENTS, MechanismReport, NeuronEngine, SectionMorphology, UTILS_HOC, extract_payload,
    write_utils_hoc,
};
use std::fs;
use tempfile::tempdir;

fn utf8_dir(tmp: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap()
}

#[test]
fn hoc_files_are_validated_on_load() {
    let tmp = tempdir().unwrap();
    let dir = utf8_dir(&tmp);

    let hoc = dir.join("olm.hoc");
    fs::write(hoc.as_std_path(), "print \"cell template\"").unwrap();
    let py = dir.join("olm.py");
    fs::write(py.as_std_path(), "print('cell template')").unwrap();

    let mut engine = NeuronEngine::new();
    engine.load_hoc_file(&hoc).unwrap();

    let err = engine.load_hoc_file(&py).unwrap_err();
    assert!(err.to_string().contains("not supported"), "got: {}", err);

    let err = engine.load_hoc_file(dir.join("model.mod")).unwrap_err();
    assert!(err.to_string().contains("Not a hoc file"), "got: {}", err);

    let err = engine.load_hoc_file(dir.join("nosuch.hoc")).unwrap_err();
    assert!(err.to_string().contains("not found"), "got: {}", err);
}

#[test]
fn morphology_script_contains_setup_and_query() {
    let tmp = tempdir().unwrap();
    let dir = utf8_dir(&tmp);
    let hoc = dir.join("olm.hoc");
    fs::write(hoc.as_std_path(), "").unwrap();

    let mut engine = NeuronEngine::new();
    engine.load_hoc_file(&hoc).unwrap();
    engine.exec("objectvar acell");
    engine.exec("acell = new olm()");

    let script = engine.morphology_script(Some("olm[0].axon_0"));
    assert!(script.contains("proc nmlpack_morphjson()"));
    assert!(script.contains(&format!("load_file(\"{}\")", hoc)));
    let load_pos = script.find("load_file").unwrap();
    let exec_pos = script.find("acell = new olm()").unwrap();
    let query_pos = script.find("olm[0].axon_0 { nmlpack_morphjson() }").unwrap();
    assert!(load_pos < exec_pos && exec_pos < query_pos);
    assert!(script.trim_end().ends_with("quit()"));

    // Without a section the currently accessed section is queried.
    let script = engine.morphology_script(None);
    assert!(script.contains("\nnmlpack_morphjson()\n"));
}

#[test]
fn mechanisms_script_uses_the_mechanism_emitter() {
    let engine = NeuronEngine::new();
    let script = engine.mechanisms_script();
    assert!(script.contains("proc nmlpack_mechjson()"));
    assert!(script.contains("\nnmlpack_mechjson()\n"));
}

#[test]
fn payload_is_extracted_between_markers() {
    let stdout = "NEURON banner noise\nNMLPACK-JSON-BEGIN\n{\"nsegs\": 1}\nNMLPACK-JSON-END\ntrailing\n";
    assert_eq!(extract_payload(stdout).unwrap(), "{\"nsegs\": 1}");

    let err = extract_payload("no markers at all").unwrap_err();
    assert!(err.to_string().contains("marker"), "got: {}", err);

    let err = extract_payload("NMLPACK-JSON-BEGIN\n{unterminated").unwrap_err();
    assert!(err.to_string().contains("marker"), "got: {}", err);
}

#[test]
fn morphology_payload_parses_into_typed_report() {
    // Shape emitted by nmlpack_morphjson() in utils.hoc.
    let payload = r#"{"section": "olm[0].soma_0", "nsegs": 1, "n3d": 3, "points": [
        {"x": 0, "y": 0, "z": 0, "diam": 10},
        {"x": 0, "y": 10, "z": 0, "diam": 10},
        {"x": 0, "y": 20, "z": 0, "diam": 10}]}"#;
    let morph: SectionMorphology = serde_json::from_str(payload).unwrap();
    assert_eq!(morph.section, "olm[0].soma_0");
    assert_eq!(morph.nsegs, 1);
    assert_eq!(morph.n3d, 3);
    assert_eq!(morph.points.len(), 3);
    assert_eq!(morph.points[0].diam, 10.0);
    assert_eq!(morph.points[2].y, 20.0);
}

#[test]
fn mechanism_payload_parses_into_typed_report() {
    // Shape emitted by nmlpack_mechjson() in utils.hoc.
    let payload = r#"{"mechanisms": {
        "KvAolm": {"parameters": {"gmax_KvAolm": {
            "olm[0].soma_0": {"*": 0.00495},
            "olm[0].dend_0": {"*": 0.0028}}}},
        "leak_chan": {"parameters": {"gmax_leak_chan": {
            "olm[0].soma_0": {"*": 1e-05},
            "olm[0].axon_0": {"0.25": 1e-05, "0.75": 2e-05}}}}}}"#;
    let report: MechanismReport = serde_json::from_str(payload).unwrap();

    assert_eq!(
        report.value("KvAolm", "gmax_KvAolm", "olm[0].soma_0", ALL_SEGMENTS),
        Some(0.00495)
    );
    assert_eq!(
        report.value("leak_chan", "gmax_leak_chan", "olm[0].axon_0", "0.75"),
        Some(2e-5)
    );
    assert_eq!(report.value("Nav", "gmax_Nav", "olm[0].axon_0", "*"), None);

    let text = report.render_text();
    assert!(text.contains("KvAolm:"));
    assert!(text.contains("olm[0].soma_0: 0.00495 (all segments)"));
    assert!(text.contains("at 0.75: 0.00002"));
}

#[test]
fn bundled_utils_hoc_can_be_written_out() {
    let tmp = tempdir().unwrap();
    let dir = utf8_dir(&tmp);

    let path = write_utils_hoc(&dir).unwrap();
    assert_eq!(path, dir.join("utils.hoc"));
    assert_eq!(fs::read_to_string(path.as_std_path()).unwrap(), UTILS_HOC);
    assert!(UTILS_HOC.contains("proc nmlpack_morphjson()"));
    assert!(UTILS_HOC.contains("proc nmlpack_mechjson()"));
}

#[test]
fn missing_nrniv_surfaces_a_spawn_error() {
    let engine = NeuronEngine::new().with_executable("/nonexistent/nrniv");
    let err = engine.morphology(None).unwrap_err();
    assert!(err.to_string().contains("nrniv"), "got: {}", err);
}
