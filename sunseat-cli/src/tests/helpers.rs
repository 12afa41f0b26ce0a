//! Test helpers for writing terrace payloads into temporary workspaces.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Three terraces around central Paris; the last one sits roughly 5 km north.
pub(super) const SAMPLE_PAYLOAD: &str = r#"{
  "items": [
    {
      "id": 1,
      "name": "Cafe Azur",
      "lat": 48.8566,
      "lon": 2.3522,
      "sunScore": 82,
      "streetWidth": "wide",
      "hasOutdoor": true,
      "forecast": [{ "tmin": 30, "score": 40 }]
    },
    {
      "id": 2,
      "name": "Bar Ombre",
      "lat": 48.8570,
      "lon": 2.3530,
      "sunScore": "31%",
      "streetWidth": "narrow"
    },
    {
      "id": 2,
      "name": "Bar Ombre",
      "lat": 48.8570,
      "lon": 2.3530,
      "sunScore": 31
    },
    {
      "id": "n77",
      "name": "Le Lointain",
      "lat": 48.9016,
      "lon": 2.3522,
      "sunScore": 95,
      "hasOutdoor": "yes"
    }
  ]
}"#;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write test file");
}

pub(super) fn temp_root() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// Write [`SAMPLE_PAYLOAD`] into a fresh temporary directory.
pub(super) fn sample_payload() -> (TempDir, Utf8PathBuf) {
    let (tmp, root) = temp_root();
    let path = root.join("terraces.json");
    write_utf8(&path, SAMPLE_PAYLOAD.as_bytes());
    (tmp, path)
}
