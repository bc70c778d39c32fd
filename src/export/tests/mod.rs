use super::*;
use crate::config::StorageConfig;
use crate::error::{Error, ExportError};
use async_trait::async_trait;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    storage: StorageConfig,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            assets_dir: root.path().join("assets"),
            temp_dir: root.path().join("temp"),
            archive_dir: root.path().join("archives"),
        };
        Self {
            _root: root,
            storage,
        }
    }

    fn builder(&self) -> ArchiveBuilder {
        ArchiveBuilder::new(&self.storage)
    }

    fn write_source(&self, kind: ResourceKind, peptide_id: &str, content: &str) {
        let handler = ResourceHandler::new(kind, &self.storage.assets_dir);
        let path = handler.source_file(peptide_id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn temp_is_empty(&self) -> bool {
        match std::fs::read_dir(&self.storage.temp_dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }
}

#[derive(Default)]
struct RecordingSink {
    seen: Vec<ResourceKind>,
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn resource_done(&mut self, resource: ResourceKind) -> crate::Result<()> {
        self.seen.push(resource);
        Ok(())
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn read_entry(archive: &Path, name: &str) -> String {
    let file = std::fs::File::open(archive).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

fn entry_names(archive: &Path) -> Vec<String> {
    let file = std::fs::File::open(archive).unwrap();
    let zip = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    names
}

// ---- ExportForm / ResourceKind ----

#[test]
fn test_exportable_resources_follow_declared_order() {
    let form = ExportForm {
        pdb: true,
        metadata: true,
        fasta: true,
        ..Default::default()
    };
    assert_eq!(
        form.exportable_resources(),
        vec![ResourceKind::Fasta, ResourceKind::Metadata, ResourceKind::Pdb]
    );
    assert!(form.is_valid());
    assert!(!ExportForm::default().is_valid());
}

#[test]
fn test_form_uses_camel_case_keys() {
    let form: ExportForm =
        serde_json::from_str(r#"{"esmMean": true, "iFeatureDpc": true}"#).unwrap();
    assert_eq!(
        form.exportable_resources(),
        vec![ResourceKind::EsmMean, ResourceKind::IFeatureDpc]
    );

    let json = serde_json::to_value(ExportForm::with_resources(&[ResourceKind::IFeatureAac]))
        .unwrap();
    assert_eq!(json["iFeatureAac"], true);
    assert_eq!(json["attributes"], false);
}

#[test]
fn test_resource_kind_parsing() {
    for kind in ResourceKind::ALL {
        assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        assert_eq!(
            serde_json::to_value(kind).unwrap(),
            serde_json::Value::String(kind.to_string())
        );
    }

    let err = "sdf".parse::<ResourceKind>().unwrap_err();
    assert!(matches!(
        err,
        Error::Export(ExportError::UnknownResource { ref name }) if name == "sdf"
    ));
}

#[test]
fn test_export_result_shape() {
    let mut result = ExportResult::new(
        ids(&["starPep_00001", "starPep_00002"]),
        ExportForm::with_resources(&[ResourceKind::Fasta]),
    );
    result.done.push(ResourceKind::Fasta);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["peptideIds"][1], "starPep_00002");
    assert_eq!(json["total"], 2);
    assert_eq!(json["form"]["fasta"], true);
    assert_eq!(json["done"], serde_json::json!(["fasta"]));
}

#[test]
fn test_format_peptide_id() {
    assert_eq!(format_peptide_id(0), "starPep_00000");
    assert_eq!(format_peptide_id(42), "starPep_00042");
    assert_eq!(format_peptide_id(123456), "starPep_123456");
}

// ---- ResourceHandler ----

#[test]
fn test_csv_handler_keeps_single_header() {
    let fx = Fixture::new();
    fx.write_source(ResourceKind::Attributes, "starPep_00001", "id,charge\nstarPep_00001,2\n");
    fx.write_source(ResourceKind::Attributes, "starPep_00002", "id,charge\nstarPep_00002,-1");
    fx.write_source(ResourceKind::Attributes, "starPep_00003", "id,charge\nstarPep_00003,0\n");

    let out = tempfile::tempdir().unwrap();
    let handler = ResourceHandler::new(ResourceKind::Attributes, &fx.storage.assets_dir);
    let path = handler
        .materialize(
            out.path(),
            &ids(&["starPep_00001", "starPep_00002", "starPep_00003"]),
        )
        .unwrap();

    assert_eq!(path, out.path().join("attributes.csv"));
    assert_eq!(
        std::fs::read_to_string(path).unwrap(),
        "id,charge\nstarPep_00001,2\nstarPep_00002,-1\nstarPep_00003,0\n"
    );
}

#[test]
fn test_fasta_handler_concatenates_records() {
    let fx = Fixture::new();
    fx.write_source(ResourceKind::Fasta, "starPep_00001", ">starPep_00001\nGLFD\n");
    fx.write_source(ResourceKind::Fasta, "starPep_00002", ">starPep_00002\nKKLL");

    let out = tempfile::tempdir().unwrap();
    let handler = ResourceHandler::new(ResourceKind::Fasta, &fx.storage.assets_dir);
    let path = handler
        .materialize(out.path(), &ids(&["starPep_00001", "starPep_00002"]))
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(path).unwrap(),
        ">starPep_00001\nGLFD\n>starPep_00002\nKKLL\n"
    );
}

#[test]
fn test_pdb_handler_copies_files() {
    let fx = Fixture::new();
    fx.write_source(ResourceKind::Pdb, "starPep_00007", "ATOM 1\n");

    let out = tempfile::tempdir().unwrap();
    let handler = ResourceHandler::new(ResourceKind::Pdb, &fx.storage.assets_dir);
    let path = handler
        .materialize(out.path(), &ids(&["starPep_00007"]))
        .unwrap();

    assert!(path.is_dir());
    assert_eq!(
        std::fs::read_to_string(path.join("starPep_00007.pdb")).unwrap(),
        "ATOM 1\n"
    );
}

#[test]
fn test_missing_source_names_resource_and_peptide() {
    let fx = Fixture::new();
    let out = tempfile::tempdir().unwrap();

    let err = ResourceHandler::new(ResourceKind::Metadata, &fx.storage.assets_dir)
        .materialize(out.path(), &ids(&["starPep_00404"]))
        .unwrap_err();

    match err {
        Error::Export(ExportError::SourceUnavailable {
            resource,
            peptide_id,
            ..
        }) => {
            assert_eq!(resource, ResourceKind::Metadata);
            assert_eq!(peptide_id, "starPep_00404");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ---- ArchiveBuilder ----

#[tokio::test]
async fn test_build_produces_archive_and_cleans_up() {
    let fx = Fixture::new();
    let peptides = ids(&["starPep_00001", "starPep_00002"]);
    for id in &peptides {
        fx.write_source(ResourceKind::Fasta, id, &format!(">{id}\nGLFD\n"));
        fx.write_source(ResourceKind::Metadata, id, &format!("id,source\n{id},db\n"));
        fx.write_source(ResourceKind::Pdb, id, "ATOM\n");
    }

    let form = ExportForm::with_resources(&[
        ResourceKind::Fasta,
        ResourceKind::Metadata,
        ResourceKind::Pdb,
    ]);
    let mut sink = RecordingSink::default();
    let builder = fx.builder();

    let archive = builder
        .build("task-1", &peptides, &form, &mut sink)
        .await
        .unwrap();

    assert_eq!(archive, fx.storage.archive_dir.join("task-1.zip"));
    assert!(archive.is_file());
    assert!(!builder.working_dir("task-1").exists());
    assert!(!fx.storage.archive_dir.join("task-1.zip.part").exists());

    assert_eq!(
        entry_names(&archive),
        vec![
            "metadata.csv",
            "pdb/",
            "pdb/starPep_00001.pdb",
            "pdb/starPep_00002.pdb",
            "peptides.fasta",
        ]
    );
    assert_eq!(
        read_entry(&archive, "metadata.csv"),
        "id,source\nstarPep_00001,db\nstarPep_00002,db\n"
    );
}

#[tokio::test]
async fn test_progress_fires_in_declared_order() {
    let fx = Fixture::new();
    fx.write_source(ResourceKind::Fasta, "starPep_00001", ">starPep_00001\nA\n");
    fx.write_source(ResourceKind::Metadata, "starPep_00001", "id\nstarPep_00001\n");

    let form = ExportForm {
        fasta: true,
        metadata: true,
        ..Default::default()
    };
    let mut sink = RecordingSink::default();

    fx.builder()
        .build("ordered", &ids(&["starPep_00001"]), &form, &mut sink)
        .await
        .unwrap();

    let names: Vec<&str> = sink.seen.iter().map(|k| k.as_str()).collect();
    assert_eq!(names, vec!["fasta", "metadata"]);
}

#[tokio::test]
async fn test_failure_leaves_no_archive_and_no_working_dir() {
    let fx = Fixture::new();
    fx.write_source(ResourceKind::Fasta, "starPep_00001", ">starPep_00001\nA\n");
    // no pdb source: the pdb handler fails after fasta succeeded

    let form = ExportForm::with_resources(&[ResourceKind::Fasta, ResourceKind::Pdb]);
    let mut sink = RecordingSink::default();
    let builder = fx.builder();

    let err = builder
        .build("broken", &ids(&["starPep_00001"]), &form, &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Export(ExportError::SourceUnavailable {
            resource: ResourceKind::Pdb,
            ..
        })
    ));
    assert_eq!(sink.seen, vec![ResourceKind::Fasta]);
    assert!(!builder.archive_path("broken").exists());
    assert!(!builder.working_dir("broken").exists());
    assert!(fx.temp_is_empty());
}

#[tokio::test]
async fn test_invalid_input_fails_before_any_side_effect() {
    let fx = Fixture::new();
    let builder = fx.builder();

    let err = builder
        .build(
            "empty-form",
            &ids(&["starPep_00001"]),
            &ExportForm::default(),
            &mut NoProgress,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Export(ExportError::NoResources)));

    let err = builder
        .build(
            "empty-ids",
            &[],
            &ExportForm::with_resources(&[ResourceKind::Fasta]),
            &mut NoProgress,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Export(ExportError::NoPeptides)));

    assert!(!fx.storage.temp_dir.exists());
    assert!(!fx.storage.archive_dir.exists());
}

#[tokio::test]
async fn test_existing_working_dir_is_rejected_and_kept() {
    let fx = Fixture::new();
    fx.write_source(ResourceKind::Fasta, "starPep_00001", ">starPep_00001\nA\n");
    let builder = fx.builder();

    let occupied = builder.working_dir("dup");
    std::fs::create_dir_all(&occupied).unwrap();

    let err = builder
        .build(
            "dup",
            &ids(&["starPep_00001"]),
            &ExportForm::with_resources(&[ResourceKind::Fasta]),
            &mut NoProgress,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Export(ExportError::WorkingDirExists { .. })
    ));
    assert!(occupied.exists(), "a directory owned by another build must survive");
    assert!(!builder.archive_path("dup").exists());
}

#[tokio::test]
async fn test_failing_progress_sink_aborts_build() {
    struct FailingSink;

    #[async_trait]
    impl ProgressSink for FailingSink {
        async fn resource_done(&mut self, _resource: ResourceKind) -> crate::Result<()> {
            Err(Error::Other("status store unavailable".to_string()))
        }
    }

    let fx = Fixture::new();
    fx.write_source(ResourceKind::Fasta, "starPep_00001", ">starPep_00001\nA\n");
    let builder = fx.builder();

    let err = builder
        .build(
            "sink",
            &ids(&["starPep_00001"]),
            &ExportForm::with_resources(&[ResourceKind::Fasta]),
            &mut FailingSink,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Other(_)));
    assert!(!builder.archive_path("sink").exists());
    assert!(!builder.working_dir("sink").exists());
}
