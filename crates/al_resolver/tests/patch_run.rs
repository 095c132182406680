use al_formats::{
    actor_hash, ActorCatalog, ActorEntry, ActorInfo, Container, MapUnit, PlacedObject, Record,
};
use al_mod_core::GameDump;
use al_resolver::{
    CatalogSet, Error, ModPatcher, PatchOptions, PatchStage, RemoteSource, Result,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Serves `<name>` as the pack bytes and counts fetches per name.
#[derive(Default)]
struct CountingRemote {
    fetches: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl CountingRemote {
    fn fetches_for(&self, name: &str) -> usize {
        self.fetches.lock().unwrap().get(name).copied().unwrap_or(0)
    }
}

impl RemoteSource for CountingRemote {
    fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default() += 1;
        if name == "Obj_Broken" {
            return Err(Error::Fetch {
                name: name.to_string(),
                status: 404,
            });
        }
        Ok(format!("pack:{name}").into_bytes())
    }
}

struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
    container: Container,
}

impl Workspace {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("al_resolver=debug")
            .with_test_writer()
            .try_init();

        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let ws = Self {
            _dir: dir,
            root,
            container: Container::default(),
        };

        // Empty mod index so no game dump is needed.
        ws.container
            .write_actor_info(&ws.index_path(), &ActorInfo::default())
            .unwrap();
        ws
    }

    fn mod_root(&self) -> Utf8PathBuf {
        self.root.join("mod")
    }

    fn data_dir(&self) -> Utf8PathBuf {
        self.root.join("data")
    }

    fn dlc_dir(&self) -> Utf8PathBuf {
        self.root.join("dlc")
    }

    fn index_path(&self) -> Utf8PathBuf {
        self.mod_root().join("content/Actor/ActorInfo.product.sbyml")
    }

    fn pack_path(&self, name: &str) -> Utf8PathBuf {
        self.mod_root()
            .join(format!("content/Actor/Pack/{name}.sbactorpack"))
    }

    fn write_map(&self, rel: &str, objs: &[(&str, u32)]) -> Utf8PathBuf {
        let path = self.mod_root().join(rel);
        let unit = MapUnit {
            objs: objs
                .iter()
                .map(|(name, id)| PlacedObject::new(*name, *id))
                .collect(),
            ..Default::default()
        };
        self.container.write_map_unit(&path, &unit).unwrap();
        path
    }

    fn write_vanilla_map(&self, rel: &str, objs: &[(&str, u32)]) {
        let unit = MapUnit {
            objs: objs
                .iter()
                .map(|(name, id)| PlacedObject::new(*name, *id))
                .collect(),
            ..Default::default()
        };
        self.container
            .write_map_unit(&self.dlc_dir().join("Map").join(rel), &unit)
            .unwrap();
    }

    fn read_index(&self) -> ActorInfo {
        self.container.read_actor_info(&self.index_path()).unwrap()
    }

    fn patcher(&self, catalogs: CatalogSet, remote: Arc<CountingRemote>, options: PatchOptions) -> ModPatcher {
        ModPatcher::new(self.mod_root(), self.data_dir())
            .with_catalogs(catalogs)
            .with_remote(remote)
            .with_game_dump(GameDump {
                update_dir: None,
                dlc_dir: Some(self.dlc_dir()),
            })
            .with_options(options)
    }
}

fn catalogs(source: &[&str], vanilla: &[&str], ignored: &[&str]) -> CatalogSet {
    let source: ActorCatalog = source
        .iter()
        .map(|n| (n.to_string(), ActorEntry::new(*n).with_param("profile", "MapStatic")))
        .collect();
    CatalogSet::new(
        vanilla.iter().map(|n| actor_hash(n)).collect(),
        ignored.iter().map(|n| n.to_string()).collect(),
        source,
    )
}

fn read(path: &Utf8Path) -> Vec<u8> {
    std::fs::read(path.as_std_path()).unwrap()
}

#[test]
fn duplicate_references_stage_one_install_and_one_index_entry() {
    let ws = Workspace::new();
    ws.write_map(
        "content/Map/MainField/A-1/A-1_Dynamic.smubin",
        &[("Obj_A", 1), ("Obj_A", 2)],
    );

    let remote = Arc::new(CountingRemote::default());
    let report = ws
        .patcher(catalogs(&["Obj_A"], &[], &[]), remote.clone(), PatchOptions::default())
        .run()
        .unwrap();

    assert_eq!(report.files_processed, 1);
    assert_eq!(report.actors_staged, 1);
    assert_eq!(report.actors_installed, vec!["Obj_A".to_string()]);
    assert_eq!(report.index_appends, 1);
    assert_eq!(remote.fetches_for("Obj_A"), 1);
    assert_eq!(read(&ws.pack_path("Obj_A")), b"pack:Obj_A");

    let index = ws.read_index();
    assert_eq!(index.hashes, vec![actor_hash("Obj_A")]);
    assert_eq!(index.actors[0].name, "Obj_A");
}

#[test]
fn auto_fix_of_vanilla_placed_object_renames_without_staging() {
    let ws = Workspace::new();
    let path = ws.write_map(
        "aoc/0010/Map/MainField/A-1/A-1_Static.smubin",
        &[("Obj_B", 5)],
    );
    ws.write_vanilla_map("MainField/A-1/A-1_Static.smubin", &[("Obj_B", 5)]);

    let remote = Arc::new(CountingRemote::default());
    let options = PatchOptions {
        auto: true,
        ..Default::default()
    };
    let report = ws
        .patcher(catalogs(&["Obj_BC"], &[], &[]), remote.clone(), options)
        .run()
        .unwrap();

    assert_eq!(report.auto_fixes, 1);
    assert_eq!(report.files_rewritten, 1);
    assert_eq!(report.actors_staged, 0);
    assert_eq!(remote.total.load(Ordering::SeqCst), 0);
    assert!(!ws.pack_path("Obj_BC").as_std_path().exists());

    let unit = ws.container.read_map_unit(&path).unwrap();
    assert_eq!(unit.objs[0].name(), Some("Obj_BC"));
    assert_eq!(unit.objs[0].hash_id(), Some(5));
    assert!(ws.read_index().actors.is_empty());
}

#[test]
fn auto_fix_of_new_object_stages_corrected_name() {
    let ws = Workspace::new();
    ws.write_map(
        "aoc/0010/Map/MainField/A-1/A-1_Static.smubin",
        &[("Obj_B", 77)],
    );
    ws.write_vanilla_map("MainField/A-1/A-1_Static.smubin", &[("Obj_B", 5)]);

    let remote = Arc::new(CountingRemote::default());
    let options = PatchOptions {
        auto: true,
        ..Default::default()
    };
    let report = ws
        .patcher(catalogs(&["Obj_BC"], &[], &[]), remote.clone(), options)
        .run()
        .unwrap();

    assert_eq!(report.auto_fixes, 1);
    assert_eq!(report.actors_installed, vec!["Obj_BC".to_string()]);
    assert_eq!(ws.read_index().actors[0].name, "Obj_BC");
}

#[test]
fn ignored_name_is_left_alone() {
    let ws = Workspace::new();
    let path = ws.write_map(
        "content/Map/MainField/A-1/A-1_Static.smubin",
        &[("Obj_Skip", 3)],
    );
    let before = read(&path);

    let remote = Arc::new(CountingRemote::default());
    let options = PatchOptions {
        auto: true,
        ..Default::default()
    };
    let report = ws
        .patcher(
            catalogs(&["Obj_Skip", "Obj_SkipC"], &[], &["Obj_Skip"]),
            remote.clone(),
            options,
        )
        .run()
        .unwrap();

    assert_eq!(report.auto_fixes, 0);
    assert_eq!(report.files_rewritten, 0);
    assert_eq!(report.actors_staged, 0);
    assert_eq!(read(&path), before);
    assert!(ws.read_index().hashes.is_empty());
}

#[test]
fn vanilla_name_is_never_staged() {
    let ws = Workspace::new();
    ws.write_map(
        "content/Map/MainField/A-1/A-1_Static.smubin",
        &[("Obj_Vanilla", 1)],
    );

    let remote = Arc::new(CountingRemote::default());
    let report = ws
        .patcher(
            catalogs(&["Obj_Vanilla"], &["Obj_Vanilla"], &[]),
            remote.clone(),
            PatchOptions::default(),
        )
        .run()
        .unwrap();

    assert_eq!(report.actors_staged, 0);
    assert_eq!(remote.total.load(Ordering::SeqCst), 0);
}

#[test]
fn parallel_references_in_different_dirs_install_once() {
    let ws = Workspace::new();
    for unit in ["A-1", "B-2", "C-3", "D-4"] {
        ws.write_map(
            &format!("content/Map/MainField/{unit}/{unit}_Static.smubin"),
            &[("Obj_C", 1), ("Obj_D", 2)],
        );
    }
    ws.write_map(
        "aoc/0010/Map/CDungeon/Dungeon000/Dungeon000_Static.smubin",
        &[("Obj_C", 9)],
    );

    let remote = Arc::new(CountingRemote::default());
    let options = PatchOptions {
        parallel: true,
        jobs: Some(4),
        ..Default::default()
    };
    let report = ws
        .patcher(catalogs(&["Obj_C", "Obj_D"], &[], &[]), remote.clone(), options)
        .run()
        .unwrap();

    assert_eq!(report.files_processed, 5);
    assert_eq!(report.actors_staged, 2);
    assert_eq!(remote.fetches_for("Obj_C"), 1);
    assert_eq!(remote.fetches_for("Obj_D"), 1);

    let index = ws.read_index();
    assert_eq!(index.hashes.len(), 2);
    assert!(index.hashes.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn sequential_and_parallel_runs_produce_the_same_index() {
    let mut indexes = Vec::new();
    for parallel in [false, true] {
        let ws = Workspace::new();
        ws.write_map(
            "content/Map/MainField/A-1/A-1_Static.smubin",
            &[("Obj_E", 1), ("Obj_F", 2)],
        );
        ws.write_map(
            "content/Map/MainField/B-2/B-2_Static.smubin",
            &[("Obj_G", 3), ("Obj_E", 4)],
        );

        let options = PatchOptions {
            parallel,
            ..Default::default()
        };
        ws.patcher(
            catalogs(&["Obj_E", "Obj_F", "Obj_G"], &[], &[]),
            Arc::new(CountingRemote::default()),
            options,
        )
        .run()
        .unwrap();
        indexes.push(ws.read_index());
    }

    assert_eq!(indexes[0], indexes[1]);
}

#[test]
fn cached_and_installed_actors_are_not_fetched() {
    let ws = Workspace::new();
    ws.write_map(
        "content/Map/MainField/A-1/A-1_Static.smubin",
        &[("Obj_Cached", 1), ("Obj_Present", 2)],
    );

    let cache = ws.data_dir().join("Actors");
    std::fs::create_dir_all(cache.as_std_path()).unwrap();
    std::fs::write(cache.join("Obj_Cached.sbactorpack"), b"from-cache").unwrap();

    let present = ws.pack_path("Obj_Present");
    std::fs::create_dir_all(present.parent().unwrap()).unwrap();
    std::fs::write(&present, b"already-here").unwrap();

    let remote = Arc::new(CountingRemote::default());
    let report = ws
        .patcher(
            catalogs(&["Obj_Cached", "Obj_Present"], &[], &[]),
            remote.clone(),
            PatchOptions::default(),
        )
        .run()
        .unwrap();

    assert_eq!(report.actors_installed, vec!["Obj_Cached".to_string()]);
    assert_eq!(remote.total.load(Ordering::SeqCst), 0);
    assert_eq!(read(&ws.pack_path("Obj_Cached")), b"from-cache");
    assert_eq!(read(&present), b"already-here");
}

#[test]
fn failures_are_isolated_and_reported() {
    let ws = Workspace::new();
    ws.write_map(
        "content/Map/MainField/A-1/A-1_Static.smubin",
        &[("Obj_Broken", 1), ("Obj_Good", 2)],
    );
    let corrupt = ws.mod_root().join("content/Map/MainField/Z-9/Z-9_Static.smubin");
    std::fs::create_dir_all(corrupt.parent().unwrap()).unwrap();
    std::fs::write(&corrupt, b"not a container").unwrap();

    let remote = Arc::new(CountingRemote::default());
    let report = ws
        .patcher(
            catalogs(&["Obj_Broken", "Obj_Good"], &[], &[]),
            remote.clone(),
            PatchOptions::default(),
        )
        .run()
        .unwrap();

    assert!(report.has_failures());
    assert_eq!(report.walk_failures.len(), 1);
    assert_eq!(report.walk_failures[0].path, corrupt);
    assert_eq!(report.install_failures.len(), 1);
    assert_eq!(report.install_failures[0].name, "Obj_Broken");
    assert_eq!(report.actors_installed, vec!["Obj_Good".to_string()]);

    // Both index entries are kept; the index is still written.
    assert_eq!(ws.read_index().actors.len(), 2);
}

#[test]
fn unreadable_vanilla_map_leaves_file_and_index_untouched() {
    let ws = Workspace::new();
    let path = ws.mod_root().join("aoc/0010/Map/MainField/A-1/A-1_Static.smubin");
    let mut no_id = Record::new();
    no_id.insert(PlacedObject::NAME_KEY.to_string(), "Obj_X".into());
    let unit = MapUnit {
        objs: vec![PlacedObject::from_record(no_id), PlacedObject::new("Obj_B", 5)],
        ..Default::default()
    };
    ws.container.write_map_unit(&path, &unit).unwrap();
    let before = read(&path);

    let vanilla = ws.dlc_dir().join("Map/MainField/A-1/A-1_Static.smubin");
    std::fs::create_dir_all(vanilla.parent().unwrap()).unwrap();
    std::fs::write(&vanilla, b"corrupt").unwrap();

    let remote = Arc::new(CountingRemote::default());
    let options = PatchOptions {
        auto: true,
        ..Default::default()
    };
    let report = ws
        .patcher(catalogs(&["Obj_XC", "Obj_BC"], &[], &[]), remote.clone(), options)
        .run()
        .unwrap();

    assert_eq!(report.walk_failures.len(), 1);
    assert_eq!(report.walk_failures[0].path, path);
    assert_eq!(report.auto_fixes, 0);
    assert_eq!(report.index_appends, 0);
    assert_eq!(report.actors_staged, 0);
    assert!(report.actors_installed.is_empty());
    assert_eq!(remote.total.load(Ordering::SeqCst), 0);
    assert!(ws.read_index().actors.is_empty());
    assert_eq!(read(&path), before);
}

#[test]
fn invalid_mod_root_fails_before_processing() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    std::fs::create_dir_all(root.join("romfs")).unwrap();

    let remote = Arc::new(CountingRemote::default());
    let err = ModPatcher::new(root.clone(), root.join("data"))
        .with_catalogs(catalogs(&[], &[], &[]))
        .with_remote(remote)
        .run()
        .unwrap_err();

    assert!(matches!(err, Error::ModLayout(_)));
}

#[test]
fn progress_stages_are_emitted_in_order() {
    let ws = Workspace::new();
    ws.write_map(
        "content/Map/MainField/A-1/A-1_Static.smubin",
        &[("Obj_A", 1)],
    );

    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&stages);
    ws.patcher(
        catalogs(&["Obj_A"], &[], &[]),
        Arc::new(CountingRemote::default()),
        PatchOptions::default(),
    )
    .with_progress(move |p| sink.lock().unwrap().push(p.stage))
    .run()
    .unwrap();

    let mut stages = stages.lock().unwrap().clone();
    stages.dedup();
    assert_eq!(
        stages,
        vec![
            PatchStage::Validating,
            PatchStage::Walking,
            PatchStage::Installing,
            PatchStage::Finalizing,
            PatchStage::Complete,
        ]
    );
}

#[test]
fn catalogs_load_from_data_dir() {
    let ws = Workspace::new();
    ws.write_map(
        "content/Map/MainField/A-1/A-1_Static.smubin",
        &[("Obj_A", 1), ("Obj_Skip", 2), ("Obj_Vanilla", 3)],
    );

    let data = ws.data_dir();
    let source: ActorCatalog = ["Obj_A", "Obj_Skip", "Obj_Vanilla"]
        .into_iter()
        .map(|n| (n.to_string(), ActorEntry::new(n)))
        .collect();
    ws.container
        .write_actor_catalog(&data.join("ActorInfo.sbyml"), &source)
        .unwrap();
    std::fs::write(data.join("VanillaActors.json"), r#"["Obj_Vanilla"]"#).unwrap();
    std::fs::write(data.join("Ignored.json"), r#"["Obj_Skip"]"#).unwrap();

    let remote = Arc::new(CountingRemote::default());
    let report = ModPatcher::new(ws.mod_root(), data)
        .with_remote(remote.clone())
        .run()
        .unwrap();

    assert_eq!(report.actors_installed, vec!["Obj_A".to_string()]);
    let names: HashSet<_> = ws
        .read_index()
        .actors
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, HashSet::from(["Obj_A".to_string()]));
}
