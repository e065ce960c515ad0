use super::*;
use std::cell::RefCell;
use std::fs;
use tempfile::tempdir;

/// Reads files as plain text and records every path it was asked to open.
#[derive(Default)]
struct RecordingLoader {
    opened: RefCell<Vec<PathBuf>>,
}

impl DatabaseLoader for RecordingLoader {
    type Database = String;

    fn load(&self, path: &Path) -> Result<String, ResolveError> {
        self.opened.borrow_mut().push(path.to_path_buf());
        let text = fs::read_to_string(path).map_err(|source| ResolveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if text == "BAD" {
            return Err(ResolveError::Malformed {
                path: path.to_path_buf(),
                reason: "bad magic".to_string(),
            });
        }
        Ok(text)
    }
}

fn write_root(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn write_nested(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let sub = dir.join(&name[..1]);
    fs::create_dir_all(&sub).unwrap();
    let path = sub.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn resolver() -> Resolver<RecordingLoader> {
    Resolver::with_loader(RecordingLoader::default(), TerminfoEnv::default())
}

#[test]
fn first_directory_with_entry_wins_and_later_ones_are_not_opened() {
    let dirs: Vec<_> = (0..4).map(|_| tempdir().unwrap()).collect();
    let hit = write_nested(dirs[1].path(), "xterm", "second");
    write_root(dirs[3].path(), "xterm", "fourth");

    let resolver = resolver();
    let search = SearchPath::from_dirs(dirs.iter().map(|d| d.path().to_path_buf()));
    let db = resolver.load_from_search_path("xterm", search).unwrap();

    assert_eq!(db, "second");
    assert_eq!(&*resolver.loader.opened.borrow(), &[hit]);
}

#[test]
fn root_entry_beats_nested_entry_in_same_directory() {
    let dir = tempdir().unwrap();
    let root = write_root(dir.path(), "vt100", "root");
    write_nested(dir.path(), "vt100", "nested");

    let resolver = resolver();
    let db = resolver.load_from_directory(dir.path(), "vt100").unwrap();

    assert_eq!(db, "root");
    assert_eq!(&*resolver.loader.opened.borrow(), &[root]);
}

#[test]
fn missing_entry_in_directory_is_continuable() {
    let dir = tempdir().unwrap();
    let err = resolver()
        .load_from_directory(dir.path(), "xterm")
        .unwrap_err();
    assert!(err.is_continuable());
}

#[test]
fn absent_everywhere_reports_every_directory_in_order() {
    let dirs: Vec<PathBuf> = (0..3).map(|_| tempdir().unwrap().keep()).collect();
    let missing = PathBuf::from("/nonexistent/rawterm-terminfo");
    let mut expected = dirs.clone();
    expected.insert(1, missing.clone());

    let search = SearchPath::from_dirs(expected.clone());
    let err = resolver()
        .load_from_search_path("xterm", search)
        .unwrap_err();

    match err {
        ResolveError::NotFound { name, directories } => {
            assert_eq!(name, "xterm");
            assert_eq!(directories, expected);
        }
        other => panic!("unexpected error: {other}"),
    }
    for dir in dirs {
        let _ = fs::remove_dir_all(dir);
    }
}

#[test]
fn malformed_entry_aborts_search_before_later_directories() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let bad = write_root(first.path(), "xterm", "BAD");
    write_root(second.path(), "xterm", "good");

    let resolver = resolver();
    let search = SearchPath::from_dirs([first.path(), second.path()]);
    let err = resolver.load_from_search_path("xterm", search).unwrap_err();

    assert!(matches!(err, ResolveError::Malformed { .. }));
    assert!(!err.is_continuable());
    assert_eq!(&*resolver.loader.opened.borrow(), &[bad]);
}

#[test]
fn default_layout_not_found_lists_user_and_system_dirs() {
    let env = TerminfoEnv {
        term: Some("rawterm-no-such-terminal".into()),
        home: Some("/home/x".into()),
        ..TerminfoEnv::default()
    };
    let resolver = Resolver::with_loader(RecordingLoader::default(), env);

    let err = resolver.load_from_environment().unwrap_err();
    match err {
        ResolveError::NotFound { directories, .. } => assert_eq!(
            directories,
            [
                PathBuf::from("/home/x/.terminfo"),
                PathBuf::from("/etc/terminfo"),
                PathBuf::from("/lib/terminfo"),
                PathBuf::from("/usr/share/terminfo"),
            ]
        ),
        other => panic!("unexpected error: {other}"),
    }
    assert!(resolver.loader.opened.borrow().is_empty());
}

#[test]
fn unresolvable_home_is_fatal() {
    let env = TerminfoEnv {
        term: Some("xterm".into()),
        terminfo: Some("/opt/ti".into()),
        ..TerminfoEnv::default()
    };
    let err = Resolver::with_loader(RecordingLoader::default(), env)
        .load_from_environment()
        .unwrap_err();
    assert!(matches!(err, ResolveError::HomeDirectory));
}

#[test]
fn terminfo_override_is_searched_first() {
    let override_dir = tempdir().unwrap();
    let home = tempdir().unwrap();
    write_nested(override_dir.path(), "rawterm-test", "override");
    let user_dir = home.path().join(".terminfo");
    fs::create_dir_all(&user_dir).unwrap();
    write_root(&user_dir, "rawterm-test", "home");

    let env = TerminfoEnv {
        term: Some("rawterm-test".into()),
        terminfo: Some(override_dir.path().as_os_str().to_owned()),
        home: Some(home.path().as_os_str().to_owned()),
        terminfo_dirs: None,
    };
    let db = Resolver::with_loader(RecordingLoader::default(), env)
        .load_from_environment()
        .unwrap();
    assert_eq!(db, "override");
}

#[test]
fn terminfo_loader_rejects_garbage_as_malformed() {
    let dir = tempdir().unwrap();
    write_root(dir.path(), "xterm", "definitely not a compiled terminfo entry");

    let env = TerminfoEnv::default();
    let err = Resolver::new(env)
        .load_from_directory(dir.path(), "xterm")
        .err()
        .unwrap();
    assert!(matches!(err, ResolveError::Malformed { .. }));
}

#[test]
fn unreadable_entry_is_a_fatal_read_error() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("xterm")).unwrap();

    let err = Resolver::new(TerminfoEnv::default())
        .load_from_directory(dir.path(), "xterm")
        .err()
        .unwrap();
    assert!(matches!(err, ResolveError::Read { .. }));
    assert!(!err.is_continuable());
}
